pub mod candidates;
pub mod classifier;
pub mod encoding;
pub mod etl;
pub mod features;
pub mod outreach;
pub mod pipeline;
pub mod shortlist;

pub use crate::domain::model::{LeadRecord, ScoredLead, TransformResult};
pub use crate::domain::ports::{
    ConfigProvider, EmailDrafter, LeadClassifier, LeadScorer, Pipeline, Storage,
};
pub use crate::utils::error::Result;
