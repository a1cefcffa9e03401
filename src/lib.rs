pub mod agents;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, toml_config::FlowConfig};

pub use agents::{
    build_drafter, ChatCompletionDrafter, ChatCompletionScorer, EmailTool, TemplateDrafter,
};
pub use core::{
    candidates::LeadScoring,
    etl::{EtlEngine, FlowOutcome},
    outreach::{EmailOutreach, OutreachReport},
    pipeline::LeadScorePipeline,
};
pub use utils::error::{FlowError, Result};
