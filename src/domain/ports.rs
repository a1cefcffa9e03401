use crate::domain::model::{
    Candidate, CandidateScore, EmailContext, EmailDraft, FeatureVector, LeadRecord, TransformResult,
};
use crate::domain::settings::{
    ArchiveSettings, CategoricalVocabulary, EngagementWeights, OutputFiles, ShortlistSettings,
};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn leads_file(&self) -> &str;
    fn model_file(&self) -> &str;
    fn output_path(&self) -> &str;
    fn shortlist(&self) -> ShortlistSettings;

    fn engagement_weights(&self) -> EngagementWeights {
        EngagementWeights::default()
    }

    fn output_files(&self) -> OutputFiles {
        OutputFiles::default()
    }

    fn archive(&self) -> Option<ArchiveSettings> {
        None
    }

    fn vocabulary(&self) -> Option<&CategoricalVocabulary> {
        None
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<LeadRecord>>;
    async fn transform(&self, data: Vec<LeadRecord>) -> Result<TransformResult>;
    async fn load(&self, result: &TransformResult) -> Result<String>;
}

pub trait LeadClassifier: Send + Sync {
    fn num_features(&self) -> usize;
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<usize>>;
}

#[async_trait]
pub trait EmailDrafter: Send + Sync {
    fn name(&self) -> &str;
    async fn draft(&self, context: &EmailContext) -> Result<EmailDraft>;
}

/// 由 agent 為 shortlist 上的 lead 打 0-100 分並附理由
#[async_trait]
pub trait LeadScorer: Send + Sync {
    fn name(&self) -> &str;
    async fn score(&self, candidates: &[Candidate]) -> Result<Vec<CandidateScore>>;
}
