pub mod cli;
pub mod toml_config;

use crate::agents::LlmSettings;
use crate::core::ConfigProvider;
use crate::domain::model::LeadCategory;
use crate::domain::settings::ShortlistSettings;
use crate::utils::error::{FlowError, Result};
use crate::utils::validation::{
    validate_file_extension, validate_path, validate_positive_number, validate_url, Validate,
};
#[cfg(feature = "cli")]
use clap::Parser;
use serde::{Deserialize, Serialize};

/// 讀取 API 金鑰的環境變數
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "lead-score-flow")]
#[command(about = "Score leads, shortlist the easiest ones and draft follow-up emails")]
pub struct CliConfig {
    /// Leads CSV to score
    #[arg(long, default_value = "data/leads_dataset_with_id.csv")]
    pub input: String,

    /// Pre-trained classifier (XGBoost JSON model)
    #[arg(long, default_value = "models/lead_classifier.json")]
    pub model: String,

    #[arg(long, default_value = "data")]
    pub output_path: String,

    #[arg(long, default_value = "3")]
    pub top_n: usize,

    /// Predicted category to shortlist from
    #[arg(long, default_value = "Easy")]
    pub category: LeadCategory,

    /// OpenAI-compatible base URL; without it emails use the offline template
    #[arg(long)]
    pub llm_endpoint: Option<String>,

    #[arg(long, default_value = "gpt-4o-mini")]
    pub llm_model: String,

    /// Ask the LLM to score the shortlist (requires --llm-endpoint)
    #[arg(long)]
    pub score_leads: bool,

    #[arg(long, help = "Skip drafting follow-up emails")]
    pub skip_emails: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 有設定端點時才建立 LLM 設定，金鑰從環境變數讀取
    pub fn llm_settings(&self) -> Option<LlmSettings> {
        self.llm_endpoint.as_ref().map(|endpoint| {
            let mut settings = LlmSettings::new(endpoint.clone(), self.llm_model.clone());
            settings.api_key = std::env::var(API_KEY_ENV).ok();
            settings
        })
    }
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn leads_file(&self) -> &str {
        &self.input
    }

    fn model_file(&self) -> &str {
        &self.model
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn shortlist(&self) -> ShortlistSettings {
        ShortlistSettings {
            category: self.category,
            top_n: self.top_n,
        }
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("input", &self.input)?;
        validate_file_extension("input", &self.input, &["csv"])?;
        validate_path("model", &self.model)?;
        validate_file_extension("model", &self.model, &["json"])?;
        validate_path("output_path", &self.output_path)?;
        validate_positive_number("top_n", self.top_n, 1)?;

        if let Some(endpoint) = &self.llm_endpoint {
            validate_url("llm_endpoint", endpoint)?;
        } else if self.score_leads {
            return Err(FlowError::MissingConfigError {
                field: "llm_endpoint".to_string(),
            });
        }
        Ok(())
    }
}
