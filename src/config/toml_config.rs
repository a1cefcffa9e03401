use crate::agents::{AgentProfile, DraftTemplate, LlmSettings, TaskTemplate};
use crate::core::encoding::{FUNDING_STAGE, INDUSTRY, SENIORITY_LEVEL};
use crate::core::ConfigProvider;
use crate::domain::model::LeadCategory;
use crate::domain::settings::{
    ArchiveSettings, CategoricalVocabulary, EngagementWeights, OutputFiles, ShortlistSettings,
};
use crate::utils::error::{FlowError, Result};
use crate::utils::validation::{
    validate_file_extension, validate_non_empty_string, validate_path, validate_positive_number,
    validate_weight, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    pub flow: FlowInfo,
    pub source: SourceConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub shortlist: ShortlistConfig,
    pub load: LoadConfig,
    #[serde(default)]
    pub outreach: OutreachConfig,
    #[serde(default)]
    pub agent_scoring: AgentScoringConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub leads_csv: String,
    pub model_path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: EngagementWeights,
    /// 省略時每次執行都從資料重新建立編碼
    pub vocabulary: Option<CategoricalVocabulary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortlistConfig {
    #[serde(default = "default_category")]
    pub category: LeadCategory,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_category() -> LeadCategory {
    LeadCategory::Easy
}

fn default_top_n() -> usize {
    3
}

impl Default for ShortlistConfig {
    fn default() -> Self {
        Self {
            category: default_category(),
            top_n: default_top_n(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    #[serde(default)]
    pub filenames: OutputFiles,
    pub compression: Option<ArchiveSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutreachConfig {
    #[serde(default = "default_outreach_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub agent: AgentProfile,
    #[serde(default)]
    pub task: TaskTemplate,
    #[serde(default)]
    pub template: DraftTemplate,
    /// 沒有設定時使用離線模板
    pub llm: Option<LlmSettings>,
}

fn default_outreach_enabled() -> bool {
    true
}

impl Default for OutreachConfig {
    fn default() -> Self {
        Self {
            enabled: default_outreach_enabled(),
            agent: AgentProfile::default(),
            task: TaskTemplate::default(),
            template: DraftTemplate::default(),
            llm: None,
        }
    }
}

/// 由 LLM 為 shortlist 打分，預設關閉
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentScoringConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "AgentProfile::lead_scoring")]
    pub agent: AgentProfile,
    #[serde(default = "TaskTemplate::score_leads")]
    pub task: TaskTemplate,
    /// 沒有設定時沿用 `[outreach.llm]`
    pub llm: Option<LlmSettings>,
}

impl Default for AgentScoringConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            agent: AgentProfile::lead_scoring(),
            task: TaskTemplate::score_leads(),
            llm: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
    #[serde(default)]
    pub json_logs: bool,
}

impl FlowConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| FlowError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("flow.name", &self.flow.name)?;

        validate_path("source.leads_csv", &self.source.leads_csv)?;
        validate_file_extension("source.leads_csv", &self.source.leads_csv, &["csv"])?;
        validate_path("source.model_path", &self.source.model_path)?;
        validate_file_extension("source.model_path", &self.source.model_path, &["json"])?;

        for (name, weight) in self.scoring.weights.entries() {
            validate_weight(&format!("scoring.weights.{}", name), weight)?;
        }

        if let Some(vocabulary) = &self.scoring.vocabulary {
            let known = [SENIORITY_LEVEL, INDUSTRY, FUNDING_STAGE];
            for (column, labels) in vocabulary {
                if !known.contains(&column.as_str()) {
                    return Err(FlowError::InvalidConfigValueError {
                        field: "scoring.vocabulary".to_string(),
                        value: column.clone(),
                        reason: format!("Unknown column. Valid columns: {}", known.join(", ")),
                    });
                }
                if labels.is_empty() {
                    return Err(FlowError::ConfigValidationError {
                        field: format!("scoring.vocabulary.{}", column),
                        message: "Vocabulary must list at least one label".to_string(),
                    });
                }
            }
        }

        validate_positive_number("shortlist.top_n", self.shortlist.top_n, 1)?;

        validate_path("load.output_path", &self.load.output_path)?;
        for (field, filename) in [
            ("load.filenames.predictions", &self.load.filenames.predictions),
            ("load.filenames.shortlist", &self.load.filenames.shortlist),
        ] {
            validate_file_extension(field, filename, &["csv"])?;
        }
        for (field, filename) in [
            ("load.filenames.drafts", &self.load.filenames.drafts),
            ("load.filenames.scores", &self.load.filenames.scores),
        ] {
            validate_file_extension(field, filename, &["json"])?;
        }

        if let Some(compression) = self.load.compression.as_ref().filter(|c| c.enabled) {
            validate_file_extension("load.compression.filename", &compression.filename, &["zip"])?;
        }

        if self.outreach.enabled {
            if let Some(llm) = &self.outreach.llm {
                llm.validate()?;
            }
        }

        if self.agent_scoring.enabled {
            match self.scoring_llm() {
                Some(llm) => llm.validate()?,
                None => {
                    return Err(FlowError::MissingConfigError {
                        field: "agent_scoring.llm".to_string(),
                    })
                }
            }
        }

        Ok(())
    }

    /// 評分 agent 的 LLM，未設定時使用撰信的設定
    pub fn scoring_llm(&self) -> Option<LlmSettings> {
        self.agent_scoring
            .llm
            .clone()
            .or_else(|| self.outreach.llm.clone())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.monitoring.as_ref().and_then(|m| m.log_level.as_deref())
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.json_logs).unwrap_or(false)
    }
}

/// 替換環境變數 (例如 ${OPENAI_API_KEY})，未設定的保留原樣
fn substitute_env_vars(content: &str) -> String {
    static ENV_VAR: OnceLock<Regex> = OnceLock::new();
    let re = ENV_VAR.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid regex"));

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .into_owned()
}

impl ConfigProvider for FlowConfig {
    fn leads_file(&self) -> &str {
        &self.source.leads_csv
    }

    fn model_file(&self) -> &str {
        &self.source.model_path
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn shortlist(&self) -> ShortlistSettings {
        ShortlistSettings {
            category: self.shortlist.category,
            top_n: self.shortlist.top_n,
        }
    }

    fn engagement_weights(&self) -> EngagementWeights {
        self.scoring.weights
    }

    fn output_files(&self) -> OutputFiles {
        self.load.filenames.clone()
    }

    fn archive(&self) -> Option<ArchiveSettings> {
        self.load.compression.clone()
    }

    fn vocabulary(&self) -> Option<&CategoricalVocabulary> {
        self.scoring.vocabulary.as_ref()
    }
}

impl Validate for FlowConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
