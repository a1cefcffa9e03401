use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Input is missing required column '{column}'")]
    MissingColumnError { column: String },

    #[error("Model artifact error: {message}")]
    ModelError { message: String },

    #[error("Feature vector has {actual} values, model expects {expected}")]
    FeatureMismatchError { expected: usize, actual: usize },

    #[error("Unknown label '{label}' in column '{column}'")]
    UnknownLabelError { column: String, label: String },

    #[error("Model predicted unknown class index {index}")]
    UnknownClassError { index: usize },

    #[error("Email draft failed for lead {lead_id}: {message}")]
    DraftingError { lead_id: String, message: String },

    #[error("LLM endpoint error: {message}")]
    LlmError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Model,
    Network,
    Output,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// CLI 的退出碼
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,      // 警告，但成功
            ErrorSeverity::Medium => 2,   // 重試錯誤
            ErrorSeverity::High => 1,     // 處理錯誤
            ErrorSeverity::Critical => 3, // 系統錯誤
        }
    }
}

impl FlowError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FlowError::ConfigValidationError { .. }
            | FlowError::InvalidConfigValueError { .. }
            | FlowError::MissingConfigError { .. } => ErrorCategory::Configuration,
            FlowError::CsvError(_)
            | FlowError::MissingColumnError { .. }
            | FlowError::UnknownLabelError { .. } => ErrorCategory::Input,
            FlowError::ModelError { .. }
            | FlowError::FeatureMismatchError { .. }
            | FlowError::UnknownClassError { .. } => ErrorCategory::Model,
            FlowError::ApiError(_) | FlowError::LlmError { .. } | FlowError::DraftingError { .. } => {
                ErrorCategory::Network
            }
            FlowError::ZipError(_) | FlowError::IoError(_) => ErrorCategory::Output,
            FlowError::SerializationError(_) | FlowError::ProcessingError { .. } => {
                ErrorCategory::Processing
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 單一 lead 的草稿失敗不影響已寫出的評分結果
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Input | ErrorCategory::Model => {
                ErrorSeverity::High
            }
            ErrorCategory::Processing => ErrorSeverity::High,
            ErrorCategory::Output => ErrorSeverity::Critical,
        }
    }

    /// 提供給使用者的修復建議
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            FlowError::CsvError(_) | FlowError::MissingColumnError { .. } => {
                "Check that the leads CSV has a header row with every required column"
            }
            FlowError::UnknownLabelError { .. } => {
                "Add the label to the configured vocabulary or remove the fixed vocabulary"
            }
            FlowError::ModelError { .. } => {
                "Re-export the classifier with `save_model(\"model.json\")` from XGBoost"
            }
            FlowError::FeatureMismatchError { .. } => {
                "The model was trained on a different feature set; retrain or pick the matching artifact"
            }
            FlowError::UnknownClassError { .. } => {
                "The model must be a three-class classifier (Difficult, Easy, Medium)"
            }
            FlowError::ApiError(_) | FlowError::LlmError { .. } => {
                "Verify the LLM endpoint URL, API key and network connectivity"
            }
            FlowError::DraftingError { .. } => "Retry the run or use the offline template drafter",
            FlowError::ConfigValidationError { .. }
            | FlowError::InvalidConfigValueError { .. }
            | FlowError::MissingConfigError { .. } => "Fix the configuration value and run again",
            FlowError::IoError(_) | FlowError::ZipError(_) => {
                "Check that the input files exist and the output directory is writable"
            }
            FlowError::SerializationError(_) | FlowError::ProcessingError { .. } => {
                "Run again with --verbose and inspect the logs"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Input => format!("Could not read the lead data: {}", self),
            ErrorCategory::Model => format!("Could not score leads: {}", self),
            ErrorCategory::Network => format!("Could not reach the drafting service: {}", self),
            ErrorCategory::Output => format!("Could not read or write files: {}", self),
            ErrorCategory::Processing => format!("Processing failed: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;
