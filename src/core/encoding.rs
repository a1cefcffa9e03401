use crate::domain::model::{EncodedCategoricals, LeadRecord};
use crate::domain::settings::CategoricalVocabulary;
use crate::utils::error::{FlowError, Result};
use std::collections::BTreeSet;

pub const SENIORITY_LEVEL: &str = "Seniority Level";
pub const INDUSTRY: &str = "Industry";
pub const FUNDING_STAGE: &str = "Funding Stage";

/// 依排序後的唯一值給予編碼（與 scikit-learn 的 LabelEncoder 相同）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEncoder {
    column: String,
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<'a, I>(column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let classes: BTreeSet<&str> = values.into_iter().collect();
        Self {
            column: column.to_string(),
            classes: classes.into_iter().map(str::to_string).collect(),
        }
    }

    /// 使用固定字典，順序即為編碼
    pub fn with_classes(column: &str, classes: Vec<String>) -> Self {
        Self {
            column: column.to_string(),
            classes,
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn transform(&self, label: &str) -> Result<usize> {
        self.classes
            .iter()
            .position(|c| c == label)
            .ok_or_else(|| FlowError::UnknownLabelError {
                column: self.column.clone(),
                label: label.to_string(),
            })
    }
}

/// 三個類別欄位的編碼器
#[derive(Debug, Clone)]
pub struct CategoricalEncoders {
    pub seniority_level: LabelEncoder,
    pub industry: LabelEncoder,
    pub funding_stage: LabelEncoder,
}

impl CategoricalEncoders {
    /// 有字典的欄位用字典，其餘欄位依本次資料 fit
    pub fn build(records: &[LeadRecord], vocabulary: Option<&CategoricalVocabulary>) -> Self {
        let encoder = |column: &str, get: fn(&LeadRecord) -> &str| match vocabulary
            .and_then(|v| v.get(column))
        {
            Some(classes) => LabelEncoder::with_classes(column, classes.clone()),
            None => LabelEncoder::fit(column, records.iter().map(get)),
        };

        Self {
            seniority_level: encoder(SENIORITY_LEVEL, |r| r.seniority_level.as_str()),
            industry: encoder(INDUSTRY, |r| r.industry.as_str()),
            funding_stage: encoder(FUNDING_STAGE, |r| r.funding_stage.as_str()),
        }
    }

    pub fn encode(&self, record: &LeadRecord) -> Result<EncodedCategoricals> {
        Ok(EncodedCategoricals {
            seniority_level: self.seniority_level.transform(&record.seniority_level)?,
            industry: self.industry.transform(&record.industry)?,
            funding_stage: self.funding_stage.transform(&record.funding_stage)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_sorts_unique_values() {
        let encoder = LabelEncoder::fit(INDUSTRY, ["SaaS", "Fintech", "SaaS", "Healthcare"]);
        assert_eq!(encoder.classes(), &["Fintech", "Healthcare", "SaaS"]);
        assert_eq!(encoder.transform("Fintech").unwrap(), 0);
        assert_eq!(encoder.transform("SaaS").unwrap(), 2);
    }

    #[test]
    fn test_sorting_is_case_sensitive() {
        let encoder = LabelEncoder::fit(SENIORITY_LEVEL, ["manager", "Director", "VP"]);
        assert_eq!(encoder.classes(), &["Director", "VP", "manager"]);
    }

    #[test]
    fn test_unknown_label_is_error() {
        let encoder = LabelEncoder::with_classes(
            FUNDING_STAGE,
            vec!["Seed".to_string(), "Series A".to_string()],
        );
        match encoder.transform("IPO") {
            Err(FlowError::UnknownLabelError { column, label }) => {
                assert_eq!(column, FUNDING_STAGE);
                assert_eq!(label, "IPO");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
