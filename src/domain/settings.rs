use crate::domain::model::LeadCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 互動分數的權重
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementWeights {
    pub website_visits: f64,
    pub content_downloads: f64,
    pub time_spent: f64,
    pub actions_platform: f64,
    pub event_attendance: f64,
    pub product_trials: f64,
}

impl Default for EngagementWeights {
    fn default() -> Self {
        Self {
            website_visits: 0.10,
            content_downloads: 0.10,
            time_spent: 0.10,
            actions_platform: 0.10,
            event_attendance: 0.20,
            product_trials: 0.25,
        }
    }
}

impl EngagementWeights {
    pub fn entries(&self) -> [(&'static str, f64); 6] {
        [
            ("website_visits", self.website_visits),
            ("content_downloads", self.content_downloads),
            ("time_spent", self.time_spent),
            ("actions_platform", self.actions_platform),
            ("event_attendance", self.event_attendance),
            ("product_trials", self.product_trials),
        ]
    }

    pub fn total(&self) -> f64 {
        self.entries().iter().map(|(_, w)| w).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortlistSettings {
    pub category: LeadCategory,
    pub top_n: usize,
}

impl Default for ShortlistSettings {
    fn default() -> Self {
        Self {
            category: LeadCategory::Easy,
            top_n: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputFiles {
    pub predictions: String,
    pub shortlist: String,
    pub drafts: String,
    pub scores: String,
}

impl Default for OutputFiles {
    fn default() -> Self {
        Self {
            predictions: "predicted_leads.csv".to_string(),
            shortlist: "top_3_leads.csv".to_string(),
            drafts: "email_drafts.json".to_string(),
            scores: "lead_scores.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveSettings {
    pub enabled: bool,
    pub filename: String,
}

/// 固定的類別字典：欄位名稱 -> 依編碼順序排列的標籤
pub type CategoricalVocabulary = BTreeMap<String, Vec<String>>;
