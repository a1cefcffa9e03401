use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// 原始名單 CSV 的一列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    #[serde(rename = "Lead ID")]
    pub lead_id: String,
    #[serde(rename = "First Name")]
    pub first_name: String,
    #[serde(rename = "Last Name")]
    pub last_name: String,
    #[serde(rename = "Company Name")]
    pub company_name: String,
    #[serde(rename = "Website Visits")]
    pub website_visits: f64,
    #[serde(rename = "Content Downloads")]
    pub content_downloads: f64,
    #[serde(rename = "Time Spent (mins)")]
    pub time_spent_mins: f64,
    #[serde(rename = "Actions on Platform")]
    pub actions_on_platform: f64,
    #[serde(rename = "Event Attendance")]
    pub event_attendance: f64,
    #[serde(
        rename = "Product Trials Initiated",
        deserialize_with = "deserialize_flag"
    )]
    pub product_trials_initiated: bool,
    #[serde(rename = "Seniority Level")]
    pub seniority_level: String,
    #[serde(rename = "Industry")]
    pub industry: String,
    #[serde(rename = "Funding Stage")]
    pub funding_stage: String,
}

/// 接受 true/false、yes/no、1/0（不分大小寫）
fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flag(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("expected a boolean flag, found '{}'", raw))
    })
}

pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "1.0" => Some(true),
        "false" | "no" | "n" | "0" | "0.0" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EngagementFeatures {
    pub norm_website_visits: f64,
    pub norm_content_downloads: f64,
    pub norm_time_spent: f64,
    pub norm_actions_platform: f64,
    pub norm_event_attendance: f64,
    pub norm_product_trials: f64,
    pub engagement_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EncodedCategoricals {
    pub seniority_level: usize,
    pub industry: usize,
    pub funding_stage: usize,
}

/// 模型輸入的特徵向量，順序固定
pub type FeatureVector = [f64; FEATURE_COUNT];

pub const FEATURE_COUNT: usize = 9;

pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "Norm_Website_Visits",
    "Norm_Content_Downloads",
    "Norm_Time_Spent",
    "Norm_Actions_Platform",
    "Norm_Event_Attendance",
    "Norm_Product_Trials",
    "Seniority Level",
    "Industry",
    "Funding Stage",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeadCategory {
    Difficult,
    Easy,
    Medium,
}

impl LeadCategory {
    pub fn from_class_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(LeadCategory::Difficult),
            1 => Some(LeadCategory::Easy),
            2 => Some(LeadCategory::Medium),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadCategory::Difficult => "Difficult",
            LeadCategory::Easy => "Easy",
            LeadCategory::Medium => "Medium",
        }
    }
}

impl fmt::Display for LeadCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LeadCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "difficult" => Ok(LeadCategory::Difficult),
            "easy" => Ok(LeadCategory::Easy),
            "medium" => Ok(LeadCategory::Medium),
            other => Err(format!(
                "unknown lead category '{}' (expected Difficult, Easy or Medium)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredLead {
    pub record: LeadRecord,
    pub features: EngagementFeatures,
    pub codes: EncodedCategoricals,
    pub category: LeadCategory,
}

impl ScoredLead {
    pub fn feature_vector(&self) -> FeatureVector {
        feature_vector(&self.features, &self.codes)
    }

    pub fn to_row(&self) -> PredictionRow {
        let r = &self.record;
        PredictionRow {
            lead_id: r.lead_id.clone(),
            first_name: r.first_name.clone(),
            last_name: r.last_name.clone(),
            company_name: r.company_name.clone(),
            website_visits: r.website_visits,
            content_downloads: r.content_downloads,
            time_spent_mins: r.time_spent_mins,
            actions_on_platform: r.actions_on_platform,
            event_attendance: r.event_attendance,
            product_trials_initiated: r.product_trials_initiated,
            seniority_level: r.seniority_level.clone(),
            industry: r.industry.clone(),
            funding_stage: r.funding_stage.clone(),
            norm_website_visits: self.features.norm_website_visits,
            norm_content_downloads: self.features.norm_content_downloads,
            norm_time_spent: self.features.norm_time_spent,
            norm_actions_platform: self.features.norm_actions_platform,
            norm_event_attendance: self.features.norm_event_attendance,
            norm_product_trials: self.features.norm_product_trials,
            engagement_score: self.features.engagement_score,
            seniority_level_code: self.codes.seniority_level,
            industry_code: self.codes.industry,
            funding_stage_code: self.codes.funding_stage,
            predicted_lead_category: self.category,
        }
    }
}

pub fn feature_vector(features: &EngagementFeatures, codes: &EncodedCategoricals) -> FeatureVector {
    [
        features.norm_website_visits,
        features.norm_content_downloads,
        features.norm_time_spent,
        features.norm_actions_platform,
        features.norm_event_attendance,
        features.norm_product_trials,
        codes.seniority_level as f64,
        codes.industry as f64,
        codes.funding_stage as f64,
    ]
}

/// 預測結果 CSV 與 shortlist CSV 共用的欄位格式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRow {
    #[serde(rename = "Lead ID")]
    pub lead_id: String,
    #[serde(rename = "First Name")]
    pub first_name: String,
    #[serde(rename = "Last Name")]
    pub last_name: String,
    #[serde(rename = "Company Name")]
    pub company_name: String,
    #[serde(rename = "Website Visits")]
    pub website_visits: f64,
    #[serde(rename = "Content Downloads")]
    pub content_downloads: f64,
    #[serde(rename = "Time Spent (mins)")]
    pub time_spent_mins: f64,
    #[serde(rename = "Actions on Platform")]
    pub actions_on_platform: f64,
    #[serde(rename = "Event Attendance")]
    pub event_attendance: f64,
    #[serde(
        rename = "Product Trials Initiated",
        deserialize_with = "deserialize_flag"
    )]
    pub product_trials_initiated: bool,
    #[serde(rename = "Seniority Level")]
    pub seniority_level: String,
    #[serde(rename = "Industry")]
    pub industry: String,
    #[serde(rename = "Funding Stage")]
    pub funding_stage: String,
    #[serde(rename = "Norm_Website_Visits")]
    pub norm_website_visits: f64,
    #[serde(rename = "Norm_Content_Downloads")]
    pub norm_content_downloads: f64,
    #[serde(rename = "Norm_Time_Spent")]
    pub norm_time_spent: f64,
    #[serde(rename = "Norm_Actions_Platform")]
    pub norm_actions_platform: f64,
    #[serde(rename = "Norm_Event_Attendance")]
    pub norm_event_attendance: f64,
    #[serde(rename = "Norm_Product_Trials")]
    pub norm_product_trials: f64,
    #[serde(rename = "Engagement_Score")]
    pub engagement_score: f64,
    #[serde(rename = "Seniority Level Code")]
    pub seniority_level_code: usize,
    #[serde(rename = "Industry Code")]
    pub industry_code: usize,
    #[serde(rename = "Funding Stage Code")]
    pub funding_stage_code: usize,
    #[serde(rename = "Predicted Lead Category")]
    pub predicted_lead_category: LeadCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub email: String,
    pub bio: String,
    pub skills: String,
}

/// 評分 agent 回傳的結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub id: String,
    pub score: i64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub id: String,
    pub name: String,
    pub email: String,
    pub bio: String,
    pub skills: String,
    pub score: i64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailContext {
    pub lead_id: String,
    pub lead_email: String,
    pub first_name: String,
    pub last_name: String,
    pub company_name: String,
}

impl EmailContext {
    /// 以 (key, value) 形式提供給模板替換
    pub fn fields(&self) -> [(&'static str, &str); 5] {
        [
            ("lead_id", self.lead_id.as_str()),
            ("lead_email", self.lead_email.as_str()),
            ("first_name", self.first_name.as_str()),
            ("last_name", self.last_name.as_str()),
            ("company_name", self.company_name.as_str()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailDraft {
    pub context: EmailContext,
    pub subject: String,
    pub body: String,
    pub drafter: String,
    pub generated_at: DateTime<Utc>,
}

/// 一次 transform 的結果
#[derive(Debug, Clone)]
pub struct TransformResult {
    pub scored_leads: Vec<ScoredLead>,
    pub shortlist: Vec<ScoredLead>,
}

impl TransformResult {
    /// 各預測類別的筆數，依 Difficult, Easy, Medium 排列
    pub fn category_counts(&self) -> Vec<(String, usize)> {
        [LeadCategory::Difficult, LeadCategory::Easy, LeadCategory::Medium]
            .into_iter()
            .map(|category| {
                let count = self
                    .scored_leads
                    .iter()
                    .filter(|lead| lead.category == category)
                    .count();
                (category.to_string(), count)
            })
            .collect()
    }
}
