use crate::domain::model::{EngagementFeatures, LeadRecord};
use crate::domain::settings::EngagementWeights;

/// 每個值除以欄位最大值
///
/// 最大值不是正的有限數時（全為 0 或含 NaN）整欄回傳 0，避免 NaN 流入模型。
pub fn normalize(values: &[f64]) -> Vec<f64> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() || max <= 0.0 {
        return vec![0.0; values.len()];
    }
    values
        .iter()
        .map(|v| if v.is_finite() { v / max } else { 0.0 })
        .collect()
}

pub fn engagement_score(features: &EngagementFeatures, weights: &EngagementWeights) -> f64 {
    weights.website_visits * features.norm_website_visits
        + weights.content_downloads * features.norm_content_downloads
        + weights.time_spent * features.norm_time_spent
        + weights.actions_platform * features.norm_actions_platform
        + weights.event_attendance * features.norm_event_attendance
        + weights.product_trials * features.norm_product_trials
}

/// 計算整張表的正規化特徵與互動分數，順序與輸入相同
pub fn preprocess(records: &[LeadRecord], weights: &EngagementWeights) -> Vec<EngagementFeatures> {
    let column = |f: fn(&LeadRecord) -> f64| -> Vec<f64> {
        normalize(&records.iter().map(f).collect::<Vec<_>>())
    };

    let visits = column(|r| r.website_visits);
    let downloads = column(|r| r.content_downloads);
    let time_spent = column(|r| r.time_spent_mins);
    let actions = column(|r| r.actions_on_platform);
    let events = column(|r| r.event_attendance);

    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let mut features = EngagementFeatures {
                norm_website_visits: visits[i],
                norm_content_downloads: downloads[i],
                norm_time_spent: time_spent[i],
                norm_actions_platform: actions[i],
                norm_event_attendance: events[i],
                // 布林值直接轉為 0/1，不做除法
                norm_product_trials: if record.product_trials_initiated { 1.0 } else { 0.0 },
                engagement_score: 0.0,
            };
            features.engagement_score = engagement_score(&features, weights);
            features
        })
        .collect()
}
