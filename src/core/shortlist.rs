use crate::domain::model::ScoredLead;
use crate::domain::settings::ShortlistSettings;

/// 篩出指定類別後依互動分數取前 N 名
///
/// 分數由高到低；同分時保留輸入順序在前者（與 pandas `nlargest(keep="first")` 一致）。
pub fn shortlist(leads: &[ScoredLead], settings: &ShortlistSettings) -> Vec<ScoredLead> {
    if settings.top_n == 0 {
        return Vec::new();
    }

    let mut candidates: Vec<&ScoredLead> = leads
        .iter()
        .filter(|lead| lead.category == settings.category)
        .collect();

    // sort_by 是穩定排序
    candidates.sort_by(|a, b| {
        b.features
            .engagement_score
            .total_cmp(&a.features.engagement_score)
    });

    candidates
        .into_iter()
        .take(settings.top_n)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{EncodedCategoricals, EngagementFeatures, LeadCategory, LeadRecord};

    fn scored(id: &str, score: f64, category: LeadCategory) -> ScoredLead {
        ScoredLead {
            record: LeadRecord {
                lead_id: id.to_string(),
                first_name: "Grace".to_string(),
                last_name: "Hopper".to_string(),
                company_name: "Navy".to_string(),
                website_visits: 0.0,
                content_downloads: 0.0,
                time_spent_mins: 0.0,
                actions_on_platform: 0.0,
                event_attendance: 0.0,
                product_trials_initiated: false,
                seniority_level: "VP".to_string(),
                industry: "Defense".to_string(),
                funding_stage: "Public".to_string(),
            },
            features: EngagementFeatures {
                engagement_score: score,
                ..EngagementFeatures::default()
            },
            codes: EncodedCategoricals::default(),
            category,
        }
    }

    fn ids(leads: &[ScoredLead]) -> Vec<&str> {
        leads.iter().map(|l| l.record.lead_id.as_str()).collect()
    }

    #[test]
    fn test_filters_category_and_sorts_descending() {
        let leads = vec![
            scored("a", 0.30, LeadCategory::Easy),
            scored("b", 0.90, LeadCategory::Medium),
            scored("c", 0.70, LeadCategory::Easy),
            scored("d", 0.50, LeadCategory::Easy),
            scored("e", 0.10, LeadCategory::Easy),
        ];

        let top = shortlist(&leads, &ShortlistSettings::default());
        assert_eq!(ids(&top), vec!["c", "d", "a"]);
    }

    #[test]
    fn test_ties_keep_first_occurrence() {
        let leads = vec![
            scored("a", 0.5, LeadCategory::Easy),
            scored("b", 0.8, LeadCategory::Easy),
            scored("c", 0.5, LeadCategory::Easy),
            scored("d", 0.5, LeadCategory::Easy),
        ];

        let top = shortlist(&leads, &ShortlistSettings::default());
        assert_eq!(ids(&top), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_fewer_matches_than_requested() {
        let leads = vec![
            scored("a", 0.5, LeadCategory::Difficult),
            scored("b", 0.8, LeadCategory::Easy),
        ];

        let top = shortlist(&leads, &ShortlistSettings::default());
        assert_eq!(ids(&top), vec!["b"]);
    }

    #[test]
    fn test_zero_top_n() {
        let leads = vec![scored("a", 0.5, LeadCategory::Easy)];
        let settings = ShortlistSettings {
            category: LeadCategory::Easy,
            top_n: 0,
        };
        assert!(shortlist(&leads, &settings).is_empty());
    }

    #[test]
    fn test_other_category() {
        let leads = vec![
            scored("a", 0.5, LeadCategory::Medium),
            scored("b", 0.8, LeadCategory::Easy),
            scored("c", 0.6, LeadCategory::Medium),
        ];
        let settings = ShortlistSettings {
            category: LeadCategory::Medium,
            top_n: 1,
        };
        assert_eq!(ids(&shortlist(&leads, &settings)), vec!["c"]);
    }
}
