use crate::core::outreach::lead_email;
use crate::core::pipeline::read_prediction_rows;
use crate::core::{LeadScorer, Storage};
use crate::domain::model::{Candidate, CandidateScore, PredictionRow, ScoredCandidate};
use crate::utils::error::{FlowError, Result};
use std::collections::HashMap;

/// shortlist 的一列轉成評分 agent 的輸入；`skills` 放互動摘要
pub fn candidate_from_row(row: &PredictionRow) -> Candidate {
    Candidate {
        id: row.lead_id.clone(),
        name: format!("{} {}", row.first_name, row.last_name),
        email: lead_email(&row.first_name, &row.last_name, &row.company_name),
        bio: format!(
            "{} at {} ({}, {})",
            row.seniority_level, row.company_name, row.industry, row.funding_stage
        ),
        skills: format!(
            "engagement score {:.2}; {} website visits, {} content downloads, {} minutes on site, {} platform actions, {} events attended, product trial: {}",
            row.engagement_score,
            row.website_visits,
            row.content_downloads,
            row.time_spent_mins,
            row.actions_on_platform,
            row.event_attendance,
            if row.product_trials_initiated { "yes" } else { "no" }
        ),
    }
}

/// 依 id 合併候選人與評分，沒有評分的候選人會被略過
pub fn combine_candidates_with_scores(
    candidates: &[Candidate],
    scores: &[CandidateScore],
) -> Vec<ScoredCandidate> {
    let by_id: HashMap<&str, &CandidateScore> =
        scores.iter().map(|s| (s.id.as_str(), s)).collect();

    candidates
        .iter()
        .filter_map(|candidate| {
            let score = by_id.get(candidate.id.as_str())?;
            Some(ScoredCandidate {
                id: candidate.id.clone(),
                name: candidate.name.clone(),
                email: candidate.email.clone(),
                bio: candidate.bio.clone(),
                skills: candidate.skills.clone(),
                score: score.score,
                reason: score.reason.clone(),
            })
        })
        .collect()
}

/// 解析評分 agent 的 JSON 輸出（單一物件或陣列）
pub fn parse_candidate_scores(raw: &str) -> Result<Vec<CandidateScore>> {
    let value: serde_json::Value = serde_json::from_str(raw.trim())?;
    match value {
        serde_json::Value::Array(_) => Ok(serde_json::from_value(value)?),
        serde_json::Value::Object(_) => Ok(vec![serde_json::from_value(value)?]),
        other => Err(FlowError::ProcessingError {
            message: format!("expected candidate score object or array, found {}", other),
        }),
    }
}

/// 讀取 shortlist CSV，交給評分 agent，再依 id 合併結果
pub struct LeadScoring<S: Storage> {
    storage: S,
    scorer: Box<dyn LeadScorer>,
}

impl<S: Storage> LeadScoring<S> {
    pub fn new(storage: S, scorer: Box<dyn LeadScorer>) -> Self {
        Self { storage, scorer }
    }

    pub async fn score_from_csv(&self, path: &str) -> Result<Vec<ScoredCandidate>> {
        let data = self.storage.read_file(path).await?;
        let candidates: Vec<Candidate> = read_prediction_rows(&data)?
            .iter()
            .map(candidate_from_row)
            .collect();
        tracing::info!(
            "🧮 Scoring {} shortlisted leads with '{}'",
            candidates.len(),
            self.scorer.name()
        );

        let scores = self.scorer.score(&candidates).await?;
        let scored = combine_candidates_with_scores(&candidates, &scores);
        if scored.len() < candidates.len() {
            tracing::warn!(
                "⚠️  {} of {} leads came back without a score",
                candidates.len() - scored.len(),
                candidates.len()
            );
        }
        Ok(scored)
    }

    pub async fn save_scores(&self, scored: &[ScoredCandidate], path: &str) -> Result<()> {
        let json = serde_json::to_vec_pretty(scored)?;
        self.storage.write_file(path, &json).await
    }
}
