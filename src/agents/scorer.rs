use crate::agents::chat::ChatClient;
use crate::agents::{render_template, AgentProfile, LlmSettings, TaskTemplate};
use crate::core::candidates::parse_candidate_scores;
use crate::domain::model::{Candidate, CandidateScore};
use crate::domain::ports::LeadScorer;
use crate::utils::error::Result;
use async_trait::async_trait;

/// 請 chat completion 端點一次為整份 shortlist 評分
pub struct ChatCompletionScorer {
    chat: ChatClient,
    agent: AgentProfile,
    task: TaskTemplate,
}

impl ChatCompletionScorer {
    pub fn new(settings: LlmSettings, agent: AgentProfile, task: TaskTemplate) -> Result<Self> {
        Ok(Self {
            chat: ChatClient::new(settings)?,
            agent,
            task,
        })
    }

    /// `{candidates}` 會被替換成候選人的 JSON 陣列
    fn user_prompt(&self, candidates: &[Candidate]) -> Result<String> {
        let listing = serde_json::to_string_pretty(candidates)?;
        let fields = [("candidates", listing.as_str())];
        Ok(format!(
            "{}\n\nExpected output: {}",
            render_template(&self.task.description, &fields),
            render_template(&self.task.expected_output, &fields)
        ))
    }
}

/// 去掉回覆外層的 markdown code fence
pub fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    }
}

#[async_trait]
impl LeadScorer for ChatCompletionScorer {
    fn name(&self) -> &str {
        self.chat.model()
    }

    async fn score(&self, candidates: &[Candidate]) -> Result<Vec<CandidateScore>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!("Requesting scores for {} leads", candidates.len());
        let prompt = self.user_prompt(candidates)?;
        let reply = self
            .chat
            .complete(&self.agent.system_prompt(), &prompt)
            .await?;
        parse_candidate_scores(strip_code_fence(&reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> ChatCompletionScorer {
        ChatCompletionScorer::new(
            LlmSettings::new("http://localhost/v1", "test-model"),
            AgentProfile::lead_scoring(),
            TaskTemplate::score_leads(),
        )
        .unwrap()
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n[]\n```"), "[]");
        assert_eq!(strip_code_fence("```\n{\"id\": \"1\"}\n```"), "{\"id\": \"1\"}");
        assert_eq!(strip_code_fence("  [1, 2] "), "[1, 2]");
    }

    #[test]
    fn test_user_prompt_lists_candidates() {
        let prompt = scorer()
            .user_prompt(&[Candidate {
                id: "L-9".to_string(),
                name: "Grace Hopper".to_string(),
                email: "grace.hopper@navy.com".to_string(),
                bio: "Director at Navy".to_string(),
                skills: "engagement 0.72".to_string(),
            }])
            .unwrap();
        assert!(prompt.contains("\"id\": \"L-9\""));
        assert!(prompt.contains("Grace Hopper"));
        assert!(!prompt.contains("{candidates}"));
    }

    #[tokio::test]
    async fn test_empty_shortlist_skips_request() {
        // 沒有 lead 時不會連線
        let scores = scorer().score(&[]).await.unwrap();
        assert!(scores.is_empty());
    }
}
