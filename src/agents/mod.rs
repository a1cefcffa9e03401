//! 撰寫跟進信與替 lead 評分的 agent。
//!
//! 流程只依賴 [`EmailDrafter`](crate::domain::ports::EmailDrafter) 與
//! [`LeadScorer`](crate::domain::ports::LeadScorer)；這裡提供離線模板版本
//! 與 OpenAI 相容 `/chat/completions` 端點版本，以及只印出內容的寄信工具。

pub mod chat;
pub mod drafter;
pub mod email_tool;
pub mod scorer;
pub mod template;

use crate::domain::ports::EmailDrafter;
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};

pub use chat::{ChatClient, ChatCompletionDrafter, LlmSettings};
pub use drafter::TemplateDrafter;
pub use email_tool::{EmailTool, Outbox};
pub use scorer::ChatCompletionScorer;
pub use template::render_template;

/// Agent 的角色設定，組成 system prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentProfile {
    pub role: String,
    pub goal: String,
    pub backstory: String,
}

impl Default for AgentProfile {
    fn default() -> Self {
        Self {
            role: "Email Follow-up Agent".to_string(),
            goal: "Write short, personalized follow-up emails that move engaged leads toward a sales conversation".to_string(),
            backstory: "You are a B2B sales development representative who knows which product features matter to each industry and never sends generic copy.".to_string(),
        }
    }
}

impl AgentProfile {
    /// 為 shortlist 評分的 agent
    pub fn lead_scoring() -> Self {
        Self {
            role: "Lead Scoring Agent".to_string(),
            goal: "Score each shortlisted lead from 0 to 100 by how likely they are to convert, with a one sentence reason".to_string(),
            backstory: "You are a revenue operations analyst who reads engagement data and company context to decide where sales should spend its time.".to_string(),
        }
    }

    pub fn system_prompt(&self) -> String {
        format!(
            "You are {}.\nGoal: {}\n{}",
            self.role, self.goal, self.backstory
        )
    }
}

/// 任務描述，`{first_name}` 等佔位符會以 lead 資料替換
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskTemplate {
    pub description: String,
    pub expected_output: String,
}

impl Default for TaskTemplate {
    fn default() -> Self {
        Self {
            description: "Draft a follow-up email to {first_name} {last_name} ({lead_email}) at {company_name}, lead {lead_id}. They are one of our most engaged leads this week. Thank them for their interest and propose a 20 minute call.".to_string(),
            expected_output: "Email content generated for follow-up. Start with a line 'Subject: ...' followed by the body.".to_string(),
        }
    }
}

impl TaskTemplate {
    /// 評分任務，`{candidates}` 是候選人的 JSON 陣列
    pub fn score_leads() -> Self {
        Self {
            description: "Evaluate the following leads and score each one from 0 to 100 based on engagement, seniority, industry and funding stage.\n\nLeads:\n{candidates}".to_string(),
            expected_output: "A JSON array with one object per lead: {\"id\": <lead id>, \"score\": <integer 0-100>, \"reason\": <short reason>}. Return only the JSON.".to_string(),
        }
    }
}

/// 離線模板的主旨與內文
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftTemplate {
    pub subject: String,
    pub body: String,
}

impl Default for DraftTemplate {
    fn default() -> Self {
        Self {
            subject: "Following up on your interest, {first_name}".to_string(),
            body: "Hi {first_name},\n\nThanks for spending time with us recently. Teams like {company_name} usually get the most value once they see the platform on their own data, so I'd love to set up a short call this week.\n\nWould Thursday or Friday work for you?\n\nBest regards".to_string(),
        }
    }
}

/// 有 LLM 設定時使用 chat completion，否則退回離線模板
pub fn build_drafter(
    llm: Option<LlmSettings>,
    agent: AgentProfile,
    task: TaskTemplate,
    template: DraftTemplate,
) -> Result<Box<dyn EmailDrafter>> {
    match llm {
        Some(settings) => Ok(Box::new(ChatCompletionDrafter::new(settings, agent, task)?)),
        None => Ok(Box::new(TemplateDrafter::new(template))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_drafter_selects_backend() {
        let offline = build_drafter(
            None,
            AgentProfile::default(),
            TaskTemplate::default(),
            DraftTemplate::default(),
        )
        .unwrap();
        assert_eq!(offline.name(), "template");

        let llm = build_drafter(
            Some(LlmSettings::new("http://localhost:11434/v1", "llama3")),
            AgentProfile::default(),
            TaskTemplate::default(),
            DraftTemplate::default(),
        )
        .unwrap();
        assert_eq!(llm.name(), "llama3");
    }

    #[test]
    fn test_scoring_task_keeps_score_fields() {
        let task = TaskTemplate::score_leads();
        assert!(task.description.contains("{candidates}"));
        assert!(task.expected_output.contains("\"score\""));
        assert!(AgentProfile::lead_scoring()
            .system_prompt()
            .starts_with("You are Lead Scoring Agent."));
    }

    #[test]
    fn test_system_prompt_includes_profile() {
        let prompt = AgentProfile::default().system_prompt();
        assert!(prompt.starts_with("You are Email Follow-up Agent."));
        assert!(prompt.contains("Goal: "));
    }
}
