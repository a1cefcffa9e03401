use crate::agents::{render_template, AgentProfile, TaskTemplate};
use crate::domain::model::{EmailContext, EmailDraft};
use crate::domain::ports::EmailDrafter;
use crate::utils::error::{FlowError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_range, validate_url, Validate};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    /// OpenAI 相容 API 的 base URL，例如 `https://api.openai.com/v1`
    pub endpoint: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    512
}

fn default_timeout_seconds() -> u64 {
    60
}

impl LlmSettings {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_seconds: default_timeout_seconds(),
        }
    }

    fn completions_url(&self) -> String {
        if self.endpoint.ends_with('/') {
            format!("{}chat/completions", self.endpoint)
        } else {
            format!("{}/chat/completions", self.endpoint)
        }
    }
}

impl Validate for LlmSettings {
    fn validate(&self) -> Result<()> {
        validate_url("outreach.llm.endpoint", &self.endpoint)?;
        validate_non_empty_string("outreach.llm.model", &self.model)?;
        validate_range("outreach.llm.temperature", self.temperature, 0.0, 2.0)?;
        Ok(())
    }
}

/// OpenAI 相容 `/chat/completions` 客戶端，撰信與評分共用
pub struct ChatClient {
    client: Client,
    settings: LlmSettings,
}

impl ChatClient {
    pub fn new(settings: LlmSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;
        Ok(Self { client, settings })
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    /// 送出 system + user 兩則訊息，回傳去除空白後的回覆
    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let body = json!({
            "model": self.settings.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ],
            "max_tokens": self.settings.max_tokens,
            "temperature": self.settings.temperature,
        });

        let mut request = self.client.post(self.settings.completions_url()).json(&body);
        if let Some(api_key) = self.settings.api_key.as_deref().filter(|k| !k.is_empty()) {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(FlowError::LlmError {
                message: format!("API error ({}): {}", status, text),
            });
        }

        let json: serde_json::Value = response.json().await?;
        json["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| FlowError::LlmError {
                message: "Invalid response format: missing choices[0].message.content".to_string(),
            })
    }
}

/// 透過 chat completion 端點撰寫跟進信
pub struct ChatCompletionDrafter {
    chat: ChatClient,
    agent: AgentProfile,
    task: TaskTemplate,
}

impl ChatCompletionDrafter {
    pub fn new(settings: LlmSettings, agent: AgentProfile, task: TaskTemplate) -> Result<Self> {
        Ok(Self {
            chat: ChatClient::new(settings)?,
            agent,
            task,
        })
    }

    fn user_prompt(&self, context: &EmailContext) -> String {
        let fields = context.fields();
        format!(
            "{}\n\nExpected output: {}",
            render_template(&self.task.description, &fields),
            render_template(&self.task.expected_output, &fields)
        )
    }
}

/// 把 "Subject: ..." 開頭的回覆拆成主旨與內文
pub fn split_subject(content: &str) -> (Option<String>, String) {
    let mut lines = content.lines();
    match lines.next() {
        Some(first) => {
            let trimmed = first.trim();
            let lower = trimmed.to_ascii_lowercase();
            if lower.starts_with("subject:") {
                let subject = trimmed["subject:".len()..].trim().to_string();
                let body = lines.collect::<Vec<_>>().join("\n").trim().to_string();
                (Some(subject).filter(|s| !s.is_empty()), body)
            } else {
                (None, content.trim().to_string())
            }
        }
        None => (None, String::new()),
    }
}

#[async_trait]
impl EmailDrafter for ChatCompletionDrafter {
    fn name(&self) -> &str {
        self.chat.model()
    }

    async fn draft(&self, context: &EmailContext) -> Result<EmailDraft> {
        tracing::debug!("Requesting draft for lead {}", context.lead_id);
        let content = self
            .chat
            .complete(&self.agent.system_prompt(), &self.user_prompt(context))
            .await
            .map_err(|e| FlowError::DraftingError {
                lead_id: context.lead_id.clone(),
                message: e.to_string(),
            })?;
        let (subject, body) = split_subject(&content);

        Ok(EmailDraft {
            context: context.clone(),
            subject: subject
                .unwrap_or_else(|| format!("Following up, {}", context.first_name)),
            body,
            drafter: self.name().to_string(),
            generated_at: Utc::now(),
        })
    }
}
