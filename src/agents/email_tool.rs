use crate::domain::model::EmailDraft;
use crate::utils::error::Result;

/// 草稿的去處
pub trait Outbox: Send + Sync {
    fn deliver(&self, draft: &EmailDraft) -> Result<String>;
}

/// 寄信工具的替身：只記錄並印出內容，不會真的寄出
#[derive(Debug, Clone)]
pub struct EmailTool {
    pub name: String,
    pub description: String,
    quiet: bool,
}

impl Default for EmailTool {
    fn default() -> Self {
        Self {
            name: "Email Tool".to_string(),
            description: "A tool for creating and sending emails to leads.".to_string(),
            quiet: false,
        }
    }
}

impl EmailTool {
    /// 不印到 stdout，只寫日誌
    pub fn quiet() -> Self {
        Self {
            quiet: true,
            ..Self::default()
        }
    }

    pub fn send(&self, recipient: &str, subject: &str, body: &str) -> String {
        tracing::info!("✉️  Sending email to {} with subject '{}'", recipient, subject);
        if !self.quiet {
            println!(
                "Sending email to {} with subject '{}' and body:\n{}",
                recipient, subject, body
            );
        }
        "Email sent successfully.".to_string()
    }
}

impl Outbox for EmailTool {
    fn deliver(&self, draft: &EmailDraft) -> Result<String> {
        Ok(self.send(&draft.context.lead_email, &draft.subject, &draft.body))
    }
}
