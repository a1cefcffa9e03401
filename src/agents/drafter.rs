use crate::agents::{render_template, DraftTemplate};
use crate::domain::model::{EmailContext, EmailDraft};
use crate::domain::ports::EmailDrafter;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::Utc;

/// 不呼叫 LLM，直接套模板
#[derive(Debug, Clone, Default)]
pub struct TemplateDrafter {
    template: DraftTemplate,
}

impl TemplateDrafter {
    pub fn new(template: DraftTemplate) -> Self {
        Self { template }
    }
}

#[async_trait]
impl EmailDrafter for TemplateDrafter {
    fn name(&self) -> &str {
        "template"
    }

    async fn draft(&self, context: &EmailContext) -> Result<EmailDraft> {
        let fields = context.fields();
        Ok(EmailDraft {
            context: context.clone(),
            subject: render_template(&self.template.subject, &fields),
            body: render_template(&self.template.body, &fields),
            drafter: self.name().to_string(),
            generated_at: Utc::now(),
        })
    }
}
