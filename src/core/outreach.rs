use crate::agents::Outbox;
use crate::core::pipeline::read_prediction_rows;
use crate::core::{EmailDrafter, Storage};
use crate::domain::model::{EmailContext, EmailDraft, PredictionRow};
use crate::utils::error::Result;
use serde::Serialize;

/// 由姓名與公司推導信箱：`first.last@company.com`，全小寫、去除空白
pub fn lead_email(first_name: &str, last_name: &str, company_name: &str) -> String {
    let clean = |value: &str| -> String {
        value
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect()
    };
    format!(
        "{}.{}@{}.com",
        clean(first_name),
        clean(last_name),
        clean(company_name)
    )
}

pub fn email_context(row: &PredictionRow) -> EmailContext {
    EmailContext {
        lead_id: row.lead_id.clone(),
        lead_email: lead_email(&row.first_name, &row.last_name, &row.company_name),
        first_name: row.first_name.clone(),
        last_name: row.last_name.clone(),
        company_name: row.company_name.clone(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DraftFailure {
    pub lead_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OutreachReport {
    pub drafts: Vec<EmailDraft>,
    pub failures: Vec<DraftFailure>,
}

impl OutreachReport {
    pub fn attempted(&self) -> usize {
        self.drafts.len() + self.failures.len()
    }
}

/// 為 shortlist 中的每位 lead 撰寫並送出跟進信
pub struct EmailOutreach<S: Storage> {
    storage: S,
    drafter: Box<dyn EmailDrafter>,
    outbox: Box<dyn Outbox>,
}

impl<S: Storage> EmailOutreach<S> {
    pub fn new(storage: S, drafter: Box<dyn EmailDrafter>, outbox: Box<dyn Outbox>) -> Self {
        Self {
            storage,
            drafter,
            outbox,
        }
    }

    /// 讀取 shortlist CSV 並逐筆撰寫
    pub async fn draft_from_csv(&self, path: &str) -> Result<OutreachReport> {
        let data = self.storage.read_file(path).await?;
        let rows = read_prediction_rows(&data)?;
        tracing::info!(
            "✍️  Drafting follow-up emails for {} leads with '{}'",
            rows.len(),
            self.drafter.name()
        );
        Ok(self.draft_all(rows.iter().map(email_context)).await)
    }

    /// 單筆失敗只記錄下來，其餘 lead 繼續處理
    pub async fn draft_all<I>(&self, contexts: I) -> OutreachReport
    where
        I: IntoIterator<Item = EmailContext>,
    {
        let mut report = OutreachReport::default();

        for context in contexts {
            tracing::debug!("Processing lead: {:?}", context);
            let outcome = match self.drafter.draft(&context).await {
                Ok(draft) => self.outbox.deliver(&draft).map(|status| (draft, status)),
                Err(e) => Err(e),
            };

            match outcome {
                Ok((draft, status)) => {
                    tracing::debug!("Lead {}: {}", context.lead_id, status);
                    report.drafts.push(draft);
                }
                Err(e) => {
                    tracing::warn!(
                        "❌ Error while generating email draft for lead {}: {}",
                        context.lead_id,
                        e
                    );
                    report.failures.push(DraftFailure {
                        lead_id: context.lead_id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        report
    }

    pub async fn save_report(&self, report: &OutreachReport, path: &str) -> Result<()> {
        let json = serde_json::to_vec_pretty(report)?;
        self.storage.write_file(path, &json).await
    }
}
