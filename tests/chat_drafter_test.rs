use anyhow::Result;
use httpmock::prelude::*;
use lead_score_flow::agents::{AgentProfile, LlmSettings, TaskTemplate};
use lead_score_flow::core::outreach::email_context;
use lead_score_flow::core::pipeline::read_prediction_rows;
use lead_score_flow::domain::model::EmailContext;
use lead_score_flow::domain::ports::EmailDrafter;
use lead_score_flow::{ChatCompletionDrafter, EmailOutreach, EmailTool, FlowError, LocalStorage};
use serde_json::json;
use tempfile::TempDir;

fn context(lead_id: &str, first_name: &str) -> EmailContext {
    EmailContext {
        lead_id: lead_id.to_string(),
        lead_email: format!("{}.lovelace@engines.com", first_name.to_lowercase()),
        first_name: first_name.to_string(),
        last_name: "Lovelace".to_string(),
        company_name: "Engines".to_string(),
    }
}

fn drafter(server: &MockServer, api_key: Option<&str>) -> Result<ChatCompletionDrafter> {
    let mut settings = LlmSettings::new(server.url("/v1"), "test-model");
    settings.api_key = api_key.map(str::to_string);
    Ok(ChatCompletionDrafter::new(
        settings,
        AgentProfile::default(),
        TaskTemplate::default(),
    )?)
}

#[tokio::test]
async fn test_chat_drafter_sends_prompt_and_parses_reply() -> Result<()> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .header("authorization", "Bearer sk-test")
            .body_contains("\"model\":\"test-model\"")
            .body_contains("Email Follow-up Agent")
            .body_contains("Ada Lovelace (ada.lovelace@engines.com) at Engines");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": "Subject: Great to connect, Ada\n\nHi Ada,\nThanks for trying the product."
                    }
                }]
            }));
    });

    let draft = drafter(&server, Some("sk-test"))?
        .draft(&context("L-1", "Ada"))
        .await?;

    mock.assert();
    assert_eq!(draft.subject, "Great to connect, Ada");
    assert_eq!(draft.body, "Hi Ada,\nThanks for trying the product.");
    assert_eq!(draft.drafter, "test-model");
    assert_eq!(draft.context.lead_id, "L-1");
    Ok(())
}

#[tokio::test]
async fn test_chat_drafter_reply_without_subject_line() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200).json_body(json!({
            "choices": [{ "message": { "content": "Hi Ada, just checking in." } }]
        }));
    });

    let draft = drafter(&server, None)?.draft(&context("L-1", "Ada")).await?;
    assert_eq!(draft.subject, "Following up, Ada");
    assert_eq!(draft.body, "Hi Ada, just checking in.");
    Ok(())
}

#[tokio::test]
async fn test_chat_drafter_server_error() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(500).body("upstream overloaded");
    });

    match drafter(&server, None)?.draft(&context("L-7", "Ada")).await {
        Err(FlowError::DraftingError { lead_id, message }) => {
            assert_eq!(lead_id, "L-7");
            assert!(message.contains("500"));
            assert!(message.contains("upstream overloaded"));
        }
        other => panic!("unexpected result: {:?}", other.map(|d| d.subject)),
    }
    Ok(())
}

#[tokio::test]
async fn test_chat_drafter_malformed_response() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200).json_body(json!({ "choices": [] }));
    });

    let result = drafter(&server, None)?.draft(&context("L-1", "Ada")).await;
    assert!(matches!(result, Err(FlowError::DraftingError { .. })));
    Ok(())
}

/// 一位 lead 失敗時其他 lead 仍會完成
#[tokio::test]
async fn test_outreach_isolates_failed_leads() -> Result<()> {
    let server = MockServer::start();
    let failing = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .body_contains("lead L-002");
        then.status(503).body("try again later");
    });
    let ok = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .body_contains("lead L-001");
        then.status(200).json_body(json!({
            "choices": [{ "message": { "content": "Subject: Hello\n\nHi there" } }]
        }));
    });

    let temp_dir = TempDir::new()?;
    let shortlist_path = temp_dir.path().join("top_3_leads.csv");
    std::fs::write(
        &shortlist_path,
        "\
Lead ID,First Name,Last Name,Company Name,Website Visits,Content Downloads,Time Spent (mins),Actions on Platform,Event Attendance,Product Trials Initiated,Seniority Level,Industry,Funding Stage,Norm_Website_Visits,Norm_Content_Downloads,Norm_Time_Spent,Norm_Actions_Platform,Norm_Event_Attendance,Norm_Product_Trials,Engagement_Score,Seniority Level Code,Industry Code,Funding Stage Code,Predicted Lead Category
L-002,Alan,Turing,Bletchley Park,10,2,60,10,2,true,Manager,Security,Seed,0.5,0.4,0.5,0.33,1.0,1.0,0.67,1,1,1,Easy
L-001,Ada,Lovelace,Analytical Engines,20,5,120,30,2,true,Director,Fintech,Series A,1.0,1.0,1.0,1.0,1.0,1.0,0.85,0,0,0,Easy
",
    )?;
    let shortlist_path = shortlist_path.to_string_lossy().into_owned();

    let rows = read_prediction_rows(&std::fs::read(&shortlist_path)?)?;
    assert_eq!(email_context(&rows[0]).lead_email, "alan.turing@bletchleypark.com");

    let outreach = EmailOutreach::new(
        LocalStorage::default(),
        Box::new(drafter(&server, None)?),
        Box::new(EmailTool::quiet()),
    );
    let report = outreach.draft_from_csv(&shortlist_path).await?;

    failing.assert();
    ok.assert();
    assert_eq!(report.attempted(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].lead_id, "L-002");
    assert_eq!(report.drafts.len(), 1);
    assert_eq!(report.drafts[0].subject, "Hello");
    Ok(())
}
