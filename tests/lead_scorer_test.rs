use anyhow::Result;
use httpmock::prelude::*;
use lead_score_flow::agents::{AgentProfile, LlmSettings, TaskTemplate};
use lead_score_flow::domain::model::ScoredCandidate;
use lead_score_flow::{ChatCompletionScorer, FlowError, LeadScoring, LocalStorage};
use serde_json::json;
use tempfile::TempDir;

const SHORTLIST: &str = "\
Lead ID,First Name,Last Name,Company Name,Website Visits,Content Downloads,Time Spent (mins),Actions on Platform,Event Attendance,Product Trials Initiated,Seniority Level,Industry,Funding Stage,Norm_Website_Visits,Norm_Content_Downloads,Norm_Time_Spent,Norm_Actions_Platform,Norm_Event_Attendance,Norm_Product_Trials,Engagement_Score,Seniority Level Code,Industry Code,Funding Stage Code,Predicted Lead Category
L-001,Ada,Lovelace,Analytical Engines,20,5,120,30,2,true,Director,Fintech,Series A,1.0,1.0,1.0,1.0,1.0,1.0,0.85,0,0,0,Easy
L-005,Margaret,Hamilton,Apollo Systems,12,3,90,18,1,true,VP,Aerospace,Series B,0.6,0.6,0.75,0.6,0.5,1.0,0.62,2,2,2,Easy
";

fn scoring(server: &MockServer) -> Result<LeadScoring<LocalStorage>> {
    let mut settings = LlmSettings::new(server.url("/v1"), "scoring-model");
    settings.api_key = Some("sk-score".to_string());
    let scorer = ChatCompletionScorer::new(
        settings,
        AgentProfile::lead_scoring(),
        TaskTemplate::score_leads(),
    )?;
    Ok(LeadScoring::new(LocalStorage::default(), Box::new(scorer)))
}

fn shortlist_file(temp_dir: &TempDir) -> Result<String> {
    let path = temp_dir.path().join("top_3_leads.csv");
    std::fs::write(&path, SHORTLIST)?;
    Ok(path.to_string_lossy().into_owned())
}

#[tokio::test]
async fn test_scorer_joins_fenced_reply_with_shortlist() -> Result<()> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .header("authorization", "Bearer sk-score")
            .body_contains("\"model\":\"scoring-model\"")
            .body_contains("Lead Scoring Agent")
            .body_contains("Ada Lovelace")
            .body_contains("Margaret Hamilton");
        then.status(200).json_body(json!({
            "choices": [{
                "message": {
                    "content": "```json\n[{\"id\": \"L-005\", \"score\": 78, \"reason\": \"VP with an active trial\"}, {\"id\": \"L-001\", \"score\": 91, \"reason\": \"Highest engagement\"}]\n```"
                }
            }]
        }));
    });

    let temp_dir = TempDir::new()?;
    let shortlist = shortlist_file(&temp_dir)?;
    let scores_path = temp_dir
        .path()
        .join("lead_scores.json")
        .to_string_lossy()
        .into_owned();

    let scoring = scoring(&server)?;
    let scored = scoring.score_from_csv(&shortlist).await?;
    mock.assert();

    // 依 shortlist 的順序
    let ids: Vec<&str> = scored.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["L-001", "L-005"]);
    assert_eq!(scored[0].score, 91);
    assert_eq!(scored[0].email, "ada.lovelace@analyticalengines.com");
    assert_eq!(scored[1].reason, "VP with an active trial");

    scoring.save_scores(&scored, &scores_path).await?;
    let saved: Vec<ScoredCandidate> = serde_json::from_slice(&std::fs::read(&scores_path)?)?;
    assert_eq!(saved, scored);
    Ok(())
}

#[tokio::test]
async fn test_scorer_accepts_single_object_reply() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200).json_body(json!({
            "choices": [{
                "message": { "content": "{\"id\": \"L-005\", \"score\": 40, \"reason\": \"Late stage but quiet\"}" }
            }]
        }));
    });

    let temp_dir = TempDir::new()?;
    let scored = scoring(&server)?
        .score_from_csv(&shortlist_file(&temp_dir)?)
        .await?;
    assert_eq!(scored.len(), 1);
    assert_eq!(scored[0].name, "Margaret Hamilton");
    assert_eq!(scored[0].score, 40);
    Ok(())
}

#[tokio::test]
async fn test_scorer_rejects_prose_reply() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200).json_body(json!({
            "choices": [{ "message": { "content": "Both leads look promising." } }]
        }));
    });

    let temp_dir = TempDir::new()?;
    let result = scoring(&server)?
        .score_from_csv(&shortlist_file(&temp_dir)?)
        .await;
    assert!(matches!(result, Err(FlowError::SerializationError(_))));
    Ok(())
}

#[tokio::test]
async fn test_scorer_server_error() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(429).body("rate limited");
    });

    let temp_dir = TempDir::new()?;
    match scoring(&server)?
        .score_from_csv(&shortlist_file(&temp_dir)?)
        .await
    {
        Err(FlowError::LlmError { message }) => {
            assert!(message.contains("429"));
            assert!(message.contains("rate limited"));
        }
        other => panic!("unexpected result: {:?}", other.map(|s| s.len())),
    }
    Ok(())
}
