use clap::Parser;
use lead_score_flow::agents::{AgentProfile, DraftTemplate, TaskTemplate};
use lead_score_flow::core::pipeline::join_path;
use lead_score_flow::core::ConfigProvider;
use lead_score_flow::utils::error::FlowError;
use lead_score_flow::utils::{logger, validation::Validate};
use lead_score_flow::domain::model::ScoredCandidate;
use lead_score_flow::{
    build_drafter, ChatCompletionScorer, CliConfig, EmailOutreach, EmailTool, EtlEngine,
    FlowOutcome, LeadScorePipeline, LeadScoring, LocalStorage,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose, None);

    tracing::info!("Starting lead-score-flow CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let files = config.output_files();
    let shortlist_path = join_path(config.output_path(), &files.shortlist);
    let drafts_path = join_path(config.output_path(), &files.drafts);
    let scores_path = join_path(config.output_path(), &files.scores);
    let score_leads = config.score_leads;
    let skip_emails = config.skip_emails;
    let llm = config.llm_settings();

    // 創建存儲和管道
    let storage = LocalStorage::default();
    let pipeline = LeadScorePipeline::new(storage.clone(), config);

    // 創建引擎並運行
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    let outcome = match engine.run().await {
        Ok(outcome) => outcome,
        Err(e) => exit_with(e, "Lead scoring"),
    };
    print_outcome(&outcome, &shortlist_path);

    if let Some(settings) = llm.clone().filter(|_| score_leads) {
        let scorer = match ChatCompletionScorer::new(
            settings,
            AgentProfile::lead_scoring(),
            TaskTemplate::score_leads(),
        ) {
            Ok(scorer) => scorer,
            Err(e) => exit_with(e, "Lead scoring agent"),
        };
        let scoring = LeadScoring::new(storage.clone(), Box::new(scorer));
        let scored = match scoring.score_from_csv(&shortlist_path).await {
            Ok(scored) => scored,
            Err(e) => exit_with(e, "Lead scoring agent"),
        };
        if let Err(e) = scoring.save_scores(&scored, &scores_path).await {
            exit_with(e, "Saving lead scores");
        }
        print_scores(&scored, &scores_path);
    }

    if skip_emails {
        tracing::info!("⏭️  Skipping email drafting");
        return Ok(());
    }

    let drafter = match build_drafter(
        llm,
        AgentProfile::default(),
        TaskTemplate::default(),
        DraftTemplate::default(),
    ) {
        Ok(drafter) => drafter,
        Err(e) => exit_with(e, "Email drafting"),
    };
    let outreach = EmailOutreach::new(storage, drafter, Box::new(EmailTool::default()));

    let report = match outreach.draft_from_csv(&shortlist_path).await {
        Ok(report) => report,
        Err(e) => exit_with(e, "Email drafting"),
    };
    if let Err(e) = outreach.save_report(&report, &drafts_path).await {
        exit_with(e, "Saving email drafts");
    }

    println!(
        "✉️  Drafted {} of {} follow-up emails, saved to: {}",
        report.drafts.len(),
        report.attempted(),
        drafts_path
    );
    if !report.failures.is_empty() {
        eprintln!("⚠️  {} drafts failed, see the log for details", report.failures.len());
        std::process::exit(2);
    }

    Ok(())
}

fn print_outcome(outcome: &FlowOutcome, shortlist_path: &str) {
    tracing::info!("✅ Lead scoring completed successfully!");
    println!("✅ Scored {} leads", outcome.total_leads);
    for (category, count) in &outcome.category_counts {
        println!("   {}: {}", category, count);
    }
    println!("📁 Predictions saved to: {}", outcome.output_path);
    println!("📁 Shortlist saved to: {}", shortlist_path);

    for lead in &outcome.shortlist {
        println!(
            "   #{} {} {} ({}) score {:.3}",
            lead.record.lead_id,
            lead.record.first_name,
            lead.record.last_name,
            lead.record.company_name,
            lead.features.engagement_score
        );
    }
}

fn print_scores(scored: &[ScoredCandidate], scores_path: &str) {
    println!("🧮 Agent scores saved to: {}", scores_path);
    for candidate in scored {
        println!(
            "   #{} {} scored {}: {}",
            candidate.id, candidate.name, candidate.score, candidate.reason
        );
    }
}

fn exit_with(e: FlowError, stage: &str) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ {} failed: {} (Category: {:?}, Severity: {:?})",
        stage,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    // 輸出用戶友好的錯誤信息
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    std::process::exit(e.severity().exit_code())
}
