use clap::Parser;
use lead_score_flow::core::pipeline::join_path;
use lead_score_flow::core::ConfigProvider;
use lead_score_flow::utils::error::FlowError;
use lead_score_flow::utils::{logger, validation::Validate};
use lead_score_flow::{
    build_drafter, ChatCompletionScorer, EmailOutreach, EmailTool, EtlEngine, FlowConfig,
    LeadScorePipeline, LeadScoring, LocalStorage,
};

#[derive(Parser)]
#[command(name = "toml-flow")]
#[command(about = "Lead scoring flow with TOML configuration support")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "lead-flow.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Dry run - show what would be processed without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 載入 TOML 配置
    let config = match FlowConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if config.json_logs() {
        logger::init_json_logger(args.verbose, config.log_level());
    } else {
        logger::init_cli_logger(args.verbose, config.log_level());
    }

    tracing::info!("🚀 Starting TOML-based lead scoring flow");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    // 顯示配置摘要
    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        perform_dry_run(&config);
        return Ok(());
    }

    // 決定監控設定
    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let files = config.output_files();
    let shortlist_path = join_path(config.output_path(), &files.shortlist);
    let drafts_path = join_path(config.output_path(), &files.drafts);
    let scores_path = join_path(config.output_path(), &files.scores);
    let outreach_config = config.outreach.clone();
    let scoring_llm = config.scoring_llm().filter(|_| config.agent_scoring.enabled);
    let scoring_config = config.agent_scoring.clone();

    let storage = LocalStorage::default();
    let pipeline = LeadScorePipeline::new(storage.clone(), config);
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    let outcome = match engine.run().await {
        Ok(outcome) => outcome,
        Err(e) => exit_with(e, "Lead scoring"),
    };
    tracing::info!("✅ Lead scoring completed successfully!");
    println!("✅ Scored {} leads", outcome.total_leads);
    println!("📁 Predictions saved to: {}", outcome.output_path);
    println!(
        "📁 Shortlist ({} leads) saved to: {}",
        outcome.shortlist.len(),
        shortlist_path
    );

    if let Some(settings) = scoring_llm {
        let scorer = match ChatCompletionScorer::new(
            settings,
            scoring_config.agent,
            scoring_config.task,
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
        println!(
            "🧮 Agent scored {} leads, saved to: {}",
            scored.len(),
            scores_path
        );
    }

    if !outreach_config.enabled {
        tracing::info!("⏭️  Outreach disabled in configuration");
        return Ok(());
    }

    let drafter = match build_drafter(
        outreach_config.llm,
        outreach_config.agent,
        outreach_config.task,
        outreach_config.template,
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

fn display_config_summary(config: &FlowConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Flow: {} v{}", config.flow.name, config.flow.version);
    if !config.flow.description.is_empty() {
        println!("  Description: {}", config.flow.description);
    }
    println!("  Leads: {}", config.leads_file());
    println!("  Model: {}", config.model_file());
    println!("  Output: {}", config.output_path());

    let shortlist = config.shortlist();
    println!("  Shortlist: top {} '{}' leads", shortlist.top_n, shortlist.category);

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &FlowConfig) {
    println!("🔍 Dry Run Analysis:");
    println!();

    // 評分設定
    println!("⚖️ Engagement Weights:");
    let weights = config.engagement_weights();
    for (name, weight) in weights.entries() {
        println!("  {:<18} {:.2}", name, weight);
    }
    println!("  {:<18} {:.2}", "total", weights.total());

    println!();
    println!("🏷️ Categorical Encoding:");
    match config.vocabulary() {
        Some(vocabulary) => {
            for (column, labels) in vocabulary {
                println!("  {}: {}", column, labels.join(", "));
            }
        }
        None => println!("  Fitted from the input data on every run"),
    }

    // 輸出分析
    let files = config.output_files();
    println!();
    println!("💾 Output Configuration:");
    println!("  Path: {}", config.output_path());
    println!("  Predictions: {}", files.predictions);
    println!("  Shortlist: {}", files.shortlist);
    if let Some(archive) = config.archive().filter(|a| a.enabled) {
        println!("  Compression: {} (ZIP)", archive.filename);
    }

    // 評分 agent 設定
    println!();
    println!("🧮 Agent Scoring:");
    match config.scoring_llm().filter(|_| config.agent_scoring.enabled) {
        Some(llm) => {
            println!("  Scorer: {} via {}", llm.model, llm.endpoint);
            println!("  Scores: {}", files.scores);
        }
        None => println!("  Disabled"),
    }

    // 跟進信設定
    println!();
    println!("✉️ Outreach:");
    if !config.outreach.enabled {
        println!("  Disabled");
    } else {
        match &config.outreach.llm {
            Some(llm) => println!("  Drafter: {} via {}", llm.model, llm.endpoint),
            None => println!("  Drafter: offline template"),
        }
        println!("  Drafts: {}", files.drafts);
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");
}

fn exit_with(e: FlowError, stage: &str) -> ! {
    tracing::error!(
        "❌ {} failed: {} (Category: {:?}, Severity: {:?})",
        stage,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    std::process::exit(e.severity().exit_code())
}
