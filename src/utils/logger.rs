use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 函式庫與 `toml-flow` 執行檔的預設過濾
const DEFAULT_FILTER: &str = "lead_score_flow=info,toml_flow=info";
const VERBOSE_FILTER: &str = "lead_score_flow=debug,toml_flow=debug,info";

/// RUST_LOG 優先，其次 `--verbose`，再來是設定檔的 `log_level`
fn base_directives(verbose: bool, log_level: Option<&str>) -> &str {
    match (verbose, log_level) {
        (true, _) => VERBOSE_FILTER,
        (false, Some(level)) if !level.trim().is_empty() => level,
        _ => DEFAULT_FILTER,
    }
}

fn parse_directives(directives: &str) -> EnvFilter {
    EnvFilter::try_new(directives).unwrap_or_else(|e| {
        eprintln!("⚠️  Invalid log filter '{}': {}, using default", directives, e);
        EnvFilter::new(DEFAULT_FILTER)
    })
}

fn build_filter(verbose: bool, log_level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| parse_directives(base_directives(verbose, log_level)))
}

pub fn init_cli_logger(verbose: bool, log_level: Option<&str>) {
    tracing_subscriber::registry()
        .with(build_filter(verbose, log_level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// JSON 格式日誌，方便由排程器收集
pub fn init_json_logger(verbose: bool, log_level: Option<&str>) {
    tracing_subscriber::registry()
        .with(build_filter(verbose, log_level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json(),
        )
        .init();
}
