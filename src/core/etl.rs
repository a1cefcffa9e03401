use crate::core::{Pipeline, ScoredLead};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// 一次執行的結果摘要
#[derive(Debug, Clone)]
pub struct FlowOutcome {
    pub output_path: String,
    pub total_leads: usize,
    pub category_counts: Vec<(String, usize)>,
    pub shortlist: Vec<ScoredLead>,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<FlowOutcome> {
        tracing::info!("🚀 Starting lead scoring flow...");
        self.monitor.log_stats("Start");

        // Extract
        tracing::info!("📥 Extracting leads...");
        let leads = self.pipeline.extract().await?;
        tracing::info!("Extracted {} leads", leads.len());
        self.monitor.log_stats("Extract");

        // Transform
        tracing::info!("🔄 Scoring leads...");
        let result = self.pipeline.transform(leads).await?;
        let category_counts = result.category_counts();
        for (category, count) in &category_counts {
            tracing::info!("  {}: {} leads", category, count);
        }
        self.monitor.log_stats("Transform");

        // Load
        tracing::info!("💾 Writing results...");
        let output_path = self.pipeline.load(&result).await?;
        tracing::info!("Output saved to: {}", output_path);
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(FlowOutcome {
            output_path,
            total_leads: result.scored_leads.len(),
            category_counts,
            shortlist: result.shortlist,
        })
    }
}
