//! 每個階段的 CPU 與記憶體快照，未啟用 `cli` 時為空實作

#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessesToUpdate, System};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseSnapshot {
    pub cpu_percent: f32,
    pub memory_mb: u64,
    pub peak_memory_mb: u64,
    pub elapsed: Duration,
}

/// 只刷新本程序，不掃描整台機器
#[cfg(feature = "cli")]
struct ProcessSampler {
    system: System,
    pid: Pid,
    peak_memory_mb: u64,
}

#[cfg(feature = "cli")]
impl ProcessSampler {
    fn current() -> Option<Self> {
        match sysinfo::get_current_pid() {
            Ok(pid) => Some(Self {
                system: System::new(),
                pid,
                peak_memory_mb: 0,
            }),
            Err(e) => {
                tracing::warn!("System monitoring unavailable: {}", e);
                None
            }
        }
    }

    fn sample(&mut self) -> Option<(f32, u64)> {
        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[self.pid]), true);
        let process = self.system.process(self.pid)?;
        let memory_mb = process.memory() / 1024 / 1024;
        self.peak_memory_mb = self.peak_memory_mb.max(memory_mb);
        Some((process.cpu_usage(), memory_mb))
    }
}

#[cfg(feature = "cli")]
pub struct SystemMonitor {
    sampler: Option<Mutex<ProcessSampler>>,
    start_time: Instant,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let sampler = if enabled {
            ProcessSampler::current().map(Mutex::new)
        } else {
            None
        };
        Self {
            sampler,
            start_time: Instant::now(),
        }
    }

    /// 停用或取不到程序資訊時回傳 None
    pub fn snapshot(&self) -> Option<PhaseSnapshot> {
        let mut sampler = self.sampler.as_ref()?.lock().ok()?;
        let (cpu_percent, memory_mb) = sampler.sample()?;
        Some(PhaseSnapshot {
            cpu_percent,
            memory_mb,
            peak_memory_mb: sampler.peak_memory_mb,
            elapsed: self.start_time.elapsed(),
        })
    }

    pub fn log_stats(&self, phase: &str) {
        if let Some(snapshot) = self.snapshot() {
            tracing::info!(
                "📊 {} - CPU: {:.1}%, Memory: {}MB, Peak: {}MB, Time: {:?}",
                phase,
                snapshot.cpu_percent,
                snapshot.memory_mb,
                snapshot.peak_memory_mb,
                snapshot.elapsed
            );
        }
    }

    pub fn log_final_stats(&self) {
        if let Some(snapshot) = self.snapshot() {
            tracing::info!(
                "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB",
                snapshot.elapsed,
                snapshot.peak_memory_mb
            );
        }
    }
}

#[cfg(not(feature = "cli"))]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn log_stats(&self, _phase: &str) {}

    pub fn log_final_stats(&self) {}
}
