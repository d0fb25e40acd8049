//! Memory and timing instrumentation for model-building stages.
//!
//! A [`MeasurementRecorder`] brackets each stage (declare, constraints,
//! serialize, ...) with a wall-clock timer and two RSS readings taken through
//! `sysinfo`.

use std::time::{Duration, Instant};

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// Resident set size of this process at one point in time.
#[derive(Debug, Clone)]
pub struct MemorySnapshot {
    /// Resident set size in bytes
    pub rss_bytes: u64,
    pub timestamp: Instant,
    /// Label of the stage that requested the reading
    pub stage: String,
}

/// Errors produced by memory instrumentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    ProcessNotFound { pid: u32 },
}

impl std::fmt::Display for MemoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryError::ProcessNotFound { pid } => write!(f, "failed to locate process {pid}"),
        }
    }
}

impl std::error::Error for MemoryError {}

impl MemorySnapshot {
    /// Read the current RSS, refreshing only this process.
    ///
    /// # Errors
    ///
    /// Returns an error if the current process cannot be located.
    pub fn capture(stage: &str) -> Result<Self, MemoryError> {
        let raw_pid = std::process::id();
        let pid = Pid::from_u32(raw_pid);
        let mut sys = System::new();
        sys.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        let process = sys
            .process(pid)
            .ok_or(MemoryError::ProcessNotFound { pid: raw_pid })?;
        Ok(Self {
            rss_bytes: process.memory(),
            timestamp: Instant::now(),
            stage: stage.to_string(),
        })
    }

    /// RSS growth from `earlier` to `self` (negative when memory was released).
    pub fn diff(&self, earlier: &Self) -> i64 {
        self.rss_bytes as i64 - earlier.rss_bytes as i64
    }
}

/// Best-effort RSS reading; `None` when the platform cannot report it.
pub fn capture_rss_bytes(stage: &str) -> Option<u64> {
    match MemorySnapshot::capture(stage) {
        Ok(snapshot) => Some(snapshot.rss_bytes),
        Err(err) => {
            tracing::debug!(
                component = "memory",
                operation = "capture",
                status = "unavailable",
                stage,
                error = %err,
                "RSS reading unavailable"
            );
            None
        }
    }
}

pub fn rss_delta(before: Option<u64>, after: Option<u64>) -> Option<i64> {
    match (before, after) {
        (Some(before), Some(after)) => Some(after as i64 - before as i64),
        _ => None,
    }
}

/// Timing and memory of one completed stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageMeasurement {
    pub stage: String,
    pub duration: Duration,
    pub rss_before_bytes: Option<u64>,
    pub rss_after_bytes: Option<u64>,
    pub rss_delta_bytes: Option<i64>,
}

/// An open stage returned by [`MeasurementRecorder::begin_stage`].
#[derive(Debug)]
#[must_use = "pass the started stage to end_stage"]
pub struct StageStart {
    stage: String,
    started: Instant,
    rss_before_bytes: Option<u64>,
}

/// Collects stage measurements in the order stages finish.
#[derive(Debug, Default)]
pub struct MeasurementRecorder {
    stages: Vec<StageMeasurement>,
}

impl MeasurementRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_stage(&mut self, stage: &str) -> StageStart {
        StageStart {
            stage: stage.to_string(),
            rss_before_bytes: capture_rss_bytes(stage),
            started: Instant::now(),
        }
    }

    pub fn end_stage(&mut self, start: StageStart) -> &StageMeasurement {
        let duration = start.started.elapsed();
        let rss_after_bytes = capture_rss_bytes(&start.stage);
        let index = self.stages.len();
        self.stages.push(StageMeasurement {
            rss_delta_bytes: rss_delta(start.rss_before_bytes, rss_after_bytes),
            stage: start.stage,
            duration,
            rss_before_bytes: start.rss_before_bytes,
            rss_after_bytes,
        });
        &self.stages[index]
    }

    pub fn stages(&self) -> &[StageMeasurement] {
        &self.stages
    }

    pub fn into_stages(self) -> Vec<StageMeasurement> {
        self.stages
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::{MeasurementRecorder, MemorySnapshot, rss_delta};

    #[test]
    fn snapshot_captures_current_process() {
        let snapshot = MemorySnapshot::capture("probe").unwrap_or_else(|err| panic!("{err}"));
        assert_eq!(snapshot.stage, "probe");
        assert!(snapshot.rss_bytes > 0);
    }

    #[test]
    fn snapshot_diff_is_signed() {
        let earlier = MemorySnapshot {
            rss_bytes: 1_500,
            timestamp: Instant::now(),
            stage: "a".to_string(),
        };
        let later = MemorySnapshot {
            rss_bytes: 1_000,
            timestamp: Instant::now(),
            stage: "b".to_string(),
        };
        assert_eq!(later.diff(&earlier), -500);
    }

    #[test]
    fn rss_delta_requires_both_readings() {
        assert_eq!(rss_delta(Some(10), Some(25)), Some(15));
        assert_eq!(rss_delta(None, Some(25)), None);
    }

    #[test]
    fn recorder_keeps_stage_order() {
        let mut recorder = MeasurementRecorder::new();
        let declare = recorder.begin_stage("declare");
        recorder.end_stage(declare);
        let serialize = recorder.begin_stage("serialize");
        let last = recorder.end_stage(serialize);
        assert_eq!(last.stage, "serialize");

        let names: Vec<&str> = recorder.stages().iter().map(|s| s.stage.as_str()).collect();
        assert_eq!(names, vec!["declare", "serialize"]);
    }
}
