//! Failure/recovery incident detection for MTTR.
//!
//! A single left-to-right scan over runs sorted by completion time, driven
//! by an explicit two-state machine: consecutive failures collapse into one
//! incident, the next success closes it. A trailing open incident is
//! unrecovered and contributes no duration (synthesizing a recovery at the
//! window end would inflate MTTR).

use chrono::{DateTime, Utc};

use crate::types::{AnalysisWindow, Run, RunStatus};

/// One outage: first failing run through the success that closed it.
/// Transient — only its duration reaches the report.
#[derive(Debug, Clone)]
pub struct Incident {
  pub first_failure: Run,
  pub recovery: Run,
  pub failed_at: DateTime<Utc>,
  pub recovered_at: DateTime<Utc>,
}

impl Incident {
  pub fn duration_hours(&self) -> f64 {
    (self.recovered_at - self.failed_at).num_seconds() as f64 / 3600.0
  }
}

enum ScanState {
  Idle,
  Open {
    first_failure: Run,
    failed_at: DateTime<Utc>,
  },
}

/// Scan completed runs (sorted ascending by completion time, ties by input
/// order) and pair each incident's first failure with its recovery success.
pub fn detect_incidents(runs: &[Run]) -> Vec<Incident> {
  let mut completed: Vec<(&Run, DateTime<Utc>)> = runs
    .iter()
    .filter_map(|r| r.completed_at.map(|t| (r, t)))
    .collect();
  completed.sort_by_key(|(_, t)| *t);

  let mut incidents = Vec::new();
  let mut state = ScanState::Idle;

  for (run, completed_at) in completed {
    state = match (state, run.status) {
      (ScanState::Idle, RunStatus::Failure) => ScanState::Open {
        first_failure: run.clone(),
        failed_at: completed_at,
      },
      // Consecutive failures belong to the already-open incident.
      (open @ ScanState::Open { .. }, RunStatus::Failure) => open,
      (ScanState::Open { first_failure, failed_at }, RunStatus::Success) => {
        incidents.push(Incident {
          first_failure,
          recovery: run.clone(),
          failed_at,
          recovered_at: completed_at,
        });
        ScanState::Idle
      }
      (ScanState::Idle, RunStatus::Success) => ScanState::Idle,
    };
  }

  incidents
}

/// MTTR in hours over incidents whose recovery completed inside the window.
///
/// Admits incidents whose failure began before the window (lookback) but
/// resolved inside it; excludes incidents resolving at or after the window
/// end. Returns `(0.0, 0)` when nothing counted — zero incidents and
/// missing data are indistinguishable here, the count lets callers tell.
pub fn mean_time_to_recovery_hours(
  incidents: &[Incident],
  window: &AnalysisWindow,
) -> (f64, usize) {
  let durations: Vec<f64> = incidents
    .iter()
    .filter(|i| window.contains(i.recovered_at))
    .map(Incident::duration_hours)
    .collect();

  if durations.is_empty() {
    return (0.0, 0);
  }
  let mean = durations.iter().sum::<f64>() / durations.len() as f64;
  (mean, durations.len())
}
