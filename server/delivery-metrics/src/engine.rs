//! Core engine: validates the window, runs the pipeline, assembles the report.
//!
//! The engine is a pure function of the request: it holds only immutable
//! configuration, so independent analyses may run in parallel freely.

use chrono::NaiveDate;

use crate::config::Config;
use crate::error::EngineError;
use crate::incidents;
use crate::mapping;
use crate::normalize;
use crate::rating::{self, trunk, Thresholds};
use crate::rollup;
use crate::types::*;

pub struct Engine {
  config: Config,
}

impl Engine {
  pub fn new(config: Config) -> Self {
    Self { config }
  }

  pub fn with_defaults() -> Self {
    Self::new(Config::default())
  }

  /// Run one analysis. The only error is an invalid call shape
  /// (unparsable or inverted window); malformed records inside the batch
  /// are dropped locally, never fatal.
  pub fn analyze(&self, raw: &AnalysisRequest) -> Result<MetricsReport, EngineError> {
    let window = parse_window(&raw.start, &raw.end)?;

    let commits = normalize::normalize_commits(&raw.commits);
    let runs = normalize::normalize_runs(&raw.runs, &raw.workflow, &window, &self.config);

    let mapped = mapping::map_commits(&commits, &runs);

    // Incident detection sees the widened run set; counting is
    // window-bounded so lookback/lookahead only attribute, never inflate.
    let all_incidents = incidents::detect_incidents(&runs);
    let (mttr_hours, incidents_counted) =
      incidents::mean_time_to_recovery_hours(&all_incidents, &window);

    // Everything else is scoped to runs actually inside the window.
    let in_range: Vec<Run> = runs
      .iter()
      .filter(|r| window.contains(r.started_at))
      .cloned()
      .collect();

    let scalars = rollup::team_scalars(&mapped, &in_range, &window);
    let daily = rollup::daily_rollups(&mapped, &in_range, &window);
    let weekly = rollup::weekly_rollups(&mapped, &in_range, &window);
    let authors = rollup::author_stats(&mapped, &window);

    let metrics = TeamMetrics {
      deployment_frequency: metric(
        scalars.deployment_frequency,
        "per_day",
        &trunk::DEPLOYMENT_FREQUENCY,
      ),
      lead_time: metric(scalars.lead_time_minutes, "minutes", &trunk::LEAD_TIME),
      cycle_time: metric(scalars.cycle_time_minutes, "minutes", &trunk::CYCLE_TIME),
      change_failure_rate: metric(
        scalars.change_failure_rate,
        "percent",
        &trunk::CHANGE_FAILURE_RATE,
      ),
      mean_time_to_recovery: metric(mttr_hours, "hours", &trunk::MEAN_TIME_TO_RECOVERY),
      commit_frequency: metric(scalars.commit_frequency, "per_day", &trunk::COMMIT_FREQUENCY),
      batch_size: metric(scalars.avg_batch_size, "lines", &trunk::BATCH_SIZE),
      pipeline_duration: metric(
        scalars.avg_pipeline_duration_minutes,
        "minutes",
        &trunk::PIPELINE_DURATION,
      ),
      time_to_deploy: metric(
        scalars.avg_time_to_deploy_minutes,
        "minutes",
        &trunk::TIME_TO_DEPLOY,
      ),
      deploy_success_rate: metric(
        scalars.deploy_success_rate,
        "percent",
        &trunk::DEPLOY_SUCCESS_RATE,
      ),
    };

    // The eight headline metrics feed the overall score.
    let overall = rating::overall(&[
      metrics.deployment_frequency.rating,
      metrics.lead_time.rating,
      metrics.cycle_time.rating,
      metrics.change_failure_rate.rating,
      metrics.mean_time_to_recovery.rating,
      metrics.commit_frequency.rating,
      metrics.batch_size.rating,
      metrics.pipeline_duration.rating,
    ]);

    let successful_runs = in_range
      .iter()
      .filter(|r| r.status == RunStatus::Success)
      .count();
    let counts = Counts {
      commits: mapped.len(),
      merge_commits: mapped.iter().filter(|m| m.commit.is_merge).count(),
      runs: in_range.len(),
      successful_runs,
      failed_runs: in_range.len() - successful_runs,
      pending_commits: mapped
        .iter()
        .filter(|m| m.result == DeploymentResult::Pending)
        .count(),
    };

    Ok(MetricsReport {
      analysis_id: analysis_id(&raw.repository, &raw.workflow, &window),
      repository: raw.repository.clone(),
      workflow: raw.workflow.clone(),
      window: WindowOut {
        start: rollup::day_key(window.start),
        end: rollup::day_key(window.end),
      },
      metrics,
      overall,
      counts,
      incidents_counted,
      mapped_commits: mapped,
      runs: in_range,
      daily,
      weekly,
      authors,
    })
  }
}

fn metric(value: f64, unit: &str, thresholds: &Thresholds) -> MetricValue {
  // Rating and value must agree: rate the rounded value we emit, so two
  // reports carrying the same visible value always carry the same rating.
  let rounded = (value * 100.0).round() / 100.0;
  MetricValue {
    value: rounded,
    unit: unit.to_string(),
    rating: thresholds.rate(rounded),
  }
}

fn parse_window(start: &str, end: &str) -> Result<AnalysisWindow, EngineError> {
  let start = NaiveDate::parse_from_str(start, "%Y-%m-%d")
    .map_err(|e| EngineError::validation("start", &format!("invalid date: {}", e)))?;
  let end = NaiveDate::parse_from_str(end, "%Y-%m-%d")
    .map_err(|e| EngineError::validation("end", &format!("invalid date: {}", e)))?;
  if end < start {
    return Err(EngineError::validation("window", "end is before start"));
  }
  Ok(AnalysisWindow { start, end })
}

/// Stable analysis ID: hash of repository + workflow + window.
fn analysis_id(repository: &str, workflow: &str, window: &AnalysisWindow) -> String {
  let mut hasher = blake3::Hasher::new();
  hasher.update(repository.as_bytes());
  hasher.update(b"|");
  hasher.update(workflow.as_bytes());
  hasher.update(b"|");
  hasher.update(rollup::day_key(window.start).as_bytes());
  hasher.update(b"|");
  hasher.update(rollup::day_key(window.end).as_bytes());
  let hex = hasher.finalize().to_hex();
  format!("dm-{}", &hex[..16])
}

#[cfg(test)]
mod tests {
  use super::*;

  fn request() -> AnalysisRequest {
    AnalysisRequest {
      repository: "acme/widgets".into(),
      workflow: "deploy".into(),
      start: "2025-03-10".into(),
      end: "2025-03-16".into(),
      commits: vec![],
      runs: vec![],
    }
  }

  #[test]
  fn inverted_window_fails_fast() {
    let engine = Engine::with_defaults();
    let mut raw = request();
    raw.start = "2025-03-16".into();
    raw.end = "2025-03-10".into();
    let err = engine.analyze(&raw).unwrap_err();
    assert!(err.to_string().contains("window"));
  }

  #[test]
  fn unparsable_date_mentions_the_field() {
    let engine = Engine::with_defaults();
    let mut raw = request();
    raw.end = "next tuesday".into();
    let err = engine.analyze(&raw).unwrap_err();
    assert!(err.to_string().contains("end"));
  }

  #[test]
  fn single_day_window_is_valid() {
    let engine = Engine::with_defaults();
    let mut raw = request();
    raw.end = "2025-03-10".into();
    let report = engine.analyze(&raw).unwrap();
    assert_eq!(report.daily.len(), 1);
    assert_eq!(report.weekly.len(), 1);
  }

  #[test]
  fn empty_request_reports_zeros() {
    let engine = Engine::with_defaults();
    let report = engine.analyze(&request()).unwrap();
    assert_eq!(report.counts.commits, 0);
    assert_eq!(report.counts.runs, 0);
    assert_eq!(report.incidents_counted, 0);
    assert_eq!(report.metrics.mean_time_to_recovery.value, 0.0);
    assert_eq!(report.metrics.deployment_frequency.value, 0.0);
  }

  #[test]
  fn analysis_id_is_stable() {
    let engine = Engine::with_defaults();
    let r1 = engine.analyze(&request()).unwrap();
    let r2 = engine.analyze(&request()).unwrap();
    assert_eq!(r1.analysis_id, r2.analysis_id);
    assert!(r1.analysis_id.starts_with("dm-"));
  }
}
