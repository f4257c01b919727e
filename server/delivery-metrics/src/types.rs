//! Core types for the delivery metrics engine (JSON contracts + internal models).

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Inbound types (JSON contract — what the caller sends)
// ---------------------------------------------------------------------------

/// One analysis request from stdin. Unknown fields are silently ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisRequest {
  pub repository: String,
  /// Workflow name to analyze; runs from other workflows are dropped
  /// (matched case-insensitively).
  pub workflow: String,
  /// First day of the analysis window, "YYYY-MM-DD".
  pub start: String,
  /// Last day of the analysis window (inclusive for daily buckets), "YYYY-MM-DD".
  pub end: String,
  #[serde(default)]
  pub commits: Vec<InboundCommit>,
  #[serde(default)]
  pub runs: Vec<InboundRun>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundCommit {
  pub sha: String,
  pub author: String,
  /// Authored timestamp, RFC3339.
  pub timestamp: String,
  #[serde(default)]
  pub parents: Vec<String>,
  #[serde(default)]
  pub additions: u32,
  #[serde(default)]
  pub deletions: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundRun {
  pub id: String,
  pub workflow_name: String,
  /// Provider conclusion string (success, failure, timed_out, cancelled, ...).
  pub conclusion: String,
  #[serde(default)]
  pub run_started_at: Option<String>,
  pub created_at: String,
  #[serde(default)]
  pub updated_at: Option<String>,
  /// Accepted but unused; mapping is time-based (reserved for sha-based mapping).
  #[serde(default)]
  pub head_sha: Option<String>,
}

// ---------------------------------------------------------------------------
// Analysis window
// ---------------------------------------------------------------------------

/// Validated date window. Daily buckets span `start ..= end`; instant-based
/// comparisons (incident counting, run-in-range checks) use
/// `[start 00:00, (end + 1d) 00:00)` so the end day itself is still inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisWindow {
  pub start: NaiveDate,
  pub end: NaiveDate,
}

impl AnalysisWindow {
  pub fn start_instant(&self) -> DateTime<Utc> {
    self.start.and_time(NaiveTime::MIN).and_utc()
  }

  pub fn end_instant(&self) -> DateTime<Utc> {
    (self.end + Duration::days(1)).and_time(NaiveTime::MIN).and_utc()
  }

  /// Calendar days covered, floored at 1 (guards rate denominators).
  pub fn days(&self) -> f64 {
    let days = self.end.signed_duration_since(self.start).num_days() + 1;
    days.max(1) as f64
  }

  pub fn contains(&self, instant: DateTime<Utc>) -> bool {
    instant >= self.start_instant() && instant < self.end_instant()
  }
}

// ---------------------------------------------------------------------------
// Internal normalized types
// ---------------------------------------------------------------------------

/// Canonical commit after normalization. Immutable once constructed.
#[derive(Debug, Clone, Serialize)]
pub struct Commit {
  pub id: String,
  pub author: String,
  pub authored_at: DateTime<Utc>,
  /// Parent count > 1. Excluded from rate-style aggregates, kept in raw
  /// daily/weekly commit counts.
  pub is_merge: bool,
  pub lines_added: u32,
  pub lines_deleted: u32,
}

impl Commit {
  pub fn batch_size(&self) -> u32 {
    self.lines_added + self.lines_deleted
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
  Success,
  Failure,
}

impl RunStatus {
  /// Map a provider conclusion string. `None` means the run is dropped
  /// during normalization and never compared chronologically.
  pub fn from_conclusion(s: &str) -> Option<Self> {
    match s.to_ascii_lowercase().as_str() {
      "success" => Some(Self::Success),
      "failure" | "timed_out" | "cancelled" => Some(Self::Failure),
      _ => None,
    }
  }
}

/// Canonical run after normalization. Only Success/Failure runs survive.
#[derive(Debug, Clone, Serialize)]
pub struct Run {
  pub id: String,
  pub workflow: String,
  pub status: RunStatus,
  pub started_at: DateTime<Utc>,
  pub completed_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Derived per-commit mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentResult {
  Success,
  Failure,
  Pending,
}

impl From<RunStatus> for DeploymentResult {
  fn from(status: RunStatus) -> Self {
    match status {
      RunStatus::Success => Self::Success,
      RunStatus::Failure => Self::Failure,
    }
  }
}

/// A commit joined to its delivery outcome. Computed fresh per analysis
/// call; never mutated in place.
#[derive(Debug, Clone, Serialize)]
pub struct MappedCommit {
  #[serde(flatten)]
  pub commit: Commit,
  pub result: DeploymentResult,
  /// First run (any status) starting at or after the commit.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub first_run_id: Option<String>,
  /// First successful run starting at or after the commit; may differ from
  /// `first_run_id` when the nearest run failed but a later one succeeded.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub deployed_run_id: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub lead_time_minutes: Option<f64>,
  /// Equal to lead time in the trunk model.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub cycle_time_minutes: Option<f64>,
  /// `completed_at - started_at` of the deploying run.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub time_to_deploy_minutes: Option<f64>,
}

// ---------------------------------------------------------------------------
// Ratings
// ---------------------------------------------------------------------------

/// Ordered quality band, best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
  Elite,
  High,
  Medium,
  Low,
}

impl Rating {
  /// Points for the overall score: best tier earns 4, worst earns 1.
  pub fn points(self) -> u8 {
    match self {
      Self::Elite => 4,
      Self::High => 3,
      Self::Medium => 2,
      Self::Low => 1,
    }
  }
}

/// One rated scalar metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricValue {
  pub value: f64,
  pub unit: String,
  pub rating: Rating,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallRating {
  /// Mean rating points across the eight headline metrics (1..4).
  pub score: f64,
  pub rating: Rating,
}

// ---------------------------------------------------------------------------
// Output types (JSON contract — what we emit)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct TeamMetrics {
  pub deployment_frequency: MetricValue,
  pub lead_time: MetricValue,
  pub cycle_time: MetricValue,
  pub change_failure_rate: MetricValue,
  pub mean_time_to_recovery: MetricValue,
  pub commit_frequency: MetricValue,
  pub batch_size: MetricValue,
  pub pipeline_duration: MetricValue,
  pub time_to_deploy: MetricValue,
  pub deploy_success_rate: MetricValue,
}

#[derive(Debug, Clone, Serialize)]
pub struct Counts {
  pub commits: usize,
  pub merge_commits: usize,
  pub runs: usize,
  pub successful_runs: usize,
  pub failed_runs: usize,
  pub pending_commits: usize,
}

/// One calendar day inside the window.
#[derive(Debug, Clone, Serialize)]
pub struct DailyRollup {
  pub date: String,
  /// Raw commit count, merges included (display count).
  pub commits: usize,
  pub runs: usize,
  pub successful_runs: usize,
  pub failed_runs: usize,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub avg_lead_time_minutes: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub avg_cycle_time_minutes: Option<f64>,
}

/// One 7-day bucket starting at the window start (the last may be shorter).
#[derive(Debug, Clone, Serialize)]
pub struct WeeklyRollup {
  pub week_start: String,
  pub days_in_bucket: u32,
  pub commits: usize,
  pub runs: usize,
  pub successful_runs: usize,
  pub failed_runs: usize,
  pub deployment_frequency: f64,
  pub change_failure_rate: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub avg_lead_time_minutes: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub avg_cycle_time_minutes: Option<f64>,
}

/// Per-author aggregates over non-merge commits.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorStats {
  pub author: String,
  pub commits: usize,
  pub successful: usize,
  pub failed: usize,
  pub pending: usize,
  /// successful / (successful + failed) as a percentage; pending excluded.
  pub success_rate: f64,
  pub avg_batch_size: f64,
  /// Distinct deploying runs / days in range (one run can ship many commits).
  pub deployment_frequency: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub avg_lead_time_minutes: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub avg_cycle_time_minutes: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub avg_time_to_deploy_minutes: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WindowOut {
  pub start: String,
  pub end: String,
}

/// The full analysis response.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
  pub analysis_id: String,
  pub repository: String,
  pub workflow: String,
  pub window: WindowOut,
  pub metrics: TeamMetrics,
  pub overall: OverallRating,
  pub counts: Counts,
  /// Recovered incidents whose recovery fell inside the window. Zero can
  /// mean "no failures" or "no data"; callers get the count so they can
  /// tell a clean period from an empty one.
  pub incidents_counted: usize,
  pub mapped_commits: Vec<MappedCommit>,
  pub runs: Vec<Run>,
  pub daily: Vec<DailyRollup>,
  pub weekly: Vec<WeeklyRollup>,
  pub authors: Vec<AuthorStats>,
}

// ---------------------------------------------------------------------------
// CLI stream wrappers
// ---------------------------------------------------------------------------

/// Structured error output for invalid requests.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorOutput {
  pub error: bool,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub field: Option<String>,
}

impl ErrorOutput {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      error: true,
      message: message.into(),
      field: None,
    }
  }

  pub fn with_field(mut self, field: impl Into<String>) -> Self {
    self.field = Some(field.into());
    self
  }
}
