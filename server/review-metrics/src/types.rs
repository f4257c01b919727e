//! Input/output types for the review metrics engine (JSON contract).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use delivery_metrics::types::{MetricValue, OverallRating};

/// Input: one JSON object with the pull requests to analyze.
/// Unknown fields are silently ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Input {
  pub repository: String,
  #[serde(default)]
  pub pull_requests: Vec<InboundPullRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundPullRequest {
  pub id: String,
  /// Opened timestamp, RFC3339 (the one timestamp every PR has).
  pub opened_at: String,
  #[serde(default)]
  pub first_commit_at: Option<String>,
  #[serde(default)]
  pub first_review_at: Option<String>,
  #[serde(default)]
  pub first_approval_at: Option<String>,
  #[serde(default)]
  pub merged_at: Option<String>,
}

/// Canonical pull request after timestamp parsing.
#[derive(Debug, Clone)]
pub struct PullRequest {
  pub id: String,
  pub opened_at: DateTime<Utc>,
  pub first_commit_at: Option<DateTime<Utc>>,
  pub first_review_at: Option<DateTime<Utc>>,
  pub first_approval_at: Option<DateTime<Utc>>,
  pub merged_at: Option<DateTime<Utc>>,
}

/// Phase durations for one pull request, minutes. A phase is absent when a
/// prerequisite timestamp is missing or the delta is negative.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseDurations {
  pub id: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub coding_minutes: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub pickup_minutes: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub approve_minutes: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub merge_minutes: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub review_minutes: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub cycle_minutes: Option<f64>,
}

/// Mean per phase across all PRs that measured it, rated against the
/// PR-lifecycle threshold table. A phase no PR measured stays absent.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewMetrics {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub coding_time: Option<MetricValue>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub pickup_time: Option<MetricValue>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub approve_time: Option<MetricValue>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub merge_time: Option<MetricValue>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub review_time: Option<MetricValue>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub cycle_time: Option<MetricValue>,
}

/// Output: one JSON object to stdout.
#[derive(Debug, Clone, Serialize)]
pub struct Output {
  pub repository: String,
  pub pull_requests_analyzed: usize,
  pub metrics: ReviewMetrics,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub overall: Option<OverallRating>,
  pub phases: Vec<PhaseDurations>,
}
