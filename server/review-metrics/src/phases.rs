//! Pull-request phase derivation: date subtraction over well-ordered
//! timestamps, with strict null propagation.
//!
//! A negative delta means clock skew or out-of-order events, not a valid
//! measurement — it surfaces as absent, never clamped to zero.

use chrono::{DateTime, Utc};

use crate::types::{InboundPullRequest, PhaseDurations, PullRequest};

fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .ok()
    .map(|t| t.with_timezone(&Utc))
}

/// Parse inbound PRs. A PR with any malformed timestamp is dropped whole;
/// absent optional timestamps are fine.
pub fn normalize(raw: &[InboundPullRequest]) -> Vec<PullRequest> {
  raw
    .iter()
    .filter_map(|pr| {
      let opened_at = parse_instant(&pr.opened_at)?;
      Some(PullRequest {
        id: pr.id.clone(),
        opened_at,
        first_commit_at: parse_optional(&pr.first_commit_at)?,
        first_review_at: parse_optional(&pr.first_review_at)?,
        first_approval_at: parse_optional(&pr.first_approval_at)?,
        merged_at: parse_optional(&pr.merged_at)?,
      })
    })
    .collect()
}

/// `None` input stays `None`; present-but-malformed drops the PR
/// (outer `None`).
fn parse_optional(raw: &Option<String>) -> Option<Option<DateTime<Utc>>> {
  match raw {
    None => Some(None),
    Some(s) => parse_instant(s).map(Some),
  }
}

/// Minutes between two optional instants; absent prerequisite or negative
/// delta yields `None`.
fn phase(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Option<f64> {
  let (from, to) = (from?, to?);
  let minutes = (to - from).num_seconds() as f64 / 60.0;
  if minutes < 0.0 {
    None
  } else {
    Some(minutes)
  }
}

pub fn derive_phases(pr: &PullRequest) -> PhaseDurations {
  let opened = Some(pr.opened_at);
  PhaseDurations {
    id: pr.id.clone(),
    coding_minutes: phase(pr.first_commit_at, opened),
    pickup_minutes: phase(opened, pr.first_review_at),
    approve_minutes: phase(pr.first_review_at, pr.first_approval_at),
    merge_minutes: phase(pr.first_approval_at, pr.merged_at),
    review_minutes: phase(opened, pr.merged_at),
    cycle_minutes: phase(pr.first_commit_at, pr.merged_at),
  }
}
