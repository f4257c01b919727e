//! Review Metrics Engine — PR-lifecycle phase timing; no AI, no DB, no
//! network. Used by the binary for stdin/stdout; can also be called as a
//! library.
//!
//! Shares the rating and averaging machinery with delivery-metrics but
//! rates against its own PR-lifecycle threshold table.

mod phases;
pub mod types;

use delivery_metrics::rating::{self, pull_request, Thresholds};
use delivery_metrics::rollup;
use delivery_metrics::types::MetricValue;

use types::{Input, Output, PhaseDurations, ReviewMetrics};

/// Run the engine on parsed input and return the output (no I/O).
pub fn run(input: &Input) -> Output {
  let prs = phases::normalize(&input.pull_requests);
  let rows: Vec<PhaseDurations> = prs.iter().map(phases::derive_phases).collect();

  let metrics = ReviewMetrics {
    coding_time: summarize(&rows, |p| p.coding_minutes, &pull_request::CODING_TIME),
    pickup_time: summarize(&rows, |p| p.pickup_minutes, &pull_request::PICKUP_TIME),
    approve_time: summarize(&rows, |p| p.approve_minutes, &pull_request::APPROVE_TIME),
    merge_time: summarize(&rows, |p| p.merge_minutes, &pull_request::MERGE_TIME),
    review_time: summarize(&rows, |p| p.review_minutes, &pull_request::REVIEW_TIME),
    cycle_time: summarize(&rows, |p| p.cycle_minutes, &pull_request::CYCLE_TIME),
  };

  let ratings: Vec<_> = [
    &metrics.coding_time,
    &metrics.pickup_time,
    &metrics.approve_time,
    &metrics.merge_time,
    &metrics.review_time,
    &metrics.cycle_time,
  ]
  .into_iter()
  .filter_map(|m| m.as_ref().map(|m| m.rating))
  .collect();
  let overall = if ratings.is_empty() {
    None
  } else {
    Some(rating::overall(&ratings))
  };

  Output {
    repository: input.repository.clone(),
    pull_requests_analyzed: prs.len(),
    metrics,
    overall,
    phases: rows,
  }
}

/// Mean of one phase over the PRs that measured it; absent when none did.
fn summarize(
  rows: &[PhaseDurations],
  pick: fn(&PhaseDurations) -> Option<f64>,
  thresholds: &Thresholds,
) -> Option<MetricValue> {
  let values: Vec<f64> = rows.iter().filter_map(pick).collect();
  if values.is_empty() {
    return None;
  }
  // Rate the rounded value we emit, never the raw mean: the emitted pair
  // must stay consistent with the threshold table.
  let mean = (rollup::mean(&values) * 100.0).round() / 100.0;
  Some(MetricValue {
    value: mean,
    unit: "minutes".to_string(),
    rating: thresholds.rate(mean),
  })
}
