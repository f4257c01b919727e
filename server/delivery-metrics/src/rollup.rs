//! Daily, weekly, and per-author aggregation plus the team-level scalars.
//!
//! Every aggregate is computed from scratch per call out of the mapped
//! commits and the in-range runs; zero denominators yield 0.0, never NaN.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Duration, NaiveDate};

use crate::mapping::minutes_between;
use crate::types::{
  AnalysisWindow, AuthorStats, DailyRollup, DeploymentResult, MappedCommit, Run, RunStatus,
  WeeklyRollup,
};

pub fn mean(values: &[f64]) -> f64 {
  if values.is_empty() {
    return 0.0;
  }
  values.iter().sum::<f64>() / values.len() as f64
}

fn mean_opt(values: &[f64]) -> Option<f64> {
  if values.is_empty() {
    None
  } else {
    Some(values.iter().sum::<f64>() / values.len() as f64)
  }
}

fn rate_percent(part: usize, whole: usize) -> f64 {
  if whole == 0 {
    return 0.0;
  }
  part as f64 / whole as f64 * 100.0
}

/// Format a date into a day bucket key: "YYYY-MM-DD".
pub fn day_key(date: NaiveDate) -> String {
  date.format("%Y-%m-%d").to_string()
}

// ---------------------------------------------------------------------------
// Team scalars (headline numbers before rating)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TeamScalars {
  /// Successful runs per day, counted from the full in-range run set —
  /// deliberately independent of commit mapping, deploy counts must
  /// reflect actual pipeline executions.
  pub deployment_frequency: f64,
  pub lead_time_minutes: f64,
  pub cycle_time_minutes: f64,
  pub change_failure_rate: f64,
  pub commit_frequency: f64,
  pub avg_batch_size: f64,
  pub avg_pipeline_duration_minutes: f64,
  pub avg_time_to_deploy_minutes: f64,
  /// Resolved mapped commits that succeeded, as a percentage.
  pub deploy_success_rate: f64,
}

pub fn team_scalars(
  mapped: &[MappedCommit],
  runs_in_range: &[Run],
  window: &AnalysisWindow,
) -> TeamScalars {
  let days = window.days();

  let successful_runs = runs_in_range
    .iter()
    .filter(|r| r.status == RunStatus::Success)
    .count();
  let failed_runs = runs_in_range.len() - successful_runs;

  let pipeline_durations: Vec<f64> = runs_in_range
    .iter()
    .filter_map(|r| r.completed_at.map(|done| minutes_between(r.started_at, done)))
    .collect();

  let non_merge: Vec<&MappedCommit> = mapped.iter().filter(|m| !m.commit.is_merge).collect();
  let leads: Vec<f64> = non_merge.iter().filter_map(|m| m.lead_time_minutes).collect();
  let cycles: Vec<f64> = non_merge.iter().filter_map(|m| m.cycle_time_minutes).collect();
  let batches: Vec<f64> = non_merge.iter().map(|m| m.commit.batch_size() as f64).collect();
  let deploys: Vec<f64> = non_merge
    .iter()
    .filter(|m| m.result == DeploymentResult::Success)
    .filter_map(|m| m.time_to_deploy_minutes)
    .collect();

  let succeeded = non_merge
    .iter()
    .filter(|m| m.result == DeploymentResult::Success)
    .count();
  let failed = non_merge
    .iter()
    .filter(|m| m.result == DeploymentResult::Failure)
    .count();

  TeamScalars {
    deployment_frequency: successful_runs as f64 / days,
    lead_time_minutes: mean(&leads),
    cycle_time_minutes: mean(&cycles),
    change_failure_rate: rate_percent(failed_runs, failed_runs + successful_runs),
    commit_frequency: non_merge.len() as f64 / days,
    avg_batch_size: mean(&batches),
    avg_pipeline_duration_minutes: mean(&pipeline_durations),
    avg_time_to_deploy_minutes: mean(&deploys),
    deploy_success_rate: rate_percent(succeeded, succeeded + failed),
  }
}

// ---------------------------------------------------------------------------
// Daily rollups
// ---------------------------------------------------------------------------

pub fn daily_rollups(
  mapped: &[MappedCommit],
  runs_in_range: &[Run],
  window: &AnalysisWindow,
) -> Vec<DailyRollup> {
  let mut commits_by_day: BTreeMap<NaiveDate, Vec<&MappedCommit>> = BTreeMap::new();
  for m in mapped {
    commits_by_day
      .entry(m.commit.authored_at.date_naive())
      .or_default()
      .push(m);
  }

  let mut runs_by_day: BTreeMap<NaiveDate, Vec<&Run>> = BTreeMap::new();
  for r in runs_in_range {
    runs_by_day.entry(r.started_at.date_naive()).or_default().push(r);
  }

  window
    .start
    .iter_days()
    .take_while(|d| *d <= window.end)
    .map(|day| {
      let day_commits: &[&MappedCommit] =
        commits_by_day.get(&day).map(Vec::as_slice).unwrap_or(&[]);
      let day_runs: &[&Run] = runs_by_day.get(&day).map(Vec::as_slice).unwrap_or(&[]);
      let successful_runs = day_runs
        .iter()
        .filter(|r| r.status == RunStatus::Success)
        .count();

      let leads: Vec<f64> = day_commits
        .iter()
        .filter(|m| !m.commit.is_merge)
        .filter_map(|m| m.lead_time_minutes)
        .collect();
      let cycles: Vec<f64> = day_commits
        .iter()
        .filter(|m| !m.commit.is_merge)
        .filter_map(|m| m.cycle_time_minutes)
        .collect();

      DailyRollup {
        date: day_key(day),
        commits: day_commits.len(),
        runs: day_runs.len(),
        successful_runs,
        failed_runs: day_runs.len() - successful_runs,
        avg_lead_time_minutes: mean_opt(&leads),
        avg_cycle_time_minutes: mean_opt(&cycles),
      }
    })
    .collect()
}

// ---------------------------------------------------------------------------
// Weekly rollups
// ---------------------------------------------------------------------------

pub fn weekly_rollups(
  mapped: &[MappedCommit],
  runs_in_range: &[Run],
  window: &AnalysisWindow,
) -> Vec<WeeklyRollup> {
  let mut buckets = Vec::new();
  let mut bucket_start = window.start;

  while bucket_start <= window.end {
    let bucket_end = (bucket_start + Duration::days(6)).min(window.end);
    let days_in_bucket =
      (bucket_end.signed_duration_since(bucket_start).num_days() + 1) as u32;

    let in_bucket = |d: NaiveDate| d >= bucket_start && d <= bucket_end;

    let bucket_commits: Vec<&MappedCommit> = mapped
      .iter()
      .filter(|m| in_bucket(m.commit.authored_at.date_naive()))
      .collect();
    let bucket_runs: Vec<&Run> = runs_in_range
      .iter()
      .filter(|r| in_bucket(r.started_at.date_naive()))
      .collect();
    let successful_runs = bucket_runs
      .iter()
      .filter(|r| r.status == RunStatus::Success)
      .count();
    let failed_runs = bucket_runs.len() - successful_runs;

    let leads: Vec<f64> = bucket_commits
      .iter()
      .filter(|m| !m.commit.is_merge)
      .filter_map(|m| m.lead_time_minutes)
      .collect();
    let cycles: Vec<f64> = bucket_commits
      .iter()
      .filter(|m| !m.commit.is_merge)
      .filter_map(|m| m.cycle_time_minutes)
      .collect();

    buckets.push(WeeklyRollup {
      week_start: day_key(bucket_start),
      days_in_bucket,
      commits: bucket_commits.len(),
      runs: bucket_runs.len(),
      successful_runs,
      failed_runs,
      deployment_frequency: successful_runs as f64 / days_in_bucket.max(1) as f64,
      change_failure_rate: rate_percent(failed_runs, failed_runs + successful_runs),
      avg_lead_time_minutes: mean_opt(&leads),
      avg_cycle_time_minutes: mean_opt(&cycles),
    });

    bucket_start = bucket_end + Duration::days(1);
  }

  buckets
}

// ---------------------------------------------------------------------------
// Per-author stats
// ---------------------------------------------------------------------------

/// Group non-merge commits by author identity. Sorted by commit count
/// descending, author name ascending for determinism.
pub fn author_stats(mapped: &[MappedCommit], window: &AnalysisWindow) -> Vec<AuthorStats> {
  let days = window.days();

  let mut by_author: HashMap<&str, Vec<&MappedCommit>> = HashMap::new();
  for m in mapped.iter().filter(|m| !m.commit.is_merge) {
    by_author.entry(m.commit.author.as_str()).or_default().push(m);
  }

  let mut stats: Vec<AuthorStats> = by_author
    .into_iter()
    .map(|(author, commits)| {
      let successful = commits
        .iter()
        .filter(|m| m.result == DeploymentResult::Success)
        .count();
      let failed = commits
        .iter()
        .filter(|m| m.result == DeploymentResult::Failure)
        .count();
      let pending = commits.len() - successful - failed;

      let leads: Vec<f64> = commits.iter().filter_map(|m| m.lead_time_minutes).collect();
      let cycles: Vec<f64> = commits.iter().filter_map(|m| m.cycle_time_minutes).collect();
      let deploys: Vec<f64> = commits
        .iter()
        .filter(|m| m.result == DeploymentResult::Success)
        .filter_map(|m| m.time_to_deploy_minutes)
        .collect();
      let batches: Vec<f64> = commits.iter().map(|m| m.commit.batch_size() as f64).collect();

      // Distinct deploying runs: one run shipping many commits counts once.
      let distinct_runs: HashSet<&str> = commits
        .iter()
        .filter_map(|m| m.deployed_run_id.as_deref())
        .collect();

      AuthorStats {
        author: author.to_string(),
        commits: commits.len(),
        successful,
        failed,
        pending,
        success_rate: rate_percent(successful, successful + failed),
        avg_batch_size: mean(&batches),
        deployment_frequency: distinct_runs.len() as f64 / days,
        avg_lead_time_minutes: mean_opt(&leads),
        avg_cycle_time_minutes: mean_opt(&cycles),
        avg_time_to_deploy_minutes: mean_opt(&deploys),
      }
    })
    .collect();

  stats.sort_by(|a, b| b.commits.cmp(&a.commits).then(a.author.cmp(&b.author)));
  stats
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::Commit;
  use chrono::{DateTime, TimeZone, Utc};

  fn window(start_day: u32, end_day: u32) -> AnalysisWindow {
    AnalysisWindow {
      start: NaiveDate::from_ymd_opt(2025, 3, start_day).unwrap(),
      end: NaiveDate::from_ymd_opt(2025, 3, end_day).unwrap(),
    }
  }

  fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap()
  }

  fn run(id: &str, status: RunStatus, started: DateTime<Utc>, minutes: i64) -> Run {
    Run {
      id: id.into(),
      workflow: "deploy".into(),
      status,
      started_at: started,
      completed_at: Some(started + Duration::minutes(minutes)),
    }
  }

  fn mapped(
    id: &str,
    author: &str,
    authored_at: DateTime<Utc>,
    is_merge: bool,
    result: DeploymentResult,
    deployed_run_id: Option<&str>,
    lead: Option<f64>,
  ) -> MappedCommit {
    MappedCommit {
      commit: Commit {
        id: id.into(),
        author: author.into(),
        authored_at,
        is_merge,
        lines_added: 20,
        lines_deleted: 10,
      },
      result,
      first_run_id: deployed_run_id.map(String::from),
      deployed_run_id: deployed_run_id.map(String::from),
      lead_time_minutes: lead,
      cycle_time_minutes: lead,
      time_to_deploy_minutes: lead.map(|l| l / 2.0),
    }
  }

  #[test]
  fn window_days_is_inclusive_and_floored() {
    assert_eq!(window(10, 10).days(), 1.0);
    assert_eq!(window(10, 16).days(), 7.0);
  }

  #[test]
  fn deployment_frequency_counts_runs_not_commits() {
    // Two successful runs over a 2-day window, zero commits mapped to them.
    let runs = vec![
      run("r1", RunStatus::Success, at(10, 9), 10),
      run("r2", RunStatus::Success, at(11, 9), 10),
      run("r3", RunStatus::Failure, at(11, 12), 10),
    ];
    let scalars = team_scalars(&[], &runs, &window(10, 11));
    assert_eq!(scalars.deployment_frequency, 1.0);
    assert!((scalars.change_failure_rate - 100.0 / 3.0).abs() < 1e-9);
  }

  #[test]
  fn empty_inputs_yield_zeros_not_nan() {
    let scalars = team_scalars(&[], &[], &window(10, 16));
    assert_eq!(scalars.deployment_frequency, 0.0);
    assert_eq!(scalars.change_failure_rate, 0.0);
    assert_eq!(scalars.lead_time_minutes, 0.0);
    assert_eq!(scalars.avg_batch_size, 0.0);
    assert_eq!(scalars.deploy_success_rate, 0.0);
  }

  #[test]
  fn merge_commits_excluded_from_rates_but_not_daily_counts() {
    let mapped_commits = vec![
      mapped("c1", "ada", at(10, 9), false, DeploymentResult::Success, Some("r1"), Some(30.0)),
      mapped("m1", "ada", at(10, 10), true, DeploymentResult::Success, Some("r1"), Some(99.0)),
    ];
    let scalars = team_scalars(&mapped_commits, &[], &window(10, 10));
    // Only the non-merge commit counts toward frequency and batch size.
    assert_eq!(scalars.commit_frequency, 1.0);
    assert_eq!(scalars.lead_time_minutes, 30.0);

    let daily = daily_rollups(&mapped_commits, &[], &window(10, 10));
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0].commits, 2);
    assert_eq!(daily[0].avg_lead_time_minutes, Some(30.0));
  }

  #[test]
  fn daily_covers_every_day_in_the_inclusive_window() {
    let daily = daily_rollups(&[], &[], &window(10, 14));
    let dates: Vec<_> = daily.iter().map(|d| d.date.as_str()).collect();
    assert_eq!(
      dates,
      vec!["2025-03-10", "2025-03-11", "2025-03-12", "2025-03-13", "2025-03-14"]
    );
    assert!(daily.iter().all(|d| d.avg_lead_time_minutes.is_none()));
  }

  #[test]
  fn weekly_buckets_cover_the_window_with_a_short_tail() {
    let runs = vec![
      run("r1", RunStatus::Success, at(10, 9), 10),
      run("r2", RunStatus::Failure, at(18, 9), 10),
    ];
    let weekly = weekly_rollups(&[], &runs, &window(10, 19));
    assert_eq!(weekly.len(), 2);
    assert_eq!(weekly[0].week_start, "2025-03-10");
    assert_eq!(weekly[0].days_in_bucket, 7);
    assert_eq!(weekly[0].successful_runs, 1);
    assert_eq!(weekly[0].deployment_frequency, 1.0 / 7.0);
    assert_eq!(weekly[1].week_start, "2025-03-17");
    assert_eq!(weekly[1].days_in_bucket, 3);
    assert_eq!(weekly[1].failed_runs, 1);
    assert_eq!(weekly[1].change_failure_rate, 100.0);
  }

  #[test]
  fn author_deployment_frequency_uses_distinct_runs() {
    // Three commits shipped by the same run must count one deploy.
    let mapped_commits = vec![
      mapped("c1", "ada", at(10, 8), false, DeploymentResult::Success, Some("r1"), Some(10.0)),
      mapped("c2", "ada", at(10, 9), false, DeploymentResult::Success, Some("r1"), Some(20.0)),
      mapped("c3", "ada", at(10, 10), false, DeploymentResult::Success, Some("r1"), Some(30.0)),
      mapped("c4", "grace", at(10, 11), false, DeploymentResult::Pending, None, None),
    ];
    let stats = author_stats(&mapped_commits, &window(10, 10));
    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0].author, "ada");
    assert_eq!(stats[0].deployment_frequency, 1.0);
    assert_eq!(stats[0].success_rate, 100.0);
    assert_eq!(stats[0].avg_lead_time_minutes, Some(20.0));

    // Pending commits are excluded from the success rate denominator.
    assert_eq!(stats[1].author, "grace");
    assert_eq!(stats[1].pending, 1);
    assert_eq!(stats[1].success_rate, 0.0);
    assert!(stats[1].avg_lead_time_minutes.is_none());
  }

  #[test]
  fn author_stats_skip_merge_commits_entirely() {
    let mapped_commits = vec![mapped(
      "m1",
      "ada",
      at(10, 9),
      true,
      DeploymentResult::Success,
      Some("r1"),
      Some(5.0),
    )];
    assert!(author_stats(&mapped_commits, &window(10, 10)).is_empty());
  }
}
