//! Commit-to-deployment mapping: join each commit to the CI run that
//! represents its delivery outcome.
//!
//! The model is trunk-based: a commit's "deployment" is the first run
//! observed at or after its authored time. The first run of any status
//! decides the deployment result ("did the very next delivery attempt
//! succeed"); the first *successful* run decides lead time ("when did my
//! change eventually ship").

use chrono::{DateTime, Utc};

use crate::types::{Commit, DeploymentResult, MappedCommit, Run, RunStatus};

pub fn minutes_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
  (to - from).num_seconds() as f64 / 60.0
}

/// Map every commit against the run set. Runs are stable-sorted ascending
/// by start time; ties at identical starts resolve by input order.
pub fn map_commits(commits: &[Commit], runs: &[Run]) -> Vec<MappedCommit> {
  let mut by_start: Vec<&Run> = runs.iter().collect();
  by_start.sort_by_key(|r| r.started_at);

  commits.iter().map(|c| map_one(c, &by_start)).collect()
}

fn map_one(commit: &Commit, runs_by_start: &[&Run]) -> MappedCommit {
  let first_run = runs_by_start
    .iter()
    .find(|r| r.started_at >= commit.authored_at);

  let first_success = runs_by_start
    .iter()
    .find(|r| r.status == RunStatus::Success && r.started_at >= commit.authored_at);

  let result = match first_run {
    Some(r) => DeploymentResult::from(r.status),
    None => DeploymentResult::Pending,
  };

  let lead_time_minutes = first_success
    .and_then(|r| r.completed_at)
    .map(|done| minutes_between(commit.authored_at, done));

  let time_to_deploy_minutes = first_success
    .and_then(|r| r.completed_at.map(|done| minutes_between(r.started_at, done)));

  MappedCommit {
    commit: commit.clone(),
    result,
    first_run_id: first_run.map(|r| r.id.clone()),
    deployed_run_id: first_success.map(|r| r.id.clone()),
    lead_time_minutes,
    // Trunk model: no separate coding-time phase.
    cycle_time_minutes: lead_time_minutes,
    time_to_deploy_minutes,
  }
}
