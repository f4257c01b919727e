//! Normalize raw commit and run records into canonical internal models.
//!
//! A record with an unparsable timestamp is dropped, never fatal to the
//! batch: partial results beat failing a whole analysis for one bad row.

use chrono::{DateTime, Duration, Utc};

use crate::config::Config;
use crate::types::{AnalysisWindow, Commit, InboundCommit, InboundRun, Run, RunStatus};

fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .ok()
    .map(|t| t.with_timezone(&Utc))
}

/// Parse and normalize inbound commits, dropping unparsable rows.
pub fn normalize_commits(raw: &[InboundCommit]) -> Vec<Commit> {
  raw
    .iter()
    .filter_map(|c| {
      let authored_at = parse_instant(&c.timestamp)?;
      Some(Commit {
        id: c.sha.clone(),
        author: c.author.clone(),
        authored_at,
        is_merge: c.parents.len() > 1,
        lines_added: c.additions,
        lines_deleted: c.deletions,
      })
    })
    .collect()
}

/// Parse and normalize inbound runs. Drops runs that:
/// - belong to a different workflow (case-insensitive match),
/// - have a conclusion that maps to neither success nor failure,
/// - have an unparsable timestamp,
/// - start outside the widened `[start - lookback, end + lookahead]` window.
///
/// Start time falls back from `run_started_at` to `created_at`; completion
/// time falls back from `updated_at` to `created_at`.
pub fn normalize_runs(
  raw: &[InboundRun],
  workflow: &str,
  window: &AnalysisWindow,
  config: &Config,
) -> Vec<Run> {
  let earliest = window.start_instant() - Duration::days(config.lookback_days);
  let latest = window.end_instant() + Duration::days(config.lookahead_days);

  raw
    .iter()
    .filter_map(|r| {
      if !r.workflow_name.eq_ignore_ascii_case(workflow) {
        return None;
      }
      let status = RunStatus::from_conclusion(&r.conclusion)?;

      let created_at = parse_instant(&r.created_at)?;
      let started_at = match &r.run_started_at {
        Some(s) => parse_instant(s)?,
        None => created_at,
      };
      let completed_at = match &r.updated_at {
        Some(s) => parse_instant(s)?,
        None => created_at,
      };

      if started_at < earliest || started_at >= latest {
        return None;
      }

      Some(Run {
        id: r.id.clone(),
        workflow: r.workflow_name.clone(),
        status,
        started_at,
        completed_at: Some(completed_at),
      })
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::NaiveDate;

  fn window() -> AnalysisWindow {
    AnalysisWindow {
      start: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
      end: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
    }
  }

  fn inbound_run(id: &str, conclusion: &str, created_at: &str) -> InboundRun {
    InboundRun {
      id: id.into(),
      workflow_name: "Deploy".into(),
      conclusion: conclusion.into(),
      run_started_at: None,
      created_at: created_at.into(),
      updated_at: None,
      head_sha: None,
    }
  }

  #[test]
  fn merge_flag_derived_from_parent_count() {
    let raw = vec![
      InboundCommit {
        sha: "a1".into(),
        author: "ada".into(),
        timestamp: "2025-03-02T10:00:00Z".into(),
        parents: vec!["p1".into()],
        additions: 10,
        deletions: 2,
      },
      InboundCommit {
        sha: "m1".into(),
        author: "ada".into(),
        timestamp: "2025-03-02T11:00:00Z".into(),
        parents: vec!["p1".into(), "p2".into()],
        additions: 0,
        deletions: 0,
      },
    ];
    let commits = normalize_commits(&raw);
    assert_eq!(commits.len(), 2);
    assert!(!commits[0].is_merge);
    assert!(commits[1].is_merge);
  }

  #[test]
  fn bad_commit_timestamp_drops_only_that_row() {
    let raw = vec![
      InboundCommit {
        sha: "bad".into(),
        author: "ada".into(),
        timestamp: "not-a-date".into(),
        parents: vec![],
        additions: 0,
        deletions: 0,
      },
      InboundCommit {
        sha: "ok".into(),
        author: "ada".into(),
        timestamp: "2025-03-02T10:00:00Z".into(),
        parents: vec![],
        additions: 1,
        deletions: 1,
      },
    ];
    let commits = normalize_commits(&raw);
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].id, "ok");
  }

  #[test]
  fn conclusion_mapping() {
    assert_eq!(RunStatus::from_conclusion("success"), Some(RunStatus::Success));
    assert_eq!(RunStatus::from_conclusion("failure"), Some(RunStatus::Failure));
    assert_eq!(RunStatus::from_conclusion("timed_out"), Some(RunStatus::Failure));
    assert_eq!(RunStatus::from_conclusion("cancelled"), Some(RunStatus::Failure));
    assert_eq!(RunStatus::from_conclusion("skipped"), None);
    assert_eq!(RunStatus::from_conclusion("neutral"), None);
  }

  #[test]
  fn unknown_conclusion_and_other_workflow_are_dropped() {
    let raw = vec![
      inbound_run("1", "success", "2025-03-05T10:00:00Z"),
      inbound_run("2", "skipped", "2025-03-05T11:00:00Z"),
      InboundRun {
        workflow_name: "Nightly".into(),
        ..inbound_run("3", "success", "2025-03-05T12:00:00Z")
      },
    ];
    let runs = normalize_runs(&raw, "deploy", &window(), &Config::default());
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].id, "1");
  }

  #[test]
  fn completion_falls_back_updated_then_created() {
    let mut with_update = inbound_run("1", "success", "2025-03-05T10:00:00Z");
    with_update.updated_at = Some("2025-03-05T10:20:00Z".into());
    let without_update = inbound_run("2", "success", "2025-03-05T11:00:00Z");

    let runs = normalize_runs(
      &[with_update, without_update],
      "deploy",
      &window(),
      &Config::default(),
    );
    assert_eq!(runs.len(), 2);
    assert_eq!(
      runs[0].completed_at.unwrap(),
      parse_instant("2025-03-05T10:20:00Z").unwrap()
    );
    assert_eq!(
      runs[1].completed_at.unwrap(),
      parse_instant("2025-03-05T11:00:00Z").unwrap()
    );
  }

  #[test]
  fn start_falls_back_to_created() {
    let mut explicit = inbound_run("1", "success", "2025-03-05T10:00:00Z");
    explicit.run_started_at = Some("2025-03-05T10:05:00Z".into());
    let runs = normalize_runs(&[explicit], "deploy", &window(), &Config::default());
    assert_eq!(runs[0].started_at, parse_instant("2025-03-05T10:05:00Z").unwrap());
  }

  #[test]
  fn runs_outside_widened_window_are_dropped() {
    let raw = vec![
      // 8 days before the window start: beyond the 7-day lookback.
      inbound_run("too-early", "success", "2025-02-21T10:00:00Z"),
      // Inside the lookback.
      inbound_run("lookback", "success", "2025-02-26T10:00:00Z"),
      // Inside the lookahead (window end is Mar 31, +7d reaches Apr 7).
      inbound_run("lookahead", "success", "2025-04-03T10:00:00Z"),
      // Beyond the lookahead.
      inbound_run("too-late", "success", "2025-04-20T10:00:00Z"),
    ];
    let runs = normalize_runs(&raw, "deploy", &window(), &Config::default());
    let ids: Vec<_> = runs.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["lookback", "lookahead"]);
  }
}
