//! Rating engine: fixed threshold tables mapping each scalar metric to one
//! of four ordered quality bands, plus the overall score.
//!
//! Two separate tables exist — trunk-model delivery metrics and
//! PR-lifecycle metrics — and they are never conflated. Thresholds are
//! immutable constants; rating is a total function of (value, table entry).

use crate::types::{OverallRating, Rating};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
  LowerIsBetter,
  HigherIsBetter,
}

/// Ordered threshold triple splitting a metric into four tiers.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
  pub t0: f64,
  pub t1: f64,
  pub t2: f64,
  pub polarity: Polarity,
}

impl Thresholds {
  pub const fn lower(t0: f64, t1: f64, t2: f64) -> Self {
    Self {
      t0,
      t1,
      t2,
      polarity: Polarity::LowerIsBetter,
    }
  }

  pub const fn higher(t0: f64, t1: f64, t2: f64) -> Self {
    Self {
      t0,
      t1,
      t2,
      polarity: Polarity::HigherIsBetter,
    }
  }

  pub fn rate(&self, value: f64) -> Rating {
    match self.polarity {
      Polarity::LowerIsBetter => {
        if value <= self.t0 {
          Rating::Elite
        } else if value <= self.t1 {
          Rating::High
        } else if value <= self.t2 {
          Rating::Medium
        } else {
          Rating::Low
        }
      }
      Polarity::HigherIsBetter => {
        if value >= self.t0 {
          Rating::Elite
        } else if value >= self.t1 {
          Rating::High
        } else if value >= self.t2 {
          Rating::Medium
        } else {
          Rating::Low
        }
      }
    }
  }
}

/// Thresholds for trunk-model delivery metrics.
pub mod trunk {
  use super::Thresholds;

  /// Successful runs per day: daily+, weekly-ish, monthly-ish.
  pub const DEPLOYMENT_FREQUENCY: Thresholds = Thresholds::higher(1.0, 0.2, 1.0 / 30.0);
  /// Minutes: within an hour, a day, a week.
  pub const LEAD_TIME: Thresholds = Thresholds::lower(60.0, 1440.0, 10_080.0);
  pub const CYCLE_TIME: Thresholds = LEAD_TIME;
  /// Percent of resolved runs that failed.
  pub const CHANGE_FAILURE_RATE: Thresholds = Thresholds::lower(5.0, 15.0, 30.0);
  /// Hours: within an hour, a day, a week.
  pub const MEAN_TIME_TO_RECOVERY: Thresholds = Thresholds::lower(1.0, 24.0, 168.0);
  /// Non-merge commits per day.
  pub const COMMIT_FREQUENCY: Thresholds = Thresholds::higher(3.0, 1.0, 0.2);
  /// Changed lines per commit.
  pub const BATCH_SIZE: Thresholds = Thresholds::lower(150.0, 400.0, 1000.0);
  /// Minutes of pipeline wall time.
  pub const PIPELINE_DURATION: Thresholds = Thresholds::lower(10.0, 30.0, 60.0);
  /// Minutes from run start to completion for the deploying run.
  pub const TIME_TO_DEPLOY: Thresholds = Thresholds::lower(30.0, 240.0, 1440.0);
  /// Percent of resolved mapped commits that succeeded.
  pub const DEPLOY_SUCCESS_RATE: Thresholds = Thresholds::higher(95.0, 85.0, 70.0);
}

/// Thresholds for PR-lifecycle phase metrics (all minutes, lower is better).
pub mod pull_request {
  use super::Thresholds;

  pub const CODING_TIME: Thresholds = Thresholds::lower(1440.0, 4320.0, 10_080.0);
  pub const PICKUP_TIME: Thresholds = Thresholds::lower(60.0, 240.0, 1440.0);
  pub const APPROVE_TIME: Thresholds = Thresholds::lower(60.0, 480.0, 2880.0);
  pub const MERGE_TIME: Thresholds = Thresholds::lower(60.0, 240.0, 1440.0);
  pub const REVIEW_TIME: Thresholds = Thresholds::lower(1440.0, 4320.0, 10_080.0);
  pub const CYCLE_TIME: Thresholds = Thresholds::lower(2880.0, 7200.0, 20_160.0);
}

/// Overall score: mean rating points (Elite=4 … Low=1) mapped back to a
/// band via fixed breakpoints. No weighting, no normalization — each
/// input rating stays independently auditable against its table.
pub fn overall(ratings: &[Rating]) -> OverallRating {
  if ratings.is_empty() {
    return OverallRating {
      score: 0.0,
      rating: Rating::Low,
    };
  }
  let score =
    ratings.iter().map(|r| r.points() as f64).sum::<f64>() / ratings.len() as f64;
  let rating = if score >= 3.5 {
    Rating::Elite
  } else if score >= 2.5 {
    Rating::High
  } else if score >= 1.5 {
    Rating::Medium
  } else {
    Rating::Low
  };
  OverallRating { score, rating }
}
