//! Engine configuration with sane defaults.

/// Tunable bounds for the widened run window.
///
/// The caller's fetch contract is `[start - lookback, end + lookahead]`:
/// lookback lets an incident that began before the window resolve inside it,
/// lookahead resolves commits near the window edge whose deploying run
/// starts late. Runs outside the widened window are dropped during
/// normalization.
#[derive(Debug, Clone)]
pub struct Config {
  /// Days of run history accepted before the window start.
  pub lookback_days: i64,
  /// Days of run history accepted after the window end.
  pub lookahead_days: i64,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      lookback_days: 7,
      lookahead_days: 7,
    }
  }
}
