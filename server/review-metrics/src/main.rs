//! Binary entrypoint: read one JSON object from stdin, write one to stdout.
//!
//! Output is either the review metrics Output or, when the input JSON is
//! unparsable, a structured ErrorOutput object (same shape the
//! delivery-metrics binary emits).

use delivery_metrics::types::ErrorOutput;
use review_metrics::{run, types::Input};
use std::io::{self, Read, Write};

fn main() {
  let mut raw = String::new();
  if let Err(e) = io::stdin().lock().read_to_string(&mut raw) {
    let _ = writeln!(io::stderr(), "review-metrics: read error: {}", e);
    std::process::exit(1);
  }

  let stdout = io::stdout();
  let mut out = stdout.lock();

  let input: Input = match serde_json::from_str(&raw) {
    Ok(v) => v,
    Err(e) => {
      let err = ErrorOutput::new(format!("json parse: {}", e));
      let _ = serde_json::to_writer(&mut out, &err);
      let _ = writeln!(out);
      std::process::exit(1);
    }
  };

  let _ = serde_json::to_writer(&mut out, &run(&input));
  let _ = writeln!(out);
}
