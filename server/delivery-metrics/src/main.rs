//! Binary entrypoint: read one JSON request from stdin, write one JSON
//! report to stdout.
//!
//! Output is either a MetricsReport or a structured ErrorOutput (when the
//! request itself is invalid — bad JSON or an inverted window). Malformed
//! individual records never fail the request; they are dropped during
//! normalization.

use delivery_metrics::types::ErrorOutput;
use delivery_metrics::{AnalysisRequest, Engine, EngineError};
use std::io::{self, Read, Write};

fn main() {
  let mut raw = String::new();
  if let Err(e) = io::stdin().lock().read_to_string(&mut raw) {
    let _ = writeln!(io::stderr(), "delivery-metrics: read error: {}", e);
    std::process::exit(1);
  }

  let request: AnalysisRequest = match serde_json::from_str(&raw) {
    Ok(v) => v,
    Err(e) => {
      emit_error(&ErrorOutput::new(format!("json parse: {}", e)));
      std::process::exit(1);
    }
  };

  let engine = Engine::with_defaults();
  match engine.analyze(&request) {
    Ok(report) => {
      let stdout = io::stdout();
      let mut out = stdout.lock();
      let _ = serde_json::to_writer(&mut out, &report);
      let _ = writeln!(out);
    }
    Err(e) => {
      let err = match &e {
        EngineError::Validation { field, reason } => {
          ErrorOutput::new(reason.clone()).with_field(field.clone())
        }
        _ => ErrorOutput::new(e.to_string()),
      };
      emit_error(&err);
      std::process::exit(1);
    }
  }
}

fn emit_error(err: &ErrorOutput) {
  let stdout = io::stdout();
  let mut out = stdout.lock();
  let _ = serde_json::to_writer(&mut out, err);
  let _ = writeln!(out);
}
