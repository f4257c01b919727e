//! report-diff: compare two saved delivery-metrics reports
//!
//! Usage:
//!   report-diff <file1> <file2>     # compare two MetricsReport JSON files
//!   report-diff <file1> <file2> -q # quiet: exit 0 if same, 1 if different
//!
//! Compares the headline metric values and ratings. Use between two analysis
//! periods to see which metrics moved and which changed band.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::process;

#[derive(serde::Deserialize)]
struct MetricEntry {
    value: f64,
    #[serde(default)]
    unit: String,
    rating: String,
}

#[derive(serde::Deserialize)]
struct Report {
    metrics: BTreeMap<String, MetricEntry>,
    #[serde(default)]
    overall: Option<Overall>,
}

#[derive(serde::Deserialize)]
struct Overall {
    rating: String,
}

fn load_report(path: &str) -> Report {
    let contents = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("report-diff: cannot read {}: {}", path, e);
        process::exit(2);
    });
    serde_json::from_str(&contents).unwrap_or_else(|e| {
        eprintln!("report-diff: invalid JSON in {}: {}", path, e);
        process::exit(2);
    })
}

struct Change {
    name: String,
    line: String,
}

fn compare(a: &Report, b: &Report) -> Vec<Change> {
    let mut changes = Vec::new();

    let all_names: std::collections::BTreeSet<_> =
        a.metrics.keys().chain(b.metrics.keys()).cloned().collect();

    for name in all_names {
        match (a.metrics.get(&name), b.metrics.get(&name)) {
            (Some(m_a), Some(m_b)) => {
                let value_changed = m_a.value != m_b.value;
                let rating_changed = m_a.rating != m_b.rating;
                if value_changed || rating_changed {
                    let delta = m_b.value - m_a.value;
                    let mut line = format!(
                        "{} -> {} {} ({:+.2})",
                        m_a.value, m_b.value, m_b.unit, delta
                    );
                    if rating_changed {
                        line.push_str(&format!(", rating {} -> {}", m_a.rating, m_b.rating));
                    }
                    changes.push(Change { name, line });
                }
            }
            (Some(_), None) => changes.push(Change {
                name,
                line: "only in first report".into(),
            }),
            (None, Some(_)) => changes.push(Change {
                name,
                line: "only in second report".into(),
            }),
            (None, None) => unreachable!(),
        }
    }

    if let (Some(o_a), Some(o_b)) = (&a.overall, &b.overall) {
        if o_a.rating != o_b.rating {
            changes.push(Change {
                name: "overall".into(),
                line: format!("rating {} -> {}", o_a.rating, o_b.rating),
            });
        }
    }

    changes
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let quiet = args.iter().any(|a| a == "-q" || a == "--quiet");
    let files: Vec<_> = args.iter().filter(|a| !a.starts_with('-')).skip(1).collect();

    if files.len() != 2 {
        eprintln!("Usage: report-diff <file1> <file2> [-q|--quiet]");
        eprintln!("  -q  Quiet: only exit code (0=same, 1=different)");
        process::exit(2);
    }

    let a = load_report(files[0]);
    let b = load_report(files[1]);
    let changes = compare(&a, &b);

    if quiet {
        process::exit(if changes.is_empty() { 0 } else { 1 });
    }

    if changes.is_empty() {
        println!("no metric changes");
        return;
    }

    for change in &changes {
        println!("{}: {}", change.name, change.line);
    }
    process::exit(1);
}
