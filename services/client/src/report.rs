//! Plain-text rendering for the command line.

use std::fmt::Write;

use artifacts::decimal::to_fixed;
use artifacts::DatasetDescriptor;
use insights::{ChartSet, PredictionDisplay};
use workflow::{Notice, StepStatus};

pub fn notice(n: &Notice) -> String {
    format!("{}\n  {}", n.title, n.description)
}

/// `[x]` enterable, `[ ]` locked, `>` marks the active stage.
pub fn steps(steps: &[StepStatus]) -> String {
    steps
        .iter()
        .map(|s| {
            format!(
                "{} [{}] {}. {}",
                if s.active { ">" } else { " " },
                if s.enterable { "x" } else { " " },
                s.position,
                s.label
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn dataset(d: &DatasetDescriptor) -> String {
    let mut out = format!(
        "{} ({} rows x {} columns, blake3 {})\n",
        d.filename,
        d.row_count,
        d.column_count(),
        &d.content_hash_hex()[..12]
    );
    for col in &d.column_names {
        let dtype = d.dtypes.get(col).map(String::as_str).unwrap_or("?");
        let missing = d.missing_values.get(col).copied().unwrap_or(0);
        let _ = writeln!(out, "  {col:<24} {dtype:<10} missing={missing}");
    }
    out
}

pub fn charts(c: &ChartSet) -> String {
    let mut out = String::from("Feature importance\n");
    for bar in &c.importance {
        let width = (bar.importance_percent / 2.0).round().max(0.0) as usize;
        let _ = writeln!(
            out,
            "  {:<24} {:>6}% {}",
            bar.feature,
            to_fixed(bar.importance_percent, 2),
            "#".repeat(width)
        );
    }
    let _ = writeln!(out, "Actual vs predicted ({} test rows)", c.comparison.len());
    for p in c.comparison.iter().take(10) {
        let _ = writeln!(out, "  {:>4}  {:>12}  {:>12}", p.index, p.actual.to_string(), p.predicted.to_string());
    }
    out
}

pub fn prediction(p: &PredictionDisplay) -> String {
    match p.note {
        Some(note) => format!("Prediction: {}\n  {note}", p.display),
        None => format!("Prediction: {}", p.display),
    }
}
