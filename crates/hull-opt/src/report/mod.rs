//! Human-readable run report: a Markdown document plus two charts.
//!
//! Chart failures never fail the run. They are logged and noted in the
//! document in place of the image link.

pub mod charts;

use std::fmt::Write as _;
use std::path::PathBuf;

use hull_core::{ResultRecord, ResultTable, StabilityModel, TableSummary};
use serde::Serialize;
use statrs::statistics::Statistics;
use thiserror::Error;
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::warn;

use crate::config::ResolvedOutputs;
use crate::export::{ExportError, write_atomic};
use charts::{ScatterSeries, render_gz_curve, render_pareto_scatter};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write report: {0}")]
    Write(#[from] ExportError),
    #[error("failed to render plot: {0}")]
    Plot(String),
}

/// Wall-clock bounds of a run, UTC.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMeta {
    pub run_id: String,
    pub started: String,
    pub finished: String,
    pub elapsed_secs: f64,
}

impl RunMeta {
    pub fn timestamp(at: OffsetDateTime) -> String {
        at.format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second] UTC"
        ))
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
    }
}

/// Min, max, mean and sample standard deviation of one objective.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObjectiveStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl ObjectiveStats {
    /// `None` for an empty sample. A single value has zero spread.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let std_dev = if values.len() > 1 {
            values.iter().std_dev()
        } else {
            0.0
        };
        Some(Self {
            count: values.len(),
            min,
            max,
            mean: values.iter().mean(),
            std_dev,
        })
    }
}

/// Statistics over the feasible rows with finite objectives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeasibleStats {
    pub displacement: Option<ObjectiveStats>,
    pub gz_max: Option<ObjectiveStats>,
}

impl FeasibleStats {
    pub fn from_table(table: &ResultTable) -> Self {
        let rows: Vec<&ResultRecord> = table
            .records()
            .iter()
            .filter(|r| r.feasible && r.objectives().is_finite())
            .collect();
        let displacement: Vec<f64> = rows.iter().map(|r| r.displacement).collect();
        let gz_max: Vec<f64> = rows.iter().map(|r| r.gz_max).collect();
        Self {
            displacement: ObjectiveStats::from_values(&displacement),
            gz_max: ObjectiveStats::from_values(&gz_max),
        }
    }
}

/// Artifacts produced by [`write_report`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportOutputs {
    pub document: PathBuf,
    pub gz_chart: Option<PathBuf>,
    pub pareto_chart: Option<PathBuf>,
}

/// Render both charts, then write the Markdown document.
pub fn write_report(
    table: &ResultTable,
    stability: &dyn StabilityModel,
    meta: &RunMeta,
    top_rows: usize,
    outputs: &ResolvedOutputs,
) -> Result<ReportOutputs, ReportError> {
    let best = table.best_pareto();
    let gz_chart = match best {
        Some(record) => {
            let curve = stability.righting_arm_curve(&record.candidate);
            chart_or_warn("gz", render_gz_curve(&outputs.gz_chart, &curve))
        }
        None => Err("no row has a finite GZ max".to_string()),
    };
    let pareto_chart = chart_or_warn(
        "pareto",
        render_pareto_scatter(&outputs.pareto_chart, &ScatterSeries::from_table(table)),
    );

    let document = render_markdown(table, meta, top_rows, best, &gz_chart, &pareto_chart);
    write_atomic(&outputs.report_md, |w| {
        w.write_all(document.as_bytes())
            .map_err(|source| ExportError::Io {
                context: "writing report",
                path: PathBuf::new(),
                source,
            })
    })?;

    Ok(ReportOutputs {
        document: outputs.report_md.clone(),
        gz_chart: gz_chart.ok(),
        pareto_chart: pareto_chart.ok(),
    })
}

fn chart_or_warn(kind: &str, result: Result<PathBuf, ReportError>) -> Result<PathBuf, String> {
    result.map_err(|err| {
        warn!(chart = kind, error = %err, "chart skipped");
        err.to_string()
    })
}

fn render_markdown(
    table: &ResultTable,
    meta: &RunMeta,
    top_rows: usize,
    best: Option<&ResultRecord>,
    gz_chart: &Result<PathBuf, String>,
    pareto_chart: &Result<PathBuf, String>,
) -> String {
    let TableSummary {
        rows,
        feasible,
        pareto,
        failed,
    } = table.summary();
    let stats = FeasibleStats::from_table(table);

    let mut doc = String::new();
    let _ = writeln!(doc, "# Hull grid search: {}\n", meta.run_id);
    let _ = writeln!(doc, "- Started: {}", meta.started);
    let _ = writeln!(doc, "- Finished: {}", meta.finished);
    let _ = writeln!(doc, "- Elapsed: {:.2} s\n", meta.elapsed_secs);

    doc.push_str("## Summary\n\n");
    doc.push_str("| Rows | Feasible | Pareto | Failed |\n");
    doc.push_str("|------|----------|--------|--------|\n");
    let _ = writeln!(doc, "| {rows} | {feasible} | {pareto} | {failed} |\n");

    doc.push_str("## Feasible objectives\n\n");
    match (stats.displacement, stats.gz_max) {
        (Some(displacement), Some(gz_max)) => {
            doc.push_str("| Objective | Min | Max | Mean | Std dev |\n");
            doc.push_str("|-----------|-----|-----|------|---------|\n");
            for (name, s, precision) in [
                ("Displacement (t)", displacement, 1),
                ("GZ max (m)", gz_max, 4),
            ] {
                let _ = writeln!(
                    doc,
                    "| {name} | {:.p$} | {:.p$} | {:.p$} | {:.p$} |",
                    s.min,
                    s.max,
                    s.mean,
                    s.std_dev,
                    p = precision
                );
            }
            doc.push('\n');
        }
        _ => doc.push_str("No feasible candidates.\n\n"),
    }

    let _ = writeln!(doc, "## Top {top_rows} candidates\n");
    doc.push_str("| L | B | T | Cb | Displacement | GZ max | Feasible | Pareto |\n");
    doc.push_str("|---|---|---|----|--------------|--------|----------|--------|\n");
    for record in table.report_order().into_iter().take(top_rows) {
        let _ = writeln!(
            doc,
            "| {:.2} | {:.2} | {:.2} | {:.3} | {:.1} | {:.4} | {} | {} |",
            record.candidate.length,
            record.candidate.beam,
            record.candidate.draft,
            record.candidate.block_coefficient,
            record.displacement,
            record.gz_max,
            yes_no(record.feasible),
            yes_no(record.pareto),
        );
    }
    doc.push('\n');

    doc.push_str("## GZ curve\n\n");
    if let Some(record) = best {
        let source = if record.is_pareto_optimal() {
            "best Pareto candidate"
        } else {
            "no Pareto candidate; highest GZ max overall"
        };
        let _ = writeln!(
            doc,
            "Candidate L={} B={} T={} Cb={} ({source}).\n",
            record.candidate.length,
            record.candidate.beam,
            record.candidate.draft,
            record.candidate.block_coefficient
        );
    }
    if gz_chart.is_ok() {
        doc.push_str("Heel angle (deg) on x, GZ (m) on y.\n\n");
    }
    push_chart(&mut doc, "GZ curve", gz_chart);

    doc.push_str("## Displacement vs GZ max\n\n");
    if pareto_chart.is_ok() {
        doc.push_str(
            "Displacement (t) on x, GZ max (m) on y. \
             Grey: infeasible. Blue: feasible. Red: Pareto.\n\n",
        );
    }
    push_chart(&mut doc, "Pareto scatter", pareto_chart);
    doc
}

fn push_chart(doc: &mut String, alt: &str, chart: &Result<PathBuf, String>) {
    match chart {
        Ok(path) => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            let _ = writeln!(doc, "![{alt}]({name})\n");
        }
        Err(reason) => {
            let _ = writeln!(doc, "_Chart unavailable: {reason}_\n");
        }
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}
