use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use hull_core::{AppInfo, ParetoStrategy};
use hull_opt::config::{OracleKind, ResolvedOutputs, SearchConfig};
use hull_opt::logging::init_logging;
use hull_opt::runner::OptimizationRunner;

/// Grid search over hull principal dimensions.
#[derive(Debug, Parser)]
#[command(
    name = "hullopt",
    author,
    version,
    about = "Hull grid search with feasibility filtering and Pareto ranking"
)]
struct Cli {
    /// Path to a YAML configuration file. Defaults apply when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Candidate lengths (m).
    #[arg(long = "L", value_name = "METRES", num_args = 0..)]
    length: Option<Vec<f64>>,

    /// Candidate beams (m).
    #[arg(long = "B", value_name = "METRES", num_args = 0..)]
    beam: Option<Vec<f64>>,

    /// Candidate drafts (m).
    #[arg(long = "T", value_name = "METRES", num_args = 0..)]
    draft: Option<Vec<f64>>,

    /// Candidate block coefficients.
    #[arg(long = "Cb", value_name = "COEFF", num_args = 0..)]
    block_coefficient: Option<Vec<f64>>,

    /// Output directory (may contain {run_id}).
    #[arg(long, value_name = "DIR")]
    out: Option<String>,

    /// Base name for every artifact written.
    #[arg(long, value_name = "NAME")]
    basename: Option<String>,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Evaluation worker threads.
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Pareto ranking strategy.
    #[arg(long, value_enum)]
    ranking: Option<RankingArg>,

    /// Hydrostatics oracle.
    #[arg(long, value_enum)]
    oracle: Option<OracleArg>,

    /// Rows listed in the report.
    #[arg(long, value_name = "N")]
    top_rows: Option<usize>,

    /// Write JSON-lines telemetry next to the other artifacts.
    #[arg(long)]
    log_structured: bool,

    /// Exit after validating the configuration (no search is run).
    #[arg(long)]
    validate_only: bool,

    /// Print the run summary as JSON on stdout instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RankingArg {
    Pairwise,
    Sweep,
}

impl From<RankingArg> for ParetoStrategy {
    fn from(arg: RankingArg) -> Self {
        match arg {
            RankingArg::Pairwise => ParetoStrategy::Pairwise,
            RankingArg::Sweep => ParetoStrategy::Sweep,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OracleArg {
    Block,
    LegacyMock,
}

impl From<OracleArg> for OracleKind {
    fn from(arg: OracleArg) -> Self {
        match arg {
            OracleArg::Block => OracleKind::Block,
            OracleArg::LegacyMock => OracleKind::LegacyMock,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = match cli.config.as_ref() {
        Some(path) => SearchConfig::from_path(path)?,
        None => SearchConfig::default(),
    };

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }
    if let Some(length) = cli.length {
        config.grid.length = length;
    }
    if let Some(beam) = cli.beam {
        config.grid.beam = beam;
    }
    if let Some(draft) = cli.draft {
        config.grid.draft = draft;
    }
    if let Some(block_coefficient) = cli.block_coefficient {
        config.grid.block_coefficient = block_coefficient;
    }
    if let Some(out) = cli.out {
        config.outputs.dir = out;
    }
    if let Some(basename) = cli.basename {
        config.outputs.basename = basename;
    }
    if let Some(workers) = cli.workers {
        config.execution.workers = workers;
    }
    if let Some(ranking) = cli.ranking {
        config.execution.ranking = ranking.into();
    }
    if let Some(oracle) = cli.oracle {
        config.oracle.kind = oracle.into();
    }
    if let Some(top_rows) = cli.top_rows {
        config.report.top_rows = top_rows;
    }
    if cli.log_structured {
        config.logging.enable_structured = true;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let candidates = config.grid.len();

    if !cli.json {
        println!(
            "{} {}: '{run_id}' with {candidates} candidate{} ({})",
            AppInfo::name(),
            AppInfo::version(),
            if candidates == 1 { "" } else { "s" },
            AppInfo::objectives()
        );
    }

    let runner = OptimizationRunner::new(config, outputs)?;

    // Nothing is created or truncated under the output directory in this mode.
    if cli.validate_only {
        if !cli.json {
            println!("Validation-only mode: search skipped.");
        }
        return Ok(());
    }

    let logging_guard = init_logging(&runner.config().logging, runner.outputs())?;

    let summary = runner.run()?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "Search complete for '{run_id}': {} rows, {} feasible, {} Pareto, {} failed",
        summary.table.rows, summary.table.feasible, summary.table.pareto, summary.table.failed
    );
    println!("Results: {}", summary.results.csv.display());
    println!(
        "Pareto front: {} ({} rows)",
        summary.pareto.csv.display(),
        summary.pareto.rows
    );
    println!("Report: {}", summary.report.document.display());
    if let Some(path) = summary.report.gz_chart.as_ref() {
        println!("GZ curve chart: {}", path.display());
    }
    if let Some(path) = summary.report.pareto_chart.as_ref() {
        println!("Pareto chart: {}", path.display());
    }
    if let Some(path) = logging_guard.telemetry_path.as_ref() {
        println!("Telemetry log: {}", path.display());
    }

    Ok(())
}
