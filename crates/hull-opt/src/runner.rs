use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use hull_core::oracle::{LegacyAdapter, MockHullOracle};
use hull_core::{
    Evaluator, GridError, GridSearch, HullEvaluator, ParetoRanker, ResultTable, SyntheticGz,
    TableSummary,
};
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;

use crate::config::{OracleKind, ResolvedOutputs, SearchConfig, ValidationError};
use crate::export::{ExportError, ExportPaths, export_pareto_only, export_results};
use crate::report::{ReportError, ReportOutputs, RunMeta, write_report};

/// Runs one configured search end to end: evaluate, rank, export, report.
pub struct OptimizationRunner {
    config: SearchConfig,
    outputs: ResolvedOutputs,
    search: GridSearch,
    evaluator: Box<dyn Evaluator>,
}

/// Summary details returned after a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub table: TableSummary,
    pub results: ExportPaths,
    pub pareto: ExportPaths,
    pub report: ReportOutputs,
    pub meta: RunMeta,
}

impl OptimizationRunner {
    /// Build a runner. The configuration is validated here, so a runner
    /// never holds an empty axis or an unusable bound.
    pub fn new(mut config: SearchConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        config.validate()?;
        let search = GridSearch::new(config.feasibility)
            .with_ranker(ParetoRanker::new(config.execution.ranking))
            .with_workers(config.execution.workers);
        let evaluator = build_evaluator(&config);
        Ok(Self {
            config,
            outputs,
            search,
            evaluator,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn outputs(&self) -> &ResolvedOutputs {
        &self.outputs
    }

    /// Evaluate and rank the grid without touching the filesystem.
    pub fn search(&self) -> Result<ResultTable, RunnerError> {
        Ok(self
            .search
            .search(self.evaluator.as_ref(), &self.config.grid)?)
    }

    /// Execute the search and write every artifact.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        let started_at = OffsetDateTime::now_utc();
        let clock = Instant::now();
        info!(
            run_id = %self.config.run_id,
            candidates = self.config.grid.len(),
            workers = self.config.execution.workers,
            "starting grid search"
        );

        let table = self.search()?;

        fs::create_dir_all(&self.outputs.dir).map_err(|source| RunnerError::Io {
            path: self.outputs.dir.clone(),
            source,
        })?;
        let results = export_results(
            &table,
            &self.outputs.results_csv,
            &self.outputs.results_jsonl,
        )?;
        let pareto = export_pareto_only(
            &table,
            &self.outputs.pareto_csv,
            &self.outputs.pareto_jsonl,
        )?;

        let meta = RunMeta {
            run_id: self.config.run_id.clone(),
            started: RunMeta::timestamp(started_at),
            finished: RunMeta::timestamp(OffsetDateTime::now_utc()),
            elapsed_secs: clock.elapsed().as_secs_f64(),
        };
        let report = write_report(
            &table,
            &self.config.stability,
            &meta,
            self.config.report.top_rows,
            &self.outputs,
        )?;

        let summary = table.summary();
        info!(
            run_id = %self.config.run_id,
            rows = summary.rows,
            feasible = summary.feasible,
            pareto = summary.pareto,
            failed = summary.failed,
            elapsed_secs = meta.elapsed_secs,
            "grid search artifacts written"
        );

        Ok(RunSummary {
            table: summary,
            results,
            pareto,
            report,
            meta,
        })
    }
}

fn build_evaluator(config: &SearchConfig) -> Box<dyn Evaluator> {
    let stability: SyntheticGz = config.stability;
    match config.oracle.kind {
        OracleKind::Block => Box::new(HullEvaluator::new(config.oracle.hull, stability)),
        OracleKind::LegacyMock => Box::new(HullEvaluator::new(
            LegacyAdapter::new(MockHullOracle::with_block_coefficient(
                config.oracle.legacy_block_coefficient,
            )),
            stability,
        )),
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ValidationError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("failed to create output directory {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
    #[error("report failed: {0}")]
    Report(#[from] ReportError),
}
