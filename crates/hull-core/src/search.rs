use std::fmt;
use std::thread;

use serde::Deserialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::evaluate::Evaluator;
use crate::feasibility::{BoundsError, FeasibilityBounds};
use crate::model::Candidate;
use crate::pareto::ParetoRanker;
use crate::table::{ResultRecord, ResultTable, TableError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Length,
    Beam,
    Draft,
    BlockCoefficient,
}

impl Axis {
    pub fn symbol(&self) -> &'static str {
        match self {
            Axis::Length => "L",
            Axis::Beam => "B",
            Axis::Draft => "T",
            Axis::BlockCoefficient => "Cb",
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            Axis::Length => "length",
            Axis::Beam => "beam",
            Axis::Draft => "draft",
            Axis::BlockCoefficient => "block_coefficient",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.symbol(), self.field())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("axis {0} has no candidate values")]
    EmptyAxis(Axis),
    #[error("axis {axis} contains {value}; values must be finite and positive")]
    InvalidValue { axis: Axis, value: f64 },
    #[error("invalid feasibility bounds: {0}")]
    Bounds(#[from] BoundsError),
    #[error(transparent)]
    Table(#[from] TableError),
}

/// Candidate values per design variable.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GridAxes {
    pub length: Vec<f64>,
    pub beam: Vec<f64>,
    pub draft: Vec<f64>,
    pub block_coefficient: Vec<f64>,
}

impl Default for GridAxes {
    fn default() -> Self {
        Self {
            length: vec![90.0, 100.0],
            beam: vec![14.0, 16.0],
            draft: vec![5.0, 6.0],
            block_coefficient: vec![0.55, 0.65],
        }
    }
}

impl GridAxes {
    pub fn new(
        length: Vec<f64>,
        beam: Vec<f64>,
        draft: Vec<f64>,
        block_coefficient: Vec<f64>,
    ) -> Self {
        Self {
            length,
            beam,
            draft,
            block_coefficient,
        }
    }

    fn axes(&self) -> [(Axis, &[f64]); 4] {
        [
            (Axis::Length, self.length.as_slice()),
            (Axis::Beam, self.beam.as_slice()),
            (Axis::Draft, self.draft.as_slice()),
            (Axis::BlockCoefficient, self.block_coefficient.as_slice()),
        ]
    }

    /// Empty axes are reported before bad values, first axis first.
    pub fn validate(&self) -> Result<(), GridError> {
        for (axis, values) in self.axes() {
            if values.is_empty() {
                return Err(GridError::EmptyAxis(axis));
            }
        }
        for (axis, values) in self.axes() {
            if let Some(&value) = values.iter().find(|v| !(v.is_finite() && **v > 0.0)) {
                return Err(GridError::InvalidValue { axis, value });
            }
        }
        Ok(())
    }

    /// Size of the Cartesian product.
    pub fn len(&self) -> usize {
        self.axes().iter().map(|(_, values)| values.len()).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cartesian product with L outermost and Cb innermost.
    pub fn candidates(&self) -> impl Iterator<Item = Candidate> + '_ {
        self.length.iter().flat_map(move |&length| {
            self.beam.iter().flat_map(move |&beam| {
                self.draft.iter().flat_map(move |&draft| {
                    self.block_coefficient
                        .iter()
                        .map(move |&cb| Candidate::new(length, beam, draft, cb))
                })
            })
        })
    }
}

/// Exhaustive search over a [`GridAxes`] product.
///
/// Every candidate is evaluated, checked against the bounds and appended to
/// the table in enumeration order; the table is ranked once at the end.
#[derive(Debug, Clone)]
pub struct GridSearch {
    bounds: FeasibilityBounds,
    ranker: ParetoRanker,
    workers: usize,
}

impl GridSearch {
    pub fn new(bounds: FeasibilityBounds) -> Self {
        Self {
            bounds,
            ranker: ParetoRanker::default(),
            workers: 1,
        }
    }

    pub fn with_ranker(mut self, ranker: ParetoRanker) -> Self {
        self.ranker = ranker;
        self
    }

    /// Worker threads for evaluation; 0 is treated as 1.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn bounds(&self) -> &FeasibilityBounds {
        &self.bounds
    }

    pub fn search<E>(&self, evaluator: &E, axes: &GridAxes) -> Result<ResultTable, GridError>
    where
        E: Evaluator + ?Sized,
    {
        axes.validate()?;
        self.bounds.validate()?;

        let candidates: Vec<Candidate> = axes.candidates().collect();
        let records = self.evaluate_all(evaluator, &candidates);

        let mut table = ResultTable::with_capacity(records.len());
        for record in records {
            table.push(record)?;
        }
        table.rank(&self.ranker);

        let summary = table.summary();
        event!(
            target: "hull_core::search",
            Level::INFO,
            rows = summary.rows,
            feasible = summary.feasible,
            pareto = summary.pareto,
            failed = summary.failed,
            workers = self.workers,
            "grid search complete"
        );
        Ok(table)
    }

    fn evaluate_all<E>(&self, evaluator: &E, candidates: &[Candidate]) -> Vec<ResultRecord>
    where
        E: Evaluator + ?Sized,
    {
        if self.workers == 1 || candidates.len() < 2 {
            return candidates
                .iter()
                .map(|candidate| self.record(evaluator, candidate))
                .collect();
        }

        // Contiguous chunks joined in spawn order keep enumeration order.
        let chunk_len = candidates.len().div_ceil(self.workers);
        thread::scope(|scope| {
            let handles: Vec<_> = candidates
                .chunks(chunk_len)
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|candidate| self.record(evaluator, candidate))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
                })
                .collect()
        })
    }

    fn record<E>(&self, evaluator: &E, candidate: &Candidate) -> ResultRecord
    where
        E: Evaluator + ?Sized,
    {
        let evaluation = match evaluator.evaluate(candidate) {
            Ok(evaluation) => evaluation,
            Err(err) => {
                event!(
                    target: "hull_core::search",
                    Level::WARN,
                    length = candidate.length,
                    beam = candidate.beam,
                    draft = candidate.draft,
                    block_coefficient = candidate.block_coefficient,
                    error = %err,
                    "evaluation failed; recording candidate as infeasible"
                );
                return ResultRecord::failed(*candidate, err.to_string());
            }
        };

        if !(evaluation.displacement.is_finite() && evaluation.gz_max.is_finite()) {
            let reason = format!(
                "non-finite objectives: displacement={}, gz_max={}",
                evaluation.displacement, evaluation.gz_max
            );
            event!(
                target: "hull_core::search",
                Level::WARN,
                length = candidate.length,
                beam = candidate.beam,
                draft = candidate.draft,
                block_coefficient = candidate.block_coefficient,
                "{reason}; recording candidate as infeasible"
            );
            return ResultRecord::failed(*candidate, reason);
        }

        let feasible = self.bounds.is_feasible(candidate);
        if !feasible {
            let violations: Vec<&str> = self
                .bounds
                .violations(candidate)
                .iter()
                .map(|v| v.as_str())
                .collect();
            event!(
                target: "hull_core::search",
                Level::DEBUG,
                length = candidate.length,
                beam = candidate.beam,
                draft = candidate.draft,
                block_coefficient = candidate.block_coefficient,
                violations = ?violations,
                "candidate infeasible"
            );
        }
        ResultRecord::evaluated(&evaluation, feasible)
    }
}
