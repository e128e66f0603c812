use std::cmp::Ordering;

use serde::Serialize;
use thiserror::Error;

use crate::model::{Candidate, Evaluation};
use crate::pareto::{Objectives, ParetoRanker};

/// Column names of the flat record set, in export order.
pub const COLUMNS: [&str; 8] = [
    "L",
    "B",
    "T",
    "Cb",
    "displacement",
    "gz_max",
    "feasible",
    "pareto",
];

/// One row of the search: objectives plus derived flags.
///
/// A candidate whose evaluation failed keeps its row with NaN objectives,
/// `feasible = false` and the failure reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub displacement: f64,
    pub gz_max: f64,
    pub feasible: bool,
    pub pareto: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl ResultRecord {
    pub fn evaluated(evaluation: &Evaluation, feasible: bool) -> Self {
        Self {
            candidate: evaluation.candidate,
            displacement: evaluation.displacement,
            gz_max: evaluation.gz_max,
            feasible,
            pareto: false,
            failure: None,
        }
    }

    pub fn failed(candidate: Candidate, reason: impl Into<String>) -> Self {
        Self {
            candidate,
            displacement: f64::NAN,
            gz_max: f64::NAN,
            feasible: false,
            pareto: false,
            failure: Some(reason.into()),
        }
    }

    pub fn objectives(&self) -> Objectives {
        Objectives::new(self.displacement, self.gz_max)
    }

    /// Member of the Pareto-only view.
    pub fn is_pareto_optimal(&self) -> bool {
        self.feasible && self.pareto
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("table already ranked; rows can no longer be added")]
    AlreadyRanked,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub rows: usize,
    pub feasible: usize,
    pub pareto: usize,
    pub failed: usize,
}

/// Ordered rows of one search run, in grid enumeration order.
///
/// Rows are appended until the table is ranked. Ranking fills the
/// `pareto` column from the whole table at once; after that the table is
/// read-only apart from re-ranking, which yields the same flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    records: Vec<ResultRecord>,
    ranked: bool,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            ranked: false,
        }
    }

    pub fn push(&mut self, mut record: ResultRecord) -> Result<(), TableError> {
        if self.ranked {
            return Err(TableError::AlreadyRanked);
        }
        record.pareto = false;
        self.records.push(record);
        Ok(())
    }

    pub fn rank(&mut self, ranker: &ParetoRanker) {
        let rows: Vec<(Objectives, bool)> = self
            .records
            .iter()
            .map(|record| (record.objectives(), record.feasible))
            .collect();
        let flags = ranker.flags(&rows);
        for (record, flag) in self.records.iter_mut().zip(flags) {
            record.pareto = flag;
        }
        self.ranked = true;
    }

    pub fn is_ranked(&self) -> bool {
        self.ranked
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Feasible Pareto rows in table order. Never re-ranks.
    pub fn pareto_only(&self) -> impl Iterator<Item = &ResultRecord> + '_ {
        self.records.iter().filter(|record| record.is_pareto_optimal())
    }

    /// Rows sorted pareto first, then feasible, then by descending GZ max.
    /// Ties keep table order; NaN GZ sorts last within its group.
    pub fn report_order(&self) -> Vec<&ResultRecord> {
        let mut rows: Vec<&ResultRecord> = self.records.iter().collect();
        rows.sort_by(|a, b| {
            b.pareto
                .cmp(&a.pareto)
                .then(b.feasible.cmp(&a.feasible))
                .then_with(|| descending_gz(a.gz_max, b.gz_max))
        });
        rows
    }

    /// Pareto row with the largest GZ max, or the largest GZ max overall
    /// when the front is empty. `None` when no row has a finite GZ max.
    pub fn best_pareto(&self) -> Option<&ResultRecord> {
        max_gz(self.pareto_only()).or_else(|| max_gz(self.records.iter()))
    }

    pub fn summary(&self) -> TableSummary {
        TableSummary {
            rows: self.records.len(),
            feasible: self.records.iter().filter(|r| r.feasible).count(),
            pareto: self.pareto_only().count(),
            failed: self.records.iter().filter(|r| r.failure.is_some()).count(),
        }
    }
}

/// First row wins ties.
fn max_gz<'a>(rows: impl Iterator<Item = &'a ResultRecord>) -> Option<&'a ResultRecord> {
    rows.filter(|record| record.gz_max.is_finite())
        .fold(None, |best: Option<&'a ResultRecord>, record| match best {
            Some(current) if current.gz_max >= record.gz_max => Some(current),
            _ => Some(record),
        })
}

fn descending_gz(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => b.total_cmp(&a),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (true, true) => Ordering::Equal,
    }
}
