use thiserror::Error;

use crate::model::{Candidate, Evaluation};
use crate::oracle::{HullModel, OracleError};
use crate::stability::StabilityModel;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvaluationError {
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error("{quantity} is {value}, expected a finite non-negative number")]
    InvalidValue { quantity: &'static str, value: f64 },
}

/// Objective evaluation for one candidate.
///
/// Implementations are called from several threads when the search runs
/// with more than one worker, and must give the same answer regardless of
/// call order.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, candidate: &Candidate) -> Result<Evaluation, EvaluationError>;
}

/// Displacement from a [`HullModel`], GZ max from a [`StabilityModel`].
#[derive(Debug, Clone)]
pub struct HullEvaluator<M, S> {
    hull: M,
    stability: S,
}

impl<M: HullModel, S: StabilityModel> HullEvaluator<M, S> {
    pub fn new(hull: M, stability: S) -> Self {
        Self { hull, stability }
    }

    pub fn stability(&self) -> &S {
        &self.stability
    }
}

impl<M: HullModel, S: StabilityModel> Evaluator for HullEvaluator<M, S> {
    fn evaluate(&self, candidate: &Candidate) -> Result<Evaluation, EvaluationError> {
        let hydrostatics = self.hull.hydrostatics(candidate)?;
        let displacement = checked("displacement", hydrostatics.displacement)?;
        let gz_max = checked("gz_max", self.stability.gz_max(candidate))?;
        Ok(Evaluation {
            candidate: *candidate,
            displacement,
            gz_max,
        })
    }
}

fn checked(quantity: &'static str, value: f64) -> Result<f64, EvaluationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(EvaluationError::InvalidValue { quantity, value })
    }
}
