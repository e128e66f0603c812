//! Hull models: pure functions from principal dimensions to hydrostatics.
//!
//! The legacy mutate-then-read oracle lives in [`legacy`] and is exposed
//! through [`LegacyAdapter`], which implements the same [`HullModel`] seam.

mod legacy;

pub use legacy::{COMMAND_HISTORY, LegacyAdapter, LegacyHullOracle, MockHullOracle};

use serde::Deserialize;
use thiserror::Error;

use crate::model::{Candidate, Hydrostatics};

const SEAWATER_DENSITY: f64 = 1.025;
const DEFAULT_MIDSHIP_COEFFICIENT: f64 = 0.98;
const DEFAULT_LCB_FRACTION: f64 = 0.53;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum OracleError {
    #[error("hull oracle unavailable: {0}")]
    Unavailable(String),
    #[error("hull oracle rejected {quantity} = {value}")]
    Rejected { quantity: &'static str, value: f64 },
}

/// Pure hydrostatics for a candidate. Implementations must not carry state
/// between calls so that evaluations can run in any order.
pub trait HullModel: Send + Sync {
    fn hydrostatics(&self, candidate: &Candidate) -> Result<Hydrostatics, OracleError>;
}

/// Box-and-coefficient displacement estimate: ρ·L·B·T·Cb.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct BlockCoefficientHull {
    /// t/m³.
    pub density: f64,
    pub midship_coefficient: f64,
    /// LCB as a fraction of length.
    pub lcb_fraction: f64,
}

impl Default for BlockCoefficientHull {
    fn default() -> Self {
        Self {
            density: SEAWATER_DENSITY,
            midship_coefficient: DEFAULT_MIDSHIP_COEFFICIENT,
            lcb_fraction: DEFAULT_LCB_FRACTION,
        }
    }
}

impl HullModel for BlockCoefficientHull {
    fn hydrostatics(&self, candidate: &Candidate) -> Result<Hydrostatics, OracleError> {
        box_hydrostatics(
            candidate.length,
            candidate.beam,
            candidate.draft,
            candidate.block_coefficient,
            self.midship_coefficient,
            self.density,
            self.lcb_fraction,
        )
    }
}

pub(crate) fn box_hydrostatics(
    length: f64,
    beam: f64,
    draft: f64,
    block_coefficient: f64,
    midship_coefficient: f64,
    density: f64,
    lcb_fraction: f64,
) -> Result<Hydrostatics, OracleError> {
    for (quantity, value) in [("density", density), ("midship_coefficient", midship_coefficient)] {
        if !(value.is_finite() && value > 0.0) {
            return Err(OracleError::Rejected { quantity, value });
        }
    }
    Ok(Hydrostatics {
        displacement: density * length * beam * draft * block_coefficient,
        block_coefficient,
        midship_coefficient,
        prismatic_coefficient: block_coefficient / midship_coefficient,
        lcb: lcb_fraction * length,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displacement_uses_candidate_block_coefficient() {
        let hull = BlockCoefficientHull::default();
        let lean = hull
            .hydrostatics(&Candidate::new(100.0, 14.0, 5.0, 0.55))
            .expect("hydrostatics");
        let full = hull
            .hydrostatics(&Candidate::new(100.0, 14.0, 5.0, 0.65))
            .expect("hydrostatics");
        assert!((lean.displacement - 1.025 * 100.0 * 14.0 * 5.0 * 0.55).abs() < 1e-9);
        assert!(full.displacement > lean.displacement);
        assert!((lean.lcb - 53.0).abs() < 1e-9);
        assert!((lean.prismatic_coefficient - 0.55 / 0.98).abs() < 1e-12);
    }

    #[test]
    fn degenerate_coefficients_are_rejected() {
        let hull = BlockCoefficientHull {
            midship_coefficient: 0.0,
            ..BlockCoefficientHull::default()
        };
        let err = hull
            .hydrostatics(&Candidate::new(50.0, 8.0, 3.0, 0.6))
            .expect_err("zero Cm");
        assert_eq!(
            err,
            OracleError::Rejected {
                quantity: "midship_coefficient",
                value: 0.0
            }
        );

        let hull = BlockCoefficientHull {
            density: f64::NAN,
            ..BlockCoefficientHull::default()
        };
        assert!(matches!(
            hull.hydrostatics(&Candidate::new(50.0, 8.0, 3.0, 0.6)),
            Err(OracleError::Rejected {
                quantity: "density",
                ..
            })
        ));
    }
}
