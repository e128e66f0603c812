//! Rule-of-thumb feasibility bounds.
//!
//! The defaults describe a small general-cargo hull. They are assumptions
//! about the target ship class, so every bound is configurable and passed
//! into the search explicitly.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use crate::model::Candidate;

/// Closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// NaN is never contained.
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeasibilityBounds {
    pub block_coefficient: Interval,
    /// Ceiling on T / L.
    pub max_draft_to_length: f64,
    pub beam_to_length: Interval,
}

impl Default for FeasibilityBounds {
    fn default() -> Self {
        Self {
            block_coefficient: Interval::new(0.55, 0.70),
            max_draft_to_length: 0.12,
            beam_to_length: Interval::new(0.10, 0.25),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    BlockCoefficient,
    DraftToLength,
    BeamToLength,
}

impl Violation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Violation::BlockCoefficient => "block_coefficient",
            Violation::DraftToLength => "draft_to_length",
            Violation::BeamToLength => "beam_to_length",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum BoundsError {
    #[error("{field}: bound must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },
    #[error("{field}: min {min} exceeds max {max}")]
    Inverted {
        field: &'static str,
        min: f64,
        max: f64,
    },
}

impl FeasibilityBounds {
    pub fn validate(&self) -> Result<(), BoundsError> {
        validate_interval("block_coefficient", &self.block_coefficient)?;
        validate_interval("beam_to_length", &self.beam_to_length)?;
        if !self.max_draft_to_length.is_finite() {
            return Err(BoundsError::NonFinite {
                field: "max_draft_to_length",
                value: self.max_draft_to_length,
            });
        }
        Ok(())
    }

    pub fn is_feasible(&self, candidate: &Candidate) -> bool {
        self.block_coefficient.contains(candidate.block_coefficient)
            && self.draft_within(candidate)
            && self.beam_to_length.contains(candidate.beam_to_length())
    }

    fn draft_within(&self, candidate: &Candidate) -> bool {
        candidate.draft <= self.max_draft_to_length * candidate.length
    }

    /// Every bound the candidate fails, in declaration order.
    pub fn violations(&self, candidate: &Candidate) -> Vec<Violation> {
        let mut violations = Vec::new();
        if !self.block_coefficient.contains(candidate.block_coefficient) {
            violations.push(Violation::BlockCoefficient);
        }
        if !self.draft_within(candidate) {
            violations.push(Violation::DraftToLength);
        }
        if !self.beam_to_length.contains(candidate.beam_to_length()) {
            violations.push(Violation::BeamToLength);
        }
        violations
    }
}

fn validate_interval(field: &'static str, interval: &Interval) -> Result<(), BoundsError> {
    for value in [interval.min, interval.max] {
        if !value.is_finite() {
            return Err(BoundsError::NonFinite { field, value });
        }
    }
    if interval.min > interval.max {
        return Err(BoundsError::Inverted {
            field,
            min: interval.min,
            max: interval.max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bounds_accept_typical_hull() {
        let bounds = FeasibilityBounds::default();
        let c = Candidate::new(100.0, 16.0, 5.0, 0.6);
        assert!(bounds.is_feasible(&c));
        assert!(bounds.violations(&c).is_empty());
    }

    #[test]
    fn bounds_are_inclusive() {
        let bounds = FeasibilityBounds::default();
        assert!(bounds.is_feasible(&Candidate::new(100.0, 25.0, 5.0, 0.55)));
        assert!(bounds.is_feasible(&Candidate::new(100.0, 10.0, 5.0, 0.70)));
    }

    #[test]
    fn each_bound_is_reported() {
        let bounds = FeasibilityBounds::default();
        assert_eq!(
            bounds.violations(&Candidate::new(100.0, 16.0, 5.0, 0.5)),
            vec![Violation::BlockCoefficient]
        );
        assert_eq!(
            bounds.violations(&Candidate::new(100.0, 16.0, 20.0, 0.6)),
            vec![Violation::DraftToLength]
        );
        assert_eq!(
            bounds.violations(&Candidate::new(100.0, 30.0, 5.0, 0.6)),
            vec![Violation::BeamToLength]
        );
        assert_eq!(bounds.violations(&Candidate::new(100.0, 8.0, 20.0, 0.8)).len(), 3);
    }

    #[test]
    fn nan_is_infeasible() {
        let bounds = FeasibilityBounds::default();
        assert!(!bounds.is_feasible(&Candidate::new(100.0, 16.0, f64::NAN, 0.6)));
        assert!(!bounds.is_feasible(&Candidate::new(0.0, 16.0, 5.0, 0.6)));
    }

    #[test]
    fn overridden_bounds_change_verdict() {
        let bounds = FeasibilityBounds {
            beam_to_length: Interval::new(0.10, 0.35),
            ..FeasibilityBounds::default()
        };
        assert!(bounds.is_feasible(&Candidate::new(100.0, 30.0, 5.0, 0.6)));
    }

    #[test]
    fn rejects_inverted_interval() {
        let bounds = FeasibilityBounds {
            block_coefficient: Interval::new(0.8, 0.5),
            ..FeasibilityBounds::default()
        };
        assert!(matches!(
            bounds.validate(),
            Err(BoundsError::Inverted { field: "block_coefficient", .. })
        ));
        assert!(FeasibilityBounds::default().validate().is_ok());
    }
}
