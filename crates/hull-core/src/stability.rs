//! Stability proxy.
//!
//! [`SyntheticGz`] is a closed-form stand-in for a righting-arm curve built
//! from Cb, B and T. It is not a physical model: it exists so the search
//! has a second objective until a real GZ integrator is plugged in behind
//! [`StabilityModel`].

use serde::Deserialize;

use crate::model::Candidate;

const MIN_SCALE: f64 = 0.05;
const MIN_DRAFT: f64 = 1e-6;

/// Upper bound on heel intervals per curve. A finer `step_deg` is coarsened
/// to fit.
pub const MAX_HEEL_SAMPLES: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GzPoint {
    pub heel_deg: f64,
    /// Metres.
    pub gz: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GzCurve {
    pub points: Vec<GzPoint>,
}

impl GzCurve {
    /// Largest righting arm on the curve; 0 for an empty curve.
    pub fn max(&self) -> f64 {
        self.points.iter().map(|p| p.gz).fold(0.0, f64::max)
    }
}

pub trait StabilityModel: Send + Sync {
    fn righting_arm_curve(&self, candidate: &Candidate) -> GzCurve;

    fn gz_max(&self, candidate: &Candidate) -> f64 {
        self.righting_arm_curve(candidate).max()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SyntheticGz {
    pub max_heel_deg: f64,
    pub step_deg: f64,
}

impl Default for SyntheticGz {
    fn default() -> Self {
        Self {
            max_heel_deg: 60.0,
            step_deg: 5.0,
        }
    }
}

impl SyntheticGz {
    fn scale(candidate: &Candidate) -> f64 {
        let beam_to_draft = candidate.beam / candidate.draft.max(MIN_DRAFT);
        (0.25 * (1.0 - candidate.block_coefficient) + 0.02 * beam_to_draft).max(MIN_SCALE)
    }

    fn heel_angles(&self) -> Vec<f64> {
        let sampled = self.step_deg > 0.0
            && self.max_heel_deg >= 0.0
            && self.max_heel_deg.is_finite();
        if !sampled {
            return Vec::new();
        }
        let step = self.step_deg.max(self.max_heel_deg / MAX_HEEL_SAMPLES as f64);
        let steps = ((self.max_heel_deg / step).floor() as usize).min(MAX_HEEL_SAMPLES);
        (0..=steps).map(|i| i as f64 * step).collect()
    }
}

impl StabilityModel for SyntheticGz {
    fn righting_arm_curve(&self, candidate: &Candidate) -> GzCurve {
        let scale = Self::scale(candidate);
        let points = self
            .heel_angles()
            .into_iter()
            .map(|heel_deg| GzPoint {
                heel_deg,
                gz: ((2.0 * heel_deg.to_radians()).sin() * scale).max(0.0),
            })
            .collect();
        GzCurve { points }
    }
}
