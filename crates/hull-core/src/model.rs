use serde::Serialize;

/// One point of the design space. Lengths in metres, `block_coefficient`
/// dimensionless.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candidate {
    #[serde(rename = "L")]
    pub length: f64,
    #[serde(rename = "B")]
    pub beam: f64,
    #[serde(rename = "T")]
    pub draft: f64,
    #[serde(rename = "Cb")]
    pub block_coefficient: f64,
}

impl Candidate {
    pub const fn new(length: f64, beam: f64, draft: f64, block_coefficient: f64) -> Self {
        Self {
            length,
            beam,
            draft,
            block_coefficient,
        }
    }

    pub fn beam_to_length(&self) -> f64 {
        self.beam / self.length
    }

    pub fn draft_to_length(&self) -> f64 {
        self.draft / self.length
    }

    pub fn beam_to_draft(&self) -> f64 {
        self.beam / self.draft
    }

    pub fn is_finite(&self) -> bool {
        self.length.is_finite()
            && self.beam.is_finite()
            && self.draft.is_finite()
            && self.block_coefficient.is_finite()
    }
}

/// Derived hydrostatic quantities reported by a hull model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hydrostatics {
    /// Tonnes.
    pub displacement: f64,
    pub block_coefficient: f64,
    pub midship_coefficient: f64,
    pub prismatic_coefficient: f64,
    /// Longitudinal centre of buoyancy, metres from the aft perpendicular.
    pub lcb: f64,
}

/// Objective values for a single candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub candidate: Candidate,
    pub displacement: f64,
    pub gz_max: f64,
}
