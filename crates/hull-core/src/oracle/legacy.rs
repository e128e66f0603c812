use std::collections::VecDeque;

use parking_lot::Mutex;

use super::{
    DEFAULT_LCB_FRACTION, DEFAULT_MIDSHIP_COEFFICIENT, HullModel, OracleError, SEAWATER_DENSITY,
    box_hydrostatics,
};
use crate::model::{Candidate, Hydrostatics};

const MOCK_INITIAL_LENGTH: f64 = 10.0;
const MOCK_INITIAL_BEAM: f64 = 3.0;
const MOCK_INITIAL_DRAFT: f64 = 1.0;
const MOCK_BLOCK_COEFFICIENT: f64 = 0.55;
/// Most recent commands kept by the mock; older ones are dropped.
pub const COMMAND_HISTORY: usize = 30;

/// Procedural oracle surface: dimensions are pushed into the model one at a
/// time and hydrostatics are read back from whatever state it holds.
pub trait LegacyHullOracle: Send {
    fn set_length(&mut self, metres: f64);
    fn set_beam(&mut self, metres: f64);
    fn set_draft(&mut self, metres: f64);
    fn get_hydrostatics(&self) -> Result<Hydrostatics, OracleError>;
}

/// Presents a [`LegacyHullOracle`] as a pure [`HullModel`].
///
/// The set-set-set-read sequence runs under one lock, so no caller can
/// observe another caller's half-written state.
pub struct LegacyAdapter<O> {
    oracle: Mutex<O>,
}

impl<O: LegacyHullOracle> LegacyAdapter<O> {
    pub fn new(oracle: O) -> Self {
        Self {
            oracle: Mutex::new(oracle),
        }
    }

    pub fn into_inner(self) -> O {
        self.oracle.into_inner()
    }
}

impl<O: LegacyHullOracle> HullModel for LegacyAdapter<O> {
    fn hydrostatics(&self, candidate: &Candidate) -> Result<Hydrostatics, OracleError> {
        let mut oracle = self.oracle.lock();
        oracle.set_length(candidate.length);
        oracle.set_beam(candidate.beam);
        oracle.set_draft(candidate.draft);
        oracle.get_hydrostatics()
    }
}

/// In-process stand-in for the external hull design package.
///
/// Block coefficient is a property of the loaded model, not of the
/// dimensions pushed in, so displacement ignores the candidate's Cb.
#[derive(Debug, Clone, PartialEq)]
pub struct MockHullOracle {
    length: f64,
    beam: f64,
    draft: f64,
    block_coefficient: f64,
    midship_coefficient: f64,
    density: f64,
    lcb_fraction: f64,
    commands: VecDeque<String>,
}

impl Default for MockHullOracle {
    fn default() -> Self {
        Self::with_block_coefficient(MOCK_BLOCK_COEFFICIENT)
    }
}

impl MockHullOracle {
    pub fn with_block_coefficient(block_coefficient: f64) -> Self {
        Self {
            length: MOCK_INITIAL_LENGTH,
            beam: MOCK_INITIAL_BEAM,
            draft: MOCK_INITIAL_DRAFT,
            block_coefficient,
            midship_coefficient: DEFAULT_MIDSHIP_COEFFICIENT,
            density: SEAWATER_DENSITY,
            lcb_fraction: DEFAULT_LCB_FRACTION,
            commands: VecDeque::with_capacity(COMMAND_HISTORY),
        }
    }

    /// The last [`COMMAND_HISTORY`] commands received, oldest first.
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(String::as_str)
    }

    fn record(&mut self, command: String) {
        if self.commands.len() == COMMAND_HISTORY {
            self.commands.pop_front();
        }
        self.commands.push_back(command);
    }
}

impl LegacyHullOracle for MockHullOracle {
    fn set_length(&mut self, metres: f64) {
        self.record(format!("LENGTH {metres}"));
        self.length = metres;
    }

    fn set_beam(&mut self, metres: f64) {
        self.record(format!("BEAM {metres}"));
        self.beam = metres;
    }

    fn set_draft(&mut self, metres: f64) {
        self.record(format!("DRAFT {metres}"));
        self.draft = metres;
    }

    fn get_hydrostatics(&self) -> Result<Hydrostatics, OracleError> {
        box_hydrostatics(
            self.length,
            self.beam,
            self.draft,
            self.block_coefficient,
            self.midship_coefficient,
            self.density,
            self.lcb_fraction,
        )
    }
}
