//! Grid search over hull principal dimensions with feasibility filtering and
//! Pareto ranking of displacement against a stability proxy.

pub mod evaluate;
pub mod feasibility;
pub mod model;
pub mod oracle;
pub mod pareto;
pub mod search;
pub mod stability;
pub mod table;

pub use evaluate::{EvaluationError, Evaluator, HullEvaluator};
pub use feasibility::{FeasibilityBounds, Interval};
pub use model::{Candidate, Evaluation, Hydrostatics};
pub use pareto::{Objectives, ParetoRanker, ParetoStrategy};
pub use search::{Axis, GridAxes, GridError, GridSearch};
pub use stability::{GzCurve, MAX_HEEL_SAMPLES, StabilityModel, SyntheticGz};
pub use table::{ResultRecord, ResultTable, TableSummary};

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "hullopt"
    }

    pub const fn objectives() -> &'static str {
        "minimise displacement, maximise GZ max"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
