//! Pareto ranking: minimise displacement, maximise GZ max.
//!
//! Only feasible rows with finite objectives take part. Everything else is
//! outside the comparison universe: it never dominates and is never flagged.
//!
//! Two strategies produce identical flags:
//! - [`ParetoStrategy::Pairwise`] compares every pair, O(n²). This is the
//!   reference and the default.
//! - [`ParetoStrategy::Sweep`] sorts by displacement and scans once,
//!   O(n log n), for grids too large for the pairwise pass.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Objectives {
    pub displacement: f64,
    pub gz_max: f64,
}

impl Objectives {
    pub const fn new(displacement: f64, gz_max: f64) -> Self {
        Self {
            displacement,
            gz_max,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.displacement.is_finite() && self.gz_max.is_finite()
    }
}

/// `a` dominates `b` when it is no worse on both objectives and strictly
/// better on at least one. Any non-finite value on either side yields
/// `false`.
pub fn dominates(a: &Objectives, b: &Objectives) -> bool {
    if !a.is_finite() || !b.is_finite() {
        return false;
    }
    a.displacement <= b.displacement
        && a.gz_max >= b.gz_max
        && (a.displacement < b.displacement || a.gz_max > b.gz_max)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParetoStrategy {
    #[default]
    Pairwise,
    Sweep,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParetoRanker {
    strategy: ParetoStrategy,
}

impl ParetoRanker {
    pub const fn new(strategy: ParetoStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> ParetoStrategy {
        self.strategy
    }

    /// Pareto flag for every row. `rows` pairs each row's objectives with
    /// its feasibility; the output has the same length and order.
    pub fn flags(&self, rows: &[(Objectives, bool)]) -> Vec<bool> {
        let universe: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, (objectives, feasible))| *feasible && objectives.is_finite())
            .map(|(idx, _)| idx)
            .collect();

        let mut flags = vec![false; rows.len()];
        let front = match self.strategy {
            ParetoStrategy::Pairwise => pairwise_front(rows, &universe),
            ParetoStrategy::Sweep => sweep_front(rows, &universe),
        };
        for idx in front {
            flags[idx] = true;
        }
        flags
    }
}

fn pairwise_front(rows: &[(Objectives, bool)], universe: &[usize]) -> Vec<usize> {
    universe
        .iter()
        .copied()
        .filter(|&i| {
            !universe
                .iter()
                .any(|&j| j != i && dominates(&rows[j].0, &rows[i].0))
        })
        .collect()
}

/// Rows are grouped by equal displacement and visited in ascending order.
/// Inside a group only rows at the group's best GZ can survive, and they
/// survive only if every lighter row has strictly less GZ.
fn sweep_front(rows: &[(Objectives, bool)], universe: &[usize]) -> Vec<usize> {
    let mut order = universe.to_vec();
    order.sort_by(|&a, &b| rows[a].0.displacement.total_cmp(&rows[b].0.displacement));

    let mut front = Vec::new();
    let mut best_lighter = f64::NEG_INFINITY;
    let mut start = 0;
    while start < order.len() {
        let displacement = rows[order[start]].0.displacement;
        let mut end = start + 1;
        while end < order.len() && rows[order[end]].0.displacement == displacement {
            end += 1;
        }

        let group = &order[start..end];
        let group_best = group
            .iter()
            .map(|&idx| rows[idx].0.gz_max)
            .fold(f64::NEG_INFINITY, f64::max);
        if group_best > best_lighter {
            front.extend(
                group
                    .iter()
                    .copied()
                    .filter(|&idx| rows[idx].0.gz_max == group_best),
            );
        }
        best_lighter = best_lighter.max(group_best);
        start = end;
    }

    front.sort_unstable();
    front
}
