use hull_core::oracle::{BlockCoefficientHull, LegacyAdapter, MockHullOracle};
use hull_core::pareto::dominates;
use hull_core::{
    Candidate, Evaluation, EvaluationError, Evaluator, FeasibilityBounds, GridAxes, GridSearch,
    HullEvaluator, Objectives, ParetoRanker, ParetoStrategy, ResultRecord, ResultTable,
    SyntheticGz,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn evaluator() -> HullEvaluator<BlockCoefficientHull, SyntheticGz> {
    HullEvaluator::new(BlockCoefficientHull::default(), SyntheticGz::default())
}

fn search(axes: &GridAxes) -> ResultTable {
    GridSearch::new(FeasibilityBounds::default())
        .search(&evaluator(), axes)
        .expect("search succeeds")
}

fn small_grid() -> GridAxes {
    GridAxes::new(
        vec![100.0],
        vec![14.0, 16.0],
        vec![5.0, 6.0],
        vec![0.55, 0.65],
    )
}

fn assert_front_invariants(table: &ResultTable) {
    let records = table.records();
    for (i, record) in records.iter().enumerate() {
        if !(record.feasible && record.objectives().is_finite()) {
            assert!(!record.pareto, "ineligible row {i} flagged pareto");
            continue;
        }
        let dominated = records
            .iter()
            .enumerate()
            .any(|(j, other)| j != i && other.feasible && dominates(&other.objectives(), &record.objectives()));
        assert_eq!(record.pareto, !dominated, "row {i} flag disagrees with dominance");
    }
}

#[test]
fn small_grid_is_fully_feasible() {
    let table = search(&small_grid());
    assert_eq!(table.len(), 8);
    assert!(table.records().iter().all(|r| r.feasible));
    assert!(table.pareto_only().count() > 0);
    assert_front_invariants(&table);

    // Lightest hull is always on the front.
    let lightest = table
        .records()
        .iter()
        .min_by(|a, b| a.displacement.total_cmp(&b.displacement))
        .expect("non-empty");
    assert!(lightest.pareto);
    assert_eq!(lightest.candidate, Candidate::new(100.0, 14.0, 5.0, 0.55));
}

#[test]
fn over_wide_beam_is_never_on_the_front() {
    let mut axes = small_grid();
    axes.beam.push(30.0);
    let table = search(&axes);
    assert_eq!(table.len(), 12);

    let wide: Vec<&ResultRecord> = table
        .records()
        .iter()
        .filter(|r| r.candidate.beam == 30.0)
        .collect();
    assert_eq!(wide.len(), 4);
    assert!(wide.iter().all(|r| !r.feasible && !r.pareto));
    assert!(table.pareto_only().all(|r| r.candidate.beam != 30.0));
    assert_front_invariants(&table);
}

#[test]
fn single_feasible_candidate_is_pareto() {
    let axes = GridAxes::new(vec![100.0], vec![8.0, 16.0], vec![5.0], vec![0.6]);
    let table = search(&axes);
    let flags: Vec<(bool, bool)> = table.records().iter().map(|r| (r.feasible, r.pareto)).collect();
    assert_eq!(flags, vec![(false, false), (true, true)]);
}

#[test]
fn all_infeasible_gives_empty_front() {
    let axes = GridAxes::new(vec![100.0], vec![8.0, 30.0], vec![5.0, 20.0], vec![0.5, 0.8]);
    let table = search(&axes);
    assert_eq!(table.len(), 8);
    assert_eq!(table.pareto_only().count(), 0);
    assert_eq!(table.summary().feasible, 0);
}

#[test]
fn mixed_grid_from_reference_case() {
    let axes = GridAxes::new(
        vec![100.0],
        vec![8.0, 16.0, 30.0],
        vec![5.0, 20.0],
        vec![0.5, 0.6, 0.8],
    );
    let table = search(&axes);
    assert_eq!(table.len(), 18);
    let feasible: Vec<&ResultRecord> = table.records().iter().filter(|r| r.feasible).collect();
    assert_eq!(feasible.len(), 1);
    assert_eq!(feasible[0].candidate, Candidate::new(100.0, 16.0, 5.0, 0.6));
    assert!(feasible[0].pareto);
    assert_front_invariants(&table);
}

#[test]
fn empty_axis_fails_before_evaluation() {
    struct Counting(std::sync::atomic::AtomicUsize);
    impl Evaluator for Counting {
        fn evaluate(&self, _candidate: &Candidate) -> Result<Evaluation, EvaluationError> {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            unreachable!("no evaluation expected")
        }
    }

    let counting = Counting(std::sync::atomic::AtomicUsize::new(0));
    let axes = GridAxes::new(vec![100.0], vec![], vec![5.0], vec![0.6]);
    let err = GridSearch::new(FeasibilityBounds::default())
        .search(&counting, &axes)
        .expect_err("empty beam axis");
    assert!(err.to_string().contains("B (beam)"), "{err}");
    assert_eq!(counting.0.load(std::sync::atomic::Ordering::SeqCst), 0);
}

/// Fails for B = 15 and returns NaN displacement for B = 17.
struct Flaky;

impl Evaluator for Flaky {
    fn evaluate(&self, candidate: &Candidate) -> Result<Evaluation, EvaluationError> {
        if candidate.beam == 15.0 {
            return Err(EvaluationError::Oracle(
                hull_core::oracle::OracleError::Unavailable("lost connection".into()),
            ));
        }
        let mut evaluation = evaluator().evaluate(candidate)?;
        if candidate.beam == 17.0 {
            evaluation.displacement = f64::NAN;
        }
        Ok(evaluation)
    }
}

#[test]
fn failed_evaluations_are_recorded_as_infeasible() {
    let axes = GridAxes::new(vec![100.0], vec![14.0, 15.0, 16.0, 17.0], vec![5.0], vec![0.6]);
    let table = GridSearch::new(FeasibilityBounds::default())
        .search(&Flaky, &axes)
        .expect("search completes despite failures");

    assert_eq!(table.len(), 4);
    let summary = table.summary();
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.feasible, 2);

    let failed: Vec<&ResultRecord> = table.records().iter().filter(|r| r.failure.is_some()).collect();
    assert_eq!(failed[0].candidate.beam, 15.0);
    assert!(failed[0].failure.as_deref().unwrap_or_default().contains("lost connection"));
    assert_eq!(failed[1].candidate.beam, 17.0);
    assert!(failed.iter().all(|r| !r.feasible && !r.pareto));
    assert!(failed[0].displacement.is_nan());
    assert_front_invariants(&table);
}

#[test]
fn parallel_search_matches_sequential() {
    let axes = GridAxes::new(
        vec![80.0, 90.0, 100.0, 110.0],
        vec![10.0, 12.0, 14.0, 16.0, 30.0],
        vec![4.0, 5.0, 6.0, 14.0],
        vec![0.5, 0.55, 0.6, 0.65, 0.7],
    );
    let sequential = search(&axes);
    for workers in [2, 3, 8, 1000] {
        let parallel = GridSearch::new(FeasibilityBounds::default())
            .with_workers(workers)
            .search(&evaluator(), &axes)
            .expect("parallel search");
        assert_eq!(parallel, sequential, "workers = {workers}");
    }
}

#[test]
fn parallel_legacy_oracle_matches_sequential() {
    let axes = small_grid();
    let legacy = HullEvaluator::new(LegacyAdapter::new(MockHullOracle::default()), SyntheticGz::default());
    let bounds = FeasibilityBounds::default();
    let sequential = GridSearch::new(bounds).search(&legacy, &axes).expect("sequential");
    let parallel = GridSearch::new(bounds)
        .with_workers(4)
        .search(&legacy, &axes)
        .expect("parallel");
    assert_eq!(sequential, parallel);
    // The mock keeps its own Cb, so Cb changes only move GZ.
    let first = &sequential.records()[0];
    let second = &sequential.records()[1];
    assert_eq!(first.displacement, second.displacement);
    assert!(first.gz_max > second.gz_max);
}

fn non_finite(rng: &mut StdRng) -> f64 {
    match rng.gen_range(0..3) {
        0 => f64::NAN,
        1 => f64::INFINITY,
        _ => f64::NEG_INFINITY,
    }
}

fn random_table(rng: &mut StdRng, rows: usize) -> ResultTable {
    let mut table = ResultTable::new();
    for i in 0..rows {
        // Coarse values to force ties and duplicates.
        let mut displacement = rng.gen_range(0..20) as f64 * 50.0;
        let mut gz_max = rng.gen_range(0..10) as f64 * 0.05;
        if rng.gen_bool(0.1) {
            displacement = non_finite(rng);
        }
        if rng.gen_bool(0.1) {
            gz_max = non_finite(rng);
        }
        let feasible = rng.gen_bool(0.8);
        let evaluation = Evaluation {
            candidate: Candidate::new(100.0 + i as f64, 16.0, 5.0, 0.6),
            displacement,
            gz_max,
        };
        table
            .push(ResultRecord::evaluated(&evaluation, feasible))
            .expect("push");
    }
    table
}

#[test]
fn randomized_tables_satisfy_front_invariants() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..200 {
        let rows = rng.gen_range(0..60);
        let mut pairwise = random_table(&mut rng, rows);
        let mut sweep = pairwise.clone();
        pairwise.rank(&ParetoRanker::new(ParetoStrategy::Pairwise));
        sweep.rank(&ParetoRanker::new(ParetoStrategy::Sweep));
        // NaN rows make whole-table equality useless; compare the flags.
        assert_eq!(pareto_flags(&pairwise), pareto_flags(&sweep));
        assert_front_invariants(&pairwise);
        assert_front_invariants(&sweep);

        let before = pareto_flags(&pairwise);
        pairwise.rank(&ParetoRanker::default());
        assert_eq!(before, pareto_flags(&pairwise), "re-ranking changed flags");
    }
}

fn pareto_flags(table: &ResultTable) -> Vec<bool> {
    table.records().iter().map(|r| r.pareto).collect()
}

#[test]
fn randomized_tables_do_mix_in_non_finite_feasible_rows() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let table = random_table(&mut rng, 500);
    let non_finite_feasible = table
        .records()
        .iter()
        .filter(|r| r.feasible && !r.objectives().is_finite())
        .count();
    assert!(non_finite_feasible > 0);
}

#[test]
fn strictly_worse_addition_keeps_front() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..100 {
        let rows = rng.gen_range(1..40);
        let mut base = random_table(&mut rng, rows);
        let mut extended = base.clone();
        base.rank(&ParetoRanker::default());

        let Some(anchor) = base.pareto_only().next().cloned() else {
            continue;
        };
        let worse = Evaluation {
            candidate: Candidate::new(500.0, 16.0, 5.0, 0.6),
            displacement: anchor.displacement + 1.0,
            gz_max: anchor.gz_max - 0.01,
        };
        extended
            .push(ResultRecord::evaluated(&worse, true))
            .expect("push");
        extended.rank(&ParetoRanker::default());

        let before = pareto_flags(&base);
        let after: Vec<bool> = extended.records()[..rows].iter().map(|r| r.pareto).collect();
        assert_eq!(before, after);
        assert!(!extended.records()[rows].pareto);
    }
}

#[test]
fn objectives_of_failed_rows_never_dominate() {
    let failed = ResultRecord::failed(Candidate::new(1.0, 1.0, 1.0, 0.6), "x");
    let good = Objectives::new(100.0, 0.1);
    assert!(!dominates(&failed.objectives(), &good));
    assert!(!dominates(&good, &failed.objectives()));
}
