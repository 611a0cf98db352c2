//! Parameter sweeps: grid order, isolation between instances, and agreement
//! with single runs.

use proptest::prelude::*;

use lineforge_core::engine::RunModeKind;
use lineforge_runner::{run, DataConfig, ParamGrid, ParamSweep, RunConfig};

fn base(seed: u64) -> RunConfig {
    let mut config = RunConfig::new(DataConfig::random_walk(400, seed));
    config.name = format!("walk-{seed}");
    config
}

#[test]
fn parallel_sweep_matches_sequential_in_grid_order() {
    let _ = env_logger::builder().is_test(true).try_init();
    let grid = ParamGrid::new(vec![3, 5, 10, 20], vec![10, 20, 50]);
    let config = base(11);

    let parallel = ParamSweep::new().sweep(&grid, &config).unwrap();
    let sequential = ParamSweep::new()
        .with_parallelism(false)
        .sweep(&grid, &config)
        .unwrap();

    let expected: Vec<(usize, usize)> = grid.pairs().collect();
    assert_eq!(expected.len(), 8);
    assert_eq!(parallel.len(), expected.len());
    let got: Vec<(usize, usize)> = parallel
        .all()
        .iter()
        .map(|r| (r.params().fast, r.params().slow))
        .collect();
    assert_eq!(got, expected);
    assert_eq!(parallel.all(), sequential.all());
}

#[test]
fn sweep_points_equal_single_runs() {
    let grid = ParamGrid::new(vec![5, 10], vec![30]);
    let config = base(4);
    let results = ParamSweep::new().sweep(&grid, &config).unwrap();

    for report in results.all() {
        let mut single = config.clone();
        single.strategy = report.params();
        let alone = run(&single).unwrap();
        assert_eq!(alone.run_id, report.run_id);
        assert_eq!(alone.result, report.result);
        assert_eq!(results.get(&alone.run_id), Some(report));
    }
}

#[test]
fn distinct_points_have_distinct_run_ids() {
    let grid = ParamGrid::new(vec![2, 4, 6], vec![8, 12]);
    let results = ParamSweep::new().sweep(&grid, &base(2)).unwrap();
    let mut ids: Vec<&str> = results.all().iter().map(|r| r.run_id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), results.len());
}

#[test]
fn sweep_from_toml_grid() {
    let config = RunConfig::from_toml_str(
        r#"
        name = "toml-sweep"

        [data]
        kind = "random_walk"
        bars = 250
        seed = 21

        [engine]
        run_mode = "stepped"

        [engine.broker]
        cash = 25000.0
        margin_policy = "partial_fill"
        check_submit = false

        [sweep]
        fast = [5, 15]
        slow = [10, 40]
        "#,
    )
    .unwrap();
    assert_eq!(config.engine.run_mode, RunModeKind::Stepped);

    let results = ParamSweep::new().sweep_config(&config).unwrap();
    assert_eq!(results.len(), 3);
    for report in results.all() {
        assert_eq!(report.initial_capital(), 25_000.0);
        assert_eq!(report.result.mode, RunModeKind::Stepped);
        assert!(report.config.sweep.is_none());
    }

    let best = results.best_by(|r| r.metrics.total_return).unwrap();
    let ranked = results.ranked_by(|r| r.metrics.total_return);
    assert_eq!(ranked.len(), 3);
    assert_eq!(ranked[0].metrics.total_return, best.metrics.total_return);
    assert!(ranked
        .windows(2)
        .all(|w| w[0].metrics.total_return >= w[1].metrics.total_return));
}

#[test]
fn missing_or_empty_grid_is_an_error() {
    assert!(ParamSweep::new().sweep_config(&base(1)).is_err());
    let inverted = ParamGrid::new(vec![50], vec![10]);
    assert!(ParamSweep::new().sweep(&inverted, &base(1)).is_err());
}

#[test]
fn run_modes_agree_across_a_sweep() {
    let grid = ParamGrid::new(vec![4, 8], vec![16, 32]);
    let mut stepped = base(17);
    stepped.engine.run_mode = RunModeKind::Stepped;
    let mut batch = base(17);
    batch.engine.run_mode = RunModeKind::Batch;

    let a = ParamSweep::new().sweep(&grid, &stepped).unwrap();
    let b = ParamSweep::new().sweep(&grid, &batch).unwrap();
    for (x, y) in a.all().iter().zip(b.all()) {
        assert_eq!(x.result.trades, y.result.trades);
        assert_eq!(x.result.final_value.to_bits(), y.result.final_value.to_bits());
        assert_eq!(x.metrics, y.metrics);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn metrics_are_consistent_with_the_run(seed in 0u64..1_000, fast in 2usize..8, slow in 9usize..40) {
        let mut config = base(seed);
        config.strategy.fast = fast;
        config.strategy.slow = slow;
        let report = run(&config).unwrap();
        let m = &report.metrics;
        prop_assert!(m.max_drawdown <= 0.0 && m.max_drawdown > -1.0);
        prop_assert!((0.0..=1.0).contains(&m.win_rate));
        prop_assert_eq!(m.trade_count, report.result.trades.len());
        let expected = report.result.final_value / report.initial_capital() - 1.0;
        prop_assert!((m.total_return - expected).abs() < 1e-9);
    }
}
