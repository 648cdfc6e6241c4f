use portfolio_sim_core::simulation::{generate_paths, SimulationConfig, TimeIndexMapper};
use portfolio_sim_core::statistics::{invested_capital, invested_capital_curve, summarize};
use proptest::prelude::{any, prop_assert, prop_assert_eq, proptest};

fn config_from_bp(
    horizon_months: u32,
    steps: u32,
    mu_bp: i32,
    sigma_bp: u32,
    s0: u32,
    period_months: u32,
    contribution: u32,
    sims: u32,
    seed: u64,
) -> SimulationConfig {
    SimulationConfig::new(
        horizon_months as f64 / 12.0,
        steps,
        mu_bp as f64 / 10_000.0,
        sigma_bp as f64 / 10_000.0,
        s0 as f64,
        period_months as f64 / 12.0,
        contribution as f64,
        sims,
        Some(seed),
    )
    .unwrap()
}

/// Relative slack for comparisons that can be off by rounding in the mean.
fn slack(x: f64) -> f64 {
    1e-9 * x.abs().max(1.0)
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(32))]

    #[test]
    fn prop_seeded_generation_is_reproducible(
        seed in any::<u64>(),
        horizon_months in 1u32..60,
        steps in 1u32..120,
        mu_bp in -2000i32..2000,
        sigma_bp in 0u32..6000,
        period_months in 1u32..24,
        sims in 1u32..16
    ) {
        let cfg = config_from_bp(horizon_months, steps, mu_bp, sigma_bp, 1000, period_months, 50, sims, seed);
        let a = generate_paths(cfg.clone()).unwrap().result;
        let b = generate_paths(cfg).unwrap().result;
        prop_assert_eq!(a.paths, b.paths);
    }

    #[test]
    fn prop_paths_are_non_negative(
        seed in any::<u64>(),
        horizon_months in 1u32..120,
        steps in 1u32..200,
        mu_bp in -5000i32..5000,
        sigma_bp in 0u32..8000,
        s0 in 0u32..1_000_000,
        period_months in 1u32..36,
        contribution in 0u32..5_000,
        sims in 1u32..12
    ) {
        let cfg = config_from_bp(horizon_months, steps, mu_bp, sigma_bp, s0, period_months, contribution, sims, seed);
        let run = generate_paths(cfg).unwrap().result;
        prop_assert!(run.paths.rows().flatten().all(|v| v.is_finite() && *v >= 0.0));
        prop_assert_eq!(run.paths.num_steps(), steps as usize);
    }

    #[test]
    fn prop_percentiles_bracket_mean(
        seed in any::<u64>(),
        horizon_months in 1u32..120,
        mu_bp in -2000i32..2000,
        sigma_bp in 0u32..5000,
        period_months in 1u32..24,
        sims in 1u32..=20,
        at in 0usize..60
    ) {
        let cfg = config_from_bp(horizon_months, 60, mu_bp, sigma_bp, 10_000, period_months, 200, sims, seed);
        let run = generate_paths(cfg).unwrap().result;
        let s = summarize(&run, at).unwrap().result;
        prop_assert!(s.percentile_5 <= s.mean + slack(s.mean));
        prop_assert!(s.mean <= s.percentile_95 + slack(s.mean));
        prop_assert_eq!(s.density.points.len(), 500);
        prop_assert!(s.density.points.iter().all(|p| p.density.is_finite() && p.density >= 0.0));
    }

    #[test]
    fn prop_invested_capital_non_decreasing_and_matches_floor(
        horizon_months in 1u32..240,
        steps in 1u32..3000,
        period_months in 1u32..24,
        s0 in 0u32..100_000,
        contribution in 0u32..2_000
    ) {
        let cfg = config_from_bp(horizon_months, steps, 500, 1000, s0, period_months, contribution, 1, 0);
        let curve = invested_capital_curve(&cfg);
        prop_assert!(curve.windows(2).all(|w| w[0] <= w[1]));

        // floor(t / P) in exact integers: t / P = k * horizon / (steps * period).
        let full_periods = (horizon_months / period_months) as u64;
        for (k, value) in curve.iter().enumerate() {
            let expected = if period_months >= horizon_months {
                s0 as f64
            } else {
                let elapsed = k as u64 * horizon_months as u64 / (steps as u64 * period_months as u64);
                s0 as f64 + contribution as f64 * elapsed.min(full_periods) as f64
            };
            prop_assert_eq!(*value, expected, "column {}", k);
            prop_assert_eq!(*value, invested_capital(&cfg, k));
        }
    }

    #[test]
    fn prop_flat_market_path_equals_invested_capital(
        horizon_months in 1u32..180,
        steps in 1u32..2000,
        period_months in 1u32..24,
        s0 in 0u32..100_000,
        contribution in 0u32..2_000
    ) {
        let cfg = config_from_bp(horizon_months, steps, 0, 0, s0, period_months, contribution, 1, 7);
        let curve = invested_capital_curve(&cfg);
        let run = generate_paths(cfg).unwrap().result;
        prop_assert_eq!(run.paths.row(0), curve.as_slice());
    }

    #[test]
    fn prop_mapper_clamps(
        horizon_months in 1u32..240,
        steps in 1u32..3000,
        time in -1000.0f64..1000.0
    ) {
        let cfg = config_from_bp(horizon_months, steps, 0, 0, 1, 1, 0, 1, 0);
        let mapper = TimeIndexMapper::new(&cfg);
        let idx = mapper.index_for_time(time);
        prop_assert!(idx < steps as usize);
        if time <= 0.0 {
            prop_assert_eq!(idx, 0);
        }
        if time >= cfg.horizon() {
            prop_assert_eq!(idx, steps as usize - 1);
        }
    }
}
