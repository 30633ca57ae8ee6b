//! Pair Analytics Integration Tests
//!
//! Integration tests that verify the analytics components work together:
//! 1. PriceDataPort -> AnalyticsSession -> CorrelationScreen ranking
//! 2. AnalyticsSession -> BacktestSimulator -> PerformanceEvaluator flow
//! 3. Ranking annotated with mean-reversion speed
//! 4. CSV price files end to end
//!
//! All tests are deterministic (seeded synthetic data or fixed fixtures).

use approx::assert_relative_eq;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::io::Write;
use tempfile::NamedTempFile;

use pairlab::adapters::{CsvPriceData, SyntheticPriceData};
use pairlab::application::AnalyticsSession;
use pairlab::backtest::PerformanceEvaluator;
use pairlab::config::Config;
use pairlab::domain::{add_business_days, AnalyticsError, CorrelationMethod, PricePanel};
use pairlab::ports::PriceQuery;
use pairlab::strategy::BacktestParams;

// ============================================================================
// Test Fixtures
// ============================================================================

const TICKERS: usize = 6;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn full_query() -> PriceQuery {
    PriceQuery::new(NaiveDate::MIN, NaiveDate::MAX)
}

/// Session over a seeded synthetic universe of one year of business days
async fn create_synthetic_session() -> AnalyticsSession {
    let source = SyntheticPriceData::generate(42, TICKERS, 260, date(2024, 12, 31)).unwrap();
    AnalyticsSession::load(&source, full_query(), &Config::default())
        .await
        .unwrap()
}

fn window(session: &AnalyticsSession) -> (NaiveDate, NaiveDate) {
    let panel = session.panel();
    (panel.first_date().unwrap(), panel.last_date().unwrap())
}

/// Sector of a synthetic ticker (`SYNxx`, sector = xx mod 3)
fn sector(ticker: &str) -> usize {
    ticker[3..].parse::<usize>().unwrap() % 3
}

// ============================================================================
// Test Module: Returns and Pair Screen
// ============================================================================

mod pair_screen {
    use super::*;

    #[test]
    fn test_known_returns_example() {
        let panel = PricePanel::new(
            (1..=5).map(|d| date(2024, 1, d)).collect(),
            vec!["X".into(), "Y".into()],
            vec![
                vec![100.0, 102.0, 101.0, 105.0, 107.0],
                vec![50.0, 49.0, 50.0, 52.0, 53.0],
            ],
        )
        .unwrap();

        let returns = panel.returns();
        assert_relative_eq!(returns.column("X").unwrap()[0], 0.02, epsilon = 1e-12);

        let session = AnalyticsSession::new(panel);
        let ranked = session
            .rank_pairs(CorrelationMethod::Pearson, date(2024, 1, 1), date(2024, 1, 5), 5)
            .unwrap();
        assert_eq!(ranked.len(), 1);
        assert!((-1.0..=1.0).contains(&ranked[0].score));
    }

    #[tokio::test]
    async fn test_symmetric_methods_emit_each_pair_once() {
        let session = create_synthetic_session().await;
        let (start, end) = window(&session);

        for method in [
            CorrelationMethod::Pearson,
            CorrelationMethod::Spearman,
            CorrelationMethod::Kalman,
        ] {
            let ranked = session.rank_pairs(method, start, end, 100).unwrap();
            assert_eq!(ranked.len(), TICKERS * (TICKERS - 1) / 2, "method {}", method);

            let mut seen = HashSet::new();
            for record in &ranked {
                assert!(record.ticker_a < record.ticker_b);
                assert!(seen.insert((record.ticker_a.clone(), record.ticker_b.clone())));
                assert!((-1.0..=1.0).contains(&record.score));
                assert_eq!(record.method, method);
            }
            for pair in ranked.windows(2) {
                assert!(pair[0].score.abs() >= pair[1].score.abs());
            }
        }
    }

    #[tokio::test]
    async fn test_ols_is_directional() {
        let session = create_synthetic_session().await;
        let (start, end) = window(&session);
        let ranked = session
            .rank_pairs(CorrelationMethod::Ols, start, end, 100)
            .unwrap();

        assert_eq!(ranked.len(), TICKERS * (TICKERS - 1));

        let beta = |x: &str, y: &str| {
            ranked
                .iter()
                .find(|r| r.ticker_a == x && r.ticker_b == y)
                .map(|r| r.score)
                .unwrap()
        };
        let asymmetric = ranked
            .iter()
            .any(|r| (beta(&r.ticker_a, &r.ticker_b) - beta(&r.ticker_b, &r.ticker_a)).abs() > 1e-9);
        assert!(asymmetric);
    }

    #[tokio::test]
    async fn test_top_pair_shares_a_sector() {
        let session = create_synthetic_session().await;
        let (start, end) = window(&session);

        for method in [CorrelationMethod::Pearson, CorrelationMethod::Spearman] {
            let top = session.rank_pairs(method, start, end, 1).unwrap();
            assert_eq!(sector(&top[0].ticker_a), sector(&top[0].ticker_b));
        }
    }

    #[tokio::test]
    async fn test_ranking_is_idempotent() {
        let session = create_synthetic_session().await;
        let (start, end) = window(&session);

        for method in CorrelationMethod::ALL {
            let first = session.rank_pairs(method, start, end, 10).unwrap();
            let second = session.rank_pairs(method, start, end, 10).unwrap();
            assert_eq!(first, second);
        }
    }

    #[tokio::test]
    async fn test_top_n_bounds_output() {
        let session = create_synthetic_session().await;
        let (start, end) = window(&session);
        assert_eq!(
            session
                .rank_pairs(CorrelationMethod::Kalman, start, end, 4)
                .unwrap()
                .len(),
            4
        );
    }
}

// ============================================================================
// Test Module: Backtest -> Performance Flow
// ============================================================================

mod backtest_flow {
    use super::*;

    fn params() -> BacktestParams {
        BacktestParams::default()
            .with_lookback(20)
            .with_bands(-1.0, 1.0)
            .with_hold_days(2)
    }

    #[tokio::test]
    async fn test_hold_extension_with_two_days() {
        let session = create_synthetic_session().await;
        let report = session
            .run_backtest("SYN00", "SYN03", date(2024, 3, 1), date(2024, 12, 31), &params())
            .unwrap();

        assert!(report.rows.iter().any(|r| r.raw_long));
        for (i, row) in report.rows.iter().enumerate() {
            if !row.raw_long {
                continue;
            }
            assert!(row.long_signal);
            if let Some(next) = report.rows.get(i + 1) {
                if next.date <= add_business_days(row.date, 1) {
                    assert!(next.long_signal);
                }
            }
        }
    }

    #[tokio::test]
    async fn test_report_is_consistent() {
        let session = create_synthetic_session().await;
        let report = session
            .run_backtest("SYN01", "SYN04", date(2024, 3, 1), date(2024, 12, 31), &params())
            .unwrap();

        let cumulative: Vec<f64> = report.rows.iter().map(|r| r.cumulative_pnl).collect();
        let direct = PerformanceEvaluator::new().evaluate(&cumulative);
        assert_eq!(report.performance, direct);
        assert_eq!(report.performance.trading_days, report.rows.len() - 1);
        assert!(report.rows.iter().all(|r| r.zscore.is_finite()));
        assert!(report.rows.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn test_increasing_pnl_has_no_drawdown() {
        let summary = PerformanceEvaluator::new().evaluate(&[0.5, 1.0, 1.8, 2.1, 3.0, 3.2]);
        assert_eq!(summary.max_drawdown, 0.0);
        assert!(summary.sharpe_ratio.is_finite() && summary.sharpe_ratio > 0.0);
    }

    #[test]
    fn test_flat_pnl_has_undefined_ratios() {
        let summary = PerformanceEvaluator::new().evaluate(&[1.0; 30]);
        assert!(summary.sharpe_ratio.is_nan());
        assert!(summary.sortino_ratio.is_nan());
    }

    #[tokio::test]
    async fn test_lookback_longer_than_history() {
        let session = create_synthetic_session().await;
        let result = session.run_backtest(
            "SYN00",
            "SYN03",
            date(2024, 11, 1),
            date(2024, 12, 31),
            &params().with_lookback(400),
        );
        assert!(matches!(result, Err(AnalyticsError::InsufficientData(_))));
    }

    #[tokio::test]
    async fn test_report_serializes_nan_as_string() {
        let session = create_synthetic_session().await;
        // Bands no z-score can cross: no position, flat PnL
        let report = session
            .run_backtest(
                "SYN00",
                "SYN03",
                date(2024, 3, 1),
                date(2024, 12, 31),
                &params().with_bands(-1e9, 1e9),
            )
            .unwrap();

        assert_eq!(report.final_pnl(), 0.0);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains(r#""sharpe_ratio":"NaN""#));
    }
}

// ============================================================================
// Test Module: Mean Reversion
// ============================================================================

mod mean_reversion_flow {
    use super::*;

    #[tokio::test]
    async fn test_annotated_ranking() {
        let session = create_synthetic_session().await;
        let (start, end) = window(&session);
        let annotated = session
            .rank_pairs_with_mean_reversion(CorrelationMethod::Pearson, start, end, 5)
            .unwrap();

        assert_eq!(annotated.len(), 5);
        for pair in &annotated {
            assert!(!pair.mean_reversion.is_fallback);
            // Spread of near-independent daily returns reverts within a day or two
            assert!(pair.mean_reversion.theta > 0.5);
        }
    }

    #[tokio::test]
    async fn test_same_ticker_rejected() {
        let session = create_synthetic_session().await;
        let (start, end) = window(&session);
        assert!(matches!(
            session.estimate_mean_reversion("SYN02", "SYN02", start, end),
            Err(AnalyticsError::InvalidArgument(_))
        ));
    }
}

// ============================================================================
// Test Module: CSV Source
// ============================================================================

mod csv_source {
    use super::*;

    #[tokio::test]
    async fn test_csv_end_to_end() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Date,AAA,BBB,CCC").unwrap();
        let prices = [
            ("2024-01-02", 10.0, 20.0, 30.0),
            ("2024-01-03", 10.2, 20.5, 30.1),
            ("2024-01-04", 10.1, 20.1, 30.4),
            ("2024-01-05", 10.4, 20.9, 30.2),
            ("2024-01-08", 10.3, 20.6, 30.2),
            ("2024-01-09", 10.6, 21.3, 30.5),
        ];
        for (d, a, b, c) in prices {
            writeln!(file, "{},{},{},{}", d, a, b, c).unwrap();
        }
        writeln!(file, "2024-01-10,10.5,,30.3").unwrap();

        let source = CsvPriceData::new(file.path());
        let session = AnalyticsSession::load(&source, full_query(), &Config::default())
            .await
            .unwrap();
        assert_eq!(session.panel().len(), 7);
        assert!(session.panel().column("BBB").unwrap()[6].is_nan());

        let ranked = session
            .rank_pairs(CorrelationMethod::Pearson, date(2024, 1, 2), date(2024, 1, 10), 3)
            .unwrap();
        assert_eq!(ranked.len(), 3);
        // AAA and BBB move together
        assert_eq!(
            (ranked[0].ticker_a.as_str(), ranked[0].ticker_b.as_str()),
            ("AAA", "BBB")
        );
        assert!(ranked[0].score > 0.9);
    }
}
