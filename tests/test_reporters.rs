//! Tests for the console and silent harness reporters

use raidzrs::config::{TestOptions, Verbosity};
use raidzrs::harness::{BenchResult, ColumnMismatch, SweepOutcome};
use raidzrs::math::RecVariant;
use raidzrs::reporters::{ConsoleTestReporter, Reporter, SilentTestReporter, TestReporter};
use std::time::Duration;

fn mismatch() -> ColumnMismatch {
    ColumnMismatch {
        row: 1,
        col: 4,
        offset: 17,
        expected: vec![0xDE, 0xAD],
        actual: vec![0xBE, 0xEF],
    }
}

fn bench_results() -> Vec<BenchResult> {
    vec![
        BenchResult {
            implementation: "original",
            method: "gen_p",
            bytes: 1 << 20,
            elapsed: Duration::from_millis(10),
        },
        BenchResult {
            implementation: "scalar",
            method: "rec_pqr",
            bytes: 1 << 20,
            elapsed: Duration::from_millis(5),
        },
    ]
}

fn exercise(reporter: &dyn TestReporter) {
    let opts = TestOptions::default();
    reporter.report_error("something broke");
    reporter.report_complete("done");
    reporter.report_options(&opts, false);
    reporter.report_options(&opts, true);
    reporter.report_section("Testing parity generation...");
    reporter.report_impl("scalar", true);
    reporter.report_impl("avx2", false);
    reporter.report_method("gen_pq", true);
    reporter.report_method("rec_qr", false);
    reporter.report_mismatch("rec_qr", &mismatch());
    reporter.report_rec_failure(RecVariant::Qr, &[0, 3]);
    reporter.report_sweep_progress(20, 198);
    reporter.report_sweep_result(&SweepOutcome::Passed { maps: 198 });
    reporter.report_sweep_result(&SweepOutcome::TimedOut {
        maps: 4,
        timeout: Duration::from_secs(1),
    });
    reporter.report_sweep_result(&SweepOutcome::Failed {
        maps: 4,
        options: Box::new(opts.clone()),
    });
    reporter.report_benchmark(&bench_results());
    reporter.report_benchmark(&[]);
}

#[test]
fn test_console_reporter_all_levels() {
    for verbosity in [Verbosity::Quiet, Verbosity::Info, Verbosity::Debug] {
        exercise(&ConsoleTestReporter::new(verbosity));
    }
}

#[test]
fn test_silent_reporter() {
    exercise(&SilentTestReporter::new());
}

#[test]
fn test_bench_throughput() {
    let results = bench_results();
    assert!((results[0].mib_per_sec() - 100.0).abs() < 1e-6);
    assert!((results[1].mib_per_sec() - 200.0).abs() < 1e-6);
}

#[test]
fn test_verbosity_display() {
    assert_eq!(Verbosity::Quiet.to_string(), "no");
    assert_eq!(Verbosity::Info.to_string(), "info");
    assert_eq!(Verbosity::Debug.to_string(), "debug");
    assert_eq!(Verbosity::from_count(5), Verbosity::Debug);
}
