//! Progress and output reporting for the RAID-Z test harness
//!
//! The harness logic only talks to these traits, so the same checks can print
//! `raidz_test`-style console output or run silently inside a sweep or a
//! unit test.

mod console;
mod silent;

pub use console::ConsoleTestReporter;
pub use silent::SilentTestReporter;

use crate::config::TestOptions;
use crate::harness::{BenchResult, ColumnMismatch, SweepOutcome};
use crate::math::RecVariant;

/// Base trait for all reporters
pub trait Reporter: Send + Sync {
    /// Report an error that occurred during operation
    fn report_error(&self, error: &str);

    /// Report successful completion of an operation
    fn report_complete(&self, message: &str);
}

/// Trait for reporting harness checks, sweeps and benchmarks
pub trait TestReporter: Reporter {
    /// Print the run options; `force` prints them regardless of verbosity
    fn report_options(&self, opts: &TestOptions, force: bool);

    /// Start of a group of checks
    fn report_section(&self, title: &str);

    /// A backend is about to be tested, or skipped if unsupported
    fn report_impl(&self, name: &str, supported: bool);

    /// Result of one generation or reconstruction method
    fn report_method(&self, method: &str, passed: bool);

    /// A column that differs from the golden map
    fn report_mismatch(&self, method: &str, mismatch: &ColumnMismatch);

    /// A reconstruction that failed for the given zero-based data columns
    fn report_rec_failure(&self, variant: RecVariant, data_cols: &[usize]);

    fn report_sweep_progress(&self, done: usize, total: usize);

    fn report_sweep_result(&self, outcome: &SweepOutcome);

    fn report_benchmark(&self, results: &[BenchResult]);
}
