//! Silent reporter
//!
//! Used by sweep workers and tests, where only the failure count matters.

use super::{Reporter, TestReporter};
use crate::config::TestOptions;
use crate::harness::{BenchResult, ColumnMismatch, SweepOutcome};
use crate::math::RecVariant;

/// No-output implementation of [`TestReporter`]
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentTestReporter;

impl SilentTestReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Reporter for SilentTestReporter {
    fn report_error(&self, _error: &str) {}
    fn report_complete(&self, _message: &str) {}
}

impl TestReporter for SilentTestReporter {
    fn report_options(&self, _opts: &TestOptions, _force: bool) {}
    fn report_section(&self, _title: &str) {}
    fn report_impl(&self, _name: &str, _supported: bool) {}
    fn report_method(&self, _method: &str, _passed: bool) {}
    fn report_mismatch(&self, _method: &str, _mismatch: &ColumnMismatch) {}
    fn report_rec_failure(&self, _variant: RecVariant, _data_cols: &[usize]) {}
    fn report_sweep_progress(&self, _done: usize, _total: usize) {}
    fn report_sweep_result(&self, _outcome: &SweepOutcome) {}
    fn report_benchmark(&self, _results: &[BenchResult]) {}
}
