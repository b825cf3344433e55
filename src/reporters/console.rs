//! Console reporter for `raidz_test`
//!
//! Check results are printed from `info` verbosity up, column dumps from
//! `debug`. Sweep and benchmark summaries are always printed.

use super::{Reporter, TestReporter};
use crate::config::{ilog2, TestOptions, Verbosity};
use crate::harness::{BenchResult, ColumnMismatch, SweepOutcome};
use crate::math::RecVariant;
use std::io::Write;

const DBLSEP: &str = "================\n";
const SEP: &str = "----------------\n";

/// Console implementation of [`TestReporter`]
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleTestReporter {
    verbosity: Verbosity,
}

impl ConsoleTestReporter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    fn enabled(&self, level: Verbosity) -> bool {
        self.verbosity >= level
    }
}

impl Reporter for ConsoleTestReporter {
    fn report_error(&self, error: &str) {
        eprintln!("Error: {}", error);
    }

    fn report_complete(&self, message: &str) {
        println!("{}", message);
    }
}

fn yes_no(v: bool) -> &'static str {
    if v {
        "yes"
    } else {
        "no"
    }
}

impl TestReporter for ConsoleTestReporter {
    fn report_options(&self, opts: &TestOptions, force: bool) {
        if !force && !self.enabled(Verbosity::Info) {
            return;
        }
        let reflow = opts
            .reflow_offset
            .map_or_else(|| "none".to_string(), |r| format!("{:x}", r));
        println!("{}Running with options:", DBLSEP);
        println!("  (-a) zio ashift                   : {}", opts.ashift);
        println!("  (-o) zio offset                   : 1 << {}", ilog2(opts.offset));
        println!("  (-e) expanded map                 : {}", yes_no(opts.expanded));
        println!("  (-r) reflow offset                : {}", reflow);
        println!("  (-d) number of raidz data columns : {}", opts.dcols);
        println!("  (-s) size of DATA                 : 1 << {}", ilog2(opts.dsize as u64));
        println!("  (-S) sweep parameters             : {}", yes_no(opts.sweep));
        println!("  (-v) verbose                      : {}", opts.verbosity);
        println!();
    }

    fn report_section(&self, title: &str) {
        if self.enabled(Verbosity::Info) {
            println!("\n{}{}", DBLSEP, title);
        }
    }

    fn report_impl(&self, name: &str, supported: bool) {
        if self.enabled(Verbosity::Info) {
            print!("{}Testing [{}] implementation...", SEP, name);
            println!("{}", if supported { "[SUPPORTED]" } else { "[SKIP]" });
        }
    }

    fn report_method(&self, method: &str, passed: bool) {
        if self.enabled(Verbosity::Info) {
            println!(
                "\t\tTesting method [{}] ...{}",
                method,
                if passed { "[PASS]" } else { "[FAIL]" }
            );
        }
    }

    fn report_mismatch(&self, method: &str, mismatch: &ColumnMismatch) {
        if self.enabled(Verbosity::Debug) {
            println!(
                "\t{}: row {} col {} differs at byte {}: expected {} got {}",
                method,
                mismatch.row,
                mismatch.col,
                mismatch.offset,
                hex::encode(&mismatch.expected),
                hex::encode(&mismatch.actual)
            );
        }
    }

    fn report_rec_failure(&self, variant: RecVariant, data_cols: &[usize]) {
        if self.enabled(Verbosity::Debug) {
            let cols: Vec<String> = data_cols.iter().map(|c| c.to_string()).collect();
            println!("\n{} D[{}]... [FAIL]", variant, cols.join(" "));
        }
    }

    fn report_sweep_progress(&self, done: usize, total: usize) {
        print!("{}/{}... ", done, total);
        let _ = std::io::stdout().flush();
    }

    fn report_sweep_result(&self, outcome: &SweepOutcome) {
        println!();
        match outcome {
            SweepOutcome::Passed { maps } => {
                self.report_complete(&format!("Sweep test succeeded on {} raidz maps!", maps));
            }
            SweepOutcome::TimedOut { maps, timeout } => {
                println!("Test timeout ({}s). Stopping...", timeout.as_secs());
                self.report_complete(&format!("Sweep test succeeded on {} raidz maps!", maps));
            }
            SweepOutcome::Failed { options, .. } => {
                self.report_error("Sweep test failed! Failed option:");
                self.report_options(options, true);
            }
        }
    }

    fn report_benchmark(&self, results: &[BenchResult]) {
        let mut methods: Vec<&str> = Vec::new();
        let mut impls: Vec<&str> = Vec::new();
        for r in results {
            if !methods.contains(&r.method) {
                methods.push(r.method);
            }
            if !impls.contains(&r.implementation) {
                impls.push(r.implementation);
            }
        }

        print!("{}{:<14}", DBLSEP, "implementation");
        for m in &methods {
            print!("{:>10}", m);
        }
        println!();
        for name in impls {
            print!("{:<14}", name);
            for m in &methods {
                match results
                    .iter()
                    .find(|r| r.implementation == name && r.method == *m)
                {
                    Some(r) => print!("{:>10.0}", r.mib_per_sec()),
                    None => print!("{:>10}", "-"),
                }
            }
            println!();
        }
        println!("(MiB/s)");
    }
}
