//! Golden-map test driver behind `raidz_test`
//!
//! Every check builds a golden map with triple parity, generates it with the
//! `original` backend and compares maps produced by the backend under test
//! against it. Golden and test maps are filled from the same [`TestData`],
//! so any difference is a bug in the backend (or, in sanity mode, the
//! skipped operation).
//!
//! - [`Harness::run_gen_check`]: `gen_p`, `gen_pq` and `gen_pqr` must
//!   reproduce the golden P, Q and R columns.
//! - [`Harness::run_rec_check`]: each of the seven reconstruction methods is
//!   forced on every combination of data columns and must restore the golden
//!   data.
//! - [`run_sweep`]: both checks over a grid of geometries on a rayon pool.
//! - [`run_benchmark`]: throughput of every method on every backend.

use crate::abd::Abd;
use crate::config::{TestOptions, Verbosity};
use crate::error::Result;
use crate::map::RaidzMap;
use crate::math::{RaidzOps, RecVariant, GEN_NAMES};
use crate::registry::{ImplRegistry, BACKEND_NAMES, IMPL_ORIGINAL};
use crate::reporters::{SilentTestReporter, TestReporter};
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rayon::prelude::*;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Parity of the golden map and of reconstruction test maps
pub const GOLDEN_PARITY: usize = 3;

/// Largest block the pool writes, and the sweep's data pool size
pub const MAX_BLOCK_SIZE: usize = 1 << 24;

pub const SWEEP_DCOLS: [usize; 11] = [1, 2, 3, 4, 5, 6, 7, 8, 12, 15, 16];
pub const SWEEP_ASHIFTS: [u32; 3] = [9, 12, 14];
pub const SWEEP_SIZES: [usize; 6] = [
    512,
    21 * 512,
    13 * 4096,
    1 << 17,
    (1 << 20) - (1 << 12),
    MAX_BLOCK_SIZE,
];

const SWEEP_PROGRESS_STEP: usize = 20;
const SWEEP_SANITY_FAILURE: f64 = 0.25;

pub const BENCH_DCOLS: usize = 8;
pub const BENCH_ASHIFT: u32 = 12;
pub const BENCH_SIZE: usize = 1 << 17;
/// Bytes pushed through each method per backend
pub const BENCH_MEMORY: usize = 1 << 28;

/// Bytes shown on either side of a mismatch
const MISMATCH_CONTEXT: usize = 16;

/// Random data and corruption pattern shared by golden and test maps
#[derive(Debug, Clone)]
pub struct TestData {
    data: Vec<u8>,
    noise: Vec<u8>,
}

impl TestData {
    pub fn random(len: usize) -> Self {
        Self::from_rng(&mut rand::rng(), len)
    }

    /// Reproducible data for tests
    pub fn seeded(seed: u64, len: usize) -> Self {
        Self::from_rng(&mut StdRng::seed_from_u64(seed), len)
    }

    fn from_rng<R: RngCore>(rng: &mut R, len: usize) -> Self {
        let mut data = vec![0u8; len];
        let mut noise = vec![0u8; len];
        rng.fill_bytes(&mut data);
        rng.fill_bytes(&mut noise);
        Self { data, noise }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// A `size`-byte I/O buffer holding the start of the data
    pub fn abd(&self, size: usize) -> Result<Abd> {
        let mut abd = Abd::alloc(size)?;
        abd.copy_from(&self.data[..size.min(self.data.len())]);
        Ok(abd)
    }

    /// Overwrite `dst` with the corruption pattern
    pub fn corrupt(&self, dst: &mut [u8]) {
        let n = dst.len().min(self.noise.len());
        dst[..n].copy_from_slice(&self.noise[..n]);
    }
}

/// Cooperative cancellation for long runs
#[derive(Debug, Default)]
pub struct StopFlag {
    stopped: AtomicBool,
    deadline: Option<Instant>,
}

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self {
            stopped: AtomicBool::new(false),
            deadline: timeout.map(|t| Instant::now() + t),
        }
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    pub fn timed_out(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    pub fn should_stop(&self) -> bool {
        self.stopped.load(Ordering::Relaxed) || self.timed_out()
    }
}

/// First differing bytes of one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMismatch {
    pub row: usize,
    pub col: usize,
    /// Byte offset of the first difference
    pub offset: usize,
    pub expected: Vec<u8>,
    pub actual: Vec<u8>,
}

impl ColumnMismatch {
    fn find(row: usize, col: usize, expected: &[u8], actual: &[u8]) -> Option<Self> {
        if expected == actual {
            return None;
        }
        let offset = expected
            .iter()
            .zip(actual)
            .position(|(a, b)| a != b)
            .unwrap_or(expected.len().min(actual.len()));
        let window = |b: &[u8]| b[offset.min(b.len())..(offset + MISMATCH_CONTEXT).min(b.len())].to_vec();
        Some(Self {
            row,
            col,
            offset,
            expected: window(expected),
            actual: window(actual),
        })
    }
}

/// Build a test map for `opts`: single-row, or multi-row when expanded
pub fn build_test_map<'m>(opts: &TestOptions, abd: &'m mut Abd, nparity: usize) -> Result<RaidzMap<'m>> {
    if opts.expanded {
        let (physical, logical) = opts.widths(nparity);
        RaidzMap::build(
            abd,
            opts.offset,
            opts.dsize,
            opts.ashift,
            physical,
            logical,
            nparity,
            opts.reflow_offset,
        )
    } else {
        RaidzMap::build_single_row(
            abd,
            opts.offset,
            opts.dsize,
            opts.ashift,
            opts.total_cols(nparity),
            nparity,
        )
    }
}

/// Targets that force `variant` on a triple-parity map, with `data` the
/// zero-based data columns to lose
pub fn forced_targets(variant: RecVariant, data: &[usize]) -> SmallVec<[usize; 3]> {
    let mut targets: SmallVec<[usize; 3]> = variant.parity_targets().iter().copied().collect();
    targets.extend(data.iter().map(|&x| x + GOLDEN_PARITY));
    targets
}

/// Data columns a method has to solve on a triple-parity map
fn data_targets(variant: RecVariant) -> usize {
    GOLDEN_PARITY - variant.parity_targets().len()
}

/// k-element subsets of `0..n` in lexicographic order
#[derive(Debug, Clone)]
struct Combinations {
    n: usize,
    next: Option<SmallVec<[usize; 3]>>,
}

impl Combinations {
    fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            next: (k <= n).then(|| (0..k).collect()),
        }
    }
}

impl Iterator for Combinations {
    type Item = SmallVec<[usize; 3]>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        let k = current.len();
        let mut idx = current.clone();
        let mut i = k;
        while i > 0 && idx[i - 1] == self.n - k + i - 1 {
            i -= 1;
        }
        if i > 0 {
            idx[i - 1] += 1;
            for j in i..k {
                idx[j] = idx[j - 1] + 1;
            }
            self.next = Some(idx);
        }
        Some(current)
    }
}

fn compare_code(golden: &RaidzMap<'_>, test: &RaidzMap<'_>, nparity: usize) -> Vec<ColumnMismatch> {
    let mut out = Vec::new();
    for row in 0..golden.nrows().min(test.nrows()) {
        for p in 0..nparity {
            out.extend(ColumnMismatch::find(
                row,
                p,
                golden.column_data(row, p),
                test.column_data(row, p),
            ));
        }
    }
    out
}

fn compare_data(golden: &RaidzMap<'_>, test: &RaidzMap<'_>) -> Vec<ColumnMismatch> {
    let mut out = Vec::new();
    for (row, rr) in golden.rows().iter().enumerate().take(test.nrows()) {
        for c in rr.firstdatacol..rr.cols {
            out.extend(ColumnMismatch::find(
                row,
                c,
                golden.column_data(row, c),
                test.column_data(row, c),
            ));
        }
    }
    out
}

/// Copy column `col` of every row back from the golden map
fn restore_column(golden: &RaidzMap<'_>, map: &mut RaidzMap<'_>, col: usize) {
    for row in 0..map.nrows() {
        if col < map.row(row).cols {
            map.column_data_mut(row, col).copy_from_slice(golden.column_data(row, col));
        }
    }
}

/// One `raidz_test` run over a single geometry
pub struct Harness<'a> {
    opts: TestOptions,
    data: &'a TestData,
    registry: &'a ImplRegistry,
    reporter: &'a dyn TestReporter,
    stop: &'a StopFlag,
}

impl<'a> Harness<'a> {
    pub fn new(
        opts: TestOptions,
        data: &'a TestData,
        registry: &'a ImplRegistry,
        reporter: &'a dyn TestReporter,
        stop: &'a StopFlag,
    ) -> Self {
        Self {
            opts,
            data,
            registry,
            reporter,
            stop,
        }
    }

    pub fn options(&self) -> &TestOptions {
        &self.opts
    }

    /// Generation and reconstruction checks; returns the failure count
    pub fn run_test(&self) -> Result<usize> {
        self.reporter.report_options(&self.opts, false);
        let mut errors = self.run_gen_check()?;
        errors += self.run_rec_check()?;
        Ok(errors)
    }

    fn golden_map<'m>(&self, abd: &'m mut Abd) -> Result<RaidzMap<'m>> {
        let mut map = build_test_map(&self.opts, abd, GOLDEN_PARITY)?;
        self.registry.original().generate(&mut map)?;
        Ok(map)
    }

    /// Backends under test, or `None` for ones this CPU lacks
    fn backends_under_test(&self) -> impl Iterator<Item = (&'static str, Option<&'a dyn RaidzOps>)> {
        let registry = self.registry;
        BACKEND_NAMES
            .iter()
            .copied()
            .filter(|&name| name != IMPL_ORIGINAL)
            .map(move |name| (name, registry.get(name)))
    }

    fn corrupt_column(&self, map: &mut RaidzMap<'_>, col: usize) {
        for row in 0..map.nrows() {
            if col < map.row(row).cols {
                self.data.corrupt(map.column_data_mut(row, col));
            }
        }
    }

    fn report_mismatches(&self, what: &str, mismatches: &[ColumnMismatch]) {
        for m in mismatches {
            self.reporter.report_mismatch(what, m);
        }
    }

    /// Every backend must reproduce the golden parity for each arity
    pub fn run_gen_check(&self) -> Result<usize> {
        self.reporter.report_section("Testing parity generation...");

        let mut golden_abd = self.data.abd(self.opts.dsize)?;
        let golden = self.golden_map(&mut golden_abd)?;

        let mut errors = 0;
        for (name, ops) in self.backends_under_test() {
            if self.stop.should_stop() {
                break;
            }
            self.reporter.report_impl(name, ops.is_some());
            let Some(ops) = ops else { continue };

            for (i, method) in GEN_NAMES.iter().enumerate() {
                let nparity = i + 1;
                let mut abd = self.data.abd(self.opts.dsize)?;
                let mut map = build_test_map(&self.opts, &mut abd, nparity)?;
                for p in 0..nparity {
                    self.corrupt_column(&mut map, p);
                }
                if !self.opts.sanity {
                    ops.generate(&mut map)?;
                }

                let mismatches = compare_code(&golden, &map, nparity);
                self.report_mismatches(method, &mismatches);
                self.reporter.report_method(method, mismatches.is_empty());
                errors += mismatches.len();
            }
        }
        Ok(errors)
    }

    /// Every backend must restore the golden data with each method
    pub fn run_rec_check(&self) -> Result<usize> {
        self.reporter.report_section("Testing data reconstruction...");

        let mut golden_abd = self.data.abd(self.opts.dsize)?;
        let golden = self.golden_map(&mut golden_abd)?;

        let mut errors = 0;
        for (name, ops) in self.backends_under_test() {
            if self.stop.should_stop() {
                break;
            }
            self.reporter.report_impl(name, ops.is_some());
            let Some(ops) = ops else { continue };

            let mut abd = self.data.abd(self.opts.dsize)?;
            let mut map = build_test_map(&self.opts, &mut abd, GOLDEN_PARITY)?;
            ops.generate(&mut map)?;

            for variant in RecVariant::ALL {
                let failed = self.rec_check_variant(ops, &golden, &mut map, variant);
                self.reporter.report_method(variant.name(), failed == 0);
                errors += failed;
            }
        }
        Ok(errors)
    }

    fn rec_check_variant(
        &self,
        ops: &dyn RaidzOps,
        golden: &RaidzMap<'_>,
        map: &mut RaidzMap<'_>,
        variant: RecVariant,
    ) -> usize {
        let forced = variant.parity_targets().len();
        let dcols = (map.row(0).cols - GOLDEN_PARITY).min(self.opts.dcols);
        let mut errors = 0;

        for data in Combinations::new(dcols, data_targets(variant)) {
            if self.stop.should_stop() {
                break;
            }
            let targets = forced_targets(variant, &data);
            for &t in &targets[forced..] {
                self.corrupt_column(map, t);
            }

            if !self.opts.sanity {
                if let Err(e) = ops.reconstruct(map, &targets) {
                    self.reporter
                        .report_error(&format!("{} {} {:?}: {}", ops.name(), variant, targets, e));
                    errors += 1;
                    for &t in targets.iter() {
                        restore_column(golden, map, t);
                    }
                    continue;
                }
            }

            let mismatches = compare_data(golden, map);
            if !mismatches.is_empty() {
                self.report_mismatches(variant.name(), &mismatches);
                self.reporter.report_rec_failure(variant, &data);
                errors += 1;
                for &t in targets.iter() {
                    restore_column(golden, map, t);
                }
            }
        }
        debug!("{} {}: {} failures", ops.name(), variant, errors);
        errors
    }
}

/// How a sweep ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    Passed { maps: usize },
    TimedOut { maps: usize, timeout: Duration },
    /// `options` is the first geometry that failed
    Failed { maps: usize, options: Box<TestOptions> },
}

impl SweepOutcome {
    pub fn maps(&self) -> usize {
        match self {
            SweepOutcome::Passed { maps }
            | SweepOutcome::TimedOut { maps, .. }
            | SweepOutcome::Failed { maps, .. } => *maps,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            SweepOutcome::Failed { .. } => 2,
            _ => 0,
        }
    }
}

/// Geometries covered by a sweep, each with a random sector-aligned offset
pub fn sweep_configurations(base: &TestOptions) -> Vec<TestOptions> {
    let mut rng = rand::rng();
    let mut configs = Vec::with_capacity(SWEEP_DCOLS.len() * SWEEP_ASHIFTS.len() * SWEEP_SIZES.len());
    for &dcols in &SWEEP_DCOLS {
        for &ashift in &SWEEP_ASHIFTS {
            for &dsize in &SWEEP_SIZES {
                configs.push(TestOptions {
                    dcols,
                    ashift,
                    dsize,
                    offset: rng.random_range(0..1u64 << 31) << ashift,
                    sweep: false,
                    sanity: false,
                    verbosity: Verbosity::Quiet,
                    ..base.clone()
                });
            }
        }
    }
    configs
}

/// Run the checks over every sweep geometry until done, timed out or failed
pub fn run_sweep(
    opts: &TestOptions,
    data: &TestData,
    registry: &ImplRegistry,
    reporter: &dyn TestReporter,
) -> SweepOutcome {
    run_sweep_over(opts, sweep_configurations(opts), data, registry, reporter)
}

/// Sweep an explicit list of geometries; `data` must cover the largest one
pub fn run_sweep_over(
    opts: &TestOptions,
    configs: Vec<TestOptions>,
    data: &TestData,
    registry: &ImplRegistry,
    reporter: &dyn TestReporter,
) -> SweepOutcome {
    let total = configs.len();
    let stop = StopFlag::with_timeout(opts.sweep_timeout);
    let started = AtomicUsize::new(0);
    let tested = AtomicUsize::new(0);
    let failed: Mutex<Option<TestOptions>> = Mutex::new(None);

    let work = || {
        configs.par_iter().for_each(|cfg| {
            if stop.should_stop() {
                return;
            }
            let n = started.fetch_add(1, Ordering::Relaxed) + 1;
            if n % SWEEP_PROGRESS_STEP == 0 {
                reporter.report_sweep_progress(n, total);
            }
            if cfg.dsize < 1 << cfg.ashift {
                return;
            }

            let silent = SilentTestReporter::new();
            let harness = Harness::new(cfg.clone(), data, registry, &silent, &stop);
            let mut failure = match harness.run_test() {
                Ok(errors) => errors > 0,
                Err(e) => {
                    warn!("sweep configuration failed to run: {}", e);
                    true
                }
            };
            tested.fetch_add(1, Ordering::Relaxed);

            if opts.sanity && rand::rng().random_bool(SWEEP_SANITY_FAILURE) {
                failure = true;
            }
            if failure {
                let mut slot = failed.lock().unwrap_or_else(|e| e.into_inner());
                slot.get_or_insert_with(|| cfg.clone());
                stop.stop();
            }
        })
    };

    let threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .max(2);
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(work),
        Err(e) => {
            warn!("sweep thread pool: {}; using the global pool", e);
            work()
        }
    }

    let maps = tested.into_inner();
    let failed = failed.into_inner().unwrap_or_else(|e| e.into_inner());
    let outcome = match (failed, opts.sweep_timeout) {
        (Some(options), _) => SweepOutcome::Failed {
            maps,
            options: Box::new(options),
        },
        (None, Some(timeout)) if stop.timed_out() => SweepOutcome::TimedOut { maps, timeout },
        (None, _) => SweepOutcome::Passed { maps },
    };
    reporter.report_sweep_result(&outcome);
    outcome
}

/// Throughput of one method on one backend
#[derive(Debug, Clone, PartialEq)]
pub struct BenchResult {
    pub implementation: &'static str,
    pub method: &'static str,
    pub bytes: u64,
    pub elapsed: Duration,
}

impl BenchResult {
    pub fn mib_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64().max(f64::EPSILON);
        self.bytes as f64 / (1 << 20) as f64 / secs
    }
}

/// Time every generation and reconstruction method on every backend,
/// pushing `memory` bytes of data through each
pub fn run_benchmark(
    registry: &ImplRegistry,
    reporter: &dyn TestReporter,
    memory: usize,
) -> Result<Vec<BenchResult>> {
    let opts = TestOptions {
        dcols: BENCH_DCOLS,
        ashift: BENCH_ASHIFT,
        dsize: BENCH_SIZE,
        offset: 0,
        ..TestOptions::default()
    };
    let data = TestData::random(BENCH_SIZE);
    let iterations = (memory / BENCH_SIZE).max(1);
    let bytes = (iterations * BENCH_SIZE) as u64;
    let mut results = Vec::new();

    for ops in registry.backends() {
        for (i, &method) in GEN_NAMES.iter().enumerate() {
            let mut abd = data.abd(BENCH_SIZE)?;
            let mut map = build_test_map(&opts, &mut abd, i + 1)?;
            let start = Instant::now();
            for _ in 0..iterations {
                ops.generate(&mut map)?;
            }
            results.push(BenchResult {
                implementation: ops.name(),
                method,
                bytes,
                elapsed: start.elapsed(),
            });
        }

        let mut abd = data.abd(BENCH_SIZE)?;
        let mut map = build_test_map(&opts, &mut abd, GOLDEN_PARITY)?;
        ops.generate(&mut map)?;
        for variant in RecVariant::ALL {
            let lost: SmallVec<[usize; 3]> = (0..data_targets(variant)).collect();
            let targets = forced_targets(variant, &lost);
            let start = Instant::now();
            for _ in 0..iterations {
                ops.reconstruct(&mut map, &targets)?;
            }
            results.push(BenchResult {
                implementation: ops.name(),
                method: variant.name(),
                bytes,
                elapsed: start.elapsed(),
            });
        }
        debug!("benchmarked {}", ops.name());
    }

    reporter.report_benchmark(&results);
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combinations_in_order() {
        let all: Vec<Vec<usize>> = Combinations::new(4, 2).map(|c| c.to_vec()).collect();
        assert_eq!(
            all,
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![0, 3],
                vec![1, 2],
                vec![1, 3],
                vec![2, 3]
            ]
        );
        assert_eq!(Combinations::new(16, 3).count(), 560);
        assert_eq!(Combinations::new(2, 3).count(), 0);
    }

    #[test]
    fn forced_targets_match_method_table() {
        let table: [[usize; 3]; 7] = [
            [1, 2, 3],
            [0, 2, 3],
            [0, 1, 3],
            [2, 3, 4],
            [1, 3, 4],
            [0, 3, 4],
            [3, 4, 5],
        ];
        for (variant, expected) in RecVariant::ALL.iter().zip(table) {
            let lost: Vec<usize> = (0..data_targets(*variant)).collect();
            assert_eq!(forced_targets(*variant, &lost).as_slice(), &expected);
        }
    }

    #[test]
    fn mismatch_reports_first_difference() {
        let a = [1u8, 2, 3, 4];
        let b = [1u8, 2, 9, 4];
        let m = ColumnMismatch::find(0, 5, &a, &b).unwrap();
        assert_eq!(m.offset, 2);
        assert_eq!(m.expected, vec![3, 4]);
        assert_eq!(m.actual, vec![9, 4]);
        assert!(ColumnMismatch::find(0, 5, &a, &a).is_none());
    }

    #[test]
    fn stop_flag_timeout() {
        let stop = StopFlag::with_timeout(Some(Duration::ZERO));
        assert!(stop.should_stop());
        let stop = StopFlag::new();
        assert!(!stop.should_stop());
        stop.stop();
        assert!(stop.should_stop());
    }

    #[test]
    fn sweep_grid_is_complete() {
        let configs = sweep_configurations(&TestOptions::default());
        assert_eq!(configs.len(), 11 * 3 * 6);
        for cfg in &configs {
            assert_eq!(cfg.offset % (1 << cfg.ashift), 0);
            assert!(!cfg.sweep);
        }
    }

    /// Backend whose first reconstruction fails without touching the map
    #[derive(Debug)]
    struct FailsOnce<'r> {
        inner: &'r dyn RaidzOps,
        failed: AtomicBool,
    }

    impl RaidzOps for FailsOnce<'_> {
        fn name(&self) -> &'static str {
            "fails_once"
        }

        fn generate(&self, map: &mut RaidzMap<'_>) -> Result<()> {
            self.inner.generate(map)
        }

        fn reconstruct(
            &self,
            map: &mut RaidzMap<'_>,
            targets: &[usize],
        ) -> Result<crate::math::ReconstructOutcome> {
            if !self.failed.swap(true, Ordering::SeqCst) {
                return Err(crate::error::RaidzError::InsufficientParity {
                    missing: 3,
                    available: 0,
                });
            }
            self.inner.reconstruct(map, targets)
        }

        fn verify_parity(&self, map: &mut RaidzMap<'_>) -> Result<usize> {
            self.inner.verify_parity(map)
        }
    }

    #[test]
    fn reconstruct_error_counts_once() {
        let data = TestData::seeded(9, 1 << 13);
        let registry = ImplRegistry::detect();
        let stop = StopFlag::new();
        let reporter = SilentTestReporter::new();
        let opts = TestOptions {
            dsize: 1 << 13,
            dcols: 5,
            ..TestOptions::default()
        };
        let harness = Harness::new(opts.clone(), &data, &registry, &reporter, &stop);
        let ops = FailsOnce {
            inner: registry.original(),
            failed: AtomicBool::new(false),
        };

        let mut golden_abd = data.abd(opts.dsize).unwrap();
        let golden = harness.golden_map(&mut golden_abd).unwrap();
        let mut abd = data.abd(opts.dsize).unwrap();
        let mut map = build_test_map(&opts, &mut abd, GOLDEN_PARITY).unwrap();
        ops.generate(&mut map).unwrap();

        // Ten column pairs; only the first attempt errors
        assert_eq!(harness.rec_check_variant(&ops, &golden, &mut map, RecVariant::Pq), 1);
        assert!(compare_data(&golden, &map).is_empty());
    }

    #[test]
    fn sanity_mode_fails_generation() {
        let data = TestData::seeded(1, 1 << 14);
        let registry = ImplRegistry::detect();
        let stop = StopFlag::new();
        let reporter = SilentTestReporter::new();
        let opts = TestOptions {
            dsize: 1 << 14,
            dcols: 4,
            sanity: true,
            ..TestOptions::default()
        };
        let harness = Harness::new(opts, &data, &registry, &reporter, &stop);
        assert!(harness.run_gen_check().unwrap() > 0);
    }
}
