//! Configuration for the RAID-Z math layer and the test harness

use crate::error::Result;
use crate::registry::{ImplRegistry, IMPL_FASTEST};
use std::fmt;
use std::time::Duration;

/// Environment variable naming the math implementation
pub const ENV_IMPL: &str = "RAIDZ_IMPL";

/// Math implementation selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaidzConfig {
    /// Backend name, `fastest` or `cycle`
    pub implementation: String,
}

impl Default for RaidzConfig {
    fn default() -> Self {
        Self {
            implementation: IMPL_FASTEST.to_string(),
        }
    }
}

impl RaidzConfig {
    pub fn new(implementation: impl Into<String>) -> Self {
        Self {
            implementation: implementation.into(),
        }
    }

    /// Read `RAIDZ_IMPL`, falling back to `fastest`
    pub fn from_env() -> Self {
        std::env::var(ENV_IMPL)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(Self::new)
            .unwrap_or_default()
    }

    /// Select the configured implementation in `registry`
    pub fn apply(&self, registry: &mut ImplRegistry) -> Result<()> {
        registry.set_impl(&self.implementation)
    }
}

/// Harness output level, raised by each `-v`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    #[default]
    Quiet,
    Info,
    Debug,
}

impl Verbosity {
    pub fn from_count(count: u8) -> Self {
        match count {
            0 => Verbosity::Quiet,
            1 => Verbosity::Info,
            _ => Verbosity::Debug,
        }
    }

    pub fn level_filter(self) -> log::LevelFilter {
        match self {
            Verbosity::Quiet => log::LevelFilter::Warn,
            Verbosity::Info => log::LevelFilter::Info,
            Verbosity::Debug => log::LevelFilter::Debug,
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verbosity::Quiet => "no",
            Verbosity::Info => "info",
            Verbosity::Debug => "debug",
        })
    }
}

pub const MIN_ASHIFT: u32 = 9;
pub const MAX_TEST_ASHIFT: u32 = 13;
pub const MAX_OFFSET_SHIFT: u32 = 12;
pub const MIN_SIZE_SHIFT: u32 = 9;
pub const MAX_SIZE_SHIFT: u32 = 24;
pub const MAX_DCOLS: usize = 255;

/// Parameters of one `raidz_test` run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOptions {
    pub ashift: u32,
    /// Byte offset of the I/O within the vdev
    pub offset: u64,
    /// Number of data columns
    pub dcols: usize,
    /// Size of the data in bytes
    pub dsize: usize,
    /// Build maps for a vdev one child wider than the logical width
    pub expanded: bool,
    /// Reflow progress of an expansion, `None` when not reflowing
    pub reflow_offset: Option<u64>,
    pub sweep: bool,
    /// Stop the sweep after this long
    pub sweep_timeout: Option<Duration>,
    pub benchmark: bool,
    /// Skip the operation under test so every check must fail
    pub sanity: bool,
    /// Attach gdb when the process faults
    pub gdb: bool,
    pub verbosity: Verbosity,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            ashift: 9,
            offset: 1 << 12,
            dcols: 8,
            dsize: 1 << 19,
            expanded: false,
            reflow_offset: None,
            sweep: false,
            sweep_timeout: None,
            benchmark: false,
            sanity: false,
            gdb: false,
            verbosity: Verbosity::Quiet,
        }
    }
}

impl TestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build options from parsed `raidz_test` arguments, clamping every value
    /// into its supported range
    pub fn from_args(matches: &clap::ArgMatches) -> Self {
        let mut opts = Self::default();

        if let Some(&v) = matches.get_one::<u64>("ashift") {
            opts.ashift = clamp_ashift(v);
        }
        if let Some(&v) = matches.get_one::<u64>("offset") {
            opts.offset = offset_from_shift(v);
        }
        if let Some(&v) = matches.get_one::<u64>("dcols") {
            opts.dcols = (v as usize).clamp(1, MAX_DCOLS);
        }
        if let Some(&v) = matches.get_one::<u64>("size") {
            opts.dsize = 1usize << (v.clamp(MIN_SIZE_SHIFT as u64, MAX_SIZE_SHIFT as u64));
        }
        if let Some(&v) = matches.get_one::<u64>("reflow") {
            opts.reflow_offset = Some(v);
        }
        if let Some(&v) = matches.get_one::<u64>("timeout") {
            opts.sweep_timeout = Some(Duration::from_secs(v));
        }

        opts.expanded = matches.get_flag("expanded");
        opts.sweep = matches.get_flag("sweep");
        opts.benchmark = matches.get_flag("benchmark");
        opts.sanity = matches.get_flag("sanity");
        opts.gdb = matches.get_flag("gdb");
        opts.verbosity = Verbosity::from_count(matches.get_count("verbose"));
        opts
    }

    /// Data columns plus parity for a map with `nparity`
    pub fn total_cols(&self, nparity: usize) -> usize {
        self.dcols + nparity
    }

    /// Physical and logical widths of a map with `nparity`
    pub fn widths(&self, nparity: usize) -> (usize, usize) {
        let logical = self.total_cols(nparity);
        if self.expanded {
            (logical + 1, logical)
        } else {
            (logical, logical)
        }
    }
}

fn clamp_ashift(v: u64) -> u32 {
    v.clamp(MIN_ASHIFT as u64, MAX_TEST_ASHIFT as u64) as u32
}

/// `1 << v` rounded down to a 512-byte multiple
fn offset_from_shift(v: u64) -> u64 {
    ((1u64 << v.min(MAX_OFFSET_SHIFT as u64)) >> 9) << 9
}

/// Exponent shown for a power-of-two quantity
pub fn ilog2(v: u64) -> u32 {
    v.checked_ilog2().unwrap_or(0)
}
