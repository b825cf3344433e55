//! RAID-Z erasure coding
//!
//! Lays out one logical I/O across data and parity columns
//! ([`map::RaidzMap`]), computes single, double or triple parity over
//! GF(2^8) and reconstructs up to three missing columns. Several backends
//! ([`registry::ImplRegistry`]) implement the same math with different
//! kernels and must produce identical bytes.

pub mod abd;
pub mod args;
pub mod config;
pub mod error;
pub mod galois;
pub mod harness;
pub mod map;
pub mod math;
pub mod registry;
pub mod reporters;

pub use abd::Abd;
pub use args::parse_args;
pub use config::{RaidzConfig, TestOptions};
pub use error::{RaidzError, Result};
pub use map::{raidz_asize, RaidzCol, RaidzMap, RaidzRow};
pub use math::{generate, reconstruct, verify_parity, RaidzOps, ReconstructOutcome, RecVariant};
pub use registry::ImplRegistry;
