//! Error types for RAID-Z map construction and parity math

use thiserror::Error;

/// Errors that can occur while building or operating on a RAID-Z map
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RaidzError {
    /// A row, column or scratch buffer could not be allocated
    #[error("Out of memory allocating {bytes} bytes for RAID-Z map")]
    OutOfMemory { bytes: usize },

    /// The requested geometry cannot describe a valid map
    #[error("Invalid RAID-Z geometry: {0}")]
    InvalidGeometry(String),

    /// Parity count outside of 1..=3
    #[error("Invalid RAID-Z parity count {0} (expected 1, 2 or 3)")]
    InvalidParity(usize),

    /// Reconstruction target outside of the row
    #[error("Reconstruction target {index} out of range for row with {cols} columns")]
    InvalidTarget { index: usize, cols: usize },

    /// More missing data columns than readable parity columns
    #[error(
        "Cannot reconstruct: {missing} missing data columns but only {available} valid parity columns"
    )]
    InsufficientParity { missing: usize, available: usize },

    /// Unknown or unsupported math implementation name
    #[error("RAID-Z implementation not supported: {0:?}")]
    NotSupported(String),
}

/// Result type for RAID-Z operations
pub type Result<T> = std::result::Result<T, RaidzError>;
