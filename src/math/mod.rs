//! RAID-Z parity generation and reconstruction
//!
//! Every backend shares the same algorithms and differs only in the
//! [`GfKernel`] that runs the byte-level inner loops. [`RaidzImpl`] is generic
//! over the kernel, so each backend is monomorphized and the registry only
//! pays for one dynamic call per map operation.
//!
//! ## Parity
//!
//! For a row with `n` columns and parity count `np`, data column `c`
//! (`np <= c < n`) contributes with coefficient `g^(n-1-c)` where `g` is 1
//! for P, 2 for Q and 4 for R. Parity is computed by Horner's rule: the
//! accumulator is multiplied by `g` before each data column is added. A data
//! column shorter than the parity column contributes zeros for its tail.
//!
//! ## Reconstruction
//!
//! Missing data columns are solved from the syndromes of the valid parity
//! columns. Depending on which parity is valid one of seven variants is
//! chosen:
//!
//! | missing data | preference          |
//! |--------------|---------------------|
//! | 1            | `rec_p`, `rec_q`, `rec_r` |
//! | 2            | `rec_pq`, `rec_pr`, `rec_qr` |
//! | 3            | `rec_pqr`           |
//!
//! Single-column variants use the closed form `D = S * g^-(n-1-x)`;
//! the others invert the coefficient sub-matrix ([`matrix::RecMatrix`]).

pub mod matrix;
pub mod scalar;
pub mod simd;

use crate::abd::Abd;
use crate::error::{RaidzError, Result};
use crate::galois;
use crate::map::{column_slice, column_slice_mut, ColumnData, ColumnError, RaidzMap, RaidzRow};
use crate::registry::ImplRegistry;
use log::{debug, trace};
use matrix::{parity_coefficient, RecMatrix, PARITY_GENERATORS};
use smallvec::SmallVec;

/// Parity generation method names, indexed by parity count - 1
pub const GEN_NAMES: [&str; 3] = ["gen_p", "gen_pq", "gen_pqr"];

/// Reconstruction method names in [`RecVariant::ALL`] order
pub const REC_NAMES: [&str; 7] = [
    "rec_p", "rec_q", "rec_r", "rec_pq", "rec_pr", "rec_qr", "rec_pqr",
];

pub const CODE_P: u8 = 1 << 0;
pub const CODE_Q: u8 = 1 << 1;
pub const CODE_R: u8 = 1 << 2;

/// Byte-level inner loops of a backend
///
/// A kernel value can only be obtained through [`GfKernel::detect`], which
/// returns `None` when the running CPU lacks the required features. Holding
/// a kernel is therefore proof that its instructions are usable.
pub trait GfKernel: Copy + Send + Sync + std::fmt::Debug + 'static {
    /// Backend name as used for selection
    const NAME: &'static str;

    fn detect() -> Option<Self>;

    /// `dst ^= src` over the common length
    fn xor_acc(&self, dst: &mut [u8], src: &[u8]);

    /// `dst ^= coeff * src` over the common length
    fn mul_acc(&self, dst: &mut [u8], src: &[u8], coeff: u8);

    /// `buf = coeff * buf`
    fn scale(&self, buf: &mut [u8], coeff: u8);
}

/// One of the seven reconstruction methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecVariant {
    P,
    Q,
    R,
    Pq,
    Pr,
    Qr,
    Pqr,
}

impl RecVariant {
    pub const ALL: [RecVariant; 7] = [
        RecVariant::P,
        RecVariant::Q,
        RecVariant::R,
        RecVariant::Pq,
        RecVariant::Pr,
        RecVariant::Qr,
        RecVariant::Pqr,
    ];

    pub fn name(self) -> &'static str {
        REC_NAMES[self as usize]
    }

    /// Parity columns used, as indices 0 (P), 1 (Q), 2 (R)
    pub fn parities(self) -> &'static [usize] {
        match self {
            RecVariant::P => &[0],
            RecVariant::Q => &[1],
            RecVariant::R => &[2],
            RecVariant::Pq => &[0, 1],
            RecVariant::Pr => &[0, 2],
            RecVariant::Qr => &[1, 2],
            RecVariant::Pqr => &[0, 1, 2],
        }
    }

    /// Bitmask of parity used
    pub fn code(self) -> u8 {
        self.parities().iter().fold(0, |acc, &p| acc | (1 << p))
    }

    /// Highest parity count this method needs in the map
    pub fn min_parity(self) -> usize {
        self.parities().iter().max().map_or(1, |&p| p + 1)
    }

    /// Pick a method for `nbaddata` missing data columns
    pub fn select(nparity: usize, parity_valid: &[bool], nbaddata: usize) -> Option<Self> {
        let valid = |p: usize| p < nparity && parity_valid.get(p).copied().unwrap_or(false);
        let (p, q, r) = (valid(0), valid(1), valid(2));
        match nbaddata {
            1 if p => Some(RecVariant::P),
            1 if q => Some(RecVariant::Q),
            1 if r => Some(RecVariant::R),
            2 if p && q => Some(RecVariant::Pq),
            2 if p && r => Some(RecVariant::Pr),
            2 if q && r => Some(RecVariant::Qr),
            3 if p && q && r => Some(RecVariant::Pqr),
            _ => None,
        }
    }

    /// Reconstruction targets that force this method on a triple-parity row
    ///
    /// Parity columns listed here are treated as missing so that the method
    /// has to fall back to the remaining ones; data targets are filled in by
    /// the caller.
    pub fn parity_targets(self) -> &'static [usize] {
        match self {
            RecVariant::P => &[1, 2],
            RecVariant::Q => &[0, 2],
            RecVariant::R => &[0, 1],
            RecVariant::Pq => &[2],
            RecVariant::Pr => &[1],
            RecVariant::Qr => &[0],
            RecVariant::Pqr => &[],
        }
    }
}

impl std::fmt::Display for RecVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-row result of a reconstruction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconstructOutcome {
    /// Method used by each row; `None` when no data column was missing
    pub rows: SmallVec<[Option<RecVariant>; 4]>,
}

impl ReconstructOutcome {
    /// Union of parity used across all rows
    pub fn code(&self) -> u8 {
        self.rows.iter().flatten().fold(0, |acc, v| acc | v.code())
    }

    /// Method that solved the most columns in any row
    pub fn variant(&self) -> Option<RecVariant> {
        self.rows
            .iter()
            .flatten()
            .copied()
            .max_by_key(|v| (v.parities().len(), *v as usize))
    }
}

/// Backend-independent map operations, object-safe for the registry
pub trait RaidzOps: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Compute every parity column of every row
    fn generate(&self, map: &mut RaidzMap<'_>) -> Result<()>;

    /// Restore `targets` plus any columns flagged with an error
    fn reconstruct(&self, map: &mut RaidzMap<'_>, targets: &[usize]) -> Result<ReconstructOutcome>;

    /// Regenerate parity and flag read parity columns that disagree
    fn verify_parity(&self, map: &mut RaidzMap<'_>) -> Result<usize>;
}

/// Generic backend built on one kernel
#[derive(Debug, Clone, Copy)]
pub struct RaidzImpl<K: GfKernel> {
    kernel: K,
}

impl<K: GfKernel> RaidzImpl<K> {
    /// `None` if the kernel is not usable on this CPU
    pub fn new() -> Option<Self> {
        K::detect().map(|kernel| Self { kernel })
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }
}

/// Accumulate parity `parity` of `rr` into `acc`, treating `skip` as zero
fn syndrome<K: GfKernel>(
    k: &K,
    io: &[u8],
    rr: &RaidzRow,
    parity: usize,
    skip: &[usize],
    acc: &mut [u8],
) {
    acc.fill(0);
    let g = PARITY_GENERATORS[parity];
    for c in rr.firstdatacol..rr.cols {
        if g != 1 {
            k.scale(acc, g);
        }
        if skip.contains(&c) {
            continue;
        }
        let d = column_slice(io, &rr.columns[c]);
        let n = d.len().min(acc.len());
        k.xor_acc(&mut acc[..n], &d[..n]);
    }
}

fn take_parity(rr: &mut RaidzRow, p: usize) -> Result<Abd> {
    let size = rr.columns[p].size;
    match std::mem::replace(&mut rr.columns[p].data, ColumnData::Empty) {
        ColumnData::Owned(abd) if abd.len() == size => Ok(abd),
        _ => Abd::alloc(size),
    }
}

fn regenerate_parity<K: GfKernel>(k: &K, io: &[u8], rr: &mut RaidzRow, p: usize) -> Result<()> {
    let mut buf = take_parity(rr, p)?;
    syndrome(k, io, rr, p, &[], buf.as_mut_slice());
    rr.columns[p].data = ColumnData::Owned(buf);
    Ok(())
}

/// Which columns of a row are missing and how they will be solved
#[derive(Debug, Clone, PartialEq, Eq)]
struct RowPlan {
    bad_parity: SmallVec<[usize; 3]>,
    bad_data: SmallVec<[usize; 3]>,
    variant: Option<RecVariant>,
}

fn plan_row(rr: &RaidzRow, targets: &[usize]) -> Result<RowPlan> {
    let np = rr.firstdatacol;
    let mut parity_valid = [false; 3];
    let mut bad_parity = SmallVec::new();
    let mut bad_data: SmallVec<[usize; 3]> = SmallVec::new();

    for c in 0..rr.cols {
        let missing = targets.binary_search(&c).is_ok() || rr.columns[c].error.is_some();
        if c < np {
            if missing {
                bad_parity.push(c);
            } else {
                parity_valid[c] = true;
            }
        } else if missing {
            bad_data.push(c);
        }
    }

    let variant = if bad_data.is_empty() {
        None
    } else {
        let available = parity_valid.iter().filter(|&&v| v).count();
        Some(
            RecVariant::select(np, &parity_valid, bad_data.len()).ok_or(
                RaidzError::InsufficientParity {
                    missing: bad_data.len(),
                    available,
                },
            )?,
        )
    };

    Ok(RowPlan {
        bad_parity,
        bad_data,
        variant,
    })
}

fn solve_row<K: GfKernel>(k: &K, io: &mut [u8], rr: &mut RaidzRow, plan: &RowPlan) -> Result<()> {
    if let Some(variant) = plan.variant {
        let parities = variant.parities();
        let psize = rr.parity_size();
        let ncols = rr.cols;

        let mut syndromes: SmallVec<[Abd; 3]> = SmallVec::new();
        for &p in parities {
            let mut s = Abd::alloc(psize)?;
            syndrome(k, io, rr, p, &plan.bad_data, s.as_mut_slice());
            k.xor_acc(s.as_mut_slice(), column_slice(io, &rr.columns[p]));
            syndromes.push(s);
        }

        let inverse = if parities.len() == 1 {
            let mut m = RecMatrix::zero(1);
            let coeff = parity_coefficient(parities[0], plan.bad_data[0], ncols);
            m.set(0, 0, galois::Gf256::new(galois::inv(coeff)));
            m
        } else {
            RecMatrix::for_targets(parities, &plan.bad_data, ncols)
                .invert()
                .ok_or_else(|| {
                    RaidzError::InvalidGeometry(format!(
                        "singular reconstruction matrix for columns {:?} of {}",
                        plan.bad_data, ncols
                    ))
                })?
        };

        // Solve into scratch so the I/O buffer is only written once per target
        let mut solved: SmallVec<[Abd; 3]> = SmallVec::new();
        for j in 0..plan.bad_data.len() {
            let mut out = Abd::alloc(psize)?;
            for (i, s) in syndromes.iter().enumerate() {
                k.mul_acc(out.as_mut_slice(), s.as_slice(), inverse.get(j, i).value());
            }
            solved.push(out);
        }

        for (&c, out) in plan.bad_data.iter().zip(&solved) {
            let dst = column_slice_mut(io, &mut rr.columns[c]);
            let n = dst.len();
            dst.copy_from_slice(&out.as_slice()[..n]);
            trace!("restored column {} ({} bytes) with {}", c, n, variant);
        }
    }

    for &p in &plan.bad_parity {
        regenerate_parity(k, io, rr, p)?;
    }
    Ok(())
}

fn normalize_targets(map: &RaidzMap<'_>, targets: &[usize]) -> Result<SmallVec<[usize; 4]>> {
    let mut sorted: SmallVec<[usize; 4]> = targets.iter().copied().collect();
    sorted.sort_unstable();
    sorted.dedup();
    for rr in map.rows() {
        if let Some(&bad) = sorted.iter().find(|&&t| t >= rr.cols) {
            return Err(RaidzError::InvalidTarget {
                index: bad,
                cols: rr.cols,
            });
        }
    }
    Ok(sorted)
}

impl<K: GfKernel> RaidzOps for RaidzImpl<K> {
    fn name(&self) -> &'static str {
        K::NAME
    }

    fn generate(&self, map: &mut RaidzMap<'_>) -> Result<()> {
        let (io, rows) = map.split_mut();
        for rr in rows.iter_mut() {
            for p in 0..rr.firstdatacol {
                regenerate_parity(&self.kernel, io, rr, p)?;
            }
        }
        Ok(())
    }

    fn reconstruct(&self, map: &mut RaidzMap<'_>, targets: &[usize]) -> Result<ReconstructOutcome> {
        let targets = normalize_targets(map, targets)?;

        // Plan every row first so that a failure leaves the map untouched
        let plans = map
            .rows()
            .iter()
            .map(|rr| plan_row(rr, &targets))
            .collect::<Result<Vec<_>>>()?;

        let (io, rows) = map.split_mut();
        let mut outcome = ReconstructOutcome::default();
        for (i, (rr, plan)) in rows.iter_mut().zip(&plans).enumerate() {
            if let Some(v) = plan.variant {
                debug!(
                    "{}: row {} {} data {:?} parity {:?}",
                    K::NAME,
                    i,
                    v,
                    plan.bad_data,
                    plan.bad_parity
                );
            }
            solve_row(&self.kernel, io, rr, plan)?;
            outcome.rows.push(plan.variant);
        }
        Ok(outcome)
    }

    fn verify_parity(&self, map: &mut RaidzMap<'_>) -> Result<usize> {
        let (io, rows) = map.split_mut();
        let mut mismatches = 0;
        for rr in rows.iter_mut() {
            for p in 0..rr.firstdatacol {
                let read = rr.columns[p].tried && rr.columns[p].error.is_none();
                let orig = read.then(|| column_slice(io, &rr.columns[p]).to_vec());
                regenerate_parity(&self.kernel, io, rr, p)?;
                if let Some(orig) = orig {
                    if column_slice(io, &rr.columns[p]) != orig.as_slice() {
                        rr.columns[p].error = Some(ColumnError::Checksum);
                        mismatches += 1;
                    }
                }
            }
        }
        if mismatches > 0 {
            debug!("{}: {} parity columns failed verification", K::NAME, mismatches);
        }
        Ok(mismatches)
    }
}

/// Generate parity with the process-wide selection
pub fn generate(map: &mut RaidzMap<'_>) -> Result<()> {
    ImplRegistry::global().ops().generate(map)
}

/// Reconstruct with the process-wide selection
pub fn reconstruct(map: &mut RaidzMap<'_>, targets: &[usize]) -> Result<ReconstructOutcome> {
    ImplRegistry::global().ops().reconstruct(map, targets)
}

/// Verify parity with the process-wide selection
pub fn verify_parity(map: &mut RaidzMap<'_>) -> Result<usize> {
    ImplRegistry::global().ops().verify_parity(map)
}
