//! Small coefficient matrices for multi-column reconstruction
//!
//! Reconstructing `k` missing data columns from `k` parity syndromes needs
//! the inverse of a `k x k` matrix whose entry `(i, j)` is the coefficient
//! parity `i` applies to target column `j`. With at most three parity
//! columns the matrices stay tiny, so they live on the stack.

use crate::galois::{self, Gf256};
use crate::map::RAIDZ_MAXPARITY;

/// Generator of each parity column: P = 1, Q = 2, R = 4
pub const PARITY_GENERATORS: [u8; RAIDZ_MAXPARITY] = [1, 2, 4];

/// Coefficient parity `parity` applies to absolute column `col` of a row
/// with `ncols` columns
///
/// The last data column always has coefficient 1; each column before it is
/// multiplied by the generator once more.
pub fn parity_coefficient(parity: usize, col: usize, ncols: usize) -> u8 {
    let exponent = ncols - 1 - col;
    match parity {
        0 => 1,
        1 => galois::exp2(exponent),
        _ => galois::exp4(exponent),
    }
}

/// Square matrix of dimension `n <= 3` over GF(2^8)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecMatrix {
    n: usize,
    data: [[Gf256; RAIDZ_MAXPARITY]; RAIDZ_MAXPARITY],
}

impl RecMatrix {
    /// Zero matrix of dimension `n`
    pub fn zero(n: usize) -> Self {
        assert!(n <= RAIDZ_MAXPARITY, "matrix dimension {} too large", n);
        Self {
            n,
            data: [[Gf256::ZERO; RAIDZ_MAXPARITY]; RAIDZ_MAXPARITY],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zero(n);
        for i in 0..n {
            m.data[i][i] = Gf256::ONE;
        }
        m
    }

    /// Coefficient matrix for solving `targets` with the given `parities`
    ///
    /// Row `i` belongs to `parities[i]`, column `j` to `targets[j]`.
    pub fn for_targets(parities: &[usize], targets: &[usize], ncols: usize) -> Self {
        debug_assert_eq!(parities.len(), targets.len());
        let mut m = Self::zero(parities.len());
        for (i, &p) in parities.iter().enumerate() {
            for (j, &t) in targets.iter().enumerate() {
                m.data[i][j] = Gf256::new(parity_coefficient(p, t, ncols));
            }
        }
        m
    }

    pub fn dim(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Gf256 {
        self.data[row][col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: Gf256) {
        self.data[row][col] = value;
    }

    /// Invert by Gauss-Jordan elimination; `None` if singular
    pub fn invert(&self) -> Option<Self> {
        let n = self.n;
        let mut work = *self;
        let mut inv = Self::identity(n);

        for col in 0..n {
            let pivot = (col..n).find(|&r| !work.data[r][col].is_zero())?;
            if pivot != col {
                work.data.swap(pivot, col);
                inv.data.swap(pivot, col);
            }

            let scale = work.data[col][col].inv();
            for j in 0..n {
                work.data[col][j] *= scale;
                inv.data[col][j] *= scale;
            }

            for r in 0..n {
                if r == col {
                    continue;
                }
                let factor = work.data[r][col];
                if factor.is_zero() {
                    continue;
                }
                for j in 0..n {
                    let w = work.data[col][j];
                    let v = inv.data[col][j];
                    work.data[r][j] -= factor * w;
                    inv.data[r][j] -= factor * v;
                }
            }
        }

        Some(inv)
    }

    pub fn multiply(&self, other: &Self) -> Self {
        assert_eq!(self.n, other.n, "dimension mismatch");
        let mut out = Self::zero(self.n);
        for i in 0..self.n {
            for j in 0..self.n {
                let mut acc = Gf256::ZERO;
                for k in 0..self.n {
                    acc += self.data[i][k] * other.data[k][j];
                }
                out.data[i][j] = acc;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_data_column_has_unit_coefficient() {
        for p in 0..3 {
            assert_eq!(parity_coefficient(p, 9, 10), 1);
        }
        assert_eq!(parity_coefficient(1, 7, 10), 4);
        assert_eq!(parity_coefficient(2, 7, 10), 16);
    }

    #[test]
    fn inverse_of_every_pqr_combination() {
        let ncols = 16;
        for a in 3..ncols {
            for b in (a + 1)..ncols {
                for c in (b + 1)..ncols {
                    let m = RecMatrix::for_targets(&[0, 1, 2], &[a, b, c], ncols);
                    let inv = m.invert().expect("PQR matrix must be invertible");
                    assert_eq!(m.multiply(&inv), RecMatrix::identity(3));
                }
            }
        }
    }

    #[test]
    fn two_by_two_pairs_invert() {
        for parities in [[0usize, 1], [0, 2], [1, 2]] {
            let m = RecMatrix::for_targets(&parities, &[4, 9], 12);
            let inv = m.invert().unwrap();
            assert_eq!(inv.multiply(&m), RecMatrix::identity(2));
        }
    }

    #[test]
    fn singular_matrix_is_rejected() {
        let mut m = RecMatrix::zero(2);
        m.set(0, 0, Gf256::new(3));
        m.set(0, 1, Gf256::new(5));
        m.set(1, 0, Gf256::new(3));
        m.set(1, 1, Gf256::new(5));
        assert!(m.invert().is_none());
    }
}
