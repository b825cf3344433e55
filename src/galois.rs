//! Galois Field GF(2^8) arithmetic for RAID-Z parity
//!
//! ## Field polynomial
//!
//! RAID-Z computes parity over GF(2^8) generated by the primitive polynomial
//! **0x11D** (x⁸ + x⁴ + x³ + x² + 1) with generator 2. The polynomial is part of
//! the on-disk format: every Q and R parity sector ever written depends on it.
//!
//! - addition (and subtraction) is XOR
//! - `A * 2` is `(A << 1) ^ (A & 0x80 ? 0x1D : 0)`
//! - `A * B = 2^(log2 A + log2 B)` using the tables below
//! - `A^-1 = 2^(255 - log2 A)`
//!
//! The exp/log tables are built at compile time.

use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub, SubAssign};

/// RAID-Z GF(2^8) primitive polynomial: 0x11D (x⁸ + x⁴ + x³ + x² + 1)
pub const RAIDZ_POLY: u16 = 0x11D;

/// Number of non-zero field elements
pub const GF_ORDER: usize = 255;

const fn build_exp_table() -> [u8; 512] {
    let mut table = [0u8; 512];
    let mut b: u16 = 1;
    let mut i = 0;
    while i < GF_ORDER {
        table[i] = b as u8;
        table[i + GF_ORDER] = b as u8;
        b <<= 1;
        if b & 0x100 != 0 {
            b ^= RAIDZ_POLY;
        }
        i += 1;
    }
    // Entries 510 and 511 are never reached by log sums (max 254 + 254)
    table[510] = table[0];
    table[511] = table[1];
    table
}

const fn build_log_table(exp: &[u8; 512]) -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < GF_ORDER {
        table[exp[i] as usize] = i as u8;
        i += 1;
    }
    table
}

/// Powers of 2, doubled so that `EXP[log a + log b]` needs no modulo
pub static EXP: [u8; 512] = build_exp_table();

/// Discrete logarithm base 2; `LOG[0]` is meaningless and never consulted
pub static LOG: [u8; 256] = build_log_table(&EXP);

/// Multiply by 2 without tables
#[inline(always)]
pub const fn mul2(a: u8) -> u8 {
    (a << 1) ^ if a & 0x80 != 0 { 0x1D } else { 0 }
}

/// Multiply by 4 without tables
#[inline(always)]
pub const fn mul4(a: u8) -> u8 {
    mul2(mul2(a))
}

#[inline]
pub fn add(a: u8, b: u8) -> u8 {
    a ^ b
}

#[inline]
pub fn mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    EXP[LOG[a as usize] as usize + LOG[b as usize] as usize]
}

/// Multiplicative inverse; `inv(0)` is defined as 0
#[inline]
pub fn inv(a: u8) -> u8 {
    if a == 0 {
        return 0;
    }
    EXP[GF_ORDER - LOG[a as usize] as usize]
}

#[inline]
pub fn div(a: u8, b: u8) -> u8 {
    assert!(b != 0, "Division by zero in GF(2^8)");
    mul(a, inv(b))
}

/// `2^e` for any exponent
#[inline]
pub fn exp2(e: usize) -> u8 {
    EXP[e % GF_ORDER]
}

/// `4^e` for any exponent
#[inline]
pub fn exp4(e: usize) -> u8 {
    EXP[(2 * e) % GF_ORDER]
}

/// Full 256-entry product table for a coefficient: `table[x] = c * x`
pub fn mul_table(coeff: u8) -> [u8; 256] {
    let mut table = [0u8; 256];
    if coeff == 0 {
        return table;
    }
    let log_c = LOG[coeff as usize] as usize;
    for (x, slot) in table.iter_mut().enumerate().skip(1) {
        *slot = EXP[LOG[x] as usize + log_c];
    }
    table
}

/// Split-nibble tables for PSHUFB/TBL style lookups
///
/// `low[n] = c * n` and `high[n] = c * (n << 4)`, so that
/// `c * x = low[x & 0xF] ^ high[x >> 4]`.
pub fn nibble_tables(coeff: u8) -> ([u8; 16], [u8; 16]) {
    let mut low = [0u8; 16];
    let mut high = [0u8; 16];
    for n in 0..16u8 {
        low[n as usize] = mul(coeff, n);
        high[n as usize] = mul(coeff, n << 4);
    }
    (low, high)
}

/// GF(2^8) element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Gf256 {
    value: u8,
}

impl Gf256 {
    pub const ZERO: Self = Self { value: 0 };
    pub const ONE: Self = Self { value: 1 };

    pub const fn new(value: u8) -> Self {
        Self { value }
    }

    pub const fn value(self) -> u8 {
        self.value
    }

    pub fn is_zero(self) -> bool {
        self.value == 0
    }

    pub fn inv(self) -> Self {
        assert!(self.value != 0, "Inverse of zero in GF(2^8)");
        Self::new(inv(self.value))
    }

    pub fn pow(self, exponent: usize) -> Self {
        if exponent == 0 {
            return Self::ONE;
        }
        if self.value == 0 {
            return Self::ZERO;
        }
        let l = LOG[self.value as usize] as usize;
        Self::new(EXP[(l * (exponent % GF_ORDER)) % GF_ORDER])
    }

    pub fn log(self) -> u8 {
        LOG[self.value as usize]
    }
}

impl Add for Gf256 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.value ^ rhs.value)
    }
}

impl AddAssign for Gf256 {
    fn add_assign(&mut self, rhs: Self) {
        self.value ^= rhs.value;
    }
}

impl Sub for Gf256 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.value ^ rhs.value)
    }
}

impl SubAssign for Gf256 {
    fn sub_assign(&mut self, rhs: Self) {
        self.value ^= rhs.value;
    }
}

impl Mul for Gf256 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self::new(mul(self.value, rhs.value))
    }
}

impl MulAssign for Gf256 {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Div for Gf256 {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Self::new(div(self.value, rhs.value))
    }
}

impl DivAssign for Gf256 {
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

impl From<u8> for Gf256 {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

impl From<Gf256> for u8 {
    fn from(val: Gf256) -> Self {
        val.value
    }
}

impl std::fmt::Display for Gf256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#04x}", self.value)
    }
}
