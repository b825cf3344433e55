//! Portable kernels
//!
//! - [`OriginalKernel`] works one byte at a time through the log/exp tables.
//!   It is the reference every other backend is compared against.
//! - [`ScalarKernel`] multiplies eight bytes at once by 2 or 4 inside a
//!   `u64` (SWAR), which covers all of Horner's rule for Q and R. Other
//!   coefficients go through a 256-entry product table.

use super::GfKernel;
use crate::galois;

const MASK_HIGH: u64 = 0x8080_8080_8080_8080;
const MASK_SHIFTED: u64 = 0xFEFE_FEFE_FEFE_FEFE;
const POLY_LOW: u64 = 0x1D1D_1D1D_1D1D_1D1D;

/// Multiply all eight bytes of `x` by 2
#[inline(always)]
pub fn mul2_u64(x: u64) -> u64 {
    let mask = x & MASK_HIGH;
    // 0xFF in every byte whose top bit was set
    let mask = (mask << 1).wrapping_sub(mask >> 7);
    ((x << 1) & MASK_SHIFTED) ^ (mask & POLY_LOW)
}

/// Multiply all eight bytes of `x` by 4
#[inline(always)]
pub fn mul4_u64(x: u64) -> u64 {
    mul2_u64(mul2_u64(x))
}

/// `dst ^= table[src]` byte by byte
#[inline]
pub fn mul_acc_table(dst: &mut [u8], src: &[u8], table: &[u8; 256]) {
    for (d, &s) in dst.iter_mut().zip(src) {
        *d ^= table[s as usize];
    }
}

/// `buf = table[buf]` byte by byte
#[inline]
pub fn scale_table(buf: &mut [u8], table: &[u8; 256]) {
    for b in buf.iter_mut() {
        *b = table[*b as usize];
    }
}

/// Byte-wise log/exp reference kernel
#[derive(Debug, Clone, Copy, Default)]
pub struct OriginalKernel;

impl GfKernel for OriginalKernel {
    const NAME: &'static str = "original";

    fn detect() -> Option<Self> {
        Some(Self)
    }

    fn xor_acc(&self, dst: &mut [u8], src: &[u8]) {
        for (d, &s) in dst.iter_mut().zip(src) {
            *d ^= s;
        }
    }

    fn mul_acc(&self, dst: &mut [u8], src: &[u8], coeff: u8) {
        if coeff == 0 {
            return;
        }
        for (d, &s) in dst.iter_mut().zip(src) {
            *d ^= galois::mul(coeff, s);
        }
    }

    fn scale(&self, buf: &mut [u8], coeff: u8) {
        for b in buf.iter_mut() {
            *b = galois::mul(coeff, *b);
        }
    }
}

/// 64-bit SWAR kernel
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarKernel;

impl ScalarKernel {
    #[inline(always)]
    fn map_words(buf: &mut [u8], word: impl Fn(u64) -> u64, byte: impl Fn(u8) -> u8) {
        let (prefix, words, suffix) = bytemuck::pod_align_to_mut::<u8, u64>(buf);
        for b in prefix.iter_mut() {
            *b = byte(*b);
        }
        for w in words.iter_mut() {
            *w = word(*w);
        }
        for b in suffix.iter_mut() {
            *b = byte(*b);
        }
    }

    #[inline(always)]
    fn zip_words(
        dst: &mut [u8],
        src: &[u8],
        word: impl Fn(u64) -> u64,
        byte: impl Fn(u8) -> u8,
    ) {
        let len = dst.len().min(src.len());
        let mut dchunks = dst[..len].chunks_exact_mut(8);
        let mut schunks = src[..len].chunks_exact(8);
        for (d, s) in (&mut dchunks).zip(&mut schunks) {
            let v = bytemuck::pod_read_unaligned::<u64>(d) ^ word(bytemuck::pod_read_unaligned::<u64>(s));
            d.copy_from_slice(bytemuck::bytes_of(&v));
        }
        for (d, &s) in dchunks.into_remainder().iter_mut().zip(schunks.remainder()) {
            *d ^= byte(s);
        }
    }
}

impl GfKernel for ScalarKernel {
    const NAME: &'static str = "scalar";

    fn detect() -> Option<Self> {
        Some(Self)
    }

    fn xor_acc(&self, dst: &mut [u8], src: &[u8]) {
        Self::zip_words(dst, src, |w| w, |b| b);
    }

    fn mul_acc(&self, dst: &mut [u8], src: &[u8], coeff: u8) {
        match coeff {
            0 => {}
            1 => self.xor_acc(dst, src),
            2 => Self::zip_words(dst, src, mul2_u64, galois::mul2),
            4 => Self::zip_words(dst, src, mul4_u64, galois::mul4),
            _ => mul_acc_table(dst, src, &galois::mul_table(coeff)),
        }
    }

    fn scale(&self, buf: &mut [u8], coeff: u8) {
        match coeff {
            1 => {}
            2 => Self::map_words(buf, mul2_u64, galois::mul2),
            4 => Self::map_words(buf, mul4_u64, galois::mul4),
            _ => scale_table(buf, &galois::mul_table(coeff)),
        }
    }
}
