//! ARM NEON GF(2^8) kernels
//!
//! Same split-nibble technique as the x86 PSHUFB kernels, using the
//! `vqtbl1q_u8` table lookup. Processes 16 bytes per iteration.

#[cfg(target_arch = "aarch64")]
use crate::galois;

#[cfg(target_arch = "aarch64")]
use std::arch::aarch64::*;

/// XOR `src` into `dst`
///
/// # Safety
/// Requires NEON.
#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
pub unsafe fn xor_acc_neon(dst: &mut [u8], src: &[u8]) {
    let len = dst.len().min(src.len());
    let end = len - len % 16;
    let mut pos = 0;
    while pos < end {
        let s = vld1q_u8(src.as_ptr().add(pos));
        let d = vld1q_u8(dst.as_ptr().add(pos));
        vst1q_u8(dst.as_mut_ptr().add(pos), veorq_u8(d, s));
        pos += 16;
    }
    for i in end..len {
        dst[i] ^= src[i];
    }
}

/// `dst ^= coeff * src`
///
/// # Safety
/// Requires NEON. `dst` and `src` must not overlap.
#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
pub unsafe fn mul_acc_neon(dst: &mut [u8], src: &[u8], coeff: u8) {
    let len = dst.len().min(src.len());
    let (low_tbl, high_tbl) = galois::nibble_tables(coeff);
    let low_v = vld1q_u8(low_tbl.as_ptr());
    let high_v = vld1q_u8(high_tbl.as_ptr());
    let mask = vdupq_n_u8(0x0F);

    let end = len - len % 16;
    let mut pos = 0;
    while pos < end {
        let s = vld1q_u8(src.as_ptr().add(pos));
        let d = vld1q_u8(dst.as_ptr().add(pos));
        let lo = vandq_u8(s, mask);
        let hi = vshrq_n_u8::<4>(s);
        let p = veorq_u8(vqtbl1q_u8(low_v, lo), vqtbl1q_u8(high_v, hi));
        vst1q_u8(dst.as_mut_ptr().add(pos), veorq_u8(d, p));
        pos += 16;
    }
    for i in end..len {
        dst[i] ^= low_tbl[(src[i] & 0x0F) as usize] ^ high_tbl[(src[i] >> 4) as usize];
    }
}

/// `buf = coeff * buf`
///
/// # Safety
/// Requires NEON.
#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
pub unsafe fn scale_neon(buf: &mut [u8], coeff: u8) {
    let len = buf.len();
    let (low_tbl, high_tbl) = galois::nibble_tables(coeff);
    let low_v = vld1q_u8(low_tbl.as_ptr());
    let high_v = vld1q_u8(high_tbl.as_ptr());
    let mask = vdupq_n_u8(0x0F);

    let end = len - len % 16;
    let mut pos = 0;
    while pos < end {
        let ptr = buf.as_mut_ptr().add(pos);
        let s = vld1q_u8(ptr);
        let lo = vandq_u8(s, mask);
        let hi = vshrq_n_u8::<4>(s);
        vst1q_u8(ptr, veorq_u8(vqtbl1q_u8(low_v, lo), vqtbl1q_u8(high_v, hi)));
        pos += 16;
    }
    for b in &mut buf[end..] {
        *b = low_tbl[(*b & 0x0F) as usize] ^ high_tbl[(*b >> 4) as usize];
    }
}
