//! PSHUFB-based GF(2^8) kernels for x86_64
//!
//! ## Technique
//!
//! PSHUFB performs sixteen parallel 4-bit table lookups. Multiplication by a
//! constant `c` is linear over GF(2), so it splits over the two nibbles of
//! each byte:
//!
//! ```text
//! c * x = low[x & 0x0F] ^ high[x >> 4]
//! low[n]  = c * n
//! high[n] = c * (n << 4)
//! ```
//!
//! Both 16-byte tables fit in one register each. SSSE3 processes 16 bytes
//! per iteration and AVX2 32 bytes, with the 128-bit tables broadcast to
//! both lanes. Remainders fall back to byte-wise table lookups.

#[cfg(target_arch = "x86_64")]
use crate::galois;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

/// XOR `src` into `dst`, 16 bytes at a time
///
/// # Safety
/// Requires SSSE3.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "ssse3")]
pub unsafe fn xor_acc_ssse3(dst: &mut [u8], src: &[u8]) {
    let len = dst.len().min(src.len());
    let end = len - len % 16;
    let mut pos = 0;
    while pos < end {
        let s = _mm_loadu_si128(src.as_ptr().add(pos).cast());
        let d = _mm_loadu_si128(dst.as_ptr().add(pos).cast());
        _mm_storeu_si128(dst.as_mut_ptr().add(pos).cast(), _mm_xor_si128(d, s));
        pos += 16;
    }
    for i in end..len {
        dst[i] ^= src[i];
    }
}

/// `dst ^= coeff * src` with 128-bit PSHUFB
///
/// # Safety
/// Requires SSSE3. `dst` and `src` must not overlap.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "ssse3")]
pub unsafe fn mul_acc_ssse3(dst: &mut [u8], src: &[u8], coeff: u8) {
    let len = dst.len().min(src.len());
    let (low_tbl, high_tbl) = galois::nibble_tables(coeff);
    let low_v = _mm_loadu_si128(low_tbl.as_ptr().cast());
    let high_v = _mm_loadu_si128(high_tbl.as_ptr().cast());
    let mask = _mm_set1_epi8(0x0F);

    let end = len - len % 16;
    let mut pos = 0;
    while pos < end {
        let s = _mm_loadu_si128(src.as_ptr().add(pos).cast());
        let d = _mm_loadu_si128(dst.as_ptr().add(pos).cast());
        let lo = _mm_and_si128(s, mask);
        let hi = _mm_and_si128(_mm_srli_epi64(s, 4), mask);
        let p = _mm_xor_si128(_mm_shuffle_epi8(low_v, lo), _mm_shuffle_epi8(high_v, hi));
        _mm_storeu_si128(dst.as_mut_ptr().add(pos).cast(), _mm_xor_si128(d, p));
        pos += 16;
    }
    for i in end..len {
        dst[i] ^= low_tbl[(src[i] & 0x0F) as usize] ^ high_tbl[(src[i] >> 4) as usize];
    }
}

/// `buf = coeff * buf` with 128-bit PSHUFB
///
/// # Safety
/// Requires SSSE3.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "ssse3")]
pub unsafe fn scale_ssse3(buf: &mut [u8], coeff: u8) {
    let len = buf.len();
    let (low_tbl, high_tbl) = galois::nibble_tables(coeff);
    let low_v = _mm_loadu_si128(low_tbl.as_ptr().cast());
    let high_v = _mm_loadu_si128(high_tbl.as_ptr().cast());
    let mask = _mm_set1_epi8(0x0F);

    let end = len - len % 16;
    let mut pos = 0;
    while pos < end {
        let ptr = buf.as_mut_ptr().add(pos);
        let s = _mm_loadu_si128(ptr.cast());
        let lo = _mm_and_si128(s, mask);
        let hi = _mm_and_si128(_mm_srli_epi64(s, 4), mask);
        let p = _mm_xor_si128(_mm_shuffle_epi8(low_v, lo), _mm_shuffle_epi8(high_v, hi));
        _mm_storeu_si128(ptr.cast(), p);
        pos += 16;
    }
    for b in &mut buf[end..] {
        *b = low_tbl[(*b & 0x0F) as usize] ^ high_tbl[(*b >> 4) as usize];
    }
}

/// XOR `src` into `dst`, 32 bytes at a time
///
/// # Safety
/// Requires AVX2.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
pub unsafe fn xor_acc_avx2(dst: &mut [u8], src: &[u8]) {
    let len = dst.len().min(src.len());
    let end = len - len % 32;
    let mut pos = 0;
    while pos < end {
        let s = _mm256_loadu_si256(src.as_ptr().add(pos).cast());
        let d = _mm256_loadu_si256(dst.as_ptr().add(pos).cast());
        _mm256_storeu_si256(dst.as_mut_ptr().add(pos).cast(), _mm256_xor_si256(d, s));
        pos += 32;
    }
    for i in end..len {
        dst[i] ^= src[i];
    }
}

/// `dst ^= coeff * src` with 256-bit PSHUFB
///
/// # Safety
/// Requires AVX2 and SSSE3. `dst` and `src` must not overlap.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2", enable = "ssse3")]
pub unsafe fn mul_acc_avx2(dst: &mut [u8], src: &[u8], coeff: u8) {
    let len = dst.len().min(src.len());
    let (low_tbl, high_tbl) = galois::nibble_tables(coeff);
    let low_v = _mm256_broadcastsi128_si256(_mm_loadu_si128(low_tbl.as_ptr().cast()));
    let high_v = _mm256_broadcastsi128_si256(_mm_loadu_si128(high_tbl.as_ptr().cast()));
    let mask = _mm256_set1_epi8(0x0F);

    let end = len - len % 32;
    let mut pos = 0;
    while pos < end {
        let s = _mm256_loadu_si256(src.as_ptr().add(pos).cast());
        let d = _mm256_loadu_si256(dst.as_ptr().add(pos).cast());
        let lo = _mm256_and_si256(s, mask);
        let hi = _mm256_and_si256(_mm256_srli_epi64(s, 4), mask);
        let p = _mm256_xor_si256(
            _mm256_shuffle_epi8(low_v, lo),
            _mm256_shuffle_epi8(high_v, hi),
        );
        _mm256_storeu_si256(dst.as_mut_ptr().add(pos).cast(), _mm256_xor_si256(d, p));
        pos += 32;
    }
    if end < len {
        mul_acc_ssse3(&mut dst[end..len], &src[end..len], coeff);
    }
}

/// `buf = coeff * buf` with 256-bit PSHUFB
///
/// # Safety
/// Requires AVX2 and SSSE3.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2", enable = "ssse3")]
pub unsafe fn scale_avx2(buf: &mut [u8], coeff: u8) {
    let len = buf.len();
    let (low_tbl, high_tbl) = galois::nibble_tables(coeff);
    let low_v = _mm256_broadcastsi128_si256(_mm_loadu_si128(low_tbl.as_ptr().cast()));
    let high_v = _mm256_broadcastsi128_si256(_mm_loadu_si128(high_tbl.as_ptr().cast()));
    let mask = _mm256_set1_epi8(0x0F);

    let end = len - len % 32;
    let mut pos = 0;
    while pos < end {
        let ptr = buf.as_mut_ptr().add(pos);
        let s = _mm256_loadu_si256(ptr.cast());
        let lo = _mm256_and_si256(s, mask);
        let hi = _mm256_and_si256(_mm256_srli_epi64(s, 4), mask);
        let p = _mm256_xor_si256(
            _mm256_shuffle_epi8(low_v, lo),
            _mm256_shuffle_epi8(high_v, hi),
        );
        _mm256_storeu_si256(ptr.cast(), p);
        pos += 32;
    }
    if end < len {
        scale_ssse3(&mut buf[end..], coeff);
    }
}
