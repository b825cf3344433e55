//! CPU-specific RAID-Z kernels
//!
//! Provides platform-specific SIMD kernels with runtime dispatch:
//! - x86_64: AVX2 → SSSE3 (PSHUFB nibble tables)
//! - aarch64: NEON (`vqtbl1q_u8`)
//! - Other: none, the portable kernels are used
//!
//! Each kernel type can only be constructed through [`GfKernel::detect`], so
//! the `unsafe` calls below are guarded by the feature check that produced
//! the kernel value.

pub mod neon;
pub mod pshufb;

#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
use super::GfKernel;

/// 128-bit PSHUFB kernel
#[cfg(target_arch = "x86_64")]
#[derive(Debug, Clone, Copy)]
pub struct Ssse3Kernel {
    _detected: (),
}

#[cfg(target_arch = "x86_64")]
impl GfKernel for Ssse3Kernel {
    const NAME: &'static str = "ssse3";

    fn detect() -> Option<Self> {
        is_x86_feature_detected!("ssse3").then_some(Self { _detected: () })
    }

    fn xor_acc(&self, dst: &mut [u8], src: &[u8]) {
        // SAFETY: SSSE3 was detected when `self` was created
        unsafe { pshufb::xor_acc_ssse3(dst, src) }
    }

    fn mul_acc(&self, dst: &mut [u8], src: &[u8], coeff: u8) {
        match coeff {
            0 => {}
            1 => self.xor_acc(dst, src),
            // SAFETY: SSSE3 was detected when `self` was created
            _ => unsafe { pshufb::mul_acc_ssse3(dst, src, coeff) },
        }
    }

    fn scale(&self, buf: &mut [u8], coeff: u8) {
        if coeff != 1 {
            // SAFETY: SSSE3 was detected when `self` was created
            unsafe { pshufb::scale_ssse3(buf, coeff) }
        }
    }
}

/// 256-bit PSHUFB kernel
#[cfg(target_arch = "x86_64")]
#[derive(Debug, Clone, Copy)]
pub struct Avx2Kernel {
    _detected: (),
}

#[cfg(target_arch = "x86_64")]
impl GfKernel for Avx2Kernel {
    const NAME: &'static str = "avx2";

    fn detect() -> Option<Self> {
        (is_x86_feature_detected!("avx2") && is_x86_feature_detected!("ssse3"))
            .then_some(Self { _detected: () })
    }

    fn xor_acc(&self, dst: &mut [u8], src: &[u8]) {
        // SAFETY: AVX2 was detected when `self` was created
        unsafe { pshufb::xor_acc_avx2(dst, src) }
    }

    fn mul_acc(&self, dst: &mut [u8], src: &[u8], coeff: u8) {
        match coeff {
            0 => {}
            1 => self.xor_acc(dst, src),
            // SAFETY: AVX2 and SSSE3 were detected when `self` was created
            _ => unsafe { pshufb::mul_acc_avx2(dst, src, coeff) },
        }
    }

    fn scale(&self, buf: &mut [u8], coeff: u8) {
        if coeff != 1 {
            // SAFETY: AVX2 and SSSE3 were detected when `self` was created
            unsafe { pshufb::scale_avx2(buf, coeff) }
        }
    }
}

/// NEON table-lookup kernel
#[cfg(target_arch = "aarch64")]
#[derive(Debug, Clone, Copy)]
pub struct NeonKernel {
    _detected: (),
}

#[cfg(target_arch = "aarch64")]
impl GfKernel for NeonKernel {
    const NAME: &'static str = "aarch64_neon";

    fn detect() -> Option<Self> {
        std::arch::is_aarch64_feature_detected!("neon").then_some(Self { _detected: () })
    }

    fn xor_acc(&self, dst: &mut [u8], src: &[u8]) {
        // SAFETY: NEON was detected when `self` was created
        unsafe { neon::xor_acc_neon(dst, src) }
    }

    fn mul_acc(&self, dst: &mut [u8], src: &[u8], coeff: u8) {
        match coeff {
            0 => {}
            1 => self.xor_acc(dst, src),
            // SAFETY: NEON was detected when `self` was created
            _ => unsafe { neon::mul_acc_neon(dst, src, coeff) },
        }
    }

    fn scale(&self, buf: &mut [u8], coeff: u8) {
        if coeff != 1 {
            // SAFETY: NEON was detected when `self` was created
            unsafe { neon::scale_neon(buf, coeff) }
        }
    }
}
