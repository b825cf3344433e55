//! Property-based tests for GF(2^8) arithmetic

use proptest::prelude::*;
use raidzrs::galois::{self, Gf256, EXP, GF_ORDER, LOG};

/// Carry-less multiply reduced by 0x11D, independent of the tables
fn slow_mul(mut a: u8, mut b: u8) -> u8 {
    let mut p = 0u8;
    while b != 0 {
        if b & 1 != 0 {
            p ^= a;
        }
        a = galois::mul2(a);
        b >>= 1;
    }
    p
}

#[test]
fn test_tables_are_consistent() {
    assert_eq!(EXP[0], 1);
    assert_eq!(EXP[1], 2);
    assert_eq!(EXP[8], 0x1D);
    for x in 1..=255u8 {
        assert_eq!(EXP[LOG[x as usize] as usize], x);
    }
    // 2 generates the whole multiplicative group
    let mut seen = [false; 256];
    for e in 0..GF_ORDER {
        seen[EXP[e] as usize] = true;
    }
    assert!(seen[1..].iter().all(|&s| s));
}

#[test]
fn test_mul_matches_carryless_reference() {
    for a in 0..=255u8 {
        for b in 0..=255u8 {
            assert_eq!(galois::mul(a, b), slow_mul(a, b), "{} * {}", a, b);
        }
    }
}

#[test]
fn test_inverse_of_zero_is_zero() {
    assert_eq!(galois::inv(0), 0);
}

#[test]
fn test_pow2_pow4() {
    assert_eq!(galois::exp2(0), 1);
    assert_eq!(galois::exp2(7), 0x80);
    assert_eq!(galois::exp2(8), 0x1D);
    assert_eq!(galois::exp4(4), galois::exp2(8));
    assert_eq!(galois::exp2(255), 1);
}

proptest! {
    #[test]
    fn prop_addition_is_xor(a: u8, b: u8) {
        prop_assert_eq!((Gf256::new(a) + Gf256::new(b)).value(), a ^ b);
        prop_assert_eq!((Gf256::new(a) - Gf256::new(b)).value(), a ^ b);
    }

    #[test]
    fn prop_multiplication_commutative(a: u8, b: u8) {
        prop_assert_eq!(galois::mul(a, b), galois::mul(b, a));
    }

    #[test]
    fn prop_multiplication_associative(a: u8, b: u8, c: u8) {
        prop_assert_eq!(
            galois::mul(galois::mul(a, b), c),
            galois::mul(a, galois::mul(b, c))
        );
    }

    #[test]
    fn prop_distributive(a: u8, b: u8, c: u8) {
        let left = Gf256::new(a) * (Gf256::new(b) + Gf256::new(c));
        let right = Gf256::new(a) * Gf256::new(b) + Gf256::new(a) * Gf256::new(c);
        prop_assert_eq!(left, right);
    }

    #[test]
    fn prop_inverse(a in 1u8..=255) {
        prop_assert_eq!(galois::mul(a, galois::inv(a)), 1);
        prop_assert_eq!(Gf256::new(a) / Gf256::new(a), Gf256::ONE);
    }

    #[test]
    fn prop_division_undoes_multiplication(a: u8, b in 1u8..=255) {
        prop_assert_eq!(galois::div(galois::mul(a, b), b), a);
    }

    #[test]
    fn prop_exp2_scales_like_repeated_doubling(a: u8, e in 0usize..600) {
        let mut expected = a;
        for _ in 0..e {
            expected = galois::mul2(expected);
        }
        prop_assert_eq!(galois::mul(a, galois::exp2(e)), expected);
    }

    #[test]
    fn prop_tables_agree_with_mul(c: u8, x: u8) {
        let table = galois::mul_table(c);
        let (low, high) = galois::nibble_tables(c);
        let expected = galois::mul(c, x);
        prop_assert_eq!(table[x as usize], expected);
        prop_assert_eq!(low[(x & 0x0F) as usize] ^ high[(x >> 4) as usize], expected);
    }

    #[test]
    fn prop_pow_matches_repeated_mul(a: u8, e in 0usize..40) {
        let mut expected = Gf256::ONE;
        for _ in 0..e {
            expected *= Gf256::new(a);
        }
        prop_assert_eq!(Gf256::new(a).pow(e), expected);
    }
}
