//! Concrete end-to-end scenarios run against every supported backend

mod common;

use common::{combinations, corrupt, random_abd, snapshot};
use raidzrs::map::{ColumnData, RaidzMap};
use raidzrs::math::RecVariant;
use raidzrs::registry::ImplRegistry;

#[test]
fn test_single_parity_full_row() {
    let registry = ImplRegistry::detect();
    for ops in registry.backends() {
        let mut abd = random_abd(512 * 8, 1);
        let original = abd.clone();

        let mut map = RaidzMap::build(&mut abd, 0, 512 * 8, 9, 9, 9, 1, None).unwrap();
        assert_eq!(map.nrows(), 1);
        assert_eq!(map.row(0).cols, 9);
        assert_eq!(map.row(0).bigcols, 0);

        ops.generate(&mut map).unwrap();
        let expected: Vec<u8> = (0..512)
            .map(|i| (0..8).fold(0u8, |acc, d| acc ^ original.as_slice()[d * 512 + i]))
            .collect();
        assert_eq!(map.column_data(0, 0), expected.as_slice(), "{}", ops.name());

        corrupt(&mut map, 3, 0xEE);
        let outcome = ops.reconstruct(&mut map, &[3]).unwrap();
        assert_eq!(outcome.variant(), Some(RecVariant::P));
        assert_eq!(outcome.code(), 1);
        drop(map);
        assert_eq!(abd, original, "{}", ops.name());
    }
}

#[test]
fn test_single_parity_full_row_legacy_layout() {
    let registry = ImplRegistry::detect();
    for ops in registry.backends() {
        let mut abd = random_abd(512 * 8, 2);
        let original = abd.clone();
        let mut map = RaidzMap::build_single_row(&mut abd, 0, 512 * 8, 9, 9, 1).unwrap();
        ops.generate(&mut map).unwrap();
        corrupt(&mut map, 3, 0x11);
        ops.reconstruct(&mut map, &[3]).unwrap();
        drop(map);
        assert_eq!(abd, original, "{}", ops.name());
    }
}

/// Corrupt every 3-column subset of the map and reconstruct it
fn check_all_triples(sectors: usize, expected_rows: usize) {
    let registry = ImplRegistry::detect();
    let size = 512 * sectors;
    for ops in registry.backends() {
        let mut abd = random_abd(size, sectors as u64);
        let original = abd.clone();
        let mut map = RaidzMap::build(&mut abd, 0, size, 9, 11, 11, 3, None).unwrap();
        assert_eq!(map.nrows(), expected_rows);
        let last = map.nrows() - 1;
        assert_eq!(map.row(last).bigcols, 4);
        assert!(map.row(last).columns[4..]
            .iter()
            .all(|rc| rc.data == ColumnData::Empty && rc.size == 0));

        ops.generate(&mut map).unwrap();
        let good = snapshot(&map);

        for targets in combinations(11, 3) {
            for &t in &targets {
                corrupt(&mut map, t, 0x5A);
            }
            ops.reconstruct(&mut map, &targets).unwrap();
            assert_eq!(snapshot(&map), good, "{} targets {:?}", ops.name(), targets);
        }
        drop(map);
        assert_eq!(abd, original);
    }
}

#[test]
fn test_triple_parity_short_row_two_rows() {
    // One full row of 8 data sectors plus a single-sector remainder row
    check_all_triples(9, 2);
}

#[test]
fn test_triple_parity_short_row_seventeen_sectors() {
    check_all_triples(17, 3);
}

#[test]
fn test_short_row_only_real_columns() {
    // Only parity and data column 3 carry bytes in the short row
    let registry = ImplRegistry::detect();
    let mut abd = random_abd(512 * 9, 9);
    let mut map = RaidzMap::build(&mut abd, 0, 512 * 9, 9, 11, 11, 3, None).unwrap();
    registry.fastest().generate(&mut map).unwrap();
    let good = snapshot(&map);
    for targets in combinations(4, 3) {
        for &t in &targets {
            corrupt(&mut map, t, 0xC3);
        }
        registry.fastest().reconstruct(&mut map, &targets).unwrap();
        assert_eq!(snapshot(&map)[1], good[1], "targets {:?}", targets);
    }
}
