//! Helpers shared by the integration tests
#![allow(dead_code)]

use raidzrs::abd::Abd;
use raidzrs::map::RaidzMap;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

pub fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    StdRng::seed_from_u64(seed).fill_bytes(&mut buf);
    buf
}

pub fn random_abd(len: usize, seed: u64) -> Abd {
    Abd::from_vec(random_bytes(len, seed))
}

/// Every column of every row, parity included
pub fn snapshot(map: &RaidzMap<'_>) -> Vec<Vec<Vec<u8>>> {
    map.rows()
        .iter()
        .enumerate()
        .map(|(r, rr)| (0..rr.cols).map(|c| map.column_data(r, c).to_vec()).collect())
        .collect()
}

/// Overwrite column `col` in every row that has it
pub fn corrupt(map: &mut RaidzMap<'_>, col: usize, pattern: u8) {
    for row in 0..map.nrows() {
        if col < map.row(row).cols {
            for (i, b) in map.column_data_mut(row, col).iter_mut().enumerate() {
                *b = pattern ^ (i as u8);
            }
        }
    }
}

/// k-element subsets of `0..n`
pub fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    fn rec(start: usize, n: usize, k: usize, cur: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if cur.len() == k {
            out.push(cur.clone());
            return;
        }
        for i in start..n {
            cur.push(i);
            rec(i + 1, n, k, cur, out);
            cur.pop();
        }
    }
    let mut out = Vec::new();
    rec(0, n, k, &mut Vec::new(), &mut out);
    out
}
