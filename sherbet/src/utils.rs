// -*- mode: rust; -*-
//
// This file is part of `sherbet`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

use rand::{CryptoRng, Rng};
use std::collections::HashSet;

/// Drop repeated elements, keeping the first occurrence of each.
pub fn dedup(inputs: &[Vec<u8>]) -> Vec<Vec<u8>> {
    let mut seen = HashSet::with_capacity(inputs.len());
    let mut unique = Vec::with_capacity(inputs.len());
    for x in inputs {
        if seen.insert(x.as_slice()) {
            unique.push(x.clone());
        }
    }
    if unique.len() != inputs.len() {
        log::warn!(
            "dropped {} duplicate set elements",
            inputs.len() - unique.len()
        );
    }
    unique
}

#[allow(dead_code)] // used in tests
pub fn rand_vec<RNG: CryptoRng + Rng>(n: usize, rng: &mut RNG) -> Vec<u8> {
    (0..n).map(|_| rng.gen()).collect()
}

#[allow(dead_code)] // used in tests
pub fn rand_vec_vec<RNG: CryptoRng + Rng>(n: usize, m: usize, rng: &mut RNG) -> Vec<Vec<u8>> {
    (0..n).map(|_| rand_vec(m, rng)).collect()
}
