// -*- mode: rust; -*-
//
// This file is part of `sherbet`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! Golomb-coded sets.
//!
//! A Golomb-coded set stores `N` integer keys in roughly `N·(P + 2)` bits and
//! answers membership queries with no false negatives and a false-positive
//! probability of about `1/M`, where `M = 2^P`.
//!
//! Each key is mapped into `[0, N·M)` by multiply-shift range reduction. The
//! resulting values are sorted and the gaps between successive values are
//! Rice coded: the quotient `gap >> P` in unary (ones terminated by a zero),
//! followed by the low `P` bits of the gap, most significant bit first.

use crate::Error;
use bitvec::prelude::*;
use rayon::prelude::*;
use sha2::{Digest, Sha256};

/// Domain separation for deriving integer keys from point encodings.
const KEY_DST: &[u8] = b"sherbet-v1:gcs-key";

/// Smallest supported key width, in bits.
pub const MIN_KEY_BITS: u32 = 16;
/// Largest supported key width, in bits.
pub const MAX_KEY_BITS: u32 = 64;
/// Largest supported Rice parameter; corresponds to `p = 2^-32`.
pub const MAX_RICE_BITS: u8 = 32;

/// Hash a canonical point encoding down to a `key_bits`-bit integer key.
pub fn key_from_encoding(bytes: &[u8], key_bits: u32) -> u64 {
    debug_assert!((MIN_KEY_BITS..=MAX_KEY_BITS).contains(&key_bits));
    let mut h = Sha256::new();
    h.update(KEY_DST);
    h.update(bytes);
    let digest = h.finalize();
    let mut word = [0u8; 8];
    word.copy_from_slice(&digest[0..8]);
    u64::from_le_bytes(word) >> (64 - key_bits)
}

/// The Rice parameter `P` giving a false-positive rate of at most `p`.
pub fn rice_bits_for(p: f64) -> Result<u8, Error> {
    if !(p > 0.0 && p < 1.0) {
        return Err(Error::config(format!(
            "false-positive rate must lie in (0, 1), got {}",
            p
        )));
    }
    let bits = (1.0 / p).log2().ceil();
    if bits > MAX_RICE_BITS as f64 {
        return Err(Error::config(format!(
            "false-positive rate {} is below the supported minimum 2^-{}",
            p, MAX_RICE_BITS
        )));
    }
    Ok(bits.max(1.0) as u8)
}

fn check_key_bits(key_bits: u32) -> Result<(), Error> {
    if (MIN_KEY_BITS..=MAX_KEY_BITS).contains(&key_bits) {
        Ok(())
    } else {
        Err(Error::config(format!(
            "key width must lie in [{}, {}] bits, got {}",
            MIN_KEY_BITS, MAX_KEY_BITS, key_bits
        )))
    }
}

/// A Golomb-coded set of integer keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GolombCodedSet {
    // Distinct keys inserted; fixes the value range `nkeys·M`.
    nkeys: u64,
    // Distinct values coded in `blob` (at most `nkeys`).
    nvalues: u64,
    rice_bits: u8,
    key_bits: u8,
    blob: Vec<u8>,
}

impl GolombCodedSet {
    /// Encode `keys`, each below `2^key_bits`, at false-positive rate `p`.
    ///
    /// Duplicate keys collapse. The output depends only on the set of keys
    /// and the parameters.
    pub fn build(keys: &[u64], p: f64, key_bits: u32) -> Result<Self, Error> {
        let rice_bits = rice_bits_for(p)?;
        check_key_bits(key_bits)?;

        let mut keys = keys.to_vec();
        keys.par_sort_unstable();
        keys.dedup();
        let nkeys = keys.len() as u64;
        let mut set = Self {
            nkeys,
            nvalues: 0,
            rice_bits,
            key_bits: key_bits as u8,
            blob: Vec::new(),
        };
        set.check_range()?;

        // Range reduction is monotone, so the values come out sorted.
        let mut values: Vec<u64> = keys.iter().map(|&k| set.reduce(k)).collect();
        values.dedup();

        let mut bits: BitVec<u8, Msb0> = BitVec::with_capacity(values.len() * (rice_bits as usize + 2));
        let mut last = 0u64;
        for &v in values.iter() {
            let gap = v - last;
            last = v;
            for _ in 0..(gap >> rice_bits) {
                bits.push(true);
            }
            bits.push(false);
            for i in (0..rice_bits).rev() {
                bits.push((gap >> i) & 1 == 1);
            }
        }
        set.nvalues = values.len() as u64;
        set.blob = bits.into_vec();
        Ok(set)
    }

    /// Reassemble a set received from a peer. The parameters are checked; the
    /// bitstream itself is checked by [`GolombCodedSet::decode`].
    pub fn from_parts(
        nkeys: u64,
        nvalues: u64,
        rice_bits: u8,
        key_bits: u8,
        blob: Vec<u8>,
    ) -> Result<Self, Error> {
        if rice_bits == 0 || rice_bits > MAX_RICE_BITS {
            return Err(Error::violation(format!(
                "Rice parameter {} out of range",
                rice_bits
            )));
        }
        if check_key_bits(key_bits as u32).is_err() {
            return Err(Error::violation(format!("key width {} out of range", key_bits)));
        }
        if nvalues > nkeys {
            return Err(Error::violation(format!(
                "{} coded values but only {} keys",
                nvalues, nkeys
            )));
        }
        // Every value takes at least `rice_bits + 1` bits.
        let min_bits = (nvalues as u128) * (rice_bits as u128 + 1);
        if min_bits > (blob.len() as u128) * 8 {
            return Err(Error::violation("compressed set is shorter than its value count"));
        }
        let set = Self {
            nkeys,
            nvalues,
            rice_bits,
            key_bits,
            blob,
        };
        set.check_range().map_err(|e| Error::violation(e.to_string()))?;
        Ok(set)
    }

    fn check_range(&self) -> Result<(), Error> {
        if self.range() > u64::MAX as u128 {
            return Err(Error::config(format!(
                "{} keys at a divisor of {} overflow the 64-bit value range",
                self.nkeys,
                self.divisor()
            )));
        }
        Ok(())
    }

    /// Number of distinct keys the set was built from.
    pub fn nkeys(&self) -> u64 {
        self.nkeys
    }

    /// Number of distinct values coded in the bitstream.
    pub fn nvalues(&self) -> u64 {
        self.nvalues
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.nvalues == 0
    }

    /// The Rice parameter `P`.
    pub fn rice_bits(&self) -> u8 {
        self.rice_bits
    }

    /// The Golomb divisor `M = 2^P`.
    pub fn divisor(&self) -> u64 {
        1u64 << self.rice_bits
    }

    /// Width of the keys, in bits.
    pub fn key_bits(&self) -> u32 {
        self.key_bits as u32
    }

    /// The false-positive rate actually achieved.
    ///
    /// A non-member hits either by landing in an occupied bucket of width
    /// about `2^key_bits / (nkeys·M)`, or by sharing its truncated key with a
    /// member outright. The first is `1/M`; the second is `nkeys/2^key_bits`
    /// and dominates once `nkeys·M` exceeds `2^key_bits`.
    pub fn false_positive_rate(&self) -> f64 {
        let collisions = self.nkeys as f64 / 2f64.powi(self.key_bits as i32);
        (1.0 / self.divisor() as f64 + collisions).min(1.0)
    }

    /// The coded bitstream.
    pub fn blob(&self) -> &[u8] {
        &self.blob
    }

    fn range(&self) -> u128 {
        self.nkeys as u128 * self.divisor() as u128
    }

    // Map a key in `[0, 2^key_bits)` to `[0, nkeys·M)`.
    fn reduce(&self, key: u64) -> u64 {
        let mask = if self.key_bits == 64 {
            u64::MAX
        } else {
            (1u64 << self.key_bits) - 1
        };
        ((((key & mask) as u128) * self.range()) >> self.key_bits) as u64
    }

    /// Query a single key by walking the coded stream.
    pub fn contains(&self, key: u64) -> bool {
        if self.nvalues == 0 {
            return false;
        }
        let target = self.reduce(key);
        let mut reader = GapReader::new(&self.blob, self.rice_bits);
        let mut value = 0u64;
        for _ in 0..self.nvalues {
            match reader.next_gap().and_then(|g| value.checked_add(g)) {
                Some(v) => value = v,
                None => return false,
            }
            if value >= target {
                return value == target;
            }
        }
        false
    }

    /// Decode every coded value, in increasing order.
    ///
    /// Fails if the stream is truncated, has trailing data, or holds values
    /// outside the range implied by its parameters.
    pub fn decode(&self) -> Result<Vec<u64>, Error> {
        let mut reader = GapReader::new(&self.blob, self.rice_bits);
        let range = self.range();
        let mut values = Vec::with_capacity(self.nvalues as usize);
        let mut value = 0u64;
        for _ in 0..self.nvalues {
            let gap = reader
                .next_gap()
                .ok_or_else(|| Error::violation("truncated compressed set"))?;
            value = value
                .checked_add(gap)
                .filter(|v| (*v as u128) < range)
                .ok_or_else(|| Error::violation("compressed set value out of range"))?;
            values.push(value);
        }
        if reader.remaining() >= 8 {
            return Err(Error::violation("trailing data after compressed set"));
        }
        Ok(values)
    }

    /// Query many keys at once: decode the stream once, then binary search
    /// for each key in parallel. Result `i` answers `keys[i]`.
    pub fn contains_all(&self, keys: &[u64]) -> Result<Vec<bool>, Error> {
        let values = self.decode()?;
        Ok(keys
            .par_iter()
            .map(|&k| values.binary_search(&self.reduce(k)).is_ok())
            .collect())
    }
}

struct GapReader<'a> {
    bits: &'a BitSlice<u8, Msb0>,
    pos: usize,
    rice_bits: u8,
}

impl<'a> GapReader<'a> {
    fn new(bytes: &'a [u8], rice_bits: u8) -> Self {
        Self {
            bits: bytes.view_bits::<Msb0>(),
            pos: 0,
            rice_bits,
        }
    }

    fn remaining(&self) -> usize {
        self.bits.len() - self.pos
    }

    fn next_bit(&mut self) -> Option<bool> {
        let bit = *self.bits.get(self.pos)?;
        self.pos += 1;
        Some(bit)
    }

    fn next_gap(&mut self) -> Option<u64> {
        let mut quotient = 0u64;
        while self.next_bit()? {
            quotient += 1;
        }
        if quotient > u64::MAX >> self.rice_bits {
            return None;
        }
        let mut remainder = 0u64;
        for _ in 0..self.rice_bits {
            remainder = (remainder << 1) | self.next_bit()? as u64;
        }
        Some((quotient << self.rice_bits) | remainder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::collection::vec as pvec;
    use proptest::prelude::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    fn random_keys(n: usize, seed: u64) -> Vec<u64> {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        (0..n).map(|_| rng.gen()).collect()
    }

    #[test]
    fn test_rice_bits() {
        assert_eq!(rice_bits_for(0.5).unwrap(), 1);
        assert_eq!(rice_bits_for(1.0 / 32.0).unwrap(), 5);
        assert_eq!(rice_bits_for(0.03).unwrap(), 6);
        assert_eq!(rice_bits_for(0.9).unwrap(), 1);
        assert!(rice_bits_for(0.0).is_err());
        assert!(rice_bits_for(1.0).is_err());
        assert!(rice_bits_for(f64::NAN).is_err());
        assert!(rice_bits_for(1e-12).is_err());
    }

    #[test]
    fn test_key_truncation() {
        let k16 = key_from_encoding(b"point", 16);
        let k64 = key_from_encoding(b"point", 64);
        assert!(k16 < 1 << 16);
        assert_eq!(k16, k64 >> 48);
        assert_ne!(key_from_encoding(b"point", 64), key_from_encoding(b"poinu", 64));
    }

    #[test]
    fn test_empty_set() {
        let set = GolombCodedSet::build(&[], 0.01, 64).unwrap();
        assert!(set.is_empty());
        assert!(set.blob().is_empty());
        assert!(!set.contains(0));
        assert!(!set.contains(u64::MAX));
        assert_eq!(set.decode().unwrap(), Vec::<u64>::new());
        assert_eq!(set.contains_all(&[1, 2, 3]).unwrap(), vec![false; 3]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let keys = random_keys(100, 1);
        let mut doubled = keys.clone();
        doubled.extend_from_slice(&keys);
        let a = GolombCodedSet::build(&keys, 0.01, 64).unwrap();
        let b = GolombCodedSet::build(&doubled, 0.01, 64).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.nkeys(), 100);
    }

    #[test]
    fn test_build_is_order_independent() {
        let keys = random_keys(500, 2);
        let mut reversed = keys.clone();
        reversed.reverse();
        assert_eq!(
            GolombCodedSet::build(&keys, 0.001, 64).unwrap(),
            GolombCodedSet::build(&reversed, 0.001, 64).unwrap()
        );
    }

    #[test]
    fn test_compression() {
        let n = 10_000;
        let set = GolombCodedSet::build(&random_keys(n, 3), 1.0 / 1024.0, 64).unwrap();
        // About P + 2 bits per element, far below 64.
        let bits_per_key = set.blob().len() as f64 * 8.0 / n as f64;
        assert!(bits_per_key < 13.0, "{} bits per key", bits_per_key);
    }

    #[test]
    fn test_false_positive_rate() {
        let n = 20_000;
        let p = 1.0 / 32.0;
        let members = random_keys(n, 4);
        let set = GolombCodedSet::build(&members, p, 64).unwrap();
        let others = random_keys(4 * n, 5);
        let hits = set
            .contains_all(&others)
            .unwrap()
            .into_iter()
            .filter(|b| *b)
            .count();
        let expected = others.len() as f64 * set.false_positive_rate();
        // Expected 2500 hits with a standard deviation around 50.
        assert!(
            (hits as f64 - expected).abs() < 0.1 * expected,
            "{} hits, expected {}",
            hits,
            expected
        );
    }

    #[test]
    fn test_short_keys_report_their_collision_rate() {
        // 2^14 members in a 20-bit key space: one key in 64 is taken, far
        // above the 2^-20 the Rice parameter alone would give.
        let key_bits = 20;
        let p = 1.0 / (1u64 << 20) as f64;
        let members: Vec<u64> = random_keys(1 << 14, 8)
            .into_iter()
            .map(|k| k >> (64 - key_bits))
            .collect();
        let set = GolombCodedSet::build(&members, p, key_bits).unwrap();
        let rate = set.false_positive_rate();
        assert!(rate > 60.0 * p);
        assert!((rate - set.nkeys() as f64 / (1u64 << 20) as f64).abs() < 2.0 * p);

        // Keys of fresh elements: any hit is a false positive of the
        // elements, whether or not the truncated keys coincide.
        let others: Vec<u64> = random_keys(1 << 14, 9)
            .into_iter()
            .map(|k| k >> (64 - key_bits))
            .collect();
        let hits = set
            .contains_all(&others)
            .unwrap()
            .into_iter()
            .filter(|b| *b)
            .count();
        let expected = others.len() as f64 * rate;
        // About 250 expected, standard deviation around 16.
        assert!(
            (hits as f64 - expected).abs() < 0.25 * expected,
            "{} hits, expected {}",
            hits,
            expected
        );
    }

    #[test]
    fn test_wide_keys_report_the_rice_rate() {
        let set = GolombCodedSet::build(&random_keys(1000, 10), 1.0 / 1024.0, 64).unwrap();
        assert!((set.false_positive_rate() - 1.0 / 1024.0).abs() < 1e-12);
    }

    #[test]
    fn test_truncated_blob_is_rejected() {
        let set = GolombCodedSet::build(&random_keys(64, 6), 0.01, 64).unwrap();
        let mut blob = set.blob().to_vec();
        blob.truncate(blob.len() - 4);
        let bad = GolombCodedSet::from_parts(set.nkeys(), set.nvalues(), set.rice_bits(), 64, blob)
            .and_then(|s| s.decode());
        assert!(matches!(bad, Err(Error::ProtocolViolation(_))));
    }

    #[test]
    fn test_trailing_data_is_rejected() {
        let set = GolombCodedSet::build(&random_keys(64, 7), 0.01, 64).unwrap();
        let mut blob = set.blob().to_vec();
        blob.push(0);
        let bad = GolombCodedSet::from_parts(set.nkeys(), set.nvalues(), set.rice_bits(), 64, blob)
            .unwrap();
        assert!(matches!(bad.decode(), Err(Error::ProtocolViolation(_))));
    }

    #[test]
    fn test_bad_parameters_are_rejected() {
        assert!(GolombCodedSet::from_parts(1, 2, 5, 64, vec![0; 8]).is_err());
        assert!(GolombCodedSet::from_parts(1, 1, 0, 64, vec![0; 8]).is_err());
        assert!(GolombCodedSet::from_parts(1, 1, 33, 64, vec![0; 8]).is_err());
        assert!(GolombCodedSet::from_parts(1, 1, 5, 8, vec![0; 8]).is_err());
        assert!(GolombCodedSet::from_parts(1000, 1000, 5, 64, vec![0; 8]).is_err());
        assert!(GolombCodedSet::from_parts(u64::MAX, 0, 32, 64, vec![]).is_err());
        assert!(GolombCodedSet::build(&[1], 0.01, 65).is_err());
    }

    proptest! {
        #[test]
        fn test_no_false_negatives(
            keys in pvec(any::<u64>(), 0..300),
            rice in 1u8..=20,
            key_bits in 16u32..=64,
        ) {
            let p = 1.0 / (1u64 << rice) as f64;
            let keys: Vec<u64> = keys.into_iter().map(|k| k >> (64 - key_bits)).collect();
            let set = GolombCodedSet::build(&keys, p, key_bits).unwrap();
            prop_assert_eq!(set.rice_bits(), rice);
            let batch = set.contains_all(&keys).unwrap();
            for (k, b) in keys.iter().zip(batch.iter()) {
                prop_assert!(*b);
                prop_assert!(set.contains(*k));
            }
        }

        #[test]
        fn test_walk_agrees_with_batch(
            members in pvec(any::<u64>(), 1..200),
            queries in pvec(any::<u64>(), 1..200),
        ) {
            let set = GolombCodedSet::build(&members, 0.1, 64).unwrap();
            let batch = set.contains_all(&queries).unwrap();
            for (q, b) in queries.iter().zip(batch.iter()) {
                prop_assert_eq!(set.contains(*q), *b);
            }
        }
    }
}
