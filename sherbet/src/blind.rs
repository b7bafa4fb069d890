//! Hashing set elements into the group and applying blinding exponents.
//!
//! The protocol rests on one identity: `(H(x)^a)^b == (H(x)^b)^a`. The wrapper
//! types below record how many exponents an element carries, so the roles
//! cannot mix up a singly and a doubly blinded element by accident. On the
//! wire both are bare point encodings.

use crate::{gcs, group::PrimeOrderGroup, Error};
use rand::{CryptoRng, RngCore};
use rayon::prelude::*;
use std::fmt;
use zeroize::Zeroize;

/// A party's secret blinding exponent for a single protocol run.
///
/// Deliberately neither `Clone` nor `Copy`: an exponent is moved into the run
/// that sampled it and wiped when that run's state is dropped.
pub struct Exponent<G: PrimeOrderGroup> {
    scalar: G::Scalar,
}

impl<G: PrimeOrderGroup> Exponent<G> {
    /// Sample a fresh exponent.
    pub fn sample<RNG: CryptoRng + RngCore>(rng: &mut RNG) -> Result<Self, Error> {
        Ok(Self {
            scalar: G::sample_scalar(rng)?,
        })
    }

    pub(crate) fn as_scalar(&self) -> &G::Scalar {
        &self.scalar
    }

    /// The exponent undoing this one.
    pub fn invert(&self) -> Self {
        Self {
            scalar: G::invert_scalar(&self.scalar),
        }
    }
}

impl<G: PrimeOrderGroup> Drop for Exponent<G> {
    fn drop(&mut self) {
        self.scalar.zeroize();
    }
}

impl<G: PrimeOrderGroup> fmt::Debug for Exponent<G> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Exponent<{}>(..)", G::CHOICE)
    }
}

macro_rules! point_wrapper {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        pub struct $name<G: PrimeOrderGroup>(G::Element);

        impl<G: PrimeOrderGroup> $name<G> {
            /// The canonical encoding.
            pub fn encode(&self) -> Vec<u8> {
                G::encode(&self.0)
            }
        }

        impl<G: PrimeOrderGroup> Clone for $name<G> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<G: PrimeOrderGroup> Copy for $name<G> {}

        impl<G: PrimeOrderGroup> PartialEq for $name<G> {
            fn eq(&self, other: &Self) -> bool {
                self.0 == other.0
            }
        }

        impl<G: PrimeOrderGroup> Eq for $name<G> {}

        impl<G: PrimeOrderGroup> fmt::Debug for $name<G> {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.0).finish()
            }
        }

        impl<G: PrimeOrderGroup> Encode for $name<G> {
            const LEN: usize = G::ELEMENT_LEN;

            fn encode_into(&self, out: &mut [u8]) {
                G::encode_into(&self.0, out)
            }

            fn decode(bytes: &[u8]) -> Result<Self, Error> {
                G::decode(bytes).map(Self)
            }
        }
    };
}

point_wrapper!(BlindedElement, "`H(x)^e` for a single exponent `e`.");
point_wrapper!(DoubleBlindedElement, "`H(x)^{ab}`, carrying both parties' exponents.");

impl<G: PrimeOrderGroup> BlindedElement<G> {
    /// The `key_bits`-bit integer key of this element, as inserted into and
    /// queried against a Golomb-coded set.
    pub fn int_key(&self, key_bits: u32) -> u64 {
        gcs::key_from_encoding(&self.encode(), key_bits)
    }
}

/// `H(element)^exponent`.
pub fn blind<G: PrimeOrderGroup>(element: &[u8], exponent: &Exponent<G>) -> BlindedElement<G> {
    BlindedElement(G::scalar_mul(&G::hash_to_group(element), &exponent.scalar))
}

/// Apply a second exponent on top of an already blinded element.
pub fn reblind<G: PrimeOrderGroup>(
    blinded: &BlindedElement<G>,
    exponent: &Exponent<G>,
) -> DoubleBlindedElement<G> {
    DoubleBlindedElement(G::scalar_mul(&blinded.0, &exponent.scalar))
}

/// Strip one exponent from a doubly blinded element, given its inverse.
pub fn unblind<G: PrimeOrderGroup>(
    double: &DoubleBlindedElement<G>,
    inverse: &Exponent<G>,
) -> BlindedElement<G> {
    BlindedElement(G::scalar_mul(&double.0, &inverse.scalar))
}

/// Blind every element of `inputs`, in parallel. Output `i` belongs to
/// input `i`.
pub fn blind_all<G: PrimeOrderGroup>(
    inputs: &[Vec<u8>],
    exponent: &Exponent<G>,
) -> Vec<BlindedElement<G>> {
    inputs.par_iter().map(|x| blind(x, exponent)).collect()
}

/// Fixed-width canonical encoding, shared by the blinded point wrappers.
pub trait Encode: Sized + Send + Sync {
    /// Encoding length in bytes.
    const LEN: usize;
    /// Write the encoding into `out`, which is exactly `LEN` bytes.
    fn encode_into(&self, out: &mut [u8]);
    /// Parse an encoding.
    fn decode(bytes: &[u8]) -> Result<Self, Error>;
}

/// Concatenate the encodings of `items`, preserving order.
pub fn encode_all<T: Encode>(items: &[T]) -> Vec<u8> {
    let mut out = vec![0u8; items.len() * T::LEN];
    out.par_chunks_mut(T::LEN)
        .zip(items.par_iter())
        .for_each(|(chunk, item)| item.encode_into(chunk));
    out
}

/// Decode a concatenation of encodings, preserving order. Any malformed
/// entry fails the whole batch.
pub fn decode_all<T: Encode>(bytes: &[u8]) -> Result<Vec<T>, Error> {
    if bytes.len() % T::LEN != 0 {
        return Err(Error::violation(format!(
            "{} bytes is not a whole number of {}-byte points",
            bytes.len(),
            T::LEN
        )));
    }
    bytes.par_chunks(T::LEN).map(T::decode).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::{Ristretto255, P256};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn commutes<G: PrimeOrderGroup>(x: &[u8], seed: u64) -> bool {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let a = Exponent::<G>::sample(&mut rng).unwrap();
        let b = Exponent::<G>::sample(&mut rng).unwrap();
        reblind(&blind(x, &a), &b) == reblind(&blind(x, &b), &a)
    }

    fn unblind_recovers_server_blinding<G: PrimeOrderGroup>() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let a = Exponent::<G>::sample(&mut rng).unwrap();
        let b = Exponent::<G>::sample(&mut rng).unwrap();
        let double = reblind(&blind(b"element", &a), &b);
        assert_eq!(unblind(&double, &a.invert()), blind(b"element", &b));
    }

    #[test]
    fn test_unblind() {
        unblind_recovers_server_blinding::<Ristretto255>();
        unblind_recovers_server_blinding::<P256>();
    }

    #[test]
    fn test_encode_all_preserves_order() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let a = Exponent::<Ristretto255>::sample(&mut rng).unwrap();
        let inputs: Vec<Vec<u8>> = (0..10u8).map(|i| vec![i; 3]).collect();
        let blinded = blind_all(&inputs, &a);
        for (x, b) in inputs.iter().zip(blinded.iter()) {
            assert_eq!(*b, blind(x, &a));
        }
        let bytes = encode_all(&blinded);
        assert_eq!(bytes.len(), 10 * 32);
        assert_eq!(&bytes[32..64], blinded[1].encode().as_slice());
        let decoded: Vec<BlindedElement<Ristretto255>> = decode_all(&bytes).unwrap();
        assert_eq!(decoded, blinded);
    }

    #[test]
    fn test_decode_all_rejects_partial_points() {
        let bytes = vec![0u8; 40];
        assert!(matches!(
            decode_all::<DoubleBlindedElement<Ristretto255>>(&bytes),
            Err(Error::ProtocolViolation(_))
        ));
        let bytes = vec![0xffu8; 66];
        assert!(matches!(
            decode_all::<DoubleBlindedElement<P256>>(&bytes),
            Err(Error::InvalidPoint(_))
        ));
    }

    #[test]
    fn test_exponent_debug_is_redacted() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let a = Exponent::<P256>::sample(&mut rng).unwrap();
        assert_eq!(format!("{:?}", a), "Exponent<p256>(..)");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn test_commutativity_ristretto(x in proptest::collection::vec(any::<u8>(), 0..48), seed in any::<u64>()) {
            prop_assert!(commutes::<Ristretto255>(&x, seed));
        }

        #[test]
        fn test_commutativity_p256(x in proptest::collection::vec(any::<u8>(), 0..48), seed in any::<u64>()) {
            prop_assert!(commutes::<P256>(&x, seed));
        }
    }
}
