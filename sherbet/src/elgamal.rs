// -*- mode: rust; -*-
//
// This file is part of `sherbet`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! ElGamal encryption over a [`PrimeOrderGroup`].
//!
//! Two flavours share one key pair `(x, h = g^x)`:
//!
//! * [`Ciphertext`] encrypts a group element `m` as `(g^r, m·h^r)`. The
//!   product of two ciphertexts decrypts to the product of their plaintexts.
//! * [`ExpCiphertext`] encrypts a small integer `m` as `(g^r, g^m·h^r)`. The
//!   sum of two ciphertexts decrypts to the sum of their plaintexts; decryption
//!   recovers `m` by search, so it is only practical below a known bound.

use crate::{blind::Encode, blind::Exponent, group::PrimeOrderGroup, Error};
use rand::{CryptoRng, RngCore};
use std::{
    fmt,
    ops::{Add, Mul},
};

/// The secret half of a key pair. Wiped when dropped.
pub struct SecretKey<G: PrimeOrderGroup> {
    x: Exponent<G>,
}

/// The public half of a key pair, `h = g^x`.
pub struct PublicKey<G: PrimeOrderGroup> {
    h: G::Element,
}

/// Generate a fresh key pair.
pub fn generate_keys<G: PrimeOrderGroup, RNG: CryptoRng + RngCore>(
    rng: &mut RNG,
) -> Result<(SecretKey<G>, PublicKey<G>), Error> {
    let x = Exponent::<G>::sample(rng)?;
    let h = G::scalar_mul(&G::generator(), x.as_scalar());
    Ok((SecretKey { x }, PublicKey { h }))
}

impl<G: PrimeOrderGroup> PublicKey<G> {
    /// The key as a group element.
    pub fn element(&self) -> &G::Element {
        &self.h
    }

    // `(g^r, m·h^r)` for a fresh `r`.
    fn mask<RNG: CryptoRng + RngCore>(
        &self,
        m: &G::Element,
        rng: &mut RNG,
    ) -> Result<(G::Element, G::Element), Error> {
        let r = Exponent::<G>::sample(rng)?;
        let c1 = G::scalar_mul(&G::generator(), r.as_scalar());
        let c2 = G::combine(m, &G::scalar_mul(&self.h, r.as_scalar()));
        Ok((c1, c2))
    }

    /// Encrypt the group element `m`.
    pub fn encrypt<RNG: CryptoRng + RngCore>(
        &self,
        m: &G::Element,
        rng: &mut RNG,
    ) -> Result<Ciphertext<G>, Error> {
        let (c1, c2) = self.mask(m, rng)?;
        Ok(Ciphertext { c1, c2 })
    }

    /// Encrypt the integer `m` in the exponent.
    pub fn encrypt_exp<RNG: CryptoRng + RngCore>(
        &self,
        m: u64,
        rng: &mut RNG,
    ) -> Result<ExpCiphertext<G>, Error> {
        let gm = G::scalar_mul(&G::generator(), &G::scalar_from_u64(m));
        let (c1, c2) = self.mask(&gm, rng)?;
        Ok(ExpCiphertext { c1, c2 })
    }
}

impl<G: PrimeOrderGroup> SecretKey<G> {
    // `c2 · c1^-x`.
    fn unmask(&self, c1: &G::Element, c2: &G::Element) -> G::Element {
        G::combine(c2, &G::inverse(&G::scalar_mul(c1, self.x.as_scalar())))
    }

    /// Recover the group element inside `c`.
    pub fn decrypt(&self, c: &Ciphertext<G>) -> G::Element {
        self.unmask(&c.c1, &c.c2)
    }

    /// Recover the integer inside `c`, if it is at most `max`.
    pub fn decrypt_exp(&self, c: &ExpCiphertext<G>, max: u64) -> Option<u64> {
        let target = self.unmask(&c.c1, &c.c2);
        let g = G::generator();
        let mut power = G::identity();
        for m in 0..=max {
            if power == target {
                return Some(m);
            }
            power = G::combine(&power, &g);
        }
        None
    }
}

impl<G: PrimeOrderGroup> fmt::Debug for SecretKey<G> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SecretKey<{}>(..)", G::CHOICE)
    }
}

macro_rules! ciphertext {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        pub struct $name<G: PrimeOrderGroup> {
            c1: G::Element,
            c2: G::Element,
        }

        impl<G: PrimeOrderGroup> Clone for $name<G> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<G: PrimeOrderGroup> Copy for $name<G> {}

        impl<G: PrimeOrderGroup> PartialEq for $name<G> {
            fn eq(&self, other: &Self) -> bool {
                self.c1 == other.c1 && self.c2 == other.c2
            }
        }

        impl<G: PrimeOrderGroup> Eq for $name<G> {}

        impl<G: PrimeOrderGroup> fmt::Debug for $name<G> {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("c1", &self.c1)
                    .field("c2", &self.c2)
                    .finish()
            }
        }

        impl<G: PrimeOrderGroup> $name<G> {
            fn combine(&self, other: &Self) -> Self {
                Self {
                    c1: G::combine(&self.c1, &other.c1),
                    c2: G::combine(&self.c2, &other.c2),
                }
            }
        }

        impl<G: PrimeOrderGroup> Encode for $name<G> {
            const LEN: usize = 2 * G::ELEMENT_LEN;

            fn encode_into(&self, out: &mut [u8]) {
                let (first, second) = out.split_at_mut(G::ELEMENT_LEN);
                G::encode_into(&self.c1, first);
                G::encode_into(&self.c2, second);
            }

            fn decode(bytes: &[u8]) -> Result<Self, Error> {
                if bytes.len() != Self::LEN {
                    return Err(Error::InvalidPoint("ciphertexts are two points wide"));
                }
                let (first, second) = bytes.split_at(G::ELEMENT_LEN);
                Ok(Self {
                    c1: G::decode(first)?,
                    c2: G::decode(second)?,
                })
            }
        }
    };
}

ciphertext!(Ciphertext, "An ElGamal encryption of a group element.");
ciphertext!(ExpCiphertext, "An ElGamal encryption of an integer in the exponent.");

impl<G: PrimeOrderGroup> Mul for Ciphertext<G> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.combine(&rhs)
    }
}

impl<G: PrimeOrderGroup> Add for ExpCiphertext<G> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.combine(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        blind::{decode_all, encode_all},
        group::{Ristretto255, P256},
    };
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn check_round_trip<G: PrimeOrderGroup>() {
        let mut rng = ChaCha20Rng::seed_from_u64(79);
        let (sk, pk) = generate_keys::<G, _>(&mut rng).unwrap();
        let m = G::hash_to_group(b"102");
        let c = pk.encrypt(&m, &mut rng).unwrap();
        assert_eq!(sk.decrypt(&c), m);
        // Encryption is randomized.
        assert_ne!(pk.encrypt(&m, &mut rng).unwrap(), c);

        let (other, _) = generate_keys::<G, _>(&mut rng).unwrap();
        assert_ne!(other.decrypt(&c), m);
    }

    fn check_multiplicative<G: PrimeOrderGroup>() {
        let mut rng = ChaCha20Rng::seed_from_u64(90);
        let (sk, pk) = generate_keys::<G, _>(&mut rng).unwrap();
        let five = G::hash_to_group(b"5");
        let four = G::hash_to_group(b"4");
        let product = pk.encrypt(&five, &mut rng).unwrap() * pk.encrypt(&four, &mut rng).unwrap();
        assert_eq!(sk.decrypt(&product), G::combine(&five, &four));
    }

    fn check_additive<G: PrimeOrderGroup>() {
        let mut rng = ChaCha20Rng::seed_from_u64(23);
        let (sk, pk) = generate_keys::<G, _>(&mut rng).unwrap();
        let five = pk.encrypt_exp(5, &mut rng).unwrap();
        let four = pk.encrypt_exp(4, &mut rng).unwrap();
        assert_eq!(sk.decrypt_exp(&(five + four), 100), Some(9));
        assert_eq!(sk.decrypt_exp(&pk.encrypt_exp(0, &mut rng).unwrap(), 0), Some(0));
        assert_eq!(sk.decrypt_exp(&five, 4), None);
    }

    #[test]
    fn test_ristretto255() {
        check_round_trip::<Ristretto255>();
        check_multiplicative::<Ristretto255>();
        check_additive::<Ristretto255>();
    }

    #[test]
    fn test_p256() {
        check_round_trip::<P256>();
        check_multiplicative::<P256>();
        check_additive::<P256>();
    }

    #[test]
    fn test_ciphertext_encoding() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let (sk, pk) = generate_keys::<P256, _>(&mut rng).unwrap();
        let cs = (0..4u64)
            .map(|m| pk.encrypt_exp(m, &mut rng).unwrap())
            .collect::<Vec<_>>();
        let bytes = encode_all(&cs);
        assert_eq!(bytes.len(), 4 * 66);
        let decoded: Vec<ExpCiphertext<P256>> = decode_all(&bytes).unwrap();
        assert_eq!(decoded, cs);
        assert_eq!(sk.decrypt_exp(&decoded[3], 10), Some(3));
        assert!(matches!(
            decode_all::<Ciphertext<P256>>(&bytes[..65]),
            Err(Error::ProtocolViolation(_))
        ));
        assert_eq!(format!("{:?}", sk), "SecretKey<p256>(..)");
    }
}
