//! NIST P-256, via the `p256` crate.
//!
//! Elements are exchanged as 33-byte SEC1 compressed points and hashed onto
//! the curve with the RFC 9380 `P256_XMD:SHA-256_SSWU_RO_` suite.

use super::{GroupChoice, PrimeOrderGroup};
use crate::Error;
use p256::{
    elliptic_curve::{
        ff::{Field, PrimeField},
        group::{Group, GroupEncoding},
        hash2curve::{ExpandMsgXmd, GroupDigest},
    },
    CompressedPoint, FieldBytes, NistP256, ProjectivePoint, Scalar,
};
use rand::{CryptoRng, RngCore};
use sha2::Sha256;
use zeroize::Zeroize;

// Non-empty, which is all `expand_message_xmd` requires of it.
const HASH_TO_GROUP_DST: &[u8] = b"sherbet-v1:P256_XMD:SHA-256_SSWU_RO_";

/// NIST P-256.
#[derive(Clone, Copy, Debug)]
pub struct P256;

impl PrimeOrderGroup for P256 {
    type Scalar = Scalar;
    type Element = ProjectivePoint;

    const CHOICE: GroupChoice = GroupChoice::P256;
    const ELEMENT_LEN: usize = 33;

    fn sample_scalar<RNG: CryptoRng + RngCore>(rng: &mut RNG) -> Result<Scalar, Error> {
        // Rejection sampling: the order is within 2^-32 of 2^256, so the loop
        // almost never runs twice.
        let mut repr = FieldBytes::default();
        loop {
            rng.try_fill_bytes(repr.as_mut_slice())
                .map_err(Error::Entropy)?;
            let s = Option::<Scalar>::from(Scalar::from_repr(repr));
            repr.as_mut_slice().zeroize();
            if let Some(s) = s {
                if !bool::from(s.is_zero()) {
                    return Ok(s);
                }
            }
        }
    }

    fn invert_scalar(s: &Scalar) -> Scalar {
        // Exponents are never zero, so the inverse always exists.
        s.invert().unwrap_or(Scalar::ZERO)
    }

    fn hash_to_group(bytes: &[u8]) -> ProjectivePoint {
        NistP256::hash_from_bytes::<ExpandMsgXmd<Sha256>>(&[bytes], &[HASH_TO_GROUP_DST])
            .expect("expand_message_xmd only fails on an empty domain separation tag")
    }

    #[inline]
    fn scalar_mul(p: &ProjectivePoint, s: &Scalar) -> ProjectivePoint {
        p * s
    }

    fn generator() -> ProjectivePoint {
        ProjectivePoint::GENERATOR
    }

    fn identity() -> ProjectivePoint {
        ProjectivePoint::IDENTITY
    }

    #[inline]
    fn combine(p: &ProjectivePoint, q: &ProjectivePoint) -> ProjectivePoint {
        p + q
    }

    #[inline]
    fn inverse(p: &ProjectivePoint) -> ProjectivePoint {
        -*p
    }

    fn scalar_from_u64(n: u64) -> Scalar {
        Scalar::from(n)
    }

    #[inline]
    fn encode_into(p: &ProjectivePoint, out: &mut [u8]) {
        out.copy_from_slice(&p.to_bytes());
    }

    fn decode(bytes: &[u8]) -> Result<ProjectivePoint, Error> {
        if bytes.len() != Self::ELEMENT_LEN {
            return Err(Error::InvalidPoint("p256 encodings are 33 bytes"));
        }
        let repr = CompressedPoint::clone_from_slice(bytes);
        let p = Option::<ProjectivePoint>::from(ProjectivePoint::from_bytes(&repr))
            .ok_or(Error::InvalidPoint("not a compressed p256 point"))?;
        if bool::from(p.is_identity()) {
            return Err(Error::InvalidPoint("identity element"));
        }
        Ok(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_to_group_accepts_any_input() {
        assert!(!HASH_TO_GROUP_DST.is_empty());
        for len in [0, 1, 32, 255, 4096] {
            let p = P256::hash_to_group(&vec![0xa5; len]);
            assert!(!bool::from(p.is_identity()));
        }
    }
}
