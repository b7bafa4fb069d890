//! The Ristretto prime order group from the `curve25519-dalek` library.

use super::{GroupChoice, PrimeOrderGroup};
use crate::Error;
use curve25519_dalek::{
    constants::RISTRETTO_BASEPOINT_POINT,
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
    traits::Identity,
};
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha512};
use zeroize::Zeroize;

const HASH_TO_GROUP_DST: &[u8] = b"sherbet-v1:ristretto255:hash-to-group";

/// Ristretto255.
#[derive(Clone, Copy, Debug)]
pub struct Ristretto255;

impl PrimeOrderGroup for Ristretto255 {
    type Scalar = Scalar;
    type Element = RistrettoPoint;

    const CHOICE: GroupChoice = GroupChoice::Ristretto255;
    const ELEMENT_LEN: usize = 32;

    fn sample_scalar<RNG: CryptoRng + RngCore>(rng: &mut RNG) -> Result<Scalar, Error> {
        // Reducing 512 uniform bits leaves a bias below 2^-250.
        let mut wide = [0u8; 64];
        loop {
            rng.try_fill_bytes(&mut wide).map_err(Error::Entropy)?;
            let s = Scalar::from_bytes_mod_order_wide(&wide);
            wide.zeroize();
            if s != Scalar::ZERO {
                return Ok(s);
            }
        }
    }

    fn invert_scalar(s: &Scalar) -> Scalar {
        s.invert()
    }

    fn hash_to_group(bytes: &[u8]) -> RistrettoPoint {
        let mut h = Sha512::new();
        h.update(HASH_TO_GROUP_DST);
        h.update(bytes);
        let mut wide = [0u8; 64];
        wide.copy_from_slice(&h.finalize());
        RistrettoPoint::from_uniform_bytes(&wide)
    }

    #[inline]
    fn scalar_mul(p: &RistrettoPoint, s: &Scalar) -> RistrettoPoint {
        p * s
    }

    fn generator() -> RistrettoPoint {
        RISTRETTO_BASEPOINT_POINT
    }

    fn identity() -> RistrettoPoint {
        RistrettoPoint::identity()
    }

    #[inline]
    fn combine(p: &RistrettoPoint, q: &RistrettoPoint) -> RistrettoPoint {
        p + q
    }

    #[inline]
    fn inverse(p: &RistrettoPoint) -> RistrettoPoint {
        -p
    }

    fn scalar_from_u64(n: u64) -> Scalar {
        Scalar::from(n)
    }

    #[inline]
    fn encode_into(p: &RistrettoPoint, out: &mut [u8]) {
        out.copy_from_slice(p.compress().as_bytes());
    }

    fn decode(bytes: &[u8]) -> Result<RistrettoPoint, Error> {
        let compressed = CompressedRistretto::from_slice(bytes)
            .map_err(|_| Error::InvalidPoint("ristretto255 encodings are 32 bytes"))?;
        let p = compressed
            .decompress()
            .ok_or(Error::InvalidPoint("not a canonical ristretto255 encoding"))?;
        if p == RistrettoPoint::identity() {
            return Err(Error::InvalidPoint("identity element"));
        }
        Ok(p)
    }
}
