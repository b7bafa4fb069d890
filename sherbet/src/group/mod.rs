//! Prime-order groups the protocol can run over.
//!
//! Each backend is a zero-sized type implementing [`PrimeOrderGroup`]; the
//! protocol is generic over the trait and the runtime [`GroupChoice`] picks
//! which instantiation runs.

mod nistp256;
mod ristretto;

pub use nistp256::P256;
pub use ristretto::Ristretto255;

use crate::Error;
use rand::{CryptoRng, RngCore};
use std::{fmt, str::FromStr};
use zeroize::Zeroize;

/// The operations the protocol needs from a prime-order group.
///
/// Scalar multiplication must be constant time in the scalar, and
/// `hash_to_group` must not branch on its input beyond what fixed-width field
/// arithmetic implies. Both backends below inherit these properties from the
/// underlying curve libraries.
pub trait PrimeOrderGroup: Sized + Send + Sync + 'static {
    /// An integer modulo the group order.
    type Scalar: Zeroize + Send + Sync;
    /// A group element.
    type Element: Copy + Eq + fmt::Debug + Send + Sync;

    /// Which group this is.
    const CHOICE: GroupChoice;
    /// Length of a canonical element encoding, in bytes.
    const ELEMENT_LEN: usize;

    /// Sample a uniform scalar in `[1, order - 1]`.
    ///
    /// A failure of `rng` is returned as [`Error::Entropy`]; it is never
    /// papered over.
    fn sample_scalar<RNG: CryptoRng + RngCore>(rng: &mut RNG) -> Result<Self::Scalar, Error>;

    /// Multiplicative inverse of a non-zero scalar.
    fn invert_scalar(s: &Self::Scalar) -> Self::Scalar;

    /// Deterministically map `bytes` to a group element.
    fn hash_to_group(bytes: &[u8]) -> Self::Element;

    /// Compute `p^s` (written additively by the curve libraries as `s·p`).
    fn scalar_mul(p: &Self::Element, s: &Self::Scalar) -> Self::Element;

    /// The fixed generator `g`.
    fn generator() -> Self::Element;

    /// The neutral element.
    fn identity() -> Self::Element;

    /// The group law, `p·q` (`p + q` to the curve libraries).
    fn combine(p: &Self::Element, q: &Self::Element) -> Self::Element;

    /// The inverse element, `p^-1`.
    fn inverse(p: &Self::Element) -> Self::Element;

    /// Embed a small integer as a scalar.
    fn scalar_from_u64(n: u64) -> Self::Scalar;

    /// Write the canonical compressed encoding of `p` into `out`, which must be
    /// exactly `ELEMENT_LEN` bytes.
    fn encode_into(p: &Self::Element, out: &mut [u8]);

    /// Parse a canonical compressed encoding. The identity is rejected.
    fn decode(bytes: &[u8]) -> Result<Self::Element, Error>;

    /// The canonical compressed encoding of `p`.
    fn encode(p: &Self::Element) -> Vec<u8> {
        let mut out = vec![0u8; Self::ELEMENT_LEN];
        Self::encode_into(p, &mut out);
        out
    }
}

/// Runtime selection of the group backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GroupChoice {
    /// The Ristretto group over Curve25519.
    Ristretto255,
    /// The NIST P-256 curve.
    P256,
}

impl GroupChoice {
    /// The byte identifying this group on the wire.
    pub fn id(self) -> u8 {
        match self {
            GroupChoice::Ristretto255 => 1,
            GroupChoice::P256 => 2,
        }
    }

    /// Inverse of [`GroupChoice::id`].
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(GroupChoice::Ristretto255),
            2 => Some(GroupChoice::P256),
            _ => None,
        }
    }

    /// Length of an element encoding in this group.
    pub fn element_len(self) -> usize {
        match self {
            GroupChoice::Ristretto255 => Ristretto255::ELEMENT_LEN,
            GroupChoice::P256 => P256::ELEMENT_LEN,
        }
    }
}

impl fmt::Display for GroupChoice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GroupChoice::Ristretto255 => "ristretto255".fmt(f),
            GroupChoice::P256 => "p256".fmt(f),
        }
    }
}

impl FromStr for GroupChoice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_ascii_lowercase().as_str() {
            "ristretto255" | "ristretto" => Ok(GroupChoice::Ristretto255),
            "p256" | "p-256" | "secp256r1" => Ok(GroupChoice::P256),
            other => Err(Error::config(format!("unknown group `{}`", other))),
        }
    }
}
