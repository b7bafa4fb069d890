//! Protocol configuration.
//!
//! Both parties must be configured identically; a mismatch in group or
//! output mode is detected when the first message arrives.

use crate::{
    gcs::{self, MAX_KEY_BITS},
    group::GroupChoice,
    Error,
};
use std::{fmt, str::FromStr};

/// Default false-positive rate for [`OutputMode::CardinalityWithError`].
pub const DEFAULT_FALSE_POSITIVE_RATE: f64 = 1.0 / (1u64 << 20) as f64;

/// What the client learns, and therefore what the server sends.
///
/// The two exact modes make the server send its whole blinded set: the client
/// learns `|S|` and can match elements exactly. `CardinalityWithError` sends a
/// Golomb-coded set instead, which is several times smaller but makes the
/// client's count an estimate, off by about `|C|·p` before debiasing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutputMode {
    /// The matched elements themselves. Exact.
    Intersection,
    /// The number of matches. Exact.
    Cardinality,
    /// A debiased estimate of the number of matches, from a compressed server
    /// set.
    CardinalityWithError,
}

impl OutputMode {
    /// Whether the server answers with a Golomb-coded set.
    pub fn is_compressed(self) -> bool {
        matches!(self, OutputMode::CardinalityWithError)
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OutputMode::Intersection => "intersection".fmt(f),
            OutputMode::Cardinality => "cardinality".fmt(f),
            OutputMode::CardinalityWithError => "cardinality-with-error".fmt(f),
        }
    }
}

impl FromStr for OutputMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "intersection" => Ok(OutputMode::Intersection),
            "cardinality" => Ok(OutputMode::Cardinality),
            "cardinality-with-error" | "approximate-cardinality" => {
                Ok(OutputMode::CardinalityWithError)
            }
            other => Err(Error::config(format!("unknown output mode `{}`", other))),
        }
    }
}

/// Parameters of a protocol run.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// The group both parties compute in.
    pub group: GroupChoice,
    /// What the client learns.
    pub output: OutputMode,
    /// Target false-positive rate of the compressed server set.
    pub false_positive_rate: f64,
    /// Width of the integer keys inserted into the compressed server set.
    pub key_bits: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            group: GroupChoice::Ristretto255,
            output: OutputMode::Intersection,
            false_positive_rate: DEFAULT_FALSE_POSITIVE_RATE,
            key_bits: MAX_KEY_BITS,
        }
    }
}

impl Config {
    /// A configuration with default compression parameters.
    pub fn new(group: GroupChoice, output: OutputMode) -> Self {
        Self {
            group,
            output,
            ..Default::default()
        }
    }

    /// Set the false-positive rate.
    pub fn with_false_positive_rate(mut self, p: f64) -> Self {
        self.false_positive_rate = p;
        self
    }

    /// Set the key width.
    pub fn with_key_bits(mut self, key_bits: u32) -> Self {
        self.key_bits = key_bits;
        self
    }

    /// Reject parameters the protocol cannot run with.
    ///
    /// The compression parameters are checked whatever the output mode, so a
    /// configuration does not become invalid by switching modes. Whether
    /// `key_bits` is wide enough depends on the server's set size as well;
    /// a compressed set reports the rate it actually reaches, see
    /// [`GolombCodedSet::false_positive_rate`](crate::gcs::GolombCodedSet::false_positive_rate).
    pub fn validate(&self) -> Result<(), Error> {
        gcs::rice_bits_for(self.false_positive_rate)?;
        if !(gcs::MIN_KEY_BITS..=gcs::MAX_KEY_BITS).contains(&self.key_bits) {
            return Err(Error::config(format!(
                "key width must lie in [{}, {}] bits, got {}",
                gcs::MIN_KEY_BITS,
                gcs::MAX_KEY_BITS,
                self.key_bits
            )));
        }
        if self.output.is_compressed() && (self.key_bits as f64) < -self.false_positive_rate.log2() {
            return Err(Error::config(format!(
                "{}-bit keys cannot reach a false-positive rate of {}",
                self.key_bits, self.false_positive_rate
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        Config::default().validate().unwrap();
        Config::new(GroupChoice::P256, OutputMode::CardinalityWithError)
            .validate()
            .unwrap();
    }

    #[test]
    fn test_invalid_parameters() {
        let base = Config::new(GroupChoice::Ristretto255, OutputMode::CardinalityWithError);
        for p in [0.0, 1.0, -0.5, 2.0, f64::NAN, 1e-15] {
            let e = base.clone().with_false_positive_rate(p).validate().unwrap_err();
            assert!(matches!(e, Error::Configuration(_)), "p = {}", p);
        }
        for bits in [0, 8, 15, 65, 128] {
            assert!(base.clone().with_key_bits(bits).validate().is_err());
        }
        let e = base
            .with_key_bits(16)
            .with_false_positive_rate(1.0 / (1u64 << 24) as f64)
            .validate()
            .unwrap_err();
        assert!(matches!(e, Error::Configuration(_)));
    }

    #[test]
    fn test_mode_strings() {
        for mode in [
            OutputMode::Intersection,
            OutputMode::Cardinality,
            OutputMode::CardinalityWithError,
        ] {
            assert_eq!(mode.to_string().parse::<OutputMode>().unwrap(), mode);
        }
        assert_eq!(
            "Cardinality_With_Error".parse::<OutputMode>().unwrap(),
            OutputMode::CardinalityWithError
        );
        assert!("union".parse::<OutputMode>().is_err());
        assert!(!OutputMode::Intersection.is_compressed());
        assert!(OutputMode::CardinalityWithError.is_compressed());
    }
}
