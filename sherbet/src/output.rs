//! Turning the client's matched positions into the configured output.

use crate::config::OutputMode;

/// What the client learns from a protocol run.
#[derive(Clone, Debug, PartialEq)]
pub enum Output {
    /// The elements of the client's set that are also in the server's set, in
    /// the client's input order.
    Intersection(Vec<Vec<u8>>),
    /// The exact size of the intersection.
    Cardinality(usize),
    /// An estimate of the size of the intersection from a compressed server
    /// set.
    CardinalityWithError {
        /// Positions that matched, false positives included.
        raw_matches: usize,
        /// `raw_matches − |C|·p`, clamped to `[0, |C|]`.
        estimate: f64,
        /// The false-positive rate `p` of the server's set.
        false_positive_rate: f64,
    },
}

impl Output {
    /// The intersection, when the run computed one.
    pub fn intersection(&self) -> Option<&[Vec<u8>]> {
        match self {
            Output::Intersection(v) => Some(v),
            _ => None,
        }
    }

    /// The intersection size; the estimate rounded to the nearest integer
    /// when the run was approximate.
    pub fn cardinality(&self) -> usize {
        match self {
            Output::Intersection(v) => v.len(),
            Output::Cardinality(n) => *n,
            Output::CardinalityWithError { estimate, .. } => estimate.round() as usize,
        }
    }

    /// The intersection size as a real number: the debiased estimate for an
    /// approximate run, the exact count otherwise.
    pub fn estimate(&self) -> f64 {
        match self {
            Output::CardinalityWithError { estimate, .. } => *estimate,
            exact => exact.cardinality() as f64,
        }
    }

    /// Whether the result is exact.
    pub fn is_exact(&self) -> bool {
        !matches!(self, Output::CardinalityWithError { .. })
    }
}

/// `raw_matches − n·p`, clamped to `[0, n]`.
pub fn debiased_cardinality(raw_matches: usize, n: usize, p: f64) -> f64 {
    (raw_matches as f64 - n as f64 * p).clamp(0.0, n as f64)
}

/// Reduce matched positions (indices into `inputs`) to the output for
/// `mode`. `p` is the false-positive rate of the server's set, zero for the
/// exact modes.
pub(crate) fn reduce(mode: OutputMode, inputs: &[Vec<u8>], mut matches: Vec<usize>, p: f64) -> Output {
    match mode {
        OutputMode::Intersection => {
            matches.sort_unstable();
            Output::Intersection(matches.into_iter().map(|i| inputs[i].clone()).collect())
        }
        OutputMode::Cardinality => Output::Cardinality(matches.len()),
        OutputMode::CardinalityWithError => Output::CardinalityWithError {
            raw_matches: matches.len(),
            estimate: debiased_cardinality(matches.len(), inputs.len(), p),
            false_positive_rate: p,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> Vec<Vec<u8>> {
        ["a", "b", "c", "d"].iter().map(|s| s.as_bytes().to_vec()).collect()
    }

    #[test]
    fn test_intersection_in_input_order() {
        let out = reduce(OutputMode::Intersection, &inputs(), vec![3, 1], 0.0);
        assert_eq!(out.intersection().unwrap(), &[b"b".to_vec(), b"d".to_vec()]);
        assert_eq!(out.cardinality(), 2);
        assert!(out.is_exact());
    }

    #[test]
    fn test_cardinality() {
        let out = reduce(OutputMode::Cardinality, &inputs(), vec![0, 2, 3], 0.0);
        assert_eq!(out, Output::Cardinality(3));
        assert_eq!(out.intersection(), None);
    }

    #[test]
    fn test_debiasing() {
        assert_eq!(debiased_cardinality(10, 100, 0.05), 5.0);
        assert_eq!(debiased_cardinality(2, 100, 0.05), 0.0);
        assert_eq!(debiased_cardinality(0, 0, 0.5), 0.0);
        assert_eq!(debiased_cardinality(100, 100, 0.0), 100.0);

        let out = reduce(OutputMode::CardinalityWithError, &inputs(), vec![0, 1], 0.25);
        assert_eq!(
            out,
            Output::CardinalityWithError {
                raw_matches: 2,
                estimate: 1.0,
                false_positive_rate: 0.25
            }
        );
        assert_eq!(out.cardinality(), 1);
        assert_eq!(out.estimate(), 1.0);
        assert!(!out.is_exact());
        assert_eq!(Output::Cardinality(4).estimate(), 4.0);
    }
}
