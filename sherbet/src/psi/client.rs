//! The client role: sends its blinded set and learns the output.
//!
//! ```text
//! Client::init ──request──▶ PendingClient ──finish(Response)──▶ Output
//! ```

use super::check_config;
use crate::{
    blind::{self, decode_all, BlindedElement, DoubleBlindedElement, Exponent},
    config::Config,
    group::PrimeOrderGroup,
    messages::{EncodedPoints, Request, Response, ServerSet},
    output::{self, Output},
    utils, Error,
};
use itertools::Itertools;
use log::debug;
use rand::{seq::SliceRandom, CryptoRng, RngCore};
use rayon::prelude::*;
use std::{collections::HashSet, time::Instant};

/// Private set intersection client, before it has sent its set.
pub struct Client<G: PrimeOrderGroup> {
    config: Config,
    inputs: Vec<Vec<u8>>,
    exponent: Exponent<G>,
}

impl<G: PrimeOrderGroup> Client<G> {
    /// Set up a run over `inputs`, sampling the client's exponent.
    pub fn init<RNG: CryptoRng + RngCore>(
        config: &Config,
        inputs: &[Vec<u8>],
        rng: &mut RNG,
    ) -> Result<Self, Error> {
        check_config::<G>(config)?;
        let inputs = utils::dedup(inputs);
        let exponent = Exponent::sample(rng)?;
        Ok(Self {
            config: config.clone(),
            inputs,
            exponent,
        })
    }

    /// Blind and shuffle the client's set, producing the first message.
    pub fn request<RNG: CryptoRng + RngCore>(self, rng: &mut RNG) -> (PendingClient<G>, Request) {
        let start = Instant::now();
        let blinded = blind::blind_all(&self.inputs, &self.exponent);

        // Position `j` of the request carries input `order[j]`.
        let mut order = (0..self.inputs.len()).collect_vec();
        order.shuffle(rng);
        let shuffled = order.iter().map(|&i| blinded[i]).collect_vec();
        let request = Request {
            group: G::CHOICE,
            points: EncodedPoints::from_points(&shuffled),
        };
        debug!(
            "client: blinded {} elements in {:?}",
            self.inputs.len(),
            start.elapsed()
        );

        let pending = PendingClient {
            inverse: self.exponent.invert(),
            config: self.config,
            inputs: self.inputs,
            order,
        };
        (pending, request)
    }
}

/// Private set intersection client waiting for the server's response.
pub struct PendingClient<G: PrimeOrderGroup> {
    config: Config,
    inputs: Vec<Vec<u8>>,
    order: Vec<usize>,
    inverse: Exponent<G>,
}

impl<G: PrimeOrderGroup> PendingClient<G> {
    /// Number of elements the client sent.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the client's set was empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Process the server's response and compute the output.
    ///
    /// The response is checked in full before any output is produced: a
    /// wrong group, element count or server set kind is a
    /// [`Error::ProtocolViolation`], a bad point an [`Error::InvalidPoint`].
    pub fn finish(self, response: Response) -> Result<Output, Error> {
        if response.group != G::CHOICE {
            return Err(Error::violation(format!(
                "server answered in {}, expected {}",
                response.group,
                G::CHOICE
            )));
        }
        if response.double_blinded.width() != G::ELEMENT_LEN {
            return Err(Error::violation("double-blinded points have the wrong width"));
        }
        if response.double_blinded.len() != self.order.len() {
            return Err(Error::violation(format!(
                "sent {} points but {} came back",
                self.order.len(),
                response.double_blinded.len()
            )));
        }

        let start = Instant::now();
        let double: Vec<DoubleBlindedElement<G>> = decode_all(response.double_blinded.as_bytes())?;
        let ours: Vec<BlindedElement<G>> = double
            .par_iter()
            .map(|d| blind::unblind(d, &self.inverse))
            .collect();

        let compressed = self.config.output.is_compressed();
        let (hits, p) = match response.server_set {
            ServerSet::Exact(points) if !compressed => {
                if points.width() != G::ELEMENT_LEN {
                    return Err(Error::violation("server points have the wrong width"));
                }
                let theirs: HashSet<&[u8]> = points.iter().collect();
                debug!("client: server sent {} exact elements", theirs.len());
                let hits: Vec<bool> = ours
                    .par_iter()
                    .map(|b| theirs.contains(b.encode().as_slice()))
                    .collect();
                (hits, 0.0)
            }
            ServerSet::Compressed(set) if compressed => {
                if set.key_bits() != self.config.key_bits {
                    return Err(Error::violation(format!(
                        "server keys are {} bits, expected {}",
                        set.key_bits(),
                        self.config.key_bits
                    )));
                }
                debug!(
                    "client: server sent a compressed set of {} keys in {} bytes",
                    set.nkeys(),
                    set.blob().len()
                );
                let keys: Vec<u64> = ours
                    .par_iter()
                    .map(|b| b.int_key(self.config.key_bits))
                    .collect();
                (set.contains_all(&keys)?, set.false_positive_rate())
            }
            ServerSet::Exact(_) => {
                return Err(Error::violation(
                    "server sent its exact set, expected a compressed one",
                ))
            }
            ServerSet::Compressed(_) => {
                return Err(Error::violation(
                    "server sent a compressed set, expected its exact one",
                ))
            }
        };

        let matches = hits
            .iter()
            .zip(self.order.iter())
            .filter(|(hit, _)| **hit)
            .map(|(_, &i)| i)
            .collect_vec();
        debug!(
            "client: {} of {} positions matched in {:?}",
            matches.len(),
            self.order.len(),
            start.elapsed()
        );
        Ok(output::reduce(self.config.output, &self.inputs, matches, p))
    }
}
