//! The server role: answers a single request and learns nothing.

use super::check_config;
use crate::{
    blind::{self, decode_all, BlindedElement, DoubleBlindedElement, Exponent},
    config::Config,
    gcs::GolombCodedSet,
    group::PrimeOrderGroup,
    messages::{EncodedPoints, Request, Response, ServerSet},
    utils, Error,
};
use log::{debug, warn};
use rand::{seq::SliceRandom, CryptoRng, RngCore};
use rayon::prelude::*;
use std::time::Instant;

/// Private set intersection server.
pub struct Server<G: PrimeOrderGroup> {
    config: Config,
    inputs: Vec<Vec<u8>>,
    exponent: Exponent<G>,
}

impl<G: PrimeOrderGroup> Server<G> {
    /// Set up a run over `inputs`, sampling the server's exponent.
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

    /// Number of elements in the server's set.
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Whether the server's set is empty.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Answer the client's request. Consumes the server, so an exponent
    /// never serves two requests.
    pub fn respond<RNG: CryptoRng + RngCore>(
        self,
        request: &Request,
        rng: &mut RNG,
    ) -> Result<Response, Error> {
        if request.group != G::CHOICE {
            return Err(Error::violation(format!(
                "client asked for {}, server runs {}",
                request.group,
                G::CHOICE
            )));
        }
        if request.points.width() != G::ELEMENT_LEN {
            return Err(Error::violation("request points have the wrong width"));
        }

        let start = Instant::now();
        let theirs: Vec<BlindedElement<G>> = decode_all(request.points.as_bytes())?;
        let double: Vec<DoubleBlindedElement<G>> = theirs
            .par_iter()
            .map(|b| blind::reblind(b, &self.exponent))
            .collect();
        debug!(
            "server: re-blinded {} client elements in {:?}",
            double.len(),
            start.elapsed()
        );

        let start = Instant::now();
        let mut ours = blind::blind_all(&self.inputs, &self.exponent);
        let server_set = if self.config.output.is_compressed() {
            let keys: Vec<u64> = ours
                .par_iter()
                .map(|b| b.int_key(self.config.key_bits))
                .collect();
            let set = GolombCodedSet::build(
                &keys,
                self.config.false_positive_rate,
                self.config.key_bits,
            )?;
            debug!(
                "server: coded {} keys into {} bytes",
                set.nkeys(),
                set.blob().len()
            );
            if set.false_positive_rate() > 2.0 * self.config.false_positive_rate {
                warn!(
                    "server: {} keys of {} bits give a false-positive rate of {:e}, above the configured {:e}",
                    set.nkeys(),
                    set.key_bits(),
                    set.false_positive_rate(),
                    self.config.false_positive_rate
                );
            }
            ServerSet::Compressed(set)
        } else {
            ours.shuffle(rng);
            ServerSet::Exact(EncodedPoints::from_points(&ours))
        };
        debug!(
            "server: blinded {} own elements in {:?}",
            self.inputs.len(),
            start.elapsed()
        );

        Ok(Response {
            group: G::CHOICE,
            double_blinded: EncodedPoints::from_points(&double),
            server_set,
        })
    }
}
