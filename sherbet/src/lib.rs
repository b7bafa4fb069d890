// -*- mode: rust; -*-
//
// This file is part of `sherbet`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.
#![deny(missing_docs)]

//! Two-party private set intersection from commutative blinding in a
//! prime-order group.
//!
//! A client holding a set `C` and a server holding a set `S` exchange one
//! round trip over a [`tincan::AbstractChannel`]. The client learns, per its
//! [`OutputMode`], the intersection `C ∩ S`, its exact size, or an estimate of
//! its size from a Golomb-coded copy of the server's set. The server learns
//! `|C|` and nothing else. Both parties are assumed honest but curious.
//!
//! ```no_run
//! use sherbet::{run_as_client, Config, GroupChoice, OutputMode};
//! # fn main() -> Result<(), sherbet::Error> {
//! let (mut channel, _server) = tincan::unix_channel_pair()?;
//! let config = Config::new(GroupChoice::Ristretto255, OutputMode::Cardinality);
//! let inputs = vec![b"alice".to_vec(), b"bob".to_vec()];
//! let output = run_as_client(&inputs, &config, &mut channel, &mut rand::rngs::OsRng)?;
//! println!("{} in common", output.cardinality());
//! # Ok(())
//! # }
//! ```

pub mod blind;
pub mod config;
pub mod elgamal;
mod errors;
pub mod gcs;
pub mod group;
pub mod messages;
pub mod output;
mod psi;
mod utils;

pub use crate::{
    config::{Config, OutputMode, DEFAULT_FALSE_POSITIVE_RATE},
    errors::{Error, ErrorKind},
    gcs::GolombCodedSet,
    group::{GroupChoice, PrimeOrderGroup, Ristretto255, P256},
    output::Output,
    psi::*,
    utils::dedup,
};
