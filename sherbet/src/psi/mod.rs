// -*- mode: rust; -*-
//
// This file is part of `sherbet`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! Two-party private set intersection over a prime-order group.
//!
//! The client sends `H(x)^a` for each of its elements, shuffled. The server
//! answers with those points raised to its own exponent `b`, in the order
//! received, together with its own set as `H(y)^b`. The client strips `a`
//! from each answer and matches the resulting `H(x)^b` against the server's
//! set. One round trip; the server learns only `|C|`.

mod client;
mod server;

pub use client::{Client, PendingClient};
pub use server::Server;

use crate::{
    config::Config,
    group::{GroupChoice, PrimeOrderGroup, Ristretto255, P256},
    messages::{Request, Response},
    output::Output,
    Error,
};
use log::info;
use rand::{CryptoRng, RngCore};
use std::time::Instant;
use tincan::AbstractChannel;

fn check_config<G: PrimeOrderGroup>(config: &Config) -> Result<(), Error> {
    config.validate()?;
    if config.group != G::CHOICE {
        return Err(Error::config(format!(
            "configured for {} but instantiated over {}",
            config.group,
            G::CHOICE
        )));
    }
    Ok(())
}

/// Run the client side of the protocol over `channel` and return what the
/// client learns.
///
/// The configuration is validated before anything is sent.
pub fn run_as_client<C: AbstractChannel, RNG: CryptoRng + RngCore>(
    inputs: &[Vec<u8>],
    config: &Config,
    channel: &mut C,
    rng: &mut RNG,
) -> Result<Output, Error> {
    match config.group {
        GroupChoice::Ristretto255 => client_round::<Ristretto255, _, _>(inputs, config, channel, rng),
        GroupChoice::P256 => client_round::<P256, _, _>(inputs, config, channel, rng),
    }
}

/// Run the server side of the protocol over `channel`, answering exactly one
/// request.
///
/// The configuration is validated before anything is read.
pub fn run_as_server<C: AbstractChannel, RNG: CryptoRng + RngCore>(
    inputs: &[Vec<u8>],
    config: &Config,
    channel: &mut C,
    rng: &mut RNG,
) -> Result<(), Error> {
    match config.group {
        GroupChoice::Ristretto255 => server_round::<Ristretto255, _, _>(inputs, config, channel, rng),
        GroupChoice::P256 => server_round::<P256, _, _>(inputs, config, channel, rng),
    }
}

fn client_round<G: PrimeOrderGroup, C: AbstractChannel, RNG: CryptoRng + RngCore>(
    inputs: &[Vec<u8>],
    config: &Config,
    channel: &mut C,
    rng: &mut RNG,
) -> Result<Output, Error> {
    let start = Instant::now();
    let client = Client::<G>::init(config, inputs, rng)?;
    let (pending, request) = client.request(rng);
    request.write(channel)?;
    channel.flush()?;
    info!(
        "client: sent {} blinded elements over {} in {:?}",
        pending.len(),
        G::CHOICE,
        start.elapsed()
    );

    let response = Response::read(channel)?;
    let output = pending.finish(response)?;
    info!(
        "client: {} run finished in {:?}",
        config.output,
        start.elapsed()
    );
    Ok(output)
}

fn server_round<G: PrimeOrderGroup, C: AbstractChannel, RNG: CryptoRng + RngCore>(
    inputs: &[Vec<u8>],
    config: &Config,
    channel: &mut C,
    rng: &mut RNG,
) -> Result<(), Error> {
    let server = Server::<G>::init(config, inputs, rng)?;
    let request = Request::read(channel)?;
    let start = Instant::now();
    let nrequested = request.points.len();
    let response = server.respond(&request, rng)?;
    response.write(channel)?;
    channel.flush()?;
    info!(
        "server: answered {} client elements over {} in {:?}",
        nrequested,
        G::CHOICE,
        start.elapsed()
    );
    Ok(())
}
