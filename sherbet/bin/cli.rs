/*!
Cli utilities.

*/
use clap::{Parser, Subcommand};
use sherbet::{GroupChoice, OutputMode, DEFAULT_FALSE_POSITIVE_RATE};
use std::path::PathBuf;

const DEFAULT_ADDR: &str = "127.0.0.1:5527";
const DEFAULT_GROUP: GroupChoice = GroupChoice::Ristretto255;
const DEFAULT_MODE: OutputMode = OutputMode::Intersection;
const DEFAULT_KEY_BITS: u32 = 64;
const DEFAULT_CONNECT_ATTEMPTS: usize = 50;

#[derive(Subcommand)]
pub(crate) enum Role {
    /// Listen on the address and answer one client
    Server,
    /// Connect to the address and print what was learned
    Client {
        /// Number of connection attempts, 100ms apart
        #[clap(default_value_t = DEFAULT_CONNECT_ATTEMPTS, long)]
        attempts: usize,
    },
}

/// Cli.
#[derive(Parser)]
#[clap(name = "sherbet")]
#[clap(author = "swanky authors <swanky@galois.com>")]
#[clap(version = "0.1")]
pub(crate) struct Cli {
    /// Set addr for tcp connection
    #[clap(default_value_t = DEFAULT_ADDR.to_string(), short, long)]
    pub connection_addr: String,

    /// Group to compute in: ristretto255 or p256
    #[clap(default_value_t = DEFAULT_GROUP, short, long)]
    pub group: GroupChoice,

    /// Output mode: intersection, cardinality or cardinality-with-error
    #[clap(default_value_t = DEFAULT_MODE, short, long)]
    pub mode: OutputMode,

    /// False-positive rate of the compressed server set
    #[clap(default_value_t = DEFAULT_FALSE_POSITIVE_RATE, long)]
    pub fpr: f64,

    /// Width of compressed set keys, in bits
    #[clap(default_value_t = DEFAULT_KEY_BITS, long)]
    pub key_bits: u32,

    /// input path, one set element per line
    #[clap(long)]
    pub input: PathBuf,

    #[clap(subcommand)]
    pub role: Role,
}
