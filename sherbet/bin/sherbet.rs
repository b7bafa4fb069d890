mod cli;

use clap::Parser;
use cli::{Cli, Role};
use eyre::{bail, Result, WrapErr};
use log::info;
use rand::rngs::OsRng;
use sherbet::{run_as_client, run_as_server, Config, Output};
use std::env;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tincan::{TcpChannel, TrackChannel};

// One set element per line, without the line terminator. Blank lines are skipped.
fn read_inputs(path: &Path) -> Result<Vec<Vec<u8>>> {
    let file = File::open(path).wrap_err_with(|| format!("Error opening input {path:?}"))?;
    let mut inputs = vec![];
    for line in BufReader::new(file).split(b'\n') {
        let mut line = line.wrap_err_with(|| format!("Error reading input {path:?}"))?;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        if !line.is_empty() {
            inputs.push(line);
        }
    }
    Ok(inputs)
}

fn tcp_channel(stream: TcpStream) -> Result<TrackChannel<TcpChannel>> {
    Ok(TrackChannel::new(TcpChannel::from_tcp(stream)?))
}

fn accept(addr: &str) -> Result<TcpStream> {
    let listener =
        TcpListener::bind(addr).wrap_err_with(|| format!("Error binding addr: {addr:?}"))?;
    info!("accept connections on {:?}", addr);
    let (stream, peer) = listener.accept()?;
    info!("connection from {:?}", peer);
    Ok(stream)
}

fn connect(addr: &str, attempts: usize) -> Result<TcpStream> {
    for _ in 0..attempts {
        if let Ok(stream) = TcpStream::connect(addr) {
            info!("connection accepted by {:?}", addr);
            return Ok(stream);
        }
        thread::sleep(Duration::from_millis(100));
    }
    bail!("Error connecting to {:?} after {} attempts", addr, attempts)
}

fn print_output(output: &Output) {
    match output {
        Output::Intersection(elements) => {
            for x in elements {
                println!("{}", String::from_utf8_lossy(x));
            }
        }
        Output::Cardinality(n) => println!("{}", n),
        Output::CardinalityWithError {
            raw_matches,
            estimate,
            false_positive_rate,
        } => println!(
            "{:.2} (raw {}, false-positive rate {:e})",
            estimate, raw_matches, false_positive_rate
        ),
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = Config::new(cli.group, cli.mode)
        .with_false_positive_rate(cli.fpr)
        .with_key_bits(cli.key_bits);
    config.validate()?;

    let start = Instant::now();
    let inputs = read_inputs(&cli.input)?;
    info!("read {} elements in {:?}", inputs.len(), start.elapsed());

    let mut rng = OsRng;
    match cli.role {
        Role::Server => {
            let mut channel = tcp_channel(accept(&cli.connection_addr)?)?;
            let start = Instant::now();
            run_as_server(&inputs, &config, &mut channel, &mut rng)?;
            info!("time psi: {:?}", start.elapsed());
            info!(
                "sent {:.2} KB, received {:.2} KB",
                channel.kilobytes_written(),
                channel.kilobytes_read()
            );
            info!("SERVER DONE!");
        }
        Role::Client { attempts } => {
            let mut channel = tcp_channel(connect(&cli.connection_addr, attempts)?)?;
            let start = Instant::now();
            let output = run_as_client(&inputs, &config, &mut channel, &mut rng)?;
            info!("time psi: {:?}", start.elapsed());
            info!(
                "sent {:.2} KB, received {:.2} KB",
                channel.kilobytes_written(),
                channel.kilobytes_read()
            );
            print_output(&output);
            info!("CLIENT DONE!");
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    // if log-level `RUST_LOG` not already set, then set to info
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }

    pretty_env_logger::init_timed();

    let cli = Cli::parse();

    run(&cli)
}
