//! Encode configuration bytes and decode captured results for MCP342x ADCs, no hardware required.

mod cli;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mcp342x::{decode, to_nanovolts, Channel, Command, Gain, SampleRate, Status};

use cli::{init_tracing, parse_byte, ConfigArgs};

/// MCP3426/3427/3428 register helper
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Print the configuration byte for a set of register fields
    Command {
        /// Set the ready bit, which starts a conversion in one-shot mode
        #[arg(long)]
        ready: bool,

        /// Channel select, 0-3
        #[arg(short, long, default_value_t = 0)]
        channel: u8,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Decode result bytes read from the device
    Decode {
        /// Sample rate select the device was configured with
        #[arg(short, long, default_value_t = 2)]
        rate: u8,

        /// PGA gain the device was configured with
        #[arg(short, long, default_value_t = 1)]
        gain: u8,

        /// Result bytes, hex (0x..) or decimal. A third byte is read as the echoed configuration.
        #[arg(value_parser = parse_byte)]
        bytes: Vec<u8>,
    },
}

fn encode(command: Command) -> u8 {
    let byte = command.to_byte();
    tracing::debug!(?command, "encoded");
    byte
}

fn describe_status(status: &Status) -> String {
    format!(
        "{} conversion, {:?}, {:?}, {}-bit, x{}",
        if status.fresh { "fresh" } else { "stale" },
        status.channel,
        status.mode,
        status.rate.resolution_bits(),
        status.gain.multiplier(),
    )
}

fn decode_bytes(bytes: &[u8], rate: SampleRate, gain: Gain) -> Result<()> {
    let code = decode(bytes, rate).context("Failed to decode result bytes")?;
    let volts = to_nanovolts(code, rate, gain) as f64 / 1e9;

    println!(
        "{code} ({volts:+.6} V, {}-bit, x{})",
        rate.resolution_bits(),
        gain.multiplier()
    );

    if let Some(&byte) = bytes.get(2) {
        let status = Status::from(byte);
        println!("status: {}", describe_status(&status));

        if status.rate != rate {
            tracing::warn!(
                "Device reports {}-bit results, decoded as {}-bit",
                status.rate.resolution_bits(),
                rate.resolution_bits()
            );
        }
    }

    if bytes.len() > 3 {
        tracing::warn!("Ignoring {} trailing bytes", bytes.len() - 3);
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(args.verbose);

    match args.action {
        Action::Command {
            ready,
            channel,
            config,
        } => {
            let byte = encode(config.command(Channel::from_bits(channel), ready));
            println!("{byte:#04x} ({byte:#010b})");
        }
        Action::Decode { rate, gain, bytes } => {
            decode_bytes(
                &bytes,
                SampleRate::from_bits(rate),
                Gain::from_multiplier(gain),
            )?;
        }
    }

    Ok(())
}
