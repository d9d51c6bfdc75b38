//! Arguments and logging shared by the binaries.

use std::num::ParseIntError;

use clap::Args;
use mcp342x::{Channel, Command};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

/// Configuration register fields. Values are passed through as raw numbers
/// and coerced the same way the driver coerces them.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Convert continuously instead of once per command
    #[arg(long)]
    pub continuous: bool,

    /// Sample rate select: 0 = 240 sps (12 bit), 1 = 60 sps (14 bit), 2 = 15 sps (16 bit)
    #[arg(short, long, default_value_t = 2)]
    pub rate: u8,

    /// PGA gain: 1, 2, 4 or 8; anything else is unity gain
    #[arg(short, long, default_value_t = 1)]
    pub gain: u8,
}

impl ConfigArgs {
    pub fn command(&self, channel: Channel, ready: bool) -> Command {
        Command::from_raw(
            u8::from(self.continuous),
            u8::from(ready),
            channel as u8,
            self.rate,
            self.gain,
        )
    }
}

/// Parse a byte written as hex (`0x7f`), binary (`0b0101`) or decimal.
pub fn parse_byte(value: &str) -> Result<u8, ParseIntError> {
    let value = value.trim();

    if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16)
    } else if let Some(bin) = value.strip_prefix("0b").or_else(|| value.strip_prefix("0B")) {
        u8::from_str_radix(bin, 2)
    } else {
        value.parse()
    }
}

/// Log to stderr, filtering according to RUST_LOG, with INFO (or DEBUG when
/// verbose) as the default level.
pub fn init_tracing(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
