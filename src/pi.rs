//! Sample MCP342x ADCs attached to a Raspberry Pi I2C bus.

mod cli;
mod raspberry_pi;

use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use embedded_hal::i2c::I2c;
use embedded_hal_bus::i2c::MutexDevice;
use mcp342x::{to_nanovolts, Channel, Command, Error, Mcp342x, DEFAULT_ADDRESS, DEFAULT_CLOCK_HZ};

use cli::{init_tracing, parse_byte, ConfigArgs};

/// Reads per conversion before giving up on a fresh result.
const MAX_POLLS: u32 = 4;

/// MCP3426/3427/3428 sampler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// I2C bus number (/dev/i2c-N)
    #[arg(long, default_value_t = 1)]
    bus: u8,

    /// Device address, repeat for every ADC on the bus
    #[arg(short, long = "address", value_parser = parse_byte, default_values_t = [DEFAULT_ADDRESS])]
    addresses: Vec<u8>,

    /// Expected bus clock in Hz
    #[arg(long, default_value_t = DEFAULT_CLOCK_HZ)]
    clock_hz: u32,

    /// Channels to sample, 0-3, comma separated (default: all four)
    #[arg(long, value_delimiter = ',')]
    channels: Vec<u8>,

    #[command(flatten)]
    config: ConfigArgs,

    /// Delay between sampling rounds in milliseconds
    #[arg(long, default_value_t = 500)]
    interval_ms: u64,

    /// Number of rounds to sample, 0 to sample forever
    #[arg(long, default_value_t = 0)]
    count: u64,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn channels(&self) -> Vec<Channel> {
        if self.channels.is_empty() {
            Channel::all().collect()
        } else {
            self.channels.iter().map(|&ch| Channel::from_bits(ch)).collect()
        }
    }
}

/// Configure one channel, wait for its conversion and read it back.
///
/// Returns `None` if the device never reported a fresh result.
fn sample<I: I2c>(adc: &mut Mcp342x<I>, command: Command) -> Result<Option<i32>, Error<I::Error>> {
    let period = command.rate.conversion_time();

    adc.configure(command)?;
    thread::sleep(period);

    for _ in 0..MAX_POLLS {
        let (code, status) = adc.read_sample_with_status()?;

        if status.fresh {
            return Ok(Some(code));
        }

        thread::sleep(period / 4);
    }

    Ok(None)
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(args.verbose);

    let bus = Mutex::new(raspberry_pi::open_bus(args.bus, args.clock_hz)?);

    let mut adcs: Vec<_> = args
        .addresses
        .iter()
        .map(|&address| Mcp342x::new(MutexDevice::new(&bus), address, args.clock_hz))
        .collect();

    let channels = args.channels();
    let interval = Duration::from_millis(args.interval_ms);

    tracing::info!(
        "Sampling {} device(s) on bus {}, channels {:?}",
        adcs.len(),
        args.bus,
        channels
    );

    let mut rounds = 0;

    loop {
        for adc in adcs.iter_mut() {
            for &channel in &channels {
                let command = args.config.command(channel, true);

                match sample(adc, command) {
                    Ok(Some(code)) => {
                        let volts = to_nanovolts(code, command.rate, command.gain) as f64 / 1e9;
                        tracing::info!("{:#04x} {channel:?}: {code} ({volts:+.6} V)", adc.address());
                    }
                    Ok(None) => {
                        tracing::warn!("{:#04x} {channel:?}: no fresh conversion", adc.address());
                    }
                    Err(e) => {
                        tracing::warn!("{:#04x} {channel:?}: {e}", adc.address());
                    }
                }
            }
        }

        rounds += 1;

        if args.count != 0 && rounds >= args.count {
            break;
        }

        thread::sleep(interval);
    }

    Ok(())
}
