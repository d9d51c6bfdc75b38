//! Provides a driver for the Microchip MCP3426/3427/3428 I2C ADCs via the `embedded-hal` ecosystem.
//!
//! The chip is controlled by a single configuration byte and returns a two byte
//! result (plus an echo of the configuration byte). The width of the result
//! depends on the sample rate chosen by the last [`Command`] written, so the
//! driver remembers it between [`Mcp342x::configure`] and [`Mcp342x::read_sample`].
//!
//! # Features
//!
//! - **`defmt`**: derive `defmt::Format` on public types and trace each bus transaction.

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]

pub mod config;
mod device;
mod error;

pub use config::{to_nanovolts, Channel, Command, ConversionMode, Gain, SampleRate, Status};
pub use device::Mcp342x;
pub use error::{Error, InvalidSampleBuffer};

/// Slave address with both address pins tied low (or floating on the MCP3426).
pub const DEFAULT_ADDRESS: u8 = 0x68;

/// Fast-mode bus clock.
pub const DEFAULT_CLOCK_HZ: u32 = 400_000;

/// Read timeout in milliseconds the transport should be opened with.
pub const READ_TIMEOUT_MS: u32 = 500;

/// Decode the first two bytes of a conversion result into a signed code.
///
/// Only the bits under `rate.decode_mask()` in the first byte carry magnitude.
/// The device repeats the sign bit through the rest of the byte, so the code is
/// negative if either bit 7 or the resolution's own sign bit is set.
pub fn decode(bytes: &[u8], rate: SampleRate) -> Result<i32, InvalidSampleBuffer> {
    let [high, low] = match bytes {
        [high, low, ..] => [*high, *low],
        _ => return Err(InvalidSampleBuffer { len: bytes.len() }),
    };

    let mask = rate.decode_mask();
    let sign = mask + 1;

    let raw = (i32::from(high & mask) << 8) | i32::from(low);

    if high & 0x80 != 0 || high & sign != 0 {
        let full_scale = (i32::from(mask) << 8) | 0xFF;
        Ok(raw - full_scale - 1)
    } else {
        Ok(raw)
    }
}
