//! Linux I2C bus access through `rppal`.

use anyhow::{Context, Result};
use mcp342x::READ_TIMEOUT_MS;
use rppal::i2c::I2c;

/// Open `/dev/i2c-{bus}` with the read timeout the MCP342x driver expects.
///
/// The bus clock is fixed by the device tree on Linux, so `clock_hz` is only
/// compared against what the kernel reports.
pub fn open_bus(bus: u8, clock_hz: u32) -> Result<I2c> {
    let i2c = I2c::with_bus(bus).with_context(|| format!("Failed to open I2C bus {bus}"))?;

    i2c.set_timeout(READ_TIMEOUT_MS)
        .context("Failed to set I2C timeout")?;

    match i2c.clock_speed() {
        Ok(actual) if actual != clock_hz => {
            tracing::warn!("I2C bus {bus} runs at {actual} Hz, not the requested {clock_hz} Hz");
        }
        Ok(actual) => tracing::debug!("I2C bus {bus} runs at {actual} Hz"),
        Err(e) => tracing::debug!("Could not read the I2C bus clock: {e}"),
    }

    Ok(i2c)
}
