//! Fields of the configuration register.
//!
//! Every constructor taking a raw integer is permissive: values are reduced to
//! the width of their field, and out of range sample rates and gains fall back
//! to 15 sps and unity gain instead of failing.

use core::time::Duration;

/// Conversion mode select bit (O/C).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ConversionMode {
    /// Convert once, then stand by until the ready bit is written again.
    OneShot = 0,
    /// Convert continuously.
    Continuous = 1,
}

impl ConversionMode {
    /// Keeps only the low bit.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 1 {
            0 => Self::OneShot,
            _ => Self::Continuous,
        }
    }
}

/// Channel list for MCP3426/3427/3428.
///
/// `CH3` and `CH4` only exist on the MCP3428; the two channel parts treat them as `CH1` and `CH2`.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Channel {
    CH1 = 0,
    CH2 = 1,
    CH3 = 2,
    CH4 = 3,
}

impl Channel {
    /// Keeps only the low two bits.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::CH1,
            1 => Self::CH2,
            2 => Self::CH3,
            _ => Self::CH4,
        }
    }

    /// Iterate over all channels.
    pub fn all() -> impl Iterator<Item = Self> {
        [Self::CH1, Self::CH2, Self::CH3, Self::CH4].into_iter()
    }
}

/// Sample rate select bits, which also fix the resolution of the result.
///
/// | Rate      | Bits | Min code | Max code |
/// | ---:      | :--: | ---:     | ---:     |
/// | 240 sps   | 12   | -2,048   | 2,047    |
/// | 60 sps    | 14   | -8,192   | 8,191    |
/// | 15 sps    | 16   | -32,768  | 32,767   |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SampleRate {
    Sps240 = 0,
    Sps60 = 1,
    Sps15 = 2,
}

impl SampleRate {
    /// Keeps the low two bits; the reserved value 3 becomes [`SampleRate::Sps15`].
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::Sps240,
            1 => Self::Sps60,
            _ => Self::Sps15,
        }
    }

    /// Bits of the first result byte that carry magnitude.
    pub fn decode_mask(self) -> u8 {
        match self {
            Self::Sps240 => 0x07,
            Self::Sps60 => 0x1F,
            Self::Sps15 => 0x7F,
        }
    }

    /// Width of the signed result.
    pub fn resolution_bits(self) -> u32 {
        match self {
            Self::Sps240 => 12,
            Self::Sps60 => 14,
            Self::Sps15 => 16,
        }
    }

    /// Most negative code at this resolution.
    pub fn min_code(self) -> i32 {
        -(1 << (self.resolution_bits() - 1))
    }

    /// Most positive code at this resolution.
    pub fn max_code(self) -> i32 {
        (1 << (self.resolution_bits() - 1)) - 1
    }

    /// Nominal conversions per second.
    pub fn samples_per_second(self) -> u32 {
        match self {
            Self::Sps240 => 240,
            Self::Sps60 => 60,
            Self::Sps15 => 15,
        }
    }

    /// Length of one sample period, rounded up to the microsecond.
    pub fn conversion_time(self) -> Duration {
        let sps = self.samples_per_second();
        Duration::from_micros(u64::from(1_000_000_u32.div_ceil(sps)))
    }

    /// Weight of one code at unity gain: 2 * 2.048 V / 2^N.
    pub fn lsb_nanovolts(self) -> i64 {
        match self {
            Self::Sps240 => 1_000_000,
            Self::Sps60 => 250_000,
            Self::Sps15 => 62_500,
        }
    }
}

/// PGA gain select bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Gain {
    X1 = 0,
    X2 = 1,
    X4 = 2,
    X8 = 3,
}

impl Gain {
    /// Maps 1, 2, 4 and 8 to their select bits. Anything else is unity gain.
    pub fn from_multiplier(multiplier: u8) -> Self {
        match multiplier {
            2 => Self::X2,
            4 => Self::X4,
            8 => Self::X8,
            _ => Self::X1,
        }
    }

    fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::X1,
            1 => Self::X2,
            2 => Self::X4,
            _ => Self::X8,
        }
    }

    /// Gain as a multiplier: 1, 2, 4 or 8.
    pub fn multiplier(self) -> u8 {
        1 << self as u8
    }
}

/// A value for the configuration register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Command {
    /// In one-shot mode, starts a new conversion. Ignored in continuous mode.
    pub ready: bool,
    pub channel: Channel,
    pub mode: ConversionMode,
    pub rate: SampleRate,
    pub gain: Gain,
}

impl Default for Command {
    fn default() -> Self {
        Self {
            ready: false,
            channel: Channel::CH1,
            mode: ConversionMode::OneShot,
            rate: SampleRate::Sps15,
            gain: Gain::X1,
        }
    }
}

impl Command {
    /// Build a command from untyped values, coercing each one into range.
    pub fn from_raw(conversion_mode: u8, ready: u8, channel: u8, sample_rate: u8, gain: u8) -> Self {
        Self {
            ready: ready & 1 == 1,
            channel: Channel::from_bits(channel),
            mode: ConversionMode::from_bits(conversion_mode),
            rate: SampleRate::from_bits(sample_rate),
            gain: Gain::from_multiplier(gain),
        }
    }

    /// `[RDY][C1 C0][O/C][S1 S0][G1 G0]`
    pub fn to_byte(&self) -> u8 {
        (u8::from(self.ready) << 7)
            | ((self.channel as u8) << 5)
            | ((self.mode as u8) << 4)
            | ((self.rate as u8) << 2)
            | self.gain as u8
    }
}

impl From<Command> for u8 {
    fn from(command: Command) -> Self {
        command.to_byte()
    }
}

/// Configuration byte returned after the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status {
    /// The result bytes hold a conversion that has not been read yet.
    pub fresh: bool,
    pub channel: Channel,
    pub mode: ConversionMode,
    pub rate: SampleRate,
    pub gain: Gain,
}

impl From<u8> for Status {
    fn from(byte: u8) -> Self {
        Self {
            fresh: byte & 0x80 == 0,
            channel: Channel::from_bits(byte >> 5),
            mode: ConversionMode::from_bits(byte >> 4),
            rate: SampleRate::from_bits(byte >> 2),
            gain: Gain::from_bits(byte),
        }
    }
}

/// Input voltage in nanovolts for a decoded code.
pub fn to_nanovolts(code: i32, rate: SampleRate, gain: Gain) -> i64 {
    i64::from(code) * rate.lsb_nanovolts() / i64::from(gain.multiplier())
}
