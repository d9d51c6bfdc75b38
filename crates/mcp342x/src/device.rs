use embedded_hal::i2c::I2c;

use crate::config::{Command, SampleRate, Status};
use crate::{decode, Error, DEFAULT_ADDRESS, DEFAULT_CLOCK_HZ};

/// MCP3426/3427/3428 driver
///
/// The bus is not owned in any meaningful sense: pass `&mut` to a bus, or an
/// `embedded-hal-bus` device to share it with other drivers. Each configure and
/// each read is a single transaction, so a sharing device holds its lock for
/// exactly one of them.
pub struct Mcp342x<I2C> {
    i2c: I2C,
    address: u8,
    clock_hz: u32,
    rate: SampleRate,
}

impl<I2C: I2c> Mcp342x<I2C> {
    /// Creates a new driver for the device at `address`.
    ///
    /// `clock_hz` is the bus clock the transport is expected to run at. It is
    /// kept for whoever opens the bus; `embedded-hal` gives the driver no way to set it.
    pub fn new(i2c: I2C, address: u8, clock_hz: u32) -> Self {
        Self {
            i2c,
            address,
            clock_hz,
            rate: SampleRate::Sps240,
        }
    }

    /// Write the configuration register and return the byte that was sent.
    ///
    /// Later reads are decoded at the resolution of `command.rate`, but only
    /// once the write has succeeded.
    pub fn configure(&mut self, command: Command) -> Result<u8, Error<I2C::Error>> {
        let byte = command.to_byte();

        self.i2c
            .write(self.address, &[byte])
            .map_err(Error::Configure)?;

        #[cfg(feature = "defmt")]
        defmt::trace!("mcp342x {=u8:#x}: configured {=u8:#b}", self.address, byte);

        self.rate = command.rate;

        Ok(byte)
    }

    /// [`configure`](Self::configure) from untyped values, see [`Command::from_raw`].
    pub fn configure_raw(
        &mut self,
        conversion_mode: u8,
        ready: u8,
        channel: u8,
        sample_rate: u8,
        gain: u8,
    ) -> Result<u8, Error<I2C::Error>> {
        self.configure(Command::from_raw(
            conversion_mode,
            ready,
            channel,
            sample_rate,
            gain,
        ))
    }

    /// Read the latest conversion result as a signed code whose range depends
    /// on the last configured sample rate.
    pub fn read_sample(&mut self) -> Result<i32, Error<I2C::Error>> {
        let mut buffer = [0; 2];
        self.read_into(&mut buffer)?;

        Ok(decode(&buffer, self.rate)?)
    }

    /// Read the latest conversion result along with the configuration byte the device echoes after it.
    pub fn read_sample_with_status(&mut self) -> Result<(i32, Status), Error<I2C::Error>> {
        let mut buffer = [0; 3];
        self.read_into(&mut buffer)?;

        let sample = decode(&buffer, self.rate)?;

        Ok((sample, Status::from(buffer[2])))
    }

    fn read_into(&mut self, buffer: &mut [u8]) -> Result<(), Error<I2C::Error>> {
        self.i2c
            .read(self.address, buffer)
            .map_err(Error::Read)?;

        #[cfg(feature = "defmt")]
        defmt::trace!("mcp342x {=u8:#x}: read {=[u8]:#x}", self.address, &buffer[..]);

        Ok(())
    }

    /// 7-bit slave address of the device.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Bus clock the transport is expected to run at.
    pub fn clock_hz(&self) -> u32 {
        self.clock_hz
    }

    /// Sample rate reads are currently decoded at.
    pub fn sample_rate(&self) -> SampleRate {
        self.rate
    }

    /// Bits of the first result byte that carry magnitude, see [`SampleRate::decode_mask`].
    pub fn decode_mask(&self) -> u8 {
        self.rate.decode_mask()
    }

    /// Give the bus back.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> From<I2C> for Mcp342x<I2C> {
    fn from(i2c: I2C) -> Self {
        Self::new(i2c, DEFAULT_ADDRESS, DEFAULT_CLOCK_HZ)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Channel, ConversionMode, Gain};
    use core::cell::RefCell;
    use embedded_hal::i2c::{Error as _, ErrorKind, ErrorType, NoAcknowledgeSource, Operation};
    use embedded_hal_bus::i2c::{MutexDevice, RefCellDevice};
    use std::sync::Mutex;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum MockError {
        Nack,
        Timeout,
    }

    impl embedded_hal::i2c::Error for MockError {
        fn kind(&self) -> ErrorKind {
            match self {
                MockError::Nack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
                MockError::Timeout => ErrorKind::Other,
            }
        }
    }

    /// Records every write and answers reads with `result`.
    #[derive(Default)]
    struct MockI2c {
        writes: Vec<(u8, Vec<u8>)>,
        reads: Vec<(u8, usize)>,
        result: [u8; 3],
        fail_writes: bool,
        fail_reads: bool,
    }

    impl MockI2c {
        fn with_result(result: [u8; 3]) -> Self {
            Self {
                result,
                ..Self::default()
            }
        }
    }

    impl ErrorType for MockI2c {
        type Error = MockError;
    }

    impl I2c for MockI2c {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            assert_eq!(operations.len(), 1, "Driver should issue single operation transactions");

            match &mut operations[0] {
                Operation::Write(bytes) => {
                    if self.fail_writes {
                        return Err(MockError::Nack);
                    }
                    self.writes.push((address, bytes.to_vec()));
                }
                Operation::Read(buffer) => {
                    if self.fail_reads {
                        return Err(MockError::Timeout);
                    }
                    self.reads.push((address, buffer.len()));
                    let len = buffer.len().min(self.result.len());
                    buffer[..len].copy_from_slice(&self.result[..len]);
                }
            }

            Ok(())
        }
    }

    #[test]
    fn defaults() {
        let mcp = Mcp342x::from(MockI2c::default());

        assert_eq!(mcp.address(), 0x68);
        assert_eq!(mcp.clock_hz(), 400_000);
        assert_eq!(mcp.sample_rate(), SampleRate::Sps240);
        assert_eq!(mcp.decode_mask(), 0x07);
    }

    #[test]
    fn configure_writes_one_byte() {
        let mut mcp = Mcp342x::new(MockI2c::default(), 0x6A, 100_000);

        assert_eq!(mcp.configure_raw(1, 0, 2, 1, 4), Ok(0x56));
        assert_eq!(mcp.decode_mask(), 0x1F);

        let i2c = mcp.release();
        assert_eq!(i2c.writes, [(0x6A, vec![0x56])]);
        assert!(i2c.reads.is_empty());
    }

    #[test]
    fn configure_tracks_mask() {
        let mut mcp = Mcp342x::from(MockI2c::default());

        let table = [
            (0, 0x07),
            (1, 0x1F),
            (2, 0x7F),
            (3, 0x7F),
            (4, 0x07),
            (7, 0x7F),
            (5, 0x1F),
        ];

        for (rate, mask) in table {
            mcp.configure_raw(0, 0, 0, rate, 1).unwrap();
            assert_eq!(mcp.decode_mask(), mask);
        }
    }

    #[test]
    fn configure_is_idempotent() {
        let mut mcp = Mcp342x::from(MockI2c::default());
        let command = Command {
            ready: true,
            channel: Channel::CH2,
            mode: ConversionMode::OneShot,
            rate: SampleRate::Sps60,
            gain: Gain::X2,
        };

        let first = mcp.configure(command).unwrap();
        let mask = mcp.decode_mask();
        let second = mcp.configure(command).unwrap();

        assert_eq!(first, second);
        assert_eq!(mcp.decode_mask(), mask);
        assert_eq!(mcp.release().writes.len(), 2);
    }

    #[test]
    fn read_uses_latest_rate() {
        let mut mcp = Mcp342x::from(MockI2c::with_result([0x08, 0x00, 0x00]));

        mcp.configure_raw(0, 0, 0, 2, 1).unwrap();
        assert_eq!(mcp.read_sample(), Ok(2048));

        mcp.configure_raw(0, 0, 0, 0, 1).unwrap();
        assert_eq!(mcp.read_sample(), Ok(-2048));

        assert_eq!(mcp.release().reads, [(0x68, 2), (0x68, 2)]);
    }

    #[test]
    fn read_before_configure_is_12_bit() {
        let mut mcp = Mcp342x::from(MockI2c::with_result([0x07, 0xFF, 0x00]));
        assert_eq!(mcp.read_sample(), Ok(2047));
    }

    #[test]
    fn read_16_bit() {
        let mut i2c = MockI2c::with_result([0x7F, 0xFF, 0x00]);
        let mut mcp = Mcp342x::from(&mut i2c);
        mcp.configure(Command::default()).unwrap();
        assert_eq!(mcp.read_sample(), Ok(32767));

        i2c.result = [0x80, 0x00, 0x00];
        let mut mcp = Mcp342x::from(&mut i2c);
        mcp.configure(Command::default()).unwrap();
        assert_eq!(mcp.read_sample(), Ok(-32768));
    }

    #[test]
    fn read_with_status() {
        let mut mcp = Mcp342x::from(MockI2c::with_result([0xFF, 0x9C, 0b1_01_0_10_00]));
        mcp.configure_raw(0, 1, 1, 2, 1).unwrap();

        let (sample, status) = mcp.read_sample_with_status().unwrap();
        assert_eq!(sample, -100);
        assert!(!status.fresh);
        assert_eq!(status.channel, Channel::CH2);
        assert_eq!(status.rate, SampleRate::Sps15);

        assert_eq!(mcp.release().reads, [(0x68, 3)]);
    }

    #[test]
    fn write_failure_is_reported() {
        let mut mcp = Mcp342x::from(MockI2c {
            fail_writes: true,
            ..MockI2c::default()
        });

        let err = mcp.configure_raw(0, 0, 0, 2, 1).unwrap_err();
        assert_eq!(err, Error::Configure(MockError::Nack));
        assert_eq!(
            err.bus_error().map(|e| e.kind()),
            Some(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))
        );

        // The device never saw the new rate.
        assert_eq!(mcp.decode_mask(), 0x07);
    }

    #[test]
    fn read_failure_is_reported() {
        let mut mcp = Mcp342x::from(MockI2c {
            fail_reads: true,
            result: [0x12, 0x34, 0x00],
            ..MockI2c::default()
        });

        assert_eq!(mcp.read_sample(), Err(Error::Read(MockError::Timeout)));
        assert_eq!(
            mcp.read_sample_with_status(),
            Err(Error::Read(MockError::Timeout))
        );
    }

    #[test]
    fn shared_bus() {
        let bus = RefCell::new(MockI2c::with_result([0x00, 0x2A, 0x00]));

        let mut first = Mcp342x::new(RefCellDevice::new(&bus), 0x68, 400_000);
        let mut second = Mcp342x::new(RefCellDevice::new(&bus), 0x6C, 400_000);

        first.configure_raw(1, 0, 0, 2, 1).unwrap();
        second.configure_raw(1, 0, 3, 0, 8).unwrap();

        assert_eq!(first.read_sample(), Ok(42));
        assert_eq!(second.read_sample(), Ok(42));
        assert_eq!(first.decode_mask(), 0x7F);
        assert_eq!(second.decode_mask(), 0x07);

        let bus = bus.into_inner();
        assert_eq!(bus.writes, [(0x68, vec![0b0001_1000]), (0x6C, vec![0b0111_0011])]);
        assert_eq!(bus.reads, [(0x68, 2), (0x6C, 2)]);
    }

    #[test]
    fn bus_lock_released_after_failure() {
        let bus = Mutex::new(MockI2c {
            fail_writes: true,
            fail_reads: true,
            ..MockI2c::default()
        });

        let mut mcp = Mcp342x::from(MutexDevice::new(&bus));

        assert!(mcp.configure(Command::default()).is_err());
        assert!(mcp.read_sample().is_err());

        let mut guard = bus.try_lock().expect("Bus should be unlocked after a failed transaction");
        guard.fail_writes = false;
        guard.fail_reads = false;
        guard.result = [0x00, 0x05, 0x00];
        drop(guard);

        assert_eq!(mcp.configure(Command::default()), Ok(0b0000_1000));
        assert_eq!(mcp.read_sample(), Ok(5));
    }
}
