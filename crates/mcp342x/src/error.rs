use core::fmt::Debug;

/// Fewer than two result bytes were available to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("conversion result needs 2 bytes, got {len}")]
pub struct InvalidSampleBuffer {
    pub len: usize,
}

/// Driver error, naming the operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E: Debug> {
    /// Writing the configuration byte failed; the driver state is unchanged.
    #[error("failed to write configuration: {0:?}")]
    Configure(E),
    /// Reading the conversion result failed.
    #[error("failed to read conversion result: {0:?}")]
    Read(E),
    /// The result could not be decoded.
    #[error(transparent)]
    InvalidSampleBuffer(#[from] InvalidSampleBuffer),
}

impl<E: Debug> Error<E> {
    /// The underlying bus error, if any.
    pub fn bus_error(&self) -> Option<&E> {
        match self {
            Self::Configure(e) | Self::Read(e) => Some(e),
            Self::InvalidSampleBuffer(_) => None,
        }
    }
}
