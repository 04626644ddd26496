use core::fmt;

#[derive(Debug, PartialEq, Eq)]
/// DS248x Hardware Errors
pub enum Ds248xError<E> {
    /// I2C bus errors.
    I2c(E),
    /// Busy wait retries exceeded.
    RetriesExceeded,
    /// The configuration read back after a write differs from the one written.
    ConfigMismatch,
    /// The channel read back after a channel select differs from the one requested.
    ChannelMismatch,
    /// Channel number out of range for the bridge model.
    InvalidChannel(u8),
    /// The bridge model does not support the operation.
    Unsupported,
    /// The status register did not report a clean state after a device reset.
    DeviceResetFailed,
}

impl<E> From<E> for Ds248xError<E> {
    fn from(value: E) -> Self {
        Self::I2c(value)
    }
}

impl<E: fmt::Display> fmt::Display for Ds248xError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I2c(e) => write!(f, "I2C error: {e}"),
            Self::RetriesExceeded => f.write_str("bridge stayed busy past the retry budget"),
            Self::ConfigMismatch => f.write_str("configuration readback mismatch"),
            Self::ChannelMismatch => f.write_str("channel readback mismatch"),
            Self::InvalidChannel(ch) => write!(f, "invalid channel {ch}"),
            Self::Unsupported => f.write_str("operation not supported by this bridge model"),
            Self::DeviceResetFailed => f.write_str("device reset not successful"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> core::error::Error for Ds248xError<E> {}
