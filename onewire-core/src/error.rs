use core::fmt;

/// One wire communication error type.
#[derive(Debug, PartialEq, Eq)]
pub enum OneWireError<E> {
    /// Encapsulates the error type from the underlying hardware.
    Other(E),
    /// Indicates that no device answered the reset with a presence pulse.
    NoDevicePresent,
    /// Computed CRC of the ROM is invalid.
    InvalidRomCrc,
}

impl<E> From<E> for OneWireError<E> {
    fn from(other: E) -> Self {
        Self::Other(other)
    }
}

impl<E: fmt::Display> fmt::Display for OneWireError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(e) => write!(f, "bus error: {e}"),
            Self::NoDevicePresent => f.write_str("no device present on the bus"),
            Self::InvalidRomCrc => f.write_str("ROM code failed CRC-8 check"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> core::error::Error for OneWireError<E> {}
