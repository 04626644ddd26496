use crate::OneWireCrc;
use core::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

/// 64-bit ROM code identifying a single 1-Wire device.
///
/// | Byte | Description |
/// |------|-------------|
/// | 0 | Family code (e.g., 0x28 for DS18B20) |
/// | 1-6 | Serial number, least significant byte first |
/// | 7 | CRC-8 of bytes 0-6 |
///
/// The bytes are kept in bus order, so `u64` conversions are little-endian.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Rom([u8; 8]);

impl Rom {
    /// Number of bits in a ROM code.
    pub const BITS: u8 = 64;

    /// Build a ROM code from a family code and a 48-bit serial number,
    /// appending the CRC.
    pub fn new(family: u8, serial: [u8; 6]) -> Self {
        let mut raw = [0; 8];
        raw[0] = family;
        raw[1..7].copy_from_slice(&serial);
        raw[7] = OneWireCrc::compute(&raw[..7]);
        Self(raw)
    }

    /// Family code of the device.
    pub fn family(&self) -> u8 {
        self.0[0]
    }

    /// 48-bit serial number of the device.
    pub fn serial(&self) -> [u8; 6] {
        let mut serial = [0; 6];
        serial.copy_from_slice(&self.0[1..7]);
        serial
    }

    /// CRC byte carried in the ROM code.
    pub fn crc(&self) -> u8 {
        self.0[7]
    }

    /// Whether the trailing CRC matches the preceding seven bytes.
    pub fn is_valid(&self) -> bool {
        OneWireCrc::validate(&self.0)
    }

    /// Bytes of the ROM code in bus order.
    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// Value of bit `n` (0-based, in bus order).
    ///
    /// # Panics
    /// If `n` is not below [`Rom::BITS`].
    pub fn bit(&self, n: u8) -> bool {
        assert!(n < Self::BITS, "ROM bit {n} out of range");
        self.0[(n / 8) as usize] & (1 << (n % 8)) != 0
    }
}

impl From<[u8; 8]> for Rom {
    fn from(raw: [u8; 8]) -> Self {
        Self(raw)
    }
}

impl From<Rom> for [u8; 8] {
    fn from(rom: Rom) -> Self {
        rom.0
    }
}

impl From<u64> for Rom {
    fn from(value: u64) -> Self {
        Self(value.to_le_bytes())
    }
}

impl From<Rom> for u64 {
    fn from(rom: Rom) -> Self {
        u64::from_le_bytes(rom.0)
    }
}

impl AsRef<[u8]> for Rom {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for Rom {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let r = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            r[0], r[1], r[2], r[3], r[4], r[5], r[6], r[7]
        )
    }
}

/// Error returned when parsing a [`Rom`] from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RomParseError {
    /// Fewer than 16 hex digits.
    NotEnough,
    /// More than 16 hex digits.
    TooMany,
    /// A character that is not a hex digit or separator.
    Invalid,
}

impl Display for RomParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotEnough => "ROM code has fewer than 16 hex digits",
            Self::TooMany => "ROM code has more than 16 hex digits",
            Self::Invalid => "ROM code contains an invalid character",
        })
    }
}

impl core::error::Error for RomParseError {}

impl FromStr for Rom {
    type Err = RomParseError;

    /// Parses 16 hex digits in bus order, optionally separated by `:`, `-` or whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut raw = [0u8; 8];
        let mut digits = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ':' && *c != '-');
        for byte in raw.iter_mut() {
            let (Some(hi), Some(lo)) = (digits.next(), digits.next()) else {
                return Err(RomParseError::NotEnough);
            };
            match (hi.to_digit(16), lo.to_digit(16)) {
                (Some(hi), Some(lo)) => *byte = ((hi << 4) | lo) as u8,
                _ => return Err(RomParseError::Invalid),
            }
        }
        if digits.next().is_some() {
            return Err(RomParseError::TooMany);
        }
        Ok(Self(raw))
    }
}
