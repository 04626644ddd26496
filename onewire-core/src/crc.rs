/// Reflected form of the 1-Wire polynomial x^8 + x^5 + x^4 + 1 (0x31).
const POLY_REFLECTED: u8 = 0x8c;

#[cfg(feature = "crc-table")]
static CRC_TABLE: [u8; 256] = build_table();

#[cfg(feature = "crc-table")]
const fn build_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = crc_bits(i as u8);
        i += 1;
    }
    table
}

const fn crc_bits(mut crc: u8) -> u8 {
    let mut bit = 0;
    while bit < 8 {
        crc = if crc & 0x1 == 0x1 {
            (crc >> 1) ^ POLY_REFLECTED
        } else {
            crc >> 1
        };
        bit += 1;
    }
    crc
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
/// Calculate CRC-8 used in 1-Wire communications.
///
/// Polynomial 0x31 with reflected input and output, zero initial value and
/// no final XOR (the Dallas/Maxim CRC).
pub struct OneWireCrc(u8);

impl OneWireCrc {
    /// Get the current CRC value
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Update the CRC with the incoming byte.
    pub fn update(&mut self, byte: u8) {
        #[cfg(feature = "crc-table")]
        {
            self.0 = CRC_TABLE[(self.0 ^ byte) as usize];
        }
        #[cfg(not(feature = "crc-table"))]
        {
            self.0 = crc_bits(self.0 ^ byte);
        }
    }

    /// Compute the CRC of a sequence of bytes.
    pub fn compute(data: &[u8]) -> u8 {
        let mut crc = OneWireCrc::default();
        for &byte in data {
            crc.update(byte);
        }
        crc.value()
    }

    /// Validate a sequence of bytes where the last byte is the 1-Wire CRC of
    /// the previous bytes.
    ///
    /// An empty sequence carries no CRC and is never valid.
    pub fn validate(sequence: &[u8]) -> bool {
        match sequence.split_last() {
            Some((&crc, data)) => Self::compute(data) == crc,
            None => false,
        }
    }
}
