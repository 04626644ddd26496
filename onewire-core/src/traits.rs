use crate::{
    OneWireError, OneWireResult, Rom,
    consts::{ONEWIRE_MATCH_ROM_CMD, ONEWIRE_SKIP_ROM_CMD},
};

/// Outcome of one step of the ROM search.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Triplet {
    /// First read slot: the wired-AND of the current bit of all participating devices.
    pub id_bit: bool,
    /// Second read slot: the wired-AND of the complement of that bit.
    pub complement_bit: bool,
    /// Direction written in the third slot; devices whose bit differs drop out of the search.
    pub direction: bool,
}

/// Trait for 1-Wire communication.
/// This trait defines the basic operations required for 1-Wire communication, such as resetting the bus,
/// writing and reading bytes, and writing and reading bits.
pub trait OneWire {
    /// The error type returned by the operations of this trait.
    /// This type is used to indicate errors in the underlying hardware or communication.
    type BusError;

    /// Resets the 1-Wire bus.
    ///
    /// # Returns
    /// `true` if at least one device answered with a presence pulse.
    ///
    /// # Errors
    /// This method returns an error if the reset operation fails.
    fn reset(&mut self) -> OneWireResult<bool, Self::BusError>;

    /// Writes a byte to the 1-Wire bus.
    /// # Arguments
    /// * `byte` - The byte to write to the bus.
    ///
    /// # Errors
    /// This method returns an error if the write operation fails.
    fn write_byte(&mut self, byte: u8) -> OneWireResult<(), Self::BusError>;

    /// Reads a byte from the 1-Wire bus.
    /// # Returns
    /// Byte read from the bus.
    ///
    /// # Errors
    /// This method returns an error if the read operation fails.
    fn read_byte(&mut self) -> OneWireResult<u8, Self::BusError>;

    /// Writes a single bit to the 1-Wire bus.
    /// # Arguments
    ///
    /// * `bit` - The bit to write.
    ///
    /// # Errors
    /// This method returns an error if the write operation fails.
    fn write_bit(&mut self, bit: bool) -> OneWireResult<(), Self::BusError>;

    /// Reads a single bit from the 1-Wire bus.
    /// # Returns
    /// The bit read from the bus.
    /// # Errors
    /// This method returns an error if the read operation fails.
    fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError>;

    /// Writes every byte of `data`, one byte at a time.
    fn write_bytes(&mut self, data: &[u8]) -> OneWireResult<(), Self::BusError> {
        for &byte in data {
            self.write_byte(byte)?;
        }
        Ok(())
    }

    /// Fills `buf` with bytes read from the bus, one byte at a time.
    fn read_bytes(&mut self, buf: &mut [u8]) -> OneWireResult<(), Self::BusError> {
        for byte in buf.iter_mut() {
            *byte = self.read_byte()?;
        }
        Ok(())
    }

    /// Generates the three time slots of one [1-wire search](https://www.analog.com/en/resources/app-notes/1wire-search-algorithm.html) step:
    /// two read time slots and one write time slot.
    ///
    /// The direction argument determines the written bit if both read time slots are 0 (a
    /// discrepancy). If the read time slots are 0 and 1, a 0 is written; if they are 1 and 0,
    /// a 1 is written. If both read time slots are 1 (no device is participating) a 1 is written.
    ///
    /// The default implementation composes the step from [`OneWire::read_bit`] and
    /// [`OneWire::write_bit`]; bus masters with a hardware triplet should override it.
    fn triplet(&mut self, direction: bool) -> OneWireResult<Triplet, Self::BusError> {
        let id_bit = self.read_bit()?;
        let complement_bit = self.read_bit()?;
        let direction = if id_bit != complement_bit {
            id_bit
        } else if id_bit {
            true
        } else {
            direction
        };
        self.write_bit(direction)?;
        Ok(Triplet {
            id_bit,
            complement_bit,
            direction,
        })
    }

    /// Addresses all devices on the bus simultaneously (Skip ROM).
    ///
    /// Must directly follow a [`OneWire::reset`].
    fn skip(&mut self) -> OneWireResult<(), Self::BusError> {
        self.write_byte(ONEWIRE_SKIP_ROM_CMD)
    }

    /// Addresses exactly one device for the commands that follow (Match ROM).
    ///
    /// Must directly follow a [`OneWire::reset`].
    fn select(&mut self, rom: &Rom) -> OneWireResult<(), Self::BusError> {
        self.write_byte(ONEWIRE_MATCH_ROM_CMD)?;
        self.write_bytes(rom.as_bytes())
    }

    /// Resets the bus and addresses devices on it.
    ///
    /// Note: A [`OneWire::read_byte`] or [`OneWire::read_bit`] call will return garbage data if
    /// this method is called without specifying a ROM address on a bus with multiple devices.
    /// # Arguments
    /// * `rom` - The ROM address of the device to address. Pass [`None`] to skip ROM addressing and address all devices on the bus.
    ///
    /// # Errors
    /// Returns [`OneWireError::NoDevicePresent`] if no device answered the reset.
    fn address(&mut self, rom: Option<&Rom>) -> OneWireResult<(), Self::BusError> {
        if !self.reset()? {
            return Err(OneWireError::NoDevicePresent);
        }
        match rom {
            Some(rom) => self.select(rom),
            None => self.skip(),
        }
    }
}
