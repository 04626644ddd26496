use crate::{
    OneWire, OneWireCrc, OneWireError, OneWireResult, Rom,
    consts::{ONEWIRE_CONDITIONAL_SEARCH_CMD, ONEWIRE_SEARCH_CMD},
};

#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
/// Type of search performed using [`SearchState`].
pub enum SearchKind {
    /// Normal search
    #[default]
    Normal = ONEWIRE_SEARCH_CMD,
    /// Search only for devices with alarm
    Alarmed = ONEWIRE_CONDITIONAL_SEARCH_CMD,
}

/// State of a ROM search that persists across calls.
///
/// Implements the [1-Wire search algorithm](https://www.analog.com/en/resources/app-notes/1wire-search-algorithm.html):
/// each call to [`next`](SearchState::next) walks the 64-bit address tree once and returns one
/// device, remembering where the last untaken `0` branch was so the next call explores it.
///
/// Bit positions in this state are 1-based; a discrepancy of `0` means none is remembered.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SearchState {
    kind: SearchKind,
    last_device: bool,
    last_discrepancy: u8,
    last_family_discrepancy: u8,
    rom: [u8; 8],
}

impl SearchState {
    /// Creates a new, zeroed search state for a normal search.
    pub const fn new() -> Self {
        Self::with_kind(SearchKind::Normal)
    }

    /// Creates a new, zeroed search state for the given search kind.
    pub const fn with_kind(kind: SearchKind) -> Self {
        Self {
            kind,
            last_device: false,
            last_discrepancy: 0,
            last_family_discrepancy: 0,
            rom: [0; 8],
        }
    }

    /// Resets the search state so the next search starts over from the first device.
    ///
    /// The search kind is kept.
    pub fn reset(&mut self) {
        *self = Self::with_kind(self.kind);
    }

    /// Sets up the next search to find the first device of `family`.
    ///
    /// If no device of that family is present, the next search returns the first device of
    /// the next higher family, or `None`.
    pub fn target_family(&mut self, family: u8) {
        self.reset();
        self.rom[0] = family;
        self.last_discrepancy = Rom::BITS;
    }

    /// Sets up the next search to skip all remaining devices of the family just found.
    pub fn skip_family(&mut self) {
        self.last_discrepancy = self.last_family_discrepancy;
        self.last_family_discrepancy = 0;
        if self.last_discrepancy == 0 {
            self.last_device = true;
        }
    }

    /// Search command issued by this state.
    pub fn kind(&self) -> SearchKind {
        self.kind
    }

    /// Bit position (1-based) of the last untaken `0` branch, `0` if none.
    pub fn last_discrepancy(&self) -> u8 {
        self.last_discrepancy
    }

    /// Whether the previous search returned the last device on the bus.
    pub fn last_device(&self) -> bool {
        self.last_device
    }

    /// Whether the enumeration is finished and further searches return `None`.
    pub fn is_exhausted(&self) -> bool {
        self.last_device && self.last_discrepancy == 0
    }

    /// Address most recently assembled by the search.
    pub fn candidate(&self) -> Rom {
        Rom::from(self.rom)
    }

    fn rom_bit(&self, bit: u8) -> bool {
        let n = bit - 1;
        self.rom[(n / 8) as usize] & (1 << (n % 8)) != 0
    }

    fn set_rom_bit(&mut self, bit: u8, value: bool) {
        let n = bit - 1;
        let mask = 1 << (n % 8);
        if value {
            self.rom[(n / 8) as usize] |= mask;
        } else {
            self.rom[(n / 8) as usize] &= !mask;
        }
    }

    /// Searches for the next device on the 1-Wire bus.
    ///
    /// Call repeatedly to find all devices on the bus; once the last device has been returned,
    /// this method returns `None` until [`reset`](SearchState::reset) is called.
    ///
    /// `None` is also returned, with the state reset, when no device answers the bus reset or
    /// when the search runs into a bit position where no device responded at all.
    ///
    /// # Errors
    /// * [`OneWireError::InvalidRomCrc`] if the assembled address fails the CRC check. The
    ///   address is discarded, but the state stays advanced, so the device is skipped.
    /// * Bus errors are propagated after resetting the state.
    pub fn next<T: OneWire>(&mut self, bus: &mut T) -> OneWireResult<Option<Rom>, T::BusError> {
        if self.last_device {
            log::debug!("Search exhausted");
            return Ok(None);
        }
        match self.walk(bus) {
            Ok(true) => {}
            Ok(false) => {
                self.reset();
                return Ok(None);
            }
            Err(e) => {
                self.reset();
                return Err(e);
            }
        }
        if self.rom[0] == 0 {
            log::warn!("Search read a zero family code, treating bus as empty");
            self.reset();
            return Ok(None);
        }
        if !OneWireCrc::validate(&self.rom) {
            log::warn!("Search found {} with invalid CRC", Rom::from(self.rom));
            return Err(OneWireError::InvalidRomCrc);
        }
        let rom = Rom::from(self.rom);
        log::info!("Found device: {rom}");
        Ok(Some(rom))
    }

    /// Walks the address tree once. Returns `false` if there is nothing to walk.
    fn walk<T: OneWire>(&mut self, bus: &mut T) -> OneWireResult<bool, T::BusError> {
        if !bus.reset()? {
            log::debug!("No presence pulse, search aborted");
            return Ok(false);
        }
        bus.write_byte(self.kind as u8)?;
        let mut last_zero = 0;
        for bit in 1..=Rom::BITS {
            let direction = if bit < self.last_discrepancy {
                self.rom_bit(bit)
            } else {
                bit == self.last_discrepancy
            };
            let triplet = bus.triplet(direction)?;
            if triplet.id_bit && triplet.complement_bit {
                log::warn!("No device responded at bit {bit}, search aborted");
                return Ok(false);
            }
            if !triplet.id_bit && !triplet.complement_bit && !triplet.direction {
                last_zero = bit;
                if last_zero < 9 {
                    self.last_family_discrepancy = last_zero;
                }
            }
            self.set_rom_bit(bit, triplet.direction);
        }
        self.last_discrepancy = last_zero;
        self.last_device = last_zero == 0;
        Ok(true)
    }

    /// Verifies that the device with the given ROM code is present on the bus.
    ///
    /// The state of an ongoing enumeration is restored afterwards.
    pub fn verify<T: OneWire>(&mut self, bus: &mut T, rom: &Rom) -> OneWireResult<bool, T::BusError> {
        let saved = *self;
        self.reset();
        self.rom = (*rom).into();
        self.last_discrepancy = Rom::BITS;
        let res = self.next(bus);
        *self = saved;
        match res {
            Ok(found) => Ok(found.as_ref() == Some(rom)),
            Err(OneWireError::InvalidRomCrc) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
