//! ROM command codes understood by every 1-Wire slave.

/// Command to address a single device by its 64-bit ROM code.
pub const ONEWIRE_MATCH_ROM_CMD: u8 = 0x55;

/// Command to address all devices on the bus at once.
///
/// On a bus with more than one device, any read following this command
/// returns the wired-AND of all responses.
pub const ONEWIRE_SKIP_ROM_CMD: u8 = 0xcc;

/// Command to read the ROM code of the only device on the bus.
pub const ONEWIRE_READ_ROM_CMD: u8 = 0x33;

/// Command to search for devices on the 1-Wire bus
pub const ONEWIRE_SEARCH_CMD: u8 = 0xf0;

/// Command to search for devices in alarm state on the 1-Wire bus
pub const ONEWIRE_CONDITIONAL_SEARCH_CMD: u8 = 0xec;
