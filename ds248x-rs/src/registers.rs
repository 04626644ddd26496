use crate::{Ds248x, Ds248xError, Ds248xResult, Fault, traits::Interact};
use bitfield_struct::bitfield;
use embedded_hal::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};

pub(crate) const DEVICE_RST_CMD: u8 = 0xf0; // Reset the device
pub(crate) const WRITE_CONFIG_CMD: u8 = 0xd2; // Write the configuration register
pub(crate) const READ_PTR_CMD: u8 = 0xe1; // Set the read pointer
pub(crate) const CHANNEL_SELECT_CMD: u8 = 0xc3; // Select the active 1-Wire channel (DS2482-800)

/// Registers the read pointer can be positioned at.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPointer {
    /// Status register.
    Status = 0xf0,
    /// Read data register, holds the result of a 1-Wire read byte.
    ReadData = 0xe1,
    /// Device configuration register.
    Configuration = 0xc3,
    /// Channel selection register (DS2482-800 only).
    ChannelSelection = 0xd2,
}

/// Status register of the bridge.
///
/// Every 1-Wire command and the device reset leave the read pointer at this
/// register. It is read fresh on every poll.
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct DeviceStatus {
    /// 1WB: the 1-Wire line is busy executing a command.
    pub onewire_busy: bool,
    /// PPD: a presence pulse was seen during the last 1-Wire reset.
    pub presence_pulse_detect: bool,
    /// SD: a short was seen on the 1-Wire line during the last 1-Wire reset.
    pub short_detect: bool,
    /// LL: logic level of the 1-Wire line, sampled when the register is read.
    pub logic_level: bool,
    /// RST: the bridge performed an internal reset and lost its configuration.
    /// Cleared by writing the configuration register.
    pub device_reset: bool,
    /// SBR: line level sampled by a single bit command, or the first bit of a triplet.
    pub single_bit_result: bool,
    /// TSB: second bit sampled by a triplet.
    pub triplet_second_bit: bool,
    /// DIR: branch direction taken by the third slot of a triplet.
    pub branch_dir_taken: bool,
}

impl Interact for DeviceStatus {
    const READ_PTR: ReadPointer = ReadPointer::Status;

    fn read<I: I2c<SevenBitAddress>, D: DelayNs, F: FnMut(Fault)>(
        dev: &mut Ds248x<I, D, F>,
    ) -> Ds248xResult<Self, I::Error> {
        dev.read_register(Self::READ_PTR).map(Self::from_bits)
    }

    fn write<I: I2c<SevenBitAddress>, D: DelayNs, F: FnMut(Fault)>(
        &self,
        _dev: &mut Ds248x<I, D, F>,
    ) -> Ds248xResult<(), I::Error> {
        Err(Ds248xError::Unsupported)
    }
}

/// Device configuration register.
///
/// Reads `0x00` after a device reset. The strong pullup bit returns to 0 on its own
/// once the strong pullup it armed has ended.
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct DeviceConfiguration {
    /// APU: drive rising edges with the active pullup instead of the resistor.
    pub active_pullup: bool,
    /// PDN: remove power from the 1-Wire port. No communication is possible while set.
    pub power_down: bool,
    /// SPU: apply a strong pullup after the next write byte or single bit command.
    pub strong_pullup: bool,
    /// 1WS: overdrive timing.
    pub overdrive: bool,
    #[bits(4)]
    __: u8,
}

impl DeviceConfiguration {
    /// Byte sent with the write configuration command: the upper nibble carries the
    /// one's complement of the lower.
    pub const fn wire_byte(&self) -> u8 {
        let bits = self.into_bits() & 0x0f;
        bits | ((!bits) << 4)
    }

    /// Returns a copy with `flag` set to `on`.
    pub const fn with_flag(self, flag: ConfigFlag, on: bool) -> Self {
        match flag {
            ConfigFlag::ActivePullup => self.with_active_pullup(on),
            ConfigFlag::StrongPullup => self.with_strong_pullup(on),
            ConfigFlag::Overdrive => self.with_overdrive(on),
        }
    }
}

impl Interact for DeviceConfiguration {
    const READ_PTR: ReadPointer = ReadPointer::Configuration;

    fn read<I: I2c<SevenBitAddress>, D: DelayNs, F: FnMut(Fault)>(
        dev: &mut Ds248x<I, D, F>,
    ) -> Ds248xResult<Self, I::Error> {
        dev.read_register(Self::READ_PTR)
            .map(|v| Self::from_bits(v & 0x0f))
    }

    fn write<I: I2c<SevenBitAddress>, D: DelayNs, F: FnMut(Fault)>(
        &self,
        dev: &mut Ds248x<I, D, F>,
    ) -> Ds248xResult<(), I::Error> {
        dev.write_config(*self)
    }
}

/// Configuration bits that can be toggled individually with
/// [`Ds248x::set_config`] and [`Ds248x::clear_config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFlag {
    /// Active pullup (APU).
    ActivePullup,
    /// Strong pullup (SPU).
    StrongPullup,
    /// Overdrive speed (1WS).
    Overdrive,
}

/// Code sent with the channel select command.
pub(crate) const fn channel_code(ch: u8) -> u8 {
    ch | ((!ch) << 4)
}

/// Value the channel selection register reads back for `ch`.
pub(crate) const fn channel_readback(ch: u8) -> u8 {
    (ch | ((!ch) << 3)) & !(1 << 6)
}
