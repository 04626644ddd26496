use crate::{DeviceStatus, Ds248x, Ds248xError, Ds248xResult, Fault, ReadPointer};
use embedded_hal::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};
use onewire_core::{OneWire, OneWireResult, Triplet};

pub(crate) const ONEWIRE_RESET_CMD: u8 = 0xb4;
pub(crate) const ONEWIRE_WRITE_BYTE: u8 = 0xa5;
pub(crate) const ONEWIRE_READ_BYTE: u8 = 0x96;
pub(crate) const ONEWIRE_SINGLE_BIT: u8 = 0x87;
pub(crate) const ONEWIRE_TRIPLET: u8 = 0x78;

const fn bit_payload(bit: bool) -> u8 {
    if bit { 0x80 } else { 0x00 }
}

impl<I: I2c<SevenBitAddress>, D: DelayNs, F: FnMut(Fault)> OneWire for Ds248x<I, D, F> {
    type BusError = Ds248xError<I::Error>;

    /// Issues a 1-Wire reset and reports the presence pulse.
    ///
    /// A strong pullup armed in the configuration is released for the reset and armed
    /// again afterwards.
    fn reset(&mut self) -> OneWireResult<bool, Self::BusError> {
        let spu = self.config.strong_pullup();
        if spu {
            self.write_config(self.config.with_strong_pullup(false))?;
        }
        self.wait_busy()?;
        self.send(&[ONEWIRE_RESET_CMD])?;
        let status = self.wait_busy()?;
        if spu {
            self.write_config(self.config.with_strong_pullup(true))?;
        }
        log::debug!(
            "1-Wire reset: presence {}, short {}",
            status.presence_pulse_detect(),
            status.short_detect()
        );
        Ok(status.presence_pulse_detect())
    }

    fn write_byte(&mut self, byte: u8) -> OneWireResult<(), Self::BusError> {
        self.send(&[ONEWIRE_WRITE_BYTE, byte])?;
        self.wait_busy()?;
        Ok(())
    }

    fn read_byte(&mut self) -> OneWireResult<u8, Self::BusError> {
        self.send(&[ONEWIRE_READ_BYTE])?;
        self.wait_busy()?;
        Ok(self.read_register(ReadPointer::ReadData)?)
    }

    fn write_bit(&mut self, bit: bool) -> OneWireResult<(), Self::BusError> {
        self.single_bit(bit)?;
        Ok(())
    }

    fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError> {
        Ok(self.single_bit(true)?.single_bit_result())
    }

    /// Runs one search step with the bridge's triplet command.
    fn triplet(&mut self, direction: bool) -> OneWireResult<Triplet, Self::BusError> {
        self.send(&[ONEWIRE_TRIPLET, bit_payload(direction)])?;
        let status = self.wait_busy()?;
        Ok(Triplet {
            id_bit: status.single_bit_result(),
            complement_bit: status.triplet_second_bit(),
            direction: status.branch_dir_taken(),
        })
    }
}

impl<I: I2c<SevenBitAddress>, D: DelayNs, F: FnMut(Fault)> Ds248x<I, D, F> {
    fn single_bit(&mut self, bit: bool) -> Ds248xResult<DeviceStatus, I::Error> {
        self.send(&[ONEWIRE_SINGLE_BIT, bit_payload(bit)])?;
        self.wait_busy()
    }

    /// Writes a byte and holds the line at strong pullup afterwards, e.g. to power a
    /// parasitic temperature conversion or an EEPROM copy.
    ///
    /// The pullup ends with the next 1-Wire command.
    pub fn write_byte_with_pullup(
        &mut self,
        byte: u8,
    ) -> OneWireResult<(), Ds248xError<I::Error>> {
        self.write_config(self.config.with_strong_pullup(true))?;
        self.write_byte(byte)?;
        // The bridge clears SPU by itself once the pullup ends.
        self.config.set_strong_pullup(false);
        Ok(())
    }

    /// Reads a bit and holds the line at strong pullup afterwards.
    ///
    /// The pullup ends with the next 1-Wire command.
    pub fn read_bit_with_pullup(&mut self) -> OneWireResult<bool, Ds248xError<I::Error>> {
        self.write_config(self.config.with_strong_pullup(true))?;
        let bit = self.read_bit()?;
        self.config.set_strong_pullup(false);
        Ok(bit)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use crate::{DEFAULT_ADDRESS, DeviceConfiguration, Ds248xBuilder, Rom};
    use super::*;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
    use onewire_core::OneWireError;
    use std::{vec, vec::Vec};

    const ADDR: u8 = DEFAULT_ADDRESS;

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn poll(statuses: &[u8]) -> Vec<I2cTransaction> {
        let mut v = vec![I2cTransaction::write(ADDR, vec![0xe1, 0xf0])];
        v.extend(statuses.iter().map(|&s| I2cTransaction::read(ADDR, vec![s])));
        v
    }

    fn command(bytes: &[u8], statuses: &[u8]) -> Vec<I2cTransaction> {
        let mut v = vec![I2cTransaction::write(ADDR, bytes.to_vec())];
        v.extend(poll(statuses));
        v
    }

    fn reset_sequence(final_status: u8) -> Vec<I2cTransaction> {
        let mut v = poll(&[0x00]);
        v.extend(command(&[0xb4], &[0x01, final_status]));
        v
    }

    #[test]
    fn reset_reports_presence() {
        let mut i2c = I2cMock::new(&reset_sequence(0x02));
        let mut dev = Ds248xBuilder::new().assemble(i2c.clone(), NoDelay);
        assert_eq!(dev.reset(), Ok(true));
        i2c.done();
    }

    #[test]
    fn reset_on_empty_bus() {
        let mut expectations = reset_sequence(0x00);
        expectations.extend(reset_sequence(0x00));
        let mut i2c = I2cMock::new(&expectations);
        let mut dev = Ds248xBuilder::new().assemble(i2c.clone(), NoDelay);
        assert_eq!(dev.reset(), Ok(false));
        assert_eq!(dev.address(None), Err(OneWireError::NoDevicePresent));
        i2c.done();
    }

    #[test]
    fn reset_releases_and_restores_strong_pullup() {
        let mut expectations = poll(&[0x00]);
        expectations.push(I2cTransaction::write_read(ADDR, vec![0xd2, 0xf0], vec![0x00]));
        expectations.extend(reset_sequence(0x02));
        expectations.extend(poll(&[0x00]));
        expectations.push(I2cTransaction::write_read(ADDR, vec![0xd2, 0xb4], vec![0x04]));
        let mut i2c = I2cMock::new(&expectations);
        let mut dev = Ds248xBuilder::new()
            .with_config(DeviceConfiguration::new().with_strong_pullup(true))
            .assemble(i2c.clone(), NoDelay);
        assert_eq!(dev.reset(), Ok(true));
        assert!(dev.config().strong_pullup());
        i2c.done();
    }

    #[test]
    fn reset_aborts_when_pullup_cannot_be_released() {
        let mut expectations = poll(&[0x00]);
        expectations.push(I2cTransaction::write_read(ADDR, vec![0xd2, 0xf0], vec![0x04]));
        let mut i2c = I2cMock::new(&expectations);
        let mut dev = Ds248xBuilder::new()
            .with_config(DeviceConfiguration::new().with_strong_pullup(true))
            .assemble(i2c.clone(), NoDelay);
        assert_eq!(
            dev.reset(),
            Err(OneWireError::Other(Ds248xError::ConfigMismatch))
        );
        i2c.done();
    }

    #[test]
    fn byte_io() {
        let mut expectations = command(&[0xa5, 0x44], &[0x01, 0x00]);
        expectations.extend(command(&[0x96], &[0x00]));
        expectations.push(I2cTransaction::write_read(ADDR, vec![0xe1, 0xe1], vec![0x5a]));
        let mut i2c = I2cMock::new(&expectations);
        let mut dev = Ds248xBuilder::new().assemble(i2c.clone(), NoDelay);
        dev.write_byte(0x44).unwrap();
        assert_eq!(dev.read_byte(), Ok(0x5a));
        i2c.done();
    }

    #[test]
    fn empty_buffers_do_nothing() {
        let mut i2c = I2cMock::new(&[]);
        let mut dev = Ds248xBuilder::new().assemble(i2c.clone(), NoDelay);
        dev.write_bytes(&[]).unwrap();
        dev.read_bytes(&mut []).unwrap();
        i2c.done();
    }

    #[test]
    fn bit_io_uses_high_bit_of_payload() {
        let mut expectations = command(&[0x87, 0x00], &[0x00]);
        expectations.extend(command(&[0x87, 0x80], &[0x20]));
        expectations.extend(command(&[0x87, 0x80], &[0x00]));
        let mut i2c = I2cMock::new(&expectations);
        let mut dev = Ds248xBuilder::new().assemble(i2c.clone(), NoDelay);
        dev.write_bit(false).unwrap();
        assert_eq!(dev.read_bit(), Ok(true));
        assert_eq!(dev.read_bit(), Ok(false));
        i2c.done();
    }

    #[test]
    fn triplet_decodes_status() {
        let mut expectations = command(&[0x78, 0x80], &[0x80]);
        expectations.extend(command(&[0x78, 0x00], &[0x60]));
        expectations.extend(command(&[0x78, 0x00], &[0x20]));
        let mut i2c = I2cMock::new(&expectations);
        let mut dev = Ds248xBuilder::new().assemble(i2c.clone(), NoDelay);
        assert_eq!(
            dev.triplet(true),
            Ok(Triplet {
                id_bit: false,
                complement_bit: false,
                direction: true
            })
        );
        assert_eq!(
            dev.triplet(false),
            Ok(Triplet {
                id_bit: true,
                complement_bit: true,
                direction: false
            })
        );
        assert_eq!(
            dev.triplet(false),
            Ok(Triplet {
                id_bit: true,
                complement_bit: false,
                direction: false
            })
        );
        i2c.done();
    }

    #[test]
    fn select_sends_match_rom_and_address() {
        let rom = Rom::from([0x02, 0x1c, 0xb8, 0x01, 0x00, 0x00, 0x00, 0xa2]);
        let mut expectations = command(&[0xa5, 0x55], &[0x00]);
        for byte in rom.as_bytes() {
            expectations.extend(command(&[0xa5, *byte], &[0x00]));
        }
        let mut i2c = I2cMock::new(&expectations);
        let mut dev = Ds248xBuilder::new().assemble(i2c.clone(), NoDelay);
        dev.select(&rom).unwrap();
        i2c.done();
    }

    #[test]
    fn skip_sends_skip_rom() {
        let mut i2c = I2cMock::new(&command(&[0xa5, 0xcc], &[0x00]));
        let mut dev = Ds248xBuilder::new().assemble(i2c.clone(), NoDelay);
        dev.skip().unwrap();
        i2c.done();
    }

    #[test]
    fn pullup_byte_arms_spu_once() {
        let mut expectations = poll(&[0x00]);
        expectations.push(I2cTransaction::write_read(ADDR, vec![0xd2, 0xb4], vec![0x04]));
        expectations.extend(command(&[0xa5, 0x44], &[0x00]));
        let mut i2c = I2cMock::new(&expectations);
        let mut dev = Ds248xBuilder::new().assemble(i2c.clone(), NoDelay);
        dev.write_byte_with_pullup(0x44).unwrap();
        assert!(!dev.config().strong_pullup());
        i2c.done();
    }

    #[test]
    fn pullup_bit_arms_spu_once() {
        let mut expectations = poll(&[0x00]);
        expectations.push(I2cTransaction::write_read(ADDR, vec![0xd2, 0xb4], vec![0x04]));
        expectations.extend(command(&[0x87, 0x80], &[0x20]));
        let mut i2c = I2cMock::new(&expectations);
        let mut dev = Ds248xBuilder::new().assemble(i2c.clone(), NoDelay);
        assert_eq!(dev.read_bit_with_pullup(), Ok(true));
        assert!(!dev.config().strong_pullup());
        i2c.done();
    }

    #[test]
    fn transport_error_is_propagated() {
        let mut i2c = I2cMock::new(&[
            I2cTransaction::write(ADDR, vec![0xa5, 0x00]).with_error(ErrorKind::Other)
        ]);
        let mut dev = Ds248xBuilder::new().assemble(i2c.clone(), NoDelay);
        assert_eq!(
            dev.write_byte(0x00),
            Err(OneWireError::Other(Ds248xError::I2c(ErrorKind::Other)))
        );
        i2c.done();
    }

    #[test]
    fn busy_timeout_surfaces_as_bus_error() {
        let mut expectations = vec![I2cTransaction::write(ADDR, vec![0x96])];
        expectations.extend(poll(&[0x01, 0x01]));
        let mut i2c = I2cMock::new(&expectations);
        let mut dev = Ds248xBuilder::new()
            .with_retries(2)
            .assemble(i2c.clone(), NoDelay);
        assert_eq!(
            dev.read_byte(),
            Err(OneWireError::Other(Ds248xError::RetriesExceeded))
        );
        i2c.done();
    }
}
