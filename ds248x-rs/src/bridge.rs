use crate::{
    DEFAULT_ADDRESS, DeviceConfiguration, DeviceStatus, Ds248xError, Ds248xResult, Fault, Model,
    ReadPointer,
    fault::FaultLatch,
    registers::{
        CHANNEL_SELECT_CMD, ConfigFlag, DEVICE_RST_CMD, READ_PTR_CMD, WRITE_CONFIG_CMD,
        channel_code, channel_readback,
    },
    traits::Interact,
};
use embedded_hal::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};
use onewire_core::{OneWireResult, Rom, SearchKind, SearchState};

/// Fault handler type used when none is given to the builder.
pub type FaultHandler = fn(Fault);

/// A DS248x I2C to 1-Wire bridge device.
///
/// Takes ownership of an I2C bus (implementing [`I2c`](embedded_hal::i2c::I2c) trait)
/// and a timer object implementing the [`DelayNs`](embedded_hal::delay::DelayNs) trait.
/// The optional fault handler `F` is called on the rising edge of a short circuit or an
/// unexpected device reset, and when the bridge stays busy past the retry budget.
pub struct Ds248x<I, D, F = FaultHandler> {
    pub(crate) i2c: I,
    pub(crate) addr: u8,
    pub(crate) delay: D,
    pub(crate) retries: u16,
    pub(crate) model: Model,
    pub(crate) config: DeviceConfiguration,
    pub(crate) reset_on_timeout: bool,
    pub(crate) fault_handler: Option<F>,
    pub(crate) faults: FaultLatch,
    pub(crate) search: SearchState,
}

/// Builder for creating a [`Ds248x`] instance with custom configuration.
pub struct Ds248xBuilder<F = FaultHandler> {
    addr: u8,
    model: Model,
    retries: u16,
    config: DeviceConfiguration,
    reset_on_timeout: bool,
    fault_handler: Option<F>,
}

impl Ds248xBuilder {
    /// Creates a builder for a DS2484 at the default address, retrying busy polls 100 times.
    pub fn new() -> Self {
        Ds248xBuilder {
            addr: DEFAULT_ADDRESS,
            model: Model::default(),
            retries: 100,
            config: DeviceConfiguration::new(),
            reset_on_timeout: false,
            fault_handler: None,
        }
    }
}

impl Default for Ds248xBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FnMut(Fault)> Ds248xBuilder<F> {
    /// Sets the 7-bit I2C address of the bridge.
    pub fn with_address(mut self, addr: u8) -> Self {
        self.addr = addr;
        self
    }

    /// Sets the bridge model.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Sets the retry count for the device.
    ///
    /// The status register is read at most this many times, 1 ms apart, while
    /// waiting for the 1-Wire line to become idle.
    pub fn with_retries(mut self, retries: u16) -> Self {
        self.retries = retries;
        self
    }

    /// Sets the device configuration written during [`build`](Ds248xBuilder::build).
    pub fn with_config(mut self, config: DeviceConfiguration) -> Self {
        self.config = config;
        self
    }

    /// Issue a device reset, and restore the configuration, when a busy wait times out.
    pub fn with_reset_on_timeout(mut self, enable: bool) -> Self {
        self.reset_on_timeout = enable;
        self
    }

    /// Sets the fault handler.
    pub fn with_fault_handler<G: FnMut(Fault)>(self, handler: G) -> Ds248xBuilder<G> {
        Ds248xBuilder {
            addr: self.addr,
            model: self.model,
            retries: self.retries,
            config: self.config,
            reset_on_timeout: self.reset_on_timeout,
            fault_handler: Some(handler),
        }
    }

    /// Builds a new [`Ds248x`] instance: resets the bridge and writes the configuration.
    pub fn build<I: I2c<SevenBitAddress>, D: DelayNs>(
        self,
        i2c: I,
        delay: D,
    ) -> Ds248xResult<Ds248x<I, D, F>, I::Error> {
        let config = self.config;
        let mut dev = self.assemble(i2c, delay);
        dev.device_reset()?;
        dev.write_config(config)?;
        log::info!(
            "{:?} at 0x{:02x} configured with {:?}",
            dev.model,
            dev.addr,
            dev.config
        );
        Ok(dev)
    }

    /// Creates the instance without talking to the bridge, assuming it already holds
    /// the builder's configuration.
    pub(crate) fn assemble<I, D>(self, i2c: I, delay: D) -> Ds248x<I, D, F> {
        Ds248x {
            i2c,
            addr: self.addr,
            delay,
            retries: self.retries,
            model: self.model,
            config: self.config,
            reset_on_timeout: self.reset_on_timeout,
            fault_handler: self.fault_handler,
            faults: FaultLatch::default(),
            search: SearchState::new(),
        }
    }
}

impl<I, D, F> Ds248x<I, D, F> {
    /// I2C address of the bridge.
    pub fn i2c_address(&self) -> u8 {
        self.addr
    }

    /// Bridge model.
    pub fn model(&self) -> Model {
        self.model
    }

    /// Last configuration written to, or read from, the bridge.
    pub fn config(&self) -> DeviceConfiguration {
        self.config
    }

    /// State of the ongoing ROM search.
    pub fn search_state(&self) -> &SearchState {
        &self.search
    }

    /// Installs `handler` as the fault handler, replacing any previous one.
    pub fn attach_fault_handler(&mut self, handler: F) {
        self.fault_handler = Some(handler);
    }

    /// Removes the fault handler. Faults are still logged.
    pub fn detach_fault_handler(&mut self) {
        self.fault_handler = None;
    }

    /// Releases the I2C bus and the delay provider.
    pub fn release(self) -> (I, D) {
        (self.i2c, self.delay)
    }
}

impl<I: I2c<SevenBitAddress>, D: DelayNs, F: FnMut(Fault)> Ds248x<I, D, F> {
    /// Get the status of the device.
    pub fn get_status(&mut self) -> Ds248xResult<DeviceStatus, I::Error> {
        DeviceStatus::read(self)
    }

    /// Reset the device.
    ///
    /// Performs a global reset of the bridge state machine, terminating any ongoing 1-Wire
    /// communication. The bridge comes back with the configuration cleared; the search
    /// state and fault edges are cleared as well.
    pub fn device_reset(&mut self) -> Ds248xResult<DeviceStatus, I::Error> {
        self.send(&[DEVICE_RST_CMD])?;
        let retries = self.retries.max(1);
        let mut status = None;
        for attempt in 1..=retries {
            let mut buf = [0u8; 1];
            self.i2c.read(self.addr, &mut buf)?;
            let read = DeviceStatus::from_bits(buf[0]);
            if read.device_reset() {
                status = Some(read);
                break;
            }
            if attempt < retries {
                self.delay.delay_ms(1);
            }
        }
        let Some(status) = status else {
            log::warn!("Device reset not acknowledged after {retries} reads");
            return Err(Ds248xError::RetriesExceeded);
        };
        if status.into_bits() & 0xf7 != 0x10 {
            log::warn!("Unexpected status after device reset: {status:?}");
            return Err(Ds248xError::DeviceResetFailed);
        }
        self.config = DeviceConfiguration::new();
        self.search.reset();
        self.faults = FaultLatch::default();
        // RST stays set until the configuration is written; that is not a fault.
        self.faults.reset.rising(true);
        log::debug!("Device reset complete");
        Ok(status)
    }

    /// Reads the configuration register and updates the cached configuration.
    pub fn load_config(&mut self) -> Ds248xResult<DeviceConfiguration, I::Error> {
        let config = DeviceConfiguration::read(self)?;
        self.config = config;
        Ok(config)
    }

    /// Sets one configuration bit, keeping the others.
    pub fn set_config(&mut self, flag: ConfigFlag) -> Ds248xResult<(), I::Error> {
        self.write_config(self.config.with_flag(flag, true))
    }

    /// Clears one configuration bit, keeping the others.
    pub fn clear_config(&mut self, flag: ConfigFlag) -> Ds248xResult<(), I::Error> {
        self.write_config(self.config.with_flag(flag, false))
    }

    /// Waits for the 1-Wire line to be idle, then writes `config` and checks the readback.
    pub fn write_config(&mut self, config: DeviceConfiguration) -> Ds248xResult<(), I::Error> {
        self.wait_busy()?;
        self.store_config(config)
    }

    /// Selects the active 1-Wire channel of a DS2482-800.
    ///
    /// The search state is reset, since the devices behind the new channel differ.
    ///
    /// # Errors
    /// * [`Ds248xError::Unsupported`] on single-channel models.
    /// * [`Ds248xError::InvalidChannel`] if `channel` is 8 or higher.
    /// * [`Ds248xError::ChannelMismatch`] if the bridge reports a different channel.
    pub fn select_channel(&mut self, channel: u8) -> Ds248xResult<(), I::Error> {
        let channels = self.model.channels();
        if channels == 1 {
            return Err(Ds248xError::Unsupported);
        }
        if channel >= channels {
            return Err(Ds248xError::InvalidChannel(channel));
        }
        self.wait_busy()?;
        let mut buf = [0u8; 1];
        self.i2c.write_read(
            self.addr,
            &[CHANNEL_SELECT_CMD, channel_code(channel)],
            &mut buf,
        )?;
        if buf[0] != channel_readback(channel) {
            log::warn!(
                "Channel {channel} select read back 0x{:02x}, expected 0x{:02x}",
                buf[0],
                channel_readback(channel)
            );
            return Err(Ds248xError::ChannelMismatch);
        }
        self.search.reset();
        log::info!("Selected 1-Wire channel {channel}");
        Ok(())
    }

    /// Reads back the active channel of a DS2482-800.
    pub fn channel(&mut self) -> Ds248xResult<u8, I::Error> {
        let channels = self.model.channels();
        if channels == 1 {
            return Err(Ds248xError::Unsupported);
        }
        let value = self.read_register(ReadPointer::ChannelSelection)?;
        (0..channels)
            .find(|&ch| channel_readback(ch) == value)
            .ok_or(Ds248xError::ChannelMismatch)
    }

    /// Finds the next device on the bus, continuing the ongoing enumeration.
    ///
    /// See [`SearchState::next`].
    pub fn search(&mut self) -> OneWireResult<Option<Rom>, Ds248xError<I::Error>> {
        let mut state = self.search;
        let res = state.next(self);
        self.search = state;
        res
    }

    /// Restarts the enumeration from the first device.
    pub fn reset_search(&mut self) {
        self.search.reset();
    }

    /// Selects between normal and alarm search, and restarts the enumeration.
    pub fn set_search_kind(&mut self, kind: SearchKind) {
        self.search = SearchState::with_kind(kind);
    }

    /// Finds the first device of `family`.
    ///
    /// Further [`search`](Ds248x::search) calls continue the enumeration from that device.
    /// Returns `None` if no device of the family is present.
    pub fn search_family(
        &mut self,
        family: u8,
    ) -> OneWireResult<Option<Rom>, Ds248xError<I::Error>> {
        self.search.target_family(family);
        Ok(self.search()?.filter(|rom| rom.family() == family))
    }

    /// Makes the next [`search`](Ds248x::search) skip the remaining devices of the
    /// family just found.
    pub fn skip_family(&mut self) {
        self.search.skip_family();
    }

    /// Checks that the device `rom` is on the bus, without disturbing the enumeration.
    pub fn verify(&mut self, rom: &Rom) -> OneWireResult<bool, Ds248xError<I::Error>> {
        let mut state = self.search;
        let res = state.verify(self, rom);
        // A device reset during the search has already cleared the enumeration.
        if res.is_ok() {
            self.search = state;
        }
        res
    }

    pub(crate) fn send(&mut self, bytes: &[u8]) -> Ds248xResult<(), I::Error> {
        log::trace!("I2C write {bytes:02x?}");
        self.i2c.write(self.addr, bytes)?;
        Ok(())
    }

    pub(crate) fn set_read_pointer(&mut self, ptr: ReadPointer) -> Ds248xResult<(), I::Error> {
        self.send(&[READ_PTR_CMD, ptr as u8])
    }

    pub(crate) fn read_register(&mut self, ptr: ReadPointer) -> Ds248xResult<u8, I::Error> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.addr, &[READ_PTR_CMD, ptr as u8], &mut buf)?;
        log::trace!("Register {ptr:?} = 0x{:02x}", buf[0]);
        Ok(buf[0])
    }

    /// Polls the status register until the 1-Wire line is idle and returns the idle status.
    pub(crate) fn wait_busy(&mut self) -> Ds248xResult<DeviceStatus, I::Error> {
        self.set_read_pointer(ReadPointer::Status)?;
        let retries = self.retries.max(1);
        for attempt in 1..=retries {
            let mut buf = [0u8; 1];
            self.i2c.read(self.addr, &mut buf)?;
            let status = DeviceStatus::from_bits(buf[0]);
            self.observe(status);
            if !status.onewire_busy() {
                return Ok(status);
            }
            if attempt < retries {
                self.delay.delay_ms(1);
            }
        }
        log::warn!("1-Wire line still busy after {retries} status reads");
        self.notify(Fault::BusyTimeout);
        if self.reset_on_timeout {
            let config = self.config;
            self.device_reset()?;
            self.store_config(config)?;
        }
        Err(Ds248xError::RetriesExceeded)
    }

    fn store_config(&mut self, config: DeviceConfiguration) -> Ds248xResult<(), I::Error> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.addr, &[WRITE_CONFIG_CMD, config.wire_byte()], &mut buf)?;
        if buf[0] != config.into_bits() & 0x0f {
            log::warn!(
                "Configuration read back 0x{:02x}, wrote 0x{:02x}",
                buf[0],
                config.wire_byte()
            );
            return Err(Ds248xError::ConfigMismatch);
        }
        self.config = config;
        Ok(())
    }

    fn observe(&mut self, status: DeviceStatus) {
        if self.faults.short.rising(status.short_detect()) {
            self.notify(Fault::ShortCircuit);
        }
        if self.faults.reset.rising(status.device_reset()) {
            self.config = DeviceConfiguration::new();
            self.notify(Fault::DeviceReset);
        }
    }

    fn notify(&mut self, fault: Fault) {
        log::warn!("Bridge fault: {fault:?}");
        if let Some(handler) = self.fault_handler.as_mut() {
            handler(fault);
        }
    }
}
