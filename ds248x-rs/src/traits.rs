use crate::{Ds248x, Ds248xResult, Fault, ReadPointer};
use embedded_hal::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};

/// Trait for registers of the DS248x that are accessed through the read pointer.
pub trait Interact: Sized {
    /// Read pointer position of the register.
    const READ_PTR: ReadPointer;

    /// Read the register value from the bridge.
    fn read<I: I2c<SevenBitAddress>, D: DelayNs, F: FnMut(Fault)>(
        dev: &mut Ds248x<I, D, F>,
    ) -> Ds248xResult<Self, I::Error>;

    /// Write the register value to the bridge.
    fn write<I: I2c<SevenBitAddress>, D: DelayNs, F: FnMut(Fault)>(
        &self,
        dev: &mut Ds248x<I, D, F>,
    ) -> Ds248xResult<(), I::Error>;
}
