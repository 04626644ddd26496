#![no_std]
#![deny(missing_docs)]

/*! # DS248x
 *
 * A 1-Wire bus master built on the Analog Devices DS2482-100, DS2482-800 and
 * DS2484 I2C to 1-Wire bridges.
 *
 * The bridge generates all 1-Wire timing itself; this driver issues its byte
 * commands over I2C, polls the status register until the 1-Wire line is idle,
 * and implements the [`OneWire`] trait on top. Search state, configuration and
 * fault edge detection are kept per [`Ds248x`] instance.
 */

pub use onewire_core::{
    OneWire, OneWireError, OneWireResult, Rom, SearchKind, SearchState, Triplet,
};
mod bridge;
mod error;
mod fault;
mod onewire;
mod registers;
mod traits;

pub use bridge::{Ds248x, Ds248xBuilder, FaultHandler};
pub use error::Ds248xError;
pub use fault::Fault;
pub use registers::{ConfigFlag, DeviceConfiguration, DeviceStatus, ReadPointer};
pub use traits::Interact;

/// Results of DS248x-specific function calls.
pub type Ds248xResult<T, E> = Result<T, Ds248xError<E>>;

/// Default 7-bit I2C address of the bridge with both address pins low.
pub const DEFAULT_ADDRESS: u8 = 0x18;

/// Bridge models driven by [`Ds248x`].
#[allow(non_camel_case_types)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    /// Single-channel DS2482-100.
    Ds2482_100,
    /// Eight-channel DS2482-800.
    Ds2482_800,
    /// Single-channel DS2484.
    #[default]
    Ds2484,
}

impl Model {
    /// Number of 1-Wire channels on the bridge.
    pub const fn channels(self) -> u8 {
        match self {
            Model::Ds2482_800 => 8,
            Model::Ds2482_100 | Model::Ds2484 => 1,
        }
    }
}
