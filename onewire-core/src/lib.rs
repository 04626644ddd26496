#![no_std]
#![deny(missing_docs)]
//! # onewire-core
//! A no-std implementation of the 1-Wire transaction layer above the line driver.
//!
//! The [OneWire] trait describes a bus master with bit and byte granularity: reset with presence
//! detection, single bits, bytes, and the search triplet. Bridge chips that perform the triplet in
//! hardware override [OneWire::triplet]; bit-banged masters get a fallback built from
//! [OneWire::read_bit] and [OneWire::write_bit].
//!
//! On top of the trait the crate provides the ROM search algorithm in [SearchState], the 8-byte
//! device address [Rom], and the Dallas/Maxim CRC-8 in [OneWireCrc].

mod consts;
mod crc;
mod error;
mod rom;
mod search;
mod traits;
pub use consts::*;
pub use crc::OneWireCrc;
pub use error::OneWireError;
pub use rom::{Rom, RomParseError};
pub use search::{SearchKind, SearchState};
pub use traits::{OneWire, Triplet};

/// Result of 1-Wire operations.
pub type OneWireResult<T, E> = Result<T, OneWireError<E>>;
