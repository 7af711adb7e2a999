//! Command pin layer.
//!
//! Maps the abstract SDRAM commands onto the physical control pins and back.
//! The controller only ever encodes; the inverse decoder is shared with the
//! behavioral device model so both sides agree on one truth table.

/// Command codec: abstract command to pin levels and back.
pub mod codec;

/// Abstract SDRAM command set.
pub mod command;

pub use codec::{decode, encode, ModeRegister, PinState};
pub use command::{BusCommand, Command};
