//! Memory devices.

pub mod sdram;

pub use sdram::{BankState, SdramModel};
