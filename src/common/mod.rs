//! Common utilities and types used throughout the SDRAM controller.
//!
//! This module provides fundamental types for device addresses, burst
//! classification, and error handling that are shared across the
//! controller, the pin layer, and the behavioral device model.

/// Address type definitions (global word addresses and bank/row/column).
pub mod addr;

/// Burst direction definitions.
pub mod data;

/// Error types for configuration and device protocol checking.
pub mod error;

pub use addr::{AddressLayout, DeviceAddr, GlobalAddr};
pub use data::BurstKind;
pub use error::{ConfigError, ProtocolViolation};

/// A single data word as carried on the SDRAM data bus.
pub type Word = u16;
