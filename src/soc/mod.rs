//! Board-level components around the controller.
//!
//! * `memory`: behavioral SDRAM device model.
//! * `traits`: the pin-level device interface.
//! * `builder`: the `System` harness that wires controller and device.

pub mod builder;
pub mod memory;
pub mod traits;

pub use builder::System;
pub use memory::SdramModel;
pub use traits::PinDevice;
