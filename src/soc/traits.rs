//! Device Traits.
//!
//! Anything that can sit on the far side of the SDRAM pins implements
//! [`PinDevice`]: it samples the pin levels once per clock edge and may drive
//! the data bus back.

use crate::common::{ProtocolViolation, Word};
use crate::pins::PinState;
use crate::soc::memory::SdramModel;

/// Trait for devices attached to the controller's pin interface.
pub trait PinDevice {
    /// Returns the name of the device.
    fn name(&self) -> &str;

    /// Samples the pins for one clock cycle.
    ///
    /// # Arguments
    ///
    /// * `pins` - Pin levels driven by the controller this cycle.
    ///
    /// # Returns
    ///
    /// The word the device drives onto the data bus this cycle, if any, or
    /// the protocol rule the pins broke.
    fn tick(&mut self, pins: &PinState) -> Result<Option<Word>, ProtocolViolation>;

    /// Downcasts the device to an SDRAM model reference if applicable.
    ///
    /// Used by tests and the CLI to inspect device-side counters.
    fn as_sdram(&self) -> Option<&SdramModel> {
        None
    }
}
