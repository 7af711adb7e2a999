//! System Builder.
//!
//! This module defines the `System` structure, which wires a controller to a
//! device on the far side of its pins and clocks both from one loop. The data
//! bus is registered on the controller side, so a word the device drives on
//! one cycle is seen by the controller on the next.

use crate::common::{ConfigError, ProtocolViolation, Word};
use crate::config::Config;
use crate::controller::Controller;
use crate::fifo::ChannelPort;
use crate::pins::PinState;
use crate::soc::memory::SdramModel;
use crate::soc::traits::PinDevice;

/// Controller plus attached device.
pub struct System {
    /// The SDRAM controller under test.
    pub controller: Controller,
    /// Device sampling the controller's pins.
    pub device: Box<dyn PinDevice>,
    /// Data bus as registered at the end of the previous cycle.
    dq: Option<Word>,
}

impl System {
    /// Creates a controller wired to a behavioral SDRAM model matching
    /// `config`.
    ///
    /// # Arguments
    ///
    /// * `config` - Geometry, timing, and channel configuration.
    ///
    /// # Returns
    ///
    /// A new `System` in its after-reset state.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let controller = Controller::new(config)?;
        let device = SdramModel::new(config.layout(), controller.timing());
        Ok(Self::with_device(controller, Box::new(device)))
    }

    /// Wires an existing controller to an arbitrary device.
    pub fn with_device(controller: Controller, device: Box<dyn PinDevice>) -> Self {
        Self {
            controller,
            device,
            dq: None,
        }
    }

    /// Client port of channel `index`.
    pub fn port(&self, index: usize) -> ChannelPort {
        self.controller.port(index)
    }

    pub fn cycle(&self) -> u64 {
        self.controller.cycle()
    }

    /// The attached SDRAM model, when the device is one.
    pub fn sdram(&self) -> Option<&SdramModel> {
        self.device.as_sdram()
    }

    /// Advances controller and device by one cycle.
    ///
    /// # Returns
    ///
    /// The pins driven this cycle, or the first protocol violation the
    /// device detected.
    pub fn tick(&mut self) -> Result<PinState, ProtocolViolation> {
        let pins = self.controller.tick(self.dq);
        self.dq = self.device.tick(&pins)?;
        Ok(pins)
    }

    /// Ticks until `done` holds or `max_cycles` elapse.
    ///
    /// # Returns
    ///
    /// `true` if `done` became true, `false` on timeout.
    pub fn run_until<F>(&mut self, max_cycles: u64, mut done: F) -> Result<bool, ProtocolViolation>
    where
        F: FnMut(&System) -> bool,
    {
        for _ in 0..max_cycles {
            if done(self) {
                return Ok(true);
            }
            self.tick()?;
        }
        Ok(done(self))
    }

    /// Ticks until the power-up sequence has finished.
    pub fn run_until_initialised(&mut self, max_cycles: u64) -> Result<bool, ProtocolViolation> {
        self.run_until(max_cycles, |s| s.controller.status().initialised)
    }
}
