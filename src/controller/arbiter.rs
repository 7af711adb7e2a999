//! Command Bus Arbiter.
//!
//! Exactly one command source drives the pins in any cycle. The refresh
//! scheduler owns the bus while the device is uninitialised and while a
//! refresh episode runs; the burst sequencer owns it otherwise. Ownership only
//! moves to refresh between bursts, never in the middle of one.

use super::refresh::RefreshStatus;
use crate::pins::{BusCommand, PinState};

/// Current owner of the command pins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusOwner {
    /// `CommandFromRefresh`: power-up sequence or refresh episode.
    Refresh,
    /// `CommandFromReadWrite`: the burst sequencer.
    ReadWrite,
}

pub struct CommandBusArbiter {
    owner: BusOwner,
    trace: bool,
}

impl CommandBusArbiter {
    /// Creates an arbiter; after reset the refresh side owns the bus.
    pub fn new(trace: bool) -> Self {
        Self {
            owner: BusOwner::Refresh,
            trace: trace || cfg!(feature = "always-trace"),
        }
    }

    pub fn owner(&self) -> BusOwner {
        self.owner
    }

    /// Gates the refresh grant on the read/write side being idle.
    pub fn grant(&self, enable_refresh: bool, rw_in_progress: bool) -> bool {
        enable_refresh && !rw_in_progress
    }

    /// Updates ownership for this cycle.
    ///
    /// # Arguments
    ///
    /// * `refresh` - Refresh status after the refresh scheduler ticked.
    /// * `rw_in_progress` - Whether a burst was in flight at the start of the
    ///   cycle.
    pub fn update(&mut self, refresh: &RefreshStatus, rw_in_progress: bool) -> BusOwner {
        let refresh_wants_bus = !refresh.initialised || refresh.in_progress;
        self.owner = match self.owner {
            BusOwner::Refresh if !refresh_wants_bus => BusOwner::ReadWrite,
            BusOwner::ReadWrite if refresh_wants_bus && !rw_in_progress => BusOwner::Refresh,
            owner => owner,
        };
        self.owner
    }

    /// Drives the pins from the owning source.
    ///
    /// A source that does not own the bus must not offer a command other than
    /// a no-op; the owner's command is encoded, or an idle cycle if it has
    /// nothing to say.
    pub fn drive(
        &self,
        cycle: u64,
        from_refresh: Option<BusCommand>,
        from_rw: Option<BusCommand>,
    ) -> PinState {
        let (owned, other) = match self.owner {
            BusOwner::Refresh => (from_refresh, from_rw),
            BusOwner::ReadWrite => (from_rw, from_refresh),
        };
        debug_assert!(
            other.map_or(true, |c| c.command.is_idle()),
            "cycle {}: {:?} offered {:?} without owning the bus",
            cycle,
            self.owner,
            other
        );

        let cmd = owned.unwrap_or_else(BusCommand::nop);
        if self.trace && !cmd.command.is_idle() {
            log::trace!(
                "cycle {:>10} {:<9?} {:<6} ba={} a={:#06x}",
                cycle,
                self.owner,
                cmd.command,
                cmd.bank,
                cmd.addr
            );
        }
        cmd.encode()
    }
}
