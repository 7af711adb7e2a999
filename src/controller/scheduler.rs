//! Top-Level Scheduler.
//!
//! Decides, at every turn boundary, whether the bus goes to a refresh episode
//! or to one channel's write or read turn. Channels are served round robin,
//! each checked for a write turn before a read turn.
//!
//! A round starts with the first turn granted from `RefreshOrIdle`. When a
//! turn ends, the next channel in the rotation is offered the bus before a
//! pending refresh is considered, until the rotation comes back to the
//! channel that opened the round. A refresh therefore waits at most one turn
//! per channel.

use super::channel::ChannelBufferManager;
use super::refresh::RefreshStatus;
use crate::common::BurstKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    WaitForInitialize,
    RefreshOrIdle,
    Refreshing,
    WriteChannelToDevice(usize),
    ReadDeviceToChannel(usize),
}

/// Outcome of one scheduling cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Decision {
    /// Pulse granting the refresh scheduler the bus.
    pub enable_refresh: bool,
    /// Turn to start this cycle.
    pub start: Option<(usize, BurstKind)>,
}

pub struct TopLevelScheduler {
    state: SchedulerState,
    next_channel: usize,
    /// Channel whose turn opened the current round.
    round_start: usize,
    refresh_permit: bool,
}

impl Default for TopLevelScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TopLevelScheduler {
    pub fn new() -> Self {
        Self {
            state: SchedulerState::WaitForInitialize,
            next_channel: 0,
            round_start: 0,
            refresh_permit: true,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Allows or withholds refresh grants. Withholding them lets the budget
    /// run out; used to exercise the lapse path.
    pub fn set_refresh_permit(&mut self, permit: bool) {
        self.refresh_permit = permit;
    }

    /// Advances one cycle.
    ///
    /// # Arguments
    ///
    /// * `refresh` - Refresh status at the start of the cycle.
    /// * `rw_in_progress` - Whether the burst sequencer was busy at the start
    ///   of the cycle.
    /// * `channels` - Channel state after this cycle's buffer service.
    pub fn tick(
        &mut self,
        refresh: &RefreshStatus,
        rw_in_progress: bool,
        channels: &ChannelBufferManager,
    ) -> Decision {
        let finished = match self.state {
            SchedulerState::WaitForInitialize => {
                if refresh.initialised {
                    log::debug!("scheduler: device initialised");
                    self.state = SchedulerState::RefreshOrIdle;
                }
                return Decision::default();
            }
            SchedulerState::Refreshing if refresh.in_progress => {
                return Decision::default();
            }
            SchedulerState::WriteChannelToDevice(_) | SchedulerState::ReadDeviceToChannel(_)
                if rw_in_progress =>
            {
                return Decision::default();
            }
            SchedulerState::WriteChannelToDevice(i) | SchedulerState::ReadDeviceToChannel(i) => {
                Some(i)
            }
            _ => None,
        };
        self.state = SchedulerState::RefreshOrIdle;

        let count = channels.len();
        if let Some(i) = finished {
            let next = (i + 1) % count;
            if next != self.round_start {
                if let Some(kind) = channels.eligible(next) {
                    return self.start(next, kind);
                }
            }
        }

        if refresh.request_soon && self.refresh_permit {
            self.state = SchedulerState::Refreshing;
            return Decision {
                enable_refresh: true,
                start: None,
            };
        }

        for k in 0..count {
            let index = (self.next_channel + k) % count;
            if let Some(kind) = channels.eligible(index) {
                self.round_start = index;
                return self.start(index, kind);
            }
        }
        Decision::default()
    }

    fn start(&mut self, index: usize, kind: BurstKind) -> Decision {
        self.state = match kind {
            BurstKind::Write => SchedulerState::WriteChannelToDevice(index),
            BurstKind::Read => SchedulerState::ReadDeviceToChannel(index),
        };
        self.next_channel = index + 1;
        Decision {
            enable_refresh: false,
            start: Some((index, kind)),
        }
    }
}
