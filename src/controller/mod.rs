//! SDRAM Controller Core.
//!
//! The controller is a set of small per-cycle state machines composed in a
//! fixed order by [`Controller::tick`]:
//!
//! 1. The burst sequencer samples the data bus and retires the oldest read
//!    beat, which is routed to the egress FIFO of the channel owning it.
//! 2. Channels move words across the client boundary, update their routing
//!    mode, and bypass when the device holds nothing for them.
//! 3. The top-level scheduler hands the bus to a refresh episode or to one
//!    channel's turn, based on the state at the start of the cycle.
//! 4. The refresh scheduler and the burst sequencer each produce a command.
//! 5. The command bus arbiter picks the owning command and drives the pins.

pub mod arbiter;
pub mod channel;
pub mod refresh;
pub mod scheduler;
pub mod sequencer;

pub use arbiter::{BusOwner, CommandBusArbiter};
pub use channel::{BufferMode, Channel, ChannelBufferManager};
pub use refresh::{RefreshScheduler, RefreshState, RefreshStatus};
pub use scheduler::{Decision, SchedulerState, TopLevelScheduler};
pub use sequencer::BurstSequencer;

use crate::common::{ConfigError, Word};
use crate::config::{Config, Timing};
use crate::fifo::ChannelPort;
use crate::pins::{self, Command, PinState};
use crate::stats::ControllerStats;

/// Status outputs of the controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControllerStatus {
    pub initialised: bool,
    pub refresh_in_progress: bool,
    pub request_to_refresh_soon: bool,
    pub refresh_lapsed: bool,
}

/// A multi-channel SDRAM controller.
pub struct Controller {
    timing: Timing,
    cycle: u64,
    refresh: RefreshScheduler,
    arbiter: CommandBusArbiter,
    sequencer: BurstSequencer,
    channels: ChannelBufferManager,
    scheduler: TopLevelScheduler,
    stats: ControllerStats,
}

impl Controller {
    /// Builds a controller in its after-reset state.
    ///
    /// # Arguments
    ///
    /// * `config` - Geometry, timing, and channel configuration.
    ///
    /// # Returns
    ///
    /// The controller, or the first configuration problem found.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let timing = Timing::from_config(config)?;
        log::debug!(
            "controller: {} channel(s), turn {} words, burst {} cycles, read latency {}",
            config.channels.count,
            timing.turn_words(),
            timing.burst_cycles,
            timing.read_latency
        );
        Ok(Self {
            timing,
            cycle: 0,
            refresh: RefreshScheduler::new(&timing),
            arbiter: CommandBusArbiter::new(config.general.trace_commands),
            sequencer: BurstSequencer::new(config.layout(), &timing),
            channels: ChannelBufferManager::new(config, &timing),
            scheduler: TopLevelScheduler::new(),
            stats: ControllerStats::default(),
        })
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Cycles elapsed since reset.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Client port of channel `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a configured channel.
    pub fn port(&self, index: usize) -> ChannelPort {
        self.channels.channel(index).port().clone()
    }

    pub fn channels(&self) -> &ChannelBufferManager {
        &self.channels
    }

    pub fn refresh(&self) -> &RefreshScheduler {
        &self.refresh
    }

    pub fn sequencer(&self) -> &BurstSequencer {
        &self.sequencer
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn owner(&self) -> BusOwner {
        self.arbiter.owner()
    }

    /// Allows or withholds refresh grants.
    pub fn set_refresh_permit(&mut self, permit: bool) {
        self.scheduler.set_refresh_permit(permit);
    }

    pub fn status(&self) -> ControllerStatus {
        let r = self.refresh.status();
        ControllerStatus {
            initialised: r.initialised,
            refresh_in_progress: r.in_progress,
            request_to_refresh_soon: r.request_soon,
            refresh_lapsed: r.lapsed,
        }
    }

    /// Snapshot of the statistics, including refresh and channel counters.
    pub fn stats(&self) -> ControllerStats {
        let mut stats = self.stats.clone();
        stats.refreshes = self.refresh.refreshes();
        stats.refresh_episodes = self.refresh.episodes();
        stats.lapses = self.refresh.lapses();
        stats.undriven_reads = self.sequencer.undriven_reads();
        for ch in self.channels.iter() {
            let c = ch.counters();
            stats.bypass_words += c.bypass_words;
            stats.words_to_device += c.words_to_device;
            stats.words_from_device += c.words_from_device;
            stats.write_turns += c.write_turns;
            stats.read_turns += c.read_turns;
        }
        stats
    }

    /// Advances the controller by one clock cycle.
    ///
    /// # Arguments
    ///
    /// * `dq_in` - Data bus as registered at the end of the previous cycle,
    ///   `None` when the device did not drive it.
    ///
    /// # Returns
    ///
    /// The pin levels to present to the device for this cycle.
    pub fn tick(&mut self, dq_in: Option<Word>) -> PinState {
        let cycle = self.cycle;
        let rw_in_progress = self.sequencer.in_progress();
        let refresh_status = self.refresh.status();

        if let Some(completion) = self.sequencer.capture(dq_in) {
            self.channels.deliver(completion);
        }

        if !rw_in_progress {
            self.channels.retire_turns();
        }
        self.channels.tick();

        let decision = self
            .scheduler
            .tick(&refresh_status, rw_in_progress, &self.channels);
        if let Some((index, kind)) = decision.start {
            let base = self.channels.begin_turn(index, kind);
            self.sequencer.start(kind, index, base);
        }

        let grant = self.arbiter.grant(decision.enable_refresh, rw_in_progress);
        let from_refresh = self.refresh.tick(grant);
        let step = self.sequencer.tick();

        let owner = self.arbiter.update(&self.refresh.status(), rw_in_progress);
        let mut pins = self.arbiter.drive(cycle, from_refresh, step.command);
        if let Some(beat) = step.write_beat {
            pins = pins.with_data(self.channels.write_word(beat));
        }

        self.record(owner, &pins, step.command.is_some());
        self.cycle += 1;
        pins
    }

    fn record(&mut self, owner: BusOwner, pins: &PinState, bursting: bool) {
        let s = &mut self.stats;
        s.cycles += 1;
        match pins::decode(pins) {
            Command::Activate => s.activates += 1,
            Command::Read | Command::ReadAutoPrecharge => s.read_bursts += 1,
            Command::Write | Command::WriteAutoPrecharge => s.write_bursts += 1,
            _ => {}
        }
        if !self.refresh.status().initialised {
            s.cycles_init += 1;
        } else if owner == BusOwner::Refresh {
            s.cycles_refresh += 1;
        } else if bursting {
            s.cycles_burst += 1;
        } else {
            s.cycles_idle += 1;
        }
    }
}
