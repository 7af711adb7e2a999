//! Burst Sequencer.
//!
//! Runs one scheduler turn: `bursts_per_turn` back-to-back bursts of
//! `burst_length` words starting at a BL-aligned global address. Every burst
//! opens its row, issues a read or write with auto-precharge, and then holds
//! the bus until the bank is idle again, so no bank state survives between
//! bursts.
//!
//! Read data is tracked through a delay line as deep as the read latency:
//! the address of each read beat enters the line on the cycle the beat is
//! launched and leaves it on the cycle the controller samples the matching
//! word from the data bus.

use crate::common::{AddressLayout, BurstKind, GlobalAddr, Word};
use crate::config::Timing;
use crate::pins::{BusCommand, Command};
use std::collections::VecDeque;

/// In-flight state of one turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BurstDescriptor {
    pub kind: BurstKind,
    pub channel: usize,
    /// Address of the first word of the turn.
    pub base: GlobalAddr,
    /// Burst index within the turn.
    pub repetition: u32,
    /// Cycle within the current burst, counted from its ACTIVATE.
    pub cycle: u32,
}

impl BurstDescriptor {
    /// First address of the current burst.
    pub fn burst_addr(&self, burst_length: u32) -> GlobalAddr {
        self.base.offset(self.repetition * burst_length)
    }

    /// Data beat transferred on the current cycle, if any.
    pub fn beat(&self, t_rcd: u32, burst_length: u32) -> Option<u32> {
        if self.cycle >= t_rcd && self.cycle < t_rcd + burst_length {
            Some(self.cycle - t_rcd)
        } else {
            None
        }
    }
}

/// A read word leaving the read pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadCompletion {
    pub address: GlobalAddr,
    pub data: Word,
}

/// A write beat the controller must feed with a word this cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteBeat {
    pub channel: usize,
    pub address: GlobalAddr,
}

/// What the sequencer wants on the pins this cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SequencerStep {
    pub command: Option<BusCommand>,
    pub write_beat: Option<WriteBeat>,
}

pub struct BurstSequencer {
    layout: AddressLayout,
    timing: Timing,
    current: Option<BurstDescriptor>,
    pipeline: VecDeque<Option<GlobalAddr>>,
    undriven_reads: u64,
}

impl BurstSequencer {
    pub fn new(layout: AddressLayout, timing: &Timing) -> Self {
        let depth = timing.read_latency as usize;
        Self {
            layout,
            timing: *timing,
            current: None,
            pipeline: std::iter::repeat(None).take(depth).collect(),
            undriven_reads: 0,
        }
    }

    /// `true` from the cycle a turn starts until its last burst has released
    /// the bank.
    pub fn in_progress(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&BurstDescriptor> {
        self.current.as_ref()
    }

    /// Read beats that found nothing driving the data bus.
    pub fn undriven_reads(&self) -> u64 {
        self.undriven_reads
    }

    /// Number of read beats launched but not yet sampled.
    pub fn reads_in_flight(&self) -> usize {
        self.pipeline.iter().filter(|slot| slot.is_some()).count()
    }

    /// Starts a turn. The first ACTIVATE goes out on the next [`tick`].
    ///
    /// [`tick`]: BurstSequencer::tick
    pub fn start(&mut self, kind: BurstKind, channel: usize, base: GlobalAddr) {
        debug_assert!(self.current.is_none(), "turn started while another is in flight");
        log::trace!("{} turn for channel {} at {}", kind, channel, base);
        self.current = Some(BurstDescriptor {
            kind,
            channel,
            base,
            repetition: 0,
            cycle: 0,
        });
    }

    /// Samples the data bus; call once per cycle before [`tick`].
    ///
    /// `dq_in` is the registered data bus, `None` when nothing drove it.
    ///
    /// [`tick`]: BurstSequencer::tick
    pub fn capture(&mut self, dq_in: Option<Word>) -> Option<ReadCompletion> {
        let address = self.pipeline.pop_front().flatten()?;
        let data = match dq_in {
            Some(word) => word,
            None => {
                log::warn!("read of {} sampled an undriven data bus", address);
                self.undriven_reads += 1;
                0
            }
        };
        Some(ReadCompletion { address, data })
    }

    /// Advances one cycle; call once per cycle after [`capture`].
    ///
    /// [`capture`]: BurstSequencer::capture
    pub fn tick(&mut self) -> SequencerStep {
        let Some(mut desc) = self.current else {
            self.pipeline.push_back(None);
            return SequencerStep::default();
        };

        let t = &self.timing;
        let addr = desc.burst_addr(t.burst_length);
        let dev = self.layout.decompose(addr);

        let command = if desc.cycle == 0 {
            BusCommand::with_payload(Command::Activate, dev.bank, dev.row)
        } else if desc.cycle == t.t_rcd {
            let cmd = match desc.kind {
                BurstKind::Read => Command::ReadAutoPrecharge,
                BurstKind::Write => Command::WriteAutoPrecharge,
            };
            BusCommand::with_payload(cmd, dev.bank, dev.column)
        } else {
            BusCommand::nop()
        };

        let mut step = SequencerStep {
            command: Some(command),
            write_beat: None,
        };
        let mut launched = None;
        if let Some(beat) = desc.beat(t.t_rcd, t.burst_length) {
            let address = addr.offset(beat);
            match desc.kind {
                BurstKind::Read => launched = Some(address),
                BurstKind::Write => {
                    step.write_beat = Some(WriteBeat {
                        channel: desc.channel,
                        address,
                    })
                }
            }
        }
        self.pipeline.push_back(launched);

        desc.cycle += 1;
        if desc.cycle == t.burst_cycles {
            desc.cycle = 0;
            desc.repetition += 1;
        }
        self.current = if desc.repetition == t.bursts_per_turn {
            None
        } else {
            Some(desc)
        };

        step
    }
}
