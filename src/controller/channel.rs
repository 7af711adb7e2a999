//! Channel Buffer Manager.
//!
//! Every channel owns a client port, a pair of device-domain FIFOs, and a
//! private circular window of device address space. While the device holds
//! nothing for a channel, words flow straight from its ingress FIFO to its
//! egress FIFO (bypass). Once the egress side backs up with a full turn of
//! words still waiting, the channel parks data in its window instead and the
//! scheduler moves it in and out a turn at a time.
//!
//! Window accounting keeps one word of the window unused, so equal cursors
//! always mean an empty window.

use super::sequencer::{ReadCompletion, WriteBeat};
use crate::common::{BurstKind, GlobalAddr, Word};
use crate::config::{Config, Timing};
use crate::fifo::{ChannelPort, Fifo};

/// Routing policy of one channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferMode {
    /// Ingress feeds egress directly.
    Bypass,
    /// Data is staged through the device window.
    UseDevice,
}

/// Per-channel traffic counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChannelCounters {
    pub bypass_words: u64,
    pub words_to_device: u64,
    pub words_from_device: u64,
    pub write_turns: u64,
    pub read_turns: u64,
}

pub struct Channel {
    index: usize,
    port: ChannelPort,
    ingress: Fifo<Word>,
    egress: Fifo<Word>,
    window_base: GlobalAddr,
    window_words: u32,
    write_cursor: u32,
    read_cursor: u32,
    mode: BufferMode,
    in_flight: Option<BurstKind>,
    counters: ChannelCounters,
}

impl Channel {
    fn new(index: usize, window_words: u32, fifo_depth: usize) -> Self {
        Self {
            index,
            port: ChannelPort::new(fifo_depth),
            ingress: Fifo::new(fifo_depth),
            egress: Fifo::new(fifo_depth),
            window_base: GlobalAddr::new(index as u32 * window_words),
            window_words,
            write_cursor: 0,
            read_cursor: 0,
            mode: BufferMode::Bypass,
            in_flight: None,
            counters: ChannelCounters::default(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn port(&self) -> &ChannelPort {
        &self.port
    }

    pub fn mode(&self) -> BufferMode {
        self.mode
    }

    pub fn in_flight(&self) -> Option<BurstKind> {
        self.in_flight
    }

    pub fn counters(&self) -> ChannelCounters {
        self.counters
    }

    pub fn window_base(&self) -> GlobalAddr {
        self.window_base
    }

    pub fn write_cursor(&self) -> u32 {
        self.write_cursor
    }

    pub fn read_cursor(&self) -> u32 {
        self.read_cursor
    }

    /// Device-domain ingress FIFO fill level.
    pub fn ingress_level(&self) -> usize {
        self.ingress.len()
    }

    /// Device-domain egress FIFO fill level.
    pub fn egress_level(&self) -> usize {
        self.egress.len()
    }

    /// Words parked in the device window.
    pub fn words_stored(&self) -> u32 {
        words_stored(self.write_cursor, self.read_cursor, self.window_words)
    }

    /// Words the window can still accept.
    pub fn window_free(&self) -> u32 {
        self.window_words - self.words_stored() - 1
    }

    /// Client data not yet delivered, wherever it currently sits.
    pub fn backlog(&self) -> usize {
        self.port.w_level()
            + self.ingress.len()
            + self.words_stored() as usize
            + self.egress.len()
            + self.port.r_level()
    }

    /// A write turn may start: a turn of ingress data and a turn of window space.
    pub fn write_eligible(&self, turn_words: u32) -> bool {
        self.in_flight.is_none()
            && self.mode == BufferMode::UseDevice
            && self.ingress.len() >= turn_words as usize
            && self.window_free() >= turn_words
    }

    /// A read turn may start: a turn parked in the window and room for all of it.
    pub fn read_eligible(&self, turn_words: u32) -> bool {
        self.in_flight.is_none()
            && self.mode == BufferMode::UseDevice
            && self.words_stored() >= turn_words
            && self.egress.can_fit(turn_words as usize)
    }

    fn cross_domains(&mut self) {
        if let Some(&word) = self.egress.front() {
            if self.port.egress_ready() && self.port.offer_egress(word).is_ok() {
                self.egress.pop();
            }
        }
        if !self.ingress.is_full() {
            if let Some(word) = self.port.take_ingress() {
                // Cannot fail: checked for room above.
                let _ = self.ingress.push(word);
            }
        }
    }

    fn update_mode(&mut self, turn_words: u32) {
        let staging_needed =
            self.egress.is_full() && self.ingress.len() >= turn_words as usize;
        let next = match self.mode {
            BufferMode::Bypass if staging_needed => BufferMode::UseDevice,
            BufferMode::UseDevice if self.words_stored() == 0 && !staging_needed => {
                BufferMode::Bypass
            }
            mode => mode,
        };
        if next != self.mode {
            log::debug!(
                "channel {}: {:?} -> {:?}, ingress {}, egress {}",
                self.index,
                self.mode,
                next,
                self.ingress,
                self.egress
            );
            self.mode = next;
        }
    }

    fn bypass(&mut self) {
        if self.egress.is_full() {
            return;
        }
        if let Some(word) = self.ingress.pop() {
            let _ = self.egress.push(word);
            self.counters.bypass_words += 1;
        }
    }

    fn tick(&mut self, turn_words: u32) {
        self.cross_domains();
        if self.in_flight.is_some() {
            return;
        }
        self.update_mode(turn_words);
        if self.mode == BufferMode::Bypass {
            self.bypass();
        }
    }

    fn begin_turn(&mut self, kind: BurstKind, turn_words: u32) -> GlobalAddr {
        let cursor = match kind {
            BurstKind::Write => {
                let at = self.write_cursor;
                self.write_cursor = (at + turn_words) % self.window_words;
                self.counters.write_turns += 1;
                at
            }
            BurstKind::Read => {
                let at = self.read_cursor;
                self.read_cursor = (at + turn_words) % self.window_words;
                self.counters.read_turns += 1;
                at
            }
        };
        self.in_flight = Some(kind);
        self.window_base.offset(cursor)
    }
}

/// Circular distance from the read cursor to the write cursor.
pub fn words_stored(write_cursor: u32, read_cursor: u32, window_words: u32) -> u32 {
    (write_cursor + window_words - read_cursor) % window_words
}

pub struct ChannelBufferManager {
    channels: Vec<Channel>,
    window_words: u32,
    turn_words: u32,
}

impl ChannelBufferManager {
    pub fn new(config: &Config, timing: &Timing) -> Self {
        let c = &config.channels;
        Self {
            channels: (0..c.count)
                .map(|i| Channel::new(i, c.window_words, c.fifo_depth))
                .collect(),
            window_words: c.window_words,
            turn_words: timing.turn_words(),
        }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn channel(&self, index: usize) -> &Channel {
        &self.channels[index]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Channel> {
        self.channels.iter()
    }

    pub fn turn_words(&self) -> u32 {
        self.turn_words
    }

    /// Channel whose window contains `addr`.
    pub fn channel_for(&self, addr: GlobalAddr) -> Option<usize> {
        let index = (addr.val() / self.window_words) as usize;
        (index < self.channels.len()).then_some(index)
    }

    /// Turn the scheduler may start for `index`, writes first.
    pub fn eligible(&self, index: usize) -> Option<BurstKind> {
        let ch = &self.channels[index];
        if ch.write_eligible(self.turn_words) {
            Some(BurstKind::Write)
        } else if ch.read_eligible(self.turn_words) {
            Some(BurstKind::Read)
        } else {
            None
        }
    }

    /// Advances every channel by one cycle.
    pub fn tick(&mut self) {
        let turn = self.turn_words;
        for ch in &mut self.channels {
            ch.tick(turn);
        }
    }

    /// Clears the in-flight marker once the sequencer is idle again.
    pub fn retire_turns(&mut self) {
        for ch in &mut self.channels {
            ch.in_flight = None;
        }
    }

    /// Reserves a turn's worth of window for `index` and returns its base.
    pub fn begin_turn(&mut self, index: usize, kind: BurstKind) -> GlobalAddr {
        let turn = self.turn_words;
        self.channels[index].begin_turn(kind, turn)
    }

    /// Supplies the ingress word for a write beat.
    pub fn write_word(&mut self, beat: WriteBeat) -> Word {
        let ch = &mut self.channels[beat.channel];
        match ch.ingress.pop() {
            Some(word) => {
                ch.counters.words_to_device += 1;
                word
            }
            None => {
                log::error!(
                    "channel {}: ingress ran dry during write of {}",
                    beat.channel,
                    beat.address
                );
                0
            }
        }
    }

    /// Routes a read word to the egress FIFO of the channel owning its address.
    pub fn deliver(&mut self, completion: ReadCompletion) {
        let Some(index) = self.channel_for(completion.address) else {
            log::error!("read of {} matches no channel window", completion.address);
            return;
        };
        let ch = &mut self.channels[index];
        if ch.egress.push(completion.data).is_err() {
            log::error!(
                "channel {}: egress overflow, word from {} lost",
                index,
                completion.address
            );
            return;
        }
        ch.counters.words_from_device += 1;
    }
}
