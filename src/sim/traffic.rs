//! Streaming Workload.
//!
//! Each channel gets a client that writes a counting sequence into its port
//! and reads it back, checking that every word returns intact and in order.

use crate::common::{ProtocolViolation, Word};
use crate::fifo::ChannelPort;
use crate::soc::System;

/// Order in which a client issues its writes and reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pattern {
    /// Write and read concurrently, one word each per cycle at most.
    Interleaved,
    /// Write every word before reading any back.
    WriteThenRead,
}

/// Ways a workload run can fail.
#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Protocol(#[from] ProtocolViolation),

    #[error("channel {channel}: word {index} read back as {got:#06x}, expected {expected:#06x}")]
    Mismatch {
        channel: usize,
        index: u32,
        expected: Word,
        got: Word,
    },

    #[error("workload incomplete after {cycles} cycles ({pending} words outstanding)")]
    Timeout { cycles: u64, pending: u64 },
}

/// One channel's client.
pub struct Stream {
    channel: usize,
    port: ChannelPort,
    words: u32,
    written: u32,
    read: u32,
    seed: Word,
}

impl Stream {
    pub fn new(channel: usize, port: ChannelPort, words: u32) -> Self {
        Self {
            channel,
            port,
            words,
            written: 0,
            read: 0,
            seed: (channel as Word) << 12,
        }
    }

    /// The `i`-th word of this stream's sequence.
    pub fn word(&self, i: u32) -> Word {
        self.seed.wrapping_add(i as Word)
    }

    pub fn written(&self) -> u32 {
        self.written
    }

    pub fn read(&self) -> u32 {
        self.read
    }

    pub fn done(&self) -> bool {
        self.read == self.words
    }

    fn pump_write(&mut self) {
        if self.written < self.words && self.port.write(self.word(self.written)) {
            self.written += 1;
        }
    }

    fn pump_read(&mut self) -> Result<(), RunError> {
        if self.read == self.words {
            return Ok(());
        }
        let Some(got) = self.port.read() else {
            return Ok(());
        };
        let expected = self.word(self.read);
        if got != expected {
            return Err(RunError::Mismatch {
                channel: self.channel,
                index: self.read,
                expected,
                got,
            });
        }
        self.read += 1;
        Ok(())
    }
}

/// Clients for every channel of a system.
pub struct Workload {
    streams: Vec<Stream>,
    pattern: Pattern,
}

impl Workload {
    /// Creates one stream of `words` words per channel of `system`.
    pub fn new(system: &System, words: u32, pattern: Pattern) -> Self {
        let count = system.controller.channels().len();
        Self {
            streams: (0..count)
                .map(|i| Stream::new(i, system.port(i), words))
                .collect(),
            pattern,
        }
    }

    pub fn streams(&self) -> &[Stream] {
        &self.streams
    }

    /// Words still to be read back across all streams.
    pub fn pending(&self) -> u64 {
        self.streams
            .iter()
            .map(|s| u64::from(s.words - s.read))
            .sum()
    }

    /// Runs until every stream has read back its words.
    ///
    /// # Returns
    ///
    /// Cycles spent in the run.
    pub fn run(&mut self, system: &mut System, max_cycles: u64) -> Result<u64, RunError> {
        let start = system.cycle();
        while !self.streams.iter().all(Stream::done) {
            let cycles = system.cycle() - start;
            if cycles >= max_cycles {
                return Err(RunError::Timeout {
                    cycles,
                    pending: self.pending(),
                });
            }
            for stream in &mut self.streams {
                stream.pump_write();
                if self.pattern == Pattern::Interleaved || stream.written == stream.words {
                    stream.pump_read()?;
                }
            }
            system.tick()?;
        }
        log::debug!(
            "workload finished: {} stream(s) in {} cycles",
            self.streams.len(),
            system.cycle() - start
        );
        Ok(system.cycle() - start)
    }
}
