//! Client Channel Ports.
//!
//! A channel port is the handshake interface one client sees: a write side
//! (`w_rdy`, `write`, `w_level`) feeding the controller and a read side
//! (`r_rdy`, `read`, `r_level`) draining it. Both directions are bounded
//! lock-free queues, so a port can be cloned onto a producer or consumer
//! thread running at its own pace while the controller ticks in its own
//! domain.

use crate::common::Word;
use crossbeam::queue::ArrayQueue;
use std::sync::Arc;

/// Client-facing FIFO pair for one channel.
#[derive(Clone, Debug)]
pub struct ChannelPort {
    ingress: Arc<ArrayQueue<Word>>,
    egress: Arc<ArrayQueue<Word>>,
}

impl ChannelPort {
    /// Creates a port whose queues each hold `depth` words.
    pub fn new(depth: usize) -> Self {
        Self {
            ingress: Arc::new(ArrayQueue::new(depth)),
            egress: Arc::new(ArrayQueue::new(depth)),
        }
    }

    /// Write ready: the ingress queue can accept a word.
    pub fn w_rdy(&self) -> bool {
        !self.ingress.is_full()
    }

    /// Strobes `w_en` with `word`.
    ///
    /// Returns `true` if the word was accepted; a write while not ready is
    /// refused, never dropped silently.
    pub fn write(&self, word: Word) -> bool {
        self.ingress.push(word).is_ok()
    }

    /// Number of words waiting in the ingress queue.
    pub fn w_level(&self) -> usize {
        self.ingress.len()
    }

    /// Read ready: the egress queue holds a word.
    pub fn r_rdy(&self) -> bool {
        !self.egress.is_empty()
    }

    /// Strobes `r_en`, returning the oldest word if one was ready.
    pub fn read(&self) -> Option<Word> {
        self.egress.pop()
    }

    /// Number of words waiting in the egress queue.
    pub fn r_level(&self) -> usize {
        self.egress.len()
    }

    /// Device side: takes the next client word, if any.
    pub(crate) fn take_ingress(&self) -> Option<Word> {
        self.ingress.pop()
    }

    /// Device side: room for another word towards the client.
    pub(crate) fn egress_ready(&self) -> bool {
        !self.egress.is_full()
    }

    /// Device side: hands a word to the client.
    pub(crate) fn offer_egress(&self, word: Word) -> Result<(), Word> {
        self.egress.push(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_respects_depth() {
        let port = ChannelPort::new(2);
        assert!(port.w_rdy());
        assert!(port.write(1));
        assert!(port.write(2));
        assert!(!port.w_rdy());
        assert!(!port.write(3));
        assert_eq!(port.w_level(), 2);

        assert!(!port.r_rdy());
        assert_eq!(port.take_ingress(), Some(1));
        assert!(port.offer_egress(1).is_ok());
        assert!(port.r_rdy());
        assert_eq!(port.read(), Some(1));
        assert_eq!(port.read(), None);
    }
}
