//! FIFO buffering.
//!
//! Two kinds of queue carry client data. [`ChannelPort`] is the client-facing
//! side and may be shared with other threads; [`Fifo`] is the same-domain
//! buffer the controller owns and inspects every tick.

/// Client-facing channel ports.
pub mod port;

pub use port::ChannelPort;

use std::collections::VecDeque;

/// Bounded synchronous FIFO owned by the device clock domain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fifo<T> {
    inner: VecDeque<T>,
    capacity: usize,
}

impl<T> Fifo<T> {
    /// Creates an empty FIFO holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `value`, handing it back if the FIFO is full.
    pub fn push(&mut self, value: T) -> Result<(), T> {
        if self.is_full() {
            return Err(value);
        }
        self.inner.push_back(value);
        Ok(())
    }

    /// Removes the oldest entry.
    pub fn pop(&mut self) -> Option<T> {
        self.inner.pop_front()
    }

    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.inner.front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.inner.len() >= self.capacity
    }

    /// Number of entries that can still be pushed.
    #[must_use]
    pub fn free(&self) -> usize {
        self.capacity - self.inner.len()
    }

    /// Returns `true` if `n` more entries fit.
    #[must_use]
    pub fn can_fit(&self, n: usize) -> bool {
        self.inner.len() + n <= self.capacity
    }
}

impl<T> std::fmt::Display for Fifo<T>
where
    T: std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Fifo({:>2}/{:<2})", self.inner.len(), self.capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_rejects_when_full() {
        let mut fifo = Fifo::new(2);
        assert!(fifo.push(1).is_ok());
        assert!(fifo.push(2).is_ok());
        assert_eq!(fifo.push(3), Err(3));
        assert_eq!(fifo.free(), 0);
        assert_eq!(fifo.pop(), Some(1));
        assert!(fifo.can_fit(1));
        assert!(!fifo.can_fit(2));
    }
}
