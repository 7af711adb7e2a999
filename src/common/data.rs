//! Burst Direction Types.
//!
//! This module defines the classification of bursts used throughout the
//! controller. The scheduler, the burst sequencer, and the channel buffers
//! all agree on the direction of a turn through this type.

/// Direction of a burst relative to the SDRAM device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BurstKind {
    /// Device read: data flows from the device into a channel's egress buffer.
    Read,

    /// Device write: data flows from a channel's ingress buffer into the device.
    Write,
}

impl std::fmt::Display for BurstKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BurstKind::Read => write!(f, "read"),
            BurstKind::Write => write!(f, "write"),
        }
    }
}
