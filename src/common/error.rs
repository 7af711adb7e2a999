//! Error Types.
//!
//! The controller itself never fails at run time: every abnormal condition it
//! can meet is a level-held status signal. The only `Result` errors are
//! configuration problems, found once before the first tick, and the protocol
//! violations reported by the behavioral device model used for verification.

use crate::pins::Command;
use std::path::PathBuf;

/// Errors raised while loading or validating a configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`crate::config::Config`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field holds a value the controller cannot work with.
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Protocol violations detected by the behavioral SDRAM model.
///
/// Each variant carries the device cycle on which the offending pin pattern
/// was sampled.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// A command other than no-op/deselect arrived before the power-up delay.
    #[error("cycle {cycle}: {command} issued before the {required}-cycle startup delay elapsed")]
    StartupNotElapsed {
        cycle: u64,
        command: Command,
        required: u64,
    },

    /// An access command arrived before the mode register was programmed.
    #[error("cycle {cycle}: {command} issued before the mode register was set")]
    NotInitialised { cycle: u64, command: Command },

    /// A minimum delay between two commands was not honored.
    #[error("cycle {cycle}: {constraint} violated on bank {bank}")]
    Timing {
        cycle: u64,
        constraint: &'static str,
        bank: u8,
    },

    /// ACTIVATE or MODE REGISTER SET reached a bank that was not idle.
    #[error("cycle {cycle}: {command} on bank {bank} which is not idle")]
    BankNotIdle {
        cycle: u64,
        command: Command,
        bank: u8,
    },

    /// READ or WRITE reached a bank with no open row.
    #[error("cycle {cycle}: {command} on bank {bank} which has no active row")]
    BankNotActive {
        cycle: u64,
        command: Command,
        bank: u8,
    },

    /// Controller and device both drove the data bus.
    #[error("cycle {cycle}: data bus driven by controller during a read burst")]
    BusContention { cycle: u64 },

    /// A write burst beat arrived without the controller driving data.
    #[error("cycle {cycle}: write beat on bank {bank} without data on the bus")]
    MissingWriteData { cycle: u64, bank: u8 },

    /// The pin pattern does not decode to a legal command.
    #[error("cycle {cycle}: illegal command pattern on the control pins")]
    IllegalCommand { cycle: u64 },

    /// The command is legal but outside what the model emulates.
    #[error("cycle {cycle}: {command} is not supported by the device model")]
    Unsupported { cycle: u64, command: Command },

    /// The mode register payload is malformed or disagrees with the model.
    #[error("cycle {cycle}: bad mode register value {value:#x}: {reason}")]
    ModeRegister {
        cycle: u64,
        value: u16,
        reason: String,
    },
}
