//! Controller configuration.
//!
//! The configuration is read once from a TOML file before the first tick.
//! Every field has a default, so a partial file (or none at all) describes a
//! 32 MB, 4-bank, 16-bit device clocked at 100 MHz with one client channel.
//! [`Timing`] turns the datasheet durations into whole clock cycles.

use crate::common::addr::AddressLayout;
use crate::common::error::ConfigError;
use crate::pins::ModeRegister;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const DEFAULT_FREQUENCY_HZ: u64 = 100_000_000;
const DEFAULT_MAX_CYCLES: u64 = 10_000_000;

const DEFAULT_BANK_BITS: u32 = 2;
const DEFAULT_ROW_BITS: u32 = 13;
const DEFAULT_COL_BITS: u32 = 9;

const NS_PER_SECOND: u128 = 1_000_000_000;
const MAX_COL_BITS: u32 = 10;
const MAX_ROW_BITS: u32 = 15;
const MAX_BANK_BITS: u32 = 4;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub geometry: GeometryConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub burst: BurstConfig,
    #[serde(default)]
    pub channels: ChannelConfig,
}

impl Config {
    /// Parses a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Address layout of the configured device.
    pub fn layout(&self) -> AddressLayout {
        AddressLayout::new(
            self.geometry.bank_bits,
            self.geometry.row_bits,
            self.geometry.col_bits,
        )
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    #[serde(default)]
    pub trace_commands: bool,
    #[serde(default = "default_max_cycles")]
    pub max_cycles: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            trace_commands: false,
            max_cycles: default_max_cycles(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClockConfig {
    #[serde(default = "default_frequency_hz")]
    pub frequency_hz: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            frequency_hz: default_frequency_hz(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeometryConfig {
    #[serde(default = "default_bank_bits")]
    pub bank_bits: u32,
    #[serde(default = "default_row_bits")]
    pub row_bits: u32,
    #[serde(default = "default_col_bits")]
    pub col_bits: u32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            bank_bits: default_bank_bits(),
            row_bits: default_row_bits(),
            col_bits: default_col_bits(),
        }
    }
}

/// Datasheet timing, as minimum durations in nanoseconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimingConfig {
    /// Power-up stabilisation delay before the first command.
    #[serde(default = "default_t_startup_ns")]
    pub t_startup_ns: u64,
    /// ACTIVATE to READ/WRITE delay.
    #[serde(default = "default_t_rcd_ns")]
    pub t_rcd_ns: u64,
    /// Row cycle time (ACTIVATE to ACTIVATE, REFRESH to any command).
    #[serde(default = "default_t_rc_ns")]
    pub t_rc_ns: u64,
    /// PRECHARGE to ACTIVATE/REFRESH delay.
    #[serde(default = "default_t_rp_ns")]
    pub t_rp_ns: u64,
    /// MODE REGISTER SET to next command delay.
    #[serde(default = "default_t_mrd_ns")]
    pub t_mrd_ns: u64,
    /// Write recovery before auto-precharge starts.
    #[serde(default = "default_t_wr_ns")]
    pub t_wr_ns: u64,
    /// CAS latency, in cycles.
    #[serde(default = "default_cas_latency")]
    pub cas_latency: u32,
    /// Retention period within which every row must be refreshed.
    #[serde(default = "default_t_refresh_period_ns")]
    pub t_refresh_period_ns: u64,
    /// REFRESH commands required per retention period.
    #[serde(default = "default_refreshes_per_period")]
    pub refreshes_per_period: u64,
    /// Refreshes owed before the scheduler asks for the bus.
    #[serde(default = "default_refresh_threshold")]
    pub refresh_threshold: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            t_startup_ns: default_t_startup_ns(),
            t_rcd_ns: default_t_rcd_ns(),
            t_rc_ns: default_t_rc_ns(),
            t_rp_ns: default_t_rp_ns(),
            t_mrd_ns: default_t_mrd_ns(),
            t_wr_ns: default_t_wr_ns(),
            cas_latency: default_cas_latency(),
            t_refresh_period_ns: default_t_refresh_period_ns(),
            refreshes_per_period: default_refreshes_per_period(),
            refresh_threshold: default_refresh_threshold(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BurstConfig {
    #[serde(default = "default_burst_length")]
    pub burst_length: u32,
    #[serde(default = "default_bursts_per_turn")]
    pub bursts_per_turn: u32,
}

impl Default for BurstConfig {
    fn default() -> Self {
        Self {
            burst_length: default_burst_length(),
            bursts_per_turn: default_bursts_per_turn(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChannelConfig {
    #[serde(default = "default_channel_count")]
    pub count: usize,
    /// Words of device address space owned by each channel.
    #[serde(default = "default_window_words")]
    pub window_words: u32,
    /// Depth of each ingress/egress FIFO, in words.
    #[serde(default = "default_fifo_depth")]
    pub fifo_depth: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            count: default_channel_count(),
            window_words: default_window_words(),
            fifo_depth: default_fifo_depth(),
        }
    }
}

fn default_max_cycles() -> u64 {
    DEFAULT_MAX_CYCLES
}

fn default_frequency_hz() -> u64 {
    DEFAULT_FREQUENCY_HZ
}

fn default_bank_bits() -> u32 {
    DEFAULT_BANK_BITS
}

fn default_row_bits() -> u32 {
    DEFAULT_ROW_BITS
}

fn default_col_bits() -> u32 {
    DEFAULT_COL_BITS
}

fn default_t_startup_ns() -> u64 {
    100_000
}

fn default_t_rcd_ns() -> u64 {
    18
}

fn default_t_rc_ns() -> u64 {
    60
}

fn default_t_rp_ns() -> u64 {
    18
}

fn default_t_mrd_ns() -> u64 {
    14
}

fn default_t_wr_ns() -> u64 {
    12
}

fn default_cas_latency() -> u32 {
    3
}

fn default_t_refresh_period_ns() -> u64 {
    64_000_000
}

fn default_refreshes_per_period() -> u64 {
    8192
}

fn default_refresh_threshold() -> u64 {
    4
}

fn default_burst_length() -> u32 {
    8
}

fn default_bursts_per_turn() -> u32 {
    2
}

fn default_channel_count() -> usize {
    1
}

fn default_window_words() -> u32 {
    4096
}

fn default_fifo_depth() -> usize {
    32
}

/// Converts a minimum duration to a whole number of clock cycles.
///
/// Rounds up, so the resulting delay is never shorter than the datasheet
/// minimum. Saturates at `u64::MAX`.
pub fn ns_to_cycles(ns: u64, frequency_hz: u64) -> u64 {
    let scaled = u128::from(ns) * u128::from(frequency_hz);
    u64::try_from(scaled.div_ceil(NS_PER_SECOND)).unwrap_or(u64::MAX)
}

/// Timing and geometry in clock cycles, derived once from a [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub startup: u64,
    pub t_rcd: u32,
    pub t_rc: u32,
    pub t_rp: u32,
    pub t_mrd: u32,
    pub t_wr: u32,
    pub cas_latency: u32,
    /// Cycles of retention the budget starts from (`clks_per_refresh_period`).
    pub refresh_period: u64,
    /// Budget restored by one completed REFRESH.
    pub refresh_increment: u64,
    pub refresh_threshold: u64,
    pub burst_length: u32,
    pub bursts_per_turn: u32,
    /// Cycles one burst holds the bus, from ACTIVATE to the next ACTIVATE.
    pub burst_cycles: u32,
    /// Cycles from a READ command to the controller sampling its first word.
    pub read_latency: u32,
    pub mode_register: ModeRegister,
}

impl Timing {
    /// Derives and validates the cycle-level timing for `config`.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let freq = config.clock.frequency_hz;
        if freq == 0 {
            return Err(ConfigError::invalid("clock.frequency_hz", "must be non-zero"));
        }

        let t = &config.timing;
        let b = &config.burst;
        let mode_register = ModeRegister::new(b.burst_length, t.cas_latency)?;

        if b.bursts_per_turn == 0 {
            return Err(ConfigError::invalid("burst.bursts_per_turn", "must be non-zero"));
        }

        let g = &config.geometry;
        if g.col_bits > MAX_COL_BITS {
            return Err(ConfigError::invalid(
                "geometry.col_bits",
                format!("{} would collide with the auto-precharge bit", g.col_bits),
            ));
        }
        if g.col_bits < b.burst_length.trailing_zeros() {
            return Err(ConfigError::invalid(
                "geometry.col_bits",
                "a row must hold at least one burst",
            ));
        }
        if g.row_bits == 0 || g.row_bits > MAX_ROW_BITS {
            return Err(ConfigError::invalid(
                "geometry.row_bits",
                format!("{} is outside 1..={}", g.row_bits, MAX_ROW_BITS),
            ));
        }
        if g.bank_bits > MAX_BANK_BITS {
            return Err(ConfigError::invalid(
                "geometry.bank_bits",
                format!("{} is above {}", g.bank_bits, MAX_BANK_BITS),
            ));
        }

        let cycles = |field: &'static str, ns: u64| {
            u32::try_from(ns_to_cycles(ns, freq)).map_err(|_| {
                ConfigError::invalid(field, format!("{} ns does not fit a cycle counter", ns))
            })
        };
        // A command occupies its own cycle, so spacing is never below one.
        let t_rcd = cycles("timing.t_rcd_ns", t.t_rcd_ns)?.max(1);
        let t_rc = cycles("timing.t_rc_ns", t.t_rc_ns)?.max(1);
        let t_rp = cycles("timing.t_rp_ns", t.t_rp_ns)?.max(1);
        let t_mrd = cycles("timing.t_mrd_ns", t.t_mrd_ns)?.max(1);
        let t_wr = cycles("timing.t_wr_ns", t.t_wr_ns)?;
        let cas_latency = t.cas_latency;
        let burst_length = b.burst_length;

        let sum = |parts: &[u32]| {
            parts
                .iter()
                .try_fold(0u32, |acc, &p| acc.checked_add(p))
                .ok_or_else(|| ConfigError::invalid("timing", "burst duration overflows"))
        };
        let burst_cycles = t_rc
            .max(sum(&[t_rcd, burst_length, t_wr, t_rp])?)
            .max(sum(&[t_rcd, cas_latency, burst_length, 1])?);

        if t.refreshes_per_period == 0 {
            return Err(ConfigError::invalid(
                "timing.refreshes_per_period",
                "must be non-zero",
            ));
        }
        let refresh_period = ns_to_cycles(t.t_refresh_period_ns, freq);
        let refresh_increment = refresh_period / t.refreshes_per_period;
        if refresh_increment <= u64::from(t_rc) {
            return Err(ConfigError::invalid(
                "timing.refreshes_per_period",
                format!(
                    "one refresh restores {} cycles, not more than tRC ({} cycles)",
                    refresh_increment, t_rc
                ),
            ));
        }

        // Once a request is raised, the bus may stay with one turn per
        // channel before the first REFRESH of the episode completes.
        let turn_cycles = u64::from(burst_cycles) * u64::from(b.bursts_per_turn);
        let worst_wait = turn_cycles * config.channels.count.max(1) as u64;
        let raised_at = t
            .refresh_threshold
            .saturating_add(1)
            .saturating_mul(refresh_increment);
        let deadline = raised_at
            .saturating_add(worst_wait)
            .saturating_add(u64::from(t_rc));
        if deadline >= refresh_period {
            return Err(ConfigError::invalid(
                "timing.refresh_threshold",
                format!(
                    "{} owed refreshes plus {} cycles of turns leave no margin in a {} cycle period",
                    t.refresh_threshold, worst_wait, refresh_period
                ),
            ));
        }

        let timing = Self {
            startup: ns_to_cycles(t.t_startup_ns, freq),
            t_rcd,
            t_rc,
            t_rp,
            t_mrd,
            t_wr,
            cas_latency,
            refresh_period,
            refresh_increment,
            refresh_threshold: t.refresh_threshold,
            burst_length,
            bursts_per_turn: b.bursts_per_turn,
            burst_cycles,
            read_latency: cas_latency + 1,
            mode_register,
        };

        timing.check_channels(config)?;
        Ok(timing)
    }

    /// Words moved by one scheduler turn.
    pub fn turn_words(&self) -> u32 {
        self.burst_length * self.bursts_per_turn
    }

    fn check_channels(&self, config: &Config) -> Result<(), ConfigError> {
        let c = &config.channels;
        let turn = self.turn_words();

        if c.count == 0 {
            return Err(ConfigError::invalid("channels.count", "must be non-zero"));
        }
        if c.window_words % turn != 0 || c.window_words < 2 * turn {
            return Err(ConfigError::invalid(
                "channels.window_words",
                format!("{} is not a multiple of at least two turns of {} words", c.window_words, turn),
            ));
        }
        let needed = c.count as u64 * u64::from(c.window_words);
        if needed > config.layout().capacity_words() {
            return Err(ConfigError::invalid(
                "channels.window_words",
                format!(
                    "{} channels need {} words, device holds {}",
                    c.count,
                    needed,
                    config.layout().capacity_words()
                ),
            ));
        }
        if c.fifo_depth < turn as usize {
            return Err(ConfigError::invalid(
                "channels.fifo_depth",
                format!("{} cannot hold one turn of {} words", c.fifo_depth, turn),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let timing = Timing::from_config(&Config::default()).unwrap();
        assert_eq!(timing.t_rcd, 2);
        assert_eq!(timing.t_rc, 6);
        assert_eq!(timing.burst_cycles, 14);
        assert_eq!(timing.refresh_increment, 781);
    }
}
