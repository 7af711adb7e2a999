//! Behavioral SDR SDRAM Model.
//!
//! Samples the controller's pins once per cycle, tracks the state of every
//! bank, and stores written words sparsely. Every command is checked against
//! the datasheet rules the controller relies on; the first rule broken is
//! reported as a [`ProtocolViolation`] and leaves the model in an unspecified
//! state.
//!
//! Conventions, with `n` the cycle a command is sampled on:
//!
//! - read data for beat `i` is driven on cycle `n + CL + i`;
//! - write data for beat `i` is sampled on cycle `n + i`;
//! - auto-precharge starts at `n + BL` after a read and `n + BL + tWR` after
//!   a write, and the bank is idle `tRP` cycles later.

use crate::common::{
    AddressLayout, BurstKind, ConfigError, DeviceAddr, GlobalAddr, ProtocolViolation, Word,
};
use crate::config::{Config, Timing};
use crate::pins::{decode, Command, ModeRegister, PinState};
use crate::soc::traits::PinDevice;
use std::collections::{HashMap, VecDeque};

/// Observable state of one bank.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BankState {
    Idle,
    /// Row opened, `tRCD` not yet elapsed.
    Activating,
    Active,
    Reading,
    Writing,
    Precharging,
}

#[derive(Clone, Copy, Debug, Default)]
struct Bank {
    row: Option<u16>,
    activated_at: Option<u64>,
    /// Column burst in progress and the cycle it ends on (exclusive).
    burst: Option<(BurstKind, u64)>,
    /// Cycle a pending auto-precharge starts on.
    precharge_at: Option<u64>,
    /// Cycle the bank becomes idle after a precharge.
    idle_at: u64,
    /// Cycle the open row accepts column commands.
    active_at: u64,
}

impl Bank {
    fn settle(&mut self, cycle: u64, t_rp: u64) {
        if let Some((_, end)) = self.burst {
            if cycle >= end {
                self.burst = None;
            }
        }
        if let Some(at) = self.precharge_at {
            if cycle >= at {
                self.row = None;
                self.precharge_at = None;
                self.idle_at = at + t_rp;
            }
        }
    }

    fn precharge(&mut self, cycle: u64, t_rp: u64) {
        if self.row.take().is_some() {
            self.idle_at = cycle + t_rp;
        }
        self.precharge_at = None;
    }

    fn state(&self, cycle: u64) -> BankState {
        match (self.row, self.burst) {
            (Some(_), Some((BurstKind::Read, _))) => BankState::Reading,
            (Some(_), Some((BurstKind::Write, _))) => BankState::Writing,
            (Some(_), None) if cycle < self.active_at => BankState::Activating,
            (Some(_), None) => BankState::Active,
            (None, _) if cycle < self.idle_at => BankState::Precharging,
            (None, _) => BankState::Idle,
        }
    }
}

struct WriteBurst {
    bank: u8,
    start: u64,
    addrs: Vec<GlobalAddr>,
}

/// Cycle-level model of a single SDR SDRAM device.
pub struct SdramModel {
    layout: AddressLayout,
    timing: Timing,
    cycle: u64,
    banks: Vec<Bank>,
    mode: Option<ModeRegister>,
    last_refresh: Option<u64>,
    last_mrs: Option<u64>,
    last_activate: Option<u64>,
    reads: VecDeque<(u64, GlobalAddr)>,
    write: Option<WriteBurst>,
    storage: HashMap<GlobalAddr, Word>,
    refreshes: u64,
    activates: u64,
    read_bursts: u64,
    write_bursts: u64,
}

impl SdramModel {
    /// Creates a powered-up but uninitialised device.
    ///
    /// # Arguments
    ///
    /// * `layout` - Bank/row/column geometry.
    /// * `timing` - Minimum delays, in cycles, the device enforces.
    pub fn new(layout: AddressLayout, timing: &Timing) -> Self {
        Self {
            layout,
            timing: *timing,
            cycle: 0,
            banks: vec![Bank::default(); layout.banks()],
            mode: None,
            last_refresh: None,
            last_mrs: None,
            last_activate: None,
            reads: VecDeque::new(),
            write: None,
            storage: HashMap::new(),
            refreshes: 0,
            activates: 0,
            read_bursts: 0,
            write_bursts: 0,
        }
    }

    /// Creates a device matching `config`.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let timing = Timing::from_config(config)?;
        Ok(Self::new(config.layout(), &timing))
    }

    /// Cycles sampled so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Programmed mode register, once set.
    pub fn mode(&self) -> Option<ModeRegister> {
        self.mode
    }

    pub fn bank_state(&self, bank: u8) -> BankState {
        self.banks[bank as usize].state(self.cycle)
    }

    /// REFRESH commands accepted, including those of the power-up sequence.
    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }

    pub fn activates(&self) -> u64 {
        self.activates
    }

    pub fn read_bursts(&self) -> u64 {
        self.read_bursts
    }

    pub fn write_bursts(&self) -> u64 {
        self.write_bursts
    }

    /// Word stored at `addr`, if it was ever written.
    pub fn peek(&self, addr: GlobalAddr) -> Option<Word> {
        self.storage.get(&addr).copied()
    }

    /// Number of distinct words ever written.
    pub fn words_written(&self) -> usize {
        self.storage.len()
    }

    fn step(&mut self, n: u64, pins: &PinState) -> Result<Option<Word>, ProtocolViolation> {
        let t_rp = u64::from(self.timing.t_rp);
        for bank in &mut self.banks {
            bank.settle(n, t_rp);
        }

        let cmd = decode(pins);
        if !cmd.is_idle() {
            self.command(n, cmd, pins)?;
        }
        self.sample_write(n, pins)?;

        let out = match self.reads.front() {
            Some(&(at, addr)) if at == n => {
                self.reads.pop_front();
                Some(self.storage.get(&addr).copied().unwrap_or(0))
            }
            _ => None,
        };
        if out.is_some() && pins.dq_oe {
            return Err(ProtocolViolation::BusContention { cycle: n });
        }
        Ok(out)
    }

    fn command(&mut self, n: u64, cmd: Command, pins: &PinState) -> Result<(), ProtocolViolation> {
        if n < self.timing.startup {
            return Err(ProtocolViolation::StartupNotElapsed {
                cycle: n,
                command: cmd,
                required: self.timing.startup,
            });
        }

        let t_rp = u64::from(self.timing.t_rp);
        match cmd {
            Command::Illegal => Err(ProtocolViolation::IllegalCommand { cycle: n }),
            Command::BurstStop | Command::SelfRefresh => {
                Err(ProtocolViolation::Unsupported { cycle: n, command: cmd })
            }
            Command::PrechargeAll => {
                for bank in &mut self.banks {
                    bank.precharge(n, t_rp);
                }
                Ok(())
            }
            Command::Precharge => {
                let bank = self.bank_index(n, cmd, pins.ba)?;
                self.banks[bank].precharge(n, t_rp);
                Ok(())
            }
            Command::Refresh => {
                self.require_all_idle(n, cmd)?;
                self.check_since(n, self.last_refresh, self.timing.t_rc, "tRC", 0)?;
                self.check_since(n, self.last_activate, self.timing.t_rc, "tRC", 0)?;
                self.last_refresh = Some(n);
                self.refreshes += 1;
                Ok(())
            }
            Command::ModeRegisterSet => {
                self.require_all_idle(n, cmd)?;
                self.check_since(n, self.last_refresh, self.timing.t_rc, "tRC", 0)?;
                let mode = ModeRegister::decode(pins.a).map_err(|reason| {
                    ProtocolViolation::ModeRegister {
                        cycle: n,
                        value: pins.a,
                        reason,
                    }
                })?;
                if mode != self.timing.mode_register {
                    return Err(ProtocolViolation::ModeRegister {
                        cycle: n,
                        value: pins.a,
                        reason: format!(
                            "expected BL{} CL{}, got BL{} CL{}",
                            self.timing.mode_register.burst_length,
                            self.timing.mode_register.cas_latency,
                            mode.burst_length,
                            mode.cas_latency
                        ),
                    });
                }
                self.mode = Some(mode);
                self.last_mrs = Some(n);
                Ok(())
            }
            Command::Activate => {
                self.require_mode(n, cmd)?;
                let bank = self.bank_index(n, cmd, pins.ba)?;
                let ba = pins.ba;
                self.check_since(n, self.last_mrs, self.timing.t_mrd, "tMRD", ba)?;
                self.check_since(n, self.last_refresh, self.timing.t_rc, "tRC", ba)?;
                match self.banks[bank].state(n) {
                    BankState::Idle => {}
                    BankState::Precharging => {
                        return Err(ProtocolViolation::Timing {
                            cycle: n,
                            constraint: "tRP",
                            bank: ba,
                        })
                    }
                    _ => {
                        return Err(ProtocolViolation::BankNotIdle {
                            cycle: n,
                            command: cmd,
                            bank: ba,
                        })
                    }
                }
                self.check_since(n, self.banks[bank].activated_at, self.timing.t_rc, "tRC", ba)?;
                let row_mask = ((1u32 << self.layout.row_bits) - 1) as u16;
                self.banks[bank].row = Some(pins.a & row_mask);
                self.banks[bank].activated_at = Some(n);
                self.banks[bank].active_at = n + u64::from(self.timing.t_rcd);
                self.last_activate = Some(n);
                self.activates += 1;
                Ok(())
            }
            Command::Read
            | Command::ReadAutoPrecharge
            | Command::Write
            | Command::WriteAutoPrecharge => self.column_access(n, cmd, pins),
            Command::Nop | Command::Deselect => Ok(()),
        }
    }

    fn column_access(
        &mut self,
        n: u64,
        cmd: Command,
        pins: &PinState,
    ) -> Result<(), ProtocolViolation> {
        let mode = self.require_mode(n, cmd)?;
        let bank = self.bank_index(n, cmd, pins.ba)?;
        let ba = pins.ba;
        let Some(row) = self.banks[bank].row else {
            return Err(ProtocolViolation::BankNotActive {
                cycle: n,
                command: cmd,
                bank: ba,
            });
        };
        self.check_since(n, self.banks[bank].activated_at, self.timing.t_rcd, "tRCD", ba)?;
        if self.banks[bank].burst.is_some() || self.write.is_some() {
            return Err(ProtocolViolation::Unsupported { cycle: n, command: cmd });
        }

        let bl = mode.burst_length;
        let col_mask = ((1u32 << self.layout.col_bits) - 1) as u16;
        let column = pins.a & col_mask;
        let start = column & !(bl as u16 - 1);
        let addrs: Vec<GlobalAddr> = (0..bl as u16)
            .map(|i| {
                self.layout.compose(DeviceAddr {
                    bank: ba,
                    row,
                    column: start | ((column + i) & (bl as u16 - 1)),
                })
            })
            .collect();

        let kind = if cmd.is_read() {
            BurstKind::Read
        } else {
            BurstKind::Write
        };
        let end = n + u64::from(bl);
        let b = &mut self.banks[bank];
        b.burst = Some((kind, end));
        if cmd.auto_precharge() {
            b.precharge_at = Some(match kind {
                BurstKind::Read => end,
                BurstKind::Write => end + u64::from(self.timing.t_wr),
            });
        }

        match kind {
            BurstKind::Read => {
                self.read_bursts += 1;
                let cl = u64::from(mode.cas_latency);
                for (i, addr) in addrs.into_iter().enumerate() {
                    self.reads.push_back((n + cl + i as u64, addr));
                }
            }
            BurstKind::Write => {
                self.write_bursts += 1;
                self.write = Some(WriteBurst {
                    bank: ba,
                    start: n,
                    addrs,
                });
            }
        }
        Ok(())
    }

    fn sample_write(&mut self, n: u64, pins: &PinState) -> Result<(), ProtocolViolation> {
        let Some(burst) = &self.write else {
            return Ok(());
        };
        let beat = (n - burst.start) as usize;
        if !pins.dq_oe {
            return Err(ProtocolViolation::MissingWriteData {
                cycle: n,
                bank: burst.bank,
            });
        }
        self.storage.insert(burst.addrs[beat], pins.dq);
        if beat + 1 == burst.addrs.len() {
            self.write = None;
        }
        Ok(())
    }

    fn require_mode(&self, n: u64, cmd: Command) -> Result<ModeRegister, ProtocolViolation> {
        self.mode
            .ok_or(ProtocolViolation::NotInitialised { cycle: n, command: cmd })
    }

    fn require_all_idle(&self, n: u64, cmd: Command) -> Result<(), ProtocolViolation> {
        for (i, bank) in self.banks.iter().enumerate() {
            if bank.state(n) != BankState::Idle {
                return Err(ProtocolViolation::BankNotIdle {
                    cycle: n,
                    command: cmd,
                    bank: i as u8,
                });
            }
        }
        Ok(())
    }

    fn bank_index(&self, n: u64, cmd: Command, ba: u8) -> Result<usize, ProtocolViolation> {
        let bank = ba as usize;
        if bank >= self.banks.len() {
            return Err(ProtocolViolation::Unsupported { cycle: n, command: cmd });
        }
        Ok(bank)
    }

    fn check_since(
        &self,
        n: u64,
        since: Option<u64>,
        min: u32,
        constraint: &'static str,
        bank: u8,
    ) -> Result<(), ProtocolViolation> {
        match since {
            Some(at) if n < at + u64::from(min) => Err(ProtocolViolation::Timing {
                cycle: n,
                constraint,
                bank,
            }),
            _ => Ok(()),
        }
    }
}

impl PinDevice for SdramModel {
    fn name(&self) -> &str {
        "sdram"
    }

    fn tick(&mut self, pins: &PinState) -> Result<Option<Word>, ProtocolViolation> {
        let n = self.cycle;
        self.cycle += 1;
        self.step(n, pins)
    }

    fn as_sdram(&self) -> Option<&SdramModel> {
        Some(self)
    }
}
