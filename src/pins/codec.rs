//! Command Codec.
//!
//! Pure mapping between [`Command`] values and the physical control pins. The
//! truth table is written in asserted/not-asserted terms and inverted once, at
//! the boundary, to the active-low levels the device sees.

use super::command::Command;
use crate::common::error::ConfigError;
use crate::common::Word;

/// Address bit carrying the auto-precharge / precharge-all flag.
pub const A10: u16 = 1 << 10;

/// Physical pin levels for one clock cycle.
///
/// Control strobes hold the physical (active-low) level, so `cs_n == false`
/// selects the chip. `cke` and `dqm` are active high.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinState {
    /// Clock enable.
    pub cke: bool,
    /// Data mask; the controller never masks.
    pub dqm: bool,
    /// Chip select (active low).
    pub cs_n: bool,
    /// Row address strobe (active low).
    pub ras_n: bool,
    /// Column address strobe (active low).
    pub cas_n: bool,
    /// Write enable (active low).
    pub we_n: bool,
    /// Address bus.
    pub a: u16,
    /// Bank select bus.
    pub ba: u8,
    /// Data bus value driven by the controller.
    pub dq: Word,
    /// Controller output enable for the data bus.
    pub dq_oe: bool,
}

impl PinState {
    /// The pin pattern driven on idle cycles (a no-op with the bus released).
    pub fn idle() -> Self {
        encode(Command::Nop, 0, 0)
    }

    /// Returns a copy with write data driven on the data bus.
    pub fn with_data(mut self, data: Word) -> Self {
        self.dq = data;
        self.dq_oe = true;
        self
    }

    /// Returns `true` if the auto-precharge / all-banks flag is set.
    pub fn a10(&self) -> bool {
        self.a & A10 != 0
    }
}

impl Default for PinState {
    fn default() -> Self {
        Self::idle()
    }
}

/// Asserted levels of (cs, ras, cas, we) per command.
fn asserted(cmd: Command) -> (bool, bool, bool, bool) {
    match cmd {
        Command::Deselect | Command::Illegal => (false, false, false, false),
        Command::Nop => (true, false, false, false),
        Command::BurstStop => (true, false, false, true),
        Command::Read | Command::ReadAutoPrecharge => (true, false, true, false),
        Command::Write | Command::WriteAutoPrecharge => (true, false, true, true),
        Command::Activate => (true, true, false, false),
        Command::Precharge | Command::PrechargeAll => (true, true, false, true),
        Command::Refresh | Command::SelfRefresh => (true, true, true, false),
        Command::ModeRegisterSet => (true, true, true, true),
    }
}

/// Encodes a command and its payload onto the pins.
///
/// `addr` is the row for ACTIVATE, the column for READ/WRITE, and the mode
/// register value for MODE REGISTER SET; it is ignored otherwise. Bit 10 of
/// the address bus is owned by the codec for every command that defines it.
pub fn encode(cmd: Command, bank: u8, addr: u16) -> PinState {
    let (cs, ras, cas, we) = asserted(cmd);

    let (ba, a) = match cmd {
        Command::Activate => (bank, addr),
        Command::Read | Command::Write => (bank, addr & !A10),
        Command::ReadAutoPrecharge | Command::WriteAutoPrecharge => (bank, addr | A10),
        Command::Precharge => (bank, 0),
        Command::PrechargeAll => (0, A10),
        Command::ModeRegisterSet => (0, addr & !A10),
        _ => (0, 0),
    };

    PinState {
        cke: cmd != Command::SelfRefresh,
        dqm: false,
        cs_n: !cs,
        ras_n: !ras,
        cas_n: !cas,
        we_n: !we,
        a,
        ba,
        dq: 0,
        dq_oe: false,
    }
}

/// Decodes the control pins sampled in one cycle.
pub fn decode(pins: &PinState) -> Command {
    let cs = !pins.cs_n;
    let ras = !pins.ras_n;
    let cas = !pins.cas_n;
    let we = !pins.we_n;

    if !pins.cke {
        return if cs && ras && cas && !we {
            Command::SelfRefresh
        } else {
            Command::Illegal
        };
    }

    if !cs {
        return Command::Deselect;
    }

    match (ras, cas, we) {
        (false, false, false) => Command::Nop,
        (false, false, true) => Command::BurstStop,
        (false, true, false) if pins.a10() => Command::ReadAutoPrecharge,
        (false, true, false) => Command::Read,
        (false, true, true) if pins.a10() => Command::WriteAutoPrecharge,
        (false, true, true) => Command::Write,
        (true, false, false) => Command::Activate,
        (true, false, true) if pins.a10() => Command::PrechargeAll,
        (true, false, true) => Command::Precharge,
        (true, true, false) => Command::Refresh,
        (true, true, true) if pins.ba == 0 && !pins.a10() => Command::ModeRegisterSet,
        (true, true, true) => Command::Illegal,
    }
}

/// Operating mode programmed by MODE REGISTER SET.
///
/// Only the fields the controller uses are modelled: sequential bursts with a
/// programmed length for both reads and writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeRegister {
    /// Words per burst (1, 2, 4 or 8).
    pub burst_length: u32,
    /// CAS latency in cycles (1, 2 or 3).
    pub cas_latency: u32,
}

impl ModeRegister {
    /// Creates a mode register value, rejecting unsupported settings.
    pub fn new(burst_length: u32, cas_latency: u32) -> Result<Self, ConfigError> {
        if !matches!(burst_length, 1 | 2 | 4 | 8) {
            return Err(ConfigError::invalid(
                "burst_length",
                format!("{} is not one of 1, 2, 4, 8", burst_length),
            ));
        }
        if !(1..=3).contains(&cas_latency) {
            return Err(ConfigError::invalid(
                "cas_latency",
                format!("{} is outside 1..=3", cas_latency),
            ));
        }
        Ok(Self {
            burst_length,
            cas_latency,
        })
    }

    /// Packs the register into its address-bus representation.
    ///
    /// A2:A0 burst length, A3 burst type (sequential), A6:A4 CAS latency,
    /// A9 write burst mode (programmed length).
    pub fn encode(&self) -> u16 {
        let bl_code = self.burst_length.trailing_zeros() as u16;
        let cl_code = self.cas_latency as u16;
        bl_code | (cl_code << 4)
    }

    /// Unpacks an address-bus value, rejecting modes the controller never sets.
    pub fn decode(value: u16) -> Result<Self, String> {
        let bl_code = value & 0x7;
        let interleaved = value & (1 << 3) != 0;
        let cl_code = (value >> 4) & 0x7;
        let op_mode = (value >> 7) & 0x3;
        let single_write = value & (1 << 9) != 0;

        if bl_code > 3 {
            return Err(format!("burst length code {} unsupported", bl_code));
        }
        if interleaved {
            return Err("interleaved burst type unsupported".to_string());
        }
        if !(1..=3).contains(&cl_code) {
            return Err(format!("CAS latency code {} unsupported", cl_code));
        }
        if op_mode != 0 {
            return Err(format!("operating mode {} reserved", op_mode));
        }
        if single_write {
            return Err("single-location write mode unsupported".to_string());
        }

        Ok(Self {
            burst_length: 1 << bl_code,
            cas_latency: u32::from(cl_code),
        })
    }
}
