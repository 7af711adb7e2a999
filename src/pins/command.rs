//! SDRAM Command Set.
//!
//! This module defines every command a single-rank SDR SDRAM understands, as
//! seen on the control pins during one clock cycle.

/// A command sampled on the control pins in one cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    /// Chip select deasserted; the device ignores the other pins.
    Deselect,
    /// No operation.
    Nop,
    /// Terminate the current burst.
    BurstStop,
    /// Column read, row stays open.
    Read,
    /// Column read, row is closed after the burst.
    ReadAutoPrecharge,
    /// Column write, row stays open.
    Write,
    /// Column write, row is closed after the burst.
    WriteAutoPrecharge,
    /// Open a row in a bank.
    Activate,
    /// Close the open row of one bank.
    Precharge,
    /// Close the open rows of all banks.
    PrechargeAll,
    /// Auto refresh.
    Refresh,
    /// Self refresh entry (refresh pattern with clock enable low).
    SelfRefresh,
    /// Program the mode register.
    ModeRegisterSet,
    /// A pin pattern with no legal meaning.
    Illegal,
}

impl Command {
    /// Returns `true` for commands that do not change device state.
    pub fn is_idle(self) -> bool {
        matches!(self, Command::Deselect | Command::Nop)
    }

    /// Returns `true` for read commands.
    pub fn is_read(self) -> bool {
        matches!(self, Command::Read | Command::ReadAutoPrecharge)
    }

    /// Returns `true` if the command closes its row when the burst ends.
    pub fn auto_precharge(self) -> bool {
        matches!(
            self,
            Command::ReadAutoPrecharge | Command::WriteAutoPrecharge
        )
    }

    /// Short datasheet mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Command::Deselect => "DESL",
            Command::Nop => "NOP",
            Command::BurstStop => "BST",
            Command::Read => "READ",
            Command::ReadAutoPrecharge => "READA",
            Command::Write => "WRIT",
            Command::WriteAutoPrecharge => "WRITA",
            Command::Activate => "ACT",
            Command::Precharge => "PRE",
            Command::PrechargeAll => "PALL",
            Command::Refresh => "REF",
            Command::SelfRefresh => "SELF",
            Command::ModeRegisterSet => "MRS",
            Command::Illegal => "ILLEGAL",
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// A command together with the bank and address-bus payload it carries.
///
/// This is what the controller's command sources hand to the pin layer each
/// cycle; [`BusCommand::encode`] turns it into pin levels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusCommand {
    pub command: Command,
    pub bank: u8,
    pub addr: u16,
}

impl BusCommand {
    /// A command without payload.
    pub fn new(command: Command) -> Self {
        Self {
            command,
            bank: 0,
            addr: 0,
        }
    }

    /// A no-op cycle.
    pub fn nop() -> Self {
        Self::new(Command::Nop)
    }

    /// A command addressed to `bank` with `addr` on the address bus.
    pub fn with_payload(command: Command, bank: u8, addr: u16) -> Self {
        Self {
            command,
            bank,
            addr,
        }
    }

    /// Encodes the command onto the pins.
    pub fn encode(&self) -> super::codec::PinState {
        super::codec::encode(self.command, self.bank, self.addr)
    }
}
