//! Device Address Types.
//!
//! A global word address names one data word in the SDRAM device. The
//! controller never keeps row state between bursts, so every burst starts by
//! decomposing its global address into the bank, row, and column fields the
//! command pins need. The field layout, from the most significant bit down,
//! is `bank | row | column`.

/// Global word address into the SDRAM device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlobalAddr(u32);

impl GlobalAddr {
    /// Creates a new global address.
    pub fn new(addr: u32) -> Self {
        Self(addr)
    }

    /// Returns the raw address value.
    pub fn val(&self) -> u32 {
        self.0
    }

    /// Returns the address `words` further on.
    pub fn offset(&self, words: u32) -> Self {
        Self(self.0.wrapping_add(words))
    }
}

impl std::fmt::Display for GlobalAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#08x}", self.0)
    }
}

/// A global address split into the fields driven on the bank/address pins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DeviceAddr {
    /// Bank select.
    pub bank: u8,
    /// Row, driven on the address bus with ACTIVATE.
    pub row: u16,
    /// Column, driven on the address bus with READ/WRITE.
    pub column: u16,
}

/// Fixed bit-field widths derived from the device geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressLayout {
    /// Number of bank-select bits.
    pub bank_bits: u32,
    /// Number of row address bits.
    pub row_bits: u32,
    /// Number of column address bits.
    pub col_bits: u32,
}

impl AddressLayout {
    /// Creates a layout from the three field widths.
    pub fn new(bank_bits: u32, row_bits: u32, col_bits: u32) -> Self {
        Self {
            bank_bits,
            row_bits,
            col_bits,
        }
    }

    /// Total number of address bits.
    pub fn total_bits(&self) -> u32 {
        self.bank_bits + self.row_bits + self.col_bits
    }

    /// Number of addressable words in the device.
    pub fn capacity_words(&self) -> u64 {
        1u64 << self.total_bits()
    }

    /// Number of banks in the device.
    pub fn banks(&self) -> usize {
        1 << self.bank_bits
    }

    /// Returns `true` if `addr` lies inside the device.
    pub fn contains(&self, addr: GlobalAddr) -> bool {
        u64::from(addr.val()) < self.capacity_words()
    }

    /// Splits a global address into bank, row and column.
    ///
    /// Bits above [`AddressLayout::total_bits`] are ignored.
    pub fn decompose(&self, addr: GlobalAddr) -> DeviceAddr {
        let raw = addr.val();
        let column = raw & mask(self.col_bits);
        let row = (raw >> self.col_bits) & mask(self.row_bits);
        let bank = (raw >> (self.col_bits + self.row_bits)) & mask(self.bank_bits);
        DeviceAddr {
            bank: bank as u8,
            row: row as u16,
            column: column as u16,
        }
    }

    /// Reassembles bank, row and column into a global address.
    pub fn compose(&self, dev: DeviceAddr) -> GlobalAddr {
        let column = u32::from(dev.column) & mask(self.col_bits);
        let row = u32::from(dev.row) & mask(self.row_bits);
        let bank = u32::from(dev.bank) & mask(self.bank_bits);
        GlobalAddr::new(
            (bank << (self.col_bits + self.row_bits)) | (row << self.col_bits) | column,
        )
    }
}

fn mask(bits: u32) -> u32 {
    if bits >= 32 {
        u32::MAX
    } else {
        (1u32 << bits) - 1
    }
}
