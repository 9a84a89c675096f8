/// One of the 8 standardized 802.11a/g OFDM data rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rate {
    R6,
    R9,
    R12,
    R18,
    R24,
    R36,
    R48,
    R54,
}

impl Rate {
    pub const ALL: [Rate; 8] = [
        Rate::R6,
        Rate::R9,
        Rate::R12,
        Rate::R18,
        Rate::R24,
        Rate::R36,
        Rate::R48,
        Rate::R54,
    ];

    /// Maps a 4-bit SIGNAL field rate code to a `Rate`, or `None` for one
    /// of the 8 undefined nibble values.
    pub fn from_signal_code(code: u8) -> Option<Rate> {
        RATE_TABLE.iter().find(|e| e.signal_code == code).map(|e| e.rate)
    }

    pub fn entry(self) -> &'static RateEntry {
        &RATE_TABLE[self as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modulation {
    Bpsk,
    Qpsk,
    Qam16,
    Qam64,
}

/// Numerator/denominator of the convolutional code rate (1/2, 2/3, 3/4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeRate {
    pub numerator: u32,
    pub denominator: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateEntry {
    pub rate: Rate,
    pub mbit: u32,
    pub modulation: Modulation,
    pub code_rate: CodeRate,
    /// Data bits per OFDM symbol.
    pub ndbps: u32,
    /// Coded bits per OFDM symbol.
    pub ncbps: u32,
    /// Bits per subcarrier (modulation depth).
    pub nbpsc: u32,
    /// 4-bit value placed in the SIGNAL field's rate nibble.
    pub signal_code: u8,
}

/// Immutable process-wide rate table, indexed by `Rate as usize`.
pub const RATE_TABLE: [RateEntry; 8] = [
    RateEntry {
        rate: Rate::R6,
        mbit: 6,
        modulation: Modulation::Bpsk,
        code_rate: CodeRate { numerator: 1, denominator: 2 },
        ndbps: 24,
        ncbps: 48,
        nbpsc: 1,
        signal_code: 0b1101,
    },
    RateEntry {
        rate: Rate::R9,
        mbit: 9,
        modulation: Modulation::Bpsk,
        code_rate: CodeRate { numerator: 3, denominator: 4 },
        ndbps: 36,
        ncbps: 48,
        nbpsc: 1,
        signal_code: 0b1111,
    },
    RateEntry {
        rate: Rate::R12,
        mbit: 12,
        modulation: Modulation::Qpsk,
        code_rate: CodeRate { numerator: 1, denominator: 2 },
        ndbps: 48,
        ncbps: 96,
        nbpsc: 2,
        signal_code: 0b0101,
    },
    RateEntry {
        rate: Rate::R18,
        mbit: 18,
        modulation: Modulation::Qpsk,
        code_rate: CodeRate { numerator: 3, denominator: 4 },
        ndbps: 72,
        ncbps: 96,
        nbpsc: 2,
        signal_code: 0b0111,
    },
    RateEntry {
        rate: Rate::R24,
        mbit: 24,
        modulation: Modulation::Qam16,
        code_rate: CodeRate { numerator: 1, denominator: 2 },
        ndbps: 96,
        ncbps: 192,
        nbpsc: 4,
        signal_code: 0b1001,
    },
    RateEntry {
        rate: Rate::R36,
        mbit: 36,
        modulation: Modulation::Qam16,
        code_rate: CodeRate { numerator: 3, denominator: 4 },
        ndbps: 144,
        ncbps: 192,
        nbpsc: 4,
        signal_code: 0b1011,
    },
    RateEntry {
        rate: Rate::R48,
        mbit: 48,
        modulation: Modulation::Qam64,
        code_rate: CodeRate { numerator: 2, denominator: 3 },
        ndbps: 192,
        ncbps: 288,
        nbpsc: 6,
        signal_code: 0b0001,
    },
    RateEntry {
        rate: Rate::R54,
        mbit: 54,
        modulation: Modulation::Qam64,
        code_rate: CodeRate { numerator: 3, denominator: 4 },
        ndbps: 216,
        ncbps: 288,
        nbpsc: 6,
        signal_code: 0b0011,
    },
];
