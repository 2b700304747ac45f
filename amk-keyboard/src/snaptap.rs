//! Snaptap (two-key interaction) configuration

use amk_transport::command::SnaptapResponse;
use amk_transport::KeyPos;

/// Conflict resolution mode for a snaptap pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum SnaptapMode {
    #[default]
    None = 0,
    /// Deeper pressed key wins
    Depth = 1,
    /// Most recently triggered key wins
    Trigger = 2,
    /// First key always wins
    First = 3,
    /// Second key always wins
    Second = 4,
    /// Both keys report
    Both = 5,
}

impl SnaptapMode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Depth),
            2 => Some(Self::Trigger),
            3 => Some(Self::First),
            4 => Some(Self::Second),
            5 => Some(Self::Both),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Depth => "depth",
            Self::Trigger => "trigger",
            Self::First => "first",
            Self::Second => "second",
            Self::Both => "both",
        }
    }
}

/// One snaptap pair record, addressable by its device-side index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SnaptapKey {
    pub index: u8,
    pub first: KeyPos,
    pub second: KeyPos,
    pub mode: SnaptapMode,
}

impl SnaptapKey {
    /// A record is active when it resolves conflicts at all.
    pub fn is_active(&self) -> bool {
        self.mode != SnaptapMode::None
    }

    pub fn from_wire(resp: &SnaptapResponse) -> Option<Self> {
        Some(Self {
            index: resp.index,
            first: KeyPos::new(resp.first_row, resp.first_col),
            second: KeyPos::new(resp.second_row, resp.second_col),
            mode: SnaptapMode::from_u8(resp.mode)?,
        })
    }
}
