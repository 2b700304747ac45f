//! Actuation point (APC) and rapid trigger (RT) value encoding
//!
//! Host-side values are in device distance units (tenths of a millimeter).
//! The wire encoding depends on the negotiated protocol revision: newer
//! firmware reports finer distances (scaled APC, wider RT fields).

use serde::{Deserialize, Serialize};

/// APC/RT wire encoding revision, derived from GET_VERSION.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApcRtVersion {
    /// Unscaled APC, 6-bit RT distance fields
    #[default]
    V0,
    /// APC scaled ×2, 7-bit RT distance fields
    V1,
}

impl ApcRtVersion {
    /// Protocol revisions 3 and later use the version-1 encoding.
    pub fn from_protocol(version: u8) -> Self {
        if version >= 3 {
            Self::V1
        } else {
            Self::V0
        }
    }

    /// Wire units per host unit for APC values.
    pub const fn apc_scale(self) -> u16 {
        match self {
            Self::V0 => 1,
            Self::V1 => 2,
        }
    }

    /// Width of each RT distance field in bits.
    pub const fn rt_field_bits(self) -> u32 {
        match self {
            Self::V0 => 6,
            Self::V1 => 7,
        }
    }

    /// Largest representable RT distance.
    pub const fn rt_field_max(self) -> u16 {
        (1u16 << self.rt_field_bits()) - 1
    }

    /// Convert a host APC value to its wire representation.
    pub fn apc_to_wire(self, value: u16) -> u16 {
        value.saturating_mul(self.apc_scale())
    }

    /// Convert a wire APC value back to host units.
    pub fn apc_from_wire(self, raw: u16) -> u16 {
        raw / self.apc_scale()
    }
}

/// Rapid trigger setting for one key.
///
/// `press`/`release` are direction-change distances; zero disables that
/// direction. `continuous` keeps RT active through the whole travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RtValue {
    pub continuous: bool,
    pub press: u16,
    pub release: u16,
}

impl RtValue {
    pub const OFF: RtValue = RtValue {
        continuous: false,
        press: 0,
        release: 0,
    };

    pub fn is_off(&self) -> bool {
        self.press == 0 && self.release == 0
    }

    /// Pack into the 16-bit wire word: bit 15 = continuous, press
    /// distance in the high field, release distance in the low field.
    /// Distances are clamped to the version's field width.
    pub fn pack(&self, version: ApcRtVersion) -> u16 {
        let bits = version.rt_field_bits();
        let max = version.rt_field_max();
        let mut word = if self.continuous { 0x8000 } else { 0 };
        word |= self.press.min(max) << bits;
        word |= self.release.min(max);
        word
    }

    /// Exact inverse of [`pack`](Self::pack) for in-range values.
    pub fn unpack(raw: u16, version: ApcRtVersion) -> Self {
        let bits = version.rt_field_bits();
        let max = version.rt_field_max();
        Self {
            continuous: raw & 0x8000 != 0,
            press: (raw >> bits) & max,
            release: raw & max,
        }
    }
}
