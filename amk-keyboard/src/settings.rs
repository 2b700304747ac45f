//! Scalar device settings and their shadow cache

use serde::{Deserialize, Serialize};

use crate::trigger::ApcRtVersion;

/// Magnetic pole orientation of the switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Pole {
    #[default]
    South = 0,
    North = 1,
}

impl Pole {
    pub fn from_bit(bit: bool) -> Self {
        if bit {
            Self::North
        } else {
            Self::South
        }
    }
}

/// USB polling rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum PollRate {
    #[default]
    Hz1000 = 0,
    Hz2000 = 1,
    Hz4000 = 2,
    Hz8000 = 3,
}

impl PollRate {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Hz1000),
            1 => Some(Self::Hz2000),
            2 => Some(Self::Hz4000),
            3 => Some(Self::Hz8000),
            _ => None,
        }
    }

    pub fn to_hz(self) -> u16 {
        match self {
            Self::Hz1000 => 1000,
            Self::Hz2000 => 2000,
            Self::Hz4000 => 4000,
            Self::Hz8000 => 8000,
        }
    }
}

/// The composite MS_CONFIG byte.
///
/// Layout: bit 0 pole, bits 1-2 active profile, bit 3 DKS disable,
/// bits 4-6 profile count (device-reported, ignored on writes). Mutating
/// any one logical field always re-sends the full composite byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MsConfig {
    pub pole: Pole,
    pub profile: u8,
    pub dks_disable: bool,
    pub profile_count: u8,
}

impl MsConfig {
    pub fn parse(byte: u8) -> Self {
        Self {
            pole: Pole::from_bit(byte & 0x01 != 0),
            profile: (byte >> 1) & 0x03,
            dks_disable: byte & 0x08 != 0,
            profile_count: (byte >> 4) & 0x07,
        }
    }

    /// Pack the writable fields; the profile-count bits stay zero.
    pub fn pack(&self) -> u8 {
        (self.pole as u8) | (self.profile & 0x03) << 1 | u8::from(self.dks_disable) << 3
    }
}

/// Shadow cache of every scalar setting, mirrored from the last
/// successful read or confirmed write.
#[derive(Debug, Clone, Default)]
pub struct DeviceSettings {
    /// AMK protocol revision from GET_VERSION
    pub protocol_version: u8,
    /// APC/RT wire encoding derived from the protocol revision
    pub apcrt: ApcRtVersion,
    pub poll_rate: PollRate,
    /// Debounce when pressing, ms
    pub down_debounce: u8,
    /// Debounce when releasing, ms
    pub up_debounce: u8,
    pub nkro: bool,
    pub pole: Pole,
    /// Active profile selected on the device
    pub profile: u8,
    /// Number of profiles the device supports (>= 1)
    pub profile_count: u8,
    pub dks_disable: bool,
    pub rt_sens: u8,
    pub top_sens: u8,
    pub btm_sens: u8,
    pub apc_sens: u8,
    pub noise_sens: u8,
}

impl DeviceSettings {
    /// Recompose the MS_CONFIG byte from the cached fields.
    pub fn ms_config(&self) -> MsConfig {
        MsConfig {
            pole: self.pole,
            profile: self.profile,
            dks_disable: self.dks_disable,
            profile_count: self.profile_count,
        }
    }

    pub fn apply_ms_config(&mut self, config: MsConfig) {
        self.pole = config.pole;
        self.profile = config.profile;
        self.dks_disable = config.dks_disable;
        self.profile_count = config.profile_count.max(1);
    }
}
