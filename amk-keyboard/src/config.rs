//! Whole-keyboard settings snapshot
//!
//! A serializable capture of everything the user can configure: scalar
//! settings plus per-key APC/RT/DKS for one profile. Export reads the
//! caches; import replays through the `apply_*` methods, so unchanged
//! values produce no device traffic.

use serde::{Deserialize, Serialize};

use amk_transport::KeyPos;

use crate::dks::DksKey;
use crate::error::KeyboardError;
use crate::settings::{Pole, PollRate};
use crate::trigger::RtValue;
use crate::AmkKeyboard;

/// Per-key portion of a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyConfig {
    pub row: u8,
    pub col: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apc: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rt: Option<RtValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dks: Option<DksKey>,
}

/// Snapshot of one profile's configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyboardConfig {
    /// Product name of the device this snapshot was taken from
    pub name: String,
    pub vendor_id: u16,
    pub product_id: u16,
    pub profile: u8,
    pub pole: Pole,
    pub nkro: bool,
    pub poll_rate: PollRate,
    pub rt_sens: u8,
    pub top_sens: u8,
    pub btm_sens: u8,
    pub apc_sens: u8,
    pub noise_sens: u8,
    pub keys: Vec<KeyConfig>,
}

impl KeyboardConfig {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl AmkKeyboard {
    /// Capture one profile's configuration from the caches.
    pub fn export_config(&self, profile: u8) -> Result<KeyboardConfig, KeyboardError> {
        if profile >= self.settings().profile_count {
            return Err(KeyboardError::InvalidParameter(format!(
                "profile {profile} out of range"
            )));
        }
        let info = self.exchange().device_info();
        let settings = self.settings();

        let keys = self
            .keys()
            .to_vec()
            .into_iter()
            .map(|pos| KeyConfig {
                row: pos.row,
                col: pos.col,
                apc: self.apc(profile, pos),
                rt: self.rt(profile, pos),
                dks: self.dks(pos).filter(|d| d.is_valid()).cloned(),
            })
            .collect();

        Ok(KeyboardConfig {
            name: info.product_name.clone().unwrap_or_default(),
            vendor_id: info.vid,
            product_id: info.pid,
            profile,
            pole: settings.pole,
            nkro: settings.nkro,
            poll_rate: settings.poll_rate,
            rt_sens: settings.rt_sens,
            top_sens: settings.top_sens,
            btm_sens: settings.btm_sens,
            apc_sens: settings.apc_sens,
            noise_sens: settings.noise_sens,
            keys,
        })
    }

    /// Replay a snapshot through the `apply_*` methods.
    ///
    /// Rejects snapshots taken from a different device model. Values that
    /// already match the cache issue no frames.
    pub async fn import_config(&mut self, config: &KeyboardConfig) -> Result<(), KeyboardError> {
        let info = self.exchange().device_info();
        if config.vendor_id != info.vid || config.product_id != info.pid {
            return Err(KeyboardError::InvalidParameter(format!(
                "config is for {:04X}:{:04X}, device is {:04X}:{:04X}",
                config.vendor_id, config.product_id, info.vid, info.pid
            )));
        }

        self.apply_pole(config.pole).await?;
        self.apply_nkro(config.nkro).await?;
        self.apply_poll_rate(config.poll_rate).await?;
        self.apply_rt_sensitivity(config.rt_sens).await?;
        self.apply_top_sensitivity(config.top_sens).await?;
        self.apply_btm_sensitivity(config.btm_sens).await?;
        self.apply_apc_sensitivity(config.apc_sens).await?;
        self.apply_noise_sensitivity(config.noise_sens).await?;

        for key in &config.keys {
            let pos = KeyPos::new(key.row, key.col);
            if let Some(apc) = key.apc {
                self.apply_apc(config.profile, pos, apc).await?;
            }
            if let Some(rt) = key.rt {
                self.apply_rt(config.profile, pos, rt).await?;
            }
            if let Some(dks) = &key.dks {
                self.apply_dks(pos, dks).await?;
            }
        }
        Ok(())
    }
}
