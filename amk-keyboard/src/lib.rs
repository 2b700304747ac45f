//! High-level device model for AMK protocol keyboards
//!
//! `AmkKeyboard` sits on top of the serialized exchange point from
//! `amk-transport` and keeps a local shadow of everything the device
//! knows: scalar settings, per-key actuation/rapid-trigger/DKS tables,
//! the RGB model, snaptap pairs and the remote file directory.
//!
//! Cache discipline: `reload_*` overwrites the cache from the device
//! unconditionally; `apply_*` is a no-op when the target value already
//! matches the cache, otherwise it sends the frame first and commits the
//! cache only after the device acknowledged — a failed write never leaves
//! the host believing a value the device dropped.

pub mod animation;
pub mod config;
pub mod dks;
pub mod error;
pub mod filesystem;
pub mod rgb;
pub mod settings;
pub mod snaptap;
pub mod trigger;

pub use config::KeyboardConfig;
pub use dks::DksKey;
pub use error::KeyboardError;
pub use filesystem::{CancelToken, FileEntry, FileSystemInfo};
pub use rgb::{Indicator, IndicatorLed, RgbLed, RgbMatrixState, RgbStrip, StripMode};
pub use settings::{DeviceSettings, MsConfig, Pole, PollRate};
pub use snaptap::{SnaptapKey, SnaptapMode};
pub use trigger::{ApcRtVersion, RtValue};

// Re-exported so consumers can drive transfers and build transports
// without naming the transport crate.
pub use amk_transport::{DateTime, ExchangeTransport, KeyPos, Transport, TransportError};

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use amk_transport::command::{
    DksResponse, GetApc, GetDks, GetIndicatorLed, GetMatrixInfo, GetMatrixLed, GetMatrixRowInfo,
    GetRt, GetSnaptap, GetStripLed, GetStripMode, GetStripParam, GetVersion, IndicatorResponse,
    LedResponse, MatrixInfoResponse, MatrixRowResponse, SetApc, SetDateTime, SetDks,
    SetIndicatorLed, SetMatrixLed, SetRt, SetSnaptap, SetStripLed, SetStripMode,
    SnaptapResponse, StripModeResponse, StripParamResponse, VersionResponse, WordResponse,
};
use amk_transport::protocol::cmd;

/// Maximum accepted debounce time in milliseconds
pub const MAX_DEBOUNCE_MS: u8 = 10;

/// High-level keyboard interface with shadow-state caches.
pub struct AmkKeyboard {
    exchange: Arc<ExchangeTransport>,
    /// Physical key set, fixed at connect time
    keys: Vec<KeyPos>,
    settings: DeviceSettings,
    /// APC values per profile, host units
    apc: Vec<HashMap<KeyPos, u16>>,
    /// RT settings per profile
    rt: Vec<HashMap<KeyPos, RtValue>>,
    dks: HashMap<KeyPos, DksKey>,
    strips: Vec<RgbStrip>,
    matrix: RgbMatrixState,
    indicators: HashMap<Indicator, IndicatorLed>,
    snaptaps: Vec<SnaptapKey>,
    pub(crate) fs_info: Option<FileSystemInfo>,
    pub(crate) files: Vec<FileEntry>,
}

impl AmkKeyboard {
    /// Create an interface for a connected device.
    ///
    /// `keys` is the full physical key set; it never changes afterwards.
    pub fn new(exchange: Arc<ExchangeTransport>, keys: Vec<KeyPos>) -> Self {
        Self {
            exchange,
            keys,
            settings: DeviceSettings::default(),
            apc: vec![HashMap::new()],
            rt: vec![HashMap::new()],
            dks: HashMap::new(),
            strips: Vec::new(),
            matrix: RgbMatrixState::default(),
            indicators: HashMap::new(),
            snaptaps: Vec::new(),
            fs_info: None,
            files: Vec::new(),
        }
    }

    pub fn exchange(&self) -> &Arc<ExchangeTransport> {
        &self.exchange
    }

    pub fn keys(&self) -> &[KeyPos] {
        &self.keys
    }

    pub fn settings(&self) -> &DeviceSettings {
        &self.settings
    }

    // === Connect-time load ===

    /// Populate every cache from the device. Called once after connect.
    ///
    /// Subsystems the device rejects outright (no strips, no display
    /// storage, ...) are left empty instead of failing the whole load.
    pub async fn load(&mut self) -> Result<(), KeyboardError> {
        self.reload_version().await?;
        self.reload_ms_config().await?;
        self.reload_poll_rate().await?;
        self.reload_debounce().await?;
        self.reload_nkro().await?;
        optional(self.reload_sensitivities().await, "sensitivities")?;
        for profile in 0..self.settings.profile_count {
            self.reload_apc(profile).await?;
            self.reload_rt(profile).await?;
        }
        self.reload_dks().await?;
        optional(self.reload_rgb_strips().await, "rgb strips")?;
        optional(self.reload_rgb_matrix().await, "rgb matrix")?;
        self.reload_indicators().await?;
        optional(self.reload_snaptap().await, "snaptap")?;
        optional(self.reload_file_list().await.map(|_| ()), "file system")?;
        debug!(
            "loaded device state: protocol v{}, {} profiles, {} keys",
            self.settings.protocol_version,
            self.settings.profile_count,
            self.keys.len()
        );
        Ok(())
    }

    // === Protocol version ===

    pub async fn reload_version(&mut self) -> Result<u8, KeyboardError> {
        let resp: VersionResponse = self.exchange.query(&GetVersion).await?;
        self.settings.protocol_version = resp.version;
        self.settings.apcrt = ApcRtVersion::from_protocol(resp.version);
        Ok(resp.version)
    }

    // === Composite MS_CONFIG (pole + profile + DKS disable) ===

    pub async fn reload_ms_config(&mut self) -> Result<MsConfig, KeyboardError> {
        let byte = self.exchange.query_u8(cmd::GET_MS_CONFIG).await?;
        let config = MsConfig::parse(byte);
        self.settings.apply_ms_config(config);
        self.ensure_profiles();
        Ok(config)
    }

    /// Send the full composite byte recomposed from the cache with one
    /// field replaced, committing on acknowledgment.
    async fn apply_ms_config(&mut self, config: MsConfig) -> Result<(), KeyboardError> {
        if self.settings.ms_config().pack() == config.pack() {
            return Ok(());
        }
        self.exchange.set_u8(cmd::SET_MS_CONFIG, config.pack()).await?;
        self.settings.apply_ms_config(MsConfig {
            profile_count: self.settings.profile_count,
            ..config
        });
        self.ensure_profiles();
        Ok(())
    }

    pub async fn apply_pole(&mut self, pole: Pole) -> Result<(), KeyboardError> {
        let config = MsConfig {
            pole,
            ..self.settings.ms_config()
        };
        self.apply_ms_config(config).await
    }

    pub async fn apply_profile(&mut self, profile: u8) -> Result<(), KeyboardError> {
        if profile >= self.settings.profile_count {
            return Err(KeyboardError::InvalidParameter(format!(
                "profile {profile} out of range (device has {})",
                self.settings.profile_count
            )));
        }
        let config = MsConfig {
            profile,
            ..self.settings.ms_config()
        };
        self.apply_ms_config(config).await
    }

    pub async fn apply_dks_disable(&mut self, disable: bool) -> Result<(), KeyboardError> {
        let config = MsConfig {
            dks_disable: disable,
            ..self.settings.ms_config()
        };
        self.apply_ms_config(config).await
    }

    fn ensure_profiles(&mut self) {
        let count = self.settings.profile_count.max(1) as usize;
        self.apc.resize_with(count, HashMap::new);
        self.rt.resize_with(count, HashMap::new);
    }

    fn check_profile(&self, profile: u8) -> Result<usize, KeyboardError> {
        let index = profile as usize;
        if index >= self.apc.len() {
            return Err(KeyboardError::InvalidParameter(format!(
                "profile {profile} out of range (device has {})",
                self.apc.len()
            )));
        }
        Ok(index)
    }

    // === Scalar settings ===

    pub async fn reload_poll_rate(&mut self) -> Result<PollRate, KeyboardError> {
        let raw = self.exchange.query_u8(cmd::GET_POLL_RATE).await?;
        let rate = PollRate::from_u8(raw).ok_or_else(|| {
            KeyboardError::InvalidParameter(format!("unknown poll rate value {raw}"))
        })?;
        self.settings.poll_rate = rate;
        Ok(rate)
    }

    pub async fn apply_poll_rate(&mut self, rate: PollRate) -> Result<(), KeyboardError> {
        if self.settings.poll_rate == rate {
            return Ok(());
        }
        self.exchange.set_u8(cmd::SET_POLL_RATE, rate as u8).await?;
        self.settings.poll_rate = rate;
        Ok(())
    }

    pub async fn reload_debounce(&mut self) -> Result<(u8, u8), KeyboardError> {
        let down = self.exchange.query_u8(cmd::GET_DOWN_DEBOUNCE).await?;
        let up = self.exchange.query_u8(cmd::GET_UP_DEBOUNCE).await?;
        self.settings.down_debounce = down;
        self.settings.up_debounce = up;
        Ok((down, up))
    }

    pub async fn apply_debounce(&mut self, value: u8, down: bool) -> Result<(), KeyboardError> {
        if value > MAX_DEBOUNCE_MS {
            return Err(KeyboardError::InvalidParameter(format!(
                "debounce {value}ms out of range (max {MAX_DEBOUNCE_MS})"
            )));
        }
        let (cached, opcode) = if down {
            (self.settings.down_debounce, cmd::SET_DOWN_DEBOUNCE)
        } else {
            (self.settings.up_debounce, cmd::SET_UP_DEBOUNCE)
        };
        if cached == value {
            return Ok(());
        }
        self.exchange.set_u8(opcode, value).await?;
        if down {
            self.settings.down_debounce = value;
        } else {
            self.settings.up_debounce = value;
        }
        Ok(())
    }

    pub async fn reload_nkro(&mut self) -> Result<bool, KeyboardError> {
        let raw = self.exchange.query_u8(cmd::GET_NKRO).await?;
        self.settings.nkro = raw != 0;
        Ok(self.settings.nkro)
    }

    pub async fn apply_nkro(&mut self, nkro: bool) -> Result<(), KeyboardError> {
        if self.settings.nkro == nkro {
            return Ok(());
        }
        self.exchange.set_u8(cmd::SET_NKRO, u8::from(nkro)).await?;
        self.settings.nkro = nkro;
        Ok(())
    }

    pub async fn reload_sensitivities(&mut self) -> Result<(), KeyboardError> {
        self.settings.rt_sens = self.exchange.query_u8(cmd::GET_RT_SENS).await?;
        self.settings.top_sens = self.exchange.query_u8(cmd::GET_TOP_SENS).await?;
        self.settings.btm_sens = self.exchange.query_u8(cmd::GET_BTM_SENS).await?;
        self.settings.apc_sens = self.exchange.query_u8(cmd::GET_APC_SENS).await?;
        self.settings.noise_sens = self.exchange.query_u8(cmd::GET_NOISE_SENS).await?;
        Ok(())
    }

    async fn apply_sensitivity(
        &mut self,
        opcode: u8,
        cached: u8,
        value: u8,
    ) -> Result<bool, KeyboardError> {
        if cached == value {
            return Ok(false);
        }
        self.exchange.set_u8(opcode, value).await?;
        Ok(true)
    }

    pub async fn apply_rt_sensitivity(&mut self, value: u8) -> Result<(), KeyboardError> {
        if self
            .apply_sensitivity(cmd::SET_RT_SENS, self.settings.rt_sens, value)
            .await?
        {
            self.settings.rt_sens = value;
        }
        Ok(())
    }

    pub async fn apply_top_sensitivity(&mut self, value: u8) -> Result<(), KeyboardError> {
        if self
            .apply_sensitivity(cmd::SET_TOP_SENS, self.settings.top_sens, value)
            .await?
        {
            self.settings.top_sens = value;
        }
        Ok(())
    }

    pub async fn apply_btm_sensitivity(&mut self, value: u8) -> Result<(), KeyboardError> {
        if self
            .apply_sensitivity(cmd::SET_BTM_SENS, self.settings.btm_sens, value)
            .await?
        {
            self.settings.btm_sens = value;
        }
        Ok(())
    }

    pub async fn apply_apc_sensitivity(&mut self, value: u8) -> Result<(), KeyboardError> {
        if self
            .apply_sensitivity(cmd::SET_APC_SENS, self.settings.apc_sens, value)
            .await?
        {
            self.settings.apc_sens = value;
        }
        Ok(())
    }

    pub async fn apply_noise_sensitivity(&mut self, value: u8) -> Result<(), KeyboardError> {
        if self
            .apply_sensitivity(cmd::SET_NOISE_SENS, self.settings.noise_sens, value)
            .await?
        {
            self.settings.noise_sens = value;
        }
        Ok(())
    }

    // === APC (actuation point) ===

    pub fn apc(&self, profile: u8, pos: KeyPos) -> Option<u16> {
        self.apc.get(profile as usize)?.get(&pos).copied()
    }

    /// Read every key's actuation point for one profile into the cache.
    pub async fn reload_apc(&mut self, profile: u8) -> Result<(), KeyboardError> {
        let index = self.check_profile(profile)?;
        let version = self.settings.apcrt;
        let mut table = HashMap::with_capacity(self.keys.len());
        for &pos in &self.keys {
            let resp: WordResponse = self
                .exchange
                .query(&GetApc {
                    row: pos.row,
                    col: pos.col,
                    profile,
                })
                .await?;
            table.insert(pos, version.apc_from_wire(resp.raw));
        }
        self.apc[index] = table;
        Ok(())
    }

    /// Set one key's actuation point (host units). Skips the exchange
    /// entirely when the cache already holds this value.
    pub async fn apply_apc(
        &mut self,
        profile: u8,
        pos: KeyPos,
        value: u16,
    ) -> Result<(), KeyboardError> {
        let index = self.check_profile(profile)?;
        if self.apc[index].get(&pos) == Some(&value) {
            return Ok(());
        }
        let raw = self.settings.apcrt.apc_to_wire(value);
        self.exchange
            .execute(&SetApc {
                row: pos.row,
                col: pos.col,
                profile,
                raw,
            })
            .await?;
        self.apc[index].insert(pos, value);
        Ok(())
    }

    // === RT (rapid trigger) ===

    pub fn rt(&self, profile: u8, pos: KeyPos) -> Option<RtValue> {
        self.rt.get(profile as usize)?.get(&pos).copied()
    }

    pub async fn reload_rt(&mut self, profile: u8) -> Result<(), KeyboardError> {
        let index = self.check_profile(profile)?;
        let version = self.settings.apcrt;
        let mut table = HashMap::with_capacity(self.keys.len());
        for &pos in &self.keys {
            let resp: WordResponse = self
                .exchange
                .query(&GetRt {
                    row: pos.row,
                    col: pos.col,
                    profile,
                })
                .await?;
            table.insert(pos, RtValue::unpack(resp.raw, version));
        }
        self.rt[index] = table;
        Ok(())
    }

    pub async fn apply_rt(
        &mut self,
        profile: u8,
        pos: KeyPos,
        value: RtValue,
    ) -> Result<(), KeyboardError> {
        let index = self.check_profile(profile)?;
        if self.rt[index].get(&pos) == Some(&value) {
            return Ok(());
        }
        let raw = value.pack(self.settings.apcrt);
        self.exchange
            .execute(&SetRt {
                row: pos.row,
                col: pos.col,
                profile,
                raw,
            })
            .await?;
        self.rt[index].insert(pos, value);
        Ok(())
    }

    // === DKS ===

    pub fn dks(&self, pos: KeyPos) -> Option<&DksKey> {
        self.dks.get(&pos)
    }

    pub async fn reload_dks(&mut self) -> Result<(), KeyboardError> {
        let mut table = HashMap::with_capacity(self.keys.len());
        for &pos in &self.keys {
            let resp: DksResponse = self
                .exchange
                .query(&GetDks {
                    row: pos.row,
                    col: pos.col,
                })
                .await?;
            table.insert(pos, DksKey::parse(&resp.table));
        }
        self.dks = table;
        Ok(())
    }

    /// Write one key's DKS table. Skipped entirely when the cached table
    /// is structurally identical (e.g. re-imported config).
    pub async fn apply_dks(&mut self, pos: KeyPos, table: &DksKey) -> Result<(), KeyboardError> {
        if let Some(cached) = self.dks.get(&pos) {
            if cached.is_same(table) && !cached.is_dirty() {
                return Ok(());
            }
        }
        self.exchange
            .execute(&SetDks {
                row: pos.row,
                col: pos.col,
                table: table.pack(),
            })
            .await?;
        let mut committed = table.clone();
        committed.mark_clean();
        self.dks.insert(pos, committed);
        Ok(())
    }

    // === RGB strips ===

    pub fn strips(&self) -> &[RgbStrip] {
        &self.strips
    }

    /// Discover strips: count, then per-strip parameters and mode.
    /// Per-LED state is fetched lazily via [`reload_strip_leds`].
    ///
    /// [`reload_strip_leds`]: Self::reload_strip_leds
    pub async fn reload_rgb_strips(&mut self) -> Result<(), KeyboardError> {
        let count = self.exchange.query_u8(cmd::GET_RGB_STRIP_COUNT).await?;
        let mut strips = Vec::with_capacity(count as usize);
        for i in 0..count {
            let param: StripParamResponse =
                self.exchange.query(&GetStripParam { index: i }).await?;
            let mode_resp: StripModeResponse =
                self.exchange.query(&GetStripMode { index: i }).await?;
            let mode = StripMode::from_u8(mode_resp.mode).unwrap_or_else(|| {
                warn!("strip {} reported unknown mode {}", i, mode_resp.mode);
                StripMode::Custom
            });
            strips.push(RgbStrip {
                index: param.index,
                config: param.config,
                start: param.start,
                count: param.count,
                leds: vec![RgbLed::default(); param.count as usize],
                mode,
            });
        }
        self.strips = strips;
        Ok(())
    }

    /// Fetch every LED of one strip from the device.
    pub async fn reload_strip_leds(&mut self, strip: usize) -> Result<(), KeyboardError> {
        let (start, count) = {
            let s = self.strip_ref(strip)?;
            (s.start, s.count)
        };
        let mut leds = Vec::with_capacity(count as usize);
        for offset in 0..count {
            let resp: LedResponse = self
                .exchange
                .query(&GetStripLed {
                    index: start + offset,
                })
                .await?;
            leds.push(RgbLed::from(&resp));
        }
        self.strips[strip].leds = leds;
        Ok(())
    }

    fn strip_ref(&self, strip: usize) -> Result<&RgbStrip, KeyboardError> {
        self.strips.get(strip).ok_or_else(|| {
            KeyboardError::InvalidParameter(format!("strip {strip} out of range"))
        })
    }

    /// Set one LED of a strip by strip-relative offset.
    pub async fn apply_strip_led(
        &mut self,
        strip: usize,
        offset: usize,
        led: RgbLed,
    ) -> Result<(), KeyboardError> {
        let absolute = self.strip_ref(strip)?.absolute_index(offset).ok_or_else(|| {
            KeyboardError::InvalidParameter(format!("LED {offset} out of range on strip {strip}"))
        })?;
        if self.strips[strip].leds[offset] == led {
            return Ok(());
        }
        self.exchange
            .execute(&SetStripLed {
                index: absolute,
                hue: led.hue,
                sat: led.sat,
                val: led.val,
                param: led.pack_param(),
            })
            .await?;
        self.strips[strip].leds[offset] = led;
        Ok(())
    }

    /// Set a strip's effect mode. Setting the current mode again issues
    /// no frame.
    pub async fn apply_strip_mode(
        &mut self,
        strip: usize,
        mode: StripMode,
    ) -> Result<(), KeyboardError> {
        let index = self.strip_ref(strip)?.index;
        if self.strips[strip].mode == mode {
            return Ok(());
        }
        self.exchange
            .execute(&SetStripMode {
                index,
                mode: mode as u8,
            })
            .await?;
        self.strips[strip].mode = mode;
        Ok(())
    }

    // === RGB matrix ===

    pub fn matrix(&self) -> &RgbMatrixState {
        &self.matrix
    }

    /// Load the matrix window and the per-row LED index tables.
    pub async fn reload_rgb_matrix(&mut self) -> Result<(), KeyboardError> {
        let info: MatrixInfoResponse = self.exchange.query(&GetMatrixInfo).await?;
        let mut state = RgbMatrixState::new(info.start, info.count);

        let mut rows: Vec<u8> = self.keys.iter().map(|k| k.row).collect();
        rows.sort_unstable();
        rows.dedup();
        for row in rows {
            let resp: MatrixRowResponse =
                self.exchange.query(&GetMatrixRowInfo { row }).await?;
            state.set_row(resp.row, &resp.indices);
        }
        self.matrix = state;
        Ok(())
    }

    /// Fetch one key's matrix LED into the cache.
    pub async fn reload_matrix_led(&mut self, pos: KeyPos) -> Result<RgbLed, KeyboardError> {
        let index = self.matrix.led_index(pos).ok_or(KeyboardError::NoLedMapping {
            row: pos.row,
            col: pos.col,
        })?;
        let resp: LedResponse = self.exchange.query(&GetMatrixLed { index }).await?;
        let led = RgbLed::from(&resp);
        self.matrix.set_led(index, led);
        Ok(led)
    }

    pub async fn apply_matrix_led(
        &mut self,
        pos: KeyPos,
        led: RgbLed,
    ) -> Result<(), KeyboardError> {
        let index = self.matrix.led_index(pos).ok_or(KeyboardError::NoLedMapping {
            row: pos.row,
            col: pos.col,
        })?;
        if self.matrix.led(index) == Some(&led) {
            return Ok(());
        }
        self.exchange
            .execute(&SetMatrixLed {
                index,
                hue: led.hue,
                sat: led.sat,
                val: led.val,
                param: led.pack_param(),
            })
            .await?;
        self.matrix.set_led(index, led);
        Ok(())
    }

    // === RGB indicators ===

    pub fn indicator(&self, which: Indicator) -> Option<&IndicatorLed> {
        self.indicators.get(&which)
    }

    /// Load indicator LEDs. Indicators the device rejects (not wired on
    /// this board) are skipped, any other failure propagates.
    pub async fn reload_indicators(&mut self) -> Result<(), KeyboardError> {
        self.indicators.clear();
        for which in Indicator::ALL {
            let resp: Result<IndicatorResponse, _> = self
                .exchange
                .query(&GetIndicatorLed {
                    which: which as u8,
                })
                .await;
            match resp {
                Ok(r) => {
                    self.indicators.insert(
                        which,
                        IndicatorLed {
                            led_index: r.led_index,
                            led: RgbLed::from_wire(r.hue, r.sat, r.val, r.param),
                        },
                    );
                }
                Err(TransportError::CommandFailed { .. }) => {
                    debug!("indicator {} not present", which.name());
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    pub async fn apply_indicator(
        &mut self,
        which: Indicator,
        led: RgbLed,
    ) -> Result<(), KeyboardError> {
        let cached = self.indicators.get(&which).copied().ok_or_else(|| {
            KeyboardError::InvalidParameter(format!("indicator {} not present", which.name()))
        })?;
        if cached.led == led {
            return Ok(());
        }
        self.exchange
            .execute(&SetIndicatorLed {
                which: which as u8,
                led_index: cached.led_index,
                hue: led.hue,
                sat: led.sat,
                val: led.val,
                param: led.pack_param(),
            })
            .await?;
        self.indicators.insert(
            which,
            IndicatorLed {
                led_index: cached.led_index,
                led,
            },
        );
        Ok(())
    }

    // === Snaptap ===

    pub fn snaptaps(&self) -> &[SnaptapKey] {
        &self.snaptaps
    }

    pub async fn reload_snaptap(&mut self) -> Result<(), KeyboardError> {
        let count = self.exchange.query_u8(cmd::GET_SNAPTAP_COUNT).await?;
        let mut records = Vec::with_capacity(count as usize);
        for i in 0..count {
            let resp: SnaptapResponse = self.exchange.query(&GetSnaptap { index: i }).await?;
            match SnaptapKey::from_wire(&resp) {
                Some(key) => records.push(key),
                None => {
                    warn!("snaptap {} reported unknown mode {}", i, resp.mode);
                    records.push(SnaptapKey {
                        index: resp.index,
                        ..SnaptapKey::default()
                    });
                }
            }
        }
        self.snaptaps = records;
        Ok(())
    }

    pub async fn apply_snaptap(&mut self, key: SnaptapKey) -> Result<(), KeyboardError> {
        let slot = key.index as usize;
        if slot >= self.snaptaps.len() {
            return Err(KeyboardError::InvalidParameter(format!(
                "snaptap {} out of range (device has {})",
                key.index,
                self.snaptaps.len()
            )));
        }
        if self.snaptaps[slot] == key {
            return Ok(());
        }
        self.exchange
            .execute(&SetSnaptap {
                index: key.index,
                first_row: key.first.row,
                first_col: key.first.col,
                second_row: key.second.row,
                second_col: key.second.col,
                mode: key.mode as u8,
            })
            .await?;
        self.snaptaps[slot] = key;
        Ok(())
    }

    // === Misc ===

    /// Push wall-clock time to the device display.
    pub async fn set_datetime(&mut self, datetime: DateTime) -> Result<(), KeyboardError> {
        self.exchange.execute(&SetDateTime { datetime }).await?;
        Ok(())
    }
}

/// A rejected command on an optional subsystem means the device does not
/// have it; anything else propagates.
fn optional(result: Result<(), KeyboardError>, feature: &str) -> Result<(), KeyboardError> {
    match result {
        Ok(()) => Ok(()),
        Err(KeyboardError::Transport(TransportError::CommandFailed { .. })) => {
            debug!("{} not supported by this device", feature);
            Ok(())
        }
        Err(e) => Err(e),
    }
}
