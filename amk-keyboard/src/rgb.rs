//! RGB model: per-LED state, light strips, indicators and the key-matrix
//! LED lookup
//!
//! LEDs live in one flat address space; strips and the matrix each claim a
//! `{start, count}` window of it.

use std::collections::HashMap;

use amk_transport::command::{LedResponse, MATRIX_NO_LED};
use amk_transport::KeyPos;

/// One addressable LED: HSV color plus the packed parameter flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RgbLed {
    pub hue: u8,
    pub sat: u8,
    pub val: u8,
    pub on: bool,
    pub dynamic: bool,
    pub blink: bool,
    pub breath: bool,
    /// Animation speed, 0-15
    pub speed: u8,
}

impl RgbLed {
    /// Pack the flag fields into the wire parameter byte:
    /// bit0 on, bit1 dynamic, bit2 blink, bit3 breath, bits4-7 speed.
    pub fn pack_param(&self) -> u8 {
        u8::from(self.on)
            | u8::from(self.dynamic) << 1
            | u8::from(self.blink) << 2
            | u8::from(self.breath) << 3
            | (self.speed & 0x0F) << 4
    }

    /// Exact inverse of [`pack_param`](Self::pack_param).
    pub fn parse_param(&mut self, param: u8) {
        self.on = param & 0x01 != 0;
        self.dynamic = param & 0x02 != 0;
        self.blink = param & 0x04 != 0;
        self.breath = param & 0x08 != 0;
        self.speed = param >> 4;
    }

    /// Build from a wire LED record.
    pub fn from_wire(hue: u8, sat: u8, val: u8, param: u8) -> Self {
        let mut led = Self {
            hue,
            sat,
            val,
            ..Self::default()
        };
        led.parse_param(param);
        led
    }
}

impl From<&LedResponse> for RgbLed {
    fn from(resp: &LedResponse) -> Self {
        Self::from_wire(resp.hue, resp.sat, resp.val, resp.param)
    }
}

/// Strip effect mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum StripMode {
    #[default]
    Custom = 0,
    Gradient = 1,
    Static = 2,
    Blink = 3,
    Rainbow = 4,
    Random = 5,
    Breath = 6,
    Wipe = 7,
    Circle = 8,
}

impl StripMode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Custom),
            1 => Some(Self::Gradient),
            2 => Some(Self::Static),
            3 => Some(Self::Blink),
            4 => Some(Self::Rainbow),
            5 => Some(Self::Random),
            6 => Some(Self::Breath),
            7 => Some(Self::Wipe),
            8 => Some(Self::Circle),
            _ => None,
        }
    }
}

/// One LED strip: a window of the flat LED space plus its effect mode.
///
/// Per-LED state is fetched lazily, so `leds` holds `count` entries that
/// start out default until loaded.
#[derive(Debug, Clone, Default)]
pub struct RgbStrip {
    pub index: u8,
    pub config: u8,
    /// First absolute LED index of this strip
    pub start: u8,
    pub count: u8,
    pub leds: Vec<RgbLed>,
    pub mode: StripMode,
}

impl RgbStrip {
    pub fn led(&self, offset: usize) -> Option<&RgbLed> {
        self.leds.get(offset)
    }

    /// Absolute LED index for a strip-relative offset.
    pub fn absolute_index(&self, offset: usize) -> Option<u8> {
        if offset < self.count as usize {
            Some(self.start + offset as u8)
        } else {
            None
        }
    }
}

/// Named indicator LEDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Indicator {
    NumLock = 0,
    CapsLock = 1,
    ScrollLock = 2,
    Compose = 3,
    Kana = 4,
}

impl Indicator {
    pub const ALL: [Indicator; 5] = [
        Indicator::NumLock,
        Indicator::CapsLock,
        Indicator::ScrollLock,
        Indicator::Compose,
        Indicator::Kana,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::NumLock => "num lock",
            Self::CapsLock => "caps lock",
            Self::ScrollLock => "scroll lock",
            Self::Compose => "compose",
            Self::Kana => "kana",
        }
    }
}

/// Indicator state: which absolute LED backs it, and its current color.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndicatorLed {
    pub led_index: u8,
    pub led: RgbLed,
}

/// Per-key RGB matrix addressing and LED cache.
///
/// The device reports a `{start, count}` window plus a per-row table of
/// absolute LED indices (0xFF for unlit positions). Lookups are validated
/// against both, never assumed.
#[derive(Debug, Clone, Default)]
pub struct RgbMatrixState {
    pub start: u8,
    pub count: u8,
    index_by_pos: HashMap<KeyPos, u8>,
    leds: HashMap<u8, RgbLed>,
}

impl RgbMatrixState {
    pub fn new(start: u8, count: u8) -> Self {
        Self {
            start,
            count,
            index_by_pos: HashMap::new(),
            leds: HashMap::new(),
        }
    }

    /// Record one row's `col -> absolute index` table.
    pub fn set_row(&mut self, row: u8, indices: &[u8]) {
        for (col, &index) in indices.iter().enumerate() {
            if index != MATRIX_NO_LED {
                self.index_by_pos.insert(KeyPos::new(row, col as u8), index);
            }
        }
    }

    /// Absolute LED index for a key position.
    ///
    /// Returns `None` when the position has no LED or the reported index
    /// falls outside the cached LED window.
    pub fn led_index(&self, pos: KeyPos) -> Option<u8> {
        let index = *self.index_by_pos.get(&pos)?;
        if index < self.start || index >= self.start + self.count {
            return None;
        }
        Some(index)
    }

    pub fn led(&self, index: u8) -> Option<&RgbLed> {
        self.leds.get(&index)
    }

    pub fn set_led(&mut self, index: u8, led: RgbLed) {
        self.leds.insert(index, led);
    }

    pub fn mapped_positions(&self) -> impl Iterator<Item = (&KeyPos, &u8)> {
        self.index_by_pos.iter()
    }
}
