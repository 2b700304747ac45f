//! Dual key stroke (DKS) table model
//!
//! Each key can carry up to four inner keycodes fired by up to four travel
//! events, with independent down-phase and up-phase bits per
//! `(event, inner key)` pair. The whole table packs into 12 wire bytes.

use serde::{Deserialize, Serialize};

pub use amk_transport::command::DKS_DATA_LEN;

/// Number of trigger events per key
pub const DKS_EVENT_MAX: usize = 4;
/// Number of inner key slots per key
pub const DKS_KEY_MAX: usize = 4;

/// Keycode meaning "no key assigned"
pub const KC_NO: u16 = 0;

/// Per-key dual key stroke table.
///
/// The `dirty` flag is set by any mutating call that actually changes
/// state and cleared only after a confirmed device write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DksKey {
    /// `down_events[event][slot]` — fire slot on the down phase of event
    down_events: [[bool; DKS_KEY_MAX]; DKS_EVENT_MAX],
    /// `up_events[event][slot]` — fire slot on the up phase of event
    up_events: [[bool; DKS_KEY_MAX]; DKS_EVENT_MAX],
    /// Inner keycodes, `KC_NO` when unassigned
    keys: [u16; DKS_KEY_MAX],
    #[serde(skip)]
    dirty: bool,
}

impl Default for DksKey {
    fn default() -> Self {
        Self::new()
    }
}

impl DksKey {
    pub fn new() -> Self {
        Self {
            down_events: [[false; DKS_KEY_MAX]; DKS_EVENT_MAX],
            up_events: [[false; DKS_KEY_MAX]; DKS_EVENT_MAX],
            keys: [KC_NO; DKS_KEY_MAX],
            dirty: false,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag after a confirmed device write.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// A table is valid (worth writing) when any inner key is assigned or
    /// any event bit is set.
    pub fn is_valid(&self) -> bool {
        self.keys.iter().any(|&k| k != KC_NO)
            || self.down_events.iter().flatten().any(|&e| e)
            || self.up_events.iter().flatten().any(|&e| e)
    }

    /// Assign an inner keycode. Rejects out-of-range slots; dirty only
    /// when the keycode actually changes.
    pub fn add_key(&mut self, slot: usize, keycode: u16) -> bool {
        if slot >= DKS_KEY_MAX {
            return false;
        }
        if self.keys[slot] != keycode {
            self.keys[slot] = keycode;
            self.dirty = true;
        }
        true
    }

    /// Clear an inner keycode.
    pub fn del_key(&mut self, slot: usize) -> bool {
        if slot >= DKS_KEY_MAX {
            return false;
        }
        if self.keys[slot] != KC_NO {
            self.keys[slot] = KC_NO;
            self.dirty = true;
        }
        true
    }

    /// Set one event bit. Dirty only on a 0→1 flip.
    pub fn add_event(&mut self, event: usize, slot: usize, down: bool) -> bool {
        if event >= DKS_EVENT_MAX || slot >= DKS_KEY_MAX {
            return false;
        }
        let events = if down {
            &mut self.down_events
        } else {
            &mut self.up_events
        };
        if !events[event][slot] {
            events[event][slot] = true;
            self.dirty = true;
        }
        true
    }

    /// Clear one event bit. Dirty only on a 1→0 flip.
    pub fn del_event(&mut self, event: usize, slot: usize, down: bool) -> bool {
        if event >= DKS_EVENT_MAX || slot >= DKS_KEY_MAX {
            return false;
        }
        let events = if down {
            &mut self.down_events
        } else {
            &mut self.up_events
        };
        if events[event][slot] {
            events[event][slot] = false;
            self.dirty = true;
        }
        true
    }

    pub fn key(&self, slot: usize) -> u16 {
        self.keys.get(slot).copied().unwrap_or(KC_NO)
    }

    pub fn is_event_on(&self, event: usize, slot: usize, down: bool) -> bool {
        if event >= DKS_EVENT_MAX || slot >= DKS_KEY_MAX {
            return false;
        }
        if down {
            self.down_events[event][slot]
        } else {
            self.up_events[event][slot]
        }
    }

    /// Reset the whole table; always marks dirty.
    pub fn clear(&mut self) {
        self.keys = [KC_NO; DKS_KEY_MAX];
        self.down_events = [[false; DKS_KEY_MAX]; DKS_EVENT_MAX];
        self.up_events = [[false; DKS_KEY_MAX]; DKS_EVENT_MAX];
        self.dirty = true;
    }

    /// Pack into the 12-byte wire table: 4 event bytes (bits 0-3 down,
    /// bits 4-7 up, one bit per inner slot) then 4 big-endian keycodes.
    pub fn pack(&self) -> [u8; DKS_DATA_LEN] {
        let mut data = [0u8; DKS_DATA_LEN];
        for event in 0..DKS_EVENT_MAX {
            for slot in 0..DKS_KEY_MAX {
                if self.down_events[event][slot] {
                    data[event] |= 1 << slot;
                }
                if self.up_events[event][slot] {
                    data[event] |= 1 << (slot + 4);
                }
            }
        }
        for (i, &key) in self.keys.iter().enumerate() {
            let be = key.to_be_bytes();
            data[4 + i * 2] = be[0];
            data[4 + i * 2 + 1] = be[1];
        }
        data
    }

    /// Exact inverse of [`pack`](Self::pack). The parsed table is clean.
    pub fn parse(data: &[u8; DKS_DATA_LEN]) -> Self {
        let mut dks = Self::new();
        for event in 0..DKS_EVENT_MAX {
            for slot in 0..DKS_KEY_MAX {
                dks.down_events[event][slot] = data[event] & (1 << slot) != 0;
                dks.up_events[event][slot] = data[event] & (1 << (slot + 4)) != 0;
            }
        }
        for i in 0..DKS_KEY_MAX {
            dks.keys[i] = u16::from_be_bytes([data[4 + i * 2], data[4 + i * 2 + 1]]);
        }
        dks
    }

    /// Deep structural comparison, ignoring the dirty flag. Used to skip
    /// a device write when an imported table matches current state.
    pub fn is_same(&self, other: &DksKey) -> bool {
        self.down_events == other.down_events
            && self.up_events == other.up_events
            && self.keys == other.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_parse_round_trip() {
        let mut dks = DksKey::new();
        assert!(dks.add_key(0, 0x0004)); // KC_A
        assert!(dks.add_key(3, 0x00E1)); // KC_LSFT
        assert!(dks.add_event(0, 0, true));
        assert!(dks.add_event(2, 3, false));
        assert!(dks.add_event(3, 1, true));

        let packed = dks.pack();
        let parsed = DksKey::parse(&packed);
        assert!(parsed.is_same(&dks));
        assert!(!parsed.is_dirty());
        assert_eq!(parsed.pack(), packed);
    }

    #[test]
    fn event_byte_layout() {
        let mut dks = DksKey::new();
        dks.add_event(1, 2, true);
        dks.add_event(1, 2, false);
        let packed = dks.pack();
        // down bit 2, up bit 6 of event byte 1
        assert_eq!(packed[1], (1 << 2) | (1 << 6));
    }

    #[test]
    fn out_of_range_rejected() {
        let mut dks = DksKey::new();
        assert!(!dks.add_key(DKS_KEY_MAX, 0x0004));
        assert!(!dks.add_event(DKS_EVENT_MAX, 0, true));
        assert!(!dks.del_event(DKS_EVENT_MAX, 0, false));
        assert!(!dks.is_dirty());
    }

    #[test]
    fn dirty_only_on_change() {
        let mut dks = DksKey::new();
        assert!(dks.add_key(1, 0x0005));
        assert!(dks.is_dirty());
        dks.mark_clean();

        // same keycode again: no change, stays clean
        assert!(dks.add_key(1, 0x0005));
        assert!(!dks.is_dirty());

        // clearing an already-clear event bit: stays clean
        assert!(dks.del_event(0, 0, true));
        assert!(!dks.is_dirty());

        assert!(dks.add_event(0, 1, true));
        assert!(dks.is_dirty());
    }

    #[test]
    fn validity() {
        let mut dks = DksKey::new();
        assert!(!dks.is_valid());
        dks.add_event(0, 0, false);
        assert!(dks.is_valid());

        let mut keyed = DksKey::new();
        keyed.add_key(2, 0x0008);
        assert!(keyed.is_valid());

        keyed.clear();
        assert!(!keyed.is_valid());
        assert!(keyed.is_dirty());
    }
}
