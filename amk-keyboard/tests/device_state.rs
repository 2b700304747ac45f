//! Shadow-cache semantics over a scripted transport: write avoidance,
//! write-then-commit ordering, composite MS_CONFIG recomposition.

mod common;

use amk_keyboard::{DksKey, KeyPos, KeyboardConfig, Pole, PollRate, RtValue};
use amk_transport::protocol::cmd;
use common::{fail, keyboard, ok, MockTransport};

/// Ack every SET command, answer GETs with zeroed payloads.
fn ack_everything(frame: &[u8]) -> Vec<u8> {
    ok(frame[1], &[0u8; 16])
}

#[tokio::test]
async fn apply_apc_twice_sends_one_frame() {
    let raw = MockTransport::new(ack_everything);
    let mut kb = keyboard(raw.clone());
    let pos = KeyPos::new(0, 1);

    kb.apply_apc(0, pos, 16).await.unwrap();
    kb.apply_apc(0, pos, 16).await.unwrap();
    assert_eq!(raw.frames_with_opcode(cmd::SET_APC).len(), 1);

    kb.apply_apc(0, pos, 20).await.unwrap();
    assert_eq!(raw.frames_with_opcode(cmd::SET_APC).len(), 2);
    assert_eq!(kb.apc(0, pos), Some(20));
}

#[tokio::test]
async fn rejected_write_leaves_cache_unmodified() {
    let raw = MockTransport::new(|frame: &[u8]| {
        if frame[1] == cmd::SET_APC {
            fail(cmd::SET_APC, 0x01)
        } else {
            ok(frame[1], &[0u8; 4])
        }
    });
    let mut kb = keyboard(raw.clone());
    let pos = KeyPos::new(0, 0);

    assert!(kb.apply_apc(0, pos, 16).await.is_err());
    assert_eq!(kb.apc(0, pos), None);

    // the cache never absorbed the failed value, so a retry sends again
    assert!(kb.apply_apc(0, pos, 16).await.is_err());
    assert_eq!(raw.frames_with_opcode(cmd::SET_APC).len(), 2);
}

#[tokio::test]
async fn rt_wire_word_uses_negotiated_version() {
    let raw = MockTransport::new(|frame: &[u8]| {
        if frame[1] == cmd::GET_VERSION {
            ok(cmd::GET_VERSION, &[3])
        } else {
            ok(frame[1], &[0u8; 4])
        }
    });
    let mut kb = keyboard(raw.clone());
    kb.reload_version().await.unwrap();

    let rt = RtValue {
        continuous: true,
        press: 100,
        release: 30,
    };
    kb.apply_rt(0, KeyPos::new(1, 1), rt).await.unwrap();

    let frames = raw.frames_with_opcode(cmd::SET_RT);
    assert_eq!(frames.len(), 1);
    // payload: row, col, raw BE, profile — 7-bit fields in version 1
    let raw_word = u16::from_be_bytes([frames[0][4], frames[0][5]]);
    assert_eq!(raw_word, 0x8000 | (100 << 7) | 30);
}

#[tokio::test]
async fn ms_config_mutation_resends_full_composite_byte() {
    let raw = MockTransport::new(|frame: &[u8]| {
        if frame[1] == cmd::GET_MS_CONFIG {
            // pole south, profile 1, dks enabled, 4 profiles
            ok(cmd::GET_MS_CONFIG, &[(1 << 1) | (4 << 4)])
        } else {
            ok(frame[1], &[0u8; 4])
        }
    });
    let mut kb = keyboard(raw.clone());
    kb.reload_ms_config().await.unwrap();
    assert_eq!(kb.settings().profile_count, 4);
    assert_eq!(kb.settings().profile, 1);

    // flipping one logical field re-sends pole AND profile AND dks bits
    kb.apply_pole(Pole::North).await.unwrap();
    let frames = raw.frames_with_opcode(cmd::SET_MS_CONFIG);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0][2], 0x01 | (1 << 1));
    assert_eq!(kb.settings().pole, Pole::North);

    // the reload made all four profile tables addressable
    kb.apply_apc(3, KeyPos::new(0, 0), 12).await.unwrap();
    assert!(kb.apply_apc(4, KeyPos::new(0, 0), 12).await.is_err());
}

#[tokio::test]
async fn identical_dks_table_skips_the_write() {
    let raw = MockTransport::new(ack_everything);
    let mut kb = keyboard(raw.clone());
    let pos = KeyPos::new(1, 0);

    let mut table = DksKey::new();
    table.add_key(0, 0x0004);
    table.add_event(0, 0, true);

    kb.apply_dks(pos, &table).await.unwrap();
    assert_eq!(raw.frames_with_opcode(cmd::SET_DKS).len(), 1);
    assert!(!kb.dks(pos).unwrap().is_dirty());

    // structurally identical table: no second frame
    let same = table.clone();
    kb.apply_dks(pos, &same).await.unwrap();
    assert_eq!(raw.frames_with_opcode(cmd::SET_DKS).len(), 1);

    let mut changed = table.clone();
    changed.add_key(1, 0x0005);
    kb.apply_dks(pos, &changed).await.unwrap();
    assert_eq!(raw.frames_with_opcode(cmd::SET_DKS).len(), 2);
}

#[tokio::test]
async fn indicators_absent_on_device_are_skipped() {
    let raw = MockTransport::new(|frame: &[u8]| {
        if frame[1] == cmd::GET_RGB_INDICATOR_LED && frame[2] >= 2 {
            fail(cmd::GET_RGB_INDICATOR_LED, 0x02)
        } else if frame[1] == cmd::GET_RGB_INDICATOR_LED {
            ok(cmd::GET_RGB_INDICATOR_LED, &[frame[2], 30 + frame[2], 10, 20, 30, 0x01])
        } else {
            ok(frame[1], &[0u8; 8])
        }
    });
    let mut kb = keyboard(raw);
    kb.reload_indicators().await.unwrap();

    use amk_keyboard::Indicator;
    assert!(kb.indicator(Indicator::NumLock).is_some());
    assert!(kb.indicator(Indicator::CapsLock).is_some());
    assert!(kb.indicator(Indicator::ScrollLock).is_none());
    assert!(kb.indicator(Indicator::Kana).is_none());
}

#[tokio::test]
async fn config_import_replays_with_write_avoidance() {
    let raw = MockTransport::new(ack_everything);
    let mut kb = keyboard(raw.clone());

    // matches the pristine cache: not a single frame goes out
    let noop = KeyboardConfig {
        name: "AMK Meta".into(),
        vendor_id: 0x4d58,
        product_id: 0x0233,
        profile: 0,
        pole: Pole::South,
        nkro: false,
        poll_rate: PollRate::Hz1000,
        rt_sens: 0,
        top_sens: 0,
        btm_sens: 0,
        apc_sens: 0,
        noise_sens: 0,
        keys: Vec::new(),
    };
    kb.import_config(&noop).await.unwrap();
    assert_eq!(raw.sent_count(), 0);

    // one changed scalar: exactly one frame
    let mut changed = noop.clone();
    changed.nkro = true;
    kb.import_config(&changed).await.unwrap();
    assert_eq!(raw.sent_count(), 1);
    assert_eq!(raw.frames_with_opcode(cmd::SET_NKRO).len(), 1);

    // snapshots from another device are refused up front
    let mut foreign = noop.clone();
    foreign.product_id = 0x9999;
    assert!(kb.import_config(&foreign).await.is_err());
    assert_eq!(raw.sent_count(), 1);
}
