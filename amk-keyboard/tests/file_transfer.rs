//! Remote file protocol flows: chunking, admission control, abort and
//! cleanup discipline, fast-path batching, cancellation.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use amk_keyboard::animation::{AnimFormat, Frame};
use amk_keyboard::{CancelToken, FileEntry, KeyboardError};
use amk_transport::protocol::{cmd, file, PREFIX};
use common::{fail, keyboard, ok, MockTransport};

/// Ack everything; OPEN_FILE hands out handle 1, FS info reports the
/// given free space.
fn file_device(free_space: u32) -> impl FnMut(&[u8]) -> Vec<u8> + Send {
    move |frame: &[u8]| match frame[1] {
        cmd::OPEN_FILE => ok(cmd::OPEN_FILE, &[1]),
        cmd::GET_FILE_SYSTEM_INFO => {
            let mut payload = vec![0u8];
            payload.extend_from_slice(&free_space.to_le_bytes());
            payload.extend_from_slice(&8192u32.to_le_bytes());
            ok(cmd::GET_FILE_SYSTEM_INFO, &payload)
        }
        opcode => ok(opcode, &[0u8; 8]),
    }
}

#[tokio::test]
async fn chunked_write_offsets_and_progress() {
    let raw = MockTransport::new(file_device(4096));
    let mut kb = keyboard(raw.clone());

    let data = vec![0x5Au8; 100];
    let cancel = CancelToken::new();
    let mut reported: Vec<u8> = Vec::new();
    kb.upload_bytes("DATA.ANM", &data, false, &cancel, &mut |pct| {
        reported.push(pct)
    })
    .await
    .unwrap();

    // 100 bytes at the 24-byte cap: exactly 5 writes, 4×24 + 1×4
    let writes = raw.frames_with_opcode(cmd::WRITE_FILE);
    assert_eq!(writes.len(), 5);
    let mut last_offset = None;
    for (i, frame) in writes.iter().enumerate() {
        assert_eq!(frame[2], 1, "handle");
        let len = frame[3] as usize;
        let offset = u32::from_le_bytes([frame[4], frame[5], frame[6], frame[7]]);
        assert_eq!(len, if i < 4 { 24 } else { 4 });
        assert_eq!(offset as usize, i * 24, "strictly increasing offsets");
        assert!(Some(offset) > last_offset);
        last_offset = Some(offset);
    }

    // progress is forward-only and reaches 100
    assert!(reported.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(reported.last(), Some(&100));

    // session shape: pause, open, write…, close, resume
    let trace = raw.opcode_trace();
    assert_eq!(trace[0], cmd::DISPLAY_CONTROL);
    assert_eq!(trace[1], cmd::OPEN_FILE);
    assert_eq!(trace[7], cmd::CLOSE_FILE);
    assert_eq!(trace[8], cmd::DISPLAY_CONTROL);
}

#[tokio::test]
async fn admission_check_rejects_before_any_frame() {
    // one 10×30 frame: 20 header + 2 delay + 600 pixels = 622 bytes
    let frames = vec![Frame {
        pixels: vec![0; AnimFormat::Amft.frame_bytes()],
        delay_ms: 40,
    }];

    let raw = MockTransport::new(file_device(621));
    let mut kb = keyboard(raw.clone());
    kb.reload_fs_info().await.unwrap();
    let before = raw.sent_count();

    let err = kb
        .upload_animation("logo", AnimFormat::Amft, &frames, false, &CancelToken::new(), |_| {})
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        KeyboardError::InsufficientSpace {
            required: 622,
            free: 621
        }
    ));
    // rejected locally: no device round trip at all
    assert_eq!(raw.sent_count(), before);

    // one more free byte and the same transfer goes through
    let raw = MockTransport::new(file_device(622));
    let mut kb = keyboard(raw.clone());
    let name = kb
        .upload_animation("logo", AnimFormat::Amft, &frames, false, &CancelToken::new(), |_| {})
        .await
        .unwrap();
    assert_eq!(name, "LOGO.AMF");
    assert!(!raw.frames_with_opcode(cmd::WRITE_FILE).is_empty());
}

#[tokio::test]
async fn open_without_free_handle_is_terminal() {
    let raw = MockTransport::new(|frame: &[u8]| match frame[1] {
        cmd::OPEN_FILE => ok(cmd::OPEN_FILE, &[file::HANDLE_NONE]),
        opcode => ok(opcode, &[0u8; 8]),
    });
    let mut kb = keyboard(raw.clone());

    let err = kb
        .upload_bytes("DATA.ANM", &[0u8; 48], false, &CancelToken::new(), &mut |_| {})
        .await
        .unwrap_err();
    assert!(matches!(err, KeyboardError::NoFreeHandle));

    // nothing was written, no handle to close, display resumed
    assert!(raw.frames_with_opcode(cmd::WRITE_FILE).is_empty());
    assert!(raw.frames_with_opcode(cmd::CLOSE_FILE).is_empty());
    let displays = raw.frames_with_opcode(cmd::DISPLAY_CONTROL);
    assert_eq!(displays.len(), 2);
    assert_eq!(displays[1][2], 1, "display resumed after abort");
}

#[tokio::test]
async fn failed_chunk_aborts_but_still_closes() {
    let raw = MockTransport::new(|frame: &[u8]| match frame[1] {
        cmd::OPEN_FILE => ok(cmd::OPEN_FILE, &[2]),
        cmd::WRITE_FILE => {
            let offset = u32::from_le_bytes([frame[4], frame[5], frame[6], frame[7]]);
            if offset == 48 {
                fail(cmd::WRITE_FILE, 0x03)
            } else {
                ok(cmd::WRITE_FILE, &[])
            }
        }
        opcode => ok(opcode, &[0u8; 8]),
    });
    let mut kb = keyboard(raw.clone());

    let err = kb
        .upload_bytes("DATA.ANM", &[1u8; 100], false, &CancelToken::new(), &mut |_| {})
        .await
        .unwrap_err();
    assert!(matches!(err, KeyboardError::Transport(_)));

    // the failed chunk is not resumed and nothing follows it
    assert_eq!(raw.frames_with_opcode(cmd::WRITE_FILE).len(), 3);
    // best-effort close still happened, then the display was resumed
    assert_eq!(raw.frames_with_opcode(cmd::CLOSE_FILE).len(), 1);
    let trace = raw.opcode_trace();
    assert_eq!(trace.last(), Some(&cmd::DISPLAY_CONTROL));
}

#[tokio::test]
async fn read_loop_stops_on_zero_length_read() {
    let reads = Arc::new(AtomicUsize::new(0));
    let reads_in_handler = reads.clone();
    let raw = MockTransport::new(move |frame: &[u8]| match frame[1] {
        cmd::OPEN_FILE => ok(cmd::OPEN_FILE, &[0]),
        cmd::READ_FILE => {
            let n = reads_in_handler.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                let mut payload = vec![24u8];
                payload.extend_from_slice(&[0xCC; 24]);
                ok(cmd::READ_FILE, &payload)
            } else {
                // stream end: zero bytes
                ok(cmd::READ_FILE, &[0])
            }
        }
        opcode => ok(opcode, &[0u8; 8]),
    });
    let mut kb = keyboard(raw.clone());

    let entry = FileEntry {
        index: 0,
        name: "LOGO.ANM".into(),
        size: 100,
    };
    let data = kb
        .download_file(&entry, &CancelToken::new(), |_| {})
        .await
        .unwrap();

    // two full chunks then the zero-length read: exactly 3 calls, no hang
    assert_eq!(reads.load(Ordering::SeqCst), 3);
    assert_eq!(data.len(), 48);
    assert_eq!(raw.frames_with_opcode(cmd::CLOSE_FILE).len(), 1);
}

#[tokio::test]
async fn fast_path_batches_bulk_packets() {
    let raw = MockTransport::with_bulk(true, file_device(8192));
    let mut kb = keyboard(raw.clone());

    let data = vec![0xA5u8; 3000];
    kb.upload_bytes("BIG.BKG", &data, true, &CancelToken::new(), &mut |_| {})
        .await
        .unwrap();

    // 3000 bytes at 56/packet = 54 packets, batched 32 + 22
    let bulk = raw.bulk.lock().clone();
    assert_eq!(bulk.len(), 2);
    assert_eq!(bulk[0].len(), 32 * 64);
    assert_eq!(bulk[1].len(), 22 * 64);

    // packets carry the same WRITE_FILE layout as the control path
    assert_eq!(bulk[0][0], PREFIX);
    assert_eq!(bulk[0][1], cmd::WRITE_FILE);
    assert_eq!(bulk[0][3], 56);
    let second_offset = u32::from_le_bytes([bulk[0][68], bulk[0][69], bulk[0][70], bulk[0][71]]);
    assert_eq!(second_offset, 56);

    // no per-chunk control writes, but the terminal close is acknowledged
    assert!(raw.frames_with_opcode(cmd::WRITE_FILE).is_empty());
    assert_eq!(raw.frames_with_opcode(cmd::CLOSE_FILE).len(), 1);
}

#[tokio::test]
async fn cancel_between_chunks_aborts_and_closes() {
    let raw = MockTransport::new(file_device(8192));
    let mut kb = keyboard(raw.clone());

    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    let err = kb
        .upload_bytes("DATA.ANM", &[7u8; 100], false, &cancel, &mut move |_| {
            // cancel as soon as the first chunk reports progress
            trigger.cancel();
        })
        .await
        .unwrap_err();
    assert!(matches!(err, KeyboardError::Cancelled));

    assert_eq!(raw.frames_with_opcode(cmd::WRITE_FILE).len(), 1);
    assert_eq!(raw.frames_with_opcode(cmd::CLOSE_FILE).len(), 1);
    let trace = raw.opcode_trace();
    assert_eq!(trace.last(), Some(&cmd::DISPLAY_CONTROL));
}

#[tokio::test]
async fn delete_runs_inside_display_critical_section() {
    let raw = MockTransport::new(file_device(4096));
    let mut kb = keyboard(raw.clone());

    kb.delete_file(3).await.unwrap();

    let trace = raw.opcode_trace();
    assert_eq!(
        trace,
        vec![
            cmd::DISPLAY_CONTROL,
            cmd::DELETE_FILE,
            cmd::DISPLAY_CONTROL,
            cmd::GET_FILE_SYSTEM_INFO,
        ]
    );
    let displays = raw.frames_with_opcode(cmd::DISPLAY_CONTROL);
    assert_eq!(displays[0][2], 0, "paused before the mutation");
    assert_eq!(displays[1][2], 1, "resumed after");
}

#[tokio::test]
async fn directory_listing_follows_total_file_count() {
    let raw = MockTransport::new(|frame: &[u8]| match frame[1] {
        cmd::GET_FILE_SYSTEM_INFO => {
            let mut payload = vec![2u8];
            payload.extend_from_slice(&1000u32.to_le_bytes());
            payload.extend_from_slice(&8192u32.to_le_bytes());
            ok(cmd::GET_FILE_SYSTEM_INFO, &payload)
        }
        cmd::GET_FILE_INFO => {
            let mut payload = vec![frame[2]];
            let name = if frame[2] == 0 { b"LOGO.ANM\0\0\0\0\0" } else { b"IDLE.BKG\0\0\0\0\0" };
            payload.extend_from_slice(name);
            payload.extend_from_slice(&(622u32 * (frame[2] as u32 + 1)).to_le_bytes());
            ok(cmd::GET_FILE_INFO, &payload)
        }
        opcode => ok(opcode, &[0u8; 8]),
    });
    let mut kb = keyboard(raw);

    let files = kb.reload_file_list().await.unwrap().to_vec();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].name, "LOGO.ANM");
    assert_eq!(files[1].name, "IDLE.BKG");
    assert_eq!(files[1].size, 1244);
    assert_eq!(kb.fs_info().unwrap().free_space, 1000);
}
