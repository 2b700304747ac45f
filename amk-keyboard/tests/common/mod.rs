#![allow(dead_code)] // each test crate uses a different subset

//! Scripted in-memory transport for integration tests.
//!
//! A handler closure maps each request frame to a response frame; every
//! control frame and bulk buffer is logged so tests can assert on the
//! exact traffic a flow produced.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use amk_keyboard::{AmkKeyboard, ExchangeTransport, KeyPos, Transport, TransportError};
use amk_transport::protocol::{FRAME_SIZE, PREFIX, STATUS_OK};
use amk_transport::TransportDeviceInfo;

pub type Handler = Box<dyn FnMut(&[u8]) -> Vec<u8> + Send>;

pub struct MockTransport {
    info: TransportDeviceInfo,
    pub frames: Mutex<Vec<Vec<u8>>>,
    pub bulk: Mutex<Vec<Vec<u8>>>,
    pending: Mutex<Option<Vec<u8>>>,
    handler: Mutex<Handler>,
}

impl MockTransport {
    pub fn new(handler: impl FnMut(&[u8]) -> Vec<u8> + Send + 'static) -> Arc<Self> {
        Self::with_bulk(false, handler)
    }

    pub fn with_bulk(
        has_bulk: bool,
        handler: impl FnMut(&[u8]) -> Vec<u8> + Send + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            info: TransportDeviceInfo {
                vid: 0x4d58,
                pid: 0x0233,
                device_path: "mock".into(),
                serial: None,
                product_name: Some("AMK Meta".into()),
                has_bulk,
            },
            frames: Mutex::new(Vec::new()),
            bulk: Mutex::new(Vec::new()),
            pending: Mutex::new(None),
            handler: Mutex::new(Box::new(handler)),
        })
    }

    /// Sent control frames carrying the given opcode.
    pub fn frames_with_opcode(&self, opcode: u8) -> Vec<Vec<u8>> {
        self.frames
            .lock()
            .iter()
            .filter(|f| f[1] == opcode)
            .cloned()
            .collect()
    }

    pub fn sent_count(&self) -> usize {
        self.frames.lock().len()
    }

    /// Opcodes of all sent control frames, in order.
    pub fn opcode_trace(&self) -> Vec<u8> {
        self.frames.lock().iter().map(|f| f[1]).collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn write_frame(&self, frame: &[u8]) -> Result<(), TransportError> {
        self.frames.lock().push(frame.to_vec());
        let mut handler = self.handler.lock();
        let resp = (*handler)(frame);
        drop(handler);
        *self.pending.lock() = Some(resp);
        Ok(())
    }

    async fn read_frame(&self) -> Result<Vec<u8>, TransportError> {
        self.pending
            .lock()
            .take()
            .ok_or(TransportError::Hid("no pending response".into()))
    }

    async fn write_bulk(&self, data: &[u8]) -> Result<(), TransportError> {
        if !self.info.has_bulk {
            return Err(TransportError::NoBulkChannel);
        }
        self.bulk.lock().push(data.to_vec());
        Ok(())
    }

    async fn read_bulk(&self, _max_len: usize) -> Result<Vec<u8>, TransportError> {
        Err(TransportError::NoBulkChannel)
    }

    fn device_info(&self) -> &TransportDeviceInfo {
        &self.info
    }

    async fn is_connected(&self) -> bool {
        true
    }

    async fn close(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Successful response frame with the given payload.
pub fn ok(opcode: u8, payload: &[u8]) -> Vec<u8> {
    let mut resp = vec![0u8; FRAME_SIZE];
    resp[0] = PREFIX;
    resp[1] = opcode;
    resp[2] = STATUS_OK;
    resp[3..3 + payload.len()].copy_from_slice(payload);
    resp
}

/// Response frame with a failure status.
pub fn fail(opcode: u8, status: u8) -> Vec<u8> {
    let mut resp = vec![0u8; FRAME_SIZE];
    resp[0] = PREFIX;
    resp[1] = opcode;
    resp[2] = status;
    resp
}

/// Keyboard over a mock transport with a small 2×2 key set.
pub fn keyboard(raw: Arc<MockTransport>) -> AmkKeyboard {
    let keys = vec![
        KeyPos::new(0, 0),
        KeyPos::new(0, 1),
        KeyPos::new(1, 0),
        KeyPos::new(1, 1),
    ];
    AmkKeyboard::new(Arc::new(ExchangeTransport::new(raw)), keys)
}
