//! Serialized exchange point for AMK conversations
//!
//! `ExchangeTransport` wraps a raw [`Transport`] (which only moves
//! individual frames) and adds the request/confirm discipline: bounded
//! retries, prefix/echo validation and status checking.
//!
//! ```text
//! [HidTransport / mock]        ← implements Transport (raw I/O)
//!          |
//! [ExchangeTransport]          ← retries, echo matching, status, one
//!          |                     conversation at a time
//! [AmkKeyboard]
//! ```
//!
//! Only one device conversation may be in flight at a time — the device
//! cannot interleave frames — so every exchange (including bulk fast-path
//! transfers) runs under one internal lock rather than ad hoc flags in
//! the callers.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::command::{AmkCommand, AmkResponse, ParseError};
use crate::error::TransportError;
use crate::protocol::{self, timing, PREFIX, RESPONSE_PAYLOAD_OFFSET, STATUS_OK};
use crate::types::TransportDeviceInfo;
use crate::Transport;

/// Flow-controlled wrapper owning the conversation lock.
pub struct ExchangeTransport {
    inner: Arc<dyn Transport>,
    query_lock: tokio::sync::Mutex<()>,
    command_delay_ms: u64,
}

impl ExchangeTransport {
    pub fn new(inner: Arc<dyn Transport>) -> Self {
        Self {
            inner,
            query_lock: tokio::sync::Mutex::new(()),
            command_delay_ms: timing::COMMAND_DELAY_MS,
        }
    }

    /// Access the wrapped raw transport.
    pub fn inner(&self) -> &Arc<dyn Transport> {
        &self.inner
    }

    pub fn device_info(&self) -> &TransportDeviceInfo {
        self.inner.device_info()
    }

    pub async fn is_connected(&self) -> bool {
        self.inner.is_connected().await
    }

    pub async fn close(&self) -> Result<(), TransportError> {
        self.inner.close().await
    }

    /// Send one request and wait for its validated response payload.
    ///
    /// Retries cover transport hiccups (failed write, failed read, echo
    /// mismatch). A delivered response with a non-OK status is a definitive
    /// answer from the device and is returned immediately as
    /// [`TransportError::CommandFailed`] — it is never retried.
    pub async fn exchange(
        &self,
        opcode: u8,
        payload: &[u8],
        retries: usize,
    ) -> Result<Vec<u8>, TransportError> {
        let frame = protocol::build_frame(opcode, payload);
        let _guard = self.query_lock.lock().await;

        for attempt in 0..retries.max(1) {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_millis(timing::RETRY_DELAY_MS)).await;
            }

            match self.inner.write_frame(&frame).await {
                Ok(()) => {}
                Err(TransportError::Disconnected) => return Err(TransportError::Disconnected),
                Err(e) => {
                    debug!(
                        "send attempt {} failed for {}: {}",
                        attempt,
                        protocol::cmd::name(opcode),
                        e
                    );
                    continue;
                }
            }

            if self.command_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.command_delay_ms)).await;
            }

            match self.inner.read_frame().await {
                Ok(resp) => {
                    if resp.len() < RESPONSE_PAYLOAD_OFFSET {
                        debug!("short response ({} bytes) on attempt {}", resp.len(), attempt);
                        continue;
                    }
                    if resp[0] != PREFIX || resp[1] != opcode {
                        debug!(
                            "echo mismatch: expected {}, got 0x{:02X}{:02X}",
                            protocol::cmd::name(opcode),
                            resp[0],
                            resp[1]
                        );
                        continue;
                    }
                    let status = resp[2];
                    if status != STATUS_OK {
                        warn!(
                            "{} rejected by device with status 0x{:02X}",
                            protocol::cmd::name(opcode),
                            status
                        );
                        return Err(TransportError::CommandFailed { opcode, status });
                    }
                    return Ok(resp[RESPONSE_PAYLOAD_OFFSET..].to_vec());
                }
                Err(TransportError::Disconnected) => return Err(TransportError::Disconnected),
                Err(e) => {
                    debug!("read attempt {} failed: {}", attempt, e);
                }
            }
        }

        warn!(
            "{} gave no valid response within {} attempts",
            protocol::cmd::name(opcode),
            retries.max(1)
        );
        Err(TransportError::RetriesExhausted { opcode })
    }

    /// Send a typed command and parse its typed response.
    pub async fn query<C, R>(&self, cmd: &C) -> Result<R, TransportError>
    where
        C: AmkCommand + Send + Sync,
        R: AmkResponse,
    {
        let payload = self.exchange(C::OPCODE, &cmd.payload(), C::RETRIES).await?;
        R::parse(&payload).map_err(TransportError::from)
    }

    /// Send a typed command whose response carries status only.
    pub async fn execute<C>(&self, cmd: &C) -> Result<(), TransportError>
    where
        C: AmkCommand + Send + Sync,
    {
        self.exchange(C::OPCODE, &cmd.payload(), C::RETRIES).await?;
        Ok(())
    }

    /// Read a single-byte scalar setting.
    pub async fn query_u8(&self, opcode: u8) -> Result<u8, TransportError> {
        let payload = self.exchange(opcode, &[], timing::QUERY_RETRIES).await?;
        payload.first().copied().ok_or(TransportError::Malformed(
            ParseError::TooShort {
                expected: 1,
                got: 0,
            },
        ))
    }

    /// Write a single-byte scalar setting.
    pub async fn set_u8(&self, opcode: u8, value: u8) -> Result<(), TransportError> {
        self.exchange(opcode, &[value], timing::DEFAULT_RETRIES)
            .await?;
        Ok(())
    }

    /// Push a batch of pre-built fast-path packets through the vendor
    /// bulk channel, under the same conversation lock as control frames.
    pub async fn write_bulk(&self, data: &[u8]) -> Result<(), TransportError> {
        let _guard = self.query_lock.lock().await;
        self.inner.write_bulk(data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{GetVersion, VersionResponse};
    use crate::protocol::{cmd, FRAME_SIZE};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Scripted raw transport: a closure maps each request frame to a
    /// response frame, and every sent frame is logged.
    struct ScriptTransport {
        info: TransportDeviceInfo,
        sent: Mutex<Vec<Vec<u8>>>,
        pending: Mutex<Option<Vec<u8>>>,
        respond: Box<dyn Fn(&[u8]) -> Vec<u8> + Send + Sync>,
    }

    impl ScriptTransport {
        fn new(respond: impl Fn(&[u8]) -> Vec<u8> + Send + Sync + 'static) -> Self {
            Self {
                info: TransportDeviceInfo {
                    vid: 0x4d58,
                    pid: 0x0001,
                    device_path: "script".into(),
                    serial: None,
                    product_name: None,
                    has_bulk: false,
                },
                sent: Mutex::new(Vec::new()),
                pending: Mutex::new(None),
                respond: Box::new(respond),
            }
        }

        fn sent_count(&self) -> usize {
            self.sent.lock().len()
        }
    }

    #[async_trait]
    impl Transport for ScriptTransport {
        async fn write_frame(&self, frame: &[u8]) -> Result<(), TransportError> {
            self.sent.lock().push(frame.to_vec());
            *self.pending.lock() = Some((self.respond)(frame));
            Ok(())
        }

        async fn read_frame(&self) -> Result<Vec<u8>, TransportError> {
            self.pending
                .lock()
                .take()
                .ok_or(TransportError::Hid("no pending response".into()))
        }

        async fn write_bulk(&self, _data: &[u8]) -> Result<(), TransportError> {
            Err(TransportError::NoBulkChannel)
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

    fn ok_response(opcode: u8, payload: &[u8]) -> Vec<u8> {
        let mut resp = vec![0u8; FRAME_SIZE];
        resp[0] = PREFIX;
        resp[1] = opcode;
        resp[2] = STATUS_OK;
        resp[3..3 + payload.len()].copy_from_slice(payload);
        resp
    }

    #[tokio::test]
    async fn exchange_returns_payload_after_status() {
        let raw = Arc::new(ScriptTransport::new(|req| ok_response(req[1], &[7])));
        let xfer = ExchangeTransport::new(raw.clone());

        let resp: VersionResponse = xfer.query(&GetVersion).await.unwrap();
        assert_eq!(resp.version, 7);
        assert_eq!(raw.sent_count(), 1);
    }

    #[tokio::test]
    async fn bad_status_fails_without_retry() {
        let raw = Arc::new(ScriptTransport::new(|req| {
            let mut resp = ok_response(req[1], &[]);
            resp[2] = 0x01;
            resp
        }));
        let xfer = ExchangeTransport::new(raw.clone());

        let err = xfer.exchange(cmd::SET_NKRO, &[1], 20).await.unwrap_err();
        assert!(matches!(
            err,
            TransportError::CommandFailed {
                opcode: cmd::SET_NKRO,
                status: 0x01
            }
        ));
        // a definitive device answer is not retried
        assert_eq!(raw.sent_count(), 1);
    }

    #[tokio::test]
    async fn echo_mismatch_exhausts_retry_budget() {
        let raw = Arc::new(ScriptTransport::new(|_| ok_response(0x7F, &[])));
        let xfer = ExchangeTransport::new(raw.clone());

        let err = xfer.exchange(cmd::GET_NKRO, &[], 3).await.unwrap_err();
        assert!(matches!(
            err,
            TransportError::RetriesExhausted {
                opcode: cmd::GET_NKRO
            }
        ));
        assert_eq!(raw.sent_count(), 3);
    }
}
