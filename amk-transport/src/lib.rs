//! Transport abstraction layer for AMK protocol keyboards
//!
//! This crate provides the wire-level half of the AMK host client:
//!
//! - `protocol`: frame layout, opcode table and timing constants
//! - `command`: typed request builders and response parsers
//! - `hid`: hidapi-backed transport (control frames + vendor bulk fast path)
//! - `exchange`: the single serialized exchange point with retry and
//!   status validation
//!
//! The device model and shadow caches live in the `amk-keyboard` crate.

pub mod command;
pub mod error;
pub mod protocol;
pub mod types;

mod exchange;
mod hid;

pub use command::{AmkCommand, AmkResponse, DateTime, ParseError};
pub use error::TransportError;
pub use exchange::ExchangeTransport;
pub use hid::{list_devices, HidTransport};
pub use types::{KeyPos, TransportDeviceInfo};

use async_trait::async_trait;
use std::sync::Arc;

/// The core transport trait — a duplex channel for fixed-size AMK frames
/// plus the secondary vendor bulk channel for fast chunked transfer.
///
/// Implementations do raw I/O only. Retries, echo matching and status
/// validation belong to [`ExchangeTransport`], which also serializes all
/// conversations — the underlying device cannot interleave frames.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Write one control-path request frame (`protocol::FRAME_SIZE` bytes)
    async fn write_frame(&self, frame: &[u8]) -> Result<(), TransportError>;

    /// Read one control-path response frame
    async fn read_frame(&self) -> Result<Vec<u8>, TransportError>;

    /// Write a batch of pre-built packets to the vendor bulk channel
    async fn write_bulk(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Read up to `max_len` bytes from the vendor bulk channel
    async fn read_bulk(&self, max_len: usize) -> Result<Vec<u8>, TransportError>;

    /// Get device information
    fn device_info(&self) -> &TransportDeviceInfo;

    /// Check if the transport is still connected
    async fn is_connected(&self) -> bool;

    /// Close the transport gracefully
    async fn close(&self) -> Result<(), TransportError>;
}

/// Type alias for a shared boxed transport
pub type BoxedTransport = Arc<dyn Transport>;
