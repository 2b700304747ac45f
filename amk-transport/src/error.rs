//! Transport error types

use thiserror::Error;

use crate::command::ParseError;

/// Errors that can occur during transport operations
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// Fatal: the device went away mid-conversation. Cached device state
    /// derived from earlier exchanges must be reloaded on reconnect.
    #[error("device disconnected")]
    Disconnected,

    #[error("retries exhausted for {}", crate::protocol::cmd::name(*.opcode))]
    RetriesExhausted { opcode: u8 },

    /// The device answered with a non-OK status byte. The command failed;
    /// no cache may be updated from this exchange.
    #[error("command {} failed with status 0x{:02X}", crate::protocol::cmd::name(*.opcode), .status)]
    CommandFailed { opcode: u8, status: u8 },

    #[error("malformed response: {0}")]
    Malformed(#[from] ParseError),

    #[error("bulk channel unavailable on this device")]
    NoBulkChannel,

    // HID-specific errors
    #[error("HID error: {0}")]
    Hid(String),

    #[error("HID permission denied: {0}")]
    HidPermissionDenied(String),
}

impl From<hidapi::HidError> for TransportError {
    fn from(e: hidapi::HidError) -> Self {
        let msg = e.to_string();
        if msg.contains("Permission denied") || msg.contains("EPERM") {
            TransportError::HidPermissionDenied(msg)
        } else {
            TransportError::Hid(msg)
        }
    }
}
