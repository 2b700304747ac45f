//! Keyboard interface error types

use amk_transport::TransportError;
use thiserror::Error;

use crate::animation::ContainerError;

/// Errors from keyboard operations
#[derive(Error, Debug)]
pub enum KeyboardError {
    /// Transport layer error (retries exhausted, status failure, disconnect)
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Animation container rejected before any frame was sent
    #[error("animation container error: {0}")]
    Container(#[from] ContainerError),

    /// Invalid parameter value
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Device file name does not fit the 13-byte directory entry
    #[error("file name too long: {0:?}")]
    NameTooLong(String),

    /// Client-side free-space admission check failed; nothing was sent
    #[error("not enough space on device: need {required} bytes, {free} free")]
    InsufficientSpace { required: u32, free: u32 },

    /// OPEN_FILE returned the no-handle sentinel
    #[error("device has no free file handle (or file not found)")]
    NoFreeHandle,

    /// Key position has no LED in the RGB matrix mapping
    #[error("no LED mapped at ({row},{col})")]
    NoLedMapping { row: u8, col: u8 },

    /// Transfer aborted via its cancel token between chunks
    #[error("transfer cancelled")]
    Cancelled,
}

impl KeyboardError {
    /// True for errors that invalidate cached device state (free space,
    /// directory listing) and require a reload on reconnect.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Transport(TransportError::Disconnected))
    }
}
