//! Type-safe AMK command builders and response parsers
//!
//! Every logical device operation gets a small struct that knows its opcode
//! and payload layout. Responses parse from the payload bytes that follow
//! the `[prefix, echo, status]` response header, so parsing never sees the
//! status byte — the exchange layer has already checked it.

use crate::protocol::{self, cmd, file, timing};

// =============================================================================
// Core traits
// =============================================================================

/// A request that can be serialized into a control frame
pub trait AmkCommand {
    /// Opcode byte (byte 1 of the frame)
    const OPCODE: u8;

    /// Retry budget handed to the transport for this command
    const RETRIES: usize = timing::DEFAULT_RETRIES;

    /// Serialize the payload (excluding prefix and opcode)
    fn payload(&self) -> Vec<u8>;

    /// Build the complete zero-padded frame
    fn frame(&self) -> Vec<u8> {
        protocol::build_frame(Self::OPCODE, &self.payload())
    }
}

/// A response parsed from the payload after the status byte
pub trait AmkResponse: Sized {
    /// Minimum payload length required
    const MIN_PAYLOAD: usize;

    /// Parse from payload bytes (length already validated)
    fn from_payload(payload: &[u8]) -> Result<Self, ParseError>;

    /// Parse with length validation
    fn parse(payload: &[u8]) -> Result<Self, ParseError> {
        if payload.len() < Self::MIN_PAYLOAD {
            return Err(ParseError::TooShort {
                expected: Self::MIN_PAYLOAD,
                got: payload.len(),
            });
        }
        Self::from_payload(payload)
    }
}

/// Parse error for responses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    TooShort { expected: usize, got: usize },
    InvalidValue { field: &'static str, value: u8 },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooShort { expected, got } => {
                write!(f, "payload too short: expected {expected} bytes, got {got}")
            }
            Self::InvalidValue { field, value } => {
                write!(f, "invalid value for {field}: 0x{value:02X}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

// =============================================================================
// Version
// =============================================================================

/// GET_VERSION (0) — probe the AMK protocol revision.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetVersion;

impl AmkCommand for GetVersion {
    const OPCODE: u8 = cmd::GET_VERSION;
    fn payload(&self) -> Vec<u8> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VersionResponse {
    pub version: u8,
}

impl AmkResponse for VersionResponse {
    const MIN_PAYLOAD: usize = 1;
    fn from_payload(payload: &[u8]) -> Result<Self, ParseError> {
        Ok(Self {
            version: payload[0],
        })
    }
}

// =============================================================================
// APC / RT (per-key, profile-scoped)
// =============================================================================

/// GET_APC (1) — read one key's actuation point for a profile.
#[derive(Debug, Clone, Copy)]
pub struct GetApc {
    pub row: u8,
    pub col: u8,
    pub profile: u8,
}

impl AmkCommand for GetApc {
    const OPCODE: u8 = cmd::GET_APC;
    fn payload(&self) -> Vec<u8> {
        vec![self.row, self.col, self.profile]
    }
}

/// SET_APC (2) — `raw` is the wire value, already scaled for the
/// negotiated APC/RT encoding version.
#[derive(Debug, Clone, Copy)]
pub struct SetApc {
    pub row: u8,
    pub col: u8,
    pub profile: u8,
    pub raw: u16,
}

impl AmkCommand for SetApc {
    const OPCODE: u8 = cmd::SET_APC;
    fn payload(&self) -> Vec<u8> {
        let be = self.raw.to_be_bytes();
        vec![self.row, self.col, be[0], be[1], self.profile]
    }
}

/// GET_RT (3)
#[derive(Debug, Clone, Copy)]
pub struct GetRt {
    pub row: u8,
    pub col: u8,
    pub profile: u8,
}

impl AmkCommand for GetRt {
    const OPCODE: u8 = cmd::GET_RT;
    fn payload(&self) -> Vec<u8> {
        vec![self.row, self.col, self.profile]
    }
}

/// SET_RT (4) — `raw` is the packed rapid-trigger word.
#[derive(Debug, Clone, Copy)]
pub struct SetRt {
    pub row: u8,
    pub col: u8,
    pub profile: u8,
    pub raw: u16,
}

impl AmkCommand for SetRt {
    const OPCODE: u8 = cmd::SET_RT;
    fn payload(&self) -> Vec<u8> {
        let be = self.raw.to_be_bytes();
        vec![self.row, self.col, be[0], be[1], self.profile]
    }
}

/// Shared response shape for GET_APC / GET_RT: one big-endian u16.
#[derive(Debug, Clone, Copy)]
pub struct WordResponse {
    pub raw: u16,
}

impl AmkResponse for WordResponse {
    const MIN_PAYLOAD: usize = 2;
    fn from_payload(payload: &[u8]) -> Result<Self, ParseError> {
        Ok(Self {
            raw: u16::from_be_bytes([payload[0], payload[1]]),
        })
    }
}

// =============================================================================
// DKS
// =============================================================================

/// Packed DKS table length: 4 event bytes + 4 big-endian keycodes.
pub const DKS_DATA_LEN: usize = 12;

/// GET_DKS (5)
#[derive(Debug, Clone, Copy)]
pub struct GetDks {
    pub row: u8,
    pub col: u8,
}

impl AmkCommand for GetDks {
    const OPCODE: u8 = cmd::GET_DKS;
    fn payload(&self) -> Vec<u8> {
        vec![self.row, self.col]
    }
}

/// SET_DKS (6)
#[derive(Debug, Clone, Copy)]
pub struct SetDks {
    pub row: u8,
    pub col: u8,
    pub table: [u8; DKS_DATA_LEN],
}

impl AmkCommand for SetDks {
    const OPCODE: u8 = cmd::SET_DKS;
    fn payload(&self) -> Vec<u8> {
        let mut data = vec![self.row, self.col];
        data.extend_from_slice(&self.table);
        data
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DksResponse {
    pub table: [u8; DKS_DATA_LEN],
}

impl AmkResponse for DksResponse {
    const MIN_PAYLOAD: usize = DKS_DATA_LEN;
    fn from_payload(payload: &[u8]) -> Result<Self, ParseError> {
        let mut table = [0u8; DKS_DATA_LEN];
        table.copy_from_slice(&payload[..DKS_DATA_LEN]);
        Ok(Self { table })
    }
}

// =============================================================================
// RGB strips
// =============================================================================

/// GET_RGB_STRIP_PARAM (28)
#[derive(Debug, Clone, Copy)]
pub struct GetStripParam {
    pub index: u8,
}

impl AmkCommand for GetStripParam {
    const OPCODE: u8 = cmd::GET_RGB_STRIP_PARAM;
    const RETRIES: usize = timing::QUERY_RETRIES;
    fn payload(&self) -> Vec<u8> {
        vec![self.index]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StripParamResponse {
    pub index: u8,
    pub config: u8,
    /// Start offset into the flat LED address space
    pub start: u8,
    pub count: u8,
}

impl AmkResponse for StripParamResponse {
    const MIN_PAYLOAD: usize = 4;
    fn from_payload(payload: &[u8]) -> Result<Self, ParseError> {
        Ok(Self {
            index: payload[0],
            config: payload[1],
            start: payload[2],
            count: payload[3],
        })
    }
}

/// GET_RGB_STRIP_LED (29) / GET_RGB_MATRIX_LED (35) response:
/// `[index, hue, sat, val, param]`.
#[derive(Debug, Clone, Copy)]
pub struct LedResponse {
    pub index: u8,
    pub hue: u8,
    pub sat: u8,
    pub val: u8,
    pub param: u8,
}

impl AmkResponse for LedResponse {
    const MIN_PAYLOAD: usize = 5;
    fn from_payload(payload: &[u8]) -> Result<Self, ParseError> {
        Ok(Self {
            index: payload[0],
            hue: payload[1],
            sat: payload[2],
            val: payload[3],
            param: payload[4],
        })
    }
}

/// GET_RGB_STRIP_LED (29) — `index` is absolute in the flat LED space.
#[derive(Debug, Clone, Copy)]
pub struct GetStripLed {
    pub index: u8,
}

impl AmkCommand for GetStripLed {
    const OPCODE: u8 = cmd::GET_RGB_STRIP_LED;
    const RETRIES: usize = timing::QUERY_RETRIES;
    fn payload(&self) -> Vec<u8> {
        vec![self.index]
    }
}

/// SET_RGB_STRIP_LED (30)
#[derive(Debug, Clone, Copy)]
pub struct SetStripLed {
    pub index: u8,
    pub hue: u8,
    pub sat: u8,
    pub val: u8,
    pub param: u8,
}

impl AmkCommand for SetStripLed {
    const OPCODE: u8 = cmd::SET_RGB_STRIP_LED;
    fn payload(&self) -> Vec<u8> {
        vec![self.index, self.hue, self.sat, self.val, self.param]
    }
}

/// GET_RGB_STRIP_MODE (31)
#[derive(Debug, Clone, Copy)]
pub struct GetStripMode {
    pub index: u8,
}

impl AmkCommand for GetStripMode {
    const OPCODE: u8 = cmd::GET_RGB_STRIP_MODE;
    const RETRIES: usize = timing::QUERY_RETRIES;
    fn payload(&self) -> Vec<u8> {
        vec![self.index]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StripModeResponse {
    pub index: u8,
    pub mode: u8,
}

impl AmkResponse for StripModeResponse {
    const MIN_PAYLOAD: usize = 2;
    fn from_payload(payload: &[u8]) -> Result<Self, ParseError> {
        Ok(Self {
            index: payload[0],
            mode: payload[1],
        })
    }
}

/// SET_RGB_STRIP_MODE (32)
#[derive(Debug, Clone, Copy)]
pub struct SetStripMode {
    pub index: u8,
    pub mode: u8,
}

impl AmkCommand for SetStripMode {
    const OPCODE: u8 = cmd::SET_RGB_STRIP_MODE;
    fn payload(&self) -> Vec<u8> {
        vec![self.index, self.mode]
    }
}

// =============================================================================
// RGB matrix
// =============================================================================

/// GET_RGB_MATRIX_INFO (33)
#[derive(Debug, Clone, Copy, Default)]
pub struct GetMatrixInfo;

impl AmkCommand for GetMatrixInfo {
    const OPCODE: u8 = cmd::GET_RGB_MATRIX_INFO;
    const RETRIES: usize = timing::QUERY_RETRIES;
    fn payload(&self) -> Vec<u8> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MatrixInfoResponse {
    pub start: u8,
    pub count: u8,
}

impl AmkResponse for MatrixInfoResponse {
    const MIN_PAYLOAD: usize = 2;
    fn from_payload(payload: &[u8]) -> Result<Self, ParseError> {
        Ok(Self {
            start: payload[0],
            count: payload[1],
        })
    }
}

/// Row-info entry value meaning "this position has no LED".
pub const MATRIX_NO_LED: u8 = 0xFF;

/// GET_RGB_MATRIX_ROW_INFO (34) — per-row `col -> absolute index` table.
#[derive(Debug, Clone, Copy)]
pub struct GetMatrixRowInfo {
    pub row: u8,
}

impl AmkCommand for GetMatrixRowInfo {
    const OPCODE: u8 = cmd::GET_RGB_MATRIX_ROW_INFO;
    const RETRIES: usize = timing::QUERY_RETRIES;
    fn payload(&self) -> Vec<u8> {
        vec![self.row]
    }
}

/// Response: `[row, count, index per column...]`, 0xFF for unlit positions.
#[derive(Debug, Clone)]
pub struct MatrixRowResponse {
    pub row: u8,
    pub indices: Vec<u8>,
}

impl AmkResponse for MatrixRowResponse {
    const MIN_PAYLOAD: usize = 2;
    fn from_payload(payload: &[u8]) -> Result<Self, ParseError> {
        let count = payload[1] as usize;
        if payload.len() < 2 + count {
            return Err(ParseError::TooShort {
                expected: 2 + count,
                got: payload.len(),
            });
        }
        Ok(Self {
            row: payload[0],
            indices: payload[2..2 + count].to_vec(),
        })
    }
}

/// GET_RGB_MATRIX_LED (35)
#[derive(Debug, Clone, Copy)]
pub struct GetMatrixLed {
    pub index: u8,
}

impl AmkCommand for GetMatrixLed {
    const OPCODE: u8 = cmd::GET_RGB_MATRIX_LED;
    const RETRIES: usize = timing::QUERY_RETRIES;
    fn payload(&self) -> Vec<u8> {
        vec![self.index]
    }
}

/// SET_RGB_MATRIX_LED (36)
#[derive(Debug, Clone, Copy)]
pub struct SetMatrixLed {
    pub index: u8,
    pub hue: u8,
    pub sat: u8,
    pub val: u8,
    pub param: u8,
}

impl AmkCommand for SetMatrixLed {
    const OPCODE: u8 = cmd::SET_RGB_MATRIX_LED;
    fn payload(&self) -> Vec<u8> {
        vec![self.index, self.hue, self.sat, self.val, self.param]
    }
}

// =============================================================================
// RGB indicators
// =============================================================================

/// GET_RGB_INDICATOR_LED (37) — `which` is the indicator id (num lock, ...).
#[derive(Debug, Clone, Copy)]
pub struct GetIndicatorLed {
    pub which: u8,
}

impl AmkCommand for GetIndicatorLed {
    const OPCODE: u8 = cmd::GET_RGB_INDICATOR_LED;
    const RETRIES: usize = timing::QUERY_RETRIES;
    fn payload(&self) -> Vec<u8> {
        vec![self.which]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IndicatorResponse {
    pub which: u8,
    /// Absolute index of the indicator's LED
    pub led_index: u8,
    pub hue: u8,
    pub sat: u8,
    pub val: u8,
    pub param: u8,
}

impl AmkResponse for IndicatorResponse {
    const MIN_PAYLOAD: usize = 6;
    fn from_payload(payload: &[u8]) -> Result<Self, ParseError> {
        Ok(Self {
            which: payload[0],
            led_index: payload[1],
            hue: payload[2],
            sat: payload[3],
            val: payload[4],
            param: payload[5],
        })
    }
}

/// SET_RGB_INDICATOR_LED (38)
#[derive(Debug, Clone, Copy)]
pub struct SetIndicatorLed {
    pub which: u8,
    pub led_index: u8,
    pub hue: u8,
    pub sat: u8,
    pub val: u8,
    pub param: u8,
}

impl AmkCommand for SetIndicatorLed {
    const OPCODE: u8 = cmd::SET_RGB_INDICATOR_LED;
    fn payload(&self) -> Vec<u8> {
        vec![
            self.which,
            self.led_index,
            self.hue,
            self.sat,
            self.val,
            self.param,
        ]
    }
}

// =============================================================================
// Snaptap
// =============================================================================

/// GET_SNAPTAP (40)
#[derive(Debug, Clone, Copy)]
pub struct GetSnaptap {
    pub index: u8,
}

impl AmkCommand for GetSnaptap {
    const OPCODE: u8 = cmd::GET_SNAPTAP;
    const RETRIES: usize = timing::QUERY_RETRIES;
    fn payload(&self) -> Vec<u8> {
        vec![self.index]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SnaptapResponse {
    pub index: u8,
    pub first_row: u8,
    pub first_col: u8,
    pub second_row: u8,
    pub second_col: u8,
    pub mode: u8,
}

impl AmkResponse for SnaptapResponse {
    const MIN_PAYLOAD: usize = 6;
    fn from_payload(payload: &[u8]) -> Result<Self, ParseError> {
        Ok(Self {
            index: payload[0],
            first_row: payload[1],
            first_col: payload[2],
            second_row: payload[3],
            second_col: payload[4],
            mode: payload[5],
        })
    }
}

/// SET_SNAPTAP (41)
#[derive(Debug, Clone, Copy)]
pub struct SetSnaptap {
    pub index: u8,
    pub first_row: u8,
    pub first_col: u8,
    pub second_row: u8,
    pub second_col: u8,
    pub mode: u8,
}

impl AmkCommand for SetSnaptap {
    const OPCODE: u8 = cmd::SET_SNAPTAP;
    fn payload(&self) -> Vec<u8> {
        vec![
            self.index,
            self.first_row,
            self.first_col,
            self.second_row,
            self.second_col,
            self.mode,
        ]
    }
}

// =============================================================================
// Remote file system
// =============================================================================

/// GET_FILE_SYSTEM_INFO (42)
#[derive(Debug, Clone, Copy, Default)]
pub struct GetFileSystemInfo;

impl AmkCommand for GetFileSystemInfo {
    const OPCODE: u8 = cmd::GET_FILE_SYSTEM_INFO;
    fn payload(&self) -> Vec<u8> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FileSystemInfoResponse {
    pub total_file: u8,
    pub free_space: u32,
    pub total_space: u32,
}

impl AmkResponse for FileSystemInfoResponse {
    const MIN_PAYLOAD: usize = 9;
    fn from_payload(p: &[u8]) -> Result<Self, ParseError> {
        Ok(Self {
            total_file: p[0],
            free_space: u32::from_le_bytes([p[1], p[2], p[3], p[4]]),
            total_space: u32::from_le_bytes([p[5], p[6], p[7], p[8]]),
        })
    }
}

/// GET_FILE_INFO (43) — directory entry by slot index.
#[derive(Debug, Clone, Copy)]
pub struct GetFileInfo {
    pub index: u8,
}

impl AmkCommand for GetFileInfo {
    const OPCODE: u8 = cmd::GET_FILE_INFO;
    fn payload(&self) -> Vec<u8> {
        vec![self.index]
    }
}

/// Response: `[index, name (13 bytes, NUL-padded), size u32 LE]`.
#[derive(Debug, Clone)]
pub struct FileInfoResponse {
    pub index: u8,
    pub name: String,
    pub size: u32,
}

impl AmkResponse for FileInfoResponse {
    const MIN_PAYLOAD: usize = 1 + file::NAME_MAX + 4;
    fn from_payload(p: &[u8]) -> Result<Self, ParseError> {
        let raw = &p[1..1 + file::NAME_MAX];
        let end = raw.iter().position(|&b| b == 0).unwrap_or(file::NAME_MAX);
        let name = std::str::from_utf8(&raw[..end])
            .map_err(|_| ParseError::InvalidValue {
                field: "file name",
                value: raw[0],
            })?
            .to_string();
        let off = 1 + file::NAME_MAX;
        Ok(Self {
            index: p[0],
            name,
            size: u32::from_le_bytes([p[off], p[off + 1], p[off + 2], p[off + 3]]),
        })
    }
}

/// OPEN_FILE (44) — `slot` is an existing index for reads or
/// `file::SLOT_AUTO` to let the device allocate one.
#[derive(Debug, Clone)]
pub struct OpenFile {
    pub slot: u8,
    pub for_read: bool,
    pub name: String,
}

impl AmkCommand for OpenFile {
    const OPCODE: u8 = cmd::OPEN_FILE;
    fn payload(&self) -> Vec<u8> {
        let mut data = vec![self.slot, u8::from(self.for_read)];
        let mut name = [0u8; file::NAME_MAX];
        let bytes = self.name.as_bytes();
        let len = bytes.len().min(file::NAME_MAX);
        name[..len].copy_from_slice(&bytes[..len]);
        data.extend_from_slice(&name);
        data
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OpenFileResponse {
    pub handle: u8,
}

impl AmkResponse for OpenFileResponse {
    const MIN_PAYLOAD: usize = 1;
    fn from_payload(payload: &[u8]) -> Result<Self, ParseError> {
        Ok(Self {
            handle: payload[0],
        })
    }
}

/// WRITE_FILE (45) — one chunk at an explicit byte offset.
#[derive(Debug, Clone)]
pub struct WriteFile {
    pub handle: u8,
    pub offset: u32,
    pub data: Vec<u8>,
}

impl AmkCommand for WriteFile {
    const OPCODE: u8 = cmd::WRITE_FILE;
    fn payload(&self) -> Vec<u8> {
        let mut data = vec![self.handle, self.data.len() as u8];
        data.extend_from_slice(&self.offset.to_le_bytes());
        data.extend_from_slice(&self.data);
        data
    }
}

impl WriteFile {
    /// Build the 64-byte vendor bulk packet for the fast path.
    ///
    /// Same layout as the control frame, zero-padded to the bulk size; the
    /// data must not exceed `file::FAST_CHUNK_SIZE`.
    pub fn bulk_frame(&self) -> Vec<u8> {
        let mut buf = vec![0u8; protocol::BULK_FRAME_SIZE];
        buf[0] = protocol::PREFIX;
        buf[1] = Self::OPCODE;
        buf[2] = self.handle;
        buf[3] = self.data.len() as u8;
        buf[4..8].copy_from_slice(&self.offset.to_le_bytes());
        let len = self.data.len().min(file::FAST_CHUNK_SIZE);
        buf[8..8 + len].copy_from_slice(&self.data[..len]);
        buf
    }
}

/// READ_FILE (46)
#[derive(Debug, Clone, Copy)]
pub struct ReadFile {
    pub handle: u8,
    pub size: u8,
    pub offset: u32,
}

impl AmkCommand for ReadFile {
    const OPCODE: u8 = cmd::READ_FILE;
    fn payload(&self) -> Vec<u8> {
        let mut data = vec![self.handle, self.size];
        data.extend_from_slice(&self.offset.to_le_bytes());
        data
    }
}

/// Response: `[size, data...]` — `size` may be less than requested at
/// end of stream, including zero.
#[derive(Debug, Clone)]
pub struct ReadFileResponse {
    pub data: Vec<u8>,
}

impl AmkResponse for ReadFileResponse {
    const MIN_PAYLOAD: usize = 1;
    fn from_payload(payload: &[u8]) -> Result<Self, ParseError> {
        let size = payload[0] as usize;
        if payload.len() < 1 + size {
            return Err(ParseError::TooShort {
                expected: 1 + size,
                got: payload.len(),
            });
        }
        Ok(Self {
            data: payload[1..1 + size].to_vec(),
        })
    }
}

/// CLOSE_FILE (47)
#[derive(Debug, Clone, Copy)]
pub struct CloseFile {
    pub handle: u8,
}

impl AmkCommand for CloseFile {
    const OPCODE: u8 = cmd::CLOSE_FILE;
    fn payload(&self) -> Vec<u8> {
        vec![self.handle]
    }
}

/// DELETE_FILE (48) — by directory index, independent of open state.
#[derive(Debug, Clone, Copy)]
pub struct DeleteFile {
    pub index: u8,
}

impl AmkCommand for DeleteFile {
    const OPCODE: u8 = cmd::DELETE_FILE;
    fn payload(&self) -> Vec<u8> {
        vec![self.index]
    }
}

/// DISPLAY_CONTROL (49) — pause/resume the on-device animation renderer.
#[derive(Debug, Clone, Copy)]
pub struct DisplayControl {
    pub on: bool,
}

impl AmkCommand for DisplayControl {
    const OPCODE: u8 = cmd::DISPLAY_CONTROL;
    fn payload(&self) -> Vec<u8> {
        vec![u8::from(self.on)]
    }
}

// =============================================================================
// Date/time
// =============================================================================

/// Wall-clock value for SET_DATETIME; supplied by the caller, the codec
/// has no clock dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    /// 0 = Monday .. 6 = Sunday
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// SET_DATETIME (50)
#[derive(Debug, Clone, Copy)]
pub struct SetDateTime {
    pub datetime: DateTime,
}

impl AmkCommand for SetDateTime {
    const OPCODE: u8 = cmd::SET_DATETIME;
    fn payload(&self) -> Vec<u8> {
        let dt = &self.datetime;
        let year = dt.year.to_be_bytes();
        vec![
            year[0], year[1], dt.month, dt.day, dt.weekday, dt.hour, dt.minute, dt.second,
        ]
    }
}
