//! Animation container codec
//!
//! Pure encode/decode of the on-disk/on-wire animation format: a fixed
//! little-endian header, a per-frame delay table, then RGB565 big-endian
//! pixel data per frame. No I/O happens here — the remote file protocol
//! in `filesystem` moves the encoded bytes.

use thiserror::Error;
use zerocopy::byteorder::little_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Container header, all multi-byte fields little-endian.
#[derive(Debug, Clone, Copy, IntoBytes, FromBytes, KnownLayout, Immutable)]
#[repr(C)]
struct ContainerHeader {
    magic: [u8; 4],
    header_size: U16,
    frame_data_offset: U16,
    file_size: U32,
    width: U16,
    height: U16,
    bytes_per_pixel: U16,
    frame_count: U16,
}

/// Size of the container header on the wire.
pub const HEADER_SIZE: usize = std::mem::size_of::<ContainerHeader>();

/// Bytes per RGB565 pixel.
const BYTES_PER_PIXEL: usize = 2;

/// Known device display targets, keyed by `(magic, width, height)`.
///
/// A container whose header does not match one of these is rejected
/// before anything touches the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimFormat {
    /// Main display, 80×80
    Anim80,
    /// Main display, 60×60
    Anim60,
    /// Main display, 128×128
    Anim128,
    /// Auxiliary display, 80×30
    Auxi,
    /// Font tile strip, 10×30
    Amft,
    /// Status bar, 80×30
    Asts,
    /// Background, 160×80
    Abkg160,
    /// Background, 240×120
    Abkg240,
}

impl AnimFormat {
    pub const ALL: [AnimFormat; 8] = [
        AnimFormat::Anim80,
        AnimFormat::Anim60,
        AnimFormat::Anim128,
        AnimFormat::Auxi,
        AnimFormat::Amft,
        AnimFormat::Asts,
        AnimFormat::Abkg160,
        AnimFormat::Abkg240,
    ];

    pub const fn magic(self) -> [u8; 4] {
        match self {
            Self::Anim80 | Self::Anim60 | Self::Anim128 => *b"ANIM",
            Self::Auxi => *b"AUXI",
            Self::Amft => *b"AMFT",
            Self::Asts => *b"ASTS",
            Self::Abkg160 | Self::Abkg240 => *b"ABKG",
        }
    }

    pub const fn width(self) -> u16 {
        match self {
            Self::Anim80 => 80,
            Self::Anim60 => 60,
            Self::Anim128 => 128,
            Self::Auxi => 80,
            Self::Amft => 10,
            Self::Asts => 80,
            Self::Abkg160 => 160,
            Self::Abkg240 => 240,
        }
    }

    pub const fn height(self) -> u16 {
        match self {
            Self::Anim80 => 80,
            Self::Anim60 => 60,
            Self::Anim128 => 128,
            Self::Auxi => 30,
            Self::Amft => 30,
            Self::Asts => 30,
            Self::Abkg160 => 80,
            Self::Abkg240 => 120,
        }
    }

    /// File suffix used on the device file system.
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Anim80 => ".ANM",
            Self::Anim60 => ".SML",
            Self::Anim128 => ".CRS",
            Self::Auxi => ".AUX",
            Self::Amft => ".AMF",
            Self::Asts => ".STS",
            Self::Abkg160 | Self::Abkg240 => ".BKG",
        }
    }

    /// Pixel bytes per frame.
    pub const fn frame_bytes(self) -> usize {
        self.width() as usize * self.height() as usize * BYTES_PER_PIXEL
    }

    /// Look up the display target for a decoded header.
    pub fn from_header(magic: [u8; 4], width: u16, height: u16) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.magic() == magic && f.width() == width && f.height() == height)
    }
}

/// One animation frame: RGB565 big-endian pixels plus its display delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub pixels: Vec<u8>,
    pub delay_ms: u16,
}

impl Frame {
    /// Convert packed RGB888 pixels to an RGB565 big-endian frame.
    pub fn from_rgb888(rgb: &[u8], delay_ms: u16) -> Self {
        let mut pixels = Vec::with_capacity(rgb.len() / 3 * 2);
        for px in rgb.chunks_exact(3) {
            let word = ((px[0] as u16 >> 3) << 11) | ((px[1] as u16 >> 2) << 5) | (px[2] as u16 >> 3);
            pixels.extend_from_slice(&word.to_be_bytes());
        }
        Self { pixels, delay_ms }
    }
}

/// Container validation failures — rejected locally, no frame is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContainerError {
    #[error("container truncated: need {expected} bytes, have {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("unknown display format: magic {magic:?}, {width}x{height}")]
    UnknownFormat {
        magic: [u8; 4],
        width: u16,
        height: u16,
    },

    #[error("frame {index} has {actual} pixel bytes, format needs {expected}")]
    FrameSize {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("animation has no frames")]
    Empty,
}

/// Total container size for a frame count — used by the free-space
/// admission check before an upload starts.
pub fn required_bytes(format: AnimFormat, frame_count: usize) -> u32 {
    (HEADER_SIZE + 2 * frame_count + frame_count * format.frame_bytes()) as u32
}

/// Encode frames into a complete container.
pub fn encode(format: AnimFormat, frames: &[Frame]) -> Result<Vec<u8>, ContainerError> {
    if frames.is_empty() {
        return Err(ContainerError::Empty);
    }
    for (index, frame) in frames.iter().enumerate() {
        if frame.pixels.len() != format.frame_bytes() {
            return Err(ContainerError::FrameSize {
                index,
                expected: format.frame_bytes(),
                actual: frame.pixels.len(),
            });
        }
    }

    let count = frames.len();
    let frame_data_offset = HEADER_SIZE + 2 * count;
    let file_size = frame_data_offset + count * format.frame_bytes();

    let header = ContainerHeader {
        magic: format.magic(),
        header_size: U16::new(HEADER_SIZE as u16),
        frame_data_offset: U16::new(frame_data_offset as u16),
        file_size: U32::new(file_size as u32),
        width: U16::new(format.width()),
        height: U16::new(format.height()),
        bytes_per_pixel: U16::new(BYTES_PER_PIXEL as u16),
        frame_count: U16::new(count as u16),
    };

    let mut data = Vec::with_capacity(file_size);
    data.extend_from_slice(header.as_bytes());
    for frame in frames {
        data.extend_from_slice(&frame.delay_ms.to_le_bytes());
    }
    for frame in frames {
        data.extend_from_slice(&frame.pixels);
    }
    Ok(data)
}

/// Decode a container, rejecting anything that does not match a known
/// display target or whose declared tables overrun the data.
pub fn decode(data: &[u8]) -> Result<(AnimFormat, Vec<Frame>), ContainerError> {
    if data.len() < HEADER_SIZE {
        return Err(ContainerError::Truncated {
            expected: HEADER_SIZE,
            actual: data.len(),
        });
    }
    let header = ContainerHeader::read_from_bytes(&data[..HEADER_SIZE]).map_err(|_| {
        ContainerError::Truncated {
            expected: HEADER_SIZE,
            actual: data.len(),
        }
    })?;

    let width = header.width.get();
    let height = header.height.get();
    let format = AnimFormat::from_header(header.magic, width, height).ok_or(
        ContainerError::UnknownFormat {
            magic: header.magic,
            width,
            height,
        },
    )?;
    if header.bytes_per_pixel.get() as usize != BYTES_PER_PIXEL {
        return Err(ContainerError::UnknownFormat {
            magic: header.magic,
            width,
            height,
        });
    }

    let count = header.frame_count.get() as usize;
    let frame_data_offset = header.frame_data_offset.get() as usize;
    if frame_data_offset < HEADER_SIZE + 2 * count {
        return Err(ContainerError::Truncated {
            expected: HEADER_SIZE + 2 * count,
            actual: frame_data_offset,
        });
    }
    let expected_total = frame_data_offset + count * format.frame_bytes();
    if data.len() < expected_total {
        return Err(ContainerError::Truncated {
            expected: expected_total,
            actual: data.len(),
        });
    }

    let mut frames = Vec::with_capacity(count);
    for i in 0..count {
        let delay_at = HEADER_SIZE + 2 * i;
        let delay_ms = u16::from_le_bytes([data[delay_at], data[delay_at + 1]]);
        let start = frame_data_offset + i * format.frame_bytes();
        frames.push(Frame {
            pixels: data[start..start + format.frame_bytes()].to_vec(),
            delay_ms,
        });
    }
    Ok((format, frames))
}

/// Characters not allowed in device file names.
const INVALID_NAME_CHARS: &[char] = &[
    '.', '"', '/', '\\', '[', ']', ':', ';', '=', ',', ' ',
];

/// Sanitize a file stem for the device directory: strip invalid
/// characters, truncate to 6, append `~1` when anything was stripped or
/// truncated, and upper-case the result.
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name.chars().filter(|c| !INVALID_NAME_CHARS.contains(c)).collect();
    let mut tilde = cleaned.chars().count() != name.chars().count();

    let mut stem: String = cleaned.chars().take(6).collect();
    if cleaned.chars().count() > 6 {
        tilde = true;
    }
    if tilde {
        stem.push_str("~1");
    }
    stem.to_uppercase()
}

/// Full device file name for an upload: sanitized stem plus the format's
/// fixed suffix. Always fits the 13-byte directory entry.
pub fn device_file_name(stem: &str, format: AnimFormat) -> String {
    let mut name = sanitize_name(stem);
    name.push_str(format.suffix());
    name
}
