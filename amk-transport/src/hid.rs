//! HID transport implementation for direct USB connection
//!
//! Control frames travel as feature reports on the configuration
//! interface; the fast path writes output reports to the vendor bulk
//! interface when the device exposes one.

use std::ffi::CString;

use async_trait::async_trait;
use hidapi::{HidApi, HidDevice};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::TransportError;
use crate::protocol::{BULK_FRAME_SIZE, FRAME_SIZE};
use crate::types::TransportDeviceInfo;
use crate::Transport;

/// Usage page / usage of the configuration interface
pub const USAGE_PAGE_CONFIG: u16 = 0xFF60;
pub const USAGE_CONFIG: u16 = 0x61;

/// Usage page of the vendor bulk (fast path) interface
pub const USAGE_PAGE_VENDOR: u16 = 0xFF00;

/// Read timeout for the bulk channel (ms)
const BULK_READ_TIMEOUT_MS: i32 = 500;

/// List configuration interfaces of connected AMK keyboards.
///
/// Filters by the configuration usage page/usage; `has_bulk` is set when
/// the same device also exposes a vendor bulk interface.
pub fn list_devices() -> Result<Vec<TransportDeviceInfo>, TransportError> {
    let api = HidApi::new()?;
    let mut found = Vec::new();

    for dev in api.device_list() {
        if dev.usage_page() != USAGE_PAGE_CONFIG || dev.usage() != USAGE_CONFIG {
            continue;
        }
        let has_bulk = api.device_list().any(|v| {
            v.vendor_id() == dev.vendor_id()
                && v.product_id() == dev.product_id()
                && v.usage_page() == USAGE_PAGE_VENDOR
        });
        found.push(TransportDeviceInfo {
            vid: dev.vendor_id(),
            pid: dev.product_id(),
            device_path: dev.path().to_string_lossy().into_owned(),
            serial: dev.serial_number().map(str::to_string),
            product_name: dev.product_string().map(str::to_string),
            has_bulk,
        });
    }

    debug!("found {} AMK configuration interface(s)", found.len());
    Ok(found)
}

/// HID transport for a wired USB connection
pub struct HidTransport {
    /// Configuration interface for control frames
    config: Mutex<HidDevice>,
    /// Vendor bulk interface for the fast path, if present
    vendor: Option<Mutex<HidDevice>>,
    info: TransportDeviceInfo,
}

impl HidTransport {
    /// Open the device described by a [`list_devices`] entry.
    pub fn open(info: &TransportDeviceInfo) -> Result<Self, TransportError> {
        let api = HidApi::new()?;

        let path = CString::new(info.device_path.as_bytes())
            .map_err(|_| TransportError::DeviceNotFound(info.device_path.clone()))?;
        let config = api.open_path(&path)?;

        let vendor = if info.has_bulk {
            let vendor_path = api
                .device_list()
                .find(|d| {
                    d.vendor_id() == info.vid
                        && d.product_id() == info.pid
                        && d.usage_page() == USAGE_PAGE_VENDOR
                })
                .map(|d| d.path().to_owned());
            match vendor_path {
                Some(p) => {
                    let dev = api.open_path(&p)?;
                    debug!("vendor bulk interface opened for {:04X}:{:04X}", info.vid, info.pid);
                    Some(Mutex::new(dev))
                }
                None => None,
            }
        } else {
            None
        };

        Ok(Self {
            config: Mutex::new(config),
            vendor,
            info: info.clone(),
        })
    }
}

#[async_trait]
impl Transport for HidTransport {
    async fn write_frame(&self, frame: &[u8]) -> Result<(), TransportError> {
        debug!("frame out: {:02X?}", &frame[..8.min(frame.len())]);
        let mut buf = Vec::with_capacity(frame.len() + 1);
        buf.push(0); // report ID
        buf.extend_from_slice(frame);
        let device = self.config.lock();
        device.send_feature_report(&buf)?;
        Ok(())
    }

    async fn read_frame(&self) -> Result<Vec<u8>, TransportError> {
        let device = self.config.lock();
        let mut buf = vec![0u8; FRAME_SIZE + 1];
        buf[0] = 0;
        device.get_feature_report(&mut buf)?;
        debug!("frame in: {:02X?}", &buf[1..9]);
        Ok(buf[1..].to_vec())
    }

    async fn write_bulk(&self, data: &[u8]) -> Result<(), TransportError> {
        let vendor = self.vendor.as_ref().ok_or(TransportError::NoBulkChannel)?;
        let device = vendor.lock();
        for packet in data.chunks(BULK_FRAME_SIZE) {
            let mut buf = vec![0u8; BULK_FRAME_SIZE + 1];
            buf[0] = 0; // report ID
            buf[1..1 + packet.len()].copy_from_slice(packet);
            device.write(&buf)?;
        }
        Ok(())
    }

    async fn read_bulk(&self, max_len: usize) -> Result<Vec<u8>, TransportError> {
        let vendor = self.vendor.as_ref().ok_or(TransportError::NoBulkChannel)?;
        let device = vendor.lock();
        let mut buf = vec![0u8; max_len.max(BULK_FRAME_SIZE)];
        let n = device.read_timeout(&mut buf, BULK_READ_TIMEOUT_MS)?;
        buf.truncate(n);
        Ok(buf)
    }

    fn device_info(&self) -> &TransportDeviceInfo {
        &self.info
    }

    async fn is_connected(&self) -> bool {
        self.config.lock().get_product_string().is_ok()
    }

    async fn close(&self) -> Result<(), TransportError> {
        // HidDevice closes on drop
        Ok(())
    }
}
