//! Remote file system access for animation assets
//!
//! The device exposes a small directory of animation files behind a
//! handle-based open/write/read/close/delete protocol, multiplexed over
//! the same exchange channel as every other command. A session runs
//! `CLOSED -> OPEN -> CLOSED`; any chunk failure aborts the transfer but
//! the handle is still closed best-effort.
//!
//! The device renders animations from the same storage it serves — every
//! file-system mutation (open/write/delete) must run with the display
//! paused via DISPLAY_CONTROL, and resumed afterward.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use amk_transport::command::{
    CloseFile, DeleteFile, DisplayControl, FileInfoResponse, FileSystemInfoResponse, GetFileInfo,
    GetFileSystemInfo, OpenFile, OpenFileResponse, ReadFile, ReadFileResponse, WriteFile,
};
use amk_transport::protocol::{file, timing, BULK_BATCH_FRAMES};

use crate::animation::{self, AnimFormat, Frame};
use crate::error::KeyboardError;
use crate::AmkKeyboard;

/// Disk summary reported by GET_FILE_SYSTEM_INFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSystemInfo {
    pub total_file: u8,
    pub free_space: u32,
    pub total_space: u32,
}

impl From<FileSystemInfoResponse> for FileSystemInfo {
    fn from(resp: FileSystemInfoResponse) -> Self {
        Self {
            total_file: resp.total_file,
            free_space: resp.free_space,
            total_space: resp.total_space,
        }
    }
}

/// One directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub index: u8,
    pub name: String,
    pub size: u32,
}

/// Cooperative cancellation for long transfers, checked between chunks.
///
/// Cancelling aborts the remaining chunks; the open handle is still
/// closed before the transfer returns [`KeyboardError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Forward-only percentage reporting: the callback sees 0..=100 and
/// never a value smaller than one it already saw.
struct Monotonic {
    last: i16,
}

impl Monotonic {
    fn new() -> Self {
        Self { last: -1 }
    }

    fn update(&mut self, done: usize, total: usize, cb: &mut (dyn FnMut(u8) + Send)) {
        if total == 0 {
            return;
        }
        let pct = ((done * 100) / total).min(100) as i16;
        if pct > self.last {
            self.last = pct;
            cb(pct as u8);
        }
    }
}

impl AmkKeyboard {
    /// Last known disk summary, if any exchange populated it.
    pub fn fs_info(&self) -> Option<&FileSystemInfo> {
        self.fs_info.as_ref()
    }

    /// Directory entries from the last [`reload_file_list`].
    ///
    /// [`reload_file_list`]: Self::reload_file_list
    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    /// Pause (`false`) or resume (`true`) the on-device animation
    /// renderer.
    pub async fn display_control(&mut self, on: bool) -> Result<(), KeyboardError> {
        self.exchange.execute(&DisplayControl { on }).await?;
        Ok(())
    }

    pub async fn reload_fs_info(&mut self) -> Result<FileSystemInfo, KeyboardError> {
        let resp: FileSystemInfoResponse = self.exchange.query(&GetFileSystemInfo).await?;
        let info = FileSystemInfo::from(resp);
        self.fs_info = Some(info);
        Ok(info)
    }

    /// Reload the disk summary and every directory entry.
    pub async fn reload_file_list(&mut self) -> Result<&[FileEntry], KeyboardError> {
        let info = self.reload_fs_info().await?;
        let mut files = Vec::with_capacity(info.total_file as usize);
        for i in 0..info.total_file {
            let resp: FileInfoResponse = self.exchange.query(&GetFileInfo { index: i }).await?;
            files.push(FileEntry {
                index: resp.index,
                name: resp.name,
                size: resp.size,
            });
        }
        self.files = files;
        Ok(&self.files)
    }

    /// Remove a directory entry. Independent of any open handle.
    pub async fn delete_file(&mut self, index: u8) -> Result<(), KeyboardError> {
        self.display_control(false).await?;
        let result = self
            .exchange
            .execute(&DeleteFile { index })
            .await
            .map_err(KeyboardError::from);
        let resume = self.display_control(true).await;
        self.note_outcome(&result);
        result?;
        resume?;

        self.files.retain(|f| f.index != index);
        // freed space is only known after a directory reload
        self.fs_info = None;
        if let Err(e) = self.reload_fs_info().await {
            debug!("free-space refresh after delete failed: {e}");
        }
        Ok(())
    }

    /// Encode frames and upload them as a device animation file.
    ///
    /// The free-space admission check runs against the last known disk
    /// summary (refreshed if unknown) before a single frame is sent.
    /// Returns the sanitized device file name.
    pub async fn upload_animation<F>(
        &mut self,
        stem: &str,
        format: AnimFormat,
        frames: &[Frame],
        fast_path: bool,
        cancel: &CancelToken,
        mut progress: F,
    ) -> Result<String, KeyboardError>
    where
        F: FnMut(u8) + Send,
    {
        let data = animation::encode(format, frames)?;
        let required = data.len() as u32;
        let free = match &self.fs_info {
            Some(info) => info.free_space,
            None => self.reload_fs_info().await?.free_space,
        };
        if required > free {
            return Err(KeyboardError::InsufficientSpace { required, free });
        }

        let name = animation::device_file_name(stem, format);
        self.upload_bytes(&name, &data, fast_path, cancel, &mut progress)
            .await?;
        Ok(name)
    }

    /// Upload raw bytes to a device file, chunked in strictly increasing
    /// offsets, with the display paused for the whole session.
    pub async fn upload_bytes(
        &mut self,
        name: &str,
        data: &[u8],
        fast_path: bool,
        cancel: &CancelToken,
        progress: &mut (dyn FnMut(u8) + Send),
    ) -> Result<(), KeyboardError> {
        if name.len() > file::NAME_MAX {
            return Err(KeyboardError::NameTooLong(name.to_string()));
        }

        self.display_control(false).await?;
        let result = self
            .upload_session(name, data, fast_path, cancel, progress)
            .await;
        let resume = self.display_control(true).await;
        self.note_outcome(&result);
        result?;
        resume?;

        self.fs_info = None;
        if let Err(e) = self.reload_fs_info().await {
            debug!("free-space refresh after upload failed: {e}");
        }
        Ok(())
    }

    async fn upload_session(
        &mut self,
        name: &str,
        data: &[u8],
        fast_path: bool,
        cancel: &CancelToken,
        progress: &mut (dyn FnMut(u8) + Send),
    ) -> Result<(), KeyboardError> {
        let handle = self.open_remote(name, false, file::SLOT_AUTO).await?;

        let body = if fast_path && self.exchange.device_info().has_bulk {
            self.write_chunks_bulk(handle, data, cancel, progress).await
        } else {
            if fast_path {
                debug!("fast path requested but no bulk channel; using control path");
            }
            self.write_chunks(handle, data, cancel, progress).await
        };

        // one close per session, whether the transfer finished or aborted
        let close = self.close_remote(handle).await;
        body?;
        close
    }

    /// Read a directory entry's contents back from the device.
    ///
    /// The returned data may be shorter than the directory size if the
    /// device ends the stream early.
    pub async fn download_file<F>(
        &mut self,
        entry: &FileEntry,
        cancel: &CancelToken,
        mut progress: F,
    ) -> Result<Vec<u8>, KeyboardError>
    where
        F: FnMut(u8) + Send,
    {
        self.display_control(false).await?;
        let result = self
            .download_session(entry, cancel, &mut progress)
            .await;
        let resume = self.display_control(true).await;
        self.note_outcome(&result);
        let data = result?;
        resume?;
        Ok(data)
    }

    async fn download_session(
        &mut self,
        entry: &FileEntry,
        cancel: &CancelToken,
        progress: &mut (dyn FnMut(u8) + Send),
    ) -> Result<Vec<u8>, KeyboardError> {
        let handle = self.open_remote(&entry.name, true, entry.index).await?;
        let body = self
            .read_chunks(handle, entry.size as usize, cancel, progress)
            .await;
        let close = self.close_remote(handle).await;
        let data = body?;
        close?;
        Ok(data)
    }

    // === Session primitives ===

    async fn open_remote(
        &mut self,
        name: &str,
        for_read: bool,
        slot: u8,
    ) -> Result<u8, KeyboardError> {
        let resp: OpenFileResponse = self
            .exchange
            .query(&OpenFile {
                slot,
                for_read,
                name: name.to_string(),
            })
            .await?;
        if resp.handle == file::HANDLE_NONE {
            return Err(KeyboardError::NoFreeHandle);
        }
        debug!("opened {:?} as handle {}", name, resp.handle);
        Ok(resp.handle)
    }

    async fn close_remote(&mut self, handle: u8) -> Result<(), KeyboardError> {
        match self.exchange.execute(&CloseFile { handle }).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("close of handle {} failed: {}", handle, e);
                Err(e.into())
            }
        }
    }

    async fn write_chunks(
        &mut self,
        handle: u8,
        data: &[u8],
        cancel: &CancelToken,
        progress: &mut (dyn FnMut(u8) + Send),
    ) -> Result<(), KeyboardError> {
        let total = data.len();
        let mut monotonic = Monotonic::new();
        let mut offset = 0usize;
        while offset < total {
            if cancel.is_cancelled() {
                return Err(KeyboardError::Cancelled);
            }
            let len = file::CHUNK_SIZE.min(total - offset);
            self.exchange
                .execute(&WriteFile {
                    handle,
                    offset: offset as u32,
                    data: data[offset..offset + len].to_vec(),
                })
                .await?;
            offset += len;
            monotonic.update(offset, total, progress);
        }
        Ok(())
    }

    /// Fast path: the same chunking rule at the bulk frame size, batched
    /// per USB transfer without per-chunk acknowledgment. The terminal
    /// CLOSE_FILE acknowledgment still runs on the control path.
    async fn write_chunks_bulk(
        &mut self,
        handle: u8,
        data: &[u8],
        cancel: &CancelToken,
        progress: &mut (dyn FnMut(u8) + Send),
    ) -> Result<(), KeyboardError> {
        let total = data.len();
        let mut monotonic = Monotonic::new();

        let packets: Vec<WriteFile> = data
            .chunks(file::FAST_CHUNK_SIZE)
            .enumerate()
            .map(|(i, chunk)| WriteFile {
                handle,
                offset: (i * file::FAST_CHUNK_SIZE) as u32,
                data: chunk.to_vec(),
            })
            .collect();

        let mut sent = 0usize;
        for batch in packets.chunks(BULK_BATCH_FRAMES) {
            if cancel.is_cancelled() {
                return Err(KeyboardError::Cancelled);
            }
            let mut buf = Vec::with_capacity(batch.len() * amk_transport::protocol::BULK_FRAME_SIZE);
            for packet in batch {
                buf.extend_from_slice(&packet.bulk_frame());
                sent += packet.data.len();
            }
            self.exchange.write_bulk(&buf).await?;
            // no per-chunk ack on this path; give the device time to drain
            tokio::time::sleep(Duration::from_millis(timing::BULK_SETTLE_DELAY_MS)).await;
            monotonic.update(sent, total, progress);
        }
        Ok(())
    }

    async fn read_chunks(
        &mut self,
        handle: u8,
        size: usize,
        cancel: &CancelToken,
        progress: &mut (dyn FnMut(u8) + Send),
    ) -> Result<Vec<u8>, KeyboardError> {
        let mut out = Vec::with_capacity(size);
        let mut monotonic = Monotonic::new();
        while out.len() < size {
            if cancel.is_cancelled() {
                return Err(KeyboardError::Cancelled);
            }
            let want = file::CHUNK_SIZE.min(size - out.len());
            let resp: ReadFileResponse = self
                .exchange
                .query(&ReadFile {
                    handle,
                    size: want as u8,
                    offset: out.len() as u32,
                })
                .await?;
            let got = resp.data.len();
            out.extend_from_slice(&resp.data);
            monotonic.update(out.len(), size, progress);
            // a short or empty read ends the stream
            if got < want {
                break;
            }
        }
        Ok(out)
    }

    /// Drop cached file-system state after a fatal transport error; it
    /// must be reloaded on reconnect.
    fn note_outcome<T>(&mut self, result: &Result<T, KeyboardError>) {
        if let Err(e) = result {
            if e.is_fatal() {
                self.fs_info = None;
                self.files.clear();
            }
        }
    }
}
