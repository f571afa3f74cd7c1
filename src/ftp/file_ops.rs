//! Single-file transfer engine — chunked copy with cooperative
//! cancellation and per-chunk progress.
//!
//! Streams are owned by the copy loop and dropped on every exit path,
//! so release is unconditional whether a transfer completes, errors or
//! observes the cancel flag mid-way.

use std::path::Path;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::ftp::client::FtpClient;
use crate::ftp::error::{FtpError, FtpResult};
use crate::ftp::types::{CancelFlag, TransferProgress};

/// Fixed chunk size for streaming transfers (64 KiB).
pub(crate) const TRANSFER_CHUNK: usize = 65_536;

/// Per-chunk progress callback, invoked with cumulative bytes.
pub type ProgressFn<'a> = &'a mut (dyn FnMut(TransferProgress) + Send);

impl FtpClient {
    /// Upload one local file to `remote_path`, returning bytes written.
    ///
    /// The cancel flag is checked before every chunk; a cancelled
    /// upload returns a `Cancelled` error and leaves whatever the
    /// server already received untouched.
    pub async fn upload_file(
        &self,
        local_path: &Path,
        remote_path: &str,
        cancel: &CancelFlag,
        mut on_progress: Option<ProgressFn<'_>>,
    ) -> FtpResult<u64> {
        let total_bytes = fs::metadata(local_path).await?.len();
        let mut file = fs::File::open(local_path).await?;
        let mut sink = self.transport.open_upload(remote_path).await?;

        let mut transferred = 0u64;
        let mut buf = vec![0u8; TRANSFER_CHUNK];
        loop {
            if cancel.is_cancelled() {
                let _ = sink.shutdown().await;
                return Err(FtpError::cancelled(format!(
                    "upload of {} cancelled",
                    remote_path
                )));
            }
            let n = file.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            sink.write_all(&buf[..n]).await?;
            transferred += n as u64;
            if let Some(cb) = on_progress.as_mut() {
                cb(TransferProgress::new(transferred, total_bytes));
            }
        }

        sink.flush().await?;
        sink.shutdown().await?;
        Ok(transferred)
    }

    /// Download one remote file into `local_path`, creating missing
    /// parent directories, returning bytes read.
    ///
    /// A cancelled download stops at the current chunk boundary; bytes
    /// already written are not rolled back, so a partial local file may
    /// remain.
    pub async fn download_file(
        &self,
        remote_path: &str,
        local_path: &Path,
        cancel: &CancelFlag,
        mut on_progress: Option<ProgressFn<'_>>,
    ) -> FtpResult<u64> {
        let (mut source, reported_len) = self.transport.open_download(remote_path).await?;

        if let Some(parent) = local_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let mut file = fs::File::create(local_path).await?;
        let total_bytes = reported_len.unwrap_or(0);

        let mut transferred = 0u64;
        let mut buf = vec![0u8; TRANSFER_CHUNK];
        loop {
            if cancel.is_cancelled() {
                let _ = file.flush().await;
                return Err(FtpError::cancelled(format!(
                    "download of {} cancelled",
                    remote_path
                )));
            }
            let n = source.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n]).await?;
            transferred += n as u64;
            if let Some(cb) = on_progress.as_mut() {
                cb(TransferProgress::new(transferred, total_bytes));
            }
        }

        file.flush().await?;
        Ok(transferred)
    }
}
