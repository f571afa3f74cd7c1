//! Client facade — owns the transport reference and spawns transfer
//! workers.
//!
//! The client itself is cheap to clone; every clone shares the same
//! transport and the same registry of active cancel handles. Directory
//! operations live in `directory.rs`, the chunked transfer engine in
//! `file_ops.rs`, and batch orchestration in `batch.rs`.

use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::ftp::error::{FtpError, FtpResult};
use crate::ftp::transport::{FtpTransport, RequestMethod};
use crate::ftp::types::{CancelFlag, TransferOutcome, TransferProgress};

/// Event stream of a spawned single-file transfer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum TransferEvent {
    /// Cumulative bytes after each copied chunk.
    Progress(TransferProgress),
    /// Single-fire terminal outcome.
    Completed(TransferOutcome),
}

/// Handle to a spawned single-file transfer.
pub struct TransferHandle {
    pub id: Uuid,
    cancel: CancelFlag,
    events: mpsc::UnboundedReceiver<TransferEvent>,
}

impl TransferHandle {
    /// Request cooperative cancellation. The worker observes the flag
    /// at its next chunk boundary; bytes already copied stay in place.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub async fn next_event(&mut self) -> Option<TransferEvent> {
        self.events.recv().await
    }

    /// Drain events until the completion fires.
    pub async fn wait(mut self) -> TransferOutcome {
        while let Some(event) = self.events.recv().await {
            if let TransferEvent::Completed(outcome) = event {
                return outcome;
            }
        }
        TransferOutcome::Failed(FtpError::transport(
            "transfer worker stopped without a completion event",
        ))
    }
}

enum Direction {
    Upload,
    Download,
}

/// A client bound to one remote account via its transport.
#[derive(Clone)]
pub struct FtpClient {
    pub(crate) transport: Arc<dyn FtpTransport>,
    /// Cancel handles of every outstanding operation, keyed by id.
    /// Mutated on operation start/finish; swept by `cancel_all`.
    pub(crate) active: Arc<StdMutex<HashMap<Uuid, CancelFlag>>>,
}

impl FtpClient {
    pub fn new(transport: Arc<dyn FtpTransport>) -> Self {
        Self {
            transport,
            active: Arc::new(StdMutex::new(HashMap::new())),
        }
    }

    // ─── Pass-through file operations ────────────────────────────

    /// Delete a remote file.
    pub async fn delete_file(&self, path: &str) -> FtpResult<()> {
        self.transport
            .text_command(path, RequestMethod::DeleteFile)
            .await
            .map(|_| ())
    }

    /// Size of a remote file in bytes.
    pub async fn file_size(&self, path: &str) -> FtpResult<u64> {
        let text = self
            .transport
            .text_command(path, RequestMethod::GetFileSize)
            .await?;
        text.trim()
            .parse::<u64>()
            .map_err(|_| FtpError::transport(format!("unreadable size reply: {:?}", text)))
    }

    /// Whether a remote file exists; refusals read as absent.
    pub async fn file_exists(&self, path: &str) -> FtpResult<bool> {
        match self.file_size(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_refusal() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Rename (or move) a remote file or directory.
    pub async fn rename(&self, from: &str, to: &str) -> FtpResult<()> {
        self.transport
            .text_command(from, RequestMethod::Rename { to: to.to_string() })
            .await
            .map(|_| ())
    }

    // ─── Spawned single-file transfers ───────────────────────────

    /// Upload one local file on a background worker.
    pub fn start_upload(
        &self,
        local_path: impl Into<PathBuf>,
        remote_path: impl Into<String>,
    ) -> TransferHandle {
        self.spawn_transfer(Direction::Upload, local_path.into(), remote_path.into())
    }

    /// Download one remote file on a background worker.
    pub fn start_download(
        &self,
        remote_path: impl Into<String>,
        local_path: impl Into<PathBuf>,
    ) -> TransferHandle {
        self.spawn_transfer(Direction::Download, local_path.into(), remote_path.into())
    }

    fn spawn_transfer(
        &self,
        direction: Direction,
        local_path: PathBuf,
        remote_path: String,
    ) -> TransferHandle {
        let id = Uuid::new_v4();
        let cancel = CancelFlag::new();
        let (tx, rx) = mpsc::unbounded_channel();

        self.register(id, cancel.clone());

        let client = self.clone();
        let worker_cancel = cancel.clone();
        tokio::spawn(async move {
            let mut forward = |progress: TransferProgress| {
                let _ = tx.send(TransferEvent::Progress(progress));
            };
            let result = match direction {
                Direction::Upload => {
                    client
                        .upload_file(&local_path, &remote_path, &worker_cancel, Some(&mut forward))
                        .await
                }
                Direction::Download => {
                    client
                        .download_file(&remote_path, &local_path, &worker_cancel, Some(&mut forward))
                        .await
                }
            };

            let outcome = match result {
                Ok(_) => TransferOutcome::Completed,
                Err(e) if e.is_cancelled() => TransferOutcome::Cancelled,
                Err(e) => TransferOutcome::Failed(e),
            };
            let _ = tx.send(TransferEvent::Completed(outcome));
            client.unregister(&id);
        });

        TransferHandle { id, cancel, events: rx }
    }

    // ─── Cancellation registry ───────────────────────────────────

    pub(crate) fn register(&self, id: Uuid, flag: CancelFlag) {
        if let Ok(mut active) = self.active.lock() {
            active.insert(id, flag);
        }
    }

    pub(crate) fn unregister(&self, id: &Uuid) {
        if let Ok(mut active) = self.active.lock() {
            active.remove(id);
        }
    }

    /// Cooperatively cancel every outstanding operation on this client.
    pub fn cancel_all(&self) {
        if let Ok(active) = self.active.lock() {
            info!("cancelling {} active operation(s)", active.len());
            for flag in active.values() {
                flag.cancel();
            }
        }
    }

    /// Number of operations currently in flight.
    pub fn active_count(&self) -> usize {
        self.active.lock().map(|a| a.len()).unwrap_or(0)
    }
}
