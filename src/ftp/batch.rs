//! Whole-directory transfer orchestration.
//!
//! A batch flattens one or more directories of files into a linear
//! queue and drains it strictly one file at a time on a background
//! worker: `Preparing(dir) → TransferringFile → Advancing → …` until
//! the queue is empty or a file fails or the cancel flag is observed.
//! Failure and cancellation are all-or-nothing: the remainder of the
//! queue is abandoned and the handle sees exactly one completion
//! event. Bytes already transferred are never rolled back.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::ftp::client::FtpClient;
use crate::ftp::error::{FtpError, FtpResult};
use crate::ftp::types::{
    join_remote, BatchProgress, CancelFlag, TransferOutcome, TransferProgress, UploadDirectory,
};

/// Event stream of a running batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum BatchEvent {
    /// Queue-position snapshot, emitted before each file starts.
    Started(BatchProgress),
    /// Cumulative byte progress of the in-flight file.
    Progress(TransferProgress),
    /// Single-fire terminal outcome for the whole batch.
    Completed(TransferOutcome),
}

/// Handle to a running batch. Dropping the handle does not stop the
/// worker; use [`BatchHandle::cancel`] for that.
pub struct BatchHandle {
    pub id: Uuid,
    cancel: CancelFlag,
    events: mpsc::UnboundedReceiver<BatchEvent>,
}

impl BatchHandle {
    /// Request cooperative cancellation. The in-flight transfer stops
    /// at its next chunk boundary; queued files are abandoned.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub async fn next_event(&mut self) -> Option<BatchEvent> {
        self.events.recv().await
    }

    /// Drain events until the completion fires.
    pub async fn wait(mut self) -> TransferOutcome {
        while let Some(event) = self.events.recv().await {
            if let BatchEvent::Completed(outcome) = event {
                return outcome;
            }
        }
        TransferOutcome::Failed(FtpError::transport(
            "batch worker stopped without a completion event",
        ))
    }
}

// ─── Planning ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchKind {
    Upload,
    Download,
}

/// One planned file transfer inside a batch queue.
#[derive(Debug, Clone)]
struct PlannedTransfer {
    /// Remote directory receiving (upload) or providing (download)
    /// the file; queue items are grouped by it.
    remote_dir: String,
    file_name: String,
    remote_path: String,
    local_path: PathBuf,
}

enum BatchPlan {
    Upload(Vec<UploadDirectory>),
    Download {
        remote_root: String,
        local_root: PathBuf,
    },
}

impl FtpClient {
    /// Upload the enrolled files of each directory as one batch, in
    /// directory order then file order.
    pub fn upload_batch(&self, directories: Vec<UploadDirectory>) -> BatchHandle {
        self.spawn_batch(BatchKind::Upload, BatchPlan::Upload(directories))
    }

    /// Mirror the remote tree at `remote_path` under `local_root` and
    /// download every file in it as one batch. The tree is resolved
    /// up front; when that fails, no file is attempted.
    pub fn download_batch(
        &self,
        remote_path: impl Into<String>,
        local_root: impl Into<PathBuf>,
    ) -> BatchHandle {
        self.spawn_batch(
            BatchKind::Download,
            BatchPlan::Download {
                remote_root: remote_path.into(),
                local_root: local_root.into(),
            },
        )
    }

    fn spawn_batch(&self, kind: BatchKind, plan: BatchPlan) -> BatchHandle {
        let id = Uuid::new_v4();
        let cancel = CancelFlag::new();
        let (tx, rx) = mpsc::unbounded_channel();

        self.register(id, cancel.clone());

        let client = self.clone();
        let worker_cancel = cancel.clone();
        tokio::spawn(async move {
            let outcome = run_batch(&client, kind, plan, &worker_cancel, &tx).await;
            info!("batch {} finished: {:?}", id, outcome);
            let _ = tx.send(BatchEvent::Completed(outcome));
            client.unregister(&id);
        });

        BatchHandle { id, cancel, events: rx }
    }
}

// ─── Worker ──────────────────────────────────────────────────────────

async fn run_batch(
    client: &FtpClient,
    kind: BatchKind,
    plan: BatchPlan,
    cancel: &CancelFlag,
    events: &mpsc::UnboundedSender<BatchEvent>,
) -> TransferOutcome {
    let queue = match plan {
        BatchPlan::Upload(directories) => plan_upload(&directories),
        BatchPlan::Download {
            remote_root,
            local_root,
        } => match plan_download(client, &remote_root, &local_root).await {
            Ok(queue) => queue,
            Err(e) => return TransferOutcome::Failed(e),
        },
    };

    match drain(client, kind, queue, cancel, events).await {
        Ok(()) => TransferOutcome::Completed,
        Err(e) if e.is_cancelled() => TransferOutcome::Cancelled,
        Err(e) => TransferOutcome::Failed(e),
    }
}

fn plan_upload(directories: &[UploadDirectory]) -> VecDeque<PlannedTransfer> {
    let mut queue = VecDeque::new();
    for dir in directories {
        for file in dir.files() {
            queue.push_back(PlannedTransfer {
                remote_dir: dir.remote_path().to_string(),
                file_name: file.name.clone(),
                remote_path: join_remote(dir.remote_path(), &file.name),
                local_path: file.local_path.clone(),
            });
        }
    }
    queue
}

async fn plan_download(
    client: &FtpClient,
    remote_root: &str,
    local_root: &Path,
) -> FtpResult<VecDeque<PlannedTransfer>> {
    let trees = client.list_all_trees(remote_root).await?;

    let mut queue = VecDeque::new();
    for tree in &trees {
        let local_dir = local_dir_for(local_root, remote_root, &tree.path);
        for file in &tree.files {
            queue.push_back(PlannedTransfer {
                remote_dir: tree.path.clone(),
                file_name: file.name.clone(),
                remote_path: file.full_path(),
                local_path: local_dir.join(&file.name),
            });
        }
    }
    debug!(
        "download of {} planned: {} file(s) across {} tree(s)",
        remote_root,
        queue.len(),
        trees.len()
    );
    Ok(queue)
}

/// Local mirror directory for one remote tree: the tree's path
/// relative to the requested root, joined under `local_root`.
fn local_dir_for(local_root: &Path, remote_root: &str, tree_path: &str) -> PathBuf {
    let rel = tree_path
        .strip_prefix(remote_root)
        .unwrap_or(tree_path)
        .trim_start_matches('/');
    if rel.is_empty() {
        local_root.to_path_buf()
    } else {
        rel.split('/')
            .fold(local_root.to_path_buf(), |p, comp| p.join(comp))
    }
}

/// Drain the queue one file at a time. The cancel flag is observed at
/// every file boundary here and at every chunk boundary inside the
/// transfer engine. Any error aborts the remainder of the queue.
async fn drain(
    client: &FtpClient,
    kind: BatchKind,
    mut queue: VecDeque<PlannedTransfer>,
    cancel: &CancelFlag,
    events: &mpsc::UnboundedSender<BatchEvent>,
) -> FtpResult<()> {
    let total_count = queue.len();
    let mut current_count = 0usize;
    let mut prepared_dir: Option<String> = None;

    while let Some(item) = queue.pop_front() {
        if cancel.is_cancelled() {
            return Err(FtpError::cancelled("batch cancelled between files"));
        }

        // Destination check runs before the first file of every
        // directory in the queue.
        if prepared_dir.as_deref() != Some(item.remote_dir.as_str()) {
            prepare_directory(client, kind, &item).await?;
            prepared_dir = Some(item.remote_dir.clone());
        }

        current_count += 1;
        let _ = events.send(BatchEvent::Started(BatchProgress {
            total_count,
            current_count,
            file_name: item.file_name.clone(),
            remote_path: item.remote_path.clone(),
            local_path: item.local_path.display().to_string(),
        }));

        let mut forward = |progress: TransferProgress| {
            let _ = events.send(BatchEvent::Progress(progress));
        };
        match kind {
            BatchKind::Upload => {
                client
                    .upload_file(&item.local_path, &item.remote_path, cancel, Some(&mut forward))
                    .await?;
            }
            BatchKind::Download => {
                client
                    .download_file(&item.remote_path, &item.local_path, cancel, Some(&mut forward))
                    .await?;
            }
        }
    }
    Ok(())
}

/// Make sure the destination of `item` exists before transferring into
/// it. Creation failure is fatal for the whole batch.
async fn prepare_directory(
    client: &FtpClient,
    kind: BatchKind,
    item: &PlannedTransfer,
) -> FtpResult<()> {
    match kind {
        BatchKind::Upload => client.ensure_directory(&item.remote_dir).await,
        BatchKind::Download => {
            if let Some(parent) = item.local_path.parent() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    FtpError::directory_creation(format!(
                        "creating local directory {} failed: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
            Ok(())
        }
    }
}
