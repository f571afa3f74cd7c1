//! Shared types for the batch FTP crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::ftp::error::{FtpError, FtpResult};

// ─── Connection ──────────────────────────────────────────────────────

/// Host and credentials for the transport collaborator. The transport
/// owns the live connection; this is the read-only account data shared
/// across every operation issued through one client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FtpConnection {
    host: String,
    pub username: String,
    pub password: String,
}

impl FtpConnection {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Anonymous login for servers that allow it.
    pub fn anonymous(host: impl Into<String>) -> Self {
        Self::new(host, "anonymous", "")
    }

    /// Host name, always carrying the scheme prefix.
    pub fn host(&self) -> String {
        if self.host.starts_with("ftp://") {
            self.host.clone()
        } else {
            format!("ftp://{}", self.host)
        }
    }

    /// Absolute URL for a remote path.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.host(), path.trim_start_matches('/'))
    }
}

// ─── Directory listing ───────────────────────────────────────────────

/// One entry parsed from a directory listing line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FtpEntry {
    pub name: String,
    pub is_directory: bool,
    pub permissions: Option<String>,
    /// Size in bytes; zero for directory markers without one.
    pub size: u64,
    /// `None` when the listing timestamp could not be parsed.
    pub modified: Option<DateTime<Utc>>,
    /// Path of the directory this entry was listed in.
    pub parent: String,
}

impl FtpEntry {
    /// Full remote path: `parent + "/" + name`, or just the name when
    /// the parent is blank.
    pub fn full_path(&self) -> String {
        if self.parent.trim().is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.parent.trim_end_matches('/'), self.name)
        }
    }
}

/// One directory's listing: its immediate subdirectory and file
/// entries, in server order. Every entry's `parent` equals `path`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FtpDirectory {
    pub path: String,
    pub directories: Vec<FtpEntry>,
    pub files: Vec<FtpEntry>,
}

impl FtpDirectory {
    pub fn entry_count(&self) -> usize {
        self.directories.len() + self.files.len()
    }
}

// ─── Upload enrollment ───────────────────────────────────────────────

/// One file enrolled for upload: the remote name it will receive and
/// the local file backing it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadFile {
    pub name: String,
    pub local_path: PathBuf,
}

/// A remote destination directory plus the files to place in it.
/// Enrollment validates eagerly: blank fields and missing local files
/// are rejected before any network activity happens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadDirectory {
    remote_path: String,
    files: Vec<UploadFile>,
}

impl UploadDirectory {
    pub fn new(remote_path: impl Into<String>) -> Self {
        Self {
            remote_path: remote_path.into(),
            files: Vec::new(),
        }
    }

    pub fn remote_path(&self) -> &str {
        &self.remote_path
    }

    pub fn files(&self) -> &[UploadFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Enroll a file. A local path already enrolled is a no-op.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        local_path: impl Into<PathBuf>,
    ) -> FtpResult<()> {
        let name = name.into();
        let local_path = local_path.into();

        if name.trim().is_empty() {
            return Err(FtpError::structural("upload file name must not be blank"));
        }
        if local_path.as_os_str().is_empty() {
            return Err(FtpError::structural("upload local path must not be blank"));
        }
        if !local_path.is_file() {
            return Err(FtpError::structural(format!(
                "local file does not exist: {}",
                local_path.display()
            )));
        }

        if !self.files.iter().any(|f| f.local_path == local_path) {
            self.files.push(UploadFile { name, local_path });
        }
        Ok(())
    }
}

// ─── Progress / completion ───────────────────────────────────────────

/// Immutable snapshot of one file transfer's byte progress.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransferProgress {
    pub bytes_transferred: u64,
    pub total_bytes: u64,
}

impl TransferProgress {
    pub fn new(bytes_transferred: u64, total_bytes: u64) -> Self {
        Self {
            bytes_transferred,
            total_bytes,
        }
    }

    /// Rounded percent complete. A zero-byte total reports 100: an
    /// empty payload has nothing left to move.
    pub fn percentage(&self) -> u32 {
        if self.total_bytes == 0 {
            return 100;
        }
        (self.bytes_transferred as f64 / self.total_bytes as f64 * 100.0).round() as u32
    }
}

/// Queue-position snapshot emitted before each file of a batch starts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgress {
    pub total_count: usize,
    /// 1-based position of the file about to start.
    pub current_count: usize,
    pub file_name: String,
    pub remote_path: String,
    pub local_path: String,
}

/// Terminal outcome of a transfer or batch. Exactly one is delivered
/// per operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum TransferOutcome {
    Completed,
    Cancelled,
    Failed(FtpError),
}

impl TransferOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn error(&self) -> Option<&FtpError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}

// ─── Cancellation ────────────────────────────────────────────────────

/// Cooperative cancellation flag shared between a handle and its
/// worker. Setting it never interrupts in-flight I/O; workers observe
/// it at chunk and file boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Join a remote directory path and a file name.
pub(crate) fn join_remote(dir: &str, name: &str) -> String {
    if dir.trim().is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), name)
    }
}
