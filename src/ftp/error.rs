//! FTP-specific error type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorised FTP error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FtpError {
    pub kind: FtpErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FtpErrorKind {
    /// TCP / DNS / protocol failure inside the transport collaborator.
    Transport,
    /// Server refused the command outright ("no response").
    CommandRejected,
    /// File/directory not found on the server.
    NotFound,
    /// Permission denied on the server.
    PermissionDenied,
    /// Invalid enrollment data (missing local file, blank field).
    Structural,
    /// A destination directory could not be created.
    DirectoryCreation,
    /// Recursive tree enumeration failed; partial trees were discarded.
    TreeEnumeration,
    /// An I/O error on the local side (file read/write).
    Io,
    /// Operation cancelled cooperatively.
    Cancelled,
}

pub type FtpResult<T> = Result<T, FtpError>;

// ── Construction helpers ─────────────────────────────────────────────

impl FtpError {
    pub fn new(kind: FtpErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
        }
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::Transport, msg)
    }

    pub fn command_rejected(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::CommandRejected, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::NotFound, msg)
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::PermissionDenied, msg)
    }

    pub fn structural(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::Structural, msg)
    }

    pub fn directory_creation(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::DirectoryCreation, msg)
    }

    pub fn tree_enumeration(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::TreeEnumeration, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::Io, msg)
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::Cancelled, msg)
    }

    /// Whether this error is a server refusal rather than a hard
    /// transport failure. Existence checks read refusals as "absent".
    pub fn is_refusal(&self) -> bool {
        matches!(
            self.kind,
            FtpErrorKind::CommandRejected
                | FtpErrorKind::NotFound
                | FtpErrorKind::PermissionDenied
        )
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == FtpErrorKind::Cancelled
    }
}

impl fmt::Display for FtpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[FTP {:?}] {}", self.kind, self.message)
    }
}

impl std::error::Error for FtpError {}

impl From<std::io::Error> for FtpError {
    fn from(e: std::io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}
