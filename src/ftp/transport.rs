//! Transport collaborator seam.
//!
//! Everything wire-level — connecting, authenticating, channel setup,
//! issuing the literal command — lives behind [`FtpTransport`]. The
//! rest of the crate only ever sees listing text and byte streams.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::ftp::error::FtpResult;

/// Command vocabulary for the text channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RequestMethod {
    MakeDirectory,
    RemoveDirectory,
    /// Name-only listing.
    ListNames,
    /// Long-format listing.
    ListDetails,
    DeleteFile,
    GetFileSize,
    Rename { to: String },
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Self::MakeDirectory => "MKD",
            Self::RemoveDirectory => "RMD",
            Self::ListNames => "NLST",
            Self::ListDetails => "LIST",
            Self::DeleteFile => "DELE",
            Self::GetFileSize => "SIZE",
            Self::Rename { .. } => "RNTO",
        };
        f.write_str(verb)
    }
}

pub type ByteSink = Box<dyn AsyncWrite + Send + Unpin>;
pub type ByteSource = Box<dyn AsyncRead + Send + Unpin>;

/// The external collaborator performing actual command and data-channel
/// I/O. Implementations own the connection and its credentials.
///
/// A server refusal must surface as an error of a refusal kind
/// (`CommandRejected`/`NotFound`/`PermissionDenied`), distinct from an
/// `Ok` carrying empty text — callers rely on the difference to tell a
/// refused path from an empty directory.
#[async_trait]
pub trait FtpTransport: Send + Sync {
    /// Issue a text command against a remote path and return the
    /// response body.
    async fn text_command(&self, path: &str, method: RequestMethod) -> FtpResult<String>;

    /// Open a byte sink that stores into the remote file at `path`.
    async fn open_upload(&self, path: &str) -> FtpResult<ByteSink>;

    /// Open a byte source for the remote file at `path`, plus the
    /// length the server reported for it when known.
    async fn open_download(&self, path: &str) -> FtpResult<(ByteSource, Option<u64>)>;
}
