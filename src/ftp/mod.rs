//! # ftp-batch — batch transfer core for FTP-shaped services
//!
//! Orchestration and parsing layered on top of an external transport:
//! - `types` — entries, trees, enrollment, progress snapshots, config
//! - `error` — categorised error type
//! - `transport` — the collaborator seam (commands + byte streams)
//! - `parser` — heterogeneous LIST response parsing
//! - `client` — client facade, pass-through ops, spawned transfers
//! - `directory` — tree enumeration, mkdir, recursive delete
//! - `file_ops` — chunked single-file transfer engine
//! - `batch` — whole-directory batches with cancel + progress

pub mod batch;
pub mod client;
pub mod directory;
pub mod error;
pub mod file_ops;
pub mod parser;
pub mod transport;
pub mod types;

pub use batch::{BatchEvent, BatchHandle};
pub use client::{FtpClient, TransferEvent, TransferHandle};
pub use directory::MAX_TREE_DEPTH;
pub use error::{FtpError, FtpErrorKind, FtpResult};
pub use file_ops::ProgressFn;
pub use transport::{ByteSink, ByteSource, FtpTransport, RequestMethod};
pub use types::*;
