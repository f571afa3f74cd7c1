//! Scripted in-memory transport for driving the client in tests
//! without a live server.

#![allow(dead_code)]

use async_trait::async_trait;
use ftp_batch::{ByteSink, ByteSource, FtpError, FtpResult, FtpTransport, RequestMethod};
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};
use uuid::Uuid;

/// Remote-side state the mock serves and records.
#[derive(Default)]
pub struct MockRemote {
    /// LIST bodies keyed by path.
    pub listings: HashMap<String, String>,
    /// NLST bodies keyed by path; existence checks read these.
    pub names: HashMap<String, String>,
    /// Download payloads keyed by remote path.
    pub files: HashMap<String, Vec<u8>>,
    /// Bytes received per uploaded remote path.
    pub uploads: HashMap<String, Vec<u8>>,
    /// Paths whose MKD is always rejected.
    pub refuse_mkdir: HashSet<String>,
    /// Paths whose first RMD is rejected (non-empty directory).
    pub rmdir_refuse_once: HashSet<String>,
    /// Reject MKD when the parent directory is unknown.
    pub strict_mkdir: bool,
    /// MKD calls, in order.
    pub created: Vec<String>,
    /// RMD calls that succeeded, in order.
    pub removed: Vec<String>,
    /// DELE calls, in order.
    pub deleted: Vec<String>,
    /// RNTO calls, in order.
    pub renames: Vec<(String, String)>,
}

pub struct MockTransport {
    pub remote: Arc<Mutex<MockRemote>>,
    gates: Mutex<HashMap<String, Arc<Gate>>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            remote: Arc::new(Mutex::new(MockRemote::default())),
            gates: Mutex::new(HashMap::new()),
        })
    }

    /// Install a closed gate for `path`: the upload sink for that path
    /// parks — in `shutdown`, and in any write after the first chunk —
    /// until the gate is opened.
    pub fn gate(&self, path: &str) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.gates.lock().unwrap().insert(path.to_string(), gate.clone());
        gate
    }

    pub fn with_remote<R>(&self, f: impl FnOnce(&mut MockRemote) -> R) -> R {
        f(&mut self.remote.lock().unwrap())
    }
}

fn parent_of(path: &str) -> Option<String> {
    let trimmed = path.trim_end_matches('/');
    trimmed.rfind('/').map(|idx| trimmed[..idx].to_string())
}

#[async_trait]
impl FtpTransport for MockTransport {
    async fn text_command(&self, path: &str, method: RequestMethod) -> FtpResult<String> {
        let mut remote = self.remote.lock().unwrap();
        match method {
            RequestMethod::ListDetails => remote
                .listings
                .get(path)
                .cloned()
                .ok_or_else(|| FtpError::not_found(format!("no listing for {}", path))),
            RequestMethod::ListNames => remote
                .names
                .get(path)
                .cloned()
                .ok_or_else(|| FtpError::not_found(format!("no such directory: {}", path))),
            RequestMethod::MakeDirectory => {
                if remote.refuse_mkdir.contains(path) {
                    return Err(FtpError::command_rejected(format!("MKD {} refused", path)));
                }
                if remote.strict_mkdir {
                    if let Some(parent) = parent_of(path) {
                        if !parent.is_empty() && !remote.names.contains_key(&parent) {
                            return Err(FtpError::command_rejected(format!(
                                "MKD {}: parent missing",
                                path
                            )));
                        }
                    }
                }
                remote.created.push(path.to_string());
                remote.names.insert(path.to_string(), ".\r\n..".to_string());
                Ok(String::new())
            }
            RequestMethod::RemoveDirectory => {
                if remote.rmdir_refuse_once.remove(path) {
                    return Err(FtpError::command_rejected(format!(
                        "RMD {}: directory not empty",
                        path
                    )));
                }
                remote.removed.push(path.to_string());
                Ok(String::new())
            }
            RequestMethod::DeleteFile => {
                remote.deleted.push(path.to_string());
                Ok(String::new())
            }
            RequestMethod::GetFileSize => remote
                .files
                .get(path)
                .map(|bytes| bytes.len().to_string())
                .ok_or_else(|| FtpError::not_found(format!("no such file: {}", path))),
            RequestMethod::Rename { to } => {
                remote.renames.push((path.to_string(), to));
                Ok(String::new())
            }
        }
    }

    async fn open_upload(&self, path: &str) -> FtpResult<ByteSink> {
        let gate = self.gates.lock().unwrap().get(path).cloned();
        Ok(Box::new(MockSink {
            remote: self.remote.clone(),
            path: path.to_string(),
            gate,
        }))
    }

    async fn open_download(&self, path: &str) -> FtpResult<(ByteSource, Option<u64>)> {
        let remote = self.remote.lock().unwrap();
        let bytes = remote
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| FtpError::not_found(format!("no such file: {}", path)))?;
        let len = bytes.len() as u64;
        Ok((Box::new(Cursor::new(bytes)), Some(len)))
    }
}

// ─── Gate ────────────────────────────────────────────────────────────

/// One-shot latch a sink can park on until the test releases it.
#[derive(Default)]
pub struct Gate {
    inner: Mutex<GateInner>,
}

#[derive(Default)]
struct GateInner {
    open: bool,
    waker: Option<Waker>,
}

impl Gate {
    pub fn open(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.open = true;
        if let Some(waker) = inner.waker.take() {
            waker.wake();
        }
    }

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.open {
            Poll::Ready(())
        } else {
            inner.waker = Some(cx.waker().clone());
            Poll::Pending
        }
    }
}

/// Upload sink appending into the shared remote state.
struct MockSink {
    remote: Arc<Mutex<MockRemote>>,
    path: String,
    gate: Option<Arc<Gate>>,
}

impl tokio::io::AsyncWrite for MockSink {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        let this = self.get_mut();
        // A closed gate parks every write after the first chunk, so a
        // test can hold the transfer mid-file.
        if let Some(gate) = &this.gate {
            let already_written = {
                let remote = this.remote.lock().unwrap();
                remote.uploads.get(&this.path).map_or(0, |b| b.len())
            };
            if already_written > 0 {
                match gate.poll_ready(cx) {
                    Poll::Pending => return Poll::Pending,
                    Poll::Ready(()) => {}
                }
            }
        }
        let mut remote = this.remote.lock().unwrap();
        remote
            .uploads
            .entry(this.path.clone())
            .or_default()
            .extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();
        if let Some(gate) = &this.gate {
            match gate.poll_ready(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(()) => {}
            }
        }
        Poll::Ready(Ok(()))
    }
}

// ─── Fixtures ────────────────────────────────────────────────────────

pub fn unix_file_line(name: &str, size: u64) -> String {
    format!("-rw-r--r--   1 svc svc  {} Jan 10 12:30 {}", size, name)
}

pub fn unix_dir_line(name: &str) -> String {
    format!("drwxr-xr-x   2 svc svc  4096 Jan 10 12:30 {}", name)
}

pub fn listing(lines: &[String]) -> String {
    lines.join("\r\n")
}

/// Fresh scratch directory under the system temp dir.
pub fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ftp-batch-{}-{}", tag, Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Write a local fixture file and return its path.
pub fn local_file(dir: &std::path::Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}
