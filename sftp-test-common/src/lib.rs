//! In-memory [`Connector`] recording every call made to it.

use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

pub use sftp_open::{
    Access, ConnectParams, Connector, Error, OpenMode, RemoteFile, SftpClient, Transport,
};

#[derive(Debug, Copy, Clone)]
enum ConnectFailure {
    Authentication,
    Connection,
}

#[derive(Debug, Default)]
struct State {
    connects: Mutex<Vec<ConnectParams>>,
    failures: Mutex<VecDeque<ConnectFailure>>,
    connect_delay: Mutex<Option<Duration>>,

    transports_created: AtomicUsize,
    transports_alive: AtomicUsize,
    sftp_sessions: AtomicUsize,

    files: Mutex<HashMap<String, BytesMut>>,
    dirs: Mutex<HashSet<String>>,
    denied: Mutex<HashSet<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap()
}

fn parent(path: &str) -> &str {
    match path.trim_end_matches('/').rsplit_once('/') {
        Some(("", _)) | None => "/",
        Some((parent, _)) => parent,
    }
}

/// Connector whose transports serve a shared in-memory filesystem.
///
/// Cloning returns a handle to the same recorded state.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    state: Arc<State>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next connect fail with [`Error::Authentication`].
    pub fn reject_next_connect(&self) -> &Self {
        lock(&self.state.failures).push_back(ConnectFailure::Authentication);
        self
    }

    /// Make the next connect fail with [`Error::Connection`].
    pub fn refuse_next_connect(&self) -> &Self {
        lock(&self.state.failures).push_back(ConnectFailure::Connection);
        self
    }

    /// Sleep this long inside every connect.
    pub fn set_connect_delay(&self, delay: Duration) -> &Self {
        *lock(&self.state.connect_delay) = Some(delay);
        self
    }

    /// Create a file with `contents`, overwriting it if it exists.
    pub fn put_file(&self, path: &str, contents: impl AsRef<[u8]>) -> &Self {
        lock(&self.state.files).insert(path.to_owned(), BytesMut::from(contents.as_ref()));
        self
    }

    pub fn add_dir(&self, path: &str) -> &Self {
        lock(&self.state.dirs).insert(path.trim_end_matches('/').to_owned());
        self
    }

    /// Deny any open of `path`.
    pub fn deny(&self, path: &str) -> &Self {
        lock(&self.state.denied).insert(path.to_owned());
        self
    }

    pub fn file(&self, path: &str) -> Option<Bytes> {
        lock(&self.state.files)
            .get(path)
            .map(|contents| contents.clone().freeze())
    }

    /// Every successful or failed connect, oldest first.
    pub fn connect_calls(&self) -> Vec<ConnectParams> {
        lock(&self.state.connects).clone()
    }

    pub fn last_connect(&self) -> Option<ConnectParams> {
        lock(&self.state.connects).last().cloned()
    }

    pub fn connect_count(&self) -> usize {
        lock(&self.state.connects).len()
    }

    pub fn transports_created(&self) -> usize {
        self.state.transports_created.load(Ordering::SeqCst)
    }

    /// Number of transports not dropped yet.
    pub fn transports_alive(&self) -> usize {
        self.state.transports_alive.load(Ordering::SeqCst)
    }

    pub fn sftp_sessions(&self) -> usize {
        self.state.sftp_sessions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Transport = MockTransport;

    async fn connect(&self, params: &ConnectParams) -> Result<MockTransport, Error> {
        lock(&self.state.connects).push(params.clone());

        let delay = *lock(&self.state.connect_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = lock(&self.state.failures).pop_front();
        match failure {
            Some(ConnectFailure::Authentication) => Err(Error::authentication(
                &*params.host,
                params.port,
                "Authentication failed.",
            )),
            Some(ConnectFailure::Connection) => Err(Error::connection(
                &*params.host,
                params.port,
                io::Error::new(io::ErrorKind::ConnectionRefused, "Connection refused"),
            )),
            None => {
                let id = self.state.transports_created.fetch_add(1, Ordering::SeqCst);
                self.state.transports_alive.fetch_add(1, Ordering::SeqCst);

                Ok(MockTransport {
                    id,
                    params: params.clone(),
                    state: Arc::clone(&self.state),
                })
            }
        }
    }
}

#[derive(Debug)]
pub struct MockTransport {
    id: usize,
    params: ConnectParams,
    state: Arc<State>,
}

impl MockTransport {
    /// Sequence number of this transport, starting at 0.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Parameters this transport was connected with.
    pub fn params(&self) -> &ConnectParams {
        &self.params
    }
}

impl Drop for MockTransport {
    fn drop(&mut self) {
        self.state.transports_alive.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for MockTransport {
    type Client = MockSftp;

    async fn open_sftp(&self) -> Result<MockSftp, Error> {
        self.state.sftp_sessions.fetch_add(1, Ordering::SeqCst);

        Ok(MockSftp {
            state: Arc::clone(&self.state),
        })
    }
}

#[derive(Debug)]
pub struct MockSftp {
    state: Arc<State>,
}

impl MockSftp {
    fn dir_exists(&self, dir: &str) -> bool {
        dir == "/" || lock(&self.state.dirs).contains(dir)
    }
}

#[async_trait]
impl SftpClient for MockSftp {
    type File = MockFile;

    async fn open(&self, path: &str, mode: OpenMode) -> Result<MockFile, Error> {
        if lock(&self.state.denied).contains(path) {
            return Err(Error::remote_file(
                path,
                io::Error::new(io::ErrorKind::PermissionDenied, "Permission denied"),
            ));
        }

        let mut files = lock(&self.state.files);

        let contents = match mode.access() {
            Access::Read => match files.get(path) {
                Some(contents) => contents.clone().freeze(),
                None => {
                    return Err(Error::remote_file(
                        path,
                        io::Error::new(io::ErrorKind::NotFound, "No such file"),
                    ))
                }
            },
            Access::Write | Access::Append => {
                if !self.dir_exists(parent(path)) {
                    return Err(Error::remote_file(
                        path,
                        io::Error::new(io::ErrorKind::NotFound, "No such file"),
                    ));
                }

                let file = files.entry(path.to_owned()).or_default();
                if mode.access() == Access::Write {
                    file.clear();
                }
                Bytes::new()
            }
        };

        Ok(MockFile {
            path: path.to_owned(),
            mode,
            contents,
            pos: 0,
            pipelined_calls: Vec::new(),
            state: Arc::clone(&self.state),
        })
    }
}

/// A file of [`MockConnector`]'s filesystem.
///
/// Reads see the contents at open time, writes are appended to the
/// filesystem immediately.
#[derive(Debug)]
pub struct MockFile {
    path: String,
    mode: OpenMode,
    contents: Bytes,
    pos: usize,
    pipelined_calls: Vec<bool>,
    state: Arc<State>,
}

impl MockFile {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Arguments of every [`RemoteFile::set_pipelined`] call, oldest first.
    pub fn pipelined_calls(&self) -> &[bool] {
        &self.pipelined_calls
    }
}

impl RemoteFile for MockFile {
    fn set_pipelined(&mut self, pipelined: bool) {
        self.pipelined_calls.push(pipelined);
    }
}

impl AsyncRead for MockFile {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.mode.is_writable() {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::Other,
                "This file is not opened for reading",
            )));
        }

        let remaining = &self.contents[self.pos..];
        let n = remaining.len().min(buf.remaining());
        buf.put_slice(&remaining[..n]);
        self.pos += n;

        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockFile {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if !self.mode.is_writable() {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::Other,
                "This file is not opened for writing",
            )));
        }

        lock(&self.state.files)
            .entry(self.path.clone())
            .or_default()
            .extend_from_slice(buf);

        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
