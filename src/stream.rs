use super::{OpenMode, RemoteFile, TransportParams};

use std::any::Any;
use std::fmt;
use std::io::{self, IoSlice};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use pin_project::pin_project;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Decide write pipelining for a freshly opened `file` and wrap it.
///
/// Pipelining is enabled only when `mode` is writable and
/// [`TransportParams::get_write_pipelining`] is true, and is never touched
/// afterwards. Files opened for reading are returned without calling
/// [`RemoteFile::set_pipelined`] at all.
pub fn configure<F: RemoteFile>(
    mut file: F,
    mode: OpenMode,
    params: &TransportParams,
) -> SftpStream<F> {
    let pipelined = mode.is_writable() && params.get_write_pipelining();

    if pipelined {
        file.set_pipelined(true);
    }

    #[cfg(feature = "tracing")]
    tracing::trace!(%mode, pipelined, "configured remote file");

    SftpStream {
        file,
        mode,
        pipelined,
        transport: None,
    }
}

/// A remote file opened by [`open`](crate::open).
///
/// Reads and writes go straight to the underlying file without extra
/// buffering. The stream keeps its transport alive but never closes it:
/// dropping or shutting down the stream leaves the transport usable for
/// other streams.
#[pin_project]
pub struct SftpStream<F> {
    #[pin]
    file: F,
    mode: OpenMode,
    pipelined: bool,
    transport: Option<Arc<dyn Any + Send + Sync>>,
}

impl<F> SftpStream<F> {
    pub(crate) fn with_transport(mut self, transport: Arc<dyn Any + Send + Sync>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Return true if writes are pipelined.
    pub fn is_pipelined(&self) -> bool {
        self.pipelined
    }

    /// Return the underlying file.
    ///
    /// There is no mutable counterpart: the pipelining setting is fixed once
    /// the stream is created.
    pub fn get_ref(&self) -> &F {
        &self.file
    }
}

impl<F> fmt::Debug for SftpStream<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SftpStream")
            .field("mode", &self.mode)
            .field("pipelined", &self.pipelined)
            .finish_non_exhaustive()
    }
}

impl<F: AsyncRead> AsyncRead for SftpStream<F> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.project().file.poll_read(cx, buf)
    }
}

impl<F: AsyncWrite> AsyncWrite for SftpStream<F> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.project().file.poll_write(cx, buf)
    }

    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        self.project().file.poll_write_vectored(cx, bufs)
    }

    fn is_write_vectored(&self) -> bool {
        self.file.is_write_vectored()
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.project().file.poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.project().file.poll_shutdown(cx)
    }
}
