use super::{
    Access, ConnectParams, Connector, Error, OpenMode, RemoteFile, SftpClient, Transport,
};

use std::fmt;
use std::io::{self, IoSlice};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use openssh::{KnownHosts, SessionBuilder};
use openssh_sftp_client::{
    file::TokioCompatFile, Error as SftpError, error::SftpErrorKind, Sftp, SftpOptions,
};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// [`Connector`] establishing multiplexed sessions with the system `ssh`.
///
/// Recognised [`ConnectParams::extra`] settings:
///  - `key_filename`: private key to authenticate with,
///  - `connect_timeout`: connect timeout in seconds.
///
/// Password authentication is not available over a multiplexed session,
/// connecting with a password fails with [`Error::Authentication`].
///
/// `ssh` only reports a rejected key through its exit status and stderr.
/// Failures `openssh` classifies as [`io::ErrorKind::PermissionDenied`]
/// become [`Error::Authentication`], every other failure to bring up the
/// session is an [`Error::Connection`].
#[derive(Debug, Clone)]
pub struct OpensshConnector {
    known_hosts: KnownHosts,
    options: SftpOptions,
}

impl Default for OpensshConnector {
    fn default() -> Self {
        Self::new(KnownHosts::Strict)
    }
}

impl OpensshConnector {
    pub fn new(known_hosts: KnownHosts) -> Self {
        Self {
            known_hosts,
            options: SftpOptions::default(),
        }
    }

    /// Set the options used for every sftp session.
    #[must_use]
    pub fn sftp_options(mut self, options: SftpOptions) -> Self {
        self.options = options;
        self
    }
}

#[async_trait]
impl Connector for OpensshConnector {
    type Transport = OpensshTransport;

    async fn connect(&self, params: &ConnectParams) -> Result<OpensshTransport, Error> {
        let (host, port) = (&*params.host, params.port);

        if params.password.is_some() {
            return Err(Error::authentication(
                host,
                port,
                "password authentication is not supported over a multiplexed openssh session",
            ));
        }

        let mut builder = SessionBuilder::default();
        builder.known_hosts_check(self.known_hosts.clone()).port(port);

        if let Some(username) = &params.username {
            builder.user(username.clone());
        }

        if let Some(key_filename) = params.extra.get("key_filename") {
            builder.keyfile(key_filename);
        }

        if let Some(timeout) = params.extra.get("connect_timeout") {
            let secs: u64 = timeout.parse().map_err(|_| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("connect_timeout {timeout:?} is not a number of seconds"),
                )
            })?;
            builder.connect_timeout(Duration::from_secs(secs));
        }

        let session = builder
            .connect_mux(host)
            .await
            .map_err(|err| connect_error(host, port, err))?;

        let sftp = Sftp::from_session(session, self.options)
            .await
            .map_err(|err| Error::connection(host, port, err))?;

        Ok(OpensshTransport {
            sftp: Arc::new(sftp),
        })
    }
}

fn connect_error(host: &str, port: u16, err: openssh::Error) -> Error {
    match &err {
        openssh::Error::Connect(io_err) if io_err.kind() == io::ErrorKind::PermissionDenied => {
            Error::authentication(host, port, err)
        }
        _ => Error::connection(host, port, err),
    }
}

/// An sftp session over a multiplexed openssh connection.
pub struct OpensshTransport {
    sftp: Arc<Sftp>,
}

impl OpensshTransport {
    pub fn sftp(&self) -> &Sftp {
        &self.sftp
    }
}

impl fmt::Debug for OpensshTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpensshTransport").finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for OpensshTransport {
    type Client = OpensshSftp;

    /// Requests of all files opened over this transport share the sftp
    /// channel, only the file handles are per open.
    async fn open_sftp(&self) -> Result<OpensshSftp, Error> {
        Ok(OpensshSftp {
            sftp: Arc::clone(&self.sftp),
        })
    }
}

pub struct OpensshSftp {
    sftp: Arc<Sftp>,
}

#[async_trait]
impl SftpClient for OpensshSftp {
    type File = OpensshFile;

    async fn open(&self, path: &str, mode: OpenMode) -> Result<OpensshFile, Error> {
        let mut options = self.sftp.options();
        match mode.access() {
            Access::Read => options.read(true),
            Access::Write => options.write(true).create(true).truncate(true),
            Access::Append => options.append(true).create(true),
        };

        let file = options
            .open(path)
            .await
            .map_err(|err| Error::remote_file(path, into_io_error(err)))?;

        Ok(OpensshFile {
            inner: Box::pin(TokioCompatFile::new(file)),
            pipelined: false,
            unacked: None,
            _sftp: Arc::clone(&self.sftp),
        })
    }
}

fn into_io_error(err: SftpError) -> io::Error {
    match err {
        SftpError::IOError(err) => err,
        SftpError::SftpError(ref kind, _) => io::Error::new(status_kind(kind), err),
        err => io::Error::new(io::ErrorKind::Other, err),
    }
}

fn status_kind(kind: &SftpErrorKind) -> io::ErrorKind {
    match kind {
        SftpErrorKind::NoSuchFile => io::ErrorKind::NotFound,
        SftpErrorKind::PermDenied => io::ErrorKind::PermissionDenied,
        _ => io::ErrorKind::Other,
    }
}

/// A remote file opened by [`OpensshSftp`].
///
/// Without pipelining every write waits for the server's acknowledgement
/// before returning.
pub struct OpensshFile {
    inner: Pin<Box<TokioCompatFile>>,
    pipelined: bool,
    /// Length of a write that is sent but not acknowledged yet.
    unacked: Option<usize>,
    _sftp: Arc<Sftp>,
}

impl RemoteFile for OpensshFile {
    fn set_pipelined(&mut self, pipelined: bool) {
        self.pipelined = pipelined;
    }
}

impl AsyncRead for OpensshFile {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.inner.as_mut().poll_read(cx, buf)
    }
}

impl AsyncWrite for OpensshFile {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = &mut *self;

        if this.pipelined {
            return this.inner.as_mut().poll_write(cx, buf);
        }

        let n = match this.unacked {
            Some(n) => n,
            None => {
                let n = ready!(this.inner.as_mut().poll_write(cx, buf))?;
                this.unacked = Some(n);
                n
            }
        };

        let res = ready!(this.inner.as_mut().poll_flush(cx));
        this.unacked = None;

        Poll::Ready(res.map(|()| n))
    }

    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        let buf = bufs
            .iter()
            .find(|buf| !buf.is_empty())
            .map_or(&[][..], |buf| &**buf);
        self.poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.inner.as_mut().poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.inner.as_mut().poll_shutdown(cx)
    }
}
