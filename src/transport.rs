use super::{ConnectParams, Error, OpenMode};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

/// Establishes authenticated transports.
#[async_trait]
pub trait Connector: Send + Sync {
    type Transport: Transport;

    /// Connect to `params.host:params.port` and authenticate.
    ///
    /// Must fail with [`Error::Authentication`] when the credentials are
    /// rejected and [`Error::Connection`] on network failures. Timeouts are
    /// up to the implementation.
    async fn connect(&self, params: &ConnectParams) -> Result<Self::Transport, Error>;
}

/// A live, authenticated connection able to multiplex sftp sessions.
///
/// Shared between every stream opened against the same identity,
/// so it is only ever accessed through `&self`.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    type Client: SftpClient;

    /// Start a new sftp subsystem over this transport.
    async fn open_sftp(&self) -> Result<Self::Client, Error>;
}

/// The sftp subsystem of a [`Transport`].
#[async_trait]
pub trait SftpClient: Send + Sync {
    type File: RemoteFile;

    /// Open `path` in `mode`.
    ///
    /// Must fail with [`Error::RemoteFile`] when the path does not exist,
    /// permission is denied or, for writable modes, its parent directory
    /// is missing.
    async fn open(&self, path: &str, mode: OpenMode) -> Result<Self::File, Error>;
}

/// A remote file handle.
///
/// The returned file must stay usable after the [`SftpClient`] it came from
/// is dropped.
pub trait RemoteFile: AsyncRead + AsyncWrite + Send + Unpin {
    /// Enable or disable pipelined writes.
    fn set_pipelined(&mut self, pipelined: bool);
}

/// The file type produced by the transports of connector `C`.
pub type RemoteFileOf<C> =
    <<<C as Connector>::Transport as Transport>::Client as SftpClient>::File;
