#![forbid(unsafe_code)]

use std::{error::Error as StdError, io};

use thiserror::Error as ThisError;

/// Boxed error raised by a transport implementation.
pub type BoxedSource = Box<dyn StdError + Send + Sync + 'static>;

/// Error returned by [`sftp-open`](https://docs.rs/sftp-open)
/// and by the transports plugged into it.
#[non_exhaustive]
#[derive(Debug, ThisError)]
pub enum Error {
    /// The connection uri cannot be split into host, port and credentials.
    #[error("Malformed connection uri: {0}.")]
    MalformedUri(String),

    /// The uri scheme is not served by the sftp transport.
    #[error("Unsupported uri scheme {0:?}, expected one of ssh, scp or sftp.")]
    UnsupportedScheme(String),

    /// The open mode is not one of `r`, `w`, `a` or their binary variants.
    #[error("Unsupported open mode {0:?}.")]
    InvalidMode(String),

    /// The remote host accepted the connection but rejected the credentials.
    ///
    /// A transport that failed this way is never cached.
    #[error("Authentication to {host}:{port} was rejected: {source}")]
    Authentication {
        /// Host the connection was made to.
        host: String,
        /// Port the connection was made to.
        port: u16,
        /// Error reported by the transport.
        #[source]
        source: BoxedSource,
    },

    /// Network level failure while connecting.
    ///
    /// A transport that failed this way is never cached.
    #[error("Failed to connect to {host}:{port}: {source}")]
    Connection {
        /// Host the connection was attempted to.
        host: String,
        /// Port the connection was attempted to.
        port: u16,
        /// Error reported by the transport.
        #[source]
        source: BoxedSource,
    },

    /// Opening the remote file failed over an otherwise healthy transport.
    #[error("Failed to open remote file {path:?}: {source}")]
    RemoteFile {
        /// Remote path that was opened.
        path: String,
        /// Underlying cause, e.g. [`io::ErrorKind::NotFound`] or
        /// [`io::ErrorKind::PermissionDenied`].
        #[source]
        source: io::Error,
    },

    /// IO Error: {0}.
    #[error("IO Error: {0}.")]
    IOError(#[from] io::Error),
}

impl Error {
    /// Create [`Error::Authentication`].
    pub fn authentication(
        host: impl Into<String>,
        port: u16,
        source: impl Into<BoxedSource>,
    ) -> Self {
        Error::Authentication {
            host: host.into(),
            port,
            source: source.into(),
        }
    }

    /// Create [`Error::Connection`].
    pub fn connection(host: impl Into<String>, port: u16, source: impl Into<BoxedSource>) -> Self {
        Error::Connection {
            host: host.into(),
            port,
            source: source.into(),
        }
    }

    /// Create [`Error::RemoteFile`].
    pub fn remote_file(path: impl Into<String>, source: io::Error) -> Self {
        Error::RemoteFile {
            path: path.into(),
            source,
        }
    }

    /// Return true if the error happened while establishing the transport.
    pub fn is_connect_error(&self) -> bool {
        matches!(self, Error::Authentication { .. } | Error::Connection { .. })
    }
}
