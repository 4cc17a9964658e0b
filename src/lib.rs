//! Open remote files over sftp from a connection uri.
//!
//! ```text
//! ssh://[user[:password]@]host[:port]/remote/path
//! ```
//!
//! [`open`] parses the uri into [`Credentials`], fetches (or establishes)
//! the transport for that [`ConnectionIdentity`] from a [`TransportCache`],
//! opens the remote file over it and configures write pipelining according
//! to the [`OpenMode`] and [`TransportParams`].
//!
//! The ssh/sftp implementation itself is pluggable through the [`Connector`],
//! [`Transport`], [`SftpClient`] and [`RemoteFile`] traits. Enable the
//! `openssh` feature for an implementation backed by
//! [`openssh`](https://docs.rs/openssh) and
//! [`openssh-sftp-client`](https://docs.rs/openssh-sftp-client).

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub use sftp_open_error::{BoxedSource, Error};

mod uri;
pub use uri::{parse, Credentials, ParsedUri, DEFAULT_PORT, SCHEMES};

mod mode;
pub use mode::{Access, OpenMode};

mod params;
pub use params::{ConnectKwargs, ConnectParams, TransportParams};

mod transport;
pub use transport::{Connector, RemoteFile, RemoteFileOf, SftpClient, Transport};

mod cache;
pub use cache::{ConnectionIdentity, TransportCache};

mod session;
pub use session::open_session;

mod stream;
pub use stream::{configure, SftpStream};

mod opener;
pub use opener::{open, SftpOpener};

#[cfg(feature = "openssh")]
mod openssh_transport;
#[cfg(feature = "openssh")]
pub use openssh_transport::{OpensshConnector, OpensshFile, OpensshSftp, OpensshTransport};

#[cfg(doc)]
/// Changelog for this crate.
pub mod changelog;
