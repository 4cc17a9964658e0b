#[allow(unused_imports)]
use crate::*;

#[doc(hidden)]
pub mod unreleased {}

/// ## Added
///  - [`open`] and [`SftpOpener`] opening [`SftpStream`]s from
///    `ssh://`, `scp://` and `sftp://` uris.
///  - [`TransportCache`] sharing one transport per [`ConnectionIdentity`].
///  - [`TransportParams`] with `connect_kwargs` overrides and
///    `write_pipelining`.
///  - Traits [`Connector`], [`Transport`], [`SftpClient`] and [`RemoteFile`]
///    for plugging in an ssh implementation.
///  - Feature `openssh` providing `OpensshConnector`.
///  - Feature `tracing` logging cache and open events.
pub mod v0_1_0 {}
