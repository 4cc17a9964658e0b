use super::{Error, OpenMode, SftpClient, Transport};

/// Open `remote_path` in `mode` over `transport`.
///
/// A new sftp session is started on every call, even if the transport is
/// shared with other open files.
///
/// # Errors
///
/// [`Error::RemoteFile`] from the sftp server, or any error raised while
/// starting the sftp subsystem.
pub async fn open_session<T>(
    transport: &T,
    remote_path: &str,
    mode: OpenMode,
) -> Result<<T::Client as SftpClient>::File, Error>
where
    T: Transport + ?Sized,
{
    let client = transport.open_sftp().await?;

    #[cfg(feature = "tracing")]
    tracing::trace!(path = remote_path, %mode, "opening remote file");

    client.open(remote_path, mode).await
}
