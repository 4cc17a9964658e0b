#![allow(dead_code)]

pub use sftp_test_common::*;

use sftp_open::{SftpOpener, SftpStream, TransportParams};

pub type Stream = SftpStream<MockFile>;

/// An opener over a fresh cache, with `/data.txt` and `/upload` present.
pub fn opener() -> SftpOpener<MockConnector> {
    let connector = MockConnector::new();
    connector
        .put_file("/data.txt", b"HELLO, WORLD!\n")
        .add_dir("/upload");

    SftpOpener::new(connector)
}

pub async fn open(opener: &SftpOpener<MockConnector>, uri: &str, mode: &str) -> Stream {
    opener
        .open(uri, mode, &TransportParams::new())
        .await
        .unwrap()
}
