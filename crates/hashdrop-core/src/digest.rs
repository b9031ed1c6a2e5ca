//! SHA-256 digest engine.
//!
//! Content is folded into a running hash state chunk by chunk, so the result only
//! depends on the bytes and never on how they were read.

use sha2::{Digest, Sha256};
use std::io;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Read size used when streaming a file into the hash state.
pub const DIGEST_CHUNK_SIZE: usize = 64 * 1024;

/// Hex length of a SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// SHA-256 of zero bytes.
pub const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Running SHA-256 state.
#[derive(Clone, Default)]
pub struct Sha256Digest {
    hasher: Sha256,
    bytes: u64,
}

impl Sha256Digest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
        self.bytes += chunk.len() as u64;
    }

    /// Number of bytes folded in so far.
    pub fn bytes_hashed(&self) -> u64 {
        self.bytes
    }

    /// Consume the state and return the lowercase hex digest.
    pub fn finalize(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

/// Digest an in-memory buffer.
pub fn digest_bytes(data: &[u8]) -> String {
    let mut digest = Sha256Digest::new();
    digest.update(data);
    digest.finalize()
}

/// Digest everything `reader` yields until EOF.
///
/// A read failure is returned as-is; no partial digest escapes.
pub async fn digest_reader<R>(mut reader: R) -> io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut digest = Sha256Digest::new();
    let mut buf = vec![0u8; DIGEST_CHUNK_SIZE];

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        digest.update(&buf[..n]);
    }

    Ok(digest.finalize())
}

/// Digest the file at `path`.
pub async fn digest_file(path: impl AsRef<Path>) -> io::Result<String> {
    let file = tokio::fs::File::open(path.as_ref()).await?;
    digest_reader(file).await
}

/// True when `value` has the shape of a hex SHA-256 digest as produced here.
pub fn is_valid_digest(value: &str) -> bool {
    value.len() == DIGEST_HEX_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
