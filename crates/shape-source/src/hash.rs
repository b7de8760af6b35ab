//! SHA-256 digests over source content.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{Result, SourceError};

/// Buffer size for streaming digests.
const BUFFER_SIZE: usize = 65536; // 64 KB

/// Length of a hex-encoded SHA-256 digest.
pub const SHA256_HEX_LEN: usize = 64;

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(digest)
}

/// Compute the SHA-256 of a file's bytes.
pub fn compute_file_sha256(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| SourceError::io(path, e))?;
    let digest = compute_reader_sha256(file).map_err(|e| SourceError::io(path, e))?;
    debug!(path = %path.display(), sha256 = %digest, "computed file digest");
    Ok(digest)
}

/// Compute the SHA-256 of everything readable from `reader`.
pub fn compute_reader_sha256(reader: impl Read) -> std::io::Result<String> {
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, reader);
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Check that `value` is a hex SHA-256 and return it lower-cased.
pub fn normalize_checksum(value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.len() != SHA256_HEX_LEN || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(SourceError::InvalidChecksum {
            value: value.to_string(),
        });
    }
    Ok(trimmed.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const ABC: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn known_digest() {
        assert_eq!(sha256_hex(b"abc"), ABC);
    }

    #[test]
    fn file_digest_matches_in_memory_digest() {
        let mut file = NamedTempFile::new().unwrap();
        let content = vec![7u8; BUFFER_SIZE * 2 + 13];
        file.write_all(&content).unwrap();
        assert_eq!(compute_file_sha256(file.path()).unwrap(), sha256_hex(&content));
    }

    #[test]
    fn normalize_lowercases_and_rejects_malformed() {
        assert_eq!(normalize_checksum(&ABC.to_uppercase()).unwrap(), ABC);
        assert!(normalize_checksum("").is_err());
        assert!(normalize_checksum(&ABC[..63]).is_err());
        assert!(normalize_checksum(&format!("{}g", &ABC[..63])).is_err());
    }
}
