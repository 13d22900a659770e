//! Content hashing for local files.
//!
//! BLAKE3 is the default. When the remote store reports a native content hash
//! (SHA-256 for the cloud store), the local side computes the same algorithm so
//! the reconciler can compare digests directly.

use crate::types::{Fingerprint, HashAlgorithm};
use blake3::Hasher;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Compute a hex digest of in-memory content.
pub fn compute_content_hash(algorithm: HashAlgorithm, content: &[u8]) -> String {
    match algorithm {
        HashAlgorithm::Blake3 => {
            let mut hasher = Hasher::new();
            hasher.update(content);
            hasher.finalize().to_hex().to_string()
        }
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(content);
            hex::encode(hasher.finalize())
        }
    }
}

/// Stream a file through the hasher without loading it whole.
pub fn hash_file(path: &Path, algorithm: HashAlgorithm) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    match algorithm {
        HashAlgorithm::Blake3 => {
            let mut hasher = Hasher::new();
            loop {
                let read = file.read(&mut buffer)?;
                if read == 0 {
                    break;
                }
                hasher.update(&buffer[..read]);
            }
            Ok(hasher.finalize().to_hex().to_string())
        }
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            loop {
                let read = file.read(&mut buffer)?;
                if read == 0 {
                    break;
                }
                hasher.update(&buffer[..read]);
            }
            Ok(hex::encode(hasher.finalize()))
        }
    }
}

/// Hash a file and wrap the digest as a content fingerprint.
pub fn fingerprint_file(path: &Path, algorithm: HashAlgorithm) -> io::Result<Fingerprint> {
    Ok(Fingerprint::content_hash(algorithm, hash_file(path, algorithm)?))
}
