//! Shared value types: content fingerprints and transfer direction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Content hash algorithms a store can compute or report natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Blake3,
    Sha256,
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Blake3 => write!(f, "blake3"),
            HashAlgorithm::Sha256 => write!(f, "sha256"),
        }
    }
}

/// Identity of a file's content as reported by one store.
///
/// A locally computed hash and a provider revision (ETag, revision id) are
/// different kinds of value. They are never compared with each other; see
/// [`Fingerprint::compare`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fingerprint {
    ContentHash {
        algorithm: HashAlgorithm,
        digest: String,
    },
    ProviderRevision {
        value: String,
    },
}

/// Outcome of comparing two fingerprints across stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerprintMatch {
    Equal,
    Different,
    /// The pair is not comparable (different kinds, different algorithms, or missing).
    Unknown,
}

impl Fingerprint {
    pub fn content_hash(algorithm: HashAlgorithm, digest: impl Into<String>) -> Self {
        Fingerprint::ContentHash {
            algorithm,
            digest: digest.into(),
        }
    }

    pub fn revision(value: impl Into<String>) -> Self {
        Fingerprint::ProviderRevision {
            value: value.into(),
        }
    }

    /// Compare fingerprints taken from two different stores.
    ///
    /// Content hashes are comparable when they share an algorithm. Two provider
    /// revisions compare by value. A hash and a revision are never comparable.
    pub fn compare(a: Option<&Fingerprint>, b: Option<&Fingerprint>) -> FingerprintMatch {
        match (a, b) {
            (
                Some(Fingerprint::ContentHash {
                    algorithm: alg_a,
                    digest: digest_a,
                }),
                Some(Fingerprint::ContentHash {
                    algorithm: alg_b,
                    digest: digest_b,
                }),
            ) if alg_a == alg_b => {
                if digest_a.eq_ignore_ascii_case(digest_b) {
                    FingerprintMatch::Equal
                } else {
                    FingerprintMatch::Different
                }
            }
            (
                Some(Fingerprint::ProviderRevision { value: a }),
                Some(Fingerprint::ProviderRevision { value: b }),
            ) => {
                if a == b {
                    FingerprintMatch::Equal
                } else {
                    FingerprintMatch::Different
                }
            }
            _ => FingerprintMatch::Unknown,
        }
    }
}

/// Which side is authoritative for a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Local to remote.
    Save,
    /// Remote to local.
    Load,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Save => write!(f, "save"),
            Direction::Load => write!(f, "load"),
        }
    }
}
