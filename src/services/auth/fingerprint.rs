use sha2::{Digest, Sha256};

/// Hex SHA-256 of a credential. Used for log fields and storage keys so the raw
/// bearer string never leaves the request.
pub fn fingerprint(identifier: &str) -> String {
    format!("{:x}", Sha256::digest(identifier.as_bytes()))
}

/// First 12 hex chars, enough to correlate log lines.
pub fn short_fingerprint(identifier: &str) -> String {
    let mut fp = fingerprint(identifier);
    fp.truncate(12);
    fp
}
