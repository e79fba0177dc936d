//! Script fingerprinting.
//!
//! A fingerprint is the MD5 digest of the raw script bytes, rendered as
//! lowercase hex in GUID grouping (`8-4-4-4-12`). History tables written by
//! earlier migrators store hashes in this shape, so the format is fixed.

use md5::{Digest, Md5};

/// Length of a rendered fingerprint (32 hex digits plus four hyphens).
pub const FINGERPRINT_LEN: usize = 36;

/// Compute the GUID-formatted MD5 fingerprint of a string
pub fn compute_fingerprint(s: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(s.as_bytes());
    let hex = format!("{:x}", hasher.finalize());

    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}
