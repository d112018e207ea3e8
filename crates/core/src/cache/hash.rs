//! Request key generation.

use sha2::{Digest, Sha256};
use url::Url;

/// Normalize a URL for keying: the fragment never reaches the server, so it
/// never distinguishes two entries.
pub fn normalize_url(url: &Url) -> String {
    let mut normalized = url.clone();
    normalized.set_fragment(None);
    normalized.into()
}

/// Compute the stable cache key for a method + URL pair.
pub fn compute_request_key(method: &str, url: &Url) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(normalize_url(url).as_bytes());
    hex::encode(hasher.finalize())
}
