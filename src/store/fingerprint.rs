// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content fingerprints and text normalization for submitted documents.

/// BLAKE3 digest of the raw bytes, lowercase hex.
pub fn fingerprint(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Decode bytes as UTF-8, dropping invalid sequences instead of replacing them.
pub fn normalize_utf8(bytes: &[u8]) -> String {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_string();
    }
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}
