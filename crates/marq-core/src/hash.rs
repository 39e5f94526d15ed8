//! Deterministic thread hashing.
//!
//! The canonical payload is the compact JSON object
//! `{"intention","time","region","title","timestamp","previousHash"}` in
//! exactly that key order. Changing the order changes every hash and breaks
//! compatibility with previously exported scrolls.

use serde::Serialize;
use sha2::{Digest, Sha256};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CanonicalThread<'a> {
    intention: &'a str,
    time: &'a str,
    region: &'a str,
    title: &'a str,
    timestamp: i64,
    previous_hash: &'a str,
}

/// SHA-256 of `input`, as 64 lowercase hex characters.
pub fn digest(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Encode the hashed fields of a thread.
pub fn canonical_payload(
    intention: &str,
    time: &str,
    region: &str,
    title: &str,
    timestamp: i64,
    previous_hash: &str,
) -> String {
    let canonical = CanonicalThread {
        intention,
        time,
        region,
        title,
        timestamp,
        previous_hash,
    };
    // A struct of borrowed strings and an integer has no fallible fields.
    serde_json::to_string(&canonical).expect("canonical thread payload serializes")
}
