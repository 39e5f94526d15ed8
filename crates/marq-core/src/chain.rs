//! Hash chain verification over plain thread sequences.

use crate::thread::{Thread, GENESIS_HASH};

/// Locate the first thread that breaks the chain.
///
/// Each thread is rehashed against the hash it *should* link to: the
/// preceding thread's stored hash, or [`GENESIS_HASH`] at index 0. A thread
/// breaks the chain when the recomputed hash differs from its stored hash or
/// when its stored `previous_hash` is not that expected link. The walk stops
/// at the first break; later threads are not examined.
pub fn first_broken_link(threads: &[Thread]) -> Option<usize> {
    let mut expected_previous = GENESIS_HASH;
    for (index, thread) in threads.iter().enumerate() {
        if thread.previous_hash != expected_previous
            || thread.compute_hash(expected_previous) != thread.hash
        {
            return Some(index);
        }
        expected_previous = &thread.hash;
    }
    None
}

/// Returns true when every thread links to its predecessor.
pub fn verify_chain(threads: &[Thread]) -> bool {
    first_broken_link(threads).is_none()
}
