//! Offline threading ids.
//!
//! The send-message mutation needs a client-generated 64-bit id: the
//! millisecond timestamp in the high 42 bits, 22 random bits below.

use std::time::{SystemTime, UNIX_EPOCH};

const RANDOM_BITS: u32 = 22;
const RANDOM_MASK: u64 = (1 << RANDOM_BITS) - 1;

/// Pack a millisecond timestamp and random bits into a threading id.
///
/// Timestamp bits shifted past bit 63 are discarded.
pub fn offline_threading_id(timestamp_ms: u64, random: u64) -> u64 {
    (timestamp_ms << RANDOM_BITS) | (random & RANDOM_MASK)
}

/// Timestamp component of a threading id.
pub fn threading_id_timestamp(id: u64) -> u64 {
    id >> RANDOM_BITS
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Generate a fresh threading id, rendered the way the mutation expects.
pub fn generate_offline_threading_id() -> String {
    offline_threading_id(now_millis(), rand::random::<u64>()).to_string()
}
