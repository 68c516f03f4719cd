//! Seed derivation for call-local random streams.

use rand::SeedableRng;
use rand::rngs::StdRng;
use sha2::{Digest, Sha256};

/// Maps a seed string to a stable 64-bit value.
///
/// The first eight bytes of the SHA-256 digest, little-endian. Stable across
/// platforms and processes, unlike `std::hash`.
pub fn seed_value(seed: &str) -> u64 {
    let digest = Sha256::digest(seed.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

/// A fresh RNG for one schedule walk.
pub fn schedule_rng(seed: &str) -> StdRng {
    StdRng::seed_from_u64(seed_value(seed))
}

/// A fresh RNG for Ken Burns draws, independent of the schedule stream.
pub fn motion_rng(seed: &str) -> StdRng {
    StdRng::seed_from_u64(seed_value(&format!("{seed}:motion")))
}
