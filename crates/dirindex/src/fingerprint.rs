//! Polynomial rolling hash used to bucket file names in the index.
//!
//! `fingerprint(name) = Σ c_i · 31^i  (mod 1_000_000_009)` where `c_i` is the
//! code point of the i-th character, accumulated left to right.

/// Bucket key for a file name. Distinct names may collide.
pub type Fingerprint = u64;

const BASE: u64 = 31;
const MODULUS: u64 = 1_000_000_009;

/// Computes the fingerprint of `name`.
///
/// Every intermediate value stays below `MODULUS`, and a code point is at
/// most `0x10FFFF`, so the products fit in a `u64`.
pub fn fingerprint(name: &str) -> Fingerprint {
    let mut hash = 0;
    let mut power = 1;
    for c in name.chars() {
        hash = (hash + (u64::from(c) * power) % MODULUS) % MODULUS;
        power = (power * BASE) % MODULUS;
    }
    hash
}
