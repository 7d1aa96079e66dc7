//! 128-bit SimHash signatures.
//!
//! Each distinct term is hashed twice with FNV-1a (different seeds) to get 128
//! bits. Per bit, the term's count is added when the bit is set and subtracted
//! otherwise. The signature keeps the sign of each accumulator.

use crate::text::DocumentStatistics;

const FNV_OFFSET: u64 = 14_695_981_039_346_656_037;
const FNV_PRIME: u64 = 1_099_511_628_211;
const HIGH_SEED: u64 = 0x9E37_79B1_85EB_CA87;

/// Number of bits in a signature.
pub const SIGNATURE_BITS: u32 = 128;

fn fnv1a64(text: &str, seed: u64) -> u64 {
    text.bytes().fold(FNV_OFFSET ^ seed, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

fn accumulate(weights: &mut [i64], hash: u64, weight: i64) {
    for (bit, slot) in weights.iter_mut().enumerate() {
        if hash & (1 << bit) != 0 {
            *slot += weight;
        } else {
            *slot -= weight;
        }
    }
}

fn sign_bits(weights: &[i64]) -> u64 {
    weights
        .iter()
        .enumerate()
        .filter(|(_, weight)| **weight >= 0)
        .fold(0, |bits, (bit, _)| bits | (1 << bit))
}

/// A 128-bit SimHash signature. Bits 0-63 are `low`, 64-127 are `high`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SimHash128 {
    pub high: u64,
    pub low: u64,
}

impl SimHash128 {
    /// Computes the signature of a document's term counts.
    ///
    /// Empty statistics produce all-ones (every accumulator is zero).
    #[must_use]
    pub fn from_statistics(stats: &DocumentStatistics) -> Self {
        let mut low = [0i64; 64];
        let mut high = [0i64; 64];
        for (term, count) in stats.iter() {
            let weight = i64::try_from(count).unwrap_or(i64::MAX);
            accumulate(&mut low, fnv1a64(term, 0), weight);
            accumulate(&mut high, fnv1a64(term, HIGH_SEED), weight);
        }
        Self {
            high: sign_bits(&high),
            low: sign_bits(&low),
        }
    }

    /// Number of differing bits.
    #[must_use]
    pub fn hamming(&self, other: &Self) -> u32 {
        (self.low ^ other.low).count_ones() + (self.high ^ other.high).count_ones()
    }

    /// Fraction of differing bits, a multiple of 1/128.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        f64::from(self.hamming(other)) / f64::from(SIGNATURE_BITS)
    }

    #[must_use]
    pub fn similarity(&self, other: &Self) -> f64 {
        1.0 - self.distance(other)
    }
}

impl std::fmt::Display for SimHash128 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}{:016x}", self.high, self.low)
    }
}
