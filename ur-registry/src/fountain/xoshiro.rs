//! Seeded xoshiro256** generator shared by fountain encoders and decoders.

use rand_core::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use sha2::{Digest, Sha256};

use super::sampler::WeightedSampler;

/// xoshiro256** seeded from the SHA-256 digest of arbitrary bytes.
///
/// The digest is read as four big-endian words, so both sides of a transfer
/// derive identical streams from the same seed regardless of platform.
#[derive(Clone, Debug)]
pub struct Xoshiro256 {
    inner: Xoshiro256StarStar,
}

impl Xoshiro256 {
    pub fn from_seed_bytes(seed: &[u8]) -> Self {
        let digest = Sha256::digest(seed);
        let mut state = [0u8; 32];
        for (word, chunk) in state.chunks_exact_mut(8).zip(digest.chunks_exact(8)) {
            // big-endian digest words, little-endian generator state
            word.copy_from_slice(chunk);
            word.reverse();
        }
        Self {
            inner: Xoshiro256StarStar::from_seed(state),
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Uniform in `[0, 1)`.
    pub fn next_double(&mut self) -> f64 {
        self.next_u64() as f64 / (u64::MAX as f64 + 1.0)
    }

    /// Uniform in `[low, high]`.
    pub fn next_int(&mut self, low: u64, high: u64) -> u64 {
        (self.next_double() * (high - low + 1) as f64) as u64 + low
    }

    pub fn next_byte(&mut self) -> u8 {
        self.next_int(0, 255) as u8
    }

    pub fn next_bytes(&mut self, len: usize) -> Vec<u8> {
        (0..len).map(|_| self.next_byte()).collect()
    }

    /// Deterministic shuffle: repeatedly moves a random remaining item to the output.
    pub fn shuffled<T>(&mut self, items: Vec<T>) -> Vec<T> {
        let len = items.len();
        self.shuffled_prefix(items, len)
    }

    /// First `take` items of [`shuffled`](Self::shuffled), without drawing
    /// for the rest.
    pub fn shuffled_prefix<T>(&mut self, mut items: Vec<T>, take: usize) -> Vec<T> {
        let mut shuffled = Vec::with_capacity(take.min(items.len()));
        while shuffled.len() < take && !items.is_empty() {
            let index = self.next_int(0, (items.len() - 1) as u64) as usize;
            shuffled.push(items.remove(index));
        }
        shuffled
    }

    /// Number of fragments to mix, weighted towards low degrees (1/k).
    pub fn choose_degree(&mut self, count: usize) -> usize {
        let weights: Vec<f64> = (1..=count).map(|k| 1.0 / k as f64).collect();
        WeightedSampler::new(&weights).next(self) + 1
    }

    #[cfg(test)]
    pub(crate) fn make_message(seed: &[u8], len: usize) -> Vec<u8> {
        Self::from_seed_bytes(seed).next_bytes(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wolf_stream() {
        let mut rng = Xoshiro256::from_seed_bytes(b"Wolf");
        let values: Vec<u64> = (0..10).map(|_| rng.next_u64() % 100).collect();
        assert_eq!(values, vec![42, 81, 85, 8, 82, 84, 76, 73, 70, 88]);
    }

    #[test]
    fn test_shuffle() {
        let mut rng = Xoshiro256::from_seed_bytes(b"Wolf");
        let shuffled = rng.shuffled((1..=10).collect::<Vec<u32>>());
        assert_eq!(shuffled, vec![6, 4, 9, 3, 10, 5, 7, 8, 1, 2]);

        let mut rng = Xoshiro256::from_seed_bytes(b"Wolf");
        let prefix = rng.shuffled_prefix((1..=10).collect::<Vec<u32>>(), 4);
        assert_eq!(prefix, vec![6, 4, 9, 3]);
    }

    #[test]
    fn test_next_int_bounds() {
        let mut rng = Xoshiro256::from_seed_bytes(b"bounds");
        for _ in 0..1000 {
            let v = rng.next_int(3, 7);
            assert!((3..=7).contains(&v));
        }
        assert_eq!(rng.next_int(5, 5), 5);
    }

    #[test]
    fn test_degree_is_in_range() {
        let mut rng = Xoshiro256::from_seed_bytes(b"degree");
        for _ in 0..1000 {
            let d = rng.choose_degree(11);
            assert!((1..=11).contains(&d));
        }
        assert_eq!(rng.choose_degree(1), 1);
    }

    #[test]
    fn test_message_checksum() {
        let message = Xoshiro256::make_message(b"Wolf", 1024);
        assert_eq!(crate::bytewords::crc32(&message), 0x2f19_f3bb);
    }
}
