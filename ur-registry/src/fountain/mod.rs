//! Fountain codes for splitting a message across an unbounded stream of parts.
//!
//! The first `count` parts carry the message fragments in order. Every later
//! part carries the XOR of a pseudo-random subset of fragments, chosen by a
//! generator seeded from the part's sequence number and the message checksum.
//! A receiver can therefore join at any point of an animated display and
//! still finish after collecting roughly `count` distinct parts.

mod decoder;
mod encoder;
mod part;
mod sampler;
mod xoshiro;

pub use decoder::FountainDecoder;
pub use encoder::FountainEncoder;
pub use part::FountainPart;

pub use xoshiro::Xoshiro256;

/// Largest fragment count accepted from the wire or produced by an encoder.
///
/// Selecting the fragments of a mixed part costs time and memory linear in
/// the count or worse, so a scanned header must not be able to ask for more.
pub const MAX_FRAGMENT_COUNT: usize = 1 << 16;

/// Result of feeding one part to a decoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeStatus<T> {
    /// More parts are needed.
    Incomplete {
        /// Distinct fragments recovered so far
        received: usize,
        /// Fragments in the message
        expected: usize,
    },
    /// The message is reassembled and its checksum verified.
    Complete(T),
}

impl<T> DecodeStatus<T> {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }
}

/// Fragment length that splits `message_len` bytes into equal pieces no
/// longer than `max_fragment_len`.
///
/// Both arguments must be non-zero.
pub fn fragment_length(message_len: usize, max_fragment_len: usize) -> usize {
    let count = message_len.div_ceil(max_fragment_len);
    message_len.div_ceil(count)
}

/// Indexes of the fragments mixed into part `sequence`.
///
/// Parts up to `count` are plain and carry fragment `sequence - 1`.
pub fn choose_fragments(sequence: u32, count: usize, checksum: u32) -> Vec<usize> {
    if sequence as usize <= count {
        return vec![(sequence as usize).saturating_sub(1)];
    }

    let mut seed = [0u8; 8];
    seed[..4].copy_from_slice(&sequence.to_be_bytes());
    seed[4..].copy_from_slice(&checksum.to_be_bytes());
    let mut rng = Xoshiro256::from_seed_bytes(&seed);

    let degree = rng.choose_degree(count);
    rng.shuffled_prefix((0..count).collect(), degree)
}

pub(crate) fn xor_into(target: &mut [u8], source: &[u8]) {
    for (t, s) in target.iter_mut().zip(source) {
        *t ^= s;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytewords::crc32;

    #[test]
    fn test_fragment_length() {
        assert_eq!(fragment_length(12345, 1955), 1764);
        assert_eq!(fragment_length(12345, 30000), 12345);
        assert_eq!(fragment_length(1024, 100), 94);
        assert_eq!(fragment_length(259, 30), 29);
        assert_eq!(fragment_length(600, 100), 100);
        assert_eq!(fragment_length(500, 150), 125);
    }

    #[test]
    fn test_plain_parts_choose_one_fragment() {
        for seq in 1..=11u32 {
            assert_eq!(choose_fragments(seq, 11, 0xdead_beef), vec![seq as usize - 1]);
        }
    }

    #[test]
    fn test_choose_fragments_vectors() {
        let message = Xoshiro256::make_message(b"Wolf", 1024);
        let checksum = crc32(&message);
        let count = message.len().div_ceil(fragment_length(message.len(), 100));
        assert_eq!(count, 11);

        let expected: [&[usize]; 19] = [
            &[9],
            &[2, 5, 6, 8, 9, 10],
            &[8],
            &[1, 5],
            &[1],
            &[0, 2, 4, 5, 8, 10],
            &[5],
            &[2],
            &[2],
            &[0, 1, 3, 4, 5, 7, 9, 10],
            &[0, 1, 2, 3, 5, 6, 8, 9, 10],
            &[0, 2, 4, 5, 7, 8, 9, 10],
            &[3, 5],
            &[4],
            &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10],
            &[0, 1, 3, 4, 5, 6, 7, 9, 10],
            &[6],
            &[5, 6],
            &[7],
        ];
        for (offset, want) in expected.iter().enumerate() {
            let seq = 12 + offset as u32;
            let mut got = choose_fragments(seq, count, checksum);
            got.sort_unstable();
            assert_eq!(&got, want, "seq {}", seq);
        }
    }

    #[test]
    fn test_choose_fragments_is_deterministic() {
        for seq in 1..200u32 {
            assert_eq!(
                choose_fragments(seq, 7, 0x1234_5678),
                choose_fragments(seq, 7, 0x1234_5678)
            );
        }
    }
}
