use super::{choose_fragments, fragment_length, xor_into, FountainPart, MAX_FRAGMENT_COUNT};
use crate::bytewords::crc32;
use crate::{Error, Result};

/// Splits a message into equal fragments and emits an endless part stream.
///
/// Parts are a pure function of their sequence number, so a producer that
/// restarts mid-stream emits exactly the parts it would have emitted before.
#[derive(Clone, Debug)]
pub struct FountainEncoder {
    fragments: Vec<Vec<u8>>,
    message_len: usize,
    checksum: u32,
    current_sequence: u32,
}

impl FountainEncoder {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(message), fields(len = message.len())))]
    pub fn new(message: &[u8], max_fragment_len: usize) -> Result<Self> {
        if message.is_empty() {
            return Err(Error::validation("message", "must not be empty"));
        }
        if max_fragment_len == 0 {
            return Err(Error::validation("max_fragment_len", "must be positive"));
        }

        let fragment_len = fragment_length(message.len(), max_fragment_len);
        let fragments: Vec<Vec<u8>> = message
            .chunks(fragment_len)
            .map(|chunk| {
                let mut fragment = chunk.to_vec();
                fragment.resize(fragment_len, 0);
                fragment
            })
            .collect();
        if fragments.len() > MAX_FRAGMENT_COUNT {
            return Err(Error::validation(
                "max_fragment_len",
                format!(
                    "message would need {} fragments, limit is {}",
                    fragments.len(),
                    MAX_FRAGMENT_COUNT
                ),
            ));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(count = fragments.len(), fragment_len, "fountain encoder ready");

        Ok(Self {
            fragments,
            message_len: message.len(),
            checksum: crc32(message),
            current_sequence: 0,
        })
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    pub fn fragment_len(&self) -> usize {
        self.fragments.first().map_or(0, Vec::len)
    }

    pub fn message_len(&self) -> usize {
        self.message_len
    }

    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    /// Sequence number of the last part returned by [`next_part`](Self::next_part).
    pub fn current_sequence(&self) -> u32 {
        self.current_sequence
    }

    pub fn is_single_part(&self) -> bool {
        self.fragments.len() == 1
    }

    /// True once every plain fragment has been emitted at least once.
    pub fn is_complete(&self) -> bool {
        self.current_sequence as usize >= self.fragments.len()
    }

    pub fn next_part(&mut self) -> FountainPart {
        self.current_sequence = self.current_sequence.checked_add(1).unwrap_or(1);
        self.build_part(self.current_sequence)
    }

    /// The part with the given 1-based sequence number.
    pub fn part_at(&self, sequence: u32) -> Result<FountainPart> {
        if sequence == 0 {
            return Err(Error::validation("sequence", "must start at 1"));
        }
        Ok(self.build_part(sequence))
    }

    fn build_part(&self, sequence: u32) -> FountainPart {
        let mut data = vec![0u8; self.fragment_len()];
        for index in choose_fragments(sequence, self.fragments.len(), self.checksum) {
            xor_into(&mut data, &self.fragments[index]);
        }
        FountainPart::new(
            sequence,
            self.fragments.len(),
            self.message_len,
            self.checksum,
            data,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fountain::Xoshiro256;

    #[test]
    fn test_rejects_invalid_arguments() {
        assert!(matches!(
            FountainEncoder::new(&[], 10),
            Err(Error::Validation { field: "message", .. })
        ));
        assert!(matches!(
            FountainEncoder::new(&[1, 2, 3], 0),
            Err(Error::Validation { field: "max_fragment_len", .. })
        ));
        assert!(matches!(
            FountainEncoder::new(&vec![7u8; MAX_FRAGMENT_COUNT + 1], 1),
            Err(Error::Validation { field: "max_fragment_len", .. })
        ));
        assert_eq!(
            FountainEncoder::new(&vec![7u8; MAX_FRAGMENT_COUNT], 1)
                .unwrap()
                .fragment_count(),
            MAX_FRAGMENT_COUNT
        );
    }

    #[test]
    fn test_single_fragment() {
        let mut encoder = FountainEncoder::new(b"hello", 400).unwrap();
        assert!(encoder.is_single_part());
        let first = encoder.next_part();
        assert_eq!(first.data(), b"hello");
        assert!(encoder.is_complete());
    }

    #[test]
    fn test_fragmentation_and_padding() {
        let message = Xoshiro256::make_message(b"Wolf", 1024);
        let encoder = FountainEncoder::new(&message, 100).unwrap();
        assert_eq!(encoder.fragment_count(), 11);
        assert_eq!(encoder.fragment_len(), 94);
        assert_eq!(encoder.checksum(), 0x2f19_f3bb);

        let last = encoder.part_at(11).unwrap();
        assert_eq!(&last.data()[..1024 - 940], &message[940..]);
        assert!(last.data()[1024 - 940..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_mixed_parts_are_xor_of_fragments() {
        let message = Xoshiro256::make_message(b"Wolf", 1024);
        let encoder = FountainEncoder::new(&message, 100).unwrap();
        let part = encoder.part_at(15).unwrap();
        let mut expected = vec![0u8; 94];
        for index in [1u32, 5] {
            xor_into(&mut expected, encoder.part_at(index + 1).unwrap().data());
        }
        assert_eq!(part.data(), expected.as_slice());
    }

    #[test]
    fn test_restart_is_deterministic() {
        let message = Xoshiro256::make_message(b"restart", 600);
        let mut a = FountainEncoder::new(&message, 100).unwrap();
        let first: Vec<FountainPart> = (0..30).map(|_| a.next_part()).collect();
        let mut b = FountainEncoder::new(&message, 100).unwrap();
        let second: Vec<FountainPart> = (0..30).map(|_| b.next_part()).collect();
        assert_eq!(first, second);
        assert_eq!(first[20], a.part_at(21).unwrap());
        assert_eq!(a.current_sequence(), 30);
    }

    #[test]
    fn test_part_at_zero_is_rejected() {
        let encoder = FountainEncoder::new(b"abc", 1).unwrap();
        assert!(encoder.part_at(0).is_err());
    }
}
