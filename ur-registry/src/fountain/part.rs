use serde_cbor::Value;

use super::{choose_fragments, MAX_FRAGMENT_COUNT};
use crate::cbor;
use crate::{Error, Result};

/// One emitted part of a fountain-coded message.
///
/// Wire form is the CBOR array `[seq, count, message_len, checksum, data]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FountainPart {
    sequence: u32,
    count: usize,
    message_len: usize,
    checksum: u32,
    data: Vec<u8>,
}

impl FountainPart {
    pub(crate) fn new(
        sequence: u32,
        count: usize,
        message_len: usize,
        checksum: u32,
        data: Vec<u8>,
    ) -> Self {
        Self {
            sequence,
            count,
            message_len,
            checksum,
            data,
        }
    }

    /// 1-based sequence number.
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Number of plain fragments in the message.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn message_len(&self) -> usize {
        self.message_len
    }

    /// CRC32 of the whole message.
    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Whether this part carries a single fragment verbatim.
    pub fn is_plain(&self) -> bool {
        self.sequence as usize <= self.count
    }

    /// Fragment indexes XORed into this part.
    pub fn indexes(&self) -> Vec<usize> {
        choose_fragments(self.sequence, self.count, self.checksum)
    }

    /// `"seq-count"`, as it appears in a multi-part UR.
    pub fn sequence_id(&self) -> String {
        format!("{}-{}", self.sequence, self.count)
    }

    pub fn to_cbor_bytes(&self) -> Result<Vec<u8>> {
        cbor::to_bytes(&Value::Array(vec![
            cbor::uint(self.sequence),
            cbor::uint(self.count as u64),
            cbor::uint(self.message_len as u64),
            cbor::uint(self.checksum),
            Value::Bytes(self.data.clone()),
        ]))
    }

    /// Parse a part and check it is internally consistent.
    pub fn from_cbor_bytes(bytes: &[u8]) -> Result<Self> {
        let items = cbor::as_array(cbor::from_bytes(bytes)?, "fountain part")?;
        let [sequence, count, message_len, checksum, data]: [Value; 5] =
            items.try_into().map_err(|v: Vec<Value>| {
                Error::decode(format!("fountain part: expected 5 items, found {}", v.len()))
            })?;

        let sequence = cbor::as_u32(&sequence, "sequence")?;
        let count = cbor::as_u32(&count, "fragment count")? as usize;
        let message_len = usize::try_from(cbor::as_uint(&message_len, "message length")?)
            .map_err(|_| Error::decode("fountain part: message length out of range"))?;
        let checksum = cbor::as_u32(&checksum, "checksum")?;
        let data = cbor::as_bytes(data, "fragment data")?;

        if sequence == 0 || count == 0 || message_len == 0 || data.is_empty() {
            return Err(Error::decode(
                "fountain part: sequence, count, length and data must be non-zero",
            ));
        }
        if count > MAX_FRAGMENT_COUNT {
            return Err(Error::decode(format!(
                "fountain part: {} fragments exceeds the limit of {}",
                count, MAX_FRAGMENT_COUNT
            )));
        }
        if message_len.div_ceil(data.len()) != count {
            return Err(Error::decode(format!(
                "fountain part: {} fragments of {} bytes cannot hold {} bytes",
                count,
                data.len(),
                message_len
            )));
        }

        Ok(Self::new(sequence, count, message_len, checksum, data))
    }
}
