use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::{xor_into, DecodeStatus, FountainPart};
use crate::bytewords::crc32;
use crate::{Error, Result};

/// Message parameters every part of one transfer agrees on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct MessageParams {
    count: usize,
    message_len: usize,
    checksum: u32,
    fragment_len: usize,
}

impl MessageParams {
    fn of(part: &FountainPart) -> Self {
        Self {
            count: part.count(),
            message_len: part.message_len(),
            checksum: part.checksum(),
            fragment_len: part.data().len(),
        }
    }
}

#[derive(Clone, Debug)]
struct MixedPart {
    indexes: BTreeSet<usize>,
    data: Vec<u8>,
}

/// Reassembles a message from fountain parts received in any order.
///
/// The decoder locks onto the message described by the first part it
/// accepts. Any inconsistency after that (a part from another message, two
/// different payloads under one sequence number, a failed final checksum) is
/// a [`Error::Corruption`] that sticks until [`reset`](Self::reset).
#[derive(Clone, Debug, Default)]
pub struct FountainDecoder {
    params: Option<MessageParams>,
    seen: HashMap<u32, Vec<u8>>,
    plain: BTreeMap<usize, Vec<u8>>,
    mixed: Vec<MixedPart>,
    result: Option<Vec<u8>>,
    failure: Option<Error>,
}

impl FountainDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one part.
    ///
    /// Once complete, further parts are ignored and the message is returned
    /// again.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, part), fields(seq = part.sequence())))]
    pub fn receive(&mut self, part: &FountainPart) -> Result<DecodeStatus<Vec<u8>>> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        if let Some(message) = &self.result {
            return Ok(DecodeStatus::Complete(message.clone()));
        }

        match self.accept(part) {
            Ok(()) => Ok(self.status()),
            Err(err) => {
                if err.requires_rescan() {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(error = %err, "fountain decoder failed");
                    self.failure = Some(err.clone());
                }
                Err(err)
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// The reassembled message, once complete.
    pub fn message(&self) -> Option<&[u8]> {
        self.result.as_deref()
    }

    /// Distinct plain fragments recovered so far.
    pub fn received_count(&self) -> usize {
        match &self.result {
            Some(_) => self.expected_count(),
            None => self.plain.len(),
        }
    }

    /// Fragments in the message, or 0 before the first part.
    pub fn expected_count(&self) -> usize {
        self.params.map_or(0, |p| p.count)
    }

    /// Recovered fraction of the message in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        match self.expected_count() {
            0 => 0.0,
            expected => self.received_count() as f64 / expected as f64,
        }
    }

    /// Drop all state, including a recorded failure.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn status(&self) -> DecodeStatus<Vec<u8>> {
        match &self.result {
            Some(message) => DecodeStatus::Complete(message.clone()),
            None => DecodeStatus::Incomplete {
                received: self.received_count(),
                expected: self.expected_count(),
            },
        }
    }

    fn accept(&mut self, part: &FountainPart) -> Result<()> {
        let params = MessageParams::of(part);
        match self.params {
            None => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    count = params.count,
                    message_len = params.message_len,
                    checksum = params.checksum,
                    "locked onto message"
                );
                self.params = Some(params);
            }
            Some(locked) if locked != params => {
                return Err(Error::corruption(format!(
                    "part {} belongs to a different message",
                    part.sequence_id()
                )));
            }
            Some(_) => {}
        }

        match self.seen.get(&part.sequence()) {
            Some(data) if data.as_slice() == part.data() => return Ok(()),
            Some(_) => {
                return Err(Error::corruption(format!(
                    "part {} received twice with different content",
                    part.sequence_id()
                )));
            }
            None => {
                self.seen.insert(part.sequence(), part.data().to_vec());
            }
        }

        let indexes = part.indexes().into_iter().collect();
        self.process(indexes, part.data().to_vec())?;

        if self.plain.len() == params.count {
            self.finish(params)?;
        }
        Ok(())
    }

    fn process(&mut self, indexes: BTreeSet<usize>, data: Vec<u8>) -> Result<()> {
        let mut queue = vec![MixedPart { indexes, data }];
        while let Some(part) = queue.pop() {
            match part.indexes.len() {
                0 => {
                    if part.data.iter().any(|&b| b != 0) {
                        return Err(Error::corruption("parts disagree on fragment content"));
                    }
                }
                1 => self.add_plain(part, &mut queue)?,
                _ => self.add_mixed(part, &mut queue)?,
            }
        }
        Ok(())
    }

    fn add_plain(&mut self, part: MixedPart, queue: &mut Vec<MixedPart>) -> Result<()> {
        let Some(&index) = part.indexes.first() else {
            return Ok(());
        };
        if let Some(known) = self.plain.get(&index) {
            if *known != part.data {
                return Err(Error::corruption(format!(
                    "fragment {} reconstructed with different content",
                    index
                )));
            }
            return Ok(());
        }

        // Every stored mixed part covering this fragment shrinks by one.
        let (affected, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.mixed)
            .into_iter()
            .partition(|m| m.indexes.contains(&index));
        self.mixed = kept;
        for mut mixed in affected {
            mixed.indexes.remove(&index);
            xor_into(&mut mixed.data, &part.data);
            queue.push(mixed);
        }

        self.plain.insert(index, part.data);
        Ok(())
    }

    fn add_mixed(&mut self, mut part: MixedPart, queue: &mut Vec<MixedPart>) -> Result<()> {
        let known: Vec<usize> = part
            .indexes
            .iter()
            .copied()
            .filter(|i| self.plain.contains_key(i))
            .collect();
        for index in known {
            if let Some(data) = self.plain.get(&index) {
                xor_into(&mut part.data, data);
            }
            part.indexes.remove(&index);
        }

        loop {
            let subset = self
                .mixed
                .iter()
                .find(|m| is_strict_subset(&m.indexes, &part.indexes));
            let Some(subset) = subset else {
                break;
            };
            part.indexes = &part.indexes - &subset.indexes;
            xor_into(&mut part.data, &subset.data);
        }

        if part.indexes.len() < 2 {
            queue.push(part);
            return Ok(());
        }

        if let Some(existing) = self.mixed.iter().find(|m| m.indexes == part.indexes) {
            if existing.data != part.data {
                return Err(Error::corruption("parts disagree on fragment content"));
            }
            return Ok(());
        }

        let (affected, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.mixed)
            .into_iter()
            .partition(|m| is_strict_subset(&part.indexes, &m.indexes));
        self.mixed = kept;
        for mut mixed in affected {
            mixed.indexes = &mixed.indexes - &part.indexes;
            xor_into(&mut mixed.data, &part.data);
            queue.push(mixed);
        }

        self.mixed.push(part);
        Ok(())
    }

    fn finish(&mut self, params: MessageParams) -> Result<()> {
        let mut message = Vec::with_capacity(params.count * params.fragment_len);
        for fragment in self.plain.values() {
            message.extend_from_slice(fragment);
        }
        message.truncate(params.message_len);

        let actual = crc32(&message);
        if actual != params.checksum {
            return Err(Error::corruption(format!(
                "message checksum mismatch (expected {:08x}, got {:08x})",
                params.checksum, actual
            )));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(len = message.len(), "message reassembled");

        self.mixed.clear();
        self.result = Some(message);
        Ok(())
    }
}

fn is_strict_subset(a: &BTreeSet<usize>, b: &BTreeSet<usize>) -> bool {
    a.len() < b.len() && a.is_subset(b)
}
