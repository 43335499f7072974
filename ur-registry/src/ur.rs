//! Uniform Resource strings.
//!
//! ```text
//! ur:<type>/<bytewords>                 single part
//! ur:<type>/<seq>-<count>/<bytewords>   one part of a fountain-coded stream
//! ```
//!
//! Bytewords are always written in the minimal style. Parsing is
//! case-insensitive so that upper-case strings from QR alphanumeric mode are
//! accepted.

use std::fmt;
use std::str::FromStr;

use crate::bytewords::{self, Style};
use crate::cbor::{self, RecordCodec};
use crate::fountain::{DecodeStatus, FountainDecoder, FountainEncoder, FountainPart};
use crate::{Error, Result};

const SCHEME: &str = "ur:";

/// A typed CBOR payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ur {
    ur_type: String,
    cbor: Vec<u8>,
}

impl Ur {
    pub fn new(ur_type: impl Into<String>, cbor: Vec<u8>) -> Result<Self> {
        let ur_type = ur_type.into();
        if !is_valid_type(&ur_type) {
            return Err(Error::validation(
                "ur_type",
                format!("'{}' must be non-empty lowercase letters, digits or '-'", ur_type),
            ));
        }
        if cbor.is_empty() {
            return Err(Error::validation("cbor", "must not be empty"));
        }
        Ok(Self { ur_type, cbor })
    }

    pub fn from_record<R: RecordCodec>(record: &R) -> Result<Self> {
        Self::new(R::UR_TYPE, cbor::encode(record)?)
    }

    /// Decode the payload as `R`, checking the type name first.
    pub fn decode_record<R: RecordCodec>(&self) -> Result<R> {
        if self.ur_type != R::UR_TYPE {
            return Err(Error::decode(format!(
                "expected ur:{}, found ur:{}",
                R::UR_TYPE,
                self.ur_type
            )));
        }
        cbor::decode(&self.cbor)
    }

    pub fn ur_type(&self) -> &str {
        &self.ur_type
    }

    pub fn cbor(&self) -> &[u8] {
        &self.cbor
    }

    pub fn into_cbor(self) -> Vec<u8> {
        self.cbor
    }
}

/// Single-part form.
impl fmt::Display for Ur {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}/{}",
            SCHEME,
            self.ur_type,
            bytewords::encode(&self.cbor, Style::Minimal)
        )
    }
}

/// Parses single-part URs only; use [`UrDecoder`] for animated sequences.
impl FromStr for Ur {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match parse(s)? {
            Parsed::Single(ur) => Ok(ur),
            Parsed::Multi { .. } => Err(Error::decode(
                "multi-part UR needs a decoder to reassemble",
            )),
        }
    }
}

fn is_valid_type(ur_type: &str) -> bool {
    !ur_type.is_empty()
        && ur_type
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

enum Parsed {
    Single(Ur),
    Multi { ur_type: String, part: FountainPart },
}

fn parse(s: &str) -> Result<Parsed> {
    let lower = s.trim().to_ascii_lowercase();
    let body = lower
        .strip_prefix(SCHEME)
        .ok_or_else(|| Error::decode("UR must start with 'ur:'"))?;
    let components: Vec<&str> = body.split('/').collect();
    let ur_type = components[0];
    if !is_valid_type(ur_type) {
        return Err(Error::decode(format!("invalid UR type '{}'", ur_type)));
    }

    match components[1..] {
        [payload] => {
            let cbor = bytewords::decode(payload, Style::Minimal)?;
            Ur::new(ur_type, cbor)
                .map(Parsed::Single)
                .map_err(|e| Error::decode(e.to_string()))
        }
        [sequence_id, payload] => {
            let (sequence, count) = parse_sequence_id(sequence_id)?;
            let part = FountainPart::from_cbor_bytes(&bytewords::decode(payload, Style::Minimal)?)?;
            if part.sequence() != sequence || part.count() != count {
                return Err(Error::decode(format!(
                    "path says part {}, body says {}",
                    sequence_id,
                    part.sequence_id()
                )));
            }
            Ok(Parsed::Multi {
                ur_type: ur_type.to_string(),
                part,
            })
        }
        _ => Err(Error::decode("UR must have one or two path components")),
    }
}

fn parse_sequence_id(s: &str) -> Result<(u32, usize)> {
    let invalid = || Error::decode(format!("invalid sequence component '{}'", s));
    let (seq, count) = s.split_once('-').ok_or_else(invalid)?;
    let seq: u32 = seq.parse().map_err(|_| invalid())?;
    let count: usize = count.parse().map_err(|_| invalid())?;
    if seq == 0 || count == 0 {
        return Err(invalid());
    }
    Ok((seq, count))
}

/// Produces the strings to display for a UR.
///
/// A payload that fits one fragment always yields the same single-part
/// string. Longer payloads yield an endless fountain-coded sequence.
#[derive(Clone, Debug)]
pub struct UrEncoder {
    ur: Ur,
    fountain: FountainEncoder,
}

impl UrEncoder {
    pub fn new(ur: &Ur, max_fragment_len: usize) -> Result<Self> {
        Ok(Self {
            fountain: FountainEncoder::new(ur.cbor(), max_fragment_len)?,
            ur: ur.clone(),
        })
    }

    pub fn ur_type(&self) -> &str {
        self.ur.ur_type()
    }

    pub fn is_single_part(&self) -> bool {
        self.fountain.is_single_part()
    }

    pub fn fragment_count(&self) -> usize {
        self.fountain.fragment_count()
    }

    pub fn current_sequence(&self) -> u32 {
        self.fountain.current_sequence()
    }

    /// True once every fragment has been shown at least once.
    pub fn is_complete(&self) -> bool {
        self.fountain.is_complete()
    }

    pub fn next_part(&mut self) -> Result<String> {
        if self.is_single_part() {
            return Ok(self.ur.to_string());
        }
        let part = self.fountain.next_part();
        self.encode_part(&part)
    }

    /// Part `sequence` (1-based) without advancing the encoder.
    pub fn part_at(&self, sequence: u32) -> Result<String> {
        if self.is_single_part() {
            return Ok(self.ur.to_string());
        }
        let part = self.fountain.part_at(sequence)?;
        self.encode_part(&part)
    }

    fn encode_part(&self, part: &FountainPart) -> Result<String> {
        Ok(format!(
            "{}{}/{}/{}",
            SCHEME,
            self.ur.ur_type(),
            part.sequence_id(),
            bytewords::encode(&part.to_cbor_bytes()?, Style::Minimal)
        ))
    }
}

/// Reassembles a UR from scanned strings.
///
/// Malformed strings are reported as [`Error::Decode`] and otherwise ignored.
/// A part of another type or another message is a sticky
/// [`Error::Corruption`]; call [`reset`](Self::reset) to scan again.
#[derive(Clone, Debug, Default)]
pub struct UrDecoder {
    ur_type: Option<String>,
    fountain: FountainDecoder,
    result: Option<Ur>,
    failure: Option<Error>,
}

impl UrDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a complete single-part UR, or a multi-part UR whose parts are
    /// all given.
    pub fn decode<I, S>(parts: I) -> Result<Ur>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut decoder = Self::new();
        let mut progress = None;
        for part in parts {
            match decoder.receive(part.as_ref())? {
                DecodeStatus::Complete(ur) => return Ok(ur),
                DecodeStatus::Incomplete { received, expected } => {
                    progress = Some((received, expected));
                }
            }
        }
        match progress {
            Some((received, expected)) => Err(Error::decode(format!(
                "incomplete UR: {} of {} fragments",
                received, expected
            ))),
            None => Err(Error::decode("no UR parts given")),
        }
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, part)))]
    pub fn receive(&mut self, part: &str) -> Result<DecodeStatus<Ur>> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        if let Some(ur) = &self.result {
            return Ok(DecodeStatus::Complete(ur.clone()));
        }

        match parse(part)? {
            Parsed::Single(ur) => {
                if self.fountain.expected_count() > 0 || self.ur_type.is_some() {
                    return Err(self.fail(Error::corruption(format!(
                        "single-part ur:{} received while reassembling another message",
                        ur.ur_type()
                    ))));
                }
                self.result = Some(ur.clone());
                Ok(DecodeStatus::Complete(ur))
            }
            Parsed::Multi { ur_type, part } => {
                match &self.ur_type {
                    Some(locked) if *locked != ur_type => {
                        return Err(self.fail(Error::corruption(format!(
                            "expected ur:{}, received ur:{}",
                            locked, ur_type
                        ))));
                    }
                    Some(_) => {}
                    None => self.ur_type = Some(ur_type.clone()),
                }

                match self.fountain.receive(&part)? {
                    DecodeStatus::Complete(message) => {
                        let ur = Ur::new(ur_type, message)?;
                        self.result = Some(ur.clone());
                        Ok(DecodeStatus::Complete(ur))
                    }
                    DecodeStatus::Incomplete { received, expected } => {
                        Ok(DecodeStatus::Incomplete { received, expected })
                    }
                }
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some() || self.fountain.is_failed()
    }

    pub fn result(&self) -> Option<&Ur> {
        self.result.as_ref()
    }

    /// Type of the UR being reassembled, once known.
    pub fn ur_type(&self) -> Option<&str> {
        self.result
            .as_ref()
            .map(Ur::ur_type)
            .or(self.ur_type.as_deref())
    }

    pub fn received_count(&self) -> usize {
        match &self.result {
            Some(_) => self.expected_count().max(1),
            None => self.fountain.received_count(),
        }
    }

    pub fn expected_count(&self) -> usize {
        match (&self.result, self.fountain.expected_count()) {
            (Some(_), 0) => 1,
            (_, count) => count,
        }
    }

    /// Recovered fraction in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.result.is_some() {
            1.0
        } else {
            self.fountain.progress()
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn fail(&mut self, err: Error) -> Error {
        #[cfg(feature = "tracing")]
        tracing::warn!(error = %err, "UR decoder failed");
        self.failure = Some(err.clone());
        err
    }
}
