//! Bytewords: a byte-per-word text encoding for QR codes.
//!
//! Each byte maps to one of 256 four-letter words whose first and last
//! letters are unique, so the minimal form keeps only those two letters. A
//! CRC32 of the payload (big-endian) is appended before encoding and verified
//! on decode.
//!
//! ```
//! use ur_registry::bytewords::{decode, encode, Style};
//!
//! let text = encode(&[0, 1, 2, 128, 255], Style::Standard);
//! assert_eq!(text, "able acid also lava zoom jade need echo taxi");
//! assert_eq!(decode(&text, Style::Standard).unwrap(), vec![0, 1, 2, 128, 255]);
//! ```

use std::sync::OnceLock;

use crate::{Error, Result};

/// Word separator style.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Style {
    /// Full words separated by spaces.
    Standard,
    /// Full words separated by dashes.
    Uri,
    /// First and last letter of each word, no separator.
    Minimal,
}

#[rustfmt::skip]
const WORDS: [&str; 256] = [
    "able", "acid", "also", "apex", "aqua", "arch", "atom", "aunt",
    "away", "axis", "back", "bald", "barn", "belt", "beta", "bias",
    "blue", "body", "brag", "brew", "bulb", "buzz", "calm", "cash",
    "cats", "chef", "city", "claw", "code", "cola", "cook", "cost",
    "crux", "curl", "cusp", "cyan", "dark", "data", "days", "deli",
    "dice", "diet", "door", "down", "draw", "drop", "drum", "dull",
    "duty", "each", "easy", "echo", "edge", "epic", "even", "exam",
    "exit", "eyes", "fact", "fair", "fern", "figs", "film", "fish",
    "fizz", "flap", "flew", "flux", "foxy", "free", "frog", "fuel",
    "fund", "gala", "game", "gear", "gems", "gift", "girl", "glow",
    "good", "gray", "grim", "guru", "gush", "gyro", "half", "hang",
    "hard", "hawk", "heat", "help", "high", "hill", "holy", "hope",
    "horn", "huts", "iced", "idea", "idle", "inch", "inky", "into",
    "iris", "iron", "item", "jade", "jazz", "join", "jolt", "jowl",
    "judo", "jugs", "jump", "junk", "jury", "keep", "keno", "kept",
    "keys", "kick", "kiln", "king", "kite", "kiwi", "knob", "lamb",
    "lava", "lazy", "leaf", "legs", "liar", "limp", "lion", "list",
    "logo", "loud", "love", "luau", "luck", "lung", "main", "many",
    "math", "maze", "memo", "menu", "meow", "mild", "mint", "miss",
    "monk", "nail", "navy", "need", "news", "next", "noon", "note",
    "numb", "obey", "oboe", "omit", "onyx", "open", "oval", "owls",
    "paid", "part", "peck", "play", "plus", "poem", "pool", "pose",
    "puff", "puma", "purr", "quad", "quiz", "race", "ramp", "real",
    "redo", "rich", "road", "rock", "roof", "ruby", "ruin", "runs",
    "rust", "safe", "saga", "scar", "sets", "silk", "skew", "slot",
    "soap", "solo", "song", "stub", "surf", "swan", "taco", "task",
    "taxi", "tent", "tied", "time", "tiny", "toil", "tomb", "toys",
    "trip", "tuna", "twin", "ugly", "undo", "unit", "urge", "user",
    "vast", "very", "veto", "vial", "vibe", "view", "visa", "void",
    "vows", "wall", "wand", "warm", "wasp", "wave", "waxy", "webs",
    "what", "when", "whiz", "wolf", "work", "yank", "yawn", "yell",
    "yoga", "yurt", "zaps", "zero", "zest", "zinc", "zone", "zoom",
];

/// Message checksum used throughout the UR layer (CRC-32/ISO-HDLC).
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Encode `data` plus its CRC32 in the given style.
pub fn encode(data: &[u8], style: Style) -> String {
    let checksum = crc32(data).to_be_bytes();
    let bytes = data.iter().chain(checksum.iter());
    match style {
        Style::Standard => join_words(bytes, ' '),
        Style::Uri => join_words(bytes, '-'),
        Style::Minimal => {
            let mut out = String::with_capacity((data.len() + 4) * 2);
            for &b in bytes {
                let word = WORDS[b as usize].as_bytes();
                out.push(word[0] as char);
                out.push(word[3] as char);
            }
            out
        }
    }
}

/// Decode text in the given style and verify the trailing CRC32.
pub fn decode(text: &str, style: Style) -> Result<Vec<u8>> {
    let text = text.to_ascii_lowercase();
    let mut bytes = match style {
        Style::Standard => decode_words(text.split(' '))?,
        Style::Uri => decode_words(text.split('-'))?,
        Style::Minimal => decode_minimal(&text)?,
    };
    if bytes.len() < 5 {
        return Err(Error::decode("bytewords: payload too short"));
    }
    let split = bytes.len() - 4;
    let expected = u32::from_be_bytes([
        bytes[split],
        bytes[split + 1],
        bytes[split + 2],
        bytes[split + 3],
    ]);
    bytes.truncate(split);
    let actual = crc32(&bytes);
    if actual != expected {
        return Err(Error::decode(format!(
            "bytewords: checksum mismatch (expected {:08x}, got {:08x})",
            expected, actual
        )));
    }
    Ok(bytes)
}

fn join_words<'a>(bytes: impl Iterator<Item = &'a u8>, separator: char) -> String {
    let mut out = String::new();
    for (i, &b) in bytes.enumerate() {
        if i > 0 {
            out.push(separator);
        }
        out.push_str(WORDS[b as usize]);
    }
    out
}

fn decode_words<'a>(words: impl Iterator<Item = &'a str>) -> Result<Vec<u8>> {
    words
        .map(|word| {
            WORDS
                .binary_search(&word)
                .map(|i| i as u8)
                .map_err(|_| Error::decode(format!("bytewords: unknown word '{}'", word)))
        })
        .collect()
}

fn decode_minimal(text: &str) -> Result<Vec<u8>> {
    let raw = text.as_bytes();
    if raw.len() % 2 != 0 {
        return Err(Error::decode("bytewords: odd minimal length"));
    }
    let table = minimal_table();
    raw.chunks_exact(2)
        .map(|pair| {
            minimal_slot(pair[0], pair[1])
                .and_then(|slot| table[slot])
                .ok_or_else(|| {
                    Error::decode(format!(
                        "bytewords: unknown word '{}'",
                        String::from_utf8_lossy(pair)
                    ))
                })
        })
        .collect()
}

fn minimal_slot(first: u8, last: u8) -> Option<usize> {
    if first.is_ascii_lowercase() && last.is_ascii_lowercase() {
        Some((first - b'a') as usize * 26 + (last - b'a') as usize)
    } else {
        None
    }
}

fn minimal_table() -> &'static [Option<u8>; 26 * 26] {
    static TABLE: OnceLock<[Option<u8>; 26 * 26]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [None; 26 * 26];
        for (i, word) in WORDS.iter().enumerate() {
            let w = word.as_bytes();
            if let Some(slot) = minimal_slot(w[0], w[3]) {
                table[slot] = Some(i as u8);
            }
        }
        table
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_list_is_sorted_and_minimal_unique() {
        assert!(WORDS.windows(2).all(|w| w[0] < w[1]));
        let mut seen = std::collections::HashSet::new();
        for word in WORDS {
            assert_eq!(word.len(), 4);
            assert!(seen.insert((word.as_bytes()[0], word.as_bytes()[3])));
        }
    }

    #[test]
    fn test_known_vector() {
        let data = [0u8, 1, 2, 128, 255];
        assert_eq!(
            encode(&data, Style::Standard),
            "able acid also lava zoom jade need echo taxi"
        );
        assert_eq!(
            encode(&data, Style::Uri),
            "able-acid-also-lava-zoom-jade-need-echo-taxi"
        );
        assert_eq!(encode(&data, Style::Minimal), "aeadaolazmjendeoti");
        for style in [Style::Standard, Style::Uri, Style::Minimal] {
            assert_eq!(decode(&encode(&data, style), style).unwrap(), data);
        }
    }

    #[test]
    fn test_decode_is_case_insensitive() {
        assert_eq!(
            decode("AEADAOLAZMJENDEOTI", Style::Minimal).unwrap(),
            vec![0, 1, 2, 128, 255]
        );
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        // flipped checksum
        assert!(decode("able acid also lava zoom jade need echo tied", Style::Standard).is_err());
        assert!(decode("able acid also lava zzzz jade need echo taxi", Style::Standard).is_err());
        assert!(decode("aeadaolazmjendeot", Style::Minimal).is_err());
        assert!(decode("ae", Style::Minimal).is_err());
        assert!(decode("qqadaolazmjendeoti", Style::Minimal).is_err());
    }

    #[test]
    fn test_crc32() {
        assert_eq!(crc32(b"Hello, world!"), 0xebe6c6e6);
        assert_eq!(crc32(b"Wolf"), 0x598c84dc);
    }
}
