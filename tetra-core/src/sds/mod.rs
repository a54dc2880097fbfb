//! SDS Decoder (C6): total decode function for reassembled Short Data
//! Service payloads.

pub mod gsm7;
pub mod lip;

use lip::LipFix;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingTag {
    Sds1,
    SdsGsm,
    Iso8859_1,
    Ascii,
    Utf8,
    Windows1252,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SdsMessage {
    Text(EncodingTag, String),
    Location(LipFix),
    /// Raw NMEA sentence, passed through unparsed.
    Nmea(String),
    /// High-entropy payload assumed to be ciphertext.
    BinaryEncrypted(Vec<u8>),
    /// Low-entropy payload that matched no other dispatch rule.
    BinaryHex(Vec<u8>),
}

const PRINTABLE_RATIO_THRESHOLD: f64 = 0.6;

/// Decode a reassembled SDS payload. Total: always returns a value, falling
/// back to `Binary` when nothing else matches.
pub fn decode(bytes: &[u8]) -> SdsMessage {
    if bytes.len() >= 3 && bytes[0] == 0x05 && bytes[1] == 0x00 {
        return SdsMessage::Text(EncodingTag::Sds1, String::from_utf8_lossy(&bytes[3..]).into_owned());
    }

    if bytes.len() >= 3 && bytes[0] == 0x07 && bytes[1] == 0x00 {
        if let Some(text) = try_gsm7(&bytes[3..]).or_else(|| try_gsm7(&bytes[2..])) {
            return SdsMessage::Text(EncodingTag::SdsGsm, text);
        }
    }

    if let Some(first) = bytes.first() {
        match *first {
            0x82 => return decode_latin1(&bytes[1..]),
            0x03 => return SdsMessage::Text(EncodingTag::Ascii, ascii_lossy(&bytes[1..])),
            0x83 | 0x0C => return decode_location(&bytes[1..]),
            _ => {}
        }
    }

    if printable_ratio(bytes) >= PRINTABLE_RATIO_THRESHOLD {
        if let Ok(text) = std::str::from_utf8(bytes) {
            if is_valid_text(text, PRINTABLE_RATIO_THRESHOLD) {
                return SdsMessage::Text(EncodingTag::Utf8, text.to_string());
            }
        }
        let latin1 = decode_latin1(bytes);
        if matches!(&latin1, SdsMessage::Text(_, s) if is_valid_text(s, PRINTABLE_RATIO_THRESHOLD)) {
            return latin1;
        }
        let ascii = ascii_lossy(bytes);
        if is_valid_text(&ascii, PRINTABLE_RATIO_THRESHOLD) {
            return SdsMessage::Text(EncodingTag::Ascii, ascii);
        }
        let win1252 = windows_1252_lossy(bytes);
        if is_valid_text(&win1252, PRINTABLE_RATIO_THRESHOLD) {
            return SdsMessage::Text(EncodingTag::Windows1252, win1252);
        }
    }

    if bytes.len() >= 8 && byte_entropy(bytes) >= 0.7 {
        return SdsMessage::BinaryEncrypted(bytes.to_vec());
    }

    SdsMessage::BinaryHex(bytes.to_vec())
}

fn try_gsm7(bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    let septet_count = bytes.len() * 8 / 7;
    let text = gsm7::unpack_septets(bytes, septet_count);
    if is_valid_text(&text, PRINTABLE_RATIO_THRESHOLD) {
        Some(text)
    } else {
        None
    }
}

fn decode_location(payload: &[u8]) -> SdsMessage {
    if lip::looks_like_nmea(payload) {
        return SdsMessage::Nmea(String::from_utf8_lossy(payload).into_owned());
    }
    match lip::decode(payload) {
        Some(fix) => SdsMessage::Location(fix),
        None => SdsMessage::BinaryHex(payload.to_vec()),
    }
}

fn decode_latin1(bytes: &[u8]) -> SdsMessage {
    let text: String = bytes.iter().map(|&b| b as char).collect();
    SdsMessage::Text(EncodingTag::Iso8859_1, text)
}

fn ascii_lossy(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| if b.is_ascii() { b as char } else { '?' }).collect()
}

/// CP-1252 differs from Latin-1 only in the 0x80-0x9F control range; this
/// decoder treats anything outside printable ASCII + that range as `?`.
fn windows_1252_lossy(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn printable_ratio(bytes: &[u8]) -> f64 {
    if bytes.is_empty() {
        return 0.0;
    }
    let printable = bytes.iter().filter(|&&b| (32..=126).contains(&b) || b == 10 || b == 13).count();
    printable as f64 / bytes.len() as f64
}

/// §4.5 validity check: printable-ratio >= threshold, alnum-ratio > 0.5, and
/// not a single repeated character.
fn is_valid_text(text: &str, threshold: f64) -> bool {
    if text.is_empty() {
        return false;
    }
    let bytes: Vec<u8> = text.bytes().collect();
    if printable_ratio(&bytes) < threshold {
        return false;
    }
    let alnum = text.chars().filter(|c| c.is_alphanumeric()).count();
    if alnum as f64 / text.chars().count() as f64 <= 0.5 {
        return false;
    }
    let first = text.chars().next();
    if text.chars().all(|c| Some(c) == first) {
        return false;
    }
    true
}

fn byte_entropy(bytes: &[u8]) -> f64 {
    if bytes.is_empty() {
        return 0.0;
    }
    let mut counts = [0u32; 256];
    for &b in bytes {
        counts[b as usize] += 1;
    }
    let len = bytes.len() as f64;
    let max_entropy = 8.0f64;
    let shannon: f64 = counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / len;
            -p * p.log2()
        })
        .sum();
    (shannon / max_entropy).clamp(0.0, 1.0)
}
