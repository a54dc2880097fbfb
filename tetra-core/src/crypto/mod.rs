//! Crypto Trial Engine (C7): brute-force TEA1-4 decryption against a key
//! store and a built-in weak-key list, scored by plaintext plausibility.

pub mod keys;
pub mod tea;

use crate::burst::heuristic_crc_ok_bytes;
use crate::config::KeyStore;
use crate::mac::{MacParser, MacPdu, PduType};

/// Air-interface encryption algorithm identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TeaAlgorithm {
    Tea1,
    Tea2,
    Tea3,
    Tea4,
}

impl TeaAlgorithm {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "TEA1" => Some(TeaAlgorithm::Tea1),
            "TEA2" => Some(TeaAlgorithm::Tea2),
            "TEA3" => Some(TeaAlgorithm::Tea3),
            "TEA4" => Some(TeaAlgorithm::Tea4),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TeaAlgorithm::Tea1 => "TEA1",
            TeaAlgorithm::Tea2 => "TEA2",
            TeaAlgorithm::Tea3 => "TEA3",
            TeaAlgorithm::Tea4 => "TEA4",
        }
    }

    pub fn key_len(&self) -> usize {
        match self {
            TeaAlgorithm::Tea1 => 10,
            TeaAlgorithm::Tea2 | TeaAlgorithm::Tea3 | TeaAlgorithm::Tea4 => 16,
        }
    }

    fn all() -> [TeaAlgorithm; 4] {
        [TeaAlgorithm::Tea1, TeaAlgorithm::Tea2, TeaAlgorithm::Tea3, TeaAlgorithm::Tea4]
    }
}

/// A key descriptor naming which key source produced a successful trial.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyDescriptor {
    KeyStore { algorithm: TeaAlgorithm, key_id: u32 },
    BuiltinDefault { algorithm: TeaAlgorithm, index: usize },
    Bypass,
    CrossAlgorithm { algorithm: TeaAlgorithm, index: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecryptionResult {
    pub plaintext_bytes: Vec<u8>,
    pub key_descriptor: KeyDescriptor,
    pub score: i32,
}

const EARLY_ACCEPT_SCORE: i32 = 80;
const FINAL_ACCEPT_SCORE: i32 = 10;

/// Attempt to decrypt `pdu`'s payload, trying key sources in the order
/// specified by §4.6. Returns `None` if no trial scores above the final
/// acceptance threshold.
pub fn attempt(pdu: &MacPdu, key_source: &KeyStore) -> Option<DecryptionResult> {
    if pdu.payload.len() < 8 {
        return None;
    }
    let ciphertext = zero_pad_to_block(&pdu.payload);

    let Some(algorithm) = pdu
        .encryption_algorithm
        .and_then(TeaAlgorithm::from_str)
        .or(Some(TeaAlgorithm::Tea1))
    else {
        return None;
    };

    let mut best: Option<DecryptionResult> = None;
    let mut consider = |candidate: DecryptionResult, best: &mut Option<DecryptionResult>| -> bool {
        let early_accept = candidate.score > EARLY_ACCEPT_SCORE;
        if best.as_ref().map(|b| candidate.score > b.score).unwrap_or(true) {
            *best = Some(candidate);
        }
        early_accept
    };

    // (1) Key-store keys matching declared algorithm and the PDU's address
    // as a stand-in key id (the PDU carries no dedicated key-id field).
    if let Some(address) = pdu.address {
        for (key_id, key) in key_source.keys_for(algorithm) {
            if key_id != address {
                continue;
            }
            let plaintext = tea::decrypt(key, algorithm, &ciphertext);
            let score = score_plaintext(&plaintext);
            let candidate = DecryptionResult {
                plaintext_bytes: plaintext,
                key_descriptor: KeyDescriptor::KeyStore { algorithm, key_id },
                score,
            };
            if consider(candidate, &mut best) {
                return best;
            }
        }
    }

    // (2) Built-in weak/default keys for the declared algorithm.
    for (index, key) in keys::default_keys(algorithm).into_iter().enumerate() {
        let plaintext = tea::decrypt(&key, algorithm, &ciphertext);
        let score = score_plaintext(&plaintext);
        let candidate = DecryptionResult {
            plaintext_bytes: plaintext,
            key_descriptor: KeyDescriptor::BuiltinDefault { algorithm, index },
            score,
        };
        if consider(candidate, &mut best) {
            return best;
        }
    }

    // (3) BYPASS: treat the ciphertext as already clear.
    {
        let score = score_plaintext(&ciphertext);
        let candidate = DecryptionResult {
            plaintext_bytes: ciphertext.clone(),
            key_descriptor: KeyDescriptor::Bypass,
            score,
        };
        if consider(candidate, &mut best) {
            return best;
        }
    }

    // (4) Cross-algorithm: first 5 default keys of each other TEA variant.
    for other in TeaAlgorithm::all().into_iter().filter(|&a| a != algorithm) {
        for (index, key) in keys::default_keys(other).into_iter().take(5).enumerate() {
            let plaintext = tea::decrypt(&key, other, &ciphertext);
            let score = score_plaintext(&plaintext);
            let candidate = DecryptionResult {
                plaintext_bytes: plaintext,
                key_descriptor: KeyDescriptor::CrossAlgorithm { algorithm: other, index },
                score,
            };
            if consider(candidate, &mut best) {
                return best;
            }
        }
    }

    best.filter(|result| result.score > FINAL_ACCEPT_SCORE)
}

fn zero_pad_to_block(payload: &[u8]) -> Vec<u8> {
    let mut padded = payload.to_vec();
    let remainder = padded.len() % 8;
    if remainder != 0 {
        padded.resize(padded.len() + (8 - remainder), 0);
    }
    padded
}

/// §4.6 additive scoring.
fn score_plaintext(plaintext: &[u8]) -> i32 {
    if plaintext.is_empty() {
        return 0;
    }
    let mut score = 0i32;

    score += plaintext.iter().filter(|&&b| (32..=126).contains(&b)).count() as i32 * 2;

    let unique = {
        let mut seen = [false; 256];
        let mut count = 0usize;
        for &b in plaintext {
            if !seen[b as usize] {
                seen[b as usize] = true;
                count += 1;
            }
        }
        count
    };
    if unique > plaintext.len() / 8 {
        score += 30;
    }

    if plaintext.iter().all(|&b| b == 0x00) || plaintext.iter().all(|&b| b == 0xFF) {
        score -= 50;
    }

    let first = plaintext[0];
    if first != 0x00 && first != 0xFF {
        score += 10;
    }
    if matches!(first, 0x01 | 0x02 | 0x03 | 0x04 | 0x05 | 0x08 | 0x0A | 0x0C) {
        score += 20;
    }

    if heuristic_crc_ok_bytes(plaintext) {
        score += 100;
    }

    if reparses_as_typed_pdu(plaintext) {
        score += 50;
    }

    score
}

fn reparses_as_typed_pdu(plaintext: &[u8]) -> bool {
    let bits = crate::utils::unpack_bits(plaintext);
    let mut parser = MacParser::new();
    match parser.parse(&bits) {
        Some(pdu) => pdu.pdu_type != PduType::Data,
        None => false,
    }
}
