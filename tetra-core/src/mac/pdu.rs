//! MAC PDU types shared across the parser, fragment buffer, and call-metadata
//! extraction.

/// 3-bit extended MAC PDU type field, per the decoder's header layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PduType {
    Resource,
    Frag,
    End,
    Broadcast,
    Suppl,
    USignal,
    Data,
    UBlk,
}

impl PduType {
    /// Decode the 3-bit header field. All 8 values are covered so this is a
    /// total function.
    pub fn from_bits(value: u8) -> Self {
        match value & 0b111 {
            0 => PduType::Resource,
            1 => PduType::Frag,
            2 => PduType::End,
            3 => PduType::Broadcast,
            4 => PduType::Suppl,
            5 => PduType::USignal,
            6 => PduType::Data,
            _ => PduType::UBlk,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionMode {
    Clear,
    Class2,
    Class3,
    Reserved,
}

/// A parsed MAC protocol data unit.
#[derive(Debug, Clone, PartialEq)]
pub struct MacPdu {
    pub pdu_type: PduType,
    pub encrypted: bool,
    pub encryption_mode: EncryptionMode,
    pub encryption_algorithm: Option<&'static str>,
    pub address: Option<u32>,
    pub length: u8,
    pub payload: Vec<u8>,
    pub fill_bits: u8,
    pub reassembled: Option<Vec<u8>>,
}

impl MacPdu {
    pub(crate) fn new(pdu_type: PduType, fill_bits: u8) -> Self {
        Self {
            pdu_type,
            encrypted: false,
            encryption_mode: EncryptionMode::Clear,
            encryption_algorithm: None,
            address: None,
            length: 0,
            payload: Vec::new(),
            fill_bits,
            reassembled: None,
        }
    }
}

/// Promote a PDU to encrypted based on payload byte-entropy, per §4.4's
/// encryption-mode inference rule: `unique_bytes / total > 0.7` with
/// `total > 8`.
pub fn infer_encryption(payload: &[u8]) -> Option<&'static str> {
    if payload.len() <= 8 {
        return None;
    }
    let mut seen = [false; 256];
    let mut unique = 0usize;
    for &byte in payload {
        if !seen[byte as usize] {
            seen[byte as usize] = true;
            unique += 1;
        }
    }
    let ratio = unique as f64 / payload.len() as f64;
    if ratio > 0.7 {
        Some("TEA1")
    } else {
        None
    }
}
