//! Call metadata extraction (C5) from Resource, USignal, and Broadcast PDUs.

use crate::utils::BitReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallType {
    Voice,
    Data,
    Group,
    Individual,
    Broadcast,
}

/// Derived call context, exposed to downstream consumers as `CallMetadata`.
#[derive(Debug, Clone, PartialEq)]
pub struct CallMetadata {
    pub call_type: CallType,
    pub talkgroup_id: Option<u32>,
    pub source_ssi: Option<u32>,
    pub dest_ssi: Option<u32>,
    pub channel: Option<u8>,
    pub call_identifier: Option<u16>,
    pub priority: u8,
    pub mcc: Option<u16>,
    pub mnc: Option<u16>,
    pub encryption_enabled: bool,
    pub encryption_algorithm: Option<&'static str>,
}

impl CallMetadata {
    fn bare(call_type: CallType) -> Self {
        Self {
            call_type,
            talkgroup_id: None,
            source_ssi: None,
            dest_ssi: None,
            channel: None,
            call_identifier: None,
            priority: 0,
            mcc: None,
            mnc: None,
            encryption_enabled: false,
            encryption_algorithm: None,
        }
    }
}

/// Extract `CallMetadata` from a Resource PDU's payload, per §4.4's byte
/// layout.
pub fn from_resource(payload: &[u8]) -> Option<CallMetadata> {
    if payload.len() < 8 {
        return None;
    }
    let group = payload[0] & 0x80 != 0;
    let talkgroup_id = ((payload[1] as u32) << 16) | ((payload[2] as u32) << 8) | payload[3] as u32;
    let channel = payload[4] & 0b0011_1111;
    let encryption_enabled = payload[5] & 0x80 != 0;
    let priority = (payload[5] >> 2) & 0b1111;
    let call_identifier = (((payload[6] as u16) << 8) | payload[7] as u16) & 0x3FFF;

    let mut metadata = CallMetadata::bare(if group { CallType::Group } else { CallType::Individual });
    metadata.talkgroup_id = Some(talkgroup_id);
    metadata.channel = Some(channel);
    metadata.call_identifier = Some(call_identifier);
    metadata.priority = priority;
    metadata.encryption_enabled = encryption_enabled;
    Some(metadata)
}

/// Extract `CallMetadata` from a USignal PDU's payload, per §4.4's byte
/// layout.
pub fn from_usignal(payload: &[u8]) -> Option<CallMetadata> {
    if payload.len() < 8 {
        return None;
    }
    let source_ssi = ((payload[0] as u32) << 16) | ((payload[1] as u32) << 8) | payload[2] as u32;
    let dest_ssi = ((payload[3] as u32) << 16) | ((payload[4] as u32) << 8) | payload[5] as u32;
    let is_voice = payload[6] & 0x80 != 0;
    let algo_code = (payload[7] >> 4) & 0b111;

    let algorithm = match algo_code {
        1 => Some("TEA1"),
        2 => Some("TEA2"),
        3 => Some("TEA3"),
        4 => Some("TEA4"),
        _ => None,
    };

    let mut metadata = CallMetadata::bare(if is_voice { CallType::Voice } else { CallType::Data });
    metadata.source_ssi = Some(source_ssi);
    metadata.dest_ssi = Some(dest_ssi);
    metadata.encryption_enabled = algorithm.is_some();
    metadata.encryption_algorithm = algorithm;
    Some(metadata)
}

/// D-MLE-SYNC fields carried by a Broadcast PDU: 10-bit MCC, 14-bit MNC,
/// 6-bit colour code.
pub fn from_broadcast(payload: &[u8]) -> Option<CallMetadata> {
    let bits = crate::utils::unpack_bits(payload);
    let mut reader = BitReader::new(&bits);
    let mcc = reader.read_u(10)? as u16;
    let mnc = reader.read_u(14)? as u16;
    let _colour_code = reader.read_u(6)?;

    let mut metadata = CallMetadata::bare(CallType::Broadcast);
    metadata.mcc = Some(mcc);
    metadata.mnc = Some(mnc);
    Some(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_metadata_extracts_talkgroup_and_priority() {
        let payload = [0x80, 0x45, 0x67, 0x89, 0x07, 0b1000_1100, 0x12, 0x34];
        let metadata = from_resource(&payload).unwrap();
        assert_eq!(metadata.call_type, CallType::Group);
        assert_eq!(metadata.talkgroup_id, Some(0x456789));
        assert_eq!(metadata.channel, Some(0x07));
        assert!(metadata.encryption_enabled);
        assert_eq!(metadata.priority, 0b0011);
    }

    #[test]
    fn resource_metadata_requires_eight_bytes() {
        assert!(from_resource(&[0, 1, 2]).is_none());
    }

    #[test]
    fn usignal_metadata_decodes_algorithm_code() {
        let payload = [0, 0, 1, 0, 0, 2, 0x80, 0b0010_0000];
        let metadata = from_usignal(&payload).unwrap();
        assert_eq!(metadata.call_type, CallType::Voice);
        assert_eq!(metadata.source_ssi, Some(1));
        assert_eq!(metadata.dest_ssi, Some(2));
        assert_eq!(metadata.encryption_algorithm, Some("TEA2"));
    }

    #[test]
    fn broadcast_metadata_extracts_mcc_mnc() {
        // 10-bit MCC = 0b0000000001 (1), 14-bit MNC = 0b00000000000010 (2),
        // 6-bit colour code = 0.
        let bits: Vec<u8> = {
            let mut b = vec![0u8; 10 + 14 + 6];
            b[9] = 1;
            b[23] = 1;
            b
        };
        let payload = crate::utils::pack_bits(&bits);
        let metadata = from_broadcast(&payload).unwrap();
        assert_eq!(metadata.mcc, Some(1));
        assert_eq!(metadata.mnc, Some(2));
    }
}
