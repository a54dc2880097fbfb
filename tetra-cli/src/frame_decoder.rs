//! Renders a decoded burst/PDU pair into a hex dump and human-readable
//! summary for structured logging.

use crate::logging::{DecodedFrame, FrameDecodeEvent, FrameHexDump};
use chrono::Utc;
use tetra_core::burst::Burst;
use tetra_core::events::EncryptionStatus;
use tetra_core::mac::{CallMetadata, CallType, MacPdu};
use tetra_core::sds::SdsMessage;

pub struct FrameDecoder;

impl FrameDecoder {
    pub fn new() -> Self {
        Self
    }

    pub fn decode_frame(
        &self,
        burst_index: usize,
        burst: &Burst,
        pdu: &MacPdu,
        call_metadata: &Option<CallMetadata>,
        encryption_status: &EncryptionStatus,
        sds_message: &Option<SdsMessage>,
    ) -> FrameDecodeEvent {
        let hex_dump = FrameHexDump {
            pdu_type: format!("{:?}", pdu.pdu_type),
            address: pdu.address.map(|a| format!("0x{:06X}", a)).unwrap_or_else(|| "-".to_string()),
            payload: bytes_to_hex(&pdu.payload),
        };

        let call_summary = match call_metadata {
            Some(meta) => describe_call(meta),
            None => "no call metadata".to_string(),
        };

        let encryption_summary = describe_encryption(encryption_status);
        let sds_summary = sds_message.as_ref().map(describe_sds);

        let decoded = DecodedFrame {
            slot_number: burst.slot_number,
            frame_number: burst.frame_number,
            crc_ok: burst.crc_ok,
            call_summary,
            encryption_summary,
            sds_summary,
        };

        FrameDecodeEvent {
            timestamp: Utc::now(),
            burst_index,
            hex_dump,
            decoded,
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn describe_call(meta: &CallMetadata) -> String {
    let kind = match meta.call_type {
        CallType::Voice => "voice",
        CallType::Data => "data",
        CallType::Group => "group",
        CallType::Individual => "individual",
        CallType::Broadcast => "broadcast",
    };
    match (meta.source_ssi, meta.dest_ssi) {
        (Some(src), Some(dst)) => format!("{kind} {src}->{dst}"),
        (Some(src), None) => format!("{kind} from {src}"),
        _ => kind.to_string(),
    }
}

fn describe_encryption(status: &EncryptionStatus) -> String {
    match status {
        EncryptionStatus::Clear => "clear".to_string(),
        EncryptionStatus::Encrypted { algorithm, decrypted } => {
            let algo = algorithm.unwrap_or("unknown");
            match decrypted {
                Some(result) => format!("{algo} decrypted (score {})", result.score),
                None => format!("{algo} undecrypted"),
            }
        }
    }
}

fn describe_sds(message: &SdsMessage) -> String {
    match message {
        SdsMessage::Text(tag, text) => format!("sds text ({tag:?}): {text}"),
        SdsMessage::Location(fix) => format!("sds location: {:.5},{:.5}", fix.latitude, fix.longitude),
        SdsMessage::Nmea(sentence) => format!("sds nmea: {sentence}"),
        SdsMessage::BinaryEncrypted(bytes) => format!("sds binary (encrypted, {} bytes)", bytes.len()),
        SdsMessage::BinaryHex(bytes) => format!("sds binary ({} bytes): {}", bytes.len(), bytes_to_hex(bytes)),
    }
}

fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tetra_core::burst::BurstKind;
    use tetra_core::mac::{EncryptionMode, PduType};

    fn sample_burst() -> Burst {
        Burst {
            slot_number: 1,
            frame_number: 42,
            burst_kind: BurstKind::NormalDownlink,
            crc_ok: true,
            data_bits: vec![0; 8],
        }
    }

    fn sample_pdu() -> MacPdu {
        MacPdu {
            pdu_type: PduType::Resource,
            encrypted: false,
            encryption_mode: EncryptionMode::Clear,
            encryption_algorithm: None,
            address: Some(0x456789),
            length: 4,
            payload: vec![0xDE, 0xAD, 0xBE, 0xEF],
            fill_bits: 0,
            reassembled: None,
        }
    }

    #[test]
    fn renders_hex_dump_and_clear_encryption_summary() {
        let decoder = FrameDecoder::new();
        let event = decoder.decode_frame(0, &sample_burst(), &sample_pdu(), &None, &EncryptionStatus::Clear, &None);
        assert_eq!(event.hex_dump.address, "0x456789");
        assert_eq!(event.hex_dump.payload, "DE AD BE EF");
        assert_eq!(event.decoded.encryption_summary, "clear");
        assert_eq!(event.decoded.call_summary, "no call metadata");
        assert_eq!(event.decoded.sds_summary, None);
    }

    #[test]
    fn renders_sds_summary_for_clear_plaintext_payload() {
        let decoder = FrameDecoder::new();
        let message = SdsMessage::Text(tetra_core::sds::EncodingTag::Ascii, "HELLO".to_string());
        let event = decoder.decode_frame(0, &sample_burst(), &sample_pdu(), &None, &EncryptionStatus::Clear, &Some(message));
        assert_eq!(event.decoded.sds_summary.as_deref(), Some("sds text (Ascii): HELLO"));
    }

    #[test]
    fn renders_call_summary_with_ssis() {
        let decoder = FrameDecoder::new();
        let meta = CallMetadata {
            call_type: CallType::Individual,
            talkgroup_id: None,
            source_ssi: Some(100),
            dest_ssi: Some(200),
            channel: None,
            call_identifier: None,
            priority: 0,
            mcc: None,
            mnc: None,
            encryption_enabled: false,
            encryption_algorithm: None,
        };
        let event = decoder.decode_frame(0, &sample_burst(), &sample_pdu(), &Some(meta), &EncryptionStatus::Clear, &None);
        assert_eq!(event.decoded.call_summary, "individual 100->200");
    }
}
