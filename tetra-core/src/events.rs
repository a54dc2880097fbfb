//! Typed event surface the orchestrator (C10) exposes to a host application.

use crate::burst::Burst;
use crate::carrier_scanner::ScanResult;
use crate::crypto::DecryptionResult;
use crate::mac::{CallMetadata, MacPdu};
use crate::sds::SdsMessage;

#[derive(Debug, Clone, PartialEq)]
pub enum EncryptionStatus {
    Clear,
    Encrypted {
        algorithm: Option<&'static str>,
        decrypted: Option<DecryptionResult>,
    },
}

/// One event emitted by the decode pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeEvent {
    FrameDecoded {
        burst: Burst,
        pdu: MacPdu,
        call_metadata: Option<CallMetadata>,
        encryption_status: EncryptionStatus,
        /// SDS decode of the PDU's own clear payload, when it carries one
        /// directly rather than through fragment reassembly (see
        /// `SdsReassembled` for the reassembled case).
        sds_message: Option<SdsMessage>,
    },
    SdsReassembled {
        address: u32,
        message: SdsMessage,
    },
    VoiceAudio {
        pcm: Vec<i16>,
        burst_id: u64,
        timestamp_ms: u64,
        source_ssi: Option<u32>,
    },
    ScanResult(ScanResult),
    DeviceError(String),
}
