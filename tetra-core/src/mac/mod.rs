//! MAC PDU Parser (C5): header parsing, per-type field extraction, fragment
//! reassembly, and call metadata.

pub mod fragment;
pub mod metadata;
pub mod parser;
pub mod pdu;

pub use fragment::{FragmentBuffer, FragmentState};
pub use metadata::{CallMetadata, CallType};
pub use parser::{call_metadata_for, MacParser};
pub use pdu::{EncryptionMode, MacPdu, PduType};
