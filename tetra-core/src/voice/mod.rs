//! Voice Slot Extractor (C8) and Codec Bridge (C9).

pub mod codec_bridge;
pub mod slot;

pub use codec_bridge::{decode_voice, normalize_to_float};
pub use slot::{extract, FRAME_BYTES};
