//! Receive-only decoder core for the TETRA (Terrestrial Trunked Radio) air
//! interface.
//!
//! Pipeline stages, roughly in signal-flow order:
//! - [`iq_source`] — the hardware/file abstraction complex samples come from.
//! - [`signal_processing`] — channel filtering, timing recovery, π/4-DQPSK
//!   symbol decision, and FFT spectrum analysis.
//! - [`carrier_scanner`] — sweeps a frequency range to find active channels.
//! - [`burst`] — training-sequence sync search and burst/slot framing.
//! - [`mac`] — MAC PDU parsing and fragment reassembly.
//! - [`sds`] — Short Data Service payload decoding.
//! - [`crypto`] — TEA1-4 trial decryption.
//! - [`voice`] — voice slot extraction and the external ACELP codec bridge.
//! - [`orchestrator`] — wires the above into a threaded pipeline.

pub mod burst;
pub mod carrier_scanner;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod events;
pub mod iq_source;
pub mod logging;
pub mod mac;
pub mod orchestrator;
pub mod sds;
pub mod signal_processing;
pub mod utils;
pub mod voice;

pub use config::Config;
pub use errors::{Result, TetraError};
pub use events::DecodeEvent;
pub use iq_source::IqSource;
pub use orchestrator::Orchestrator;
