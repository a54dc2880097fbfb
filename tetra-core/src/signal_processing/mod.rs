//! Signal processing functions for demodulation, timing recovery, and
//! spectrum analysis.
//!
//! This module provides the core DSP functions for:
//! - Channel band-limiting and DC removal
//! - Symbol timing recovery
//! - π/4-DQPSK symbol decision
//! - Computing frequency spectra via FFT (shared with the carrier scanner)

pub mod demodulation;
pub mod filters;
pub mod spectrum;

pub use demodulation::{process_iq_block, DemodulatorConfig};
pub use filters::{apply_channel_filter, remove_dc};
pub use spectrum::compute_power_spectrum_db;
