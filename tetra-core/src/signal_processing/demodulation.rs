//! π/4-DQPSK demodulation: timing recovery and symbol decision.
//!
//! This is the receive-side counterpart to the reference codebase's Costas
//! loop carrier recovery: because π/4-DQPSK symbols are decided from the
//! phase *difference* between consecutive symbols, no absolute carrier
//! phase lock is required, only stable symbol timing.

use num_complex::Complex64;
use std::f64::consts::FRAC_PI_4;

use super::filters::{apply_channel_filter, remove_dc};

/// Configuration for the signal processor (C2).
#[derive(Clone, Debug)]
pub struct DemodulatorConfig {
    pub sample_rate_hz: f64,
}

impl DemodulatorConfig {
    pub const SYMBOL_RATE_HZ: f64 = 18_000.0;

    pub fn samples_per_symbol(&self) -> usize {
        ((self.sample_rate_hz / Self::SYMBOL_RATE_HZ).round() as usize).max(1)
    }
}

/// Input samples where every value is already a decided dibit (real part in
/// `0..=3`, negligible imaginary part) are treated as pre-demodulated test
/// vectors and passed through unchanged, per §4.1's edge case.
fn looks_pre_decided(samples: &[Complex64]) -> bool {
    samples.iter().all(|s| {
        s.im.abs() < 1e-6 && s.re >= -1e-6 && s.re <= 3.0 + 1e-6 && (s.re - s.re.round()).abs() < 1e-6
    })
}

/// Map a π/4-DQPSK phase change to its dibit symbol integer.
///
/// Phase changes of {+π/4, +3π/4, -3π/4, -π/4} map to dibits
/// {00, 01, 11, 10} -> symbol integers {0, 1, 3, 2}.
fn phase_delta_to_symbol(delta: f64) -> u8 {
    if delta >= 0.0 && delta < FRAC_PI_4 * 2.0 {
        0 // +pi/4  -> 00
    } else if delta >= FRAC_PI_4 * 2.0 {
        1 // +3pi/4 -> 01
    } else if delta < -FRAC_PI_4 * 2.0 {
        3 // -3pi/4 -> 11
    } else {
        2 // -pi/4  -> 10
    }
}

/// Emit (high_bit, low_bit) for a dibit symbol, MSB first.
pub fn symbol_to_bits(symbol: u8) -> (u8, u8) {
    ((symbol >> 1) & 1, symbol & 1)
}

/// Reconstruct a dibit symbol from its two bits, MSB first. Inverse of
/// `symbol_to_bits`, exercised by the symbol/bit round-trip test in §8.
pub fn bits_to_symbol(hi: u8, lo: u8) -> u8 {
    ((hi & 1) << 1) | (lo & 1)
}

/// C2: filter, recover timing, and decide π/4-DQPSK symbols.
///
/// Returns `(symbols, bits)` where `bits` is the MSB-first expansion of
/// `symbols`. The emitted symbol count is approximately
/// `iq_len * 18_000 / sample_rate`.
pub fn process_iq_block(samples: &[Complex64], config: &DemodulatorConfig) -> (Vec<u8>, Vec<u8>) {
    if samples.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let symbols = if looks_pre_decided(samples) {
        samples.iter().map(|s| s.re.round() as u8).collect()
    } else {
        decide_symbols(samples, config)
    };

    let mut bits = Vec::with_capacity(symbols.len() * 2);
    for &symbol in &symbols {
        let (hi, lo) = symbol_to_bits(symbol);
        bits.push(hi);
        bits.push(lo);
    }

    (symbols, bits)
}

fn decide_symbols(samples: &[Complex64], config: &DemodulatorConfig) -> Vec<u8> {
    let dc_removed = remove_dc(samples);
    let filtered = apply_channel_filter(&dc_removed, config.sample_rate_hz);

    let sps = config.samples_per_symbol();
    if filtered.len() < sps {
        return Vec::new();
    }

    // Timing recovery: decimate at the symbol rate, sampling at the center
    // of each symbol period.
    let num_symbols = filtered.len() / sps;
    let mut decimated = Vec::with_capacity(num_symbols);
    for i in 0..num_symbols {
        let idx = i * sps + sps / 2;
        decimated.push(filtered[idx.min(filtered.len() - 1)]);
    }

    let mut symbols = Vec::with_capacity(decimated.len());
    let mut prev = Complex64::new(1.0, 0.0);
    for &sample in &decimated {
        let product = sample * prev.conj();
        let delta = product.arg();
        symbols.push(phase_delta_to_symbol(delta));
        if sample.norm() > 1e-9 {
            prev = sample;
        }
    }
    symbols
}
