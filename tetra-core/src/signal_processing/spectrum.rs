//! Spectrum analysis utilities using FFT, shared by the carrier scanner.

use num_complex::{Complex, Complex64};
use rustfft::{num_complex::Complex32, FftPlanner};

/// Compute the windowed FFT power spectrum, in dB, of a complex sample block.
///
/// Zero-pads or truncates to `fft_size`, applies a Hamming window, and
/// returns a DC-centered spectrum (`spectrum[fft_size/2]` is the DC bin).
pub fn compute_power_spectrum_db(samples: &[Complex64], fft_size: usize) -> Vec<f32> {
    if samples.len() < 32 || fft_size == 0 {
        return Vec::new();
    }

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_size);

    let mut buffer = prepare_fft_buffer(samples, fft_size);
    let window_size = samples.len().min(fft_size);
    apply_hamming_window(&mut buffer, window_size);

    fft.process(&mut buffer);

    let spectrum = power_spectrum_db(&buffer, window_size);
    center_spectrum(spectrum)
}

fn prepare_fft_buffer(samples: &[Complex64], fft_size: usize) -> Vec<Complex32> {
    let mut buffer = Vec::with_capacity(fft_size);
    for s in samples.iter().take(fft_size) {
        buffer.push(Complex32::new(s.re as f32, s.im as f32));
    }
    while buffer.len() < fft_size {
        buffer.push(Complex32::new(0.0, 0.0));
    }
    buffer
}

fn apply_hamming_window(buffer: &mut [Complex32], window_size: usize) {
    if window_size <= 1 {
        return;
    }
    for i in 0..window_size {
        let w = 0.54 - 0.46 * (2.0 * std::f32::consts::PI * i as f32 / (window_size as f32 - 1.0)).cos();
        buffer[i] = buffer[i] * w;
    }
}

fn power_spectrum_db(buffer: &[Complex32], actual_samples: usize) -> Vec<f32> {
    let window_power: f32 = 0.397; // Hamming window coherent power
    let scale = 1.0 / (actual_samples.max(1) as f32 * window_power.sqrt());
    buffer
        .iter()
        .map(|c| {
            let power = c.norm_sqr() * scale * scale;
            if power > 1e-12 {
                10.0 * power.log10()
            } else {
                -120.0
            }
        })
        .collect()
}

fn center_spectrum(spectrum: Vec<f32>) -> Vec<f32> {
    let half = spectrum.len() / 2;
    let mut centered = Vec::with_capacity(spectrum.len());
    centered.extend_from_slice(&spectrum[half..]);
    centered.extend_from_slice(&spectrum[..half]);
    centered
}

/// Peak power across the whole spectrum, in dB.
pub fn peak_power_db(spectrum: &[f32]) -> f32 {
    spectrum.iter().copied().fold(f32::NEG_INFINITY, f32::max)
}

/// Fraction of total spectral energy that falls within `bins` either side of
/// the center bin. Used by the carrier scanner's confidence estimate: a
/// genuine narrowband carrier concentrates its energy near DC once centered
/// on the tuned frequency.
pub fn center_energy_fraction(spectrum: &[f32], half_width_bins: usize) -> f32 {
    if spectrum.is_empty() {
        return 0.0;
    }
    let to_linear = |db: f32| 10f32.powf(db / 10.0);
    let total: f32 = spectrum.iter().map(|&db| to_linear(db)).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let center = spectrum.len() / 2;
    let lo = center.saturating_sub(half_width_bins);
    let hi = (center + half_width_bins).min(spectrum.len() - 1);
    let center_energy: f32 = spectrum[lo..=hi].iter().map(|&db| to_linear(db)).sum();
    (center_energy / total).clamp(0.0, 1.0)
}

/// Convert a complex IQ slice into `Complex<f64>` pairs, used by callers that
/// work with raw interleaved buffers.
pub fn to_complex64(samples: &[Complex<f32>]) -> Vec<Complex64> {
    samples.iter().map(|s| Complex64::new(s.re as f64, s.im as f64)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spectrum_insufficient_samples_is_empty() {
        let samples = vec![Complex64::new(1.0, 0.0); 16];
        assert!(compute_power_spectrum_db(&samples, 512).is_empty());
    }

    #[test]
    fn dc_tone_peaks_near_center() {
        let samples = vec![Complex64::new(1.0, 0.0); 128];
        let spectrum = compute_power_spectrum_db(&samples, 512);
        assert!(!spectrum.is_empty());

        let (max_idx, &max_val) = spectrum
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .unwrap();
        let center = spectrum.len() / 2;
        assert!((max_idx as i64 - center as i64).abs() < 10);
        assert!(max_val > -10.0);
    }

    #[test]
    fn center_energy_fraction_high_for_dc_tone() {
        let samples = vec![Complex64::new(1.0, 0.0); 128];
        let spectrum = compute_power_spectrum_db(&samples, 512);
        let fraction = center_energy_fraction(&spectrum, 8);
        assert!(fraction > 0.5, "fraction was {fraction}");
    }
}
