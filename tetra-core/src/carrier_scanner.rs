//! Carrier Scanner (C3): FFT-based power/confidence estimation across a
//! frequency range to find active TETRA channels.

use std::sync::Arc;
use std::time::Duration;

use crate::config::ScanRegion;
use crate::iq_source::IqSource;
use crate::logging::SignalLogger;
use crate::signal_processing::spectrum::{center_energy_fraction, compute_power_spectrum_db, peak_power_db};
use std::sync::Mutex;

/// Settling delay applied between re-tunes, per §4.2.
pub const TUNE_SETTLE: Duration = Duration::from_millis(50);

const SCAN_FFT_SIZE: usize = 512;
const SCAN_SAMPLE_COUNT: usize = 4096;
const CENTER_BAND_HALF_WIDTH_BINS: usize = 8;

/// A single detected carrier.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    pub frequency_hz: u64,
    pub power_db: f32,
    pub confidence: f32,
}

/// Sweeps a frequency range, tuning the IQ source at each step and scoring
/// the captured spectrum.
pub struct CarrierScanner {
    logger: Arc<Mutex<SignalLogger>>,
}

impl CarrierScanner {
    pub fn new(logger: Arc<Mutex<SignalLogger>>) -> Self {
        Self { logger }
    }

    /// Sweep `[start_hz, end_hz)` in `step_hz` increments, returning detected
    /// carriers sorted by power descending.
    pub fn scan_range(
        &self,
        source: &mut dyn IqSource,
        start_hz: u64,
        end_hz: u64,
        step_hz: u64,
        min_power_db: f32,
        min_confidence: f32,
    ) -> Vec<ScanResult> {
        if step_hz == 0 || start_hz >= end_hz {
            return Vec::new();
        }

        let mut results = Vec::new();
        let mut freq = start_hz;
        while freq < end_hz {
            if let Some(result) = self.scan_one(source, freq, min_power_db, min_confidence) {
                results.push(result);
            }
            freq += step_hz;
        }

        results.sort_by(|a, b| b.power_db.partial_cmp(&a.power_db).unwrap_or(std::cmp::Ordering::Equal));
        results
    }

    /// Sweep every band in a region preset (§4.2).
    pub fn scan_preset(
        &self,
        source: &mut dyn IqSource,
        region: ScanRegion,
        step_hz: u64,
        min_power_db: f32,
        min_confidence: f32,
    ) -> Vec<ScanResult> {
        let mut results = Vec::new();
        for &(start_hz, end_hz) in region.bands() {
            results.extend(self.scan_range(source, start_hz, end_hz, step_hz, min_power_db, min_confidence));
        }
        results.sort_by(|a, b| b.power_db.partial_cmp(&a.power_db).unwrap_or(std::cmp::Ordering::Equal));
        results
    }

    fn scan_one(
        &self,
        source: &mut dyn IqSource,
        freq_hz: u64,
        min_power_db: f32,
        min_confidence: f32,
    ) -> Option<ScanResult> {
        if source.tune(freq_hz).is_err() {
            self.logger.lock().unwrap().warn("SCANNER", format!("tune to {freq_hz} Hz failed"));
            return None;
        }
        std::thread::sleep(TUNE_SETTLE);

        let samples = source.read_samples(SCAN_SAMPLE_COUNT);
        if samples.is_empty() {
            return None;
        }

        let complex64 = crate::signal_processing::spectrum::to_complex64(&samples);
        let spectrum = compute_power_spectrum_db(&complex64, SCAN_FFT_SIZE);
        if spectrum.is_empty() {
            return None;
        }

        let power_db = peak_power_db(&spectrum);
        let confidence = (center_energy_fraction(&spectrum, CENTER_BAND_HALF_WIDTH_BINS)).clamp(0.0, 1.0);

        self.logger
            .lock()
            .unwrap()
            .trace("SCANNER", format!("{freq_hz} Hz: power={power_db:.1}dB confidence={confidence:.2}"));

        if power_db >= min_power_db && confidence >= min_confidence {
            Some(ScanResult {
                frequency_hz: freq_hz,
                power_db,
                confidence,
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogConfig;
    use num_complex::Complex;
    use std::sync::Mutex as StdMutex;

    /// A mock IQ source that injects a synthetic narrowband carrier near a
    /// configured frequency, per §8 scenario 5.
    struct MockSource {
        sample_rate: f64,
        carrier_hz_offset_from_tuned: i64,
        current_freq: u64,
    }

    impl IqSource for MockSource {
        fn tune(&mut self, hz: u64) -> Result<(), crate::errors::DeviceError> {
            self.current_freq = hz;
            Ok(())
        }

        fn set_sample_rate(&mut self, hz: f64) -> Result<f64, crate::errors::DeviceError> {
            self.sample_rate = hz;
            Ok(hz)
        }

        fn read_samples(&mut self, n: usize) -> Vec<Complex<f32>> {
            // Inject a tone near DC when we happen to be tuned close to the
            // synthetic carrier; pure noise otherwise.
            let close = self.carrier_hz_offset_from_tuned.unsigned_abs() < 12_500;
            (0..n)
                .map(|i| {
                    if close {
                        let phase = 2.0 * std::f64::consts::PI * 0.02 * i as f64;
                        Complex::new((phase.cos() * 2.0) as f32, (phase.sin() * 2.0) as f32)
                    } else {
                        Complex::new(0.001, -0.001)
                    }
                })
                .collect()
        }
    }

    fn logger() -> Arc<StdMutex<SignalLogger>> {
        Arc::new(StdMutex::new(SignalLogger::new(LogConfig::disabled())))
    }

    #[test]
    fn scan_range_empty_for_infinite_power_threshold() {
        let scanner = CarrierScanner::new(logger());
        let mut source = MockSource {
            sample_rate: 1_800_000.0,
            carrier_hz_offset_from_tuned: 0,
            current_freq: 0,
        };
        let results = scanner.scan_range(&mut source, 390_000_000, 390_100_000, 25_000, f32::INFINITY, 0.0);
        assert!(results.is_empty());
    }

    #[test]
    fn scan_range_rejects_invalid_bounds() {
        let scanner = CarrierScanner::new(logger());
        let mut source = MockSource {
            sample_rate: 1_800_000.0,
            carrier_hz_offset_from_tuned: 0,
            current_freq: 0,
        };
        assert!(scanner.scan_range(&mut source, 100, 100, 25_000, -100.0, 0.0).is_empty());
        assert!(scanner.scan_range(&mut source, 100, 50, 25_000, -100.0, 0.0).is_empty());
    }

    #[test]
    fn detects_injected_carrier_within_step() {
        let scanner = CarrierScanner::new(logger());
        let target = 390_100_000u64;
        let mut source = MockSource {
            sample_rate: 1_800_000.0,
            carrier_hz_offset_from_tuned: 0,
            current_freq: 0,
        };
        // Simplified: the mock always reports the carrier as "close" so this
        // exercises the detection arithmetic rather than true tuning offset.
        source.carrier_hz_offset_from_tuned = 0;
        let results = scanner.scan_range(&mut source, target - 50_000, target + 50_000, 25_000, -50.0, 0.1);
        assert!(!results.is_empty());
        assert!(results[0].power_db >= -50.0);
    }
}
