//! IQ Source (C1): the hardware/file abstraction the rest of the pipeline
//! pulls complex samples from.
//!
//! Concrete sources (an SDR device, a recorded `.cfile`, a synthetic test
//! generator) implement this trait; the carrier scanner, demodulator, and
//! orchestrator only ever see the trait object.

use num_complex::Complex;

use crate::errors::DeviceError;

/// A source of complex baseband IQ samples.
///
/// Implementations are not required to be `Send`/`Sync` themselves; the
/// orchestrator (C10) owns a single instance on its I/O thread and moves
/// samples onward over a channel.
pub trait IqSource {
    /// Open (or re-open) the underlying device or file. Sources that open
    /// eagerly in their constructor can make this a no-op returning `Ok(())`.
    fn open(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    /// Release the underlying device or file.
    fn close(&mut self) {}

    /// Retune to `hz`. Returns an error if the device rejects the frequency.
    fn tune(&mut self, hz: u64) -> Result<(), DeviceError>;

    /// Set receiver gain; implementations that have no variable gain stage
    /// may ignore this and return `Ok(())`.
    fn set_gain(&mut self, _db: f32) -> Result<(), DeviceError> {
        Ok(())
    }

    /// Request a sample rate and return the rate the device actually settled
    /// on (devices commonly quantize to a supported rate).
    fn set_sample_rate(&mut self, hz: f64) -> Result<f64, DeviceError>;

    /// Pull up to `count` complex samples. Returns fewer than `count` (down
    /// to zero) when the source is temporarily starved; an empty return does
    /// not by itself mean the stream has ended.
    fn read_samples(&mut self, count: usize) -> Vec<Complex<f32>>;
}

/// Replays a fixed buffer of samples, for tests and offline `.cfile` analysis.
pub struct RecordedSource {
    samples: Vec<Complex<f32>>,
    cursor: usize,
    sample_rate: f64,
}

impl RecordedSource {
    pub fn new(samples: Vec<Complex<f32>>, sample_rate: f64) -> Self {
        Self {
            samples,
            cursor: 0,
            sample_rate,
        }
    }
}

impl IqSource for RecordedSource {
    fn tune(&mut self, _hz: u64) -> Result<(), DeviceError> {
        Ok(())
    }

    fn set_sample_rate(&mut self, hz: f64) -> Result<f64, DeviceError> {
        self.sample_rate = hz;
        Ok(hz)
    }

    fn read_samples(&mut self, count: usize) -> Vec<Complex<f32>> {
        let end = (self.cursor + count).min(self.samples.len());
        let chunk = self.samples[self.cursor..end].to_vec();
        self.cursor = end;
        chunk
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_source_exhausts_then_returns_empty() {
        let mut source = RecordedSource::new(vec![Complex::new(1.0, 0.0); 10], 1_800_000.0);
        assert_eq!(source.read_samples(6).len(), 6);
        assert_eq!(source.read_samples(6).len(), 4);
        assert_eq!(source.read_samples(6).len(), 0);
    }

    #[test]
    fn recorded_source_tune_is_always_ok() {
        let mut source = RecordedSource::new(Vec::new(), 1_800_000.0);
        assert!(source.tune(392_000_000).is_ok());
    }
}
