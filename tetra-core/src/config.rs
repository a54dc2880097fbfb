//! Configuration types for the TETRA decode pipeline.
use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::crypto::TeaAlgorithm;
use crate::errors::ConfigError;
use crate::logging::LogConfig;

/// Receiver gain setting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Gain {
    Auto,
    Db(f32),
}

impl Default for Gain {
    fn default() -> Self {
        Gain::Auto
    }
}

/// Top-level configuration for a decode session.
///
/// Mirrors the options table in §6 of the design document. Every field has a
/// sane default so a host can start from `Config::default()` and override
/// only what it needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// IQ source sample rate in Hz. The demodulator derives samples-per-symbol
    /// as `sample_rate / 18_000`.
    pub sample_rate_hz: f64,

    /// Initial tune frequency in Hz.
    pub center_freq_hz: u64,

    /// Receiver gain.
    pub gain: Gain,

    /// Scanner detection thresholds.
    pub min_power_db: f32,
    pub min_confidence: f32,

    /// Scanner step size in Hz (default 25 kHz).
    pub scan_step_hz: u64,

    /// Enables the crypto trial engine (C7).
    pub auto_decrypt: bool,

    /// Path to a key file in the §6 `ALGO KEYID HEX` text format.
    pub key_file: Option<String>,

    /// Path to the external ACELP decoder executable.
    pub codec_path: String,

    /// Idle period before closing a voice recording segment.
    pub voice_silence_timeout_ms: u64,

    /// Logging configuration for the pipeline's internal `SignalLogger`.
    #[serde(default)]
    pub logging: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_rate_hz: 1_800_000.0,
            center_freq_hz: 392_000_000,
            gain: Gain::Auto,
            min_power_db: -45.0,
            min_confidence: 0.5,
            scan_step_hz: 25_000,
            auto_decrypt: true,
            key_file: None,
            codec_path: "cdecoder".to_string(),
            voice_silence_timeout_ms: 2_000,
            logging: LogConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate_hz < 1_000_000.0 {
            return Err(ConfigError::InvalidSampleRate {
                rate_hz: self.sample_rate_hz,
            });
        }
        Ok(())
    }
}

/// Region-specific carrier scan presets.
///
/// Matches §4.2: "scan_preset(region) uses region-specific bands (e.g.,
/// 380-385, 390-395, 410-430 MHz for one region)".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanRegion {
    Europe,
    NorthAmerica,
}

impl ScanRegion {
    /// Frequency bands as (start_hz, end_hz) pairs to sweep for this region.
    pub fn bands(self) -> &'static [(u64, u64)] {
        match self {
            ScanRegion::Europe => &[
                (380_000_000, 385_000_000),
                (390_000_000, 395_000_000),
                (410_000_000, 430_000_000),
            ],
            ScanRegion::NorthAmerica => &[(806_000_000, 824_000_000), (851_000_000, 869_000_000)],
        }
    }
}

/// A single key record loaded from a key file, per §6's `ALGO KEYID HEX` format.
#[derive(Debug, Clone)]
pub struct KeyRecord {
    pub algorithm: TeaAlgorithm,
    pub key_id: u32,
    pub key: Vec<u8>,
}

/// Read-only key table, shared across crypto-trial callers via `Arc` per §5.
#[derive(Debug, Clone, Default)]
pub struct KeyStore {
    keys: HashMap<(TeaAlgorithm, u32), Vec<u8>>,
    /// Lines skipped while loading, with a human-readable reason.
    pub warnings: Vec<String>,
}

impl KeyStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse the §6 key-file text format. Malformed lines are skipped with a
    /// warning rather than aborting the whole load, matching §7's policy of
    /// never dropping a whole session over one bad line.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::KeyFileUnreadable {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    pub fn parse(text: &str) -> Self {
        let mut store = Self::default();
        for (lineno, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split_whitespace();
            let (Some(algo_str), Some(id_str), Some(hex_str)) =
                (fields.next(), fields.next(), fields.next())
            else {
                store.warnings.push(format!("line {}: expected 3 fields, skipping", lineno + 1));
                continue;
            };

            let Some(algorithm) = TeaAlgorithm::from_str(algo_str) else {
                store
                    .warnings
                    .push(format!("line {}: unknown algorithm '{algo_str}', skipping", lineno + 1));
                continue;
            };

            let Some(key_id) = parse_key_id(id_str) else {
                store
                    .warnings
                    .push(format!("line {}: invalid key id '{id_str}', skipping", lineno + 1));
                continue;
            };

            let Some(key) = parse_hex_key(hex_str) else {
                store.warnings.push(format!("line {}: invalid hex key, skipping", lineno + 1));
                continue;
            };

            if key.len() != algorithm.key_len() {
                store.warnings.push(format!(
                    "line {}: {} key must be {} bytes, got {}, skipping",
                    lineno + 1,
                    algorithm.name(),
                    algorithm.key_len(),
                    key.len()
                ));
                continue;
            }

            store.keys.insert((algorithm, key_id), key);
        }
        store
    }

    /// Insert a key record directly, bypassing file parsing (useful for
    /// programmatic key provisioning and tests).
    pub fn insert(&mut self, record: KeyRecord) {
        self.keys.insert((record.algorithm, record.key_id), record.key);
    }

    pub fn keys_for(&self, algorithm: TeaAlgorithm) -> impl Iterator<Item = (u32, &[u8])> {
        self.keys
            .iter()
            .filter(move |((algo, _), _)| *algo == algorithm)
            .map(|((_, id), key)| (*id, key.as_slice()))
    }

    pub fn get(&self, algorithm: TeaAlgorithm, key_id: u32) -> Option<&[u8]> {
        self.keys.get(&(algorithm, key_id)).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

fn parse_key_id(s: &str) -> Option<u32> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        s.parse::<u32>().ok()
    }
}

fn parse_hex_key(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn low_sample_rate_rejected() {
        let mut config = Config::default();
        config.sample_rate_hz = 500_000.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_well_formed_key_file() {
        let text = "TEA1 1 00112233445566778899\nTEA2 0x2 00112233445566778899aabbccddeeff\n";
        let store = KeyStore::parse(text);
        assert_eq!(store.len(), 2);
        assert!(store.get(TeaAlgorithm::Tea1, 1).is_some());
        assert!(store.get(TeaAlgorithm::Tea2, 2).is_some());
        assert!(store.warnings.is_empty());
    }

    #[test]
    fn skips_comments_and_malformed_lines() {
        let text = "# comment\nTEA1 1 nothex\nTEA9 1 00112233445566778899\nTEA1 1 0011\n";
        let store = KeyStore::parse(text);
        assert_eq!(store.len(), 0);
        assert_eq!(store.warnings.len(), 3);
    }

    #[test]
    fn missing_key_file_surfaces_config_error() {
        let result = KeyStore::load_from_file("/nonexistent/path/to/keys.txt");
        assert!(matches!(result, Err(ConfigError::KeyFileUnreadable { .. })));
    }

    #[test]
    fn scan_region_bands_nonempty() {
        assert!(!ScanRegion::Europe.bands().is_empty());
        assert!(!ScanRegion::NorthAmerica.bands().is_empty());
    }
}
