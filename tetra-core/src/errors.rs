//! TETRA decoder error types with granular categories

use thiserror::Error;

/// Top-level error type for all construction-time decoder operations.
///
/// Per-burst and per-PDU failures never surface as `Result`s (see §7 of the
/// design document): they are recorded as flags on the decoded value and the
/// pipeline keeps running. This type is reserved for failures that prevent a
/// session from starting or continuing at all.
#[derive(Debug, Error)]
pub enum TetraError {
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    #[error("format error: {0}")]
    Format(#[from] FormatError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// IQ source / SDR hardware failures. Fatal to the current session.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("failed to open IQ source: {reason}")]
    OpenFailed { reason: String },

    #[error("tune to {hz} Hz failed: {reason}")]
    TuneFailed { hz: u64, reason: String },

    #[error("sample rate {requested_hz} Hz rejected by device (actual {actual_hz} Hz)")]
    SampleRateRejected { requested_hz: f64, actual_hz: f64 },

    #[error("IQ source closed unexpectedly")]
    StreamClosed,
}

/// Malformed bit streams or truncated payloads.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("bit stream shorter than expected: need {required}, have {available}")]
    Truncated { required: usize, available: usize },

    #[error("payload truncated: declared length {declared}, available {available}")]
    PayloadTruncated { declared: usize, available: usize },

    #[error("voice frame has wrong size: expected {expected}, got {actual}")]
    InvalidFrameSize { expected: usize, actual: usize },
}

/// Key length or algorithm mismatches during a cipher trial.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key length mismatch for {algorithm}: expected {expected} bytes, got {actual}")]
    KeyLengthMismatch {
        algorithm: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("ciphertext too short for a block trial: {len} bytes")]
    CiphertextTooShort { len: usize },
}

/// External ACELP codec subprocess failures. Per-frame, degrades to empty PCM.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("codec binary not found at {path}")]
    BinaryNotFound { path: String },

    #[error("codec process exited with status {status}")]
    NonZeroExit { status: i32 },

    #[error("codec process timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("codec produced no output file")]
    MissingOutput,

    #[error("failed to spawn codec subprocess: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Unreadable key files, missing codec binaries, invalid configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read key file {path}: {source}")]
    KeyFileUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid sample rate: {rate_hz} Hz (must be >= 1_000_000 Hz)")]
    InvalidSampleRate { rate_hz: f64 },

    #[error("invalid scan range: start {start_hz} Hz >= end {end_hz} Hz")]
    InvalidScanRange { start_hz: u64, end_hz: u64 },
}

/// Result type alias for TETRA decoder construction-time operations.
pub type Result<T> = std::result::Result<T, TetraError>;
