//! Structured logging for decode events and host-level diagnostics.

use crate::config::{LogFormat, LogTarget, LoggingConfig};
use chrono::{DateTime, Utc};
use color_eyre::eyre::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};

/// Structured log event types emitted by the host binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogEvent {
    /// Decode throughput sample.
    Telemetry(TelemetryEvent),

    /// One decoded MAC PDU.
    FrameDecode(FrameDecodeEvent),

    /// Run summary emitted once at shutdown.
    Statistics(StatisticsEvent),

    Info { message: String },
    Warn { message: String },
    Error { message: String, details: Option<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub timestamp: DateTime<Utc>,
    pub pdus_decoded: usize,
    pub sds_messages: usize,
    pub voice_frames: usize,
    pub encrypted_pdus: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameDecodeEvent {
    pub timestamp: DateTime<Utc>,
    pub burst_index: usize,
    pub hex_dump: FrameHexDump,
    pub decoded: DecodedFrame,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameHexDump {
    pub pdu_type: String,
    pub address: String,
    pub payload: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedFrame {
    pub slot_number: u8,
    pub frame_number: u32,
    pub crc_ok: bool,
    pub call_summary: String,
    pub encryption_summary: String,
    /// SDS decode of the PDU's own clear payload, when present (see
    /// `LogEvent::Info` for reassembled-fragment SDS messages).
    pub sds_summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsEvent {
    pub timestamp: DateTime<Utc>,
    pub duration_secs: f64,
    pub total_pdus: usize,
    pub total_sds_messages: usize,
    pub total_voice_frames: usize,
    pub encrypted_ratio: f64,
}

/// Logger that outputs structured logs in one of a few textual formats.
pub struct StructuredLogger {
    config: LoggingConfig,
    writer: Box<dyn Write + Send>,
    start_time: DateTime<Utc>,
}

impl StructuredLogger {
    pub fn new(config: LoggingConfig) -> Result<Self> {
        let writer: Box<dyn Write + Send> = match &config.target {
            LogTarget::Stdout => Box::new(io::stdout()),
            LogTarget::Stderr => Box::new(io::stderr()),
            LogTarget::File => {
                let path = config
                    .file_path
                    .as_ref()
                    .ok_or_else(|| color_eyre::eyre::eyre!("File path required for file logging"))?;
                Box::new(BufWriter::new(File::create(path)?))
            }
        };

        Ok(Self {
            config,
            writer,
            start_time: Utc::now(),
        })
    }

    pub fn log(&mut self, event: LogEvent) -> Result<()> {
        let output = match self.config.format {
            LogFormat::Json => self.format_json(&event)?,
            LogFormat::Logfmt => self.format_logfmt(&event),
            LogFormat::Pretty => self.format_pretty(&event),
        };

        writeln!(self.writer, "{}", output)?;
        self.writer.flush()?;

        Ok(())
    }

    fn format_json(&self, event: &LogEvent) -> Result<String> {
        Ok(serde_json::to_string(event)?)
    }

    fn format_logfmt(&self, event: &LogEvent) -> String {
        let ts = Utc::now().to_rfc3339();

        match event {
            LogEvent::Telemetry(t) => format!(
                "ts=\"{}\" type=telemetry pdus={} sds={} voice_frames={} encrypted={}",
                ts, t.pdus_decoded, t.sds_messages, t.voice_frames, t.encrypted_pdus
            ),
            LogEvent::FrameDecode(f) => format!(
                "ts=\"{}\" type=frame burst={} pdu_type=\"{}\" call=\"{}\" sds=\"{}\"",
                ts,
                f.burst_index,
                f.hex_dump.pdu_type,
                f.decoded.call_summary,
                f.decoded.sds_summary.as_deref().unwrap_or("-")
            ),
            LogEvent::Statistics(s) => format!(
                "ts=\"{}\" type=statistics duration_secs={:.2} total_pdus={} total_sds={} total_voice_frames={} encrypted_ratio={:.3}",
                ts, s.duration_secs, s.total_pdus, s.total_sds_messages, s.total_voice_frames, s.encrypted_ratio
            ),
            LogEvent::Info { message } => format!("ts=\"{}\" level=info msg=\"{}\"", ts, message),
            LogEvent::Warn { message } => format!("ts=\"{}\" level=warn msg=\"{}\"", ts, message),
            LogEvent::Error { message, details } => match details {
                Some(d) => format!("ts=\"{}\" level=error msg=\"{}\" details=\"{}\"", ts, message, d),
                None => format!("ts=\"{}\" level=error msg=\"{}\"", ts, message),
            },
        }
    }

    fn format_pretty(&self, event: &LogEvent) -> String {
        let ts = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");

        match event {
            LogEvent::Telemetry(t) => format!(
                "[{}] TELEMETRY: PDUs={} SDS={} Voice={} Encrypted={}",
                ts, t.pdus_decoded, t.sds_messages, t.voice_frames, t.encrypted_pdus
            ),
            LogEvent::FrameDecode(f) => format!(
                "[{}] BURST[{}] slot={} frame={} crc_ok={} | {} | {} | {}{}",
                ts,
                f.burst_index,
                f.decoded.slot_number,
                f.decoded.frame_number,
                f.decoded.crc_ok,
                f.hex_dump.pdu_type,
                f.decoded.call_summary,
                f.decoded.encryption_summary,
                f.decoded
                    .sds_summary
                    .as_ref()
                    .map(|s| format!(" | {s}"))
                    .unwrap_or_default()
            ),
            LogEvent::Statistics(s) => format!(
                "[{}] STATISTICS ({:.2}s): PDUs={} SDS={} Voice={} EncryptedRatio={:.1}%",
                ts,
                s.duration_secs,
                s.total_pdus,
                s.total_sds_messages,
                s.total_voice_frames,
                s.encrypted_ratio * 100.0
            ),
            LogEvent::Info { message } => format!("[{}] INFO: {}", ts, message),
            LogEvent::Warn { message } => format!("[{}] WARN: {}", ts, message),
            LogEvent::Error { message, details } => match details {
                Some(d) => format!("[{}] ERROR: {} | {}", ts, message, d),
                None => format!("[{}] ERROR: {}", ts, message),
            },
        }
    }

    pub fn elapsed(&self) -> f64 {
        (Utc::now() - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}
