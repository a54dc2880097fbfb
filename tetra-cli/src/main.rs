mod config;
mod frame_decoder;
mod logging;
mod telemetry;

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Context, Result};

use config::CliConfig;
use frame_decoder::FrameDecoder;
use logging::{LogEvent, StructuredLogger};
use telemetry::TelemetryAggregator;

use num_complex::Complex;
use tetra_core::carrier_scanner::CarrierScanner;
use tetra_core::config::{KeyStore, ScanRegion};
use tetra_core::events::DecodeEvent;
use tetra_core::iq_source::RecordedSource;
use tetra_core::logging::SignalLogger;
use tetra_core::mac::call_metadata_for;
use tetra_core::orchestrator::{drain_available, Orchestrator};

#[derive(Parser, Debug)]
#[command(author, version, about = "TETRA receive-only decoder host", long_about = None)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<String>,

    /// Path to a raw `.cfile` (interleaved little-endian f32 IQ samples).
    #[arg(short, long)]
    input: PathBuf,

    /// Sweep for active carriers instead of decoding.
    #[arg(long)]
    scan: bool,

    /// Region preset used by `--scan` ("europe" or "north-america").
    #[arg(long, default_value = "europe")]
    region: String,

    /// Directory decoded voice segments are written to as WAV files,
    /// overriding the config file's `terminal.voice_output_dir`.
    #[arg(long)]
    voice_out: Option<PathBuf>,

    /// Enable verbose (debug-level) logging, overriding the config file.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    let mut config = match &args.config {
        Some(path) => CliConfig::from_file(path).wrap_err_with(|| format!("Failed to load config from {path}"))?,
        None => CliConfig::default(),
    };

    if args.verbose {
        config.terminal.logging.level = config::LogLevel::Debug;
    }
    if let Some(voice_out) = &args.voice_out {
        config.terminal.voice_output_dir = Some(voice_out.clone());
    }

    config.core.validate().wrap_err("Invalid decoder configuration")?;

    let mut logger = StructuredLogger::new(config.terminal.logging.clone())?;

    let samples = load_cfile(&args.input).wrap_err_with(|| format!("Failed to load IQ file {}", args.input.display()))?;
    logger.log(LogEvent::Info {
        message: format!("loaded {} IQ samples from {}", samples.len(), args.input.display()),
    })?;

    if args.scan {
        return run_scan(&args, &config, samples, &mut logger);
    }

    run_decode(&args, config, samples, &mut logger)
}

fn region_from_str(s: &str) -> ScanRegion {
    match s.to_ascii_lowercase().as_str() {
        "north-america" | "north_america" | "na" => ScanRegion::NorthAmerica,
        _ => ScanRegion::Europe,
    }
}

fn run_scan(args: &Cli, config: &CliConfig, samples: Vec<Complex<f32>>, logger: &mut StructuredLogger) -> Result<()> {
    let scan_logger = Arc::new(Mutex::new(SignalLogger::new(config.terminal.logging.to_core_log_config())));
    let scanner = CarrierScanner::new(scan_logger);
    let mut source = RecordedSource::new(samples, config.core.sample_rate_hz);
    let region = region_from_str(&args.region);

    let results = scanner.scan_preset(&mut source, region, config.core.scan_step_hz, config.core.min_power_db, config.core.min_confidence);

    for result in &results {
        logger.log(LogEvent::Info {
            message: format!(
                "carrier at {} Hz: power={:.1} dB confidence={:.2}",
                result.frequency_hz, result.power_db, result.confidence
            ),
        })?;
    }
    logger.log(LogEvent::Info {
        message: format!("scan complete: {} candidate carriers found", results.len()),
    })?;

    Ok(())
}

fn run_decode(args: &Cli, config: CliConfig, samples: Vec<Complex<f32>>, logger: &mut StructuredLogger) -> Result<()> {
    let key_store = match &config.core.key_file {
        Some(path) => KeyStore::load_from_file(path).wrap_err_with(|| format!("Failed to load key file {path}"))?,
        None => KeyStore::empty(),
    };
    for warning in &key_store.warnings {
        logger.log(LogEvent::Warn { message: warning.clone() })?;
    }

    let core_logger = SignalLogger::new(config.terminal.logging.to_core_log_config());
    let orchestrator = Orchestrator::new(config.core.clone(), key_store, core_logger);
    let source = Box::new(RecordedSource::new(samples, config.core.sample_rate_hz));
    let (events, shutdown) = orchestrator.run(source);

    let frame_decoder = FrameDecoder::new();
    let mut telemetry = TelemetryAggregator::new(config.terminal.telemetry_interval_secs);
    let idle_timeout = Duration::from_millis(config.terminal.idle_timeout_ms);
    let mut burst_index = 0usize;

    loop {
        match events.recv_timeout(idle_timeout) {
            Ok(event) => {
                handle_event(event, &frame_decoder, &mut telemetry, &config, logger, &mut burst_index)?;
                if let Some(sample) = telemetry.sample() {
                    logger.log(LogEvent::Telemetry(sample))?;
                }
            }
            Err(_) => break,
        }
    }

    shutdown.store(true, Ordering::Relaxed);
    for event in drain_available(&events) {
        handle_event(event, &frame_decoder, &mut telemetry, &config, logger, &mut burst_index)?;
    }

    let stats = telemetry.statistics(logger.elapsed());
    logger.log(LogEvent::Statistics(stats))?;

    Ok(())
}

fn handle_event(
    event: DecodeEvent,
    frame_decoder: &FrameDecoder,
    telemetry: &mut TelemetryAggregator,
    config: &CliConfig,
    logger: &mut StructuredLogger,
    burst_index: &mut usize,
) -> Result<()> {
    match event {
        DecodeEvent::FrameDecoded {
            burst,
            pdu,
            call_metadata,
            encryption_status,
            sds_message,
        } => {
            let call_metadata = call_metadata.or_else(|| call_metadata_for(&pdu));
            telemetry.record_pdu(pdu.encrypted);
            if sds_message.is_some() {
                telemetry.record_sds_message();
            }
            let frame_event = frame_decoder.decode_frame(*burst_index, &burst, &pdu, &call_metadata, &encryption_status, &sds_message);
            *burst_index += 1;
            logger.log(LogEvent::FrameDecode(frame_event))?;
        }
        DecodeEvent::SdsReassembled { address, message } => {
            telemetry.record_sds_message();
            logger.log(LogEvent::Info {
                message: format!("SDS from 0x{address:06X}: {message:?}"),
            })?;
        }
        DecodeEvent::VoiceAudio { pcm, burst_id, .. } => {
            telemetry.record_voice_frame();
            if let Some(dir) = &config.terminal.voice_output_dir {
                write_voice_segment(dir, burst_id, &pcm, config.core.sample_rate_hz as u32)?;
            }
        }
        DecodeEvent::ScanResult(result) => {
            logger.log(LogEvent::Info {
                message: format!("scan result: {:?}", result),
            })?;
        }
        DecodeEvent::DeviceError(message) => {
            logger.log(LogEvent::Error { message, details: None })?;
        }
    }
    Ok(())
}

fn write_voice_segment(dir: &std::path::Path, burst_id: u64, pcm: &[i16], sample_rate_hz: u32) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("voice-{burst_id}.wav"));
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: sample_rate_hz,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec)?;
    for &sample in pcm {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Read a raw `.cfile`: interleaved little-endian `f32` I/Q pairs, the format
/// `gr_complex`-based tools (GNU Radio, rtl_sdr pipelines) commonly emit.
fn load_cfile(path: &std::path::Path) -> Result<Vec<Complex<f32>>> {
    let bytes = std::fs::read(path)?;
    Ok(bytes
        .chunks_exact(8)
        .map(|chunk| {
            let re = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            let im = f32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);
            Complex::new(re, im)
        })
        .collect())
}
