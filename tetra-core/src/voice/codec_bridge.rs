//! Codec Bridge (C9): shells out to an external ACELP decoder binary.
//!
//! The subprocess invocation pattern — build a `Command` with `.arg(...)`
//! chains, pipe stdout/stderr, treat a non-zero exit as a recoverable
//! per-call failure — follows the same shape as other external-tool bridges
//! in the surrounding example pack.

use std::io::Read;
use std::process::{Command, Stdio};
use std::time::Duration;

use tempfile::NamedTempFile;

use super::slot::FRAME_BYTES;

const TIMEOUT: Duration = Duration::from_secs(5);
const BLOCK_BYTES: usize = 276;
const PCM_SAMPLES_PER_BLOCK: usize = 137;

/// Decode a 1380-byte voice frame into 8 kHz PCM samples via the external
/// `cdecoder` binary. Any precondition violation or subprocess failure
/// produces an empty vector rather than an error, per §4.8.
pub fn decode_voice(codec_path: &str, frame: &[u8; FRAME_BYTES]) -> Vec<i16> {
    if u16::from_le_bytes([frame[0], frame[1]]) != 0x6B21 {
        return Vec::new();
    }

    let Ok(mut input_file) = NamedTempFile::new() else {
        return Vec::new();
    };
    if std::io::Write::write_all(&mut input_file, frame).is_err() {
        return Vec::new();
    }

    let Ok(output_file) = NamedTempFile::new() else {
        return Vec::new();
    };

    let mut child = match Command::new(codec_path)
        .arg(input_file.path())
        .arg(output_file.path())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(_) => return Vec::new(),
    };

    let start = std::time::Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) => {
                if start.elapsed() >= TIMEOUT {
                    let _ = child.kill();
                    let _ = child.wait();
                    break None;
                }
                std::thread::sleep(Duration::from_millis(20));
            }
            Err(_) => break None,
        }
    };

    match status {
        Some(status) if status.success() => {}
        _ => return Vec::new(),
    }

    let mut output_bytes = Vec::new();
    if std::fs::File::open(output_file.path())
        .and_then(|mut f| f.read_to_end(&mut output_bytes))
        .is_err()
    {
        return Vec::new();
    }

    if output_bytes.is_empty() {
        return Vec::new();
    }

    parse_pcm_blocks(&output_bytes)
}

/// Parse repeating 276-byte blocks of `[BFI:u16][137 x i16 PCM]`,
/// concatenating PCM across all blocks.
fn parse_pcm_blocks(bytes: &[u8]) -> Vec<i16> {
    let mut pcm = Vec::new();
    for block in bytes.chunks(BLOCK_BYTES) {
        if block.len() < BLOCK_BYTES {
            break;
        }
        let samples = &block[2..];
        for i in 0..PCM_SAMPLES_PER_BLOCK {
            let sample = i16::from_le_bytes([samples[i * 2], samples[i * 2 + 1]]);
            pcm.push(sample);
        }
    }
    pcm
}

/// Normalize PCM samples to `[-1.0, 1.0]` float for downstream consumers
/// that want floating-point audio.
pub fn normalize_to_float(pcm: &[i16]) -> Vec<f32> {
    pcm.iter().map(|&s| s as f32 / 32768.0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_magic() {
        let frame = [0u8; FRAME_BYTES];
        assert!(decode_voice("cdecoder", &frame).is_empty());
    }

    #[test]
    fn missing_binary_produces_empty_output() {
        let mut frame = [0u8; FRAME_BYTES];
        frame[0] = 0x21;
        frame[1] = 0x6B;
        let pcm = decode_voice("/nonexistent/cdecoder-binary", &frame);
        assert!(pcm.is_empty());
    }

    #[test]
    fn parse_pcm_blocks_concatenates_multiple_blocks() {
        let mut bytes = Vec::new();
        for block in 0..2 {
            bytes.extend_from_slice(&0u16.to_le_bytes()); // BFI
            for i in 0..PCM_SAMPLES_PER_BLOCK {
                bytes.extend_from_slice(&((block * 1000 + i) as i16).to_le_bytes());
            }
        }
        let pcm = parse_pcm_blocks(&bytes);
        assert_eq!(pcm.len(), PCM_SAMPLES_PER_BLOCK * 2);
        assert_eq!(pcm[0], 0);
        assert_eq!(pcm[PCM_SAMPLES_PER_BLOCK], 1000);
    }

    #[test]
    fn normalize_maps_full_scale_to_unit_range() {
        let pcm = vec![32767, -32768, 0];
        let floats = normalize_to_float(&pcm);
        assert!((floats[0] - 0.999969).abs() < 1e-4);
        assert!((floats[1] + 1.0).abs() < 1e-4);
        assert_eq!(floats[2], 0.0);
    }
}
