//! End-to-end scenarios spanning the MAC parser, SDS decoder, voice slot
//! extractor, and carrier scanner.

use num_complex::Complex;
use tetra_core::carrier_scanner::CarrierScanner;
use tetra_core::config::ScanRegion;
use tetra_core::errors::DeviceError;
use tetra_core::iq_source::IqSource;
use tetra_core::logging::{LogConfig, SignalLogger};
use tetra_core::mac::MacParser;
use tetra_core::sds::{self, EncodingTag, SdsMessage};
use tetra_core::utils::unpack_bits;
use tetra_core::voice;

use std::sync::{Arc, Mutex};

fn header_bits(pdu_type: u8, fill: u8) -> Vec<u8> {
    let mut bits = Vec::new();
    for i in (0..3).rev() {
        bits.push((pdu_type >> i) & 1);
    }
    bits.push(fill);
    bits
}

fn resource_bits(address: u32, length: u8, payload: &[u8]) -> Vec<u8> {
    let mut bits = header_bits(0, 0);
    bits.push(0); // encrypted
    for i in (0..24).rev() {
        bits.push(((address >> i) & 1) as u8);
    }
    for i in (0..6).rev() {
        bits.push(((length >> i) & 1) as u8);
    }
    bits.extend(unpack_bits(payload));
    bits
}

#[test]
fn sds_reassembly_happy_path() {
    let mut parser = MacParser::new();

    parser.parse(&resource_bits(0x456789, 32, b"EMERGENCY: Unit 5 responding to"));

    let mut frag_bits = header_bits(1, 0);
    frag_bits.extend(unpack_bits(b" incident at Main Street. ETA "));
    parser.parse(&frag_bits);

    let mut end_bits = header_bits(2, 0);
    for i in (0..6).rev() {
        end_bits.push((10u8 >> i) & 1);
    }
    end_bits.extend(unpack_bits(b"5 minutes."));
    let pdu = parser.parse(&end_bits).expect("End PDU parses");

    assert_eq!(pdu.address, Some(0x456789));
    let reassembled = pdu.reassembled.expect("fragment buffer reassembled a payload");
    let message = sds::decode(&reassembled);
    assert_eq!(
        message,
        SdsMessage::Text(
            EncodingTag::Utf8,
            "EMERGENCY: Unit 5 responding to incident at Main Street. ETA 5 minutes.".to_string()
        )
    );
}

#[test]
fn voice_frame_construction_matches_layout() {
    let mut symbols = vec![0u8; 255];
    for (i, s) in symbols.iter_mut().enumerate().take(108) {
        *s = ((i * 37 + 17) % 4) as u8;
    }
    let training = [0u8, 1, 1, 0, 1, 0, 0, 1, 1, 1, 0];
    for (i, &t) in training.iter().enumerate() {
        symbols[108 + i] = t;
    }
    for i in 119..227 {
        symbols[i] = ((i * 53 + 29) % 4) as u8;
    }

    let frame = voice::extract(&symbols, 0);
    assert_eq!(frame.len(), voice::FRAME_BYTES);
    assert_eq!(u16::from_le_bytes([frame[0], frame[1]]), 0x6B21);
    assert_eq!(u16::from_le_bytes([frame[230], frame[231]]), 0x6B22);
    assert_eq!(u16::from_le_bytes([frame[460], frame[461]]), 0x6B26);
}

#[test]
fn sds1_header_decodes_as_text() {
    let bytes = [0x05, 0x00, 0xC8, b'H', b'E', b'L', b'L', b'O'];
    assert_eq!(sds::decode(&bytes), SdsMessage::Text(EncodingTag::Sds1, "HELLO".to_string()));
}

#[test]
fn high_entropy_clear_pdu_promoted_to_encrypted() {
    let mut parser = MacParser::new();
    let payload: Vec<u8> = (0..16u8).collect();
    let bits = resource_bits(0x1, payload.len() as u8, &payload);
    let pdu = parser.parse(&bits).expect("Resource PDU parses");
    assert!(pdu.encrypted);
    assert_eq!(pdu.encryption_algorithm, Some("TEA1"));
}

struct NarrowbandSource {
    sample_rate: f64,
}

impl IqSource for NarrowbandSource {
    fn tune(&mut self, _hz: u64) -> Result<(), DeviceError> {
        Ok(())
    }

    fn set_sample_rate(&mut self, hz: f64) -> Result<f64, DeviceError> {
        self.sample_rate = hz;
        Ok(hz)
    }

    fn read_samples(&mut self, n: usize) -> Vec<Complex<f32>> {
        (0..n)
            .map(|i| {
                let phase = 2.0 * std::f64::consts::PI * 0.01 * i as f64;
                Complex::new((phase.cos() * 3.0) as f32, (phase.sin() * 3.0) as f32)
            })
            .collect()
    }
}

#[test]
fn scanner_detects_injected_carrier_across_a_region_sweep() {
    let logger = Arc::new(Mutex::new(SignalLogger::new(LogConfig::disabled())));
    let scanner = CarrierScanner::new(logger);
    let mut source = NarrowbandSource { sample_rate: 1_800_000.0 };

    let results = scanner.scan_preset(&mut source, ScanRegion::Europe, 25_000, -40.0, 0.1);
    assert!(!results.is_empty(), "expected at least one detected carrier");
}
