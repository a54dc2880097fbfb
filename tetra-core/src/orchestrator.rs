//! Decode Orchestrator (C10): wires C1-C9 into a multi-threaded pipeline
//! connected by bounded `crossbeam_channel` queues, per §5's concurrency
//! model.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crossbeam::channel::{bounded, Receiver, Sender, TryRecvError};
use num_complex::Complex64;

use crate::burst::BurstFramer;
use crate::config::{Config, KeyStore};
use crate::crypto;
use crate::events::{DecodeEvent, EncryptionStatus};
use crate::iq_source::IqSource;
use crate::logging::SignalLogger;
use crate::mac::{CallMetadata, MacParser, MacPdu, PduType};
use crate::sds;
use crate::signal_processing::{process_iq_block, DemodulatorConfig};
use crate::voice;

const QUEUE_DEPTH: usize = 64;
const IQ_BLOCK_SAMPLES: usize = 8192;

/// Owns the configuration, key store, and logger for one decode session and
/// spawns the worker threads.
pub struct Orchestrator {
    config: Config,
    key_store: Arc<KeyStore>,
    logger: Arc<Mutex<SignalLogger>>,
}

impl Orchestrator {
    pub fn new(config: Config, key_store: KeyStore, logger: SignalLogger) -> Self {
        Self {
            config,
            key_store: Arc::new(key_store),
            logger: Arc::new(Mutex::new(logger)),
        }
    }

    /// Start the pipeline against `source`, returning the event receiver the
    /// host drains and a shutdown flag the host can set to stop all threads.
    pub fn run(self, mut source: Box<dyn IqSource + Send>) -> (Receiver<DecodeEvent>, Arc<AtomicBool>) {
        let shutdown = Arc::new(AtomicBool::new(false));
        let (iq_tx, iq_rx) = bounded::<Vec<Complex64>>(QUEUE_DEPTH);
        let (bits_tx, bits_rx) = bounded::<(Vec<u8>, Vec<u8>)>(QUEUE_DEPTH);
        let (event_tx, event_rx) = bounded::<DecodeEvent>(QUEUE_DEPTH);

        let demod_config = DemodulatorConfig {
            sample_rate_hz: self.config.sample_rate_hz,
        };

        let io_shutdown = shutdown.clone();
        let io_logger = self.logger.clone();
        let io_tx = iq_tx.clone();
        std::thread::spawn(move || {
            while !io_shutdown.load(Ordering::Relaxed) {
                let samples = source.read_samples(IQ_BLOCK_SAMPLES);
                if samples.is_empty() {
                    continue;
                }
                let complex64: Vec<Complex64> = samples.iter().map(|s| Complex64::new(s.re as f64, s.im as f64)).collect();
                if io_tx.send(complex64).is_err() {
                    break;
                }
            }
            io_logger.lock().unwrap().debug("IO", "I/O thread exiting".to_string());
        });

        let dsp_shutdown = shutdown.clone();
        std::thread::spawn(move || {
            while !dsp_shutdown.load(Ordering::Relaxed) {
                match iq_rx.recv() {
                    Ok(block) => {
                        let (symbols, bits) = process_iq_block(&block, &demod_config);
                        if bits_tx.send((symbols, bits)).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        });

        let protocol_shutdown = shutdown.clone();
        let key_store = self.key_store.clone();
        let auto_decrypt = self.config.auto_decrypt;
        let codec_path = self.config.codec_path.clone();
        let protocol_logger = self.logger.clone();
        let protocol_event_tx = event_tx.clone();
        std::thread::spawn(move || {
            let mut framer = BurstFramer::new();
            let mut parser = MacParser::new();
            let mut burst_id = 0u64;

            while !protocol_shutdown.load(Ordering::Relaxed) {
                let (symbols, bits) = match bits_rx.recv() {
                    Ok(pair) => pair,
                    Err(_) => break,
                };

                for (_, burst) in framer.frame(&bits) {
                    burst_id += 1;
                    let Some(pdu) = parser.parse(&burst.data_bits) else {
                        continue;
                    };

                    let call_metadata = crate::mac::call_metadata_for(&pdu);
                    let encryption_status = resolve_encryption(&pdu, &key_store, auto_decrypt);

                    // SDS decode runs whenever a reassembled payload is present or the
                    // PDU itself carries clear plaintext, per §4.4/§4.6's dispatch rule.
                    let mut sds_message = None;
                    if let Some(reassembled) = &pdu.reassembled {
                        if let Some(address) = pdu.address {
                            let message = sds::decode(reassembled);
                            send_prioritized(&protocol_event_tx, DecodeEvent::SdsReassembled { address, message }, false);
                        }
                    } else if !pdu.encrypted && !pdu.payload.is_empty() {
                        sds_message = Some(sds::decode(&pdu.payload));
                    }

                    send_prioritized(
                        &protocol_event_tx,
                        DecodeEvent::FrameDecoded {
                            burst: burst.clone(),
                            pdu: pdu.clone(),
                            call_metadata: call_metadata.clone(),
                            encryption_status,
                            sds_message,
                        },
                        false,
                    );

                    if is_voice_bearing(&pdu) {
                        let frame = voice::extract(&symbols, 0);
                        let pcm = voice::decode_voice(&codec_path, &frame);
                        if !pcm.is_empty() {
                            let source_ssi = call_metadata.as_ref().and_then(|m| m.source_ssi);
                            send_prioritized(
                                &protocol_event_tx,
                                DecodeEvent::VoiceAudio {
                                    pcm,
                                    burst_id,
                                    timestamp_ms: now_ms(),
                                    source_ssi,
                                },
                                true,
                            );
                        }
                    }
                }
            }
            protocol_logger.lock().unwrap().debug("PROTOCOL", "protocol worker exiting".to_string());
        });

        (event_rx, shutdown)
    }
}

fn resolve_encryption(pdu: &MacPdu, key_store: &KeyStore, auto_decrypt: bool) -> EncryptionStatus {
    if !pdu.encrypted {
        return EncryptionStatus::Clear;
    }
    let decrypted = if auto_decrypt { crypto::attempt(pdu, key_store) } else { None };
    EncryptionStatus::Encrypted {
        algorithm: pdu.encryption_algorithm,
        decrypted,
    }
}

/// TCH (voice-bearing) traffic is inferred from fragment-typed PDUs whose
/// declared call type is Voice, per §9's voice-detection note.
fn is_voice_bearing(pdu: &MacPdu) -> bool {
    matches!(pdu.pdu_type, PduType::USignal | PduType::Frag)
        && crate::mac::call_metadata_for(pdu).map(|m| m.call_type == crate::mac::CallType::Voice).unwrap_or(false)
}

/// Send an event, dropping `VoiceAudio` rather than blocking when the queue
/// is full (prioritized backpressure per §4.9/§5); protocol events always
/// block until there is room.
fn send_prioritized(tx: &Sender<DecodeEvent>, event: DecodeEvent, droppable: bool) {
    if droppable {
        let _ = tx.try_send(event);
    } else {
        let _ = tx.send(event);
    }
}

fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}

/// Drain whatever events are queued without blocking, used by hosts that
/// poll rather than block on the receiver.
pub fn drain_available(rx: &Receiver<DecodeEvent>) -> Vec<DecodeEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iq_source::RecordedSource;
    use crate::logging::LogConfig;
    use num_complex::Complex;

    #[test]
    fn empty_source_produces_no_events_quickly() {
        let config = Config::default();
        let orchestrator = Orchestrator::new(config, KeyStore::empty(), SignalLogger::new(LogConfig::disabled()));
        let source = Box::new(RecordedSource::new(Vec::<Complex<f32>>::new(), 1_800_000.0));
        let (rx, shutdown) = orchestrator.run(source);
        std::thread::sleep(std::time::Duration::from_millis(50));
        shutdown.store(true, Ordering::Relaxed);
        assert!(drain_available(&rx).is_empty());
    }
}
