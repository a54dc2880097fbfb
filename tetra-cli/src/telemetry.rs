//! Decode throughput sampling and run-summary aggregation.

use crate::logging::{StatisticsEvent, TelemetryEvent};
use chrono::Utc;
use std::time::Instant;

/// Accumulates per-event counters and emits periodic throughput samples.
pub struct TelemetryAggregator {
    pdus_decoded: usize,
    sds_messages: usize,
    voice_frames: usize,
    encrypted_pdus: usize,

    last_sample_time: Instant,
    sample_interval_secs: f64,
}

impl TelemetryAggregator {
    pub fn new(sample_interval_secs: f64) -> Self {
        Self {
            pdus_decoded: 0,
            sds_messages: 0,
            voice_frames: 0,
            encrypted_pdus: 0,
            last_sample_time: Instant::now(),
            sample_interval_secs,
        }
    }

    pub fn record_pdu(&mut self, encrypted: bool) {
        self.pdus_decoded += 1;
        if encrypted {
            self.encrypted_pdus += 1;
        }
    }

    pub fn record_sds_message(&mut self) {
        self.sds_messages += 1;
    }

    pub fn record_voice_frame(&mut self) {
        self.voice_frames += 1;
    }

    fn should_sample(&self) -> bool {
        self.last_sample_time.elapsed().as_secs_f64() >= self.sample_interval_secs
    }

    /// Emit a telemetry sample if the sampling interval has elapsed.
    pub fn sample(&mut self) -> Option<TelemetryEvent> {
        if !self.should_sample() {
            return None;
        }
        self.last_sample_time = Instant::now();
        Some(TelemetryEvent {
            timestamp: Utc::now(),
            pdus_decoded: self.pdus_decoded,
            sds_messages: self.sds_messages,
            voice_frames: self.voice_frames,
            encrypted_pdus: self.encrypted_pdus,
        })
    }

    pub fn statistics(&self, duration_secs: f64) -> StatisticsEvent {
        let encrypted_ratio = if self.pdus_decoded > 0 {
            self.encrypted_pdus as f64 / self.pdus_decoded as f64
        } else {
            0.0
        };
        StatisticsEvent {
            timestamp: Utc::now(),
            duration_secs,
            total_pdus: self.pdus_decoded,
            total_sds_messages: self.sds_messages,
            total_voice_frames: self.voice_frames,
            encrypted_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statistics_computes_encrypted_ratio() {
        let mut agg = TelemetryAggregator::new(9999.0);
        agg.record_pdu(true);
        agg.record_pdu(false);
        agg.record_pdu(true);
        let stats = agg.statistics(1.0);
        assert_eq!(stats.total_pdus, 3);
        assert!((stats.encrypted_ratio - (2.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn sample_respects_interval() {
        let mut agg = TelemetryAggregator::new(9999.0);
        assert!(agg.sample().is_none());
    }
}
