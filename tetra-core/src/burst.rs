//! Burst Framer (C4): training-sequence sync search, burst classification,
//! and data-bit extraction from a raw bit stream.

use crate::utils::BitReader;

/// Length of one TETRA burst in bits (255 symbols).
pub const BURST_BITS: usize = 510;
/// Bit offset of the training sequence within a burst.
pub const TRAINING_OFFSET: usize = 216;
/// Length of the correlated training sequence, in bits.
pub const TRAINING_BITS: usize = 22;
/// Minimum bit gap enforced between two sync matches so the same training
/// sequence is never detected twice.
pub const MIN_RESTART_GAP: usize = 250;

/// Continuous downlink training sequence (22 bits).
const TRAINING_CONTINUOUS: [u8; TRAINING_BITS] = [
    1, 1, 0, 0, 0, 1, 1, 1, 0, 1, 0, 1, 1, 0, 0, 0, 1, 1, 1, 0, 1, 0,
];

/// Discontinuous downlink training sequence (22 bits).
const TRAINING_DISCONTINUOUS: [u8; TRAINING_BITS] = [
    0, 1, 1, 1, 1, 0, 1, 0, 0, 1, 1, 0, 1, 1, 1, 1, 0, 1, 0, 0, 1, 1,
];

/// Correlation thresholds tried in order during sync search, per §4.3.
const SYNC_THRESHOLDS: [f64; 3] = [0.75, 0.65, 0.55];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstKind {
    NormalDownlink,
    NormalUplink,
    ControlDownlink,
    ControlUplink,
    Synchronization,
    Linearization,
}

/// A framed burst: 255 symbols / 510 bits sliced out of the raw bit stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Burst {
    pub slot_number: u8,
    pub frame_number: u32,
    pub burst_kind: BurstKind,
    pub crc_ok: bool,
    /// 216 bits concatenated from the two data blocks.
    pub data_bits: Vec<u8>,
}

/// Stateful framer: tracks slot/frame counters across successive `frame()`
/// calls on a continuous bit stream.
pub struct BurstFramer {
    slot_counter: u8,
    frame_counter: u32,
}

impl Default for BurstFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl BurstFramer {
    pub fn new() -> Self {
        Self {
            slot_counter: 0,
            frame_counter: 0,
        }
    }

    /// Frame every burst found in `bits`, returning them with their starting
    /// bit offsets.
    pub fn frame(&mut self, bits: &[u8]) -> Vec<(usize, Burst)> {
        let mut out = Vec::new();
        let mut search_from = 0usize;

        while search_from + TRAINING_BITS <= bits.len() {
            match find_sync(&bits[search_from..]) {
                Some(rel_pos) => {
                    let abs_pos = search_from + rel_pos;
                    let burst_start = abs_pos as i64 - TRAINING_OFFSET as i64;
                    if burst_start >= 0 && (burst_start as usize) + BURST_BITS <= bits.len() {
                        let start = burst_start as usize;
                        let burst = self.build_burst(&bits[start..start + BURST_BITS]);
                        out.push((start, burst));
                    }
                    search_from = abs_pos + MIN_RESTART_GAP;
                }
                None => break,
            }
        }

        if out.is_empty() && bits.len() >= BURST_BITS {
            // Regular-offset fallback: no correlated sync found anywhere.
            let mut offset = 0;
            while offset + BURST_BITS <= bits.len() {
                let burst = self.build_burst(&bits[offset..offset + BURST_BITS]);
                out.push((offset, burst));
                offset += BURST_BITS;
            }
        }

        out
    }

    fn build_burst(&mut self, burst_bits: &[u8]) -> Burst {
        debug_assert_eq!(burst_bits.len(), BURST_BITS);

        let burst_kind = detect_burst_type(burst_bits);
        let data_bits = extract_data_bits(burst_bits, burst_kind);
        let crc_ok = heuristic_crc_ok(&data_bits);

        let burst = Burst {
            slot_number: self.slot_counter,
            frame_number: self.frame_counter,
            burst_kind,
            crc_ok,
            data_bits,
        };

        self.slot_counter = (self.slot_counter + 1) % 4;
        if self.slot_counter == 0 {
            self.frame_counter = self.frame_counter.wrapping_add(1);
        }
        burst
    }
}

/// Detect burst type from the training sequence position, per §4.3. A sync
/// burst carries its training sequence at the burst's midpoint rather than
/// the usual offset; anything else is treated as a normal downlink burst.
fn detect_burst_type(burst_bits: &[u8]) -> BurstKind {
    let sync_pos = burst_bits.len() / 2;
    if let Some(window) = burst_bits.get(sync_pos..sync_pos + TRAINING_BITS) {
        let match_cont = window.iter().zip(TRAINING_CONTINUOUS.iter()).filter(|(a, b)| a == b).count() as f64
            / TRAINING_BITS as f64;
        let match_disc = window.iter().zip(TRAINING_DISCONTINUOUS.iter()).filter(|(a, b)| a == b).count() as f64
            / TRAINING_BITS as f64;
        if match_cont.max(match_disc) > 0.8 {
            return BurstKind::Synchronization;
        }
    }
    BurstKind::NormalDownlink
}

/// Extract the 216 data bits for a burst of the given kind, per §4.3.
pub fn extract_data_bits(burst_bits: &[u8], kind: BurstKind) -> Vec<u8> {
    match kind {
        BurstKind::Synchronization => {
            if burst_bits.len() >= 130 {
                burst_bits[108..130].to_vec()
            } else {
                burst_bits.to_vec()
            }
        }
        _ => {
            if burst_bits.len() >= 230 {
                let mut data = Vec::with_capacity(216);
                data.extend_from_slice(&burst_bits[0..108]);
                data.extend_from_slice(&burst_bits[122..230]);
                data
            } else {
                burst_bits.to_vec()
            }
        }
    }
}

/// Slide the two known training patterns across `bits`, trying successively
/// looser thresholds, returning the first match position.
fn find_sync(bits: &[u8]) -> Option<usize> {
    for &threshold in &SYNC_THRESHOLDS {
        if let Some(pos) = correlate(bits, &TRAINING_CONTINUOUS, threshold)
            .or_else(|| correlate(bits, &TRAINING_DISCONTINUOUS, threshold))
        {
            return Some(pos);
        }
    }
    None
}

fn correlate(bits: &[u8], pattern: &[u8; TRAINING_BITS], threshold: f64) -> Option<usize> {
    if bits.len() < TRAINING_BITS {
        return None;
    }
    let mut best: Option<(usize, f64)> = None;
    for start in 0..=(bits.len() - TRAINING_BITS) {
        let matches = bits[start..start + TRAINING_BITS]
            .iter()
            .zip(pattern.iter())
            .filter(|(a, b)| a == b)
            .count();
        let score = matches as f64 / TRAINING_BITS as f64;
        if score >= threshold {
            match best {
                Some((_, best_score)) if best_score >= score => {}
                _ => best = Some((start, score)),
            }
            // First qualifying position wins, matching §4.3's "any position
            // with correlation >= threshold".
            return Some(start);
        }
    }
    best.map(|(pos, _)| pos)
}

/// CRC-16-CCITT, poly 0x1021, init 0xFFFF.
pub fn crc16_ccitt(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 { (crc << 1) ^ 0x1021 } else { crc << 1 };
        }
    }
    crc
}

/// Byte-oriented entry point for the heuristic CRC check, used by the crypto
/// trial engine to score candidate plaintext (§4.6).
pub fn heuristic_crc_ok_bytes(data: &[u8]) -> bool {
    heuristic_crc_ok(&crate::utils::unpack_bits(data))
}

/// Heuristic CRC gate per §4.3: pass if the bit-ratio is far from 50/50, or a
/// CRC-16 recomputed over the payload differs from its trailing 16 bits in at
/// most 3 positions.
fn heuristic_crc_ok(data_bits: &[u8]) -> bool {
    if data_bits.is_empty() {
        return false;
    }
    let ones = data_bits.iter().filter(|&&b| b == 1).count();
    let zeros = data_bits.len() - ones;
    let min = ones.min(zeros) as f64;
    let max = ones.max(zeros).max(1) as f64;
    if min / max >= 0.15 {
        return true;
    }

    if data_bits.len() < 16 {
        return false;
    }
    let payload_len = data_bits.len() - 16;
    let payload_bytes = crate::utils::pack_bits(&data_bits[..payload_len]);
    let received_crc_bits = &data_bits[payload_len..];
    let received_crc = {
        let mut reader = BitReader::new(received_crc_bits);
        reader.read_u(16).unwrap_or(0) as u16
    };
    let computed_crc = crc16_ccitt(&payload_bytes);
    (computed_crc ^ received_crc).count_ones() <= 3
}

#[cfg(test)]
mod tests {
    use super::*;

    fn training_burst(kind_pattern: &[u8]) -> Vec<u8> {
        let mut bits = vec![0u8; BURST_BITS];
        for i in 0..TRAINING_OFFSET {
            bits[i] = (i as u8 * 37 + 17) % 2;
        }
        for (i, &b) in kind_pattern.iter().enumerate() {
            bits[TRAINING_OFFSET + i] = b;
        }
        bits
    }

    #[test]
    fn finds_sync_on_exact_training_match() {
        let bits = training_burst(&TRAINING_CONTINUOUS);
        let pos = find_sync(&bits);
        assert_eq!(pos, Some(TRAINING_OFFSET));
    }

    #[test]
    fn falls_back_to_regular_offsets_without_sync() {
        let mut framer = BurstFramer::new();
        let bits = vec![0u8; BURST_BITS * 2];
        let bursts = framer.frame(&bits);
        assert_eq!(bursts.len(), 2);
        assert_eq!(bursts[0].0, 0);
        assert_eq!(bursts[1].0, BURST_BITS);
    }

    #[test]
    fn data_bits_are_216_for_normal_burst() {
        let bits = training_burst(&TRAINING_CONTINUOUS);
        let data = extract_data_bits(&bits, BurstKind::NormalDownlink);
        assert_eq!(data.len(), 216);
    }

    #[test]
    fn short_burst_passes_through_unchanged() {
        let bits = vec![1u8; 100];
        let data = extract_data_bits(&bits, BurstKind::NormalDownlink);
        assert_eq!(data.len(), 100);
    }

    #[test]
    fn sync_data_bits_are_22_bits_at_108() {
        let mut bits = vec![0u8; BURST_BITS];
        for (i, b) in bits.iter_mut().enumerate().take(130).skip(108) {
            *b = (i as u8) % 2;
        }
        let data = extract_data_bits(&bits, BurstKind::Synchronization);
        assert_eq!(data, bits[108..130]);
    }

    #[test]
    fn detects_synchronization_burst_from_midpoint_training() {
        let mut bits = vec![0u8; BURST_BITS];
        let mid = BURST_BITS / 2;
        bits[mid..mid + TRAINING_BITS].copy_from_slice(&TRAINING_CONTINUOUS);
        assert_eq!(detect_burst_type(&bits), BurstKind::Synchronization);
    }

    #[test]
    fn detects_normal_burst_without_midpoint_training() {
        let bits = vec![0u8; BURST_BITS];
        assert_eq!(detect_burst_type(&bits), BurstKind::NormalDownlink);
    }

    #[test]
    fn crc16_over_payload_plus_its_own_crc_is_zero() {
        let payload = b"hello world";
        let crc = crc16_ccitt(payload);
        let mut with_crc = payload.to_vec();
        with_crc.push((crc >> 8) as u8);
        with_crc.push((crc & 0xFF) as u8);
        assert_eq!(crc16_ccitt(&with_crc), 0);
    }

    #[test]
    fn skewed_bit_ratio_passes_heuristic_crc() {
        let mut data = vec![0u8; 216];
        for b in data.iter_mut().take(20) {
            *b = 1;
        }
        assert!(heuristic_crc_ok(&data));
    }

    #[test]
    fn frame_slot_counter_wraps_at_four() {
        let mut framer = BurstFramer::new();
        let bits = vec![0u8; BURST_BITS * 5];
        let bursts = framer.frame(&bits);
        assert_eq!(bursts[0].1.slot_number, 0);
        assert_eq!(bursts[3].1.slot_number, 3);
        assert_eq!(bursts[4].1.slot_number, 0);
        assert_eq!(bursts[4].1.frame_number, 1);
    }
}
