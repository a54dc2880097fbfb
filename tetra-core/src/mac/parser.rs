//! MAC PDU Parser (C5): stateful header parsing, per-type field extraction,
//! and fragment reassembly.

use crate::utils::BitReader;

use super::fragment::FragmentBuffer;
use super::metadata::{from_broadcast, from_resource, from_usignal, CallMetadata};
use super::pdu::{infer_encryption, EncryptionMode, MacPdu, PduType};

/// Owns the fragment buffer and Broadcast-derived persistent state (MCC/MNC)
/// for one logical channel.
pub struct MacParser {
    fragments: FragmentBuffer,
    last_broadcast: Option<CallMetadata>,
}

impl Default for MacParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MacParser {
    pub fn new() -> Self {
        Self {
            fragments: FragmentBuffer::new(),
            last_broadcast: None,
        }
    }

    pub fn last_broadcast(&self) -> Option<&CallMetadata> {
        self.last_broadcast.as_ref()
    }

    /// Parse one burst's data bits into a `MacPdu`. Returns `None` for inputs
    /// shorter than 8 bits.
    pub fn parse(&mut self, bits: &[u8]) -> Option<MacPdu> {
        if bits.len() < 8 {
            return None;
        }

        let mut reader = BitReader::new(bits);
        let pdu_type = PduType::from_bits(reader.read_u(3)? as u8);
        let fill_bits = reader.read_u(1)? as u8;

        let mut pdu = match pdu_type {
            PduType::Resource => self.parse_resource(&mut reader, fill_bits),
            PduType::Frag => self.parse_frag(&mut reader, fill_bits),
            PduType::End => self.parse_end(&mut reader, fill_bits),
            PduType::Broadcast => self.parse_broadcast(&mut reader, fill_bits),
            PduType::Suppl | PduType::USignal | PduType::Data | PduType::UBlk => {
                self.parse_generic(pdu_type, &mut reader, fill_bits)
            }
        }?;

        if !pdu.encrypted {
            if let Some(algorithm) = infer_encryption(&pdu.payload) {
                pdu.encrypted = true;
                pdu.encryption_mode = EncryptionMode::Class2;
                pdu.encryption_algorithm = Some(algorithm);
            }
        }

        Some(pdu)
    }

    fn parse_resource(&mut self, reader: &mut BitReader, fill_bits: u8) -> Option<MacPdu> {
        let encrypted = reader.read_u(1)? != 0;
        let address = reader.read_u(24)? as u32;
        let length = reader.read_u(6)? as u8;
        let payload = read_payload(reader, length as usize);

        self.fragments.start(address, encrypted, &payload);

        let mut pdu = MacPdu::new(PduType::Resource, fill_bits);
        pdu.encrypted = encrypted;
        pdu.encryption_mode = if encrypted { EncryptionMode::Class2 } else { EncryptionMode::Clear };
        pdu.address = Some(address);
        pdu.length = length;
        pdu.payload = payload;
        Some(pdu)
    }

    fn parse_frag(&mut self, reader: &mut BitReader, fill_bits: u8) -> Option<MacPdu> {
        let payload = reader.read_remaining_bits();
        let payload_bytes = crate::utils::pack_bits(&payload);
        self.fragments.append(&payload_bytes);

        let (address, encrypted) = match self.fragments.state() {
            super::fragment::FragmentState::Collecting { address, encrypted, .. } => (Some(*address), *encrypted),
            _ => (None, false),
        };

        let mut pdu = MacPdu::new(PduType::Frag, fill_bits);
        pdu.encrypted = encrypted;
        pdu.encryption_mode = if encrypted { EncryptionMode::Class2 } else { EncryptionMode::Clear };
        pdu.address = address;
        pdu.payload = payload_bytes;
        Some(pdu)
    }

    fn parse_end(&mut self, reader: &mut BitReader, fill_bits: u8) -> Option<MacPdu> {
        let length = reader.read_u(6)? as u8;
        let payload = read_payload(reader, length as usize);

        let finished = self.fragments.finish(&payload);

        let mut pdu = MacPdu::new(PduType::End, fill_bits);
        pdu.length = length;
        pdu.payload = payload;

        if let Some((address, original_encrypted, reassembled)) = finished {
            pdu.address = Some(address);
            // If the End PDU claims clear but the originating Resource said
            // encrypted, trust the original per §4.4.
            pdu.encrypted = original_encrypted;
            pdu.encryption_mode = if original_encrypted { EncryptionMode::Class2 } else { EncryptionMode::Clear };
            pdu.reassembled = Some(reassembled);
        }

        Some(pdu)
    }

    fn parse_broadcast(&mut self, reader: &mut BitReader, fill_bits: u8) -> Option<MacPdu> {
        let payload = reader.read_remaining_bits();
        let payload_bytes = crate::utils::pack_bits(&payload);

        if let Some(metadata) = from_broadcast(&payload_bytes) {
            self.last_broadcast = Some(metadata);
        }

        let mut pdu = MacPdu::new(PduType::Broadcast, fill_bits);
        pdu.payload = payload_bytes;
        Some(pdu)
    }

    fn parse_generic(&mut self, pdu_type: PduType, reader: &mut BitReader, fill_bits: u8) -> Option<MacPdu> {
        let encrypted = reader.read_u(1)? != 0;
        let address = reader.read_u(24)? as u32;
        let length = reader.read_u(6)? as u8;
        let payload = read_payload(reader, length as usize);

        let mut pdu = MacPdu::new(pdu_type, fill_bits);
        pdu.encrypted = encrypted;
        pdu.encryption_mode = if encrypted { EncryptionMode::Class2 } else { EncryptionMode::Clear };
        pdu.address = Some(address);
        pdu.length = length;
        pdu.payload = payload;
        Some(pdu)
    }
}

/// Read up to `length` bytes of payload, packing whatever bits remain if the
/// declared length runs past the end of the burst.
fn read_payload(reader: &mut BitReader, length: usize) -> Vec<u8> {
    let available_bits = reader.remaining();
    let requested_bits = length * 8;
    let take_bits = requested_bits.min(available_bits);
    let bits = if take_bits == available_bits {
        reader.read_remaining_bits()
    } else {
        let mut taken = Vec::with_capacity(take_bits);
        for _ in 0..take_bits {
            taken.push(reader.read_u(1).unwrap_or(0) as u8);
        }
        taken
    };
    crate::utils::pack_bits(&bits)
}

/// Also exposed for callers that just extract call metadata from an already
/// parsed Resource/USignal PDU.
pub fn call_metadata_for(pdu: &MacPdu) -> Option<CallMetadata> {
    match pdu.pdu_type {
        PduType::Resource => from_resource(&pdu.payload),
        PduType::USignal => from_usignal(&pdu.payload),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::unpack_bits;

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
    fn short_input_returns_none() {
        let mut parser = MacParser::new();
        assert!(parser.parse(&[1, 0, 1]).is_none());
    }

    #[test]
    fn resource_seeds_fragment_buffer() {
        let mut parser = MacParser::new();
        let bits = resource_bits(0x456789, 5, b"hello");
        let pdu = parser.parse(&bits).unwrap();
        assert_eq!(pdu.address, Some(0x456789));
        assert_eq!(pdu.payload, b"hello");
        assert!(parser.fragments.is_collecting());
    }

    #[test]
    fn full_reassembly_happy_path() {
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
        let pdu = parser.parse(&end_bits).unwrap();

        let reassembled = pdu.reassembled.unwrap();
        assert_eq!(
            String::from_utf8(reassembled).unwrap(),
            "EMERGENCY: Unit 5 responding to incident at Main Street. ETA 5 minutes."
        );
    }

    #[test]
    fn high_entropy_clear_pdu_promoted_to_encrypted() {
        let mut parser = MacParser::new();
        let payload: Vec<u8> = (0..16u8).collect(); // 16 unique bytes
        let bits = resource_bits(0x1, payload.len() as u8, &payload);
        let pdu = parser.parse(&bits).unwrap();
        assert!(pdu.encrypted);
        assert_eq!(pdu.encryption_algorithm, Some("TEA1"));
    }
}
