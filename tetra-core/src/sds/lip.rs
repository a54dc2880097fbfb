//! LIP (Location Information Protocol) payload parsing for SDS Location
//! messages.

use crate::utils::BitReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixKind {
    Short,
    Long,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LipFix {
    pub latitude: f64,
    pub longitude: f64,
    pub fix_kind: FixKind,
}

/// Decode a LIP payload: first two bits select report kind (`00` Short, `01`
/// Long), followed by a 2-bit time-elapsed field before the lat/lon fields
/// begin; anything else is unsupported.
///
/// Payloads that carry raw NMEA text (`$GPGGA`/`$GPRMC`) are the caller's
/// responsibility to detect before calling this — see `looks_like_nmea`.
pub fn decode(payload: &[u8]) -> Option<LipFix> {
    let bits = crate::utils::unpack_bits(payload);
    let mut reader = BitReader::new(&bits);
    let kind = reader.read_u(2)?;
    reader.read_u(2)?; // time elapsed, unused

    match kind {
        0b00 => {
            let lat_raw = reader.read_i(24)?;
            let lon_raw = reader.read_i(25)?;
            Some(LipFix {
                latitude: lat_raw as f64 * (90.0 / (1i64 << 23) as f64),
                longitude: lon_raw as f64 * (180.0 / (1i64 << 24) as f64),
                fix_kind: FixKind::Short,
            })
        }
        0b01 => {
            let lat_raw = reader.read_i(25)?;
            let lon_raw = reader.read_i(26)?;
            Some(LipFix {
                latitude: lat_raw as f64 * 90.0 * 2f64.powi(-24),
                longitude: lon_raw as f64 * 180.0 * 2f64.powi(-25),
                fix_kind: FixKind::Long,
            })
        }
        _ => None,
    }
}

/// Whether a payload carries raw NMEA sentences rather than a binary LIP
/// report.
pub fn looks_like_nmea(payload: &[u8]) -> bool {
    let text = String::from_utf8_lossy(payload);
    text.contains("$GPGGA") || text.contains("$GPRMC")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_short_report_zero_position() {
        let bits = vec![0u8; 2 + 2 + 24 + 25];
        let payload = crate::utils::pack_bits(&bits);
        let fix = decode(&payload).unwrap();
        assert_eq!(fix.fix_kind, FixKind::Short);
        assert!(fix.latitude.abs() < 1e-9);
        assert!(fix.longitude.abs() < 1e-9);
    }

    #[test]
    fn decodes_long_report_kind_tag() {
        let mut bits = vec![0u8; 2 + 2 + 25 + 26];
        bits[1] = 1; // kind = 0b01
        let payload = crate::utils::pack_bits(&bits);
        let fix = decode(&payload).unwrap();
        assert_eq!(fix.fix_kind, FixKind::Long);
    }

    #[test]
    fn unsupported_kind_returns_none() {
        let mut bits = vec![0u8; 4];
        bits[0] = 1;
        bits[1] = 1; // kind = 0b11
        let payload = crate::utils::pack_bits(&bits);
        assert!(decode(&payload).is_none());
    }

    #[test]
    fn detects_embedded_nmea_sentence() {
        assert!(looks_like_nmea(b"$GPGGA,123456,..."));
        assert!(!looks_like_nmea(b"not nmea"));
    }
}
