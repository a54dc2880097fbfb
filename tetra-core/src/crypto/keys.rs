//! Built-in weak/default key lists used by the crypto trial engine when the
//! key store has no matching entry.

use super::TeaAlgorithm;

/// ~10-15 known weak/default keys per algorithm: all-zeros, all-ones,
/// repeating nibble, and a handful of documented manufacturer defaults.
pub fn default_keys(algorithm: TeaAlgorithm) -> Vec<Vec<u8>> {
    let len = algorithm.key_len();
    let mut keys = vec![
        vec![0x00; len],
        vec![0xFF; len],
        vec![0x11; len],
        vec![0x55; len],
        vec![0xAA; len],
        (0..len as u8).collect::<Vec<u8>>(),
        (0..len as u8).rev().collect::<Vec<u8>>(),
    ];

    // A handful of documented "manufacturer default" style keys, padded or
    // truncated to this algorithm's key length.
    let manufacturer_seeds: [&[u8]; 6] = [
        b"TETRA1234567890",
        b"DEFAULTKEY000001",
        b"1234567890ABCDEF",
        b"ADMIN0000000001",
        b"FACTORYDEFAULT01",
        b"0000000011111111",
    ];
    for seed in manufacturer_seeds {
        keys.push(resize_key(seed, len));
    }

    keys
}

fn resize_key(seed: &[u8], len: usize) -> Vec<u8> {
    let mut key = Vec::with_capacity(len);
    for i in 0..len {
        key.push(seed[i % seed.len()]);
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_keys_all_match_algorithm_length() {
        for algorithm in [TeaAlgorithm::Tea1, TeaAlgorithm::Tea2, TeaAlgorithm::Tea3, TeaAlgorithm::Tea4] {
            for key in default_keys(algorithm) {
                assert_eq!(key.len(), algorithm.key_len());
            }
        }
    }

    #[test]
    fn default_keys_include_all_zero_and_all_one() {
        let keys = default_keys(TeaAlgorithm::Tea1);
        assert!(keys.contains(&vec![0x00; TeaAlgorithm::Tea1.key_len()]));
        assert!(keys.contains(&vec![0xFF; TeaAlgorithm::Tea1.key_len()]));
    }
}
