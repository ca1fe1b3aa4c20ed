// 64-bit FNV-1a over station names.
//
// The parser walks each line from the newline back towards its start, so it
// feeds a name to the hash last byte first. Every other caller must do the
// same: FNV-1a is order-sensitive and a forward hash of the same name differs.

pub const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
pub const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

#[inline]
pub const fn fnv_step(hash: u64, byte: u8) -> u64 {
    (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
}

/// Hash of a station name, fed from its last byte to its first.
pub fn station_hash(name: &[u8]) -> u64 {
    name.iter()
        .rev()
        .fold(FNV_OFFSET_BASIS, |hash, &byte| fnv_step(hash, byte))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forward(name: &[u8]) -> u64 {
        name.iter().fold(FNV_OFFSET_BASIS, |hash, &byte| fnv_step(hash, byte))
    }

    #[test]
    fn matches_reference_vectors() {
        assert_eq!(forward(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(forward(b"a"), 0xaf63_dc4c_8601_ec8c);
        assert_eq!(forward(b"foobar"), 0x8594_4171_f739_67e8);
    }

    #[test]
    fn station_hash_runs_backwards() {
        assert_eq!(station_hash(b"a"), forward(b"a"));
        assert_eq!(station_hash(b"raboof"), forward(b"foobar"));
        assert_ne!(station_hash(b"foobar"), forward(b"foobar"));
    }
}
