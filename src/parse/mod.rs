pub mod block;
pub mod fnv;
pub mod parser;
pub mod temperature;

pub use block::parse_block;
pub use fnv::station_hash;
pub use parser::{Fringe, Parser};
pub use temperature::decode_temperature;

/// Length of the shortest legal record, `"A;0.0\n"`.
pub const MIN_RECORD_LEN: usize = 6;

/// One decoded `station;temperature` line, borrowed from the read buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading<'a> {
    pub station: &'a [u8],
    /// Tenths of a degree.
    pub temperature: i16,
    /// [`station_hash`] of `station`.
    pub hash: u64,
}

#[cfg(test)]
impl<'a> Reading<'a> {
    pub(crate) fn new(station: &'a [u8], temperature: i16) -> Self {
        Self {
            station,
            temperature,
            hash: station_hash(station),
        }
    }
}
