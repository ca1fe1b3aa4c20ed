use crate::aggregate::StationTable;
use crate::error::{ReportError, Result};
use crate::parse::fnv::{fnv_step, FNV_OFFSET_BASIS};
use crate::parse::parser::Fringe;
use crate::parse::temperature::decode_temperature;
use crate::parse::Reading;

/// Parses every complete line of one read into `table`.
///
/// `base` is the absolute offset of `block[0]`. When `aligned` is false the
/// block may begin mid-record, so the bytes up to its first newline are left
/// undecided as the fringe head. Bytes after the last newline always form the
/// fringe tail.
pub fn parse_block(
    block: &[u8],
    base: u64,
    aligned: bool,
    table: &mut StationTable,
) -> Result<Fringe> {
    let end = base + block.len() as u64;
    let Some(last) = block.iter().rposition(|&b| b == b'\n') else {
        return Ok(Fringe::Open(base..end));
    };
    let floor = if aligned {
        0
    } else {
        block.iter().position(|&b| b == b'\n').map_or(0, |first| first + 1)
    };

    parse_lines(&block[floor..last + 1], base + floor as u64, table)?;

    Ok(Fringe::Split {
        head: base..base + floor as u64,
        tail: base + last as u64 + 1..end,
    })
}

/// Parses `lines`, which holds only whole newline-terminated records, walking
/// from the last record to the first.
fn parse_lines(lines: &[u8], base: u64, table: &mut StationTable) -> Result<()> {
    let mut end = lines.len();
    while end > 0 {
        let newline = end - 1;
        let malformed = || ReportError::MalformedRecord {
            offset: base + newline as u64,
        };

        let (temperature, semicolon) = decode_temperature(lines, newline).ok_or_else(malformed)?;

        let mut start = semicolon;
        let mut hash = FNV_OFFSET_BASIS;
        while start > 0 && lines[start - 1] != b'\n' {
            start -= 1;
            hash = fnv_step(hash, lines[start]);
        }
        if start == semicolon {
            return Err(malformed());
        }

        table.add(Reading {
            station: &lines[start..semicolon],
            temperature,
            hash,
        })?;
        end = start;
    }
    Ok(())
}
