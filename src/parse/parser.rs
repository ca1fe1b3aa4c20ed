use std::ops::Range;

use tracing::trace;

use crate::aggregate::StationTable;
use crate::error::{ReportError, Result};
use crate::parse::block::parse_block;
use crate::parse::MIN_RECORD_LEN;
use crate::source::ByteSource;

/// Bytes of a parsed window that could not be decided on their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fringe {
    /// The window held no newline at all.
    Open(Range<u64>),
    /// Everything between `head` and `tail` was parsed. `head` runs through
    /// the first newline (empty when the window started on a record boundary)
    /// and `tail` holds whatever followed the last newline.
    Split { head: Range<u64>, tail: Range<u64> },
}

impl Fringe {
    /// The fringe of an empty, aligned window at `offset`.
    pub fn aligned_at(offset: u64) -> Self {
        Fringe::Split {
            head: offset..offset,
            tail: offset..offset,
        }
    }

    /// Bytes after the last newline seen, i.e. an unterminated final line.
    pub fn trailing(&self) -> Range<u64> {
        match self {
            Fringe::Open(range) => range.clone(),
            Fringe::Split { tail, .. } => tail.clone(),
        }
    }
}

/// Reads windows of a [`ByteSource`] in bounded pieces and feeds every record
/// into a [`StationTable`].
pub struct Parser<'a, S: ?Sized> {
    source: &'a S,
    max_read_len: usize,
    buf: Vec<u8>,
    seam: Vec<u8>,
}

impl<'a, S: ByteSource + ?Sized> Parser<'a, S> {
    pub fn new(source: &'a S, max_read_len: usize) -> Self {
        Self {
            source,
            max_read_len: max_read_len.max(MIN_RECORD_LEN),
            buf: Vec::new(),
            seam: Vec::new(),
        }
    }

    /// Parses a chunk that starts on a record boundary. The returned fringe
    /// has an empty head; its tail is non-empty only when `range` ends inside
    /// a record.
    pub fn parse_chunk(&mut self, range: Range<u64>, table: &mut StationTable) -> Result<Fringe> {
        let start = range.start;
        let fringe = self.parse_window(range, true, table)?;
        self.stitch(Fringe::aligned_at(start), fringe, table)
    }

    /// Parses `range`, halving it until every read fits in `max_read_len`.
    ///
    /// Records cut by an internal split are recovered before returning; the
    /// returned fringe covers only the bytes at the outer edges of `range`.
    pub fn parse_window(
        &mut self,
        range: Range<u64>,
        aligned: bool,
        table: &mut StationTable,
    ) -> Result<Fringe> {
        let len = range.end.saturating_sub(range.start);
        if len <= self.max_read_len as u64 {
            let len = len as usize;
            self.buf.resize(len, 0);
            self.source.read_exact_at(&mut self.buf, range.start)?;
            return parse_block(&self.buf, range.start, aligned, table);
        }

        let mid = range.start + len / 2;
        let left = self.parse_window(range.start..mid, aligned, table)?;
        let right = self.parse_window(mid..range.end, false, table)?;
        self.stitch(left, right, table)
    }

    /// Joins the fringes of two adjacent windows, reparsing the seam between
    /// them when both sides saw a newline.
    pub fn stitch(
        &mut self,
        left: Fringe,
        right: Fringe,
        table: &mut StationTable,
    ) -> Result<Fringe> {
        match (left, right) {
            (Fringe::Split { head, tail }, Fringe::Split { head: next, tail: last }) => {
                self.reconcile(tail.start..next.end, table)?;
                Ok(Fringe::Split { head, tail: last })
            }
            (Fringe::Split { head, tail }, Fringe::Open(next)) => Ok(Fringe::Split {
                head,
                tail: tail.start..next.end,
            }),
            (Fringe::Open(prev), Fringe::Split { head, tail }) => Ok(Fringe::Split {
                head: prev.start..head.end,
                tail,
            }),
            (Fringe::Open(prev), Fringe::Open(next)) => Ok(Fringe::Open(prev.start..next.end)),
        }
    }

    /// Reparses the bytes dropped at one split. A non-empty seam always holds
    /// exactly one record.
    pub fn reconcile(&mut self, seam: Range<u64>, table: &mut StationTable) -> Result<()> {
        let len = seam.end.saturating_sub(seam.start);
        if len == 0 {
            return Ok(());
        }
        if len < MIN_RECORD_LEN as u64 {
            return Err(ReportError::ShortSeam {
                offset: seam.start,
                len,
            });
        }
        trace!(start = seam.start, end = seam.end, "reconciling seam");

        self.seam.resize(len as usize, 0);
        self.source.read_exact_at(&mut self.seam, seam.start)?;
        match parse_block(&self.seam, seam.start, true, table)? {
            Fringe::Split { tail, .. } if tail.is_empty() => Ok(()),
            _ => Err(ReportError::MalformedRecord { offset: seam.end }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(input: &[u8], max_read_len: usize) -> (StationTable, Fringe) {
        let mut table = StationTable::new(4);
        let mut parser = Parser::new(input, max_read_len);
        let fringe = parser.parse_chunk(0..input.len() as u64, &mut table).unwrap();
        (table, fringe)
    }

    fn counts(table: &StationTable) -> Vec<(String, i64, u64)> {
        table
            .flatten()
            .into_iter()
            .map(|r| (r.station().into_owned(), r.sum, r.count))
            .collect()
    }

    const INPUT: &[u8] = b"Jerusalem;25.8\nLa Paz;26.1\nDenpasar;16.2\nNew Delhi;20.7\n\
        Mandalay;21.2\nOdesa;17.1\nErbil;28.7\nSan Francisco;18.9\nAthens;21.4\n\
        Bangkok;26.5\nOdesa;-2.0\nLa Paz;1.1\n";

    #[test]
    fn bounded_reads_match_a_single_read() {
        let (whole, fringe) = parse_all(INPUT, INPUT.len());
        let end = INPUT.len() as u64;
        assert_eq!(fringe, Fringe::Split { head: 0..0, tail: end..end });
        assert_eq!(whole.len(), 10);

        for max_read_len in [6, 7, 8, 13, 16, 31, 64, 100] {
            let (split, fringe) = parse_all(INPUT, max_read_len);
            assert_eq!(counts(&split), counts(&whole), "max_read_len {max_read_len}");
            assert_eq!(fringe, Fringe::Split { head: 0..0, tail: end..end });
        }
    }

    #[test]
    fn unterminated_line_is_left_in_the_tail() {
        let input = b"x;4.2\nx;6.9\ny;1.0";
        for max_read_len in [6, 9, 64] {
            let (table, fringe) = parse_all(input, max_read_len);
            assert_eq!(counts(&table), vec![("x".to_string(), 111, 2)]);
            assert_eq!(fringe.trailing(), 12..17);
        }
    }

    #[test]
    fn stitches_open_windows_into_one_seam() {
        let mut table = StationTable::new(1);
        let mut parser = Parser::new(&b"Aix-en-Provence;4.2\n"[..], 64);
        let joined = parser
            .stitch(Fringe::aligned_at(0), Fringe::Open(0..8), &mut table)
            .unwrap();
        let joined = parser
            .stitch(joined, Fringe::Split { head: 8..20, tail: 20..20 }, &mut table)
            .unwrap();

        assert_eq!(joined, Fringe::Split { head: 0..0, tail: 20..20 });
        assert_eq!(counts(&table), vec![("Aix-en-Provence".to_string(), 42, 1)]);
    }

    #[test]
    fn short_seam_is_fatal() {
        let mut table = StationTable::new(1);
        let mut parser = Parser::new(&b"x;4.2\nx;6.9\n"[..], 64);
        let err = parser.reconcile(3..6, &mut table).unwrap_err();
        assert!(matches!(err, ReportError::ShortSeam { offset: 3, len: 3 }));
        assert!(table.is_empty());
    }

    #[test]
    fn seam_without_trailing_newline_is_rejected() {
        let mut table = StationTable::new(1);
        let mut parser = Parser::new(&b"x;4.2\nx;6.9"[..], 64);
        let err = parser.reconcile(6..11, &mut table);
        assert!(matches!(err, Err(ReportError::ShortSeam { .. })));
        let err = parser.reconcile(0..11, &mut table);
        assert!(matches!(err, Err(ReportError::MalformedRecord { offset: 11 })));
    }
}
