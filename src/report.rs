use std::fmt;
use std::io::{self, Write};

use serde::Serialize;

use crate::aggregate::{Record, StationTable};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// `{Name=min/mean/max, ...}`
    #[default]
    Text,
    /// A JSON array with one object per station.
    Json,
}

/// Tenths of a degree, displayed with exactly one fractional digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tenths(pub i64);

impl fmt::Display for Tenths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{}", abs / 10, abs % 10)
    }
}

#[derive(Debug, Serialize)]
struct Summary<'a> {
    station: &'a str,
    min: f64,
    mean: f64,
    max: f64,
    count: u64,
}

fn tenths_to_f64(tenths: i64) -> f64 {
    tenths as f64 / 10.0
}

/// Writes `{Name=min/mean/max, ...}` one record at a time; the first failed
/// write ends the report.
pub fn write_text<W: Write + ?Sized>(out: &mut W, records: &[&Record]) -> io::Result<()> {
    out.write_all(b"{")?;
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            out.write_all(b", ")?;
        }
        out.write_all(&record.name)?;
        write!(
            out,
            "={}/{}/{}",
            Tenths(record.min.into()),
            Tenths(record.mean_tenths()),
            Tenths(record.max.into())
        )?;
    }
    out.write_all(b"}")
}

/// Writes the same summary as a JSON array, streamed record by record.
pub fn write_json<W: Write + ?Sized>(out: &mut W, records: &[&Record]) -> io::Result<()> {
    out.write_all(b"[")?;
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            out.write_all(b",")?;
        }
        let station = record.station();
        let summary = Summary {
            station: &station,
            min: tenths_to_f64(record.min.into()),
            mean: tenths_to_f64(record.mean_tenths()),
            max: tenths_to_f64(record.max.into()),
            count: record.count,
        };
        serde_json::to_writer(&mut *out, &summary)?;
    }
    out.write_all(b"]")
}

pub fn write_report<W: Write + ?Sized>(
    out: &mut W,
    table: &StationTable,
    format: OutputFormat,
) -> io::Result<()> {
    let records = table.flatten();
    match format {
        OutputFormat::Text => write_text(out, &records),
        OutputFormat::Json => write_json(out, &records),
    }
}
