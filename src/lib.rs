use std::io::Write;
use std::sync::Arc;

use anyhow::Context;

pub mod aggregate;
pub mod config;
pub mod error;
pub mod parse;
pub mod report;
pub mod scheduler;
pub mod source;

pub use aggregate::{Record, StationTable, Tree};
pub use config::Settings;
pub use error::ReportError;
pub use report::OutputFormat;
pub use scheduler::aggregate as aggregate_source;
pub use source::{map_file, ByteSource};

/// Aggregates `source` and writes the sorted per-station summary to `out`.
///
/// Nothing is written unless every chunk parsed cleanly.
pub async fn generate<W, S>(
    out: &mut W,
    source: Arc<S>,
    settings: &Settings,
    format: OutputFormat,
) -> anyhow::Result<()>
where
    W: Write + ?Sized,
    S: ByteSource + ?Sized + 'static,
{
    let table = scheduler::aggregate(source, settings).await?;
    report::write_report(out, &table, format).context("failed to write report")?;
    out.flush().context("failed to flush report")?;
    Ok(())
}
