use std::ops::Range;
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info};

use crate::aggregate::StationTable;
use crate::config::Settings;
use crate::error::{ReportError, Result};
use crate::parse::{Fringe, Parser};
use crate::source::ByteSource;

/// Offset of the last newline inside `window`, reading backwards in blocks of
/// at most `block_len` bytes.
fn find_last_newline<S: ByteSource + ?Sized>(
    source: &S,
    window: Range<u64>,
    block_len: usize,
    buf: &mut Vec<u8>,
) -> Result<Option<u64>> {
    let mut end = window.end;
    while end > window.start {
        let start = end.saturating_sub(block_len as u64).max(window.start);
        buf.resize((end - start) as usize, 0);
        source.read_exact_at(buf, start)?;
        if let Some(i) = buf.iter().rposition(|&b| b == b'\n') {
            return Ok(Some(start + i as u64));
        }
        end = start;
    }
    Ok(None)
}

/// Splits `0..size` into at most `settings.concurrency` contiguous chunks.
///
/// Every chunk except the last ends just after a newline, so each one starts
/// on a record boundary. Concurrency is lowered when chunks would be smaller
/// than `settings.min_chunk_len`.
pub fn plan_chunks<S: ByteSource + ?Sized>(
    source: &S,
    size: u64,
    settings: &Settings,
) -> Result<Vec<Range<u64>>> {
    if size == 0 {
        return Ok(Vec::new());
    }
    let requested = settings.concurrency.max(1) as u64;
    let concurrency = requested.min((size / settings.min_chunk_len.max(1)).max(1));
    if concurrency < requested {
        debug!(requested, concurrency, size, "input too small, reducing concurrency");
    }
    let chunk_len = size / concurrency;

    let mut buf = Vec::new();
    let mut chunks = Vec::with_capacity(concurrency as usize);
    let mut start = 0;
    for i in 1..concurrency {
        let tentative = i * chunk_len;
        let window = start..tentative;
        let newline = find_last_newline(source, window, settings.max_read_len, &mut buf)?
            .ok_or(ReportError::NoNewline {
                start,
                end: tentative,
            })?;
        chunks.push(start..newline + 1);
        start = newline + 1;
    }
    chunks.push(start..size);
    debug!(?chunks, "planned chunks");
    Ok(chunks)
}

/// Parses every chunk on its own blocking thread, waits for all of them, then
/// merges their tables and reconciles the seams between neighbouring chunks.
pub async fn aggregate<S>(source: Arc<S>, settings: &Settings) -> anyhow::Result<StationTable>
where
    S: ByteSource + ?Sized + 'static,
{
    settings.validate()?;
    let size = source.size().context("failed to measure input")?;
    let chunks = plan_chunks(&*source, size, settings).context("failed to align chunks")?;
    info!(size, chunks = chunks.len(), "aggregating measurements");

    let mut handles = Vec::with_capacity(chunks.len());
    for (index, range) in chunks.into_iter().enumerate() {
        let source = Arc::clone(&source);
        let settings = settings.clone();
        handles.push(tokio::task::spawn_blocking(move || -> Result<(StationTable, Fringe)> {
            let mut table = StationTable::new(settings.buckets);
            let mut parser = Parser::new(&*source, settings.max_read_len);
            let fringe = parser.parse_chunk(range.clone(), &mut table)?;
            debug!(
                index,
                start = range.start,
                end = range.end,
                stations = table.len(),
                "chunk parsed"
            );
            Ok((table, fringe))
        }));
    }

    let mut parts = Vec::with_capacity(handles.len());
    for handle in handles {
        parts.push(handle.await.context("worker task failed")??);
    }

    let mut merged = StationTable::new(settings.buckets);
    let mut parser = Parser::new(&*source, settings.max_read_len);
    let mut fringe = Fringe::aligned_at(0);
    for (table, chunk_fringe) in parts {
        merged.merge(table)?;
        fringe = parser.stitch(fringe, chunk_fringe, &mut merged)?;
    }

    let trailing = fringe.trailing();
    if !trailing.is_empty() {
        debug!(
            start = trailing.start,
            end = trailing.end,
            "dropping unterminated final line"
        );
    }
    info!(stations = merged.len(), "aggregation finished");
    Ok(merged)
}
