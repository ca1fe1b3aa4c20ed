use crate::error::{ReportError, Result};
use crate::parse::MIN_RECORD_LEN;

pub const DEFAULT_MAX_READ_LEN: usize = 1 << 20;
pub const DEFAULT_BUCKETS: usize = 2 << 10;
pub const DEFAULT_MIN_CHUNK_LEN: u64 = 64 << 10;

/// Tunables for one report run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Number of chunks, and therefore parallel workers.
    pub concurrency: usize,
    /// Largest single read; wider windows are halved until they fit.
    pub max_read_len: usize,
    /// Trees per station table.
    pub buckets: usize,
    /// Chunks smaller than this lower the effective concurrency.
    pub min_chunk_len: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            concurrency: 1,
            max_read_len: DEFAULT_MAX_READ_LEN,
            buckets: DEFAULT_BUCKETS,
            min_chunk_len: DEFAULT_MIN_CHUNK_LEN,
        }
    }
}

impl Settings {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_max_read_len(mut self, max_read_len: usize) -> Self {
        self.max_read_len = max_read_len;
        self
    }

    pub fn with_buckets(mut self, buckets: usize) -> Self {
        self.buckets = buckets;
        self
    }

    pub fn with_min_chunk_len(mut self, min_chunk_len: u64) -> Self {
        self.min_chunk_len = min_chunk_len;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(ReportError::InvalidSetting("concurrency must be positive".into()));
        }
        if self.buckets == 0 {
            return Err(ReportError::InvalidSetting("buckets must be positive".into()));
        }
        if self.min_chunk_len == 0 {
            return Err(ReportError::InvalidSetting("min_chunk_len must be positive".into()));
        }
        if self.max_read_len < MIN_RECORD_LEN {
            return Err(ReportError::InvalidSetting(format!(
                "max_read_len must be at least {MIN_RECORD_LEN} bytes, got {}",
                self.max_read_len
            )));
        }
        Ok(())
    }
}
