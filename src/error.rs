use thiserror::Error;

/// Every way a report run can fail. None of these are retried.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no newline between byte {start} and byte {end}")]
    NoNewline { start: u64, end: u64 },

    /// A split left behind fewer bytes than the shortest legal record.
    #[error("seam at byte {offset} is {len} bytes, shorter than any record")]
    ShortSeam { offset: u64, len: u64 },

    #[error("malformed record ending at byte {offset}")]
    MalformedRecord { offset: u64 },

    #[error("stations {existing:?} and {incoming:?} share hash {hash:#018x}")]
    HashCollision {
        hash: u64,
        existing: String,
        incoming: String,
    },

    #[error("invalid setting: {0}")]
    InvalidSetting(String),
}

pub type Result<T, E = ReportError> = std::result::Result<T, E>;
