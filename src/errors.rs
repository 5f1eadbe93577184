use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, OsyError>;

/// Problems found while decoding an OSY blob.  Every one of these is fatal for
/// the file in question; the decoder never hands back a partial database.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("file is too short to hold the {expected}-byte size header")]
    MissingHeader { expected: usize },

    #[error("inflating the payload failed: {0}")]
    Decompress(String),

    #[error("payload inflated to {actual} bytes but the header promised {expected}")]
    SizeMismatch { expected: u32, actual: usize },

    #[error("needed {needed} bytes at offset {offset} but only {available} remain")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("{section} declares {count} records but only {remaining} bytes remain")]
    CountOverrun {
        section: &'static str,
        count: u64,
        remaining: usize,
    },

    #[error("{section} record {record} has {field} = {index}, outside 0..{limit}")]
    IndexOutOfRange {
        section: &'static str,
        record: usize,
        field: &'static str,
        index: i64,
        limit: usize,
    },

    #[error("{section} record at position {position} carries key {found}")]
    KeyMismatch {
        section: &'static str,
        position: usize,
        found: i64,
    },

    #[error("{section} holds a string that is not valid UTF-8 at offset {offset}")]
    InvalidUtf8 { section: &'static str, offset: usize },

    #[error("{remaining} unexpected bytes follow the last section")]
    TrailingBytes { remaining: usize },
}

/// Things the OSY layout cannot represent.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("string of {len} bytes does not fit a u16 length prefix")]
    StringTooLong { len: usize },

    #[error("payload of {len} bytes does not fit the u32 size header")]
    PayloadTooLarge { len: usize },

    #[error("compression failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum OsyError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("failed to load {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("bad producer input at line {line}: {message}")]
    Producer { line: usize, message: String },

    #[error("refusing to write an inconsistent database ({count} violations, first: {first})")]
    Inconsistent { count: usize, first: String },

    #[error("bad configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Usage(String),

    #[error("{0}")]
    Failed(String),
}
