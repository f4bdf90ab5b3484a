//! Custom error types for the avtrdb-reader crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
///
/// Every variant except `Io` and `Json` is fatal to the decode of a single
/// feed file: the file is rejected as a whole and no partial records escape.
#[derive(Debug, Error)]
pub enum AvtrdbError {
    /// An error originating from I/O operations.
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// A read ran past the end of the buffer.
    #[error("Out of data at offset {offset}: requested {requested} bytes, {remaining} remaining")]
    OutOfData {
        offset: usize,
        requested: usize,
        remaining: usize,
    },

    /// The container does not start with the `PAS` signature.
    #[error("Bad magic: expected \"PAS\", found {found:02x?}")]
    BadMagic { found: [u8; 3] },

    /// The trailing text block of a container could not be split into tables.
    #[error("Malformed string block: {0}")]
    MalformedStringBlock(String),

    /// A record points past the end of the author table.
    #[error("Author index {index} of record {record} is out of range for {table_len} authors")]
    AuthorIndexOutOfRange {
        record: usize,
        index: usize,
        table_len: usize,
    },

    /// A legacy feed token is too short or uses a symbol outside the cipher alphabet.
    #[error("Invalid legacy token {token:?}: {reason}")]
    InvalidToken { token: String, reason: &'static str },

    /// Text data that should be UTF-8 is not.
    #[error("Invalid UTF-8 text: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// A string does not have the `avtr_` + hyphenated UUID shape.
    #[error("Invalid avatar id: {0:?}")]
    InvalidAvatarId(String),

    /// A date string is not in `YYYY-MM-DD` form.
    #[error("Invalid date: {0:?}")]
    InvalidDate(String),

    /// A persisted snapshot lists the same avatar twice.
    #[error("Duplicate avatar id in snapshot: {0}")]
    DuplicateAvatarId(String),

    /// A snapshot could not be serialized or deserialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A convenience `Result` type alias using the crate's `AvtrdbError` type.
pub type Result<T> = std::result::Result<T, AvtrdbError>;
