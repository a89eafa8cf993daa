//! Error types for pdfsplit.

use std::io;
use thiserror::Error;

/// Result type alias for pdfsplit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while extracting and segmenting a PDF.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// A required PDF object is missing.
    #[error("Missing required object: {0}")]
    MissingObject(String),

    /// Page index is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Invalid page range specification.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// A metadata date does not follow the `D:YYYYMMDDHHmmSS` layout.
    #[error("Malformed PDF date {raw:?}: {reason}")]
    MalformedDate {
        /// The raw date string as found in the information dictionary
        raw: String,
        /// What was wrong with it
        reason: String,
    },

    /// An embedded image could not be decoded or written.
    #[error("Image decode error: {0}")]
    ImageDecode(String),

    /// The image storage directory could not be created.
    #[error("Image storage unavailable at {path}: {source}")]
    ImageStore {
        /// Directory that could not be created
        path: std::path::PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },

    /// A markup node other than a heading or paragraph.
    #[error("Unsupported markup node: {0}")]
    UnsupportedNode(String),

    /// A detected table could not be serialized to text.
    #[error("Table serialization error: {0}")]
    TableSerialize(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the error may be recovered from by skipping the offending
    /// input when running in lenient mode.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::PdfParse(_)
                | Error::MissingObject(_)
                | Error::MalformedDate { .. }
                | Error::ImageDecode(_)
                | Error::UnsupportedNode(_)
                | Error::TableSerialize(_)
        )
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::TableSerialize(err.to_string())
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::ImageDecode(err.to_string())
    }
}
