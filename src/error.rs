//! Error types for folio operations.

use thiserror::Error;

/// Errors that can occur while parsing an EPUB into a reading flow.
///
/// Context strings carry the offending archive path so a failure can be
/// reported as "which stage, which file".
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a valid archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("missing container descriptor: {0}")]
    MissingContainer(String),

    #[error("package document not found: {0}")]
    MissingPackage(String),

    #[error("malformed package document: {0}")]
    MalformedPackage(String),

    #[error("no navigation document: {0}")]
    MissingNavigation(String),

    #[error("malformed navigation document: {0}")]
    MalformedNavigation(String),

    #[error("entry not found in archive: {0}")]
    EntryNotFound(String),

    #[error("failed to read archive entry: {0}")]
    EntryRead(String),

    #[error("malformed markup: {0}")]
    MalformedMarkup(String),

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, Error>;
