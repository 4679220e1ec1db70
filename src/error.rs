//! Error types for biblion operations.

use thiserror::Error;

/// Errors that can occur while reading a scripture package.
///
/// Only structural package failures are surfaced as errors. An unmapped
/// book, an out-of-range chapter, or a missing content resource is an
/// expected absence and is reported as `Ok(None)` by the loader instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid package: {0}")]
    InvalidPackage(String),

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, Error>;
