//! Error types for the ecucsheet library.

use crate::extract::ContainerKind;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ecucsheet operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while extracting or writing configuration data.
#[derive(Error, Debug)]
pub enum Error {
    /// The input is not well-formed XML or has no root element.
    #[error("extraction failed: XML parse error at line {line} (byte {position}): {message}")]
    Parse {
        /// 1-based line of the failure
        line: usize,
        /// Byte offset of the failure
        position: u64,
        /// Parser message
        message: String,
    },

    /// A matched container lacks a required descendant element.
    #[error(
        "extraction failed: {kind} #{index} at line {line} (byte {position}) has no {field} element"
    )]
    MissingField {
        /// Category of the offending record
        kind: ContainerKind,
        /// Zero-based index within its category
        index: usize,
        /// Tag name that was not found
        field: &'static str,
        /// 1-based line of the container's start tag
        line: usize,
        /// Byte offset of the container's start tag
        position: u64,
    },

    /// The output destination could not be created or written.
    #[error("writing failed: {}: {message}", .path.display())]
    Write {
        /// Destination path
        path: PathBuf,
        /// Underlying cause
        message: String,
    },

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error reading or writing a ZIP archive.
    #[error("ZIP archive error: {0}")]
    Zip(String),

    /// Error parsing XML content inside a workbook package.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// A required workbook part is missing.
    #[error("Missing component: {0}")]
    MissingComponent(String),

    /// A worksheet name Excel would reject.
    #[error("Invalid sheet name: {0:?}")]
    InvalidSheetName(String),

    /// JSON serialization failed.
    #[error("JSON serialization error: {0}")]
    Json(String),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Zip(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err.to_string())
    }
}
