//! Hard conversion failures.

use crate::encode::EncodeError;
use crate::model::TemplateId;

/// Failures that abort a conversion.
///
/// Field-level problems (a count that is not a number, a missing measure id) never
/// show up here; they are collected as [`crate::validation::Detail`]s instead.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// The document is not well-formed XML
    #[error("XML parse error: {0}")]
    XmlError(#[from] quick_xml::Error),

    /// Element or attribute text is not valid UTF-8
    #[error("UTF-8 error: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),

    /// I/O error reading the source
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Structurally unusable document (empty, no root element, unbalanced tags)
    #[error("Malformed document {source_name}: {message}")]
    Malformed {
        /// Source identifier
        source_name: String,
        /// What went wrong
        message: String,
    },

    /// The root element does not decode to a QRDA Category III clinical document
    #[error("{source_name} is not a QRDA Category III document (decoded root: {found})")]
    NotQrdaDocument {
        /// Source identifier
        source_name: String,
        /// Template the root decoded to
        found: TemplateId,
    },

    /// An element carries template ids of which none is in the catalog
    #[error("Unknown template {root}{} at line {line}, column {column} ({path})", describe_extension(.extension))]
    UnknownTemplate {
        /// templateId root
        root: String,
        /// templateId extension
        extension: Option<String>,
        /// 1-based line of the element
        line: i32,
        /// 1-based column of the element
        column: i32,
        /// XPath of the element
        path: String,
    },

    /// A catalog template without a registered decoder
    #[error("No decoder registered for template {0}")]
    MissingDecoder(TemplateId),

    /// A decoded node without a registered encoder
    #[error("No encoder registered for template {0}")]
    MissingEncoder(TemplateId),

    /// Hard failure while building JSON output
    #[error("Encode error: {0}")]
    EncodeError(#[from] EncodeError),
}

fn describe_extension(extension: &Option<String>) -> String {
    match extension {
        Some(ext) => format!(" extension {}", ext),
        None => String::new(),
    }
}

/// Result alias for conversion operations
pub type Result<T> = std::result::Result<T, ConversionError>;
