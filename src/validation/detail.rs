use std::fmt;

use serde::Serialize;

use crate::encode::EncodeError;
use crate::model::Node;

/// How serious a [`Detail`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The submission is invalid
    Error,
    /// Suspicious but accepted
    Warning,
}

/// One problem found while converting, located in the source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Detail {
    /// What is wrong
    pub message: String,
    /// The offending raw value, for field-level problems
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Template name of the node the problem was found on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// XPath of the source element
    pub path: String,
    /// 1-based source line, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<i32>,
    /// 1-based source column, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<i32>,
    /// Error or warning
    #[serde(skip)]
    pub severity: Severity,
}

impl Detail {
    /// A detail without a location.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            value: None,
            template: None,
            path: String::new(),
            line: None,
            column: None,
            severity: Severity::Error,
        }
    }

    /// An error located at `node`.
    pub fn for_node(node: &Node, message: impl Into<String>) -> Self {
        let known = |n: i32| (n != Node::DEFAULT_LOCATION_NUMBER).then_some(n);
        Self {
            template: Some(node.template().name().to_string()),
            path: node.get_or_compute_path().to_string(),
            line: known(node.line()),
            column: known(node.column()),
            ..Self::new(message)
        }
    }

    /// An error raised by a field put while encoding `node`.
    pub fn from_encode_error(node: &Node, err: &EncodeError) -> Self {
        let mut detail = Self::for_node(node, err.message());
        detail.value = err.value().map(str::to_string);
        detail
    }

    /// Attach the offending value
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Downgrade to a warning
    pub fn warning(mut self) -> Self {
        self.severity = Severity::Warning;
        self
    }

    /// True for [`Severity::Error`]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Detail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(value) = &self.value {
            write!(f, " (value: {:?})", value)?;
        }
        match (self.line, self.column) {
            (Some(line), Some(column)) => write!(f, " at line {}, column {}", line, column),
            (Some(line), None) => write!(f, " at line {}", line),
            _ if !self.path.is_empty() => write!(f, " at {}", self.path),
            _ => Ok(()),
        }
    }
}
