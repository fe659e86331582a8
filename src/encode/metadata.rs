use serde::{Deserialize, Serialize};

use crate::model::Node;

/// Where a piece of JSON output came from.
///
/// Records travel inside the output under [`super::METADATA_HOLDER`] so that a
/// problem found in the JSON can be traced back to the template, XPath and
/// line/column of the originating XML element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Field or encode step that produced the record
    pub encode_label: String,
    /// Default namespace of the source element
    pub nsuri: String,
    /// Template name of the source node
    pub template: String,
    /// XPath of the source element
    pub path: String,
    /// 1-based source line, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<i32>,
    /// 1-based source column, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<i32>,
}

impl Metadata {
    /// Record describing `node`, tagged with `encode_label`.
    pub fn for_node(node: &Node, encode_label: impl Into<String>) -> Self {
        let known = |n: i32| (n != Node::DEFAULT_LOCATION_NUMBER).then_some(n);
        Self {
            encode_label: encode_label.into(),
            nsuri: node.default_ns_uri().unwrap_or_default().to_string(),
            template: node.template().name().to_string(),
            path: node.get_or_compute_path().to_string(),
            line: known(node.line()),
            column: known(node.column()),
        }
    }
}
