use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;

use super::TemplateId;

/// One step of a node's location in the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    /// Element local name
    pub name: String,
    /// Resolved namespace URI of the element
    pub namespace: Option<String>,
    /// 1-based position among same-named siblings
    pub position: usize,
    /// Number of same-named siblings (including this element)
    pub siblings: usize,
}

impl PathSegment {
    fn write_xpath(&self, out: &mut String) {
        out.push_str("/*[local-name()='");
        out.push_str(&self.name);
        out.push('\'');
        if let Some(ns) = &self.namespace {
            out.push_str(" and namespace-uri()='");
            out.push_str(ns);
            out.push('\'');
        }
        out.push(']');
        if self.siblings > 1 {
            out.push_str(&format!("[{}]", self.position));
        }
    }
}

/// A node of the intermediate tree built by the decoders and read by the encoders.
///
/// Nodes are passive carriers: a template identity, string fields, ordered
/// children, and enough location data to point an error back at the XML.
#[derive(Debug, Clone)]
pub struct Node {
    template: TemplateId,
    children: Vec<Node>,
    values: HashMap<String, String>,
    default_ns_uri: Option<String>,
    source_path: Option<String>,
    line: i32,
    column: i32,
    path_segments: Vec<PathSegment>,
    path: OnceCell<String>,
}

impl Node {
    /// Line/column value meaning "location unknown".
    pub const DEFAULT_LOCATION_NUMBER: i32 = -1;

    /// Create an empty node of the given template.
    pub fn new(template: TemplateId) -> Self {
        Self {
            template,
            children: Vec::new(),
            values: HashMap::new(),
            default_ns_uri: None,
            source_path: None,
            line: Self::DEFAULT_LOCATION_NUMBER,
            column: Self::DEFAULT_LOCATION_NUMBER,
            path_segments: Vec::new(),
            path: OnceCell::new(),
        }
    }

    /// Template identity
    pub fn template(&self) -> TemplateId {
        self.template
    }

    /// Replace the template identity
    pub fn set_template(&mut self, template: TemplateId) {
        self.template = template;
    }

    /// Field value by name
    pub fn get_value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Set a field value, replacing any previous one
    pub fn put_value(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Remove a field, returning its value
    pub fn remove_value(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }

    /// True if the field is present
    pub fn has_value(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Field names, sorted for stable output.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Children in document order
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Append a child
    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Append several children, preserving their order
    pub fn add_children(&mut self, children: impl IntoIterator<Item = Node>) {
        self.children.extend(children);
    }

    /// Direct children of the given template
    pub fn child_nodes(&self, template: TemplateId) -> impl Iterator<Item = &Node> {
        self.children.iter().filter(move |c| c.template == template)
    }

    /// Depth-first search (excluding `self`) for the first node of the given template
    pub fn find_first_node(&self, template: TemplateId) -> Option<&Node> {
        for child in &self.children {
            if child.template == template {
                return Some(child);
            }
            if let Some(found) = child.find_first_node(template) {
                return Some(found);
            }
        }
        None
    }

    /// All nodes of the given template, depth-first, including `self`
    pub fn find_nodes(&self, template: TemplateId) -> Vec<&Node> {
        let mut found = Vec::new();
        self.collect_nodes(template, &mut found);
        found
    }

    fn collect_nodes<'a>(&'a self, template: TemplateId, found: &mut Vec<&'a Node>) {
        if self.template == template {
            found.push(self);
        }
        for child in &self.children {
            child.collect_nodes(template, found);
        }
    }

    /// Default namespace in scope where the node's element was declared
    pub fn default_ns_uri(&self) -> Option<&str> {
        self.default_ns_uri.as_deref()
    }

    /// Set the default namespace
    pub fn set_default_ns_uri(&mut self, uri: Option<String>) {
        self.default_ns_uri = uri;
    }

    /// Identifier of the document this node was decoded from
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    /// Set the originating document identifier
    pub fn set_source_path(&mut self, source: impl Into<String>) {
        self.source_path = Some(source.into());
    }

    /// 1-based line, or [`Node::DEFAULT_LOCATION_NUMBER`]
    pub fn line(&self) -> i32 {
        self.line
    }

    /// 1-based column, or [`Node::DEFAULT_LOCATION_NUMBER`]
    pub fn column(&self) -> i32 {
        self.column
    }

    /// Set the source line
    pub fn set_line(&mut self, line: i32) {
        self.line = line;
    }

    /// Set the source column
    pub fn set_column(&mut self, column: i32) {
        self.column = column;
    }

    /// Record where the node's element sits in the document. Invalidates a cached path.
    pub fn set_path_segments(&mut self, segments: Vec<PathSegment>) {
        self.path_segments = segments;
        self.path = OnceCell::new();
    }

    /// Override the computed path.
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = OnceCell::new();
        let _ = self.path.set(path.into());
    }

    /// XPath of the node's element, computed on first use and cached.
    pub fn get_or_compute_path(&self) -> &str {
        self.path.get_or_init(|| {
            let mut out = String::new();
            for segment in &self.path_segments {
                segment.write_xpath(&mut out);
            }
            out
        })
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        write!(f, "{}{}", indent, self.template)?;
        if self.line != Self::DEFAULT_LOCATION_NUMBER {
            write!(f, " @{}:{}", self.line, self.column)?;
        }
        writeln!(f)?;
        for key in self.keys() {
            writeln!(f, "{}  - {} = {:?}", indent, key, self.values[key])?;
        }
        for child in &self.children {
            child.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}
