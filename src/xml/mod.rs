//! # QRDA XML Reader
//!
//! Builds an owned element tree from a [`Source`] with quick-xml. The decoders need
//! random access to an element's subtree (a clinical document reads its TIN four
//! levels down), so the document is materialised once instead of streamed.
//!
//! Every element remembers its 1-based line and column and its position among
//! same-named siblings, which is all the decode engine needs to give each
//! [`crate::model::Node`] a location.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::PrefixDeclaration;
use quick_xml::{Decoder, Reader};

use crate::error::{ConversionError, Result};
use crate::model::PathSegment;
use crate::source::Source;

/// Local name of the elements that carry template identity.
pub const TEMPLATE_ID_ELEMENT: &str = "templateId";

/// Deepest element nesting accepted by [`parse_document`].
///
/// The element, node and JSON trees are all walked recursively.
pub const MAX_DEPTH: usize = 256;

/// An XML element with its attributes, text, children and source location.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    /// Local name (prefix stripped)
    pub name: String,
    /// Resolved namespace URI of the element
    pub namespace: Option<String>,
    /// Default namespace in scope at the element
    pub default_namespace: Option<String>,
    /// Attributes by local name, in document order, namespace declarations excluded
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order
    pub children: Vec<XmlElement>,
    /// Concatenated text content (trimmed)
    pub text: String,
    /// 1-based line of the start tag
    pub line: i32,
    /// 1-based column of the start tag
    pub column: i32,
    /// 1-based position among same-named siblings
    pub position: usize,
    /// Number of same-named siblings, including this element
    pub siblings: usize,
}

impl XmlElement {
    /// Attribute value by local name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First child with the given local name
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given local name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First element reached by following `path` through child names.
    pub fn find_path(&self, path: &[&str]) -> Option<&XmlElement> {
        match path.split_first() {
            None => Some(self),
            Some((first, rest)) => self
                .children
                .iter()
                .filter(|c| c.name == *first)
                .find_map(|child| child.find_path(rest)),
        }
    }

    /// Every element reached by following `path` through child names.
    pub fn find_all_path(&self, path: &[&str]) -> Vec<&XmlElement> {
        let mut found = Vec::new();
        self.collect_path(path, &mut found);
        found
    }

    fn collect_path<'a>(&'a self, path: &[&str], found: &mut Vec<&'a XmlElement>) {
        match path.split_first() {
            None => found.push(self),
            Some((first, rest)) => {
                for child in self.children.iter().filter(|c| c.name == *first) {
                    child.collect_path(rest, found);
                }
            }
        }
    }

    /// Attribute `attr` of the first element at `path` whose `root` attribute equals `root`.
    ///
    /// This is the usual way QRDA identifiers are read:
    /// `<id root="2.16.840.1.113883.4.2" extension="123456789"/>`.
    pub fn find_id_attr(&self, path: &[&str], root: &str, attr: &str) -> Option<&str> {
        self.find_all_path(path)
            .into_iter()
            .find(|el| el.attr("root") == Some(root))
            .and_then(|el| el.attr(attr))
    }

    /// `(root, extension)` of every `templateId` child, in document order.
    pub fn template_ids(&self) -> Vec<(&str, Option<&str>)> {
        self.children_named(TEMPLATE_ID_ELEMENT)
            .filter_map(|t| t.attr("root").map(|root| (root, t.attr("extension"))))
            .collect()
    }

    /// True for `templateId` elements themselves
    pub fn is_template_id(&self) -> bool {
        self.name == TEMPLATE_ID_ELEMENT
    }

    /// Location step for this element
    pub fn path_segment(&self) -> PathSegment {
        PathSegment {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            position: self.position,
            siblings: self.siblings,
        }
    }

    fn number_children(&mut self) {
        let mut totals: HashMap<String, usize> = HashMap::new();
        for child in &self.children {
            *totals.entry(child.name.clone()).or_default() += 1;
        }
        let mut seen: HashMap<String, usize> = HashMap::new();
        for child in &mut self.children {
            let position = seen.entry(child.name.clone()).or_default();
            *position += 1;
            child.position = *position;
            child.siblings = totals.get(&child.name).copied().unwrap_or(1);
            child.number_children();
        }
    }
}

/// Byte offsets where each line starts, for offset → line/column lookups.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(bytes: &[u8]) -> Self {
        let mut starts = vec![0];
        starts.extend(
            bytes
                .iter()
                .enumerate()
                .filter(|(_, b)| **b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { starts }
    }

    fn locate(&self, offset: usize) -> (i32, i32) {
        let line = match self.starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        let column = offset - self.starts[line] + 1;
        (line as i32 + 1, column as i32)
    }
}

type NamespaceScope = HashMap<String, String>;

/// Parse a whole document into its root element.
pub fn parse_document(source: &Source) -> Result<XmlElement> {
    let bytes = source.bytes();
    let lines = LineIndex::new(bytes);

    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);
    let decoder = reader.decoder();

    let mut buf = Vec::new();
    let mut open: Vec<XmlElement> = Vec::new();
    let mut scopes: Vec<NamespaceScope> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = reader.read_event_into(&mut buf)?;
        let end = reader.buffer_position() as usize;
        match event {
            Event::Start(_) | Event::Empty(_) if open.len() >= MAX_DEPTH => {
                return Err(malformed(
                    source,
                    &format!("elements nested deeper than {} levels", MAX_DEPTH),
                ));
            }
            Event::Start(ref e) => {
                let element = open_element(e, decoder, bytes, end, &lines, &mut scopes)?;
                open.push(element);
            }
            Event::Empty(ref e) => {
                let element = open_element(e, decoder, bytes, end, &lines, &mut scopes)?;
                scopes.pop();
                attach(element, &mut open, &mut root, source)?;
            }
            Event::End(_) => {
                let element = open.pop().ok_or_else(|| malformed(source, "unexpected end tag"))?;
                scopes.pop();
                attach(element, &mut open, &mut root, source)?;
            }
            Event::Text(ref t) => {
                if let Some(current) = open.last_mut() {
                    current.text.push_str(&t.unescape().map_err(quick_xml::Error::from)?);
                }
            }
            Event::CData(ref c) => {
                if let Some(current) = open.last_mut() {
                    current.text.push_str(std::str::from_utf8(c)?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !open.is_empty() {
        return Err(malformed(source, "document ended inside an element"));
    }

    let mut root = root.ok_or_else(|| malformed(source, "no root element"))?;
    root.position = 1;
    root.siblings = 1;
    root.number_children();
    Ok(root)
}

fn malformed(source: &Source, message: &str) -> ConversionError {
    ConversionError::Malformed {
        source_name: source.name().to_string(),
        message: message.to_string(),
    }
}

fn attach(
    element: XmlElement,
    open: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    source: &Source,
) -> Result<()> {
    if let Some(parent) = open.last_mut() {
        parent.children.push(element);
    } else if root.is_none() {
        *root = Some(element);
    } else {
        return Err(malformed(source, "more than one root element"));
    }
    Ok(())
}

/// Build an element from its start tag and push its namespace scope.
fn open_element(
    e: &BytesStart<'_>,
    decoder: Decoder,
    bytes: &[u8],
    end: usize,
    lines: &LineIndex,
    scopes: &mut Vec<NamespaceScope>,
) -> Result<XmlElement> {
    let mut scope = scopes.last().cloned().unwrap_or_default();
    let mut attributes = Vec::new();

    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let value = attr.decode_and_unescape_value(decoder)?.into_owned();
        match attr.key.as_namespace_binding() {
            Some(PrefixDeclaration::Default) => {
                scope.insert(String::new(), value);
            }
            Some(PrefixDeclaration::Named(prefix)) => {
                scope.insert(std::str::from_utf8(prefix)?.to_string(), value);
            }
            None => {
                let key = std::str::from_utf8(attr.key.local_name().as_ref())?.to_string();
                attributes.push((key, value));
            }
        }
    }

    let name = e.name();
    let prefix = match name.prefix() {
        Some(p) => std::str::from_utf8(p.as_ref())?.to_string(),
        None => String::new(),
    };
    let local = std::str::from_utf8(name.local_name().as_ref())?.to_string();

    // The start tag begins at the last '<' before the end of the event; attribute
    // values cannot contain a raw '<'.
    let start = bytes[..end.min(bytes.len())]
        .iter()
        .rposition(|b| *b == b'<')
        .unwrap_or(0);
    let (line, column) = lines.locate(start);

    let element = XmlElement {
        name: local,
        namespace: scope.get(&prefix).cloned(),
        default_namespace: scope.get("").cloned(),
        attributes,
        children: Vec::new(),
        text: String::new(),
        line,
        column,
        position: 1,
        siblings: 1,
    };
    scopes.push(scope);
    Ok(element)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ClinicalDocument xmlns="urn:hl7-org:v3" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <templateId root="2.16.840.1.113883.10.20.27.1.2" extension="2017-07-01"/>
  <component>
    <section>
      <title>First &amp; only</title>
    </section>
  </component>
  <component><section/></component>
  <xsi:note>aside</xsi:note>
</ClinicalDocument>"#;

    fn parse(text: &str) -> Result<XmlElement> {
        parse_document(&Source::from_bytes("test.xml", text.as_bytes()))
    }

    #[test]
    fn test_parse_tree_shape() {
        let root = parse(DOC).unwrap();
        assert_eq!(root.name, "ClinicalDocument");
        assert_eq!(root.namespace.as_deref(), Some("urn:hl7-org:v3"));
        assert_eq!(root.children.len(), 4);
        assert_eq!(
            root.template_ids(),
            vec![("2.16.840.1.113883.10.20.27.1.2", Some("2017-07-01"))]
        );
    }

    #[test]
    fn test_text_is_unescaped() {
        let root = parse(DOC).unwrap();
        let title = root.find_path(&["component", "section", "title"]).unwrap();
        assert_eq!(title.text, "First & only");
    }

    #[test]
    fn test_locations_are_one_based() {
        let root = parse(DOC).unwrap();
        assert_eq!((root.line, root.column), (2, 1));

        let template = root.child("templateId").unwrap();
        assert_eq!((template.line, template.column), (3, 3));
    }

    #[test]
    fn test_sibling_positions() {
        let root = parse(DOC).unwrap();
        let components: Vec<_> = root.children_named("component").collect();
        assert_eq!(components[0].position, 1);
        assert_eq!(components[1].position, 2);
        assert_eq!(components[1].siblings, 2);
        assert_eq!(root.child("templateId").unwrap().siblings, 1);
    }

    #[test]
    fn test_prefixed_elements_resolve_namespace() {
        let root = parse(DOC).unwrap();
        let note = root.child("note").unwrap();
        assert_eq!(
            note.namespace.as_deref(),
            Some("http://www.w3.org/2001/XMLSchema-instance")
        );
        assert_eq!(note.default_namespace.as_deref(), Some("urn:hl7-org:v3"));
    }

    #[test]
    fn test_namespace_declarations_are_not_attributes() {
        let root = parse(DOC).unwrap();
        assert!(root.attributes.is_empty());
    }

    #[test]
    fn test_find_id_attr() {
        let root = parse(
            r#"<a><b><id root="1" extension="one"/><id root="2" extension="two"/></b></a>"#,
        )
        .unwrap();
        assert_eq!(root.find_id_attr(&["b", "id"], "2", "extension"), Some("two"));
        assert_eq!(root.find_id_attr(&["b", "id"], "3", "extension"), None);
    }

    #[test]
    fn test_mismatched_tags_fail() {
        assert!(parse("<a><b></a>").is_err());
    }

    #[test]
    fn test_path_steps_may_be_short_lived() {
        let root = parse(r#"<a><b><id root="1"/></b></a>"#).unwrap();
        let found = {
            let step = String::from("b");
            root.find_path(&[step.as_str(), "id"])
        };
        assert_eq!(found.and_then(|id| id.attr("root")), Some("1"));
    }

    #[test]
    fn test_attribute_values_are_unescaped() {
        let root = parse(r#"<a title="x &amp; y &#65;"/>"#).unwrap();
        assert_eq!(root.attr("title"), Some("x & y A"));
    }

    fn nested(depth: usize) -> String {
        format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth))
    }

    #[test]
    fn test_nesting_up_to_the_limit() {
        let mut element = &parse(&nested(MAX_DEPTH)).unwrap();
        let mut depth = 1;
        while let Some(child) = element.children.first() {
            element = child;
            depth += 1;
        }
        assert_eq!(depth, MAX_DEPTH);
    }

    #[test]
    fn test_nesting_beyond_the_limit_fails() {
        let err = parse(&nested(MAX_DEPTH + 1)).unwrap_err();
        assert!(matches!(err, ConversionError::Malformed { .. }));

        let err = parse(&nested(20_000)).unwrap_err();
        assert!(err.to_string().contains("nested deeper"));
    }

    #[test]
    fn test_empty_document_fails() {
        let err = parse("").unwrap_err();
        assert!(matches!(err, ConversionError::Malformed { .. }));
    }
}
