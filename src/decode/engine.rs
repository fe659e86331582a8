use log::{debug, warn};

use super::{DecodeResult, DecoderRegistry};
use crate::error::{ConversionError, Result};
use crate::model::{Node, PathSegment, TemplateId};
use crate::validation::Detail;
use crate::xml::XmlElement;

/// What an element turned out to be.
enum Identity {
    /// A catalog template (possibly an ignorable one)
    Template(TemplateId),
    /// Plain structure: walk through it
    Structural,
}

/// Walks an element tree and builds the node tree.
pub struct DecoderEngine<'r> {
    registry: &'r DecoderRegistry,
    allow_unknown_templates: bool,
    source_name: Option<String>,
    warnings: Vec<Detail>,
}

impl DecoderEngine<'static> {
    /// Engine over [`DecoderRegistry::global`]
    pub fn new() -> Self {
        Self::with_registry(DecoderRegistry::global())
    }
}

impl Default for DecoderEngine<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> DecoderEngine<'r> {
    /// Engine over a custom registry
    pub fn with_registry(registry: &'r DecoderRegistry) -> Self {
        Self {
            registry,
            allow_unknown_templates: false,
            source_name: None,
            warnings: Vec::new(),
        }
    }

    /// Treat elements with only unknown template ids as plain structure instead of failing.
    pub fn allow_unknown_templates(mut self, allow: bool) -> Self {
        self.allow_unknown_templates = allow;
        self
    }

    /// Name recorded as every node's source path
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    /// Warnings raised so far (tolerated unknown templates)
    pub fn warnings(&self) -> &[Detail] {
        &self.warnings
    }

    /// Take the warnings raised so far
    pub fn take_warnings(&mut self) -> Vec<Detail> {
        std::mem::take(&mut self.warnings)
    }

    /// Decode `element` and its subtree.
    ///
    /// Returns `None` when nothing below `element` is kept. When several top-level
    /// nodes come out (a structural root over several templates) they are gathered
    /// under a [`TemplateId::Placeholder`] node.
    pub fn decode_element(&mut self, element: &XmlElement) -> Result<Option<Node>> {
        let mut path = Vec::new();
        let mut nodes = self.visit(element, &mut path)?;

        let root = match nodes.len() {
            0 => None,
            1 => nodes.pop(),
            _ => {
                let mut placeholder = self.new_node(TemplateId::Placeholder, element, vec![element.path_segment()]);
                placeholder.add_children(nodes);
                Some(placeholder)
            }
        };
        Ok(root)
    }

    fn visit(&mut self, element: &XmlElement, path: &mut Vec<PathSegment>) -> Result<Vec<Node>> {
        path.push(element.path_segment());
        let result = match self.identify(element, path)? {
            Identity::Template(template) => self.decode_template(template, element, path),
            Identity::Structural => self.visit_children(element, path),
        };
        path.pop();
        result
    }

    fn visit_children(&mut self, element: &XmlElement, path: &mut Vec<PathSegment>) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        for child in element.children.iter().filter(|c| !c.is_template_id()) {
            nodes.extend(self.visit(child, path)?);
        }
        Ok(nodes)
    }

    fn decode_template(
        &mut self,
        template: TemplateId,
        element: &XmlElement,
        path: &mut Vec<PathSegment>,
    ) -> Result<Vec<Node>> {
        let registry = self.registry;
        let decoder = registry
            .get(template)
            .ok_or(ConversionError::MissingDecoder(template))?;

        let mut node = self.new_node(template, element, path.clone());
        match decoder.decode(element, &mut node)? {
            DecodeResult::Elided => {
                debug!("Elided {} at line {}", template, element.line);
                Ok(Vec::new())
            }
            DecodeResult::TreeFinished => {
                debug!("Decoded {} at line {}", template, element.line);
                Ok(vec![node])
            }
            DecodeResult::TreeContinue => {
                debug!("Decoded {} at line {}, descending", template, element.line);
                let children = self.visit_children(element, path)?;
                node.add_children(children);
                Ok(vec![node])
            }
        }
    }

    fn identify(&mut self, element: &XmlElement, path: &[PathSegment]) -> Result<Identity> {
        let ids = element.template_ids();
        if ids.is_empty() {
            return Ok(Identity::Structural);
        }

        let known: Vec<TemplateId> = ids
            .iter()
            .filter_map(|(root, extension)| TemplateId::from_ids(root, *extension))
            .collect();
        if let Some(template) = known
            .iter()
            .find(|t| !t.is_ignorable())
            .or_else(|| known.first())
        {
            return Ok(Identity::Template(*template));
        }

        let (root, extension) = ids[0];
        let mut located = Node::new(TemplateId::Placeholder);
        located.set_path_segments(path.to_vec());
        let xpath = located.get_or_compute_path().to_string();

        if !self.allow_unknown_templates {
            return Err(ConversionError::UnknownTemplate {
                root: root.to_string(),
                extension: extension.map(str::to_string),
                line: element.line,
                column: element.column,
                path: xpath,
            });
        }

        warn!(
            "Unknown template {} (extension {:?}) at line {}, decoding children only",
            root, extension, element.line
        );
        let mut detail = Detail::new(format!("Unknown template {}", root)).warning();
        detail.value = extension.map(str::to_string);
        detail.path = xpath;
        detail.line = Some(element.line);
        detail.column = Some(element.column);
        self.warnings.push(detail);
        Ok(Identity::Structural)
    }

    fn new_node(&self, template: TemplateId, element: &XmlElement, segments: Vec<PathSegment>) -> Node {
        let mut node = Node::new(template);
        node.set_line(element.line);
        node.set_column(element.column);
        node.set_default_ns_uri(element.default_namespace.clone());
        node.set_path_segments(segments);
        if let Some(name) = &self.source_name {
            node.set_source_path(name.clone());
        }
        node
    }
}
