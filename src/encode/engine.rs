use log::{debug, info};

use super::{EncodeContext, EncoderRegistry, JsonWrapper};
use crate::error::{ConversionError, Result};
use crate::model::Node;
use crate::validation::Detail;

/// Encodes a whole decoded tree.
pub struct EncoderEngine<'r> {
    registry: &'r EncoderRegistry,
}

impl EncoderEngine<'static> {
    /// Engine over [`EncoderRegistry::global`]
    pub fn new() -> Self {
        Self::with_registry(EncoderRegistry::global())
    }
}

impl Default for EncoderEngine<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> EncoderEngine<'r> {
    /// Engine over a custom registry
    pub fn with_registry(registry: &'r EncoderRegistry) -> Self {
        Self { registry }
    }

    /// Encode `root` and everything below it.
    ///
    /// Returns the output with metadata attached, plus the field-level problems met
    /// on the way. Every template in the tree must have an encoder.
    pub fn encode(&self, root: &Node) -> Result<(JsonWrapper, Vec<Detail>)> {
        self.ensure_encoders(root)?;

        let mut ctx = EncodeContext::new(self.registry);
        let wrapper = ctx.encode_child(root)?;
        let details = ctx.into_details();
        info!("Encoded {} with {} field error(s)", root.template(), details.len());
        Ok((wrapper, details))
    }

    fn ensure_encoders(&self, node: &Node) -> Result<()> {
        if !self.registry.contains(node.template()) {
            debug!("No encoder for {} at {}", node.template(), node.get_or_compute_path());
            return Err(ConversionError::MissingEncoder(node.template()));
        }
        node.children()
            .iter()
            .try_for_each(|child| self.ensure_encoders(child))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TemplateId;

    #[test]
    fn test_missing_encoder_is_hard_failure() {
        let registry = EncoderRegistry::new();
        let engine = EncoderEngine::with_registry(&registry);
        let err = engine.encode(&Node::new(TemplateId::AggregateCount)).unwrap_err();
        assert!(matches!(err, ConversionError::MissingEncoder(TemplateId::AggregateCount)));
    }

    #[test]
    fn test_global_engine_encodes() {
        let mut node = Node::new(TemplateId::AggregateCount);
        node.put_value("aggregateCount", "7");
        let (wrapper, details) = EncoderEngine::new().encode(&node).unwrap();
        assert_eq!(wrapper.get_integer("value"), Some(7));
        assert!(details.is_empty());
    }
}
