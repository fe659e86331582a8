//! # QPP JSON Encoding
//!
//! Encoders turn decoded [`Node`]s into QPP JSON, one [`JsonWrapper`] per node.
//! They are looked up by template in the [`EncoderRegistry`] and recurse through
//! an [`EncodeContext`], which also collects field-level problems as
//! [`Detail`]s so a bad count does not stop the rest of the document from being
//! encoded.

use std::collections::HashMap;
use std::sync::OnceLock;

use log::debug;

use crate::model::{Node, TemplateId};
use crate::validation::Detail;

pub use engine::EncoderEngine;
pub use error::EncodeError;
pub use json_wrapper::{JsonWrapper, METADATA_HOLDER, SOURCE_NAME};
pub use metadata::Metadata;

pub mod format;

mod encoders;
mod engine;
mod error;
mod json_wrapper;
mod metadata;

/// Writes one node into a wrapper.
pub trait Encoder: Send + Sync {
    /// Encode `node` into `wrapper`, encoding children through `ctx`.
    ///
    /// Field-level errors should be handed to [`EncodeContext::record`]; an error
    /// returned from here aborts the conversion.
    fn encode(&self, wrapper: &mut JsonWrapper, node: &Node, ctx: &mut EncodeContext<'_>) -> Result<(), EncodeError>;
}

impl<F> Encoder for F
where
    F: Fn(&mut JsonWrapper, &Node, &mut EncodeContext<'_>) -> Result<(), EncodeError> + Send + Sync,
{
    fn encode(&self, wrapper: &mut JsonWrapper, node: &Node, ctx: &mut EncodeContext<'_>) -> Result<(), EncodeError> {
        self(wrapper, node, ctx)
    }
}

/// Encoders keyed by template.
#[derive(Default)]
pub struct EncoderRegistry {
    encoders: HashMap<TemplateId, Box<dyn Encoder>>,
}

impl EncoderRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The QPP encoders, created on first use.
    pub fn global() -> &'static EncoderRegistry {
        static REGISTRY: OnceLock<EncoderRegistry> = OnceLock::new();
        REGISTRY.get_or_init(encoders::builtin)
    }

    /// Register `encoder` for `template`, replacing any previous one.
    pub fn register(&mut self, template: TemplateId, encoder: impl Encoder + 'static) {
        self.encoders.insert(template, Box::new(encoder));
    }

    /// Encoder for `template`
    pub fn get(&self, template: TemplateId) -> Option<&dyn Encoder> {
        self.encoders.get(&template).map(|e| e.as_ref())
    }

    /// True if an encoder is registered for `template`
    pub fn contains(&self, template: TemplateId) -> bool {
        self.encoders.contains_key(&template)
    }
}

/// State shared by the encoders of one conversion.
pub struct EncodeContext<'r> {
    registry: &'r EncoderRegistry,
    details: Vec<Detail>,
}

impl<'r> EncodeContext<'r> {
    /// A context that looks encoders up in `registry`
    pub fn new(registry: &'r EncoderRegistry) -> Self {
        Self {
            registry,
            details: Vec::new(),
        }
    }

    /// Encode `node` into a fresh wrapper and attach the node's metadata to it.
    pub fn encode_child(&mut self, node: &Node) -> Result<JsonWrapper, EncodeError> {
        let registry = self.registry;
        let encoder = registry.get(node.template()).ok_or_else(|| {
            EncodeError::new(format!("No encoder registered for template {}", node.template()))
        })?;

        debug!("Encoding {}", node.template());
        let mut wrapper = JsonWrapper::new();
        encoder.encode(&mut wrapper, node, self)?;
        if !wrapper.is_list() {
            wrapper.attach_metadata(node)?;
        }
        Ok(wrapper)
    }

    /// Keep going after a field-level error.
    ///
    /// An invalid-value error becomes a [`Detail`] located at `node` and the node's
    /// metadata is attached to `wrapper`. Any other error is returned.
    pub fn record<T>(
        &mut self,
        wrapper: &mut JsonWrapper,
        node: &Node,
        result: Result<T, EncodeError>,
    ) -> Result<Option<T>, EncodeError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_invalid_value() => {
                debug!("{} on {}", err, node.template());
                self.details.push(Detail::from_encode_error(node, &err));
                wrapper.attach_metadata(node)?;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Run a typed put on `wrapper` and [`record`](Self::record) its outcome.
    pub fn put_checked<F>(&mut self, wrapper: &mut JsonWrapper, node: &Node, put: F) -> Result<(), EncodeError>
    where
        F: FnOnce(&mut JsonWrapper) -> Result<&mut JsonWrapper, EncodeError>,
    {
        let result = put(wrapper).map(|_| ());
        self.record(wrapper, node, result).map(|_| ())
    }

    /// Problems recorded so far
    pub fn details(&self) -> &[Detail] {
        &self.details
    }

    /// Take the recorded problems
    pub fn into_details(self) -> Vec<Detail> {
        self.details
    }
}
