//! # QRDA Decoding
//!
//! Turns the XML element tree into the [`Node`] tree the encoders read.
//!
//! Each element is identified by its `templateId` children. Elements of a catalog
//! template get a [`Decoder`] from the [`DecoderRegistry`], which fills the node's
//! fields and says how the walk proceeds ([`DecodeResult`]). Elements without a
//! template are plain XML structure and are walked through transparently, so the
//! node tree only keeps the elements that mean something.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::error::Result;
use crate::model::{Node, TemplateId};
use crate::xml::XmlElement;

pub use decoders::{NullReturnDecoder, SectionDecoder};
pub use engine::DecoderEngine;

mod decoders;
mod engine;

/// How the walk continues after a decoder ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeResult {
    /// Keep the node and decode the element's children into it
    TreeContinue,
    /// Keep the node; its children have been handled or are of no interest
    TreeFinished,
    /// Drop the node and everything below it
    Elided,
}

/// Reads one element into its node.
pub trait Decoder: Send + Sync {
    /// Fill `node` from `element`.
    fn decode(&self, element: &XmlElement, node: &mut Node) -> Result<DecodeResult>;
}

impl<F> Decoder for F
where
    F: Fn(&XmlElement, &mut Node) -> Result<DecodeResult> + Send + Sync,
{
    fn decode(&self, element: &XmlElement, node: &mut Node) -> Result<DecodeResult> {
        self(element, node)
    }
}

/// Decoders keyed by template.
#[derive(Default)]
pub struct DecoderRegistry {
    decoders: HashMap<TemplateId, Box<dyn Decoder>>,
}

impl DecoderRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The QRDA Category III decoders, created on first use.
    pub fn global() -> &'static DecoderRegistry {
        static REGISTRY: OnceLock<DecoderRegistry> = OnceLock::new();
        REGISTRY.get_or_init(decoders::builtin)
    }

    /// Register `decoder` for `template`, replacing any previous one.
    pub fn register(&mut self, template: TemplateId, decoder: impl Decoder + 'static) {
        self.decoders.insert(template, Box::new(decoder));
    }

    /// Decoder for `template`
    pub fn get(&self, template: TemplateId) -> Option<&dyn Decoder> {
        self.decoders.get(&template).map(|d| d.as_ref())
    }
}
