//! # QRDA III to QPP Conversion
//!
//! [`Converter`] runs the whole pipeline for one [`Source`]:
//!
//! 1. parse the XML ([`crate::xml::parse_document`])
//! 2. decode it into a node tree ([`DecoderEngine`]); the root must be a clinical document
//! 3. validate the tree ([`ValidatorRegistry`]), unless skipped
//! 4. encode the tree into QPP JSON ([`EncoderEngine`])
//!
//! Hard failures come back as [`ConversionError`]; everything else ends up in the
//! [`ConversionReport`].

use log::info;
use serde::{Deserialize, Serialize};

use crate::decode::DecoderEngine;
use crate::encode::EncoderEngine;
use crate::error::{ConversionError, Result};
use crate::model::{Node, TemplateId};
use crate::source::Source;
use crate::validation::{ConversionReport, ValidatorRegistry};
use crate::xml::parse_document;

/// Knobs for a conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOptions {
    /// Walk through elements whose template ids are all unknown instead of failing
    pub allow_unknown_templates: bool,
    /// Skip node validation; field validation during encoding still happens
    pub skip_validation: bool,
}

/// Converts one QRDA Category III document.
#[derive(Debug)]
pub struct Converter {
    source: Source,
    options: ConversionOptions,
}

impl Converter {
    /// Converter for `source` with default options
    pub fn new(source: Source) -> Self {
        Self {
            source,
            options: ConversionOptions::default(),
        }
    }

    /// Replace the options
    pub fn with_options(mut self, options: ConversionOptions) -> Self {
        self.options = options;
        self
    }

    /// The source being converted
    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Decode the source without validating or encoding it.
    pub fn decode(&self) -> Result<Node> {
        let mut engine = self.decoder();
        self.decode_with(&mut engine)
    }

    fn decoder(&self) -> DecoderEngine<'static> {
        DecoderEngine::new()
            .allow_unknown_templates(self.options.allow_unknown_templates)
            .with_source_name(self.source.name())
    }

    fn decode_with(&self, engine: &mut DecoderEngine<'_>) -> Result<Node> {
        let document = parse_document(&self.source)?;
        let root = engine.decode_element(&document)?;
        match root {
            Some(node) if node.template() == TemplateId::ClinicalDocument => Ok(node),
            Some(node) => Err(ConversionError::NotQrdaDocument {
                source_name: self.source.name().to_string(),
                found: node.template(),
            }),
            None => Err(ConversionError::NotQrdaDocument {
                source_name: self.source.name().to_string(),
                found: TemplateId::Placeholder,
            }),
        }
    }

    /// Run the full conversion.
    pub fn convert(&self) -> Result<ConversionReport> {
        info!("Converting {} ({} bytes)", self.source.name(), self.source.len());

        let mut engine = self.decoder();
        let root = self.decode_with(&mut engine)?;
        let mut details = engine.take_warnings();
        info!("Decoded {}", self.source.name());

        if self.options.skip_validation {
            info!("Skipping node validation");
        } else {
            details.extend(ValidatorRegistry::global().validate_tree(&root));
        }

        let (encoded, field_details) = EncoderEngine::new().encode(&root)?;
        details.extend(field_details);

        let report = ConversionReport::new(self.source.name(), encoded, details);
        info!(
            "Converted {}: {} error(s), {} warning(s)",
            self.source.name(),
            report.error_count(),
            report.warning_count()
        );
        Ok(report)
    }
}
