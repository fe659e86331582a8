//! # qrda-qpp - QRDA Category III to QPP JSON
//!
//! `qrda_qpp` converts clinical quality-measure reports written as QRDA Category III
//! XML into the JSON submission format of the Quality Payment Program (QPP).
//!
//! ## Key Features
//!
//! - **Template-driven decoding**: Each XML element is identified by its
//!   `templateId` children and decoded by the decoder registered for that template.
//!   Plain structural elements are walked through, ignorable templates are dropped.
//!
//! - **Validated encoding**: Counts, dates and yes/no observations are type-checked
//!   as they are written. A bad value is still written out verbatim and reported, so
//!   one typo does not hide every other problem in the document.
//!
//! - **Traceable errors**: Every problem carries the template, XPath, line and
//!   column of the XML element it came from.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use qrda_qpp::converter::Converter;
//! use qrda_qpp::source::Source;
//! use std::path::Path;
//!
//! let source = Source::from_path(Path::new("report.xml"))?;
//! let report = Converter::new(source).convert()?;
//!
//! if report.is_success() {
//!     println!("{}", report.qpp());
//! } else {
//!     println!("{}", report.errors_json()?);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! The library is organized into the following modules:
//!
//! - [`xml`]: Owned XML element tree with source locations
//! - [`model`]: The intermediate [`model::Node`] tree and the template catalog
//! - [`decode`]: Decoder registry and the XML → node walk
//! - [`encode`]: [`encode::JsonWrapper`], encoder registry and the node → JSON walk
//! - [`validation`]: Node validation rules, [`validation::Detail`] and the conversion report
//! - [`converter`]: The whole pipeline for one source
//!
//! ## Output
//!
//! A successful conversion produces a document such as:
//!
//! ```json
//! {
//!   "entityType": "individual",
//!   "taxpayerIdentificationNumber": "123456789",
//!   "nationalProviderIdentifier": "2567891421",
//!   "performanceYear": 2017,
//!   "measurementSets": [
//!     {
//!       "category": "aci",
//!       "submissionMethod": "electronicHealthRecord",
//!       "performanceStart": "2017-01-01",
//!       "performanceEnd": "2017-12-31",
//!       "measurements": [
//!         { "measureId": "ACI_EP_1", "value": { "numerator": 600, "denominator": 800 } }
//!       ]
//!     }
//!   ]
//! }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod converter;
pub mod decode;
pub mod encode;
pub mod error;
pub mod model;
pub mod source;
pub mod validation;
pub mod xml;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::converter::{ConversionOptions, Converter};
    pub use crate::decode::{DecodeResult, Decoder, DecoderEngine, DecoderRegistry};
    pub use crate::encode::{
        EncodeContext, EncodeError, Encoder, EncoderEngine, EncoderRegistry, JsonWrapper, Metadata,
        METADATA_HOLDER,
    };
    pub use crate::error::{ConversionError, Result};
    pub use crate::model::{Node, TemplateId};
    pub use crate::source::Source;
    pub use crate::validation::{ConversionReport, Detail, Severity, ValidatorRegistry};
}
