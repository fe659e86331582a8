//! # Intermediate Model
//!
//! The decoded form of a QRDA document: a tree of [`Node`]s, each tagged with the
//! [`TemplateId`] of the XML element it came from.

pub mod fields;
mod node;
mod template;

pub use node::{Node, PathSegment};
pub use template::TemplateId;
