//! # Validation
//!
//! Problems found during a conversion are not exceptions: they are [`Detail`]s,
//! collected while the walk continues and returned in a [`ConversionReport`].
//!
//! Two sources feed the report:
//!
//! 1. **Field validation** while encoding: a typed [`crate::encode::JsonWrapper`]
//!    put that rejects a value (a non-numeric count, a malformed date).
//! 2. **Node validation** before encoding: the rules registered in
//!    [`ValidatorRegistry`] check the decoded tree for missing or inconsistent data.

use std::collections::HashMap;
use std::sync::OnceLock;

use log::debug;

use crate::model::{Node, TemplateId};

pub use detail::{Detail, Severity};
pub use report::ConversionReport;

mod detail;
mod report;
mod rules;

/// A check run against every decoded node of one template.
pub trait NodeValidator: Send + Sync {
    /// Append any problems found on `node` to `details`.
    fn validate(&self, node: &Node, details: &mut Vec<Detail>);
}

impl<F> NodeValidator for F
where
    F: Fn(&Node, &mut Vec<Detail>) + Send + Sync,
{
    fn validate(&self, node: &Node, details: &mut Vec<Detail>) {
        self(node, details)
    }
}

/// Node validators keyed by template.
#[derive(Default)]
pub struct ValidatorRegistry {
    validators: HashMap<TemplateId, Box<dyn NodeValidator>>,
}

impl ValidatorRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in rules, created on first use.
    pub fn global() -> &'static ValidatorRegistry {
        static REGISTRY: OnceLock<ValidatorRegistry> = OnceLock::new();
        REGISTRY.get_or_init(rules::builtin)
    }

    /// Register `validator` for `template`, replacing any previous one.
    pub fn register(&mut self, template: TemplateId, validator: impl NodeValidator + 'static) {
        self.validators.insert(template, Box::new(validator));
    }

    /// Validator for `template`
    pub fn get(&self, template: TemplateId) -> Option<&dyn NodeValidator> {
        self.validators.get(&template).map(|v| v.as_ref())
    }

    /// Run every applicable validator over `root` and its descendants, depth-first.
    pub fn validate_tree(&self, root: &Node) -> Vec<Detail> {
        let mut details = Vec::new();
        self.visit(root, &mut details);
        debug!("Node validation found {} problem(s)", details.len());
        details
    }

    fn visit(&self, node: &Node, details: &mut Vec<Detail>) {
        if let Some(validator) = self.get(node.template()) {
            validator.validate(node, details);
        }
        for child in node.children() {
            self.visit(child, details);
        }
    }
}
