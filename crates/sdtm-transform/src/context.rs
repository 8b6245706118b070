//! Run-level inputs shared by every domain derivation.

use sdtm_model::DerivationOptions;
use sdtm_standards::DomainRegistry;

/// Read-only context for a derivation.
///
/// Borrowed by every worker in a wave; nothing in it changes during a run.
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    pub registry: &'a DomainRegistry,
    pub options: &'a DerivationOptions,
}

impl<'a> TransformContext<'a> {
    pub fn new(registry: &'a DomainRegistry, options: &'a DerivationOptions) -> Self {
        Self { registry, options }
    }
}
