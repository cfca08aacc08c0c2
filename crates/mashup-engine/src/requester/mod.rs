mod dryrun;
mod gemini;

use std::collections::BTreeMap;
use std::sync::Arc;

use mashup_contracts::assets::{GenerationResult, ImageAsset};

use crate::config::RequesterConfig;
use crate::error::GenerationError;

pub use dryrun::DryrunRequester;
pub use gemini::GeminiRequester;

/// Turns a character and a product image into one composite.
///
/// Callers guarantee both assets are present. Implementations make exactly
/// one attempt per call.
pub trait GenerationRequester: Send + Sync {
    fn name(&self) -> &str;
    fn generate(
        &self,
        character: &ImageAsset,
        product: &ImageAsset,
    ) -> Result<GenerationResult, GenerationError>;
}

#[derive(Default)]
pub struct RequesterRegistry {
    requesters: BTreeMap<String, Arc<dyn GenerationRequester>>,
}

impl RequesterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<R: GenerationRequester + 'static>(&mut self, requester: R) {
        self.requesters
            .insert(requester.name().to_string(), Arc::new(requester));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn GenerationRequester>> {
        self.requesters.get(name.trim()).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.requesters.keys().cloned().collect()
    }
}

pub fn default_registry(config: &RequesterConfig) -> Result<RequesterRegistry, GenerationError> {
    let mut registry = RequesterRegistry::new();
    registry.register(DryrunRequester::new(&config.prompt));
    registry.register(GeminiRequester::new(config)?);
    Ok(registry)
}
