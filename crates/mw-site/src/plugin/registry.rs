//! Named plugin factories.

use std::collections::BTreeMap;

use super::builtin::{ExternalLinks, HeadingAnchors};
use super::{Plugin, PluginError};

/// Creates a fresh plugin instance.
pub type PluginFactory = Box<dyn Fn() -> Box<dyn Plugin> + Send + Sync>;

/// Lookup table of plugin factories by name.
///
/// [`PluginRegistry::default`] contains the built-in plugins
/// (`heading-anchors`, `external-links`); [`PluginRegistry::new`] starts
/// empty.
pub struct PluginRegistry {
    factories: BTreeMap<String, PluginFactory>,
}

impl PluginRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Register `factory` under `name`, replacing any previous entry.
    #[must_use]
    pub fn with_plugin<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        self.register(name, factory);
        self
    }

    /// Register `factory` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// Whether a factory is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Create the plugin registered under `name`.
    pub fn create(&self, name: &str) -> Result<Box<dyn Plugin>, PluginError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| PluginError::Unknown(name.to_owned()))?;
        Ok(factory())
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
            .with_plugin(HeadingAnchors::NAME, || Box::new(HeadingAnchors::new()))
            .with_plugin(ExternalLinks::NAME, || Box::new(ExternalLinks))
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
