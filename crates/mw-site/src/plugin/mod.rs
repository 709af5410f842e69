//! Plugin lifecycle and hook notification.
//!
//! Plugins implement [`Plugin`] and are created by name from a
//! [`PluginRegistry`]. The [`PluginManager`] instantiates the configured
//! plugins in order, calls their init hook once, and broadcasts page-load and
//! destroy events in registration order. A failing or panicking plugin is
//! logged and skipped; it never stops the page pipeline or other plugins.

mod builtin;
mod context;
mod manager;
mod registry;

pub use builtin::{ExternalLinks, HeadingAnchors};
pub use context::PluginContext;
pub use manager::{LoadReport, NotifyReport, PluginManager};
pub use registry::{PluginFactory, PluginRegistry};

use crate::dom::ContentElement;

/// Lifecycle hooks a plugin can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    /// Called once right after the plugin is created.
    Init,
    /// Called after every successful page render.
    PageLoad,
    /// Called when the application shuts down.
    Destroy,
}

impl Hook {
    /// Hook name used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "on_init",
            Self::PageLoad => "on_page_load",
            Self::Destroy => "on_destroy",
        }
    }
}

impl std::fmt::Display for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event broadcast to plugins after initialization.
#[derive(Debug)]
pub enum HookEvent<'a> {
    /// A page was rendered into the content element.
    PageLoad(&'a mut ContentElement),
    /// The application is shutting down.
    Destroy,
}

impl HookEvent<'_> {
    /// Hook this event is delivered to.
    #[must_use]
    pub fn hook(&self) -> Hook {
        match self {
            Self::PageLoad(_) => Hook::PageLoad,
            Self::Destroy => Hook::Destroy,
        }
    }
}

/// Plugin error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PluginError {
    /// No factory is registered under the name.
    #[error("Unknown plugin `{0}`")]
    Unknown(String),
    /// A plugin with the same name is already active.
    #[error("Plugin `{0}` is already loaded")]
    Duplicate(String),
    /// The plugin reported a failure.
    #[error("{0}")]
    Failed(String),
    /// The plugin panicked.
    #[error("Plugin panicked: {0}")]
    Panicked(String),
}

impl PluginError {
    /// Create a failure with a message.
    #[must_use]
    pub fn failed(message: impl std::fmt::Display) -> Self {
        Self::Failed(message.to_string())
    }
}

/// A page-pipeline extension.
///
/// Hooks are opt-in: only the hooks listed by
/// [`registered_hooks`](Self::registered_hooks) are ever called. The list is
/// read once when the plugin is registered.
pub trait Plugin: Send {
    /// Plugin name used in logs.
    fn name(&self) -> &str;

    /// Hooks this plugin handles.
    fn registered_hooks(&self) -> Vec<Hook>;

    /// Initialize the plugin.
    fn on_init(&mut self, _ctx: &PluginContext<'_>) -> Result<(), PluginError> {
        Ok(())
    }

    /// Process freshly rendered content.
    ///
    /// May run more than once on the same content, so implementations should
    /// skip elements they already processed (see [`ContentElement::marker`]).
    fn on_page_load(&mut self, _content: &mut ContentElement) -> Result<(), PluginError> {
        Ok(())
    }

    /// Release resources before shutdown.
    fn on_destroy(&mut self) -> Result<(), PluginError> {
        Ok(())
    }
}
