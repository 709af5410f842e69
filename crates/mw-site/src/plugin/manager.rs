//! Plugin loading and event dispatch.

use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::{debug, error, info, warn};

use super::{Hook, HookEvent, Plugin, PluginContext, PluginError, PluginRegistry};

/// Run `f`, turning a panic into [`PluginError::Panicked`].
fn isolate<T>(f: impl FnOnce() -> Result<T, PluginError>) -> Result<T, PluginError> {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_owned());
        Err(PluginError::Panicked(message))
    })
}

/// An active plugin with the hooks captured at registration.
struct LoadedPlugin {
    name: String,
    hooks: Vec<Hook>,
    plugin: Box<dyn Plugin>,
}

impl LoadedPlugin {
    fn handles(&self, hook: Hook) -> bool {
        self.hooks.contains(&hook)
    }
}

/// Outcome of [`PluginManager::load_plugins`], one entry per requested plugin.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// `(plugin name, result)` in request order.
    pub results: Vec<(String, Result<(), PluginError>)>,
}

impl LoadReport {
    /// Names of plugins that were loaded.
    pub fn loaded(&self) -> impl Iterator<Item = &str> {
        self.results
            .iter()
            .filter(|(_, result)| result.is_ok())
            .map(|(name, _)| name.as_str())
    }

    /// Plugins that failed to load, with the reason.
    pub fn failed(&self) -> impl Iterator<Item = (&str, &PluginError)> {
        self.results
            .iter()
            .filter_map(|(name, result)| result.as_ref().err().map(|e| (name.as_str(), e)))
    }

    /// Whether every requested plugin loaded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.results.iter().all(|(_, result)| result.is_ok())
    }
}

/// Outcome of one [`PluginManager::notify`] broadcast.
#[derive(Debug, Default)]
pub struct NotifyReport {
    /// Number of plugins whose handler completed.
    pub delivered: usize,
    /// Plugins whose handler failed, with the reason.
    pub failures: Vec<(String, PluginError)>,
}

/// Loads plugins and broadcasts lifecycle events to them.
pub struct PluginManager {
    registry: PluginRegistry,
    plugins: Vec<LoadedPlugin>,
}

impl PluginManager {
    /// Create a manager creating plugins from `registry`.
    #[must_use]
    pub fn new(registry: PluginRegistry) -> Self {
        Self {
            registry,
            plugins: Vec::new(),
        }
    }

    /// Factory registry.
    #[must_use]
    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Load the named plugins in order.
    ///
    /// Each plugin is created and initialized independently; a failure is
    /// logged and recorded in the report, and loading continues with the
    /// next plugin. Successfully loaded plugins are notified in the order
    /// they appear in `names`.
    pub fn load_plugins(&mut self, names: &[String], ctx: &PluginContext<'_>) -> LoadReport {
        let mut report = LoadReport::default();
        for name in names {
            let result = self.load_plugin(name, ctx);
            if let Err(e) = &result {
                error!(plugin = %name, error = %e, "Failed to load plugin");
            }
            report.results.push((name.clone(), result));
        }
        info!(
            loaded = report.loaded().count(),
            failed = report.failed().count(),
            "Plugins loaded"
        );
        report
    }

    /// Create the plugin registered as `name` and register it.
    pub fn load_plugin(&mut self, name: &str, ctx: &PluginContext<'_>) -> Result<(), PluginError> {
        if self.contains(name) {
            return Err(PluginError::Duplicate(name.to_owned()));
        }
        let registry = &self.registry;
        let plugin = isolate(|| registry.create(name))?;
        self.activate(name.to_owned(), plugin, ctx)
    }

    /// Register an already constructed plugin under its own name.
    pub fn register(
        &mut self,
        plugin: Box<dyn Plugin>,
        ctx: &PluginContext<'_>,
    ) -> Result<(), PluginError> {
        let name = plugin.name().to_owned();
        if self.contains(&name) {
            return Err(PluginError::Duplicate(name));
        }
        self.activate(name, plugin, ctx)
    }

    fn activate(
        &mut self,
        name: String,
        mut plugin: Box<dyn Plugin>,
        ctx: &PluginContext<'_>,
    ) -> Result<(), PluginError> {
        let hooks = isolate(|| Ok(plugin.registered_hooks()))?;
        if hooks.contains(&Hook::Init) {
            isolate(|| plugin.on_init(ctx))?;
        }
        debug!(plugin = %name, hooks = ?hooks, "Plugin registered");
        self.plugins.push(LoadedPlugin {
            name,
            hooks,
            plugin,
        });
        Ok(())
    }

    /// Deliver `event` to every plugin handling it, in registration order.
    ///
    /// A failing handler is logged and does not stop delivery to the
    /// remaining plugins.
    pub fn notify(&mut self, mut event: HookEvent<'_>) -> NotifyReport {
        let hook = event.hook();
        let mut report = NotifyReport::default();

        for loaded in self.plugins.iter_mut().filter(|p| p.handles(hook)) {
            let plugin = &mut loaded.plugin;
            let result = isolate(|| match &mut event {
                HookEvent::PageLoad(content) => plugin.on_page_load(content),
                HookEvent::Destroy => plugin.on_destroy(),
            });
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(plugin = %loaded.name, hook = %hook, error = %e, "Plugin hook failed");
                    report.failures.push((loaded.name.clone(), e));
                }
            }
        }
        report
    }

    /// Broadcast destroy and drop all plugins.
    pub fn shutdown(&mut self) -> NotifyReport {
        let report = self.notify(HookEvent::Destroy);
        self.plugins.clear();
        report
    }

    /// Whether a plugin named `name` is active.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.plugins.iter().any(|p| p.name == name)
    }

    /// Active plugin names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.plugins.iter().map(|p| p.name.as_str())
    }

    /// Hooks captured for the plugin named `name`.
    #[must_use]
    pub fn hooks(&self, name: &str) -> Option<&[Hook]> {
        self.plugins
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.hooks.as_slice())
    }

    /// Number of active plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether no plugin is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManager")
            .field("registry", &self.registry)
            .field("plugins", &self.names().collect::<Vec<_>>())
            .finish()
    }
}
