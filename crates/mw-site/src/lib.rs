//! Routing, plugins and the page-load pipeline for the markdown wiki runtime.
//!
//! This crate provides:
//! - [`App`]: the orchestrator wiring every component together
//! - [`Router`]: flat fragment routing with `/remote/<base64url>` indirection
//! - [`PluginManager`]: plugin lifecycle with per-plugin failure isolation
//! - [`PageManager`]: fetch, rewrite, parse, render, title, notify
//! - [`TitleManager`] and [`Sidebar`]: title resolution and navigation links
//! - [`Shell`]: the rendered document model
//!
//! # Quick Start
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use mw_config::Config;
//! use mw_fetch::FsFetcher;
//! use mw_site::App;
//!
//! let fetcher = Arc::new(FsFetcher::new(PathBuf::from("site")));
//! let mut app = App::new(Config::default(), fetcher);
//!
//! // Render the page for the initial fragment
//! app.start("#/guide")?;
//!
//! // Follow a link
//! app.navigate("#/guide/install#requirements");
//! let html = app.shell().to_html();
//! # Ok(())
//! # }
//! ```

mod app;
mod dom;
mod links;
mod page;
pub mod plugin;
mod router;
mod sidebar;
mod title;

pub use app::{App, StartReport, StartupError};
pub use dom::{ContentElement, LOADING_HTML, PageState, Shell, html_to_text};
pub use links::rewrite_remote_links;
pub use page::{PageEnv, PageError, PageManager, PageOutcome, RenderedPage};
pub use plugin::{Hook, HookEvent, Plugin, PluginContext, PluginError, PluginManager, PluginRegistry};
pub use router::{REMOTE_PREFIX, Route, Router, encode_remote_path, lookup_key, normalize_path, remote_url};
pub use sidebar::{LinkMap, Sidebar, SidebarLink};
pub use title::{TitleContext, TitleManager};
