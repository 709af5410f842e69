//! Configuration management for the markdown wiki runtime.
//!
//! Parses `mw.toml` files with serde and layers them over the built-in
//! defaults. The defaults are serialized into a TOML tree, the user's file is
//! merged on top (see [`merge_values`]) and the merged tree is deserialized
//! back into [`Config`]. Tables merge recursively; arrays and scalars are
//! replaced, so `plugins = ["a"]` replaces the default plugin list instead of
//! extending it.
//!
//! The resulting [`Config`] is immutable for the lifetime of an application
//! and is passed explicitly to every component.

mod merge;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use merge::merge_values;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mw.toml";

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the content base path.
    pub base_path: Option<String>,
    /// Override whether remote documents may be loaded.
    pub remote_enabled: Option<bool>,
    /// Override the CORS proxy prefix for remote documents.
    pub cors_proxy_url: Option<String>,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application name, combined with page titles.
    pub name: String,
    /// Base path prepended to every local resource.
    pub base_path: String,
    /// Well-known content files.
    pub files: FilesConfig,
    /// Ordered plugin identifiers.
    pub plugins: Vec<String>,
    /// Markdown parser selection.
    pub markdown: MarkdownConfig,
    /// Document title rules.
    pub title: TitleConfig,
    /// Remote document policy.
    pub remote: RemoteConfig,
    /// Mount points of the application shell.
    pub selectors: SelectorsConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "Wiki".to_owned(),
            base_path: String::new(),
            files: FilesConfig::default(),
            plugins: vec!["heading-anchors".to_owned()],
            markdown: MarkdownConfig::default(),
            title: TitleConfig::default(),
            remote: RemoteConfig::default(),
            selectors: SelectorsConfig::default(),
            config_path: None,
        }
    }
}

/// Locations of the special content files, relative to `base_path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Sidebar navigation document.
    pub sidebar: String,
    /// Document rendered for `/`.
    pub default_page: String,
    /// Document rendered when a page cannot be fetched.
    pub not_found_page: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            sidebar: "_sidebar.md".to_owned(),
            default_page: "README.md".to_owned(),
            not_found_page: "404.md".to_owned(),
        }
    }
}

/// Markdown parser configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    /// Registered parser name (built-in or user-supplied).
    pub parser: String,
    /// Free-form options handed to the parser.
    pub parser_options: toml::Table,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            parser: "gfm".to_owned(),
            parser_options: toml::Table::new(),
        }
    }
}

/// How the page title and the application name are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TitleOrder {
    /// `Page<sep>Wiki`
    #[default]
    PageFirst,
    /// `Wiki<sep>Page`
    WikiFirst,
    /// `Page`
    PageOnly,
}

/// A place a page title can be taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TitleSource {
    /// Explicit title attached to the sidebar link.
    SidebarTitle,
    /// Text of the sidebar link.
    SidebarLabel,
    /// First level-1 heading of the rendered page.
    Heading,
    /// Content file name without extension.
    Filename,
    /// `title.fallback`.
    Fallback,
}

/// Document title configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleConfig {
    /// Whether the document title is updated at all.
    pub enabled: bool,
    /// Whether the application name is part of the title.
    pub include_wiki: bool,
    /// Ordering of page title and application name.
    pub order: TitleOrder,
    /// Separator between page title and application name.
    pub separator: String,
    /// Title used when no other source yields one.
    pub fallback: String,
    /// Sources consulted in order until one is non-empty.
    pub source_priority: Vec<TitleSource>,
    /// Maximum title length in characters, ellipsis included.
    pub max_length: usize,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            include_wiki: true,
            order: TitleOrder::PageFirst,
            separator: " - ".to_owned(),
            fallback: "Untitled".to_owned(),
            source_priority: vec![
                TitleSource::SidebarTitle,
                TitleSource::SidebarLabel,
                TitleSource::Heading,
                TitleSource::Filename,
                TitleSource::Fallback,
            ],
            max_length: 80,
        }
    }
}

/// Remote document configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Whether `/remote/...` routes may fetch external documents.
    pub enabled: bool,
    /// Prefix prepended to absolute URLs before fetching.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cors_proxy_url: Option<String>,
}

/// Element selectors of the application shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorsConfig {
    /// Application root, replaced by the fatal banner on startup failure.
    pub app: String,
    /// Content area pages are rendered into.
    pub content: String,
    /// Sidebar navigation area.
    pub sidebar: String,
}

impl Default for SelectorsConfig {
    fn default() -> Self {
        Self {
            app: "#app".to_owned(),
            content: "#content".to_owned(),
            sidebar: "#sidebar".to_owned(),
        }
    }
}

/// Strip the leading `#` of an id selector.
#[must_use]
pub fn element_id(selector: &str) -> &str {
    selector.strip_prefix('#').unwrap_or(selector)
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Defaults could not be turned into a TOML tree.
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Require an `#id` selector.
fn require_id_selector(selector: &str, field: &str) -> Result<(), ConfigError> {
    if !selector.starts_with('#') || selector.len() < 2 {
        return Err(ConfigError::Validation(format!(
            "{field} must be an id selector like \"#content\""
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `mw.toml` in current directory and parents,
    /// falling back to the defaults when none is found.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails
    /// or the merged configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from TOML text layered over the defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the text is not valid TOML, does not match the
    /// configuration schema, or fails validation.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let overrides: toml::Table = toml::from_str(content)?;
        let config = Self::from_overrides(overrides)?;
        config.validate()?;
        Ok(config)
    }

    /// Merge an override table onto the defaults and deserialize the result.
    ///
    /// # Errors
    ///
    /// Returns error if the merged tree does not match the configuration schema.
    pub fn from_overrides(overrides: toml::Table) -> Result<Self, ConfigError> {
        let mut merged = toml::Value::try_from(Self::default())?;
        merge_values(&mut merged, toml::Value::Table(overrides));
        Ok(merged.try_into()?)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(base_path) = &settings.base_path {
            self.base_path.clone_from(base_path);
        }
        if let Some(enabled) = settings.remote_enabled {
            self.remote.enabled = enabled;
        }
        if let Some(proxy) = &settings.cors_proxy_url {
            self.remote.cors_proxy_url = Some(proxy.clone());
        }
    }

    /// Validate the merged configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` naming the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.files.default_page, "files.default_page")?;
        require_non_empty(&self.files.not_found_page, "files.not_found_page")?;
        require_non_empty(&self.markdown.parser, "markdown.parser")?;
        if let Some(proxy) = &self.remote.cors_proxy_url {
            require_http_url(proxy, "remote.cors_proxy_url")?;
        }
        require_id_selector(&self.selectors.app, "selectors.app")?;
        require_id_selector(&self.selectors.content, "selectors.content")?;
        require_id_selector(&self.selectors.sidebar, "selectors.sidebar")?;
        if self.title.max_length < 4 {
            return Err(ConfigError::Validation(
                "title.max_length must be at least 4".into(),
            ));
        }
        Ok(())
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let overrides: toml::Table = toml::from_str(&content)?;
        let mut config = Self::from_overrides(overrides)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.name, "Wiki");
        assert_eq!(config.files.default_page, "README.md");
        assert_eq!(config.files.not_found_page, "404.md");
        assert_eq!(config.files.sidebar, "_sidebar.md");
        assert_eq!(config.markdown.parser, "gfm");
        assert_eq!(config.title.order, TitleOrder::PageFirst);
        assert_eq!(config.title.max_length, 80);
        assert!(!config.remote.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_overrides_equal_defaults() {
        let config = Config::from_toml_str("").unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_nested_override_keeps_sibling_defaults() {
        let config = Config::from_toml_str(
            r#"
[files]
default_page = "home.md"
"#,
        )
        .unwrap();

        assert_eq!(config.files.default_page, "home.md");
        assert_eq!(config.files.sidebar, "_sidebar.md");
        assert_eq!(config.files.not_found_page, "404.md");
    }

    #[test]
    fn test_plugin_list_is_replaced_not_merged() {
        let config = Config::from_toml_str(r#"plugins = ["external-links"]"#).unwrap();

        assert_eq!(config.plugins, vec!["external-links".to_owned()]);
    }

    #[test]
    fn test_empty_plugin_list_clears_defaults() {
        let config = Config::from_toml_str("plugins = []").unwrap();

        assert!(config.plugins.is_empty());
    }

    #[test]
    fn test_title_section_parses_enums() {
        let config = Config::from_toml_str(
            r#"
[title]
order = "wiki-first"
separator = " | "
source_priority = ["heading", "fallback"]
"#,
        )
        .unwrap();

        assert_eq!(config.title.order, TitleOrder::WikiFirst);
        assert_eq!(config.title.separator, " | ");
        assert_eq!(
            config.title.source_priority,
            vec![TitleSource::Heading, TitleSource::Fallback]
        );
        assert!(config.title.enabled);
    }

    #[test]
    fn test_parser_options_table() {
        let config = Config::from_toml_str(
            r#"
[markdown.parser_options]
smart_punctuation = true
"#,
        )
        .unwrap();

        assert_eq!(config.markdown.parser, "gfm");
        assert_eq!(
            config.markdown.parser_options.get("smart_punctuation"),
            Some(&toml::Value::Boolean(true))
        );
    }

    #[test]
    fn test_unknown_title_order_is_parse_error() {
        let result = Config::from_toml_str(
            r#"
[title]
order = "sideways"
"#,
        );

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let result = Config::from_toml_str("name = ");

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_empty_default_page_is_invalid() {
        let result = Config::from_toml_str(
            r#"
[files]
default_page = ""
"#,
        );

        let err = result.unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        assert!(err.to_string().contains("files.default_page"));
    }

    #[test]
    fn test_cors_proxy_requires_http_scheme() {
        let result = Config::from_toml_str(
            r#"
[remote]
enabled = true
cors_proxy_url = "ftp://proxy"
"#,
        );

        let err = result.unwrap_err();
        assert!(err.to_string().contains("remote.cors_proxy_url"));
    }

    #[test]
    fn test_selector_must_be_id() {
        let result = Config::from_toml_str(
            r#"
[selectors]
content = ".content"
"#,
        );

        let err = result.unwrap_err();
        assert!(err.to_string().contains("selectors.content"));
    }

    #[test]
    fn test_element_id() {
        assert_eq!(element_id("#content"), "content");
        assert_eq!(element_id("content"), "content");
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mw.toml");
        std::fs::write(&path, "name = \"Handbook\"\nbase_path = \"docs\"\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.name, "Handbook");
        assert_eq!(config.base_path, "docs");
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        let result = Config::load(Some(&path), None);

        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_apply_cli_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mw.toml");
        std::fs::write(&path, "base_path = \"docs\"\n").unwrap();
        let settings = CliSettings {
            base_path: Some("site".to_owned()),
            remote_enabled: Some(true),
            cors_proxy_url: Some("https://proxy.example.com/?".to_owned()),
        };

        let config = Config::load(Some(&path), Some(&settings)).unwrap();

        assert_eq!(config.base_path, "site");
        assert!(config.remote.enabled);
        assert_eq!(
            config.remote.cors_proxy_url.as_deref(),
            Some("https://proxy.example.com/?")
        );
    }

    #[test]
    fn test_cli_settings_are_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mw.toml");
        std::fs::write(&path, "").unwrap();
        let settings = CliSettings {
            cors_proxy_url: Some("proxy".to_owned()),
            ..Default::default()
        };

        let result = Config::load(Some(&path), Some(&settings));

        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
