//! End-to-end behavior of the application through `App`.

use std::sync::{Arc, Mutex};

use mw_config::{Config, TitleOrder};
use mw_fetch::MockFetcher;
use mw_site::{
    App, ContentElement, Hook, HookEvent, PageOutcome, PageState, Plugin, PluginContext,
    PluginError, PluginManager, PluginRegistry, Router, encode_remote_path, remote_url,
};
use pretty_assertions::assert_eq;

type Log = Arc<Mutex<Vec<String>>>;

/// Records its hook calls; optionally fails or panics in one of them.
struct Tracked {
    name: &'static str,
    log: Log,
    fail_init: bool,
    panic_on_page_load: bool,
}

impl Tracked {
    fn new(name: &'static str, log: &Log) -> Self {
        Self {
            name,
            log: Arc::clone(log),
            fail_init: false,
            panic_on_page_load: false,
        }
    }

    fn record(&self, hook: Hook) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{hook}", self.name));
    }
}

impl Plugin for Tracked {
    fn name(&self) -> &str {
        self.name
    }

    fn registered_hooks(&self) -> Vec<Hook> {
        vec![Hook::Init, Hook::PageLoad, Hook::Destroy]
    }

    fn on_init(&mut self, ctx: &PluginContext<'_>) -> Result<(), PluginError> {
        assert!(ctx.router().is_some());
        self.record(Hook::Init);
        if self.fail_init {
            return Err(PluginError::failed("init refused"));
        }
        Ok(())
    }

    fn on_page_load(&mut self, _content: &mut ContentElement) -> Result<(), PluginError> {
        self.record(Hook::PageLoad);
        if self.panic_on_page_load {
            panic!("page load exploded");
        }
        Ok(())
    }

    fn on_destroy(&mut self) -> Result<(), PluginError> {
        self.record(Hook::Destroy);
        Ok(())
    }
}

fn tracked_registry(log: &Log) -> PluginRegistry {
    let (first, broken, panicky, last) = (
        Arc::clone(log),
        Arc::clone(log),
        Arc::clone(log),
        Arc::clone(log),
    );
    PluginRegistry::default()
        .with_plugin("first", move || Box::new(Tracked::new("first", &first)))
        .with_plugin("broken", move || {
            Box::new(Tracked {
                fail_init: true,
                ..Tracked::new("broken", &broken)
            })
        })
        .with_plugin("panicky", move || {
            Box::new(Tracked {
                panic_on_page_load: true,
                ..Tracked::new("panicky", &panicky)
            })
        })
        .with_plugin("last", move || Box::new(Tracked::new("last", &last)))
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[test]
fn test_failing_plugin_does_not_block_others() {
    let log = Log::default();
    let mut config = Config::default();
    config.plugins = ["first", "broken", "missing", "panicky", "last"]
        .map(str::to_owned)
        .to_vec();
    let fetcher = MockFetcher::new().with_document("README.md", "# Home");
    let mut app = App::new(config, Arc::new(fetcher)).with_plugin_registry(tracked_registry(&log));

    let report = app.start("").unwrap();

    assert_eq!(report.plugins.loaded().collect::<Vec<_>>(), vec!["first", "panicky", "last"]);
    assert_eq!(
        report.plugins.failed().map(|(name, _)| name).collect::<Vec<_>>(),
        vec!["broken", "missing"]
    );
    assert_eq!(report.outcome, PageOutcome::Rendered);
    assert_eq!(
        entries(&log),
        vec![
            "first:on_init",
            "broken:on_init",
            "panicky:on_init",
            "last:on_init",
            "first:on_page_load",
            "panicky:on_page_load",
            "last:on_page_load",
        ]
    );
}

#[test]
fn test_shutdown_delivers_destroy_in_order() {
    let log = Log::default();
    let mut config = Config::default();
    config.plugins = vec!["last".to_owned(), "first".to_owned()];
    let fetcher = MockFetcher::new().with_document("README.md", "# Home");
    let mut app = App::new(config, Arc::new(fetcher)).with_plugin_registry(tracked_registry(&log));
    app.start("").unwrap();

    let report = app.shutdown();

    assert_eq!(report.delivered, 2);
    let log = entries(&log);
    assert_eq!(&log[log.len() - 2..], ["last:on_destroy", "first:on_destroy"]);
}

#[test]
fn test_router_file_mapping() {
    let mut config = Config::default();
    config.files.default_page = "home.md".to_owned();
    let router = Router::new(&config);

    assert_eq!(router.get_file_path("/"), "home.md");
    assert_eq!(router.get_file_path("/guide"), "guide.md");
    assert_eq!(router.get_file_path("/docs/api/v2"), "docs/api/v2.md");
    assert_eq!(router.get_file_path("/remote/%%%"), "home.md");
}

#[test]
fn test_remote_path_round_trip() {
    let router = Router::new(&Config::default());

    for url in [
        "https://example.com/a.md",
        "https://例え.jp/ドキュメント/スタート.md",
        "http://example.com/a b/ü?x=1&y=ä",
    ] {
        let path = encode_remote_path(url);
        assert_eq!(router.get_file_path(&path), url);
        assert_eq!(remote_url(&path).as_deref(), Some(url));
    }
}

#[test]
fn test_notify_twice_is_idempotent() {
    let mut plugins = PluginManager::new(PluginRegistry::default());
    let config = Config::default();
    let report = plugins.load_plugins(
        &["heading-anchors".to_owned(), "external-links".to_owned()],
        &PluginContext::new(&config),
    );
    assert!(report.is_clean());
    let mut content =
        ContentElement::from_html("<h1>Title</h1><p><a href=\"https://x.org\">x</a></p>");

    plugins.notify(HookEvent::PageLoad(&mut content));
    let once = content.html().to_owned();
    plugins.notify(HookEvent::PageLoad(&mut content));

    assert_eq!(content.html(), once);
    assert_eq!(content.html().matches("class=\"heading-anchor\"").count(), 1);
    assert_eq!(content.html().matches("target=\"_blank\"").count(), 1);
}

#[test]
fn test_title_wiki_first() {
    let mut config = Config::default();
    config.name = "X".to_owned();
    config.title.order = TitleOrder::WikiFirst;
    config.title.separator = " | ".to_owned();
    let fetcher = MockFetcher::new().with_document("README.md", "# Y");
    let mut app = App::new(config, Arc::new(fetcher));

    app.start("#/").unwrap();

    assert_eq!(app.shell().title(), "X | Y");
}

#[test]
fn test_title_page_only() {
    let mut config = Config::default();
    config.name = "X".to_owned();
    config.title.order = TitleOrder::PageOnly;
    config.title.separator = " | ".to_owned();
    let fetcher = MockFetcher::new().with_document("README.md", "# Y");
    let mut app = App::new(config, Arc::new(fetcher));

    app.start("").unwrap();

    assert_eq!(app.shell().title(), "Y");
}

#[test]
fn test_sidebar_title_wins_over_heading() {
    let fetcher = MockFetcher::new()
        .with_document("_sidebar.md", "- [Guide](guide.md \"The Guide\")")
        .with_document("guide.md", "# Heading");
    let mut app = App::new(Config::default(), Arc::new(fetcher));

    app.start("#/guide").unwrap();

    assert_eq!(app.shell().title(), "The Guide - Wiki");
    assert_eq!(app.current_page().unwrap().title, "The Guide");
}

#[test]
fn test_guide_title_falls_through_to_heading() {
    let fetcher = MockFetcher::new()
        .with_document("_sidebar.md", "- [Home](README.md)")
        .with_document("guide.md", "# Getting Started\n\nText.");
    let mut app = App::new(Config::default(), Arc::new(fetcher));

    let report = app.start("#/guide").unwrap();

    assert_eq!(report.outcome, PageOutcome::Rendered);
    assert_eq!(app.shell().title(), "Getting Started - Wiki");
}

#[test]
fn test_not_found_document_rendered_for_404() {
    let fetcher = MockFetcher::new()
        .with_document("README.md", "# Home")
        .with_document("404.md", "# Lost");
    let mut app = App::new(Config::default(), Arc::new(fetcher));
    app.start("").unwrap();

    let outcome = app.navigate("#/nowhere");

    assert_eq!(outcome, Some(PageOutcome::RenderedNotFound));
    assert_eq!(app.shell().state(), PageState::NotFound);
    assert!(app.shell().content().html().contains("Lost"));
    assert!(!app.shell().content().html().contains("class=\"error\""));
}

#[test]
fn test_generic_error_when_not_found_document_missing() {
    let fetcher = MockFetcher::new().with_document("README.md", "# Home");
    let mut app = App::new(Config::default(), Arc::new(fetcher));
    app.start("").unwrap();

    let outcome = app.navigate("#/nowhere");

    assert_eq!(outcome, Some(PageOutcome::Error));
    assert!(app.shell().content().html().contains("class=\"error\""));

    // Later navigations are unaffected.
    assert_eq!(app.navigate("#/"), Some(PageOutcome::Rendered));
}

#[test]
fn test_remote_document_links_rewritten() {
    let mut config = Config::default();
    config.remote.enabled = true;
    config.plugins.clear();
    let fetcher = MockFetcher::new().with_document(
        "https://example.com/dir/doc.md",
        "# Remote\n\n[a](b.md)\n\n![alt](img.png)",
    );
    let mut app = App::new(config, Arc::new(fetcher));

    let path = encode_remote_path("https://example.com/dir/doc.md");
    let report = app.start(&format!("#{path}")).unwrap();

    assert_eq!(report.outcome, PageOutcome::Rendered);
    let markdown = &app.current_page().unwrap().markdown;
    assert!(markdown.contains(&format!(
        "[a](#{})",
        encode_remote_path("https://example.com/dir/b.md")
    )));
    assert!(markdown.contains("![alt](https://example.com/dir/img.png)"));
}

#[test]
fn test_anchor_scrolls_after_plugins_assign_ids() {
    let fetcher = MockFetcher::new().with_document("guide.md", "# Guide\n\n## Install Steps");
    let mut app = App::new(Config::default(), Arc::new(fetcher));

    app.start("#/guide#install-steps").unwrap();

    assert_eq!(app.shell().scroll_target(), Some("install-steps"));
    assert!(app.shell().to_html().contains("data-scroll-to=\"install-steps\""));
}
