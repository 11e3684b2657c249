/// Enforcement points: the background navigation hook and the in-page check.
///
/// Both read `blockedSites` and `settings` fresh on every evaluation and
/// share one decision, [`evaluate_host`]. Neither retries: a failed read or
/// redirect is logged and the next navigation decides again.

use crate::blocklist::{BlockList, hostname_of, is_blocked};
use crate::settings::Settings;
use crate::storage::{BLOCKED_SITES_KEY, KeyValueStore, SETTINGS_KEY, read_record_or_default};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const BLOCKED_PAGE: &str = "blocked.html";
pub const DASHBOARD_PAGE: &str = "index.html";
pub const OPEN_DASHBOARD_ACTION: &str = "openDevFlow";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EnforcementError {
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("could not build block overlay: {0}")]
    Overlay(String),
}

/// Tab control available to the background process
#[async_trait(?Send)]
pub trait Navigator {
    /// Absolute URL of a page bundled with the extension
    fn extension_url(&self, path: &str) -> String;

    async fn redirect(&self, tab_id: i32, url: &str) -> Result<(), EnforcementError>;

    async fn open_tab(&self, url: &str) -> Result<(), EnforcementError>;
}

/// The page a content script runs in
pub trait PageHost {
    fn hostname(&self) -> Option<String>;

    fn overlay_present(&self) -> bool;

    /// Cover the page and lock scrolling
    fn show_overlay(&self) -> Result<(), EnforcementError>;
}

/// Message posted from a content script to the background process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeMessage {
    pub action: String,
}

impl RuntimeMessage {
    pub fn open_dashboard() -> Self {
        RuntimeMessage {
            action: OPEN_DASHBOARD_ACTION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// Not a web page, nothing to evaluate
    Skipped,
    Allowed,
    Redirected,
}

/// The single block decision for a hostname, from freshly read state
pub async fn evaluate_host<S>(store: &S, host: &str) -> bool
where
    S: KeyValueStore + ?Sized,
{
    let (blocked_sites, settings) = futures::join!(
        read_record_or_default::<S, BlockList>(store, BLOCKED_SITES_KEY),
        read_record_or_default::<S, Settings>(store, SETTINGS_KEY),
    );
    is_blocked(host, &blocked_sites.sites, &settings)
}

/// Background hook for a tab starting to load `url`
pub async fn handle_navigation<S, N>(
    store: &S,
    navigator: &N,
    tab_id: i32,
    url: &str,
) -> Result<NavigationOutcome, EnforcementError>
where
    S: KeyValueStore + ?Sized,
    N: Navigator + ?Sized,
{
    let Some(host) = hostname_of(url) else {
        return Ok(NavigationOutcome::Skipped);
    };

    if !evaluate_host(store, &host).await {
        return Ok(NavigationOutcome::Allowed);
    }

    log::info!("Blocking navigation to {} in tab {}", host, tab_id);
    let block_page = navigator.extension_url(BLOCKED_PAGE);
    navigator.redirect(tab_id, &block_page).await?;
    Ok(NavigationOutcome::Redirected)
}

/// Content-script check, run once per page load. Returns whether the
/// overlay was shown.
pub async fn check_page<S, P>(store: &S, page: &P) -> Result<bool, EnforcementError>
where
    S: KeyValueStore + ?Sized,
    P: PageHost + ?Sized,
{
    let Some(host) = page.hostname().filter(|h| !h.is_empty()) else {
        return Ok(false);
    };

    if !evaluate_host(store, &host.to_lowercase()).await {
        return Ok(false);
    }

    if page.overlay_present() {
        return Ok(true);
    }

    log::info!("Covering blocked page {}", host);
    page.show_overlay()?;
    Ok(true)
}

/// Background handler for messages from content scripts. Returns whether
/// the message was understood.
pub async fn handle_runtime_message<N>(navigator: &N, message: &RuntimeMessage) -> Result<bool, EnforcementError>
where
    N: Navigator + ?Sized,
{
    match message.action.as_str() {
        OPEN_DASHBOARD_ACTION => {
            let dashboard = navigator.extension_url(DASHBOARD_PAGE);
            navigator.open_tab(&dashboard).await?;
            Ok(true)
        }
        other => {
            log::warn!("Ignoring unknown runtime message action: {}", other);
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocklist::BlockedSite;
    use crate::storage::{MemoryStore, write_record};
    use futures::executor::block_on;
    use serde_json::json;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct FakeNavigator {
        redirects: RefCell<Vec<(i32, String)>>,
        opened: RefCell<Vec<String>>,
        fail: bool,
    }

    #[async_trait(?Send)]
    impl Navigator for FakeNavigator {
        fn extension_url(&self, path: &str) -> String {
            format!("chrome-extension://devflow/{}", path)
        }

        async fn redirect(&self, tab_id: i32, url: &str) -> Result<(), EnforcementError> {
            if self.fail {
                return Err(EnforcementError::Navigation("tab closed".to_string()));
            }
            self.redirects.borrow_mut().push((tab_id, url.to_string()));
            Ok(())
        }

        async fn open_tab(&self, url: &str) -> Result<(), EnforcementError> {
            self.opened.borrow_mut().push(url.to_string());
            Ok(())
        }
    }

    struct FakePage {
        hostname: Option<String>,
        overlays: Cell<usize>,
    }

    impl FakePage {
        fn at(hostname: &str) -> Self {
            FakePage {
                hostname: Some(hostname.to_string()),
                overlays: Cell::new(0),
            }
        }
    }

    impl PageHost for FakePage {
        fn hostname(&self) -> Option<String> {
            self.hostname.clone()
        }

        fn overlay_present(&self) -> bool {
            self.overlays.get() > 0
        }

        fn show_overlay(&self) -> Result<(), EnforcementError> {
            self.overlays.set(self.overlays.get() + 1);
            Ok(())
        }
    }

    fn store_blocking(urls: &[&str]) -> MemoryStore {
        let store = MemoryStore::new();
        let sites: Vec<BlockedSite> = urls
            .iter()
            .map(|url| BlockedSite { id: url.to_string(), url: url.to_string() })
            .collect();
        block_on(write_record(&store, BLOCKED_SITES_KEY, &sites)).unwrap();
        store
    }

    #[test]
    fn test_redirects_blocked_navigation() {
        let store = store_blocking(&["facebook.com"]);
        let navigator = FakeNavigator::default();

        let outcome = block_on(handle_navigation(&store, &navigator, 7, "https://www.facebook.com/feed")).unwrap();

        assert_eq!(outcome, NavigationOutcome::Redirected);
        assert_eq!(
            *navigator.redirects.borrow(),
            vec![(7, "chrome-extension://devflow/blocked.html".to_string())]
        );
    }

    #[test]
    fn test_allows_unlisted_navigation() {
        let store = store_blocking(&["facebook.com"]);
        let navigator = FakeNavigator::default();

        let outcome = block_on(handle_navigation(&store, &navigator, 1, "https://docs.rs/")).unwrap();

        assert_eq!(outcome, NavigationOutcome::Allowed);
        assert!(navigator.redirects.borrow().is_empty());
    }

    #[test]
    fn test_skips_browser_pages() {
        let store = store_blocking(&["extensions"]);
        let navigator = FakeNavigator::default();

        let outcome = block_on(handle_navigation(&store, &navigator, 1, "chrome://extensions")).unwrap();

        assert_eq!(outcome, NavigationOutcome::Skipped);
    }

    #[test]
    fn test_focus_disabled_allows_everything() {
        let store = store_blocking(&["facebook.com"]);
        store.insert(SETTINGS_KEY, json!({"enabledFeatures": {"focus": false}}));
        let navigator = FakeNavigator::default();

        let outcome = block_on(handle_navigation(&store, &navigator, 1, "https://facebook.com")).unwrap();

        assert_eq!(outcome, NavigationOutcome::Allowed);
    }

    #[test]
    fn test_missing_settings_means_focus_enabled() {
        let store = store_blocking(&["facebook.com"]);
        assert!(block_on(evaluate_host(&store, "facebook.com")));
    }

    #[test]
    fn test_reads_fresh_state_every_time() {
        let store = MemoryStore::new();
        let navigator = FakeNavigator::default();

        let before = block_on(handle_navigation(&store, &navigator, 1, "https://youtube.com")).unwrap();
        block_on(write_record(&store, BLOCKED_SITES_KEY, &vec![BlockedSite::new("youtube.com")])).unwrap();
        let after = block_on(handle_navigation(&store, &navigator, 1, "https://youtube.com")).unwrap();

        assert_eq!(before, NavigationOutcome::Allowed);
        assert_eq!(after, NavigationOutcome::Redirected);
    }

    #[test]
    fn test_malformed_blocklist_blocks_nothing() {
        let store = MemoryStore::new();
        store.insert(BLOCKED_SITES_KEY, json!({"not": "a list"}));

        assert!(!block_on(evaluate_host(&store, "facebook.com")));
    }

    #[test]
    fn test_one_bad_entry_keeps_the_rest_blocking() {
        let store = MemoryStore::new();
        store.insert(
            BLOCKED_SITES_KEY,
            json!([{"id": "1", "url": "facebook.com"}, {"id": 2, "url": "reddit.com"}, {"id": "3"}, 42]),
        );

        assert!(block_on(evaluate_host(&store, "facebook.com")));
        assert!(block_on(evaluate_host(&store, "old.reddit.com")));
        assert!(!block_on(evaluate_host(&store, "github.com")));
    }

    #[test]
    fn test_redirect_failure_is_reported() {
        let store = store_blocking(&["facebook.com"]);
        let navigator = FakeNavigator { fail: true, ..FakeNavigator::default() };

        let result = block_on(handle_navigation(&store, &navigator, 1, "https://facebook.com"));

        assert!(matches!(result, Err(EnforcementError::Navigation(_))));
    }

    #[test]
    fn test_page_check_shows_overlay_once() {
        let store = store_blocking(&["reddit.com"]);
        let page = FakePage::at("www.reddit.com");

        assert!(block_on(check_page(&store, &page)).unwrap());
        assert!(block_on(check_page(&store, &page)).unwrap());

        assert_eq!(page.overlays.get(), 1);
    }

    #[test]
    fn test_page_check_leaves_allowed_page_alone() {
        let store = store_blocking(&["reddit.com"]);
        let page = FakePage::at("github.com");

        assert!(!block_on(check_page(&store, &page)).unwrap());
        assert_eq!(page.overlays.get(), 0);
    }

    #[test]
    fn test_page_check_without_hostname() {
        let store = store_blocking(&["reddit.com"]);
        let page = FakePage { hostname: Some(String::new()), overlays: Cell::new(0) };

        assert!(!block_on(check_page(&store, &page)).unwrap());
    }

    #[test]
    fn test_both_enforcement_points_agree() {
        let store = store_blocking(&["example.com"]);
        let navigator = FakeNavigator::default();

        for host in ["example.com", "www.example.com", "mail.example.com", "example.org"] {
            let page = FakePage::at(host);
            let in_page = block_on(check_page(&store, &page)).unwrap();
            let background = block_on(handle_navigation(&store, &navigator, 1, &format!("https://{}/", host))).unwrap();
            assert_eq!(in_page, background == NavigationOutcome::Redirected, "{}", host);
        }
    }

    #[test]
    fn test_open_dashboard_message() {
        let navigator = FakeNavigator::default();

        let handled = block_on(handle_runtime_message(&navigator, &RuntimeMessage::open_dashboard())).unwrap();

        assert!(handled);
        assert_eq!(*navigator.opened.borrow(), vec!["chrome-extension://devflow/index.html".to_string()]);
    }

    #[test]
    fn test_unknown_message_is_ignored() {
        let navigator = FakeNavigator::default();
        let message = RuntimeMessage { action: "reload".to_string() };

        assert!(!block_on(handle_runtime_message(&navigator, &message)).unwrap());
        assert!(navigator.opened.borrow().is_empty());
    }

    #[test]
    fn test_runtime_message_shape() {
        let json = serde_json::to_value(RuntimeMessage::open_dashboard()).unwrap();
        assert_eq!(json, json!({"action": "openDevFlow"}));
    }
}
