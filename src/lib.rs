/// DevFlow Focus - Pomodoro timer and site blocker for the DevFlow dashboard
/// Built with Rust + WASM + Yew

pub mod blocklist;
pub mod chrome;
pub mod enforcement;
pub mod notify;
pub mod settings;
pub mod storage;
pub mod timer;
pub mod ui;

use chrome::{ChromeStore, ChromeTabs};
use enforcement::{NavigationOutcome, RuntimeMessage};
use ui::overlay::DomPage;
use wasm_bindgen::prelude::*;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Re-export timer formatting for the block page
#[wasm_bindgen]
pub fn format_time(seconds: u32) -> String {
    timer::format_time(seconds)
}

// Start the Yew app for the focus dashboard
#[wasm_bindgen]
pub fn start_dashboard() {
    yew::Renderer::<ui::focus::FocusMode>::new().render();
}

/// Background hook for `chrome.tabs.onUpdated` with status `loading`.
/// Resolves to whether the tab was sent to the block page.
#[wasm_bindgen]
pub async fn on_navigation(tab_id: i32, url: String) -> bool {
    match enforcement::handle_navigation(&ChromeStore, &ChromeTabs, tab_id, &url).await {
        Ok(outcome) => outcome == NavigationOutcome::Redirected,
        Err(e) => {
            log::error!("Navigation check failed for tab {}: {}", tab_id, e);
            false
        }
    }
}

/// Background hook for `chrome.runtime.onMessage`
#[wasm_bindgen]
pub async fn on_runtime_message(message: JsValue) -> bool {
    let message: RuntimeMessage = match serde_wasm_bindgen::from_value(message) {
        Ok(message) => message,
        Err(e) => {
            log::warn!("Ignoring malformed runtime message: {}", e);
            return false;
        }
    };

    enforcement::handle_runtime_message(&ChromeTabs, &message)
        .await
        .unwrap_or_else(|e| {
            log::error!("Failed to handle {}: {}", message.action, e);
            false
        })
}

/// Content-script entry, run once per page load
#[wasm_bindgen]
pub async fn run_content_script() -> bool {
    let Some(page) = DomPage::current() else {
        return false;
    };

    enforcement::check_page(&ChromeStore, &page)
        .await
        .unwrap_or_else(|e| {
            log::error!("Page check failed: {}", e);
            false
        })
}
