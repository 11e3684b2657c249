/// wasm-bindgen bridge to the extension APIs in extension.js

use crate::enforcement::{EnforcementError, Navigator, RuntimeMessage};
use crate::storage::{KeyValueStore, StorageError};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;

// Import JS bridge functions
#[wasm_bindgen(module = "/extension.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn getStorage(key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setStorage(key: &str, value: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn updateTabUrl(tab_id: i32, url: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn openTab(url: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    fn sendRuntimeMessage(message: JsValue) -> Result<(), JsValue>;

    fn extensionUrl(path: &str) -> String;
}

/// chrome.storage.local
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeStore;

#[async_trait(?Send)]
impl KeyValueStore for ChromeStore {
    async fn read(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let value_js = getStorage(key)
            .await
            .map_err(|e| StorageError::Bridge(format!("Failed to get {}: {:?}", key, e)))?;

        if value_js.is_null() || value_js.is_undefined() {
            return Ok(None);
        }

        serde_wasm_bindgen::from_value(value_js)
            .map(Some)
            .map_err(|e| StorageError::Deserialize {
                key: key.to_string(),
                message: e.to_string(),
            })
    }

    async fn write(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let value_js = to_js(&value).map_err(|e| StorageError::Serialize {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        setStorage(key, value_js)
            .await
            .map_err(|e| StorageError::Bridge(format!("Failed to set {}: {:?}", key, e)))
    }
}

/// chrome.tabs, used by the background service worker
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeTabs;

#[async_trait(?Send)]
impl Navigator for ChromeTabs {
    fn extension_url(&self, path: &str) -> String {
        extensionUrl(path)
    }

    async fn redirect(&self, tab_id: i32, url: &str) -> Result<(), EnforcementError> {
        updateTabUrl(tab_id, url)
            .await
            .map_err(|e| EnforcementError::Navigation(format!("Failed to redirect tab {}: {:?}", tab_id, e)))
    }

    async fn open_tab(&self, url: &str) -> Result<(), EnforcementError> {
        openTab(url)
            .await
            .map_err(|e| EnforcementError::Navigation(format!("Failed to open {}: {:?}", url, e)))
    }
}

/// Ask the background process to open the dashboard
pub fn request_open_dashboard() {
    let sent = to_js(&RuntimeMessage::open_dashboard())
        .map_err(|e| format!("{:?}", e))
        .and_then(|message| sendRuntimeMessage(message).map_err(|e| format!("{:?}", e)));

    if let Err(e) = sent {
        log::error!("Failed to request dashboard: {}", e);
    }
}

/// Plain JS objects rather than `Map`s, so chrome.storage can persist them
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, serde_wasm_bindgen::Error> {
    value.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
}
