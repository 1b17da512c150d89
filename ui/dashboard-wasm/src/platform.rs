//! Browser-backed implementations of the injected capability traits.

use async_trait::async_trait;
use gloo_storage::{LocalStorage, Storage};

use dv_contract_client::Runtime;
use dv_wallet_session::{PageReloader, ReconnectStore};

const RECONNECT_KEY: &str = "dv_wallet_connected";

/// Persists the reconnect flag in `localStorage`. The flag is the only
/// client-side persistence in the whole dashboard.
pub struct LocalReconnectStore;

impl ReconnectStore for LocalReconnectStore {
    fn was_connected(&self) -> bool {
        LocalStorage::get::<bool>(RECONNECT_KEY).unwrap_or(false)
    }

    fn set_connected(&self, connected: bool) {
        if connected {
            let _ = LocalStorage::set(RECONNECT_KEY, true);
        } else {
            LocalStorage::delete(RECONNECT_KEY);
        }
    }
}

/// Full page reload via `location.reload()`.
pub struct BrowserReloader;

impl PageReloader for BrowserReloader {
    fn reload(&self) {
        if let Some(window) = web_sys::window() {
            let _ = window.location().reload();
        }
    }
}

/// Timers and wall clock from the browser event loop. `SystemTime` is not
/// usable under wasm32, so time comes from `Date.now()`.
pub struct BrowserRuntime;

#[async_trait(?Send)]
impl Runtime for BrowserRuntime {
    async fn sleep_ms(&self, ms: u64) {
        gloo_timers::future::TimeoutFuture::new(ms as u32).await;
    }

    fn now_epoch_ms(&self) -> u128 {
        js_sys::Date::now() as u128
    }
}
