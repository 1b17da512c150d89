//! Bridge to the injected EIP-1193 wallet object (`window.ethereum`).
//!
//! Everything crosses the JS boundary here: requests go out as plain
//! `{ method, params }` objects, results come back as JSON, and wallet
//! notifications are forwarded to the session manager as typed events.

use std::rc::Rc;

use async_trait::async_trait;
use js_sys::{Function, Object, Promise, Reflect};
use serde_json::Value;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use dv_wallet_session::{ProviderError, WalletEvent, WalletProvider};

use crate::dom::Elements;
use crate::ops;
use crate::state;

pub struct EthereumBridge {
    provider: Option<Object>,
}

impl EthereumBridge {
    /// Probe `window.ethereum`. A bridge without a provider still satisfies
    /// the capability trait; it just reports unavailable.
    pub fn detect() -> Rc<Self> {
        let provider = web_sys::window()
            .and_then(|w| Reflect::get(&w, &JsValue::from_str("ethereum")).ok())
            .filter(|v| v.is_object())
            .map(|v| v.unchecked_into::<Object>());
        Rc::new(Self { provider })
    }

    fn raw(&self) -> Option<&Object> {
        self.provider.as_ref()
    }
}

#[async_trait(?Send)]
impl WalletProvider for EthereumBridge {
    fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let Some(provider) = self.raw() else {
            return Err(ProviderError::Transport("no injected wallet".into()));
        };

        let args = Object::new();
        Reflect::set(&args, &"method".into(), &method.into())
            .map_err(|_| ProviderError::Transport("cannot build request object".into()))?;
        let params_js = js_sys::JSON::parse(&params.to_string())
            .map_err(|_| ProviderError::Transport("unserializable params".into()))?;
        Reflect::set(&args, &"params".into(), &params_js)
            .map_err(|_| ProviderError::Transport("cannot build request object".into()))?;

        let request_fn: Function = Reflect::get(provider, &"request".into())
            .ok()
            .and_then(|f| f.dyn_into().ok())
            .ok_or_else(|| ProviderError::Transport("wallet has no request method".into()))?;
        let promise: Promise = request_fn
            .call1(provider, &args)
            .map_err(wallet_error)?
            .dyn_into()
            .map_err(|_| ProviderError::Transport("wallet request is not a promise".into()))?;

        match JsFuture::from(promise).await {
            Ok(value) => {
                if value.is_null() || value.is_undefined() {
                    return Ok(Value::Null);
                }
                let text: String = js_sys::JSON::stringify(&value)
                    .map(String::from)
                    .map_err(|_| ProviderError::Transport("unserializable wallet result".into()))?;
                serde_json::from_str(&text)
                    .map_err(|err| ProviderError::Transport(format!("bad wallet result: {err}")))
            }
            Err(err) => Err(wallet_error(err)),
        }
    }
}

/// Map a thrown JS error onto the provider taxonomy using its EIP-1193
/// `code` and `message` fields when present.
fn wallet_error(err: JsValue) -> ProviderError {
    let code = Reflect::get(&err, &"code".into())
        .ok()
        .and_then(|v| v.as_f64())
        .map(|c| c as i64);
    let message = Reflect::get(&err, &"message".into())
        .ok()
        .and_then(|v| v.as_string())
        .unwrap_or_else(|| "wallet request failed".to_string());
    match code {
        Some(code) => ProviderError::from_code(code, message),
        None => ProviderError::Transport(message),
    }
}

/// Subscribe to `accountsChanged` / `chainChanged` and forward them to the
/// session manager. Call once after init.
pub fn bind_wallet_events(els: &Elements, bridge: &EthereumBridge) {
    let Some(provider) = bridge.raw() else {
        return;
    };
    let Some(on) = Reflect::get(provider, &"on".into())
        .ok()
        .and_then(|f| f.dyn_into::<Function>().ok())
    else {
        gloo_console::warn!("wallet does not expose an event emitter");
        return;
    };

    {
        let els = els.clone();
        let cb = Closure::wrap(Box::new(move |accounts: JsValue| {
            let accounts = js_sys::Array::from(&accounts)
                .iter()
                .filter_map(|v| v.as_string())
                .filter_map(|s| s.parse().ok())
                .collect();
            if let Some(manager) = state::manager() {
                manager.handle_event(WalletEvent::AccountsChanged(accounts));
            }
            // The bound client belongs to the old account.
            state::clear_client();
            if let Some(session) = state::manager().map(|m| m.session()) {
                if session.is_connected() {
                    ops::rebind_client(&session);
                }
            }
            ops::render_session(&els);
        }) as Box<dyn FnMut(JsValue)>);
        let _ = on.call2(provider, &"accountsChanged".into(), cb.as_ref().unchecked_ref());
        cb.forget();
    }

    {
        let cb = Closure::wrap(Box::new(move |chain: JsValue| {
            let Some(hex) = chain.as_string() else {
                return;
            };
            // The manager reloads the page; nothing to re-render here.
            if let Some(manager) = state::manager() {
                manager.handle_event(WalletEvent::ChainChanged(hex));
            }
        }) as Box<dyn FnMut(JsValue)>);
        let _ = on.call2(provider, &"chainChanged".into(), cb.as_ref().unchecked_ref());
        cb.forget();
    }
}
