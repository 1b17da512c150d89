//! DiplomaVault dashboard WASM frontend.
//!
//! Browser shell over the wallet-session and contract-client crates: detects
//! the injected wallet, restores a previous session silently, and wires the
//! role panels (student / school / company) to on-chain operations.

pub mod dom;
pub mod ethereum;
pub mod events;
pub mod ops;
pub mod platform;
pub mod state;

use std::rc::Rc;

use dv_wallet_session::SessionManager;
use wasm_bindgen::prelude::*;

/// WASM entry point, called when the module is instantiated.
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    // Improve panic messages in the browser console
    console_error_panic_hook::set_once();

    init().await
}

/// Main initialisation sequence.
async fn init() -> Result<(), JsValue> {
    let els = dom::Elements::bind()?;

    let bridge = ethereum::EthereumBridge::detect();
    let manager = Rc::new(SessionManager::new(
        bridge.clone(),
        Rc::new(platform::LocalReconnectStore),
        Rc::new(platform::BrowserReloader),
    ));
    state::set_manager(manager.clone());

    dom::populate_network_select(&els.network_select);

    // Silent reconnect: never prompts, only restores a prior session.
    if let Some(session) = manager.try_reconnect().await {
        ops::rebind_client(&session);
        gloo_console::log!("session restored");
    }
    ops::render_session(&els);

    events::bind_events(&els);
    ethereum::bind_wallet_events(&els, &bridge);

    Ok(())
}
