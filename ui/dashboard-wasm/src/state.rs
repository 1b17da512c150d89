//! Global application state.
//!
//! Uses `RefCell`-wrapped `thread_local!` storage (WASM is single-threaded).
//! Holds the session manager and the contract client bound to the current
//! account/chain pair; the client is dropped whenever either changes.

use std::cell::RefCell;
use std::rc::Rc;

use dv_contract_client::ContractClient;
use dv_wallet_session::SessionManager;

#[derive(Default)]
pub struct AppState {
    pub manager: Option<Rc<SessionManager>>,
    pub client: Option<Rc<ContractClient>>,
}

thread_local! {
    static STATE: RefCell<AppState> = RefCell::new(AppState::default());
}

/// Run a closure with shared read access to the state.
pub fn with<F, R>(f: F) -> R
where
    F: FnOnce(&AppState) -> R,
{
    STATE.with(|s| f(&s.borrow()))
}

/// Run a closure with mutable access to the state.
pub fn with_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut AppState) -> R,
{
    STATE.with(|s| f(&mut s.borrow_mut()))
}

// ── Convenience accessors ──

pub fn manager() -> Option<Rc<SessionManager>> {
    with(|s| s.manager.clone())
}

pub fn set_manager(manager: Rc<SessionManager>) {
    with_mut(|s| s.manager = Some(manager));
}

pub fn client() -> Option<Rc<ContractClient>> {
    with(|s| s.client.clone())
}

pub fn set_client(client: Rc<ContractClient>) {
    with_mut(|s| s.client = Some(client));
}

/// Invalidate the bound client. Called on disconnect and on account change;
/// a stale binding must never serve another operation.
pub fn clear_client() {
    with_mut(|s| s.client = None);
}
