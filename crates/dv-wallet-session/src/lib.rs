//! Wallet connectivity manager.
//!
//! Owns the lifecycle of the injected browser-wallet connection: capability
//! probe, connect/disconnect, active network tracking, network switching and
//! silent reconnection after a page reload. The wallet itself is an injected
//! [`WalletProvider`] capability, never an ambient global, so the manager is
//! testable against a fake implementation.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use alloy_primitives::Address;
use async_trait::async_trait;
use dv_network_config::{NetworkDescriptor, from_hex_chain_id};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, warn};

// EIP-1193 error codes surfaced by wallets.
const CODE_USER_REJECTED: i64 = 4001;
const CODE_UNKNOWN_CHAIN: i64 = 4902;

/// Error reported by a [`WalletProvider`] implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("user rejected the wallet request")]
    UserRejected,
    #[error("chain is not known to the wallet")]
    UnknownChain,
    #[error("wallet error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("wallet transport error: {0}")]
    Transport(String),
}

impl ProviderError {
    /// Map a raw EIP-1193 error code onto the taxonomy.
    pub fn from_code(code: i64, message: impl Into<String>) -> Self {
        match code {
            CODE_USER_REJECTED => Self::UserRejected,
            CODE_UNKNOWN_CHAIN => Self::UnknownChain,
            _ => Self::Rpc {
                code,
                message: message.into(),
            },
        }
    }
}

/// Injected wallet capability, shaped after the EIP-1193 `request` surface.
///
/// `?Send` because browser-injected objects are single-threaded; all state
/// here lives on one cooperative event loop.
#[async_trait(?Send)]
pub trait WalletProvider {
    /// Synchronous capability probe; no side effects.
    fn is_available(&self) -> bool;

    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;
}

/// Persists the single "was previously connected" boolean that gates
/// silent reconnection on load. Nothing else is persisted client-side.
pub trait ReconnectStore {
    fn was_connected(&self) -> bool;
    fn set_connected(&self, connected: bool);
}

#[derive(Default)]
pub struct InMemoryReconnectStore {
    flag: Cell<bool>,
}

impl ReconnectStore for InMemoryReconnectStore {
    fn was_connected(&self) -> bool {
        self.flag.get()
    }

    fn set_connected(&self, connected: bool) {
        self.flag.set(connected);
    }
}

/// Full-application reload, triggered on chain change so stale contract
/// bindings from the old network never survive into the new one.
pub trait PageReloader {
    fn reload(&self);
}

#[derive(Default)]
pub struct NoopReloader;

impl PageReloader for NoopReloader {
    fn reload(&self) {}
}

// ── Session ──

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Single source of truth for account/network state. Mutated only by the
/// [`SessionManager`]; everything else reads snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    pub account: Option<Address>,
    pub chain_id: Option<u64>,
    pub state: ConnectionState,
}

impl Session {
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}

/// Inbound wallet notification. Each event is one atomic transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no wallet extension detected")]
    WalletUnavailable,
    #[error("connection rejected by the user")]
    UserRejected,
    #[error("wallet reported no authorized accounts")]
    NoAccounts,
    #[error("wallet error {code}: {message}")]
    Wallet { code: i64, message: String },
    #[error("wallet transport error: {0}")]
    Transport(String),
}

impl From<ProviderError> for SessionError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::UserRejected => Self::UserRejected,
            ProviderError::UnknownChain => Self::Wallet {
                code: CODE_UNKNOWN_CHAIN,
                message: "chain is not known to the wallet".to_owned(),
            },
            ProviderError::Rpc { code, message } => Self::Wallet { code, message },
            ProviderError::Transport(message) => Self::Transport(message),
        }
    }
}

// ── Manager ──

pub struct SessionManager {
    provider: Rc<dyn WalletProvider>,
    store: Rc<dyn ReconnectStore>,
    reloader: Rc<dyn PageReloader>,
    session: RefCell<Session>,
}

impl SessionManager {
    pub fn new(
        provider: Rc<dyn WalletProvider>,
        store: Rc<dyn ReconnectStore>,
        reloader: Rc<dyn PageReloader>,
    ) -> Self {
        Self {
            provider,
            store,
            reloader,
            session: RefCell::new(Session::default()),
        }
    }

    pub fn provider(&self) -> Rc<dyn WalletProvider> {
        self.provider.clone()
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Session {
        *self.session.borrow()
    }

    pub fn is_wallet_available(&self) -> bool {
        self.provider.is_available()
    }

    /// Request account access from the wallet. On success the session holds
    /// the active account and chain and the reconnect flag is persisted.
    pub async fn connect(&self) -> Result<Session, SessionError> {
        if !self.provider.is_available() {
            return Err(SessionError::WalletUnavailable);
        }

        self.session.borrow_mut().state = ConnectionState::Connecting;

        let accounts = match self.provider.request("eth_requestAccounts", json!([])).await {
            Ok(value) => parse_accounts(&value)?,
            Err(err) => {
                *self.session.borrow_mut() = Session::default();
                return Err(err.into());
            }
        };

        let Some(account) = accounts.first().copied() else {
            *self.session.borrow_mut() = Session::default();
            return Err(SessionError::NoAccounts);
        };

        let chain_id = match self.query_chain_id().await {
            Ok(chain_id) => chain_id,
            Err(err) => {
                *self.session.borrow_mut() = Session::default();
                return Err(err);
            }
        };
        let session = Session {
            account: Some(account),
            chain_id: Some(chain_id),
            state: ConnectionState::Connected,
        };
        *self.session.borrow_mut() = session;
        self.store.set_connected(true);
        debug!(account = %account, chain_id, "wallet connected");
        Ok(session)
    }

    /// Reset to the disconnected default and clear the reconnect flag.
    /// Purely local: wallets cannot be force-disconnected programmatically.
    pub fn disconnect(&self) {
        *self.session.borrow_mut() = Session::default();
        self.store.set_connected(false);
    }

    /// Ask the wallet to switch the active chain. A chain the wallet does
    /// not know is registered from the descriptor and the switch retried
    /// exactly once; any further failure is surfaced, never looped.
    pub async fn switch_network(&self, target: &NetworkDescriptor) -> Result<(), SessionError> {
        let switch_params = json!([{ "chainId": target.chain_id_hex() }]);

        match self
            .provider
            .request("wallet_switchEthereumChain", switch_params.clone())
            .await
        {
            Ok(_) => Ok(()),
            Err(ProviderError::UnknownChain) => {
                self.provider
                    .request("wallet_addEthereumChain", json!([target.add_chain_params()]))
                    .await?;
                self.provider
                    .request("wallet_switchEthereumChain", switch_params)
                    .await?;
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Single entry point for wallet notifications.
    pub fn handle_event(&self, event: WalletEvent) {
        match event {
            WalletEvent::AccountsChanged(accounts) => match accounts.first() {
                None => self.disconnect(),
                Some(account) => {
                    let mut session = self.session.borrow_mut();
                    if session.is_connected() && session.account != Some(*account) {
                        session.account = Some(*account);
                    }
                }
            },
            WalletEvent::ChainChanged(hex) => {
                match from_hex_chain_id(&hex) {
                    Some(chain_id) => {
                        let mut session = self.session.borrow_mut();
                        if session.is_connected() {
                            session.chain_id = Some(chain_id);
                        }
                    }
                    None => warn!(chain = %hex, "unparseable chain id in chainChanged"),
                }
                // Contract bindings for the old chain must not be reused.
                self.reloader.reload();
            }
        }
    }

    /// Silent reconnection on load. Only runs when a prior session was
    /// persisted and the wallet still reports an authorized account via
    /// the non-prompting `eth_accounts` call; never prompts the user.
    /// Best-effort: failures are logged and leave the session untouched.
    pub async fn try_reconnect(&self) -> Option<Session> {
        if !self.store.was_connected() || !self.provider.is_available() {
            return None;
        }

        let accounts = match self.provider.request("eth_accounts", json!([])).await {
            Ok(value) => parse_accounts(&value).ok()?,
            Err(err) => {
                warn!(error = %err, "silent reconnect failed");
                return None;
            }
        };
        let account = accounts.first().copied()?;

        let chain_id = match self.query_chain_id().await {
            Ok(chain_id) => chain_id,
            Err(err) => {
                warn!(error = %err, "silent reconnect failed");
                return None;
            }
        };

        let session = Session {
            account: Some(account),
            chain_id: Some(chain_id),
            state: ConnectionState::Connected,
        };
        *self.session.borrow_mut() = session;
        self.store.set_connected(true);
        Some(session)
    }

    async fn query_chain_id(&self) -> Result<u64, SessionError> {
        let value = self.provider.request("eth_chainId", json!([])).await?;
        let hex = value
            .as_str()
            .ok_or_else(|| SessionError::Transport("eth_chainId returned a non-string".into()))?;
        from_hex_chain_id(hex)
            .ok_or_else(|| SessionError::Transport(format!("unparseable chain id: {hex}")))
    }
}

fn parse_accounts(value: &Value) -> Result<Vec<Address>, SessionError> {
    let entries = value
        .as_array()
        .ok_or_else(|| SessionError::Transport("accounts response is not an array".into()))?;
    entries
        .iter()
        .map(|entry| {
            entry
                .as_str()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| SessionError::Transport(format!("malformed account: {entry}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dv_network_config::{BLAZE_CHAIN_ID, network_for};
    use std::collections::{HashMap, VecDeque};

    const ACCOUNT_A: &str = "0x00000000000000000000000000000000000000aa";
    const ACCOUNT_B: &str = "0x00000000000000000000000000000000000000bb";

    struct FakeWallet {
        available: bool,
        calls: RefCell<Vec<String>>,
        responses: RefCell<HashMap<String, VecDeque<Result<Value, ProviderError>>>>,
    }

    impl FakeWallet {
        fn new() -> Self {
            Self {
                available: true,
                calls: RefCell::new(Vec::new()),
                responses: RefCell::new(HashMap::new()),
            }
        }

        fn unavailable() -> Self {
            Self {
                available: false,
                ..Self::new()
            }
        }

        fn respond(&self, method: &str, result: Result<Value, ProviderError>) {
            self.responses
                .borrow_mut()
                .entry(method.to_owned())
                .or_default()
                .push_back(result);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    #[async_trait(?Send)]
    impl WalletProvider for FakeWallet {
        fn is_available(&self) -> bool {
            self.available
        }

        async fn request(&self, method: &str, _params: Value) -> Result<Value, ProviderError> {
            self.calls.borrow_mut().push(method.to_owned());
            self.responses
                .borrow_mut()
                .get_mut(method)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| {
                    Err(ProviderError::Transport(format!("no scripted response for {method}")))
                })
        }
    }

    struct RecordingReloader {
        reloads: Cell<u32>,
    }

    impl PageReloader for RecordingReloader {
        fn reload(&self) {
            self.reloads.set(self.reloads.get() + 1);
        }
    }

    struct Harness {
        wallet: Rc<FakeWallet>,
        store: Rc<InMemoryReconnectStore>,
        reloader: Rc<RecordingReloader>,
        manager: SessionManager,
    }

    fn harness(wallet: FakeWallet) -> Harness {
        let wallet = Rc::new(wallet);
        let store = Rc::new(InMemoryReconnectStore::default());
        let reloader = Rc::new(RecordingReloader {
            reloads: Cell::new(0),
        });
        let manager = SessionManager::new(wallet.clone(), store.clone(), reloader.clone());
        Harness {
            wallet,
            store,
            reloader,
            manager,
        }
    }

    fn script_connect(wallet: &FakeWallet, account: &str, chain_hex: &str) {
        wallet.respond("eth_requestAccounts", Ok(json!([account])));
        wallet.respond("eth_chainId", Ok(json!(chain_hex)));
    }

    #[tokio::test]
    async fn connect_populates_session_and_persists_flag() {
        let h = harness(FakeWallet::new());
        script_connect(&h.wallet, ACCOUNT_A, "0xdede");

        let session = h.manager.connect().await.unwrap();

        assert_eq!(session.state, ConnectionState::Connected);
        assert_eq!(session.account, Some(ACCOUNT_A.parse().unwrap()));
        assert_eq!(session.chain_id, Some(BLAZE_CHAIN_ID));
        assert!(h.store.was_connected());
    }

    #[tokio::test]
    async fn connect_without_wallet_fails_fast() {
        let h = harness(FakeWallet::unavailable());

        let err = h.manager.connect().await.unwrap_err();

        assert_eq!(err, SessionError::WalletUnavailable);
        assert!(h.wallet.calls().is_empty());
    }

    #[tokio::test]
    async fn connect_rejection_leaves_disconnected() {
        let h = harness(FakeWallet::new());
        h.wallet
            .respond("eth_requestAccounts", Err(ProviderError::UserRejected));

        let err = h.manager.connect().await.unwrap_err();

        assert_eq!(err, SessionError::UserRejected);
        assert_eq!(h.manager.session(), Session::default());
        assert!(!h.store.was_connected());
    }

    #[tokio::test]
    async fn connect_chain_query_failure_leaves_disconnected() {
        let h = harness(FakeWallet::new());
        h.wallet
            .respond("eth_requestAccounts", Ok(json!([ACCOUNT_A])));
        h.wallet.respond(
            "eth_chainId",
            Err(ProviderError::Transport("rpc unreachable".to_owned())),
        );

        let err = h.manager.connect().await.unwrap_err();

        assert!(matches!(err, SessionError::Transport(_)));
        assert_eq!(h.manager.session(), Session::default());
        assert!(!h.store.was_connected());
    }

    #[tokio::test]
    async fn connect_with_zero_accounts_never_reports_connected() {
        let h = harness(FakeWallet::new());
        h.wallet.respond("eth_requestAccounts", Ok(json!([])));

        let err = h.manager.connect().await.unwrap_err();

        assert_eq!(err, SessionError::NoAccounts);
        assert_eq!(h.manager.session(), Session::default());
    }

    #[tokio::test]
    async fn disconnect_resets_session_and_flag() {
        let h = harness(FakeWallet::new());
        script_connect(&h.wallet, ACCOUNT_A, "0xdede");
        h.manager.connect().await.unwrap();

        h.manager.disconnect();

        assert_eq!(h.manager.session(), Session::default());
        assert!(!h.store.was_connected());
    }

    #[tokio::test]
    async fn accounts_changed_empty_disconnects() {
        let h = harness(FakeWallet::new());
        script_connect(&h.wallet, ACCOUNT_A, "0xdede");
        h.manager.connect().await.unwrap();

        h.manager.handle_event(WalletEvent::AccountsChanged(vec![]));

        assert_eq!(h.manager.session(), Session::default());
        assert!(!h.store.was_connected());
    }

    #[tokio::test]
    async fn accounts_changed_switches_active_account() {
        let h = harness(FakeWallet::new());
        script_connect(&h.wallet, ACCOUNT_A, "0xdede");
        h.manager.connect().await.unwrap();

        h.manager.handle_event(WalletEvent::AccountsChanged(vec![
            ACCOUNT_B.parse().unwrap(),
        ]));

        let session = h.manager.session();
        assert_eq!(session.state, ConnectionState::Connected);
        assert_eq!(session.account, Some(ACCOUNT_B.parse().unwrap()));
    }

    #[tokio::test]
    async fn chain_changed_updates_network_and_forces_reload() {
        let h = harness(FakeWallet::new());
        script_connect(&h.wallet, ACCOUNT_A, "0xdede");
        h.manager.connect().await.unwrap();

        h.manager
            .handle_event(WalletEvent::ChainChanged("0x7a69".to_owned()));

        assert_eq!(h.manager.session().chain_id, Some(31337));
        assert_eq!(h.manager.session().state, ConnectionState::Connected);
        assert_eq!(h.reloader.reloads.get(), 1);
    }

    #[tokio::test]
    async fn chain_changed_while_disconnected_keeps_default_session() {
        let h = harness(FakeWallet::new());

        h.manager
            .handle_event(WalletEvent::ChainChanged("0x7a69".to_owned()));

        assert_eq!(h.manager.session(), Session::default());
        assert_eq!(h.reloader.reloads.get(), 1);
    }

    #[tokio::test]
    async fn switch_network_known_chain_switches_directly() {
        let h = harness(FakeWallet::new());
        h.wallet
            .respond("wallet_switchEthereumChain", Ok(Value::Null));

        h.manager
            .switch_network(network_for(BLAZE_CHAIN_ID))
            .await
            .unwrap();

        assert_eq!(h.wallet.calls(), vec!["wallet_switchEthereumChain"]);
    }

    #[tokio::test]
    async fn switch_network_unknown_chain_adds_then_retries_once() {
        let h = harness(FakeWallet::new());
        h.wallet
            .respond("wallet_switchEthereumChain", Err(ProviderError::UnknownChain));
        h.wallet.respond("wallet_addEthereumChain", Ok(Value::Null));
        h.wallet
            .respond("wallet_switchEthereumChain", Ok(Value::Null));

        h.manager
            .switch_network(network_for(BLAZE_CHAIN_ID))
            .await
            .unwrap();

        assert_eq!(
            h.wallet.calls(),
            vec![
                "wallet_switchEthereumChain",
                "wallet_addEthereumChain",
                "wallet_switchEthereumChain",
            ]
        );
    }

    #[tokio::test]
    async fn switch_network_add_failure_is_surfaced_not_retried() {
        let h = harness(FakeWallet::new());
        h.wallet
            .respond("wallet_switchEthereumChain", Err(ProviderError::UnknownChain));
        h.wallet.respond(
            "wallet_addEthereumChain",
            Err(ProviderError::Rpc {
                code: -32000,
                message: "add failed".to_owned(),
            }),
        );

        let err = h
            .manager
            .switch_network(network_for(BLAZE_CHAIN_ID))
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::Wallet { code: -32000, .. }));
        assert_eq!(
            h.wallet.calls(),
            vec!["wallet_switchEthereumChain", "wallet_addEthereumChain"]
        );
    }

    #[tokio::test]
    async fn try_reconnect_uses_non_prompting_query() {
        let h = harness(FakeWallet::new());
        h.store.set_connected(true);
        h.wallet.respond("eth_accounts", Ok(json!([ACCOUNT_A])));
        h.wallet.respond("eth_chainId", Ok(json!("0xdede")));

        let session = h.manager.try_reconnect().await.unwrap();

        assert!(session.is_connected());
        assert_eq!(session.account, Some(ACCOUNT_A.parse().unwrap()));
        assert!(!h.wallet.calls().contains(&"eth_requestAccounts".to_owned()));
    }

    #[tokio::test]
    async fn try_reconnect_skips_without_flag_or_accounts() {
        let h = harness(FakeWallet::new());
        assert!(h.manager.try_reconnect().await.is_none());

        h.store.set_connected(true);
        h.wallet.respond("eth_accounts", Ok(json!([])));
        assert!(h.manager.try_reconnect().await.is_none());
        assert_eq!(h.manager.session(), Session::default());
    }
}
