//! Typed on-chain client for the diploma registry and reward token.
//!
//! Binds to one `(provider, account, chain id)` triple; the chain id picks
//! the contract deployment through `dv-network-config`, so a client must be
//! rebuilt whenever the active chain changes — a binding held across a
//! network switch must never be reused. Reads are always fresh queries;
//! nothing is cached across calls. Writes take a per-operation pending lock
//! that clears on every exit path.

pub mod bindings;

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use alloy_primitives::{Address, B256, U256, hex, utils::format_units};
use alloy_sol_types::{SolCall, SolEvent};
use async_trait::async_trait;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, warn};

use bindings::{DiplomaRegistry, RewardToken};
use dv_api_types::{
    CompanyProfile, DiplomaRecord, DiplomaVerification, PendingTransaction, StudentRecord,
    TokenBalance, TxStatus,
};
use dv_network_config::{NetworkContracts, contracts_for};
use dv_wallet_session::{ProviderError, Session, WalletProvider};

/// Fixed native-currency price of one token purchase (0.01 units), as
/// defined by the token contract.
pub const TOKEN_PURCHASE_PRICE_WEI: U256 = U256::from_limbs([10_000_000_000_000_000, 0, 0, 0]);

/// Tokens credited per purchase, as defined by the token contract.
pub const TOKENS_PER_PURCHASE: u64 = 100;

/// Fixed verification fee: 10 DVT at 18 decimals.
pub const VERIFICATION_COST_UNITS: U256 = U256::from_limbs([10_000_000_000_000_000_000, 0, 0, 0]);

const RECEIPT_POLL_ATTEMPTS: u32 = 40;
const RECEIPT_POLL_INTERVAL_MS: u64 = 1500;

/// Clock and timer capability; gloo-timers in the browser, immediate in
/// tests.
#[async_trait(?Send)]
pub trait Runtime {
    async fn sleep_ms(&self, ms: u64);
    fn now_epoch_ms(&self) -> u128;
}

/// Native/test runtime: no delay, system clock.
#[derive(Default)]
pub struct ImmediateRuntime;

#[async_trait(?Send)]
impl Runtime for ImmediateRuntime {
    async fn sleep_ms(&self, _ms: u64) {}

    fn now_epoch_ms(&self) -> u128 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default()
    }
}

/// Write operations, each with its own pending-transaction lock. A second
/// write of the same kind is rejected locally while one is in flight;
/// unrelated kinds may proceed concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteKind {
    MintDiploma,
    AddInstitution,
    BuyTokens,
    PayVerification,
    RewardEvaluation,
    TransferDiploma,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("contract client is not initialized")]
    NotInitialized,
    #[error("token does not exist")]
    NotFound,
    #[error("contract reverted: {0}")]
    Reverted(String),
    #[error("user rejected the signature request")]
    UserRejected,
    #[error("a {0:?} transaction is already pending")]
    OperationPending(WriteKind),
    #[error("network error: {0}")]
    Network(String),
    #[error("response decode error: {0}")]
    Decode(String),
}

impl From<ProviderError> for ClientError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::UserRejected => Self::UserRejected,
            ProviderError::UnknownChain => Self::Network("chain unknown to the wallet".into()),
            ProviderError::Rpc { code, message } => match revert_reason(&message) {
                Some(reason) => Self::Reverted(reason),
                None => Self::Network(format!("rpc error {code}: {message}")),
            },
            ProviderError::Transport(message) => Self::Network(message),
        }
    }
}

/// Extract the human-readable reason from a revert-style RPC message.
fn revert_reason(message: &str) -> Option<String> {
    let idx = message.find("revert")?;
    match message[idx..].split_once(':').map(|(_, tail)| tail.trim()) {
        Some(reason) if !reason.is_empty() => Some(reason.to_owned()),
        _ => Some(message.trim().to_owned()),
    }
}

pub struct ContractClient {
    provider: Rc<dyn WalletProvider>,
    runtime: Rc<dyn Runtime>,
    account: Address,
    contracts: &'static NetworkContracts,
    pending: RefCell<HashSet<WriteKind>>,
}

impl std::fmt::Debug for ContractClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractClient")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

impl ContractClient {
    pub fn new(
        provider: Rc<dyn WalletProvider>,
        runtime: Rc<dyn Runtime>,
        account: Address,
        chain_id: u64,
    ) -> Self {
        Self {
            provider,
            runtime,
            account,
            contracts: contracts_for(chain_id),
            pending: RefCell::new(HashSet::new()),
        }
    }

    /// Bind to a connected session. `NotInitialized` before a session with
    /// an account and a resolved network exists.
    pub fn for_session(
        provider: Rc<dyn WalletProvider>,
        runtime: Rc<dyn Runtime>,
        session: &Session,
    ) -> Result<Self, ClientError> {
        match (session.is_connected(), session.account, session.chain_id) {
            (true, Some(account), Some(chain_id)) => {
                Ok(Self::new(provider, runtime, account, chain_id))
            }
            _ => Err(ClientError::NotInitialized),
        }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn contracts(&self) -> &'static NetworkContracts {
        self.contracts
    }

    pub fn is_write_pending(&self, kind: WriteKind) -> bool {
        self.pending.borrow().contains(&kind)
    }

    // ── Reads ──

    /// Reward-token balance, formatted for display.
    pub async fn token_balance(&self, address: Address) -> Result<TokenBalance, ClientError> {
        let token = self.contracts.token.address;
        let raw = self
            .call(token, RewardToken::balanceOfCall { account: address })
            .await?;
        let symbol = self.call(token, RewardToken::symbolCall {}).await?;
        let decimals = self.call(token, RewardToken::decimalsCall {}).await?;
        Ok(TokenBalance {
            amount: format_amount(raw, decimals)?,
            symbol,
            decimals,
        })
    }

    /// Current owner of a diploma token. A registry revert for the id means
    /// the token does not exist.
    pub async fn owner_of(&self, token_id: U256) -> Result<Address, ClientError> {
        self.call(
            self.contracts.registry.address,
            DiplomaRegistry::ownerOfCall { tokenId: token_id },
        )
        .await
        .map_err(|err| match err {
            ClientError::Reverted(_) => ClientError::NotFound,
            other => other,
        })
    }

    /// Fresh projection of one diploma, including its current owner.
    pub async fn diploma(&self, token_id: U256) -> Result<DiplomaRecord, ClientError> {
        let owner = self.owner_of(token_id).await?;
        let details = self.diploma_details(token_id).await?;
        Ok(record_from_details(token_id, owner, details))
    }

    pub async fn is_accredited(&self, school: Address) -> Result<bool, ClientError> {
        self.call(
            self.contracts.registry.address,
            DiplomaRegistry::accreditedSchoolsCall { school },
        )
        .await
    }

    /// Registry `students` record for an address, if registered.
    pub async fn student_record(
        &self,
        student: Address,
    ) -> Result<Option<StudentRecord>, ClientError> {
        let record = self
            .call(
                self.contracts.registry.address,
                DiplomaRegistry::studentsCall { student },
            )
            .await?;
        if record.id.is_zero() {
            return Ok(None);
        }
        Ok(Some(StudentRecord {
            id: u256_to_u64(record.id),
            last_name: record.lastName,
            first_name: record.firstName,
            email: record.email,
        }))
    }

    /// Registry `companies` record for an address, if registered.
    pub async fn company_profile(
        &self,
        company: Address,
    ) -> Result<Option<CompanyProfile>, ClientError> {
        let record = self
            .call(
                self.contracts.registry.address,
                DiplomaRegistry::companiesCall { company },
            )
            .await?;
        if record.id.is_zero() {
            return Ok(None);
        }
        Ok(Some(CompanyProfile {
            id: u256_to_u64(record.id),
            name: record.name,
            country: record.country,
        }))
    }

    /// Diplomas currently owned by an address, reconstructed by scanning
    /// mint-event history and keeping tokens the address still owns. Not a
    /// stored index: cost scales with mint-event volume for the address.
    /// Per-token lookup failures are logged and skipped so one bad token
    /// cannot hide the rest.
    pub async fn diplomas_owned_by(
        &self,
        owner: Address,
    ) -> Result<Vec<DiplomaRecord>, ClientError> {
        let filter = json!([{
            "address": self.contracts.registry.address,
            "fromBlock": "0x0",
            "toBlock": "latest",
            "topics": [
                DiplomaRegistry::DiplomaMinted::SIGNATURE_HASH,
                B256::from(owner.into_word()),
            ],
        }]);
        let logs = self.provider.request("eth_getLogs", filter).await?;
        let logs = logs
            .as_array()
            .ok_or_else(|| ClientError::Decode("eth_getLogs returned a non-array".into()))?;

        let mut records = Vec::new();
        for log in logs {
            let Some(token_id) = mint_log_token_id(log) else {
                warn!("mint log without a token id topic");
                continue;
            };
            let current_owner = match self.owner_of(token_id).await {
                Ok(address) => address,
                Err(ClientError::NotFound) => continue,
                Err(err) => {
                    warn!(%token_id, error = %err, "skipping unreadable token");
                    continue;
                }
            };
            if current_owner != owner {
                continue;
            }
            match self.diploma_details(token_id).await {
                Ok(details) => records.push(record_from_details(token_id, owner, details)),
                Err(err) => warn!(%token_id, error = %err, "skipping unreadable token"),
            }
        }
        Ok(records)
    }

    /// Company-side authenticity check: existence, metadata and issuing
    /// school accreditation in one pass.
    pub async fn verify_diploma(
        &self,
        token_id: U256,
    ) -> Result<DiplomaVerification, ClientError> {
        let registry = self.contracts.registry.address;
        self.owner_of(token_id).await?;
        let details = self.diploma_details(token_id).await?;
        let school = self
            .call(registry, DiplomaRegistry::diplomaToSchoolCall { tokenId: token_id })
            .await?;
        let accredited = self.is_accredited(school).await?;
        let is_valid = !details.studentName.is_empty();
        Ok(DiplomaVerification {
            token_id,
            student_name: details.studentName,
            title: details.diplomaTitle,
            institution: details.institution,
            issue_date: details.issueDate,
            content_hash: details.ipfsCID,
            issuing_school: school,
            school_accredited: accredited,
            is_valid,
        })
    }

    /// Hashes of past verification payments made by an address: token
    /// `Transfer` events from the address whose value equals the fixed
    /// verification fee.
    pub async fn verification_history(
        &self,
        payer: Address,
    ) -> Result<Vec<B256>, ClientError> {
        let filter = json!([{
            "address": self.contracts.token.address,
            "fromBlock": "0x0",
            "toBlock": "latest",
            "topics": [
                RewardToken::Transfer::SIGNATURE_HASH,
                B256::from(payer.into_word()),
            ],
        }]);
        let logs = self.provider.request("eth_getLogs", filter).await?;
        let logs = logs
            .as_array()
            .ok_or_else(|| ClientError::Decode("eth_getLogs returned a non-array".into()))?;

        let mut hashes = Vec::new();
        for log in logs {
            let value = log
                .get("data")
                .and_then(Value::as_str)
                .and_then(|data| hex::decode(data).ok())
                .map(|bytes| U256::from_be_slice(&bytes));
            if value != Some(VERIFICATION_COST_UNITS) {
                continue;
            }
            if let Some(hash) = log
                .get("transactionHash")
                .and_then(Value::as_str)
                .and_then(|s| s.parse().ok())
            {
                hashes.push(hash);
            }
        }
        Ok(hashes)
    }

    // ── Writes ──

    /// Mint a diploma to a student address. Restricted by the registry to
    /// accredited issuer accounts; the revert reason is surfaced verbatim.
    pub async fn mint_diploma(
        &self,
        to: Address,
        student_name: &str,
        title: &str,
        institution: &str,
        issue_date: &str,
        content_hash: &str,
    ) -> Result<PendingTransaction, ClientError> {
        let _guard = self.acquire(WriteKind::MintDiploma)?;
        let call = DiplomaRegistry::mintDiplomaCall {
            to,
            studentName: student_name.to_owned(),
            diplomaTitle: title.to_owned(),
            institution: institution.to_owned(),
            issueDate: issue_date.to_owned(),
            ipfsCID: content_hash.to_owned(),
        };
        self.submit(self.contracts.registry.address, call.abi_encode(), None)
            .await
    }

    /// Accredit an institution. Registry owner only.
    pub async fn add_accredited_institution(
        &self,
        school: Address,
    ) -> Result<PendingTransaction, ClientError> {
        let _guard = self.acquire(WriteKind::AddInstitution)?;
        let call = DiplomaRegistry::addSchoolCall { school };
        self.submit(self.contracts.registry.address, call.abi_encode(), None)
            .await
    }

    /// Fixed-price token purchase: 0.01 native units for 100 DVT, both
    /// fixed by the contract.
    pub async fn buy_tokens(&self) -> Result<PendingTransaction, ClientError> {
        let _guard = self.acquire(WriteKind::BuyTokens)?;
        let call = RewardToken::buyTokensCall {};
        self.submit(
            self.contracts.token.address,
            call.abi_encode(),
            Some(TOKEN_PURCHASE_PRICE_WEI),
        )
        .await
    }

    /// Pay the fixed verification fee. With no explicit payee the token
    /// contract's owner is resolved and paid, matching the platform flow.
    pub async fn pay_for_verification(
        &self,
        payee: Option<Address>,
    ) -> Result<PendingTransaction, ClientError> {
        let _guard = self.acquire(WriteKind::PayVerification)?;
        let payee = match payee {
            Some(address) => address,
            None => {
                self.call(self.contracts.token.address, RewardToken::ownerCall {})
                    .await?
            }
        };
        let call = RewardToken::payForVerificationCall { diplomaDApp: payee };
        self.submit(self.contracts.token.address, call.abi_encode(), None)
            .await
    }

    /// Credit the fixed evaluation reward to a company. Owner only.
    pub async fn reward_for_evaluation(
        &self,
        company: Address,
    ) -> Result<PendingTransaction, ClientError> {
        let _guard = self.acquire(WriteKind::RewardEvaluation)?;
        let call = RewardToken::rewardForEvaluationCall { company };
        self.submit(self.contracts.token.address, call.abi_encode(), None)
            .await
    }

    /// Transfer a diploma token. The bound account must be the current
    /// owner; the transfer is irreversible.
    pub async fn transfer_diploma(
        &self,
        to: Address,
        token_id: U256,
    ) -> Result<PendingTransaction, ClientError> {
        let _guard = self.acquire(WriteKind::TransferDiploma)?;
        let call = DiplomaRegistry::safeTransferFromCall {
            from: self.account,
            to,
            tokenId: token_id,
        };
        self.submit(self.contracts.registry.address, call.abi_encode(), None)
            .await
    }

    // ── Plumbing ──

    async fn diploma_details(
        &self,
        token_id: U256,
    ) -> Result<DiplomaRegistry::diplomaDetailsReturn, ClientError> {
        self.call(
            self.contracts.registry.address,
            DiplomaRegistry::diplomaDetailsCall { tokenId: token_id },
        )
        .await
    }

    async fn call<C: SolCall>(&self, to: Address, call: C) -> Result<C::Return, ClientError> {
        let params = json!([
            { "to": to, "data": hex::encode_prefixed(call.abi_encode()) },
            "latest",
        ]);
        let result = self.provider.request("eth_call", params).await?;
        let data = result
            .as_str()
            .ok_or_else(|| ClientError::Decode("eth_call returned a non-string".into()))?;
        let bytes =
            hex::decode(data).map_err(|err| ClientError::Decode(format!("bad call data: {err}")))?;
        C::abi_decode_returns(&bytes)
            .map_err(|err| ClientError::Decode(format!("bad return data: {err}")))
    }

    fn acquire(&self, kind: WriteKind) -> Result<WriteGuard<'_>, ClientError> {
        if !self.pending.borrow_mut().insert(kind) {
            return Err(ClientError::OperationPending(kind));
        }
        Ok(WriteGuard { client: self, kind })
    }

    async fn submit(
        &self,
        to: Address,
        data: Vec<u8>,
        value: Option<U256>,
    ) -> Result<PendingTransaction, ClientError> {
        let mut tx = json!({
            "from": self.account,
            "to": to,
            "data": hex::encode_prefixed(&data),
        });
        if let Some(value) = value {
            tx["value"] = json!(format!("0x{value:x}"));
        }

        let result = self.provider.request("eth_sendTransaction", json!([tx])).await?;
        let hash: B256 = result
            .as_str()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| ClientError::Decode("eth_sendTransaction returned no hash".into()))?;
        debug!(%hash, %to, "transaction submitted");

        let mut pending = PendingTransaction {
            hash,
            submitted_at_epoch_ms: self.runtime.now_epoch_ms(),
            status: TxStatus::Submitted,
        };
        self.await_receipt(&mut pending).await?;
        Ok(pending)
    }

    /// Poll for the receipt until the network finalizes the transaction.
    /// Once broadcast, a transaction can only fail or succeed on-chain;
    /// there is no abort path.
    async fn await_receipt(&self, pending: &mut PendingTransaction) -> Result<(), ClientError> {
        for attempt in 0..RECEIPT_POLL_ATTEMPTS {
            if attempt > 0 {
                self.runtime.sleep_ms(RECEIPT_POLL_INTERVAL_MS).await;
            }
            let receipt = self
                .provider
                .request("eth_getTransactionReceipt", json!([pending.hash]))
                .await?;
            if receipt.is_null() {
                continue;
            }
            let status = receipt.get("status").and_then(Value::as_str).unwrap_or("0x1");
            if status == "0x0" {
                pending.status = TxStatus::Failed;
                return Err(ClientError::Reverted("transaction reverted".to_owned()));
            }
            pending.status = TxStatus::Confirmed;
            return Ok(());
        }
        Err(ClientError::Network(format!(
            "no receipt for {} after {} polls",
            pending.hash, RECEIPT_POLL_ATTEMPTS
        )))
    }
}

/// Clears the pending-transaction lock on every exit path.
struct WriteGuard<'a> {
    client: &'a ContractClient,
    kind: WriteKind,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.client.pending.borrow_mut().remove(&self.kind);
    }
}

fn record_from_details(
    token_id: U256,
    owner: Address,
    details: DiplomaRegistry::diplomaDetailsReturn,
) -> DiplomaRecord {
    DiplomaRecord {
        token_id,
        student_name: details.studentName,
        title: details.diplomaTitle,
        institution: details.institution,
        issue_date: details.issueDate,
        content_hash: details.ipfsCID,
        owner,
    }
}

fn mint_log_token_id(log: &Value) -> Option<U256> {
    let topic = log.get("topics")?.get(2)?.as_str()?;
    let word: B256 = topic.parse().ok()?;
    Some(U256::from_be_bytes(word.0))
}

fn u256_to_u64(value: U256) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

/// Scale a raw token amount by its decimals and trim trailing zeros, so
/// 100 * 10^18 at 18 decimals renders as "100".
fn format_amount(raw: U256, decimals: u8) -> Result<String, ClientError> {
    let full = format_units(raw, decimals)
        .map_err(|err| ClientError::Decode(format!("bad token amount: {err}")))?;
    if full.contains('.') {
        let trimmed = full.trim_end_matches('0').trim_end_matches('.');
        return Ok(trimmed.to_owned());
    }
    Ok(full)
}
