//! Dashboard operations.
//!
//! Each handler reads its inputs from the DOM, calls the session manager or
//! contract client, and renders the outcome into the matching result panel.
//! Extend by adding new operations and wiring them in `events.rs`.

use std::rc::Rc;

use alloy_primitives::{Address, U256};
use serde_json::{Value, json};

use dv_api_types::{PendingTransaction, short_address};
use dv_contract_client::ContractClient;
use dv_network_config::{explorer_tx_url, is_supported, network_for};
use dv_wallet_session::Session;

use crate::dom::{self, Elements};
use crate::platform::BrowserRuntime;
use crate::state;

/// Build a fresh contract client for a connected session and store it.
pub fn rebind_client(session: &Session) {
    let Some(manager) = state::manager() else {
        return;
    };
    match ContractClient::for_session(manager.provider(), Rc::new(BrowserRuntime), session) {
        Ok(client) => state::set_client(Rc::new(client)),
        Err(err) => {
            state::clear_client();
            gloo_console::warn!(format!("cannot bind contract client: {err}"));
        }
    }
}

/// Refresh the session header from the current session snapshot.
pub fn render_session(els: &Elements) {
    let Some(manager) = state::manager() else {
        return;
    };
    let session = manager.session();

    if !manager.is_wallet_available() {
        dom::set_text(&els.session_status, "no wallet extension detected");
        return;
    }

    match session.account {
        Some(account) => {
            dom::set_text(&els.session_status, "connected");
            dom::set_text(&els.account_label, &short_address(&account));
        }
        None => {
            dom::set_text(&els.session_status, "disconnected");
            dom::set_text(&els.account_label, "—");
        }
    }

    match session.chain_id {
        Some(chain_id) if is_supported(chain_id) => {
            dom::set_text(&els.network_label, network_for(chain_id).chain_name);
        }
        Some(chain_id) => {
            dom::set_text(&els.network_label, &format!("unsupported chain {chain_id}"));
        }
        None => dom::set_text(&els.network_label, "—"),
    }
}

fn client_or_hint(result: &web_sys::Element) -> Option<Rc<ContractClient>> {
    let client = state::client();
    if client.is_none() {
        dom::set_result_error(result, "connect a wallet first");
    }
    client
}

fn parse_address(input: &str) -> Result<Address, String> {
    input
        .parse()
        .map_err(|_| format!("not a valid address: {input}"))
}

fn parse_token_id(input: &str) -> Result<U256, String> {
    input
        .parse()
        .map_err(|_| format!("not a valid token id: {input}"))
}

fn pending_json(client: &ContractClient, pending: &PendingTransaction) -> Value {
    json!({
        "hash": pending.hash,
        "status": pending.status,
        "explorer": explorer_tx_url(client.contracts().chain_id, &pending.hash),
    })
}

// ── Session ──

pub async fn on_connect(els: &Elements) {
    let Some(manager) = state::manager() else {
        return;
    };
    match manager.connect().await {
        Ok(session) => {
            rebind_client(&session);
            render_session(els);
            on_fetch_balance(els).await;
        }
        Err(err) => {
            render_session(els);
            dom::set_text(&els.session_status, &err.to_string());
        }
    }
}

pub async fn on_disconnect(els: &Elements) {
    if let Some(manager) = state::manager() {
        manager.disconnect();
    }
    state::clear_client();
    render_session(els);
}

pub async fn on_switch_network(els: &Elements) {
    let Some(manager) = state::manager() else {
        return;
    };
    let selected = dom::get_select_value(&els.network_select);
    let Ok(chain_id) = selected.parse::<u64>() else {
        return;
    };
    // On success the wallet emits chainChanged and the page reloads.
    if let Err(err) = manager.switch_network(network_for(chain_id)).await {
        dom::set_text(&els.session_status, &err.to_string());
    }
}

pub async fn on_fetch_balance(els: &Elements) {
    let Some(client) = client_or_hint(&els.balance_result) else {
        return;
    };
    match client.token_balance(client.account()).await {
        Ok(balance) => dom::set_text(
            &els.balance_result,
            &format!("{} {}", balance.amount, balance.symbol),
        ),
        Err(err) => dom::set_result_error(&els.balance_result, &err.to_string()),
    }
}

// ── Student panel ──

pub async fn on_my_diplomas(els: &Elements) {
    let Some(client) = client_or_hint(&els.my_diplomas_result) else {
        return;
    };
    match client.diplomas_owned_by(client.account()).await {
        Ok(records) => dom::set_result(&els.my_diplomas_result, &json!(records)),
        Err(err) => dom::set_result_error(&els.my_diplomas_result, &err.to_string()),
    }
}

pub async fn on_buy_tokens(els: &Elements) {
    let Some(client) = client_or_hint(&els.buy_result) else {
        return;
    };
    match client.buy_tokens().await {
        Ok(pending) => {
            dom::set_result(&els.buy_result, &pending_json(&client, &pending));
            on_fetch_balance(els).await;
        }
        Err(err) => dom::set_result_error(&els.buy_result, &err.to_string()),
    }
}

pub async fn on_transfer_diploma(els: &Elements) {
    let Some(client) = client_or_hint(&els.transfer_result) else {
        return;
    };
    let to = match parse_address(&dom::get_input_value(&els.transfer_to)) {
        Ok(to) => to,
        Err(err) => return dom::set_result_error(&els.transfer_result, &err),
    };
    let token_id = match parse_token_id(&dom::get_input_value(&els.transfer_token_id)) {
        Ok(id) => id,
        Err(err) => return dom::set_result_error(&els.transfer_result, &err),
    };
    match client.transfer_diploma(to, token_id).await {
        Ok(pending) => dom::set_result(&els.transfer_result, &pending_json(&client, &pending)),
        Err(err) => dom::set_result_error(&els.transfer_result, &err.to_string()),
    }
}

// ── School panel ──

pub async fn on_mint_diploma(els: &Elements) {
    let Some(client) = client_or_hint(&els.mint_result) else {
        return;
    };
    let to = match parse_address(&dom::get_input_value(&els.mint_to)) {
        Ok(to) => to,
        Err(err) => return dom::set_result_error(&els.mint_result, &err),
    };
    let student_name = dom::get_input_value(&els.mint_student_name);
    let title = dom::get_input_value(&els.mint_title);
    if student_name.is_empty() || title.is_empty() {
        return dom::set_result_error(&els.mint_result, "student name and title are required");
    }
    match client
        .mint_diploma(
            to,
            &student_name,
            &title,
            &dom::get_input_value(&els.mint_institution),
            &dom::get_input_value(&els.mint_issue_date),
            &dom::get_input_value(&els.mint_cid),
        )
        .await
    {
        Ok(pending) => dom::set_result(&els.mint_result, &pending_json(&client, &pending)),
        Err(err) => dom::set_result_error(&els.mint_result, &err.to_string()),
    }
}

pub async fn on_add_school(els: &Elements) {
    let Some(client) = client_or_hint(&els.add_school_result) else {
        return;
    };
    let school = match parse_address(&dom::get_input_value(&els.add_school_address)) {
        Ok(school) => school,
        Err(err) => return dom::set_result_error(&els.add_school_result, &err),
    };
    match client.add_accredited_institution(school).await {
        Ok(pending) => dom::set_result(&els.add_school_result, &pending_json(&client, &pending)),
        Err(err) => dom::set_result_error(&els.add_school_result, &err.to_string()),
    }
}

// ── Company panel ──

pub async fn on_verify_diploma(els: &Elements) {
    let Some(client) = client_or_hint(&els.verify_result) else {
        return;
    };
    let token_id = match parse_token_id(&dom::get_input_value(&els.verify_token_id)) {
        Ok(id) => id,
        Err(err) => return dom::set_result_error(&els.verify_result, &err),
    };
    match client.verify_diploma(token_id).await {
        Ok(verification) => dom::set_result(&els.verify_result, &json!(verification)),
        Err(err) => dom::set_result_error(&els.verify_result, &err.to_string()),
    }
}

pub async fn on_pay_verification(els: &Elements) {
    let Some(client) = client_or_hint(&els.pay_result) else {
        return;
    };
    match client.pay_for_verification(None).await {
        Ok(pending) => {
            dom::set_result(&els.pay_result, &pending_json(&client, &pending));
            on_fetch_balance(els).await;
        }
        Err(err) => dom::set_result_error(&els.pay_result, &err.to_string()),
    }
}

pub async fn on_reward_evaluation(els: &Elements) {
    let Some(client) = client_or_hint(&els.reward_result) else {
        return;
    };
    let company = match parse_address(&dom::get_input_value(&els.reward_company_address)) {
        Ok(company) => company,
        Err(err) => return dom::set_result_error(&els.reward_result, &err),
    };
    match client.reward_for_evaluation(company).await {
        Ok(pending) => dom::set_result(&els.reward_result, &pending_json(&client, &pending)),
        Err(err) => dom::set_result_error(&els.reward_result, &err.to_string()),
    }
}

pub async fn on_verification_history(els: &Elements) {
    let Some(client) = client_or_hint(&els.history_result) else {
        return;
    };
    match client.verification_history(client.account()).await {
        Ok(hashes) => dom::set_result(&els.history_result, &json!(hashes)),
        Err(err) => dom::set_result_error(&els.history_result, &err.to_string()),
    }
}
