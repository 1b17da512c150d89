//! Event binding.
//!
//! Wires all UI event listeners. To add new events, add closures here and
//! (if async) spawn via `wasm_bindgen_futures::spawn_local`.

use crate::dom::{self, Elements};
use crate::ops;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

/// Helper: attach async click handler to an HtmlElement.
macro_rules! on_click_async {
    ($el:expr, $els:expr, $handler:expr) => {{
        let els = $els.clone();
        let cb = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
            let els2 = els.clone();
            wasm_bindgen_futures::spawn_local(async move {
                $handler(&els2).await;
            });
        }) as Box<dyn FnMut(_)>);
        $el.add_event_listener_with_callback("click", cb.as_ref().unchecked_ref())
            .unwrap();
        cb.forget();
    }};
}

/// Bind all UI event listeners. Call once after init.
pub fn bind_events(els: &Elements) {
    // ── Role tabs ──
    for tab in &els.tabs {
        let role = tab.get_attribute("data-role").unwrap_or_default();
        let els2 = els.clone();
        let cb = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
            set_active_role(&els2, &role);
        }) as Box<dyn FnMut(_)>);
        tab.add_event_listener_with_callback("click", cb.as_ref().unchecked_ref())
            .unwrap();
        cb.forget();
    }

    // ── Session ──
    on_click_async!(els.connect_btn, els, ops::on_connect);
    on_click_async!(els.disconnect_btn, els, ops::on_disconnect);
    on_click_async!(els.switch_network_btn, els, ops::on_switch_network);
    on_click_async!(els.balance_btn, els, ops::on_fetch_balance);

    // ── Student ──
    on_click_async!(els.my_diplomas_btn, els, ops::on_my_diplomas);
    on_click_async!(els.buy_tokens_btn, els, ops::on_buy_tokens);
    on_click_async!(els.transfer_btn, els, ops::on_transfer_diploma);

    // ── School ──
    on_click_async!(els.mint_btn, els, ops::on_mint_diploma);
    on_click_async!(els.add_school_btn, els, ops::on_add_school);

    // ── Company ──
    on_click_async!(els.verify_btn, els, ops::on_verify_diploma);
    on_click_async!(els.pay_verification_btn, els, ops::on_pay_verification);
    on_click_async!(els.reward_btn, els, ops::on_reward_evaluation);
    on_click_async!(els.history_btn, els, ops::on_verification_history);
}

/// Switch the active role tab and panel.
fn set_active_role(els: &Elements, role: &str) {
    for tab in &els.tabs {
        dom::toggle_class(tab, "active", tab.get_attribute("data-role").as_deref() == Some(role));
    }
    for panel in &els.panels {
        let id = panel.id();
        dom::toggle_class(panel, "active", id == role);
    }
}
