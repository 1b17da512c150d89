//! DOM element bindings.
//!
//! All fields are resolved once at startup. To add new UI elements, add a
//! field here and bind it in `Elements::bind()`.

use serde_json::Value;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Element, HtmlElement, HtmlInputElement, HtmlOptionElement, HtmlSelectElement,
};

use dv_network_config::NETWORKS;

// ── Helpers ──

fn doc() -> Document {
    web_sys::window().unwrap().document().unwrap()
}

pub fn by_id(id: &str) -> Option<Element> {
    doc().get_element_by_id(id)
}

pub fn by_id_typed<T: JsCast>(id: &str) -> Option<T> {
    by_id(id).and_then(|e| e.dyn_into::<T>().ok())
}

pub fn query_all(selector: &str) -> Vec<Element> {
    let nl = doc().query_selector_all(selector).unwrap();
    let mut v = Vec::new();
    for i in 0..nl.length() {
        if let Some(e) = nl.item(i) {
            if let Ok(el) = e.dyn_into::<Element>() {
                v.push(el);
            }
        }
    }
    v
}

pub fn set_text(el: &Element, text: &str) {
    el.set_text_content(Some(text));
}

pub fn get_input_value(el: &HtmlInputElement) -> String {
    el.value().trim().to_string()
}

pub fn get_select_value(el: &HtmlSelectElement) -> String {
    el.value()
}

pub fn toggle_class(el: &Element, cls: &str, force: bool) {
    let _ = el.class_list().toggle_with_force(cls, force);
}

pub fn create_element(tag: &str) -> Element {
    doc().create_element(tag).unwrap()
}

/// Render a JSON result into a result panel.
pub fn set_result(el: &Element, value: &Value) {
    let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    el.set_text_content(Some(&text));
    let _ = el.class_list().remove_1("error");
}

pub fn set_result_error(el: &Element, message: &str) {
    el.set_text_content(Some(message));
    let _ = el.class_list().add_1("error");
}

/// Fill the network selector from the static network table.
pub fn populate_network_select(sel: &HtmlSelectElement) {
    sel.set_inner_html("");
    for network in NETWORKS {
        let opt: HtmlOptionElement = create_element("option").dyn_into().unwrap();
        opt.set_value(&network.chain_id.to_string());
        opt.set_text_content(Some(network.chain_name));
        let _ = sel.append_child(&opt);
    }
}

// ── Elements struct ──

/// All DOM element references used by the dashboard.
/// Clone-friendly (all inner types are reference-counted via JS GC).
#[derive(Clone)]
pub struct Elements {
    // Session header
    pub connect_btn: HtmlElement,
    pub disconnect_btn: HtmlElement,
    pub session_status: Element,
    pub account_label: Element,
    pub network_label: Element,
    pub network_select: HtmlSelectElement,
    pub switch_network_btn: HtmlElement,
    pub balance_btn: HtmlElement,
    pub balance_result: Element,

    // Role tabs
    pub tabs: Vec<Element>,
    pub panels: Vec<Element>,

    // Student panel
    pub my_diplomas_btn: HtmlElement,
    pub my_diplomas_result: Element,
    pub buy_tokens_btn: HtmlElement,
    pub buy_result: Element,
    pub transfer_to: HtmlInputElement,
    pub transfer_token_id: HtmlInputElement,
    pub transfer_btn: HtmlElement,
    pub transfer_result: Element,

    // School panel
    pub mint_to: HtmlInputElement,
    pub mint_student_name: HtmlInputElement,
    pub mint_title: HtmlInputElement,
    pub mint_institution: HtmlInputElement,
    pub mint_issue_date: HtmlInputElement,
    pub mint_cid: HtmlInputElement,
    pub mint_btn: HtmlElement,
    pub mint_result: Element,
    pub add_school_address: HtmlInputElement,
    pub add_school_btn: HtmlElement,
    pub add_school_result: Element,

    // Company panel
    pub verify_token_id: HtmlInputElement,
    pub verify_btn: HtmlElement,
    pub verify_result: Element,
    pub pay_verification_btn: HtmlElement,
    pub pay_result: Element,
    pub reward_company_address: HtmlInputElement,
    pub reward_btn: HtmlElement,
    pub reward_result: Element,
    pub history_btn: HtmlElement,
    pub history_result: Element,
}

macro_rules! get_el {
    ($id:expr) => {
        by_id($id).ok_or_else(|| JsValue::from_str(&format!("missing element #{}", $id)))?
    };
}

macro_rules! get_input {
    ($id:expr) => {
        by_id_typed::<HtmlInputElement>($id)
            .ok_or_else(|| JsValue::from_str(&format!("missing input #{}", $id)))?
    };
}

macro_rules! get_select {
    ($id:expr) => {
        by_id_typed::<HtmlSelectElement>($id)
            .ok_or_else(|| JsValue::from_str(&format!("missing select #{}", $id)))?
    };
}

macro_rules! get_html {
    ($id:expr) => {
        by_id_typed::<HtmlElement>($id)
            .ok_or_else(|| JsValue::from_str(&format!("missing html element #{}", $id)))?
    };
}

impl Elements {
    /// Resolve all DOM references. Call once after DOMContentLoaded.
    pub fn bind() -> Result<Elements, JsValue> {
        Ok(Elements {
            connect_btn: get_html!("connectBtn"),
            disconnect_btn: get_html!("disconnectBtn"),
            session_status: get_el!("sessionStatus"),
            account_label: get_el!("accountLabel"),
            network_label: get_el!("networkLabel"),
            network_select: get_select!("networkSelect"),
            switch_network_btn: get_html!("switchNetworkBtn"),
            balance_btn: get_html!("balanceBtn"),
            balance_result: get_el!("balanceResult"),

            tabs: query_all(".role-tab"),
            panels: query_all(".role-panel"),

            my_diplomas_btn: get_html!("myDiplomasBtn"),
            my_diplomas_result: get_el!("myDiplomasResult"),
            buy_tokens_btn: get_html!("buyTokensBtn"),
            buy_result: get_el!("buyResult"),
            transfer_to: get_input!("transferTo"),
            transfer_token_id: get_input!("transferTokenId"),
            transfer_btn: get_html!("transferBtn"),
            transfer_result: get_el!("transferResult"),

            mint_to: get_input!("mintTo"),
            mint_student_name: get_input!("mintStudentName"),
            mint_title: get_input!("mintTitle"),
            mint_institution: get_input!("mintInstitution"),
            mint_issue_date: get_input!("mintIssueDate"),
            mint_cid: get_input!("mintCid"),
            mint_btn: get_html!("mintBtn"),
            mint_result: get_el!("mintResult"),
            add_school_address: get_input!("addSchoolAddress"),
            add_school_btn: get_html!("addSchoolBtn"),
            add_school_result: get_el!("addSchoolResult"),

            verify_token_id: get_input!("verifyTokenId"),
            verify_btn: get_html!("verifyBtn"),
            verify_result: get_el!("verifyResult"),
            pay_verification_btn: get_html!("payVerificationBtn"),
            pay_result: get_el!("payResult"),
            reward_company_address: get_input!("rewardCompanyAddress"),
            reward_btn: get_html!("rewardBtn"),
            reward_result: get_el!("rewardResult"),
            history_btn: get_html!("historyBtn"),
            history_result: get_el!("historyResult"),
        })
    }
}
