use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// A diploma token as projected from registry state. Never cached: each
/// read is a fresh query so ownership/validity cannot go stale in the UI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiplomaRecord {
    pub token_id: U256,
    pub student_name: String,
    pub title: String,
    pub institution: String,
    pub issue_date: String,
    /// IPFS CID of the diploma document.
    pub content_hash: String,
    pub owner: Address,
}

/// Fungible reward/payment token balance, formatted for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenBalance {
    /// Decimal string, already scaled by `decimals`.
    pub amount: String,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    Submitted,
    Confirmed,
    Failed,
}

/// One outstanding write operation. At most one exists per write kind;
/// the client rejects a same-kind resubmission while this is unresolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingTransaction {
    pub hash: B256,
    pub submitted_at_epoch_ms: u128,
    pub status: TxStatus,
}

/// Registry `students` mapping entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudentRecord {
    pub id: u64,
    pub last_name: String,
    pub first_name: String,
    pub email: String,
}

/// Registry `companies` mapping entry. An id of zero on-chain means the
/// address is not registered; the client returns `None` in that case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompanyProfile {
    pub id: u64,
    pub name: String,
    pub country: String,
}

/// Outcome of the company-side authenticity check for one token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiplomaVerification {
    pub token_id: U256,
    pub student_name: String,
    pub title: String,
    pub institution: String,
    pub issue_date: String,
    pub content_hash: String,
    pub issuing_school: Address,
    pub school_accredited: bool,
    pub is_valid: bool,
}

/// Shorten an address for display: `0x1234...abcd`.
pub fn short_address(address: &Address) -> String {
    short_hex(&format!("{address}"), 6, 4)
}

/// Shorten a transaction hash for display.
pub fn short_tx_hash(hash: &B256) -> String {
    short_hex(&format!("{hash}"), 8, 6)
}

fn short_hex(s: &str, head: usize, tail: usize) -> String {
    if s.len() <= head + tail {
        return s.to_owned();
    }
    format!("{}...{}", &s[..head], &s[s.len() - tail..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_address_keeps_head_and_tail() {
        let addr: Address = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
            .parse()
            .unwrap();
        assert_eq!(short_address(&addr), "0x5FbD...0aa3");
    }

    #[test]
    fn short_hex_leaves_short_strings_alone() {
        assert_eq!(short_hex("0x1234", 6, 4), "0x1234");
    }
}
