//! Static network and contract configuration.
//!
//! One descriptor per supported network, keyed by numeric chain id, plus a
//! parallel table of contract deployments. Both lookups are total: an
//! unrecognized chain id resolves to the default entry rather than failing.
//! Adding a network is a data change here, not a code change elsewhere.

use alloy_primitives::{Address, B256, address};
use serde_json::{Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeCurrency {
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkDescriptor {
    pub chain_id: u64,
    pub chain_name: &'static str,
    pub native_currency: NativeCurrency,
    pub rpc_urls: &'static [&'static str],
    pub block_explorer_urls: &'static [&'static str],
}

impl NetworkDescriptor {
    pub fn chain_id_hex(&self) -> String {
        to_hex_chain_id(self.chain_id)
    }

    /// Parameter object for `wallet_addEthereumChain` (camelCase, hex id).
    pub fn add_chain_params(&self) -> Value {
        json!({
            "chainId": self.chain_id_hex(),
            "chainName": self.chain_name,
            "nativeCurrency": {
                "name": self.native_currency.name,
                "symbol": self.native_currency.symbol,
                "decimals": self.native_currency.decimals,
            },
            "rpcUrls": self.rpc_urls,
            "blockExplorerUrls": self.block_explorer_urls,
        })
    }
}

pub const BLAZE_CHAIN_ID: u64 = 57054;
pub const HARDHAT_CHAIN_ID: u64 = 31337;
pub const SONIC_CHAIN_ID: u64 = 64165;
pub const SEPOLIA_CHAIN_ID: u64 = 11155111;
pub const GOERLI_CHAIN_ID: u64 = 5;

const SONIC_CURRENCY: NativeCurrency = NativeCurrency {
    name: "Sonic",
    symbol: "S",
    decimals: 18,
};

const ETHER_CURRENCY: NativeCurrency = NativeCurrency {
    name: "Ethereum",
    symbol: "ETH",
    decimals: 18,
};

/// All supported networks. The first entry is the platform default.
pub static NETWORKS: &[NetworkDescriptor] = &[
    NetworkDescriptor {
        chain_id: BLAZE_CHAIN_ID,
        chain_name: "Blaze Testnet",
        native_currency: SONIC_CURRENCY,
        rpc_urls: &["https://rpc.blaze.soniclabs.com"],
        block_explorer_urls: &["https://testnet.sonicscan.org"],
    },
    NetworkDescriptor {
        chain_id: HARDHAT_CHAIN_ID,
        chain_name: "Hardhat Local",
        native_currency: ETHER_CURRENCY,
        rpc_urls: &["http://127.0.0.1:8545"],
        block_explorer_urls: &[],
    },
    NetworkDescriptor {
        chain_id: SONIC_CHAIN_ID,
        chain_name: "Sonic Testnet",
        native_currency: SONIC_CURRENCY,
        rpc_urls: &["https://rpc.testnet.soniclabs.com"],
        block_explorer_urls: &["https://testnet.sonicscan.org"],
    },
    NetworkDescriptor {
        chain_id: SEPOLIA_CHAIN_ID,
        chain_name: "Sepolia Test Network",
        native_currency: ETHER_CURRENCY,
        rpc_urls: &["https://sepolia.infura.io/v3/YOUR_INFURA_KEY"],
        block_explorer_urls: &["https://sepolia.etherscan.io"],
    },
    NetworkDescriptor {
        chain_id: GOERLI_CHAIN_ID,
        chain_name: "Goerli Test Network",
        native_currency: ETHER_CURRENCY,
        rpc_urls: &["https://goerli.infura.io/v3/YOUR_INFURA_KEY"],
        block_explorer_urls: &["https://goerli.etherscan.io"],
    },
];

pub fn default_network() -> &'static NetworkDescriptor {
    &NETWORKS[0]
}

/// Look up a network by chain id. Unknown ids resolve to the default
/// network; use [`is_supported`] when the distinction matters.
pub fn network_for(chain_id: u64) -> &'static NetworkDescriptor {
    NETWORKS
        .iter()
        .find(|n| n.chain_id == chain_id)
        .unwrap_or_else(default_network)
}

pub fn is_supported(chain_id: u64) -> bool {
    NETWORKS.iter().any(|n| n.chain_id == chain_id)
}

// ── Contract deployments ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractRole {
    DiplomaRegistry,
    RewardToken,
}

/// A contract binding is only valid for the chain it was resolved under;
/// clients must re-resolve whenever the active chain changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractBinding {
    pub role: ContractRole,
    pub address: Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkContracts {
    pub chain_id: u64,
    pub registry: ContractBinding,
    pub token: ContractBinding,
}

impl NetworkContracts {
    /// Both addresses are set. Undeployed networks carry the zero address.
    pub fn is_deployed(&self) -> bool {
        self.registry.address != Address::ZERO && self.token.address != Address::ZERO
    }
}

const fn deployment(chain_id: u64, registry: Address, token: Address) -> NetworkContracts {
    NetworkContracts {
        chain_id,
        registry: ContractBinding {
            role: ContractRole::DiplomaRegistry,
            address: registry,
        },
        token: ContractBinding {
            role: ContractRole::RewardToken,
            address: token,
        },
    }
}

/// Known deployments. The first entry doubles as the fallback for chain
/// ids with no deployment of their own.
pub static CONTRACTS: &[NetworkContracts] = &[
    deployment(
        HARDHAT_CHAIN_ID,
        address!("0x5FbDB2315678afecb367f032d93F642f64180aa3"),
        address!("0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"),
    ),
    deployment(SEPOLIA_CHAIN_ID, Address::ZERO, Address::ZERO),
    deployment(GOERLI_CHAIN_ID, Address::ZERO, Address::ZERO),
];

/// Resolve the contract bindings for a chain. Unknown chain ids fall back
/// to the first deployment entry — a deliberate, documented default.
pub fn contracts_for(chain_id: u64) -> &'static NetworkContracts {
    CONTRACTS
        .iter()
        .find(|c| c.chain_id == chain_id)
        .unwrap_or(&CONTRACTS[0])
}

// ── Chain id and explorer helpers ──

pub fn to_hex_chain_id(chain_id: u64) -> String {
    format!("0x{chain_id:x}")
}

pub fn from_hex_chain_id(hex: &str) -> Option<u64> {
    let digits = hex.strip_prefix("0x").or_else(|| hex.strip_prefix("0X"))?;
    u64::from_str_radix(digits, 16).ok()
}

/// Explorer link for a transaction, if the network has an explorer.
pub fn explorer_tx_url(chain_id: u64, hash: &B256) -> Option<String> {
    let base = network_for(chain_id).block_explorer_urls.first()?;
    Some(format!("{base}/tx/{hash}"))
}

/// Explorer link for an address, if the network has an explorer.
pub fn explorer_address_url(chain_id: u64, address: &Address) -> Option<String> {
    let base = network_for(chain_id).block_explorer_urls.first()?;
    Some(format!("{base}/address/{address}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_chain_falls_back_to_default_network() {
        let network = network_for(424242);
        assert_eq!(network.chain_id, BLAZE_CHAIN_ID);
        assert!(!is_supported(424242));
        assert!(is_supported(HARDHAT_CHAIN_ID));
    }

    #[test]
    fn unknown_chain_falls_back_to_first_deployment() {
        let contracts = contracts_for(424242);
        assert_eq!(contracts.chain_id, HARDHAT_CHAIN_ID);
        assert!(contracts.is_deployed());
        assert_eq!(contracts.registry.role as u8, ContractRole::DiplomaRegistry as u8);
    }

    #[test]
    fn undeployed_networks_report_not_deployed() {
        assert!(!contracts_for(SEPOLIA_CHAIN_ID).is_deployed());
    }

    #[test]
    fn hex_chain_id_round_trip() {
        assert_eq!(to_hex_chain_id(BLAZE_CHAIN_ID), "0xdede");
        assert_eq!(from_hex_chain_id("0xdede"), Some(BLAZE_CHAIN_ID));
        assert_eq!(from_hex_chain_id("0x7A69"), Some(HARDHAT_CHAIN_ID));
        assert_eq!(from_hex_chain_id("7a69"), None);
        assert_eq!(from_hex_chain_id("0xzz"), None);
    }

    #[test]
    fn add_chain_params_uses_wallet_shape() {
        let params = network_for(BLAZE_CHAIN_ID).add_chain_params();
        assert_eq!(params["chainId"], "0xdede");
        assert_eq!(params["chainName"], "Blaze Testnet");
        assert_eq!(params["nativeCurrency"]["symbol"], "S");
        assert_eq!(params["rpcUrls"][0], "https://rpc.blaze.soniclabs.com");
    }

    #[test]
    fn explorer_urls_only_for_networks_with_explorers() {
        let hash = B256::ZERO;
        assert!(explorer_tx_url(BLAZE_CHAIN_ID, &hash)
            .unwrap()
            .starts_with("https://testnet.sonicscan.org/tx/0x"));
        assert!(explorer_tx_url(HARDHAT_CHAIN_ID, &hash).is_none());
    }
}
