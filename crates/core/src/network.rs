//! Network registry: every chain the monitor knows how to poll.

use serde::{Deserialize, Serialize};

/// Which adapter family handles a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkFamily {
    /// Any EVM chain reachable through the unified explorer API.
    Evm,
    Tron,
    Ton,
    Solana,
}

impl NetworkFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            NetworkFamily::Evm => "EVM",
            NetworkFamily::Tron => "TRON",
            NetworkFamily::Ton => "TON",
            NetworkFamily::Solana => "Solana",
        }
    }
}

/// Static registry entry for one network.
///
/// Loaded once at process start; `key` is the stable identifier stored in the
/// wallet registry, `chain_id` is only meaningful for EVM networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkDescriptor {
    pub key: &'static str,
    pub display_name: &'static str,
    pub family: NetworkFamily,
    pub chain_id: Option<u64>,
    pub native_symbol: &'static str,
    pub testnet: bool,
}

const fn evm(
    key: &'static str,
    display_name: &'static str,
    chain_id: u64,
    native_symbol: &'static str,
    testnet: bool,
) -> NetworkDescriptor {
    NetworkDescriptor {
        key,
        display_name,
        family: NetworkFamily::Evm,
        chain_id: Some(chain_id),
        native_symbol,
        testnet,
    }
}

const fn standalone(
    key: &'static str,
    display_name: &'static str,
    family: NetworkFamily,
    native_symbol: &'static str,
) -> NetworkDescriptor {
    NetworkDescriptor {
        key,
        display_name,
        family,
        chain_id: None,
        native_symbol,
        testnet: false,
    }
}

/// All supported networks. EVM chains first, standalone chains last.
pub static NETWORKS: &[NetworkDescriptor] = &[
    // Ethereum
    evm("ethereum", "Ethereum Mainnet", 1, "ETH", false),
    evm("ethereum_sepolia", "Ethereum Sepolia Testnet", 11155111, "ETH", true),
    evm("ethereum_holesky", "Ethereum Holesky Testnet", 17000, "ETH", true),
    evm("ethereum_hoodi", "Ethereum Hoodi Testnet", 560048, "ETH", true),
    // Polygon
    evm("polygon", "Polygon Mainnet", 137, "MATIC", false),
    evm("polygon_amoy", "Polygon Amoy Testnet", 80002, "MATIC", true),
    // Arbitrum
    evm("arbitrum", "Arbitrum One Mainnet", 42161, "ETH", false),
    evm("arbitrum_nova", "Arbitrum Nova Mainnet", 42170, "ETH", false),
    evm("arbitrum_sepolia", "Arbitrum Sepolia Testnet", 421614, "ETH", true),
    // Linea
    evm("linea", "Linea Mainnet", 59144, "ETH", false),
    evm("linea_sepolia", "Linea Sepolia Testnet", 59141, "ETH", true),
    // Blast
    evm("blast", "Blast Mainnet", 81457, "ETH", false),
    evm("blast_sepolia", "Blast Sepolia Testnet", 168587773, "ETH", true),
    // BitTorrent Chain
    evm("bittorrent", "BitTorrent Chain Mainnet", 199, "BTT", false),
    evm("bittorrent_testnet", "BitTorrent Chain Testnet", 1029, "BTT", true),
    // Celo
    evm("celo", "Celo Mainnet", 42220, "CELO", false),
    evm("celo_sepolia", "Celo Sepolia Testnet", 11142220, "CELO", true),
    // Fraxtal
    evm("fraxtal", "Fraxtal Mainnet", 252, "ETH", false),
    evm("fraxtal_hoodi", "Fraxtal Hoodi Testnet", 2523, "ETH", true),
    // Gnosis
    evm("gnosis", "Gnosis", 100, "XDAI", false),
    // Mantle
    evm("mantle", "Mantle Mainnet", 5000, "MNT", false),
    evm("mantle_sepolia", "Mantle Sepolia Testnet", 5003, "MNT", true),
    // Memecore
    evm("memecore", "Memecore Mainnet", 4352, "MEME", false),
    evm("memecore_testnet", "Memecore Testnet", 43521, "MEME", true),
    // Moonbeam / Moonriver
    evm("moonbeam", "Moonbeam Mainnet", 1284, "GLMR", false),
    evm("moonriver", "Moonriver Mainnet", 1285, "MOVR", false),
    evm("moonbase_alpha", "Moonbase Alpha Testnet", 1287, "DEV", true),
    // opBNB
    evm("opbnb", "opBNB Mainnet", 204, "BNB", false),
    evm("opbnb_testnet", "opBNB Testnet", 5611, "BNB", true),
    // Scroll
    evm("scroll", "Scroll Mainnet", 534352, "ETH", false),
    evm("scroll_sepolia", "Scroll Sepolia Testnet", 534351, "ETH", true),
    // Taiko
    evm("taiko", "Taiko Mainnet", 167000, "ETH", false),
    evm("taiko_hoodi", "Taiko Hoodi Testnet", 167013, "ETH", true),
    // XDC
    evm("xdc", "XDC Mainnet", 50, "XDC", false),
    evm("xdc_apothem", "XDC Apothem Testnet", 51, "XDC", true),
    // ApeChain
    evm("apechain", "ApeChain Mainnet", 33139, "APE", false),
    evm("apechain_curtis", "ApeChain Curtis Testnet", 33111, "APE", true),
    // World
    evm("world", "World Mainnet", 480, "WLD", false),
    evm("world_sepolia", "World Sepolia Testnet", 4801, "WLD", true),
    // Sonic
    evm("sonic", "Sonic Mainnet", 146, "S", false),
    evm("sonic_testnet", "Sonic Testnet", 14601, "S", true),
    // Unichain
    evm("unichain", "Unichain Mainnet", 130, "ETH", false),
    evm("unichain_sepolia", "Unichain Sepolia Testnet", 1301, "ETH", true),
    // Abstract
    evm("abstract", "Abstract Mainnet", 2741, "ETH", false),
    evm("abstract_sepolia", "Abstract Sepolia Testnet", 11124, "ETH", true),
    // Berachain
    evm("berachain", "Berachain Mainnet", 80094, "BERA", false),
    evm("berachain_bepolia", "Berachain Bepolia Testnet", 80069, "BERA", true),
    // Swellchain
    evm("swellchain", "Swellchain Mainnet", 1923, "ETH", false),
    evm("swellchain_testnet", "Swellchain Testnet", 1924, "ETH", true),
    // Monad
    evm("monad", "Monad Mainnet", 143, "MON", false),
    evm("monad_testnet", "Monad Testnet", 10143, "MON", true),
    // HyperEVM
    evm("hyperevm", "HyperEVM Mainnet", 999, "HYPE", false),
    // Katana
    evm("katana", "Katana Mainnet", 747474, "ETH", false),
    evm("katana_bokuto", "Katana Bokuto Testnet", 737373, "ETH", true),
    // Sei
    evm("sei", "Sei Mainnet", 1329, "SEI", false),
    evm("sei_testnet", "Sei Testnet", 1328, "SEI", true),
    // Stable
    evm("stable", "Stable Mainnet", 988, "STABLE", false),
    evm("stable_testnet", "Stable Testnet", 2201, "STABLE", true),
    // Plasma
    evm("plasma", "Plasma Mainnet", 9745, "PLS", false),
    evm("plasma_testnet", "Plasma Testnet", 9746, "PLS", true),
    // Standalone chains
    standalone("tron", "TRON", NetworkFamily::Tron, "TRX"),
    standalone("ton", "TON", NetworkFamily::Ton, "TON"),
    standalone("solana", "Solana", NetworkFamily::Solana, "SOL"),
];

/// Look up a network by its registry key.
pub fn find_network(key: &str) -> Option<&'static NetworkDescriptor> {
    NETWORKS.iter().find(|n| n.key == key)
}

/// All registered networks.
pub fn all_networks() -> &'static [NetworkDescriptor] {
    NETWORKS
}

/// Number of mainnet entries.
pub fn mainnet_count() -> usize {
    NETWORKS.iter().filter(|n| !n.testnet).count()
}

/// Fuzzy search over keys and display names.
///
/// Mainnets sort before testnets, then alphabetically by display name.
/// Capped at 8 results to fit an inline keyboard.
pub fn search_networks(query: &str) -> Vec<&'static NetworkDescriptor> {
    const MAX_RESULTS: usize = 8;

    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return Vec::new();
    }

    let haystack = |n: &NetworkDescriptor| {
        format!("{} {}", n.key.replace('_', " "), n.display_name.to_lowercase())
    };

    let mut results: Vec<&'static NetworkDescriptor> = NETWORKS
        .iter()
        .filter(|n| haystack(n).contains(&q))
        .collect();

    // Whole query missed: retry word by word.
    if results.is_empty() {
        let words: Vec<&str> = q.split_whitespace().collect();
        results = NETWORKS
            .iter()
            .filter(|n| {
                let s = haystack(n);
                words.iter().any(|w| s.contains(w))
            })
            .collect();
    }

    results.sort_by_key(|n| (n.testnet, n.display_name));
    results.truncate(MAX_RESULTS);
    results
}
