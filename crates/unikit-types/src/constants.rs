//! Cluster, theme and language settings plus the fixed names and keys the
//! connection kit relies on.

use serde::{Deserialize, Serialize};

// =============================================================================
// Cluster
// =============================================================================

/// Solana cluster the host application talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cluster {
    #[default]
    MainnetBeta,
    Devnet,
    Testnet,
}

impl Cluster {
    /// CAIP-2 chain id, used when opening a relay pairing.
    pub fn caip2_chain_id(&self) -> &'static str {
        match self {
            Self::MainnetBeta => "solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp",
            Self::Devnet => "solana:EtWTRABZaYq6iMfeYKouRu166VU2xqa1",
            Self::Testnet => "solana:4uhcVJyU9pJkvQyS88uRDiswHXSCkY3z",
        }
    }
}

impl std::fmt::Display for Cluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MainnetBeta => write!(f, "mainnet-beta"),
            Self::Devnet => write!(f, "devnet"),
            Self::Testnet => write!(f, "testnet"),
        }
    }
}

impl std::str::FromStr for Cluster {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "mainnet-beta" | "mainnet" => Ok(Self::MainnetBeta),
            "devnet" => Ok(Self::Devnet),
            "testnet" => Ok(Self::Testnet),
            _ => Err(format!("unknown cluster: {} (use mainnet-beta, devnet, or testnet)", s)),
        }
    }
}

// =============================================================================
// Presentation settings
// =============================================================================

/// Modal theme requested by the host. Carried through to the UI layer only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Jupiter,
}

/// UI language code. Carried through to the UI layer only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
    Vi,
    Fr,
    Ja,
    Id,
    Ru,
    Az,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Zh => "zh",
            Self::Vi => "vi",
            Self::Fr => "fr",
            Self::Ja => "ja",
            Self::Id => "id",
            Self::Ru => "ru",
            Self::Az => "az",
        }
    }
}

// =============================================================================
// Ranking
// =============================================================================

/// Well-known wallets, in the order they fill the "popular" slots.
pub const TOP_WALLETS: [&str; 3] = ["Phantom", "Solflare", "Backpack"];

/// Maximum number of recency/installed entries promoted into the highlight group.
pub const HIGHLIGHT_LIMIT: usize = 3;

/// Directory shown to users who have no wallet at all.
pub const ONBOARDING_DIRECTORY_URL: &str = "https://station.jup.ag/partners?category=Wallets";

// =============================================================================
// Well-known backends
// =============================================================================

/// Name reported by the Solana Mobile Wallet Adapter backend.
pub const MOBILE_WALLET_ADAPTER_NAME: &str = "Mobile Wallet Adapter";

/// Name and homepage of the hosted relay backend.
pub const RELAY_BACKEND_NAME: &str = "WalletConnect/Reown";
pub const RELAY_BACKEND_URL: &str = "https://reown.com";

// =============================================================================
// Persistence
// =============================================================================

/// Storage key holding the most-recent-first list of connected backend ids.
pub const RECENCY_KEY: &str = "unified-wallet-previously-connected";

/// Key used before the store was renamed. Migrated once, then deleted.
pub const LEGACY_RECENCY_KEY: &str = "open-wallet-previously-connected";

/// Characters kept on each side of a shortened address.
pub const SHORT_ADDRESS_CHARS: usize = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_parse() {
        assert_eq!("mainnet".parse::<Cluster>().unwrap(), Cluster::MainnetBeta);
        assert_eq!("Devnet".parse::<Cluster>().unwrap(), Cluster::Devnet);
        assert!("localnet".parse::<Cluster>().is_err());
    }

    #[test]
    fn test_cluster_display_roundtrip() {
        for cluster in [Cluster::MainnetBeta, Cluster::Devnet, Cluster::Testnet] {
            assert_eq!(cluster.to_string().parse::<Cluster>().unwrap(), cluster);
        }
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Cluster::MainnetBeta).unwrap();
        assert_eq!(json, "\"mainnet-beta\"");
        let theme: Theme = serde_json::from_str("\"jupiter\"").unwrap();
        assert_eq!(theme, Theme::Jupiter);
        let lang: Language = serde_json::from_str("\"az\"").unwrap();
        assert_eq!(lang.code(), "az");
    }
}
