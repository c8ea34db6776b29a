use node_consensus::ConsensusMode;
use node_core::transaction::SignatureMode;
use node_core::LedgerConfig;
use node_crypto::Address;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The full configuration table of spec.md §6, loaded from TOML with
/// `NODE__<FIELD>` environment overrides (ambient: the teacher only took
/// `clap` args for a one-shot CLI; this node runs unattended and needs more
/// than process args to start).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub node_id: String,
    pub listen_address: String,
    pub listen_port: u16,
    pub seed_peers: Vec<String>,
    pub api_bind_port: u16,

    pub target_block_interval_secs: u64,
    pub initial_difficulty: u32,
    pub difficulty_window: u64,
    pub max_block_transactions: usize,
    pub mempool_capacity: usize,

    pub consensus_mode: String,
    pub pow_weight: f64,
    pub pos_weight: f64,
    pub min_validator_stake: u64,

    pub mining_enabled: bool,
    pub miner_address: String,

    pub signature_mode: String,
    pub contract_instruction_budget: u64,

    pub chain_log_path: Option<String>,
    pub validator_snapshot_path: Option<String>,
    pub peer_snapshot_path: Option<String>,

    pub genesis_allocations: Vec<(String, u64)>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: "node-0".to_string(),
            listen_address: "0.0.0.0".to_string(),
            listen_port: 7070,
            seed_peers: Vec::new(),
            api_bind_port: 8080,

            target_block_interval_secs: 30,
            initial_difficulty: 1,
            difficulty_window: 100,
            max_block_transactions: 500,
            mempool_capacity: 5000,

            consensus_mode: "pow".to_string(),
            pow_weight: 0.3,
            pos_weight: 0.7,
            min_validator_stake: 100,

            mining_enabled: true,
            miner_address: Address::stake_registry().to_base58(),

            signature_mode: "disabled".to_string(),
            contract_instruction_budget: 10_000,

            chain_log_path: None,
            validator_snapshot_path: None,
            peer_snapshot_path: None,

            genesis_allocations: Vec::new(),
        }
    }
}

impl NodeConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let mut config = if path.as_ref().exists() {
            let text = std::fs::read_to_string(path)?;
            toml::from_str(&text)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Applies `NODE__<FIELD>` overrides on top of the file-or-default
    /// config, in the style of a layered config loader: file sets the
    /// baseline, the environment wins.
    fn apply_env_overrides(&mut self) {
        macro_rules! override_field {
            ($field:ident, $env:literal, $parse:expr) => {
                if let Ok(value) = std::env::var(concat!("NODE__", $env)) {
                    if let Some(parsed) = $parse(value) {
                        self.$field = parsed;
                    }
                }
            };
        }

        override_field!(node_id, "NODE_ID", |v: String| Some(v));
        override_field!(listen_address, "LISTEN_ADDRESS", |v: String| Some(v));
        override_field!(listen_port, "LISTEN_PORT", |v: String| v.parse().ok());
        override_field!(api_bind_port, "API_BIND_PORT", |v: String| v.parse().ok());
        override_field!(consensus_mode, "CONSENSUS_MODE", |v: String| Some(v));
        override_field!(mining_enabled, "MINING_ENABLED", |v: String| v.parse().ok());
        override_field!(miner_address, "MINER_ADDRESS", |v: String| Some(v));
        override_field!(min_validator_stake, "MIN_VALIDATOR_STAKE", |v: String| v
            .parse()
            .ok());

        if let Ok(value) = std::env::var("NODE__SEED_PEERS") {
            self.seed_peers = value.split(',').map(|s| s.trim().to_string()).collect();
        }
    }

    pub fn consensus_mode(&self) -> ConsensusMode {
        match self.consensus_mode.as_str() {
            "pow" => ConsensusMode::Pow,
            "pos" => ConsensusMode::Pos,
            _ => ConsensusMode::Hybrid {
                pow_weight: self.pow_weight,
                pos_weight: self.pos_weight,
            },
        }
    }

    pub fn signature_mode(&self) -> SignatureMode {
        match self.signature_mode.as_str() {
            "ed25519" => SignatureMode::Ed25519,
            _ => SignatureMode::Disabled,
        }
    }

    pub fn miner_address(&self) -> anyhow::Result<Address> {
        Address::from_base58(&self.miner_address).map_err(|e| anyhow::anyhow!(e.to_string()))
    }

    pub fn ledger_config(&self) -> anyhow::Result<LedgerConfig> {
        let mut genesis_allocations = Vec::with_capacity(self.genesis_allocations.len());
        for (addr, balance) in &self.genesis_allocations {
            let address =
                Address::from_base58(addr).map_err(|e| anyhow::anyhow!(e.to_string()))?;
            genesis_allocations.push((address, *balance));
        }
        Ok(LedgerConfig {
            max_block_transactions: self.max_block_transactions,
            mempool_capacity: self.mempool_capacity,
            difficulty_window: self.difficulty_window,
            target_block_interval_secs: self.target_block_interval_secs as i64,
            initial_difficulty: self.initial_difficulty,
            min_validator_stake: self.min_validator_stake,
            signature_mode: self.signature_mode(),
            contract_instruction_budget: self.contract_instruction_budget,
            genesis_allocations,
            genesis_proposer: self.miner_address()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let config = NodeConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: NodeConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.node_id, config.node_id);
        assert_eq!(parsed.listen_port, config.listen_port);
    }

    #[test]
    fn unknown_consensus_mode_string_falls_back_to_hybrid() {
        let mut config = NodeConfig::default();
        config.consensus_mode = "bogus".to_string();
        match config.consensus_mode() {
            ConsensusMode::Hybrid { .. } => {}
            _ => panic!("expected hybrid fallback"),
        }
    }
}
