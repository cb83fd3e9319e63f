//! Server configuration

use log::warn;
use serde::{Deserialize, Serialize};

use crate::game::catalog::RarityWeights;
use crate::game::identity::MIN_HISTORY_DEPTH;

pub const BIND_VAR: &str = "ADVANTAGE_CHESS_BIND";
pub const SEED_VAR: &str = "ADVANTAGE_CHESS_SEED";
pub const HISTORY_DEPTH_VAR: &str = "ADVANTAGE_CHESS_HISTORY_DEPTH";
pub const WEIGHTS_VAR: &str = "ADVANTAGE_CHESS_WEIGHTS";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind the server
    pub bind_address: String,
    /// Fixed seed for advantage assignment; entropy when absent
    pub seed: Option<u64>,
    /// Half-moves of piece history kept per room
    pub history_depth: usize,
    pub rarity_weights: RarityWeights,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            seed: None,
            history_depth: 12,
            rarity_weights: RarityWeights::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unparseable values keep the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ServerConfig::default();

        if let Some(bind) = lookup(BIND_VAR) {
            if bind.trim().is_empty() {
                warn!("{} is empty, using {}", BIND_VAR, config.bind_address);
            } else {
                config.bind_address = bind.trim().to_string();
            }
        }

        if let Some(seed) = lookup(SEED_VAR) {
            match seed.trim().parse::<u64>() {
                Ok(seed) => config.seed = Some(seed),
                Err(_) => warn!("Ignoring invalid {}: {}", SEED_VAR, seed),
            }
        }

        if let Some(depth) = lookup(HISTORY_DEPTH_VAR) {
            match depth.trim().parse::<usize>() {
                Ok(depth) if depth >= MIN_HISTORY_DEPTH => config.history_depth = depth,
                Ok(depth) => {
                    warn!(
                        "{} of {} is below {}, clamping",
                        HISTORY_DEPTH_VAR, depth, MIN_HISTORY_DEPTH
                    );
                    config.history_depth = MIN_HISTORY_DEPTH;
                }
                Err(_) => warn!("Ignoring invalid {}: {}", HISTORY_DEPTH_VAR, depth),
            }
        }

        if let Some(weights) = lookup(WEIGHTS_VAR) {
            match parse_weights(&weights) {
                Some(parsed) => config.rarity_weights = parsed,
                None => warn!("Ignoring invalid {}: {}", WEIGHTS_VAR, weights),
            }
        }

        config
    }
}

/// `common,rare,legendary`, e.g. `60,30,10`.
fn parse_weights(text: &str) -> Option<RarityWeights> {
    let parts: Vec<u32> = text
        .split(',')
        .map(|part| part.trim().parse::<u32>())
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [common, rare, legendary] => Some(RarityWeights {
            common: *common,
            rare: *rare,
            legendary: *legendary,
        }),
        _ => None,
    }
}
