use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::shared::errors::AppError;
use crate::shared::types::DepositPolicy;

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "wpools.toml";

/// Program id used to derive pool sub-accounts when none is configured
pub const DEFAULT_PROGRAM_ID: &str = "3GBxn5VSThpKNyUgaQ96xjSXD2zJ1164LzK28MXv4MDC";

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Program id the pool authority, share mint and vaults are derived under
    pub program_id: String,
    /// Member capacity for pools that do not request one explicitly
    pub default_capacity: u16,
    pub deposit_policy: DepositPolicy,
    /// Default tracing filter, `RUST_LOG` wins when set
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program_id: DEFAULT_PROGRAM_ID.to_string(),
            default_capacity: 16,
            deposit_policy: DepositPolicy::AcceptWithDilution,
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn program_id(&self) -> Result<Pubkey, AppError> {
        Pubkey::from_str(&self.program_id)
            .map_err(|e| AppError::ConfigError(format!("Invalid program id {}: {}", self.program_id, e)))
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.program_id()?;
        if self.default_capacity == 0 {
            return Err(AppError::ConfigError(
                "default_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load `wpools.toml` from the working directory, falling back to defaults
    pub fn load_config() -> Result<EngineConfig, AppError> {
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            Self::load_from(DEFAULT_CONFIG_FILE)
        } else {
            Ok(EngineConfig::default())
        }
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<EngineConfig, AppError> {
        let config_content = fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::ConfigError(format!("Failed to read config file: {}", e)))?;

        Self::parse(&config_content)
    }

    pub fn parse(content: &str) -> Result<EngineConfig, AppError> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| AppError::ConfigError(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;

        Ok(config)
    }
}
