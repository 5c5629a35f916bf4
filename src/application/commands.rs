//! CLI commands and handlers
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;

use crate::application::report::ScenarioReport;
use crate::application::scenario::{Scenario, ScenarioRunner};
use crate::infrastructure::record::{PoolRecord, MEMBER_RECORD_LEN, POOL_HEADER_LEN};
use crate::shared::config::EngineConfig;
use crate::shared::errors::AppError;

#[derive(Parser)]
#[command(name = "wpools")]
#[command(version, about = "Weighted multi-asset liquidity pool engine")]
pub struct Cli {
    /// Path to config file (defaults to ./wpools.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a scenario against an in-memory ledger and print the report
    Run {
        /// Scenario file (TOML)
        scenario: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the encoded size of a pool record
    Layout {
        /// Member capacity
        #[arg(short, long)]
        capacity: Option<u16>,
    },

    /// Replay a scenario and print the resulting pool record as hex
    Encode {
        /// Scenario file (TOML)
        scenario: PathBuf,
    },
}

pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute the selected command
    pub fn execute(command: Commands, config: EngineConfig) -> Result<(), AppError> {
        match command {
            Commands::Run { scenario, json } => Self::execute_run_command(scenario, json, &config),
            Commands::Layout { capacity } => Self::execute_layout_command(capacity, &config),
            Commands::Encode { scenario } => Self::execute_encode_command(scenario, &config),
        }
    }

    fn replay(path: &Path, config: &EngineConfig) -> Result<(ScenarioRunner, ScenarioReport), AppError> {
        let scenario = Scenario::from_file(path)?;
        let policy = scenario.deposit_policy.unwrap_or(config.deposit_policy);
        info!("📂 Scenario {} (deposit policy: {})", path.display(), policy.as_str());

        let mut runner = ScenarioRunner::new(config, policy)?;
        let report = runner.run(&scenario)?;
        Ok((runner, report))
    }

    fn execute_run_command(path: PathBuf, json: bool, config: &EngineConfig) -> Result<(), AppError> {
        let (_, report) = Self::replay(&path, config)?;
        if json {
            let rendered = report
                .to_json()
                .map_err(|e| AppError::ScenarioError(format!("Failed to render report: {}", e)))?;
            println!("{}", rendered);
        } else {
            for line in report.summary() {
                println!("{}", line);
            }
        }
        Ok(())
    }

    fn execute_layout_command(capacity: Option<u16>, config: &EngineConfig) -> Result<(), AppError> {
        let capacity = capacity.unwrap_or(config.default_capacity);
        if capacity == 0 {
            return Err(AppError::ConfigError("capacity must be greater than zero".to_string()));
        }
        println!("📐 Pool record layout (capacity {})", capacity);
        println!("   header:  {} bytes", POOL_HEADER_LEN);
        println!("   members: {} x {} bytes", capacity, MEMBER_RECORD_LEN);
        println!("   total:   {} bytes", PoolRecord::encoded_len(capacity as usize));
        Ok(())
    }

    fn execute_encode_command(path: PathBuf, config: &EngineConfig) -> Result<(), AppError> {
        let (runner, _) = Self::replay(&path, config)?;
        let bytes = runner.service().record(runner.pool())?.encode()?;
        info!("Encoded pool {} ({} bytes)", runner.pool(), bytes.len());
        println!("{}", hex::encode(bytes));
        Ok(())
    }
}
