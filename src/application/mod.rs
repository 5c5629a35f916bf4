//! Application layer - atomic pool service, scenario replay and CLI

pub mod commands;
pub mod pool_service;
pub mod report;
pub mod scenario;

pub use commands::{Cli, CommandExecutor, Commands};
pub use pool_service::PoolService;
pub use report::ScenarioReport;
pub use scenario::{Scenario, ScenarioRunner};
