pub mod account;
pub mod chain;
pub mod cli;
pub mod command;
pub mod config;
mod error;
pub mod manager;
pub mod sweep;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use account::{AccountAddress, TestAccount};
pub use chain::{APTOS_COIN_TYPE, AptosNodeClient, ChainClient, ChainError};
pub use cli::{AptosCli, PublishRequest};
pub use command::{CommandError, CommandLine, CommandRunner, CommandStatus, SystemCommandRunner};
pub use config::{AptosNetwork, DEFAULT_SWEEP_RESERVE, FixtureConfig};
pub use error::{DeployStep, FixtureError};
pub use manager::FixtureManager;
pub use sweep::{SkipReason, SkippedAccount, SweepFailure, SweepOutcome, SweepReport, SweptAccount};
