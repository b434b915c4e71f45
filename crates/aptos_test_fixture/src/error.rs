//! Error types for the test fixture manager.
//!
//! Deployment and funding errors are fail-fast and propagate to the caller of the single
//! operation that raised them. Sweep errors never propagate; they are collected per account
//! into a [`crate::SweepReport`].

use crate::account::AccountAddress;
use crate::chain::ChainError;
use crate::command::CommandError;
use snafu::Snafu;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// The step of [`crate::FixtureManager::deploy_program`] that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployStep {
    /// Funding the resource account through the faucet.
    Funding,
    /// Publishing the package under the resource account.
    Publish,
}

impl Display for DeployStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DeployStep::Funding => write!(f, "faucet funding"),
            DeployStep::Publish => write!(f, "package publish"),
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FixtureError {
    #[snafu(display("Deployment failed during {step}: {source}"))]
    DeploymentFailed {
        step: DeployStep,
        source: CommandError,
    },

    #[snafu(display("Faucet funding failed for {address}: {source}"))]
    FundingFailed {
        address: AccountAddress,
        source: CommandError,
    },

    #[snafu(display("Transfer from {address} failed: {source}"))]
    TransferFailed {
        address: AccountAddress,
        source: ChainError,
    },

    #[snafu(display("Could not read balance of {address}: {source}"))]
    BalanceUnavailable {
        address: AccountAddress,
        source: ChainError,
    },

    #[snafu(display("Program already deployed under resource account {address}"))]
    AlreadyDeployed { address: AccountAddress },

    #[snafu(display("{message}"))]
    InvalidAddress { message: String },

    #[snafu(display("Invalid private key: {message}"))]
    InvalidPrivateKey { message: String },
}
