//! Chain access used by the fixture: balance reads and coin transfers.

use crate::account::{AccountAddress, TestAccount};
use crate::cli::AptosCli;
use crate::command::{CommandError, CommandRunner, run_checked};
use crate::config::FixtureConfig;
use aptos_http_client::{HttpClient, HttpError};
use async_trait::async_trait;
use snafu::Snafu;
use std::sync::Arc;

pub const APTOS_COIN_TYPE: &str = "0x1::aptos_coin::AptosCoin";

#[derive(Debug, Snafu)]
pub enum ChainError {
    #[snafu(display("Node request failed: {source}"))]
    Http { source: HttpError },

    #[snafu(display("Unexpected node response: {message}"))]
    InvalidResponse { message: String },

    #[snafu(display("{source}"))]
    Command { source: CommandError },
}

#[async_trait]
/// The chain operations the fixture depends on. Implementations are shared across concurrent
/// sweep tasks and must not hold per-caller state.
pub trait ChainClient: Send + Sync {
    /// APT balance of `address` in octas.
    async fn balance(&self, address: &AccountAddress) -> Result<u64, ChainError>;

    /// Transfers `amount` octas from `from` to `to`, resolving once the transfer is committed.
    async fn transfer(
        &self,
        from: &TestAccount,
        to: &AccountAddress,
        amount: u64,
    ) -> Result<(), ChainError>;
}

/// Reads balances from the fullnode REST API and submits transfers through the Aptos CLI.
pub struct AptosNodeClient {
    http: Arc<dyn HttpClient>,
    runner: Arc<dyn CommandRunner>,
    cli: AptosCli,
}

impl AptosNodeClient {
    pub fn new(
        http: Arc<dyn HttpClient>,
        runner: Arc<dyn CommandRunner>,
        config: &FixtureConfig,
    ) -> Self {
        Self {
            http,
            runner,
            cli: AptosCli::new(config),
        }
    }

    /// Node client over reqwest. Only builds the HTTP client; no request is made.
    #[cfg(feature = "default_http_client")]
    pub fn from_config(runner: Arc<dyn CommandRunner>, config: &FixtureConfig) -> Self {
        let http = Arc::new(aptos_http_client::DefaultHttpClient::new(&config.node_url));
        Self::new(http, runner, config)
    }

    fn balance_path(address: &AccountAddress) -> String {
        format!("/v1/accounts/{}/balance/{}", address, APTOS_COIN_TYPE)
    }
}

/// Parses the balance endpoint body, which is a bare JSON integer (some node versions quote it).
fn parse_balance(body: &[u8]) -> Result<u64, ChainError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| ChainError::InvalidResponse {
            message: format!("balance body is not JSON: {}", e),
        })?;

    match &value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
    .ok_or_else(|| ChainError::InvalidResponse {
        message: format!("balance is not an unsigned integer: {}", value),
    })
}

#[async_trait]
impl ChainClient for AptosNodeClient {
    async fn balance(&self, address: &AccountAddress) -> Result<u64, ChainError> {
        match self.http.get(Self::balance_path(address)).await {
            Ok(response) => parse_balance(&response.body),
            // Accounts the faucet never reached do not exist on-chain yet.
            Err(e) if e.status() == Some(404) => Ok(0),
            Err(source) => Err(ChainError::Http { source }),
        }
    }

    async fn transfer(
        &self,
        from: &TestAccount,
        to: &AccountAddress,
        amount: u64,
    ) -> Result<(), ChainError> {
        let command = self
            .cli
            .transfer(&from.address(), &from.private_key_hex(), to, amount);
        run_checked(self.runner.as_ref(), &command)
            .await
            .map_err(|source| ChainError::Command { source })
    }
}
