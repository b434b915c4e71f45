//! In-memory stand-ins for the CLI and the node, for exercising fixture logic offline.

use crate::account::{AccountAddress, TestAccount};
use crate::chain::{ChainClient, ChainError};
use crate::command::{CommandError, CommandLine, CommandRunner, CommandStatus};
use aptos_http_client::{HttpClient, HttpError, HttpMethod, HttpResponse};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// Octas granted per faucet request, matching the public testnet faucet.
pub const DEFAULT_FAUCET_AMOUNT: u64 = 100_000_000;

#[derive(Default)]
struct LedgerState {
    balances: HashMap<AccountAddress, u64>,
    commands: Vec<CommandLine>,
    failing_subcommands: HashSet<String>,
    failing_transfers: HashSet<AccountAddress>,
    failing_balance_reads: HashSet<AccountAddress>,
    published_under: Vec<AccountAddress>,
}

/// A fake network that plays both the Aptos CLI and the fullnode.
///
/// Faucet commands credit [`DEFAULT_FAUCET_AMOUNT`] (or the configured amount), transfers move
/// octas between accounts and charge an optional flat fee to the sender. Every command is
/// recorded in order.
pub struct LocalLedger {
    state: Mutex<LedgerState>,
    faucet_amount: u64,
    transfer_fee: u64,
    transfers_in_flight: AtomicUsize,
    max_transfers_in_flight: AtomicUsize,
}

impl Default for LocalLedger {
    fn default() -> Self {
        Self::new(DEFAULT_FAUCET_AMOUNT)
    }
}

impl LocalLedger {
    pub fn new(faucet_amount: u64) -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            faucet_amount,
            transfer_fee: 0,
            transfers_in_flight: AtomicUsize::new(0),
            max_transfers_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_transfer_fee(mut self, transfer_fee: u64) -> Self {
        self.transfer_fee = transfer_fee;
        self
    }

    pub async fn set_balance(&self, address: &AccountAddress, balance: u64) {
        self.state.lock().await.balances.insert(*address, balance);
    }

    pub async fn balance_of(&self, address: &AccountAddress) -> u64 {
        self.state
            .lock()
            .await
            .balances
            .get(address)
            .copied()
            .unwrap_or(0)
    }

    /// Makes every CLI invocation whose second token is `subcommand` (e.g. `publish`,
    /// `fund-with-faucet`) exit with status 1.
    pub async fn fail_subcommand(&self, subcommand: &str) {
        self.state
            .lock()
            .await
            .failing_subcommands
            .insert(subcommand.to_string());
    }

    pub async fn fail_transfers_from(&self, address: &AccountAddress) {
        self.state.lock().await.failing_transfers.insert(*address);
    }

    pub async fn fail_balance_reads_for(&self, address: &AccountAddress) {
        self.state
            .lock()
            .await
            .failing_balance_reads
            .insert(*address);
    }

    /// Drops every failure injected so far.
    pub async fn clear_failures(&self) {
        let mut state = self.state.lock().await;
        state.failing_subcommands.clear();
        state.failing_transfers.clear();
        state.failing_balance_reads.clear();
    }

    pub async fn commands(&self) -> Vec<CommandLine> {
        self.state.lock().await.commands.clone()
    }

    /// Commands whose second token is `subcommand`.
    pub async fn commands_for(&self, subcommand: &str) -> Vec<CommandLine> {
        self.commands()
            .await
            .into_iter()
            .filter(|c| c.args.get(1).map(String::as_str) == Some(subcommand))
            .collect()
    }

    pub async fn published_under(&self) -> Vec<AccountAddress> {
        self.state.lock().await.published_under.clone()
    }

    /// Highest number of [`ChainClient::transfer`] calls observed running at the same time.
    pub fn max_transfers_in_flight(&self) -> usize {
        self.max_transfers_in_flight.load(Ordering::SeqCst)
    }

    fn apply_transfer(
        &self,
        state: &mut LedgerState,
        from: &AccountAddress,
        to: &AccountAddress,
        amount: u64,
    ) -> Result<(), ChainError> {
        let required = amount.saturating_add(self.transfer_fee);
        let balance = state.balances.get(from).copied().unwrap_or(0);
        if balance < required {
            return Err(ChainError::InvalidResponse {
                message: format!(
                    "insufficient balance: {} available, {} required",
                    balance, required
                ),
            });
        }

        state.balances.insert(*from, balance - required);
        *state.balances.entry(*to).or_insert(0) += amount;
        Ok(())
    }
}

fn parse_address_flag(command: &CommandLine, flag: &str) -> Option<AccountAddress> {
    command.flag_value(flag).and_then(|v| v.parse().ok())
}

#[async_trait]
impl CommandRunner for LocalLedger {
    async fn run(&self, command: &CommandLine) -> Result<CommandStatus, CommandError> {
        let mut state = self.state.lock().await;
        state.commands.push(command.clone());

        let subcommand = command.args.get(1).cloned().unwrap_or_default();
        if state.failing_subcommands.contains(&subcommand) {
            return Ok(CommandStatus::failure(1));
        }

        match subcommand.as_str() {
            "fund-with-faucet" => match parse_address_flag(command, "--account") {
                Some(account) => {
                    *state.balances.entry(account).or_insert(0) += self.faucet_amount;
                    Ok(CommandStatus::SUCCESS)
                }
                None => Ok(CommandStatus::failure(2)),
            },
            "publish" => match parse_address_flag(command, "--sender-account") {
                Some(sender) => {
                    state.published_under.push(sender);
                    Ok(CommandStatus::SUCCESS)
                }
                None => Ok(CommandStatus::failure(2)),
            },
            "transfer" => {
                let from = parse_address_flag(command, "--sender-account");
                let to = parse_address_flag(command, "--account");
                let amount = command.flag_value("--amount").and_then(|a| a.parse().ok());
                match (from, to, amount) {
                    (Some(from), Some(to), Some(amount)) => {
                        match self.apply_transfer(&mut state, &from, &to, amount) {
                            Ok(()) => Ok(CommandStatus::SUCCESS),
                            Err(_) => Ok(CommandStatus::failure(1)),
                        }
                    }
                    _ => Ok(CommandStatus::failure(2)),
                }
            }
            _ => Ok(CommandStatus::SUCCESS),
        }
    }
}

#[async_trait]
impl ChainClient for LocalLedger {
    async fn balance(&self, address: &AccountAddress) -> Result<u64, ChainError> {
        let state = self.state.lock().await;
        if state.failing_balance_reads.contains(address) {
            return Err(ChainError::InvalidResponse {
                message: format!("simulated balance failure for {}", address),
            });
        }
        Ok(state.balances.get(address).copied().unwrap_or(0))
    }

    async fn transfer(
        &self,
        from: &TestAccount,
        to: &AccountAddress,
        amount: u64,
    ) -> Result<(), ChainError> {
        let in_flight = self.transfers_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_transfers_in_flight
            .fetch_max(in_flight, Ordering::SeqCst);

        // Let sibling transfers start before this one settles.
        tokio::task::yield_now().await;

        let result = {
            let mut state = self.state.lock().await;
            if state.failing_transfers.contains(&from.address()) {
                Err(ChainError::InvalidResponse {
                    message: format!("simulated transfer failure for {}", from.address()),
                })
            } else {
                self.apply_transfer(&mut state, &from.address(), to, amount)
            }
        };

        self.transfers_in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// An [`HttpClient`] that answers every request with the same response and records the paths.
pub struct StaticHttpClient {
    response: Result<Vec<u8>, (u16, String)>,
    paths: Mutex<Vec<String>>,
}

impl StaticHttpClient {
    pub fn ok(body: Vec<u8>) -> Self {
        Self {
            response: Ok(body),
            paths: Mutex::new(Vec::new()),
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            response: Err((status, body.to_string())),
            paths: Mutex::new(Vec::new()),
        }
    }

    pub async fn requested_paths(&self) -> Vec<String> {
        self.paths.lock().await.clone()
    }
}

#[async_trait]
impl HttpClient for StaticHttpClient {
    async fn request(
        &self,
        _http_method: HttpMethod,
        path: String,
        _query: Option<HashMap<String, String>>,
        _body: Option<Vec<u8>>,
        _headers: Option<HashMap<String, String>>,
    ) -> Result<HttpResponse, HttpError> {
        self.paths.lock().await.push(path);
        match &self.response {
            Ok(body) => Ok(HttpResponse {
                body: body.clone(),
                headers: HashMap::new(),
            }),
            Err((status, body)) => Err(HttpError::StatusError {
                status: *status,
                body: body.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_overdrawn_transfer_is_rejected_without_moving_funds() {
        let ledger = LocalLedger::default();
        let sender = TestAccount::generate();
        let target: AccountAddress = "0xfee".parse().unwrap();
        ledger.set_balance(&sender.address(), 500).await;

        let result = ledger.transfer(&sender, &target, 501).await;

        match result {
            Err(ChainError::InvalidResponse { message }) => {
                assert_eq!(message, "insufficient balance: 500 available, 501 required")
            }
            other => panic!("expected InvalidResponse, got {:?}", other),
        }
        assert_eq!(ledger.balance_of(&sender.address()).await, 500);
        assert_eq!(ledger.balance_of(&target).await, 0);
    }
}
