//! Account lifecycle for an integration-test run.
//!
//! [`FixtureManager`] owns every account it creates for the lifetime of the run. Accounts are
//! registered before anything else happens to them, so teardown through
//! [`FixtureManager::collect_all_faucet`] reaches them even when their setup failed halfway.

use crate::account::{AccountAddress, TestAccount};
use crate::chain::ChainClient;
use crate::cli::{AptosCli, PublishRequest};
use crate::command::{CommandRunner, run_checked};
use crate::config::FixtureConfig;
use crate::error::{
    AlreadyDeployedSnafu, BalanceUnavailableSnafu, DeployStep, DeploymentFailedSnafu,
    FixtureError, FundingFailedSnafu, TransferFailedSnafu,
};
use crate::sweep::{
    SkipReason, SkippedAccount, SweepFailure, SweepOutcome, SweepReport, SweptAccount,
};
use futures::future::join_all;
use log::{debug, info, warn};
use snafu::ResultExt;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell, RwLock};

pub struct FixtureManager {
    config: FixtureConfig,
    cli: AptosCli,
    runner: Arc<dyn CommandRunner>,
    chain: Arc<dyn ChainClient>,
    deployer: OnceCell<TestAccount>,
    deploy_lock: Mutex<()>,
    resource_account: RwLock<Option<AccountAddress>>,
    managed_accounts: RwLock<Vec<TestAccount>>,
}

#[cfg(feature = "default_http_client")]
static SHARED: once_cell::sync::OnceCell<Arc<FixtureManager>> = once_cell::sync::OnceCell::new();

impl FixtureManager {
    pub fn new(
        config: FixtureConfig,
        runner: Arc<dyn CommandRunner>,
        chain: Arc<dyn ChainClient>,
    ) -> Self {
        Self {
            cli: AptosCli::new(&config),
            config,
            runner,
            chain,
            deployer: OnceCell::new(),
            deploy_lock: Mutex::new(()),
            resource_account: RwLock::new(None),
            managed_accounts: RwLock::new(Vec::new()),
        }
    }

    /// Manager that spawns the real Aptos CLI and reads balances from the configured node.
    #[cfg(feature = "default_http_client")]
    pub fn from_config(config: FixtureConfig) -> Self {
        debug!(
            "Building fixture manager for {} ({})",
            config.network.as_str(),
            config.node_url
        );
        let runner: Arc<dyn CommandRunner> = Arc::new(crate::command::SystemCommandRunner);
        let chain = Arc::new(crate::chain::AptosNodeClient::from_config(
            runner.clone(),
            &config,
        ));
        Self::new(config, runner, chain)
    }

    /// The process-wide manager, built from the environment on first access.
    ///
    /// Construction is local only: no request is sent and no process is spawned until an
    /// operation is called. Harnesses that can pass a handle around should prefer
    /// [`FixtureManager::new`].
    #[cfg(feature = "default_http_client")]
    pub fn shared() -> Arc<FixtureManager> {
        SHARED
            .get_or_init(|| {
                Arc::new(Self::from_config(
                    FixtureConfig::from_environment_or_testnet(),
                ))
            })
            .clone()
    }

    pub fn config(&self) -> &FixtureConfig {
        &self.config
    }

    pub fn chain(&self) -> &Arc<dyn ChainClient> {
        &self.chain
    }

    /// The resource account recorded by a successful [`FixtureManager::deploy_program`].
    pub async fn resource_account_address(&self) -> Option<AccountAddress> {
        *self.resource_account.read().await
    }

    /// Snapshot of every account created so far, in creation order.
    pub async fn managed_accounts(&self) -> Vec<TestAccount> {
        self.managed_accounts.read().await.clone()
    }

    /// Returns the deployer account, creating and registering it on the first call.
    pub async fn deployer_account(&self) -> TestAccount {
        self.deployer
            .get_or_init(|| async {
                let account = TestAccount::generate();
                self.register(&account).await;
                info!("Created deployer account {}", account.address());
                account
            })
            .await
            .clone()
    }

    async fn register(&self, account: &TestAccount) {
        let mut accounts = self.managed_accounts.write().await;
        if !accounts.contains(account) {
            accounts.push(account.clone());
            debug!(
                "Registered account {} ({} managed)",
                account.address(),
                accounts.len()
            );
        }
    }

    /// Funds `resource_address` from the faucet, then publishes the package under it.
    ///
    /// The resource account is recorded only once both steps succeed. A manager deploys at most
    /// once; later calls fail with [`FixtureError::AlreadyDeployed`] without running anything.
    pub async fn deploy_program(
        &self,
        deployer_address: &AccountAddress,
        resource_address: &AccountAddress,
        private_key: &str,
    ) -> Result<(), FixtureError> {
        let _deploying = self.deploy_lock.lock().await;

        if let Some(address) = self.resource_account_address().await {
            return AlreadyDeployedSnafu { address }.fail();
        }

        info!("Funding resource account {} from faucet", resource_address);
        run_checked(
            self.runner.as_ref(),
            &self.cli.fund_with_faucet(resource_address),
        )
        .await
        .context(DeploymentFailedSnafu {
            step: DeployStep::Funding,
        })?;

        info!(
            "Publishing {} under {} (deployer {})",
            self.config.module_namespace, resource_address, deployer_address
        );
        let publish = self.cli.publish(&PublishRequest {
            deployer_address,
            resource_address,
            private_key,
        });
        run_checked(self.runner.as_ref(), &publish)
            .await
            .context(DeploymentFailedSnafu {
                step: DeployStep::Publish,
            })?;

        *self.resource_account.write().await = Some(*resource_address);
        info!("Program deployed under {}", resource_address);
        Ok(())
    }

    /// Requests faucet funds for `address`. The faucet decides the amount.
    pub async fn fund_with_faucet(&self, address: &AccountAddress) -> Result<(), FixtureError> {
        run_checked(self.runner.as_ref(), &self.cli.fund_with_faucet(address))
            .await
            .context(FundingFailedSnafu { address: *address })
    }

    /// Creates a fresh account, registers it and funds it from the faucet.
    ///
    /// Registration happens first: if funding fails the account stays managed.
    pub async fn create_and_fund_account(&self) -> Result<TestAccount, FixtureError> {
        let account = TestAccount::generate();
        self.register(&account).await;
        self.fund_with_faucet(&account.address()).await?;
        Ok(account)
    }

    /// Moves every managed account's balance above the reserve to `target`.
    ///
    /// All accounts are swept concurrently and the call returns once each has settled. A failure
    /// on one account never stops the others; it is reported in [`SweepReport::failed`].
    /// The registry is left unchanged.
    pub async fn collect_all_faucet(&self, target: &AccountAddress) -> SweepReport {
        let accounts = self.managed_accounts().await;
        let reserve = self.config.sweep_reserve;

        info!(
            "Sweeping {} accounts to {} (reserve {} octas)",
            accounts.len(),
            target,
            reserve
        );

        let outcomes = join_all(
            accounts
                .iter()
                .map(|account| self.sweep_account(account, target, reserve)),
        )
        .await;
        let report: SweepReport = outcomes.into_iter().collect();

        for failure in &report.failed {
            warn!("Sweep of {} failed: {}", failure.address, failure.error);
        }
        info!(
            "Sweep finished: {} swept ({} octas), {} skipped, {} failed",
            report.succeeded.len(),
            report.total_transferred(),
            report.skipped.len(),
            report.failed.len()
        );
        report
    }

    async fn sweep_account(
        &self,
        account: &TestAccount,
        target: &AccountAddress,
        reserve: u64,
    ) -> SweepOutcome {
        let address = account.address();
        if address == *target {
            return SweepOutcome::Skipped(SkippedAccount {
                address,
                reason: SkipReason::IsTarget,
            });
        }

        let balance = match self
            .chain
            .balance(&address)
            .await
            .context(BalanceUnavailableSnafu { address })
        {
            Ok(balance) => balance,
            Err(error) => return SweepOutcome::Failed(SweepFailure { address, error }),
        };

        let amount = balance.saturating_sub(reserve);
        if amount == 0 {
            return SweepOutcome::Skipped(SkippedAccount {
                address,
                reason: SkipReason::BelowReserve { balance },
            });
        }

        match self
            .chain
            .transfer(account, target, amount)
            .await
            .context(TransferFailedSnafu { address })
        {
            Ok(()) => {
                debug!("Swept {} octas from {} to {}", amount, address, target);
                SweepOutcome::Swept(SweptAccount {
                    address,
                    balance,
                    amount,
                })
            }
            Err(error) => SweepOutcome::Failed(SweepFailure { address, error }),
        }
    }
}
