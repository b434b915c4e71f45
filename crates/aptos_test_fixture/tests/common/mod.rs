#![allow(dead_code)]
pub mod logging;

use aptos_test_fixture::test_utils::LocalLedger;
use aptos_test_fixture::{AccountAddress, FixtureConfig, FixtureManager};
use logging::init_test_logging;
use rstest::fixture;
use std::sync::Arc;

pub type TestResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Reserve used by the offline fixtures: 0.1 APT.
pub const RESERVE: u64 = 10_000_000;

pub struct LedgerFixture {
    pub ledger: Arc<LocalLedger>,
    pub manager: FixtureManager,
}

impl LedgerFixture {
    pub fn new(ledger: LocalLedger) -> Self {
        init_test_logging();
        let ledger = Arc::new(ledger);
        let config = FixtureConfig::testnet().with_sweep_reserve(RESERVE);
        let manager = FixtureManager::new(config, ledger.clone(), ledger.clone());
        Self { ledger, manager }
    }
}

#[fixture]
pub fn ledger_fixture() -> LedgerFixture {
    LedgerFixture::new(LocalLedger::default())
}

/// A sweep target that none of the fixture's accounts can collide with.
#[fixture]
pub fn sweep_target() -> AccountAddress {
    "0xc0ffee".parse().expect("valid address literal")
}
