use crate::account::AccountAddress;
use crate::error::FixtureError;

/// An account whose surplus was transferred to the sweep target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweptAccount {
    pub address: AccountAddress,
    pub balance: u64,
    pub amount: u64,
}

/// Why an account was left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Balance was at or below the reserve.
    BelowReserve { balance: u64 },
    /// The account is the sweep target itself.
    IsTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedAccount {
    pub address: AccountAddress,
    pub reason: SkipReason,
}

#[derive(Debug)]
pub struct SweepFailure {
    pub address: AccountAddress,
    pub error: FixtureError,
}

/// Terminal state of one account's sweep.
#[derive(Debug)]
pub enum SweepOutcome {
    Swept(SweptAccount),
    Skipped(SkippedAccount),
    Failed(SweepFailure),
}

/// Settled result of [`crate::FixtureManager::collect_all_faucet`]: every managed account
/// lands in exactly one of the three lists, in registry order.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub succeeded: Vec<SweptAccount>,
    pub skipped: Vec<SkippedAccount>,
    pub failed: Vec<SweepFailure>,
}

impl SweepReport {
    /// Total octas moved to the target.
    pub fn total_transferred(&self) -> u64 {
        self.succeeded.iter().map(|s| s.amount).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn accounts_settled(&self) -> usize {
        self.succeeded.len() + self.skipped.len() + self.failed.len()
    }

    pub fn failed_addresses(&self) -> Vec<AccountAddress> {
        self.failed.iter().map(|f| f.address).collect()
    }
}

impl FromIterator<SweepOutcome> for SweepReport {
    fn from_iter<I: IntoIterator<Item = SweepOutcome>>(iter: I) -> Self {
        let mut report = SweepReport::default();
        for outcome in iter {
            match outcome {
                SweepOutcome::Swept(swept) => report.succeeded.push(swept),
                SweepOutcome::Skipped(skipped) => report.skipped.push(skipped),
                SweepOutcome::Failed(failure) => report.failed.push(failure),
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_partitions_outcomes() {
        let a: AccountAddress = "0xa".parse().unwrap();
        let b: AccountAddress = "0xb".parse().unwrap();
        let c: AccountAddress = "0xc".parse().unwrap();
        let d: AccountAddress = "0xd".parse().unwrap();

        let report: SweepReport = vec![
            SweepOutcome::Swept(SweptAccount {
                address: a,
                balance: 150,
                amount: 50,
            }),
            SweepOutcome::Skipped(SkippedAccount {
                address: b,
                reason: SkipReason::BelowReserve { balance: 20 },
            }),
            SweepOutcome::Failed(SweepFailure {
                address: c,
                error: FixtureError::InvalidAddress {
                    message: "boom".to_string(),
                },
            }),
            SweepOutcome::Swept(SweptAccount {
                address: d,
                balance: 300,
                amount: 200,
            }),
        ]
        .into_iter()
        .collect();

        assert_eq!(report.total_transferred(), 250);
        assert_eq!(report.accounts_settled(), 4);
        assert!(!report.is_complete());
        assert_eq!(report.failed_addresses(), vec![c]);
        assert_eq!(report.succeeded[1].address, d);
    }

    #[test]
    fn test_empty_report_is_complete() {
        let report = SweepReport::default();

        assert!(report.is_complete());
        assert_eq!(report.total_transferred(), 0);
    }
}
