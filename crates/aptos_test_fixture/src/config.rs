use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Default reserve left behind by a sweep: 0.1 APT, enough to cover gas for the transfer.
pub const DEFAULT_SWEEP_RESERVE: u64 = 10_000_000;

pub const DEFAULT_CLI_PROGRAM: &str = "aptos";

pub const DEFAULT_MODULE_NAMESPACE: &str = "hamsterpocket";

/// The Aptos networks a fixture can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AptosNetwork {
    /// A node started with `aptos node run-local-testnet`
    Local,
    Devnet,
    Testnet,
}

impl AptosNetwork {
    pub fn as_str(&self) -> &'static str {
        match self {
            AptosNetwork::Local => "local",
            AptosNetwork::Devnet => "devnet",
            AptosNetwork::Testnet => "testnet",
        }
    }

    pub fn node_url(&self) -> &'static str {
        match self {
            AptosNetwork::Local => "http://127.0.0.1:8080",
            AptosNetwork::Devnet => "https://fullnode.devnet.aptoslabs.com",
            AptosNetwork::Testnet => "https://fullnode.testnet.aptoslabs.com",
        }
    }

    pub fn faucet_url(&self) -> &'static str {
        match self {
            AptosNetwork::Local => "http://127.0.0.1:8081",
            AptosNetwork::Devnet => "https://faucet.devnet.aptoslabs.com",
            AptosNetwork::Testnet => "https://faucet.testnet.aptoslabs.com",
        }
    }
}

impl FromStr for AptosNetwork {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" | "localnet" => Ok(AptosNetwork::Local),
            "devnet" => Ok(AptosNetwork::Devnet),
            "testnet" => Ok(AptosNetwork::Testnet),
            other => Err(format!("Unknown Aptos network: {}", other)),
        }
    }
}

/// Everything the fixture needs to reach the network and drive the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureConfig {
    pub network: AptosNetwork,
    /// Fullnode REST endpoint, without the `/v1` suffix.
    pub node_url: String,
    pub faucet_url: String,
    /// Program used to invoke the Aptos CLI.
    pub cli_program: String,
    /// Named address the published package binds to the resource account.
    pub module_namespace: String,
    /// Move package directory passed to `aptos move publish`; the CLI's working directory when unset.
    pub package_dir: Option<PathBuf>,
    /// Octas left behind in each account by a sweep.
    pub sweep_reserve: u64,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self::for_network(AptosNetwork::Testnet)
    }
}

impl FixtureConfig {
    pub fn for_network(network: AptosNetwork) -> Self {
        Self {
            network,
            node_url: network.node_url().to_string(),
            faucet_url: network.faucet_url().to_string(),
            cli_program: DEFAULT_CLI_PROGRAM.to_string(),
            module_namespace: DEFAULT_MODULE_NAMESPACE.to_string(),
            package_dir: None,
            sweep_reserve: DEFAULT_SWEEP_RESERVE,
        }
    }

    pub fn testnet() -> Self {
        Self::for_network(AptosNetwork::Testnet)
    }

    /// Reads overrides from the environment (and a `.env` file when present), falling back to
    /// testnet defaults for anything unset or unparsable.
    pub fn from_environment_or_testnet() -> Self {
        let _ = dotenvy::dotenv();

        let network = env::var("APTOS_NETWORK")
            .ok()
            .and_then(|n| n.parse().ok())
            .unwrap_or(AptosNetwork::Testnet);
        let defaults = Self::for_network(network);

        Self {
            network,
            node_url: env::var("APTOS_NODE_URL").unwrap_or(defaults.node_url),
            faucet_url: env::var("APTOS_FAUCET_URL").unwrap_or(defaults.faucet_url),
            cli_program: env::var("APTOS_CLI").unwrap_or(defaults.cli_program),
            module_namespace: env::var("APTOS_MODULE_NAMESPACE")
                .unwrap_or(defaults.module_namespace),
            package_dir: env::var("APTOS_PACKAGE_DIR").ok().map(PathBuf::from),
            sweep_reserve: env::var("APTOS_SWEEP_RESERVE")
                .ok()
                .and_then(|r| r.parse().ok())
                .unwrap_or(defaults.sweep_reserve),
        }
    }

    pub fn with_package_dir(mut self, package_dir: impl Into<PathBuf>) -> Self {
        self.package_dir = Some(package_dir.into());
        self
    }

    pub fn with_sweep_reserve(mut self, sweep_reserve: u64) -> Self {
        self.sweep_reserve = sweep_reserve;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_testnet_defaults() {
        let config = FixtureConfig::testnet();

        assert_eq!(config.node_url, "https://fullnode.testnet.aptoslabs.com");
        assert_eq!(config.faucet_url, "https://faucet.testnet.aptoslabs.com");
        assert_eq!(config.cli_program, "aptos");
        assert_eq!(config.module_namespace, "hamsterpocket");
        assert_eq!(config.sweep_reserve, 10_000_000);
        assert_eq!(config.package_dir, None);
        assert_eq!(FixtureConfig::default(), config);
    }

    #[test]
    fn test_network_parsing() {
        assert_eq!("localnet".parse::<AptosNetwork>(), Ok(AptosNetwork::Local));
        assert_eq!("Devnet".parse::<AptosNetwork>(), Ok(AptosNetwork::Devnet));
        assert_eq!("testnet".parse::<AptosNetwork>(), Ok(AptosNetwork::Testnet));
        assert!("mainnet".parse::<AptosNetwork>().is_err());
    }

    #[test]
    fn test_builder_overrides() {
        let config = FixtureConfig::for_network(AptosNetwork::Local)
            .with_package_dir("move/pocket")
            .with_sweep_reserve(500);

        assert_eq!(config.node_url, "http://127.0.0.1:8080");
        assert_eq!(config.package_dir, Some(PathBuf::from("move/pocket")));
        assert_eq!(config.sweep_reserve, 500);
    }

    const ENV_VARS: [&str; 7] = [
        "APTOS_NETWORK",
        "APTOS_NODE_URL",
        "APTOS_FAUCET_URL",
        "APTOS_CLI",
        "APTOS_MODULE_NAMESPACE",
        "APTOS_PACKAGE_DIR",
        "APTOS_SWEEP_RESERVE",
    ];

    fn set_env(vars: &[(&str, &str)]) {
        // SAFETY: only this test touches the APTOS_* variables.
        unsafe {
            for name in ENV_VARS {
                env::remove_var(name);
            }
            for (name, value) in vars {
                env::set_var(name, value);
            }
        }
    }

    // One test: the environment is process-global.
    #[test]
    fn test_environment_overrides_and_fallbacks() {
        set_env(&[]);
        assert_eq!(
            FixtureConfig::from_environment_or_testnet(),
            FixtureConfig::testnet()
        );

        set_env(&[("APTOS_NETWORK", "devnet")]);
        assert_eq!(
            FixtureConfig::from_environment_or_testnet(),
            FixtureConfig::for_network(AptosNetwork::Devnet)
        );

        set_env(&[
            ("APTOS_NETWORK", "localnet"),
            ("APTOS_NODE_URL", "http://10.0.0.5:8080"),
            ("APTOS_FAUCET_URL", "http://10.0.0.5:8081"),
            ("APTOS_CLI", "/opt/aptos/bin/aptos"),
            ("APTOS_MODULE_NAMESPACE", "pocket"),
            ("APTOS_PACKAGE_DIR", "move/pocket"),
            ("APTOS_SWEEP_RESERVE", "2500"),
        ]);
        let config = FixtureConfig::from_environment_or_testnet();
        assert_eq!(config.network, AptosNetwork::Local);
        assert_eq!(config.node_url, "http://10.0.0.5:8080");
        assert_eq!(config.faucet_url, "http://10.0.0.5:8081");
        assert_eq!(config.cli_program, "/opt/aptos/bin/aptos");
        assert_eq!(config.module_namespace, "pocket");
        assert_eq!(config.package_dir, Some(PathBuf::from("move/pocket")));
        assert_eq!(config.sweep_reserve, 2500);

        set_env(&[
            ("APTOS_NETWORK", "mainnet"),
            ("APTOS_SWEEP_RESERVE", "a lot"),
        ]);
        let config = FixtureConfig::from_environment_or_testnet();
        assert_eq!(config.network, AptosNetwork::Testnet);
        assert_eq!(config.node_url, "https://fullnode.testnet.aptoslabs.com");
        assert_eq!(config.sweep_reserve, DEFAULT_SWEEP_RESERVE);

        set_env(&[]);
    }
}
