use crate::account::AccountAddress;
use crate::command::CommandLine;
use crate::config::FixtureConfig;

/// Builds the Aptos CLI invocations the fixture needs.
#[derive(Debug, Clone)]
pub struct AptosCli {
    program: String,
    node_url: String,
    faucet_url: String,
    module_namespace: String,
    package_dir: Option<String>,
}

/// Arguments for publishing the package under a resource account.
#[derive(Debug, Clone)]
pub struct PublishRequest<'a> {
    pub deployer_address: &'a AccountAddress,
    pub resource_address: &'a AccountAddress,
    pub private_key: &'a str,
}

impl AptosCli {
    pub fn new(config: &FixtureConfig) -> Self {
        Self {
            program: config.cli_program.clone(),
            node_url: config.node_url.clone(),
            faucet_url: config.faucet_url.clone(),
            module_namespace: config.module_namespace.clone(),
            package_dir: config
                .package_dir
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
        }
    }

    /// `aptos account fund-with-faucet`
    pub fn fund_with_faucet(&self, address: &AccountAddress) -> CommandLine {
        CommandLine::new(&self.program)
            .arg("account")
            .arg("fund-with-faucet")
            .flag("--account", address.to_string())
            .flag("--faucet-url", &self.faucet_url)
            .flag("--url", &self.node_url)
    }

    /// `aptos move publish`, binding the module namespace to the resource account and
    /// `deployer` to the deployer account.
    pub fn publish(&self, request: &PublishRequest<'_>) -> CommandLine {
        let named_addresses = format!(
            "{}={},deployer={}",
            self.module_namespace, request.resource_address, request.deployer_address
        );

        let command = CommandLine::new(&self.program)
            .arg("move")
            .arg("publish")
            .arg("--assume-yes")
            .flag("--private-key", request.private_key)
            .flag("--sender-account", request.resource_address.to_string())
            .flag("--named-addresses", named_addresses)
            .flag("--url", &self.node_url);

        match &self.package_dir {
            Some(dir) => command.flag("--package-dir", dir),
            None => command,
        }
    }

    /// `aptos account transfer` of `amount` octas from the account owning `private_key`.
    pub fn transfer(
        &self,
        from: &AccountAddress,
        private_key: &str,
        to: &AccountAddress,
        amount: u64,
    ) -> CommandLine {
        CommandLine::new(&self.program)
            .arg("account")
            .arg("transfer")
            .arg("--assume-yes")
            .flag("--account", to.to_string())
            .flag("--amount", amount.to_string())
            .flag("--private-key", private_key)
            .flag("--sender-account", from.to_string())
            .flag("--url", &self.node_url)
    }
}
