use std::path::PathBuf;

use anyhow::{anyhow, Result};
use cascade_core::{Deployment, MigrationScript};
use cascade_migrate::{Chain, MigrationConfig};
use tracing::info;

use crate::script::ScriptFile;
use crate::state::LedgerState;

/// A session on a local ledger network.
///
/// A connected session writes its state back after every change; a forked
/// session keeps everything in memory and is discarded with the value.
#[derive(Debug)]
pub struct LedgerChain {
    network: String,
    state: LedgerState,
    persist_to: Option<PathBuf>,
}

impl LedgerChain {
    pub fn connected(network: &str, ledger_dir: PathBuf, state: LedgerState) -> Self {
        Self {
            network: network.to_string(),
            state,
            persist_to: Some(ledger_dir),
        }
    }

    pub fn forked(network: &str, state: LedgerState) -> Self {
        Self {
            network: network.to_string(),
            state,
            persist_to: None,
        }
    }

    pub fn is_fork(&self) -> bool {
        self.persist_to.is_none()
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    fn commit(&mut self, state: LedgerState) -> Result<()> {
        if let Some(ledger_dir) = &self.persist_to {
            state.save(ledger_dir)?;
        }
        self.state = state;
        Ok(())
    }
}

impl Chain for LedgerChain {
    fn network(&self) -> &str {
        &self.network
    }

    fn applied_step(&self, package: &str) -> Result<Option<u64>> {
        Ok(self.state.applied.get(package).copied())
    }

    fn execute(&mut self, config: &MigrationConfig, script: &MigrationScript) -> Result<()> {
        let operations = ScriptFile::read(&script.path)?;
        let mut staged = self.state.clone();

        for required in &operations.require {
            let resolved = config.resolver.resolve(&required.contract)?.ok_or_else(|| {
                anyhow!(
                    "required contract '{}' is not available to package '{}'",
                    required.contract,
                    config.package_name
                )
            })?;
            if resolved.artifact.deployment(&self.network).is_none() {
                return Err(anyhow!(
                    "required contract '{}' is not deployed on network '{}'",
                    required.contract,
                    self.network
                ));
            }
        }

        for deploy in &operations.deploy {
            if config.artifacts.read(&deploy.contract)?.is_none() {
                return Err(anyhow!(
                    "contract '{}' has not been compiled for package '{}'",
                    deploy.contract,
                    config.package_name
                ));
            }
        }

        let mut recorded = Vec::with_capacity(operations.deploy.len());
        for deploy in &operations.deploy {
            let address =
                staged.next_address(&self.network, &config.package_name, &deploy.contract);
            staged.deployments.insert(
                LedgerState::deployment_key(&config.package_name, &deploy.contract),
                address.clone(),
            );
            recorded.push((
                deploy.contract.as_str(),
                Deployment {
                    address,
                    package: config.package_name.clone(),
                    step: script.step,
                },
            ));
        }

        // Artifacts only ever describe deployments the ledger has accepted.
        self.commit(staged)?;
        for (contract, deployment) in recorded {
            info!(
                package = %config.package_name,
                network = %self.network,
                fork = self.is_fork(),
                "deployed {contract} at {}",
                deployment.address
            );
            config
                .artifacts
                .record_deployment(contract, &self.network, deployment)?;
        }
        Ok(())
    }

    fn mark_applied(&mut self, package: &str, step: u64) -> Result<()> {
        let mut staged = self.state.clone();
        staged.applied.insert(package.to_string(), step);
        self.commit(staged)
    }
}
