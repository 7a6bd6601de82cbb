use anyhow::{Context, Result};
use cascade_migrate::{Chain, Environment, MigrationConfig};
use tracing::debug;

use crate::chain::LedgerChain;
use crate::state::LedgerState;

/// Target environment backed by ledger directories on the local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalEnvironment;

impl LocalEnvironment {
    fn load(config: &MigrationConfig) -> Result<LedgerState> {
        LedgerState::load(&config.network_config.ledger)
            .with_context(|| format!("network '{}' is not usable", config.network))
    }
}

impl Environment for LocalEnvironment {
    fn detect(&self, config: &MigrationConfig) -> Result<()> {
        let state = Self::load(config)?;
        debug!(
            package = %config.package_name,
            network = %config.network,
            ledger = %config.network_config.ledger.display(),
            applied = state.applied.get(&config.package_name).copied(),
            "network detected"
        );
        Ok(())
    }

    fn connect(&self, config: &MigrationConfig) -> Result<Box<dyn Chain>> {
        let state = Self::load(config)?;
        Ok(Box::new(LedgerChain::connected(
            &config.network,
            config.network_config.ledger.clone(),
            state,
        )))
    }

    fn fork(&self, root: &MigrationConfig) -> Result<Box<dyn Chain>> {
        let state = Self::load(root).context("failed to fork network")?;
        Ok(Box::new(LedgerChain::forked(&root.network, state)))
    }
}
