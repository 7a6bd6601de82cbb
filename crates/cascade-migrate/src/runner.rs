use cascade_core::{discover_scripts, CascadeError, CascadeResult, MigrationScript};
use tracing::info;

use crate::environment::Chain;
use crate::plan::MigrationConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageStatus {
    UpToDate,
    Migrated { steps: Vec<u64> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOutcome {
    pub package_id: String,
    pub package_name: String,
    pub network: String,
    pub status: PackageStatus,
    pub dry_run: bool,
}

/// True when some local script is newer than the last step the target
/// environment has recorded for this package.
pub fn needs_migrating(chain: &dyn Chain, config: &MigrationConfig) -> CascadeResult<bool> {
    let scripts = local_scripts(config)?;
    let applied = applied_step(chain, config)?;
    Ok(scripts
        .iter()
        .any(|script| applied.map_or(true, |last| script.step > last)))
}

/// Applies every script past the last recorded step, in ascending order.
pub fn run(chain: &mut dyn Chain, config: &MigrationConfig) -> CascadeResult<Vec<u64>> {
    let applied = applied_step(chain, config)?;
    let pending = local_scripts(config)?
        .into_iter()
        .filter(|script| applied.map_or(true, |last| script.step > last))
        .collect::<Vec<_>>();
    apply_scripts(chain, config, &pending)
}

/// Applies every script whose step is at least `step`, regardless of what
/// the target environment has recorded.
pub fn run_from(
    chain: &mut dyn Chain,
    step: u64,
    config: &MigrationConfig,
) -> CascadeResult<Vec<u64>> {
    let pending = local_scripts(config)?
        .into_iter()
        .filter(|script| script.step >= step)
        .collect::<Vec<_>>();
    apply_scripts(chain, config, &pending)
}

/// Migrates one package: an explicit starting step wins, then `reset`,
/// otherwise only pending scripts run.
pub fn migrate_package(
    chain: &mut dyn Chain,
    config: &MigrationConfig,
) -> CascadeResult<PackageStatus> {
    let steps = if let Some(step) = config.migrate_from {
        run_from(chain, step, config)?
    } else if config.reset {
        run_from(chain, 0, config)?
    } else if needs_migrating(chain, config)? {
        run(chain, config)?
    } else {
        info!(package = %config.package_name, "Network up to date.");
        return Ok(PackageStatus::UpToDate);
    };

    if steps.is_empty() {
        return Ok(PackageStatus::UpToDate);
    }
    Ok(PackageStatus::Migrated { steps })
}

fn apply_scripts(
    chain: &mut dyn Chain,
    config: &MigrationConfig,
    scripts: &[MigrationScript],
) -> CascadeResult<Vec<u64>> {
    let mut applied = Vec::with_capacity(scripts.len());
    for script in scripts {
        info!(
            package = %config.package_name,
            network = chain.network(),
            "running migration {}",
            script.file_name()
        );
        let failed = |source| CascadeError::MigrationScript {
            package: config.package_name.clone(),
            step: script.step,
            script: script.file_name(),
            source,
        };
        chain.execute(config, script).map_err(failed)?;
        chain
            .mark_applied(&config.package_name, script.step)
            .map_err(failed)?;
        applied.push(script.step);
    }
    Ok(applied)
}

fn local_scripts(config: &MigrationConfig) -> CascadeResult<Vec<MigrationScript>> {
    discover_scripts(&config.migrations_directory).map_err(|err| {
        CascadeError::configuration_with(
            format!(
                "cannot list migrations for package '{}'",
                config.package_name
            ),
            err,
        )
    })
}

fn applied_step(chain: &dyn Chain, config: &MigrationConfig) -> CascadeResult<Option<u64>> {
    chain
        .applied_step(&config.package_name)
        .map_err(|source| CascadeError::Environment {
            network: chain.network().to_string(),
            source,
        })
}
