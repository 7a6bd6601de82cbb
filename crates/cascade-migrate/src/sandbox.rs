use std::collections::HashMap;
use std::path::{Path, PathBuf};

use cascade_core::{CascadeError, CascadeResult};
use tracing::{info, warn};

use crate::environment::{Chain, Environment};
use crate::plan::{ExecutionPlan, MigrationConfig};
use crate::runner::{migrate_package, PackageOutcome};
use crate::workspace::Workspace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DryRunReport {
    pub outcomes: Vec<PackageOutcome>,
    /// Workspaces used during the run; all of them are gone by the time the
    /// report is returned.
    pub workspaces: Vec<PathBuf>,
}

/// Runs the whole plan against a fork of the root's network.
///
/// Each package migrates from a private copy of its build directory, so the
/// real artifacts are never written. The first failing package stops the
/// run. Every workspace created so far is removed before returning, whether
/// the run succeeded or not; cleanup failures are logged and never replace
/// the run's own result.
pub fn run_dry_run(
    environment: &dyn Environment,
    root: &MigrationConfig,
    plan: &ExecutionPlan,
    temp_root: Option<&Path>,
) -> CascadeResult<DryRunReport> {
    let mut fork = environment
        .fork(root)
        .map_err(|source| CascadeError::Environment {
            network: root.network.clone(),
            source,
        })?;
    info!(network = %root.network, "forked network for dry run");

    let mut workspaces = Vec::with_capacity(plan.len());
    let result = migrate_in_workspaces(fork.as_mut(), plan, temp_root, &mut workspaces);

    let paths = workspaces
        .iter()
        .map(|workspace| workspace.path().to_path_buf())
        .collect();
    release(workspaces);

    Ok(DryRunReport {
        outcomes: result?,
        workspaces: paths,
    })
}

fn migrate_in_workspaces(
    fork: &mut dyn Chain,
    plan: &ExecutionPlan,
    temp_root: Option<&Path>,
    workspaces: &mut Vec<Workspace>,
) -> CascadeResult<Vec<PackageOutcome>> {
    let mut relocated: HashMap<String, PathBuf> = HashMap::new();
    let mut outcomes = Vec::with_capacity(plan.len());

    for config in plan.entries() {
        let workspace =
            Workspace::create(&config.package_id, &config.contracts_build_directory, temp_root)
                .map_err(|source| CascadeError::Workspace {
                    package: config.package_name.clone(),
                    source,
                })?;
        let rebound = config.rebind(workspace.path(), &relocated);
        relocated.insert(config.package_id.clone(), workspace.path().to_path_buf());
        workspaces.push(workspace);

        let status = migrate_package(fork, &rebound)?;
        outcomes.push(PackageOutcome {
            package_id: config.package_id.clone(),
            package_name: config.package_name.clone(),
            network: config.network.clone(),
            status,
            dry_run: true,
        });
    }

    Ok(outcomes)
}

fn release(workspaces: Vec<Workspace>) {
    for workspace in workspaces {
        let package = workspace.package_id().to_string();
        if let Err(err) = workspace.close() {
            warn!(package = %package, "{}", err.chain_message());
        }
    }
}
