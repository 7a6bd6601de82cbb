use std::collections::HashMap;
use std::path::{Path, PathBuf};

use cascade_core::{
    ArtifactWriter, CascadeError, CascadeResult, NetworkConfig, ProjectConfig, Resolver,
};
use cascade_graph::{PackageGraph, ROOT_ID};

/// Flags for one `migrate` invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub network: Option<String>,
    pub reset: bool,
    pub compile_all: bool,
    pub dry_run: bool,
    /// Run every script from this step on, skipping the up-to-date check.
    pub migrate_from: Option<u64>,
    /// Parent directory for dry-run workspaces; the system temp dir if unset.
    pub temp_root: Option<PathBuf>,
}

/// Execution context for one package of the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationConfig {
    pub package_id: String,
    pub package_name: String,
    pub working_directory: PathBuf,
    pub network: String,
    pub network_config: NetworkConfig,
    pub contracts_directory: PathBuf,
    pub contracts_build_directory: PathBuf,
    pub migrations_directory: PathBuf,
    pub modules_directory: PathBuf,
    /// Participating dependencies and their build directories, sorted by name.
    pub dependency_build_directories: Vec<(String, PathBuf)>,
    pub artifacts: ArtifactWriter,
    pub resolver: Resolver,
    pub migrate_from: Option<u64>,
    pub reset: bool,
}

impl MigrationConfig {
    pub fn new(
        package_id: &str,
        package_name: &str,
        config: &ProjectConfig,
        network: &str,
        dependency_build_directories: Vec<(String, PathBuf)>,
        options: &RunOptions,
    ) -> CascadeResult<Self> {
        let network_config = config.networks.get(network).cloned().ok_or_else(|| {
            CascadeError::configuration(format!(
                "network '{network}' is not available to package '{package_id}'"
            ))
        })?;
        let artifacts = ArtifactWriter::new(&config.contracts_build_directory);
        let resolver = resolver_for(
            &config.contracts_build_directory,
            &dependency_build_directories,
        );

        Ok(Self {
            package_id: package_id.to_string(),
            package_name: package_name.to_string(),
            working_directory: config.working_directory.clone(),
            network: network.to_string(),
            network_config,
            contracts_directory: config.contracts_directory.clone(),
            contracts_build_directory: config.contracts_build_directory.clone(),
            migrations_directory: config.migrations_directory.clone(),
            modules_directory: config.modules_directory.clone(),
            dependency_build_directories,
            artifacts,
            resolver,
            migrate_from: options.migrate_from,
            reset: options.reset,
        })
    }

    pub fn is_root(&self) -> bool {
        self.package_id == ROOT_ID
    }

    /// Returns a copy whose build directory, artifact writer and resolver
    /// point at `build_directory`. Dependencies listed in `relocated` are
    /// searched at their relocated directories as well.
    pub fn rebind(&self, build_directory: &Path, relocated: &HashMap<String, PathBuf>) -> Self {
        let dependency_build_directories = self
            .dependency_build_directories
            .iter()
            .map(|(id, directory)| {
                let directory = relocated.get(id).unwrap_or(directory);
                (id.clone(), directory.clone())
            })
            .collect::<Vec<_>>();

        Self {
            contracts_build_directory: build_directory.to_path_buf(),
            artifacts: ArtifactWriter::new(build_directory),
            resolver: resolver_for(build_directory, &dependency_build_directories),
            dependency_build_directories,
            ..self.clone()
        }
    }
}

fn resolver_for(own: &Path, dependencies: &[(String, PathBuf)]) -> Resolver {
    let mut search_paths = vec![own.to_path_buf()];
    search_paths.extend(dependencies.iter().map(|(_, directory)| directory.clone()));
    Resolver::new(search_paths)
}

/// Ordered per-package configurations, dependencies first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    entries: Vec<MigrationConfig>,
}

impl ExecutionPlan {
    pub fn entries(&self) -> &[MigrationConfig] {
        &self.entries
    }

    pub fn package_ids(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.package_id.clone())
            .collect()
    }

    pub fn root(&self) -> Option<&MigrationConfig> {
        self.entries.iter().find(|entry| entry.is_root())
    }

    pub fn networks(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.network.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<MigrationConfig>> for ExecutionPlan {
    fn from(entries: Vec<MigrationConfig>) -> Self {
        Self { entries }
    }
}

/// Turns a scheduled order into migration configs. Every package inherits
/// the root's network selection, network table and module directory before
/// its config is built.
pub fn build_plan(
    graph: &PackageGraph,
    order: &[String],
    root: &ProjectConfig,
    options: &RunOptions,
) -> CascadeResult<ExecutionPlan> {
    let root = root.clone().with_network(options.network.clone());
    let network = root
        .selected_network()
        .map_err(|err| CascadeError::configuration_with("no usable network", err))?;
    let root = root.with_network(Some(network.clone()));

    let mut entries = Vec::with_capacity(order.len());
    let mut claimed: HashMap<&str, &str> = HashMap::new();
    for id in order {
        let node = graph.node(id).ok_or_else(|| {
            CascadeError::configuration(format!("scheduled package '{id}' was never discovered"))
        })?;
        // Progress on the target environment is tracked per package name.
        if let Some(other) = claimed.insert(node.manifest.name.as_str(), id.as_str()) {
            return Err(CascadeError::configuration(format!(
                "packages '{other}' and '{id}' are both named '{}'",
                node.manifest.name
            )));
        }
        let merged = node.config.inherit_from(&root);
        let dependency_build_directories = graph
            .dependencies_of(id)
            .into_iter()
            .filter_map(|dependency| {
                graph.node(&dependency).map(|dep| {
                    let directory = dep.config.contracts_build_directory.clone();
                    (dependency, directory)
                })
            })
            .collect();
        entries.push(MigrationConfig::new(
            id,
            &node.manifest.name,
            &merged,
            &network,
            dependency_build_directories,
            options,
        )?);
    }

    Ok(ExecutionPlan { entries })
}

/// `Using networks 'a,b'.`, with a ` (dry run)` marker when simulating.
pub fn network_banner(plan: &ExecutionPlan, dry_run: bool) -> String {
    let mut banner = format!("Using networks '{}'", plan.networks().join(","));
    if dry_run {
        banner.push_str(" (dry run)");
    }
    banner.push('.');
    banner
}
