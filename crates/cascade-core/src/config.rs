use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "cascade.toml";
pub const DEFAULT_NETWORK: &str = "development";

const DEFAULT_CONTRACTS_DIR: &str = "contracts";
const DEFAULT_BUILD_DIR: &str = "build/contracts";
const DEFAULT_MIGRATIONS_DIR: &str = "migrations";
const DEFAULT_MODULES_DIR: &str = "cascade_modules";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
struct RawConfig {
    #[serde(default)]
    project: RawProject,
    #[serde(default)]
    networks: BTreeMap<String, NetworkConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
struct RawProject {
    contracts_directory: Option<PathBuf>,
    contracts_build_directory: Option<PathBuf>,
    migrations_directory: Option<PathBuf>,
    modules_directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Directory holding the persisted ledger state for this network.
    pub ledger: PathBuf,
}

/// Project configuration for one package, with every directory resolved
/// against the directory that holds its `cascade.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    pub working_directory: PathBuf,
    pub contracts_directory: PathBuf,
    pub contracts_build_directory: PathBuf,
    pub migrations_directory: PathBuf,
    pub modules_directory: PathBuf,
    pub network: Option<String>,
    pub networks: BTreeMap<String, NetworkConfig>,
}

impl ProjectConfig {
    /// Searches `start_dir` and its ancestors for `cascade.toml`.
    pub fn detect(start_dir: &Path) -> anyhow::Result<Self> {
        let start = absolute(start_dir)?;
        for candidate in start.ancestors() {
            let path = candidate.join(CONFIG_FILE_NAME);
            if path.is_file() {
                let raw = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                return Self::from_toml_str(&raw, candidate)
                    .with_context(|| format!("invalid configuration {}", path.display()));
            }
        }
        Err(anyhow!(
            "could not find {CONFIG_FILE_NAME} in {} or any parent directory",
            start.display()
        ))
    }

    pub fn from_toml_str(input: &str, working_directory: &Path) -> anyhow::Result<Self> {
        let raw: RawConfig = toml::from_str(input).context("failed to parse configuration")?;
        let working_directory = working_directory.to_path_buf();
        let resolve = |value: Option<PathBuf>, default: &str| {
            let value = value.unwrap_or_else(|| PathBuf::from(default));
            if value.is_absolute() {
                value
            } else {
                working_directory.join(value)
            }
        };

        let networks = raw
            .networks
            .into_iter()
            .map(|(name, network)| {
                let ledger = if network.ledger.is_absolute() {
                    network.ledger
                } else {
                    working_directory.join(network.ledger)
                };
                (name, NetworkConfig { ledger })
            })
            .collect();

        Ok(Self {
            contracts_directory: resolve(raw.project.contracts_directory, DEFAULT_CONTRACTS_DIR),
            contracts_build_directory: resolve(
                raw.project.contracts_build_directory,
                DEFAULT_BUILD_DIR,
            ),
            migrations_directory: resolve(raw.project.migrations_directory, DEFAULT_MIGRATIONS_DIR),
            modules_directory: resolve(raw.project.modules_directory, DEFAULT_MODULES_DIR),
            working_directory,
            network: None,
            networks,
        })
    }

    pub fn with_network(mut self, network: Option<String>) -> Self {
        self.network = network;
        self
    }

    /// Picks the network to run against: the explicit selection, else
    /// `development` when declared, else the only declared network.
    pub fn selected_network(&self) -> anyhow::Result<String> {
        if let Some(name) = &self.network {
            if !self.networks.contains_key(name) {
                return Err(anyhow!(
                    "network '{name}' is not declared in {}",
                    self.working_directory.join(CONFIG_FILE_NAME).display()
                ));
            }
            return Ok(name.clone());
        }
        if self.networks.contains_key(DEFAULT_NETWORK) {
            return Ok(DEFAULT_NETWORK.to_string());
        }
        let mut names = self.networks.keys();
        match (names.next(), names.next()) {
            (Some(only), None) => Ok(only.clone()),
            (None, _) => Err(anyhow!(
                "no networks declared in {}",
                self.working_directory.join(CONFIG_FILE_NAME).display()
            )),
            (Some(_), Some(_)) => Err(anyhow!(
                "multiple networks declared and none selected; pass --network"
            )),
        }
    }

    /// Produces this package's configuration with the root's network
    /// selection, network table and shared module directory.
    pub fn inherit_from(&self, root: &ProjectConfig) -> ProjectConfig {
        ProjectConfig {
            network: root.network.clone(),
            networks: root.networks.clone(),
            modules_directory: root.modules_directory.clone(),
            ..self.clone()
        }
    }
}

fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .context("failed to resolve current directory")?
            .join(path)
    };
    // components() already drops interior `.` segments
    Ok(joined.components().collect())
}
