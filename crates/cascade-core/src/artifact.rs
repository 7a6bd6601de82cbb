use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Deployment {
    pub address: String,
    pub package: String,
    pub step: u64,
}

/// Build output for one contract, plus where it has been deployed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContractArtifact {
    pub contract_name: String,
    pub source_path: String,
    pub source_sha256: String,
    #[serde(default)]
    pub networks: BTreeMap<String, Deployment>,
}

impl ContractArtifact {
    pub fn deployment(&self, network: &str) -> Option<&Deployment> {
        self.networks.get(network)
    }
}

fn artifact_file_name(contract_name: &str) -> String {
    format!("{contract_name}.json")
}

fn read_artifact_file(path: &Path) -> anyhow::Result<Option<ContractArtifact>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read artifact {}", path.display()));
        }
    };
    let artifact = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse artifact {}", path.display()))?;
    Ok(Some(artifact))
}

/// Reads and writes contract artifacts inside a single build directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactWriter {
    build_directory: PathBuf,
}

impl ArtifactWriter {
    pub fn new(build_directory: impl Into<PathBuf>) -> Self {
        Self {
            build_directory: build_directory.into(),
        }
    }

    pub fn build_directory(&self) -> &Path {
        &self.build_directory
    }

    pub fn artifact_path(&self, contract_name: &str) -> PathBuf {
        self.build_directory.join(artifact_file_name(contract_name))
    }

    pub fn read(&self, contract_name: &str) -> anyhow::Result<Option<ContractArtifact>> {
        read_artifact_file(&self.artifact_path(contract_name))
    }

    pub fn save(&self, artifact: &ContractArtifact) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(&self.build_directory).with_context(|| {
            format!(
                "failed to create build directory {}",
                self.build_directory.display()
            )
        })?;
        let path = self.artifact_path(&artifact.contract_name);
        let mut rendered =
            serde_json::to_string_pretty(artifact).context("failed to serialize artifact")?;
        rendered.push('\n');
        fs::write(&path, rendered)
            .with_context(|| format!("failed to write artifact {}", path.display()))?;
        Ok(path)
    }

    /// Records a deployment of `contract_name` on `network`.
    pub fn record_deployment(
        &self,
        contract_name: &str,
        network: &str,
        deployment: Deployment,
    ) -> anyhow::Result<ContractArtifact> {
        let mut artifact = self.read(contract_name)?.ok_or_else(|| {
            anyhow!(
                "no artifact for contract '{contract_name}' in {}",
                self.build_directory.display()
            )
        })?;
        artifact.networks.insert(network.to_string(), deployment);
        self.save(&artifact)?;
        Ok(artifact)
    }
}

/// Finds contract artifacts by name across an ordered list of build
/// directories: the package's own first, then its dependencies'.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolver {
    search_paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub path: PathBuf,
    pub artifact: ContractArtifact,
}

impl Resolver {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    pub fn resolve(&self, contract_name: &str) -> anyhow::Result<Option<ResolvedArtifact>> {
        for directory in &self.search_paths {
            let path = directory.join(artifact_file_name(contract_name));
            if let Some(artifact) = read_artifact_file(&path)? {
                return Ok(Some(ResolvedArtifact { path, artifact }));
            }
        }
        Ok(None)
    }
}
