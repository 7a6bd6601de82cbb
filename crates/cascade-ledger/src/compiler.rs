use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use cascade_core::ContractArtifact;
use cascade_migrate::{CompileSummary, Compiler, MigrationConfig};
use tracing::debug;

use crate::state::sha256_hex;

/// Turns every source file in a package's contracts directory into an
/// artifact, skipping sources whose fingerprint has not changed.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalCompiler;

impl Compiler for LocalCompiler {
    fn compile(&self, config: &MigrationConfig, force: bool) -> Result<CompileSummary> {
        let mut summary = CompileSummary::default();
        for (contract_name, source_path) in list_sources(config)? {
            let source = fs::read(&source_path)
                .with_context(|| format!("failed to read source {}", source_path.display()))?;
            let source_sha256 = sha256_hex(&source);
            let existing = config.artifacts.read(&contract_name)?;

            if !force
                && existing
                    .as_ref()
                    .is_some_and(|artifact| artifact.source_sha256 == source_sha256)
            {
                summary.unchanged.push(contract_name);
                continue;
            }

            let artifact = ContractArtifact {
                contract_name: contract_name.clone(),
                source_path: relative_source_path(config, &source_path),
                source_sha256,
                networks: existing.map(|artifact| artifact.networks).unwrap_or_default(),
            };
            let path = config.artifacts.save(&artifact)?;
            debug!(
                package = %config.package_name,
                artifact = %path.display(),
                "compiled {contract_name}"
            );
            summary.compiled.push(contract_name);
        }
        Ok(summary)
    }
}

fn list_sources(config: &MigrationConfig) -> Result<BTreeMap<String, PathBuf>> {
    let directory = &config.contracts_directory;
    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(err) => {
            return Err(err).with_context(|| {
                format!("failed to read contracts directory {}", directory.display())
            });
        }
    };

    let mut sources = BTreeMap::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let Some(stem) = path.file_stem().map(|stem| stem.to_string_lossy().into_owned()) else {
            continue;
        };
        if stem.is_empty() || stem.starts_with('.') {
            continue;
        }
        if let Some(previous) = sources.insert(stem.clone(), path.clone()) {
            return Err(anyhow!(
                "contract '{stem}' is defined by both {} and {}",
                previous.display(),
                path.display()
            ));
        }
    }
    Ok(sources)
}

fn relative_source_path(config: &MigrationConfig, source_path: &Path) -> String {
    source_path
        .strip_prefix(&config.working_directory)
        .unwrap_or(source_path)
        .to_string_lossy()
        .replace('\\', "/")
}
