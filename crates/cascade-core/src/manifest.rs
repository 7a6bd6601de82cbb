use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context};
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};

pub const MANIFEST_FILE_NAME: &str = "package.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageManifest {
    pub name: String,
    pub version: Version,
    pub description: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, VersionReq>,
}

impl PackageManifest {
    pub fn from_toml_str(input: &str) -> anyhow::Result<Self> {
        let manifest: Self = toml::from_str(input).context("failed to parse package manifest")?;
        if manifest.name.trim().is_empty() {
            return Err(anyhow!("package name must not be empty"));
        }
        if manifest.dependencies.contains_key(&manifest.name) {
            return Err(anyhow!("package '{}' depends on itself", manifest.name));
        }
        for name in manifest.dependencies.keys() {
            validate_dependency_name(name)
                .with_context(|| format!("invalid dependency in package '{}'", manifest.name))?;
        }
        Ok(manifest)
    }

    /// Reads `package.toml` from a package root.
    pub fn read_from_dir(package_root: &Path) -> anyhow::Result<Self> {
        let path = package_root.join(MANIFEST_FILE_NAME);
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("malformed manifest {}", path.display()))
    }

    pub fn dependency_names(&self) -> Vec<String> {
        self.dependencies.keys().cloned().collect()
    }
}

fn validate_dependency_name(name: &str) -> anyhow::Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("dependency name must not be empty"));
    }
    if trimmed == "." || trimmed == ".." {
        return Err(anyhow!("dependency name must not be a relative path: {name}"));
    }
    if trimmed.contains(['/', '\\']) {
        return Err(anyhow!(
            "dependency name must not contain path separators: {name}"
        ));
    }
    Ok(())
}
