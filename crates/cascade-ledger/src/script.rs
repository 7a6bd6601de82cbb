use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Contents of a `<step>_<name>.toml` migration.
///
/// Requirements are checked before anything is deployed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ScriptFile {
    #[serde(default)]
    pub require: Vec<RequireOp>,
    #[serde(default)]
    pub deploy: Vec<DeployOp>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DeployOp {
    pub contract: String,
}

/// The contract must already be deployed on the current network, either by
/// this package or by one of its dependencies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RequireOp {
    pub contract: String,
}

impl ScriptFile {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).context("failed to parse migration script")
    }

    pub fn read(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read migration {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("invalid migration {}", path.display()))
    }
}
