use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const STATE_FILE_NAME: &str = "state.json";
const STATE_VERSION: u32 = 1;

/// Everything the local ledger remembers about one network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerState {
    #[serde(default = "state_version")]
    pub version: u32,
    /// Last applied migration step per package name.
    #[serde(default)]
    pub applied: BTreeMap<String, u64>,
    /// `<package>:<contract>` to deployed address.
    #[serde(default)]
    pub deployments: BTreeMap<String, String>,
    #[serde(default)]
    pub nonce: u64,
}

fn state_version() -> u32 {
    STATE_VERSION
}

impl Default for LedgerState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            applied: BTreeMap::new(),
            deployments: BTreeMap::new(),
            nonce: 0,
        }
    }
}

impl LedgerState {
    pub fn state_path(ledger_dir: &Path) -> PathBuf {
        ledger_dir.join(STATE_FILE_NAME)
    }

    /// Loads the state under `ledger_dir`; a ledger that was never written
    /// is an empty network.
    pub fn load(ledger_dir: &Path) -> Result<Self> {
        if ledger_dir.exists() && !ledger_dir.is_dir() {
            return Err(anyhow!(
                "ledger location is not a directory: {}",
                ledger_dir.display()
            ));
        }
        let path = Self::state_path(ledger_dir);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read ledger state {}", path.display()));
            }
        };
        let state: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse ledger state {}", path.display()))?;
        if state.version != STATE_VERSION {
            return Err(anyhow!(
                "unsupported ledger state version {} in {}",
                state.version,
                path.display()
            ));
        }
        Ok(state)
    }

    pub fn save(&self, ledger_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(ledger_dir)
            .with_context(|| format!("failed to create {}", ledger_dir.display()))?;
        let path = Self::state_path(ledger_dir);
        let mut content =
            serde_json::to_string_pretty(self).context("failed serializing ledger state")?;
        content.push('\n');
        fs::write(&path, content)
            .with_context(|| format!("failed writing ledger state {}", path.display()))?;
        Ok(path)
    }

    pub fn deployment_key(package: &str, contract: &str) -> String {
        format!("{package}:{contract}")
    }

    /// Assigns the next address on this network. Addresses only depend on
    /// the inputs, so a fork replays the same addresses as the real network.
    pub fn next_address(&mut self, network: &str, package: &str, contract: &str) -> String {
        self.nonce += 1;
        let digest = sha256_hex(format!("{network}:{package}:{contract}:{}", self.nonce).as_bytes());
        format!("0x{}", &digest[..40])
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
