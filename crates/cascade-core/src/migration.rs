use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};

/// A numbered migration file, e.g. `2_token.toml` is step 2 named `token`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationScript {
    pub step: u64,
    pub name: String,
    pub path: PathBuf,
}

impl MigrationScript {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}_{}", self.step, self.name))
    }
}

/// Parses the step number and name out of a migration file name.
///
/// Returns `None` for files that do not start with `<digits>_` or a bare
/// `<digits>` stem; those are not migrations. A migration-shaped name whose
/// step does not fit in a `u64` is an error.
pub fn parse_script_file_name(file_name: &str) -> anyhow::Result<Option<(u64, String)>> {
    if file_name.starts_with('.') {
        return Ok(None);
    }
    let stem = file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_name);
    let digits_end = stem
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map(|(index, _)| index)
        .unwrap_or(stem.len());
    if digits_end == 0 {
        return Ok(None);
    }
    let rest = &stem[digits_end..];
    let name = if rest.is_empty() {
        String::new()
    } else {
        match rest.strip_prefix('_') {
            Some(name) => name.to_string(),
            None => return Ok(None),
        }
    };
    let step = stem[..digits_end]
        .parse::<u64>()
        .with_context(|| format!("migration step in '{file_name}' is out of range"))?;
    Ok(Some((step, name)))
}

/// Lists the migration scripts in `directory` in ascending step order.
/// A missing directory holds no migrations.
pub fn discover_scripts(directory: &Path) -> anyhow::Result<Vec<MigrationScript>> {
    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err).with_context(|| {
                format!(
                    "failed to read migrations directory {}",
                    directory.display()
                )
            });
        }
    };

    let mut by_step: BTreeMap<u64, MigrationScript> = BTreeMap::new();
    for entry in entries {
        let entry = entry.with_context(|| {
            format!(
                "failed to read migrations directory {}",
                directory.display()
            )
        })?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();
        let Some((step, name)) = parse_script_file_name(&file_name)? else {
            continue;
        };
        let script = MigrationScript {
            step,
            name,
            path: entry.path(),
        };
        if let Some(existing) = by_step.get(&step) {
            return Err(anyhow!(
                "duplicate migration step {step}: {} and {}",
                existing.file_name(),
                script.file_name()
            ));
        }
        by_step.insert(step, script);
    }

    Ok(by_step.into_values().collect())
}
