use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use cascade_core::discover_scripts;

const MIGRATION_TEMPLATE: &str = r#"# Contracts listed under [[require]] must already be deployed on the
# target network by this package or one of its dependencies.
#
# [[require]]
# contract = "Registry"

# [[deploy]]
# contract = "Example"
"#;

const CONTRACT_TEMPLATE: &str = r#"contract Example {
    constructor() {}
}
"#;

/// `AddToken` becomes `add_token`; dots become underscores.
pub fn underscore_from_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else if ch == '.' {
            out.push('_');
        } else {
            out.push(ch);
        }
    }
    out
}

/// Writes `<directory>/<step>_<name>.toml`. The step is `timestamp`, or the
/// next free step after it when an existing script already uses it.
pub fn create_migration(directory: &Path, name: &str, timestamp: u64) -> Result<PathBuf> {
    let underscored = underscore_from_camel(name.trim());
    if !underscored.is_empty() {
        validate_name(&underscored)?;
    }
    let taken = discover_scripts(directory)?
        .into_iter()
        .map(|script| script.step)
        .collect::<BTreeSet<_>>();
    let mut step = timestamp;
    while taken.contains(&step) {
        step = step
            .checked_add(1)
            .ok_or_else(|| anyhow!("no free migration step after {timestamp}"))?;
    }

    let file_name = if underscored.is_empty() {
        format!("{step}.toml")
    } else {
        format!("{step}_{underscored}.toml")
    };
    write_new_file(&directory.join(file_name), MIGRATION_TEMPLATE)
}

/// Writes `<directory>/<Name>.sol` with the contract renamed to `name`.
pub fn create_contract(directory: &Path, name: &str) -> Result<PathBuf> {
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("contract name must not be empty"));
    }
    validate_name(name)?;
    let content = CONTRACT_TEMPLATE.replace("Example", name);
    write_new_file(&directory.join(format!("{name}.sol")), &content)
}

fn validate_name(name: &str) -> Result<()> {
    if !name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        return Err(anyhow!(
            "name may only contain ASCII letters, digits and underscores: {name}"
        ));
    }
    Ok(())
}

fn write_new_file(path: &Path, content: &str) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path.to_path_buf())
}
