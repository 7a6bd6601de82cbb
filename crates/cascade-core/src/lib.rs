mod artifact;
mod config;
mod error;
mod manifest;
mod migration;

pub use artifact::{ArtifactWriter, ContractArtifact, Deployment, ResolvedArtifact, Resolver};
pub use config::{NetworkConfig, ProjectConfig, CONFIG_FILE_NAME, DEFAULT_NETWORK};
pub use error::{CascadeError, CascadeResult};
pub use manifest::{PackageManifest, MANIFEST_FILE_NAME};
pub use migration::{discover_scripts, parse_script_file_name, MigrationScript};

#[cfg(test)]
mod tests;
