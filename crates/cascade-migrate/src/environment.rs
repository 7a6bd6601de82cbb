use cascade_core::MigrationScript;

use crate::plan::MigrationConfig;

/// A session against the target environment. Sessions are used by one
/// package at a time; nothing here is shared across threads.
pub trait Chain {
    fn network(&self) -> &str;

    /// Last step recorded as applied for `package`, if any.
    fn applied_step(&self, package: &str) -> anyhow::Result<Option<u64>>;

    /// Runs one script's state-mutating operations.
    fn execute(&mut self, config: &MigrationConfig, script: &MigrationScript)
        -> anyhow::Result<()>;

    fn mark_applied(&mut self, package: &str, step: u64) -> anyhow::Result<()>;
}

pub trait Environment {
    /// Checks that the package's network is reachable and usable.
    fn detect(&self, config: &MigrationConfig) -> anyhow::Result<()>;

    fn connect(&self, config: &MigrationConfig) -> anyhow::Result<Box<dyn Chain>>;

    /// Opens an ephemeral clone of the root's network. Nothing done through
    /// the returned session may persist.
    fn fork(&self, root: &MigrationConfig) -> anyhow::Result<Box<dyn Chain>>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileSummary {
    pub compiled: Vec<String>,
    pub unchanged: Vec<String>,
}

pub trait Compiler {
    /// Builds the package's sources into its build directory. With `force`,
    /// unchanged sources are rebuilt too.
    fn compile(&self, config: &MigrationConfig, force: bool) -> anyhow::Result<CompileSummary>;
}
