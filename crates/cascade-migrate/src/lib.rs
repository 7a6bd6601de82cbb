mod environment;
mod fs_utils;
mod orchestrator;
mod plan;
mod runner;
mod sandbox;
mod workspace;

pub use environment::{Chain, CompileSummary, Compiler, Environment};
pub use orchestrator::{CompiledPackage, MigrateReport, Orchestrator, PlannedRun};
pub use plan::{build_plan, network_banner, ExecutionPlan, MigrationConfig, RunOptions};
pub use runner::{
    migrate_package, needs_migrating, run, run_from, PackageOutcome, PackageStatus,
};
pub use sandbox::{run_dry_run, DryRunReport};
pub use workspace::Workspace;
