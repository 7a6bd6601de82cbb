use cascade_core::{CascadeError, CascadeResult, ProjectConfig};
use cascade_graph::{discover, schedule, DependencyEdge};
use tracing::{debug, info};

use crate::environment::{CompileSummary, Compiler, Environment};
use crate::plan::{build_plan, network_banner, ExecutionPlan, RunOptions};
use crate::runner::{migrate_package, PackageOutcome};
use crate::sandbox::run_dry_run;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRun {
    pub plan: ExecutionPlan,
    pub edges: Vec<DependencyEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPackage {
    pub package_name: String,
    pub summary: CompileSummary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrateReport {
    pub banner: String,
    pub dry_run: bool,
    pub compiled: Vec<CompiledPackage>,
    pub outcomes: Vec<PackageOutcome>,
}

/// Drives a migration over the root package and its local dependencies.
/// Every phase runs package by package in plan order and stops at the
/// first failure.
pub struct Orchestrator<'a> {
    environment: &'a dyn Environment,
    compiler: &'a dyn Compiler,
}

impl<'a> Orchestrator<'a> {
    pub fn new(environment: &'a dyn Environment, compiler: &'a dyn Compiler) -> Self {
        Self {
            environment,
            compiler,
        }
    }

    /// Discovers the package graph, schedules it and propagates the root's
    /// network settings onto every package.
    pub fn plan(&self, root: &ProjectConfig, options: &RunOptions) -> CascadeResult<PlannedRun> {
        let graph = discover(root)?;
        let order = schedule(&graph)?;
        debug!(order = ?order, "scheduled packages");
        let plan = build_plan(&graph, &order, root, options)?;
        Ok(PlannedRun {
            plan,
            edges: graph.edges,
        })
    }

    pub fn compile(
        &self,
        root: &ProjectConfig,
        options: &RunOptions,
    ) -> CascadeResult<Vec<CompiledPackage>> {
        let planned = self.plan(root, options)?;
        self.compile_plan(&planned.plan, options.compile_all)
    }

    pub fn migrate(&self, root: &ProjectConfig, options: &RunOptions) -> CascadeResult<MigrateReport> {
        let planned = self.plan(root, options)?;
        let plan = planned.plan;

        for config in plan.entries() {
            self.environment
                .detect(config)
                .map_err(|source| CascadeError::Environment {
                    network: config.network.clone(),
                    source,
                })?;
        }

        let compiled = self.compile_plan(&plan, options.compile_all)?;

        let banner = network_banner(&plan, options.dry_run);
        info!("{banner}");

        let root_config = plan.root().ok_or_else(|| {
            CascadeError::configuration("execution plan does not contain the root package")
        })?;

        let outcomes = if options.dry_run {
            let report = run_dry_run(
                self.environment,
                root_config,
                &plan,
                options.temp_root.as_deref(),
            )?;
            debug!(
                workspaces = ?report.workspaces,
                "dry run finished; workspaces released"
            );
            report.outcomes
        } else {
            let mut chain =
                self.environment
                    .connect(root_config)
                    .map_err(|source| CascadeError::Environment {
                        network: root_config.network.clone(),
                        source,
                    })?;
            let mut outcomes = Vec::with_capacity(plan.len());
            for config in plan.entries() {
                let status = migrate_package(chain.as_mut(), config)?;
                outcomes.push(PackageOutcome {
                    package_id: config.package_id.clone(),
                    package_name: config.package_name.clone(),
                    network: config.network.clone(),
                    status,
                    dry_run: false,
                });
            }
            outcomes
        };

        Ok(MigrateReport {
            banner,
            dry_run: options.dry_run,
            compiled,
            outcomes,
        })
    }

    fn compile_plan(
        &self,
        plan: &ExecutionPlan,
        force: bool,
    ) -> CascadeResult<Vec<CompiledPackage>> {
        let mut compiled = Vec::with_capacity(plan.len());
        for config in plan.entries() {
            let summary =
                self.compiler
                    .compile(config, force)
                    .map_err(|source| CascadeError::Compile {
                        package: config.package_name.clone(),
                        source,
                    })?;
            debug!(
                package = %config.package_name,
                compiled = summary.compiled.len(),
                unchanged = summary.unchanged.len(),
                "compiled package"
            );
            compiled.push(CompiledPackage {
                package_name: config.package_name.clone(),
                summary,
            });
        }
        Ok(compiled)
    }
}
