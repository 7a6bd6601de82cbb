use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use cascade_core::ProjectConfig;
use cascade_ledger::{create_contract, create_migration, LocalCompiler, LocalEnvironment};
use cascade_migrate::{Orchestrator, RunOptions};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod render;

use render::{
    format_compile_lines, format_migrate_lines, format_plan_lines, TerminalRenderer,
};

#[derive(Parser, Debug)]
#[command(name = "cascade")]
#[command(about = "Dependency-aware contract migrations", long_about = None)]
struct Cli {
    /// Project directory; `cascade.toml` is searched from here upwards.
    #[arg(long, global = true)]
    working_directory: Option<PathBuf>,
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile and migrate the project and its local dependencies.
    Migrate {
        #[arg(long)]
        network: Option<String>,
        /// Run every migration from the first one.
        #[arg(long)]
        reset: bool,
        #[arg(long)]
        compile_all: bool,
        /// Migrate against a fork of the network without saving anything.
        #[arg(long)]
        dry_run: bool,
        /// Run migrations starting at this step number.
        #[arg(short = 'f', long = "from", value_name = "STEP")]
        from: Option<u64>,
    },
    Compile {
        #[arg(long)]
        network: Option<String>,
        #[arg(long)]
        all: bool,
    },
    /// Print the execution order and dependency edges.
    Plan {
        #[arg(long)]
        network: Option<String>,
    },
    Create {
        #[command(subcommand)]
        kind: CreateCommand,
    },
}

#[derive(Subcommand, Debug)]
enum CreateCommand {
    Migration { name: String },
    Contract { name: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run_cli(cli)
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run_cli(cli: Cli) -> Result<()> {
    let start = match cli.working_directory {
        Some(dir) => dir,
        None => std::env::current_dir().context("failed to read current directory")?,
    };
    let project = ProjectConfig::detect(&start)?;
    debug!(working_directory = %project.working_directory.display(), "detected project");

    let renderer = TerminalRenderer::current();
    let orchestrator = Orchestrator::new(&LocalEnvironment, &LocalCompiler);

    match cli.command {
        Commands::Migrate {
            network,
            reset,
            compile_all,
            dry_run,
            from,
        } => {
            let options = RunOptions {
                network,
                reset,
                compile_all,
                dry_run,
                migrate_from: from,
                temp_root: None,
            };
            let report = orchestrator.migrate(&project, &options)?;
            renderer.print_lines(&format_compile_lines(&report.compiled, renderer.style()));
            renderer.print_lines(&format_migrate_lines(&report, renderer.style()));
        }
        Commands::Compile { network, all } => {
            let options = RunOptions {
                network,
                compile_all: all,
                ..RunOptions::default()
            };
            let compiled = orchestrator.compile(&project, &options)?;
            renderer.print_lines(&format_compile_lines(&compiled, renderer.style()));
        }
        Commands::Plan { network } => {
            let options = RunOptions {
                network,
                ..RunOptions::default()
            };
            let planned = orchestrator.plan(&project, &options)?;
            let (order, edges) = format_plan_lines(&planned);
            renderer.print_section("Order");
            renderer.print_lines(&order);
            if !edges.is_empty() {
                renderer.print_section("Edges");
                renderer.print_lines(&edges);
            }
        }
        Commands::Create { kind } => {
            let path = run_create(&project, kind)?;
            renderer.print_status("ok", &format!("created {}", display_path(&project, &path)));
        }
    }

    Ok(())
}

fn run_create(project: &ProjectConfig, kind: CreateCommand) -> Result<PathBuf> {
    match kind {
        CreateCommand::Migration { name } => {
            let timestamp = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .context("system clock is before the Unix epoch")?
                .as_secs();
            create_migration(&project.migrations_directory, &name, timestamp)
        }
        CreateCommand::Contract { name } => create_contract(&project.contracts_directory, &name),
    }
}

fn display_path(project: &ProjectConfig, path: &Path) -> String {
    path.strip_prefix(&project.working_directory)
        .unwrap_or(path)
        .display()
        .to_string()
}
