mod chain;
mod compiler;
mod environment;
mod scaffold;
mod script;
mod state;

pub use chain::LedgerChain;
pub use compiler::LocalCompiler;
pub use environment::LocalEnvironment;
pub use scaffold::{create_contract, create_migration, underscore_from_camel};
pub use script::{DeployOp, RequireOp, ScriptFile};
pub use state::{sha256_hex, LedgerState};
