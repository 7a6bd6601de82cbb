use std::path::PathBuf;

use thiserror::Error;

pub type CascadeResult<T> = Result<T, CascadeError>;

#[derive(Debug, Error)]
pub enum CascadeError {
    /// Missing or invalid required configuration, including an unreadable
    /// root manifest.
    #[error("configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("dependency cycle detected involving: {}", .nodes.join(", "))]
    GraphCycle { nodes: Vec<String> },

    /// Recoverable: the package is left out of the graph.
    #[error("skipping package: could not read manifest {}", .path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("environment error on network '{network}'")]
    Environment {
        network: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("compilation failed for package '{package}'")]
    Compile {
        package: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("migration {step} ({script}) failed for package '{package}'")]
    MigrationScript {
        package: String,
        step: u64,
        script: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to prepare dry-run workspace for package '{package}'")]
    Workspace {
        package: String,
        #[source]
        source: anyhow::Error,
    },

    /// Logged only; never returned in place of the primary result.
    #[error("failed to remove dry-run workspace {}", .path.display())]
    WorkspaceCleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CascadeError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Renders the error followed by each of its causes.
    pub fn chain_message(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }

    pub fn configuration_with(message: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Configuration {
            message: message.into(),
            source: Some(source),
        }
    }
}
