use std::path::{Path, PathBuf};

use anyhow::Context;
use cascade_core::CascadeError;
use tempfile::TempDir;
use tracing::debug;

use crate::fs_utils::copy_dir_contents;

const WORKSPACE_PREFIX: &str = "cascade-dry-run-";

/// A temporary copy of one package's build artifacts.
///
/// The directory is removed by [`Workspace::close`], or on drop if the
/// workspace is never closed (including while unwinding).
#[derive(Debug)]
pub struct Workspace {
    package_id: String,
    origin: PathBuf,
    dir: TempDir,
}

impl Workspace {
    /// Creates a fresh directory and copies `build_directory` into it.
    pub fn create(
        package_id: &str,
        build_directory: &Path,
        temp_root: Option<&Path>,
    ) -> anyhow::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);
        let dir = match temp_root {
            Some(root) => {
                std::fs::create_dir_all(root)
                    .with_context(|| format!("failed to create {}", root.display()))?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
        .context("failed to create temporary workspace")?;

        let copied = copy_dir_contents(build_directory, dir.path()).with_context(|| {
            format!(
                "failed to copy build artifacts from {}",
                build_directory.display()
            )
        })?;
        debug!(
            package = package_id,
            workspace = %dir.path().display(),
            copied,
            "created dry-run workspace"
        );

        Ok(Self {
            package_id: package_id.to_string(),
            origin: build_directory.to_path_buf(),
            dir,
        })
    }

    pub fn package_id(&self) -> &str {
        &self.package_id
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn originating_build_directory(&self) -> &Path {
        &self.origin
    }

    pub fn close(self) -> Result<(), CascadeError> {
        let path = self.dir.path().to_path_buf();
        self.dir
            .close()
            .map_err(|source| CascadeError::WorkspaceCleanup { path, source })
    }
}
