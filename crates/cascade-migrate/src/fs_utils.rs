use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Copies everything below `source_root` into the existing
/// `destination_root`. A missing source copies nothing.
pub(crate) fn copy_dir_contents(source_root: &Path, destination_root: &Path) -> Result<u64> {
    if !source_root.exists() {
        return Ok(0);
    }
    if !source_root.is_dir() {
        anyhow::bail!(
            "build location is not a directory: {}",
            source_root.display()
        );
    }

    let mut copied = 0_u64;
    let mut queue: VecDeque<(PathBuf, PathBuf)> = VecDeque::new();
    queue.push_back((source_root.to_path_buf(), destination_root.to_path_buf()));

    while let Some((from_dir, to_dir)) = queue.pop_front() {
        for entry in fs::read_dir(&from_dir)
            .with_context(|| format!("failed reading directory {}", from_dir.display()))?
        {
            let entry = entry?;
            let from_path = entry.path();
            let to_path = to_dir.join(entry.file_name());
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                fs::create_dir_all(&to_path)
                    .with_context(|| format!("failed creating directory {}", to_path.display()))?;
                queue.push_back((from_path, to_path));
            } else if file_type.is_file() {
                fs::copy(&from_path, &to_path).with_context(|| {
                    format!(
                        "failed copying file from {} to {}",
                        from_path.display(),
                        to_path.display()
                    )
                })?;
                copied += 1;
            }
        }
    }

    Ok(copied)
}
