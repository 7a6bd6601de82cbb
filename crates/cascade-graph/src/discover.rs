use std::collections::HashMap;

use anyhow::anyhow;
use cascade_core::{
    CascadeError, CascadeResult, PackageManifest, ProjectConfig, CONFIG_FILE_NAME,
    MANIFEST_FILE_NAME,
};
use tracing::{debug, warn};

use crate::types::{DependencyEdge, PackageGraph, PackageNode, ROOT_ID};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Node(usize),
    Excluded,
}

struct Frame {
    node: usize,
    parent: Option<usize>,
    dependencies: Vec<String>,
    next: usize,
}

/// Discovers the root package and its transitive local dependencies.
///
/// Traversal is depth first over an explicit stack. Every identifier is
/// resolved at most once; a dependency that was already visited still
/// contributes an edge to each further dependent. Edges are recorded when
/// the dependency's own subtree is finished, so a chain `root -> a -> b`
/// yields `[(b, a), (a, root)]`.
pub fn discover(root: &ProjectConfig) -> CascadeResult<PackageGraph> {
    let root_manifest = PackageManifest::read_from_dir(&root.working_directory).map_err(|err| {
        CascadeError::configuration_with(
            format!(
                "cannot read root manifest {}",
                root.working_directory.join(MANIFEST_FILE_NAME).display()
            ),
            err,
        )
    })?;

    let mut nodes = vec![PackageNode {
        id: ROOT_ID.to_string(),
        config: root.clone(),
        manifest: root_manifest,
        discovery_index: 0,
    }];
    let mut edges = Vec::new();
    let mut visited: HashMap<String, Visit> = HashMap::new();
    visited.insert(ROOT_ID.to_string(), Visit::Node(0));

    let mut stack = vec![Frame {
        node: 0,
        parent: None,
        dependencies: nodes[0].manifest.dependency_names(),
        next: 0,
    }];

    while let Some(frame) = stack.last_mut() {
        if frame.next >= frame.dependencies.len() {
            let finished = stack.pop();
            if let Some(Frame {
                node,
                parent: Some(parent),
                ..
            }) = finished
            {
                edges.push(edge(&nodes, node, parent));
            }
            continue;
        }

        let name = frame.dependencies[frame.next].clone();
        frame.next += 1;
        let parent = frame.node;

        match visited.get(&name).copied() {
            Some(Visit::Node(existing)) => {
                edges.push(edge(&nodes, existing, parent));
            }
            Some(Visit::Excluded) => {}
            None => match resolve_dependency(root, &name) {
                Some((config, manifest)) => {
                    let index = nodes.len();
                    let dependencies = manifest.dependency_names();
                    nodes.push(PackageNode {
                        id: name.clone(),
                        config,
                        manifest,
                        discovery_index: index,
                    });
                    visited.insert(name, Visit::Node(index));
                    stack.push(Frame {
                        node: index,
                        parent: Some(parent),
                        dependencies,
                        next: 0,
                    });
                }
                None => {
                    visited.insert(name, Visit::Excluded);
                }
            },
        }
    }

    Ok(PackageGraph { nodes, edges })
}

fn edge(nodes: &[PackageNode], dependency: usize, dependent: usize) -> DependencyEdge {
    DependencyEdge::new(nodes[dependency].id.clone(), nodes[dependent].id.clone())
}

/// Returns the dependency's configuration and manifest when it is a local
/// package that takes part in the migration.
fn resolve_dependency(
    root: &ProjectConfig,
    name: &str,
) -> Option<(ProjectConfig, PackageManifest)> {
    let expected_root = root.modules_directory.join(name);

    let config = match ProjectConfig::detect(&expected_root) {
        Ok(config) => config,
        Err(err) if expected_root.join(CONFIG_FILE_NAME).is_file() => {
            warn!(dependency = name, "skipping package with unusable configuration: {err:#}");
            return None;
        }
        Err(err) => {
            debug!(dependency = name, "not a local package: {err:#}");
            return None;
        }
    };
    if config.working_directory != expected_root {
        debug!(
            dependency = name,
            expected = %expected_root.display(),
            detected = %config.working_directory.display(),
            "dependency has no configuration of its own; treating it as external"
        );
        return None;
    }

    let manifest = PackageManifest::read_from_dir(&expected_root).and_then(|manifest| {
        if manifest.name != name {
            return Err(anyhow!(
                "package declares name '{}' but is installed as '{name}'",
                manifest.name
            ));
        }
        Ok(manifest)
    });
    match manifest {
        Ok(manifest) => Some((config, manifest)),
        Err(source) => {
            let err = CascadeError::ManifestRead {
                path: expected_root.join(MANIFEST_FILE_NAME),
                source,
            };
            warn!(dependency = name, "{}", err.chain_message());
            None
        }
    }
}
