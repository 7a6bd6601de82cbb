use cascade_core::{PackageManifest, ProjectConfig};

pub const ROOT_ID: &str = ".";

/// One local package taking part in the migration.
#[derive(Debug, Clone)]
pub struct PackageNode {
    /// `.` for the root, otherwise the dependency name it was reached by.
    pub id: String,
    pub config: ProjectConfig,
    pub manifest: PackageManifest,
    /// Position in discovery order; the scheduler breaks ties with it.
    pub discovery_index: usize,
}

impl PackageNode {
    pub fn is_root(&self) -> bool {
        self.id == ROOT_ID
    }
}

/// "`dependency` must execute before `dependent`".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyEdge {
    pub dependency: String,
    pub dependent: String,
}

impl DependencyEdge {
    pub fn new(dependency: impl Into<String>, dependent: impl Into<String>) -> Self {
        Self {
            dependency: dependency.into(),
            dependent: dependent.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PackageGraph {
    /// Nodes in discovery order; the root is always first.
    pub nodes: Vec<PackageNode>,
    pub edges: Vec<DependencyEdge>,
}

impl PackageGraph {
    pub fn node(&self, id: &str) -> Option<&PackageNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn root(&self) -> &PackageNode {
        &self.nodes[0]
    }

    /// Participating dependencies of `id`, sorted by name.
    pub fn dependencies_of(&self, id: &str) -> Vec<String> {
        let Some(node) = self.node(id) else {
            return Vec::new();
        };
        node.manifest
            .dependencies
            .keys()
            .filter(|name| {
                self.edges
                    .iter()
                    .any(|edge| &edge.dependency == *name && edge.dependent == id)
            })
            .cloned()
            .collect()
    }
}
