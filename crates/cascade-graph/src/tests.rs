use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use cascade_core::{CascadeError, PackageManifest, ProjectConfig, CONFIG_FILE_NAME};

use super::*;

static TEST_ROOT_COUNTER: AtomicU64 = AtomicU64::new(0);

const ROOT_CONFIG: &str = r#"
[networks.development]
ledger = ".cascade/ledger"
"#;

#[test]
fn chain_of_dependencies_yields_post_order_edges_and_dependency_first_plan() {
    let root = test_root();
    package(&root, "app", &["lib-a"]);
    package(&module(&root, "lib-a"), "lib-a", &["lib-b"]);
    package(&module(&root, "lib-b"), "lib-b", &[]);

    let graph = discover(&root_config(&root)).expect("must discover");
    assert_eq!(node_ids(&graph), vec![".", "lib-a", "lib-b"]);
    assert_eq!(
        graph.edges,
        vec![
            DependencyEdge::new("lib-b", "lib-a"),
            DependencyEdge::new("lib-a", "."),
        ]
    );

    let order = schedule(&graph).expect("must schedule");
    assert_eq!(order, vec!["lib-b", "lib-a", "."]);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn root_without_local_dependencies_plans_only_root() {
    let root = test_root();
    package(&root, "solo", &[]);

    let graph = discover(&root_config(&root)).expect("must discover");
    assert_eq!(graph.nodes.len(), 1);
    assert!(graph.root().is_root());
    assert!(graph.edges.is_empty());
    assert_eq!(schedule(&graph).expect("must schedule"), vec!["."]);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn diamond_dependency_is_visited_once_but_contributes_every_edge() {
    let root = test_root();
    package(&root, "app", &["a", "b"]);
    package(&module(&root, "a"), "a", &["shared"]);
    package(&module(&root, "b"), "b", &["shared"]);
    package(&module(&root, "shared"), "shared", &[]);

    let graph = discover(&root_config(&root)).expect("must discover");
    assert_eq!(node_ids(&graph), vec![".", "a", "shared", "b"]);
    assert_eq!(
        graph.edges,
        vec![
            DependencyEdge::new("shared", "a"),
            DependencyEdge::new("a", "."),
            DependencyEdge::new("shared", "b"),
            DependencyEdge::new("b", "."),
        ]
    );

    let order = schedule(&graph).expect("must schedule");
    assert_eq!(order, vec!["shared", "a", "b", "."]);
    assert_respects_edges(&graph, &order);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn missing_dependency_package_is_excluded_silently() {
    let root = test_root();
    package(&root, "app", &["present", "absent"]);
    package(&module(&root, "present"), "present", &[]);

    let graph = discover(&root_config(&root)).expect("must discover");
    assert_eq!(node_ids(&graph), vec![".", "present"]);
    assert_eq!(graph.edges, vec![DependencyEdge::new("present", ".")]);
    assert_eq!(schedule(&graph).expect("plan"), vec!["present", "."]);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn dependency_without_its_own_configuration_is_external() {
    let root = test_root();
    package(&root, "app", &["vendored"]);
    let vendored = module(&root, "vendored");
    fs::create_dir_all(&vendored).expect("must create dir");
    write(
        &vendored.join("package.toml"),
        "name = \"vendored\"\nversion = \"1.0.0\"\n",
    );

    let graph = discover(&root_config(&root)).expect("must discover");
    assert_eq!(node_ids(&graph), vec!["."]);
    assert!(graph.edges.is_empty());

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn malformed_dependency_manifest_is_skipped_and_rest_of_plan_survives() {
    let root = test_root();
    package(&root, "app", &["broken", "fine"]);
    let broken = module(&root, "broken");
    write(&broken.join(CONFIG_FILE_NAME), "");
    write(&broken.join("package.toml"), "name = [this is not toml");
    package(&module(&root, "fine"), "fine", &[]);

    let graph = discover(&root_config(&root)).expect("must discover");
    assert_eq!(node_ids(&graph), vec![".", "fine"]);
    assert_eq!(schedule(&graph).expect("plan"), vec!["fine", "."]);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn dependency_declaring_a_different_name_is_skipped() {
    let root = test_root();
    package(&root, "app", &["lib-a", "lib-b"]);
    package(&module(&root, "lib-a"), "app", &[]);
    package(&module(&root, "lib-b"), "lib-b", &[]);

    let graph = discover(&root_config(&root)).expect("must discover");
    assert_eq!(node_ids(&graph), vec![".", "lib-b"]);
    assert_eq!(schedule(&graph).expect("plan"), vec!["lib-b", "."]);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn unreadable_root_manifest_is_a_configuration_error() {
    let root = test_root();
    write(&root.join(CONFIG_FILE_NAME), ROOT_CONFIG);

    let err = discover(&root_config(&root)).expect_err("root manifest is required");
    assert!(
        matches!(err, CascadeError::Configuration { .. }),
        "unexpected error: {err:?}"
    );
    assert!(err.to_string().contains("cannot read root manifest"));

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn mutual_dependency_fails_with_cycle_naming_blocked_nodes() {
    let root = test_root();
    package(&root, "app", &["a"]);
    package(&module(&root, "a"), "a", &["b"]);
    package(&module(&root, "b"), "b", &["a"]);

    let graph = discover(&root_config(&root)).expect("discovery tolerates cycles");
    assert_eq!(node_ids(&graph), vec![".", "a", "b"]);

    let err = schedule(&graph).expect_err("cycle must fail");
    match err {
        CascadeError::GraphCycle { nodes } => assert_eq!(nodes, vec![".", "a", "b"]),
        other => panic!("unexpected error: {other:?}"),
    }

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn dependencies_of_lists_only_participating_packages() {
    let root = test_root();
    package(&root, "app", &["kept", "missing"]);
    package(&module(&root, "kept"), "kept", &[]);

    let graph = discover(&root_config(&root)).expect("must discover");
    assert_eq!(graph.dependencies_of("."), vec!["kept"]);
    assert!(graph.dependencies_of("kept").is_empty());
    assert!(graph.dependencies_of("unknown").is_empty());

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn ready_nodes_are_emitted_in_discovery_order() {
    let graph = synthetic_graph(
        &[".", "z", "m", "a"],
        &[("z", "."), ("m", "."), ("a", ".")],
    );
    assert_eq!(
        schedule(&graph).expect("must schedule"),
        vec!["z", "m", "a", "."]
    );
}

#[test]
fn schedule_rejects_edges_to_unknown_nodes() {
    let graph = synthetic_graph(&["."], &[("ghost", ".")]);
    let err = schedule(&graph).expect_err("unknown node must fail");
    assert!(err.to_string().contains("undiscovered package"));
}

#[test]
fn wide_acyclic_graph_order_respects_every_edge() {
    let ids = [".", "n1", "n2", "n3", "n4", "n5", "n6"];
    let edges = [
        ("n1", "."),
        ("n2", "n1"),
        ("n3", "n1"),
        ("n4", "n2"),
        ("n4", "n3"),
        ("n5", "."),
        ("n6", "n5"),
        ("n4", "n6"),
    ];
    let graph = synthetic_graph(&ids, &edges);
    let order = schedule(&graph).expect("must schedule");
    assert_eq!(order.len(), ids.len());
    assert_respects_edges(&graph, &order);
}

fn assert_respects_edges(graph: &PackageGraph, order: &[String]) {
    let position = |id: &str| {
        order
            .iter()
            .position(|entry| entry == id)
            .unwrap_or_else(|| panic!("{id} missing from order"))
    };
    for edge in &graph.edges {
        assert!(
            position(&edge.dependency) < position(&edge.dependent),
            "edge {edge:?} violated by {order:?}"
        );
    }
}

fn synthetic_graph(ids: &[&str], edges: &[(&str, &str)]) -> PackageGraph {
    let base = std::env::temp_dir();
    let nodes = ids
        .iter()
        .enumerate()
        .map(|(index, id)| PackageNode {
            id: id.to_string(),
            config: ProjectConfig::from_toml_str("", &base).expect("empty config parses"),
            manifest: PackageManifest::from_toml_str(&format!(
                "name = \"pkg{index}\"\nversion = \"1.0.0\"\n"
            ))
            .expect("manifest parses"),
            discovery_index: index,
        })
        .collect();
    PackageGraph {
        nodes,
        edges: edges
            .iter()
            .map(|(from, to)| DependencyEdge::new(*from, *to))
            .collect(),
    }
}

fn node_ids(graph: &PackageGraph) -> Vec<&str> {
    graph.nodes.iter().map(|node| node.id.as_str()).collect()
}

fn root_config(root: &Path) -> ProjectConfig {
    ProjectConfig::detect(root).expect("root config must be detected")
}

fn module(root: &Path, name: &str) -> PathBuf {
    root.join("cascade_modules").join(name)
}

fn package(dir: &Path, name: &str, dependencies: &[&str]) {
    fs::create_dir_all(dir).expect("must create package dir");
    if !dir.join(CONFIG_FILE_NAME).exists() {
        write(&dir.join(CONFIG_FILE_NAME), ROOT_CONFIG);
    }
    let mut manifest = format!("name = \"{name}\"\nversion = \"1.0.0\"\n\n[dependencies]\n");
    for dependency in dependencies {
        manifest.push_str(&format!("{dependency} = \"^1\"\n"));
    }
    write(&dir.join("package.toml"), &manifest);
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("must create parent");
    }
    fs::write(path, content).expect("must write file");
}

fn test_root() -> PathBuf {
    let mut path = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    let counter = TEST_ROOT_COUNTER.fetch_add(1, Ordering::SeqCst);
    path.push(format!(
        "cascade-graph-tests-{}-{}-{}",
        std::process::id(),
        nanos,
        counter
    ));
    fs::create_dir_all(&path).expect("must create test root");
    path
}
