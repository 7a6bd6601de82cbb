use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use semver::VersionReq;

use super::*;

static TEST_ROOT_COUNTER: AtomicU64 = AtomicU64::new(0);

fn test_root() -> PathBuf {
    let mut path = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    let counter = TEST_ROOT_COUNTER.fetch_add(1, Ordering::SeqCst);
    path.push(format!(
        "cascade-core-tests-{}-{}-{}",
        std::process::id(),
        nanos,
        counter
    ));
    fs::create_dir_all(&path).expect("must create test root");
    path
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("must create parent");
    }
    fs::write(path, content).expect("must write file");
}

#[test]
fn parse_manifest() {
    let content = r#"
name = "token-sale"
version = "1.4.0"
description = "crowdsale contracts"

[dependencies]
token = "^1.0"
registry = ">=0.3.0, <0.5.0"
"#;

    let parsed = PackageManifest::from_toml_str(content).expect("manifest should parse");
    assert_eq!(parsed.name, "token-sale");
    assert_eq!(parsed.version.to_string(), "1.4.0");
    assert_eq!(
        parsed.dependencies.get("token"),
        Some(&VersionReq::parse("^1.0").expect("valid version req"))
    );
    assert_eq!(parsed.dependency_names(), vec!["registry", "token"]);
}

#[test]
fn parse_manifest_without_dependencies() {
    let parsed = PackageManifest::from_toml_str("name = \"solo\"\nversion = \"0.1.0\"\n")
        .expect("manifest should parse");
    assert!(parsed.dependencies.is_empty());
}

#[test]
fn parse_manifest_rejects_self_dependency() {
    let err = PackageManifest::from_toml_str(
        r#"
name = "loop"
version = "1.0.0"
[dependencies]
loop = "*"
"#,
    )
    .expect_err("self dependency must fail");
    assert!(err.to_string().contains("depends on itself"));
}

#[test]
fn parse_manifest_rejects_path_like_dependency_names() {
    let err = PackageManifest::from_toml_str(
        r#"
name = "app"
version = "1.0.0"
[dependencies]
"../escape" = "*"
"#,
    )
    .expect_err("path dependency must fail");
    assert!(
        format!("{err:#}").contains("path separators"),
        "unexpected error: {err:#}"
    );
}

#[test]
fn parse_manifest_rejects_malformed_constraint() {
    let result = PackageManifest::from_toml_str(
        r#"
name = "app"
version = "1.0.0"
[dependencies]
lib = "not a version"
"#,
    );
    assert!(result.is_err());
}

#[test]
fn read_manifest_from_dir_reports_missing_file() {
    let root = test_root();
    let err = PackageManifest::read_from_dir(&root).expect_err("missing manifest must fail");
    assert!(err.to_string().contains("failed to read manifest"));
    let _ = fs::remove_dir_all(&root);
}

#[test]
fn detect_resolves_directories_against_config_location() {
    let root = test_root();
    write(
        &root.join(CONFIG_FILE_NAME),
        r#"
[project]
contracts_build_directory = "out"

[networks.development]
ledger = ".cascade/dev"
"#,
    );
    let nested = root.join("migrations").join("deep");
    fs::create_dir_all(&nested).expect("must create nested dir");

    let config = ProjectConfig::detect(&nested).expect("must detect config");
    assert_eq!(config.working_directory, root);
    assert_eq!(config.contracts_build_directory, root.join("out"));
    assert_eq!(config.contracts_directory, root.join("contracts"));
    assert_eq!(config.migrations_directory, root.join("migrations"));
    assert_eq!(config.modules_directory, root.join("cascade_modules"));
    assert_eq!(
        config.networks.get("development").map(|n| n.ledger.clone()),
        Some(root.join(".cascade/dev"))
    );

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn selected_network_prefers_explicit_then_development() {
    let root = test_root();
    let config = ProjectConfig::from_toml_str(
        r#"
[networks.development]
ledger = "dev"
[networks.staging]
ledger = "staging"
"#,
        &root,
    )
    .expect("must parse config");

    assert_eq!(
        config.selected_network().expect("default network"),
        "development"
    );
    let staged = config.clone().with_network(Some("staging".to_string()));
    assert_eq!(staged.selected_network().expect("explicit network"), "staging");

    let unknown = config.with_network(Some("mainnet".to_string()));
    let err = unknown.selected_network().expect_err("unknown network");
    assert!(err.to_string().contains("'mainnet' is not declared"));

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn selected_network_requires_a_declared_network() {
    let root = test_root();
    let config = ProjectConfig::from_toml_str("", &root).expect("must parse empty config");
    let err = config.selected_network().expect_err("no networks");
    assert!(err.to_string().contains("no networks declared"));
    let _ = fs::remove_dir_all(&root);
}

#[test]
fn inherit_from_takes_root_network_settings_only() {
    let root_dir = test_root();
    let root = ProjectConfig::from_toml_str(
        r#"
[project]
modules_directory = "deps"
[networks.development]
ledger = "ledger"
"#,
        &root_dir,
    )
    .expect("root config")
    .with_network(Some("development".to_string()));
    let child_dir = root_dir.join("deps").join("lib");
    let child = ProjectConfig::from_toml_str(
        r#"
[project]
migrations_directory = "steps"
[networks.other]
ledger = "elsewhere"
"#,
        &child_dir,
    )
    .expect("child config");

    let merged = child.inherit_from(&root);
    assert_eq!(merged.network.as_deref(), Some("development"));
    assert_eq!(merged.networks, root.networks);
    assert_eq!(merged.modules_directory, root_dir.join("deps"));
    assert_eq!(merged.migrations_directory, child_dir.join("steps"));
    assert_eq!(merged.working_directory, child_dir);
    // the source value is untouched
    assert!(child.networks.contains_key("other"));

    let _ = fs::remove_dir_all(&root_dir);
}

#[test]
fn parse_script_file_names() {
    let parse = |name: &str| parse_script_file_name(name).expect("must parse");
    assert_eq!(parse("1_init.toml"), Some((1, "init".to_string())));
    assert_eq!(
        parse("1700000000_add_token.toml"),
        Some((1_700_000_000, "add_token".to_string()))
    );
    assert_eq!(parse("42.toml"), Some((42, String::new())));
    assert_eq!(parse("init.toml"), None);
    assert_eq!(parse("3init.toml"), None);
    assert_eq!(parse(".1_hidden.toml"), None);
    assert_eq!(parse("99999999999999999999999init.toml"), None);
}

#[test]
fn step_too_large_for_u64_is_an_error_not_a_skipped_file() {
    let err = parse_script_file_name("18446744073709551616_huge.toml")
        .expect_err("overflowing step must fail");
    assert!(err.to_string().contains("out of range"));
    assert_eq!(
        parse_script_file_name("18446744073709551615_max.toml").expect("must parse"),
        Some((u64::MAX, "max".to_string()))
    );

    let root = test_root();
    write(&root.join("1_init.toml"), "");
    write(&root.join("99999999999999999999_later.toml"), "");
    let err = discover_scripts(&root).expect_err("overflowing step must fail");
    assert!(format!("{err:#}").contains("99999999999999999999_later.toml"));
    let _ = fs::remove_dir_all(&root);
}

#[test]
fn discover_scripts_orders_numerically_and_skips_other_files() {
    let root = test_root();
    for name in ["10_ten.toml", "2_two.toml", "1_one.toml", "README.md"] {
        write(&root.join(name), "");
    }
    fs::create_dir_all(root.join("3_directory")).expect("must create dir");

    let scripts = discover_scripts(&root).expect("must discover");
    let steps = scripts.iter().map(|s| s.step).collect::<Vec<_>>();
    assert_eq!(steps, vec![1, 2, 10]);
    assert_eq!(scripts[0].name, "one");
    assert_eq!(scripts[2].file_name(), "10_ten.toml");

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn discover_scripts_treats_missing_directory_as_empty() {
    let root = test_root();
    let scripts = discover_scripts(&root.join("missing")).expect("missing dir is fine");
    assert!(scripts.is_empty());
    let _ = fs::remove_dir_all(&root);
}

#[test]
fn discover_scripts_rejects_duplicate_steps() {
    let root = test_root();
    write(&root.join("1_init.toml"), "");
    write(&root.join("1_other.toml"), "");
    let err = discover_scripts(&root).expect_err("duplicate step must fail");
    assert!(err.to_string().contains("duplicate migration step 1"));
    let _ = fs::remove_dir_all(&root);
}

#[test]
fn artifact_writer_records_deployment_and_resolver_searches_in_order() {
    let root = test_root();
    let own = root.join("own");
    let dep = root.join("dep");
    let own_writer = ArtifactWriter::new(&own);
    let dep_writer = ArtifactWriter::new(&dep);

    let artifact = |name: &str| ContractArtifact {
        contract_name: name.to_string(),
        source_path: format!("contracts/{name}.sol"),
        source_sha256: "abc".to_string(),
        networks: Default::default(),
    };
    own_writer.save(&artifact("Token")).expect("must save");
    dep_writer.save(&artifact("Token")).expect("must save");
    dep_writer.save(&artifact("Registry")).expect("must save");

    own_writer
        .record_deployment(
            "Token",
            "development",
            Deployment {
                address: "0x01".to_string(),
                package: "app".to_string(),
                step: 1,
            },
        )
        .expect("must record");

    let resolver = Resolver::new(vec![own.clone(), dep.clone()]);
    let token = resolver
        .resolve("Token")
        .expect("resolve ok")
        .expect("token resolves");
    assert_eq!(token.path, own.join("Token.json"));
    assert_eq!(
        token
            .artifact
            .deployment("development")
            .map(|d| d.address.as_str()),
        Some("0x01")
    );
    let registry = resolver
        .resolve("Registry")
        .expect("resolve ok")
        .expect("registry resolves");
    assert_eq!(registry.path, dep.join("Registry.json"));
    assert!(resolver.resolve("Missing").expect("resolve ok").is_none());

    let err = own_writer
        .record_deployment(
            "Missing",
            "development",
            Deployment {
                address: "0x02".to_string(),
                package: "app".to_string(),
                step: 1,
            },
        )
        .expect_err("missing artifact must fail");
    assert!(err.to_string().contains("no artifact for contract 'Missing'"));

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn cycle_error_names_every_node() {
    let err = CascadeError::GraphCycle {
        nodes: vec!["a".to_string(), "b".to_string()],
    };
    assert_eq!(err.to_string(), "dependency cycle detected involving: a, b");
}
