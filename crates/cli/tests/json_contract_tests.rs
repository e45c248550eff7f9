// Integration tests enforcing the sscope shell contract.
//
// stdout from --json commands must be exactly one JSON value of the right
// shape; exit codes must match the registry in src/exit_codes.rs.
//
// Run with: cargo test -p stockscope-cli --test json_contract_tests -- --nocapture

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn sscope(config: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_sscope"));
    cmd.env_remove("SSCOPE_CONFIG")
        .env_remove("SSCOPE_LOG")
        .arg("--config")
        .arg(config);
    cmd
}

/// Assert stdout is a single, parseable JSON value with no extra lines.
fn assert_single_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let trimmed = stdout.trim();
    assert!(!trimmed.is_empty(), "stdout should not be empty");
    serde_json::from_str(trimmed).unwrap_or_else(|e| {
        panic!("stdout must be valid JSON.\nParse error: {}\nstdout:\n{}", e, trimmed)
    })
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Workspace with two branch CSVs, a settings file, and a built snapshot.
struct Shop {
    dir: TempDir,
    config: PathBuf,
}

impl Shop {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("hi.csv"),
            "Reporte de existencias HI\n\
             Cve_Prod,Desc_Prod,Inv,Clasificacion\n\
             001,Martillo Truper 16oz,5,A\n\
             002,Martillo de goma,0,C\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("ex.csv"),
            "Cve_Prod;Desc_Prod;Inv;Clasificacion\n\
             001;Martillo Truper 16oz;3;A\n\
             003;Pinzas Truper;-3;\n",
        )
        .unwrap();

        let config = dir.path().join("stockscope.toml");
        std::fs::write(
            &config,
            r#"database = "inventario.db"

[[ingest.sources]]
path = "hi.csv"
branch = "HI"

[[ingest.sources]]
path = "ex.csv"
branch = "EX"
"#,
        )
        .unwrap();

        let shop = Self { dir, config };
        let out = shop.run(&["build"]);
        assert!(out.status.success(), "build failed: {}", stderr(&out));
        shop
    }

    fn run(&self, args: &[&str]) -> Output {
        sscope(&self.config).args(args).output().expect("run sscope")
    }
}

// ===========================================================================
// build / info
// ===========================================================================

#[test]
fn build_json_reports_snapshot_meta() {
    let shop = Shop::new();
    let out = shop.run(&["build", "--json"]);
    assert!(out.status.success(), "{}", stderr(&out));

    let val = assert_single_json(&out);
    assert_eq!(val["format_version"], serde_json::json!(1));
    assert_eq!(val["report"]["products"], serde_json::json!(3));
    assert_eq!(val["report"]["records"], serde_json::json!(7));
    assert_eq!(val["branches"][0], serde_json::json!("HI"));
    assert!(shop.dir.path().join("inventario.db").exists());
}

#[test]
fn info_json_after_build() {
    let shop = Shop::new();
    let out = shop.run(&["info", "--json"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let val = assert_single_json(&out);
    assert_eq!(val["report"]["branches"].as_array().unwrap().len(), 2);
    assert!(val["built_at"].is_string());
}

#[test]
fn build_without_readable_branches_keeps_old_snapshot() {
    let shop = Shop::new();
    let out = shop.run(&["build", "--csv", "HI=missing.csv"]);
    assert_eq!(out.status.code(), Some(11), "{}", stderr(&out));
    assert!(stderr(&out).contains("missing.csv"));

    // Previous snapshot still answers
    let out = shop.run(&["search", "martillo", "--json"]);
    assert!(out.status.success());
    assert_eq!(assert_single_json(&out)["hits"].as_array().unwrap().len(), 2);
}

#[test]
fn build_skips_unknown_branch() {
    let shop = Shop::new();
    let out = shop.run(&["build", "--csv", "QQ=hi.csv"]);
    assert_eq!(out.status.code(), Some(11), "{}", stderr(&out));
    assert!(stderr(&out).contains("'QQ' is not a configured branch"));

    let out = shop.run(&["build", "--csv", "QQ=hi.csv", "--csv", "EX=ex.csv", "--json"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let val = assert_single_json(&out);
    assert_eq!(val["report"]["skipped"][0]["branch"], serde_json::json!("QQ"));
    assert_eq!(val["report"]["branches"][0]["branch"], serde_json::json!("EX"));
}

#[test]
fn configured_source_for_unknown_branch_is_skipped() {
    let shop = Shop::new();
    let mut config = std::fs::read_to_string(&shop.config).unwrap();
    config.push_str("\n[[ingest.sources]]\npath = \"hi.csv\"\nbranch = \"ZZ\"\n");
    std::fs::write(&shop.config, config).unwrap();

    let out = shop.run(&["build", "--json"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let val = assert_single_json(&out);
    assert_eq!(val["report"]["skipped"][0]["branch"], serde_json::json!("ZZ"));
    assert_eq!(val["report"]["products"], serde_json::json!(3));

    let out = shop.run(&["info", "--json"]);
    assert!(out.status.success(), "{}", stderr(&out));
}

#[test]
fn build_without_sources() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("empty.toml");
    std::fs::write(&config, "").unwrap();
    let out = sscope(&config).arg("build").output().unwrap();
    assert_eq!(out.status.code(), Some(10));
}

// ===========================================================================
// search
// ===========================================================================

#[test]
fn search_json_shape() {
    let shop = Shop::new();
    let out = shop.run(&["search", "martillo", "truper", "--json"]);
    assert!(out.status.success(), "{}", stderr(&out));

    let val = assert_single_json(&out);
    assert_eq!(val["query"], serde_json::json!("martillo truper"));
    assert_eq!(val["truncated"], serde_json::json!(false));
    let hits = val["hits"].as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["code"], serde_json::json!("001"));
    assert_eq!(hits[0]["stock"], serde_json::json!(8));
    assert_eq!(hits[0]["classification"], serde_json::json!("A"));
    assert_eq!(hits[0]["level"], serde_json::json!("available"));
    assert_eq!(hits[0]["status"], serde_json::json!("active"));
    assert!(hits[0].get("highlighted").is_none());
}

#[test]
fn search_highlight_and_sort() {
    let shop = Shop::new();
    let out = shop.run(&["search", "martillo", "--sort", "stock-desc", "--highlight", "--json"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let val = assert_single_json(&out);
    let hits = val["hits"].as_array().unwrap();
    assert_eq!(hits[0]["code"], serde_json::json!("001"));
    assert_eq!(
        hits[0]["highlighted"],
        serde_json::json!("<mark>Martillo</mark> Truper 16oz")
    );
}

#[test]
fn search_filters() {
    let shop = Shop::new();
    let out = shop.run(&["search", "truper", "--in-stock", "--json"]);
    let codes: Vec<String> = assert_single_json(&out)["hits"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["code"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(codes, vec!["001"]);

    let out = shop.run(&["search", "truper", "--branch", "ex", "--json"]);
    assert_eq!(assert_single_json(&out)["hits"].as_array().unwrap().len(), 2);
}

#[test]
fn search_text_flags_negative_stock() {
    let shop = Shop::new();
    let out = shop.run(&["search", "pinzas"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Pinzas Truper"));
    assert!(stdout.contains("NEGATIVE STOCK"));
}

#[test]
fn short_query_is_usage_error() {
    let shop = Shop::new();
    let out = shop.run(&["search", "m", "--json"]);
    assert_eq!(out.status.code(), Some(2));
    let val = assert_single_json(&out);
    assert_eq!(val["issue"]["kind"], serde_json::json!("bad_request"));
    assert!(val["hits"].as_array().unwrap().is_empty());
}

#[test]
fn missing_snapshot_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("s.toml");
    std::fs::write(&config, "database = \"nothing-here.db\"\n").unwrap();
    let out = sscope(&config).args(["search", "martillo"]).output().unwrap();
    assert_eq!(out.status.code(), Some(5));
    assert!(stderr(&out).contains("sscope build"));
}

// ===========================================================================
// detail
// ===========================================================================

#[test]
fn detail_json_lists_every_branch() {
    let shop = Shop::new();
    let out = shop.run(&["detail", "001", "--json"]);
    assert!(out.status.success(), "{}", stderr(&out));

    let val = assert_single_json(&out);
    assert_eq!(val["outcome"], serde_json::json!("found"));
    assert_eq!(val["total"], serde_json::json!(8));
    let branches: Vec<(String, bool)> = val["branches"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| (b["branch"].as_str().unwrap().to_string(), b["present"].as_bool().unwrap()))
        .collect();
    assert_eq!(
        branches,
        vec![
            ("HI".to_string(), true),
            ("EX".to_string(), true),
            ("MT".to_string(), false),
            ("SA".to_string(), false),
            ("ADE".to_string(), false),
        ]
    );
}

#[test]
fn detail_exit_codes() {
    let shop = Shop::new();
    let out = shop.run(&["detail", "999", "--json"]);
    assert_eq!(out.status.code(), Some(3));
    assert_eq!(assert_single_json(&out)["outcome"], serde_json::json!("unknown_code"));

    let out = shop.run(&["detail", "003", "--in-stock"]);
    assert_eq!(out.status.code(), Some(4));

    let out = shop.run(&["detail", "001", "--branch", "XX"]);
    assert_eq!(out.status.code(), Some(2));
}

// ===========================================================================
// config
// ===========================================================================

#[test]
fn config_init_then_show() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("nested").join("stockscope.toml");

    let out = sscope(&config).args(["config", "init"]).output().unwrap();
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(config.exists());

    let out = sscope(&config).args(["config", "init"]).output().unwrap();
    assert_eq!(out.status.code(), Some(20));

    let out = sscope(&config).args(["config", "show"]).output().unwrap();
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(String::from_utf8_lossy(&out.stdout).contains("branches"));
}

#[test]
fn explicit_missing_config_is_config_error() {
    let dir = TempDir::new().unwrap();
    let out = sscope(&dir.path().join("absent.toml")).arg("info").output().unwrap();
    assert_eq!(out.status.code(), Some(20));
    assert!(stderr(&out).contains("config init"));
}
