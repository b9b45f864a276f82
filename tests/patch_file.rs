use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use sqlfix::prelude::*;
use tempfile::TempDir;

fn fixture() -> String {
    let mut p = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    p.push("tests");
    p.push("fixtures");
    p.push("import-data.sql");
    fs::read_to_string(p).expect("fixture")
}

fn scratch(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("import-data.sql");
    fs::write(&path, content).expect("write scratch file");
    path
}

fn patcher(path: &Path) -> Patcher {
    let config = FixConfig::builder().file(path).build().expect("config");
    Patcher::new(config)
}

#[test]
fn blocks_pass_rewrites_only_client_inserts() {
    let dir = TempDir::new().unwrap();
    let path = scratch(&dir, &fixture());

    let report = patcher(&path).run(Pass::Blocks).expect("blocks pass");
    let out = fs::read_to_string(&path).unwrap();

    assert!(report.changed);
    assert!(report.written);
    assert_eq!(report.message, "Changed all clients company_id to JJ");
    match report.stats {
        PassStats::Blocks(s) => {
            assert_eq!(s.blocks, 2);
            assert_eq!(s.lines_changed, 1);
            assert!(!s.unterminated);
        }
        other => panic!("unexpected stats: {:?}", other),
    }

    assert!(out.contains(
        "SELECT 'Maria Souza', '11999990000', (SELECT id FROM companies WHERE name = 'JJ')"
    ));
    // guard lines sit after WHERE NOT EXISTS and keep the old name
    assert!(out.contains("    AND company_id = (SELECT id FROM companies WHERE name = 'Designer 4 You')"));
    // products are not client blocks
    assert!(out.contains("SELECT 'Caneca', (SELECT id FROM companies WHERE name = 'Designer 4 You')"));
    assert_eq!(out.lines().count(), fixture().lines().count());
}

#[test]
fn clauses_pass_strips_guards_and_renames() {
    let dir = TempDir::new().unwrap();
    let path = scratch(&dir, &fixture());

    let report = patcher(&path).run(Pass::Clauses).expect("clauses pass");
    let out = fs::read_to_string(&path).unwrap();

    assert_eq!(
        report.stats,
        PassStats::Clauses(NormalizeStats {
            clauses_removed: 3,
            subqueries_renamed: 2,
        })
    );
    assert!(!out.contains("AND company_id"));
    assert!(out.contains("  WHERE name = 'Maria Souza'\n)\nRETURNING id;"));
    assert!(out.contains("SELECT 1 FROM clients WHERE name = 'Loja Centro'\n)"));
    // the companies seed row is not a subquery
    assert!(out.contains("VALUES ('Designer 4 You') ON CONFLICT DO NOTHING"));
}

#[test]
fn all_runs_blocks_then_clauses() {
    let dir = TempDir::new().unwrap();
    let path = scratch(&dir, &fixture());

    let reports = patcher(&path).run_all().expect("all passes");
    let out = fs::read_to_string(&path).unwrap();

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].pass, Pass::Blocks);
    assert_eq!(reports[1].pass, Pass::Clauses);
    assert_eq!(
        reports[1].stats,
        PassStats::Clauses(NormalizeStats {
            clauses_removed: 3,
            subqueries_renamed: 1,
        })
    );
    assert_eq!(out.matches("Designer 4 You").count(), 1);
    assert_eq!(out, sqlfix::fix_text(&fixture()));
}

#[test]
fn clauses_pass_is_idempotent_on_disk() {
    let dir = TempDir::new().unwrap();
    let path = scratch(&dir, &fixture());
    let p = patcher(&path);

    p.run(Pass::Clauses).unwrap();
    let once = fs::read_to_string(&path).unwrap();
    let second = p.run(Pass::Clauses).unwrap();
    let twice = fs::read_to_string(&path).unwrap();

    assert_eq!(once, twice);
    assert!(!second.changed);
}

#[test]
fn dry_run_leaves_file_untouched() {
    let dir = TempDir::new().unwrap();
    let original = fixture();
    let path = scratch(&dir, &original);

    let reports = patcher(&path).dry_run(true).run_all().unwrap();

    assert!(reports.iter().all(|r| !r.written));
    assert!(reports.iter().all(|r| r.changed));
    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}

#[test]
fn file_without_client_blocks_is_unchanged() {
    let dir = TempDir::new().unwrap();
    let content = "CREATE TABLE clients (id serial primary key);\nINSERT INTO companies (name) VALUES ('Designer 4 You');\n";
    let path = scratch(&dir, content);

    let report = patcher(&path).run(Pass::Blocks).unwrap();

    assert!(!report.changed);
    assert_eq!(fs::read_to_string(&path).unwrap(), content);
}

#[test]
fn missing_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.sql");

    let err = patcher(&path).run(Pass::Clauses).unwrap_err();

    assert!(matches!(err, FixError::Read { .. }));
    assert!(err.to_string().contains("absent.sql"));
}

#[test]
fn report_serializes_to_json() {
    let dir = TempDir::new().unwrap();
    let path = scratch(&dir, &fixture());

    let report = patcher(&path).dry_run(true).run(Pass::Blocks).unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["pass"], "blocks");
    assert_eq!(json["written"], false);
    assert_eq!(json["stats"]["blocks"], 2);
}
