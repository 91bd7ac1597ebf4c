//! Integration tests for the dealflow CLI.
//!
//! Each test runs the binary against a fresh project directory.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use chrono::Utc;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

use dealflow::crm::db::CrmDb;
use dealflow::crm::models::NewDeal;

/// Helper to create a dealflow Command isolated from the caller's environment
fn dealflow() -> Command {
    let mut cmd = cargo_bin_cmd!("dealflow");
    cmd.env_remove("DEALFLOW_PORT")
        .env_remove("DEALFLOW_DB_PATH")
        .env_remove("DEALFLOW_LOG")
        .env_remove("RUST_LOG");
    cmd
}

fn create_temp_project() -> TempDir {
    TempDir::new().unwrap()
}

fn init_project(dir: &TempDir) {
    dealflow()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();
}

/// Insert a deal straight into the project database.
fn seed_deal(dir: &TempDir, title: &str, stage: &str, value: f64) {
    let db = CrmDb::new(&dir.path().join(".dealflow/crm.db")).unwrap();
    db.insert_deal(
        &NewDeal {
            title: title.to_string(),
            value,
            ..Default::default()
        },
        stage,
        Utc::now(),
    )
    .unwrap();
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_dealflow_help() {
        dealflow()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("stages"));
    }

    #[test]
    fn test_dealflow_version() {
        dealflow().arg("--version").assert().success();
    }

    #[test]
    fn test_init_creates_structure() {
        let dir = create_temp_project();

        dealflow()
            .current_dir(dir.path())
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("Initialized dealflow project"));

        assert!(dir.path().join(".dealflow/dealflow.toml").exists());
        assert!(dir.path().join(".dealflow/crm.db").exists());
    }

    #[test]
    fn test_init_idempotent() {
        let dir = create_temp_project();
        init_project(&dir);

        fs::write(
            dir.path().join(".dealflow/dealflow.toml"),
            "[server]\nport = 9999\n",
        )
        .unwrap();

        dealflow()
            .current_dir(dir.path())
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("already initialized"));

        let content = fs::read_to_string(dir.path().join(".dealflow/dealflow.toml")).unwrap();
        assert!(content.contains("9999"));
    }

    #[test]
    fn test_commands_require_init() {
        let dir = create_temp_project();

        dealflow()
            .current_dir(dir.path())
            .arg("board")
            .assert()
            .failure()
            .stderr(predicate::str::contains("dealflow init"));
    }
}

// =============================================================================
// Pipeline Stage Tests
// =============================================================================

mod stages {
    use super::*;

    #[test]
    fn test_stages_list_defaults() {
        let dir = create_temp_project();
        init_project(&dir);

        dealflow()
            .current_dir(dir.path())
            .args(["stages", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Lead"))
            .stdout(predicate::str::contains("Qualified"))
            .stdout(predicate::str::contains("Closed Won"));
    }

    #[test]
    fn test_stages_add_persists() {
        let dir = create_temp_project();
        init_project(&dir);

        dealflow()
            .current_dir(dir.path())
            .args(["stages", "add", "Closed Lost", "--probability", "0"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Added"));

        dealflow()
            .current_dir(dir.path())
            .arg("stages")
            .assert()
            .success()
            .stdout(predicate::str::contains("Closed Lost"));
    }

    #[test]
    fn test_stages_add_duplicate_fails() {
        let dir = create_temp_project();
        init_project(&dir);

        dealflow()
            .current_dir(dir.path())
            .args(["stages", "add", "Lead"])
            .assert()
            .failure();
    }

    #[test]
    fn test_stages_rename_moves_deals() {
        let dir = create_temp_project();
        init_project(&dir);
        seed_deal(&dir, "Acme renewal", "Proposal", 5000.0);

        dealflow()
            .current_dir(dir.path())
            .args(["stages", "rename", "Proposal", "Quote"])
            .assert()
            .success()
            .stdout(predicate::str::contains("1 deal(s) moved"));

        dealflow()
            .current_dir(dir.path())
            .arg("board")
            .assert()
            .success()
            .stdout(predicate::str::contains("Quote"))
            .stdout(predicate::str::contains("Acme renewal"))
            .stdout(predicate::str::contains("was 'Proposal'").not());
    }

    #[test]
    fn test_stages_move_reorders() {
        let dir = create_temp_project();
        init_project(&dir);

        dealflow()
            .current_dir(dir.path())
            .args(["stages", "move", "Negotiation", "1"])
            .assert()
            .success()
            .stdout(predicate::str::is_match(r"1\. Negotiation").unwrap());
    }

    #[test]
    fn test_stages_move_rejects_zero() {
        let dir = create_temp_project();
        init_project(&dir);

        dealflow()
            .current_dir(dir.path())
            .args(["stages", "move", "Lead", "0"])
            .assert()
            .failure();
    }

    #[test]
    fn test_stages_delete_reports_orphans() {
        let dir = create_temp_project();
        init_project(&dir);
        seed_deal(&dir, "Stuck deal", "Negotiation", 1200.0);

        dealflow()
            .current_dir(dir.path())
            .args(["stages", "delete", "Negotiation"])
            .assert()
            .success()
            .stdout(predicate::str::contains("1 deal(s) still use 'Negotiation'"));

        dealflow()
            .current_dir(dir.path())
            .arg("board")
            .assert()
            .success()
            .stdout(predicate::str::contains("was 'Negotiation'"));
    }

    #[test]
    fn test_stages_unknown_name_fails() {
        let dir = create_temp_project();
        init_project(&dir);

        dealflow()
            .current_dir(dir.path())
            .args(["stages", "delete", "Nope"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No pipeline stage named 'Nope'"));
    }
}

// =============================================================================
// Board and Report Tests
// =============================================================================

mod views {
    use super::*;

    #[test]
    fn test_board_shows_totals() {
        let dir = create_temp_project();
        init_project(&dir);
        seed_deal(&dir, "Big one", "Lead", 12000.0);
        seed_deal(&dir, "Small one", "Lead", 500.0);

        dealflow()
            .current_dir(dir.path())
            .arg("board")
            .assert()
            .success()
            .stdout(predicate::str::contains("(2, $12,500)"))
            .stdout(predicate::str::contains("Big one"));
    }

    #[test]
    fn test_report_json() {
        let dir = create_temp_project();
        init_project(&dir);
        seed_deal(&dir, "Open deal", "Qualified", 3000.0);

        let output = dealflow()
            .current_dir(dir.path())
            .args(["report", "--json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(report["metrics"]["total_pipeline_value"], 3000.0);
        assert_eq!(report["revenue_trend"].as_array().unwrap().len(), 6);
        assert_eq!(report["pipeline"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn test_report_text() {
        let dir = create_temp_project();
        init_project(&dir);

        dealflow()
            .current_dir(dir.path())
            .arg("report")
            .assert()
            .success()
            .stdout(predicate::str::contains("Dashboard"))
            .stdout(predicate::str::contains("Conversion rate"));
    }
}

// =============================================================================
// Configuration Tests
// =============================================================================

mod configuration {
    use super::*;

    #[test]
    fn test_config_show_defaults() {
        let dir = create_temp_project();

        dealflow()
            .current_dir(dir.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("showing defaults"))
            .stdout(predicate::str::contains("port = 3141"));
    }

    #[test]
    fn test_config_validate_clean() {
        let dir = create_temp_project();
        init_project(&dir);

        dealflow()
            .current_dir(dir.path())
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration is valid."));
    }

    #[test]
    fn test_config_validate_warnings() {
        let dir = create_temp_project();
        init_project(&dir);
        fs::write(
            dir.path().join(".dealflow/dealflow.toml"),
            "[reporting]\ntrend_months = 0\n",
        )
        .unwrap();

        dealflow()
            .current_dir(dir.path())
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("trend_months"));
    }

    #[test]
    fn test_env_port_override() {
        let dir = create_temp_project();

        dealflow()
            .current_dir(dir.path())
            .env("DEALFLOW_PORT", "4242")
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("port = 4242"));
    }

    #[test]
    fn test_malformed_toml_fails() {
        let dir = create_temp_project();
        init_project(&dir);
        fs::write(dir.path().join(".dealflow/dealflow.toml"), "[server\n").unwrap();

        dealflow()
            .current_dir(dir.path())
            .arg("board")
            .assert()
            .failure()
            .stderr(predicate::str::contains("dealflow.toml"));
    }
}

// =============================================================================
// Global Flags
// =============================================================================

mod global_flags {
    use super::*;

    #[test]
    fn test_project_dir_flag() {
        let dir = create_temp_project();
        let other_dir = create_temp_project();
        init_project(&dir);

        dealflow()
            .current_dir(other_dir.path())
            .arg("--project-dir")
            .arg(dir.path())
            .args(["stages", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Lead"));
    }

    #[test]
    fn test_verbose_flag() {
        let dir = create_temp_project();
        init_project(&dir);

        dealflow()
            .current_dir(dir.path())
            .arg("--verbose")
            .arg("board")
            .assert()
            .success();
    }
}
