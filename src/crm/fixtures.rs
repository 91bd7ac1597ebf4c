//! Offline seed data: `contacts.json`, `deals.json` and `tasks.json`, each a
//! JSON array of records in their canonical shape.

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::db::CrmDb;
use super::models::{Contact, Deal, Task};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub contacts: usize,
    pub deals: usize,
    pub tasks: usize,
}

fn read_fixture<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<Vec<T>> {
    let path = dir.join(file);
    if !path.exists() {
        debug!(path = %path.display(), "Fixture file not present, skipping");
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Import every fixture file found in `dir`. Records keep their ids.
pub fn seed_from_dir(db: &CrmDb, dir: &Path) -> Result<SeedSummary> {
    if !dir.is_dir() {
        anyhow::bail!("Fixtures directory not found: {}", dir.display());
    }
    let contacts: Vec<Contact> = read_fixture(dir, "contacts.json")?;
    let deals: Vec<Deal> = read_fixture(dir, "deals.json")?;
    let tasks: Vec<Task> = read_fixture(dir, "tasks.json")?;

    for contact in &contacts {
        db.import_contact(contact)?;
    }
    for deal in &deals {
        db.import_deal(deal)?;
    }
    for task in &tasks {
        db.import_task(task)?;
    }

    let summary = SeedSummary {
        contacts: contacts.len(),
        deals: deals.len(),
        tasks: tasks.len(),
    };
    info!(
        contacts = summary.contacts,
        deals = summary.deals,
        tasks = summary.tasks,
        "Seeded fixtures"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEALS: &str = r#"[
        {"id": 3, "title": "Acme renewal", "value": 12000.0, "stage": "Negotiation",
         "probability": 70, "expected_close_date": "2025-05-01", "contact_id": 1,
         "notes": "", "created_at": "2025-01-02T10:00:00Z", "updated_at": "2025-02-01T10:00:00Z"}
    ]"#;

    const CONTACTS: &str = r#"[
        {"id": 1, "first_name": "Ada", "last_name": "Lovelace", "email": "ada@acme.io",
         "phone": "", "company": "Acme", "job_title": "CTO", "address": "", "notes": "",
         "tags": ["vip"], "created_at": "2025-01-01T10:00:00Z", "updated_at": "2025-01-01T10:00:00Z"}
    ]"#;

    #[test]
    fn test_seed_imports_present_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("deals.json"), DEALS).unwrap();
        std::fs::write(dir.path().join("contacts.json"), CONTACTS).unwrap();

        let db = CrmDb::new_in_memory().unwrap();
        let summary = seed_from_dir(&db, dir.path()).unwrap();
        assert_eq!(
            summary,
            SeedSummary {
                contacts: 1,
                deals: 1,
                tasks: 0
            }
        );

        let deal = db.get_deal(3).unwrap().unwrap();
        assert_eq!(deal.stage, "Negotiation");
        assert_eq!(deal.contact_id, Some(1));
        assert_eq!(db.get_contact(1).unwrap().unwrap().tags, vec!["vip"]);
    }

    #[test]
    fn test_seed_rejects_missing_dir() {
        let db = CrmDb::new_in_memory().unwrap();
        assert!(seed_from_dir(&db, Path::new("/definitely/not/here")).is_err());
    }

    #[test]
    fn test_seed_reports_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tasks.json"), "{not json").unwrap();
        let db = CrmDb::new_in_memory().unwrap();
        let err = seed_from_dir(&db, dir.path()).unwrap_err();
        assert!(err.to_string().contains("tasks.json"));
    }
}
