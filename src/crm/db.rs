use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use super::models::*;

/// Async-safe handle to the CRM database.
///
/// Wraps `CrmDb` behind `Arc<Mutex>` and runs all access on tokio's
/// blocking thread pool via `spawn_blocking`, so synchronous SQLite I/O
/// never ties up async worker threads.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<std::sync::Mutex<CrmDb>>,
}

impl DbHandle {
    pub fn new(db: CrmDb) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(db)),
        }
    }

    /// Run a closure with access to the database on a blocking thread.
    /// All data passed into `f` must be owned (`'static`).
    pub async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&CrmDb) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db.lock().map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
            f(&guard)
        })
        .await
        .context("DB task panicked")?
    }
}

/// SQLite adapter for the `contact_c`, `deal_c` and `task_c` tables.
///
/// Column names follow the remote table layout (`title_c`, `stage_c`, ...).
/// Translation to the canonical records happens in the `*Row` types at the
/// bottom of this file and nowhere else.
pub struct CrmDb {
    conn: Connection,
}

const CONTACT_COLUMNS: &str = "id, first_name_c, last_name_c, email_c, phone_c, company_c, job_title_c, address_c, notes_c, tags_c, created_at_c, updated_at_c";
const DEAL_COLUMNS: &str = "id, title_c, value_c, stage_c, probability_c, expected_close_date_c, contact_id_c, notes_c, created_at_c, updated_at_c";
const TASK_COLUMNS: &str = "id, type_c, title_c, description_c, due_date_c, priority_c, completed_c, contact_id_c, deal_id_c, created_at_c, updated_at_c";

impl CrmDb {
    /// Open (or create) a SQLite database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Create an in-memory SQLite database (offline mode and tests).
    pub fn new_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        self.run_migrations().context("Failed to run migrations")?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS contact_c (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    first_name_c TEXT NOT NULL,
                    last_name_c TEXT NOT NULL,
                    email_c TEXT NOT NULL,
                    phone_c TEXT NOT NULL DEFAULT '',
                    company_c TEXT NOT NULL DEFAULT '',
                    job_title_c TEXT NOT NULL DEFAULT '',
                    address_c TEXT NOT NULL DEFAULT '',
                    notes_c TEXT NOT NULL DEFAULT '',
                    tags_c TEXT NOT NULL DEFAULT '[]',
                    created_at_c TEXT NOT NULL,
                    updated_at_c TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS deal_c (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title_c TEXT NOT NULL,
                    value_c REAL NOT NULL DEFAULT 0,
                    stage_c TEXT NOT NULL,
                    probability_c INTEGER NOT NULL DEFAULT 0,
                    expected_close_date_c TEXT,
                    contact_id_c INTEGER,
                    notes_c TEXT NOT NULL DEFAULT '',
                    created_at_c TEXT NOT NULL,
                    updated_at_c TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS task_c (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    type_c TEXT NOT NULL DEFAULT '',
                    title_c TEXT NOT NULL,
                    description_c TEXT NOT NULL DEFAULT '',
                    due_date_c TEXT,
                    priority_c TEXT NOT NULL DEFAULT 'Medium',
                    completed_c INTEGER NOT NULL DEFAULT 0,
                    contact_id_c INTEGER,
                    deal_id_c INTEGER,
                    created_at_c TEXT NOT NULL,
                    updated_at_c TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS settings (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE UNIQUE INDEX IF NOT EXISTS idx_contact_email ON contact_c(email_c COLLATE NOCASE);
                CREATE INDEX IF NOT EXISTS idx_deal_contact ON deal_c(contact_id_c);
                CREATE INDEX IF NOT EXISTS idx_deal_stage ON deal_c(stage_c);
                CREATE INDEX IF NOT EXISTS idx_task_contact ON task_c(contact_id_c);
                ",
            )
            .context("Failed to create tables")?;
        Ok(())
    }

    // ── Contacts ──────────────────────────────────────────────────────

    pub fn insert_contact(&self, input: &ContactInput, now: DateTime<Utc>) -> Result<Contact> {
        let now = timestamp(now);
        self.conn
            .execute(
                "INSERT INTO contact_c (first_name_c, last_name_c, email_c, phone_c, company_c, job_title_c, address_c, notes_c, tags_c, created_at_c, updated_at_c)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
                params![
                    input.first_name,
                    input.last_name,
                    input.email,
                    input.phone,
                    input.company,
                    input.job_title,
                    input.address,
                    input.notes,
                    encode_tags(&input.tags)?,
                    now,
                ],
            )
            .context("Failed to insert contact")?;
        let id = self.conn.last_insert_rowid();
        self.get_contact(id)?
            .context("Contact not found after insert")
    }

    /// Insert a contact keeping its id and timestamps (fixture import).
    pub fn import_contact(&self, contact: &Contact) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO contact_c (id, first_name_c, last_name_c, email_c, phone_c, company_c, job_title_c, address_c, notes_c, tags_c, created_at_c, updated_at_c)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    contact.id,
                    contact.first_name,
                    contact.last_name,
                    contact.email,
                    contact.phone,
                    contact.company,
                    contact.job_title,
                    contact.address,
                    contact.notes,
                    encode_tags(&contact.tags)?,
                    timestamp(contact.created_at),
                    timestamp(contact.updated_at),
                ],
            )
            .with_context(|| format!("Failed to import contact {}", contact.id))?;
        Ok(())
    }

    pub fn list_contacts(&self) -> Result<Vec<Contact>> {
        let sql = format!(
            "SELECT {} FROM contact_c ORDER BY updated_at_c DESC, id DESC",
            CONTACT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql).context("Failed to prepare list_contacts")?;
        let rows = stmt
            .query_map([], ContactRow::read)
            .context("Failed to query contacts")?;
        let mut contacts = Vec::new();
        for row in rows {
            contacts.push(row.context("Failed to read contact row")?.into_contact()?);
        }
        Ok(contacts)
    }

    pub fn get_contact(&self, id: i64) -> Result<Option<Contact>> {
        let sql = format!("SELECT {} FROM contact_c WHERE id = ?1", CONTACT_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, params![id], ContactRow::read)
            .optional()
            .context("Failed to query contact")?;
        row.map(ContactRow::into_contact).transpose()
    }

    pub fn find_contact_by_email(&self, email: &str) -> Result<Option<Contact>> {
        let sql = format!(
            "SELECT {} FROM contact_c WHERE lower(email_c) = lower(?1) LIMIT 1",
            CONTACT_COLUMNS
        );
        let row = self
            .conn
            .query_row(&sql, params![email.trim()], ContactRow::read)
            .optional()
            .context("Failed to query contact by email")?;
        row.map(ContactRow::into_contact).transpose()
    }

    /// Case-insensitive substring search over the searchable contact columns.
    pub fn search_contacts(&self, term: &str) -> Result<Vec<Contact>> {
        let sql = format!(
            "SELECT {} FROM contact_c
             WHERE instr(lower(first_name_c), ?1) > 0
                OR instr(lower(last_name_c), ?1) > 0
                OR instr(lower(email_c), ?1) > 0
                OR instr(lower(company_c), ?1) > 0
                OR instr(lower(job_title_c), ?1) > 0
                OR instr(lower(phone_c), ?1) > 0
                OR instr(lower(tags_c), ?1) > 0
             ORDER BY updated_at_c DESC, id DESC",
            CONTACT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql).context("Failed to prepare search_contacts")?;
        let rows = stmt
            .query_map(params![term.trim().to_lowercase()], ContactRow::read)
            .context("Failed to search contacts")?;
        let mut contacts = Vec::new();
        for row in rows {
            contacts.push(row.context("Failed to read contact row")?.into_contact()?);
        }
        Ok(contacts)
    }

    pub fn update_contact(
        &self,
        id: i64,
        input: &ContactInput,
        now: DateTime<Utc>,
    ) -> Result<Option<Contact>> {
        let changed = self
            .conn
            .execute(
                "UPDATE contact_c SET first_name_c = ?1, last_name_c = ?2, email_c = ?3, phone_c = ?4, company_c = ?5,
                     job_title_c = ?6, address_c = ?7, notes_c = ?8, tags_c = ?9, updated_at_c = ?10
                 WHERE id = ?11",
                params![
                    input.first_name,
                    input.last_name,
                    input.email,
                    input.phone,
                    input.company,
                    input.job_title,
                    input.address,
                    input.notes,
                    encode_tags(&input.tags)?,
                    timestamp(now),
                    id,
                ],
            )
            .context("Failed to update contact")?;
        if changed == 0 {
            return Ok(None);
        }
        self.get_contact(id)
    }

    pub fn delete_contact(&self, id: i64) -> Result<bool> {
        let count = self
            .conn
            .execute("DELETE FROM contact_c WHERE id = ?1", params![id])
            .context("Failed to delete contact")?;
        Ok(count > 0)
    }

    // ── Deals ─────────────────────────────────────────────────────────

    /// Insert a deal. `stage` must already be resolved against the settings.
    pub fn insert_deal(&self, deal: &NewDeal, stage: &str, now: DateTime<Utc>) -> Result<Deal> {
        let now = timestamp(now);
        self.conn
            .execute(
                "INSERT INTO deal_c (title_c, value_c, stage_c, probability_c, expected_close_date_c, contact_id_c, notes_c, created_at_c, updated_at_c)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
                params![
                    deal.title,
                    deal.value,
                    stage,
                    deal.probability,
                    deal.expected_close_date.map(date_string),
                    deal.contact_id,
                    deal.notes,
                    now,
                ],
            )
            .context("Failed to insert deal")?;
        let id = self.conn.last_insert_rowid();
        self.get_deal(id)?.context("Deal not found after insert")
    }

    /// Insert a deal keeping its id, stage and timestamps (fixture import).
    pub fn import_deal(&self, deal: &Deal) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO deal_c (id, title_c, value_c, stage_c, probability_c, expected_close_date_c, contact_id_c, notes_c, created_at_c, updated_at_c)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    deal.id,
                    deal.title,
                    deal.value,
                    deal.stage,
                    deal.probability,
                    deal.expected_close_date.map(date_string),
                    deal.contact_id,
                    deal.notes,
                    timestamp(deal.created_at),
                    timestamp(deal.updated_at),
                ],
            )
            .with_context(|| format!("Failed to import deal {}", deal.id))?;
        Ok(())
    }

    pub fn list_deals(&self) -> Result<Vec<Deal>> {
        let sql = format!(
            "SELECT {} FROM deal_c ORDER BY expected_close_date_c IS NULL, expected_close_date_c DESC, id",
            DEAL_COLUMNS
        );
        self.query_deals(&sql, [])
    }

    pub fn list_deals_by_contact(&self, contact_id: i64) -> Result<Vec<Deal>> {
        let sql = format!(
            "SELECT {} FROM deal_c WHERE contact_id_c = ?1
             ORDER BY expected_close_date_c IS NULL, expected_close_date_c DESC, id",
            DEAL_COLUMNS
        );
        self.query_deals(&sql, params![contact_id])
    }

    pub fn get_deal(&self, id: i64) -> Result<Option<Deal>> {
        let sql = format!("SELECT {} FROM deal_c WHERE id = ?1", DEAL_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, params![id], DealRow::read)
            .optional()
            .context("Failed to query deal")?;
        row.map(DealRow::into_deal).transpose()
    }

    pub fn update_deal(
        &self,
        id: i64,
        update: &DealUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<Deal>> {
        let changed = self
            .conn
            .execute(
                "UPDATE deal_c SET title_c = ?1, value_c = ?2, probability_c = ?3, expected_close_date_c = ?4,
                     contact_id_c = ?5, notes_c = ?6, updated_at_c = ?7
                 WHERE id = ?8",
                params![
                    update.title,
                    update.value,
                    update.probability,
                    update.expected_close_date.map(date_string),
                    update.contact_id,
                    update.notes,
                    timestamp(now),
                    id,
                ],
            )
            .context("Failed to update deal")?;
        if changed == 0 {
            return Ok(None);
        }
        self.get_deal(id)
    }

    pub fn update_deal_stage(
        &self,
        id: i64,
        stage: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Deal>> {
        let changed = self
            .conn
            .execute(
                "UPDATE deal_c SET stage_c = ?1, updated_at_c = ?2 WHERE id = ?3",
                params![stage, timestamp(now), id],
            )
            .context("Failed to update deal stage")?;
        if changed == 0 {
            return Ok(None);
        }
        self.get_deal(id)
    }

    /// Move every deal on `from` to `to`. Returns the number of deals moved.
    pub fn rename_deal_stage(&self, from: &str, to: &str, now: DateTime<Utc>) -> Result<usize> {
        let count = self
            .conn
            .execute(
                "UPDATE deal_c SET stage_c = ?1, updated_at_c = ?2 WHERE stage_c = ?3",
                params![to, timestamp(now), from],
            )
            .context("Failed to migrate deal stage")?;
        Ok(count)
    }

    #[cfg(test)]
    pub fn count_deals_in_stage(&self, stage: &str) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM deal_c WHERE stage_c = ?1",
                params![stage],
                |row| row.get(0),
            )
            .context("Failed to count deals in stage")?;
        Ok(count as usize)
    }

    pub fn delete_deal(&self, id: i64) -> Result<bool> {
        let count = self
            .conn
            .execute("DELETE FROM deal_c WHERE id = ?1", params![id])
            .context("Failed to delete deal")?;
        Ok(count > 0)
    }

    fn query_deals<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<Deal>> {
        let mut stmt = self.conn.prepare(sql).context("Failed to prepare deal query")?;
        let rows = stmt
            .query_map(params, DealRow::read)
            .context("Failed to query deals")?;
        let mut deals = Vec::new();
        for row in rows {
            deals.push(row.context("Failed to read deal row")?.into_deal()?);
        }
        Ok(deals)
    }

    // ── Tasks ─────────────────────────────────────────────────────────

    pub fn insert_task(&self, task: &NewTask, now: DateTime<Utc>) -> Result<Task> {
        let now = timestamp(now);
        self.conn
            .execute(
                "INSERT INTO task_c (type_c, title_c, description_c, due_date_c, priority_c, completed_c, contact_id_c, deal_id_c, created_at_c, updated_at_c)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
                params![
                    task.task_type,
                    task.title,
                    task.description,
                    task.due_date.map(timestamp),
                    task.priority.as_str(),
                    task.completed,
                    task.contact_id,
                    task.deal_id,
                    now,
                ],
            )
            .context("Failed to insert task")?;
        let id = self.conn.last_insert_rowid();
        self.get_task(id)?.context("Task not found after insert")
    }

    /// Insert a task keeping its id and timestamps (fixture import).
    pub fn import_task(&self, task: &Task) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO task_c (id, type_c, title_c, description_c, due_date_c, priority_c, completed_c, contact_id_c, deal_id_c, created_at_c, updated_at_c)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    task.id,
                    task.task_type,
                    task.title,
                    task.description,
                    task.due_date.map(timestamp),
                    task.priority.as_str(),
                    task.completed,
                    task.contact_id,
                    task.deal_id,
                    timestamp(task.created_at),
                    timestamp(task.updated_at),
                ],
            )
            .with_context(|| format!("Failed to import task {}", task.id))?;
        Ok(())
    }

    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT {} FROM task_c ORDER BY due_date_c IS NULL, due_date_c ASC, id",
            TASK_COLUMNS
        );
        self.query_tasks(&sql, [])
    }

    pub fn list_tasks_by_contact(&self, contact_id: i64) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT {} FROM task_c WHERE contact_id_c = ?1 ORDER BY updated_at_c DESC, id DESC",
            TASK_COLUMNS
        );
        self.query_tasks(&sql, params![contact_id])
    }

    pub fn get_task(&self, id: i64) -> Result<Option<Task>> {
        let sql = format!("SELECT {} FROM task_c WHERE id = ?1", TASK_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, params![id], TaskRow::read)
            .optional()
            .context("Failed to query task")?;
        row.map(TaskRow::into_task).transpose()
    }

    pub fn update_task(
        &self,
        id: i64,
        update: &TaskUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<Task>> {
        let changed = self
            .conn
            .execute(
                "UPDATE task_c SET type_c = ?1, title_c = ?2, description_c = ?3, due_date_c = ?4, priority_c = ?5,
                     contact_id_c = ?6, deal_id_c = ?7, updated_at_c = ?8
                 WHERE id = ?9",
                params![
                    update.task_type,
                    update.title,
                    update.description,
                    update.due_date.map(timestamp),
                    update.priority.as_str(),
                    update.contact_id,
                    update.deal_id,
                    timestamp(now),
                    id,
                ],
            )
            .context("Failed to update task")?;
        if changed == 0 {
            return Ok(None);
        }
        self.get_task(id)
    }

    pub fn set_task_completed(
        &self,
        id: i64,
        completed: bool,
        now: DateTime<Utc>,
    ) -> Result<Option<Task>> {
        let changed = self
            .conn
            .execute(
                "UPDATE task_c SET completed_c = ?1, updated_at_c = ?2 WHERE id = ?3",
                params![completed, timestamp(now), id],
            )
            .context("Failed to mark task complete")?;
        if changed == 0 {
            return Ok(None);
        }
        self.get_task(id)
    }

    pub fn delete_task(&self, id: i64) -> Result<bool> {
        let count = self
            .conn
            .execute("DELETE FROM task_c WHERE id = ?1", params![id])
            .context("Failed to delete task")?;
        Ok(count > 0)
    }

    fn query_tasks<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(sql).context("Failed to prepare task query")?;
        let rows = stmt
            .query_map(params, TaskRow::read)
            .context("Failed to query tasks")?;
        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row.context("Failed to read task row")?.into_task()?);
        }
        Ok(tasks)
    }

    // ── Settings ──────────────────────────────────────────────────────

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to read setting")
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value],
            )
            .context("Failed to write setting")?;
        Ok(())
    }
}

// ── Row adapters ──────────────────────────────────────────────────────

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn date_string(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Invalid timestamp '{}'", raw))
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| format!("Invalid date '{}'", raw))
}

/// Tags are stored as a JSON array so a tag may contain any character.
fn encode_tags(tags: &[String]) -> Result<String> {
    serde_json::to_string(tags).context("Failed to encode contact tags")
}

fn decode_tags(raw: &str) -> Result<Vec<String>> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).with_context(|| format!("Invalid contact tags '{}'", raw))
}

struct ContactRow {
    id: i64,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    company: String,
    job_title: String,
    address: String,
    notes: String,
    tags: String,
    created_at: String,
    updated_at: String,
}

impl ContactRow {
    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            email: row.get(3)?,
            phone: row.get(4)?,
            company: row.get(5)?,
            job_title: row.get(6)?,
            address: row.get(7)?,
            notes: row.get(8)?,
            tags: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }

    fn into_contact(self) -> Result<Contact> {
        Ok(Contact {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            company: self.company,
            job_title: self.job_title,
            address: self.address,
            notes: self.notes,
            tags: decode_tags(&self.tags)?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

struct DealRow {
    id: i64,
    title: String,
    value: f64,
    stage: String,
    probability: i64,
    expected_close_date: Option<String>,
    contact_id: Option<i64>,
    notes: String,
    created_at: String,
    updated_at: String,
}

impl DealRow {
    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            value: row.get(2)?,
            stage: row.get(3)?,
            probability: row.get(4)?,
            expected_close_date: row.get(5)?,
            contact_id: row.get(6)?,
            notes: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn into_deal(self) -> Result<Deal> {
        Ok(Deal {
            id: self.id,
            title: self.title,
            value: self.value,
            stage: self.stage,
            probability: self.probability.clamp(0, 100) as u8,
            expected_close_date: self.expected_close_date.as_deref().map(parse_date).transpose()?,
            contact_id: self.contact_id,
            notes: self.notes,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

struct TaskRow {
    id: i64,
    task_type: String,
    title: String,
    description: String,
    due_date: Option<String>,
    priority: String,
    completed: bool,
    contact_id: Option<i64>,
    deal_id: Option<i64>,
    created_at: String,
    updated_at: String,
}

impl TaskRow {
    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            task_type: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            due_date: row.get(4)?,
            priority: row.get(5)?,
            completed: row.get(6)?,
            contact_id: row.get(7)?,
            deal_id: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    fn into_task(self) -> Result<Task> {
        let priority = self
            .priority
            .parse::<Priority>()
            .map_err(|e| anyhow::anyhow!(e))
            .context("Invalid priority in task row")?;
        Ok(Task {
            id: self.id,
            task_type: self.task_type,
            title: self.title,
            description: self.description,
            due_date: self.due_date.as_deref().map(parse_timestamp).transpose()?,
            priority,
            completed: self.completed,
            contact_id: self.contact_id,
            deal_id: self.deal_id,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}
