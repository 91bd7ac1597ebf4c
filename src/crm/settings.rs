//! Settings store: pipeline stages, task types, contact fields and
//! preferences, persisted as one versioned document under `crm-settings`.
//!
//! Every mutation works on a clone of the current document. The clone is
//! swapped in only after the backend confirms the write; on failure the store
//! reloads the last persisted document (or the defaults) and reports the error.

use std::sync::{Arc, PoisonError, RwLock};

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::errors::{CrmError, Result};

use super::db::DbHandle;
use super::models::*;
use super::options::OptionSet;

/// Key of the settings row holding the serialized document.
pub const SETTINGS_KEY: &str = "crm-settings";

/// Stage used when no stages are configured at all.
pub const FALLBACK_STAGE: &str = "Lead";

const DEFAULT_STAGE_COLOR: &str = "#64748b";
const DEFAULT_TASK_TYPE_COLOR: &str = "#64748b";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsDocument {
    #[serde(default)]
    pub version: u64,
    pub pipeline_stages: OptionSet<PipelineStage>,
    pub task_types: OptionSet<TaskType>,
    pub contact_fields: OptionSet<ContactField>,
    #[serde(default)]
    pub preferences: Preferences,
}

impl Default for SettingsDocument {
    fn default() -> Self {
        let stage = |id: i64, name: &str, win_probability: u8, color: &str| PipelineStage {
            id,
            name: name.to_string(),
            win_probability,
            order: id as u32,
            color: color.to_string(),
        };
        let task_type = |id: i64, name: &str, color: &str, minutes: u32, priority| TaskType {
            id,
            name: name.to_string(),
            color: color.to_string(),
            default_duration: minutes,
            priority,
            order: id as u32,
        };
        let field = |id: i64, name: &str, label: &str, field_type: &str, required: bool| {
            ContactField {
                id,
                name: name.to_string(),
                label: label.to_string(),
                field_type: field_type.to_string(),
                required,
                visible: true,
                order: id as u32,
            }
        };

        Self {
            version: 0,
            pipeline_stages: OptionSet::from_items(vec![
                stage(1, "Lead", 10, "#64748b"),
                stage(2, "Qualified", 25, "#3b82f6"),
                stage(3, "Proposal", 50, "#f59e0b"),
                stage(4, "Negotiation", 75, "#10b981"),
                stage(5, "Closed Won", 100, "#059669"),
            ]),
            task_types: OptionSet::from_items(vec![
                task_type(1, "Call", "#3b82f6", 30, Priority::Medium),
                task_type(2, "Email", "#10b981", 15, Priority::Low),
                task_type(3, "Meeting", "#f59e0b", 60, Priority::High),
                task_type(4, "Follow-up", "#8b5cf6", 15, Priority::Medium),
                task_type(5, "Demo", "#ef4444", 90, Priority::High),
            ]),
            contact_fields: OptionSet::from_items(vec![
                field(1, "company", "Company", "text", true),
                field(2, "title", "Job Title", "text", false),
                field(3, "phone", "Phone", "phone", false),
                field(4, "email", "Email", "email", true),
                field(5, "industry", "Industry", "select", false),
                field(6, "source", "Lead Source", "select", false),
            ]),
            preferences: Preferences::default(),
        }
    }
}

/// Where the settings document lives.
#[async_trait]
pub trait SettingsBackend: Send + Sync {
    /// `Ok(None)` when nothing has been stored yet.
    async fn load(&self) -> anyhow::Result<Option<SettingsDocument>>;

    /// Persist `doc`. Fails with `CrmError::Conflict` unless `doc.version` is
    /// exactly one past the stored version.
    async fn save(&self, doc: &SettingsDocument) -> Result<()>;
}

fn check_version(stored: Option<u64>, doc: &SettingsDocument) -> Result<()> {
    let expected = stored.unwrap_or(0) + 1;
    if doc.version != expected {
        return Err(CrmError::Conflict {
            expected,
            found: doc.version,
        });
    }
    Ok(())
}

/// Settings persisted in the `settings` table of the CRM database.
pub struct DbSettingsBackend {
    db: DbHandle,
}

impl DbSettingsBackend {
    pub fn new(db: DbHandle) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SettingsBackend for DbSettingsBackend {
    async fn load(&self) -> anyhow::Result<Option<SettingsDocument>> {
        let raw = self.db.call(|db| db.get_setting(SETTINGS_KEY)).await?;
        raw.map(|json| {
            serde_json::from_str(&json).context("Failed to parse stored settings document")
        })
        .transpose()
    }

    async fn save(&self, doc: &SettingsDocument) -> Result<()> {
        let doc = doc.clone();
        self.db
            .call(move |db| {
                let stored = match db.get_setting(SETTINGS_KEY)? {
                    Some(json) => Some(
                        serde_json::from_str::<SettingsDocument>(&json)
                            .context("Failed to parse stored settings document")?
                            .version,
                    ),
                    None => None,
                };
                check_version(stored, &doc)?;
                let json =
                    serde_json::to_string(&doc).context("Failed to serialize settings")?;
                db.set_setting(SETTINGS_KEY, &json)
            })
            .await
            .map_err(CrmError::from)
    }
}

/// In-process settings backend for tests and offline mode.
#[derive(Default)]
pub struct MemorySettingsBackend {
    stored: std::sync::Mutex<Option<String>>,
    fail_saves: std::sync::atomic::AtomicBool,
}

impl MemorySettingsBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent save fail with a persistence error.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// Overwrite the stored document directly, as another writer would.
    pub fn overwrite(&self, doc: &SettingsDocument) -> anyhow::Result<()> {
        let json = serde_json::to_string(doc)?;
        *self.stored.lock().unwrap_or_else(PoisonError::into_inner) = Some(json);
        Ok(())
    }
}

#[async_trait]
impl SettingsBackend for MemorySettingsBackend {
    async fn load(&self) -> anyhow::Result<Option<SettingsDocument>> {
        let stored = self
            .stored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        stored
            .map(|json| serde_json::from_str(&json).context("Failed to parse settings document"))
            .transpose()
    }

    async fn save(&self, doc: &SettingsDocument) -> Result<()> {
        if self.fail_saves.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(CrmError::Persistence(anyhow::anyhow!(
                "settings backend unavailable"
            )));
        }
        let mut stored = self.stored.lock().unwrap_or_else(PoisonError::into_inner);
        let current = stored
            .as_deref()
            .map(serde_json::from_str::<SettingsDocument>)
            .transpose()
            .context("Failed to parse settings document")?
            .map(|doc| doc.version);
        check_version(current, doc)?;
        *stored = Some(serde_json::to_string(doc).context("Failed to serialize settings")?);
        Ok(())
    }
}

/// Result of an in-place stage edit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageEdit {
    pub before: PipelineStage,
    pub after: PipelineStage,
}

impl StageEdit {
    pub fn renamed(&self) -> bool {
        self.before.name != self.after.name
    }
}

pub struct SettingsStore {
    backend: Arc<dyn SettingsBackend>,
    current: RwLock<SettingsDocument>,
    write_lock: tokio::sync::Mutex<()>,
}

impl SettingsStore {
    /// Load the document from `backend`, falling back to defaults when absent.
    pub async fn load(backend: Arc<dyn SettingsBackend>) -> Result<Self> {
        let doc = backend
            .load()
            .await
            .context("Failed to load settings")?
            .unwrap_or_default();
        Ok(Self {
            backend,
            current: RwLock::new(doc),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Default settings over a fresh [`MemorySettingsBackend`].
    pub fn in_memory() -> Self {
        Self {
            backend: Arc::new(MemorySettingsBackend::new()),
            current: RwLock::new(SettingsDocument::default()),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Discard in-process state and re-read the backend.
    pub async fn reload(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.reload_locked().await
    }

    async fn reload_locked(&self) -> Result<()> {
        let doc = self
            .backend
            .load()
            .await
            .context("Failed to reload settings")?
            .unwrap_or_default();
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = doc;
        Ok(())
    }

    pub fn document(&self) -> SettingsDocument {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn version(&self) -> u64 {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .version
    }

    fn with_doc<R>(&self, f: impl FnOnce(&SettingsDocument) -> R) -> R {
        let doc = self.current.read().unwrap_or_else(PoisonError::into_inner);
        f(&doc)
    }

    /// Apply `change` to a copy of the document and persist it.
    async fn mutate<R>(
        &self,
        op: &'static str,
        change: impl FnOnce(&mut SettingsDocument) -> Result<R>,
    ) -> Result<R> {
        let _guard = self.write_lock.lock().await;
        let current = self.document();
        let mut draft = current.clone();
        let result = change(&mut draft)?;
        if draft == current {
            return Ok(result);
        }
        draft.version = current.version + 1;

        match self.backend.save(&draft).await {
            Ok(()) => {
                let version = draft.version;
                *self.current.write().unwrap_or_else(PoisonError::into_inner) = draft;
                info!(op, version, "Settings saved");
                Ok(result)
            }
            Err(err) => {
                warn!(op, error = %err, "Settings save failed, reloading persisted state");
                if let Err(reload_err) = self.reload_locked().await {
                    error!(op, error = %reload_err, "Settings reload failed");
                }
                Err(err)
            }
        }
    }

    // ── Pipeline stages ───────────────────────────────────────────────

    pub fn pipeline_stages(&self) -> Vec<PipelineStage> {
        self.with_doc(|doc| doc.pipeline_stages.ordered())
    }

    pub fn pipeline_stage_names(&self) -> Vec<String> {
        self.with_doc(|doc| doc.pipeline_stages.names())
    }

    pub fn stage_by_name(&self, name: &str) -> Option<PipelineStage> {
        self.with_doc(|doc| doc.pipeline_stages.find_by_name(name).cloned())
    }

    pub fn first_stage(&self) -> Option<String> {
        self.pipeline_stage_names().into_iter().next()
    }

    /// `candidate` when it names a configured stage, otherwise the first
    /// configured stage, otherwise [`FALLBACK_STAGE`].
    pub fn resolve_stage(&self, candidate: &str) -> String {
        let names = self.pipeline_stage_names();
        if names.iter().any(|name| name == candidate) {
            return candidate.to_string();
        }
        names
            .into_iter()
            .next()
            .unwrap_or_else(|| FALLBACK_STAGE.to_string())
    }

    pub async fn update_pipeline_stages(
        &self,
        stages: Vec<PipelineStage>,
    ) -> Result<Vec<PipelineStage>> {
        for stage in &stages {
            check_probability(stage.win_probability)?;
        }
        self.mutate("update_pipeline_stages", |doc| {
            doc.pipeline_stages.replace(stages)
        })
        .await
    }

    pub async fn add_pipeline_stage(&self, new: NewStage) -> Result<PipelineStage> {
        let win_probability = new.win_probability.unwrap_or(0);
        check_probability(win_probability)?;
        let stage = PipelineStage {
            id: 0,
            name: new.name,
            win_probability,
            order: 0,
            color: new.color.unwrap_or_else(|| DEFAULT_STAGE_COLOR.to_string()),
        };
        self.mutate("add_pipeline_stage", |doc| doc.pipeline_stages.append(stage))
            .await
    }

    pub async fn update_pipeline_stage(&self, id: i64, patch: StagePatch) -> Result<StageEdit> {
        if let Some(probability) = patch.win_probability {
            check_probability(probability)?;
        }
        self.mutate("update_pipeline_stage", |doc| {
            let (before, after) = doc.pipeline_stages.update(id, |stage| {
                if let Some(name) = patch.name {
                    stage.name = name;
                }
                if let Some(probability) = patch.win_probability {
                    stage.win_probability = probability;
                }
                if let Some(color) = patch.color {
                    stage.color = color;
                }
            })?;
            Ok(StageEdit { before, after })
        })
        .await
    }

    pub async fn delete_pipeline_stage(&self, id: i64) -> Result<PipelineStage> {
        self.mutate("delete_pipeline_stage", |doc| {
            doc.pipeline_stages.remove(id)
        })
        .await
    }

    // ── Task types ────────────────────────────────────────────────────

    pub fn task_types(&self) -> Vec<TaskType> {
        self.with_doc(|doc| doc.task_types.ordered())
    }

    pub async fn update_task_types(&self, types: Vec<TaskType>) -> Result<Vec<TaskType>> {
        self.mutate("update_task_types", |doc| doc.task_types.replace(types))
            .await
    }

    pub async fn add_task_type(&self, new: NewTaskType) -> Result<TaskType> {
        let task_type = TaskType {
            id: 0,
            name: new.name.unwrap_or_else(|| "New Task Type".to_string()),
            color: new
                .color
                .unwrap_or_else(|| DEFAULT_TASK_TYPE_COLOR.to_string()),
            default_duration: new.default_duration.unwrap_or(30),
            priority: new.priority.unwrap_or_default(),
            order: 0,
        };
        self.mutate("add_task_type", |doc| doc.task_types.append(task_type))
            .await
    }

    pub async fn delete_task_type(&self, id: i64) -> Result<TaskType> {
        self.mutate("delete_task_type", |doc| doc.task_types.remove(id))
            .await
    }

    // ── Contact fields ────────────────────────────────────────────────

    pub fn contact_fields(&self) -> Vec<ContactField> {
        self.with_doc(|doc| doc.contact_fields.ordered())
    }

    pub async fn update_contact_fields(
        &self,
        fields: Vec<ContactField>,
    ) -> Result<Vec<ContactField>> {
        self.mutate("update_contact_fields", |doc| {
            doc.contact_fields.replace(fields)
        })
        .await
    }

    pub async fn add_contact_field(&self, new: NewContactField) -> Result<ContactField> {
        let label = new.label.unwrap_or_else(|| new.name.clone());
        let field = ContactField {
            id: 0,
            name: new.name,
            label,
            field_type: new.field_type.unwrap_or_else(|| "text".to_string()),
            required: new.required,
            visible: new.visible,
            order: 0,
        };
        self.mutate("add_contact_field", |doc| doc.contact_fields.append(field))
            .await
    }

    pub async fn delete_contact_field(&self, id: i64) -> Result<ContactField> {
        self.mutate("delete_contact_field", |doc| doc.contact_fields.remove(id))
            .await
    }

    // ── Preferences ───────────────────────────────────────────────────

    pub fn preferences(&self) -> Preferences {
        self.with_doc(|doc| doc.preferences.clone())
    }

    pub async fn update_preferences(&self, patch: PreferencesPatch) -> Result<Preferences> {
        self.mutate("update_preferences", |doc| {
            doc.preferences.merge(patch);
            Ok(doc.preferences.clone())
        })
        .await
    }
}

fn check_probability(probability: u8) -> Result<()> {
    if probability > 100 {
        return Err(CrmError::validation(format!(
            "Win probability must be between 0 and 100, got {}",
            probability
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crm::db::CrmDb;

    fn memory_store() -> (Arc<MemorySettingsBackend>, SettingsStore) {
        let backend = Arc::new(MemorySettingsBackend::new());
        let store = SettingsStore {
            backend: backend.clone(),
            current: RwLock::new(SettingsDocument::default()),
            write_lock: tokio::sync::Mutex::new(()),
        };
        (backend, store)
    }

    #[test]
    fn test_defaults_have_five_stages_in_order() {
        let store = SettingsStore::in_memory();
        assert_eq!(
            store.pipeline_stage_names(),
            vec!["Lead", "Qualified", "Proposal", "Negotiation", "Closed Won"]
        );
        let won = store.stage_by_name("Closed Won").unwrap();
        assert_eq!(won.win_probability, 100);
        assert_eq!(won.color, "#059669");
        assert_eq!(store.task_types().len(), 5);
        assert_eq!(store.contact_fields().len(), 6);
        assert_eq!(store.preferences().currency, "USD");
    }

    #[test]
    fn test_stage_names_are_stable_without_mutation() {
        let store = SettingsStore::in_memory();
        assert_eq!(store.pipeline_stage_names(), store.pipeline_stage_names());
    }

    #[test]
    fn test_resolve_stage() {
        let store = SettingsStore::in_memory();
        assert_eq!(store.resolve_stage("Proposal"), "Proposal");
        assert_eq!(store.resolve_stage("NotAConfiguredStage"), "Lead");
    }

    #[tokio::test]
    async fn test_resolve_stage_with_no_stages_uses_fallback() {
        let store = SettingsStore::in_memory();
        store.update_pipeline_stages(vec![]).await.unwrap();
        assert_eq!(store.resolve_stage("Anything"), FALLBACK_STAGE);
        assert!(store.first_stage().is_none());
    }

    #[tokio::test]
    async fn test_reorder_persists_and_bumps_version() {
        let (backend, store) = memory_store();
        let mut stages = store.pipeline_stages();
        let qualified = stages.remove(1);
        stages.insert(0, qualified);

        let result = store.update_pipeline_stages(stages).await.unwrap();
        assert_eq!(result[0].name, "Qualified");
        assert_eq!(result[0].order, 1);
        assert_eq!(result[1].name, "Lead");
        assert_eq!(result[1].order, 2);
        assert_eq!(store.version(), 1);

        let stored = backend.load().await.unwrap().unwrap();
        assert_eq!(stored, store.document());
    }

    #[tokio::test]
    async fn test_update_pipeline_stages_is_idempotent() {
        let store = SettingsStore::in_memory();
        let stages = store.pipeline_stages();
        store.update_pipeline_stages(stages.clone()).await.unwrap();
        let first = store.document();
        store.update_pipeline_stages(stages).await.unwrap();
        assert_eq!(store.document(), first);
    }

    #[tokio::test]
    async fn test_update_pipeline_stages_rejects_bad_probability() {
        let store = SettingsStore::in_memory();
        let mut stages = store.pipeline_stages();
        stages[0].win_probability = 150;
        let err = store.update_pipeline_stages(stages).await.unwrap_err();
        assert!(matches!(err, CrmError::Validation(_)));
        assert_eq!(store.pipeline_stages()[0].win_probability, 10);
    }

    #[tokio::test]
    async fn test_add_stage_defaults_and_monotonic_id() {
        let store = SettingsStore::in_memory();
        let added = store
            .add_pipeline_stage(NewStage {
                name: "Closed Lost".to_string(),
                win_probability: None,
                color: None,
            })
            .await
            .unwrap();
        assert_eq!(added.id, 6);
        assert_eq!(added.order, 6);
        assert_eq!(added.win_probability, 0);
        assert_eq!(added.color, "#64748b");

        store.delete_pipeline_stage(6).await.unwrap();
        let again = store
            .add_pipeline_stage(NewStage {
                name: "Archived".to_string(),
                win_probability: Some(5),
                color: Some("#000000".to_string()),
            })
            .await
            .unwrap();
        assert!(again.id > 6);
    }

    #[tokio::test]
    async fn test_add_stage_rejects_duplicate_name() {
        let store = SettingsStore::in_memory();
        let err = store
            .add_pipeline_stage(NewStage {
                name: "Lead".to_string(),
                win_probability: None,
                color: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CrmError::Validation(_)));
        assert_eq!(store.version(), 0);
    }

    #[tokio::test]
    async fn test_update_stage_reports_rename() {
        let store = SettingsStore::in_memory();
        let edit = store
            .update_pipeline_stage(
                1,
                StagePatch {
                    name: Some("Prospect".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(edit.renamed());
        assert_eq!(edit.before.name, "Lead");
        assert_eq!(edit.after.name, "Prospect");
        assert_eq!(edit.after.order, 1);
        assert_eq!(store.pipeline_stage_names()[0], "Prospect");
    }

    #[tokio::test]
    async fn test_delete_missing_stage_is_not_found() {
        let store = SettingsStore::in_memory();
        let err = store.delete_pipeline_stage(42).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_failed_save_reloads_last_persisted_state() {
        let (backend, store) = memory_store();
        store
            .add_pipeline_stage(NewStage {
                name: "Closed Lost".to_string(),
                win_probability: Some(0),
                color: None,
            })
            .await
            .unwrap();
        let persisted = store.document();

        backend.set_fail_saves(true);
        let err = store.delete_pipeline_stage(1).await.unwrap_err();
        assert!(matches!(err, CrmError::Persistence(_)));
        assert_eq!(store.document(), persisted);
        assert!(store.stage_by_name("Lead").is_some());
    }

    #[tokio::test]
    async fn test_failed_first_save_falls_back_to_defaults() {
        let (backend, store) = memory_store();
        backend.set_fail_saves(true);
        let err = store.delete_pipeline_stage(1).await.unwrap_err();
        assert!(matches!(err, CrmError::Persistence(_)));
        assert_eq!(store.document(), SettingsDocument::default());
    }

    #[tokio::test]
    async fn test_concurrent_writer_conflict_reloads() {
        let (backend, store) = memory_store();
        let mut theirs = SettingsDocument::default();
        theirs.version = 3;
        theirs.preferences.currency = "EUR".to_string();
        backend.overwrite(&theirs).unwrap();

        let err = store
            .update_preferences(PreferencesPatch {
                theme: Some("dark".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CrmError::Conflict { expected: 4, found: 1 }));
        assert_eq!(store.preferences().currency, "EUR");
        assert_eq!(store.version(), 3);

        let prefs = store
            .update_preferences(PreferencesPatch {
                theme: Some("dark".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(prefs.theme, "dark");
        assert_eq!(prefs.currency, "EUR");
    }

    #[tokio::test]
    async fn test_task_type_and_contact_field_lists() {
        let store = SettingsStore::in_memory();
        let added = store
            .add_task_type(NewTaskType {
                name: Some("Lunch".to_string()),
                color: None,
                default_duration: Some(45),
                priority: Some(Priority::Low),
            })
            .await
            .unwrap();
        assert_eq!(added.id, 6);
        assert_eq!(added.order, 6);
        assert!(store.delete_task_type(99).await.unwrap_err().is_not_found());

        let field = store
            .add_contact_field(NewContactField {
                name: "linkedin".to_string(),
                label: None,
                field_type: Some("url".to_string()),
                required: false,
                visible: true,
            })
            .await
            .unwrap();
        assert_eq!(field.label, "linkedin");
        store.delete_contact_field(field.id).await.unwrap();
        assert_eq!(store.contact_fields().len(), 6);
    }

    #[tokio::test]
    async fn test_db_backend_round_trip() {
        let db = DbHandle::new(CrmDb::new_in_memory().unwrap());
        let backend: Arc<dyn SettingsBackend> = Arc::new(DbSettingsBackend::new(db.clone()));
        let store = SettingsStore::load(backend.clone()).await.unwrap();
        assert_eq!(store.version(), 0);

        store
            .update_preferences(PreferencesPatch {
                currency: Some("GBP".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let reopened = SettingsStore::load(backend).await.unwrap();
        assert_eq!(reopened.preferences().currency, "GBP");
        assert_eq!(reopened.version(), 1);
    }

    #[tokio::test]
    async fn test_db_backend_rejects_stale_version() {
        let db = DbHandle::new(CrmDb::new_in_memory().unwrap());
        let backend = DbSettingsBackend::new(db);
        let mut doc = SettingsDocument::default();
        doc.version = 1;
        backend.save(&doc).await.unwrap();
        let err = backend.save(&doc).await.unwrap_err();
        assert!(matches!(err, CrmError::Conflict { expected: 2, found: 1 }));
    }
}
