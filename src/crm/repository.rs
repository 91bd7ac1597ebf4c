use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use tracing::info;

use crate::errors::{CrmError, Result};

use super::db::DbHandle;
use super::models::*;
use super::settings::SettingsStore;

// Compile the email check once
static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Deal records. `stage` changes only through [`DealRepository::update_stage`].
#[async_trait]
pub trait DealRepository: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Deal>>;
    async fn get_by_id(&self, id: i64) -> Result<Deal>;
    /// Deals for a contact, latest expected close date first.
    async fn get_by_contact_id(&self, contact_id: i64) -> Result<Vec<Deal>>;
    async fn create(&self, deal: NewDeal) -> Result<Deal>;
    async fn update(&self, id: i64, update: DealUpdate) -> Result<Deal>;
    /// Move a deal. An unconfigured stage is replaced by the first configured one.
    async fn update_stage(&self, id: i64, stage: &str) -> Result<Deal>;
    async fn delete(&self, id: i64) -> Result<()>;
    /// Move every deal on stage `from` to `to`; returns how many moved.
    async fn rename_stage(&self, from: &str, to: &str) -> Result<usize>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// All tasks, earliest due date first.
    async fn get_all(&self) -> Result<Vec<Task>>;
    async fn get_by_id(&self, id: i64) -> Result<Task>;
    async fn get_by_contact_id(&self, contact_id: i64) -> Result<Vec<Task>>;
    async fn create(&self, task: NewTask) -> Result<Task>;
    async fn update(&self, id: i64, update: TaskUpdate) -> Result<Task>;
    async fn mark_complete(&self, id: i64, completed: bool) -> Result<Task>;
    async fn delete(&self, id: i64) -> Result<()>;
}

#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// All contacts, most recently updated first.
    async fn get_all(&self) -> Result<Vec<Contact>>;
    async fn get_by_id(&self, id: i64) -> Result<Contact>;
    async fn create(&self, contact: ContactInput) -> Result<Contact>;
    async fn update(&self, id: i64, contact: ContactInput) -> Result<Contact>;
    async fn delete(&self, id: i64) -> Result<()>;
    /// Case-insensitive substring search. A blank query returns everything.
    async fn search(&self, query: &str) -> Result<Vec<Contact>>;
}

/// SQLite-backed implementation of all three repositories.
#[derive(Clone)]
pub struct SqlRepository {
    db: DbHandle,
    settings: Arc<SettingsStore>,
}

impl SqlRepository {
    pub fn new(db: DbHandle, settings: Arc<SettingsStore>) -> Self {
        Self { db, settings }
    }

    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.settings
    }
}

fn validate_deal_fields(title: &str, value: f64, probability: u8) -> Result<()> {
    if title.trim().is_empty() {
        return Err(CrmError::validation("Deal title is required"));
    }
    if !value.is_finite() || value < 0.0 {
        return Err(CrmError::validation("Deal value must be zero or more"));
    }
    if probability > 100 {
        return Err(CrmError::validation(
            "Deal probability must be between 0 and 100",
        ));
    }
    Ok(())
}

#[async_trait]
impl DealRepository for SqlRepository {
    async fn get_all(&self) -> Result<Vec<Deal>> {
        Ok(self.db.call(|db| db.list_deals()).await?)
    }

    async fn get_by_id(&self, id: i64) -> Result<Deal> {
        self.db
            .call(move |db| db.get_deal(id))
            .await?
            .ok_or_else(|| CrmError::not_found("Deal", id))
    }

    async fn get_by_contact_id(&self, contact_id: i64) -> Result<Vec<Deal>> {
        Ok(self
            .db
            .call(move |db| db.list_deals_by_contact(contact_id))
            .await?)
    }

    async fn create(&self, mut deal: NewDeal) -> Result<Deal> {
        deal.title = deal.title.trim().to_string();
        validate_deal_fields(&deal.title, deal.value, deal.probability)?;
        let stage = self
            .settings
            .resolve_stage(deal.stage.as_deref().unwrap_or_default());
        let created = self
            .db
            .call(move |db| db.insert_deal(&deal, &stage, Utc::now()))
            .await?;
        info!(deal_id = created.id, stage = %created.stage, "Deal created");
        Ok(created)
    }

    async fn update(&self, id: i64, mut update: DealUpdate) -> Result<Deal> {
        update.title = update.title.trim().to_string();
        validate_deal_fields(&update.title, update.value, update.probability)?;
        self.db
            .call(move |db| db.update_deal(id, &update, Utc::now()))
            .await?
            .ok_or_else(|| CrmError::not_found("Deal", id))
    }

    async fn update_stage(&self, id: i64, stage: &str) -> Result<Deal> {
        let stage = self.settings.resolve_stage(stage);
        let moved = self
            .db
            .call(move |db| db.update_deal_stage(id, &stage, Utc::now()))
            .await?
            .ok_or_else(|| CrmError::not_found("Deal", id))?;
        info!(deal_id = id, stage = %moved.stage, "Deal stage updated");
        Ok(moved)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        if self.db.call(move |db| db.delete_deal(id)).await? {
            Ok(())
        } else {
            Err(CrmError::not_found("Deal", id))
        }
    }

    async fn rename_stage(&self, from: &str, to: &str) -> Result<usize> {
        let (from, to) = (from.to_string(), to.to_string());
        Ok(self
            .db
            .call(move |db| db.rename_deal_stage(&from, &to, Utc::now()))
            .await?)
    }
}

#[async_trait]
impl TaskRepository for SqlRepository {
    async fn get_all(&self) -> Result<Vec<Task>> {
        Ok(self.db.call(|db| db.list_tasks()).await?)
    }

    async fn get_by_id(&self, id: i64) -> Result<Task> {
        self.db
            .call(move |db| db.get_task(id))
            .await?
            .ok_or_else(|| CrmError::not_found("Task", id))
    }

    async fn get_by_contact_id(&self, contact_id: i64) -> Result<Vec<Task>> {
        Ok(self
            .db
            .call(move |db| db.list_tasks_by_contact(contact_id))
            .await?)
    }

    async fn create(&self, mut task: NewTask) -> Result<Task> {
        task.title = task.title.trim().to_string();
        if task.title.is_empty() {
            return Err(CrmError::validation("Task title is required"));
        }
        let created = self
            .db
            .call(move |db| db.insert_task(&task, Utc::now()))
            .await?;
        info!(task_id = created.id, "Task created");
        Ok(created)
    }

    async fn update(&self, id: i64, mut update: TaskUpdate) -> Result<Task> {
        update.title = update.title.trim().to_string();
        if update.title.is_empty() {
            return Err(CrmError::validation("Task title is required"));
        }
        self.db
            .call(move |db| db.update_task(id, &update, Utc::now()))
            .await?
            .ok_or_else(|| CrmError::not_found("Task", id))
    }

    async fn mark_complete(&self, id: i64, completed: bool) -> Result<Task> {
        self.db
            .call(move |db| db.set_task_completed(id, completed, Utc::now()))
            .await?
            .ok_or_else(|| CrmError::not_found("Task", id))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        if self.db.call(move |db| db.delete_task(id)).await? {
            Ok(())
        } else {
            Err(CrmError::not_found("Task", id))
        }
    }
}

/// Trim and lowercase the contact, then check required fields and email shape.
fn normalize_contact(mut contact: ContactInput) -> Result<ContactInput> {
    contact.first_name = contact.first_name.trim().to_string();
    contact.last_name = contact.last_name.trim().to_string();
    contact.email = contact.email.trim().to_lowercase();
    contact.tags = contact
        .tags
        .into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect();

    if contact.first_name.is_empty() {
        return Err(CrmError::validation("First name is required"));
    }
    if contact.last_name.is_empty() {
        return Err(CrmError::validation("Last name is required"));
    }
    if contact.email.is_empty() {
        return Err(CrmError::validation("Email is required"));
    }
    if !EMAIL_REGEX.is_match(&contact.email) {
        return Err(CrmError::validation(format!(
            "'{}' is not a valid email address",
            contact.email
        )));
    }
    Ok(contact)
}

fn duplicate_email(email: &str) -> CrmError {
    CrmError::validation(format!("A contact with email {} already exists", email))
}

#[async_trait]
impl ContactRepository for SqlRepository {
    async fn get_all(&self) -> Result<Vec<Contact>> {
        Ok(self.db.call(|db| db.list_contacts()).await?)
    }

    async fn get_by_id(&self, id: i64) -> Result<Contact> {
        self.db
            .call(move |db| db.get_contact(id))
            .await?
            .ok_or_else(|| CrmError::not_found("Contact", id))
    }

    async fn create(&self, contact: ContactInput) -> Result<Contact> {
        let contact = normalize_contact(contact)?;
        let created = self
            .db
            .call(move |db| {
                if db.find_contact_by_email(&contact.email)?.is_some() {
                    return Err(duplicate_email(&contact.email).into());
                }
                db.insert_contact(&contact, Utc::now())
            })
            .await?;
        info!(contact_id = created.id, "Contact created");
        Ok(created)
    }

    async fn update(&self, id: i64, contact: ContactInput) -> Result<Contact> {
        let contact = normalize_contact(contact)?;
        self.db
            .call(move |db| {
                let taken = db
                    .find_contact_by_email(&contact.email)?
                    .is_some_and(|existing| existing.id != id);
                if taken {
                    return Err(duplicate_email(&contact.email).into());
                }
                db.update_contact(id, &contact, Utc::now())
            })
            .await?
            .ok_or_else(|| CrmError::not_found("Contact", id))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        if self.db.call(move |db| db.delete_contact(id)).await? {
            Ok(())
        } else {
            Err(CrmError::not_found("Contact", id))
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<Contact>> {
        let query = query.trim().to_string();
        if query.is_empty() {
            return ContactRepository::get_all(self).await;
        }
        Ok(self.db.call(move |db| db.search_contacts(&query)).await?)
    }
}
