use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ── Settings records ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineStage {
    pub id: i64,
    pub name: String,
    pub win_probability: u8,
    pub order: u32,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskType {
    pub id: i64,
    pub name: String,
    pub color: String,
    /// Minutes.
    pub default_duration: u32,
    pub priority: Priority,
    #[serde(default)]
    pub order: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContactField {
    pub id: i64,
    pub name: String,
    pub label: String,
    pub field_type: String,
    pub required: bool,
    pub visible: bool,
    #[serde(default)]
    pub order: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationPreferences {
    pub email: bool,
    pub desktop: bool,
    pub deal_updates: bool,
    pub task_reminders: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardPreferences {
    pub default_time_range: String,
    pub show_revenue_trends: bool,
    pub show_top_performers: bool,
    pub show_activity_summary: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Preferences {
    pub currency: String,
    pub date_format: String,
    pub time_format: String,
    pub theme: String,
    pub notifications: NotificationPreferences,
    pub dashboard: DashboardPreferences,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            date_format: "MM/dd/yyyy".to_string(),
            time_format: "12h".to_string(),
            theme: "light".to_string(),
            notifications: NotificationPreferences {
                email: true,
                desktop: true,
                deal_updates: true,
                task_reminders: true,
            },
            dashboard: DashboardPreferences {
                default_time_range: "thisMonth".to_string(),
                show_revenue_trends: true,
                show_top_performers: true,
                show_activity_summary: true,
            },
        }
    }
}

/// Shallow merge payload for [`Preferences`]. Nested blocks replace whole.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferencesPatch {
    pub currency: Option<String>,
    pub date_format: Option<String>,
    pub time_format: Option<String>,
    pub theme: Option<String>,
    pub notifications: Option<NotificationPreferences>,
    pub dashboard: Option<DashboardPreferences>,
}

impl Preferences {
    pub fn merge(&mut self, patch: PreferencesPatch) {
        if let Some(v) = patch.currency {
            self.currency = v;
        }
        if let Some(v) = patch.date_format {
            self.date_format = v;
        }
        if let Some(v) = patch.time_format {
            self.time_format = v;
        }
        if let Some(v) = patch.theme {
            self.theme = v;
        }
        if let Some(v) = patch.notifications {
            self.notifications = v;
        }
        if let Some(v) = patch.dashboard {
            self.dashboard = v;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStage {
    pub name: String,
    pub win_probability: Option<u8>,
    pub color: Option<String>,
}

/// In-place edit of a stage's metadata. `order` is never touched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StagePatch {
    pub name: Option<String>,
    pub win_probability: Option<u8>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTaskType {
    pub name: Option<String>,
    pub color: Option<String>,
    pub default_duration: Option<u32>,
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContactField {
    pub name: String,
    pub label: Option<String>,
    pub field_type: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
}

fn default_true() -> bool {
    true
}

// ── Domain records ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Deal {
    pub id: i64,
    pub title: String,
    pub value: f64,
    pub stage: String,
    pub probability: u8,
    pub expected_close_date: Option<NaiveDate>,
    pub contact_id: Option<i64>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a deal. `stage` falls back to the first configured stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewDeal {
    pub title: String,
    #[serde(default)]
    pub value: f64,
    pub stage: Option<String>,
    #[serde(default)]
    pub probability: u8,
    pub expected_close_date: Option<NaiveDate>,
    pub contact_id: Option<i64>,
    #[serde(default)]
    pub notes: String,
}

/// Full overwrite of a deal's editable fields. Stage moves go through
/// `DealRepository::update_stage` only, so there is no stage field here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DealUpdate {
    pub title: String,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub probability: u8,
    pub expected_close_date: Option<NaiveDate>,
    pub contact_id: Option<i64>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: i64,
    pub task_type: String,
    pub title: String,
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub completed: bool,
    pub contact_id: Option<i64>,
    pub deal_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub task_type: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    pub contact_id: Option<i64>,
    pub deal_id: Option<i64>,
}

/// Full overwrite of a task's editable fields. Completion is toggled through
/// `TaskRepository::mark_complete`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub task_type: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Priority,
    pub contact_id: Option<i64>,
    pub deal_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub job_title: String,
    pub address: String,
    pub notes: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Create and update payload for contacts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

// ── Board view types ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageColumn {
    pub stage: PipelineStage,
    pub deals: Vec<Deal>,
    pub count: usize,
    pub total_value: f64,
    /// Ids of deals shown here only because their stage matches no configured stage.
    pub orphaned: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardView {
    pub columns: Vec<StageColumn>,
    /// Deals that could not be placed because no stages are configured.
    pub unassigned: Vec<Deal>,
}
