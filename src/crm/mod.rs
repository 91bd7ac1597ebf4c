//! CRM core: contacts, the deal pipeline board, tasks and reporting.
//!
//! ## Module Map
//!
//! ```text
//! ┌──────────┐   HTTP   ┌──────────────────────────────────────────────────┐
//! │  Client  │ ───────> │  server.rs  (axum Router, ServerConfig)          │
//! │          │ <─────── │    ├─ api.rs  (route handlers, AppState)         │
//! └──────────┘ WebSocket│    └─ ws.rs   (WsMessage change feed)            │
//!                       │         │                                        │
//!                       │         v                                        │
//!                       │  pipeline.rs  (stage edits that touch deals)     │
//!                       │  reporting.rs (dashboard aggregation)            │
//!                       │         │                                        │
//!                       │         v                                        │
//!                       │  repository.rs (Deal/Task/ContactRepository)     │
//!                       │  settings.rs   (SettingsStore, SettingsBackend)  │
//!                       │         │                                        │
//!                       │         v                                        │
//!                       │  db.rs  (SQLite via DbHandle)                    │
//!                       └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Supporting Modules
//!
//! | Module     | Responsibility                                             |
//! |------------|------------------------------------------------------------|
//! | `models`   | Records: `Deal`, `Task`, `Contact`, `PipelineStage`, ...   |
//! | `options`  | `OptionSet<T>`: ordered, uniquely named lists with ids     |
//! | `board`    | Deal bucketing and the drag/drop `PipelineBoard`           |
//! | `fixtures` | Offline seed data from JSON files                          |
//!
//! ## Typical Request Flow (drag a deal to "Proposal")
//!
//! 1. `PATCH /api/deals/{id}/stage` → `api::move_deal()`
//! 2. `PipelineService::move_deal` → `DealRepository::update_stage`, which
//!    substitutes the first configured stage for an unknown name
//! 3. The confirmed deal is returned and a `DealStageChanged` event goes out
//!    on the change feed so open boards re-bucket.

pub mod api;
pub mod board;
pub mod db;
pub mod fixtures;
pub mod models;
pub mod options;
pub mod pipeline;
pub mod reporting;
pub mod repository;
pub mod server;
pub mod settings;
pub mod ws;
