//! Kanban board over the configured pipeline stages.
//!
//! Committed state (the deal list the board was loaded with plus confirmed
//! moves) is kept apart from the transient [`DragState`]. A drop produces a
//! [`PendingTransition`]; only a confirmed repository write touches the
//! committed list, and results that arrive after the board was reloaded or
//! closed are dropped by comparing generations.

use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::{CrmError, Result};

use super::models::{BoardView, Deal, PipelineStage, StageColumn};
use super::repository::DealRepository;

/// Stages sorted by `order`, ties kept in input order.
fn sorted_stages(stages: &[PipelineStage]) -> Vec<PipelineStage> {
    let mut sorted = stages.to_vec();
    sorted.sort_by_key(|stage| stage.order);
    sorted
}

pub fn column_total(deals: &[Deal]) -> f64 {
    deals.iter().map(|deal| deal.value).sum()
}

/// Bucket `deals` into one column per stage.
///
/// Deals whose stage matches no configured stage land in the first column and
/// are listed in its `orphaned` ids. With no stages nothing is bucketed.
pub fn bucket_deals(deals: &[Deal], stages: &[PipelineStage]) -> Vec<StageColumn> {
    let stages = sorted_stages(stages);
    if stages.is_empty() {
        return Vec::new();
    }

    let mut buckets: Vec<Vec<Deal>> = vec![Vec::new(); stages.len()];
    let mut orphaned = Vec::new();
    for deal in deals {
        match stages.iter().position(|stage| stage.name == deal.stage) {
            Some(index) => buckets[index].push(deal.clone()),
            None => {
                orphaned.push(deal.id);
                buckets[0].push(deal.clone());
            }
        }
    }

    stages
        .into_iter()
        .zip(buckets)
        .enumerate()
        .map(|(index, (stage, deals))| StageColumn {
            count: deals.len(),
            total_value: column_total(&deals),
            orphaned: if index == 0 {
                std::mem::take(&mut orphaned)
            } else {
                Vec::new()
            },
            stage,
            deals,
        })
        .collect()
}

/// Full board view. Column sizes plus `unassigned` always equal `deals.len()`.
pub fn board_view(deals: &[Deal], stages: &[PipelineStage]) -> BoardView {
    let columns = bucket_deals(deals, stages);
    let unassigned = if columns.is_empty() {
        deals.to_vec()
    } else {
        Vec::new()
    };
    BoardView {
        columns,
        unassigned,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DragState {
    Idle,
    Dragging {
        deal_id: i64,
        from_stage: String,
    },
    Committing {
        deal_id: i64,
        from_stage: String,
        to_stage: String,
    },
}

/// A stage move waiting on the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTransition {
    pub deal_id: i64,
    pub from_stage: String,
    pub to_stage: String,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DropAction {
    /// Dropped on its own column, an unknown column, or no drag active.
    Unchanged,
    Commit(PendingTransition),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    Unchanged,
    Moved(Deal),
    Failed(String),
    /// The board was reloaded or closed while the write was in flight.
    Discarded,
}

/// Handle for an in-flight board load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    seq: u64,
    generation: u64,
}

pub struct PipelineBoard {
    deals: Vec<Deal>,
    stages: Vec<PipelineStage>,
    drag: DragState,
    generation: u64,
    load_seq: u64,
}

impl PipelineBoard {
    pub fn new(deals: Vec<Deal>, stages: Vec<PipelineStage>) -> Self {
        Self {
            deals,
            stages: sorted_stages(&stages),
            drag: DragState::Idle,
            generation: 0,
            load_seq: 0,
        }
    }

    pub fn deals(&self) -> &[Deal] {
        &self.deals
    }

    pub fn stages(&self) -> &[PipelineStage] {
        &self.stages
    }

    pub fn state(&self) -> &DragState {
        &self.drag
    }

    pub fn view(&self) -> BoardView {
        let view = board_view(&self.deals, &self.stages);
        debug!(
            columns = view.columns.len(),
            deals = self.deals.len(),
            "Board recomputed"
        );
        view
    }

    fn is_stage(&self, name: &str) -> bool {
        self.stages.iter().any(|stage| stage.name == name)
    }

    pub fn drag_start(&mut self, deal_id: i64) -> Result<()> {
        if matches!(self.drag, DragState::Committing { .. }) {
            return Err(CrmError::validation(
                "A stage change is still being saved",
            ));
        }
        let deal = self
            .deals
            .iter()
            .find(|deal| deal.id == deal_id)
            .ok_or_else(|| CrmError::not_found("Deal", deal_id))?;
        if self.stages.is_empty() {
            return Err(CrmError::validation("No pipeline stages are configured"));
        }
        // The stored stage, not the display column: an orphan shown under the
        // first column can still be dropped onto it.
        self.drag = DragState::Dragging {
            deal_id,
            from_stage: deal.stage.clone(),
        };
        Ok(())
    }

    /// Whether `stage` should be highlighted as a drop target.
    pub fn drag_over(&self, stage: &str) -> bool {
        match &self.drag {
            DragState::Dragging { from_stage, .. } => stage != from_stage && self.is_stage(stage),
            _ => false,
        }
    }

    pub fn drop_targets(&self) -> Vec<String> {
        match &self.drag {
            DragState::Dragging { from_stage, .. } => self
                .stages
                .iter()
                .filter(|stage| &stage.name != from_stage)
                .map(|stage| stage.name.clone())
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn drop_on(&mut self, stage: &str) -> DropAction {
        let DragState::Dragging {
            deal_id,
            from_stage,
        } = &self.drag
        else {
            return DropAction::Unchanged;
        };

        if stage == from_stage || !self.is_stage(stage) {
            self.drag = DragState::Idle;
            return DropAction::Unchanged;
        }

        let pending = PendingTransition {
            deal_id: *deal_id,
            from_stage: from_stage.clone(),
            to_stage: stage.to_string(),
            generation: self.generation,
        };
        self.drag = DragState::Committing {
            deal_id: pending.deal_id,
            from_stage: pending.from_stage.clone(),
            to_stage: pending.to_stage.clone(),
        };
        DropAction::Commit(pending)
    }

    /// Apply the repository's answer for `pending`.
    pub fn complete(&mut self, pending: PendingTransition, result: Result<Deal>) -> DropOutcome {
        if pending.generation != self.generation {
            debug!(deal_id = pending.deal_id, "Discarding stale stage change result");
            return DropOutcome::Discarded;
        }
        self.drag = DragState::Idle;

        match result {
            Ok(deal) => {
                match self.deals.iter_mut().find(|existing| existing.id == deal.id) {
                    Some(existing) => *existing = deal.clone(),
                    None => self.deals.push(deal.clone()),
                }
                DropOutcome::Moved(deal)
            }
            Err(err) => {
                warn!(
                    deal_id = pending.deal_id,
                    to_stage = %pending.to_stage,
                    error = %err,
                    "Stage change failed"
                );
                DropOutcome::Failed(err.to_string())
            }
        }
    }

    pub fn drag_end(&mut self) {
        if matches!(self.drag, DragState::Dragging { .. }) {
            self.drag = DragState::Idle;
        }
    }

    /// Drop on `stage` and persist the move through `repo`.
    pub async fn commit_drop(&mut self, stage: &str, repo: &dyn DealRepository) -> DropOutcome {
        match self.drop_on(stage) {
            DropAction::Unchanged => DropOutcome::Unchanged,
            DropAction::Commit(pending) => {
                let result = repo.update_stage(pending.deal_id, &pending.to_stage).await;
                self.complete(pending, result)
            }
        }
    }

    /// Replace committed state. Pending transitions become stale.
    pub fn reload(&mut self, deals: Vec<Deal>, stages: Vec<PipelineStage>) {
        self.deals = deals;
        self.stages = sorted_stages(&stages);
        self.drag = DragState::Idle;
        self.generation += 1;
    }

    pub fn close(&mut self) {
        self.deals.clear();
        self.drag = DragState::Idle;
        self.generation += 1;
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.load_seq += 1;
        LoadTicket {
            seq: self.load_seq,
            generation: self.generation,
        }
    }

    /// Apply a load result. Returns `false` when a newer load was started or
    /// the board was reloaded or closed since `ticket` was issued.
    pub fn apply_load(
        &mut self,
        ticket: LoadTicket,
        deals: Vec<Deal>,
        stages: Vec<PipelineStage>,
    ) -> bool {
        if ticket.seq != self.load_seq || ticket.generation != self.generation {
            debug!("Discarding stale board load");
            return false;
        }
        self.deals = deals;
        self.stages = sorted_stages(&stages);
        true
    }
}
