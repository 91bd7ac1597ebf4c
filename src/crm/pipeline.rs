use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::errors::{CrmError, Result};

use super::board::{PipelineBoard, board_view};
use super::models::{BoardView, Deal, NewStage, PipelineStage, StagePatch};
use super::repository::DealRepository;
use super::settings::{SettingsStore, StageEdit};

/// Result of editing a stage, including how many deals followed a rename.
#[derive(Debug, Clone, Serialize)]
pub struct StageUpdate {
    #[serde(flatten)]
    pub edit: StageEdit,
    pub migrated_deals: usize,
}

/// Result of replacing the whole stage list.
#[derive(Debug, Clone, Serialize)]
pub struct StageReplacement {
    pub stages: Vec<PipelineStage>,
    pub migrated_deals: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageDeletion {
    pub stage: PipelineStage,
    /// Deals still carrying the removed stage name. `None` when they could
    /// not be counted; the stage is deleted either way.
    pub orphaned_deals: Option<usize>,
}

/// Stage configuration changes that also touch deals, plus board loading.
#[derive(Clone)]
pub struct PipelineService {
    settings: Arc<SettingsStore>,
    deals: Arc<dyn DealRepository>,
}

impl PipelineService {
    pub fn new(settings: Arc<SettingsStore>, deals: Arc<dyn DealRepository>) -> Self {
        Self { settings, deals }
    }

    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.settings
    }

    pub async fn board(&self) -> Result<BoardView> {
        let deals = self.deals.get_all().await?;
        Ok(board_view(&deals, &self.settings.pipeline_stages()))
    }

    pub async fn load_board(&self) -> Result<PipelineBoard> {
        let deals = self.deals.get_all().await?;
        Ok(PipelineBoard::new(deals, self.settings.pipeline_stages()))
    }

    /// Refresh `board` from the store, ignoring the result if a newer load
    /// started or the board was closed meanwhile.
    pub async fn refresh_board(&self, board: &mut PipelineBoard) -> Result<bool> {
        let ticket = board.begin_load();
        let deals = self.deals.get_all().await?;
        Ok(board.apply_load(ticket, deals, self.settings.pipeline_stages()))
    }

    pub async fn move_deal(&self, deal_id: i64, stage: &str) -> Result<Deal> {
        self.deals.update_stage(deal_id, stage).await
    }

    pub async fn add_stage(&self, new: NewStage) -> Result<PipelineStage> {
        self.settings.add_pipeline_stage(new).await
    }

    /// Edit a stage in place. A rename carries every deal on the old name over.
    pub async fn update_stage(&self, id: i64, patch: StagePatch) -> Result<StageUpdate> {
        let edit = self.settings.update_pipeline_stage(id, patch).await?;
        let migrated_deals = if edit.renamed() {
            self.migrate(&edit.before.name, &edit.after.name).await?
        } else {
            0
        };
        Ok(StageUpdate {
            edit,
            migrated_deals,
        })
    }

    /// Replace the whole stage list. Stages that keep their id under a new
    /// name carry their deals over, as with [`Self::update_stage`].
    pub async fn replace_stages(&self, stages: Vec<PipelineStage>) -> Result<StageReplacement> {
        let previous = self.settings.pipeline_stages();
        let stages = self.settings.update_pipeline_stages(stages).await?;

        let renames: Vec<(String, String)> = stages
            .iter()
            .filter_map(|after| {
                previous
                    .iter()
                    .find(|before| before.id == after.id && before.name != after.name)
                    .map(|before| (before.name.clone(), after.name.clone()))
            })
            .collect();

        // Swaps and chains park deals under a temporary name first so two
        // groups never share a name mid-migration.
        let tangled = renames
            .iter()
            .any(|(_, to)| renames.iter().any(|(from, _)| from == to));
        let mut migrated_deals = 0;
        if tangled {
            let parked: Vec<String> = renames
                .iter()
                .enumerate()
                .map(|(i, (from, _))| format!("__renaming_{}__{}", i, from))
                .collect();
            for ((from, _), parking) in renames.iter().zip(&parked) {
                migrated_deals += self.migrate(from, parking).await?;
            }
            for ((_, to), parking) in renames.iter().zip(&parked) {
                self.migrate(parking, to).await?;
            }
        } else {
            for (from, to) in &renames {
                migrated_deals += self.migrate(from, to).await?;
            }
        }

        Ok(StageReplacement {
            stages,
            migrated_deals,
        })
    }

    async fn migrate(&self, from: &str, to: &str) -> Result<usize> {
        let moved = self
            .deals
            .rename_stage(from, to)
            .await
            .inspect_err(|err| {
                warn!(
                    from,
                    to,
                    error = %err,
                    "Stage renamed but deals were not migrated"
                )
            })?;
        info!(from, to, moved, "Stage renamed");
        Ok(moved)
    }

    /// Delete a stage. Deals on it are left as they are and counted.
    pub async fn delete_stage(&self, id: i64) -> Result<StageDeletion> {
        let stage = self.settings.delete_pipeline_stage(id).await?;
        let orphaned_deals = match self.deals.get_all().await {
            Ok(deals) => Some(deals.iter().filter(|deal| deal.stage == stage.name).count()),
            Err(err) => {
                warn!(
                    stage = %stage.name,
                    error = %err,
                    "Stage deleted but its deals could not be counted"
                );
                None
            }
        };
        if let Some(orphaned_deals) = orphaned_deals.filter(|count| *count > 0) {
            warn!(
                stage = %stage.name,
                orphaned_deals,
                "Deleted stage still has deals"
            );
        }
        Ok(StageDeletion {
            stage,
            orphaned_deals,
        })
    }

    /// Move the stage with `id` to zero-based `position`, clamped to the list.
    pub async fn move_stage(&self, id: i64, position: usize) -> Result<Vec<PipelineStage>> {
        let mut stages = self.settings.pipeline_stages();
        let index = stages
            .iter()
            .position(|stage| stage.id == id)
            .ok_or_else(|| CrmError::not_found("Pipeline stage", id))?;
        let stage = stages.remove(index);
        stages.insert(position.min(stages.len()), stage);
        self.settings.update_pipeline_stages(stages).await
    }

    pub fn stage_id_by_name(&self, name: &str) -> Result<i64> {
        self.settings
            .stage_by_name(name)
            .map(|stage| stage.id)
            .ok_or_else(|| CrmError::validation(format!("No pipeline stage named '{}'", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crm::db::{CrmDb, DbHandle};
    use crate::crm::models::{DealUpdate, NewDeal};
    use crate::crm::repository::SqlRepository;

    fn service() -> (PipelineService, SqlRepository) {
        let settings = Arc::new(SettingsStore::in_memory());
        let repo = SqlRepository::new(DbHandle::new(CrmDb::new_in_memory().unwrap()), settings.clone());
        (PipelineService::new(settings, Arc::new(repo.clone())), repo)
    }

    async fn add_deal(repo: &SqlRepository, title: &str, stage: &str, value: f64) -> Deal {
        DealRepository::create(
            repo,
            NewDeal {
                title: title.to_string(),
                value,
                stage: Some(stage.to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_rename_migrates_deals() {
        let (service, repo) = service();
        add_deal(&repo, "A", "Qualified", 100.0).await;
        add_deal(&repo, "B", "Qualified", 200.0).await;
        add_deal(&repo, "C", "Lead", 50.0).await;

        let update = service
            .update_stage(
                2,
                StagePatch {
                    name: Some("Discovery".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(update.migrated_deals, 2);

        let board = service.board().await.unwrap();
        let discovery = board
            .columns
            .iter()
            .find(|c| c.stage.name == "Discovery")
            .unwrap();
        assert_eq!(discovery.count, 2);
        assert_eq!(discovery.total_value, 300.0);
        assert!(board.columns[0].orphaned.is_empty());
    }

    #[tokio::test]
    async fn test_replace_stages_migrates_renamed_ids() {
        let (service, repo) = service();
        add_deal(&repo, "A", "Qualified", 100.0).await;
        add_deal(&repo, "B", "Lead", 50.0).await;

        let mut stages = service.settings().pipeline_stages();
        stages[1].name = "Discovery".to_string();
        let replacement = service.replace_stages(stages).await.unwrap();
        assert_eq!(replacement.migrated_deals, 1);
        assert_eq!(replacement.stages[1].name, "Discovery");
        assert_eq!(replacement.stages[1].id, 2);

        let board = service.board().await.unwrap();
        let discovery = board
            .columns
            .iter()
            .find(|c| c.stage.name == "Discovery")
            .unwrap();
        assert_eq!(discovery.count, 1);
        assert!(board.columns.iter().all(|c| c.orphaned.is_empty()));
    }

    #[tokio::test]
    async fn test_replace_stages_swapping_names_keeps_groups_apart() {
        let (service, repo) = service();
        let lead = add_deal(&repo, "A", "Lead", 100.0).await;
        let qualified = add_deal(&repo, "B", "Qualified", 200.0).await;

        let mut stages = service.settings().pipeline_stages();
        stages[0].name = "Qualified".to_string();
        stages[1].name = "Lead".to_string();
        let replacement = service.replace_stages(stages).await.unwrap();
        assert_eq!(replacement.migrated_deals, 2);

        assert_eq!(repo.get_by_id(lead.id).await.unwrap().stage, "Qualified");
        assert_eq!(repo.get_by_id(qualified.id).await.unwrap().stage, "Lead");
    }

    #[tokio::test]
    async fn test_replace_stages_reorder_only_moves_nothing() {
        let (service, repo) = service();
        add_deal(&repo, "A", "Proposal", 100.0).await;

        let mut stages = service.settings().pipeline_stages();
        stages.reverse();
        let replacement = service.replace_stages(stages).await.unwrap();
        assert_eq!(replacement.migrated_deals, 0);
        assert_eq!(replacement.stages[0].name, "Closed Won");
    }

    #[tokio::test]
    async fn test_replace_stages_rejects_invalid_list() {
        let (service, _repo) = service();
        let mut stages = service.settings().pipeline_stages();
        stages[1].name = "Lead".to_string();
        let err = service.replace_stages(stages).await.unwrap_err();
        assert!(matches!(err, CrmError::Validation(_)));
        assert_eq!(service.settings().pipeline_stages()[1].name, "Qualified");
    }

    #[tokio::test]
    async fn test_recolor_does_not_migrate() {
        let (service, repo) = service();
        add_deal(&repo, "A", "Lead", 100.0).await;
        let update = service
            .update_stage(
                1,
                StagePatch {
                    color: Some("#111111".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(update.migrated_deals, 0);
        assert_eq!(update.edit.after.color, "#111111");
    }

    #[tokio::test]
    async fn test_delete_stage_reports_orphans() {
        let (service, repo) = service();
        add_deal(&repo, "A", "Proposal", 100.0).await;
        add_deal(&repo, "B", "Proposal", 100.0).await;

        let deletion = service.delete_stage(3).await.unwrap();
        assert_eq!(deletion.stage.name, "Proposal");
        assert_eq!(deletion.orphaned_deals, Some(2));

        let board = service.board().await.unwrap();
        assert_eq!(board.columns[0].stage.name, "Lead");
        assert_eq!(board.columns[0].orphaned.len(), 2);
    }

    /// Deal store whose listing always fails.
    struct UnlistableDeals(SqlRepository);

    #[async_trait::async_trait]
    impl DealRepository for UnlistableDeals {
        async fn get_all(&self) -> Result<Vec<Deal>> {
            Err(CrmError::Persistence(anyhow::anyhow!("deal table is locked")))
        }
        async fn get_by_id(&self, id: i64) -> Result<Deal> {
            self.0.get_by_id(id).await
        }
        async fn get_by_contact_id(&self, contact_id: i64) -> Result<Vec<Deal>> {
            self.0.get_by_contact_id(contact_id).await
        }
        async fn create(&self, deal: NewDeal) -> Result<Deal> {
            self.0.create(deal).await
        }
        async fn update(&self, id: i64, update: DealUpdate) -> Result<Deal> {
            self.0.update(id, update).await
        }
        async fn update_stage(&self, id: i64, stage: &str) -> Result<Deal> {
            self.0.update_stage(id, stage).await
        }
        async fn delete(&self, id: i64) -> Result<()> {
            self.0.delete(id).await
        }
        async fn rename_stage(&self, from: &str, to: &str) -> Result<usize> {
            self.0.rename_stage(from, to).await
        }
    }

    #[tokio::test]
    async fn test_delete_stage_survives_failed_orphan_count() {
        let (service, repo) = service();
        let settings = service.settings().clone();
        let service = PipelineService::new(settings.clone(), Arc::new(UnlistableDeals(repo)));

        let deletion = service.delete_stage(3).await.unwrap();
        assert_eq!(deletion.stage.name, "Proposal");
        assert_eq!(deletion.orphaned_deals, None);
        assert!(settings.stage_by_name("Proposal").is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_stage() {
        let (service, _repo) = service();
        assert!(service.delete_stage(77).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_move_stage_to_front() {
        let (service, _repo) = service();
        let stages = service.move_stage(2, 0).await.unwrap();
        let names: Vec<&str> = stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Qualified", "Lead", "Proposal", "Negotiation", "Closed Won"]
        );
        assert_eq!(stages[0].order, 1);
        assert_eq!(stages[1].order, 2);
    }

    #[tokio::test]
    async fn test_move_deal_and_refresh_board() {
        let (service, repo) = service();
        let deal = add_deal(&repo, "A", "Lead", 5000.0).await;
        let mut board = service.load_board().await.unwrap();

        let moved = service.move_deal(deal.id, "Proposal").await.unwrap();
        assert_eq!(moved.stage, "Proposal");
        assert!(service.refresh_board(&mut board).await.unwrap());
        assert_eq!(board.deals()[0].stage, "Proposal");
    }

    #[test]
    fn test_stage_id_by_name() {
        let (service, _repo) = service();
        assert_eq!(service.stage_id_by_name("Negotiation").unwrap(), 4);
        assert!(service.stage_id_by_name("Nope").is_err());
    }
}
