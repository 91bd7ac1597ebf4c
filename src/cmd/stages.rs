//! Pipeline stage commands: `dealflow stages`.

use anyhow::{Result, bail};

use dealflow::crm::models::{NewStage, PipelineStage, StagePatch};
use dealflow::dealflow_config::DealflowConfig;

use super::super::StagesCommands;
use super::open_project;

pub async fn cmd_stages(config: &DealflowConfig, command: Option<StagesCommands>) -> Result<()> {
    let state = open_project(config).await?;
    let pipeline = &state.pipeline;

    match command {
        None | Some(StagesCommands::List) => {
            print_stages(&pipeline.settings().pipeline_stages());
        }
        Some(StagesCommands::Add {
            name,
            probability,
            color,
        }) => {
            let stage = pipeline
                .add_stage(NewStage {
                    name,
                    win_probability: probability,
                    color,
                })
                .await?;
            println!(
                "{} stage '{}' ({}%)",
                console::style("Added").green().bold(),
                stage.name,
                stage.win_probability
            );
        }
        Some(StagesCommands::Rename { from, to }) => {
            let id = pipeline.stage_id_by_name(&from)?;
            let update = pipeline
                .update_stage(
                    id,
                    StagePatch {
                        name: Some(to),
                        ..Default::default()
                    },
                )
                .await?;
            println!(
                "{} '{}' → '{}', {} deal(s) moved",
                console::style("Renamed").green().bold(),
                update.edit.before.name,
                update.edit.after.name,
                update.migrated_deals
            );
        }
        Some(StagesCommands::Move { name, position }) => {
            if position == 0 {
                bail!("Positions start at 1");
            }
            let id = pipeline.stage_id_by_name(&name)?;
            let stages = pipeline.move_stage(id, position - 1).await?;
            print_stages(&stages);
        }
        Some(StagesCommands::Delete { name }) => {
            let id = pipeline.stage_id_by_name(&name)?;
            let deletion = pipeline.delete_stage(id).await?;
            println!(
                "{} stage '{}'",
                console::style("Deleted").green().bold(),
                deletion.stage.name
            );
            match deletion.orphaned_deals {
                Some(0) => {}
                Some(count) => println!(
                    "{} {} deal(s) still use '{}' and will show in the first column",
                    console::style("⚠").yellow(),
                    count,
                    deletion.stage.name
                ),
                None => println!(
                    "{} Could not count deals still using '{}'",
                    console::style("⚠").yellow(),
                    deletion.stage.name
                ),
            }
        }
    }

    Ok(())
}

fn print_stages(stages: &[PipelineStage]) {
    if stages.is_empty() {
        println!("No pipeline stages configured.");
        return;
    }
    println!("{}", console::style("Pipeline stages").bold().cyan());
    for (i, stage) in stages.iter().enumerate() {
        println!(
            "  {:>2}. {:<20} {:>3}%  {}",
            i + 1,
            stage.name,
            stage.win_probability,
            console::style(&stage.color).dim()
        );
    }
}
