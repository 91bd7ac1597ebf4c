//! Pipeline board view: `dealflow board`.

use anyhow::Result;

use dealflow::dealflow_config::DealflowConfig;

use super::{money, open_project};

pub async fn cmd_board(config: &DealflowConfig) -> Result<()> {
    let state = open_project(config).await?;
    let view = state.pipeline.board().await?;

    if view.columns.is_empty() {
        println!("No pipeline stages configured.");
        if !view.unassigned.is_empty() {
            println!("{} deal(s) cannot be placed.", view.unassigned.len());
        }
        return Ok(());
    }

    for column in &view.columns {
        println!(
            "{} {}",
            console::style(&column.stage.name).bold().cyan(),
            console::style(format!("({}, {})", column.count, money(column.total_value))).dim()
        );
        if column.deals.is_empty() {
            println!("  {}", console::style("no deals").dim());
        }
        for deal in &column.deals {
            let marker = if column.orphaned.contains(&deal.id) {
                format!(" {}", console::style(format!("[was '{}']", deal.stage)).yellow())
            } else {
                String::new()
            };
            println!(
                "  #{:<4} {:<32} {:>12}{}",
                deal.id,
                deal.title,
                money(deal.value),
                marker
            );
        }
        println!();
    }

    Ok(())
}
