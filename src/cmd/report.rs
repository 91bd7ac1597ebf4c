//! Dashboard report: `dealflow report`.

use anyhow::Result;

use dealflow::crm::reporting::DashboardReport;
use dealflow::dealflow_config::DealflowConfig;

use super::{money, open_project};

pub async fn cmd_report(config: &DealflowConfig, json: bool) -> Result<()> {
    let state = open_project(config).await?;
    let report = state.reports.dashboard().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &DashboardReport) {
    let m = &report.metrics;
    println!("{}", console::style("Dashboard").bold().cyan());
    println!("  Pipeline value      {}", money(m.total_pipeline_value));
    println!(
        "  Revenue this month  {} ({:+.1}%)",
        money(m.revenue_this_month),
        m.growth.revenue
    );
    println!(
        "  Closed deals        {} ({:+.1}%)",
        m.closed_deals_count, m.growth.deals
    );
    println!("  Average deal size   {}", money(m.average_deal_size));
    println!("  Conversion rate     {:.1}%", m.conversion_rate);
    println!();

    println!("{}", console::style("Pipeline").bold());
    for stage in &report.pipeline {
        println!(
            "  {:<20} {:>3} deal(s) {:>14}",
            stage.name,
            stage.count,
            money(stage.total_value)
        );
    }
    println!();

    println!("{}", console::style("Revenue trend").bold());
    for month in &report.revenue_trend {
        println!("  {:<4} {:>14}", month.label, money(month.revenue));
    }
    println!();

    println!("{}", console::style("Top performers").bold());
    if report.top_performers.by_value.is_empty() {
        println!("  {}", console::style("no deals linked to contacts").dim());
    }
    for (i, p) in report.top_performers.by_value.iter().enumerate() {
        println!(
            "  {}. {:<24} {:>14} ({} deal(s))",
            i + 1,
            p.name,
            money(p.total_value),
            p.deal_count
        );
    }
    println!();

    let a = &report.activity;
    let t = &report.tasks;
    println!("{}", console::style("Activity").bold());
    println!(
        "  {} activities: {} completed, {} calls, {} emails",
        a.total_activities, a.tasks_completed, a.calls_made, a.emails_sent
    );
    println!(
        "  Tasks: {} total, {} pending, {} overdue",
        t.total, t.pending, t.overdue
    );
}
