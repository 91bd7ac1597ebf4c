//! Dashboard aggregation.
//!
//! Everything here is a pure function over snapshots of deals, tasks and
//! contacts. [`ReportingEngine`] only fetches fresh snapshots and hands them
//! to these functions; nothing is cached between requests.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Local, Months, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Result;

use super::models::{Contact, Deal, PipelineStage, Task};
use super::repository::{ContactRepository, DealRepository, TaskRepository};
use super::settings::SettingsStore;

pub const UNKNOWN_CONTACT: &str = "Unknown Contact";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSummary {
    pub name: String,
    pub count: usize,
    pub total_value: f64,
    pub win_probability: u8,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthRevenue {
    /// Short month name, e.g. "Jan".
    pub label: String,
    pub start: NaiveDate,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuePerformer {
    pub contact_id: i64,
    pub name: String,
    pub company: String,
    pub total_value: f64,
    pub deal_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityPerformer {
    pub contact_id: i64,
    pub name: String,
    pub company: String,
    pub task_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPerformers {
    pub by_value: Vec<ValuePerformer>,
    pub by_activity: Vec<ActivityPerformer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Growth {
    pub revenue: f64,
    pub deals: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    /// Value of deals that are neither won nor lost.
    pub total_pipeline_value: f64,
    pub closed_deals_count: usize,
    pub average_deal_size: f64,
    pub conversion_rate: f64,
    pub revenue_this_month: f64,
    pub growth: Growth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub tasks_completed: usize,
    pub calls_made: usize,
    pub emails_sent: usize,
    pub total_activities: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMetrics {
    pub completed: usize,
    pub pending: usize,
    pub overdue: usize,
    pub total: usize,
}

/// Everything the dashboard shows, computed from one set of snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub metrics: DashboardMetrics,
    pub pipeline: Vec<StageSummary>,
    pub revenue_trend: Vec<MonthRevenue>,
    pub top_performers: TopPerformers,
    pub activity: ActivitySummary,
    pub tasks: TaskMetrics,
}

/// First day of the month containing `date`.
fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Whether `at`, seen in `tz`, falls inside the calendar month starting at `start`.
fn in_month<Tz: TimeZone>(at: &DateTime<Utc>, tz: &Tz, start: NaiveDate) -> bool {
    let day = at.with_timezone(tz).date_naive();
    let end = start.checked_add_months(Months::new(1)).unwrap_or(NaiveDate::MAX);
    day >= start && day < end
}

fn won_in_month<'a, Tz: TimeZone>(
    deals: &'a [Deal],
    won_stage: &'a str,
    tz: &'a Tz,
    start: NaiveDate,
) -> impl Iterator<Item = &'a Deal> + 'a {
    deals
        .iter()
        .filter(move |deal| deal.stage == won_stage && in_month(&deal.updated_at, tz, start))
}

pub fn pipeline_distribution(deals: &[Deal], stages: &[PipelineStage]) -> Vec<StageSummary> {
    let mut stages = stages.to_vec();
    stages.sort_by_key(|stage| stage.order);
    stages
        .into_iter()
        .map(|stage| {
            let (count, total_value) = deals
                .iter()
                .filter(|deal| deal.stage == stage.name)
                .fold((0, 0.0), |(count, total), deal| (count + 1, total + deal.value));
            StageSummary {
                name: stage.name,
                count,
                total_value,
                win_probability: stage.win_probability,
                color: stage.color,
            }
        })
        .collect()
}

/// Won revenue for each of the last `months` calendar months, oldest first.
pub fn revenue_trend<Tz: TimeZone>(
    deals: &[Deal],
    won_stage: &str,
    now: &DateTime<Tz>,
    months: u32,
) -> Vec<MonthRevenue> {
    let tz = now.timezone();
    let current = month_start(now.date_naive());
    (0..months)
        .rev()
        .filter_map(|back| current.checked_sub_months(Months::new(back)))
        .map(|start| MonthRevenue {
            label: start.format("%b").to_string(),
            start,
            revenue: won_in_month(deals, won_stage, &tz, start)
                .map(|deal| deal.value)
                .sum(),
        })
        .collect()
}

fn contact_label(contacts: &[Contact], id: i64) -> (String, String) {
    contacts
        .iter()
        .find(|contact| contact.id == id)
        .map(|contact| (contact.full_name(), contact.company.clone()))
        .unwrap_or_else(|| (UNKNOWN_CONTACT.to_string(), String::new()))
}

/// Rank contacts by won deal value and by task count.
///
/// Sorting is stable, so ties keep the order in which each contact first
/// appears in the input.
pub fn top_performers(
    deals: &[Deal],
    tasks: &[Task],
    contacts: &[Contact],
    won_stage: &str,
    limit: usize,
) -> TopPerformers {
    let mut value_index: HashMap<i64, usize> = HashMap::new();
    let mut by_value: Vec<ValuePerformer> = Vec::new();
    for deal in deals.iter().filter(|deal| deal.stage == won_stage) {
        let Some(contact_id) = deal.contact_id else {
            continue;
        };
        let index = *value_index.entry(contact_id).or_insert_with(|| {
            let (name, company) = contact_label(contacts, contact_id);
            by_value.push(ValuePerformer {
                contact_id,
                name,
                company,
                total_value: 0.0,
                deal_count: 0,
            });
            by_value.len() - 1
        });
        by_value[index].total_value += deal.value;
        by_value[index].deal_count += 1;
    }
    by_value.sort_by(|a, b| b.total_value.total_cmp(&a.total_value));
    by_value.truncate(limit);

    let mut activity_index: HashMap<i64, usize> = HashMap::new();
    let mut by_activity: Vec<ActivityPerformer> = Vec::new();
    for contact_id in tasks.iter().filter_map(|task| task.contact_id) {
        let index = *activity_index.entry(contact_id).or_insert_with(|| {
            let (name, company) = contact_label(contacts, contact_id);
            by_activity.push(ActivityPerformer {
                contact_id,
                name,
                company,
                task_count: 0,
            });
            by_activity.len() - 1
        });
        by_activity[index].task_count += 1;
    }
    by_activity.sort_by(|a, b| b.task_count.cmp(&a.task_count));
    by_activity.truncate(limit);

    TopPerformers {
        by_value,
        by_activity,
    }
}

/// Percentage change from `previous` to `current`; zero when there is no base.
pub fn growth_percentage(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

/// Won deals as a percentage of all deals that are not lost.
pub fn conversion_rate(deals: &[Deal], won_stage: &str, lost_stage: &str) -> f64 {
    let open_or_won = deals.iter().filter(|deal| deal.stage != lost_stage).count();
    if open_or_won == 0 {
        return 0.0;
    }
    let won = deals.iter().filter(|deal| deal.stage == won_stage).count();
    won as f64 / open_or_won as f64 * 100.0
}

pub fn dashboard_metrics<Tz: TimeZone>(
    deals: &[Deal],
    won_stage: &str,
    lost_stage: &str,
    now: &DateTime<Tz>,
) -> DashboardMetrics {
    let tz = now.timezone();
    let this_month = month_start(now.date_naive());
    let last_month = this_month
        .checked_sub_months(Months::new(1))
        .unwrap_or(this_month);

    let total_pipeline_value = deals
        .iter()
        .filter(|deal| deal.stage != won_stage && deal.stage != lost_stage)
        .map(|deal| deal.value)
        .sum();

    let won_now: Vec<&Deal> = won_in_month(deals, won_stage, &tz, this_month).collect();
    let won_before: Vec<&Deal> = won_in_month(deals, won_stage, &tz, last_month).collect();
    let revenue_this_month: f64 = won_now.iter().map(|deal| deal.value).sum();
    let revenue_last_month: f64 = won_before.iter().map(|deal| deal.value).sum();

    let average_deal_size = if won_now.is_empty() {
        0.0
    } else {
        revenue_this_month / won_now.len() as f64
    };

    DashboardMetrics {
        total_pipeline_value,
        closed_deals_count: won_now.len(),
        average_deal_size,
        conversion_rate: conversion_rate(deals, won_stage, lost_stage),
        revenue_this_month,
        growth: Growth {
            revenue: growth_percentage(revenue_this_month, revenue_last_month),
            deals: growth_percentage(won_now.len() as f64, won_before.len() as f64),
        },
    }
}

/// Tasks touched in the last `days` days.
pub fn activity_summary(tasks: &[Task], now: DateTime<Utc>, days: i64) -> ActivitySummary {
    let since = now - Duration::days(days);
    let recent: Vec<&Task> = tasks.iter().filter(|task| task.updated_at >= since).collect();
    ActivitySummary {
        tasks_completed: recent.iter().filter(|task| task.completed).count(),
        calls_made: recent.iter().filter(|task| task.task_type == "Call").count(),
        emails_sent: recent.iter().filter(|task| task.task_type == "Email").count(),
        total_activities: recent.len(),
    }
}

pub fn task_metrics(tasks: &[Task], now: DateTime<Utc>) -> TaskMetrics {
    let completed = tasks.iter().filter(|task| task.completed).count();
    let overdue = tasks
        .iter()
        .filter(|task| !task.completed && task.due_date.is_some_and(|due| due < now))
        .count();
    TaskMetrics {
        completed,
        pending: tasks.len() - completed,
        overdue,
        total: tasks.len(),
    }
}

/// Knobs for the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
    pub won_stage: String,
    pub lost_stage: String,
    pub trend_months: u32,
    pub top_performers: usize,
    pub activity_window_days: i64,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            won_stage: "Closed Won".to_string(),
            lost_stage: "Closed Lost".to_string(),
            trend_months: 6,
            top_performers: 5,
            activity_window_days: 7,
        }
    }
}

/// Fetches fresh snapshots on every call and runs the aggregations in local time.
pub struct ReportingEngine {
    deals: Arc<dyn DealRepository>,
    tasks: Arc<dyn TaskRepository>,
    contacts: Arc<dyn ContactRepository>,
    settings: Arc<SettingsStore>,
    options: ReportOptions,
}

impl ReportingEngine {
    pub fn new(
        deals: Arc<dyn DealRepository>,
        tasks: Arc<dyn TaskRepository>,
        contacts: Arc<dyn ContactRepository>,
        settings: Arc<SettingsStore>,
        options: ReportOptions,
    ) -> Self {
        Self {
            deals,
            tasks,
            contacts,
            settings,
            options,
        }
    }

    pub async fn metrics(&self) -> Result<DashboardMetrics> {
        let deals = self.deals.get_all().await?;
        Ok(dashboard_metrics(
            &deals,
            &self.options.won_stage,
            &self.options.lost_stage,
            &Local::now(),
        ))
    }

    pub async fn pipeline(&self) -> Result<Vec<StageSummary>> {
        let deals = self.deals.get_all().await?;
        Ok(pipeline_distribution(&deals, &self.settings.pipeline_stages()))
    }

    pub async fn revenue_trend(&self) -> Result<Vec<MonthRevenue>> {
        let deals = self.deals.get_all().await?;
        Ok(revenue_trend(
            &deals,
            &self.options.won_stage,
            &Local::now(),
            self.options.trend_months,
        ))
    }

    pub async fn top_performers(&self) -> Result<TopPerformers> {
        let (deals, tasks, contacts) = tokio::try_join!(
            self.deals.get_all(),
            self.tasks.get_all(),
            self.contacts.get_all()
        )?;
        Ok(top_performers(
            &deals,
            &tasks,
            &contacts,
            &self.options.won_stage,
            self.options.top_performers,
        ))
    }

    pub async fn activity(&self) -> Result<ActivitySummary> {
        let tasks = self.tasks.get_all().await?;
        Ok(activity_summary(
            &tasks,
            Utc::now(),
            self.options.activity_window_days,
        ))
    }

    pub async fn task_metrics(&self) -> Result<TaskMetrics> {
        let tasks = self.tasks.get_all().await?;
        Ok(task_metrics(&tasks, Utc::now()))
    }

    pub async fn dashboard(&self) -> Result<DashboardReport> {
        let (deals, tasks, contacts) = tokio::try_join!(
            self.deals.get_all(),
            self.tasks.get_all(),
            self.contacts.get_all()
        )?;
        let now = Local::now();
        let utc_now = now.with_timezone(&Utc);
        let opts = &self.options;
        Ok(DashboardReport {
            metrics: dashboard_metrics(&deals, &opts.won_stage, &opts.lost_stage, &now),
            pipeline: pipeline_distribution(&deals, &self.settings.pipeline_stages()),
            revenue_trend: revenue_trend(&deals, &opts.won_stage, &now, opts.trend_months),
            top_performers: top_performers(
                &deals,
                &tasks,
                &contacts,
                &opts.won_stage,
                opts.top_performers,
            ),
            activity: activity_summary(&tasks, utc_now, opts.activity_window_days),
            tasks: task_metrics(&tasks, utc_now),
        })
    }
}
