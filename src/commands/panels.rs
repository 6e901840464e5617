use std::sync::Arc;

use chrono::NaiveDate;
use clap::Args;
use common::config::Configuration;
use dashboard::{Dashboard, DashboardApi, FetchState, PanelId, PoliticalGroup};

use super::OutputFormat;
use super::render::{PanelReport, print_panels};

/// Filters of one panel.
#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Query date (YYYY-MM-DD), defaults to `dashboard.default_date`
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Restrict to one publisher id
    #[arg(long)]
    publisher: Option<String>,

    /// Political group: all, republican or democrat
    #[arg(long, default_value = "all")]
    group: PoliticalGroup,
}

#[derive(Args, Debug)]
pub struct ActionsArgs {
    #[command(flatten)]
    filters: FilterArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    #[command(flatten)]
    filters: FilterArgs,

    /// Date of the right panel, defaults to the left panel's date
    #[arg(long)]
    right_date: Option<NaiveDate>,

    /// Publisher of the right panel
    #[arg(long)]
    right_publisher: Option<String>,

    /// Political group of the right panel
    #[arg(long, default_value = "all")]
    right_group: PoliticalGroup,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

/// Opens a dashboard whose first panel starts on `filters.date`.
fn open(api: Arc<DashboardApi>, config: &Configuration, filters: &FilterArgs) -> Dashboard {
    let mut settings = config.dashboard.clone();
    if let Some(date) = filters.date {
        settings.default_date = date;
    }
    Dashboard::new(api, &settings)
}

fn apply(
    dashboard: &mut Dashboard,
    id: PanelId,
    date: Option<NaiveDate>,
    publisher: Option<&str>,
    group: PoliticalGroup,
) -> anyhow::Result<()> {
    if let Some(date) = date {
        dashboard.set_date(id, date)?;
    }
    dashboard.set_publisher(id, publisher)?;
    dashboard.set_group(id, group)?;
    Ok(())
}

fn reports(dashboard: &Dashboard) -> Vec<PanelReport> {
    dashboard
        .panels()
        .iter()
        .map(|panel| PanelReport::new(dashboard.title(panel.id()), panel.snapshot()))
        .collect()
}

fn ensure_loaded(dashboard: &Dashboard) -> anyhow::Result<()> {
    let failed: Vec<String> = dashboard
        .panels()
        .iter()
        .filter(|p| p.state() == FetchState::Error)
        .map(|p| format!("{}: {}", p.id(), p.error_message().unwrap_or("unknown error")))
        .collect();
    if !failed.is_empty() {
        anyhow::bail!("{}", failed.join("; "));
    }
    Ok(())
}

impl ActionsArgs {
    pub async fn run(self, api: Arc<DashboardApi>, config: &Configuration) -> anyhow::Result<()> {
        let mut dashboard = open(api, config, &self.filters);
        apply(
            &mut dashboard,
            PanelId::First,
            None,
            self.filters.publisher.as_deref(),
            self.filters.group,
        )?;
        dashboard.settle().await;

        print_panels(&reports(&dashboard), self.format)?;
        ensure_loaded(&dashboard)
    }
}

impl CompareArgs {
    pub async fn run(self, api: Arc<DashboardApi>, config: &Configuration) -> anyhow::Result<()> {
        let mut dashboard = open(api, config, &self.filters);
        apply(
            &mut dashboard,
            PanelId::First,
            None,
            self.filters.publisher.as_deref(),
            self.filters.group,
        )?;

        let right = dashboard.add_panel()?;
        apply(
            &mut dashboard,
            right,
            self.right_date,
            self.right_publisher.as_deref(),
            self.right_group,
        )?;
        dashboard.settle().await;

        print_panels(&reports(&dashboard), self.format)?;
        ensure_loaded(&dashboard)
    }
}
