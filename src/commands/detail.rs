use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::Args;
use common::config::Configuration;
use dashboard::{Action, DashboardApi, DetailResolver, FilterQuery, ReferenceData};

use super::OutputFormat;
use super::render::print_detail;

#[derive(Args, Debug)]
pub struct DetailArgs {
    /// Query date (YYYY-MM-DD), defaults to `dashboard.default_date`
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Backend identifier of the action
    #[arg(long, required_unless_present = "description", conflicts_with = "description")]
    id: Option<String>,

    /// Exact description of the action
    #[arg(long)]
    description: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

impl DetailArgs {
    fn matches(&self, action: &Action) -> bool {
        match (&self.id, &self.description) {
            (Some(id), _) => action.id.as_deref() == Some(id.as_str()),
            (None, Some(description)) => action.description == *description,
            (None, None) => false,
        }
    }

    pub async fn run(self, api: Arc<DashboardApi>, config: &Configuration) -> anyhow::Result<()> {
        let date = self.date.unwrap_or(config.dashboard.default_date);

        let actions = api
            .top_actions(&FilterQuery::seeded(date))
            .await
            .with_context(|| format!("Failed to load actions for {date}"))?;
        let action = actions
            .iter()
            .find(|a| self.matches(a))
            .with_context(|| format!("No matching action on {date}"))?;

        let reference = Arc::new(ReferenceData::new(api.clone()));
        let resolver = DetailResolver::new(api, reference, config.dashboard.degraded_detail);
        let view = resolver
            .detail_view(action, date)
            .await
            .with_context(|| format!("Failed to resolve details for '{}'", action.description))?;

        print_detail(&view, self.format)
    }
}
