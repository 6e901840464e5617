//! Session-scoped reference data: publisher directory, dropdown options and
//! available dates.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::OnceCell;

use crate::api::DashboardApi;
use crate::error::FetchError;
use crate::model::{PoliticalGroup, Publisher};

/// A dropdown entry. An empty `value` means "no filter".
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Display format for dates in pickers, e.g. `Jul 26, 2025`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Options for the political group dropdown, `All` first.
pub fn group_options() -> Vec<SelectOption> {
    PoliticalGroup::ALL
        .iter()
        .map(|group| SelectOption::new(group.as_param().unwrap_or(""), group.label()))
        .collect()
}

/// Caches the publisher directory for the lifetime of the session.
pub struct ReferenceData {
    api: Arc<DashboardApi>,
    publishers: OnceCell<Vec<Publisher>>,
}

impl ReferenceData {
    pub fn new(api: Arc<DashboardApi>) -> Self {
        Self {
            api,
            publishers: OnceCell::new(),
        }
    }

    /// The publisher directory, fetched on first use.
    ///
    /// Concurrent first callers share one fetch. A failed fetch is not cached.
    pub async fn publishers(&self) -> Result<&[Publisher], FetchError> {
        let publishers = self
            .publishers
            .get_or_try_init(|| async {
                let publishers = self.api.publishers().await?;
                log::debug!("Loaded {} publishers", publishers.len());
                Ok::<_, FetchError>(publishers)
            })
            .await?;
        Ok(publishers.as_slice())
    }

    /// Publisher dropdown options, led by "All Publishers".
    ///
    /// Falls back to the leading entry alone when the directory is unavailable.
    pub async fn publisher_options(&self) -> Vec<SelectOption> {
        let mut options = vec![SelectOption::new("", "All Publishers")];
        match self.publishers().await {
            Ok(publishers) => options.extend(
                publishers
                    .iter()
                    .map(|p| SelectOption::new(p.id.as_str(), p.name.as_str())),
            ),
            Err(e) => log::error!("Failed to load publishers: {e}"),
        }
        options
    }

    /// Dates the backend has data for. Not cached.
    pub async fn dates(&self) -> Result<Vec<NaiveDate>, FetchError> {
        self.api.dates().await
    }
}
