//! Typed client for the actions backend.

use std::sync::Arc;

use chrono::NaiveDate;
use common::config::{Configuration, FetchConfig};
use serde::Deserialize;

use crate::error::FetchError;
use crate::fetch::FetchOrchestrator;
use crate::fetch::http::HttpTransport;
use crate::fetch::transport::{Request, Transport, TransportError};
use crate::model::{Action, FilterQuery, Publisher, PublisherBreakdown, format_param_date};

pub const TOP_ACTIONS_PATH: &str = "topactions";
pub const PUBLISHERS_PATH: &str = "publishers";
pub const DATES_PATH: &str = "dates";
pub const ACTION_DETAILS_PATH: &str = "actiondetails";

#[derive(Debug, Deserialize)]
struct ActionDetailsResponse {
    publishers: Vec<PublisherBreakdown>,
}

/// Every backend endpoint, each routed through the same [`FetchOrchestrator`].
#[derive(Clone)]
pub struct DashboardApi {
    fetcher: FetchOrchestrator,
}

impl DashboardApi {
    pub fn new(transport: Arc<dyn Transport>, config: &FetchConfig) -> Self {
        Self::with_fetcher(FetchOrchestrator::new(transport, config))
    }

    pub fn with_fetcher(fetcher: FetchOrchestrator) -> Self {
        Self { fetcher }
    }

    /// HTTP client for `config.api.base_url`.
    pub fn from_config(config: &Configuration) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(&config.api.base_url)?;
        Ok(Self::new(Arc::new(transport), &config.fetch))
    }

    pub fn fetcher(&self) -> &FetchOrchestrator {
        &self.fetcher
    }

    /// `GET /topactions` for a composed filter.
    pub async fn top_actions(&self, query: &FilterQuery) -> Result<Vec<Action>, FetchError> {
        let request = Request::new(TOP_ACTIONS_PATH).params(query.to_params());
        self.fetcher.fetch(&request).await
    }

    /// Per-publisher variant of `/topactions` used for detail correlation.
    pub async fn publisher_actions(
        &self,
        date: NaiveDate,
        publisher_id: &str,
    ) -> Result<Vec<Action>, FetchError> {
        let request = Request::new(TOP_ACTIONS_PATH)
            .param("date", format_param_date(date))
            .param("publisher", publisher_id);
        self.fetcher.fetch(&request).await
    }

    pub async fn publishers(&self) -> Result<Vec<Publisher>, FetchError> {
        self.fetcher.fetch(&Request::new(PUBLISHERS_PATH)).await
    }

    pub async fn dates(&self) -> Result<Vec<NaiveDate>, FetchError> {
        self.fetcher.fetch(&Request::new(DATES_PATH)).await
    }

    /// Breakdown looked up by a description-derived key (degraded mode only).
    pub async fn action_details(
        &self,
        date: NaiveDate,
        action_key: &str,
    ) -> Result<Vec<PublisherBreakdown>, FetchError> {
        let request = Request::new(ACTION_DETAILS_PATH)
            .param("date", format_param_date(date))
            .param("action", action_key);
        let response: ActionDetailsResponse = self.fetcher.fetch(&request).await?;
        Ok(response.publishers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PoliticalGroup;
    use crate::testing::ScriptedTransport;
    use serde_json::json;

    fn api(transport: &Arc<ScriptedTransport>) -> DashboardApi {
        DashboardApi::new(transport.clone(), &FetchConfig::default())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn top_actions_sends_composed_params() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(
            TOP_ACTIONS_PATH,
            &json!([{
                "Description": "Action A",
                "Republican": 0.3,
                "coverage": 0.2,
                "agreement": [0.6, 0.2, 0.2]
            }]),
        );

        let query = FilterQuery {
            date: date(2025, 7, 26),
            publisher_id: None,
            group: PoliticalGroup::Republican,
        };
        let actions = api(&transport).top_actions(&query).await.unwrap();

        assert_eq!(actions.len(), 1);
        let requests = transport.requests();
        assert_eq!(requests[0].get_param("date"), Some("2025-07-26"));
        assert_eq!(requests[0].get_param("group"), Some("Republican"));
        assert_eq!(requests[0].get_param("publisher"), None);
    }

    #[tokio::test]
    async fn dates_parse_as_calendar_dates() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(DATES_PATH, &json!(["2025-07-25", "2025-07-26"]));

        let dates = api(&transport).dates().await.unwrap();
        assert_eq!(dates, vec![date(2025, 7, 25), date(2025, 7, 26)]);
    }

    #[tokio::test]
    async fn action_details_unwraps_publishers() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(
            ACTION_DETAILS_PATH,
            &json!({"publishers": [{
                "id": "pub_rep_1",
                "name": "Republican Publisher 1",
                "leaning": "Republican",
                "coverage": 0.04,
                "agreement": [0.2, 0.3, 0.5]
            }]}),
        );

        let breakdown = api(&transport)
            .action_details(date(2025, 7, 26), "action-n")
            .await
            .unwrap();

        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown[0].publisher_id, "pub_rep_1");
        let requests = transport.requests();
        assert_eq!(requests[0].get_param("action"), Some("action-n"));
    }
}
