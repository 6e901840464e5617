//! Per-publisher breakdown of a selected action.
//!
//! Actions carrying a backend identifier are correlated by looking that id up
//! in each publisher's own action list. Actions without one can only be
//! resolved in degraded mode, through a key hashed from the description.
//! That key space has 26 buckets, so unrelated actions collide and silently
//! share a breakdown; it is never used when an id is available.

use std::sync::Arc;

use chrono::NaiveDate;
use futures::{StreamExt, TryStreamExt, stream};
use serde::Serialize;
use thiserror::Error;

use crate::api::DashboardApi;
use crate::error::FetchError;
use crate::metrics::{BarData, coverage_width};
use crate::model::{Action, Publisher, PublisherBreakdown};
use crate::reference::ReferenceData;

/// Publisher lookups issued concurrently during id correlation.
const MAX_CONCURRENT_LOOKUPS: usize = 8;

const ACTION_KEY_BUCKETS: i64 = 26;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetailError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("action '{0}' has no identifier and degraded lookups are disabled")]
    MissingActionId(String),

    #[error("action {0} not found for any publisher")]
    ActionNotFound(String),
}

/// How a breakdown was correlated to its action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Strategy {
    /// Looked up by the backend's action id
    StableId(String),
    /// Looked up by a description hash; lossy
    HashedKey(String),
}

/// Lookup key for an action without an identifier: `action-a` ..= `action-z`.
///
/// 32-bit rolling hash (`h * 31 + unit`, wrapping) over the UTF-16 code
/// units of `description`, absolute value, modulo 26.
pub fn action_key(description: &str) -> String {
    let hash = description
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)));
    let bucket = (i64::from(hash).abs() % ACTION_KEY_BUCKETS) as u8;
    format!("action-{}", char::from(b'a' + bucket))
}

/// Everything the detail view renders for one action.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetailView {
    pub description: String,
    pub date: NaiveDate,
    pub strategy: Strategy,
    /// The action's own share, unscaled
    pub overall: BarData,
    /// One bar per publisher, scaled to the largest publisher share
    pub publishers: Vec<BarData>,
    pub breakdown: Vec<PublisherBreakdown>,
}

pub struct DetailResolver {
    api: Arc<DashboardApi>,
    reference: Arc<ReferenceData>,
    degraded: bool,
}

impl DetailResolver {
    pub fn new(api: Arc<DashboardApi>, reference: Arc<ReferenceData>, degraded: bool) -> Self {
        Self {
            api,
            reference,
            degraded,
        }
    }

    pub fn strategy_for(&self, action: &Action) -> Result<Strategy, DetailError> {
        match &action.id {
            Some(id) => Ok(Strategy::StableId(id.clone())),
            None if self.degraded => Ok(Strategy::HashedKey(action_key(&action.description))),
            None => Err(DetailError::MissingActionId(action.description.clone())),
        }
    }

    /// Breakdown of `action` on `date`, in publisher directory order.
    pub async fn resolve(
        &self,
        action: &Action,
        date: NaiveDate,
    ) -> Result<(Strategy, Vec<PublisherBreakdown>), DetailError> {
        let strategy = self.strategy_for(action)?;
        let breakdown = match &strategy {
            Strategy::StableId(id) => self.resolve_by_id(id, date).await?,
            Strategy::HashedKey(key) => {
                log::warn!(
                    "Resolving '{}' through hashed key {}; results may belong to another action",
                    action.description,
                    key
                );
                self.api.action_details(date, key).await?
            }
        };
        Ok((strategy, breakdown))
    }

    pub async fn detail_view(
        &self,
        action: &Action,
        date: NaiveDate,
    ) -> Result<DetailView, DetailError> {
        let (strategy, breakdown) = self.resolve(action, date).await?;

        let shares: Vec<f64> = breakdown.iter().map(|b| b.coverage_share).collect();
        let publishers = breakdown
            .iter()
            .map(|b| BarData {
                label: b.name.clone(),
                coverage_share: b.coverage_share,
                coverage_width: coverage_width(b.coverage_share, &shares, true),
                agreement: b.agreement,
            })
            .collect();
        let overall = BarData {
            label: "Overall".to_string(),
            coverage_share: action.coverage_share,
            coverage_width: coverage_width(action.coverage_share, &[], false),
            agreement: action.agreement,
        };

        Ok(DetailView {
            description: action.description.clone(),
            date,
            strategy,
            overall,
            publishers,
            breakdown,
        })
    }

    async fn resolve_by_id(
        &self,
        id: &str,
        date: NaiveDate,
    ) -> Result<Vec<PublisherBreakdown>, DetailError> {
        let publishers = self.reference.publishers().await?;

        let found: Vec<Option<PublisherBreakdown>> = stream::iter(publishers)
            .map(|publisher| self.lookup(publisher, id, date))
            .buffered(MAX_CONCURRENT_LOOKUPS)
            .try_collect()
            .await?;

        let breakdown: Vec<PublisherBreakdown> = found.into_iter().flatten().collect();
        if breakdown.is_empty() {
            return Err(DetailError::ActionNotFound(id.to_string()));
        }
        log::debug!(
            "Action {} covered by {}/{} publishers",
            id,
            breakdown.len(),
            publishers.len()
        );
        Ok(breakdown)
    }

    async fn lookup(
        &self,
        publisher: &Publisher,
        id: &str,
        date: NaiveDate,
    ) -> Result<Option<PublisherBreakdown>, DetailError> {
        let actions = match self.api.publisher_actions(date, &publisher.id).await {
            Ok(actions) => actions,
            Err(FetchError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(actions
            .into_iter()
            .find(|a| a.id.as_deref() == Some(id))
            .map(|a| PublisherBreakdown {
                publisher_id: publisher.id.clone(),
                name: publisher.name.clone(),
                leaning: publisher.leaning,
                coverage_share: a.coverage_share,
                agreement: a.agreement,
            }))
    }
}
