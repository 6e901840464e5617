//! Joins the independently settable filter dimensions into one [`FilterQuery`].

use chrono::NaiveDate;
use tokio::sync::mpsc;

use crate::model::{FilterQuery, PoliticalGroup};

/// Latest-value join over date, publisher and group.
///
/// Every setter recomposes from the latest value of all three fields. A new
/// query is published only when it differs from the previous one, so each
/// subscriber sees exactly one notification per distinct composed query.
#[derive(Debug)]
pub struct FilterComposer {
    date: NaiveDate,
    publisher_id: Option<String>,
    group: PoliticalGroup,
    composed: FilterQuery,
    subscribers: Vec<mpsc::UnboundedSender<FilterQuery>>,
}

impl FilterComposer {
    /// Seeds the composer with `date`, no publisher and all groups.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            publisher_id: None,
            group: PoliticalGroup::All,
            composed: FilterQuery::seeded(date),
            subscribers: Vec::new(),
        }
    }

    pub fn current(&self) -> &FilterQuery {
        &self.composed
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn publisher_id(&self) -> Option<&str> {
        self.publisher_id.as_deref()
    }

    pub fn group(&self) -> PoliticalGroup {
        self.group
    }

    pub fn set_date(&mut self, date: NaiveDate) -> Option<FilterQuery> {
        self.date = date;
        self.recompose()
    }

    /// Selects a publisher; `None` or an empty id clears the selection.
    pub fn set_publisher(&mut self, publisher_id: Option<&str>) -> Option<FilterQuery> {
        self.publisher_id = publisher_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        self.recompose()
    }

    pub fn set_group(&mut self, group: PoliticalGroup) -> Option<FilterQuery> {
        self.group = group;
        self.recompose()
    }

    /// Resets to the seeded query for `date`, keeping existing subscribers.
    pub fn reseed(&mut self, date: NaiveDate) -> Option<FilterQuery> {
        self.date = date;
        self.publisher_id = None;
        self.group = PoliticalGroup::All;
        self.recompose()
    }

    /// Receives the current composed query immediately, then every distinct
    /// query after it.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<FilterQuery> {
        let (tx, rx) = mpsc::unbounded_channel();
        // receiver is alive, cannot fail
        let _ = tx.send(self.composed.clone());
        self.subscribers.push(tx);
        rx
    }

    fn recompose(&mut self) -> Option<FilterQuery> {
        let next = FilterQuery {
            date: self.date,
            publisher_id: self.publisher_id.clone(),
            group: self.group,
        };
        if next == self.composed {
            return None;
        }

        log::debug!("Filter changed: {} -> {}", self.composed, next);
        self.composed = next.clone();
        self.subscribers.retain(|tx| tx.send(next.clone()).is_ok());
        Some(next)
    }
}
