//! A single comparison panel: its filters, fetch lifecycle and result set.

pub mod manager;

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::{mpsc, watch};

use crate::error::FetchError;
use crate::filter::FilterComposer;
use crate::metrics::{ActionView, PanelSummary, action_views};
use crate::model::{Action, FilterQuery, PoliticalGroup};

pub use manager::{Dashboard, MAX_PANELS, PanelError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PanelId {
    #[serde(rename = "panel-1")]
    First,
    #[serde(rename = "panel-2")]
    Second,
}

impl PanelId {
    pub fn as_str(&self) -> &'static str {
        match self {
            PanelId::First => "panel-1",
            PanelId::Second => "panel-2",
        }
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Observable state of a panel.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PanelSnapshot {
    pub id: PanelId,
    pub query: FilterQuery,
    pub state: FetchState,
    pub actions: Vec<Action>,
    pub error_message: Option<String>,
}

impl PanelSnapshot {
    pub fn views(&self) -> Vec<ActionView> {
        action_views(&self.actions)
    }

    pub fn summary(&self) -> PanelSummary {
        PanelSummary::from_actions(&self.actions)
    }
}

/// Identifies one issued fetch. Only the ticket carrying the panel's current
/// generation may change its state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadTicket {
    pub panel: PanelId,
    pub generation: u64,
    pub query: FilterQuery,
}

/// One panel. Owns its filter composer and result set exclusively.
///
/// The panel never performs I/O. Each query change hands back a [`LoadTicket`]
/// that the owner fetches and feeds to [`Panel::apply`].
#[derive(Debug)]
pub struct Panel {
    id: PanelId,
    composer: FilterComposer,
    actions: Vec<Action>,
    state: FetchState,
    error_message: Option<String>,
    generation: u64,
    snapshots: watch::Sender<PanelSnapshot>,
}

impl Panel {
    /// A new idle panel on `date`. Tickets issued by it start above
    /// `generation_floor`.
    pub fn new(id: PanelId, date: NaiveDate, generation_floor: u64) -> Self {
        let composer = FilterComposer::new(date);
        let (snapshots, _) = watch::channel(PanelSnapshot {
            id,
            query: composer.current().clone(),
            state: FetchState::Idle,
            actions: Vec::new(),
            error_message: None,
        });
        Self {
            id,
            composer,
            actions: Vec::new(),
            state: FetchState::Idle,
            error_message: None,
            generation: generation_floor,
            snapshots,
        }
    }

    /// A fresh canonical panel 1 on `date` that keeps `previous`'s snapshot
    /// and filter observers. Filter observers receive the reseeded query.
    pub(crate) fn rebuild_from(previous: Panel, date: NaiveDate, generation_floor: u64) -> Self {
        let Panel {
            mut composer,
            snapshots,
            ..
        } = previous;
        composer.reseed(date);

        let panel = Self {
            id: PanelId::First,
            composer,
            actions: Vec::new(),
            state: FetchState::Idle,
            error_message: None,
            generation: generation_floor,
            snapshots,
        };
        panel.publish();
        panel
    }

    pub fn id(&self) -> PanelId {
        self.id
    }

    pub fn query(&self) -> &FilterQuery {
        self.composer.current()
    }

    pub fn date(&self) -> NaiveDate {
        self.composer.date()
    }

    pub fn state(&self) -> FetchState {
        self.state
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn snapshot(&self) -> PanelSnapshot {
        PanelSnapshot {
            id: self.id,
            query: self.composer.current().clone(),
            state: self.state,
            actions: self.actions.clone(),
            error_message: self.error_message.clone(),
        }
    }

    /// Observe every state change of this panel.
    pub fn subscribe(&self) -> watch::Receiver<PanelSnapshot> {
        self.snapshots.subscribe()
    }

    /// Observe the composed filter query of this panel.
    pub fn subscribe_filters(&mut self) -> mpsc::UnboundedReceiver<FilterQuery> {
        self.composer.subscribe()
    }

    pub fn set_date(&mut self, date: NaiveDate) -> Option<LoadTicket> {
        self.composer.set_date(date)?;
        Some(self.begin_load())
    }

    pub fn set_publisher(&mut self, publisher_id: Option<&str>) -> Option<LoadTicket> {
        self.composer.set_publisher(publisher_id)?;
        Some(self.begin_load())
    }

    pub fn set_group(&mut self, group: PoliticalGroup) -> Option<LoadTicket> {
        self.composer.set_group(group)?;
        Some(self.begin_load())
    }

    /// Move to `Loading` for the current composed query, superseding any
    /// ticket issued before.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.state = FetchState::Loading;
        self.error_message = None;
        log::debug!(
            "{} loading {} (generation {})",
            self.id,
            self.composer.current(),
            self.generation
        );
        self.publish();
        LoadTicket {
            panel: self.id,
            generation: self.generation,
            query: self.composer.current().clone(),
        }
    }

    /// Re-issue the current query after a failure. No-op unless in `Error`.
    pub fn retry(&mut self) -> Option<LoadTicket> {
        if self.state != FetchState::Error {
            return None;
        }
        Some(self.begin_load())
    }

    /// Apply a fetch result. Returns `false` and leaves the panel untouched
    /// when `ticket` has been superseded.
    pub fn apply(&mut self, ticket: &LoadTicket, result: Result<Vec<Action>, FetchError>) -> bool {
        if ticket.panel != self.id
            || ticket.generation != self.generation
            || self.state != FetchState::Loading
        {
            log::debug!(
                "{} discarding stale response for generation {} (current {})",
                self.id,
                ticket.generation,
                self.generation
            );
            return false;
        }

        match result {
            Ok(actions) => {
                log::debug!("{} loaded {} actions", self.id, actions.len());
                self.actions = actions;
                self.state = FetchState::Success;
                self.error_message = None;
            }
            Err(e) => {
                log::debug!("{} failed: {}", self.id, e);
                self.actions.clear();
                self.state = FetchState::Error;
                self.error_message = Some(e.user_message().into_owned());
            }
        }
        self.publish();
        true
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }
}
