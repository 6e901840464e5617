//! The panel collection: one panel, or two side by side.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use common::config::DashboardConfig;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::{FetchState, LoadTicket, Panel, PanelId, PanelSnapshot};
use crate::api::DashboardApi;
use crate::error::FetchError;
use crate::model::{Action, FilterQuery, PoliticalGroup};

/// Upper bound on simultaneously open panels.
pub const MAX_PANELS: usize = 2;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PanelError {
    #[error("at most two panels can be open")]
    LimitReached,

    #[error("no such panel: {0}")]
    UnknownPanel(PanelId),

    #[error("the last remaining panel cannot be removed")]
    CannotRemoveLastPanel,
}

type Completion = (LoadTicket, Result<Vec<Action>, FetchError>);

/// Owns the panels and drives their fetches.
///
/// Each panel has at most one fetch task in flight; issuing a new query
/// aborts the previous task and bumps the panel's generation, so a late
/// response can never overwrite a newer one. Results are applied in
/// [`Dashboard::next_update`].
pub struct Dashboard {
    api: Arc<DashboardApi>,
    panels: Vec<Panel>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: HashMap<PanelId, JoinHandle<()>>,
    high_water: u64,
    agreement_tolerance: f64,
}

impl Dashboard {
    /// Opens panel 1 on the configured session date and starts its first load.
    ///
    /// Must be called within a tokio runtime.
    pub fn new(api: Arc<DashboardApi>, config: &DashboardConfig) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let mut dashboard = Self {
            api,
            panels: vec![Panel::new(PanelId::First, config.default_date, 0)],
            completions_tx,
            completions_rx,
            in_flight: HashMap::new(),
            high_water: 0,
            agreement_tolerance: config.agreement_tolerance,
        };
        let ticket = dashboard.panels[0].begin_load();
        dashboard.dispatch(ticket);
        dashboard
    }

    pub fn api(&self) -> &Arc<DashboardApi> {
        &self.api
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn panel(&self, id: PanelId) -> Result<&Panel, PanelError> {
        self.panels
            .iter()
            .find(|p| p.id() == id)
            .ok_or(PanelError::UnknownPanel(id))
    }

    fn panel_mut(&mut self, id: PanelId) -> Result<&mut Panel, PanelError> {
        self.panels
            .iter_mut()
            .find(|p| p.id() == id)
            .ok_or(PanelError::UnknownPanel(id))
    }

    pub fn snapshot(&self, id: PanelId) -> Result<PanelSnapshot, PanelError> {
        Ok(self.panel(id)?.snapshot())
    }

    pub fn subscribe(&self, id: PanelId) -> Result<watch::Receiver<PanelSnapshot>, PanelError> {
        Ok(self.panel(id)?.subscribe())
    }

    /// Distinct composed queries of a panel, starting with the current one.
    ///
    /// Observers of panel 1 stay subscribed when it is rebuilt by
    /// [`Dashboard::remove_panel`].
    pub fn subscribe_filters(
        &mut self,
        id: PanelId,
    ) -> Result<mpsc::UnboundedReceiver<FilterQuery>, PanelError> {
        Ok(self.panel_mut(id)?.subscribe_filters())
    }

    pub fn is_split(&self) -> bool {
        self.panels.len() > 1
    }

    /// Header shown above a panel.
    pub fn title(&self, id: PanelId) -> &'static str {
        match (self.is_split(), id) {
            (false, _) => "Dashboard",
            (true, PanelId::First) => "All Publishers",
            (true, PanelId::Second) => "Filtered View",
        }
    }

    /// Opens panel 2 on panel 1's current date with default publisher/group
    /// filters and starts its load.
    pub fn add_panel(&mut self) -> Result<PanelId, PanelError> {
        if self.panels.len() >= MAX_PANELS {
            return Err(PanelError::LimitReached);
        }
        let date = self.panel(PanelId::First)?.date();
        let mut panel = Panel::new(PanelId::Second, date, self.high_water);
        let ticket = panel.begin_load();
        self.panels.push(panel);
        self.dispatch(ticket);
        log::info!("Opened {} on {}", PanelId::Second, date);
        Ok(PanelId::Second)
    }

    /// Removes `id` and rebuilds the survivor as a fresh panel 1.
    ///
    /// The rebuilt panel carries the surviving panel's date only; its
    /// publisher and group filters are reset and it reloads.
    pub fn remove_panel(&mut self, id: PanelId) -> Result<(), PanelError> {
        self.panel(id)?;
        if self.panels.len() == 1 {
            return Err(PanelError::CannotRemoveLastPanel);
        }

        let survivor_date: NaiveDate = self
            .panels
            .iter()
            .find(|p| p.id() != id)
            .map(Panel::date)
            .ok_or(PanelError::CannotRemoveLastPanel)?;

        let first_index = self
            .panels
            .iter()
            .position(|p| p.id() == PanelId::First)
            .ok_or(PanelError::UnknownPanel(PanelId::First))?;

        for (_, task) in self.in_flight.drain() {
            task.abort();
        }

        let first = self.panels.swap_remove(first_index);
        self.panels.clear();
        let mut rebuilt = Panel::rebuild_from(first, survivor_date, self.high_water);
        let ticket = rebuilt.begin_load();
        self.panels = vec![rebuilt];
        self.dispatch(ticket);
        log::info!(
            "Removed {}, {} rebuilt on {}",
            id,
            PanelId::First,
            survivor_date
        );
        Ok(())
    }

    /// Opens panel 2 in single view, closes it in split view.
    pub fn toggle_split(&mut self) -> Result<(), PanelError> {
        if self.is_split() {
            self.remove_panel(PanelId::Second)
        } else {
            self.add_panel().map(|_| ())
        }
    }

    /// Returns whether a new fetch was issued.
    pub fn set_date(&mut self, id: PanelId, date: NaiveDate) -> Result<bool, PanelError> {
        let ticket = self.panel_mut(id)?.set_date(date);
        Ok(self.dispatch_opt(ticket))
    }

    /// Returns whether a new fetch was issued.
    pub fn set_publisher(
        &mut self,
        id: PanelId,
        publisher_id: Option<&str>,
    ) -> Result<bool, PanelError> {
        let ticket = self.panel_mut(id)?.set_publisher(publisher_id);
        Ok(self.dispatch_opt(ticket))
    }

    /// Returns whether a new fetch was issued.
    pub fn set_group(&mut self, id: PanelId, group: PoliticalGroup) -> Result<bool, PanelError> {
        let ticket = self.panel_mut(id)?.set_group(group);
        Ok(self.dispatch_opt(ticket))
    }

    /// Re-fetches the current query of a panel in `Error`. Returns whether a
    /// fetch was issued.
    pub fn retry(&mut self, id: PanelId) -> Result<bool, PanelError> {
        let ticket = self.panel_mut(id)?.retry();
        Ok(self.dispatch_opt(ticket))
    }

    fn dispatch_opt(&mut self, ticket: Option<LoadTicket>) -> bool {
        match ticket {
            Some(ticket) => {
                self.dispatch(ticket);
                true
            }
            None => false,
        }
    }

    fn dispatch(&mut self, ticket: LoadTicket) {
        self.high_water = self.high_water.max(ticket.generation);

        let api = self.api.clone();
        let tx = self.completions_tx.clone();
        let panel = ticket.panel;
        let task = tokio::spawn(async move {
            let result = api.top_actions(&ticket.query).await;
            // receiver lives as long as the dashboard
            let _ = tx.send((ticket, result));
        });

        if let Some(previous) = self.in_flight.insert(panel, task) {
            previous.abort();
        }
    }

    /// Waits for the next fetch that changes a panel's state and applies it.
    ///
    /// Returns the updated panel, or `None` once no panel is loading.
    pub async fn next_update(&mut self) -> Option<PanelId> {
        loop {
            if !self.panels.iter().any(|p| p.state() == FetchState::Loading) {
                return None;
            }

            let (ticket, result) = self.completions_rx.recv().await?;
            let tolerance = self.agreement_tolerance;
            let Some(panel) = self.panels.iter_mut().find(|p| p.id() == ticket.panel) else {
                log::debug!("Dropping response for closed {}", ticket.panel);
                continue;
            };

            if panel.apply(&ticket, result) {
                self.in_flight.remove(&ticket.panel);
                report_agreement_drift(panel, tolerance);
                return Some(ticket.panel);
            }
        }
    }

    /// Applies results until every panel has left `Loading`.
    pub async fn settle(&mut self) {
        while self.next_update().await.is_some() {}
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        for (_, task) in self.in_flight.drain() {
            task.abort();
        }
    }
}

/// Agreement triples are kept as received; drift is only reported.
fn report_agreement_drift(panel: &Panel, tolerance: f64) {
    for action in panel.actions() {
        let drift = action.agreement.drift();
        if drift > tolerance {
            log::warn!(
                "{}: agreement for '{}' sums to {:.3} (tolerance {})",
                panel.id(),
                action.description,
                action.agreement.total(),
                tolerance
            );
        }
    }
}
