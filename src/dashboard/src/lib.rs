//! Filter composition, fetch orchestration and aggregation behind the actions
//! dashboard.
//!
//! Filter changes flow one way: [`filter::FilterComposer`] joins the filter
//! dimensions of a [`panel::Panel`], the [`panel::Dashboard`] fetches the
//! composed query through the [`fetch::FetchOrchestrator`], and the
//! [`metrics`] functions turn the resulting actions into view models.

pub mod api;
pub mod detail;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod metrics;
pub mod model;
pub mod panel;
pub mod reference;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use api::DashboardApi;
pub use detail::{DetailError, DetailResolver, DetailView, Strategy, action_key};
pub use error::FetchError;
pub use fetch::FetchOrchestrator;
pub use filter::FilterComposer;
pub use model::{
    Action, Agreement, FilterQuery, Leaning, PoliticalGroup, Publisher, PublisherBreakdown,
};
pub use panel::{Dashboard, FetchState, Panel, PanelError, PanelId, PanelSnapshot};
pub use reference::ReferenceData;
