//! Display metrics derived from an already-fetched action set.
//!
//! Everything here is pure. Coverage comparisons are only meaningful within
//! one result set; mixing actions from different queries is a caller error.

use serde::Serialize;

use crate::model::{Action, Agreement};

/// Scores strictly above this are classified Republican.
pub const REPUBLICAN_THRESHOLD: f64 = 0.2;
/// Scores strictly below this are classified Democrat.
pub const DEMOCRAT_THRESHOLD: f64 = -0.2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum PoliticalClass {
    Republican,
    Democrat,
    Center,
}

impl PoliticalClass {
    /// Classify a political score. Boundary values and NaN are `Center`.
    pub fn from_score(score: f64) -> Self {
        if score > REPUBLICAN_THRESHOLD {
            PoliticalClass::Republican
        } else if score < DEMOCRAT_THRESHOLD {
            PoliticalClass::Democrat
        } else {
            PoliticalClass::Center
        }
    }

    /// Single-letter badge.
    pub fn label(&self) -> &'static str {
        match self {
            PoliticalClass::Republican => "R",
            PoliticalClass::Democrat => "D",
            PoliticalClass::Center => "C",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            PoliticalClass::Republican => "republican",
            PoliticalClass::Democrat => "democrat",
            PoliticalClass::Center => "center",
        }
    }
}

pub fn political_class(action: &Action) -> PoliticalClass {
    PoliticalClass::from_score(action.political_score)
}

fn max_share(shares: impl Iterator<Item = f64>) -> f64 {
    // f64::max ignores NaN operands
    shares.fold(0.0, f64::max)
}

fn relative_to_max(share: f64, max: f64) -> f64 {
    if max > 0.0 && !share.is_nan() {
        (share / max * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Coverage of `action` relative to the largest coverage in `all`, in `[0, 100]`.
pub fn coverage_percent(action: &Action, all: &[Action]) -> f64 {
    let max = max_share(all.iter().map(|a| a.coverage_share));
    relative_to_max(action.coverage_share, max)
}

/// Integer coverage figure shown next to each bar (share x 1000, rounded).
pub fn coverage_display(action: &Action) -> u32 {
    // float-to-int `as` saturates; negative noise becomes 0
    (action.coverage_share * 1000.0).round() as u32
}

/// Bar width for the detail view.
///
/// Unscaled bars (and bars without a comparison set) show the raw share as a
/// percentage; scaled bars are relative to the largest share in `all`.
pub fn coverage_width(share: f64, all: &[f64], scale_to_max: bool) -> f64 {
    if !scale_to_max || all.is_empty() {
        if share.is_nan() {
            return 0.0;
        }
        return (share * 100.0).clamp(0.0, 100.0);
    }
    relative_to_max(share, max_share(all.iter().copied()))
}

/// Arithmetic mean of political scores; 0 for an empty set.
///
/// Scores are summed in a canonical order so the result does not depend on
/// the order of `actions`.
pub fn average_score(actions: &[Action]) -> f64 {
    if actions.is_empty() {
        return 0.0;
    }
    let mut scores: Vec<f64> = actions.iter().map(|a| a.political_score).collect();
    scores.sort_by(f64::total_cmp);
    scores.iter().sum::<f64>() / scores.len() as f64
}

/// Position of the left(Democrat)-to-right(Republican) indicator, in `[0, 100]`.
pub fn slider_position(score: f64) -> f64 {
    let score = if score.is_nan() {
        0.0
    } else {
        score.clamp(-1.0, 1.0)
    };
    (score + 1.0) / 2.0 * 100.0
}

/// Display-ready row for one action.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActionView {
    pub description: String,
    pub coverage_percent: f64,
    pub coverage_display: u32,
    pub class: PoliticalClass,
    pub agreement: Agreement,
}

/// Build view rows for a whole result set, preserving order.
pub fn action_views(actions: &[Action]) -> Vec<ActionView> {
    let max = max_share(actions.iter().map(|a| a.coverage_share));
    actions
        .iter()
        .map(|action| ActionView {
            description: action.description.clone(),
            coverage_percent: relative_to_max(action.coverage_share, max),
            coverage_display: coverage_display(action),
            class: political_class(action),
            agreement: action.agreement,
        })
        .collect()
}

/// Aggregate figures for a panel header.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PanelSummary {
    pub average_score: f64,
    pub slider_position: f64,
    pub leaning: PoliticalClass,
    pub republican: usize,
    pub democrat: usize,
    pub center: usize,
}

impl PanelSummary {
    pub fn from_actions(actions: &[Action]) -> Self {
        let average = average_score(actions);
        let mut summary = Self {
            average_score: average,
            slider_position: slider_position(average),
            leaning: PoliticalClass::from_score(average),
            republican: 0,
            democrat: 0,
            center: 0,
        };
        for action in actions {
            match political_class(action) {
                PoliticalClass::Republican => summary.republican += 1,
                PoliticalClass::Democrat => summary.democrat += 1,
                PoliticalClass::Center => summary.center += 1,
            }
        }
        summary
    }
}

/// One horizontal bar in the detail view.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BarData {
    pub label: String,
    pub coverage_share: f64,
    pub coverage_width: f64,
    pub agreement: Agreement,
}
