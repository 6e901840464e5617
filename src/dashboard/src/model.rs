//! Records exchanged with the actions backend and the composed filter query.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wire format for calendar dates (`2025-07-26`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Partisan leaning of a publisher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Leaning {
    Republican,
    Democrat,
}

impl Leaning {
    pub fn as_str(&self) -> &'static str {
        match self {
            Leaning::Republican => "Republican",
            Leaning::Democrat => "Democrat",
        }
    }
}

impl fmt::Display for Leaning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Political group filter dimension.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoliticalGroup {
    #[default]
    All,
    Republican,
    Democrat,
}

impl PoliticalGroup {
    pub const ALL: [PoliticalGroup; 3] = [
        PoliticalGroup::All,
        PoliticalGroup::Republican,
        PoliticalGroup::Democrat,
    ];

    /// Value of the `group` query parameter; `All` is expressed by omission.
    pub fn as_param(&self) -> Option<&'static str> {
        match self {
            PoliticalGroup::All => None,
            PoliticalGroup::Republican => Some("Republican"),
            PoliticalGroup::Democrat => Some("Democrat"),
        }
    }

    /// Dropdown label.
    pub fn label(&self) -> &'static str {
        match self {
            PoliticalGroup::All => "All Publishers",
            PoliticalGroup::Republican => "Republican Publishers",
            PoliticalGroup::Democrat => "Democrat Publishers",
        }
    }
}

impl fmt::Display for PoliticalGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param().unwrap_or("All"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown political group '{0}' (expected all, republican or democrat)")]
pub struct ParseGroupError(pub String);

impl FromStr for PoliticalGroup {
    type Err = ParseGroupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(PoliticalGroup::All),
            "republican" | "r" => Ok(PoliticalGroup::Republican),
            "democrat" | "d" => Ok(PoliticalGroup::Democrat),
            _ => Err(ParseGroupError(s.to_string())),
        }
    }
}

/// Publisher sentiment toward an action.
///
/// The triple is expected to sum to roughly one but is carried through as
/// received; see [`Agreement::drift`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Agreement {
    pub support: f64,
    pub neutral: f64,
    pub oppose: f64,
}

impl Agreement {
    pub fn new(support: f64, neutral: f64, oppose: f64) -> Self {
        Self {
            support,
            neutral,
            oppose,
        }
    }

    pub fn total(&self) -> f64 {
        self.support + self.neutral + self.oppose
    }

    /// Distance of the triple's sum from one.
    pub fn drift(&self) -> f64 {
        (self.total() - 1.0).abs()
    }
}

impl From<[f64; 3]> for Agreement {
    fn from([support, neutral, oppose]: [f64; 3]) -> Self {
        Self::new(support, neutral, oppose)
    }
}

impl From<Agreement> for [f64; 3] {
    fn from(agreement: Agreement) -> Self {
        [agreement.support, agreement.neutral, agreement.oppose]
    }
}

/// A scored policy/news item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Stable backend identifier, when the backend provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "Description")]
    pub description: String,
    /// Fraction of total coverage within the query window
    #[serde(rename = "coverage")]
    pub coverage_share: f64,
    /// -1 (Democrat) ..= 1 (Republican)
    #[serde(rename = "Republican")]
    pub political_score: f64,
    pub agreement: Agreement,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publisher {
    pub id: String,
    pub name: String,
    pub leaning: Leaning,
}

/// Coverage and sentiment of a single publisher for one selected action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PublisherBreakdown {
    #[serde(rename = "id")]
    pub publisher_id: String,
    pub name: String,
    pub leaning: Leaning,
    #[serde(rename = "coverage")]
    pub coverage_share: f64,
    pub agreement: Agreement,
}

/// Canonical filter tuple. Equality of all three fields gates re-fetching.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct FilterQuery {
    pub date: NaiveDate,
    pub publisher_id: Option<String>,
    pub group: PoliticalGroup,
}

impl FilterQuery {
    /// Query for `date` with no publisher and all groups.
    pub fn seeded(date: NaiveDate) -> Self {
        Self {
            date,
            publisher_id: None,
            group: PoliticalGroup::All,
        }
    }

    /// Query parameters for `/topactions`.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("date".to_string(), format_param_date(self.date))];
        if let Some(publisher) = &self.publisher_id {
            params.push(("publisher".to_string(), publisher.clone()));
        }
        if let Some(group) = self.group.as_param() {
            params.push(("group".to_string(), group.to_string()));
        }
        params
    }
}

impl fmt::Display for FilterQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "date={} publisher={} group={}",
            format_param_date(self.date),
            self.publisher_id.as_deref().unwrap_or("-"),
            self.group
        )
    }
}

pub fn format_param_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn action_reads_backend_field_names() {
        let action: Action = serde_json::from_value(json!({
            "Description": "Action A",
            "Republican": 0.42,
            "coverage": 0.1234,
            "agreement": [0.5, 0.3, 0.2]
        }))
        .unwrap();

        assert_eq!(action.id, None);
        assert_eq!(action.description, "Action A");
        assert_eq!(action.political_score, 0.42);
        assert_eq!(action.coverage_share, 0.1234);
        assert_eq!(action.agreement, Agreement::new(0.5, 0.3, 0.2));
    }

    #[test]
    fn action_keeps_stable_id_when_present() {
        let action: Action = serde_json::from_value(json!({
            "id": "act-17",
            "Description": "Action Q",
            "Republican": -0.7,
            "coverage": 0.02,
            "agreement": [0.1, 0.1, 0.8]
        }))
        .unwrap();

        assert_eq!(action.id.as_deref(), Some("act-17"));
        let back = serde_json::to_value(&action).unwrap();
        assert_eq!(back["agreement"], json!([0.1, 0.1, 0.8]));
        assert_eq!(back["Description"], "Action Q");
    }

    #[test]
    fn agreement_rejects_wrong_arity() {
        let result: Result<Agreement, _> = serde_json::from_value(json!([0.5, 0.5]));
        assert!(result.is_err());
    }

    #[test]
    fn agreement_drift_is_a_signal_not_a_correction() {
        let agreement = Agreement::new(0.5, 0.3, 0.3);
        assert!((agreement.drift() - 0.1).abs() < 1e-9);
        // untouched
        assert_eq!(agreement.oppose, 0.3);
    }

    #[test]
    fn publisher_leaning_round_trips_as_text() {
        let publisher: Publisher = serde_json::from_value(json!({
            "id": "pub_dem_3",
            "name": "Democrat Publisher 3",
            "leaning": "Democrat"
        }))
        .unwrap();
        assert_eq!(publisher.leaning, Leaning::Democrat);
    }

    #[test]
    fn filter_query_params_omit_defaults() {
        let query = FilterQuery::seeded(date(2025, 7, 26));
        assert_eq!(
            query.to_params(),
            vec![("date".to_string(), "2025-07-26".to_string())]
        );

        let query = FilterQuery {
            date: date(2025, 8, 1),
            publisher_id: Some("pub_rep_4".to_string()),
            group: PoliticalGroup::Democrat,
        };
        assert_eq!(
            query.to_params(),
            vec![
                ("date".to_string(), "2025-08-01".to_string()),
                ("publisher".to_string(), "pub_rep_4".to_string()),
                ("group".to_string(), "Democrat".to_string()),
            ]
        );
    }

    #[test]
    fn filter_query_equality_covers_all_fields() {
        let base = FilterQuery::seeded(date(2025, 7, 26));
        let mut other = base.clone();
        assert_eq!(base, other);

        other.group = PoliticalGroup::Republican;
        assert_ne!(base, other);
    }

    #[test]
    fn political_group_parsing() {
        assert_eq!("all".parse::<PoliticalGroup>().unwrap(), PoliticalGroup::All);
        assert_eq!(
            "Republican".parse::<PoliticalGroup>().unwrap(),
            PoliticalGroup::Republican
        );
        assert_eq!("d".parse::<PoliticalGroup>().unwrap(), PoliticalGroup::Democrat);
        assert!("green".parse::<PoliticalGroup>().is_err());
    }

    #[test]
    fn parse_date_accepts_wire_format() {
        assert_eq!(parse_date("2025-07-26").unwrap(), date(2025, 7, 26));
        assert!(parse_date("07/26/2025").is_err());
    }
}
