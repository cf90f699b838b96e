//! UI-facing match state and its reducer.
//!
//! All state changes go through [`reduce`], a pure function from the current
//! state and an [`Action`] to the next state. I/O happens in the session
//! coordinator, which dispatches actions describing its results.

use std::sync::Arc;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};

use crate::catalog::DashboardRecord;
use crate::embeddings::{Similarity, StoredEmbedding};

pub const EMBEDDINGS_ERROR: &str = "Error loading embeddings";
pub const MATCHES_ERROR: &str = "Failed to get matching dashboards";
pub const DASHBOARD_ERROR: &str = "Unable to load dashboard.";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardMatchState {
    pub loading_embeddings: bool,
    pub embeddings: Arc<Vec<StoredEmbedding>>,
    pub query: String,
    pub loading_matches: bool,
    pub matches: Vec<Similarity>,
    pub selected_dashboard_id: Option<String>,
    pub current_dashboard: Option<DashboardRecord>,
    /// Empty when there is no error
    pub error_message: String,
}

impl DashboardMatchState {
    pub fn has_error(&self) -> bool {
        !self.error_message.is_empty()
    }
}

/// Partial state for one-off field updates. `None` leaves a field alone;
/// `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatePatch {
    #[serde(default)]
    pub loading_embeddings: Option<bool>,
    #[serde(default)]
    pub embeddings: Option<Arc<Vec<StoredEmbedding>>>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub loading_matches: Option<bool>,
    #[serde(default)]
    pub matches: Option<Vec<Similarity>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub selected_dashboard_id: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub current_dashboard: Option<Option<DashboardRecord>>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// A key that is present, `null` included, becomes `Some`
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl StatePatch {
    pub fn query(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Default::default()
        }
    }

    pub fn current_dashboard(dashboard: DashboardRecord) -> Self {
        Self {
            current_dashboard: Some(Some(dashboard)),
            ..Default::default()
        }
    }

    fn apply(self, mut state: DashboardMatchState) -> DashboardMatchState {
        if let Some(v) = self.loading_embeddings {
            state.loading_embeddings = v;
        }
        if let Some(v) = self.embeddings {
            state.embeddings = v;
        }
        if let Some(v) = self.query {
            state.query = v;
        }
        if let Some(v) = self.loading_matches {
            state.loading_matches = v;
        }
        if let Some(v) = self.matches {
            state.matches = v;
        }
        if let Some(v) = self.selected_dashboard_id {
            state.selected_dashboard_id = v;
        }
        if let Some(v) = self.current_dashboard {
            state.current_dashboard = v;
        }
        if let Some(v) = self.error_message {
            state.error_message = v;
        }
        state
    }
}

/// Everything that can happen to the match state.
///
/// Serialized as `{"type": "EMBEDDINGS_READY", "payload": {...}}`. Types this
/// version does not know deserialize to [`Action::Unknown`] whatever their
/// payload; a missing or `null` payload reads as an empty one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    EmbeddingsLoad,
    EmbeddingsReady {
        embeddings: Arc<Vec<StoredEmbedding>>,
    },
    EmbeddingsFail,
    MatchesLoad,
    MatchesComplete {
        matches: Vec<Similarity>,
    },
    MatchesFail,
    FailToFindDashboard,
    SetSelectedDashboardId {
        id: String,
    },
    SetState(StatePatch),
    Unknown,
}

#[derive(Deserialize)]
struct WireAction {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: serde_json::Value,
}

#[derive(Default, Deserialize)]
struct EmbeddingsPayload {
    #[serde(default)]
    embeddings: Arc<Vec<StoredEmbedding>>,
}

#[derive(Default, Deserialize)]
struct MatchesPayload {
    #[serde(default)]
    matches: Vec<Similarity>,
}

#[derive(Deserialize)]
struct SelectPayload {
    id: String,
}

fn payload<T: DeserializeOwned + Default>(value: serde_json::Value) -> serde_json::Result<T> {
    if value.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(value)
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let WireAction { kind, payload: raw } = WireAction::deserialize(deserializer)?;
        let action = match kind.as_str() {
            "EMBEDDINGS_LOAD" => Action::EmbeddingsLoad,
            "EMBEDDINGS_READY" => {
                let p: EmbeddingsPayload = payload(raw).map_err(D::Error::custom)?;
                Action::EmbeddingsReady {
                    embeddings: p.embeddings,
                }
            }
            "EMBEDDINGS_FAIL" => Action::EmbeddingsFail,
            "MATCHES_LOAD" => Action::MatchesLoad,
            "MATCHES_COMPLETE" => {
                let p: MatchesPayload = payload(raw).map_err(D::Error::custom)?;
                Action::MatchesComplete { matches: p.matches }
            }
            "MATCHES_FAIL" => Action::MatchesFail,
            "FAIL_TO_FIND_DASHBOARD" => Action::FailToFindDashboard,
            "SET_SELECTED_DASHBOARD_ID" => {
                let p: SelectPayload = serde_json::from_value(raw).map_err(D::Error::custom)?;
                Action::SetSelectedDashboardId { id: p.id }
            }
            "SET_STATE" => Action::SetState(payload(raw).map_err(D::Error::custom)?),
            _ => Action::Unknown,
        };
        Ok(action)
    }
}

pub fn reduce(state: DashboardMatchState, action: Action) -> DashboardMatchState {
    match action {
        Action::EmbeddingsLoad => DashboardMatchState {
            error_message: String::new(),
            loading_embeddings: true,
            ..state
        },
        Action::EmbeddingsReady { embeddings } => DashboardMatchState {
            loading_embeddings: false,
            embeddings,
            ..state
        },
        Action::EmbeddingsFail => DashboardMatchState {
            error_message: EMBEDDINGS_ERROR.to_string(),
            loading_embeddings: false,
            embeddings: Arc::default(),
            ..state
        },
        Action::MatchesLoad => DashboardMatchState {
            loading_matches: true,
            matches: Vec::new(),
            error_message: String::new(),
            ..state
        },
        Action::MatchesComplete { matches } => DashboardMatchState {
            loading_matches: false,
            matches,
            ..state
        },
        Action::MatchesFail => DashboardMatchState {
            loading_matches: false,
            matches: Vec::new(),
            error_message: MATCHES_ERROR.to_string(),
            ..state
        },
        Action::FailToFindDashboard => DashboardMatchState {
            current_dashboard: None,
            error_message: DASHBOARD_ERROR.to_string(),
            selected_dashboard_id: None,
            ..state
        },
        Action::SetSelectedDashboardId { id } => DashboardMatchState {
            selected_dashboard_id: Some(id),
            current_dashboard: None,
            error_message: String::new(),
            ..state
        },
        // One-off field updates
        Action::SetState(patch) => patch.apply(state),
        Action::Unknown => state,
    }
}
