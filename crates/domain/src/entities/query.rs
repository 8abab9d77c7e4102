//! User query entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{QueryId, SessionId};

/// Usage mode a query is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Direct side-by-side model comparison
    Arena,
    /// Agentic deep-reasoning pipeline
    Swarm,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Arena => write!(f, "arena"),
            Self::Swarm => write!(f, "swarm"),
        }
    }
}

impl std::str::FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "arena" => Ok(Self::Arena),
            "swarm" => Ok(Self::Swarm),
            _ => Err(format!("Invalid run mode: {s}. Use 'arena' or 'swarm'")),
        }
    }
}

/// An immutable user request, created once per orchestrator invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Unique query identifier
    pub id: QueryId,
    /// Raw query text
    pub text: String,
    /// Requested usage mode
    pub mode: RunMode,
    /// Optional session/context the query belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionId>,
    /// When the query was submitted
    pub submitted_at: DateTime<Utc>,
}

impl Query {
    /// Create a new query, rejecting empty text
    pub fn new(text: impl Into<String>, mode: RunMode) -> Result<Self, DomainError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(DomainError::EmptyQuery);
        }
        Ok(Self {
            id: QueryId::new(),
            text,
            mode,
            session: None,
            submitted_at: Utc::now(),
        })
    }

    /// Attach a session id
    pub fn with_session(mut self, session: SessionId) -> Self {
        self.session = Some(session);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_query_has_mode_and_text() {
        let query = Query::new("What causes seasons?", RunMode::Swarm).unwrap();
        assert_eq!(query.text, "What causes seasons?");
        assert_eq!(query.mode, RunMode::Swarm);
        assert!(query.session.is_none());
    }

    #[test]
    fn empty_query_rejected() {
        assert_eq!(
            Query::new("  ", RunMode::Arena),
            Err(DomainError::EmptyQuery)
        );
    }

    #[test]
    fn with_session_attaches_id() {
        let session = SessionId::new();
        let query = Query::new("hi", RunMode::Arena).unwrap().with_session(session);
        assert_eq!(query.session, Some(session));
    }

    #[test]
    fn run_mode_parses_case_insensitive() {
        assert_eq!("Arena".parse::<RunMode>().unwrap(), RunMode::Arena);
        assert_eq!("swarm".parse::<RunMode>().unwrap(), RunMode::Swarm);
        assert!("battle".parse::<RunMode>().is_err());
    }

    #[test]
    fn run_mode_display() {
        assert_eq!(RunMode::Arena.to_string(), "arena");
        assert_eq!(RunMode::Swarm.to_string(), "swarm");
    }
}
