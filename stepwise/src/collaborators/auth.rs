//! Caller identity attached to a workflow run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// The user context produced by the auth collaborator for an inbound request.
///
/// The executor carries it in the workflow context without inspecting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    /// The client the request acts for.
    pub client_id: String,
    /// The session that issued the request.
    pub session_id: Uuid,
    /// Granted access scopes.
    #[serde(default)]
    pub scopes: BTreeSet<String>,
}

impl UserContext {
    /// Creates a user context with no scopes.
    #[must_use]
    pub fn new(client_id: impl Into<String>, session_id: Uuid) -> Self {
        Self {
            client_id: client_id.into(),
            session_id,
            scopes: BTreeSet::new(),
        }
    }

    /// Adds a scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.insert(scope.into());
        self
    }

    /// Returns true if the scope was granted.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }
}
