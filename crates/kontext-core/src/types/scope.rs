//! Group scope: the partition key for one logical memory space.

use serde::{Deserialize, Serialize};

use crate::error::{KontextError, KontextResult};

/// Identifies the memory partition an operation targets. Exactly one of the
/// three identifiers is used as the group key, resolved in declaration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupScope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl GroupScope {
    /// Create a user-scoped group.
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Default::default()
        }
    }

    /// Create an agent-scoped group.
    pub fn agent(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: Some(agent_id.into()),
            ..Default::default()
        }
    }

    /// Create a session-scoped group.
    pub fn session(session_id: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            ..Default::default()
        }
    }

    /// Resolve the group key: first present of user_id, agent_id, session_id.
    pub fn group_id(&self) -> KontextResult<&str> {
        self.user_id
            .as_deref()
            .or(self.agent_id.as_deref())
            .or(self.session_id.as_deref())
            .ok_or_else(|| {
                KontextError::validation(
                    "At least one of 'user_id', 'agent_id', or 'session_id' is required",
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_scope_is_rejected() {
        let scope = GroupScope::default();
        assert!(scope.group_id().is_err());
    }

    #[test]
    fn test_user_id_wins_over_agent_id() {
        let scope = GroupScope {
            user_id: Some("u1".into()),
            agent_id: Some("a1".into()),
            session_id: None,
        };
        assert_eq!(scope.group_id().unwrap(), "u1");
    }

    #[test]
    fn test_session_only_scope_resolves() {
        let scope = GroupScope::session("s1");
        assert_eq!(scope.group_id().unwrap(), "s1");
    }
}
