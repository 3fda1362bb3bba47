//! The user behind an invocation, as far as authorization is concerned.

use crate::transport::ChatTransport;
use std::collections::HashSet;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    /// Role names, `None` when they could not be resolved.
    pub roles: Option<HashSet<String>>,
}

impl Caller {
    /// A caller whose roles were never looked up. Passes only ungated checks.
    pub fn unresolved(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            roles: None,
        }
    }

    pub fn with_roles<I, S>(user_id: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user_id: user_id.into(),
            roles: Some(roles.into_iter().map(Into::into).collect()),
        }
    }

    /// Look up the caller's roles in `guild_id`.
    ///
    /// Direct messages, unknown members and transport failures all leave the
    /// roles unresolved.
    pub async fn resolve(
        transport: &dyn ChatTransport,
        guild_id: Option<&str>,
        user_id: &str,
    ) -> Self {
        let Some(guild_id) = guild_id else {
            return Self::unresolved(user_id);
        };

        let roles = match transport.member_roles(guild_id, user_id).await {
            Ok(roles) => roles,
            Err(e) => {
                warn!("Could not resolve roles of {}: {}", user_id, e);
                None
            }
        };

        Self {
            user_id: user_id.to_string(),
            roles,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles
            .as_ref()
            .is_some_and(|roles| roles.contains(role))
    }
}
