use std::sync::Arc;

use bson::oid::ObjectId;
use tracing::{debug, warn};

use super::directory::Directory;

pub const UNKNOWN_USER: &str = "Unknown User";
pub const UNKNOWN_PROJECT: &str = "Unknown Project";

/// Display-name policy when every lookup source misses. One policy per
/// deployment, injected from settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackStyle {
    /// Fixed "Unknown User" / "Unknown Project".
    #[default]
    Sentinel,
    /// Truncated-id placeholder, e.g. `User 12ab34cd...`.
    TruncatedId,
}

impl FallbackStyle {
    pub fn parse(value: &str) -> Self {
        match value {
            "sentinel" => Self::Sentinel,
            "truncated_id" => Self::TruncatedId,
            other => {
                warn!(%other, "Unknown fallback_style, using sentinel");
                Self::Sentinel
            }
        }
    }

    fn user_fallback(&self, id: &str) -> String {
        match self {
            Self::Sentinel => UNKNOWN_USER.to_string(),
            Self::TruncatedId => truncated("User", id),
        }
    }

    fn project_fallback(&self, id: &ObjectId) -> String {
        match self {
            Self::Sentinel => UNKNOWN_PROJECT.to_string(),
            Self::TruncatedId => truncated("Project", &id.to_hex()),
        }
    }
}

fn truncated(prefix: &str, id: &str) -> String {
    let short: String = id.chars().take(8).collect();
    format!("{prefix} {short}...")
}

/// Resolves user and project identifiers to display names through an
/// ordered chain of lookup sources. The same logical person may exist as
/// a user record keyed by the external auth id, the same record keyed by
/// its own id, or a self-registration profile keyed by the auth id.
pub struct NameResolver {
    directory: Arc<dyn Directory>,
    fallback: FallbackStyle,
}

impl NameResolver {
    pub fn new(directory: Arc<dyn Directory>, fallback: FallbackStyle) -> Self {
        Self {
            directory,
            fallback,
        }
    }

    /// Tries each source in priority order. Lookup failures never
    /// propagate: a miss or a store error falls through to the next
    /// source, and exhaustion degrades to the configured fallback.
    pub async fn resolve_user_name(&self, id: &str) -> String {
        match self.directory.user_by_auth_id(id).await {
            Ok(Some(user)) => {
                if let Some(name) = non_empty(user.name) {
                    return name;
                }
            }
            Ok(None) => {}
            Err(e) => debug!(%id, %e, "user-by-auth-id lookup failed"),
        }

        if let Ok(oid) = ObjectId::parse_str(id) {
            match self.directory.user_by_id(oid).await {
                Ok(Some(user)) => {
                    if let Some(name) = non_empty(user.name) {
                        return name;
                    }
                }
                Ok(None) => {}
                Err(e) => debug!(%id, %e, "user-by-id lookup failed"),
            }
        }

        match self.directory.profile_by_auth_id(id).await {
            Ok(Some(profile)) => {
                if let Some(name) = non_empty(profile.full_name) {
                    return name;
                }
            }
            Ok(None) => {}
            Err(e) => debug!(%id, %e, "profile lookup failed"),
        }

        self.fallback.user_fallback(id)
    }

    pub async fn resolve_project_name(&self, id: ObjectId) -> String {
        match self.directory.project_by_id(id).await {
            Ok(Some(project)) => return project.name,
            Ok(None) => {}
            Err(e) => debug!(%id, %e, "project lookup failed"),
        }
        self.fallback.project_fallback(&id)
    }
}

fn non_empty(name: Option<String>) -> Option<String> {
    name.filter(|n| !n.trim().is_empty())
}
