//! Typed requests handed over by the router.

use serde::{Deserialize, Serialize};

use crate::appstore::{normalize_region, ChartKind};
use crate::cache::CacheCategory;
use crate::errors::StoreBotError;
use crate::firmware::Platform;

/// One resolved user command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ActionRequest {
    Chart { region: String, kind: ChartKind },
    Price { app: String, region: String },
    Detail { app: String },
    Icon { app: String },
    OsSummary,
    OsDetail { platform: Platform },
}

impl ActionRequest {
    /// Quota action name; requests sharing a name share a per-action cap.
    pub fn action(&self) -> &'static str {
        self.category().as_str()
    }

    pub fn category(&self) -> CacheCategory {
        match self {
            ActionRequest::Chart { .. } => CacheCategory::Chart,
            ActionRequest::Price { .. } => CacheCategory::Price,
            ActionRequest::Detail { .. } => CacheCategory::Detail,
            ActionRequest::Icon { .. } => CacheCategory::Icon,
            ActionRequest::OsSummary | ActionRequest::OsDetail { .. } => CacheCategory::Os,
        }
    }

    /// Rejects malformed parameters and canonicalizes the rest, so that no
    /// quota is spent on a request that could never succeed.
    pub fn normalized(self) -> Result<Self, StoreBotError> {
        Ok(match self {
            ActionRequest::Chart { region, kind } => ActionRequest::Chart {
                region: normalize_region(&region)?,
                kind,
            },
            ActionRequest::Price { app, region } => ActionRequest::Price {
                app: app_term(app)?,
                region: normalize_region(&region)?,
            },
            ActionRequest::Detail { app } => ActionRequest::Detail { app: app_term(app)? },
            ActionRequest::Icon { app } => ActionRequest::Icon { app: app_term(app)? },
            other => other,
        })
    }
}

fn app_term(app: String) -> Result<String, StoreBotError> {
    let trimmed = app.trim();
    if trimmed.is_empty() {
        Err(StoreBotError::InvalidInput("app name is empty".to_string()))
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalizes_parameters() {
        let req = ActionRequest::Price { app: "  Things 3 ".into(), region: "JP".into() };
        assert_eq!(
            req.normalized().unwrap(),
            ActionRequest::Price { app: "Things 3".into(), region: "jp".into() }
        );
        assert!(ActionRequest::Icon { app: " ".into() }.normalized().is_err());
        assert!(ActionRequest::Chart { region: "japan".into(), kind: ChartKind::Free }.normalized().is_err());
    }

    #[test]
    fn action_names() {
        assert_eq!(ActionRequest::OsSummary.action(), "os");
        assert_eq!(ActionRequest::OsDetail { platform: Platform::MacOs }.action(), "os");
        assert_eq!(ActionRequest::Detail { app: "x".into() }.action(), "detail");
    }

    #[test]
    fn deserializes_tagged_requests() {
        let req: ActionRequest = serde_json::from_str(r#"{"action":"osDetail","platform":"iPadOS"}"#).unwrap();
        assert_eq!(req, ActionRequest::OsDetail { platform: Platform::IpadOs });
    }
}
