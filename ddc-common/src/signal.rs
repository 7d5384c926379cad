use core::time::Duration;
use log::{debug, info, warn};
use reqwest::{Client, ClientBuilder, Method, StatusCode};
use serde::{Deserialize, Serialize};
use std::error::Error;
use thiserror::Error;

pub const REFRESH_GROUPS_PATH: &str = "/api/refresh-signal-groups/";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalGroup {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub internal_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl SignalGroup {
    /// The backend has emitted both `id` and `internal_id` over time; empty
    /// strings count as missing.
    pub fn resolved_id(&self) -> Option<&str> {
        self.id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| self.internal_id.as_deref().filter(|id| !id.is_empty()))
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or_else(|| self.title.as_deref().filter(|t| !t.is_empty()))
            .unwrap_or("Unnamed Group")
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupsRefreshResponse {
    pub success: bool,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub groups: Vec<SignalGroup>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshedGroups {
    pub groups: Vec<SignalGroup>,
    /// The count the backend reported, echoed to the operator verbatim.
    pub count: u64,
}

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("HTTP {}: {}", .0.as_u16(), .0.canonical_reason().unwrap_or("Unknown"))]
    Status(StatusCode),
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error("{0}")]
    Backend(String),
}

impl RefreshError {
    fn from_body(body: GroupsRefreshResponse) -> Self {
        let reason = body
            .error
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| "Unknown error".to_string());
        Self::Backend(reason)
    }
}

pub struct SignalAdminClient {
    base_url: String,
    client: Client,
}

impl SignalAdminClient {
    pub fn new(
        base_url: &str,
        require_https: bool,
        timeout: Duration,
    ) -> Result<Self, Box<dyn Error>> {
        let client = ClientBuilder::new()
            .https_only(require_https)
            .timeout(timeout)
            .build()?;

        let base_url = base_url.trim_end_matches('/').to_string();

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn refresh_groups(
        &self,
    ) -> impl std::future::Future<Output = Result<RefreshedGroups, RefreshError>> + use<> {
        let url = format!("{}{}", self.base_url, REFRESH_GROUPS_PATH);

        let request = self
            .client
            .request(Method::GET, &url)
            .header("X-Requested-With", "XMLHttpRequest");

        async move {
            debug!("Requesting Signal group refresh from {url}");
            let response = request.send().await?;

            debug!("Group refresh response status: {}", response.status());
            if !response.status().is_success() {
                warn!("Group refresh failed, response: {response:?}");
                return Err(RefreshError::Status(response.status()));
            }

            let body = response.json::<GroupsRefreshResponse>().await?;

            if body.success {
                info!("Backend reports {} Signal group(s)", body.count);
                Ok(RefreshedGroups {
                    count: body.count,
                    groups: body.groups,
                })
            } else {
                warn!("Group refresh rejected by backend: {:?}", body.error);
                Err(RefreshError::from_body(body))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Once;

    static INIT: Once = Once::new();

    pub fn initialize() {
        INIT.call_once(|| {
            env_logger::init();
        });
    }

    #[test]
    fn test_deserialize_response() {
        let json = r#"{"success":true,"count":2,"groups":[{"id":"group.abc","name":"Referees"},{"id":"group.def","name":"Organizers"}]}"#;
        let resp: GroupsRefreshResponse = serde_json::from_str(json).unwrap();
        assert!(resp.success);
        assert_eq!(resp.count, 2);
        assert_eq!(resp.groups.len(), 2);
        assert_eq!(resp.groups[0].resolved_id(), Some("group.abc"));
        assert_eq!(resp.groups[0].display_name(), "Referees");
        assert_eq!(resp.error, None);
    }

    #[test]
    fn test_deserialize_alternate_field_spellings() {
        let json = r#"{"success":true,"count":1,"groups":[{"internal_id":"XyZ=","title":"Players"}]}"#;
        let resp: GroupsRefreshResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.groups[0].resolved_id(), Some("XyZ="));
        assert_eq!(resp.groups[0].display_name(), "Players");
    }

    #[test]
    fn test_deserialize_failure_body() {
        let json = r#"{"success":false,"error":"signal-cli unavailable"}"#;
        let resp: GroupsRefreshResponse = serde_json::from_str(json).unwrap();
        assert!(!resp.success);
        assert_eq!(resp.count, 0);
        assert!(resp.groups.is_empty());
        assert_eq!(resp.error.as_deref(), Some("signal-cli unavailable"));
    }

    #[test]
    fn test_empty_id_falls_back() {
        let group = SignalGroup {
            id: Some(String::new()),
            internal_id: Some("fallback".to_string()),
            name: None,
            title: None,
        };
        assert_eq!(group.resolved_id(), Some("fallback"));
        assert_eq!(group.display_name(), "Unnamed Group");
    }

    #[test]
    fn test_missing_ids_resolve_to_none() {
        let group = SignalGroup::default();
        assert_eq!(group.resolved_id(), None);
    }

    #[test]
    fn test_error_display() {
        let err = RefreshError::Status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "HTTP 500: Internal Server Error");

        let err = RefreshError::from_body(GroupsRefreshResponse {
            success: false,
            error: Some("boom".to_string()),
            ..Default::default()
        });
        assert_eq!(err.to_string(), "boom");

        let err = RefreshError::from_body(GroupsRefreshResponse {
            success: false,
            error: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(err.to_string(), "Unknown error");
    }

    #[test]
    #[ignore]
    fn test_live_refresh_endpoint() {
        const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
        const URL: &str = "http://localhost:8000";
        initialize();

        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap();

        info!("Requesting a group refresh");
        let resp = client
            .get(format!("{URL}{REFRESH_GROUPS_PATH}"))
            .header("X-Requested-With", "XMLHttpRequest")
            .send()
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = resp.json::<GroupsRefreshResponse>().unwrap();
        assert!(body.success);
        assert_eq!(body.count as usize, body.groups.len());
    }
}
