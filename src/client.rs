use crate::model::{Site, Wlan, clone_payload, sort_sites, sort_wlans};
use anyhow::Context;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderValue};
use reqwest::{Method, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("mistclone/", env!("CARGO_PKG_VERSION"));

/// What the client was doing when a request failed. Drives the wording of
/// [`ApiError`] messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListSites,
    ListWlans,
    CloneWlan,
}

impl Operation {
    fn action(self) -> &'static str {
        match self {
            Operation::ListSites => "get sites",
            Operation::ListWlans => "get WiFi list",
            Operation::CloneWlan => "clone WiFi",
        }
    }

    fn not_found(self) -> &'static str {
        match self {
            Operation::ListSites => "Organization not found. Please check your organization ID.",
            Operation::ListWlans => "Site not found. Please check your site ID.",
            Operation::CloneWlan => {
                "WiFi or site not found. Please check your WiFi ID and site ID."
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed. Please check your API token.")]
    Auth,
    #[error("{}", .operation.not_found())]
    NotFound { operation: Operation },
    #[error("Failed to {}: {}", .operation.action(), .reason)]
    Transport { operation: Operation, reason: String },
}

impl ApiError {
    fn transport(operation: Operation, reason: impl ToString) -> Self {
        ApiError::Transport {
            operation,
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http: Client,
    auth: HeaderValue,
    org_id: String,
}

impl ApiClient {
    pub fn new(base_url: &str, api_token: &str, org_id: &str) -> anyhow::Result<Self> {
        let mut parsed = Url::parse(base_url).context("parsing base URL")?;
        // Url::join replaces the last segment unless the path ends with '/'.
        if !parsed.path().ends_with('/') {
            let path = format!("{}/", parsed.path());
            parsed.set_path(&path);
        }

        let mut auth = HeaderValue::from_str(&format!("Token {api_token}"))
            .context("API token contains characters not allowed in a header")?;
        auth.set_sensitive(true);

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            base_url: parsed,
            http,
            auth,
            org_id: org_id.to_string(),
        })
    }

    /// Sites of the configured organization, sorted by name.
    pub fn list_sites(&self) -> Result<Vec<Site>, ApiError> {
        let op = Operation::ListSites;
        let path = format!("orgs/{}/sites", self.org_id);
        let json = self.request(op, Method::GET, &path, Option::<&Value>::None)?;
        let mut sites: Vec<Site> =
            serde_json::from_value(json).map_err(|e| ApiError::transport(op, e))?;
        sort_sites(&mut sites);
        Ok(sites)
    }

    /// WLANs of a site, sorted by SSID.
    pub fn list_wlans(&self, site_id: &str) -> Result<Vec<Wlan>, ApiError> {
        let op = Operation::ListWlans;
        let path = format!("sites/{site_id}/wlans");
        let json = self.request(op, Method::GET, &path, Option::<&Value>::None)?;
        let mut wlans: Vec<Wlan> =
            serde_json::from_value(json).map_err(|e| ApiError::transport(op, e))?;
        sort_wlans(&mut wlans);
        Ok(wlans)
    }

    /// Copies the WLAN `source_id` under `new_ssid` and returns the created
    /// resource. The source is only read.
    pub fn clone_wlan(
        &self,
        site_id: &str,
        source_id: &str,
        new_ssid: &str,
    ) -> Result<Value, ApiError> {
        let op = Operation::CloneWlan;
        let source_path = format!("sites/{site_id}/wlans/{source_id}");
        let source = self.request(op, Method::GET, &source_path, Option::<&Value>::None)?;

        let payload = clone_payload(&source, new_ssid);
        let create_path = format!("sites/{site_id}/wlans");
        self.request(op, Method::POST, &create_path, Some(&payload))
    }

    fn request<B: Serialize + ?Sized>(
        &self,
        op: Operation,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Value, ApiError> {
        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::transport(op, e))?;
        debug!(%method, %url, "sending request");

        let mut request = self
            .http
            .request(method, url)
            .header(AUTHORIZATION, self.auth.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().map_err(|e| {
            warn!(operation = ?op, error = %e, "request failed");
            ApiError::transport(op, e)
        })?;

        let status = response.status();
        debug!(status = status.as_u16(), "received response");
        match status {
            StatusCode::UNAUTHORIZED => {
                warn!(operation = ?op, "request rejected with 401");
                return Err(ApiError::Auth);
            }
            StatusCode::NOT_FOUND => {
                warn!(operation = ?op, "request rejected with 404");
                return Err(ApiError::NotFound { operation: op });
            }
            _ => {}
        }

        let response = response.error_for_status().map_err(|e| {
            warn!(operation = ?op, status = status.as_u16(), "request rejected");
            ApiError::transport(op, e)
        })?;
        let text = response
            .text()
            .map_err(|e| ApiError::transport(op, format!("reading response body: {e}")))?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::transport(op, format!("decoding response body: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.url("/api/v1"), "test-token", "org-1").unwrap()
    }

    #[test]
    fn lists_sites_sorted_with_token_header() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/orgs/org-1/sites")
                .header("Authorization", "Token test-token");
            then.status(200).json_body(json!([
                {"id": "s3", "name": "Zurich", "timezone": "Europe/Zurich"},
                {"id": "s1", "name": "Amsterdam"},
                {"id": "s2", "name": "Berlin"}
            ]));
        });

        let sites = client(&server).list_sites().unwrap();

        mock.assert();
        let names: Vec<_> = sites.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Amsterdam", "Berlin", "Zurich"]);
        assert_eq!(sites[0].id, "s1");
    }

    #[test]
    fn lists_wlans_sorted_by_ssid() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/sites/s1/wlans");
            then.status(200).json_body(json!([
                {"id": "w2", "ssid": "Guest", "vlan_id": 30},
                {"id": "w1", "ssid": "Corp", "vlan_id": "10"},
                {"id": "w3", "ssid": "IoT"}
            ]));
        });

        let wlans = client(&server).list_wlans("s1").unwrap();
        let ssids: Vec<_> = wlans.iter().map(|w| w.ssid.as_str()).collect();
        assert_eq!(ssids, ["Corp", "Guest", "IoT"]);
        assert_eq!(wlans[2].vlan_label(), "N/A");
    }

    #[test]
    fn clone_posts_source_without_id() {
        let server = MockServer::start();
        let source = server.mock(|when, then| {
            when.method(GET).path("/api/v1/sites/s1/wlans/w1");
            then.status(200).json_body(json!({
                "id": "w1",
                "ssid": "Corp",
                "vlan_id": 10,
                "auth": {"type": "psk", "psk": "hunter22"},
                "band": "both"
            }));
        });
        let create = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v1/sites/s1/wlans")
                .header("Authorization", "Token test-token")
                .json_body(json!({
                    "ssid": "Corp-Lab",
                    "vlan_id": 10,
                    "auth": {"type": "psk", "psk": "hunter22"},
                    "band": "both"
                }));
            then.status(200).json_body(json!({
                "id": "w9",
                "ssid": "Corp-Lab",
                "vlan_id": 10,
                "auth": {"type": "psk", "psk": "hunter22"},
                "band": "both"
            }));
        });

        let created = client(&server).clone_wlan("s1", "w1", "Corp-Lab").unwrap();

        source.assert();
        create.assert();
        assert_eq!(created["id"], "w9");
        assert_eq!(created["ssid"], "Corp-Lab");
    }

    #[test]
    fn classifies_unauthorized() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/orgs/org-1/sites");
            then.status(401).body(r#"{"detail": "invalid token"}"#);
        });

        let err = client(&server).list_sites().unwrap_err();
        assert!(matches!(err, ApiError::Auth));
        assert_eq!(
            err.to_string(),
            "Authentication failed. Please check your API token."
        );
    }

    #[test]
    fn classifies_not_found_per_operation() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/orgs/org-1/sites");
            then.status(404);
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/sites/missing/wlans");
            then.status(404);
        });
        let client = client(&server);

        let err = client.list_sites().unwrap_err();
        assert!(err.to_string().contains("Organization not found"));

        let err = client.list_wlans("missing").unwrap_err();
        assert!(err.to_string().contains("Site not found"));
    }

    #[test]
    fn clone_surfaces_failure_from_either_step() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/sites/s1/wlans/gone");
            then.status(404);
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/sites/s1/wlans/w1");
            then.status(200).json_body(json!({"id": "w1", "ssid": "Corp"}));
        });
        let create = server.mock(|when, then| {
            when.method(POST).path("/api/v1/sites/s1/wlans");
            then.status(401);
        });
        let client = client(&server);

        let err = client.clone_wlan("s1", "gone", "x").unwrap_err();
        assert!(matches!(
            err,
            ApiError::NotFound {
                operation: Operation::CloneWlan
            }
        ));
        assert!(err.to_string().contains("WiFi or site not found"));
        assert_eq!(create.hits(), 0);

        let err = client.clone_wlan("s1", "w1", "x").unwrap_err();
        assert!(matches!(err, ApiError::Auth));
        assert_eq!(create.hits(), 1);
    }

    #[test]
    fn unauthorized_on_every_endpoint_is_an_auth_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/sites/s1/wlans");
            then.status(401);
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/sites/s1/wlans/w1");
            then.status(401);
        });
        let create = server.mock(|when, then| {
            when.method(POST).path("/api/v1/sites/s1/wlans");
            then.status(201).json_body(json!({"id": "w2", "ssid": "x"}));
        });
        let client = client(&server);

        let err = client.list_wlans("s1").unwrap_err();
        assert!(matches!(err, ApiError::Auth));
        assert_eq!(
            err.to_string(),
            "Authentication failed. Please check your API token."
        );

        let err = client.clone_wlan("s1", "w1", "x").unwrap_err();
        assert!(matches!(err, ApiError::Auth));
        assert_eq!(create.hits(), 0);
    }

    #[test]
    fn not_found_on_clone_post_uses_clone_wording() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/sites/s1/wlans/w1");
            then.status(200).json_body(json!({"id": "w1", "ssid": "Corp"}));
        });
        let create = server.mock(|when, then| {
            when.method(POST).path("/api/v1/sites/s1/wlans");
            then.status(404);
        });

        let err = client(&server).clone_wlan("s1", "w1", "x").unwrap_err();

        create.assert();
        assert!(matches!(
            err,
            ApiError::NotFound {
                operation: Operation::CloneWlan
            }
        ));
        assert_eq!(
            err.to_string(),
            "WiFi or site not found. Please check your WiFi ID and site ID."
        );
    }

    #[test]
    fn clone_post_server_error_is_a_transport_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/sites/s1/wlans/w1");
            then.status(200).json_body(json!({"id": "w1", "ssid": "Corp"}));
        });
        server.mock(|when, then| {
            when.method(POST).path("/api/v1/sites/s1/wlans");
            then.status(400).body(r#"{"detail": "ssid exists"}"#);
        });

        let err = client(&server).clone_wlan("s1", "w1", "Corp").unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to clone WiFi: "), "{msg}");
        assert!(msg.contains("400"), "{msg}");
    }

    #[test]
    fn other_statuses_are_transport_errors_with_reason() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/sites/s1/wlans");
            then.status(500).body("boom");
        });

        let err = client(&server).list_wlans("s1").unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to get WiFi list: "), "{msg}");
        assert!(msg.contains("500"), "{msg}");
    }

    #[test]
    fn undecodable_body_is_a_transport_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/orgs/org-1/sites");
            then.status(200).body("<html>maintenance</html>");
        });

        let err = client(&server).list_sites().unwrap_err();
        assert!(matches!(err, ApiError::Transport { .. }));
        assert!(err.to_string().contains("decoding response body"));
    }

    #[test]
    fn connection_failure_is_a_transport_error() {
        let client = ApiClient::new("http://127.0.0.1:1/api/v1", "t", "o").unwrap();
        let err = client.list_sites().unwrap_err();
        assert!(err.to_string().starts_with("Failed to get sites: "));
    }

    #[test]
    fn base_url_without_trailing_slash_keeps_its_path() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/v1/sites/s1/wlans");
            then.status(200).json_body(json!([]));
        });

        let wlans = client(&server).list_wlans("s1").unwrap();
        mock.assert();
        assert!(wlans.is_empty());
    }
}
