//! Platform API client.
//!
//! The harness talks to the system under test exclusively through the
//! [`PlatformApi`] trait; [`ApiClient`] is the HTTP implementation used in
//! production, and the mocks in [`crate::mock`] stand in for tests.

use crate::errors::ApiError;
use crate::types::{LaunchReceipt, TargetId, WorkflowDescriptor, WorkflowEvent};
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Maximum body length carried into error details.
const ERROR_DETAIL_LIMIT: usize = 200;

/// One request/assert cycle against the system under test.
#[derive(Debug, Clone)]
pub struct HttpCheck {
    /// Short subsystem label used in logs and failure details.
    pub name: &'static str,
    /// HTTP method.
    pub method: Method,
    /// Path relative to the API base URL (leading slash).
    pub path: String,
    /// Status code the check expects.
    pub expected_status: u16,
    /// Optional fragment the response body must contain.
    pub body_fragment: Option<String>,
}

impl HttpCheck {
    pub fn get(name: &'static str, path: impl Into<String>, expected_status: u16) -> Self {
        Self {
            name,
            method: Method::GET,
            path: path.into(),
            expected_status,
            body_fragment: None,
        }
    }

    pub fn post(name: &'static str, path: impl Into<String>, expected_status: u16) -> Self {
        Self {
            name,
            method: Method::POST,
            path: path.into(),
            expected_status,
            body_fragment: None,
        }
    }

    /// Require the response body to contain `fragment`.
    pub fn expect_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.body_fragment = Some(fragment.into());
        self
    }
}

/// Abstract operations the harness consumes from the platform.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Perform one probe check and assert its expectations.
    async fn probe(&self, check: &HttpCheck) -> Result<(), ApiError>;

    /// Provision a fresh target from a blueprint.
    async fn create_target(&self, name: &str, blueprint: &str) -> Result<TargetId, ApiError>;

    /// Provision a component within an existing target.
    async fn create_component(&self, target: &TargetId, name: &str) -> Result<(), ApiError>;

    /// Launch a workflow instance and return its tracking context.
    async fn launch_workflow(
        &self,
        desc: &WorkflowDescriptor,
        payload: serde_json::Value,
    ) -> Result<LaunchReceipt, ApiError>;

    /// Latest event of `event_type` for the given workflow instance, if any.
    async fn latest_event(
        &self,
        receipt: &LaunchReceipt,
        desc: &WorkflowDescriptor,
        event_type: &str,
    ) -> Result<Option<WorkflowEvent>, ApiError>;
}

/// HTTP implementation of [`PlatformApi`].
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct EventsPage {
    #[serde(default)]
    events: Vec<WorkflowEvent>,
}

impl ApiClient {
    /// Build a client with a bounded per-request timeout.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self {
            http,
            base_url,
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self.http.request(method, self.url(path));
        if !self.token.is_empty() {
            req = req.header("x-token", &self.token);
        }
        req
    }

    /// Send a JSON request and return (status, body) or a transport error.
    async fn send_json(
        &self,
        method: Method,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<(u16, String), ApiError> {
        let resp = self
            .request(method, path)
            .json(body)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                path: path.to_string(),
                source,
            })?;
        let status = resp.status().as_u16();
        let text = resp.text().await.map_err(|source| ApiError::Transport {
            path: path.to_string(),
            source,
        })?;
        Ok((status, text))
    }
}

fn error_detail(status: u16, body: &str) -> String {
    let trimmed = body.trim();
    let snippet: String = trimmed.chars().take(ERROR_DETAIL_LIMIT).collect();
    format!("status {status}: {snippet}")
}

#[async_trait]
impl PlatformApi for ApiClient {
    async fn probe(&self, check: &HttpCheck) -> Result<(), ApiError> {
        let resp = self
            .request(check.method.clone(), &check.path)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                path: check.path.clone(),
                source,
            })?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|source| ApiError::Transport {
            path: check.path.clone(),
            source,
        })?;

        if status != check.expected_status {
            return Err(ApiError::UnexpectedStatus {
                path: check.path.clone(),
                got: status,
                expected: check.expected_status,
            });
        }

        if let Some(fragment) = &check.body_fragment {
            if !body.contains(fragment.as_str()) {
                return Err(ApiError::BodyMismatch {
                    path: check.path.clone(),
                    fragment: fragment.clone(),
                });
            }
        }

        debug!(check = check.name, status, "probe check passed");
        Ok(())
    }

    async fn create_target(&self, name: &str, blueprint: &str) -> Result<TargetId, ApiError> {
        let path = "/controlPlane/v1/targets";
        let body = json!({ "name": name, "blueprint": blueprint });
        let (status, text) = self.send_json(Method::POST, path, &body).await?;
        if !(200..300).contains(&status) {
            return Err(ApiError::Rejected {
                path: path.to_string(),
                detail: error_detail(status, &text),
            });
        }
        Ok(TargetId::new(name))
    }

    async fn create_component(&self, target: &TargetId, name: &str) -> Result<(), ApiError> {
        let path = format!("/controlPlane/v1/targets/{target}/components");
        let body = json!({ "name": name });
        let (status, text) = self.send_json(Method::POST, &path, &body).await?;
        if !(200..300).contains(&status) {
            return Err(ApiError::Rejected {
                path,
                detail: error_detail(status, &text),
            });
        }
        Ok(())
    }

    async fn launch_workflow(
        &self,
        desc: &WorkflowDescriptor,
        payload: serde_json::Value,
    ) -> Result<LaunchReceipt, ApiError> {
        let path = "/v1/events";
        let body = json!({
            "type": desc.triggered_event_type(),
            "target": desc.target.as_str(),
            "component": desc.component,
            "stage": desc.stage,
            "data": payload,
        });
        let (status, text) = self.send_json(Method::POST, path, &body).await?;
        if !(200..300).contains(&status) {
            return Err(ApiError::Rejected {
                path: path.to_string(),
                detail: error_detail(status, &text),
            });
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Decode {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    async fn latest_event(
        &self,
        receipt: &LaunchReceipt,
        desc: &WorkflowDescriptor,
        event_type: &str,
    ) -> Result<Option<WorkflowEvent>, ApiError> {
        let path = format!(
            "/datastore/v1/events?target={}&stage={}&type={}&context={}&limit=1",
            desc.target, desc.stage, event_type, receipt.context_id
        );
        let resp = self
            .request(Method::GET, &path)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                path: path.clone(),
                source,
            })?;

        let status = resp.status().as_u16();
        // The datastore answers 404 while no matching event exists yet.
        if status == 404 {
            return Ok(None);
        }
        let text = resp.text().await.map_err(|source| ApiError::Transport {
            path: path.clone(),
            source,
        })?;
        if !(200..300).contains(&status) {
            return Err(ApiError::Rejected {
                path,
                detail: error_detail(status, &text),
            });
        }
        let page: EventsPage = serde_json::from_str(&text).map_err(|e| ApiError::Decode {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Ok(page.events.into_iter().next())
    }
}
