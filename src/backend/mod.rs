//! Hosted backend client
//!
//! The production deployment keeps its data, identity and model access in a
//! hosted app backend reached over REST. [`HostedBackend`] implements all
//! three collaborator traits against it:
//!
//! - [`EntityStore`]: `GET/POST/PUT {base}/entities/{Kind}[/{id}]`
//! - [`InferenceService`]: `POST {base}/integrations/Core/InvokeLLM`
//! - [`AuthProvider`]: `GET {base}/auth/me`
//!
//! Every request carries `X-App-Id` and, when configured, the service API
//! key as a bearer credential. Optimistic concurrency uses `If-Match` with
//! the record version; the backend answers `412` on a mismatch. There is no
//! server-side increment, so reactions take the version-checked path.

use crate::auth::{AuthProvider, UserProfile};
use crate::llm::InferenceService;
use crate::store::{EntityKind, EntityStore, Filter, OrderSpec, Record};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url, header};
use serde::Deserialize;
use serde_json::{Value, json};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const INVOKE_LLM_PATH: [&str; 3] = ["integrations", "Core", "InvokeLLM"];

/// Connection settings for the hosted backend.
#[derive(Clone)]
pub struct HostedBackendConfig {
    /// App root, e.g. `https://backend.example.com/api/apps/<app id>`
    pub base_url: String,
    pub app_id: String,
    /// Service key, already resolved from the environment.
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
}

// Keep the key out of logs.
impl fmt::Debug for HostedBackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostedBackendConfig")
            .field("base_url", &self.base_url)
            .field("app_id", &self.app_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

pub struct HostedBackend {
    client: Client,
    base: Url,
    config: HostedBackendConfig,
}

/// `InvokeLLM` answers either with a bare JSON string or an object.
#[derive(Deserialize)]
#[serde(untagged)]
enum InvokeReply {
    Text(String),
    Wrapped { response: String },
}

impl HostedBackend {
    /// # Errors
    /// Returns `AppError::Configuration` if `base_url` is not a usable base
    /// URL or the HTTP client cannot be built.
    pub fn new(config: HostedBackendConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| {
                AppError::Configuration(format!("Invalid backend base URL: {}", config.base_url))
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base,
            config,
        })
    }

    pub fn config(&self) -> &HostedBackendConfig {
        &self.config
    }

    /// Appends path segments to the app root. Each segment is
    /// percent-encoded, so a `/` inside one never adds a level.
    fn url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base.clone();
        // `new` rejects cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn entity_url(&self, kind: EntityKind, id: Option<&str>) -> Result<Url> {
        match id {
            // Dot segments would be dropped and land on the collection.
            Some("" | "." | "..") => Err(AppError::NotFound(format!("{} {:?}", kind, id))),
            Some(id) => Ok(self.url(["entities", kind.as_str(), id])),
            None => Ok(self.url(["entities", kind.as_str()])),
        }
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header("X-App-Id", &self.config.app_id);

        match &self.config.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| AppError::Store(format!("{} request failed: {}", what, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(%status, what, "Hosted backend returned an error");
        Err(match status {
            StatusCode::NOT_FOUND => AppError::NotFound(what.to_string()),
            StatusCode::PRECONDITION_FAILED | StatusCode::CONFLICT => {
                AppError::Conflict(format!("{} was modified concurrently", what))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                AppError::Auth(format!("{} rejected: {}", what, status))
            }
            _ => AppError::Store(format!("{} failed with {}: {}", what, status, body)),
        })
    }

    async fn read_record(response: Response, what: &str) -> Result<Record> {
        response
            .json::<Record>()
            .await
            .map_err(|e| AppError::Store(format!("Malformed {} response: {}", what, e)))
    }

    async fn read_records(response: Response, what: &str) -> Result<Vec<Record>> {
        response
            .json::<Vec<Record>>()
            .await
            .map_err(|e| AppError::Store(format!("Malformed {} response: {}", what, e)))
    }
}

#[async_trait]
impl EntityStore for HostedBackend {
    async fn list(&self, kind: EntityKind, order: &OrderSpec) -> Result<Vec<Record>> {
        let builder = self
            .request(Method::GET, self.entity_url(kind, None)?)
            .query(&[("sort", order.to_string())]);

        let response = self.send(builder, kind.as_str()).await?;
        Self::read_records(response, kind.as_str()).await
    }

    async fn filter(
        &self,
        kind: EntityKind,
        filter: &Filter,
        order: &OrderSpec,
    ) -> Result<Vec<Record>> {
        let builder = self
            .request(Method::GET, self.entity_url(kind, None)?)
            .query(&[
                ("sort", order.to_string()),
                ("q", filter.to_json().to_string()),
            ]);

        let response = self.send(builder, kind.as_str()).await?;
        Self::read_records(response, kind.as_str()).await
    }

    async fn get(&self, kind: EntityKind, id: &str) -> Result<Record> {
        let what = format!("{} {}", kind, id);
        let builder = self.request(Method::GET, self.entity_url(kind, Some(id))?);

        let response = self.send(builder, &what).await?;
        Self::read_record(response, &what).await
    }

    #[instrument(skip(self, fields), fields(kind = %kind))]
    async fn create(&self, kind: EntityKind, fields: Record) -> Result<Record> {
        let builder = self
            .request(Method::POST, self.entity_url(kind, None)?)
            .json(&fields);

        let response = self.send(builder, kind.as_str()).await?;
        let record = Self::read_record(response, kind.as_str()).await?;
        debug!(id = ?record.get("id"), "Created record");
        Ok(record)
    }

    #[instrument(skip(self, fields), fields(kind = %kind))]
    async fn update(
        &self,
        kind: EntityKind,
        id: &str,
        fields: Record,
        expected_version: Option<u64>,
    ) -> Result<Record> {
        let what = format!("{} {}", kind, id);
        let mut builder = self
            .request(Method::PUT, self.entity_url(kind, Some(id))?)
            .json(&fields);
        if let Some(version) = expected_version {
            builder = builder.header(header::IF_MATCH, version.to_string());
        }

        let response = self.send(builder, &what).await?;
        Self::read_record(response, &what).await
    }
}

#[async_trait]
impl InferenceService for HostedBackend {
    async fn invoke(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "prompt": prompt,
            "response_json_schema": Value::Null,
        });

        debug!(prompt_len = prompt.len(), "Sending InvokeLLM request");

        let response = self
            .request(Method::POST, self.url(INVOKE_LLM_PATH))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Inference(format!("InvokeLLM request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Inference(format!(
                "InvokeLLM failed with {}: {}",
                status, error_text
            )));
        }

        let reply: InvokeReply = response
            .json()
            .await
            .map_err(|e| AppError::Inference(format!("Unexpected InvokeLLM reply: {}", e)))?;

        Ok(match reply {
            InvokeReply::Text(text) | InvokeReply::Wrapped { response: text } => text,
        })
    }

    fn model_name(&self) -> &str {
        "hosted:InvokeLLM"
    }
}

#[async_trait]
impl AuthProvider for HostedBackend {
    async fn me(&self, token: &str) -> Result<UserProfile> {
        let builder = self
            .client
            .get(self.url(["auth", "me"]))
            .header("X-App-Id", &self.config.app_id)
            .bearer_auth(token);

        let response = match self.send(builder, "auth/me").await {
            Ok(response) => response,
            Err(AppError::NotFound(_)) => {
                return Err(AppError::Auth("Unknown or expired token".to_string()));
            }
            Err(e) => return Err(e),
        };

        response
            .json::<UserProfile>()
            .await
            .map_err(|e| AppError::Auth(format!("Malformed profile response: {}", e)))
    }

    fn login_url(&self, return_to: &str) -> String {
        let mut url = self.url(["login"]);
        url.query_pairs_mut().append_pair("from_url", return_to);
        url.into()
    }
}
