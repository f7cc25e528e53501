//! HTTP client for the MLflow model registry REST API.
//!
//! Endpoints used, relative to `<tracking_uri>/api/2.0/mlflow`:
//! - `GET  /model-versions/get?name=&version=`
//! - `GET  /registered-models/alias?name=&alias=`
//! - `POST /registered-models/alias`

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{ModelRegistry, RegistryError};
use crate::config::{Credentials, RegistryConfig};
use crate::models::ModelVersion;

const API_PREFIX: &str = "/api/2.0/mlflow";

/// Envelope returned by both version lookups.
#[derive(Debug, Deserialize)]
struct ModelVersionResponse {
    model_version: ModelVersion,
}

#[derive(Debug, Serialize)]
struct SetAliasRequest<'a> {
    name: &'a str,
    alias: &'a str,
    version: &'a str,
}

/// Error payload MLflow attaches to non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// HTTP client for an MLflow tracking server.
#[derive(Debug, Clone)]
pub struct MlflowClient {
    base_url: String,
    credentials: Option<Credentials>,
    client: Client,
}

impl MlflowClient {
    /// Create from a loaded configuration, applying its request timeout.
    pub fn from_config(config: &RegistryConfig) -> Result<Self, RegistryError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            base_url: config.tracking_uri.clone(),
            credentials: config.credentials.clone(),
            client,
        })
    }

    /// Create with explicit base URL and no credentials.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials: None,
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request with optional auth header.
    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}{}", self.base_url, API_PREFIX, path);
        tracing::debug!(%method, %url, "registry request");
        let req = self.client.request(method, &url);
        match self.credentials {
            Some(Credentials::Bearer(ref token)) => req.bearer_auth(token),
            Some(Credentials::Basic {
                ref username,
                ref password,
            }) => req.basic_auth(username, password.as_ref()),
            None => req,
        }
    }

    /// Handle response, converting HTTP errors to RegistryError.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, RegistryError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::error_from(status, response).await)
        }
    }

    /// Handle response whose body carries nothing of interest.
    async fn handle_empty_response(
        &self,
        response: reqwest::Response,
    ) -> Result<(), RegistryError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::error_from(status, response).await)
        }
    }

    async fn error_from(status: StatusCode, response: reqwest::Response) -> RegistryError {
        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(ErrorBody {
                error_code: Some(code),
                message: Some(msg),
            }) => format!("{}: {}", code, msg),
            Ok(ErrorBody {
                message: Some(msg), ..
            }) => msg,
            _ => body,
        };
        match status {
            StatusCode::NOT_FOUND => RegistryError::NotFound(message),
            StatusCode::BAD_REQUEST => RegistryError::BadRequest(message),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RegistryError::Unauthorized,
            _ => RegistryError::Server(format!("{}: {}", status, message)),
        }
    }
}

impl ModelRegistry for MlflowClient {
    async fn get_version_by_number(
        &self,
        name: &str,
        version: &str,
    ) -> Result<ModelVersion, RegistryError> {
        let response = self
            .request(reqwest::Method::GET, "/model-versions/get")
            .query(&[("name", name), ("version", version)])
            .send()
            .await?;
        let body: ModelVersionResponse = self.handle_response(response).await?;
        Ok(body.model_version)
    }

    async fn get_version_by_alias(
        &self,
        name: &str,
        alias: &str,
    ) -> Result<ModelVersion, RegistryError> {
        let response = self
            .request(reqwest::Method::GET, "/registered-models/alias")
            .query(&[("name", name), ("alias", alias)])
            .send()
            .await?;
        let body: ModelVersionResponse = self.handle_response(response).await?;
        Ok(body.model_version)
    }

    async fn set_alias(
        &self,
        name: &str,
        alias: &str,
        version: &str,
    ) -> Result<(), RegistryError> {
        let response = self
            .request(reqwest::Method::POST, "/registered-models/alias")
            .json(&SetAliasRequest {
                name,
                alias,
                version,
            })
            .send()
            .await?;
        self.handle_empty_response(response).await
    }
}
