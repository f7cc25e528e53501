//! MLflow client tests against an in-process fake of the MLflow REST API.

use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use model_promoter::config::{Credentials, RegistryConfig};
use model_promoter::error::PromotionError;
use model_promoter::models::Stage;
use model_promoter::output::GithubOutput;
use model_promoter::promote::Promoter;
use model_promoter::registry::{InMemoryRegistry, MlflowClient, ModelRegistry, RegistryError};

// ============================================================
// Fake MLflow server
// ============================================================

#[derive(Clone)]
struct FakeMlflow {
    registry: InMemoryRegistry,
    token: Option<String>,
}

#[derive(Deserialize)]
struct VersionQuery {
    name: String,
    version: String,
}

#[derive(Deserialize)]
struct AliasQuery {
    name: String,
    alias: String,
}

#[derive(Deserialize)]
struct SetAliasBody {
    name: String,
    alias: String,
    version: String,
}

fn authorize(state: &FakeMlflow, headers: &HeaderMap) -> Result<(), Response> {
    let Some(ref token) = state.token else {
        return Ok(());
    };
    let expected = format!("Bearer {}", token);
    match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error_code": "UNAUTHENTICATED", "message": "missing token"})),
        )
            .into_response()),
    }
}

fn error_response(err: RegistryError) -> Response {
    let (status, code, message) = match err {
        RegistryError::NotFound(msg) => (StatusCode::NOT_FOUND, "RESOURCE_DOES_NOT_EXIST", msg),
        RegistryError::BadRequest(msg) => {
            (StatusCode::BAD_REQUEST, "INVALID_PARAMETER_VALUE", msg)
        }
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            other.to_string(),
        ),
    };
    (status, Json(json!({"error_code": code, "message": message}))).into_response()
}

async fn get_model_version(
    State(state): State<FakeMlflow>,
    headers: HeaderMap,
    Query(query): Query<VersionQuery>,
) -> Response {
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    match state
        .registry
        .get_version_by_number(&query.name, &query.version)
        .await
    {
        Ok(version) => Json(json!({ "model_version": version })).into_response(),
        Err(err) => error_response(err),
    }
}

async fn get_model_version_by_alias(
    State(state): State<FakeMlflow>,
    headers: HeaderMap,
    Query(query): Query<AliasQuery>,
) -> Response {
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    match state
        .registry
        .get_version_by_alias(&query.name, &query.alias)
        .await
    {
        Ok(version) => Json(json!({ "model_version": version })).into_response(),
        Err(err) => error_response(err),
    }
}

async fn set_registered_model_alias(
    State(state): State<FakeMlflow>,
    headers: HeaderMap,
    Json(body): Json<SetAliasBody>,
) -> Response {
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    match state
        .registry
        .set_alias(&body.name, &body.alias, &body.version)
        .await
    {
        Ok(()) => Json(json!({})).into_response(),
        Err(err) => error_response(err),
    }
}

fn fake_router(state: FakeMlflow) -> Router {
    let api = Router::new()
        .route("/model-versions/get", get(get_model_version))
        .route("/registered-models/alias", get(get_model_version_by_alias))
        .route("/registered-models/alias", post(set_registered_model_alias));

    Router::new()
        .nest("/api/2.0/mlflow", api)
        .with_state(state)
}

/// Serve the fake on an ephemeral port and return its base URL.
async fn spawn(state: FakeMlflow) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, fake_router(state))
            .await
            .expect("Fake server crashed");
    });
    format!("http://{}", addr)
}

/// Fake with "foo" versions 1 and 2; version 1 is in staging.
async fn setup() -> (MlflowClient, InMemoryRegistry) {
    let registry = InMemoryRegistry::new();
    registry.register_version("foo");
    registry.register_version("foo");
    registry
        .set_alias("foo", "staging", "1")
        .await
        .expect("Failed to seed alias");

    let url = spawn(FakeMlflow {
        registry: registry.clone(),
        token: None,
    })
    .await;
    (MlflowClient::new(url), registry)
}

// ============================================================
// Client operations
// ============================================================

mod lookups {
    use super::*;

    #[tokio::test]
    async fn resolves_version_by_number() {
        let (client, _registry) = setup().await;

        let version = client
            .get_version_by_number("foo", "2")
            .await
            .expect("Lookup failed");

        assert_eq!(version.name, "foo");
        assert_eq!(version.version, "2");
        assert_eq!(version.status.as_deref(), Some("READY"));
        assert!(version.aliases.is_empty());
    }

    #[tokio::test]
    async fn resolves_version_by_alias() {
        let (client, _registry) = setup().await;

        let version = client
            .get_version_by_alias("foo", "staging")
            .await
            .expect("Lookup failed");

        assert_eq!(version.version, "1");
        assert_eq!(version.aliases, vec!["staging".to_string()]);
    }

    #[tokio::test]
    async fn maps_404_to_not_found_with_registry_message() {
        let (client, _registry) = setup().await;

        let err = client
            .get_version_by_number("foo", "99")
            .await
            .expect_err("Lookup should fail");

        match err {
            RegistryError::NotFound(msg) => assert!(msg.starts_with("RESOURCE_DOES_NOT_EXIST")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn maps_400_to_bad_request() {
        let (client, _registry) = setup().await;

        let err = client
            .get_version_by_number("foo", "2abc")
            .await
            .expect_err("Lookup should fail");

        assert!(matches!(err, RegistryError::BadRequest(_)));
    }

    #[tokio::test]
    async fn encodes_query_parameters() {
        let registry = InMemoryRegistry::new();
        registry.register_version("team a/model&x");
        let url = spawn(FakeMlflow {
            registry,
            token: None,
        })
        .await;

        let version = MlflowClient::new(url)
            .get_version_by_number("team a/model&x", "1")
            .await
            .expect("Lookup failed");

        assert_eq!(version.name, "team a/model&x");
    }
}

mod aliases {
    use super::*;

    #[tokio::test]
    async fn set_alias_points_alias_at_version() {
        let (client, registry) = setup().await;

        client
            .set_alias("foo", "production", "2")
            .await
            .expect("Set alias failed");

        assert_eq!(registry.alias_target("foo", "production").as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn set_alias_on_unknown_version_fails() {
        let (client, registry) = setup().await;

        let err = client
            .set_alias("foo", "production", "7")
            .await
            .expect_err("Set alias should fail");

        assert!(matches!(err, RegistryError::NotFound(_)));
        assert!(registry.alias_target("foo", "production").is_none());
    }
}

mod authentication {
    use super::*;

    async fn setup_with_token(token: &str) -> String {
        let registry = InMemoryRegistry::new();
        registry.register_version("foo");
        spawn(FakeMlflow {
            registry,
            token: Some(token.to_string()),
        })
        .await
    }

    #[tokio::test]
    async fn sends_bearer_token_from_config() {
        let url = setup_with_token("s3cret").await;
        let config = RegistryConfig {
            tracking_uri: url,
            credentials: Some(Credentials::Bearer("s3cret".to_string())),
            timeout: Duration::from_secs(5),
        };
        let client = MlflowClient::from_config(&config).expect("Failed to build client");

        let version = client
            .get_version_by_number("foo", "1")
            .await
            .expect("Lookup failed");

        assert_eq!(version.version, "1");
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let url = setup_with_token("s3cret").await;

        let err = MlflowClient::new(url)
            .get_version_by_number("foo", "1")
            .await
            .expect_err("Lookup should fail");

        assert!(matches!(err, RegistryError::Unauthorized));
    }
}

mod transport {
    use super::*;

    #[tokio::test]
    async fn unreachable_registry_is_http_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("No local address");
        drop(listener);

        let err = MlflowClient::new(format!("http://{}", addr))
            .get_version_by_alias("foo", "staging")
            .await
            .expect_err("Lookup should fail");

        assert!(matches!(err, RegistryError::Http(_)));
    }
}

// ============================================================
// End-to-end promotion over HTTP
// ============================================================

mod promotion {
    use super::*;

    #[tokio::test]
    async fn promotes_raw_version_to_staging() {
        let (client, registry) = setup().await;
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("github_output");

        let mut sink = GithubOutput::open(&path).expect("Failed to open output");
        let promotion = Promoter::new(client)
            .promote("foo/2", Stage::Staging, &mut sink)
            .await
            .expect("Promotion failed");

        assert_eq!(promotion.version, "2");
        assert_eq!(registry.alias_target("foo", "staging").as_deref(), Some("2"));
        assert_eq!(
            std::fs::read_to_string(&path).expect("Failed to read output"),
            "version=foo/2\n"
        );
    }

    #[tokio::test]
    async fn promotes_staging_to_production() {
        let (client, registry) = setup().await;
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("github_output");

        let mut sink = GithubOutput::open(&path).expect("Failed to open output");
        Promoter::new(client)
            .promote("foo@staging", Stage::Production, &mut sink)
            .await
            .expect("Promotion failed");

        assert_eq!(registry.alias_target("foo", "production").as_deref(), Some("1"));
        assert_eq!(
            std::fs::read_to_string(&path).expect("Failed to read output"),
            "version=foo/1\n"
        );
    }

    #[tokio::test]
    async fn mismatch_never_touches_registry_or_output() {
        let (client, registry) = setup().await;
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("github_output");
        let before = registry.aliases("foo");

        let mut sink = GithubOutput::open(&path).expect("Failed to open output");
        let err = Promoter::new(client)
            .promote("foo@staging", Stage::Archived, &mut sink)
            .await
            .expect_err("Promotion should fail");

        assert!(matches!(
            err,
            PromotionError::StageMismatch {
                requested: Stage::Archived,
                implied: Stage::Production
            }
        ));
        assert_eq!(registry.aliases("foo"), before);
        assert_eq!(
            std::fs::read_to_string(&path).expect("Failed to read output"),
            ""
        );
    }
}
