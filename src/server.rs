//! HTTP server for the issue tracker
//!
//! Exposes the [`IssueGateway`] as a REST API.
//!
//! # Routes
//!
//! - `GET /health` - Liveness check
//! - `GET /api/issues/{project}` - List issues (query parameters filter by field)
//! - `POST /api/issues/{project}` - Create an issue
//! - `PUT /api/issues/{project}` - Update an issue (body: `{"_id": "...", ...}`)
//! - `DELETE /api/issues/{project}` - Delete an issue (body: `{"_id": "..."}`)
//!
//! Bodies may be JSON or `application/x-www-form-urlencoded`.
//!
//! Validation failures are reported as `200 OK` with an `{"error": ...}` body.
//! Only storage faults on list and create produce a `500`.
//!
//! # Example
//!
//! ```no_run
//! use issue_tracker::config::ServerConfig;
//! use issue_tracker::server::IssueServer;
//! use issue_tracker::storage::MemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = IssueServer::new(Arc::new(MemoryStore::new()), ServerConfig::default());
//!     server.run().await.expect("Server failed");
//! }
//! ```

use crate::config::ServerConfig;
use crate::gateway::{CreateOutcome, DeleteOutcome, IssueGateway, UpdateOutcome};
use crate::issue::{Fields, Issue};
use crate::storage::IssueStore;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, FromRequest, Path, Query, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;

/// Server error types
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bind error: {0}")]
    Bind(String),
}

/// Shared server state
struct AppState {
    gateway: IssueGateway,
}

/// HTTP server for the issue tracker
pub struct IssueServer {
    state: Arc<AppState>,
    config: ServerConfig,
}

impl IssueServer {
    /// Create a server over the given store
    pub fn new(store: Arc<dyn IssueStore>, config: ServerConfig) -> Self {
        Self {
            state: Arc::new(AppState {
                gateway: IssueGateway::new(store),
            }),
            config,
        }
    }

    /// Build the router
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health))
            .route(
                "/api/issues/{project}",
                get(list_issues)
                    .post(create_issue)
                    .put(update_issue)
                    .delete(delete_issue),
            )
            .layer(DefaultBodyLimit::max(self.config.max_body_size))
            .with_state(self.state.clone())
    }

    /// Run the server on the configured address until Ctrl-C
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(&self.config.bind)
            .await
            .map_err(|e| ServerError::Bind(format!("{}: {}", self.config.bind, e)))?;

        tracing::info!(
            addr = %self.config.bind,
            max_body_size = self.config.max_body_size,
            "Issue tracker listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(ServerError::Io)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

// ============================================================================
// Request/Response types
// ============================================================================

/// Error response
///
/// `_id` is echoed back whenever the client supplied one.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            id: None,
        }
    }

    pub fn for_id(error: impl Into<String>, id: String) -> Self {
        Self {
            error: error.into(),
            id: Some(id),
        }
    }
}

/// Success response for update and delete
#[derive(Debug, Serialize)]
pub struct ResultResponse {
    pub result: String,
    #[serde(rename = "_id")]
    pub id: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message)))
}

fn server_error(message: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(message)),
    )
}

impl IntoResponse for CreateOutcome {
    fn into_response(self) -> Response {
        match self {
            CreateOutcome::Created(issue) => Json(issue).into_response(),
            CreateOutcome::MissingFields => {
                Json(ErrorResponse::new("required field(s) missing")).into_response()
            }
        }
    }
}

impl IntoResponse for UpdateOutcome {
    fn into_response(self) -> Response {
        match self {
            UpdateOutcome::MissingId => Json(ErrorResponse::new("missing _id")).into_response(),
            UpdateOutcome::NoFields { id } => {
                Json(ErrorResponse::for_id("no update field(s) sent", id)).into_response()
            }
            UpdateOutcome::NotUpdated { id } => {
                Json(ErrorResponse::for_id("could not update", id)).into_response()
            }
            UpdateOutcome::Updated { id } => Json(ResultResponse {
                result: "successfully updated".to_string(),
                id,
            })
            .into_response(),
        }
    }
}

impl IntoResponse for DeleteOutcome {
    fn into_response(self) -> Response {
        match self {
            DeleteOutcome::MissingId => Json(ErrorResponse::new("missing _id")).into_response(),
            DeleteOutcome::NotDeleted { id } => {
                Json(ErrorResponse::for_id("could not delete", id)).into_response()
            }
            DeleteOutcome::Deleted { id } => Json(ResultResponse {
                result: "successfully deleted".to_string(),
                id,
            })
            .into_response(),
        }
    }
}

/// Request body as a field set, from either JSON or a form post
///
/// An empty body is an empty field set.
pub struct IssueForm(pub Fields);

impl<S> FromRequest<S> for IssueForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|e| bad_request(e.body_text()))?;
            return Ok(Self(pairs.into_iter().collect()));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| bad_request(e.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(Fields::new()));
        }

        let map: Map<String, Value> = serde_json::from_slice(&bytes)
            .map_err(|e| bad_request(format!("Invalid JSON body: {}", e)))?;
        Ok(Self(map.into()))
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_issues(
    State(state): State<Arc<AppState>>,
    Path(project): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Issue>>, ApiError> {
    let params = params.iter().map(|(k, v)| (k.as_str(), v.as_str()));
    let issues = state
        .gateway
        .list(&project, params)
        .await
        .map_err(|_| server_error("Server error"))?;
    Ok(Json(issues))
}

async fn create_issue(
    State(state): State<Arc<AppState>>,
    Path(project): Path<String>,
    IssueForm(fields): IssueForm,
) -> Result<CreateOutcome, ApiError> {
    state
        .gateway
        .create(&project, &fields)
        .await
        .map_err(|_| server_error("Could not create issue"))
}

async fn update_issue(
    State(state): State<Arc<AppState>>,
    Path(project): Path<String>,
    IssueForm(fields): IssueForm,
) -> UpdateOutcome {
    tracing::debug!(project = %project, "Update request");
    state.gateway.update(&fields).await
}

async fn delete_issue(
    State(state): State<Arc<AppState>>,
    Path(project): Path<String>,
    IssueForm(fields): IssueForm,
) -> DeleteOutcome {
    tracing::debug!(project = %project, "Delete request");
    state.gateway.delete(&fields).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn create_test_server() -> IssueServer {
        IssueServer::new(Arc::new(MemoryStore::new()), ServerConfig::default())
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_server().router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_form_body_create() {
        let app = create_test_server().router();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/issues/forms")
                    .header("Content-Type", "application/x-www-form-urlencoded")
                    .body(Body::from(
                        "issue_title=Form+Title&issue_text=From%20a%20form&created_by=web&assigned_to=",
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["issue_title"], "Form Title");
        assert_eq!(body["issue_text"], "From a form");
        assert_eq!(body["assigned_to"], "");
        assert_eq!(body["project"], "forms");
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = create_test_server().router();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/issues/test")
                    .header("Content-Type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON body"));
    }

    #[tokio::test]
    async fn test_empty_body_delete() {
        let app = create_test_server().router();

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/issues/test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "error": "missing _id" })
        );
    }

    #[test]
    fn test_error_response_shape() {
        let plain = serde_json::to_value(ErrorResponse::new("missing _id")).unwrap();
        assert_eq!(plain, serde_json::json!({ "error": "missing _id" }));

        let with_id =
            serde_json::to_value(ErrorResponse::for_id("could not delete", "abc".into())).unwrap();
        assert_eq!(
            with_id,
            serde_json::json!({ "error": "could not delete", "_id": "abc" })
        );
    }
}
