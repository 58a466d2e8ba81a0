//! # Web form server
//!
//! Serves the upload form at `/` and a liveness probe at `/health`.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::page::{PageContext, PageRenderer, TemplateError};
use super::upload::{check_upload, UploadError, UploadPair};
use crate::core::{Checker, Config};
use crate::schema::ReportMode;

const SUCCESS_MESSAGE: &str = "Validation successful!";

/// Web server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory uploads are staged in; created on first use
    pub upload_dir: PathBuf,
    pub report: ReportMode,
}

impl ServerConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            host: config.host(),
            port: config.port(),
            upload_dir: config.upload_dir(),
            report: config.report_mode(),
        }
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Shared, read-only state of the form routes
pub struct FormState {
    checker: Checker,
    upload_dir: PathBuf,
    pages: PageRenderer,
}

impl FormState {
    pub fn new(config: &ServerConfig) -> Result<Self, TemplateError> {
        Ok(Self {
            checker: Checker::new(config.report),
            upload_dir: config.upload_dir.clone(),
            pages: PageRenderer::new()?,
        })
    }

    fn render(&self, status: StatusCode, page: &PageContext) -> Response {
        match self.pages.render_index(page) {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => {
                tracing::error!("failed to render page: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
        }
    }
}

/// HTTP server for the upload form
pub struct FormServer {
    config: ServerConfig,
    router: Router,
}

impl FormServer {
    pub fn with_config(config: ServerConfig) -> Result<Self, TemplateError> {
        let state = Arc::new(FormState::new(&config)?);
        let router = build_router(state);
        Ok(Self { config, router })
    }

    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Bind and serve until the process is stopped
    pub async fn start(self) -> Result<(), std::io::Error> {
        let listener = TcpListener::bind(self.config.socket_addr()).await?;
        let addr = listener.local_addr()?;

        tracing::info!(
            upload_dir = %self.config.upload_dir.display(),
            report = %self.config.report,
            "validator form listening on http://{}",
            addr
        );

        axum::serve(listener, self.router).await
    }
}

/// Build the router over an existing form state
pub fn build_router(state: Arc<FormState>) -> Router {
    Router::new()
        .route("/", get(index_handler).post(submit_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index_handler(State(state): State<Arc<FormState>>) -> Response {
    state.render(StatusCode::OK, &PageContext::default())
}

async fn submit_handler(
    State(state): State<Arc<FormState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            tracing::warn!("rejected upload without a multipart body: {}", rejection);
            let page = PageContext::with_errors(UploadError::MissingFile.messages());
            return state.render(StatusCode::BAD_REQUEST, &page);
        }
    };

    let result = async {
        let upload = UploadPair::from_multipart(multipart).await?;
        check_upload(state.checker, &state.upload_dir, &upload).await
    }
    .await;

    match result {
        Ok(messages) if messages.is_empty() => {
            tracing::info!("payload conforms");
            state.render(StatusCode::OK, &PageContext::success(SUCCESS_MESSAGE))
        }
        Ok(messages) => {
            tracing::info!(violations = messages.len(), "payload rejected");
            state.render(StatusCode::OK, &PageContext::with_errors(messages))
        }
        Err(e @ UploadError::Multipart(_)) => {
            tracing::warn!("malformed upload: {}", e);
            state.render(StatusCode::BAD_REQUEST, &PageContext::with_errors(e.messages()))
        }
        Err(e) => {
            if matches!(e, UploadError::Io(_) | UploadError::Task(_)) {
                tracing::error!("upload handling failed: {}", e);
            }
            state.render(StatusCode::OK, &PageContext::with_errors(e.messages()))
        }
    }
}

async fn health_handler() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "apival-test-boundary";
    const SCHEMA: &str = "type: object\nproperties:\n  name:\n    type: string\nrequired: [name]\n";

    fn test_app(upload_dir: PathBuf) -> Router {
        let config = ServerConfig {
            upload_dir,
            ..ServerConfig::default()
        };
        FormServer::with_config(config).unwrap().router()
    }

    /// (field name, file name, content)
    fn multipart_request(parts: &[(&str, &str, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (field, file_name, content) in parts {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n{content}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));

        Request::builder()
            .method("POST")
            .uri("/")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            port: 8080,
            ..ServerConfig::default()
        };
        assert_eq!(config.socket_addr(), "127.0.0.1:8080");
    }

    #[tokio::test]
    async fn test_health() {
        let tmp = TempDir::new().unwrap();
        let app = test_app(tmp.path().to_path_buf());

        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
    }

    #[tokio::test]
    async fn test_get_renders_form() {
        let tmp = TempDir::new().unwrap();
        let app = test_app(tmp.path().to_path_buf());

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("name=\"schema_file\""));
    }

    #[tokio::test]
    async fn test_valid_upload_reports_success() {
        let tmp = TempDir::new().unwrap();
        let upload_dir = tmp.path().join("uploads");
        let app = test_app(upload_dir.clone());

        let request = multipart_request(&[
            ("schema_file", "schema.yaml", SCHEMA),
            ("json_file", "payload.json", r#"{"name": "Test"}"#),
        ]);
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        assert!(html.contains("Validation successful!"));
        assert!(!html.contains("Validation Errors"));
        assert_eq!(std::fs::read_dir(&upload_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_payload_lists_violation() {
        let tmp = TempDir::new().unwrap();
        let app = test_app(tmp.path().to_path_buf());

        let request = multipart_request(&[
            ("schema_file", "schema.yml", SCHEMA),
            ("json_file", "payload.json", r#"{"age": 30}"#),
        ]);
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        assert!(html.contains("Validation Errors"));
        assert!(html.contains("is a required property"));
        assert!(!html.contains("Validation successful!"));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_wrong_extensions_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let app = test_app(tmp.path().to_path_buf());

        let request = multipart_request(&[
            ("schema_file", "schema.txt", SCHEMA),
            ("json_file", "payload.xml", "{}"),
        ]);
        let response = app.oneshot(request).await.unwrap();

        let html = body_text(response).await;
        assert!(html.contains("Schema file must be a YAML file"));
        assert!(html.contains("Payload file must be a JSON file"));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_non_multipart_post_renders_page() {
        let tmp = TempDir::new().unwrap();
        let app = test_app(tmp.path().to_path_buf());

        let request = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from("x"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let html = body_text(response).await;
        assert!(html.contains("name=\"schema_file\""));
        assert!(html.contains("Both schema and JSON files are required."));
    }

    #[tokio::test]
    async fn test_truncated_multipart_renders_page() {
        let tmp = TempDir::new().unwrap();
        let app = test_app(tmp.path().to_path_buf());

        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"schema_file\"; filename=\"schema.yaml\"\r\n\r\ntype: obj"
        );
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let html = body_text(response).await;
        assert!(html.contains("name=\"json_file\""));
        assert!(html.contains("Malformed upload"));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_missing_field() {
        let tmp = TempDir::new().unwrap();
        let app = test_app(tmp.path().to_path_buf());

        let request = multipart_request(&[("schema_file", "schema.yaml", SCHEMA)]);
        let response = app.oneshot(request).await.unwrap();

        let html = body_text(response).await;
        assert!(html.contains("Both schema and JSON files are required."));
    }
}
