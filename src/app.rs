//! HTTP application: routing, request validation, and response mapping.

use crate::ai::{ModelClient, OpenAiModelClient};
use crate::models::{Config, GenerationRequest};
pub use crate::models::MISSING_ANIMAL_MESSAGE;
use crate::pipeline::StoryImagePipeline;
use crate::{render, Error, Result};
use axum::{
    extract::{RawQuery, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

pub const INTERNAL_ERROR_MESSAGE: &str = "Error processing the OpenAI response";

/// Serves the story generator over HTTP.
pub struct App {
    pipeline: Arc<StoryImagePipeline>,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub model: Arc<dyn ModelClient>,
}

#[derive(Clone)]
struct AppState {
    pipeline: Arc<StoryImagePipeline>,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(
        services: AppServices,
        call_timeout: Duration,
        max_concurrent_images: usize,
    ) -> Self {
        Self {
            pipeline: Arc::new(StoryImagePipeline::new(
                services.model,
                call_timeout,
                max_concurrent_images,
            )),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        info!(
            "Provider endpoint: {} (chat: {}, image: {}, api-version: {})",
            config.endpoint, config.chat_deployment, config.image_deployment, config.api_version
        );

        // One connection pool for both deployments.
        let http_client = reqwest::Client::new();
        let model = OpenAiModelClient::from_config(config, http_client);

        Self::with_services(
            AppServices {
                model: Arc::new(model),
            },
            config.provider_timeout,
            config.max_concurrent_images,
        )
    }

    /// Construct an app from environment configuration (`Config::from_env`).
    pub fn new() -> Result<Self> {
        let config = Config::from_env()?;
        Ok(Self::from_config(&config))
    }

    pub fn router(&self) -> Router {
        let state = AppState {
            pipeline: self.pipeline.clone(),
        };

        Router::new()
            .route("/animalgenerator", get(animal_generator_handler))
            .route("/health", get(health_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    pub async fn serve(self, addr: SocketAddr) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// First `animal` value in the query string, like a servlet `getParameter`.
fn animal_param(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == "animal")
        .map(|(_, value)| value.into_owned())
}

/// GET /animalgenerator?animal=<name>
///
/// The pipeline runs in its own task. The drop guard cancels that task's
/// provider calls if this handler is dropped (client disconnect).
async fn animal_generator_handler(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> std::result::Result<Response, ApiErrorResponse> {
    let raw = animal_param(query.as_deref());
    let request = GenerationRequest::new(raw.as_deref()).map_err(|e| {
        warn!("Rejected request: {}", e);
        ApiErrorResponse(e)
    })?;

    let request_id = Uuid::new_v4();
    let animal = request.subject().to_string();
    info!(%request_id, "Generating stories about '{}'", animal);

    let cancel = CancellationToken::new();
    let _disconnect_guard = cancel.clone().drop_guard();

    let pipeline = state.pipeline.clone();
    let subject = animal.clone();
    let span = info_span!("animal_request", %request_id);
    let task = tokio::spawn(async move { pipeline.run(&subject, &cancel).await }.instrument(span));

    let result = match task.await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            error!(%request_id, "Error during OpenAI call: {}", e);
            return Err(ApiErrorResponse(e));
        }
        Err(e) => {
            error!(%request_id, "Pipeline task failed: {}", e);
            return Err(ApiErrorResponse(Error::Generic(format!(
                "pipeline task failed: {}",
                e
            ))));
        }
    };

    info!(
        %request_id,
        "Rendering {} stories ({} without image)",
        result.len(),
        result.failed_images()
    );

    Ok((
        [(header::CONTENT_TYPE, "text/html; charset=UTF-8")],
        render::render_page(&animal, &result),
    )
        .into_response())
}

async fn health_handler() -> &'static str {
    "ok"
}

/// Maps crate errors onto the two responses callers can see. Details stay in
/// the logs.
struct ApiErrorResponse(Error);

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        if self.0.is_client_error() {
            (StatusCode::BAD_REQUEST, MISSING_ANIMAL_MESSAGE).into_response()
        } else {
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE).into_response()
        }
    }
}
