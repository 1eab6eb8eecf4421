//! HTTP transport for the coordinator.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{Form, State, rejection::FormRejection},
    http::Request,
    routing::post,
};
use cyrange_core::{ContentService, RangeService};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::{
    auth::PasswordVerifier,
    coordinator::{Coordinator, GatekeeperError},
    protocol::{ClientRequest, ServerResponse},
};

/// Form POST handler.
///
/// Every handled request answers `200 OK`; failures travel in the body.
pub async fn handle_form<C, R, V>(
    State(coordinator): State<Arc<Coordinator<C, R, V>>>,
    form: Result<Form<ClientRequest>, FormRejection>,
) -> Json<ServerResponse>
where
    C: ContentService + 'static,
    R: RangeService + 'static,
    V: PasswordVerifier + 'static,
{
    let response = match form {
        Ok(Form(request)) => coordinator.handle(&request).await,
        Err(e) => {
            tracing::warn!("Unreadable client request: {e}");
            ServerResponse::error(GatekeeperError::MalformedRequest.to_string())
        }
    };
    tracing::debug!(status = response.status().unwrap_or("-"), "Server response");
    Json(response)
}

/// Create the coordinator router.
///
/// # Example
/// ```ignore
/// let app = create_router(Arc::new(coordinator));
/// axum::serve(listener, app).await?;
/// ```
#[must_use]
pub fn create_router<C, R, V>(coordinator: Arc<Coordinator<C, R, V>>) -> Router
where
    C: ContentService + 'static,
    R: RangeService + 'static,
    V: PasswordVerifier + 'static,
{
    Router::new()
        .route("/", post(handle_form::<C, R, V>))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "request",
                id = %Uuid::new_v4(),
                method = %request.method(),
                uri = %request.uri(),
            )
        }))
        .layer(CorsLayer::permissive())
        .with_state(coordinator)
}
