//! HTTP surface: the dashboard event stream plus snapshot and health probes.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use rallydash_telemetry_core::Status;
use rallydash_telemetry_hub::Subscription;
use tokio::net::TcpListener;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::AppContext;
use crate::error::{ServiceError, ServiceResult};

/// Interval between SSE keep-alive comments on an idle stream.
pub const SSE_KEEP_ALIVE: Duration = Duration::from_secs(30);

pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/sse", get(sse_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .with_state(ctx)
}

/// Serve the router on `listener` until `cancel` fires.
///
/// # Errors
///
/// [`ServiceError::Http`] if the server fails.
pub async fn serve(
    listener: TcpListener,
    ctx: AppContext,
    cancel: CancellationToken,
) -> ServiceResult<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(addr = %addr, "dashboard HTTP server listening");
    }
    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(ServiceError::Http)
}

/// One live viewer: every published status becomes a `data: <json>` event.
async fn sse_handler(State(ctx): State<AppContext>) -> Response {
    match ctx.hub.subscribe().await {
        Ok(subscription) => {
            debug!(subscriber = %subscription.id(), "SSE viewer connected");
            Sse::new(status_events(subscription))
                .keep_alive(KeepAlive::new().interval(SSE_KEEP_ALIVE))
                .into_response()
        }
        Err(error) => {
            warn!(error = %error, "rejecting SSE viewer");
            (StatusCode::SERVICE_UNAVAILABLE, error.to_string()).into_response()
        }
    }
}

fn status_events(
    mut subscription: Subscription<Status>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        while let Some(status) = subscription.recv().await {
            match Event::default().json_data(status) {
                Ok(event) => yield Ok(event),
                Err(error) => warn!(error = %error, "failed to encode status event"),
            }
        }
        debug!(subscriber = %subscription.id(), "SSE stream closed");
    }
}

async fn status_handler(State(ctx): State<AppContext>) -> Json<Status> {
    Json(ctx.aggregator.snapshot())
}

async fn health_handler() -> &'static str {
    "ok"
}
