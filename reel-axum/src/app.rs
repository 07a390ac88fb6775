use std::future::Future;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::routes;
use crate::state::BlobAppState;
use crate::upload;

/// The routes, without the request-id and tracing layers
pub fn blob_routes(state: BlobAppState) -> Router<()> {
    let body_limit = state.limits.body_limit();

    Router::new()
        .route("/files/{id}", get(routes::get_file))
        .route("/stream/video/{id}", get(routes::stream_video))
        .route(
            "/admin/uploads",
            post(upload::upload).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/health", get(routes::health))
        .with_state(state)
}

pub struct ReelApp {
    pub state: BlobAppState,
    pub router: Router<()>,
}

impl ReelApp {
    pub fn new(state: BlobAppState) -> Self {
        let router = blob_routes(state.clone());
        Self { state, router }
    }

    /// The finished router: every request gets an `x-request-id` (kept if
    /// the client sent one) and a tracing span.
    pub fn into_router(self) -> Router<()> {
        self.router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
    }

    pub async fn listen<A, F>(self, addr: A, shutdown: F) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "listening");
        axum::serve(listener, self.into_router())
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}
