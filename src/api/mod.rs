//! HTTP boundary over the inventory.
//!
//! Routes:
//! - `GET /health`
//! - `GET /api/wallets/{category}?limit=N` drains up to N keypairs

mod handlers;

use std::collections::HashMap;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::info;

use crate::category::Category;
use crate::store::Inventory;
use crate::worker::StopSignal;

pub use handlers::{
    parse_limit, ApiError, KeypairPayload, LimitQuery, WalletsResponse, DEFAULT_LIMIT,
};

/// Shared state handed to every request.
#[derive(Clone)]
pub struct AppState {
    inventory: Arc<dyn Inventory>,
    categories: Arc<HashMap<String, Category>>,
}

impl AppState {
    pub fn new(inventory: Arc<dyn Inventory>, categories: impl IntoIterator<Item = Category>) -> Self {
        let categories = categories
            .into_iter()
            .map(|category| (category.name().to_string(), category))
            .collect();

        Self {
            inventory,
            categories: Arc::new(categories),
        }
    }

    pub fn inventory(&self) -> &dyn Inventory {
        self.inventory.as_ref()
    }

    /// Looks up a category by its path segment.
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.get(name)
    }
}

/// Builds the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health).fallback(handlers::not_found))
        .route(
            "/api/wallets/:category",
            get(handlers::drain_wallets).fallback(handlers::not_found),
        )
        .fallback(handlers::not_found)
        .layer(CatchPanicLayer::custom(handlers::panic_response))
        .with_state(state)
}

/// Serves the API until `stop` fires.
pub async fn serve(listener: TcpListener, state: AppState, stop: StopSignal) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "API server listening");
    info!("  GET /health");
    let mut names: Vec<_> = state.categories.keys().cloned().collect();
    names.sort();
    for name in names {
        info!("  GET /api/wallets/{}?limit={}", name, DEFAULT_LIMIT);
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(stop.stopped())
        .await
}
