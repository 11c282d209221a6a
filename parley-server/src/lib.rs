pub mod config;
pub mod registry;
pub mod relay;
pub mod status;

pub use config::ServerConfig;
pub use registry::{Room, RoomRegistry};
pub use relay::ws_handler;

use axum::{Router, routing::get};
use tower_http::cors::{Any, CorsLayer};

/// State shared by every relay handler.
#[derive(Clone)]
pub struct RelayState {
    pub registry: RoomRegistry,
}

impl RelayState {
    pub fn new() -> Self {
        Self {
            registry: RoomRegistry::new(),
        }
    }
}

impl Default for RelayState {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the relay router: the signaling socket plus the read-only status
/// endpoint. CORS is wide open so browser clients served from another origin
/// can connect.
pub fn router(state: RelayState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(relay::ws_handler))
        .route("/health", get(status::health))
        .layer(cors)
        .with_state(state)
}
