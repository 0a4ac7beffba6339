pub mod handlers;
pub mod types;
pub mod validate;

use axum::{routing::post, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::auth::AuthService;
use crate::relayer::Relayer;

#[derive(Clone)]
pub struct RpcState {
    pub auth: Arc<AuthService>,
    pub relayer: Arc<dyn Relayer>,
}

pub struct RpcServer {
    state: RpcState,
    bind_addr: String,
}

impl RpcServer {
    pub fn new(auth: Arc<AuthService>, relayer: Arc<dyn Relayer>, port: u16) -> Self {
        Self {
            state: RpcState { auth, relayer },
            bind_addr: format!("0.0.0.0:{}", port),
        }
    }

    pub async fn start(self) {
        let app = Router::new()
            .route("/", post(handlers::handle_rpc_request))
            .layer(CorsLayer::permissive())
            .with_state(self.state);

        let listener = tokio::net::TcpListener::bind(&self.bind_addr)
            .await
            .expect("Failed to bind RPC server");

        tracing::info!("RPC server listening on {}", self.bind_addr);
        axum::serve(listener, app).await.expect("RPC server failed");
    }
}
