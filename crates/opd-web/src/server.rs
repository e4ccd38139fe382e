//! Web服务器

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use opd_core::{OpdError, Result};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::auth::{auth_middleware, login_handler, logout_handler};
use crate::handlers::{
    escalate, get_patient, get_position, get_queue, get_queue_stats, health, queue_stream,
    register_patient, set_status, AppState,
};

pub struct WebServer {
    addr: SocketAddr,
    app: Router,
}

impl WebServer {
    pub fn new(addr: SocketAddr, state: AppState) -> Self {
        let app = Self::create_app(state);
        Self { addr, app }
    }

    fn create_app(state: AppState) -> Router {
        // 需要登录的变更路由
        let protected = Router::new()
            .route("/patients/:id/status", put(set_status))
            .route("/patients/:id/escalate", post(escalate))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            ));

        // 公开路由：登记、查询与实时流
        let api = Router::new()
            .route("/auth/login", post(login_handler))
            .route("/auth/logout", post(logout_handler))
            .route("/patients", post(register_patient))
            .route("/patients/:id", get(get_patient))
            .route("/patients/:id/position", get(get_position))
            .route("/queue", get(get_queue))
            .route("/queue/stats", get(get_queue_stats))
            .route("/queue/stream", get(queue_stream))
            .merge(protected);

        Router::new()
            // 健康检查
            .route("/health", get(health))
            // API路由
            .nest("/api/v1", api)
            .with_state(state)
            // 全局中间件
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(
                        CorsLayer::new()
                            .allow_origin(Any)
                            .allow_methods(Any)
                            .allow_headers(Any),
                    ),
            )
    }

    pub async fn run(self) -> Result<()> {
        info!("Starting OPD web server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, self.app)
            .await
            .map_err(|e| OpdError::Internal(format!("web server error: {}", e)))?;

        Ok(())
    }
}
