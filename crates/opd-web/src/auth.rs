//! 登录会话管理
//!
//! 凭据表校验通过后签发不透明会话令牌，令牌在内存中映射到角色。
//! 变更路由的中间件据此还原授权上下文并放入请求扩展。

use crate::handlers::{ApiError, AppState};
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
    Json,
};
use opd_core::{OpdError, Result};
use opd_workflow::{AuthContext, CredentialTable, Role};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

/// 会话管理器
#[derive(Clone)]
pub struct SessionManager {
    credentials: CredentialTable,
    sessions: Arc<RwLock<HashMap<String, Role>>>,
}

/// 登录请求
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub user_id: String,
    pub password: String,
}

/// 登录响应
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
}

impl SessionManager {
    pub fn new(credentials: CredentialTable) -> Self {
        Self {
            credentials,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// 校验凭据并签发会话令牌
    pub async fn login(&self, user_id: &str, password: &str) -> Result<LoginResponse> {
        let ctx = self.credentials.authenticate(user_id, password)?;
        let token = Uuid::new_v4().to_string();
        self.sessions
            .write()
            .await
            .insert(token.clone(), ctx.role.clone());
        Ok(LoginResponse {
            token,
            role: ctx.role,
        })
    }

    /// 按令牌还原授权上下文
    pub async fn verify(&self, token: &str) -> Result<AuthContext> {
        self.sessions
            .read()
            .await
            .get(token)
            .map(|role| AuthContext { role: role.clone() })
            .ok_or_else(|| OpdError::Permission("Invalid or expired session token".to_string()))
    }

    /// 注销会话
    pub async fn logout(&self, token: &str) {
        self.sessions.write().await.remove(token);
    }
}

/// 认证中间件，把授权上下文放进请求扩展
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> std::result::Result<Response, ApiError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::from(OpdError::Permission("Missing bearer token".to_string())))?;

    let ctx = state.sessions.verify(token).await?;
    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

/// 登录处理器
pub async fn login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> std::result::Result<Json<LoginResponse>, ApiError> {
    info!("Login attempt for user {}", request.user_id);

    match state.sessions.login(&request.user_id, &request.password).await {
        Ok(response) => {
            info!("User {} logged in as {:?}", request.user_id, response.role);
            Ok(Json(response))
        }
        Err(e) => {
            warn!("Login failed for user {}: {}", request.user_id, e);
            Err(e.into())
        }
    }
}

/// 注销处理器
pub async fn logout_handler(
    State(state): State<AppState>,
    request: Request,
) -> std::result::Result<Json<serde_json::Value>, ApiError> {
    if let Some(token) = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
    {
        state.sessions.logout(token).await;
    }
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_login_issues_distinct_tokens() {
        let sessions = SessionManager::new(CredentialTable::default());

        let first = sessions.login("admin", "admin123").await.unwrap();
        let second = sessions.login("admin", "admin123").await.unwrap();

        assert_eq!(first.role, Role::Admin);
        assert_ne!(first.token, second.token);
    }

    #[tokio::test]
    async fn test_verify_round_trip() {
        let sessions = SessionManager::new(CredentialTable::default());

        let login = sessions.login("doctor", "doctor123").await.unwrap();
        let ctx = sessions.verify(&login.token).await.unwrap();
        assert_eq!(ctx.role, Role::Doctor);

        assert!(sessions.verify("unknown-token").await.is_err());
    }

    #[tokio::test]
    async fn test_logout_invalidates_token() {
        let sessions = SessionManager::new(CredentialTable::default());

        let login = sessions.login("admin", "admin123").await.unwrap();
        sessions.logout(&login.token).await;
        assert!(sessions.verify(&login.token).await.is_err());
    }
}
