//! HTTP处理器
//!
//! 变更失败不会在服务端保留任何乐观状态，实时流推送的下一个快照
//! 才是显示层的事实来源。

use crate::auth::SessionManager;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    Extension, Json,
};
use futures_util::stream::{self, Stream};
use opd_core::{OpdError, Patient, PatientStatus, RegistrationForm};
use opd_workflow::{AuthContext, MutationGateway, QueueProjection, QueueStats, RegistrationService};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// 应用共享状态
#[derive(Clone)]
pub struct AppState {
    pub registration: Arc<RegistrationService>,
    pub gateway: Arc<MutationGateway>,
    pub projection: Arc<QueueProjection>,
    pub sessions: SessionManager,
}

/// HTTP层错误，把统一错误映射为状态码与JSON消息
#[derive(Debug)]
pub struct ApiError(OpdError);

impl From<OpdError> for ApiError {
    fn from(err: OpdError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            OpdError::Validation(_) | OpdError::InvalidStateTransition { .. } => {
                StatusCode::BAD_REQUEST
            }
            OpdError::Permission(_) => StatusCode::UNAUTHORIZED,
            OpdError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// 状态变更请求体
#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: PatientStatus,
}

/// 位次查询响应体
#[derive(Debug, Serialize)]
pub struct PositionResponse {
    pub position: Option<usize>,
}

/// 健康检查
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// 患者登记
pub async fn register_patient(
    State(state): State<AppState>,
    Json(form): Json<RegistrationForm>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let patient = state.registration.register(form).await?;
    Ok((StatusCode::CREATED, Json(patient)))
}

/// 患者详情
///
/// 不存在的id返回独立的未找到状态，供界面渲染"无效二维码"提示。
pub async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Patient>, ApiError> {
    let patient = state
        .projection
        .patient_snapshot(id)
        .await?
        .ok_or_else(|| OpdError::NotFound(format!("Patient {} not found", id)))?;
    Ok(Json(patient))
}

/// 患者在活跃队列中的位次
pub async fn get_position(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PositionResponse>, ApiError> {
    let position = state.projection.position_snapshot(id).await?;
    Ok(Json(PositionResponse { position }))
}

/// 当日有序队列快照
pub async fn get_queue(
    State(state): State<AppState>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    Ok(Json(state.projection.queue_snapshot().await?))
}

/// 当日队列统计
pub async fn get_queue_stats(
    State(state): State<AppState>,
) -> Result<Json<QueueStats>, ApiError> {
    Ok(Json(state.projection.stats_snapshot().await?))
}

/// 实时有序队列（SSE）
///
/// 订阅句柄保存在流状态里，连接断开、流被释放时订阅随之取消。
pub async fn queue_stream(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>, ApiError> {
    let (tx, rx) = mpsc::unbounded_channel();
    let subscription = state
        .projection
        .watch_queue(move |queue| {
            let _ = tx.send(queue);
        })
        .await?;

    let stream = stream::unfold((rx, subscription), |(mut rx, subscription)| async move {
        let queue = rx.recv().await?;
        let event = match serde_json::to_string(&queue) {
            Ok(data) => Event::default().data(data),
            Err(e) => Event::default().comment(format!("serialization error: {}", e)),
        };
        Some((Ok::<_, Infallible>(event), (rx, subscription)))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// 推进就诊状态（需登录）
pub async fn set_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusUpdateRequest>,
) -> Result<Json<Patient>, ApiError> {
    Ok(Json(state.gateway.set_status(&ctx, id, body.status).await?))
}

/// 升级为紧急（需登录，仅管理员）
pub async fn escalate(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Patient>, ApiError> {
    Ok(Json(state.gateway.escalate_to_emergency(&ctx, id).await?))
}
