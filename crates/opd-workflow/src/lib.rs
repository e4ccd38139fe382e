//! # OPD工作流模块
//!
//! 提供门诊排队的核心工作流能力，包括：
//! - 危急程度判定：登记时一次性运行的纯规则分类
//! - 优先级排序引擎：紧急优先、同档先来先到、完成沉底的全序计算
//! - 就诊状态机：候诊 → 就诊中 → 已完成的单向推进
//! - 角色授权：显式传递的授权上下文与可注入的凭据表
//! - 变更网关：状态推进与紧急升级两类持久化变更
//! - 队列投影：把存储变更流转换为各端的实时有序视图

pub mod auth;
pub mod classifier;
pub mod gateway;
pub mod ordering;
pub mod projection;
pub mod registration;
pub mod state_machine;

// 重新导出主要类型
pub use auth::{AuthContext, Credential, CredentialTable, Role};
pub use classifier::classify;
pub use gateway::MutationGateway;
pub use ordering::{
    active_position, compare, order_queue, priority_score, queue_stats, QueueStats,
};
pub use projection::QueueProjection;
pub use registration::RegistrationService;
pub use state_machine::StatusStateMachine;
