//! # OPD Web模块
//!
//! 面向患者端、医生端与管理端的HTTP接口：登记、患者详情与位次、
//! 实时有序队列（SSE）、登录会话，以及受会话保护的状态变更与紧急
//! 升级。

pub mod auth;
pub mod handlers;
pub mod server;

// 重新导出主要类型
pub use auth::SessionManager;
pub use handlers::AppState;
pub use server::WebServer;
