//! # OPD存储模块
//!
//! 患者记录的持久化边界。核心逻辑只依赖抽象的[`PatientStore`]接口：
//! 创建/读取/合并更新/按日查询，以及推送完整快照的变更订阅。
//! 附带一个以广播信号驱动的内存实现。

pub mod memory;
pub mod store;

// 重新导出主要类型
pub use memory::MemoryPatientStore;
pub use store::{PatientCallback, PatientStore, SnapshotCallback, Subscription};
