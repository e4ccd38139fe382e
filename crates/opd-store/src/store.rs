//! 患者记录存储接口
//!
//! 核心逻辑只通过该抽象接口访问患者记录。具体实现负责分配id、服务端
//! 时间戳与当日队列号，并在每次接受写入后向订阅者推送完整的当前快照。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opd_core::{NewPatientRecord, Patient, PatientUpdate, Result};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// 队列快照回调，每次变更收到按created_at升序排列的完整集合
pub type SnapshotCallback = Box<dyn Fn(Vec<Patient>) + Send + Sync + 'static>;

/// 单个患者回调，记录不存在时收到None
pub type PatientCallback = Box<dyn Fn(Option<Patient>) + Send + Sync + 'static>;

/// 订阅取消句柄
///
/// 调用[`Subscription::cancel`]或直接释放都会停止底层监听，
/// 监听不会在进程剩余生命周期内泄漏。
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn new(task: JoinHandle<()>) -> Self {
        Self { task }
    }

    /// 取消订阅，释放底层监听
    pub fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// 患者记录存储
///
/// 所有方法都是异步调用，可能长时间挂起，调用方必须处理最终的失败
/// 路径。订阅建立失败时同步返回错误，而不是交付一个永不触发的流。
#[async_trait]
pub trait PatientStore: Send + Sync {
    /// 创建患者记录
    ///
    /// 存储层分配id、时间戳和初始候诊状态，并在同一临界区内分配当日
    /// 队列号（当日最大号+1，当日无记录时为1）。
    async fn create(&self, new: NewPatientRecord) -> Result<Patient>;

    /// 按id读取患者记录
    async fn get(&self, id: Uuid) -> Result<Option<Patient>>;

    /// 把部分字段合并进既有记录，同时写入updated_at
    ///
    /// 记录不存在时返回[`opd_core::OpdError::NotFound`]。单条记录的
    /// 合并写是原子的，并发写按后写生效。
    async fn update(&self, id: Uuid, update: PatientUpdate) -> Result<Patient>;

    /// 查询created_at >= day_start的记录，按created_at升序（创建序）
    async fn query_day(&self, day_start: DateTime<Utc>) -> Result<Vec<Patient>>;

    /// 订阅当日记录集合
    ///
    /// 建立后立即推送一次当前快照，此后每次接受的写入再推送完整快照。
    async fn subscribe_day(
        &self,
        day_start: DateTime<Utc>,
        on_change: SnapshotCallback,
    ) -> Result<Subscription>;

    /// 订阅单个患者记录
    async fn subscribe_patient(
        &self,
        id: Uuid,
        on_change: PatientCallback,
    ) -> Result<Subscription>;
}
