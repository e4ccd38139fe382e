//! 队列投影服务
//!
//! 把存储层的变更流转换为有序的实时视图。每次通知都对完整快照重新
//! 排序，不做增量修补，因此对通知到达顺序不敏感。各订阅相互独立，
//! 不保证跨流的瞬时一致，界面层需容忍短暂分歧。

use crate::ordering::{active_position, order_queue, queue_stats, QueueStats};
use opd_core::{utils::start_of_today, Patient, Result};
use opd_store::{PatientStore, Subscription};
use std::sync::Arc;
use uuid::Uuid;

/// 队列投影服务
pub struct QueueProjection {
    store: Arc<dyn PatientStore>,
}

impl QueueProjection {
    pub fn new(store: Arc<dyn PatientStore>) -> Self {
        Self { store }
    }

    /// 订阅当日全量有序队列（医生端/管理端视图）
    ///
    /// 日界取订阅建立时刻的本地午夜。订阅建立失败时同步返回错误；
    /// 返回的句柄取消或释放后停止推送。
    pub async fn watch_queue<F>(&self, on_update: F) -> Result<Subscription>
    where
        F: Fn(Vec<Patient>) + Send + Sync + 'static,
    {
        self.store
            .subscribe_day(
                start_of_today(),
                Box::new(move |records| on_update(order_queue(records))),
            )
            .await
    }

    /// 订阅单个患者在活跃队列中的1-based位次（患者状态页）
    ///
    /// 患者已完成或不存在时推送None。
    pub async fn watch_patient_position<F>(&self, id: Uuid, on_update: F) -> Result<Subscription>
    where
        F: Fn(Option<usize>) + Send + Sync + 'static,
    {
        self.store
            .subscribe_day(
                start_of_today(),
                Box::new(move |records| {
                    let ordered = order_queue(records);
                    on_update(active_position(&ordered, id));
                }),
            )
            .await
    }

    /// 订阅单个患者记录的实时详情
    ///
    /// 患者状态页把它与[`QueueProjection::watch_patient_position`]组合使用。
    pub async fn watch_patient<F>(&self, id: Uuid, on_update: F) -> Result<Subscription>
    where
        F: Fn(Option<Patient>) + Send + Sync + 'static,
    {
        self.store.subscribe_patient(id, Box::new(on_update)).await
    }

    /// 当日有序队列的一次性快照
    pub async fn queue_snapshot(&self) -> Result<Vec<Patient>> {
        Ok(order_queue(self.store.query_day(start_of_today()).await?))
    }

    /// 当日队列统计的一次性快照
    pub async fn stats_snapshot(&self) -> Result<QueueStats> {
        Ok(queue_stats(&self.store.query_day(start_of_today()).await?))
    }

    /// 单个患者当前位次的一次性快照
    pub async fn position_snapshot(&self, id: Uuid) -> Result<Option<usize>> {
        let ordered = order_queue(self.store.query_day(start_of_today()).await?);
        Ok(active_position(&ordered, id))
    }

    /// 单个患者记录的一次性读取
    pub async fn patient_snapshot(&self, id: Uuid) -> Result<Option<Patient>> {
        self.store.get(id).await
    }
}
