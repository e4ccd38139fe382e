//! 内存存储实现
//!
//! 读写锁保护的文档表加广播变更信号。订阅是独立任务，在每个信号上
//! 重新读取完整快照后回调，因此对通知到达顺序和信号滞后都不敏感。

use crate::store::{PatientCallback, PatientStore, SnapshotCallback, Subscription};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opd_core::{
    utils::start_of_today, NewPatientRecord, OpdError, Patient, PatientStatus, PatientUpdate,
    Result,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

/// 变更广播缓冲大小，滞后的订阅者下一轮读到的仍是最新快照
const CHANGE_BUFFER: usize = 64;

/// 内存患者存储
pub struct MemoryPatientStore {
    records: Arc<RwLock<HashMap<Uuid, Patient>>>,
    changes: broadcast::Sender<()>,
}

impl MemoryPatientStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            changes,
        }
    }

    fn notify(&self) {
        // 没有活跃订阅者时发送失败，忽略即可
        let _ = self.changes.send(());
    }

    /// 当日下一个队列号，调用方需持有写锁
    fn next_queue_number(records: &HashMap<Uuid, Patient>, day_start: DateTime<Utc>) -> u32 {
        records
            .values()
            .filter(|p| p.created_at >= day_start)
            .map(|p| p.queue_number)
            .max()
            .map_or(1, |max| max + 1)
    }

    fn day_snapshot(records: &HashMap<Uuid, Patient>, day_start: DateTime<Utc>) -> Vec<Patient> {
        let mut snapshot: Vec<Patient> = records
            .values()
            .filter(|p| p.created_at >= day_start)
            .cloned()
            .collect();
        // created_at升序即创建序；同一瞬间落库的记录按队列号定序
        snapshot.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.queue_number.cmp(&b.queue_number))
        });
        snapshot
    }
}

impl Default for MemoryPatientStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PatientStore for MemoryPatientStore {
    async fn create(&self, new: NewPatientRecord) -> Result<Patient> {
        let now = Utc::now();
        let patient = {
            let mut records = self.records.write().await;
            // 队列号分配与插入同处一个临界区，并发登记取不到相同号码
            let queue_number = Self::next_queue_number(&records, start_of_today());
            let patient = Patient {
                id: Uuid::new_v4(),
                name: new.name,
                age: new.age,
                symptom: new.symptom,
                critical_level: new.critical_level,
                queue_number,
                status: PatientStatus::Waiting,
                created_at: now,
                updated_at: now,
            };
            records.insert(patient.id, patient.clone());
            patient
        };

        tracing::info!(
            "Created patient {} with queue number {}",
            patient.id,
            patient.queue_number
        );
        self.notify();
        Ok(patient)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Patient>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn update(&self, id: Uuid, update: PatientUpdate) -> Result<Patient> {
        let patient = {
            let mut records = self.records.write().await;
            let patient = records
                .get_mut(&id)
                .ok_or_else(|| OpdError::NotFound(format!("Patient {} not found", id)))?;
            if let Some(status) = update.status {
                patient.status = status;
            }
            if let Some(level) = update.critical_level {
                patient.critical_level = level;
            }
            patient.updated_at = Utc::now();
            patient.clone()
        };

        self.notify();
        Ok(patient)
    }

    async fn query_day(&self, day_start: DateTime<Utc>) -> Result<Vec<Patient>> {
        let records = self.records.read().await;
        Ok(Self::day_snapshot(&records, day_start))
    }

    async fn subscribe_day(
        &self,
        day_start: DateTime<Utc>,
        on_change: SnapshotCallback,
    ) -> Result<Subscription> {
        // 先订阅再起任务，订阅建立与首次快照之间的写入不会丢失
        let mut rx = self.changes.subscribe();
        let records = self.records.clone();
        let task = tokio::spawn(async move {
            loop {
                let snapshot = {
                    let records = records.read().await;
                    Self::day_snapshot(&records, day_start)
                };
                on_change(snapshot);
                match rx.recv().await {
                    Ok(()) => {}
                    // 滞后只意味着错过中间信号，下一轮读取的仍是最新状态
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Ok(Subscription::new(task))
    }

    async fn subscribe_patient(
        &self,
        id: Uuid,
        on_change: PatientCallback,
    ) -> Result<Subscription> {
        let mut rx = self.changes.subscribe();
        let records = self.records.clone();
        let task = tokio::spawn(async move {
            loop {
                let snapshot = records.read().await.get(&id).cloned();
                on_change(snapshot);
                match rx.recv().await {
                    Ok(()) => {}
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Ok(Subscription::new(task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opd_core::{CriticalityLevel, Symptom};
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    fn record(name: &str) -> NewPatientRecord {
        NewPatientRecord {
            name: name.to_string(),
            age: 30,
            symptom: Symptom::Cold,
            critical_level: CriticalityLevel::Normal,
        }
    }

    async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
        timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for snapshot")
            .expect("channel closed")
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_queue_numbers() {
        let store = MemoryPatientStore::new();
        let a = store.create(record("A")).await.unwrap();
        let b = store.create(record("B")).await.unwrap();
        let c = store.create(record("C")).await.unwrap();

        assert_eq!(a.queue_number, 1);
        assert_eq!(b.queue_number, 2);
        assert_eq!(c.queue_number, 3);
        assert_eq!(a.status, PatientStatus::Waiting);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = MemoryPatientStore::new();
        let created = store.create(record("A")).await.unwrap();

        let updated = store
            .update(created.id, PatientUpdate::status(PatientStatus::InConsultation))
            .await
            .unwrap();

        assert_eq!(updated.status, PatientStatus::InConsultation);
        assert_eq!(updated.critical_level, CriticalityLevel::Normal);
        assert_eq!(updated.queue_number, created.queue_number);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_patient_is_not_found() {
        let store = MemoryPatientStore::new();
        let err = store
            .update(Uuid::new_v4(), PatientUpdate::status(PatientStatus::Completed))
            .await
            .unwrap_err();
        assert!(matches!(err, OpdError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_query_day_orders_by_creation() {
        let store = MemoryPatientStore::new();
        store.create(record("A")).await.unwrap();
        store.create(record("B")).await.unwrap();

        let day = store.query_day(start_of_today()).await.unwrap();
        assert_eq!(day.len(), 2);
        assert_eq!(day[0].name, "A");
        assert_eq!(day[1].name, "B");
        assert!(day[0].created_at <= day[1].created_at);
    }

    #[tokio::test]
    async fn test_subscribe_day_delivers_initial_and_updated_snapshots() {
        let store = MemoryPatientStore::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let _sub = store
            .subscribe_day(
                start_of_today(),
                Box::new(move |snapshot| {
                    let _ = tx.send(snapshot);
                }),
            )
            .await
            .unwrap();

        // 建立后先收到一次当前（空）快照
        assert!(recv(&mut rx).await.is_empty());

        store.create(record("A")).await.unwrap();
        let snapshot = recv(&mut rx).await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].name, "A");
    }

    #[tokio::test]
    async fn test_subscribe_patient_reports_absent_then_present() {
        let store = MemoryPatientStore::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let created = store.create(record("A")).await.unwrap();
        let _sub = store
            .subscribe_patient(
                created.id,
                Box::new(move |snapshot| {
                    let _ = tx.send(snapshot);
                }),
            )
            .await
            .unwrap();

        let first = recv(&mut rx).await;
        assert_eq!(first.unwrap().name, "A");

        store
            .update(created.id, PatientUpdate::critical_level(CriticalityLevel::Emergency))
            .await
            .unwrap();
        let second = recv(&mut rx).await;
        assert_eq!(second.unwrap().critical_level, CriticalityLevel::Emergency);
    }

    #[tokio::test]
    async fn test_cancelled_subscription_stops_delivery() {
        let store = MemoryPatientStore::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let sub = store
            .subscribe_day(
                start_of_today(),
                Box::new(move |snapshot| {
                    let _ = tx.send(snapshot);
                }),
            )
            .await
            .unwrap();

        assert!(recv(&mut rx).await.is_empty());
        sub.cancel();

        store.create(record("A")).await.unwrap();
        // 取消后不再有推送，发送端随任务释放，通道关闭
        let result = timeout(Duration::from_millis(200), rx.recv()).await;
        assert!(matches!(result, Ok(None) | Err(_)));
    }
}
