//! 状态与危急程度变更入口
//!
//! 系统仅有的两类持久化变更，均为针对单条记录的一次合并写。存储层
//! 错误原样上抛，不做自动重试，重试属于界面层的决定。

use crate::auth::AuthContext;
use crate::state_machine::StatusStateMachine;
use opd_core::{CriticalityLevel, OpdError, Patient, PatientStatus, PatientUpdate, Result};
use opd_store::PatientStore;
use std::sync::Arc;
use uuid::Uuid;

/// 变更网关
pub struct MutationGateway {
    store: Arc<dyn PatientStore>,
    state_machine: StatusStateMachine,
}

impl MutationGateway {
    pub fn new(store: Arc<dyn PatientStore>) -> Self {
        Self {
            store,
            state_machine: StatusStateMachine::new(),
        }
    }

    /// 推进患者就诊状态
    ///
    /// 对记录当前状态做状态机校验后执行单字段合并写。同状态调用是
    /// 幂等的无操作；两个合法的并发调用仍按存储层后写生效。
    pub async fn set_status(
        &self,
        ctx: &AuthContext,
        id: Uuid,
        new_status: PatientStatus,
    ) -> Result<Patient> {
        if !ctx.role.can_update_status() {
            return Err(OpdError::Permission(format!(
                "Role {:?} may not update patient status",
                ctx.role
            )));
        }

        let current = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| OpdError::NotFound(format!("Patient {} not found", id)))?;

        self.state_machine.validate(&current.status, &new_status)?;
        if current.status == new_status {
            return Ok(current);
        }

        let updated = self
            .store
            .update(id, PatientUpdate::status(new_status.clone()))
            .await?;
        tracing::info!(
            "Patient {} status changed from {:?} to {:?}",
            id,
            current.status,
            new_status
        );
        Ok(updated)
    }

    /// 手动升级为紧急
    ///
    /// 盲写单字段，已是紧急时结果不变，天然幂等。不提供降级路径。
    pub async fn escalate_to_emergency(&self, ctx: &AuthContext, id: Uuid) -> Result<Patient> {
        if !ctx.role.can_escalate() {
            return Err(OpdError::Permission(format!(
                "Role {:?} may not escalate criticality",
                ctx.role
            )));
        }

        let updated = self
            .store
            .update(id, PatientUpdate::critical_level(CriticalityLevel::Emergency))
            .await?;
        tracing::warn!("Patient {} escalated to emergency", id);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use opd_core::{NewPatientRecord, Symptom};
    use opd_store::MemoryPatientStore;

    fn admin() -> AuthContext {
        AuthContext { role: Role::Admin }
    }

    fn doctor() -> AuthContext {
        AuthContext { role: Role::Doctor }
    }

    async fn setup() -> (MutationGateway, Arc<MemoryPatientStore>, Patient) {
        let store = Arc::new(MemoryPatientStore::new());
        let patient = store
            .create(NewPatientRecord {
                name: "A".to_string(),
                age: 30,
                symptom: Symptom::Cold,
                critical_level: CriticalityLevel::Normal,
            })
            .await
            .unwrap();
        (MutationGateway::new(store.clone()), store, patient)
    }

    #[tokio::test]
    async fn test_set_status_moves_forward() {
        let (gateway, _, patient) = setup().await;

        let updated = gateway
            .set_status(&doctor(), patient.id, PatientStatus::InConsultation)
            .await
            .unwrap();
        assert_eq!(updated.status, PatientStatus::InConsultation);

        let updated = gateway
            .set_status(&doctor(), patient.id, PatientStatus::Completed)
            .await
            .unwrap();
        assert_eq!(updated.status, PatientStatus::Completed);
    }

    #[tokio::test]
    async fn test_set_status_rejects_skip_and_revert() {
        let (gateway, _, patient) = setup().await;

        let err = gateway
            .set_status(&doctor(), patient.id, PatientStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, OpdError::InvalidStateTransition { .. }));

        gateway
            .set_status(&doctor(), patient.id, PatientStatus::InConsultation)
            .await
            .unwrap();
        let err = gateway
            .set_status(&doctor(), patient.id, PatientStatus::Waiting)
            .await
            .unwrap_err();
        assert!(matches!(err, OpdError::InvalidStateTransition { .. }));
    }

    #[tokio::test]
    async fn test_set_status_same_value_is_noop() {
        let (gateway, store, patient) = setup().await;

        let result = gateway
            .set_status(&doctor(), patient.id, PatientStatus::Waiting)
            .await
            .unwrap();

        // 无操作不触发写入，updated_at保持不变
        assert_eq!(result.updated_at, patient.updated_at);
        let stored = store.get(patient.id).await.unwrap().unwrap();
        assert_eq!(stored.updated_at, patient.updated_at);
    }

    #[tokio::test]
    async fn test_set_status_unknown_patient_is_not_found() {
        let (gateway, _, _) = setup().await;

        let err = gateway
            .set_status(&doctor(), Uuid::new_v4(), PatientStatus::InConsultation)
            .await
            .unwrap_err();
        assert!(matches!(err, OpdError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_escalate_requires_admin() {
        let (gateway, store, patient) = setup().await;

        let err = gateway
            .escalate_to_emergency(&doctor(), patient.id)
            .await
            .unwrap_err();
        assert!(matches!(err, OpdError::Permission(_)));

        let stored = store.get(patient.id).await.unwrap().unwrap();
        assert_eq!(stored.critical_level, CriticalityLevel::Normal);
    }

    #[tokio::test]
    async fn test_escalate_is_idempotent() {
        let (gateway, _, patient) = setup().await;

        let once = gateway
            .escalate_to_emergency(&admin(), patient.id)
            .await
            .unwrap();
        let twice = gateway
            .escalate_to_emergency(&admin(), patient.id)
            .await
            .unwrap();

        assert_eq!(once.critical_level, CriticalityLevel::Emergency);
        assert_eq!(twice.critical_level, CriticalityLevel::Emergency);
        assert_eq!(twice.status, once.status);
        assert_eq!(twice.queue_number, once.queue_number);
    }
}
