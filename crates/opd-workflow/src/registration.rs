//! 患者登记
//!
//! 校验表单，登记时运行一次危急程度判定，随后交由存储层创建记录。
//! 当日队列号由存储层在创建的临界区内分配，并发登记不会重号。

use crate::classifier::classify;
use opd_core::{NewPatientRecord, Patient, RegistrationForm, Result};
use opd_store::PatientStore;
use std::sync::Arc;

/// 患者登记服务
pub struct RegistrationService {
    store: Arc<dyn PatientStore>,
}

impl RegistrationService {
    pub fn new(store: Arc<dyn PatientStore>) -> Self {
        Self { store }
    }

    /// 登记新患者
    ///
    /// 校验失败在任何存储调用之前返回，不会分配队列号。
    pub async fn register(&self, form: RegistrationForm) -> Result<Patient> {
        form.validate()?;

        let critical_level = classify(form.age, &form.symptom, form.notes.as_deref());
        let record = NewPatientRecord {
            name: form.name.trim().to_string(),
            age: form.age,
            symptom: form.symptom,
            critical_level,
        };

        let patient = self.store.create(record).await?;
        tracing::info!(
            "Registered patient {} (queue number {}, criticality {:?})",
            patient.id,
            patient.queue_number,
            patient.critical_level
        );
        Ok(patient)
    }
}
