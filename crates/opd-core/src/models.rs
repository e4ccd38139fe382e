//! 核心数据模型定义

use crate::error::{OpdError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 登记允许的最大年龄
pub const MAX_AGE: u32 = 150;

/// 就诊症状
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Symptom {
    Cold,           // 感冒
    Fever,          // 发烧
    Headache,       // 头痛
    GeneralCheckup, // 常规体检
}

impl Symptom {
    /// 界面展示用标签
    pub fn label(&self) -> &'static str {
        match self {
            Symptom::Cold => "Cold",
            Symptom::Fever => "Fever",
            Symptom::Headache => "Headache",
            Symptom::GeneralCheckup => "General Checkup",
        }
    }
}

/// 危急程度
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CriticalityLevel {
    Emergency, // 紧急
    Normal,    // 正常
}

/// 就诊状态
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PatientStatus {
    Waiting,        // 候诊
    InConsultation, // 就诊中
    Completed,      // 已完成
}

impl PatientStatus {
    /// 仍在排队的患者（候诊或就诊中）
    pub fn is_active(&self) -> bool {
        !matches!(self, PatientStatus::Completed)
    }
}

/// 患者记录
///
/// 存储层为每位患者保存一份文档。id、两个时间戳和队列号均由存储层
/// 在写入时分配；created_at不可变，updated_at随每次变更写入。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,                     // 患者姓名
    pub age: u32,                         // 年龄
    pub symptom: Symptom,                 // 登记症状
    pub critical_level: CriticalityLevel, // 危急程度
    pub queue_number: u32,                // 当日队列号，分配后不再变更
    pub status: PatientStatus,            // 就诊状态
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 登记表单
///
/// notes仅参与危急程度判定，不写入存储。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationForm {
    pub name: String,
    pub age: u32,
    pub symptom: Symptom,
    pub notes: Option<String>,
}

impl RegistrationForm {
    /// 校验表单，任何存储调用之前执行
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(OpdError::Validation("name must not be empty".to_string()));
        }
        if self.age > MAX_AGE {
            return Err(OpdError::Validation(format!(
                "age out of range: {}",
                self.age
            )));
        }
        Ok(())
    }
}

/// 新患者记录（存储层输入）
///
/// id、时间戳、队列号和初始候诊状态由存储层在创建时分配。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatientRecord {
    pub name: String,
    pub age: u32,
    pub symptom: Symptom,
    pub critical_level: CriticalityLevel,
}

/// 患者记录的部分更新
///
/// 只存在就诊状态和危急程度两类变更，updated_at由存储层写入。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientUpdate {
    pub status: Option<PatientStatus>,
    pub critical_level: Option<CriticalityLevel>,
}

impl PatientUpdate {
    /// 仅变更就诊状态
    pub fn status(status: PatientStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// 仅变更危急程度
    pub fn critical_level(level: CriticalityLevel) -> Self {
        Self {
            critical_level: Some(level),
            ..Default::default()
        }
    }
}
