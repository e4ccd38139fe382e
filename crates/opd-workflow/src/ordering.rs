//! 队列优先级排序引擎
//!
//! 对患者集合计算全序：已完成沉底，紧急优先，同档按队列号先来先到。
//! 排序是稳定的，比较结果相同的记录保持输入（创建序）的相对顺序。

use chrono::{DateTime, Utc};
use opd_core::{CriticalityLevel, Patient, PatientStatus};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// 正常档的评分基准，需大于同日时间戳的毫秒跨度
const NORMAL_SCORE_BASE: i64 = 10_000_000_000;

/// 队列比较器，第一条能区分的规则生效
pub fn compare(a: &Patient, b: &Patient) -> Ordering {
    // 规则1：已完成的记录排在所有未完成记录之后
    match (
        a.status == PatientStatus::Completed,
        b.status == PatientStatus::Completed,
    ) {
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        _ => {}
    }

    // 规则2：紧急排在正常之前
    match (&a.critical_level, &b.critical_level) {
        (CriticalityLevel::Emergency, CriticalityLevel::Normal) => return Ordering::Less,
        (CriticalityLevel::Normal, CriticalityLevel::Emergency) => return Ordering::Greater,
        _ => {}
    }

    // 规则3：同档按队列号升序（队列号按创建序分配，即先来先到）
    a.queue_number.cmp(&b.queue_number)
}

/// 计算展示与叫号用的全序
///
/// 稳定排序；输入应为存储层交付的创建序。不修改记录内容。
pub fn order_queue(mut records: Vec<Patient>) -> Vec<Patient> {
    records.sort_by(compare);
    records
}

/// 数值评分变体，分数越小优先级越高
///
/// 在未完成集合上与比较器产生相同全序。不包含完成沉底规则，只用于
/// 仅关心活跃患者的场景。
pub fn priority_score(level: &CriticalityLevel, created_at: DateTime<Utc>) -> i64 {
    let base = match level {
        CriticalityLevel::Emergency => 0,
        CriticalityLevel::Normal => NORMAL_SCORE_BASE,
    };
    base + created_at.timestamp_millis()
}

/// 活跃患者（候诊或就诊中）中的1-based位次
///
/// 输入须是已排序的队列；患者已完成或不存在时返回None。
pub fn active_position(ordered: &[Patient], id: Uuid) -> Option<usize> {
    ordered
        .iter()
        .filter(|p| p.status.is_active())
        .position(|p| p.id == id)
        .map(|idx| idx + 1)
}

/// 队列统计
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStats {
    pub total: usize,
    pub waiting: usize,
    pub in_consultation: usize,
    pub completed: usize,
    pub emergency_active: usize, // 未完成的紧急患者数
}

/// 汇总当前快照的队列统计
pub fn queue_stats(records: &[Patient]) -> QueueStats {
    let mut stats = QueueStats {
        total: records.len(),
        waiting: 0,
        in_consultation: 0,
        completed: 0,
        emergency_active: 0,
    };

    for patient in records {
        match patient.status {
            PatientStatus::Waiting => stats.waiting += 1,
            PatientStatus::InConsultation => stats.in_consultation += 1,
            PatientStatus::Completed => stats.completed += 1,
        }
        if patient.critical_level == CriticalityLevel::Emergency && patient.status.is_active() {
            stats.emergency_active += 1;
        }
    }

    stats
}
