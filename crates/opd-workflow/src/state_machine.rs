//! 就诊状态机
//!
//! 就诊状态只沿 候诊 → 就诊中 → 已完成 单向推进，不允许跳档或回退。
//! 原地转换视为无操作，保证状态写入幂等。

use opd_core::{OpdError, PatientStatus, Result};
use std::collections::HashSet;

/// 就诊状态机
#[derive(Debug)]
pub struct StatusStateMachine {
    transitions: HashSet<(PatientStatus, PatientStatus)>,
}

impl StatusStateMachine {
    /// 创建新的状态机实例
    pub fn new() -> Self {
        let mut transitions = HashSet::new();

        // 定义状态转换规则
        transitions.insert((PatientStatus::Waiting, PatientStatus::InConsultation));
        transitions.insert((PatientStatus::InConsultation, PatientStatus::Completed));

        Self { transitions }
    }

    /// 检查状态转换是否有效
    pub fn can_transition(&self, from: &PatientStatus, to: &PatientStatus) -> bool {
        from == to || self.transitions.contains(&(from.clone(), to.clone()))
    }

    /// 校验状态转换，非法转换返回错误
    pub fn validate(&self, from: &PatientStatus, to: &PatientStatus) -> Result<()> {
        if self.can_transition(from, to) {
            Ok(())
        } else {
            Err(OpdError::InvalidStateTransition {
                from: format!("{:?}", from),
                to: format!("{:?}", to),
            })
        }
    }

    /// 某状态允许推进到的目标状态
    pub fn next_states(&self, from: &PatientStatus) -> Vec<PatientStatus> {
        self.transitions
            .iter()
            .filter(|(f, _)| f == from)
            .map(|(_, t)| t.clone())
            .collect()
    }
}

impl Default for StatusStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        let sm = StatusStateMachine::new();

        // 测试有效转换
        assert!(sm.can_transition(&PatientStatus::Waiting, &PatientStatus::InConsultation));
        assert!(sm.can_transition(&PatientStatus::InConsultation, &PatientStatus::Completed));
    }

    #[test]
    fn test_self_transition_is_allowed() {
        let sm = StatusStateMachine::new();

        assert!(sm.can_transition(&PatientStatus::Waiting, &PatientStatus::Waiting));
        assert!(sm.can_transition(&PatientStatus::Completed, &PatientStatus::Completed));
    }

    #[test]
    fn test_invalid_transitions() {
        let sm = StatusStateMachine::new();

        // 不允许跳档
        assert!(!sm.can_transition(&PatientStatus::Waiting, &PatientStatus::Completed));
        // 不允许回退
        assert!(!sm.can_transition(&PatientStatus::InConsultation, &PatientStatus::Waiting));
        assert!(!sm.can_transition(&PatientStatus::Completed, &PatientStatus::InConsultation));
        assert!(!sm.can_transition(&PatientStatus::Completed, &PatientStatus::Waiting));
    }

    #[test]
    fn test_validate_reports_transition() {
        let sm = StatusStateMachine::new();

        assert!(sm
            .validate(&PatientStatus::Waiting, &PatientStatus::InConsultation)
            .is_ok());

        let err = sm
            .validate(&PatientStatus::Waiting, &PatientStatus::Completed)
            .unwrap_err();
        assert!(matches!(err, OpdError::InvalidStateTransition { .. }));
    }

    #[test]
    fn test_next_states() {
        let sm = StatusStateMachine::new();

        assert_eq!(
            sm.next_states(&PatientStatus::Waiting),
            vec![PatientStatus::InConsultation]
        );
        assert!(sm.next_states(&PatientStatus::Completed).is_empty());
    }
}
