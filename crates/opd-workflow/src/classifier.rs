//! 危急程度判定
//!
//! 登记时运行一次的纯规则判定。接口保持稳定，以便将来替换为学习
//! 模型而不触碰排序与存储逻辑。

use opd_core::{CriticalityLevel, Symptom};

/// 与发烧组合即判定为紧急的关键词（不区分大小写，子串匹配）
const SEVERE_KEYWORDS: [&str; 4] = [
    "severe",
    "chest pain",
    "difficulty breathing",
    "unconscious",
];

/// 根据登记信息判定初始危急程度
///
/// 规则：发烧且备注含重症关键词为紧急，其余一律正常。紧急还可以
/// 由管理员在登记后手动标记，不走本函数。age参数保留给将来的模型
/// 输入，当前不参与判定。
pub fn classify(_age: u32, symptom: &Symptom, notes: Option<&str>) -> CriticalityLevel {
    if *symptom == Symptom::Fever {
        if let Some(notes) = notes {
            let notes = notes.to_lowercase();
            if SEVERE_KEYWORDS.iter().any(|kw| notes.contains(kw)) {
                return CriticalityLevel::Emergency;
            }
        }
    }
    CriticalityLevel::Normal
}
