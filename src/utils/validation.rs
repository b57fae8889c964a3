//! 输入验证工具函数
//!
//! 提供各种输入参数的验证功能，防止无效输入进入存储层

use crate::storage::NewEntry;

/// 验证待写入的条目
///
/// # 返回
/// - `Ok(())`: 验证通过
/// - `Err(String)`: 错误信息
pub fn validate_new_entry(entry: &NewEntry) -> Result<(), String> {
    if entry.title.trim().is_empty() {
        return Err("条目标题不能为空".to_string());
    }
    if entry.title.chars().count() > 200 {
        return Err("条目标题过长（上限200字符）".to_string());
    }
    if entry.details.trim().is_empty() {
        return Err("条目详情不能为空".to_string());
    }
    Ok(())
}

/// 验证症状文本输入
pub fn validate_symptom_text(text: &str) -> Result<(), String> {
    if text.trim().is_empty() {
        return Err("症状描述不能为空".to_string());
    }
    if text.chars().count() > 4000 {
        return Err("症状描述过长（上限4000字符）".to_string());
    }
    Ok(())
}

/// 验证月份标签 (格式: YYYY-MM)
pub fn validate_month_label(month: &str) -> Result<(i32, u32), String> {
    let parts: Vec<&str> = month.split('-').collect();
    if parts.len() != 2 {
        return Err(format!("无效的月份格式: {}", month));
    }

    let year: i32 = parts[0]
        .parse()
        .map_err(|_| format!("无效的年份: {}", parts[0]))?;
    let mon: u32 = parts[1]
        .parse()
        .map_err(|_| format!("无效的月份: {}", parts[1]))?;

    if !(1..=12).contains(&mon) {
        return Err(format!("月份必须在1-12之间: {}", mon));
    }
    if !(1970..=9999).contains(&year) {
        return Err(format!("年份超出范围: {}", year));
    }

    Ok((year, mon))
}

/// 验证查询limit（防止无效输入）
pub fn validate_limit(limit: i64) -> Result<(), String> {
    if limit <= 0 || limit > 1000 {
        return Err(format!("无效的limit: {}", limit));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{EntryKind, Severity};

    #[test]
    fn test_validate_new_entry() {
        let mut entry = NewEntry {
            kind: EntryKind::Symptom,
            title: "Dizziness".to_string(),
            details: "after standing up".to_string(),
            severity: Some(Severity::Low),
            warning: None,
        };
        assert!(validate_new_entry(&entry).is_ok());

        entry.title = "   ".to_string();
        assert!(validate_new_entry(&entry).is_err());
    }

    #[test]
    fn test_validate_month_label() {
        assert_eq!(validate_month_label("2026-08"), Ok((2026, 8)));
        assert!(validate_month_label("2026-13").is_err());
        assert!(validate_month_label("August 2026").is_err());
        assert!(validate_month_label("2026").is_err());
    }

    #[test]
    fn test_validate_limit() {
        assert!(validate_limit(10).is_ok());
        assert!(validate_limit(0).is_err());
        assert!(validate_limit(-5).is_err());
        assert!(validate_limit(5000).is_err());
    }
}
