// 健康评分引擎 - 由症状历史推导0-100的照护状态评分
//
// 纯函数计算：相同的条目列表和相同的"当前时间"必然得到相同结果。
// 时间由调用方注入，引擎自身不读取系统时钟

use crate::storage::models::{parse_timestamp, CareEntry, EntryKind, Severity};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// 最新症状的危急关键词（大小写不敏感的子串匹配）
const CRITICAL_LATEST_PATTERN: &str = "(?i)heart attack|stroke|emergency|collapse|unconscious";

/// 近期症状扣分阶段的危急关键词
///
/// 比基准分阶段少了 collapse/unconscious，这是沿用的既有行为，
/// 两份词表不要合并
const CRITICAL_RECENT_PATTERN: &str = "(?i)heart attack|stroke|emergency";

/// 扣分阶段只回看最新条目之后的4条
const PENALTY_WINDOW: usize = 4;

/// 扣分阶段只统计12小时内的条目
const PENALTY_MAX_AGE_HOURS: f64 = 12.0;

/// 照护状态标签 - 由评分映射，同时决定前端的颜色档位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CareStatus {
    Stable,          // 评分 > 80
    AttentionNeeded, // 50 < 评分 <= 80
    Critical,        // 评分 <= 50
}

impl CareStatus {
    /// 评分到状态的映射
    pub fn from_score(score: u8) -> Self {
        if score > 80 {
            Self::Stable
        } else if score > 50 {
            Self::AttentionNeeded
        } else {
            Self::Critical
        }
    }

    /// 展示用标签
    pub fn label(&self) -> &str {
        match self {
            Self::Stable => "Stable",
            Self::AttentionNeeded => "Attention Needed",
            Self::Critical => "Critical",
        }
    }

    /// 状态颜色（用于UI显示）
    pub fn color(&self) -> &str {
        match self {
            Self::Stable => "#10B981",          // 翠绿色
            Self::AttentionNeeded => "#F59E0B", // 琥珀色
            Self::Critical => "#EF4444",        // 红色
        }
    }
}

/// 评分诊断信息 - 被排除条目的原因记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreDiagnostic {
    /// 条目ID
    pub entry_id: String,
    /// 排除原因
    pub reason: String,
}

/// 评分结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreReport {
    /// 0-100 的健康评分
    pub score: u8,
    /// 状态标签
    pub status: CareStatus,
    /// 被排除条目的诊断列表（时间戳损坏、严重程度非法等）
    pub diagnostics: Vec<ScoreDiagnostic>,
}

/// 可排序的症状条目（预先解析好时间戳）
struct ScorableSymptom<'a> {
    entry: &'a CareEntry,
    timestamp: DateTime<Utc>,
}

/// 健康评分引擎
pub struct HealthScoreEngine {
    critical_latest: Regex,
    critical_recent: Regex,
}

impl HealthScoreEngine {
    pub fn new() -> Self {
        Self {
            // 两个模式均为常量字面量，编译失败属于程序缺陷
            critical_latest: Regex::new(CRITICAL_LATEST_PATTERN)
                .expect("内置危急关键词正则必须可编译"),
            critical_recent: Regex::new(CRITICAL_RECENT_PATTERN)
                .expect("内置危急关键词正则必须可编译"),
        }
    }

    /// 计算健康评分
    ///
    /// 接受任意顺序的条目列表，内部自行排序。用药条目不参与评分。
    /// 数据损坏的条目被排除并记入诊断列表，不会中断整体计算
    pub fn score(&self, entries: &[CareEntry], now: DateTime<Utc>) -> ScoreReport {
        let mut diagnostics = Vec::new();
        let mut symptoms = Vec::new();

        for entry in entries {
            if entry.entry_kind() != Some(EntryKind::Symptom) {
                continue;
            }

            // 严重程度字段存在但非法 -> 排除该条目
            if let Some(raw) = entry.severity.as_deref() {
                if Severity::parse(raw).is_none() {
                    diagnostics.push(ScoreDiagnostic {
                        entry_id: entry.id.clone(),
                        reason: format!("未知的严重程度: {}", raw),
                    });
                    continue;
                }
            }

            // 时间戳必须可解析，否则排序会被污染 -> 排除该条目
            match parse_timestamp(&entry.timestamp) {
                Some(timestamp) => symptoms.push(ScorableSymptom { entry, timestamp }),
                None => diagnostics.push(ScoreDiagnostic {
                    entry_id: entry.id.clone(),
                    reason: format!("无法解析的时间戳: {}", entry.timestamp),
                }),
            }
        }

        // 没有症状历史 -> 满分
        if symptoms.is_empty() {
            return ScoreReport {
                score: 100,
                status: CareStatus::from_score(100),
                diagnostics,
            };
        }

        // 按时间倒序，最新在前
        symptoms.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let latest = &symptoms[0];

        let base = self.base_score(latest);
        let penalty = self.recent_penalty(&symptoms[1..], now);
        let time_heal = Self::time_heal(hours_between(latest.timestamp, now));

        let raw = base - penalty + time_heal;
        let score = raw.clamp(0, 100) as u8;

        ScoreReport {
            score,
            status: CareStatus::from_score(score),
            diagnostics,
        }
    }

    /// 基准分 - 由最新症状决定
    fn base_score(&self, latest: &ScorableSymptom<'_>) -> i32 {
        if self.critical_latest.is_match(&latest.entry.title) {
            return 30; // 危急
        }

        match latest.entry.severity_level() {
            Some(Severity::High) => 60,   // 较差
            Some(Severity::Medium) => 80, // 一般
            Some(Severity::Low) => 95,    // 良好
            // 无严重程度且非危急：与无症状历史同样按满分起算
            None => 100,
        }
    }

    /// 近期扣分 - 扫描最新条目之后的至多4条症状
    fn recent_penalty(&self, recent: &[ScorableSymptom<'_>], now: DateTime<Utc>) -> i32 {
        let mut penalty = 0;

        for symptom in recent.iter().take(PENALTY_WINDOW) {
            let hours_ago = hours_between(symptom.timestamp, now);
            if hours_ago >= PENALTY_MAX_AGE_HOURS {
                continue;
            }

            if self.critical_recent.is_match(&symptom.entry.title) {
                penalty += 15;
            } else {
                match symptom.entry.severity_level() {
                    Some(Severity::High) => penalty += 10,
                    Some(Severity::Medium) => penalty += 5,
                    _ => {}
                }
            }
        }

        penalty
    }

    /// 时间恢复加分 - 距最新症状越久恢复越多，档位不叠加
    fn time_heal(hours_since_latest: f64) -> i32 {
        if hours_since_latest > 48.0 {
            50
        } else if hours_since_latest > 24.0 {
            20
        } else {
            0
        }
    }
}

impl Default for HealthScoreEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// 两个时刻之间的小时数（带小数）
fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_seconds() as f64 / 3600.0
}
