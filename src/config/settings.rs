// ==========================================
// 学校排课系统 - 求解参数快照
// ==========================================
// 职责: 求解开始前从 settings 表读取一次，之后整个求解过程只读
// 说明: 展示类配置（上课时间、课间时长等）不进快照，由展示层自行读取
// ==========================================

use crate::domain::types::IdlePreference;
use crate::repository::{RepositoryError, RepositoryResult, SettingsRepository};
use serde::{Deserialize, Serialize};

/// 求解参数快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverSettings {
    /// 每周上课天数 D
    pub days: i32,
    /// 每日节次数 H
    pub periods: i32,
    /// 教师每日最多课时（硬约束）
    pub teacher_daily_max: i32,
    /// 教师每日最少课时（仅当日有课时生效）
    pub teacher_daily_min: i32,
    /// 班级每日最多课时（硬约束）
    pub class_daily_max: i32,
    /// 班级每日最少课时（硬约束，无条件）
    pub class_daily_min: i32,
    /// 同一课程同一天最多节次（硬约束）
    pub same_course_daily_max: i32,
    /// 专用课程必须进专用教室
    pub enforce_special_rooms: bool,
    /// 多课时课程连堂排列
    pub prefer_block_consecutive: bool,
    /// 连堂上限（参考值，暂无约束消费）
    pub block_max: i32,
    /// 教师空闲时段偏好（目标函数符号）
    pub teacher_idle_preference: IdlePreference,
    /// 最小化班级当日换教室次数
    pub minimize_room_changes: bool,
    /// 求解时间上限（秒）
    pub time_budget_seconds: u64,
    /// 专用课程名称识别关键词（小写）
    pub special_room_tokens: Vec<String>,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            days: 5,
            periods: 8,
            teacher_daily_max: 6,
            teacher_daily_min: 2,
            class_daily_max: 8,
            class_daily_min: 4,
            same_course_daily_max: 2,
            enforce_special_rooms: true,
            prefer_block_consecutive: true,
            block_max: 2,
            teacher_idle_preference: IdlePreference::Minimize,
            minimize_room_changes: true,
            time_budget_seconds: 300,
            special_room_tokens: vec![
                "lab".to_string(),
                "laboratuvar".to_string(),
                "workshop".to_string(),
            ],
        }
    }
}

impl SolverSettings {
    /// 从配置仓储加载快照
    ///
    /// 缺失的键回落到默认值；无法解析的值报 FieldValueError
    pub fn load(settings: &SettingsRepository) -> RepositoryResult<Self> {
        let days = parse_i32(settings, "days_per_week", 5)?;
        let periods = parse_i32(settings, "max_daily_periods", 8)?;

        let snapshot = Self {
            days,
            periods,
            teacher_daily_max: parse_i32(settings, "teacher_daily_max", 6)?,
            teacher_daily_min: parse_i32(settings, "teacher_daily_min", 2)?,
            class_daily_max: parse_i32(settings, "class_daily_max", 8)?,
            class_daily_min: parse_i32(settings, "class_daily_min", 4)?,
            same_course_daily_max: parse_i32(settings, "same_course_daily_max", 2)?,
            enforce_special_rooms: parse_flag(settings, "enforce_special_rooms", true)?,
            prefer_block_consecutive: parse_flag(settings, "prefer_block_consecutive", true)?,
            block_max: parse_i32(settings, "block_max", 2)?,
            teacher_idle_preference: IdlePreference::from_db_str(
                &settings.get("teacher_idle_preference", "minimize")?,
            ),
            minimize_room_changes: parse_flag(settings, "minimize_room_changes", true)?,
            time_budget_seconds: parse_i32(settings, "time_budget_seconds", 300)? as u64,
            special_room_tokens: settings
                .get("special_room_tokens", "lab,laboratuvar,workshop")?
                .split(',')
                .map(|token| token.trim().to_lowercase())
                .filter(|token| !token.is_empty())
                .collect(),
        };

        snapshot.validate()?;
        Ok(snapshot)
    }

    /// 参数合理性检查
    fn validate(&self) -> RepositoryResult<()> {
        if self.days <= 0 {
            return Err(field_error("days_per_week", self.days));
        }
        if self.periods <= 0 {
            return Err(field_error("max_daily_periods", self.periods));
        }
        if self.teacher_daily_max <= 0 {
            return Err(field_error("teacher_daily_max", self.teacher_daily_max));
        }
        if self.class_daily_max <= 0 {
            return Err(field_error("class_daily_max", self.class_daily_max));
        }
        if self.same_course_daily_max <= 0 {
            return Err(field_error("same_course_daily_max", self.same_course_daily_max));
        }
        if self.time_budget_seconds == 0 {
            return Err(RepositoryError::FieldValueError {
                field: "time_budget_seconds".to_string(),
                message: "必须大于 0".to_string(),
            });
        }
        Ok(())
    }
}

fn field_error(field: &str, value: i32) -> RepositoryError {
    RepositoryError::FieldValueError {
        field: field.to_string(),
        message: format!("必须大于 0，实际为 {value}"),
    }
}

fn parse_i32(settings: &SettingsRepository, key: &str, default: i32) -> RepositoryResult<i32> {
    let raw = settings.get(key, &default.to_string())?;
    raw.trim()
        .parse::<i32>()
        .map_err(|_| RepositoryError::FieldValueError {
            field: key.to_string(),
            message: format!("不是合法整数: {raw:?}"),
        })
}

fn parse_flag(settings: &SettingsRepository, key: &str, default: bool) -> RepositoryResult<bool> {
    let raw = settings.get(key, if default { "1" } else { "0" })?;
    Ok(raw.trim() == "1")
}
