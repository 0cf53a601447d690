// ==========================================
// 学校排课系统 - 领域类型定义
// ==========================================
// 封闭标签集一律用枚举表达，不在内部 API 传开放字符串
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 教室类型 (Room Kind)
// ==========================================
// 序列化格式: 小写 (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomKind {
    Normal,  // 普通教室
    Special, // 专用教室（实验室、工坊等）
}

impl fmt::Display for RoomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomKind::Normal => write!(f, "normal"),
            RoomKind::Special => write!(f, "special"),
        }
    }
}

impl RoomKind {
    /// 从数据库字符串解析
    pub fn from_db_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "special" => RoomKind::Special,
            _ => RoomKind::Normal, // 默认值
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            RoomKind::Normal => "normal",
            RoomKind::Special => "special",
        }
    }
}

// ==========================================
// 教师空闲时段偏好 (Idle Preference)
// ==========================================
// 决定目标函数中空闲时段项的符号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdlePreference {
    Minimize, // 尽量压缩教师当日空档
    Maximize, // 尽量拉开教师当日空档
}

impl fmt::Display for IdlePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdlePreference::Minimize => write!(f, "minimize"),
            IdlePreference::Maximize => write!(f, "maximize"),
        }
    }
}

impl IdlePreference {
    /// 从配置字符串解析
    pub fn from_db_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "maximize" => IdlePreference::Maximize,
            _ => IdlePreference::Minimize, // 默认值
        }
    }

    /// 转换为配置存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            IdlePreference::Minimize => "minimize",
            IdlePreference::Maximize => "maximize",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_kind_roundtrip() {
        assert_eq!(RoomKind::from_db_str("special"), RoomKind::Special);
        assert_eq!(RoomKind::from_db_str("SPECIAL"), RoomKind::Special);
        assert_eq!(RoomKind::from_db_str("normal"), RoomKind::Normal);
        // 未知值回退到普通教室
        assert_eq!(RoomKind::from_db_str("garage"), RoomKind::Normal);
        assert_eq!(RoomKind::Special.to_db_str(), "special");
    }

    #[test]
    fn test_idle_preference_parse() {
        assert_eq!(
            IdlePreference::from_db_str("maximize"),
            IdlePreference::Maximize
        );
        assert_eq!(
            IdlePreference::from_db_str("minimize"),
            IdlePreference::Minimize
        );
        assert_eq!(IdlePreference::from_db_str(""), IdlePreference::Minimize);
    }
}
