// ==========================================
// 学校排课系统 - 领域实体定义
// ==========================================
// 实体之间只有关系引用（整数 id），没有循环所有权
// 时间维: 天 d ∈ [0, D)，节次 p ∈ [0, H)
// ==========================================

use crate::domain::types::RoomKind;
use serde::{Deserialize, Serialize};

// ==========================================
// 班级 (Class)
// ==========================================
/// 班级实体
///
/// 自然键: (name, section) 唯一，如 ("10", "A")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolClass {
    /// 数据库主键（0 表示尚未持久化）
    pub id: i64,
    /// 年级名，如 "10"
    pub name: String,
    /// 班别，如 "A"
    pub section: String,
    /// 每周总课时
    pub weekly_total_hours: i32,
}

impl SchoolClass {
    /// 显示用标签，如 "10/A"
    pub fn label(&self) -> String {
        format!("{}/{}", self.name, self.section)
    }
}

// ==========================================
// 教师 (Teacher)
// ==========================================
/// 教师实体
///
/// 自然键: full_name 唯一
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: i64,
    pub full_name: String,
    /// 任教学科
    pub subject: String,
    /// 每周授课时数
    pub weekly_hours: i32,
}

// ==========================================
// 课程 (Course)
// ==========================================
/// 课程实体
///
/// 自然键: name 唯一
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub name: String,
    /// 每周课时
    pub weekly_hours: i32,
    /// 显式标记是否必须使用专用教室；未标记时回退到课程名关键词识别
    pub requires_special_room: bool,
}

// ==========================================
// 教室 (Room)
// ==========================================
/// 教室实体
///
/// 自然键: name 唯一
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub name: String,
    pub kind: RoomKind,
}

// ==========================================
// 授课安排 (Assignment)
// ==========================================
/// 授课安排: (课程, 班级, 教师) 三元组每周需占用 weekly_hours 个课时
///
/// 自然键: (course_id, class_id, teacher_id) 唯一
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: i64,
    pub course_id: i64,
    pub class_id: i64,
    pub teacher_id: i64,
    /// 每周课时，必须 > 0
    pub weekly_hours: i32,
}

/// 授课安排联查投影（带课程/班级/教师名称，供列表展示）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentRow {
    pub id: i64,
    pub course_id: i64,
    pub class_id: i64,
    pub teacher_id: i64,
    pub weekly_hours: i32,
    pub course_name: String,
    pub class_name: String,
    pub class_section: String,
    pub teacher_name: String,
}

// ==========================================
// 教师不可用时段 (Unavailability)
// ==========================================
/// 教师在某天 [start_period, end_period) 区间内不可排课
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unavailability {
    pub id: i64,
    pub teacher_id: i64,
    /// 0 = 周一
    pub day: i32,
    pub start_period: i32,
    /// 不含端点
    pub end_period: i32,
}

/// 不可用时段联查投影（带教师姓名）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnavailabilityRow {
    pub id: i64,
    pub teacher_id: i64,
    pub day: i32,
    pub start_period: i32,
    pub end_period: i32,
    pub teacher_name: String,
}

// ==========================================
// 课表条目 (Placement)
// ==========================================
/// 已落位的一个课时: 授课安排 + (天, 节次, 教室)
///
/// 只由求解器批量写入或编辑器单条修改，CRUD 层不逐条插入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub id: i64,
    pub class_id: i64,
    pub teacher_id: i64,
    pub course_id: i64,
    /// 教室被删除后为 None（语义有效性由编辑器报告）
    pub room_id: Option<i64>,
    pub day: i32,
    pub period: i32,
}

/// 课表条目联查投影（带各实体名称，按 (day, period) 排序返回）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementRow {
    pub id: i64,
    pub class_id: i64,
    pub teacher_id: i64,
    pub course_id: i64,
    pub room_id: Option<i64>,
    pub day: i32,
    pub period: i32,
    pub course_name: String,
    pub class_name: String,
    pub class_section: String,
    pub teacher_name: String,
    pub room_name: Option<String>,
}
