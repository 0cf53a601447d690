// ==========================================
// 学校排课系统 - 领域层
// ==========================================
// 职责: 定义实体与封闭标签类型
// 红线: 领域对象为纯记录，关系在查询时以整数 id 关联
// ==========================================

pub mod school;
pub mod types;

pub use school::{
    Assignment, AssignmentRow, Course, Placement, PlacementRow, Room, SchoolClass, Teacher,
    Unavailability, UnavailabilityRow,
};
pub use types::{IdlePreference, RoomKind};
