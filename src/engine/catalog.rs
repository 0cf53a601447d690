// ==========================================
// 学校排课系统 - 数据快照 (Catalog)
// ==========================================
// 职责: 求解前从 Store 读取一次全量数据，校验引用完整性并构建派生索引
// 约束: 快照只读，生命周期只覆盖一次求解
// 说明: 授课安排按 id 升序固定顺序——同样输入与种子下重复求解结果逐位一致
// ==========================================

use crate::config::SolverSettings;
use crate::domain::school::{Assignment, Course, Room, SchoolClass, Teacher, Unavailability};
use crate::domain::types::RoomKind;
use crate::engine::error::{ScheduleError, ScheduleResult};
use crate::repository::Store;
use itertools::Itertools;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// 只读数据快照
#[derive(Debug, Clone)]
pub struct Catalog {
    pub settings: SolverSettings,
    pub classes: BTreeMap<i64, SchoolClass>,
    pub teachers: BTreeMap<i64, Teacher>,
    pub courses: BTreeMap<i64, Course>,
    /// 按 id 升序
    pub rooms: Vec<Room>,
    /// 按 id 升序（决策变量的稳定顺序来源）
    pub assignments: Vec<Assignment>,
    pub unavailabilities: Vec<Unavailability>,

    // ===== 派生索引（值为 assignments 向量下标）=====
    pub assignments_by_class: BTreeMap<i64, Vec<usize>>,
    pub assignments_by_teacher: BTreeMap<i64, Vec<usize>>,
    pub assignments_by_course: BTreeMap<i64, Vec<usize>>,
    /// (teacher_id, day) -> 区间列表 [(start, end))
    pub unavailability_by_teacher_day: BTreeMap<(i64, i32), Vec<(i32, i32)>>,
    /// 按教室类型分组的教室 id（各自按 id 升序）
    pub rooms_by_kind: BTreeMap<RoomKind, Vec<i64>>,
}

impl Catalog {
    /// 从 Store 构建校验过的快照
    ///
    /// 校验失败时报 `ScheduleError::Data`，携带首个出错实体的自然键
    pub fn load(store: &Store) -> ScheduleResult<Catalog> {
        let settings = SolverSettings::load(&store.settings)?;

        let classes: BTreeMap<i64, SchoolClass> = store
            .classes
            .list_all()?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        let teachers: BTreeMap<i64, Teacher> = store
            .teachers
            .list_all()?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();
        let courses: BTreeMap<i64, Course> = store
            .courses
            .list_all()?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let mut rooms = store.rooms.list_all()?;
        rooms.sort_by_key(|r| r.id);

        // list_all 已按 id 排序；这里再排一次守住稳定顺序不被上游改动破坏
        let mut assignments = store.assignments.list_all()?;
        assignments.sort_by_key(|a| a.id);

        let unavailabilities = store.unavailabilities.list_all()?;

        info!(
            classes = classes.len(),
            teachers = teachers.len(),
            courses = courses.len(),
            rooms = rooms.len(),
            assignments = assignments.len(),
            unavailabilities = unavailabilities.len(),
            "数据快照加载完成"
        );

        let catalog = Catalog {
            assignments_by_class: index_by(&assignments, |a| a.class_id),
            assignments_by_teacher: index_by(&assignments, |a| a.teacher_id),
            assignments_by_course: index_by(&assignments, |a| a.course_id),
            unavailability_by_teacher_day: unavailabilities
                .iter()
                .map(|u| ((u.teacher_id, u.day), (u.start_period, u.end_period)))
                .into_group_map()
                .into_iter()
                .collect(),
            rooms_by_kind: rooms
                .iter()
                .map(|r| (r.kind, r.id))
                .into_group_map()
                .into_iter()
                .collect(),
            settings,
            classes,
            teachers,
            courses,
            rooms,
            assignments,
            unavailabilities,
        };

        catalog.validate()?;
        Ok(catalog)
    }

    /// 判定课程是否必须使用专用教室
    ///
    /// 优先使用课程上的显式标记，未标记时回退到名称关键词识别
    pub fn course_needs_special_room(&self, course: &Course) -> bool {
        if course.requires_special_room {
            debug!(course = %course.name, "专用教室判定: 显式标记");
            return true;
        }

        let name = course.name.to_lowercase();
        let hit = self
            .settings
            .special_room_tokens
            .iter()
            .any(|token| name.contains(token.as_str()));
        if hit {
            debug!(course = %course.name, "专用教室判定: 名称关键词命中");
        }
        hit
    }

    /// 专用教室 id 列表（按 id 升序）
    pub fn special_room_ids(&self) -> &[i64] {
        self.rooms_by_kind
            .get(&RoomKind::Special)
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }

    /// 普通教室 id 列表（按 id 升序）
    pub fn normal_room_ids(&self) -> &[i64] {
        self.rooms_by_kind
            .get(&RoomKind::Normal)
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }

    // ==========================================
    // 快照校验
    // ==========================================
    fn validate(&self) -> ScheduleResult<()> {
        let s = &self.settings;

        if self.classes.is_empty() {
            return Err(data_error("class", "未定义任何班级"));
        }
        if self.teachers.is_empty() {
            return Err(data_error("teacher", "未定义任何教师"));
        }
        if self.courses.is_empty() {
            return Err(data_error("course", "未定义任何课程"));
        }
        if self.assignments.is_empty() {
            return Err(data_error("assignment", "未定义任何授课安排"));
        }
        if self.rooms.is_empty() {
            return Err(data_error("room", "未定义任何教室"));
        }

        // 引用完整性
        for a in &self.assignments {
            let key = format!(
                "assignment course={} class={} teacher={}",
                a.course_id, a.class_id, a.teacher_id
            );
            if !self.courses.contains_key(&a.course_id) {
                return Err(data_error(&key, "引用的课程不存在"));
            }
            if !self.classes.contains_key(&a.class_id) {
                return Err(data_error(&key, "引用的班级不存在"));
            }
            if !self.teachers.contains_key(&a.teacher_id) {
                return Err(data_error(&key, "引用的教师不存在"));
            }
        }

        // 班级周课时上限: 总课时不能超过 class_daily_max * D
        for (class_id, idxs) in &self.assignments_by_class {
            let total: i32 = idxs.iter().map(|&i| self.assignments[i].weekly_hours).sum();
            let cap = s.class_daily_max * s.days;
            let class = &self.classes[class_id];
            if total > cap {
                return Err(data_error(
                    &format!("class {}", class.label()),
                    &format!("周课时 {total} 超出上限 {cap}"),
                ));
            }
            // 总课时不足以满足每日最低课时——大概率不可行，提前提示（不阻断）
            let floor = s.class_daily_min * s.days;
            if total < floor {
                warn!(
                    class = %class.label(),
                    total,
                    floor,
                    "班级总课时低于每日最低课时之和，求解很可能不可行"
                );
            }
        }

        // 教师周课时上限
        for (teacher_id, idxs) in &self.assignments_by_teacher {
            let total: i32 = idxs.iter().map(|&i| self.assignments[i].weekly_hours).sum();
            let cap = s.teacher_daily_max * s.days;
            if total > cap {
                let teacher = &self.teachers[teacher_id];
                return Err(data_error(
                    &format!("teacher {}", teacher.full_name),
                    &format!("周课时 {total} 超出上限 {cap}"),
                ));
            }
        }

        // 不可用时段区间合法性
        for u in &self.unavailabilities {
            let teacher_name = self
                .teachers
                .get(&u.teacher_id)
                .map(|t| t.full_name.clone())
                .unwrap_or_else(|| format!("id={}", u.teacher_id));
            let key = format!("unavailability teacher={teacher_name} day={}", u.day);

            if !self.teachers.contains_key(&u.teacher_id) {
                return Err(data_error(&key, "引用的教师不存在"));
            }
            if u.day < 0 || u.day >= s.days {
                return Err(data_error(&key, &format!("天 {} 超出范围", u.day)));
            }
            if u.start_period >= u.end_period {
                return Err(data_error(
                    &key,
                    &format!("区间 [{}, {}) 为空或倒置", u.start_period, u.end_period),
                ));
            }
            if u.start_period < 0 || u.end_period > s.periods {
                return Err(data_error(
                    &key,
                    &format!(
                        "区间 [{}, {}) 超出节次范围 [0, {})",
                        u.start_period, u.end_period, s.periods
                    ),
                ));
            }
        }

        Ok(())
    }
}

fn data_error(entity: &str, reason: &str) -> ScheduleError {
    ScheduleError::Data {
        entity: entity.to_string(),
        reason: reason.to_string(),
    }
}

/// 按给定键把安排下标分组（键有序，保证遍历确定性）
fn index_by<F>(assignments: &[Assignment], key: F) -> BTreeMap<i64, Vec<usize>>
where
    F: Fn(&Assignment) -> i64,
{
    assignments
        .iter()
        .enumerate()
        .map(|(idx, a)| (key(a), idx))
        .into_group_map()
        .into_iter()
        .collect()
}
