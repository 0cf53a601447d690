// ==========================================
// 学校排课系统 - 课表编辑器
// ==========================================
// 职责: 排课完成后的人工微调——移动、删除、清空，不触发重新求解
// 定位: 人工覆盖具有最终决定权；编辑器只负责把引发的冲突如实报告，
//       不回滚已完成的移动。求解器的可行性保证只对求解产物成立
// ==========================================

use crate::domain::school::PlacementRow;
use crate::engine::error::{ScheduleError, ScheduleResult};
use crate::repository::{RepositoryError, Store};
use tracing::{info, warn};

// ==========================================
// 目标槽位被占时的处理策略
// ==========================================

/// 占位冲突的裁决
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictDecision {
    /// 删除占位条目后继续移动
    Replace,
    /// 放弃移动
    Abort,
}

/// 占位冲突策略
///
/// 目标 (天, 节次, 教室) 已有条目时征询调用方；
/// 交互层可在这里弹确认框，批处理场景用下面两个现成实现
pub trait ConflictPolicy {
    fn on_conflict(&self, incumbent: &PlacementRow) -> ConflictDecision;
}

/// 一律放弃移动
#[derive(Debug, Clone, Copy, Default)]
pub struct AbortOnConflict;

impl ConflictPolicy for AbortOnConflict {
    fn on_conflict(&self, _incumbent: &PlacementRow) -> ConflictDecision {
        ConflictDecision::Abort
    }
}

/// 一律顶掉占位条目
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplaceOnConflict;

impl ConflictPolicy for ReplaceOnConflict {
    fn on_conflict(&self, _incumbent: &PlacementRow) -> ConflictDecision {
        ConflictDecision::Replace
    }
}

// ==========================================
// 移动结果
// ==========================================

/// 一次移动操作的结果
///
/// 三个冲突标志描述移动后的真实状态，移动本身不会因冲突回滚
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    /// 是否实际执行了移动（Abort 裁决时为 false）
    pub moved: bool,
    /// 被顶掉的占位条目 id
    pub evicted_placement_id: Option<i64>,
    /// 同教师在新 (天, 节次) 还有别的课
    pub teacher_conflict: bool,
    /// 同班级在新 (天, 节次) 还有别的课
    pub class_conflict: bool,
    /// 同教室在新 (天, 节次) 还有别的课
    pub room_conflict: bool,
}

impl MoveOutcome {
    fn aborted() -> Self {
        Self {
            moved: false,
            evicted_placement_id: None,
            teacher_conflict: false,
            class_conflict: false,
            room_conflict: false,
        }
    }

    /// 是否引发了任何冲突
    pub fn has_conflict(&self) -> bool {
        self.teacher_conflict || self.class_conflict || self.room_conflict
    }
}

// ==========================================
// ScheduleEditor - 课表编辑器
// ==========================================

pub struct ScheduleEditor<'a> {
    store: &'a Store,
}

impl<'a> ScheduleEditor<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// 把一条课表条目移到新的 (天, 节次, 教室)
    ///
    /// 流程:
    /// 1. 目标槽位被占时按策略裁决（Abort 则原样返回）
    /// 2. 执行移动
    /// 3. 统计移动后同教师/班级/教室在新槽位的其他条目，填冲突标志
    ///
    /// # 返回
    /// - Ok(MoveOutcome): 移动结果与冲突标志
    /// - Err(Repository(NotFound)): 条目不存在
    pub fn move_placement(
        &self,
        placement_id: i64,
        day: i32,
        period: i32,
        room_id: i64,
        policy: &dyn ConflictPolicy,
    ) -> ScheduleResult<MoveOutcome> {
        let placements = &self.store.placements;

        let placement = placements.find_by_id(placement_id)?.ok_or_else(|| {
            ScheduleError::Repository(RepositoryError::NotFound {
                entity: "placement".to_string(),
                id: placement_id,
            })
        })?;

        // 目标槽位占位检查（排除自身原位即目标位的情况）
        let mut evicted = None;
        if let Some(incumbent) = placements.find_at_slot(day, period, room_id)? {
            if incumbent.id != placement_id {
                match policy.on_conflict(&incumbent) {
                    ConflictDecision::Abort => {
                        info!(placement_id, "目标槽位被占，移动被放弃");
                        return Ok(MoveOutcome::aborted());
                    }
                    ConflictDecision::Replace => {
                        placements.delete(incumbent.id)?;
                        evicted = Some(incumbent.id);
                    }
                }
            }
        }

        placements.relocate(placement_id, day, period, room_id)?;

        let outcome = MoveOutcome {
            moved: true,
            evicted_placement_id: evicted,
            teacher_conflict: placements.count_teacher_at(
                placement.teacher_id,
                day,
                period,
                placement_id,
            )? > 0,
            class_conflict: placements.count_class_at(
                placement.class_id,
                day,
                period,
                placement_id,
            )? > 0,
            room_conflict: placements.count_room_at(room_id, day, period, placement_id)? > 0,
        };

        if outcome.has_conflict() {
            warn!(
                placement_id,
                teacher_conflict = outcome.teacher_conflict,
                class_conflict = outcome.class_conflict,
                room_conflict = outcome.room_conflict,
                "移动完成，但引发冲突（人工覆盖，不回滚）"
            );
        } else {
            info!(placement_id, day, period, room_id, "移动完成，无冲突");
        }

        Ok(outcome)
    }

    /// 删除一条课表条目
    pub fn delete_placement(&self, placement_id: i64) -> ScheduleResult<()> {
        self.store.placements.delete(placement_id)?;
        info!(placement_id, "课表条目已删除");
        Ok(())
    }

    /// 清空整张课表
    pub fn clear(&self) -> ScheduleResult<()> {
        self.store.placements.clear()?;
        info!("课表已清空");
        Ok(())
    }
}
