// ==========================================
// 学校排课系统 - 约束模型构建
// ==========================================
// 职责: 把数据快照翻译为 0-1 整数规划模型
// 决策变量: x[安排, 课时副本, 天, 节次, 教室] ∈ {0, 1}
// 说明: 变量按 (安排 id 升序, 课时, 天, 节次, 教室 id 升序) 平铺编号，
//       顺序稳定是重复求解逐位一致的前提
// ==========================================

use crate::engine::catalog::Catalog;
use good_lp::{constraint, variable, Constraint, Expression, ProblemVariables, Variable};
use tracing::{debug, info};

/// 单个决策变量的含义（解码用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarKey {
    /// catalog.assignments 的下标
    pub assignment_idx: usize,
    /// 课时副本 k ∈ [0, weekly_hours)
    pub hour: i32,
    pub day: i32,
    pub period: i32,
    pub room_id: i64,
}

/// 构建完成的模型
pub struct ModelBuild {
    pub problem: ProblemVariables,
    /// 决策变量（平铺，与 keys 一一对应）
    pub x: Vec<Variable>,
    pub keys: Vec<VarKey>,
    pub constraints: Vec<Constraint>,
    pub objective: Expression,
}

impl ModelBuild {
    pub fn variable_count(&self) -> usize {
        self.x.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }
}

/// 从快照构建完整模型（硬约束 + 目标函数）
pub fn build_model(catalog: &Catalog) -> ModelBuild {
    let mut builder = ModelBuilder::new(catalog);

    builder.add_coverage_constraints();
    builder.add_teacher_conflict_constraints();
    builder.add_class_conflict_constraints();
    builder.add_room_conflict_constraints();
    builder.add_teacher_unavailability_constraints();
    builder.add_teacher_daily_constraints();
    builder.add_class_daily_constraints();
    builder.add_same_course_daily_constraints();

    if catalog.settings.enforce_special_rooms {
        builder.add_special_room_constraints();
    }
    if catalog.settings.prefer_block_consecutive {
        builder.add_block_constraints();
    }

    builder.build_objective();

    info!(
        variables = builder.x.len(),
        constraints = builder.constraints.len(),
        "模型构建完成"
    );

    ModelBuild {
        problem: builder.problem,
        x: builder.x,
        keys: builder.keys,
        constraints: builder.constraints,
        objective: builder.objective,
    }
}

// ==========================================
// ModelBuilder - 模型构建器
// ==========================================
pub(crate) struct ModelBuilder<'a> {
    pub(crate) catalog: &'a Catalog,
    pub(crate) problem: ProblemVariables,
    pub(crate) x: Vec<Variable>,
    pub(crate) keys: Vec<VarKey>,
    pub(crate) constraints: Vec<Constraint>,
    pub(crate) objective: Expression,
    /// 各安排在 x 中的起始下标
    base: Vec<usize>,
    /// 教室 id，按升序（ri 下标空间）
    room_ids: Vec<i64>,
}

impl<'a> ModelBuilder<'a> {
    fn new(catalog: &'a Catalog) -> Self {
        let room_ids: Vec<i64> = catalog.rooms.iter().map(|r| r.id).collect();
        let days = catalog.settings.days as usize;
        let periods = catalog.settings.periods as usize;
        let room_count = room_ids.len();

        // 决策变量总数与各安排的起始偏移
        let mut base = Vec::with_capacity(catalog.assignments.len());
        let mut total = 0usize;
        for a in &catalog.assignments {
            base.push(total);
            total += a.weekly_hours as usize * days * periods * room_count;
        }

        let mut problem = ProblemVariables::new();
        let x = problem.add_vector(variable().binary(), total);

        // 与 x 平行的含义表
        let mut keys = Vec::with_capacity(total);
        for (ai, a) in catalog.assignments.iter().enumerate() {
            for k in 0..a.weekly_hours {
                for d in 0..catalog.settings.days {
                    for p in 0..catalog.settings.periods {
                        for &room_id in &room_ids {
                            keys.push(VarKey {
                                assignment_idx: ai,
                                hour: k,
                                day: d,
                                period: p,
                                room_id,
                            });
                        }
                    }
                }
            }
        }
        debug_assert_eq!(keys.len(), total);

        debug!(variables = total, "决策变量创建完成");

        Self {
            catalog,
            problem,
            x,
            keys,
            constraints: Vec::new(),
            objective: Expression::from(0.0),
            base,
            room_ids,
        }
    }

    // ==========================================
    // 变量定位
    // ==========================================

    /// x[安排下标, 课时副本, 天, 节次, 教室下标]
    pub(crate) fn var(&self, ai: usize, k: i32, d: i32, p: i32, ri: usize) -> Variable {
        let days = self.catalog.settings.days as usize;
        let periods = self.catalog.settings.periods as usize;
        let rooms = self.room_ids.len();
        let offset = ((k as usize * days + d as usize) * periods + p as usize) * rooms + ri;
        self.x[self.base[ai] + offset]
    }

    pub(crate) fn room_count(&self) -> usize {
        self.room_ids.len()
    }

    /// 教室 id -> ri 下标
    fn room_index(&self, room_id: i64) -> Option<usize> {
        self.room_ids.binary_search(&room_id).ok()
    }

    /// 某安排的某个课时副本的全部变量
    fn hour_copy_vars(&self, ai: usize, k: i32) -> Vec<Variable> {
        let s = &self.catalog.settings;
        let mut vars = Vec::new();
        for d in 0..s.days {
            for p in 0..s.periods {
                for ri in 0..self.room_ids.len() {
                    vars.push(self.var(ai, k, d, p, ri));
                }
            }
        }
        vars
    }

    /// 一组安排在 (天, 节次) 上的全部变量（所有课时副本、所有教室）
    pub(crate) fn slot_vars(&self, assignment_idxs: &[usize], d: i32, p: i32) -> Vec<Variable> {
        let mut vars = Vec::new();
        for &ai in assignment_idxs {
            let a = &self.catalog.assignments[ai];
            for k in 0..a.weekly_hours {
                for ri in 0..self.room_ids.len() {
                    vars.push(self.var(ai, k, d, p, ri));
                }
            }
        }
        vars
    }

    /// 一组安排在 (天, 节次, 教室) 上的全部变量
    pub(crate) fn slot_room_vars(
        &self,
        assignment_idxs: &[usize],
        d: i32,
        p: i32,
        ri: usize,
    ) -> Vec<Variable> {
        let mut vars = Vec::new();
        for &ai in assignment_idxs {
            let a = &self.catalog.assignments[ai];
            for k in 0..a.weekly_hours {
                vars.push(self.var(ai, k, d, p, ri));
            }
        }
        vars
    }

    /// 一组安排在某一天的全部变量（所有节次）
    fn day_vars(&self, assignment_idxs: &[usize], d: i32) -> Vec<Variable> {
        let mut vars = Vec::new();
        for p in 0..self.catalog.settings.periods {
            vars.extend(self.slot_vars(assignment_idxs, d, p));
        }
        vars
    }

    // ==========================================
    // 硬约束
    // ==========================================

    /// 覆盖约束: 每个课时副本恰好落位一次
    fn add_coverage_constraints(&mut self) {
        for ai in 0..self.catalog.assignments.len() {
            let weekly_hours = self.catalog.assignments[ai].weekly_hours;
            for k in 0..weekly_hours {
                let total: Expression = self.hour_copy_vars(ai, k).into_iter().sum();
                self.constraints.push(constraint!(total == 1.0));
            }
        }
    }

    /// 教师同一时刻最多一节课
    fn add_teacher_conflict_constraints(&mut self) {
        let catalog = self.catalog;
        for idxs in catalog.assignments_by_teacher.values() {
            for d in 0..catalog.settings.days {
                for p in 0..catalog.settings.periods {
                    let vars = self.slot_vars(idxs, d, p);
                    if vars.is_empty() {
                        continue;
                    }
                    let total: Expression = vars.into_iter().sum();
                    self.constraints.push(constraint!(total <= 1.0));
                }
            }
        }
    }

    /// 班级同一时刻最多一节课
    fn add_class_conflict_constraints(&mut self) {
        let catalog = self.catalog;
        for idxs in catalog.assignments_by_class.values() {
            for d in 0..catalog.settings.days {
                for p in 0..catalog.settings.periods {
                    let vars = self.slot_vars(idxs, d, p);
                    if vars.is_empty() {
                        continue;
                    }
                    let total: Expression = vars.into_iter().sum();
                    self.constraints.push(constraint!(total <= 1.0));
                }
            }
        }
    }

    /// 教室同一时刻最多一节课
    fn add_room_conflict_constraints(&mut self) {
        let catalog = self.catalog;
        let all_idxs: Vec<usize> = (0..catalog.assignments.len()).collect();
        for ri in 0..self.room_ids.len() {
            for d in 0..catalog.settings.days {
                for p in 0..catalog.settings.periods {
                    let vars = self.slot_room_vars(&all_idxs, d, p, ri);
                    if vars.is_empty() {
                        continue;
                    }
                    let total: Expression = vars.into_iter().sum();
                    self.constraints.push(constraint!(total <= 1.0));
                }
            }
        }
    }

    /// 教师不可用时段内禁止排课
    fn add_teacher_unavailability_constraints(&mut self) {
        let catalog = self.catalog;
        for ((teacher_id, day), ranges) in &catalog.unavailability_by_teacher_day {
            let Some(idxs) = catalog.assignments_by_teacher.get(teacher_id) else {
                continue;
            };
            for &(start, end) in ranges {
                for p in start.max(0)..end.min(catalog.settings.periods) {
                    let vars = self.slot_vars(idxs, *day, p);
                    if vars.is_empty() {
                        continue;
                    }
                    let total: Expression = vars.into_iter().sum();
                    self.constraints.push(constraint!(total == 0.0));
                }
            }
        }
    }

    /// 教师每日课时上下限
    ///
    /// 下限是条件约束: 当日有课才生效。works ∈ {0,1} 由两条线性式联动:
    ///   T ≤ max · works  （有课则 works = 1）
    ///   T ≥ min · works  （works = 1 则至少 min 节）
    fn add_teacher_daily_constraints(&mut self) {
        let catalog = self.catalog;
        let s = &catalog.settings;

        for idxs in catalog.assignments_by_teacher.values() {
            for d in 0..s.days {
                let vars = self.day_vars(idxs, d);
                if vars.is_empty() {
                    continue;
                }
                let total: Expression = vars.into_iter().sum();
                let works = self.problem.add(variable().binary());

                self.constraints
                    .push(constraint!(total.clone() <= (s.teacher_daily_max as f64) * works));
                self.constraints
                    .push(constraint!(total >= (s.teacher_daily_min as f64) * works));
            }
        }
    }

    /// 班级每日课时上下限（下限无条件）
    fn add_class_daily_constraints(&mut self) {
        let catalog = self.catalog;
        let s = &catalog.settings;
        for idxs in catalog.assignments_by_class.values() {
            for d in 0..s.days {
                let vars = self.day_vars(idxs, d);
                if vars.is_empty() {
                    continue;
                }
                let total: Expression = vars.into_iter().sum();
                self.constraints
                    .push(constraint!(total.clone() <= s.class_daily_max as f64));
                self.constraints
                    .push(constraint!(total >= s.class_daily_min as f64));
            }
        }
    }

    /// 同一班级同一课程每天最多 same_course_daily_max 节
    fn add_same_course_daily_constraints(&mut self) {
        let catalog = self.catalog;
        for idxs in catalog.assignments_by_class.values() {
            // 班内按课程分组
            let mut by_course: std::collections::BTreeMap<i64, Vec<usize>> =
                std::collections::BTreeMap::new();
            for &ai in idxs {
                by_course
                    .entry(catalog.assignments[ai].course_id)
                    .or_default()
                    .push(ai);
            }

            for course_idxs in by_course.values() {
                for d in 0..catalog.settings.days {
                    let vars = self.day_vars(course_idxs, d);
                    if vars.is_empty() {
                        continue;
                    }
                    let total: Expression = vars.into_iter().sum();
                    self.constraints.push(constraint!(
                        total <= catalog.settings.same_course_daily_max as f64
                    ));
                }
            }
        }
    }

    /// 专用课程禁止进普通教室
    fn add_special_room_constraints(&mut self) {
        let catalog = self.catalog;
        let normal_ris: Vec<usize> = catalog
            .normal_room_ids()
            .iter()
            .filter_map(|&id| self.room_index(id))
            .collect();
        if normal_ris.is_empty() {
            return;
        }

        for (ai, a) in catalog.assignments.iter().enumerate() {
            let course = &catalog.courses[&a.course_id];
            if !catalog.course_needs_special_room(course) {
                continue;
            }

            let mut vars = Vec::new();
            for k in 0..a.weekly_hours {
                for d in 0..catalog.settings.days {
                    for p in 0..catalog.settings.periods {
                        for &ri in &normal_ris {
                            vars.push(self.var(ai, k, d, p, ri));
                        }
                    }
                }
            }
            let total: Expression = vars.into_iter().sum();
            self.constraints.push(constraint!(total == 0.0));
        }
    }

    /// 连堂约束: 课时副本沿 (同天, 下一节, 同教室) 链式排列
    ///
    /// x[a,k,d,p,r] ≤ x[a,k+1,d,p+1,r]，p ∈ [0, H-1)；
    /// 非末尾副本同时禁止落在当日最后一节，否则链条在日界断开
    fn add_block_constraints(&mut self) {
        let catalog = self.catalog;
        let s = &catalog.settings;
        for (ai, a) in catalog.assignments.iter().enumerate() {
            if a.weekly_hours < 2 {
                continue;
            }
            for k in 0..a.weekly_hours - 1 {
                for d in 0..s.days {
                    for p in 0..s.periods - 1 {
                        for ri in 0..self.room_ids.len() {
                            let cur = self.var(ai, k, d, p, ri);
                            let next = self.var(ai, k + 1, d, p + 1, ri);
                            self.constraints.push(constraint!(cur <= next));
                        }
                    }
                }

                // 末节封锁
                let mut last_period_vars = Vec::new();
                for d in 0..s.days {
                    for ri in 0..self.room_ids.len() {
                        last_period_vars.push(self.var(ai, k, d, s.periods - 1, ri));
                    }
                }
                let total: Expression = last_period_vars.into_iter().sum();
                self.constraints.push(constraint!(total == 0.0));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::school::{Assignment, Course, Room, SchoolClass, Teacher};
    use crate::domain::types::RoomKind;
    use crate::engine::catalog::Catalog;
    use crate::repository::Store;

    fn seed_minimal(store: &Store) {
        let class_id = store
            .classes
            .upsert(&SchoolClass {
                id: 0,
                name: "10".to_string(),
                section: "A".to_string(),
                weekly_total_hours: 40,
            })
            .unwrap();
        let teacher_id = store
            .teachers
            .upsert(&Teacher {
                id: 0,
                full_name: "T1".to_string(),
                subject: "Math".to_string(),
                weekly_hours: 20,
            })
            .unwrap();
        let course_id = store
            .courses
            .upsert(&Course {
                id: 0,
                name: "Math".to_string(),
                weekly_hours: 2,
                requires_special_room: false,
            })
            .unwrap();
        store
            .rooms
            .upsert(&Room {
                id: 0,
                name: "R1".to_string(),
                kind: RoomKind::Normal,
            })
            .unwrap();
        store
            .assignments
            .upsert(&Assignment {
                id: 0,
                course_id,
                class_id,
                teacher_id,
                weekly_hours: 2,
            })
            .unwrap();
    }

    #[test]
    fn test_variable_count_matches_dimension() {
        let store = Store::open_in_memory().unwrap();
        seed_minimal(&store);
        store.settings.put("class_daily_min", "0").unwrap();

        let catalog = Catalog::load(&store).unwrap();
        let build = build_model(&catalog);

        // 1 个安排 × 2 课时 × 5 天 × 8 节 × 1 教室
        assert_eq!(build.variable_count(), 2 * 5 * 8);
        assert_eq!(build.keys.len(), build.x.len());
        assert!(build.constraint_count() > 0);
    }

    #[test]
    fn test_keys_are_sorted_by_flat_index() {
        let store = Store::open_in_memory().unwrap();
        seed_minimal(&store);
        store.settings.put("class_daily_min", "0").unwrap();

        let catalog = Catalog::load(&store).unwrap();
        let build = build_model(&catalog);

        // 平铺顺序: k 外层，天/节次/教室内层
        let first = build.keys.first().unwrap();
        assert_eq!(first.hour, 0);
        assert_eq!(first.day, 0);
        assert_eq!(first.period, 0);

        let last = build.keys.last().unwrap();
        assert_eq!(last.hour, 1);
        assert_eq!(last.day, 4);
        assert_eq!(last.period, 7);
    }
}
