// ==========================================
// 学校排课系统 - 目标函数构建
// ==========================================
// 目标 = 教师空闲时段成本 + 班级换教室成本（权重均为 1）
// 线性化说明:
// - 教师在 (天, 节次) 的占用本身就是 0/1 取值的线性和（同刻最多一节），
//   无需额外占用布尔量
// - 空闲时段用 before/after/gap 三个布尔量做双向 AND 线性化，
//   无论目标符号如何，gap 恰好等于空档指示值
// - 换教室只建一个 changed 布尔量，按教室逐条下界约束，
//   避免 (r1, r2) 的二次展开；该项只做最小化，下界即精确值
// ==========================================

use crate::engine::model::ModelBuilder;
use good_lp::{constraint, variable, Expression};

impl ModelBuilder<'_> {
    /// 组装目标函数
    pub(crate) fn build_objective(&mut self) {
        let mut objective = Expression::from(0.0);

        let idle = self.teacher_idle_terms();
        match self.catalog.settings.teacher_idle_preference {
            crate::domain::types::IdlePreference::Minimize => objective += idle,
            crate::domain::types::IdlePreference::Maximize => objective -= idle,
        }

        if self.catalog.settings.minimize_room_changes {
            objective += self.room_change_terms();
        }

        self.objective = objective;
    }

    /// 教师空闲时段项
    ///
    /// 对每个 (教师, 天, 节次):
    ///   before[p] = 该节之前是否有课, after[p] = 该节之后是否有课
    ///   gap[p] = before[p] ∧ after[p] ∧ ¬busy[p]
    /// 当日空档数 = Σ gap[p]，恰为 (末节 − 首节 + 1 − 课数)，无课日为 0
    fn teacher_idle_terms(&mut self) -> Expression {
        let catalog = self.catalog;
        let s = &catalog.settings;
        let periods = s.periods as usize;
        let mut total = Expression::from(0.0);

        for idxs in catalog.assignments_by_teacher.values() {
            for d in 0..s.days {
                // 每节的占用（线性和，取值 0/1）
                let busy: Vec<Expression> = (0..s.periods)
                    .map(|p| self.slot_vars(idxs, d, p).into_iter().sum())
                    .collect();

                let before: Vec<_> = (0..periods)
                    .map(|_| self.problem.add(variable().binary()))
                    .collect();
                let after: Vec<_> = (0..periods)
                    .map(|_| self.problem.add(variable().binary()))
                    .collect();
                let gap: Vec<_> = (0..periods)
                    .map(|_| self.problem.add(variable().binary()))
                    .collect();

                for p in 0..periods {
                    // before[p] == OR(busy[0..p])
                    if p == 0 {
                        self.constraints.push(constraint!(before[0] <= 0.0));
                    } else {
                        let mut earlier = Expression::from(0.0);
                        for q in 0..p {
                            self.constraints
                                .push(constraint!(before[p] >= busy[q].clone()));
                            earlier += busy[q].clone();
                        }
                        self.constraints.push(constraint!(before[p] <= earlier));
                    }

                    // after[p] == OR(busy[p+1..H])
                    if p == periods - 1 {
                        self.constraints.push(constraint!(after[p] <= 0.0));
                    } else {
                        let mut later = Expression::from(0.0);
                        for q in p + 1..periods {
                            self.constraints
                                .push(constraint!(after[p] >= busy[q].clone()));
                            later += busy[q].clone();
                        }
                        self.constraints.push(constraint!(after[p] <= later));
                    }

                    // gap[p] == before[p] ∧ after[p] ∧ ¬busy[p]
                    self.constraints.push(constraint!(
                        gap[p] >= before[p] + after[p] - busy[p].clone() - 1.0
                    ));
                    self.constraints.push(constraint!(gap[p] <= before[p]));
                    self.constraints.push(constraint!(gap[p] <= after[p]));
                    self.constraints
                        .push(constraint!(gap[p] + busy[p].clone() <= 1.0));

                    total += gap[p];
                }
            }
        }

        total
    }

    /// 班级换教室项
    ///
    /// 对每个 (班级, 天, 节次 p ≥ 1) 建一个 changed 布尔量，对每个教室 r:
    ///   changed ≥ in_room(p-1, r) + has(p) − in_room(p, r) − 1
    /// 当且仅当班级在 p-1 用 r、在 p 有课且不在 r 时右端为 1
    fn room_change_terms(&mut self) -> Expression {
        let catalog = self.catalog;
        let s = &catalog.settings;
        let rooms = self.room_count();
        let mut total = Expression::from(0.0);

        for idxs in catalog.assignments_by_class.values() {
            for d in 0..s.days {
                // in_room[p][ri]（线性和，取值 0/1）
                let in_room: Vec<Vec<Expression>> = (0..s.periods)
                    .map(|p| {
                        (0..rooms)
                            .map(|ri| self.slot_room_vars(idxs, d, p, ri).into_iter().sum())
                            .collect()
                    })
                    .collect();
                let has: Vec<Expression> = (0..s.periods)
                    .map(|p| self.slot_vars(idxs, d, p).into_iter().sum())
                    .collect();

                for p in 1..s.periods as usize {
                    let changed = self.problem.add(variable().binary());
                    for ri in 0..rooms {
                        self.constraints.push(constraint!(
                            changed
                                >= in_room[p - 1][ri].clone() + has[p].clone()
                                    - in_room[p][ri].clone()
                                    - 1.0
                        ));
                    }
                    total += changed;
                }
            }
        }

        total
    }
}
