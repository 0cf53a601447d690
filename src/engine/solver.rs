// ==========================================
// 学校排课系统 - 求解流水线
// ==========================================
// 阶段: 加载 -> 建模 -> 求解 -> 解码自检 -> 落库
// 协作式取消: 只在阶段边界检查取消标志；
//            后端内部由时间预算兜底，预算到点必然返回
// 落库原子性: 整表替换在单个事务内完成，新课表要么全部提交要么一条不写
// ==========================================

use crate::domain::school::Placement;
use crate::engine::catalog::Catalog;
use crate::engine::error::{ScheduleError, ScheduleResult};
use crate::engine::model::{build_model, ModelBuild};
use crate::engine::progress::{NoOpProgressSink, ProgressSink, SolveProgress};
use crate::repository::Store;
use chrono::NaiveDateTime;
use good_lp::{default_solver, ResolutionError, Solution, SolverModel};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// 固定求解种子——同样输入重复求解逐位一致
const SOLVER_SEED: i32 = 1203;

/// 一次成功求解的结果摘要
#[derive(Debug, Clone)]
pub struct SolveReport {
    /// 写入的课表条目数
    pub placements: usize,
    /// 目标函数值（空闲成本 + 换教室成本）
    pub objective: f64,
    /// 求解耗时（秒，含建模与落库）
    pub wall_secs: f64,
    pub solved_at: NaiveDateTime,
    pub variables: usize,
    pub constraints: usize,
}

/// 排课求解器
///
/// 持有 Store 引用跑完整条流水线；进度发布与取消标志可选注入
pub struct ScheduleSolver<'a> {
    store: &'a Store,
    cancel: Arc<AtomicBool>,
    progress: Arc<dyn ProgressSink>,
    time_budget_override: Option<u64>,
}

impl<'a> ScheduleSolver<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self {
            store,
            cancel: Arc::new(AtomicBool::new(false)),
            progress: Arc::new(NoOpProgressSink),
            time_budget_override: None,
        }
    }

    /// 注入取消标志（后台线程场景）
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// 注入进度发布者
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// 覆盖配置中的时间预算（CLI --time-budget）
    pub fn with_time_budget(mut self, seconds: Option<u64>) -> Self {
        self.time_budget_override = seconds;
        self
    }

    /// 执行完整排课流程
    ///
    /// # 返回
    /// - Ok(SolveReport): 新课表已原子替换旧课表
    /// - Err(Data): 快照校验失败，课表未动
    /// - Err(Infeasible): 预算内无可行解，课表未动
    /// - Err(Interrupted): 在阶段边界观察到取消，课表未动
    /// - Err(Defect): 解自检失败——这是缺陷，课表未动
    pub fn run(&self) -> ScheduleResult<SolveReport> {
        let started = Instant::now();

        // ===== 阶段 1: 加载数据 =====
        self.checkpoint()?;
        self.publish(10, "加载数据");
        let catalog = Catalog::load(self.store)?;
        self.publish(20, "数据加载完成");

        // ===== 阶段 2: 构建模型 =====
        self.checkpoint()?;
        let build = build_model(&catalog);
        self.publish(30, "模型构建完成");

        // ===== 阶段 3: 求解 =====
        self.checkpoint()?;
        self.publish(40, "求解中");
        let budget = self
            .time_budget_override
            .unwrap_or(catalog.settings.time_budget_seconds);

        let ModelBuild {
            problem,
            x,
            keys,
            constraints,
            objective,
        } = build;
        let variables = x.len();
        let constraint_count = constraints.len();

        info!(
            variables,
            constraints = constraint_count,
            budget_secs = budget,
            "开始求解"
        );

        let mut model = problem
            .minimise(objective.clone())
            .using(default_solver)
            .set_option("time_limit", budget as f64)
            .set_option("threads", 1)
            .set_option("random_seed", SOLVER_SEED)
            .set_option("log_to_console", "false");
        for c in constraints {
            model.add_constraint(c);
        }

        let solution = match model.solve() {
            Ok(solution) => solution,
            Err(ResolutionError::Infeasible) => {
                warn!("预算内无可行解，课表保持原状");
                return Err(ScheduleError::Infeasible {
                    reason: "在给定约束下不存在可行课表".to_string(),
                });
            }
            Err(e) => {
                return Err(ScheduleError::Defect(format!("求解器异常返回: {e}")));
            }
        };
        self.publish(80, "求解完成");

        // ===== 阶段 4: 解码与自检 =====
        self.checkpoint()?;
        let mut placements = Vec::new();
        for (var, key) in x.iter().zip(keys.iter()) {
            if solution.value(*var) > 0.5 {
                let a = &catalog.assignments[key.assignment_idx];
                placements.push(Placement {
                    id: 0,
                    class_id: a.class_id,
                    teacher_id: a.teacher_id,
                    course_id: a.course_id,
                    room_id: Some(key.room_id),
                    day: key.day,
                    period: key.period,
                });
            }
        }
        placements.sort_by_key(|p| (p.class_id, p.day, p.period, p.room_id));
        self_check(&placements)?;
        self.publish(90, "解码与自检完成");

        // ===== 阶段 5: 落库 =====
        self.checkpoint()?;
        let written = self.store.placements.replace_all(&placements)?;
        self.publish(100, "课表已保存");

        let report = SolveReport {
            placements: written,
            objective: solution.eval(objective),
            wall_secs: started.elapsed().as_secs_f64(),
            solved_at: chrono::Local::now().naive_local(),
            variables,
            constraints: constraint_count,
        };

        info!(
            placements = report.placements,
            objective = report.objective,
            wall_secs = report.wall_secs,
            "排课完成"
        );
        Ok(report)
    }

    fn checkpoint(&self) -> ScheduleResult<()> {
        if self.cancel.load(Ordering::SeqCst) {
            warn!("在阶段边界观察到取消请求");
            return Err(ScheduleError::Interrupted);
        }
        Ok(())
    }

    fn publish(&self, percent: u8, status: &str) {
        self.progress.publish(SolveProgress::new(percent, status));
    }
}

/// 解自检: 解码出的课表不得存在教师/班级/教室的同刻重叠
///
/// 自检失败说明模型或解码有缺陷，而非输入不可行
fn self_check(placements: &[Placement]) -> ScheduleResult<()> {
    let mut teacher_slots = HashSet::new();
    let mut class_slots = HashSet::new();
    let mut room_slots = HashSet::new();

    for p in placements {
        if !teacher_slots.insert((p.teacher_id, p.day, p.period)) {
            return Err(ScheduleError::Defect(format!(
                "教师 {} 在 (天 {}, 节 {}) 重叠",
                p.teacher_id, p.day, p.period
            )));
        }
        if !class_slots.insert((p.class_id, p.day, p.period)) {
            return Err(ScheduleError::Defect(format!(
                "班级 {} 在 (天 {}, 节 {}) 重叠",
                p.class_id, p.day, p.period
            )));
        }
        if let Some(room_id) = p.room_id {
            if !room_slots.insert((room_id, p.day, p.period)) {
                return Err(ScheduleError::Defect(format!(
                    "教室 {} 在 (天 {}, 节 {}) 重叠",
                    room_id, p.day, p.period
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(class_id: i64, teacher_id: i64, room_id: i64, day: i32, period: i32) -> Placement {
        Placement {
            id: 0,
            class_id,
            teacher_id,
            course_id: 1,
            room_id: Some(room_id),
            day,
            period,
        }
    }

    #[test]
    fn test_self_check_accepts_disjoint_slots() {
        let rows = vec![
            placement(1, 1, 1, 0, 0),
            placement(1, 1, 1, 0, 1),
            placement(2, 2, 2, 0, 0),
        ];
        assert!(self_check(&rows).is_ok());
    }

    #[test]
    fn test_self_check_rejects_teacher_overlap() {
        let rows = vec![placement(1, 7, 1, 0, 0), placement(2, 7, 2, 0, 0)];
        let err = self_check(&rows).unwrap_err();
        assert!(matches!(err, ScheduleError::Defect(_)));
    }

    #[test]
    fn test_self_check_rejects_room_overlap() {
        let rows = vec![placement(1, 1, 9, 0, 0), placement(2, 2, 9, 0, 0)];
        let err = self_check(&rows).unwrap_err();
        assert!(matches!(err, ScheduleError::Defect(_)));
    }
}
