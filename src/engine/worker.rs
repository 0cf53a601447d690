// ==========================================
// 学校排课系统 - 后台求解工作线程
// ==========================================
// 职责: 把求解流水线搬到后台线程，UI/调用线程通过通道读进度、
//       通过取消标志请求协作式取消
// 约束: 单写者——求解期间所有变更走工作线程自己的 Store 句柄，
//       编辑操作与求解互斥由调用方保证（求解中禁用编辑入口）
// ==========================================

use crate::engine::error::{ScheduleError, ScheduleResult};
use crate::engine::progress::{ChannelProgressSink, SolveProgress};
use crate::engine::solver::{ScheduleSolver, SolveReport};
use crate::repository::Store;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use tracing::info;

/// 后台求解工作线程句柄
pub struct SolveWorker {
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<ScheduleResult<SolveReport>>,
}

impl SolveWorker {
    /// 启动后台求解
    ///
    /// 工作线程自己打开 Store（求解期间的唯一写句柄）
    ///
    /// # 返回
    /// - (SolveWorker, Receiver): 句柄与进度接收端；
    ///   接收端由调用线程在自己的事件节拍里轮询
    pub fn spawn(
        db_path: String,
        time_budget: Option<u64>,
    ) -> (Self, mpsc::Receiver<SolveProgress>) {
        let cancel = Arc::new(AtomicBool::new(false));
        let (sink, rx) = ChannelProgressSink::channel();

        let flag = cancel.clone();
        let handle = std::thread::spawn(move || {
            info!(db_path = %db_path, "后台求解线程启动");
            let store = Store::open(&db_path)?;
            ScheduleSolver::new(&store)
                .with_cancel_flag(flag)
                .with_progress(Arc::new(sink))
                .with_time_budget(time_budget)
                .run()
        });

        (Self { cancel, handle }, rx)
    }

    /// 请求取消
    ///
    /// 标志在下一个阶段边界被观察到；后端已进入求解时由时间预算兜底
    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// 求解是否已结束
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// 等待求解结束并取回结果
    pub fn join(self) -> ScheduleResult<SolveReport> {
        match self.handle.join() {
            Ok(result) => result,
            // 工作线程 panic 属于缺陷
            Err(_) => Err(ScheduleError::Defect("求解线程异常退出".to_string())),
        }
    }
}
