// ==========================================
// 学校排课系统 - 求解进度发布
// ==========================================
// 职责: 定义进度发布 trait，实现依赖倒置
// 说明: 引擎只负责发布 (百分比, 状态文本)，消费方式由调用方决定；
//       同一次求解内百分比单调不减
// ==========================================

use std::sync::mpsc;

/// 求解进度
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveProgress {
    /// 0-100
    pub percent: u8,
    /// 状态文本
    pub status: String,
}

impl SolveProgress {
    pub fn new(percent: u8, status: impl Into<String>) -> Self {
        Self {
            percent,
            status: status.into(),
        }
    }
}

/// 进度发布者 trait
///
/// 引擎层定义，UI/CLI 侧实现或复用下面的通道实现
pub trait ProgressSink: Send + Sync {
    /// 发布一次进度更新
    fn publish(&self, progress: SolveProgress);
}

/// 空操作进度发布者（单元测试、CLI 同步调用场景）
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgressSink;

impl ProgressSink for NoOpProgressSink {
    fn publish(&self, progress: SolveProgress) {
        tracing::debug!(
            percent = progress.percent,
            status = %progress.status,
            "进度更新（未接收）"
        );
    }
}

/// 单生产者-单消费者通道进度发布者
///
/// 后台求解线程持有发送端，UI 线程在自己的事件节拍里读取接收端；
/// 接收端已关闭时静默丢弃
pub struct ChannelProgressSink {
    tx: mpsc::Sender<SolveProgress>,
}

impl ChannelProgressSink {
    /// 创建通道并返回 (发布者, 接收端)
    pub fn channel() -> (Self, mpsc::Receiver<SolveProgress>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelProgressSink {
    fn publish(&self, progress: SolveProgress) {
        if self.tx.send(progress).is_err() {
            tracing::debug!("进度接收端已关闭，丢弃更新");
        }
    }
}
