// ==========================================
// 学校排课系统 - 引擎层错误类型
// ==========================================
// 职责: 定义排课流程的错误分类
// 红线: 不做静默兜底——除唯一键冲突可由调用方重试外，错误原样上抛
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// 输入数据违反快照校验规则（携带首个出错实体的自然键）
    #[error("数据校验失败: {entity}: {reason}")]
    Data { entity: String, reason: String },

    /// 求解器在时间预算内未找到可行解；课表保持原状
    #[error("无可行解: {reason}")]
    Infeasible { reason: String },

    /// 解码后的解未通过自检——属于缺陷而非不可行
    #[error("解自检失败: {0}")]
    Defect(String),

    /// 在阶段边界观察到协作式取消
    #[error("排课已取消")]
    Interrupted,

    /// 仓储层错误透传
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result 类型别名
pub type ScheduleResult<T> = Result<T, ScheduleError>;
