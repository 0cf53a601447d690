// ==========================================
// 学校排课系统 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 唯一性冲突 =====
    /// 自然键冲突（调用方可换键重试）
    #[error("唯一键冲突: {entity} {key}")]
    Conflict { entity: String, key: String },

    // ===== 数据库错误 =====
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: i64 },

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    #[error("外键约束违反: {0}")]
    ForeignKeyViolation(String),

    // ===== 数据质量错误 =====
    #[error("字段值错误 (field={field}): {message}")]
    FieldValueError { field: String, message: String },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<rusqlite::Error>
//
// 注意: UNIQUE 冲突在各仓储的写入口被拦截并映射为带自然键的 Conflict；
// 走到这里的 UNIQUE 失败属于兜底路径，只能携带驱动层消息
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                if msg.contains("UNIQUE") {
                    RepositoryError::Conflict {
                        entity: "unknown".to_string(),
                        key: msg,
                    }
                } else if msg.contains("FOREIGN KEY") {
                    RepositoryError::ForeignKeyViolation(msg)
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "unknown".to_string(),
                id: 0,
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

/// 判断 rusqlite 错误是否为 UNIQUE 约束冲突
///
/// 各仓储在写入口用它把冲突映射为带自然键的 `Conflict`
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, msg) => {
            e.code == rusqlite::ErrorCode::ConstraintViolation
                && msg.as_deref().map(|m| m.contains("UNIQUE")).unwrap_or(true)
        }
        _ => false,
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_display_carries_key() {
        let err = RepositoryError::Conflict {
            entity: "class".to_string(),
            key: "10/A".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("class"));
        assert!(msg.contains("10/A"));
    }
}
