// ==========================================
// 学校排课系统 - 配置仓储
// ==========================================
// 存储: settings 表 (key-value)
// 默认值在建库时一次性填充，见 schema::DEFAULT_SETTINGS
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

/// 单条配置项
#[derive(Debug, Clone)]
pub struct SettingEntry {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
}

/// 配置仓储
///
/// 职责: settings 表的读写；解析为强类型的工作在 config 层完成
pub struct SettingsRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SettingsRepository {
    /// 从共享连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取配置值，缺失时返回给定默认值
    pub fn get(&self, key: &str, default: &str) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(value),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(default.to_string()),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入配置值（存在则更新，不存在则插入）
    pub fn put(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO settings (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = CURRENT_TIMESTAMP
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取全部配置项（按键排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<SettingEntry>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value, description FROM settings ORDER BY key")?;
        let entries = stmt
            .query_map([], |row| {
                Ok(SettingEntry {
                    key: row.get(0)?,
                    value: row.get(1)?,
                    description: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(entries)
    }
}
