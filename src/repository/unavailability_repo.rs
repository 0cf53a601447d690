// ==========================================
// 学校排课系统 - 教师不可用时段仓储
// ==========================================
// 红线: Repository 不含业务逻辑，只负责数据访问
// 区间合法性（start < end，落在节次范围内）由 Catalog 校验
// ==========================================

use crate::domain::school::{Unavailability, UnavailabilityRow};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

/// 教师不可用时段仓储
///
/// 职责: 管理 unavailabilities 表的 CRUD 操作
pub struct UnavailabilityRepository {
    conn: Arc<Mutex<Connection>>,
}

impl UnavailabilityRepository {
    /// 从共享连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增或更新不可用时段
    ///
    /// # 返回
    /// - Ok(i64): 记录 id
    /// - Err(ForeignKeyViolation): 教师不存在
    pub fn upsert(&self, entry: &Unavailability) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        if entry.id == 0 {
            conn.execute(
                r#"
                INSERT INTO unavailabilities (teacher_id, day, start_period, end_period)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![entry.teacher_id, entry.day, entry.start_period, entry.end_period],
            )?;
            Ok(conn.last_insert_rowid())
        } else {
            let changed = conn.execute(
                r#"
                UPDATE unavailabilities
                SET teacher_id = ?1, day = ?2, start_period = ?3, end_period = ?4,
                    updated_at = CURRENT_TIMESTAMP
                WHERE id = ?5
                "#,
                params![
                    entry.teacher_id,
                    entry.day,
                    entry.start_period,
                    entry.end_period,
                    entry.id
                ],
            )?;

            if changed == 0 {
                return Err(RepositoryError::NotFound {
                    entity: "unavailability".to_string(),
                    id: entry.id,
                });
            }
            Ok(entry.id)
        }
    }

    /// 按 id 查询
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Unavailability>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            r#"
            SELECT id, teacher_id, day, start_period, end_period
            FROM unavailabilities WHERE id = ?1
            "#,
            params![id],
            map_unavailability,
        );

        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询某教师的不可用时段（按天、起始节次排序）
    pub fn list_by_teacher(&self, teacher_id: i64) -> RepositoryResult<Vec<Unavailability>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, teacher_id, day, start_period, end_period
            FROM unavailabilities
            WHERE teacher_id = ?1
            ORDER BY day, start_period
            "#,
        )?;
        let entries = stmt
            .query_map(params![teacher_id], map_unavailability)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(entries)
    }

    /// 查询全部不可用时段的联查投影（带教师姓名）
    pub fn list_all_enriched(&self) -> RepositoryResult<Vec<UnavailabilityRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT u.id, u.teacher_id, u.day, u.start_period, u.end_period, t.full_name
            FROM unavailabilities u
            JOIN teachers t ON u.teacher_id = t.id
            ORDER BY t.full_name, u.day, u.start_period
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(UnavailabilityRow {
                    id: row.get(0)?,
                    teacher_id: row.get(1)?,
                    day: row.get(2)?,
                    start_period: row.get(3)?,
                    end_period: row.get(4)?,
                    teacher_name: row.get(5)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 查询全部不可用时段（求解器使用，按 id 排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Unavailability>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, teacher_id, day, start_period, end_period
            FROM unavailabilities ORDER BY id
            "#,
        )?;
        let entries = stmt
            .query_map([], map_unavailability)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(entries)
    }

    /// 删除不可用时段
    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM unavailabilities WHERE id = ?1", params![id])?;
        Ok(())
    }
}

fn map_unavailability(row: &rusqlite::Row<'_>) -> SqliteResult<Unavailability> {
    Ok(Unavailability {
        id: row.get(0)?,
        teacher_id: row.get(1)?,
        day: row.get(2)?,
        start_period: row.get(3)?,
        end_period: row.get(4)?,
    })
}
