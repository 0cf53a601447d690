// ==========================================
// 学校排课系统 - 班级仓储
// ==========================================
// 红线: Repository 不含业务逻辑，只负责数据访问
// ==========================================

use crate::domain::school::SchoolClass;
use crate::repository::error::{is_unique_violation, RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

/// 班级仓储
///
/// 职责: 管理 classes 表的 CRUD 操作
pub struct ClassRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ClassRepository {
    /// 从共享连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增或更新班级
    ///
    /// id == 0 时插入新记录，否则按 id 更新
    ///
    /// # 返回
    /// - Ok(i64): 记录 id
    /// - Err(Conflict): (name, section) 自然键冲突
    pub fn upsert(&self, class: &SchoolClass) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        let conflict = |_| RepositoryError::Conflict {
            entity: "class".to_string(),
            key: format!("{}/{}", class.name, class.section),
        };

        if class.id == 0 {
            conn.execute(
                "INSERT INTO classes (name, section, weekly_total_hours) VALUES (?1, ?2, ?3)",
                params![class.name, class.section, class.weekly_total_hours],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    conflict(e)
                } else {
                    e.into()
                }
            })?;
            Ok(conn.last_insert_rowid())
        } else {
            let changed = conn
                .execute(
                    r#"
                    UPDATE classes
                    SET name = ?1, section = ?2, weekly_total_hours = ?3,
                        updated_at = CURRENT_TIMESTAMP
                    WHERE id = ?4
                    "#,
                    params![class.name, class.section, class.weekly_total_hours, class.id],
                )
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        conflict(e)
                    } else {
                        e.into()
                    }
                })?;

            if changed == 0 {
                return Err(RepositoryError::NotFound {
                    entity: "class".to_string(),
                    id: class.id,
                });
            }
            Ok(class.id)
        }
    }

    /// 按 id 查询班级
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<SchoolClass>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            "SELECT id, name, section, weekly_total_hours FROM classes WHERE id = ?1",
            params![id],
            map_class,
        );

        match result {
            Ok(class) => Ok(Some(class)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询全部班级（按名称、班别排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<SchoolClass>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, section, weekly_total_hours FROM classes ORDER BY name, section",
        )?;
        let classes = stmt
            .query_map([], map_class)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(classes)
    }

    /// 删除班级
    ///
    /// 级联删除该班级的授课安排与课表条目（SQL 外键）
    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM classes WHERE id = ?1", params![id])?;
        Ok(())
    }
}

fn map_class(row: &rusqlite::Row<'_>) -> SqliteResult<SchoolClass> {
    Ok(SchoolClass {
        id: row.get(0)?,
        name: row.get(1)?,
        section: row.get(2)?,
        weekly_total_hours: row.get(3)?,
    })
}
