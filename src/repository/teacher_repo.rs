// ==========================================
// 学校排课系统 - 教师仓储
// ==========================================
// 红线: Repository 不含业务逻辑，只负责数据访问
// ==========================================

use crate::domain::school::Teacher;
use crate::repository::error::{is_unique_violation, RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

/// 教师仓储
///
/// 职责: 管理 teachers 表的 CRUD 操作
pub struct TeacherRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TeacherRepository {
    /// 从共享连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增或更新教师
    ///
    /// # 返回
    /// - Ok(i64): 记录 id
    /// - Err(Conflict): full_name 自然键冲突
    pub fn upsert(&self, teacher: &Teacher) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        let conflict = |_| RepositoryError::Conflict {
            entity: "teacher".to_string(),
            key: teacher.full_name.clone(),
        };

        if teacher.id == 0 {
            conn.execute(
                "INSERT INTO teachers (full_name, subject, weekly_hours) VALUES (?1, ?2, ?3)",
                params![teacher.full_name, teacher.subject, teacher.weekly_hours],
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
                    UPDATE teachers
                    SET full_name = ?1, subject = ?2, weekly_hours = ?3,
                        updated_at = CURRENT_TIMESTAMP
                    WHERE id = ?4
                    "#,
                    params![
                        teacher.full_name,
                        teacher.subject,
                        teacher.weekly_hours,
                        teacher.id
                    ],
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
                    entity: "teacher".to_string(),
                    id: teacher.id,
                });
            }
            Ok(teacher.id)
        }
    }

    /// 按 id 查询教师
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Teacher>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            "SELECT id, full_name, subject, weekly_hours FROM teachers WHERE id = ?1",
            params![id],
            map_teacher,
        );

        match result {
            Ok(teacher) => Ok(Some(teacher)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询全部教师（按姓名排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Teacher>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, full_name, subject, weekly_hours FROM teachers ORDER BY full_name",
        )?;
        let teachers = stmt
            .query_map([], map_teacher)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(teachers)
    }

    /// 删除教师
    ///
    /// 级联删除其授课安排、不可用时段与课表条目（SQL 外键）
    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM teachers WHERE id = ?1", params![id])?;
        Ok(())
    }
}

fn map_teacher(row: &rusqlite::Row<'_>) -> SqliteResult<Teacher> {
    Ok(Teacher {
        id: row.get(0)?,
        full_name: row.get(1)?,
        subject: row.get(2)?,
        weekly_hours: row.get(3)?,
    })
}
