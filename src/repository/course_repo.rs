// ==========================================
// 学校排课系统 - 课程仓储
// ==========================================
// 红线: Repository 不含业务逻辑，只负责数据访问
// ==========================================

use crate::domain::school::Course;
use crate::repository::error::{is_unique_violation, RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

/// 课程仓储
///
/// 职责: 管理 courses 表的 CRUD 操作
pub struct CourseRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CourseRepository {
    /// 从共享连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增或更新课程
    ///
    /// # 返回
    /// - Ok(i64): 记录 id
    /// - Err(Conflict): name 自然键冲突
    pub fn upsert(&self, course: &Course) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        let conflict = |_| RepositoryError::Conflict {
            entity: "course".to_string(),
            key: course.name.clone(),
        };

        if course.id == 0 {
            conn.execute(
                r#"
                INSERT INTO courses (name, weekly_hours, requires_special_room)
                VALUES (?1, ?2, ?3)
                "#,
                params![
                    course.name,
                    course.weekly_hours,
                    course.requires_special_room as i32
                ],
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
                    UPDATE courses
                    SET name = ?1, weekly_hours = ?2, requires_special_room = ?3,
                        updated_at = CURRENT_TIMESTAMP
                    WHERE id = ?4
                    "#,
                    params![
                        course.name,
                        course.weekly_hours,
                        course.requires_special_room as i32,
                        course.id
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
                    entity: "course".to_string(),
                    id: course.id,
                });
            }
            Ok(course.id)
        }
    }

    /// 按 id 查询课程
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Course>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            "SELECT id, name, weekly_hours, requires_special_room FROM courses WHERE id = ?1",
            params![id],
            map_course,
        );

        match result {
            Ok(course) => Ok(Some(course)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询全部课程（按名称排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Course>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, weekly_hours, requires_special_room FROM courses ORDER BY name",
        )?;
        let courses = stmt
            .query_map([], map_course)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(courses)
    }

    /// 删除课程
    ///
    /// 级联删除引用该课程的授课安排与课表条目（SQL 外键）
    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM courses WHERE id = ?1", params![id])?;
        Ok(())
    }
}

fn map_course(row: &rusqlite::Row<'_>) -> SqliteResult<Course> {
    Ok(Course {
        id: row.get(0)?,
        name: row.get(1)?,
        weekly_hours: row.get(2)?,
        requires_special_room: row.get::<_, i32>(3)? != 0,
    })
}
