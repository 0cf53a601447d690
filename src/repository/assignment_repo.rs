// ==========================================
// 学校排课系统 - 授课安排仓储
// ==========================================
// 红线: Repository 不含业务逻辑，只负责数据访问
// 说明: 删除授课安排时需要同步清掉该三元组已落位的课时，
//       课表条目不直接引用安排 id，级联在这里用事务补齐
// ==========================================

use crate::domain::school::{Assignment, AssignmentRow};
use crate::repository::error::{is_unique_violation, RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

/// 授课安排仓储
///
/// 职责: 管理 assignments 表的 CRUD 与联查投影
pub struct AssignmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AssignmentRepository {
    /// 从共享连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增或更新授课安排
    ///
    /// # 返回
    /// - Ok(i64): 记录 id
    /// - Err(Conflict): (course_id, class_id, teacher_id) 自然键冲突
    /// - Err(FieldValueError): weekly_hours <= 0
    /// - Err(ForeignKeyViolation): 引用的实体不存在
    pub fn upsert(&self, assignment: &Assignment) -> RepositoryResult<i64> {
        if assignment.weekly_hours <= 0 {
            return Err(RepositoryError::FieldValueError {
                field: "weekly_hours".to_string(),
                message: format!("必须大于 0，实际为 {}", assignment.weekly_hours),
            });
        }

        let conn = self.get_conn()?;

        let conflict = |_| RepositoryError::Conflict {
            entity: "assignment".to_string(),
            key: format!(
                "course={} class={} teacher={}",
                assignment.course_id, assignment.class_id, assignment.teacher_id
            ),
        };

        if assignment.id == 0 {
            conn.execute(
                r#"
                INSERT INTO assignments (course_id, class_id, teacher_id, weekly_hours)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![
                    assignment.course_id,
                    assignment.class_id,
                    assignment.teacher_id,
                    assignment.weekly_hours
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
                    UPDATE assignments
                    SET course_id = ?1, class_id = ?2, teacher_id = ?3, weekly_hours = ?4,
                        updated_at = CURRENT_TIMESTAMP
                    WHERE id = ?5
                    "#,
                    params![
                        assignment.course_id,
                        assignment.class_id,
                        assignment.teacher_id,
                        assignment.weekly_hours,
                        assignment.id
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
                    entity: "assignment".to_string(),
                    id: assignment.id,
                });
            }
            Ok(assignment.id)
        }
    }

    /// 按 id 查询授课安排
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Assignment>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            r#"
            SELECT id, course_id, class_id, teacher_id, weekly_hours
            FROM assignments WHERE id = ?1
            "#,
            params![id],
            map_assignment,
        );

        match result {
            Ok(assignment) => Ok(Some(assignment)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询全部授课安排（按 id 排序，供求解器使用的稳定顺序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Assignment>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, course_id, class_id, teacher_id, weekly_hours
            FROM assignments ORDER BY id
            "#,
        )?;
        let assignments = stmt
            .query_map([], map_assignment)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(assignments)
    }

    /// 查询全部授课安排的联查投影（带各实体名称）
    pub fn list_enriched(&self) -> RepositoryResult<Vec<AssignmentRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT a.id, a.course_id, a.class_id, a.teacher_id, a.weekly_hours,
                   c.name, s.name, s.section, t.full_name
            FROM assignments a
            JOIN courses c ON a.course_id = c.id
            JOIN classes s ON a.class_id = s.id
            JOIN teachers t ON a.teacher_id = t.id
            ORDER BY s.name, s.section, c.name
            "#,
        )?;
        let rows = stmt
            .query_map([], map_assignment_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 查询某班级的授课安排投影
    pub fn list_by_class(&self, class_id: i64) -> RepositoryResult<Vec<AssignmentRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT a.id, a.course_id, a.class_id, a.teacher_id, a.weekly_hours,
                   c.name, s.name, s.section, t.full_name
            FROM assignments a
            JOIN courses c ON a.course_id = c.id
            JOIN classes s ON a.class_id = s.id
            JOIN teachers t ON a.teacher_id = t.id
            WHERE a.class_id = ?1
            ORDER BY c.name
            "#,
        )?;
        let rows = stmt
            .query_map(params![class_id], map_assignment_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 查询某教师的授课安排投影
    pub fn list_by_teacher(&self, teacher_id: i64) -> RepositoryResult<Vec<AssignmentRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT a.id, a.course_id, a.class_id, a.teacher_id, a.weekly_hours,
                   c.name, s.name, s.section, t.full_name
            FROM assignments a
            JOIN courses c ON a.course_id = c.id
            JOIN classes s ON a.class_id = s.id
            JOIN teachers t ON a.teacher_id = t.id
            WHERE a.teacher_id = ?1
            ORDER BY s.name, s.section, c.name
            "#,
        )?;
        let rows = stmt
            .query_map(params![teacher_id], map_assignment_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 删除授课安排，并清掉该 (课程, 班级, 教师) 三元组已落位的课时
    ///
    /// 两步在同一事务内完成
    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            r#"
            DELETE FROM placements
            WHERE (class_id, teacher_id, course_id) IN (
                SELECT class_id, teacher_id, course_id FROM assignments WHERE id = ?1
            )
            "#,
            params![id],
        )?;
        tx.execute("DELETE FROM assignments WHERE id = ?1", params![id])?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }
}

fn map_assignment(row: &rusqlite::Row<'_>) -> SqliteResult<Assignment> {
    Ok(Assignment {
        id: row.get(0)?,
        course_id: row.get(1)?,
        class_id: row.get(2)?,
        teacher_id: row.get(3)?,
        weekly_hours: row.get(4)?,
    })
}

fn map_assignment_row(row: &rusqlite::Row<'_>) -> SqliteResult<AssignmentRow> {
    Ok(AssignmentRow {
        id: row.get(0)?,
        course_id: row.get(1)?,
        class_id: row.get(2)?,
        teacher_id: row.get(3)?,
        weekly_hours: row.get(4)?,
        course_name: row.get(5)?,
        class_name: row.get(6)?,
        class_section: row.get(7)?,
        teacher_name: row.get(8)?,
    })
}
