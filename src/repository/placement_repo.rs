// ==========================================
// 学校排课系统 - 课表条目仓储
// ==========================================
// 红线: Repository 不含业务逻辑，只负责数据访问
// 说明: 课表条目只由求解器批量替换或编辑器单条修改，
//       CRUD 层不提供逐条插入入口
// ==========================================

use crate::domain::school::{Placement, PlacementRow};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

const SELECT_ENRICHED: &str = r#"
    SELECT p.id, p.class_id, p.teacher_id, p.course_id, p.room_id, p.day, p.period,
           c.name, s.name, s.section, t.full_name, r.name
    FROM placements p
    JOIN courses c ON p.course_id = c.id
    JOIN classes s ON p.class_id = s.id
    JOIN teachers t ON p.teacher_id = t.id
    LEFT JOIN rooms r ON p.room_id = r.id
"#;

/// 课表条目仓储
///
/// 职责: 管理 placements 表的批量替换、单条修改与联查投影
pub struct PlacementRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PlacementRepository {
    /// 从共享连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 原子替换整张课表
    ///
    /// 在同一事务内清空旧课表并写入全部新条目；入参的 id 字段被忽略
    ///
    /// # 返回
    /// - Ok(usize): 写入的条目数
    pub fn replace_all(&self, rows: &[Placement]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute("DELETE FROM placements", [])?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO placements (class_id, teacher_id, course_id, room_id, day, period)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )?;
            for row in rows {
                stmt.execute(params![
                    row.class_id,
                    row.teacher_id,
                    row.course_id,
                    row.room_id,
                    row.day,
                    row.period
                ])?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(rows.len())
    }

    /// 清空课表
    pub fn clear(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM placements", [])?;
        Ok(())
    }

    /// 按 id 查询课表条目
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Placement>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            r#"
            SELECT id, class_id, teacher_id, course_id, room_id, day, period
            FROM placements WHERE id = ?1
            "#,
            params![id],
            map_placement,
        );

        match result {
            Ok(placement) => Ok(Some(placement)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询占用某 (天, 节次, 教室) 槽位的条目（编辑器换位前的占位检查）
    pub fn find_at_slot(
        &self,
        day: i32,
        period: i32,
        room_id: i64,
    ) -> RepositoryResult<Option<PlacementRow>> {
        let conn = self.get_conn()?;
        let sql = format!("{SELECT_ENRICHED} WHERE p.day = ?1 AND p.period = ?2 AND p.room_id = ?3");
        let result = conn.query_row(&sql, params![day, period, room_id], map_placement_row);

        match result {
            Ok(row) => Ok(Some(row)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 修改单条条目的落位（编辑器移动）
    pub fn relocate(
        &self,
        id: i64,
        day: i32,
        period: i32,
        room_id: i64,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            r#"
            UPDATE placements
            SET day = ?1, period = ?2, room_id = ?3, updated_at = CURRENT_TIMESTAMP
            WHERE id = ?4
            "#,
            params![day, period, room_id, id],
        )?;

        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity: "placement".to_string(),
                id,
            });
        }
        Ok(())
    }

    /// 删除单条条目
    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let changed = conn.execute("DELETE FROM placements WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity: "placement".to_string(),
                id,
            });
        }
        Ok(())
    }

    /// 统计同一教师在 (天, 节次) 的其他条目数（编辑器冲突标记）
    pub fn count_teacher_at(
        &self,
        teacher_id: i64,
        day: i32,
        period: i32,
        exclude_id: i64,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            r#"
            SELECT COUNT(*) FROM placements
            WHERE teacher_id = ?1 AND day = ?2 AND period = ?3 AND id != ?4
            "#,
            params![teacher_id, day, period, exclude_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 统计同一班级在 (天, 节次) 的其他条目数（编辑器冲突标记）
    pub fn count_class_at(
        &self,
        class_id: i64,
        day: i32,
        period: i32,
        exclude_id: i64,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            r#"
            SELECT COUNT(*) FROM placements
            WHERE class_id = ?1 AND day = ?2 AND period = ?3 AND id != ?4
            "#,
            params![class_id, day, period, exclude_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 统计同一教室在 (天, 节次) 的其他条目数（编辑器冲突标记）
    pub fn count_room_at(
        &self,
        room_id: i64,
        day: i32,
        period: i32,
        exclude_id: i64,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            r#"
            SELECT COUNT(*) FROM placements
            WHERE room_id = ?1 AND day = ?2 AND period = ?3 AND id != ?4
            "#,
            params![room_id, day, period, exclude_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 查询全部条目（按班级、天、节次排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Placement>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, class_id, teacher_id, course_id, room_id, day, period
            FROM placements
            ORDER BY class_id, day, period
            "#,
        )?;
        let placements = stmt
            .query_map([], map_placement)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(placements)
    }

    /// 查询全部条目的联查投影
    pub fn list_all_enriched(&self) -> RepositoryResult<Vec<PlacementRow>> {
        let conn = self.get_conn()?;
        let sql = format!("{SELECT_ENRICHED} ORDER BY s.name, s.section, p.day, p.period");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], map_placement_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 查询某班级的课表投影
    pub fn list_by_class(&self, class_id: i64) -> RepositoryResult<Vec<PlacementRow>> {
        let conn = self.get_conn()?;
        let sql = format!("{SELECT_ENRICHED} WHERE p.class_id = ?1 ORDER BY p.day, p.period");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![class_id], map_placement_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 查询某教师的课表投影
    pub fn list_by_teacher(&self, teacher_id: i64) -> RepositoryResult<Vec<PlacementRow>> {
        let conn = self.get_conn()?;
        let sql = format!("{SELECT_ENRICHED} WHERE p.teacher_id = ?1 ORDER BY p.day, p.period");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![teacher_id], map_placement_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 查询某教室的课表投影
    pub fn list_by_room(&self, room_id: i64) -> RepositoryResult<Vec<PlacementRow>> {
        let conn = self.get_conn()?;
        let sql = format!("{SELECT_ENRICHED} WHERE p.room_id = ?1 ORDER BY p.day, p.period");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![room_id], map_placement_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 条目总数
    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM placements", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn map_placement(row: &rusqlite::Row<'_>) -> SqliteResult<Placement> {
    Ok(Placement {
        id: row.get(0)?,
        class_id: row.get(1)?,
        teacher_id: row.get(2)?,
        course_id: row.get(3)?,
        room_id: row.get(4)?,
        day: row.get(5)?,
        period: row.get(6)?,
    })
}

fn map_placement_row(row: &rusqlite::Row<'_>) -> SqliteResult<PlacementRow> {
    Ok(PlacementRow {
        id: row.get(0)?,
        class_id: row.get(1)?,
        teacher_id: row.get(2)?,
        course_id: row.get(3)?,
        room_id: row.get(4)?,
        day: row.get(5)?,
        period: row.get(6)?,
        course_name: row.get(7)?,
        class_name: row.get(8)?,
        class_section: row.get(9)?,
        teacher_name: row.get(10)?,
        room_name: row.get(11)?,
    })
}
