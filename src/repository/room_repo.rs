// ==========================================
// 学校排课系统 - 教室仓储
// ==========================================
// 红线: Repository 不含业务逻辑，只负责数据访问
// ==========================================

use crate::domain::school::Room;
use crate::domain::types::RoomKind;
use crate::repository::error::{is_unique_violation, RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

/// 教室仓储
///
/// 职责: 管理 rooms 表的 CRUD 操作
pub struct RoomRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RoomRepository {
    /// 从共享连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增或更新教室
    ///
    /// # 返回
    /// - Ok(i64): 记录 id
    /// - Err(Conflict): name 自然键冲突
    pub fn upsert(&self, room: &Room) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        let conflict = |_| RepositoryError::Conflict {
            entity: "room".to_string(),
            key: room.name.clone(),
        };

        if room.id == 0 {
            conn.execute(
                "INSERT INTO rooms (name, kind) VALUES (?1, ?2)",
                params![room.name, room.kind.to_db_str()],
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
                    UPDATE rooms
                    SET name = ?1, kind = ?2, updated_at = CURRENT_TIMESTAMP
                    WHERE id = ?3
                    "#,
                    params![room.name, room.kind.to_db_str(), room.id],
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
                    entity: "room".to_string(),
                    id: room.id,
                });
            }
            Ok(room.id)
        }
    }

    /// 按 id 查询教室
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Room>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            "SELECT id, name, kind FROM rooms WHERE id = ?1",
            params![id],
            map_room,
        );

        match result {
            Ok(room) => Ok(Some(room)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询全部教室（按名称排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Room>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT id, name, kind FROM rooms ORDER BY name")?;
        let rooms = stmt
            .query_map([], map_room)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rooms)
    }

    /// 删除教室
    ///
    /// 引用该教室的课表条目 room_id 置空（SQL 外键 SET NULL），
    /// 语义有效性由编辑器负责报告
    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM rooms WHERE id = ?1", params![id])?;
        Ok(())
    }
}

fn map_room(row: &rusqlite::Row<'_>) -> SqliteResult<Room> {
    Ok(Room {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: RoomKind::from_db_str(&row.get::<_, String>(2)?),
    })
}
