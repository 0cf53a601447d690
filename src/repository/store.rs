// ==========================================
// 学校排课系统 - 仓储聚合 (Store)
// ==========================================
// 职责: 打开/建库、聚合各实体仓储，作为全部持久状态的唯一入口
// 约束: 单写者——所有变更经由同一个连接句柄，同步落盘后返回
// ==========================================

use crate::db::{configure_sqlite_connection, open_in_memory_connection, open_sqlite_connection};
use crate::repository::{
    schema, AssignmentRepository, ClassRepository, CourseRepository, PlacementRepository,
    RepositoryError, RepositoryResult, RoomRepository, SettingsRepository, TeacherRepository,
    UnavailabilityRepository,
};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// 实体数量统计（求解前的数据面板）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityCounts {
    pub classes: i64,
    pub teachers: i64,
    pub courses: i64,
    pub rooms: i64,
    pub assignments: i64,
    pub unavailabilities: i64,
    pub placements: i64,
}

/// 仓储聚合
///
/// 打开数据库时完成建表与默认配置填充（幂等），
/// 之后各实体仓储共享同一个连接
pub struct Store {
    conn: Arc<Mutex<Connection>>,
    pub classes: ClassRepository,
    pub teachers: TeacherRepository,
    pub courses: CourseRepository,
    pub rooms: RoomRepository,
    pub assignments: AssignmentRepository,
    pub unavailabilities: UnavailabilityRepository,
    pub placements: PlacementRepository,
    pub settings: SettingsRepository,
}

impl Store {
    /// 打开数据库文件并初始化
    pub fn open(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Self::from_raw_connection(conn)
    }

    /// 打开内存数据库（测试用）
    pub fn open_in_memory() -> RepositoryResult<Self> {
        let conn = open_in_memory_connection()
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Self::from_raw_connection(conn)
    }

    /// 从已有连接创建 Store
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)
                .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
            schema::bootstrap(&guard)?;
        }
        Ok(Self::assemble(conn))
    }

    fn from_raw_connection(conn: Connection) -> RepositoryResult<Self> {
        schema::bootstrap(&conn)?;
        Ok(Self::assemble(Arc::new(Mutex::new(conn))))
    }

    fn assemble(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            classes: ClassRepository::from_connection(conn.clone()),
            teachers: TeacherRepository::from_connection(conn.clone()),
            courses: CourseRepository::from_connection(conn.clone()),
            rooms: RoomRepository::from_connection(conn.clone()),
            assignments: AssignmentRepository::from_connection(conn.clone()),
            unavailabilities: UnavailabilityRepository::from_connection(conn.clone()),
            placements: PlacementRepository::from_connection(conn.clone()),
            settings: SettingsRepository::from_connection(conn.clone()),
            conn,
        }
    }

    /// 实体数量统计
    pub fn counts(&self) -> RepositoryResult<EntityCounts> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let count = |table: &str| -> RepositoryResult<i64> {
            let sql = format!("SELECT COUNT(*) FROM {table}");
            conn.query_row(&sql, [], |row| row.get(0)).map_err(Into::into)
        };

        Ok(EntityCounts {
            classes: count("classes")?,
            teachers: count("teachers")?,
            courses: count("courses")?,
            rooms: count("rooms")?,
            assignments: count("assignments")?,
            unavailabilities: count("unavailabilities")?,
            placements: count("placements")?,
        })
    }
}
