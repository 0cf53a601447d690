// ==========================================
// 学校排课系统 - 数据库建表与默认配置
// ==========================================
// 职责: 首次打开时建表、填充默认配置；整个过程幂等
// 说明: 级联语义在 SQL 外键中声明，依赖连接级 PRAGMA foreign_keys = ON
// ==========================================

use rusqlite::Connection;

/// 默认配置项: (键, 值, 说明)
///
/// 已存在的键不会被覆盖（INSERT OR IGNORE）
pub const DEFAULT_SETTINGS: &[(&str, &str, &str)] = &[
    ("lesson_duration_minutes", "40", "单节课时长（分钟，仅展示用）"),
    ("break_duration_minutes", "10", "课间休息时长（分钟，仅展示用）"),
    ("day_start", "08:30", "每日第一节开始时间（仅展示用）"),
    ("day_end", "16:00", "每日结束时间（仅展示用）"),
    ("lunch_start", "12:00", "午休开始时间（仅展示用）"),
    ("lunch_end", "13:00", "午休结束时间（仅展示用）"),
    ("days_per_week", "5", "每周上课天数"),
    ("max_daily_periods", "8", "每日最大节次数"),
    ("max_weekly_periods", "40", "每周最大节次数（合理性上界）"),
    ("teacher_daily_max", "6", "教师每日最多课时"),
    ("teacher_daily_min", "2", "教师每日最少课时（仅当日有课时生效）"),
    ("class_daily_max", "8", "班级每日最多课时"),
    ("class_daily_min", "4", "班级每日最少课时"),
    ("same_course_daily_max", "2", "同一课程同一天最多节次"),
    ("enforce_special_rooms", "1", "专用课程必须进专用教室"),
    ("minimize_room_changes", "1", "最小化班级当日换教室次数"),
    ("prefer_block_consecutive", "1", "多课时课程连堂排列"),
    ("block_max", "2", "连堂上限（参考值，暂无约束消费）"),
    ("teacher_idle_preference", "minimize", "教师空闲时段偏好: minimize/maximize"),
    ("time_budget_seconds", "300", "求解时间上限（秒）"),
    ("special_room_tokens", "lab,laboratuvar,workshop", "专用课程名称识别关键词（逗号分隔）"),
];

/// 建表并填充默认配置（幂等）
pub fn bootstrap(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS classes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            section TEXT NOT NULL,
            weekly_total_hours INTEGER NOT NULL,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(name, section)
        );

        CREATE TABLE IF NOT EXISTS teachers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            full_name TEXT NOT NULL,
            subject TEXT NOT NULL,
            weekly_hours INTEGER NOT NULL,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(full_name)
        );

        CREATE TABLE IF NOT EXISTS courses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            weekly_hours INTEGER NOT NULL,
            requires_special_room INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(name)
        );

        CREATE TABLE IF NOT EXISTS rooms (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            kind TEXT NOT NULL DEFAULT 'normal',
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(name)
        );

        CREATE TABLE IF NOT EXISTS assignments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            course_id INTEGER NOT NULL,
            class_id INTEGER NOT NULL,
            teacher_id INTEGER NOT NULL,
            weekly_hours INTEGER NOT NULL,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE CASCADE,
            FOREIGN KEY (class_id) REFERENCES classes(id) ON DELETE CASCADE,
            FOREIGN KEY (teacher_id) REFERENCES teachers(id) ON DELETE CASCADE,
            UNIQUE(course_id, class_id, teacher_id)
        );

        CREATE TABLE IF NOT EXISTS unavailabilities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            teacher_id INTEGER NOT NULL,
            day INTEGER NOT NULL,
            start_period INTEGER NOT NULL,
            end_period INTEGER NOT NULL,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (teacher_id) REFERENCES teachers(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS placements (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            class_id INTEGER NOT NULL,
            teacher_id INTEGER NOT NULL,
            course_id INTEGER NOT NULL,
            room_id INTEGER,
            day INTEGER NOT NULL,
            period INTEGER NOT NULL,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (class_id) REFERENCES classes(id) ON DELETE CASCADE,
            FOREIGN KEY (teacher_id) REFERENCES teachers(id) ON DELETE CASCADE,
            FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE CASCADE,
            FOREIGN KEY (room_id) REFERENCES rooms(id) ON DELETE SET NULL
        );

        CREATE TABLE IF NOT EXISTS settings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            description TEXT,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(key)
        );
        "#,
    )?;

    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO settings (key, value, description) VALUES (?1, ?2, ?3)",
    )?;
    for (key, value, description) in DEFAULT_SETTINGS {
        stmt.execute(rusqlite::params![key, value, description])?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory_connection;

    #[test]
    fn test_bootstrap_idempotent() {
        let conn = open_in_memory_connection().unwrap();
        bootstrap(&conn).unwrap();
        bootstrap(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM settings", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, DEFAULT_SETTINGS.len() as i64);
    }

    #[test]
    fn test_bootstrap_keeps_existing_setting_value() {
        let conn = open_in_memory_connection().unwrap();
        bootstrap(&conn).unwrap();

        conn.execute(
            "UPDATE settings SET value = '600' WHERE key = 'time_budget_seconds'",
            [],
        )
        .unwrap();
        bootstrap(&conn).unwrap();

        let value: String = conn
            .query_row(
                "SELECT value FROM settings WHERE key = 'time_budget_seconds'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(value, "600");
    }
}
