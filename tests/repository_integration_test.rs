// ==========================================
// 仓储层集成测试
// ==========================================
// 覆盖: CRUD、自然键冲突、级联删除、整表替换原子性、配置默认值、联查投影
// ==========================================


use school_timetabling::domain::school::{Placement, Room, SchoolClass};
use school_timetabling::domain::types::RoomKind;
use school_timetabling::repository::RepositoryError;
use test_helpers::*;

#[test]
fn test_class_crud_roundtrip() {
    let (_tmp, store) = create_test_store();

    let id = seed_class(&store, "10", "A", 40);
    let class = store.classes.find_by_id(id).unwrap().unwrap();
    assert_eq!(class.name, "10");
    assert_eq!(class.section, "A");
    assert_eq!(class.weekly_total_hours, 40);

    // 更新
    store
        .classes
        .upsert(&SchoolClass {
            id,
            name: "10".to_string(),
            section: "A".to_string(),
            weekly_total_hours: 38,
        })
        .unwrap();
    let class = store.classes.find_by_id(id).unwrap().unwrap();
    assert_eq!(class.weekly_total_hours, 38);

    // 删除
    store.classes.delete(id).unwrap();
    assert!(store.classes.find_by_id(id).unwrap().is_none());
}

#[test]
fn test_class_natural_key_conflict() {
    let (_tmp, store) = create_test_store();

    seed_class(&store, "10", "A", 40);
    let err = store
        .classes
        .upsert(&SchoolClass {
            id: 0,
            name: "10".to_string(),
            section: "A".to_string(),
            weekly_total_hours: 30,
        })
        .unwrap_err();

    match err {
        RepositoryError::Conflict { entity, key } => {
            assert_eq!(entity, "class");
            assert_eq!(key, "10/A");
        }
        other => panic!("期望 Conflict，实际 {other:?}"),
    }

    // 同名不同班别不冲突
    seed_class(&store, "10", "B", 40);
}

#[test]
fn test_teacher_and_course_conflicts() {
    let (_tmp, store) = create_test_store();

    seed_teacher(&store, "T1", "Math", 20);
    let err = store
        .teachers
        .upsert(&school_timetabling::domain::school::Teacher {
            id: 0,
            full_name: "T1".to_string(),
            subject: "Physics".to_string(),
            weekly_hours: 10,
        })
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict { .. }));

    seed_course(&store, "Math", 4);
    let err = store
        .courses
        .upsert(&school_timetabling::domain::school::Course {
            id: 0,
            name: "Math".to_string(),
            weekly_hours: 2,
            requires_special_room: false,
        })
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict { .. }));
}

#[test]
fn test_assignment_triple_unique_and_hours_check() {
    let (_tmp, store) = create_test_store();
    let ids = seed_baseline(&store);

    // 同三元组冲突
    let err = store
        .assignments
        .upsert(&school_timetabling::domain::school::Assignment {
            id: 0,
            course_id: ids.course_id,
            class_id: ids.class_id,
            teacher_id: ids.teacher_id,
            weekly_hours: 3,
        })
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict { .. }));

    // weekly_hours 必须为正
    let err = store
        .assignments
        .upsert(&school_timetabling::domain::school::Assignment {
            id: 0,
            course_id: ids.course_id,
            class_id: ids.class_id,
            teacher_id: ids.teacher_id,
            weekly_hours: 0,
        })
        .unwrap_err();
    assert!(matches!(err, RepositoryError::FieldValueError { .. }));
}

#[test]
fn test_delete_class_cascades_to_assignments_and_placements() {
    let (_tmp, store) = create_test_store();
    let ids = seed_baseline(&store);

    store
        .placements
        .replace_all(&[Placement {
            id: 0,
            class_id: ids.class_id,
            teacher_id: ids.teacher_id,
            course_id: ids.course_id,
            room_id: Some(ids.room_id),
            day: 0,
            period: 0,
        }])
        .unwrap();

    store.classes.delete(ids.class_id).unwrap();

    assert!(store
        .assignments
        .find_by_id(ids.assignment_id)
        .unwrap()
        .is_none());
    assert_eq!(store.placements.count().unwrap(), 0);
}

#[test]
fn test_delete_teacher_cascades_to_unavailabilities() {
    let (_tmp, store) = create_test_store();
    let teacher_id = seed_teacher(&store, "T1", "Math", 20);
    seed_unavailability(&store, teacher_id, 0, 0, 4);

    store.teachers.delete(teacher_id).unwrap();
    assert!(store
        .unavailabilities
        .list_by_teacher(teacher_id)
        .unwrap()
        .is_empty());
}

#[test]
fn test_delete_room_nulls_placement_room() {
    let (_tmp, store) = create_test_store();
    let ids = seed_baseline(&store);

    store
        .placements
        .replace_all(&[Placement {
            id: 0,
            class_id: ids.class_id,
            teacher_id: ids.teacher_id,
            course_id: ids.course_id,
            room_id: Some(ids.room_id),
            day: 1,
            period: 2,
        }])
        .unwrap();

    store.rooms.delete(ids.room_id).unwrap();

    let rows = store.placements.list_all().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].room_id, None);
}

#[test]
fn test_delete_assignment_removes_matching_placements() {
    let (_tmp, store) = create_test_store();
    let ids = seed_baseline(&store);

    store
        .placements
        .replace_all(&[
            Placement {
                id: 0,
                class_id: ids.class_id,
                teacher_id: ids.teacher_id,
                course_id: ids.course_id,
                room_id: Some(ids.room_id),
                day: 0,
                period: 0,
            },
            Placement {
                id: 0,
                class_id: ids.class_id,
                teacher_id: ids.teacher_id,
                course_id: ids.course_id,
                room_id: Some(ids.room_id),
                day: 0,
                period: 1,
            },
        ])
        .unwrap();

    store.assignments.delete(ids.assignment_id).unwrap();

    assert_eq!(store.placements.count().unwrap(), 0);
    // 实体本身不受影响
    assert!(store.classes.find_by_id(ids.class_id).unwrap().is_some());
    assert!(store.courses.find_by_id(ids.course_id).unwrap().is_some());
}

#[test]
fn test_replace_all_placements_is_atomic_swap() {
    let (_tmp, store) = create_test_store();
    let ids = seed_baseline(&store);

    let make = |day: i32, period: i32| Placement {
        id: 0,
        class_id: ids.class_id,
        teacher_id: ids.teacher_id,
        course_id: ids.course_id,
        room_id: Some(ids.room_id),
        day,
        period,
    };

    store.placements.replace_all(&[make(0, 0), make(0, 1)]).unwrap();
    assert_eq!(store.placements.count().unwrap(), 2);

    // 再次替换: 旧条目全部消失
    store.placements.replace_all(&[make(3, 5)]).unwrap();
    let rows = store.placements.list_all().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].day, rows[0].period), (3, 5));

    store.placements.clear().unwrap();
    assert_eq!(store.placements.count().unwrap(), 0);
}

#[test]
fn test_settings_defaults_and_override() {
    let (_tmp, store) = create_test_store();

    assert_eq!(
        store.settings.get("teacher_daily_max", "99").unwrap(),
        "6"
    );
    assert_eq!(store.settings.get("day_start", "").unwrap(), "08:30");
    // 不存在的键回落默认值
    assert_eq!(store.settings.get("no_such_key", "fallback").unwrap(), "fallback");

    store.settings.put("teacher_daily_max", "7").unwrap();
    assert_eq!(store.settings.get("teacher_daily_max", "99").unwrap(), "7");
}

#[test]
fn test_enriched_projections() {
    let (_tmp, store) = create_test_store();
    let ids = seed_baseline(&store);

    let rows = store.assignments.list_enriched().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].course_name, "Math");
    assert_eq!(rows[0].class_name, "10");
    assert_eq!(rows[0].class_section, "A");
    assert_eq!(rows[0].teacher_name, "T1");

    let by_class = store.assignments.list_by_class(ids.class_id).unwrap();
    assert_eq!(by_class.len(), 1);
    let by_teacher = store.assignments.list_by_teacher(ids.teacher_id).unwrap();
    assert_eq!(by_teacher.len(), 1);

    seed_unavailability(&store, ids.teacher_id, 2, 0, 4);
    let unav = store.unavailabilities.list_all_enriched().unwrap();
    assert_eq!(unav.len(), 1);
    assert_eq!(unav[0].teacher_name, "T1");

    store
        .placements
        .replace_all(&[Placement {
            id: 0,
            class_id: ids.class_id,
            teacher_id: ids.teacher_id,
            course_id: ids.course_id,
            room_id: Some(ids.room_id),
            day: 0,
            period: 0,
        }])
        .unwrap();
    let schedule = store.placements.list_by_class(ids.class_id).unwrap();
    assert_eq!(schedule.len(), 1);
    assert_eq!(schedule[0].room_name.as_deref(), Some("R1"));
    assert_eq!(schedule[0].teacher_name, "T1");
}

#[test]
fn test_counts_snapshot() {
    let (_tmp, store) = create_test_store();
    let ids = seed_baseline(&store);
    seed_room(&store, "Lab1", RoomKind::Special);
    seed_unavailability(&store, ids.teacher_id, 0, 0, 2);

    let counts = store.counts().unwrap();
    assert_eq!(counts.classes, 1);
    assert_eq!(counts.teachers, 1);
    assert_eq!(counts.courses, 1);
    assert_eq!(counts.rooms, 2);
    assert_eq!(counts.assignments, 1);
    assert_eq!(counts.unavailabilities, 1);
    assert_eq!(counts.placements, 0);
}

#[test]
fn test_room_kind_persisted_as_tag() {
    let (_tmp, store) = create_test_store();

    let id = seed_room(&store, "Lab1", RoomKind::Special);
    let room = store.rooms.find_by_id(id).unwrap().unwrap();
    assert_eq!(room.kind, RoomKind::Special);

    store
        .rooms
        .upsert(&Room {
            id,
            name: "Lab1".to_string(),
            kind: RoomKind::Normal,
        })
        .unwrap();
    let room = store.rooms.find_by_id(id).unwrap().unwrap();
    assert_eq!(room.kind, RoomKind::Normal);
}
