// ==========================================
// 数据快照 (Catalog) 集成测试
// ==========================================
// 覆盖: 空集/悬挂引用/超额/非法区间的校验、派生索引、稳定顺序
// ==========================================


use school_timetabling::domain::types::RoomKind;
use school_timetabling::engine::{Catalog, ScheduleError};
use test_helpers::*;

#[test]
fn test_load_rejects_empty_store() {
    let (_tmp, store) = create_test_store();

    let err = Catalog::load(&store).unwrap_err();
    match err {
        ScheduleError::Data { entity, .. } => assert_eq!(entity, "class"),
        other => panic!("期望 Data，实际 {other:?}"),
    }
}

#[test]
fn test_load_reports_first_missing_entity_kind() {
    let (_tmp, store) = create_test_store();
    seed_class(&store, "10", "A", 40);

    // 班级有了，下一个缺的是教师
    let err = Catalog::load(&store).unwrap_err();
    match err {
        ScheduleError::Data { entity, .. } => assert_eq!(entity, "teacher"),
        other => panic!("期望 Data，实际 {other:?}"),
    }
}

#[test]
fn test_load_accepts_baseline() {
    let (_tmp, store) = create_test_store();
    let ids = seed_baseline(&store);

    let catalog = Catalog::load(&store).unwrap();
    assert_eq!(catalog.assignments.len(), 1);
    assert_eq!(catalog.classes.len(), 1);
    assert_eq!(catalog.rooms.len(), 1);

    // 派生索引指向正确的安排
    let by_class = &catalog.assignments_by_class[&ids.class_id];
    assert_eq!(by_class.len(), 1);
    assert_eq!(catalog.assignments[by_class[0]].teacher_id, ids.teacher_id);
    assert!(catalog.assignments_by_teacher.contains_key(&ids.teacher_id));
    assert!(catalog.assignments_by_course.contains_key(&ids.course_id));
}

#[test]
fn test_load_rejects_class_overload() {
    let (_tmp, store) = create_test_store();
    let ids = seed_baseline(&store);

    // 追加一门 40 节的课: 班级周课时 42 > class_daily_max * D = 40
    let physics = seed_course(&store, "Physics", 40);
    let t2 = seed_teacher(&store, "T2", "Physics", 40);
    seed_assignment(&store, physics, ids.class_id, t2, 40);

    let err = Catalog::load(&store).unwrap_err();
    match err {
        ScheduleError::Data { entity, reason } => {
            assert!(entity.contains("10/A"), "entity={entity}");
            assert!(reason.contains("42"), "reason={reason}");
        }
        other => panic!("期望 Data，实际 {other:?}"),
    }
}

#[test]
fn test_load_rejects_teacher_overload() {
    let (_tmp, store) = create_test_store();
    let ids = seed_baseline(&store);

    // T1 再背 3 个班的课，每班 10 节: 周课时 32 > teacher_daily_max * D = 30
    for section in ["B", "C", "D"] {
        let class_id = seed_class(&store, "10", section, 40);
        seed_assignment(&store, ids.course_id, class_id, ids.teacher_id, 10);
    }

    let err = Catalog::load(&store).unwrap_err();
    match err {
        ScheduleError::Data { entity, .. } => assert!(entity.contains("T1"), "entity={entity}"),
        other => panic!("期望 Data，实际 {other:?}"),
    }
}

#[test]
fn test_load_rejects_inverted_unavailability() {
    let (_tmp, store) = create_test_store();
    let ids = seed_baseline(&store);
    seed_unavailability(&store, ids.teacher_id, 0, 5, 5);

    let err = Catalog::load(&store).unwrap_err();
    match err {
        ScheduleError::Data { entity, reason } => {
            assert!(entity.contains("T1"), "entity={entity}");
            assert!(reason.contains("倒置") || reason.contains("为空"), "reason={reason}");
        }
        other => panic!("期望 Data，实际 {other:?}"),
    }
}

#[test]
fn test_load_rejects_out_of_range_unavailability() {
    let (_tmp, store) = create_test_store();
    let ids = seed_baseline(&store);
    // H = 8，区间 [6, 9) 越界
    seed_unavailability(&store, ids.teacher_id, 1, 6, 9);

    let err = Catalog::load(&store).unwrap_err();
    assert!(matches!(err, ScheduleError::Data { .. }));
}

#[test]
fn test_load_rejects_out_of_range_day() {
    let (_tmp, store) = create_test_store();
    let ids = seed_baseline(&store);
    // D = 5，天 7 越界
    seed_unavailability(&store, ids.teacher_id, 7, 0, 2);

    let err = Catalog::load(&store).unwrap_err();
    assert!(matches!(err, ScheduleError::Data { .. }));
}

#[test]
fn test_assignments_keep_stable_id_order() {
    let (_tmp, store) = create_test_store();
    let ids = seed_baseline(&store);

    let physics = seed_course(&store, "Physics", 2);
    let chemistry = seed_course(&store, "Chemistry", 2);
    let t2 = seed_teacher(&store, "T2", "Science", 20);
    let a2 = seed_assignment(&store, physics, ids.class_id, t2, 2);
    let a3 = seed_assignment(&store, chemistry, ids.class_id, t2, 2);

    let catalog = Catalog::load(&store).unwrap();
    let id_order: Vec<i64> = catalog.assignments.iter().map(|a| a.id).collect();
    assert_eq!(id_order, vec![ids.assignment_id, a2, a3]);

    // 重复加载顺序一致
    let catalog2 = Catalog::load(&store).unwrap();
    let id_order2: Vec<i64> = catalog2.assignments.iter().map(|a| a.id).collect();
    assert_eq!(id_order, id_order2);
}

#[test]
fn test_rooms_grouped_by_kind() {
    let (_tmp, store) = create_test_store();
    let _ids = seed_baseline(&store);
    let lab = seed_room(&store, "Lab1", RoomKind::Special);

    let catalog = Catalog::load(&store).unwrap();
    assert_eq!(catalog.special_room_ids(), &[lab]);
    assert_eq!(catalog.normal_room_ids().len(), 1);
}

#[test]
fn test_special_course_recognition_paths() {
    let (_tmp, store) = create_test_store();
    let ids = seed_baseline(&store);
    seed_room(&store, "Lab1", RoomKind::Special);

    // 名称关键词路径
    let lab_course = seed_course(&store, "Physics Lab", 2);
    // 显式标记路径（名称不含关键词）
    let flagged = seed_flagged_course(&store, "Kimya", 2);
    let t2 = seed_teacher(&store, "T2", "Science", 20);
    seed_assignment(&store, lab_course, ids.class_id, t2, 2);

    let catalog = Catalog::load(&store).unwrap();
    let by_name = catalog.courses.values().find(|c| c.name == "Physics Lab").unwrap();
    let by_flag = catalog.courses.values().find(|c| c.id == flagged).unwrap();
    let plain = catalog.courses.values().find(|c| c.name == "Math").unwrap();

    assert!(catalog.course_needs_special_room(by_name));
    assert!(catalog.course_needs_special_room(by_flag));
    assert!(!catalog.course_needs_special_room(plain));
}

#[test]
fn test_second_store_handle_yields_equal_catalog() {
    let (tmp, store) = create_test_store();
    let ids = seed_baseline(&store);
    seed_unavailability(&store, ids.teacher_id, 2, 0, 4);

    let catalog = Catalog::load(&store).unwrap();

    // 同一数据库文件的第二个句柄加载出等价快照
    let db_path = tmp.path().to_str().unwrap();
    let store2 = school_timetabling::repository::Store::open(db_path).unwrap();
    let catalog2 = Catalog::load(&store2).unwrap();

    assert_eq!(catalog.assignments, catalog2.assignments);
    assert_eq!(catalog.classes, catalog2.classes);
    assert_eq!(catalog.teachers, catalog2.teachers);
    assert_eq!(catalog.courses, catalog2.courses);
    assert_eq!(catalog.rooms, catalog2.rooms);
    assert_eq!(catalog.unavailabilities, catalog2.unavailabilities);
}

#[test]
fn test_unavailability_index_grouped_by_teacher_day() {
    let (_tmp, store) = create_test_store();
    let ids = seed_baseline(&store);
    seed_unavailability(&store, ids.teacher_id, 0, 0, 2);
    seed_unavailability(&store, ids.teacher_id, 0, 4, 6);
    seed_unavailability(&store, ids.teacher_id, 3, 0, 8);

    let catalog = Catalog::load(&store).unwrap();
    let day0 = &catalog.unavailability_by_teacher_day[&(ids.teacher_id, 0)];
    assert_eq!(day0.len(), 2);
    let day3 = &catalog.unavailability_by_teacher_day[&(ids.teacher_id, 3)];
    assert_eq!(day3, &vec![(0, 8)]);
}
