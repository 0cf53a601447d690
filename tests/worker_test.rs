// ==========================================
// 后台求解工作线程集成测试
// ==========================================
// 覆盖: 后台求解 + 进度通道、进度单调性、协作式取消
// ==========================================


use school_timetabling::engine::{ScheduleError, ScheduleSolver, SolveWorker};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use test_helpers::*;

#[test]
fn test_worker_solves_in_background_and_streams_progress() {
    let (tmp, store) = create_test_store();
    let _ids = seed_baseline(&store);
    store.settings.put("time_budget_seconds", "30").unwrap();

    let db_path = tmp.path().to_str().unwrap().to_string();
    let (worker, rx) = SolveWorker::spawn(db_path, None);

    let report = worker.join().unwrap();
    assert_eq!(report.placements, 2);

    // 进度单调不减，最后一条为 100
    let updates: Vec<_> = rx.try_iter().collect();
    assert!(!updates.is_empty());
    for pair in updates.windows(2) {
        assert!(
            pair[0].percent <= pair[1].percent,
            "进度回退: {} -> {}",
            pair[0].percent,
            pair[1].percent
        );
    }
    assert_eq!(updates.last().unwrap().percent, 100);

    // 工作线程写入的课表对原句柄可见
    assert_eq!(store.placements.count().unwrap(), 2);
    verify_schedule(&store);
}

#[test]
fn test_preset_cancel_flag_interrupts_before_any_write() {
    let (_tmp, store) = create_test_store();
    let _ids = seed_baseline(&store);

    let cancel = Arc::new(AtomicBool::new(true));
    let err = ScheduleSolver::new(&store)
        .with_cancel_flag(cancel)
        .run()
        .unwrap_err();

    assert!(matches!(err, ScheduleError::Interrupted));
    assert_eq!(store.placements.count().unwrap(), 0);
}

#[test]
fn test_worker_cancel_request_flips_flag() {
    let (tmp, store) = create_test_store();
    let _ids = seed_baseline(&store);
    store.settings.put("time_budget_seconds", "30").unwrap();

    let db_path = tmp.path().to_str().unwrap().to_string();
    let (worker, _rx) = SolveWorker::spawn(db_path, None);
    worker.request_cancel();

    // 模型极小: 取消可能在求解完成后才被观察到。
    // 两种结局都合法——要么排完（课表完整），要么在阶段边界被打断（课表未动）
    match worker.join() {
        Ok(report) => assert_eq!(report.placements, 2),
        Err(ScheduleError::Interrupted) => {
            assert_eq!(store.placements.count().unwrap(), 0);
        }
        Err(other) => panic!("意外错误: {other:?}"),
    }
}
