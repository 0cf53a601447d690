// ==========================================
// 学校排课系统 - CLI 入口
// ==========================================
// 命令:
//   solve [--db PATH] [--time-budget N]   对当前数据执行排课
//   clear-schedule [--db PATH]            清空课表
// 退出码: 0 成功 / 1 数据错误 / 2 无可行解 / 64 用法错误
// ==========================================

use school_timetabling::engine::{ScheduleError, ScheduleSolver};
use school_timetabling::repository::Store;
use school_timetabling::{logging, APP_NAME, VERSION};

const DEFAULT_DB_PATH: &str = "school_timetable.db";

const EXIT_OK: i32 = 0;
const EXIT_DATA_ERROR: i32 = 1;
const EXIT_INFEASIBLE: i32 = 2;
const EXIT_USAGE: i32 = 64;

fn main() {
    logging::init();

    tracing::info!("{} v{}", APP_NAME, VERSION);

    let args: Vec<String> = std::env::args().skip(1).collect();
    std::process::exit(run(&args));
}

fn run(args: &[String]) -> i32 {
    let Some(command) = args.first() else {
        return usage("缺少命令");
    };

    match command.as_str() {
        "solve" => match parse_solve_flags(&args[1..]) {
            Ok((db_path, time_budget)) => cmd_solve(&db_path, time_budget),
            Err(msg) => usage(&msg),
        },
        "clear-schedule" => match parse_db_flag(&args[1..]) {
            Ok(db_path) => cmd_clear(&db_path),
            Err(msg) => usage(&msg),
        },
        other => usage(&format!("未知命令: {other}")),
    }
}

fn cmd_solve(db_path: &str, time_budget: Option<u64>) -> i32 {
    let store = match Store::open(db_path) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("无法打开数据库 {db_path}: {e}");
            return EXIT_DATA_ERROR;
        }
    };

    let solver = ScheduleSolver::new(&store).with_time_budget(time_budget);
    match solver.run() {
        Ok(report) => {
            println!(
                "排课完成: {} 条课时, 目标值 {:.0}, 耗时 {:.2}s",
                report.placements, report.objective, report.wall_secs
            );
            EXIT_OK
        }
        Err(ScheduleError::Infeasible { reason }) => {
            eprintln!("无可行解: {reason}");
            EXIT_INFEASIBLE
        }
        Err(e) => {
            eprintln!("排课失败: {e}");
            EXIT_DATA_ERROR
        }
    }
}

fn cmd_clear(db_path: &str) -> i32 {
    let store = match Store::open(db_path) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("无法打开数据库 {db_path}: {e}");
            return EXIT_DATA_ERROR;
        }
    };

    match store.placements.clear() {
        Ok(()) => {
            println!("课表已清空");
            EXIT_OK
        }
        Err(e) => {
            eprintln!("清空课表失败: {e}");
            EXIT_DATA_ERROR
        }
    }
}

fn parse_db_flag(flags: &[String]) -> Result<String, String> {
    let mut db_path = DEFAULT_DB_PATH.to_string();
    let mut iter = flags.iter();
    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "--db" => {
                db_path = iter
                    .next()
                    .ok_or_else(|| "--db 缺少参数".to_string())?
                    .clone();
            }
            other => return Err(format!("未知选项: {other}")),
        }
    }
    Ok(db_path)
}

fn parse_solve_flags(flags: &[String]) -> Result<(String, Option<u64>), String> {
    let mut db_path = DEFAULT_DB_PATH.to_string();
    let mut time_budget = None;
    let mut iter = flags.iter();
    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "--db" => {
                db_path = iter
                    .next()
                    .ok_or_else(|| "--db 缺少参数".to_string())?
                    .clone();
            }
            "--time-budget" => {
                let raw = iter
                    .next()
                    .ok_or_else(|| "--time-budget 缺少参数".to_string())?;
                let seconds: u64 = raw
                    .parse()
                    .map_err(|_| format!("--time-budget 不是合法秒数: {raw}"))?;
                if seconds == 0 {
                    return Err("--time-budget 必须大于 0".to_string());
                }
                time_budget = Some(seconds);
            }
            other => return Err(format!("未知选项: {other}")),
        }
    }
    Ok((db_path, time_budget))
}

fn usage(reason: &str) -> i32 {
    eprintln!("{reason}");
    eprintln!();
    eprintln!("用法:");
    eprintln!("  school-timetabling solve [--db PATH] [--time-budget N]");
    eprintln!("  school-timetabling clear-schedule [--db PATH]");
    EXIT_USAGE
}
