// ==========================================
// 日志系统初始化
// ==========================================
// CLI 入口在启动时调用一次；测试依赖断言输出，不挂订阅器
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 初始化日志系统
///
/// RUST_LOG 未设置时默认只放行本 crate 的 info 及以上，
/// 求解器等依赖的内部日志不进终端
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("school_timetabling=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
