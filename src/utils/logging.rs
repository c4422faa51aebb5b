/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化全局日志
///
/// 优先读取 `RUST_LOG`，否则 verbose 时为 debug，默认 info。
/// 重复调用是安全的（测试中会多次调用）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(theme: &str, bank_size: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 组卷引擎启动");
    info!("🎨 主题: {}", theme);
    info!("📚 题库标称大小: {}", bank_size);
    info!("{}", "=".repeat(60));
}

/// 记录导出开始
pub fn log_export_start(total_pages: usize, scale: f64) {
    info!("\n{}", "─".repeat(60));
    info!("🖨️ 开始导出: 共 {} 页, 像素密度 {:.1}x", total_pages, scale);
    info!("{}", "─".repeat(60));
}

/// 打印导出统计信息
///
/// # 参数
/// - `captured`: 成功页数
/// - `skipped`: 跳过的页码（从 1 开始）
/// - `output_path`: 输出文件路径
pub fn print_export_stats(captured: usize, skipped: &[usize], output_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 导出完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {} 页", captured);
    if skipped.is_empty() {
        info!("❌ 跳过: 0");
    } else {
        info!("❌ 跳过: {} 页 (页码 {:?})", skipped.len(), skipped);
    }
    info!("{}", "=".repeat(60));
    info!("\n文件已保存至: {}", output_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars_not_bytes() {
        assert_eq!(truncate_text("函数的单调性", 3), "函数的...");
        assert_eq!(truncate_text("abc", 5), "abc");
    }
}
