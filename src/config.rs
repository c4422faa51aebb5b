/// 最低像素密度，低于此值打印时会发虚
pub const MIN_DEVICE_SCALE_FACTOR: f64 = 2.0;

/// 拖拽排序的默认激活距离（像素）
pub const DEFAULT_REORDER_ACTIVATION_PX: f64 = 8.0;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- 浏览器配置 ---
    /// 浏览器调试端口（设置后连接已运行的浏览器，否则启动无头浏览器）
    pub browser_debug_port: Option<u16>,
    /// 浏览器可执行文件路径
    pub chrome_executable: Option<String>,
    /// 截图像素密度
    pub device_scale_factor: f64,
    // --- 存储与输入输出 ---
    /// 快照与偏好设置存放目录
    pub data_dir: String,
    /// PDF 输出目录
    pub export_dir: String,
    /// 手工录入题目的 TOML 目录
    pub question_folder: String,
    /// 组卷模板（TOML）
    pub template_file: Option<String>,
    /// 退出前是否保存快照
    pub save_snapshot: bool,
    // --- 组卷 ---
    /// 主题名称
    pub theme_name: String,
    /// 题库标称大小
    pub bank_size: usize,
    /// 拖拽排序的激活距离（像素）
    pub reorder_activation_px: f64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            browser_debug_port: None,
            chrome_executable: None,
            device_scale_factor: MIN_DEVICE_SCALE_FACTOR,
            data_dir: "data".to_string(),
            export_dir: "exports".to_string(),
            question_folder: "questions".to_string(),
            template_file: None,
            save_snapshot: true,
            theme_name: "classic".to_string(),
            bank_size: 12,
            reorder_activation_px: DEFAULT_REORDER_ACTIVATION_PX,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            browser_debug_port: std::env::var("BROWSER_DEBUG_PORT").ok().and_then(|v| v.parse().ok()),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok(),
            device_scale_factor: std::env::var("DEVICE_SCALE_FACTOR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.device_scale_factor)
                .max(MIN_DEVICE_SCALE_FACTOR),
            data_dir: std::env::var("DATA_DIR").unwrap_or(default.data_dir),
            export_dir: std::env::var("EXPORT_DIR").unwrap_or(default.export_dir),
            question_folder: std::env::var("QUESTION_FOLDER").unwrap_or(default.question_folder),
            template_file: std::env::var("TEMPLATE_FILE").ok(),
            save_snapshot: std::env::var("SAVE_SNAPSHOT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.save_snapshot),
            theme_name: std::env::var("THEME_NAME").unwrap_or(default.theme_name),
            bank_size: std::env::var("BANK_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.bank_size),
            reorder_activation_px: std::env::var("REORDER_ACTIVATION_PX").ok().and_then(|v| v.parse().ok()).unwrap_or(default.reorder_activation_px),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scale_factor_is_print_safe() {
        let config = Config::default();
        assert!(config.device_scale_factor >= MIN_DEVICE_SCALE_FACTOR);
        assert_eq!(config.theme_name, "classic");
    }
}
