use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 内容生成服务错误
    #[error("内容服务错误: {0}")]
    Provider(#[from] ProviderError),
    /// 导出错误
    #[error("导出错误: {0}")]
    Export(#[from] ExportError),
    /// 持久化错误
    #[error("持久化错误: {0}")]
    Persistence(#[from] PersistenceError),
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 内容生成服务（LLM）错误
#[derive(Debug, Error)]
pub enum ProviderError {
    /// API 调用失败
    #[error("API调用失败 (模型: {model}): {message}")]
    ApiCallFailed { model: String, message: String },
    /// 返回内容为空
    #[error("返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
    /// 返回内容无法解析为题目列表
    #[error("无法解析返回内容: {reason}")]
    MalformedResponse { reason: String },
    /// 构建请求失败
    #[error("构建请求失败: {0}")]
    RequestBuild(String),
}

/// 导出流程错误
#[derive(Debug, Error)]
pub enum ExportError {
    /// 所有页面都截图失败，没有产物
    #[error("全部 {attempted} 页截图失败，未生成文件")]
    NoPagesCaptured { attempted: usize },
    /// 单页栅格化失败
    #[error("第 {page} 页栅格化失败: {message}")]
    RasterizeFailed { page: usize, message: String },
    /// PDF 组装失败
    #[error("PDF组装失败: {0}")]
    AssemblyFailed(String),
    /// 写入文件失败
    #[error("写入导出文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 持久化存储错误
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// 读取失败
    #[error("读取键 {key} 失败: {source}")]
    ReadFailed {
        key: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入失败
    #[error("写入键 {key} 失败: {source}")]
    WriteFailed {
        key: String,
        #[source]
        source: std::io::Error,
    },
    /// 序列化失败
    #[error("序列化失败: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 启动浏览器失败
    #[error("启动浏览器失败: {0}")]
    LaunchFailed(String),
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {message}")]
    ConnectionFailed { port: u16, message: String },
    /// 页面操作失败
    #[error("页面操作失败: {0}")]
    PageFailed(String),
}

impl From<chromiumoxide::error::CdpError> for BrowserError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        BrowserError::PageFailed(err.to_string())
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 主题不存在
    #[error("未知主题: {name}")]
    UnknownTheme { name: String },
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_error_wraps_into_app_error() {
        let err: AppError = ExportError::NoPagesCaptured { attempted: 3 }.into();
        assert!(matches!(err, AppError::Export(_)));
        assert!(err.to_string().contains("3"));
    }

    #[test]
    fn test_browser_error_display() {
        let err = BrowserError::PageFailed("超时".to_string());
        assert_eq!(err.to_string(), "页面操作失败: 超时");
    }
}
