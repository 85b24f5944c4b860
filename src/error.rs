//! 引擎错误类型

/// 通知引擎错误
///
/// 投递失败不在这里：发送失败只记录日志，不向宿主传播。
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// 配置错误（例如 stream 在所有层级都为空）
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 变更历史不可用（在适配器内部恢复，渲染为占位行）
    #[error("Change history unavailable: {0}")]
    ChangeHistoryUnavailable(String),
}

pub type NotifyResult<T> = Result<T, NotifyError>;
