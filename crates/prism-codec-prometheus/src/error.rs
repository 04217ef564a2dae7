//! 曝光编码的错误域。
//!
//! - `Io`：输出端写入失败，原样保留底层 [`std::io::Error`] 以便调用方判断是否可重试；
//! - `Config`：配置文档无法解析或取值越界，携带面向运维人员的可读原因。
//!
//! 名称清洗是全函数，不会产生错误；序列化过程中的类型冲突以 `tracing::warn!` 记录并丢弃，
//! 同样不进入错误通道。

use thiserror::Error;

/// Prometheus 编码器返回的错误。
#[derive(Debug, Error)]
pub enum PrometheusError {
    /// 输出端写入失败。
    #[error("failed to write exposition output: {0}")]
    Io(#[from] std::io::Error),
    /// 配置无效。
    #[error("invalid prometheus configuration: {reason}")]
    Config {
        /// 无效原因。
        reason: String,
    },
}

impl PrometheusError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}
