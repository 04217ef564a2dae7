use std::io;

use thiserror::Error;

/// 二进制编码的可恢复失败。
///
/// # 教案式说明
/// - **意图 (Why)**：区分“汇点装不下”与“汇点 I/O 失败”两类外部原因，便于导出器决定丢弃或重试；
/// - **契约 (What)**：尺寸与写入不一致不在此列，它是编程缺陷，以断言形式直接 panic；
/// - **风险 (Trade-offs)**：`InsufficientCapacity` 在写入前检测，失败时汇点未被修改。
#[derive(Debug, Error)]
pub enum MarshalError {
    /// 定长汇点剩余空间不足以容纳整条消息。
    #[error("sink has {remaining} bytes left but the message needs {required}")]
    InsufficientCapacity {
        /// 消息所需字节数。
        required: usize,
        /// 汇点剩余字节数。
        remaining: usize,
    },

    /// 写出到 `io::Write` 失败。
    #[error("failed to write encoded message: {0}")]
    Io(#[from] io::Error),
}
