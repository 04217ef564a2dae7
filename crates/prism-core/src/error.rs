//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 集中描述模型构造边界上的**调用方输入错误**：输入不满足契约时立即失败，不产生任何部分构造的状态；
//! - Rust 的类型系统已排除“空引用参数”一类错误，此处只保留类型系统无法表达的校验。
//!
//! ## 设计要求（What）
//! - 编程缺陷类错误（如尺寸/写入字节数不一致）不属于本枚举，它们以断言形式直接 panic；
//! - 可恢复的数据形状不匹配（例如异构数组无法收窄）不报错，而是回退到通用表示。

use thiserror::Error;

/// 属性模型构造阶段的输入校验错误。
///
/// # 教案式说明
/// - **意图 (Why)**：让显式校验入口（`try_*` 构造函数）能以 `?` 传播失败原因；
/// - **契约 (What)**：所有变体均为 `Clone + Eq`，便于在测试中直接断言；
/// - **权衡 (Trade-offs)**：非 `try_*` 的便捷入口不会返回该错误，而是按照容器规则静默丢弃非法条目。
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ModelError {
    /// 以原始字节构造字符串值时遇到非法 UTF-8 序列。
    #[error("string payload is not valid UTF-8 (valid up to byte {valid_up_to})")]
    InvalidUtf8 {
        /// 最长合法前缀的字节长度。
        valid_up_to: usize,
    },

    /// 属性键名为空字符串。
    #[error("attribute key name must not be empty")]
    EmptyKey,
}
