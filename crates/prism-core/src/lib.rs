#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! # prism-core
//!
//! ## 定位与职责（Why）
//! - 为遥测导出链路提供**不可变、强类型**的属性数据模型：`Value` 封闭联合、`Attributes`
//!   有序去重容器以及支持嵌套映射的 `ExtendedAttributes`；
//! - 作为 `prism-codec-otlp`（protobuf 二进制）与 `prism-codec-prometheus`（文本暴露格式）
//!   共同的输入模型，保证两类编码器对同一份数据给出一致解释；
//! - 自带 ProtoJSON 文本渲染，`Value::to_proto_json` 与 `Value::as_string` 均由 [`json`] 模块驱动。
//!
//! ## 架构嵌入（Where）
//! - [`value`]：属性值的封闭标签联合，所有分派均为穷尽 `match`，新增变体即编译期强制更新；
//! - [`attributes`]：类型化键、构建器（累积阶段）与冻结后的 `Attributes`（构建阶段）；
//! - [`extended`]：在扁平模型之上增加嵌套映射，并提供到扁平模型的有损投影；
//! - [`telemetry`]：Span / LogRecord / Metric 等纯数据载体，由外部 SDK 填充；
//! - [`error`]：调用方输入校验错误。
//!
//! ## 并发契约（What）
//! - 除构建器外的全部类型构造后不可变，可在线程间无同步地共享读取（内部以 `Arc` 共享负载）；
//! - 构建器不是线程安全的，调用方需将其限定在单一线程/任务内累积。
//!
//! ## Feature 策略（Trade-offs）
//! - 默认启用 `std`；关闭后依赖 `alloc` 在受限运行时中构建，模型与编码逻辑不依赖任何 I/O。

extern crate alloc;

pub mod attributes;
pub mod error;
pub mod extended;
pub mod json;
pub mod telemetry;
pub mod value;

pub(crate) mod compact;

pub use attributes::{
    AttributeEntry, AttributeKey, AttributeKind, AttributeType, AttributeValue, Attributes,
    AttributesBuilder,
};
pub use error::ModelError;
pub use extended::{
    ExtendedAttributeEntry, ExtendedAttributeKey, ExtendedAttributeKind, ExtendedAttributeType,
    ExtendedAttributeValue, ExtendedAttributes, ExtendedAttributesBuilder,
};
pub use value::{Value, ValueEntry, ValueType};

mod sealed {
    /// 封闭 trait 的私有标记，阻止下游为属性类型枚举之外的类型实现 `AttributeKind`。
    pub trait Sealed {}
}
