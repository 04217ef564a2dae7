#![deny(unsafe_code)]
#![warn(missing_docs)]

//! # prism-codec-otlp
//!
//! ## 定位与职责（Why）
//! - 将 `prism-core` 的属性模型与遥测载体编码为 OTLP protobuf 二进制，字段号与线型与外部 schema 逐字节一致；
//! - 采用“先算尺寸、后单趟写入”的纪律：每个编码单元在构造时自底向上算出精确字节数，
//!   写入阶段直接用该尺寸作为长度前缀，无需回填、双缓冲或扩容。
//!
//! ## 架构嵌入（Where）
//! - [`wire`]：线型、字段常量与尺寸计算原语；
//! - [`ProtoWriter`]：单趟写入汇点，记录已写字节数并在每个长度前缀边界核对；
//! - [`Marshaler`]：编码单元契约；
//! - [`any_value`]：属性到 `AnyValue` / `KeyValue` 的类型驱动映射；
//! - [`resource`]、[`trace`]、[`logs`]：按 OTLP schema 组织的消息编码器及导出请求；
//! - [`group`]：批量导出时按资源与插桩库分组，元数据每组只编码一次。
//!
//! ## 契约（What）
//! - 尺寸与实际写入字节数不一致属于编程缺陷：每个长度边界以 `debug_assert_eq!` 核对，
//!   顶层写入以 `assert_eq!` 核对，永不静默截断或越界；
//! - 编码器构造后不可变，可在线程间共享，但一次导出批次的编码在单个工作线程上完成。

mod error;
mod marshaler;
mod writer;

pub mod any_value;
pub mod group;
pub mod logs;
pub mod resource;
pub mod trace;
pub mod wire;

pub use any_value::{
    AnyValueMarshaler, ArrayValueMarshaler, KeyValueListMarshaler, KeyValueMarshaler, Omission,
};
pub use error::MarshalError;
pub use group::{ExportItem, ResourceGroup, ScopeGroup, group_by_resource_and_scope};
pub use logs::{LogRecordMarshaler, LogsRequestMarshaler, ResourceLogsMarshaler, ScopeLogsMarshaler};
pub use marshaler::Marshaler;
pub use resource::{InstrumentationScopeMarshaler, ResourceMarshaler};
pub use trace::{
    ResourceSpansMarshaler, ScopeSpansMarshaler, SpanEventMarshaler, SpanLinkMarshaler,
    SpanMarshaler, SpanStatusMarshaler, TraceRequestMarshaler,
};
pub use writer::ProtoWriter;
