//! # telemetry 模块说明
//!
//! ## 角色定位（Why）
//! - 编码器的输入载体：Span、Event、Link、LogRecord 与 Metric 数据点；
//! - 这些类型由外部 SDK 流水线填充，本模块只负责形状与少量派生量（如丢弃计数），不管理生命周期。
//!
//! ## 契约（What）
//! - 全部为纯数据、字段公开，构造后按值共享；属性部分复用 `Attributes`/`ExtendedAttributes`；
//! - `Resource` 与 `InstrumentationScopeInfo` 实现 `Eq + Hash`，供批量导出时按结构分组。

mod context;
mod logs;
mod metrics;
mod resource;
mod trace;

pub use context::{SpanContext, SpanId, TraceFlags, TraceId};
pub use logs::{LogRecordData, Severity};
pub use metrics::{
    ExponentialBuckets, ExponentialHistogramPoint, Exemplar, HistogramPoint, MetricData,
    MetricPoints, NumberPoint, NumberValue, SummaryPoint, ValueAtQuantile,
};
pub use resource::{InstrumentationScopeInfo, Resource};
pub use trace::{EventData, LinkData, SpanData, SpanKind, StatusCode, StatusData};

/// 由“记录总数”与“保留数”推导丢弃数，总数小于保留数时视为零。
pub(crate) fn dropped(total: u32, retained: usize) -> u32 {
    let retained = u32::try_from(retained).unwrap_or(u32::MAX);
    total.saturating_sub(retained)
}
