use alloc::sync::Arc;

use super::{InstrumentationScopeInfo, Resource, SpanContext, dropped};
use crate::{extended::ExtendedAttributes, value::Value};

/// 日志严重级别，判别值即 OTLP `SeverityNumber`。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Severity {
    #[default]
    Undefined = 0,
    Trace = 1,
    Trace2 = 2,
    Trace3 = 3,
    Trace4 = 4,
    Debug = 5,
    Debug2 = 6,
    Debug3 = 7,
    Debug4 = 8,
    Info = 9,
    Info2 = 10,
    Info3 = 11,
    Info4 = 12,
    Warn = 13,
    Warn2 = 14,
    Warn3 = 15,
    Warn4 = 16,
    Error = 17,
    Error2 = 18,
    Error3 = 19,
    Error4 = 20,
    Fatal = 21,
    Fatal2 = 22,
    Fatal3 = 23,
    Fatal4 = 24,
}

impl Severity {
    /// OTLP 严重级别编号。
    pub const fn number(self) -> u8 {
        self as u8
    }
}

/// 单条日志记录。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LogRecordData {
    /// 所属资源。
    pub resource: Resource,
    /// 所属插桩库。
    pub scope: InstrumentationScopeInfo,
    /// 事件发生时间（Unix 纳秒），未知为 0。
    pub timestamp_epoch_nanos: u64,
    /// 被采集时间（Unix 纳秒）。
    pub observed_timestamp_epoch_nanos: u64,
    /// 关联的 Span 上下文。
    pub span_context: Option<SpanContext>,
    /// 严重级别。
    pub severity: Severity,
    /// 原始严重级别文本。
    pub severity_text: Option<Arc<str>>,
    /// 日志主体。
    pub body: Option<Value>,
    /// 保留下来的属性。
    pub attributes: ExtendedAttributes,
    /// 记录过的属性总数。
    pub total_attribute_count: u32,
    /// 事件名。
    pub event_name: Option<Arc<str>>,
}

impl LogRecordData {
    /// 被丢弃的属性数。
    pub fn dropped_attributes_count(&self) -> u32 {
        dropped(self.total_attribute_count, self.attributes.len())
    }
}
