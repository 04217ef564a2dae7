use alloc::{sync::Arc, vec::Vec};

use super::{InstrumentationScopeInfo, Resource, SpanContext, dropped};
use crate::attributes::Attributes;

/// Span 在调用链中的角色。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SpanKind {
    /// 进程内部操作。
    #[default]
    Internal,
    /// 同步请求的服务端。
    Server,
    /// 同步请求的客户端。
    Client,
    /// 异步消息的生产方。
    Producer,
    /// 异步消息的消费方。
    Consumer,
}

/// Span 状态码。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// 未设置。
    #[default]
    Unset,
    /// 显式成功。
    Ok,
    /// 失败。
    Error,
}

/// Span 状态。
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct StatusData {
    /// 状态码。
    pub code: StatusCode,
    /// 描述，仅在错误时有意义。
    pub description: Arc<str>,
}

impl StatusData {
    /// 未设置状态。
    pub fn unset() -> Self {
        Self::default()
    }

    /// 成功状态。
    pub fn ok() -> Self {
        Self {
            code: StatusCode::Ok,
            description: Arc::from(""),
        }
    }

    /// 带描述的错误状态。
    pub fn error(description: impl Into<Arc<str>>) -> Self {
        Self {
            code: StatusCode::Error,
            description: description.into(),
        }
    }
}

/// Span 上记录的事件。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventData {
    /// 事件名。
    pub name: Arc<str>,
    /// 发生时间（Unix 纳秒）。
    pub epoch_nanos: u64,
    /// 保留下来的属性。
    pub attributes: Attributes,
    /// 记录过的属性总数（含被丢弃的）。
    pub total_attribute_count: u32,
}

impl EventData {
    /// 被丢弃的属性数。
    pub fn dropped_attributes_count(&self) -> u32 {
        dropped(self.total_attribute_count, self.attributes.len())
    }
}

/// 指向其他 Span 的链接。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinkData {
    /// 目标 Span 上下文。
    pub span_context: SpanContext,
    /// 保留下来的属性。
    pub attributes: Attributes,
    /// 记录过的属性总数。
    pub total_attribute_count: u32,
}

impl LinkData {
    /// 被丢弃的属性数。
    pub fn dropped_attributes_count(&self) -> u32 {
        dropped(self.total_attribute_count, self.attributes.len())
    }
}

/// 已结束 Span 的完整快照。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpanData {
    /// 所属资源。
    pub resource: Resource,
    /// 所属插桩库。
    pub scope: InstrumentationScopeInfo,
    /// 自身上下文。
    pub span_context: SpanContext,
    /// 父上下文，根 Span 为 `None`。
    pub parent_span_context: Option<SpanContext>,
    /// Span 名称。
    pub name: Arc<str>,
    /// Span 角色。
    pub kind: SpanKind,
    /// 开始时间（Unix 纳秒）。
    pub start_epoch_nanos: u64,
    /// 结束时间（Unix 纳秒）。
    pub end_epoch_nanos: u64,
    /// 保留下来的属性。
    pub attributes: Attributes,
    /// 记录过的属性总数。
    pub total_attribute_count: u32,
    /// 保留下来的事件。
    pub events: Vec<EventData>,
    /// 记录过的事件总数。
    pub total_recorded_events: u32,
    /// 保留下来的链接。
    pub links: Vec<LinkData>,
    /// 记录过的链接总数。
    pub total_recorded_links: u32,
    /// 状态。
    pub status: StatusData,
}

impl SpanData {
    /// 被丢弃的属性数。
    pub fn dropped_attributes_count(&self) -> u32 {
        dropped(self.total_attribute_count, self.attributes.len())
    }

    /// 被丢弃的事件数。
    pub fn dropped_events_count(&self) -> u32 {
        dropped(self.total_recorded_events, self.events.len())
    }

    /// 被丢弃的链接数。
    pub fn dropped_links_count(&self) -> u32 {
        dropped(self.total_recorded_links, self.links.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::long_key;

    #[test]
    fn dropped_counts_saturate_at_zero() {
        let span = SpanData {
            attributes: Attributes::of(&long_key("a"), 1),
            total_attribute_count: 4,
            total_recorded_events: 0,
            events: alloc::vec![EventData::default()],
            ..SpanData::default()
        };
        assert_eq!(span.dropped_attributes_count(), 3);
        assert_eq!(span.dropped_events_count(), 0);
    }
}
