//! OTLP trace 消息编码器与 `ExportTraceServiceRequest`。
//!
//! # 教案式说明
//! - **意图 (Why)**：将已结束的 Span 批量编码为 collector 可接受的导出请求；
//! - **逻辑 (How)**：请求编码器先按资源/插桩库分组，再自底向上构造 `Span → ScopeSpans → ResourceSpans`，
//!   每层在构造时累加子层尺寸；资源与插桩库编码器每组只构造一次；
//! - **契约 (What)**：
//!   - `flags` 字段恒为 `trace_flags | 0x100`，远端父上下文再置 `0x200`（与 OTLP 的 `SPAN_FLAGS_CONTEXT_HAS_IS_REMOTE_MASK` 一致）；
//!   - `parent_span_id` 仅在父上下文有效时写出；`status` 消息总是写出；
//!   - `SpanKind` 与 `StatusCode` 的枚举值与 schema 一致。

use std::sync::Arc;

use bytes::BufMut;
use prism_core::telemetry::{
    EventData, LinkData, SpanContext, SpanData, SpanKind, StatusCode, StatusData,
};

use crate::{
    any_value::{KeyValueMarshaler, size_key_values},
    group::group_by_resource_and_scope,
    marshaler::Marshaler,
    resource::{InstrumentationScopeMarshaler, ResourceMarshaler},
    wire::{self, ProtoField, WireType},
    writer::ProtoWriter,
};

const REQUEST_RESOURCE_SPANS: ProtoField = ProtoField::new(1, WireType::Len);

const RESOURCE_SPANS_RESOURCE: ProtoField = ProtoField::new(1, WireType::Len);
const RESOURCE_SPANS_SCOPE_SPANS: ProtoField = ProtoField::new(2, WireType::Len);
const RESOURCE_SPANS_SCHEMA_URL: ProtoField = ProtoField::new(3, WireType::Len);

const SCOPE_SPANS_SCOPE: ProtoField = ProtoField::new(1, WireType::Len);
const SCOPE_SPANS_SPANS: ProtoField = ProtoField::new(2, WireType::Len);
const SCOPE_SPANS_SCHEMA_URL: ProtoField = ProtoField::new(3, WireType::Len);

const SPAN_TRACE_ID: ProtoField = ProtoField::new(1, WireType::Len);
const SPAN_SPAN_ID: ProtoField = ProtoField::new(2, WireType::Len);
const SPAN_TRACE_STATE: ProtoField = ProtoField::new(3, WireType::Len);
const SPAN_PARENT_SPAN_ID: ProtoField = ProtoField::new(4, WireType::Len);
const SPAN_NAME: ProtoField = ProtoField::new(5, WireType::Len);
const SPAN_KIND: ProtoField = ProtoField::new(6, WireType::Varint);
const SPAN_START_TIME: ProtoField = ProtoField::new(7, WireType::I64);
const SPAN_END_TIME: ProtoField = ProtoField::new(8, WireType::I64);
const SPAN_ATTRIBUTES: ProtoField = ProtoField::new(9, WireType::Len);
const SPAN_DROPPED_ATTRIBUTES_COUNT: ProtoField = ProtoField::new(10, WireType::Varint);
const SPAN_EVENTS: ProtoField = ProtoField::new(11, WireType::Len);
const SPAN_DROPPED_EVENTS_COUNT: ProtoField = ProtoField::new(12, WireType::Varint);
const SPAN_LINKS: ProtoField = ProtoField::new(13, WireType::Len);
const SPAN_DROPPED_LINKS_COUNT: ProtoField = ProtoField::new(14, WireType::Varint);
const SPAN_STATUS: ProtoField = ProtoField::new(15, WireType::Len);
const SPAN_FLAGS: ProtoField = ProtoField::new(16, WireType::I32);

const EVENT_TIME: ProtoField = ProtoField::new(1, WireType::I64);
const EVENT_NAME: ProtoField = ProtoField::new(2, WireType::Len);
const EVENT_ATTRIBUTES: ProtoField = ProtoField::new(3, WireType::Len);
const EVENT_DROPPED_ATTRIBUTES_COUNT: ProtoField = ProtoField::new(4, WireType::Varint);

const LINK_TRACE_ID: ProtoField = ProtoField::new(1, WireType::Len);
const LINK_SPAN_ID: ProtoField = ProtoField::new(2, WireType::Len);
const LINK_TRACE_STATE: ProtoField = ProtoField::new(3, WireType::Len);
const LINK_ATTRIBUTES: ProtoField = ProtoField::new(4, WireType::Len);
const LINK_DROPPED_ATTRIBUTES_COUNT: ProtoField = ProtoField::new(5, WireType::Varint);
const LINK_FLAGS: ProtoField = ProtoField::new(6, WireType::I32);

const STATUS_MESSAGE: ProtoField = ProtoField::new(2, WireType::Len);
const STATUS_CODE: ProtoField = ProtoField::new(3, WireType::Varint);

const CONTEXT_HAS_IS_REMOTE: u32 = 0x100;
const CONTEXT_IS_REMOTE: u32 = 0x200;

fn span_kind_number(kind: SpanKind) -> i32 {
    match kind {
        SpanKind::Internal => 1,
        SpanKind::Server => 2,
        SpanKind::Client => 3,
        SpanKind::Producer => 4,
        SpanKind::Consumer => 5,
    }
}

fn status_code_number(code: StatusCode) -> i32 {
    match code {
        StatusCode::Unset => 0,
        StatusCode::Ok => 1,
        StatusCode::Error => 2,
    }
}

pub(crate) fn span_flags(context: &SpanContext, remote: bool) -> u32 {
    let mut flags = u32::from(context.trace_flags.bits()) | CONTEXT_HAS_IS_REMOTE;
    if remote {
        flags |= CONTEXT_IS_REMOTE;
    }
    flags
}

/// `Status` 消息编码器。
#[derive(Clone, Debug)]
pub struct SpanStatusMarshaler {
    code: i32,
    message: Arc<str>,
    size: usize,
}

impl SpanStatusMarshaler {
    /// 由状态构造。
    pub fn new(status: &StatusData) -> Self {
        let code = status_code_number(status.code);
        let size = wire::size_string(STATUS_MESSAGE, &status.description)
            + wire::size_enum(STATUS_CODE, code);
        Self {
            code,
            message: Arc::clone(&status.description),
            size,
        }
    }
}

impl Marshaler for SpanStatusMarshaler {
    fn size(&self) -> usize {
        self.size
    }

    fn write_to<B: BufMut>(&self, writer: &mut ProtoWriter<'_, B>) {
        writer.serialize_string(STATUS_MESSAGE, &self.message);
        writer.serialize_enum(STATUS_CODE, self.code);
    }
}

/// `Span.Event` 消息编码器。
#[derive(Clone, Debug)]
pub struct SpanEventMarshaler {
    epoch_nanos: u64,
    name: Arc<str>,
    attributes: Vec<KeyValueMarshaler>,
    dropped_attributes_count: u32,
    size: usize,
}

impl SpanEventMarshaler {
    /// 由事件构造。
    pub fn new(event: &EventData) -> Self {
        let attributes = KeyValueMarshaler::from_attributes(&event.attributes);
        let dropped_attributes_count = event.dropped_attributes_count();
        let size = wire::size_fixed64(EVENT_TIME, event.epoch_nanos)
            + wire::size_string(EVENT_NAME, &event.name)
            + size_key_values(EVENT_ATTRIBUTES, &attributes)
            + wire::size_uint32(EVENT_DROPPED_ATTRIBUTES_COUNT, dropped_attributes_count);
        Self {
            epoch_nanos: event.epoch_nanos,
            name: Arc::clone(&event.name),
            attributes,
            dropped_attributes_count,
            size,
        }
    }
}

impl Marshaler for SpanEventMarshaler {
    fn size(&self) -> usize {
        self.size
    }

    fn write_to<B: BufMut>(&self, writer: &mut ProtoWriter<'_, B>) {
        writer.serialize_fixed64(EVENT_TIME, self.epoch_nanos);
        writer.serialize_string(EVENT_NAME, &self.name);
        writer.serialize_repeated_message(EVENT_ATTRIBUTES, &self.attributes);
        writer.serialize_uint32(EVENT_DROPPED_ATTRIBUTES_COUNT, self.dropped_attributes_count);
    }
}

/// `Span.Link` 消息编码器。
#[derive(Clone, Debug)]
pub struct SpanLinkMarshaler {
    trace_id: [u8; 16],
    span_id: [u8; 8],
    trace_state: Arc<str>,
    attributes: Vec<KeyValueMarshaler>,
    dropped_attributes_count: u32,
    flags: u32,
    size: usize,
}

impl SpanLinkMarshaler {
    /// 由链接构造。
    pub fn new(link: &LinkData) -> Self {
        let context = &link.span_context;
        let attributes = KeyValueMarshaler::from_attributes(&link.attributes);
        let dropped_attributes_count = link.dropped_attributes_count();
        let flags = span_flags(context, context.remote);
        let size = wire::size_bytes(LINK_TRACE_ID, context.trace_id.as_bytes())
            + wire::size_bytes(LINK_SPAN_ID, context.span_id.as_bytes())
            + wire::size_string(LINK_TRACE_STATE, &context.trace_state)
            + size_key_values(LINK_ATTRIBUTES, &attributes)
            + wire::size_uint32(LINK_DROPPED_ATTRIBUTES_COUNT, dropped_attributes_count)
            + wire::size_fixed32(LINK_FLAGS, flags);
        Self {
            trace_id: *context.trace_id.as_bytes(),
            span_id: *context.span_id.as_bytes(),
            trace_state: Arc::clone(&context.trace_state),
            attributes,
            dropped_attributes_count,
            flags,
            size,
        }
    }
}

impl Marshaler for SpanLinkMarshaler {
    fn size(&self) -> usize {
        self.size
    }

    fn write_to<B: BufMut>(&self, writer: &mut ProtoWriter<'_, B>) {
        writer.serialize_bytes(LINK_TRACE_ID, &self.trace_id);
        writer.serialize_bytes(LINK_SPAN_ID, &self.span_id);
        writer.serialize_string(LINK_TRACE_STATE, &self.trace_state);
        writer.serialize_repeated_message(LINK_ATTRIBUTES, &self.attributes);
        writer.serialize_uint32(LINK_DROPPED_ATTRIBUTES_COUNT, self.dropped_attributes_count);
        writer.serialize_fixed32(LINK_FLAGS, self.flags);
    }
}

/// `Span` 消息编码器。
#[derive(Clone, Debug)]
pub struct SpanMarshaler {
    trace_id: [u8; 16],
    span_id: [u8; 8],
    trace_state: Arc<str>,
    parent_span_id: Option<[u8; 8]>,
    name: Arc<str>,
    kind: i32,
    start_epoch_nanos: u64,
    end_epoch_nanos: u64,
    attributes: Vec<KeyValueMarshaler>,
    dropped_attributes_count: u32,
    events: Vec<SpanEventMarshaler>,
    dropped_events_count: u32,
    links: Vec<SpanLinkMarshaler>,
    dropped_links_count: u32,
    status: SpanStatusMarshaler,
    flags: u32,
    size: usize,
}

impl SpanMarshaler {
    /// 由 Span 快照构造，自底向上计算尺寸。
    pub fn new(span: &SpanData) -> Self {
        let context = &span.span_context;
        let parent = span
            .parent_span_context
            .as_ref()
            .filter(|parent| parent.is_valid());
        let parent_span_id = parent.map(|parent| *parent.span_id.as_bytes());
        let flags = span_flags(context, parent.is_some_and(|parent| parent.remote));

        let kind = span_kind_number(span.kind);
        let attributes = KeyValueMarshaler::from_attributes(&span.attributes);
        let events: Vec<SpanEventMarshaler> = span.events.iter().map(SpanEventMarshaler::new).collect();
        let links: Vec<SpanLinkMarshaler> = span.links.iter().map(SpanLinkMarshaler::new).collect();
        let status = SpanStatusMarshaler::new(&span.status);
        let dropped_attributes_count = span.dropped_attributes_count();
        let dropped_events_count = span.dropped_events_count();
        let dropped_links_count = span.dropped_links_count();

        let size = wire::size_bytes(SPAN_TRACE_ID, context.trace_id.as_bytes())
            + wire::size_bytes(SPAN_SPAN_ID, context.span_id.as_bytes())
            + wire::size_string(SPAN_TRACE_STATE, &context.trace_state)
            + parent_span_id.map_or(0, |id| wire::size_bytes(SPAN_PARENT_SPAN_ID, &id))
            + wire::size_string(SPAN_NAME, &span.name)
            + wire::size_enum(SPAN_KIND, kind)
            + wire::size_fixed64(SPAN_START_TIME, span.start_epoch_nanos)
            + wire::size_fixed64(SPAN_END_TIME, span.end_epoch_nanos)
            + size_key_values(SPAN_ATTRIBUTES, &attributes)
            + wire::size_uint32(SPAN_DROPPED_ATTRIBUTES_COUNT, dropped_attributes_count)
            + wire::size_repeated_message(SPAN_EVENTS, events.iter().map(Marshaler::size))
            + wire::size_uint32(SPAN_DROPPED_EVENTS_COUNT, dropped_events_count)
            + wire::size_repeated_message(SPAN_LINKS, links.iter().map(Marshaler::size))
            + wire::size_uint32(SPAN_DROPPED_LINKS_COUNT, dropped_links_count)
            + wire::size_message(SPAN_STATUS, status.size())
            + wire::size_fixed32(SPAN_FLAGS, flags);

        Self {
            trace_id: *context.trace_id.as_bytes(),
            span_id: *context.span_id.as_bytes(),
            trace_state: Arc::clone(&context.trace_state),
            parent_span_id,
            name: Arc::clone(&span.name),
            kind,
            start_epoch_nanos: span.start_epoch_nanos,
            end_epoch_nanos: span.end_epoch_nanos,
            attributes,
            dropped_attributes_count,
            events,
            dropped_events_count,
            links,
            dropped_links_count,
            status,
            flags,
            size,
        }
    }
}

impl Marshaler for SpanMarshaler {
    fn size(&self) -> usize {
        self.size
    }

    fn write_to<B: BufMut>(&self, writer: &mut ProtoWriter<'_, B>) {
        writer.serialize_bytes(SPAN_TRACE_ID, &self.trace_id);
        writer.serialize_bytes(SPAN_SPAN_ID, &self.span_id);
        writer.serialize_string(SPAN_TRACE_STATE, &self.trace_state);
        if let Some(parent_span_id) = &self.parent_span_id {
            writer.serialize_bytes(SPAN_PARENT_SPAN_ID, parent_span_id);
        }
        writer.serialize_string(SPAN_NAME, &self.name);
        writer.serialize_enum(SPAN_KIND, self.kind);
        writer.serialize_fixed64(SPAN_START_TIME, self.start_epoch_nanos);
        writer.serialize_fixed64(SPAN_END_TIME, self.end_epoch_nanos);
        writer.serialize_repeated_message(SPAN_ATTRIBUTES, &self.attributes);
        writer.serialize_uint32(SPAN_DROPPED_ATTRIBUTES_COUNT, self.dropped_attributes_count);
        writer.serialize_repeated_message(SPAN_EVENTS, &self.events);
        writer.serialize_uint32(SPAN_DROPPED_EVENTS_COUNT, self.dropped_events_count);
        writer.serialize_repeated_message(SPAN_LINKS, &self.links);
        writer.serialize_uint32(SPAN_DROPPED_LINKS_COUNT, self.dropped_links_count);
        writer.serialize_message(SPAN_STATUS, &self.status);
        writer.serialize_fixed32(SPAN_FLAGS, self.flags);
    }
}

/// `ScopeSpans` 消息编码器。
#[derive(Clone, Debug)]
pub struct ScopeSpansMarshaler {
    scope: InstrumentationScopeMarshaler,
    spans: Vec<SpanMarshaler>,
    schema_url: Option<Arc<str>>,
    size: usize,
}

impl ScopeSpansMarshaler {
    /// 组合插桩库与其 Span。
    pub fn new(
        scope: InstrumentationScopeMarshaler,
        spans: Vec<SpanMarshaler>,
        schema_url: Option<Arc<str>>,
    ) -> Self {
        let size = wire::size_message(SCOPE_SPANS_SCOPE, scope.size())
            + wire::size_repeated_message(SCOPE_SPANS_SPANS, spans.iter().map(Marshaler::size))
            + schema_url
                .as_deref()
                .map_or(0, |url| wire::size_string(SCOPE_SPANS_SCHEMA_URL, url));
        Self {
            scope,
            spans,
            schema_url,
            size,
        }
    }
}

impl Marshaler for ScopeSpansMarshaler {
    fn size(&self) -> usize {
        self.size
    }

    fn write_to<B: BufMut>(&self, writer: &mut ProtoWriter<'_, B>) {
        writer.serialize_message(SCOPE_SPANS_SCOPE, &self.scope);
        writer.serialize_repeated_message(SCOPE_SPANS_SPANS, &self.spans);
        if let Some(url) = self.schema_url.as_deref() {
            writer.serialize_string(SCOPE_SPANS_SCHEMA_URL, url);
        }
    }
}

/// `ResourceSpans` 消息编码器。
#[derive(Clone, Debug)]
pub struct ResourceSpansMarshaler {
    resource: ResourceMarshaler,
    scope_spans: Vec<ScopeSpansMarshaler>,
    schema_url: Option<Arc<str>>,
    size: usize,
}

impl ResourceSpansMarshaler {
    /// 组合资源与其插桩库分组。
    pub fn new(
        resource: ResourceMarshaler,
        scope_spans: Vec<ScopeSpansMarshaler>,
        schema_url: Option<Arc<str>>,
    ) -> Self {
        let size = wire::size_message(RESOURCE_SPANS_RESOURCE, resource.size())
            + wire::size_repeated_message(
                RESOURCE_SPANS_SCOPE_SPANS,
                scope_spans.iter().map(Marshaler::size),
            )
            + schema_url
                .as_deref()
                .map_or(0, |url| wire::size_string(RESOURCE_SPANS_SCHEMA_URL, url));
        Self {
            resource,
            scope_spans,
            schema_url,
            size,
        }
    }

    /// 对 Span 批次分组并构造每个资源的编码器。
    pub fn from_spans(spans: &[SpanData]) -> Vec<Self> {
        group_by_resource_and_scope(spans)
            .into_iter()
            .map(|group| {
                let scope_spans = group
                    .scopes
                    .into_iter()
                    .map(|scope_group| {
                        ScopeSpansMarshaler::new(
                            InstrumentationScopeMarshaler::new(scope_group.scope),
                            scope_group
                                .items
                                .into_iter()
                                .map(SpanMarshaler::new)
                                .collect(),
                            scope_group.scope.schema_url.clone(),
                        )
                    })
                    .collect();
                ResourceSpansMarshaler::new(
                    ResourceMarshaler::new(group.resource),
                    scope_spans,
                    group.resource.schema_url.clone(),
                )
            })
            .collect()
    }
}

impl Marshaler for ResourceSpansMarshaler {
    fn size(&self) -> usize {
        self.size
    }

    fn write_to<B: BufMut>(&self, writer: &mut ProtoWriter<'_, B>) {
        writer.serialize_message(RESOURCE_SPANS_RESOURCE, &self.resource);
        writer.serialize_repeated_message(RESOURCE_SPANS_SCOPE_SPANS, &self.scope_spans);
        if let Some(url) = self.schema_url.as_deref() {
            writer.serialize_string(RESOURCE_SPANS_SCHEMA_URL, url);
        }
    }
}

/// `ExportTraceServiceRequest` 编码器。
#[derive(Clone, Debug)]
pub struct TraceRequestMarshaler {
    resource_spans: Vec<ResourceSpansMarshaler>,
    size: usize,
}

impl TraceRequestMarshaler {
    /// 由 Span 批次构造完整请求。
    pub fn new(spans: &[SpanData]) -> Self {
        let resource_spans = ResourceSpansMarshaler::from_spans(spans);
        let size = wire::size_repeated_message(
            REQUEST_RESOURCE_SPANS,
            resource_spans.iter().map(Marshaler::size),
        );
        tracing::trace!(
            spans = spans.len(),
            resources = resource_spans.len(),
            size,
            "built trace export request"
        );
        Self {
            resource_spans,
            size,
        }
    }
}

impl Marshaler for TraceRequestMarshaler {
    fn size(&self) -> usize {
        self.size
    }

    fn write_to<B: BufMut>(&self, writer: &mut ProtoWriter<'_, B>) {
        writer.serialize_repeated_message(REQUEST_RESOURCE_SPANS, &self.resource_spans);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::telemetry::{SpanId, TraceFlags, TraceId};

    #[test]
    fn flags_mark_remote_parent() {
        let context = SpanContext::new(
            TraceId::from_bytes([1; 16]),
            SpanId::from_bytes([2; 8]),
            TraceFlags::SAMPLED,
        );
        assert_eq!(span_flags(&context, false), 0x101);
        assert_eq!(span_flags(&context, true), 0x301);
    }

    #[test]
    fn invalid_parent_is_not_written() {
        let span = SpanData {
            parent_span_context: Some(SpanContext::default()),
            ..SpanData::default()
        };
        let with_invalid_parent = SpanMarshaler::new(&span);
        let root = SpanMarshaler::new(&SpanData::default());
        assert_eq!(with_invalid_parent.size(), root.size());
        assert_eq!(with_invalid_parent.encode_to_vec(), root.encode_to_vec());
    }
}
