//! OTLP logs 消息编码器与 `ExportLogsServiceRequest`。
//!
//! 结构与 [`crate::trace`] 对称；差异在于日志属性为扩展属性（嵌套映射编码为 `kvlist_value`），
//! 且 `trace_id` / `span_id` 仅在关联的 Span 上下文有效时写出。

use std::sync::Arc;

use bytes::BufMut;
use prism_core::telemetry::LogRecordData;

use crate::{
    any_value::{AnyValueMarshaler, KeyValueMarshaler, Omission, size_key_values},
    group::group_by_resource_and_scope,
    marshaler::Marshaler,
    resource::{InstrumentationScopeMarshaler, ResourceMarshaler},
    wire::{self, ProtoField, WireType},
    writer::ProtoWriter,
};

const REQUEST_RESOURCE_LOGS: ProtoField = ProtoField::new(1, WireType::Len);

const RESOURCE_LOGS_RESOURCE: ProtoField = ProtoField::new(1, WireType::Len);
const RESOURCE_LOGS_SCOPE_LOGS: ProtoField = ProtoField::new(2, WireType::Len);
const RESOURCE_LOGS_SCHEMA_URL: ProtoField = ProtoField::new(3, WireType::Len);

const SCOPE_LOGS_SCOPE: ProtoField = ProtoField::new(1, WireType::Len);
const SCOPE_LOGS_LOG_RECORDS: ProtoField = ProtoField::new(2, WireType::Len);
const SCOPE_LOGS_SCHEMA_URL: ProtoField = ProtoField::new(3, WireType::Len);

const LOG_TIME: ProtoField = ProtoField::new(1, WireType::I64);
const LOG_SEVERITY_NUMBER: ProtoField = ProtoField::new(2, WireType::Varint);
const LOG_SEVERITY_TEXT: ProtoField = ProtoField::new(3, WireType::Len);
const LOG_BODY: ProtoField = ProtoField::new(5, WireType::Len);
const LOG_ATTRIBUTES: ProtoField = ProtoField::new(6, WireType::Len);
const LOG_DROPPED_ATTRIBUTES_COUNT: ProtoField = ProtoField::new(7, WireType::Varint);
const LOG_FLAGS: ProtoField = ProtoField::new(8, WireType::I32);
const LOG_TRACE_ID: ProtoField = ProtoField::new(9, WireType::Len);
const LOG_SPAN_ID: ProtoField = ProtoField::new(10, WireType::Len);
const LOG_OBSERVED_TIME: ProtoField = ProtoField::new(11, WireType::I64);
const LOG_EVENT_NAME: ProtoField = ProtoField::new(12, WireType::Len);

/// `LogRecord` 消息编码器。
#[derive(Clone, Debug)]
pub struct LogRecordMarshaler {
    timestamp_epoch_nanos: u64,
    observed_timestamp_epoch_nanos: u64,
    severity_number: i32,
    severity_text: Option<Arc<str>>,
    body: Option<AnyValueMarshaler>,
    attributes: Vec<KeyValueMarshaler>,
    dropped_attributes_count: u32,
    flags: u32,
    trace_id: Option<[u8; 16]>,
    span_id: Option<[u8; 8]>,
    event_name: Option<Arc<str>>,
    size: usize,
}

impl LogRecordMarshaler {
    /// 由日志记录构造。
    pub fn new(record: &LogRecordData) -> Self {
        let severity_number = i32::from(record.severity.number());
        let body = record
            .body
            .as_ref()
            .map(|body| AnyValueMarshaler::from_value(body, Omission::OmitDefaults));
        let attributes = KeyValueMarshaler::from_extended_attributes(&record.attributes);
        let dropped_attributes_count = record.dropped_attributes_count();
        let context = record.span_context.as_ref().filter(|context| context.is_valid());
        let flags = context.map_or(0, |context| u32::from(context.trace_flags.bits()));
        let trace_id = context.map(|context| *context.trace_id.as_bytes());
        let span_id = context.map(|context| *context.span_id.as_bytes());

        let size = wire::size_fixed64(LOG_TIME, record.timestamp_epoch_nanos)
            + wire::size_enum(LOG_SEVERITY_NUMBER, severity_number)
            + record
                .severity_text
                .as_deref()
                .map_or(0, |text| wire::size_string(LOG_SEVERITY_TEXT, text))
            + body
                .as_ref()
                .map_or(0, |body| wire::size_message(LOG_BODY, body.size()))
            + size_key_values(LOG_ATTRIBUTES, &attributes)
            + wire::size_uint32(LOG_DROPPED_ATTRIBUTES_COUNT, dropped_attributes_count)
            + wire::size_fixed32(LOG_FLAGS, flags)
            + trace_id.map_or(0, |id| wire::size_bytes(LOG_TRACE_ID, &id))
            + span_id.map_or(0, |id| wire::size_bytes(LOG_SPAN_ID, &id))
            + wire::size_fixed64(LOG_OBSERVED_TIME, record.observed_timestamp_epoch_nanos)
            + record
                .event_name
                .as_deref()
                .map_or(0, |name| wire::size_string(LOG_EVENT_NAME, name));

        Self {
            timestamp_epoch_nanos: record.timestamp_epoch_nanos,
            observed_timestamp_epoch_nanos: record.observed_timestamp_epoch_nanos,
            severity_number,
            severity_text: record.severity_text.clone(),
            body,
            attributes,
            dropped_attributes_count,
            flags,
            trace_id,
            span_id,
            event_name: record.event_name.clone(),
            size,
        }
    }
}

impl Marshaler for LogRecordMarshaler {
    fn size(&self) -> usize {
        self.size
    }

    fn write_to<B: BufMut>(&self, writer: &mut ProtoWriter<'_, B>) {
        writer.serialize_fixed64(LOG_TIME, self.timestamp_epoch_nanos);
        writer.serialize_enum(LOG_SEVERITY_NUMBER, self.severity_number);
        if let Some(text) = self.severity_text.as_deref() {
            writer.serialize_string(LOG_SEVERITY_TEXT, text);
        }
        if let Some(body) = &self.body {
            writer.serialize_message(LOG_BODY, body);
        }
        writer.serialize_repeated_message(LOG_ATTRIBUTES, &self.attributes);
        writer.serialize_uint32(LOG_DROPPED_ATTRIBUTES_COUNT, self.dropped_attributes_count);
        writer.serialize_fixed32(LOG_FLAGS, self.flags);
        if let Some(trace_id) = &self.trace_id {
            writer.serialize_bytes(LOG_TRACE_ID, trace_id);
        }
        if let Some(span_id) = &self.span_id {
            writer.serialize_bytes(LOG_SPAN_ID, span_id);
        }
        writer.serialize_fixed64(LOG_OBSERVED_TIME, self.observed_timestamp_epoch_nanos);
        if let Some(name) = self.event_name.as_deref() {
            writer.serialize_string(LOG_EVENT_NAME, name);
        }
    }
}

/// `ScopeLogs` 消息编码器。
#[derive(Clone, Debug)]
pub struct ScopeLogsMarshaler {
    scope: InstrumentationScopeMarshaler,
    log_records: Vec<LogRecordMarshaler>,
    schema_url: Option<Arc<str>>,
    size: usize,
}

impl ScopeLogsMarshaler {
    /// 组合插桩库与其日志。
    pub fn new(
        scope: InstrumentationScopeMarshaler,
        log_records: Vec<LogRecordMarshaler>,
        schema_url: Option<Arc<str>>,
    ) -> Self {
        let size = wire::size_message(SCOPE_LOGS_SCOPE, scope.size())
            + wire::size_repeated_message(
                SCOPE_LOGS_LOG_RECORDS,
                log_records.iter().map(Marshaler::size),
            )
            + schema_url
                .as_deref()
                .map_or(0, |url| wire::size_string(SCOPE_LOGS_SCHEMA_URL, url));
        Self {
            scope,
            log_records,
            schema_url,
            size,
        }
    }
}

impl Marshaler for ScopeLogsMarshaler {
    fn size(&self) -> usize {
        self.size
    }

    fn write_to<B: BufMut>(&self, writer: &mut ProtoWriter<'_, B>) {
        writer.serialize_message(SCOPE_LOGS_SCOPE, &self.scope);
        writer.serialize_repeated_message(SCOPE_LOGS_LOG_RECORDS, &self.log_records);
        if let Some(url) = self.schema_url.as_deref() {
            writer.serialize_string(SCOPE_LOGS_SCHEMA_URL, url);
        }
    }
}

/// `ResourceLogs` 消息编码器。
#[derive(Clone, Debug)]
pub struct ResourceLogsMarshaler {
    resource: ResourceMarshaler,
    scope_logs: Vec<ScopeLogsMarshaler>,
    schema_url: Option<Arc<str>>,
    size: usize,
}

impl ResourceLogsMarshaler {
    /// 组合资源与其插桩库分组。
    pub fn new(
        resource: ResourceMarshaler,
        scope_logs: Vec<ScopeLogsMarshaler>,
        schema_url: Option<Arc<str>>,
    ) -> Self {
        let size = wire::size_message(RESOURCE_LOGS_RESOURCE, resource.size())
            + wire::size_repeated_message(
                RESOURCE_LOGS_SCOPE_LOGS,
                scope_logs.iter().map(Marshaler::size),
            )
            + schema_url
                .as_deref()
                .map_or(0, |url| wire::size_string(RESOURCE_LOGS_SCHEMA_URL, url));
        Self {
            resource,
            scope_logs,
            schema_url,
            size,
        }
    }

    /// 对日志批次分组并构造每个资源的编码器。
    pub fn from_records(records: &[LogRecordData]) -> Vec<Self> {
        group_by_resource_and_scope(records)
            .into_iter()
            .map(|group| {
                let scope_logs = group
                    .scopes
                    .into_iter()
                    .map(|scope_group| {
                        ScopeLogsMarshaler::new(
                            InstrumentationScopeMarshaler::new(scope_group.scope),
                            scope_group
                                .items
                                .into_iter()
                                .map(LogRecordMarshaler::new)
                                .collect(),
                            scope_group.scope.schema_url.clone(),
                        )
                    })
                    .collect();
                ResourceLogsMarshaler::new(
                    ResourceMarshaler::new(group.resource),
                    scope_logs,
                    group.resource.schema_url.clone(),
                )
            })
            .collect()
    }
}

impl Marshaler for ResourceLogsMarshaler {
    fn size(&self) -> usize {
        self.size
    }

    fn write_to<B: BufMut>(&self, writer: &mut ProtoWriter<'_, B>) {
        writer.serialize_message(RESOURCE_LOGS_RESOURCE, &self.resource);
        writer.serialize_repeated_message(RESOURCE_LOGS_SCOPE_LOGS, &self.scope_logs);
        if let Some(url) = self.schema_url.as_deref() {
            writer.serialize_string(RESOURCE_LOGS_SCHEMA_URL, url);
        }
    }
}

/// `ExportLogsServiceRequest` 编码器。
#[derive(Clone, Debug)]
pub struct LogsRequestMarshaler {
    resource_logs: Vec<ResourceLogsMarshaler>,
    size: usize,
}

impl LogsRequestMarshaler {
    /// 由日志批次构造完整请求。
    pub fn new(records: &[LogRecordData]) -> Self {
        let resource_logs = ResourceLogsMarshaler::from_records(records);
        let size = wire::size_repeated_message(
            REQUEST_RESOURCE_LOGS,
            resource_logs.iter().map(Marshaler::size),
        );
        tracing::trace!(
            records = records.len(),
            resources = resource_logs.len(),
            size,
            "built logs export request"
        );
        Self {
            resource_logs,
            size,
        }
    }
}

impl Marshaler for LogsRequestMarshaler {
    fn size(&self) -> usize {
        self.size
    }

    fn write_to<B: BufMut>(&self, writer: &mut ProtoWriter<'_, B>) {
        writer.serialize_repeated_message(REQUEST_RESOURCE_LOGS, &self.resource_logs);
    }
}
