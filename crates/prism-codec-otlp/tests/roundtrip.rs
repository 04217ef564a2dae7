//! 与参考 OTLP 消息类型的逐字节互通验证
//!
//! # 教案级注释概览
//!
//! - **核心目标 (Why)**：编码结果必须能被标准 protobuf 解码器按外部 schema 解读。这里以
//!   `opentelemetry-proto` 生成的类型 + `prost` 解码作为“对端 collector”，逐字段比对语义；
//! - **设计手法 (How)**：构造覆盖全部值变体、嵌套映射、事件、链接与状态的批次，编码后解码再断言；
//! - **合同 (What)**：解码端缺失的 oneof 视为 schema 默认值（例如被省略的 `int_value = 0`）。

use opentelemetry_proto::tonic::{
    collector::{logs::v1::ExportLogsServiceRequest, trace::v1::ExportTraceServiceRequest},
    common::v1::{AnyValue, KeyValue, any_value},
};
use prism_codec_otlp::{
    AnyValueMarshaler, KeyValueMarshaler, LogsRequestMarshaler, Marshaler, Omission,
    TraceRequestMarshaler,
};
use prism_core::{
    Attributes, ExtendedAttributes, Value,
    attributes::{boolean_key, double_array_key, long_key, string_array_key, string_key, value_key},
    extended::{map_array_key, map_key},
    telemetry::{
        EventData, InstrumentationScopeInfo, LinkData, LogRecordData, Resource, Severity,
        SpanContext, SpanData, SpanId, SpanKind, StatusData, TraceFlags, TraceId,
    },
};
use prost::Message;

fn decode_any_value(value: &Value) -> AnyValue {
    let bytes = AnyValueMarshaler::from_value(value, Omission::OmitDefaults).encode_to_vec();
    AnyValue::decode(bytes.as_slice()).expect("decodes as AnyValue")
}

fn find<'a>(attributes: &'a [KeyValue], key: &str) -> Option<&'a any_value::Value> {
    attributes
        .iter()
        .find(|kv| kv.key == key)
        .and_then(|kv| kv.value.as_ref())
        .and_then(|value| value.value.as_ref())
}

fn context(trace: u8, span: u8) -> SpanContext {
    SpanContext::new(
        TraceId::from_bytes([trace; 16]),
        SpanId::from_bytes([span; 8]),
        TraceFlags::SAMPLED,
    )
}

#[test]
fn scalar_values_decode_to_matching_variants() {
    assert_eq!(
        decode_any_value(&Value::string("hi")).value,
        Some(any_value::Value::StringValue("hi".into()))
    );
    assert_eq!(
        decode_any_value(&Value::long(-42)).value,
        Some(any_value::Value::IntValue(-42))
    );
    assert_eq!(
        decode_any_value(&Value::double(2.5)).value,
        Some(any_value::Value::DoubleValue(2.5))
    );
    assert_eq!(
        decode_any_value(&Value::bytes(&[1, 2, 3])).value,
        Some(any_value::Value::BytesValue(vec![1, 2, 3]))
    );
    // 默认值被省略：解码端看到的是未设置的 oneof。
    assert_eq!(decode_any_value(&Value::long(0)).value, None);
    assert_eq!(decode_any_value(&Value::empty()).value, None);
}

#[test]
fn nested_arrays_keep_length_and_zero_elements() {
    let value = Value::array([
        Value::long(0),
        Value::string(""),
        Value::bool(false),
        Value::array([Value::double(0.0)]),
    ]);
    let Some(any_value::Value::ArrayValue(array)) = decode_any_value(&value).value else {
        panic!("expected array_value");
    };
    assert_eq!(array.values.len(), 4);
    assert_eq!(array.values[0].value, Some(any_value::Value::IntValue(0)));
    assert_eq!(
        array.values[1].value,
        Some(any_value::Value::StringValue(String::new()))
    );
    assert_eq!(array.values[2].value, Some(any_value::Value::BoolValue(false)));
    let Some(any_value::Value::ArrayValue(inner)) = &array.values[3].value else {
        panic!("expected nested array_value");
    };
    assert_eq!(inner.values[0].value, Some(any_value::Value::DoubleValue(0.0)));
}

#[test]
fn key_value_lists_preserve_duplicate_keys() {
    let value = Value::key_value_list([("k", Value::long(1)), ("k", Value::long(2))]);
    let Some(any_value::Value::KvlistValue(list)) = decode_any_value(&value).value else {
        panic!("expected kvlist_value");
    };
    let keys: Vec<&str> = list.values.iter().map(|kv| kv.key.as_str()).collect();
    assert_eq!(keys, ["k", "k"]);
}

#[test]
fn attribute_entries_decode_in_key_order() {
    let attributes = Attributes::builder()
        .put(&string_array_key("tags"), vec!["a".to_owned(), "b".to_owned()])
        .put(&boolean_key("enabled"), true)
        .put(&long_key("zero"), 0)
        .put(&value_key("blob"), Value::bytes(b"\x00\xff"))
        .build();
    let decoded: Vec<KeyValue> = KeyValueMarshaler::from_attributes(&attributes)
        .iter()
        .map(|kv| KeyValue::decode(kv.encode_to_vec().as_slice()).expect("decodes as KeyValue"))
        .collect();
    let keys: Vec<&str> = decoded.iter().map(|kv| kv.key.as_str()).collect();
    assert_eq!(keys, ["blob", "enabled", "tags", "zero"]);
    // 默认值条目仍保留键，值消息为空。
    assert!(decoded[3].value.is_some());
    assert_eq!(find(&decoded, "zero"), None);
    assert_eq!(
        find(&decoded, "blob"),
        Some(&any_value::Value::BytesValue(vec![0x00, 0xff]))
    );
}

fn sample_spans() -> Vec<SpanData> {
    let resource = Resource::new(Attributes::of(&string_key("service.name"), "checkout"))
        .with_schema_url("https://opentelemetry.io/schemas/1.21.0");
    let scope = InstrumentationScopeInfo::new("io.prism.http")
        .with_version("1.2.0")
        .with_attributes(Attributes::of(&boolean_key("beta"), true));
    let mut remote_parent = context(9, 8);
    remote_parent.remote = true;

    let first = SpanData {
        resource: resource.clone(),
        scope: scope.clone(),
        span_context: context(1, 2),
        parent_span_context: Some(remote_parent),
        name: "GET /cart".into(),
        kind: SpanKind::Server,
        start_epoch_nanos: 1_700_000_000_000_000_000,
        end_epoch_nanos: 1_700_000_000_500_000_000,
        attributes: Attributes::of2(&long_key("http.status_code"), 200, &string_key("http.method"), "GET"),
        total_attribute_count: 5,
        events: vec![EventData {
            name: "cache-miss".into(),
            epoch_nanos: 1_700_000_000_100_000_000,
            attributes: Attributes::of(&double_array_key("latencies"), vec![0.5, 1.5]),
            total_attribute_count: 1,
        }],
        total_recorded_events: 3,
        links: vec![LinkData {
            span_context: context(3, 4),
            attributes: Attributes::empty(),
            total_attribute_count: 2,
        }],
        total_recorded_links: 1,
        status: StatusData::error("upstream timeout"),
    };
    let second = SpanData {
        resource: resource.clone(),
        scope,
        span_context: context(1, 5),
        name: "SELECT cart".into(),
        kind: SpanKind::Client,
        ..SpanData::default()
    };
    let third = SpanData {
        resource: Resource::new(Attributes::of(&string_key("service.name"), "billing")),
        scope: InstrumentationScopeInfo::new("io.prism.db"),
        span_context: context(6, 7),
        name: "charge".into(),
        ..SpanData::default()
    };
    vec![first, second, third]
}

#[test]
fn trace_request_decodes_with_grouping_and_counts() {
    let spans = sample_spans();
    let marshaler = TraceRequestMarshaler::new(&spans);
    let bytes = marshaler.encode_to_vec();
    assert_eq!(bytes.len(), marshaler.size());

    let request = ExportTraceServiceRequest::decode(bytes.as_slice()).expect("decodes");
    assert_eq!(request.resource_spans.len(), 2);

    let checkout = &request.resource_spans[0];
    assert_eq!(checkout.schema_url, "https://opentelemetry.io/schemas/1.21.0");
    assert_eq!(checkout.scope_spans.len(), 1);
    let scope_spans = &checkout.scope_spans[0];
    let scope = scope_spans.scope.as_ref().expect("scope");
    assert_eq!(scope.name, "io.prism.http");
    assert_eq!(scope.version, "1.2.0");
    assert_eq!(scope_spans.spans.len(), 2);

    let span = &scope_spans.spans[0];
    assert_eq!(span.trace_id, vec![1; 16]);
    assert_eq!(span.span_id, vec![2; 8]);
    assert_eq!(span.parent_span_id, vec![8; 8]);
    assert_eq!(span.name, "GET /cart");
    assert_eq!(span.kind, 2);
    assert_eq!(span.start_time_unix_nano, 1_700_000_000_000_000_000);
    assert_eq!(span.end_time_unix_nano, 1_700_000_000_500_000_000);
    assert_eq!(span.dropped_attributes_count, 3);
    assert_eq!(span.dropped_events_count, 2);
    assert_eq!(span.dropped_links_count, 0);
    assert_eq!(span.flags, 0x301);
    assert_eq!(
        find(&span.attributes, "http.status_code"),
        Some(&any_value::Value::IntValue(200))
    );
    let event = &span.events[0];
    assert_eq!(event.name, "cache-miss");
    assert_eq!(event.time_unix_nano, 1_700_000_000_100_000_000);
    let link = &span.links[0];
    assert_eq!(link.trace_id, vec![3; 16]);
    assert_eq!(link.dropped_attributes_count, 2);
    assert_eq!(link.flags, 0x101);
    let status = span.status.as_ref().expect("status");
    assert_eq!(status.code, 2);
    assert_eq!(status.message, "upstream timeout");

    let root = &scope_spans.spans[1];
    assert!(root.parent_span_id.is_empty());
    assert_eq!(root.flags, 0x101);
    assert_eq!(root.kind, 3);

    let billing = &request.resource_spans[1];
    assert_eq!(
        find(&billing.resource.as_ref().expect("resource").attributes, "service.name"),
        Some(&any_value::Value::StringValue("billing".into()))
    );
}

#[test]
fn logs_request_decodes_nested_attributes_and_context() {
    let nested = ExtendedAttributes::builder()
        .put_attribute(&string_key("user"), "ada")
        .build();
    let record = LogRecordData {
        resource: Resource::new(Attributes::of(&string_key("service.name"), "checkout")),
        scope: InstrumentationScopeInfo::new("io.prism.log"),
        timestamp_epoch_nanos: 10,
        observed_timestamp_epoch_nanos: 11,
        span_context: Some(context(1, 2)),
        severity: Severity::Warn,
        severity_text: Some("WARN".into()),
        body: Some(Value::string("disk almost full")),
        attributes: ExtendedAttributes::builder()
            .put(&map_key("session"), nested)
            .put_attribute(&long_key("free_mb"), 12)
            .build(),
        total_attribute_count: 4,
        event_name: None,
    };
    let bare = LogRecordData {
        body: None,
        span_context: None,
        ..record.clone()
    };
    let marshaler = LogsRequestMarshaler::new(&[record, bare]);
    let bytes = marshaler.encode_to_vec();
    let request = ExportLogsServiceRequest::decode(bytes.as_slice()).expect("decodes");

    let records = &request.resource_logs[0].scope_logs[0].log_records;
    assert_eq!(records.len(), 2);
    let log = &records[0];
    assert_eq!(log.time_unix_nano, 10);
    assert_eq!(log.observed_time_unix_nano, 11);
    assert_eq!(log.severity_number, 13);
    assert_eq!(log.severity_text, "WARN");
    assert_eq!(log.trace_id, vec![1; 16]);
    assert_eq!(log.span_id, vec![2; 8]);
    assert_eq!(log.flags, 1);
    assert_eq!(log.dropped_attributes_count, 2);
    assert_eq!(
        log.body.as_ref().and_then(|body| body.value.as_ref()),
        Some(&any_value::Value::StringValue("disk almost full".into()))
    );
    let Some(any_value::Value::KvlistValue(session)) = find(&log.attributes, "session") else {
        panic!("nested map should decode as kvlist_value");
    };
    assert_eq!(session.values[0].key, "user");

    let bare = &records[1];
    assert!(bare.body.is_none());
    assert!(bare.trace_id.is_empty());
    assert_eq!(bare.flags, 0);
}

#[test]
fn map_array_attribute_decodes_as_array_of_kvlists() {
    let first = ExtendedAttributes::builder()
        .put_attribute(&string_key("host"), "a")
        .put_attribute(&long_key("port"), 0)
        .build();
    let second = ExtendedAttributes::builder()
        .put_attribute(&string_key("host"), "b")
        .build();
    let attributes = ExtendedAttributes::builder()
        .put(&map_array_key("peers"), vec![first, second, ExtendedAttributes::empty()])
        .build();
    let decoded: Vec<KeyValue> = KeyValueMarshaler::from_extended_attributes(&attributes)
        .iter()
        .map(|kv| KeyValue::decode(kv.encode_to_vec().as_slice()).expect("decodes as KeyValue"))
        .collect();

    let Some(any_value::Value::ArrayValue(peers)) = find(&decoded, "peers") else {
        panic!("map array should decode as array_value");
    };
    assert_eq!(peers.values.len(), 3);
    let maps: Vec<&[KeyValue]> = peers
        .values
        .iter()
        .map(|element| match &element.value {
            Some(any_value::Value::KvlistValue(list)) => list.values.as_slice(),
            other => panic!("element should be kvlist_value, got {other:?}"),
        })
        .collect();
    assert_eq!(find(maps[0], "host"), Some(&any_value::Value::StringValue("a".into())));
    // Why: 映射内部沿用顶层省略语义，零值只留下键。
    assert_eq!(find(maps[0], "port"), None);
    assert_eq!(maps[0][1].key, "port");
    assert_eq!(find(maps[1], "host"), Some(&any_value::Value::StringValue("b".into())));
    assert!(maps[2].is_empty());
}
