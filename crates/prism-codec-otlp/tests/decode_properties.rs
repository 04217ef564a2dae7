//! 解码回值模型的语义往返性质
//!
//! - **核心目标 (Why)**：长度一致只证明字节“可读”，还需证明对端读到的就是我们写下的值；
//! - **设计手法 (How)**：参考类型解码后再映射回 `prism_core::Value`，与生成输入比对。
//!   `OmitDefaults` 下顶层与键值条目的默认标量在线上不可见，比对前先把期望值投影为 `Empty`；
//!   数组元素总是显式写出，不做投影；
//! - **批次 (What)**：Span / 日志批次走完分组与请求编码器，断言 `size()` 与解码出的条目数。

use opentelemetry_proto::tonic::{
    collector::{logs::v1::ExportLogsServiceRequest, trace::v1::ExportTraceServiceRequest},
    common::v1::{AnyValue, any_value},
};
use prism_codec_otlp::{
    AnyValueMarshaler, LogsRequestMarshaler, Marshaler, Omission, TraceRequestMarshaler,
    group_by_resource_and_scope,
};
use prism_core::{
    Attributes, ExtendedAttributes, Value, ValueEntry,
    attributes::{long_key, string_key},
    extended::map_key,
    telemetry::{
        InstrumentationScopeInfo, LogRecordData, Resource, Severity, SpanContext, SpanData, SpanId,
        SpanKind, StatusData, TraceFlags, TraceId,
    },
};
use proptest::prelude::*;
use prost::Message;

fn values() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        any::<String>().prop_map(Value::from),
        Just(Value::string("")),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        Just(Value::long(0)),
        any::<f64>().prop_map(Value::from),
        Just(Value::double(0.0)),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(|raw| Value::bytes(&raw)),
        Just(Value::empty()),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::from),
            prop::collection::vec((".{0,4}", inner), 0..6).prop_map(Value::key_value_list),
        ]
    })
}

fn from_proto(decoded: Option<&AnyValue>) -> Value {
    match decoded.and_then(|value| value.value.as_ref()) {
        Some(any_value::Value::StringValue(text)) => Value::from(text.as_str()),
        Some(any_value::Value::BoolValue(flag)) => Value::bool(*flag),
        Some(any_value::Value::IntValue(number)) => Value::long(*number),
        Some(any_value::Value::DoubleValue(number)) => Value::double(*number),
        Some(any_value::Value::BytesValue(raw)) => Value::bytes(raw),
        Some(any_value::Value::ArrayValue(array)) => {
            Value::array(array.values.iter().map(|element| from_proto(Some(element))))
        }
        Some(any_value::Value::KvlistValue(list)) => Value::key_value_list(
            list.values
                .iter()
                .map(|kv| (kv.key.as_str(), from_proto(kv.value.as_ref()))),
        ),
        None => Value::empty(),
    }
}

fn is_default_scalar(value: &Value) -> bool {
    match value {
        Value::String(text) => text.is_empty(),
        Value::Bool(flag) => !flag,
        Value::Long(number) => *number == 0,
        Value::Double(number) => number.to_bits() == 0,
        Value::Bytes(raw) => raw.is_empty(),
        Value::Array(_) | Value::KeyValueList(_) | Value::Empty => false,
    }
}

/// 期望值在线上的可见形态。
fn wire_projection(value: &Value, omission: Omission) -> Value {
    match value {
        _ if omission == Omission::OmitDefaults && is_default_scalar(value) => Value::empty(),
        Value::Array(elements) => Value::array(
            elements
                .iter()
                .map(|element| wire_projection(element, Omission::Explicit)),
        ),
        Value::KeyValueList(entries) => Value::key_value_list(entries.iter().map(|entry: &ValueEntry| {
            (entry.key(), wire_projection(entry.value(), Omission::OmitDefaults))
        })),
        other => other.clone(),
    }
}

fn round_trip(value: &Value, omission: Omission) -> Value {
    let bytes = AnyValueMarshaler::from_value(value, omission).encode_to_vec();
    let decoded = AnyValue::decode(bytes.as_slice()).expect("decodes as AnyValue");
    from_proto(Some(&decoded))
}

#[test]
fn explicit_zero_scalars_survive_decoding() {
    // Why: 显式策略下默认值也必须写出 oneof，对端才能区分“零”与“未设置”。
    for value in [
        Value::string(""),
        Value::bytes(&[]),
        Value::long(0),
        Value::bool(false),
        Value::double(0.0),
    ] {
        assert_eq!(round_trip(&value, Omission::Explicit), value);
        assert_eq!(round_trip(&value, Omission::OmitDefaults), Value::empty());
    }
}

#[test]
fn nested_defaults_follow_their_container() {
    let value = Value::array([
        Value::key_value_list([("zero", Value::long(0)), ("one", Value::long(1))]),
        Value::array([Value::string(""), Value::bytes(&[])]),
    ]);
    let expected = Value::array([
        Value::key_value_list([("zero", Value::empty()), ("one", Value::long(1))]),
        Value::array([Value::string(""), Value::bytes(&[])]),
    ]);
    assert_eq!(round_trip(&value, Omission::OmitDefaults), expected);
}

fn context(seed: u8) -> SpanContext {
    SpanContext::new(
        TraceId::from_bytes([seed | 1; 16]),
        SpanId::from_bytes([seed | 1; 8]),
        TraceFlags::SAMPLED,
    )
}

fn resources() -> impl Strategy<Value = Resource> {
    prop_oneof![
        Just(Resource::default()),
        Just(Resource::new(Attributes::of(&string_key("service.name"), "checkout"))),
        Just(
            Resource::new(Attributes::of(&string_key("service.name"), "billing"))
                .with_schema_url("https://opentelemetry.io/schemas/1.21.0"),
        ),
    ]
}

fn scopes() -> impl Strategy<Value = InstrumentationScopeInfo> {
    prop_oneof![
        Just(InstrumentationScopeInfo::new("io.prism.http")),
        Just(InstrumentationScopeInfo::new("io.prism.db").with_version("2.0.0")),
    ]
}

fn spans() -> impl Strategy<Value = SpanData> {
    (
        resources(),
        scopes(),
        any::<u8>(),
        ".{0,8}",
        any::<u64>(),
        prop::collection::vec(("[a-z]{1,4}", any::<i64>()), 0..4),
        any::<bool>(),
    )
        .prop_map(|(resource, scope, seed, name, start, attributes, failed)| SpanData {
            resource,
            scope,
            span_context: context(seed),
            name: name.into(),
            kind: SpanKind::Server,
            start_epoch_nanos: start,
            end_epoch_nanos: start.saturating_add(1),
            attributes: attributes
                .into_iter()
                .fold(Attributes::builder(), |builder, (key, number)| {
                    builder.put(&long_key(key), number)
                })
                .build(),
            status: if failed { StatusData::error("boom") } else { StatusData::unset() },
            ..SpanData::default()
        })
}

fn records() -> impl Strategy<Value = LogRecordData> {
    (
        resources(),
        scopes(),
        prop::option::of(values()),
        prop::option::of(any::<u8>()),
        ".{0,6}",
        values(),
    )
        .prop_map(|(resource, scope, body, seed, key, nested)| LogRecordData {
            resource,
            scope,
            timestamp_epoch_nanos: 1,
            span_context: seed.map(context),
            severity: Severity::Info,
            body,
            attributes: ExtendedAttributes::builder()
                .put(
                    &map_key("detail"),
                    ExtendedAttributes::builder()
                        .put_attribute(&string_key(key), nested.as_string())
                        .build(),
                )
                .build(),
            ..LogRecordData::default()
        })
}

fn distinct_groups<T>(items: &[T], resource: impl Fn(&T) -> &Resource) -> usize {
    let mut seen: Vec<&Resource> = Vec::new();
    for item in items {
        let candidate = resource(item);
        if !seen.contains(&candidate) {
            seen.push(candidate);
        }
    }
    seen.len()
}

proptest! {
    #[test]
    fn prop_decoded_value_matches_generated(value in values()) {
        prop_assert_eq!(round_trip(&value, Omission::Explicit), wire_projection(&value, Omission::Explicit));
        prop_assert_eq!(
            round_trip(&value, Omission::OmitDefaults),
            wire_projection(&value, Omission::OmitDefaults)
        );
    }

    #[test]
    fn prop_trace_batches_size_and_decode(batch in prop::collection::vec(spans(), 0..8)) {
        let marshaler = TraceRequestMarshaler::new(&batch);
        let bytes = marshaler.encode_to_vec();
        prop_assert_eq!(bytes.len(), marshaler.size());

        let request = ExportTraceServiceRequest::decode(bytes.as_slice()).expect("decodes");
        let groups = group_by_resource_and_scope(&batch);
        prop_assert_eq!(request.resource_spans.len(), groups.len());
        prop_assert_eq!(groups.len(), distinct_groups(&batch, |span| &span.resource));
        let decoded: usize = request
            .resource_spans
            .iter()
            .flat_map(|resource| &resource.scope_spans)
            .map(|scope| scope.spans.len())
            .sum();
        prop_assert_eq!(decoded, batch.len());
    }

    #[test]
    fn prop_log_batches_size_and_decode(batch in prop::collection::vec(records(), 0..8)) {
        let marshaler = LogsRequestMarshaler::new(&batch);
        let bytes = marshaler.encode_to_vec();
        prop_assert_eq!(bytes.len(), marshaler.size());

        let request = ExportLogsServiceRequest::decode(bytes.as_slice()).expect("decodes");
        let groups = group_by_resource_and_scope(&batch);
        prop_assert_eq!(request.resource_logs.len(), groups.len());
        for (resource, group) in request.resource_logs.iter().zip(&groups) {
            prop_assert_eq!(resource.scope_logs.len(), group.scopes.len());
            for (scope, expected) in resource.scope_logs.iter().zip(&group.scopes) {
                prop_assert_eq!(scope.log_records.len(), expected.items.len());
            }
        }
        let bodies: Vec<Value> = request
            .resource_logs
            .iter()
            .flat_map(|resource| &resource.scope_logs)
            .flat_map(|scope| &scope.log_records)
            .map(|record| from_proto(record.body.as_ref()))
            .collect();
        let mut expected: Vec<Value> = Vec::new();
        for group in &groups {
            for scope in &group.scopes {
                for record in &scope.items {
                    expected.push(
                        record
                            .body
                            .as_ref()
                            .map_or(Value::empty(), |body| wire_projection(body, Omission::OmitDefaults)),
                    );
                }
            }
        }
        prop_assert_eq!(bodies, expected);
    }
}
