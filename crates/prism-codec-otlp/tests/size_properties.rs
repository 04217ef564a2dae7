//! 尺寸/写入一致性性质验证
//!
//! - **核心目标 (Why)**：任意可构造输入（空容器、单条目、深层嵌套数组与映射）下，
//!   `size()` 必须等于实际写出的字节数，且写出的字节能被参考解码器完整消费；
//! - **设计手法 (How)**：以递归策略生成 `Value`，分别在两种省略策略下编码；
//!   `encode_to_vec` 内部的 `assert_eq!` 负责捕获不一致，这里额外比对长度并解码。

use opentelemetry_proto::tonic::common::v1::AnyValue;
use prism_codec_otlp::{AnyValueMarshaler, KeyValueMarshaler, Marshaler, Omission, ResourceMarshaler};
use prism_core::{AttributeValue, Attributes, Value, telemetry::Resource};
use proptest::prelude::*;
use prost::Message;

fn values() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        any::<String>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<f64>().prop_map(Value::from),
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

fn attributes() -> impl Strategy<Value = Attributes> {
    prop::collection::vec(("[a-z]{1,4}", values()), 0..8).prop_map(|entries| {
        entries
            .into_iter()
            .fold(Attributes::builder(), |builder, (name, value)| {
                builder.put_value(name, AttributeValue::from_value(value))
            })
            .build()
    })
}

proptest! {
    #[test]
    fn prop_any_value_size_matches_written_bytes(value in values(), explicit in any::<bool>()) {
        let omission = if explicit { Omission::Explicit } else { Omission::OmitDefaults };
        let marshaler = AnyValueMarshaler::from_value(&value, omission);
        let bytes = marshaler.encode_to_vec();
        prop_assert_eq!(bytes.len(), marshaler.size());
        prop_assert!(AnyValue::decode(bytes.as_slice()).is_ok());
    }

    #[test]
    fn prop_attribute_containers_size_matches(attributes in attributes()) {
        for kv in KeyValueMarshaler::from_attributes(&attributes) {
            prop_assert_eq!(kv.encode_to_vec().len(), kv.size());
        }
        let resource = ResourceMarshaler::new(&Resource::new(attributes));
        let mut fixed = vec![0u8; resource.size()];
        let mut sink: &mut [u8] = fixed.as_mut_slice();
        prop_assert!(resource.write_binary_to(&mut sink).is_ok());
        prop_assert!(sink.is_empty());
    }
}
