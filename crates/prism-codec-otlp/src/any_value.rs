//! 属性到 `AnyValue` 线联合的类型驱动映射。
//!
//! # 教案式说明
//! - **意图 (Why)**：每个属性条目按声明类型选择 `AnyValue` 中恰好一个变体，字段号与线型固定为：
//!   `string_value=1`、`bool_value=2`、`int_value=3`、`double_value=4`、`array_value=5`、
//!   `kvlist_value=6`、`bytes_value=7`；
//! - **逻辑 (How)**：构造即完成尺寸计算，`size` 缓存于实例；嵌套数组/映射递归构造子编码器，尺寸自底向上累加；
//! - **契约 (What)**：
//!   - 顶层标量在默认值上省略负载（[`Omission::OmitDefaults`]），`KeyValue` 仍写出键与长度为 0 的值消息；
//!   - 数组元素总是写出值字段（[`Omission::Explicit`]），保证解码后长度与顺序不变；
//!   - `Value::Empty` 不设置任何 oneof 字段，编码为空消息。

use std::sync::Arc;

use bytes::{BufMut, Bytes};
use prism_core::{
    AttributeValue, Attributes, ExtendedAttributeValue, ExtendedAttributes, Value, ValueEntry,
};

use crate::{
    marshaler::Marshaler,
    wire::{self, ProtoField, WireType},
    writer::ProtoWriter,
};

const STRING_VALUE: ProtoField = ProtoField::new(1, WireType::Len);
const BOOL_VALUE: ProtoField = ProtoField::new(2, WireType::Varint);
const INT_VALUE: ProtoField = ProtoField::new(3, WireType::Varint);
const DOUBLE_VALUE: ProtoField = ProtoField::new(4, WireType::I64);
const ARRAY_VALUE: ProtoField = ProtoField::new(5, WireType::Len);
const KVLIST_VALUE: ProtoField = ProtoField::new(6, WireType::Len);
const BYTES_VALUE: ProtoField = ProtoField::new(7, WireType::Len);

const ARRAY_VALUES: ProtoField = ProtoField::new(1, WireType::Len);
const KVLIST_VALUES: ProtoField = ProtoField::new(1, WireType::Len);

const KEY_VALUE_KEY: ProtoField = ProtoField::new(1, WireType::Len);
const KEY_VALUE_VALUE: ProtoField = ProtoField::new(2, WireType::Len);

/// 标量默认值的省略策略。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Omission {
    /// 与 protobuf 标量默认值语义一致，省略空串、0、`false` 与零位模式浮点。
    #[default]
    OmitDefaults,
    /// 总是写出值字段。
    Explicit,
}

#[derive(Clone, Debug)]
enum AnyValueKind {
    String(Arc<str>),
    Bool(bool),
    Int(i64),
    Double(f64),
    Bytes(Bytes),
    Array(ArrayValueMarshaler),
    KeyValueList(KeyValueListMarshaler),
    Empty,
}

/// `AnyValue` 消息编码器。
#[derive(Clone, Debug)]
pub struct AnyValueMarshaler {
    kind: AnyValueKind,
    omission: Omission,
    size: usize,
}

impl AnyValueMarshaler {
    fn new(kind: AnyValueKind, omission: Omission) -> Self {
        let explicit = omission == Omission::Explicit;
        let size = match &kind {
            AnyValueKind::String(text) if explicit => wire::size_string_explicit(STRING_VALUE, text),
            AnyValueKind::String(text) => wire::size_string(STRING_VALUE, text),
            AnyValueKind::Bool(_) if explicit => wire::size_bool_explicit(BOOL_VALUE),
            AnyValueKind::Bool(flag) => wire::size_bool(BOOL_VALUE, *flag),
            AnyValueKind::Int(number) if explicit => wire::size_int64_explicit(INT_VALUE, *number),
            AnyValueKind::Int(number) => wire::size_int64(INT_VALUE, *number),
            AnyValueKind::Double(_) if explicit => wire::size_double_explicit(DOUBLE_VALUE),
            AnyValueKind::Double(number) => wire::size_double(DOUBLE_VALUE, *number),
            AnyValueKind::Bytes(raw) if explicit => wire::size_bytes_explicit(BYTES_VALUE, raw),
            AnyValueKind::Bytes(raw) => wire::size_bytes(BYTES_VALUE, raw),
            AnyValueKind::Array(array) => wire::size_message(ARRAY_VALUE, array.size()),
            AnyValueKind::KeyValueList(list) => wire::size_message(KVLIST_VALUE, list.size()),
            AnyValueKind::Empty => 0,
        };
        Self {
            kind,
            omission,
            size,
        }
    }

    /// 字符串值。
    pub fn string(value: impl Into<Arc<str>>, omission: Omission) -> Self {
        Self::new(AnyValueKind::String(value.into()), omission)
    }

    /// 整数值。
    pub fn int(value: i64, omission: Omission) -> Self {
        Self::new(AnyValueKind::Int(value), omission)
    }

    /// 由通用值构造，递归处理数组与键值列表。
    pub fn from_value(value: &Value, omission: Omission) -> Self {
        let kind = match value {
            Value::String(text) => AnyValueKind::String(Arc::clone(text)),
            Value::Bool(flag) => AnyValueKind::Bool(*flag),
            Value::Long(number) => AnyValueKind::Int(*number),
            Value::Double(number) => AnyValueKind::Double(*number),
            Value::Bytes(raw) => AnyValueKind::Bytes(raw.clone()),
            Value::Array(elements) => AnyValueKind::Array(ArrayValueMarshaler::from_values(elements)),
            Value::KeyValueList(entries) => {
                AnyValueKind::KeyValueList(KeyValueListMarshaler::from_entries(entries))
            }
            Value::Empty => AnyValueKind::Empty,
        };
        Self::new(kind, omission)
    }

    /// 由属性载荷构造（顶层语义，省略默认值）。
    pub fn from_attribute_value(value: &AttributeValue) -> Self {
        let kind = match value {
            AttributeValue::String(text) => AnyValueKind::String(Arc::clone(text)),
            AttributeValue::Boolean(flag) => AnyValueKind::Bool(*flag),
            AttributeValue::Long(number) => AnyValueKind::Int(*number),
            AttributeValue::Double(number) => AnyValueKind::Double(*number),
            AttributeValue::StringArray(items) => AnyValueKind::Array(ArrayValueMarshaler::new(
                items
                    .iter()
                    .map(|item| Self::new(AnyValueKind::String(Arc::clone(item)), Omission::Explicit))
                    .collect(),
            )),
            AttributeValue::BooleanArray(items) => AnyValueKind::Array(ArrayValueMarshaler::new(
                items
                    .iter()
                    .map(|item| Self::new(AnyValueKind::Bool(*item), Omission::Explicit))
                    .collect(),
            )),
            AttributeValue::LongArray(items) => AnyValueKind::Array(ArrayValueMarshaler::new(
                items
                    .iter()
                    .map(|item| Self::new(AnyValueKind::Int(*item), Omission::Explicit))
                    .collect(),
            )),
            AttributeValue::DoubleArray(items) => AnyValueKind::Array(ArrayValueMarshaler::new(
                items
                    .iter()
                    .map(|item| Self::new(AnyValueKind::Double(*item), Omission::Explicit))
                    .collect(),
            )),
            AttributeValue::Value(value) => return Self::from_value(value, Omission::OmitDefaults),
        };
        Self::new(kind, Omission::OmitDefaults)
    }

    /// 由扩展属性载荷构造：映射成为 `kvlist_value`，映射数组成为 `kvlist_value` 的数组。
    pub fn from_extended_value(value: &ExtendedAttributeValue) -> Self {
        match value {
            ExtendedAttributeValue::Attribute(value) => Self::from_attribute_value(value),
            ExtendedAttributeValue::Map(map) => Self::new(
                AnyValueKind::KeyValueList(KeyValueListMarshaler::from_extended_attributes(map)),
                Omission::OmitDefaults,
            ),
            ExtendedAttributeValue::MapArray(maps) => Self::new(
                AnyValueKind::Array(ArrayValueMarshaler::new(
                    maps.iter()
                        .map(|map| {
                            Self::new(
                                AnyValueKind::KeyValueList(
                                    KeyValueListMarshaler::from_extended_attributes(map),
                                ),
                                Omission::Explicit,
                            )
                        })
                        .collect(),
                )),
                Omission::OmitDefaults,
            ),
        }
    }

    /// 当前省略策略。
    pub fn omission(&self) -> Omission {
        self.omission
    }
}

impl Marshaler for AnyValueMarshaler {
    fn size(&self) -> usize {
        self.size
    }

    fn write_to<B: BufMut>(&self, writer: &mut ProtoWriter<'_, B>) {
        let explicit = self.omission == Omission::Explicit;
        match &self.kind {
            AnyValueKind::String(text) if explicit => writer.write_string(STRING_VALUE, text),
            AnyValueKind::String(text) => writer.serialize_string(STRING_VALUE, text),
            AnyValueKind::Bool(flag) if explicit => writer.write_bool(BOOL_VALUE, *flag),
            AnyValueKind::Bool(flag) => writer.serialize_bool(BOOL_VALUE, *flag),
            AnyValueKind::Int(number) if explicit => writer.write_int64(INT_VALUE, *number),
            AnyValueKind::Int(number) => writer.serialize_int64(INT_VALUE, *number),
            AnyValueKind::Double(number) if explicit => writer.write_double(DOUBLE_VALUE, *number),
            AnyValueKind::Double(number) => writer.serialize_double(DOUBLE_VALUE, *number),
            AnyValueKind::Bytes(raw) if explicit => writer.write_bytes(BYTES_VALUE, raw),
            AnyValueKind::Bytes(raw) => writer.serialize_bytes(BYTES_VALUE, raw),
            AnyValueKind::Array(array) => writer.serialize_message(ARRAY_VALUE, array),
            AnyValueKind::KeyValueList(list) => writer.serialize_message(KVLIST_VALUE, list),
            AnyValueKind::Empty => {}
        }
    }
}

/// `ArrayValue` 消息编码器。
#[derive(Clone, Debug)]
pub struct ArrayValueMarshaler {
    values: Vec<AnyValueMarshaler>,
    size: usize,
}

impl ArrayValueMarshaler {
    /// 由已构造的元素编码器组成数组。
    pub fn new(values: Vec<AnyValueMarshaler>) -> Self {
        let size = wire::size_repeated_message(ARRAY_VALUES, values.iter().map(Marshaler::size));
        Self { values, size }
    }

    /// 由通用值序列构造，元素总是写出值字段。
    pub fn from_values(values: &[Value]) -> Self {
        Self::new(
            values
                .iter()
                .map(|value| AnyValueMarshaler::from_value(value, Omission::Explicit))
                .collect(),
        )
    }
}

impl Marshaler for ArrayValueMarshaler {
    fn size(&self) -> usize {
        self.size
    }

    fn write_to<B: BufMut>(&self, writer: &mut ProtoWriter<'_, B>) {
        writer.serialize_repeated_message(ARRAY_VALUES, &self.values);
    }
}

/// `KeyValueList` 消息编码器。
#[derive(Clone, Debug)]
pub struct KeyValueListMarshaler {
    values: Vec<KeyValueMarshaler>,
    size: usize,
}

impl KeyValueListMarshaler {
    /// 由已构造的键值对组成。
    pub fn new(values: Vec<KeyValueMarshaler>) -> Self {
        let size = wire::size_repeated_message(KVLIST_VALUES, values.iter().map(Marshaler::size));
        Self { values, size }
    }

    /// 由键值列表条目构造，重复键原样保留。
    pub fn from_entries(entries: &[ValueEntry]) -> Self {
        Self::new(
            entries
                .iter()
                .map(|entry| {
                    KeyValueMarshaler::new(
                        entry.key(),
                        AnyValueMarshaler::from_value(entry.value(), Omission::OmitDefaults),
                    )
                })
                .collect(),
        )
    }

    /// 由扩展属性构造。
    pub fn from_extended_attributes(attributes: &ExtendedAttributes) -> Self {
        Self::new(KeyValueMarshaler::from_extended_attributes(attributes))
    }
}

impl Marshaler for KeyValueListMarshaler {
    fn size(&self) -> usize {
        self.size
    }

    fn write_to<B: BufMut>(&self, writer: &mut ProtoWriter<'_, B>) {
        writer.serialize_repeated_message(KVLIST_VALUES, &self.values);
    }
}

/// `KeyValue` 消息编码器。
///
/// 值消息总是写出，即使其长度为 0，解码端据此区分“键存在、值为默认”。
#[derive(Clone, Debug)]
pub struct KeyValueMarshaler {
    key: Arc<str>,
    value: AnyValueMarshaler,
    size: usize,
}

impl KeyValueMarshaler {
    /// 组合键与值编码器。
    pub fn new(key: impl Into<Arc<str>>, value: AnyValueMarshaler) -> Self {
        let key = key.into();
        let size = wire::size_string(KEY_VALUE_KEY, &key)
            + wire::size_message(KEY_VALUE_VALUE, value.size());
        Self { key, value, size }
    }

    /// 按容器顺序（键名升序）为每个条目构造编码器。
    pub fn from_attributes(attributes: &Attributes) -> Vec<Self> {
        attributes
            .iter()
            .map(|entry| {
                Self::new(
                    Arc::clone(entry.shared_key()),
                    AnyValueMarshaler::from_attribute_value(entry.value()),
                )
            })
            .collect()
    }

    /// 扩展属性版本，嵌套映射递归展开。
    pub fn from_extended_attributes(attributes: &ExtendedAttributes) -> Vec<Self> {
        attributes
            .iter()
            .map(|entry| {
                Self::new(
                    entry.key(),
                    AnyValueMarshaler::from_extended_value(entry.value()),
                )
            })
            .collect()
    }

    /// 键名。
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Marshaler for KeyValueMarshaler {
    fn size(&self) -> usize {
        self.size
    }

    fn write_to<B: BufMut>(&self, writer: &mut ProtoWriter<'_, B>) {
        writer.serialize_string(KEY_VALUE_KEY, &self.key);
        writer.serialize_message(KEY_VALUE_VALUE, &self.value);
    }
}

/// 一组 `KeyValue` 作为重复字段时的总尺寸。
pub(crate) fn size_key_values(field: ProtoField, values: &[KeyValueMarshaler]) -> usize {
    wire::size_repeated_message(field, values.iter().map(Marshaler::size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::attributes::{long_array_key, long_key, string_key};

    fn encode_single(attributes: &Attributes) -> Vec<u8> {
        let [only] = <[KeyValueMarshaler; 1]>::try_from(KeyValueMarshaler::from_attributes(attributes))
            .expect("one entry");
        only.encode_to_vec()
    }

    #[test]
    fn zero_long_omits_value_payload_but_keeps_key() {
        let bytes = encode_single(&Attributes::of(&long_key("k"), 0));
        assert_eq!(bytes, vec![0x0a, 0x01, b'k', 0x12, 0x00]);
    }

    #[test]
    fn string_attribute_uses_field_one() {
        let bytes = encode_single(&Attributes::of(&string_key("k"), "v"));
        assert_eq!(bytes, vec![0x0a, 0x01, b'k', 0x12, 0x03, 0x0a, 0x01, b'v']);
    }

    #[test]
    fn array_elements_write_zero_values() {
        let bytes = encode_single(&Attributes::of(&long_array_key("k"), vec![0, 1]));
        // KeyValue.value -> AnyValue.array_value -> ArrayValue.values x2
        assert_eq!(
            bytes,
            vec![
                0x0a, 0x01, b'k', 0x12, 0x0a, 0x2a, 0x08, 0x0a, 0x02, 0x18, 0x00, 0x0a, 0x02,
                0x18, 0x01,
            ]
        );
    }

    #[test]
    fn empty_value_is_an_empty_message() {
        let marshaler = AnyValueMarshaler::from_value(&Value::empty(), Omission::Explicit);
        assert_eq!(marshaler.size(), 0);
        let array = ArrayValueMarshaler::from_values(&[Value::empty(), Value::empty()]);
        assert_eq!(array.encode_to_vec(), vec![0x0a, 0x00, 0x0a, 0x00]);
    }

    #[test]
    fn negative_zero_double_is_encoded() {
        let marshaler = AnyValueMarshaler::from_value(&Value::double(-0.0), Omission::OmitDefaults);
        assert_eq!(marshaler.size(), 9);
    }
}
