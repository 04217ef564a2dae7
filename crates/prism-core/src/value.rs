//! 属性值的封闭标签联合。
//!
//! # 教案式说明
//! - **意图（Why）**：OTLP `AnyValue` 是一个封闭的 oneof，Rust 侧以 `enum` 表达并让每个消费方穷尽匹配，
//!   新增变体时所有分派点都会在编译期报错，而不是在运行期静默丢数据；
//! - **逻辑（How）**：字符串、数组、键值列表使用 `Arc` 共享不可变负载，`Clone` 为 O(1)；字节串使用
//!   [`bytes::Bytes`]，构造时防御性复制，对外只暴露只读切片；
//! - **契约（What）**：相等与哈希均按结构比较，浮点数按位模式比较，因此 `Value` 满足 `Eq + Hash`
//!   （`NaN == NaN`，`0.0 != -0.0`），可直接作为分组键或缓存键。

use alloc::{string::String, sync::Arc, vec::Vec};
use core::{
    fmt,
    hash::{Hash, Hasher},
    mem,
};

use bytes::Bytes;

use crate::{error::ModelError, json};

/// [`Value`] 的变体标签，便于在不解构负载的情况下分派。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// UTF-8 字符串。
    String,
    /// 布尔值。
    Bool,
    /// 64 位有符号整数。
    Long,
    /// 双精度浮点数。
    Double,
    /// 有序值序列。
    Array,
    /// 有序键值对序列，键允许重复。
    KeyValueList,
    /// 不可变字节串。
    Bytes,
    /// 显式空值。
    Empty,
}

/// 键值列表中的单个条目。
///
/// 该层**不**执行“后写覆盖”，重复的键按原样保留，交由消费方解释。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ValueEntry {
    key: Arc<str>,
    value: Value,
}

impl ValueEntry {
    /// 构造新的键值条目。
    pub fn new(key: impl Into<Arc<str>>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// 条目键名。
    pub fn key(&self) -> &str {
        &self.key
    }

    /// 条目值。
    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// 属性值的封闭标签联合。
///
/// # 契约说明（What）
/// - 标签与负载始终匹配，构造后不可变；
/// - `Array` 允许异构元素与任意嵌套；`KeyValueList` 保留插入顺序与重复键；
/// - `Empty` 表示显式缺省，ProtoJSON 渲染为 `null`，protobuf 编码为不设置任何 oneof 字段。
#[derive(Clone, Debug)]
pub enum Value {
    /// UTF-8 字符串。
    String(Arc<str>),
    /// 布尔值。
    Bool(bool),
    /// 64 位有符号整数。
    Long(i64),
    /// 双精度浮点数。
    Double(f64),
    /// 有序值序列。
    Array(Arc<[Value]>),
    /// 有序键值对序列。
    KeyValueList(Arc<[ValueEntry]>),
    /// 不可变字节串。
    Bytes(Bytes),
    /// 显式空值。
    Empty,
}

impl Value {
    /// 构造字符串值。
    pub fn string(value: impl Into<Arc<str>>) -> Self {
        Value::String(value.into())
    }

    /// 构造布尔值。
    pub const fn bool(value: bool) -> Self {
        Value::Bool(value)
    }

    /// 构造整数值。
    pub const fn long(value: i64) -> Self {
        Value::Long(value)
    }

    /// 构造浮点值。
    pub const fn double(value: f64) -> Self {
        Value::Double(value)
    }

    /// 构造空值。
    pub const fn empty() -> Self {
        Value::Empty
    }

    /// 以任意值序列构造数组，输入被复制进内部持有的不可变序列。
    pub fn array<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Value::Array(values.into_iter().map(Into::into).collect())
    }

    /// 以键值对序列构造键值列表。
    pub fn key_value_list<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Arc<str>>,
        V: Into<Value>,
    {
        Value::KeyValueList(
            entries
                .into_iter()
                .map(|(key, value)| ValueEntry::new(key, value))
                .collect(),
        )
    }

    /// 复制给定字节构造字节串值；调用方之后对原切片的修改不会影响该值。
    pub fn bytes(data: &[u8]) -> Self {
        Value::Bytes(Bytes::copy_from_slice(data))
    }

    /// 从原始字节构造字符串值。
    ///
    /// - **契约 (What)**：输入必须是合法 UTF-8，否则返回 [`ModelError::InvalidUtf8`]，不会产生任何值；
    /// - **说明 (How)**：复用输入缓冲，不做额外复制。
    pub fn string_from_utf8(raw: Vec<u8>) -> Result<Self, ModelError> {
        String::from_utf8(raw)
            .map(|text| Value::String(text.into()))
            .map_err(|err| ModelError::InvalidUtf8 {
                valid_up_to: err.utf8_error().valid_up_to(),
            })
    }

    /// 返回变体标签。
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::String(_) => ValueType::String,
            Value::Bool(_) => ValueType::Bool,
            Value::Long(_) => ValueType::Long,
            Value::Double(_) => ValueType::Double,
            Value::Array(_) => ValueType::Array,
            Value::KeyValueList(_) => ValueType::KeyValueList,
            Value::Bytes(_) => ValueType::Bytes,
            Value::Empty => ValueType::Empty,
        }
    }

    /// 字符串变体的只读视图。
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(text) => Some(text),
            _ => None,
        }
    }

    /// 布尔变体的值。
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// 整数变体的值。
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(value) => Some(*value),
            _ => None,
        }
    }

    /// 浮点变体的值。
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(value) => Some(*value),
            _ => None,
        }
    }

    /// 数组变体的只读视图。
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }

    /// 键值列表变体的只读视图。
    pub fn as_key_value_list(&self) -> Option<&[ValueEntry]> {
        match self {
            Value::KeyValueList(entries) => Some(entries),
            _ => None,
        }
    }

    /// 字节串变体的只读视图。
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(raw) => Some(raw),
            _ => None,
        }
    }

    /// 是否为显式空值。
    pub fn is_empty_value(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// 按编码语义渲染为字符串。
    ///
    /// # 教案式说明
    /// - **契约 (What)**：字符串返回其原始文本；其余变体返回 ProtoJSON 渲染结果，
    ///   因此 `NaN` 渲染为带引号的 `"NaN"`，字节串渲染为带引号的 base64；
    /// - **风险 (Trade-offs)**：该函数不会失败，每个标签都有定义好的渲染。
    pub fn as_string(&self) -> String {
        match self {
            Value::String(text) => String::from(&**text),
            other => other.to_proto_json(),
        }
    }

    /// 渲染为 ProtoJSON 文本，参见 [`json::encode`]。
    pub fn to_proto_json(&self) -> String {
        json::encode(self)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::KeyValueList(a), Value::KeyValueList(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Empty, Value::Empty) => true,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        mem::discriminant(self).hash(state);
        match self {
            Value::String(text) => text.hash(state),
            Value::Bool(value) => value.hash(state),
            Value::Long(value) => value.hash(state),
            Value::Double(value) => value.to_bits().hash(state),
            Value::Array(values) => values.hash(state),
            Value::KeyValueList(entries) => entries.hash(state),
            Value::Bytes(raw) => raw.hash(state),
            Value::Empty => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value.into())
    }
}

impl From<Arc<str>> for Value {
    fn from(value: Arc<str>) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Long(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Long(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Long(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::bytes(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::Array(values.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn equality_is_structural() {
        let left = Value::array([Value::long(1), Value::string("a")]);
        let right = Value::array([Value::long(1), Value::string("a")]);
        assert_eq!(left, right);
        assert_ne!(left, Value::array([Value::long(1)]));
        assert_ne!(Value::long(1), Value::double(1.0));
    }

    #[test]
    fn doubles_compare_by_bit_pattern() {
        assert_eq!(Value::double(f64::NAN), Value::double(f64::NAN));
        assert_ne!(Value::double(0.0), Value::double(-0.0));
    }

    #[test]
    fn bytes_are_copied_on_construction() {
        let mut raw = vec![1u8, 2, 3];
        let value = Value::bytes(&raw);
        raw[0] = 9;
        assert_eq!(value.as_bytes(), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn key_value_list_keeps_duplicate_keys() {
        let value = Value::key_value_list([("k", Value::long(1)), ("k", Value::long(2))]);
        let entries = value.as_key_value_list().expect("kvlist");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].value(), &Value::long(2));
    }

    #[test]
    fn invalid_utf8_is_rejected_at_construction() {
        let err = Value::string_from_utf8(vec![b'o', b'k', 0xff]).expect_err("invalid utf-8");
        assert_eq!(err, ModelError::InvalidUtf8 { valid_up_to: 2 });
    }

    #[test]
    fn as_string_uses_raw_text_only_for_strings() {
        assert_eq!(Value::string("plain").as_string(), "plain");
        assert_eq!(Value::double(f64::NAN).as_string(), "\"NaN\"");
        assert_eq!(Value::bytes(b"hi").as_string(), "\"aGk=\"");
        assert_eq!(Value::long(-7).as_string(), "-7");
        assert_eq!(Value::empty().as_string(), "null");
    }
}
