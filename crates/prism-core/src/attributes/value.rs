//! 容器内部存储的属性载荷，以及 `Value` 与原始属性类型之间的收窄/加宽。

use alloc::sync::Arc;
use core::{
    hash::{Hash, Hasher},
    mem,
};

use super::AttributeType;
use crate::value::Value;

/// 属性载荷，每个 [`AttributeType`] 对应一个变体。
///
/// 浮点数与浮点数组按位模式参与相等与哈希，与 [`Value`] 保持一致。
#[derive(Clone, Debug)]
pub enum AttributeValue {
    /// 字符串。
    String(Arc<str>),
    /// 布尔值。
    Boolean(bool),
    /// 64 位整数。
    Long(i64),
    /// 双精度浮点。
    Double(f64),
    /// 字符串数组。
    StringArray(Arc<[Arc<str>]>),
    /// 布尔数组。
    BooleanArray(Arc<[bool]>),
    /// 整数数组。
    LongArray(Arc<[i64]>),
    /// 浮点数组。
    DoubleArray(Arc<[f64]>),
    /// 无法收窄的通用值。
    Value(Value),
}

impl AttributeValue {
    /// 载荷对应的属性类型。
    pub fn attribute_type(&self) -> AttributeType {
        match self {
            AttributeValue::String(_) => AttributeType::String,
            AttributeValue::Boolean(_) => AttributeType::Boolean,
            AttributeValue::Long(_) => AttributeType::Long,
            AttributeValue::Double(_) => AttributeType::Double,
            AttributeValue::StringArray(_) => AttributeType::StringArray,
            AttributeValue::BooleanArray(_) => AttributeType::BooleanArray,
            AttributeValue::LongArray(_) => AttributeType::LongArray,
            AttributeValue::DoubleArray(_) => AttributeType::DoubleArray,
            AttributeValue::Value(_) => AttributeType::Value,
        }
    }

    /// 将通用值收窄为最接近的原始属性类型。
    ///
    /// # 教案式说明
    /// - **契约 (What)**：标量字符串/布尔/整数/浮点收窄为对应标量；非空且元素同构的标量数组收窄为对应数组类型；
    ///   字节串、键值列表、`Empty`、空数组、异构数组与嵌套数组保持为 [`AttributeValue::Value`]；
    /// - **风险 (Trade-offs)**：形状不匹配属于可预期的情况，回退到通用表示而不是报错。
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(text) => AttributeValue::String(text),
            Value::Bool(flag) => AttributeValue::Boolean(flag),
            Value::Long(number) => AttributeValue::Long(number),
            Value::Double(number) => AttributeValue::Double(number),
            Value::Array(elements) => match narrow_array(&elements) {
                Some(narrowed) => narrowed,
                None => AttributeValue::Value(Value::Array(elements)),
            },
            other => AttributeValue::Value(other),
        }
    }

    /// 重建为通用值（加宽），每次调用都会重新构造，不做缓存。
    pub fn to_value(&self) -> Value {
        match self {
            AttributeValue::String(text) => Value::String(Arc::clone(text)),
            AttributeValue::Boolean(flag) => Value::Bool(*flag),
            AttributeValue::Long(number) => Value::Long(*number),
            AttributeValue::Double(number) => Value::Double(*number),
            AttributeValue::StringArray(items) => {
                Value::array(items.iter().map(|item| Value::String(Arc::clone(item))))
            }
            AttributeValue::BooleanArray(items) => Value::array(items.iter().copied()),
            AttributeValue::LongArray(items) => Value::array(items.iter().copied()),
            AttributeValue::DoubleArray(items) => Value::array(items.iter().copied()),
            AttributeValue::Value(value) => value.clone(),
        }
    }
}

fn narrow_array(elements: &[Value]) -> Option<AttributeValue> {
    let narrowed = match elements.first()? {
        Value::String(_) => AttributeValue::StringArray(
            elements
                .iter()
                .map(|element| match element {
                    Value::String(text) => Some(Arc::clone(text)),
                    _ => None,
                })
                .collect::<Option<Arc<[Arc<str>]>>>()?,
        ),
        Value::Bool(_) => AttributeValue::BooleanArray(
            elements
                .iter()
                .map(Value::as_bool)
                .collect::<Option<Arc<[bool]>>>()?,
        ),
        Value::Long(_) => AttributeValue::LongArray(
            elements
                .iter()
                .map(Value::as_long)
                .collect::<Option<Arc<[i64]>>>()?,
        ),
        Value::Double(_) => AttributeValue::DoubleArray(
            elements
                .iter()
                .map(Value::as_double)
                .collect::<Option<Arc<[f64]>>>()?,
        ),
        _ => return None,
    };
    Some(narrowed)
}

fn double_bits(items: &[f64]) -> impl Iterator<Item = u64> + '_ {
    items.iter().map(|item| item.to_bits())
}

impl PartialEq for AttributeValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AttributeValue::String(a), AttributeValue::String(b)) => a == b,
            (AttributeValue::Boolean(a), AttributeValue::Boolean(b)) => a == b,
            (AttributeValue::Long(a), AttributeValue::Long(b)) => a == b,
            (AttributeValue::Double(a), AttributeValue::Double(b)) => a.to_bits() == b.to_bits(),
            (AttributeValue::StringArray(a), AttributeValue::StringArray(b)) => a == b,
            (AttributeValue::BooleanArray(a), AttributeValue::BooleanArray(b)) => a == b,
            (AttributeValue::LongArray(a), AttributeValue::LongArray(b)) => a == b,
            (AttributeValue::DoubleArray(a), AttributeValue::DoubleArray(b)) => {
                a.len() == b.len() && double_bits(a).eq(double_bits(b))
            }
            (AttributeValue::Value(a), AttributeValue::Value(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for AttributeValue {}

impl Hash for AttributeValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        mem::discriminant(self).hash(state);
        match self {
            AttributeValue::String(text) => text.hash(state),
            AttributeValue::Boolean(flag) => flag.hash(state),
            AttributeValue::Long(number) => number.hash(state),
            AttributeValue::Double(number) => number.to_bits().hash(state),
            AttributeValue::StringArray(items) => items.hash(state),
            AttributeValue::BooleanArray(items) => items.hash(state),
            AttributeValue::LongArray(items) => items.hash(state),
            AttributeValue::DoubleArray(items) => {
                items.len().hash(state);
                double_bits(items).for_each(|bits| bits.hash(state));
            }
            AttributeValue::Value(value) => value.hash(state),
        }
    }
}

impl From<Value> for AttributeValue {
    fn from(value: Value) -> Self {
        AttributeValue::from_value(value)
    }
}
