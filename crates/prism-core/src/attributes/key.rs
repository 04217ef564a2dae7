//! 类型化属性键与载荷类型绑定。

use alloc::{string::String, sync::Arc, vec::Vec};
use core::{
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
};

use super::{AttributeType, AttributeValue};
use crate::{error::ModelError, sealed::Sealed, value::Value};

/// 将 Rust 载荷类型绑定到封闭的 [`AttributeType`]。
///
/// # 教案式说明
/// - **意图 (Why)**：`AttributeKey<T>` 在编译期携带声明类型，`put`/`get` 因而无需运行期类型参数；
/// - **契约 (What)**：该 trait 是封闭的，仅为九种属性类型对应的载荷实现；
///   `from_attribute_value` 在存储类型与声明类型不匹配时返回 `None`，唯一例外是 [`Value`]，
///   它可以从任意已存储条目重建（加宽）。
pub trait AttributeKind: Sealed + Sized {
    /// 声明的属性类型。
    const TYPE: AttributeType;

    /// 转换为存储载荷。
    fn into_attribute_value(self) -> AttributeValue;

    /// 从存储载荷读取，类型不匹配时返回 `None`。
    fn from_attribute_value(value: &AttributeValue) -> Option<Self>;
}

macro_rules! primitive_kind {
    ($ty:ty, $variant:ident, |$input:ident| $into:expr, |$stored:ident| $from:expr) => {
        impl Sealed for $ty {}

        impl AttributeKind for $ty {
            const TYPE: AttributeType = AttributeType::$variant;

            fn into_attribute_value(self) -> AttributeValue {
                let $input = self;
                AttributeValue::$variant($into)
            }

            fn from_attribute_value(value: &AttributeValue) -> Option<Self> {
                match value {
                    AttributeValue::$variant($stored) => Some($from),
                    _ => None,
                }
            }
        }
    };
}

primitive_kind!(String, String, |v| v.into(), |s| String::from(&**s));
primitive_kind!(bool, Boolean, |v| v, |b| *b);
primitive_kind!(i64, Long, |v| v, |n| *n);
primitive_kind!(f64, Double, |v| v, |n| *n);
primitive_kind!(
    Vec<String>,
    StringArray,
    |v| v.into_iter().map(Arc::<str>::from).collect(),
    |items| items.iter().map(|item| String::from(&**item)).collect()
);
primitive_kind!(Vec<bool>, BooleanArray, |v| v.into(), |items| items.to_vec());
primitive_kind!(Vec<i64>, LongArray, |v| v.into(), |items| items.to_vec());
primitive_kind!(Vec<f64>, DoubleArray, |v| v.into(), |items| items.to_vec());

impl Sealed for Value {}

impl AttributeKind for Value {
    const TYPE: AttributeType = AttributeType::Value;

    fn into_attribute_value(self) -> AttributeValue {
        AttributeValue::from_value(self)
    }

    fn from_attribute_value(value: &AttributeValue) -> Option<Self> {
        Some(value.to_value())
    }
}

/// 类型化属性键：键名 + 编译期声明类型。
///
/// 去重只比较键名；查找同时比较键名与声明类型。空键名的键可以构造，但在写入容器时被静默丢弃；
/// 需要显式校验时使用 [`AttributeKey::try_new`]。
pub struct AttributeKey<T> {
    name: Arc<str>,
    _kind: PhantomData<fn() -> T>,
}

impl<T: AttributeKind> AttributeKey<T> {
    /// 构造键，不校验键名。
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            _kind: PhantomData,
        }
    }

    /// 构造键并拒绝空键名。
    pub fn try_new(name: impl Into<Arc<str>>) -> Result<Self, ModelError> {
        let key = Self::new(name);
        if key.name.is_empty() {
            return Err(ModelError::EmptyKey);
        }
        Ok(key)
    }

    /// 键名。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 共享的键名句柄。
    pub fn shared_name(&self) -> &Arc<str> {
        &self.name
    }

    /// 声明类型。
    pub fn attribute_type(&self) -> AttributeType {
        T::TYPE
    }
}

impl AttributeKey<String> {
    /// 字符串键。
    pub fn string(name: impl Into<Arc<str>>) -> Self {
        Self::new(name)
    }
}

impl AttributeKey<bool> {
    /// 布尔键。
    pub fn boolean(name: impl Into<Arc<str>>) -> Self {
        Self::new(name)
    }
}

impl AttributeKey<i64> {
    /// 整数键。
    pub fn long(name: impl Into<Arc<str>>) -> Self {
        Self::new(name)
    }
}

impl AttributeKey<f64> {
    /// 浮点键。
    pub fn double(name: impl Into<Arc<str>>) -> Self {
        Self::new(name)
    }
}

impl AttributeKey<Vec<String>> {
    /// 字符串数组键。
    pub fn string_array(name: impl Into<Arc<str>>) -> Self {
        Self::new(name)
    }
}

impl AttributeKey<Vec<bool>> {
    /// 布尔数组键。
    pub fn boolean_array(name: impl Into<Arc<str>>) -> Self {
        Self::new(name)
    }
}

impl AttributeKey<Vec<i64>> {
    /// 整数数组键。
    pub fn long_array(name: impl Into<Arc<str>>) -> Self {
        Self::new(name)
    }
}

impl AttributeKey<Vec<f64>> {
    /// 浮点数组键。
    pub fn double_array(name: impl Into<Arc<str>>) -> Self {
        Self::new(name)
    }
}

impl AttributeKey<Value> {
    /// 通用值键，写入时会尝试收窄为原始类型。
    pub fn value(name: impl Into<Arc<str>>) -> Self {
        Self::new(name)
    }
}

/// `AttributeKey::string` 的简写。
pub fn string_key(name: impl Into<Arc<str>>) -> AttributeKey<String> {
    AttributeKey::string(name)
}

/// `AttributeKey::boolean` 的简写。
pub fn boolean_key(name: impl Into<Arc<str>>) -> AttributeKey<bool> {
    AttributeKey::boolean(name)
}

/// `AttributeKey::long` 的简写。
pub fn long_key(name: impl Into<Arc<str>>) -> AttributeKey<i64> {
    AttributeKey::long(name)
}

/// `AttributeKey::double` 的简写。
pub fn double_key(name: impl Into<Arc<str>>) -> AttributeKey<f64> {
    AttributeKey::double(name)
}

/// `AttributeKey::string_array` 的简写。
pub fn string_array_key(name: impl Into<Arc<str>>) -> AttributeKey<Vec<String>> {
    AttributeKey::string_array(name)
}

/// `AttributeKey::boolean_array` 的简写。
pub fn boolean_array_key(name: impl Into<Arc<str>>) -> AttributeKey<Vec<bool>> {
    AttributeKey::boolean_array(name)
}

/// `AttributeKey::long_array` 的简写。
pub fn long_array_key(name: impl Into<Arc<str>>) -> AttributeKey<Vec<i64>> {
    AttributeKey::long_array(name)
}

/// `AttributeKey::double_array` 的简写。
pub fn double_array_key(name: impl Into<Arc<str>>) -> AttributeKey<Vec<f64>> {
    AttributeKey::double_array(name)
}

/// `AttributeKey::value` 的简写。
pub fn value_key(name: impl Into<Arc<str>>) -> AttributeKey<Value> {
    AttributeKey::value(name)
}

impl<T> Clone for AttributeKey<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            _kind: PhantomData,
        }
    }
}

impl<T> PartialEq for AttributeKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<T> Eq for AttributeKey<T> {}

impl<T> Hash for AttributeKey<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl<T: AttributeKind> fmt::Debug for AttributeKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeKey")
            .field("name", &self.name)
            .field("type", &T::TYPE)
            .finish()
    }
}
