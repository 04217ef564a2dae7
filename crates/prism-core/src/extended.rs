//! # extended 模块说明
//!
//! ## 角色定位（Why）
//! - 日志记录等载体需要比扁平属性更丰富的值空间：嵌套映射与映射数组，嵌套深度不设上限；
//! - 同时仍需交给只理解扁平模型的下游，因此提供有损投影 [`ExtendedAttributes::as_attributes`]。
//!
//! ## 契约（What）
//! - 构建、排序、去重、墓碑规则与 [`Attributes`] 完全一致，两者共用同一压缩例程；
//! - 投影时丢弃嵌套映射与映射数组条目，不报错；
//! - 任意 [`Attributes`] 可无损转换为 [`ExtendedAttributes`]。

use alloc::{sync::Arc, vec::Vec};
use core::{
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
    slice,
};

use crate::{
    attributes::{AttributeKey, AttributeKind, AttributeType, AttributeValue, Attributes},
    compact::{self, Keyed},
    sealed::Sealed,
    value::Value,
};

/// 扩展属性类型：全部扁平属性类型外加嵌套映射与映射数组。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExtendedAttributeType {
    /// 字符串。
    String,
    /// 布尔。
    Boolean,
    /// 64 位整数。
    Long,
    /// 双精度浮点。
    Double,
    /// 字符串数组。
    StringArray,
    /// 布尔数组。
    BooleanArray,
    /// 整数数组。
    LongArray,
    /// 浮点数组。
    DoubleArray,
    /// 通用值。
    Value,
    /// 嵌套映射。
    ExtendedAttributes,
    /// 映射数组。
    ExtendedAttributesArray,
}

impl ExtendedAttributeType {
    /// 可投影到扁平模型时返回对应的 [`AttributeType`]。
    pub fn as_attribute_type(self) -> Option<AttributeType> {
        match self {
            ExtendedAttributeType::String => Some(AttributeType::String),
            ExtendedAttributeType::Boolean => Some(AttributeType::Boolean),
            ExtendedAttributeType::Long => Some(AttributeType::Long),
            ExtendedAttributeType::Double => Some(AttributeType::Double),
            ExtendedAttributeType::StringArray => Some(AttributeType::StringArray),
            ExtendedAttributeType::BooleanArray => Some(AttributeType::BooleanArray),
            ExtendedAttributeType::LongArray => Some(AttributeType::LongArray),
            ExtendedAttributeType::DoubleArray => Some(AttributeType::DoubleArray),
            ExtendedAttributeType::Value => Some(AttributeType::Value),
            ExtendedAttributeType::ExtendedAttributes
            | ExtendedAttributeType::ExtendedAttributesArray => None,
        }
    }
}

impl From<AttributeType> for ExtendedAttributeType {
    fn from(kind: AttributeType) -> Self {
        match kind {
            AttributeType::String => ExtendedAttributeType::String,
            AttributeType::Boolean => ExtendedAttributeType::Boolean,
            AttributeType::Long => ExtendedAttributeType::Long,
            AttributeType::Double => ExtendedAttributeType::Double,
            AttributeType::StringArray => ExtendedAttributeType::StringArray,
            AttributeType::BooleanArray => ExtendedAttributeType::BooleanArray,
            AttributeType::LongArray => ExtendedAttributeType::LongArray,
            AttributeType::DoubleArray => ExtendedAttributeType::DoubleArray,
            AttributeType::Value => ExtendedAttributeType::Value,
        }
    }
}

/// 扩展属性载荷。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ExtendedAttributeValue {
    /// 可投影到扁平模型的载荷。
    Attribute(AttributeValue),
    /// 嵌套映射。
    Map(ExtendedAttributes),
    /// 映射数组。
    MapArray(Arc<[ExtendedAttributes]>),
}

impl ExtendedAttributeValue {
    /// 载荷类型。
    pub fn attribute_type(&self) -> ExtendedAttributeType {
        match self {
            ExtendedAttributeValue::Attribute(value) => value.attribute_type().into(),
            ExtendedAttributeValue::Map(_) => ExtendedAttributeType::ExtendedAttributes,
            ExtendedAttributeValue::MapArray(_) => ExtendedAttributeType::ExtendedAttributesArray,
        }
    }

    /// 扁平载荷视图；嵌套映射返回 `None`。
    pub fn as_attribute_value(&self) -> Option<&AttributeValue> {
        match self {
            ExtendedAttributeValue::Attribute(value) => Some(value),
            ExtendedAttributeValue::Map(_) | ExtendedAttributeValue::MapArray(_) => None,
        }
    }

    /// 重建为通用值：映射成为键值列表，映射数组成为键值列表数组。
    pub fn to_value(&self) -> Value {
        match self {
            ExtendedAttributeValue::Attribute(value) => value.to_value(),
            ExtendedAttributeValue::Map(map) => map.to_value(),
            ExtendedAttributeValue::MapArray(maps) => {
                Value::array(maps.iter().map(ExtendedAttributes::to_value))
            }
        }
    }
}

/// 扩展属性载荷类型绑定，封闭实现。
pub trait ExtendedAttributeKind: Sealed + Sized {
    /// 声明类型。
    const TYPE: ExtendedAttributeType;

    /// 转换为存储载荷。
    fn into_extended_value(self) -> ExtendedAttributeValue;

    /// 从存储载荷读取，类型不匹配时返回 `None`。
    fn from_extended_value(value: &ExtendedAttributeValue) -> Option<Self>;
}

macro_rules! flat_extended_kind {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl ExtendedAttributeKind for $ty {
                const TYPE: ExtendedAttributeType = ExtendedAttributeType::$variant;

                fn into_extended_value(self) -> ExtendedAttributeValue {
                    ExtendedAttributeValue::Attribute(self.into_attribute_value())
                }

                fn from_extended_value(value: &ExtendedAttributeValue) -> Option<Self> {
                    value
                        .as_attribute_value()
                        .and_then(<$ty as AttributeKind>::from_attribute_value)
                }
            }
        )+
    };
}

flat_extended_kind!(
    alloc::string::String => String,
    bool => Boolean,
    i64 => Long,
    f64 => Double,
    Vec<alloc::string::String> => StringArray,
    Vec<bool> => BooleanArray,
    Vec<i64> => LongArray,
    Vec<f64> => DoubleArray,
);

impl ExtendedAttributeKind for Value {
    const TYPE: ExtendedAttributeType = ExtendedAttributeType::Value;

    fn into_extended_value(self) -> ExtendedAttributeValue {
        ExtendedAttributeValue::Attribute(AttributeValue::from_value(self))
    }

    fn from_extended_value(value: &ExtendedAttributeValue) -> Option<Self> {
        Some(value.to_value())
    }
}

impl Sealed for ExtendedAttributes {}

impl ExtendedAttributeKind for ExtendedAttributes {
    const TYPE: ExtendedAttributeType = ExtendedAttributeType::ExtendedAttributes;

    fn into_extended_value(self) -> ExtendedAttributeValue {
        ExtendedAttributeValue::Map(self)
    }

    fn from_extended_value(value: &ExtendedAttributeValue) -> Option<Self> {
        match value {
            ExtendedAttributeValue::Map(map) => Some(map.clone()),
            _ => None,
        }
    }
}

impl Sealed for Vec<ExtendedAttributes> {}

impl ExtendedAttributeKind for Vec<ExtendedAttributes> {
    const TYPE: ExtendedAttributeType = ExtendedAttributeType::ExtendedAttributesArray;

    fn into_extended_value(self) -> ExtendedAttributeValue {
        ExtendedAttributeValue::MapArray(self.into())
    }

    fn from_extended_value(value: &ExtendedAttributeValue) -> Option<Self> {
        match value {
            ExtendedAttributeValue::MapArray(maps) => Some(maps.to_vec()),
            _ => None,
        }
    }
}

/// 扩展属性键。
pub struct ExtendedAttributeKey<T> {
    name: Arc<str>,
    _kind: PhantomData<fn() -> T>,
}

impl<T: ExtendedAttributeKind> ExtendedAttributeKey<T> {
    /// 构造键；空键名在写入时被丢弃。
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            _kind: PhantomData,
        }
    }

    /// 键名。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 声明类型。
    pub fn attribute_type(&self) -> ExtendedAttributeType {
        T::TYPE
    }
}

impl ExtendedAttributeKey<ExtendedAttributes> {
    /// 嵌套映射键。
    pub fn map(name: impl Into<Arc<str>>) -> Self {
        Self::new(name)
    }
}

impl ExtendedAttributeKey<Vec<ExtendedAttributes>> {
    /// 映射数组键。
    pub fn map_array(name: impl Into<Arc<str>>) -> Self {
        Self::new(name)
    }
}

/// `ExtendedAttributeKey::map` 的简写。
pub fn map_key(name: impl Into<Arc<str>>) -> ExtendedAttributeKey<ExtendedAttributes> {
    ExtendedAttributeKey::map(name)
}

/// `ExtendedAttributeKey::map_array` 的简写。
pub fn map_array_key(name: impl Into<Arc<str>>) -> ExtendedAttributeKey<Vec<ExtendedAttributes>> {
    ExtendedAttributeKey::map_array(name)
}

impl<T: AttributeKind + ExtendedAttributeKind> From<&AttributeKey<T>> for ExtendedAttributeKey<T> {
    fn from(key: &AttributeKey<T>) -> Self {
        Self::new(Arc::clone(key.shared_name()))
    }
}

impl<T> Clone for ExtendedAttributeKey<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            _kind: PhantomData,
        }
    }
}

impl<T> PartialEq for ExtendedAttributeKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<T> Eq for ExtendedAttributeKey<T> {}

impl<T> Hash for ExtendedAttributeKey<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl<T: ExtendedAttributeKind> fmt::Debug for ExtendedAttributeKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedAttributeKey")
            .field("name", &self.name)
            .field("type", &T::TYPE)
            .finish()
    }
}

/// 扩展容器中的一个条目。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExtendedAttributeEntry {
    key: Arc<str>,
    value: ExtendedAttributeValue,
}

impl ExtendedAttributeEntry {
    /// 键名。
    pub fn key(&self) -> &str {
        &self.key
    }

    /// 载荷。
    pub fn value(&self) -> &ExtendedAttributeValue {
        &self.value
    }
}

impl Keyed for ExtendedAttributeEntry {
    fn slot_key(&self) -> &str {
        &self.key
    }
}

/// 支持嵌套映射的不可变属性容器。
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ExtendedAttributes {
    entries: Arc<[ExtendedAttributeEntry]>,
}

impl ExtendedAttributes {
    /// 空容器。
    pub fn empty() -> Self {
        Self::default()
    }

    /// 新建构建器。
    pub fn builder() -> ExtendedAttributesBuilder {
        ExtendedAttributesBuilder::default()
    }

    /// 按键名与声明类型查找。
    pub fn get<T: ExtendedAttributeKind>(&self, key: &ExtendedAttributeKey<T>) -> Option<T> {
        self.get_value(key.name())
            .and_then(|stored| T::from_extended_value(stored))
    }

    /// 仅按键名查找原始载荷。
    pub fn get_value(&self, name: &str) -> Option<&ExtendedAttributeValue> {
        self.entries
            .binary_search_by(|entry| entry.key().cmp(name))
            .ok()
            .map(|index| self.entries[index].value())
    }

    /// 条目数。
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空。
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按键名升序迭代。
    pub fn iter(&self) -> slice::Iter<'_, ExtendedAttributeEntry> {
        self.entries.iter()
    }

    /// 按键名升序回调每个条目。
    pub fn for_each(&self, mut visit: impl FnMut(&str, &ExtendedAttributeValue)) {
        for entry in self.entries.iter() {
            visit(entry.key(), entry.value());
        }
    }

    /// 派生构建器。
    pub fn to_builder(&self) -> ExtendedAttributesBuilder {
        ExtendedAttributesBuilder {
            slots: self.entries.iter().cloned().map(Some).collect(),
            removed: 0,
        }
    }

    /// 有损投影到扁平模型，丢弃嵌套映射与映射数组条目。
    pub fn as_attributes(&self) -> Attributes {
        self.entries
            .iter()
            .filter_map(|entry| {
                entry
                    .value
                    .as_attribute_value()
                    .map(|value| (Arc::clone(&entry.key), value.clone()))
            })
            .fold(Attributes::builder(), |builder, (name, value)| {
                builder.put_value(name, value)
            })
            .build()
    }

    /// 以通用值形式读取全部条目，生成保持键序的键值列表。
    pub fn to_value(&self) -> Value {
        Value::key_value_list(
            self.entries
                .iter()
                .map(|entry| (Arc::clone(&entry.key), entry.value.to_value())),
        )
    }
}

impl From<Attributes> for ExtendedAttributes {
    fn from(attributes: Attributes) -> Self {
        Self::from(&attributes)
    }
}

impl From<&Attributes> for ExtendedAttributes {
    fn from(attributes: &Attributes) -> Self {
        // 源容器已有序且去重，逐条包装即可保持不变量。
        Self {
            entries: attributes
                .iter()
                .map(|entry| ExtendedAttributeEntry {
                    key: Arc::clone(entry.shared_key()),
                    value: ExtendedAttributeValue::Attribute(entry.value().clone()),
                })
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ExtendedAttributes {
    type Item = &'a ExtendedAttributeEntry;
    type IntoIter = slice::Iter<'a, ExtendedAttributeEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for ExtendedAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|entry| (entry.key(), entry.value())))
            .finish()
    }
}

/// [`ExtendedAttributes`] 的累积阶段，规则同 [`crate::AttributesBuilder`]。
#[derive(Debug, Default)]
pub struct ExtendedAttributesBuilder {
    slots: Vec<Option<ExtendedAttributeEntry>>,
    removed: usize,
}

impl ExtendedAttributesBuilder {
    /// 写入类型化条目。
    pub fn put<T: ExtendedAttributeKind>(
        self,
        key: &ExtendedAttributeKey<T>,
        value: impl Into<T>,
    ) -> Self {
        self.put_extended_value(Arc::clone(&key.name), value.into().into_extended_value())
    }

    /// 以扁平属性键写入。
    pub fn put_attribute<T: AttributeKind>(self, key: &AttributeKey<T>, value: impl Into<T>) -> Self {
        self.put_extended_value(
            Arc::clone(key.shared_name()),
            ExtendedAttributeValue::Attribute(value.into().into_attribute_value()),
        )
    }

    /// 以键名写入未经类型化的载荷。
    pub fn put_extended_value(
        mut self,
        name: impl Into<Arc<str>>,
        value: ExtendedAttributeValue,
    ) -> Self {
        let name = name.into();
        if !name.is_empty() {
            self.slots.push(Some(ExtendedAttributeEntry { key: name, value }));
        }
        self
    }

    /// 追加扁平容器的全部条目。
    pub fn put_all(mut self, attributes: &Attributes) -> Self {
        self.slots.extend(attributes.iter().map(|entry| {
            Some(ExtendedAttributeEntry {
                key: Arc::clone(entry.shared_key()),
                value: ExtendedAttributeValue::Attribute(entry.value().clone()),
            })
        }));
        self
    }

    /// 删除与键名及声明类型均匹配的条目；通用值键仅比较键名。
    pub fn remove<T: ExtendedAttributeKind>(self, key: &ExtendedAttributeKey<T>) -> Self {
        let declared = T::TYPE;
        let name = Arc::clone(&key.name);
        self.remove_if(|entry_name, value| {
            entry_name == &*name
                && (declared == ExtendedAttributeType::Value || value.attribute_type() == declared)
        })
    }

    /// 删除所有满足谓词的条目。
    pub fn remove_if(
        mut self,
        mut predicate: impl FnMut(&str, &ExtendedAttributeValue) -> bool,
    ) -> Self {
        for slot in self.slots.iter_mut() {
            if slot
                .as_ref()
                .is_some_and(|entry| predicate(&entry.key, &entry.value))
            {
                *slot = None;
                self.removed += 1;
            }
        }
        self
    }

    /// 进入构建阶段并冻结。
    pub fn build(self) -> ExtendedAttributes {
        let entries: Vec<ExtendedAttributeEntry> = if self.slots.len() == 1 && self.removed == 0 {
            self.slots.into_iter().flatten().collect()
        } else {
            compact::compact(self.slots)
        };
        ExtendedAttributes {
            entries: entries.into(),
        }
    }
}
