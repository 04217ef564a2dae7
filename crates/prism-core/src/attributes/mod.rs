//! # attributes 模块说明
//!
//! ## 角色定位（Why）
//! - 提供导出链路的标准属性容器：构造后不可变、按键名升序、键名唯一；
//! - 底层是排好序的连续数组而非哈希表，迭代零开销，查找走二分。
//!
//! ## 两阶段状态机（How）
//! - **累积阶段**：[`AttributesBuilder`] 持有带槽位的可变列表，`put` 追加，`remove`/`remove_if` 只打墓碑；
//! - **构建阶段**：[`AttributesBuilder::build`] 消费构建器，一次性完成稳定排序、墓碑过滤与“后写覆盖”去重，
//!   单条目且无删除时直接跳过排序；之后的 [`Attributes`] 冻结，派生构建器通过 [`Attributes::to_builder`] 复制。
//!
//! ## 契约（What）
//! - 键名为空的条目在写入时静默丢弃；`Option::None` 值不会被存储；
//! - `get` 同时匹配键名与声明类型；以 [`Value`] 类型键查找收窄后的条目时即时重建值（不缓存）；
//! - 通用 `Value` 写入时自动收窄，详见 [`AttributeValue::from_value`]。

mod builder;
mod key;
mod value;

use alloc::sync::Arc;
use core::{fmt, slice};

pub use builder::AttributesBuilder;
pub use key::{
    AttributeKey, AttributeKind, boolean_array_key, boolean_key, double_array_key, double_key,
    long_array_key, long_key, string_array_key, string_key, value_key,
};
pub use value::AttributeValue;

use crate::value::Value;

/// 属性类型的封闭枚举。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeType {
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
}

/// 冻结容器中的一个条目。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AttributeEntry {
    key: Arc<str>,
    value: AttributeValue,
}

impl AttributeEntry {
    pub(crate) fn new(key: Arc<str>, value: AttributeValue) -> Self {
        Self { key, value }
    }

    /// 键名。
    pub fn key(&self) -> &str {
        &self.key
    }

    /// 共享的键名句柄。
    pub fn shared_key(&self) -> &Arc<str> {
        &self.key
    }

    /// 载荷。
    pub fn value(&self) -> &AttributeValue {
        &self.value
    }

    /// 存储类型。
    pub fn attribute_type(&self) -> AttributeType {
        self.value.attribute_type()
    }
}

impl crate::compact::Keyed for AttributeEntry {
    fn slot_key(&self) -> &str {
        &self.key
    }
}

/// 不可变、有序、去重的属性容器。
///
/// `Clone` 为 O(1)；相等与哈希按条目结构比较，可直接作为分组或缓存键。
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Attributes {
    entries: Arc<[AttributeEntry]>,
}

impl Attributes {
    /// 空容器。
    pub fn empty() -> Self {
        Self::default()
    }

    /// 新建构建器。
    pub fn builder() -> AttributesBuilder {
        AttributesBuilder::new()
    }

    /// 单条目容器。
    pub fn of<T: AttributeKind>(key: &AttributeKey<T>, value: impl Into<T>) -> Self {
        Self::builder().put(key, value).build()
    }

    /// 双条目容器；键名相同时后者覆盖前者。
    pub fn of2<A: AttributeKind, B: AttributeKind>(
        first_key: &AttributeKey<A>,
        first_value: impl Into<A>,
        second_key: &AttributeKey<B>,
        second_value: impl Into<B>,
    ) -> Self {
        Self::builder()
            .put(first_key, first_value)
            .put(second_key, second_value)
            .build()
    }

    pub(crate) fn from_sorted(entries: alloc::vec::Vec<AttributeEntry>) -> Self {
        Self {
            entries: entries.into(),
        }
    }

    /// 按键名与声明类型查找。
    pub fn get<T: AttributeKind>(&self, key: &AttributeKey<T>) -> Option<T> {
        self.get_value(key.name())
            .and_then(|stored| T::from_attribute_value(stored))
    }

    /// 仅按键名查找原始载荷。
    pub fn get_value(&self, name: &str) -> Option<&AttributeValue> {
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
    pub fn iter(&self) -> slice::Iter<'_, AttributeEntry> {
        self.entries.iter()
    }

    /// 按键名升序回调每个条目。
    pub fn for_each(&self, mut visit: impl FnMut(&str, &AttributeValue)) {
        for entry in self.entries.iter() {
            visit(entry.key(), entry.value());
        }
    }

    /// 条目切片视图。
    pub fn as_slice(&self) -> &[AttributeEntry] {
        &self.entries
    }

    /// 以当前内容为起点派生新的构建器（复制，不影响自身）。
    pub fn to_builder(&self) -> AttributesBuilder {
        AttributesBuilder::from_entries(self.entries.iter().cloned())
    }

    /// 以通用值形式读取全部条目，生成保持键序的键值列表。
    pub fn to_value(&self) -> Value {
        Value::key_value_list(
            self.entries
                .iter()
                .map(|entry| (Arc::clone(entry.shared_key()), entry.value().to_value())),
        )
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a AttributeEntry;
    type IntoIter = slice::Iter<'a, AttributeEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|entry| (entry.key(), entry.value())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::{string::String, vec, vec::Vec};

    #[test]
    fn duplicate_names_keep_last_write_across_types() {
        let attributes = Attributes::of2(&string_key("k"), "a", &long_key("k"), 5);
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes.get(&long_key("k")), Some(5));
        assert_eq!(attributes.get(&string_key("k")), None);
    }

    #[test]
    fn iteration_is_sorted_by_name() {
        let attributes = Attributes::builder()
            .put(&string_key("zeta"), "z")
            .put(&boolean_key("alpha"), true)
            .put(&double_key("mid"), 0.5)
            .build();
        let names: Vec<&str> = attributes.iter().map(AttributeEntry::key).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn value_key_is_narrowed_and_reconstructed() {
        // Why: 同构整数数组写入通用键后应收窄为整数数组，同时仍能以通用键读回。
        let attributes = Attributes::builder()
            .put(
                &value_key("k"),
                Value::array([Value::long(1), Value::long(2)]),
            )
            .build();
        assert_eq!(attributes.get(&long_array_key("k")), Some(vec![1, 2]));
        assert_eq!(
            attributes.get(&value_key("k")),
            Some(Value::array([Value::long(1), Value::long(2)]))
        );
    }

    #[test]
    fn generic_entries_are_invisible_to_primitive_keys() {
        let attributes = Attributes::of(&value_key("blob"), Value::bytes(b"x"));
        assert_eq!(attributes.get(&string_key("blob")), None);
        assert_eq!(attributes.get(&value_key("blob")), Some(Value::bytes(b"x")));
    }

    #[test]
    fn derived_builder_does_not_mutate_source() {
        let base = Attributes::of(&string_key("service"), String::from("api"));
        let derived = base.to_builder().put(&long_key("port"), 80).build();
        assert_eq!(base.len(), 1);
        assert_eq!(derived.len(), 2);
        assert_eq!(derived.get(&string_key("service")).as_deref(), Some("api"));
    }

    #[test]
    fn for_each_visits_entries_in_order() {
        let attributes = Attributes::of2(&long_key("b"), 2, &long_key("a"), 1);
        let mut seen = Vec::new();
        attributes.for_each(|name, value| seen.push((String::from(name), value.clone())));
        assert_eq!(
            seen,
            vec![
                (String::from("a"), AttributeValue::Long(1)),
                (String::from("b"), AttributeValue::Long(2)),
            ]
        );
    }
}
