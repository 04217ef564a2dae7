use alloc::{sync::Arc, vec::Vec};

use super::{AttributeEntry, AttributeKey, AttributeKind, AttributeType, AttributeValue, Attributes};
use crate::compact;

/// [`Attributes`] 的累积阶段。
///
/// # 教案式说明
/// - **意图 (Why)**：把排序与去重推迟到 [`build`](Self::build) 一次完成，累积期间 `put` 只是追加；
/// - **契约 (What)**：
///   - 空键名条目与 `None` 值被静默丢弃；
///   - `remove`/`remove_if` 仅作用于调用时已写入的条目，之后的 `put` 会重新写入同名条目；
///   - 同名条目在构建时按插入顺序“后写覆盖”，与声明类型无关；
/// - **风险 (Trade-offs)**：构建器不是线程安全的，也不应跨线程共享。
#[derive(Debug, Default)]
pub struct AttributesBuilder {
    slots: Vec<Option<AttributeEntry>>,
    removed: usize,
}

impl AttributesBuilder {
    /// 空构建器。
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_entries(entries: impl IntoIterator<Item = AttributeEntry>) -> Self {
        Self {
            slots: entries.into_iter().map(Some).collect(),
            removed: 0,
        }
    }

    /// 写入类型化条目。
    pub fn put<T: AttributeKind>(self, key: &AttributeKey<T>, value: impl Into<T>) -> Self {
        self.put_value(
            Arc::clone(key.shared_name()),
            value.into().into_attribute_value(),
        )
    }

    /// 写入可选条目，`None` 不会被存储。
    pub fn put_option<T: AttributeKind>(self, key: &AttributeKey<T>, value: Option<T>) -> Self {
        match value {
            Some(value) => self.put(key, value),
            None => self,
        }
    }

    /// 以键名写入未经类型化的载荷。
    pub fn put_value(mut self, name: impl Into<Arc<str>>, value: AttributeValue) -> Self {
        let name = name.into();
        if !name.is_empty() {
            self.slots.push(Some(AttributeEntry::new(name, value)));
        }
        self
    }

    /// 追加另一个容器的全部条目。
    pub fn put_all(mut self, attributes: &Attributes) -> Self {
        self.slots.extend(attributes.iter().cloned().map(Some));
        self
    }

    /// 删除与键名及声明类型均匹配的条目；通用值键仅比较键名。
    pub fn remove<T: AttributeKind>(self, key: &AttributeKey<T>) -> Self {
        let declared = key.attribute_type();
        let name = Arc::clone(key.shared_name());
        self.remove_if(|entry_name, value| {
            entry_name == &*name
                && (declared == AttributeType::Value || value.attribute_type() == declared)
        })
    }

    /// 删除所有满足谓词的条目。
    pub fn remove_if(mut self, mut predicate: impl FnMut(&str, &AttributeValue) -> bool) -> Self {
        for slot in self.slots.iter_mut() {
            let hit = slot
                .as_ref()
                .is_some_and(|entry| predicate(entry.key(), entry.value()));
            if hit {
                *slot = None;
                self.removed += 1;
            }
        }
        self
    }

    /// 当前已累积的槽位数（含重复，不含墓碑）。
    pub fn len(&self) -> usize {
        self.slots.len() - self.removed
    }

    /// 是否尚未累积任何有效条目。
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 进入构建阶段并冻结。
    pub fn build(self) -> Attributes {
        if self.slots.len() == 1 && self.removed == 0 {
            return Attributes::from_sorted(self.slots.into_iter().flatten().collect());
        }
        Attributes::from_sorted(compact::compact(self.slots))
    }
}
