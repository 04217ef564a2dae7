//! # 资源属性白名单
//!
//! ## 意图（Why）
//! - 部署方常希望把 `service.name` 等少数资源属性直接附加在每个样本上，便于按服务聚合；
//!   同一资源在一次抓取中会被成百上千个样本引用，过滤结果需要缓存。
//!
//! ## 契约（What）
//! - 仅保留名称**精确**出现在白名单中的属性，原有顺序不变；
//! - 缓存以完整的资源属性集为键，条目达到上限时整表清空并记录 `debug!` 事件。

use prism_core::Attributes;

use dashmap::DashMap;

/// 带上限缓存的资源属性过滤器。
#[derive(Debug)]
pub struct ResourceAttributeFilter {
    allow_list: Vec<String>,
    capacity: usize,
    cache: DashMap<Attributes, Attributes>,
}

impl ResourceAttributeFilter {
    /// 以白名单与缓存上限构造过滤器，上限至少为 1。
    pub fn new(allow_list: impl IntoIterator<Item = String>, capacity: usize) -> Self {
        Self {
            allow_list: allow_list.into_iter().collect(),
            capacity: capacity.max(1),
            cache: DashMap::new(),
        }
    }

    /// 白名单是否为空；为空时调用方可跳过过滤。
    pub fn is_disabled(&self) -> bool {
        self.allow_list.is_empty()
    }

    /// 当前缓存的条目数。
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// 返回 `resource_attributes` 中位于白名单内的子集。
    pub fn filter(&self, resource_attributes: &Attributes) -> Attributes {
        if self.is_disabled() || resource_attributes.is_empty() {
            return Attributes::empty();
        }
        if let Some(hit) = self.cache.get(resource_attributes) {
            return hit.value().clone();
        }
        let filtered = resource_attributes
            .to_builder()
            .remove_if(|name, _| !self.allow_list.iter().any(|allowed| allowed == name))
            .build();
        if self.cache.len() >= self.capacity {
            tracing::debug!(
                capacity = self.capacity,
                "resource attribute cache reached its ceiling, clearing"
            );
            self.cache.clear();
        }
        self.cache.insert(resource_attributes.clone(), filtered.clone());
        filtered
    }
}
