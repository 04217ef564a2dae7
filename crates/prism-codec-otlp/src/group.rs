//! 批量导出前按资源与插桩库分组。
//!
//! # 教案式说明
//! - **意图 (Why)**：同一批次中共享资源与插桩库的条目，元数据只需编码一次；
//! - **契约 (What)**：分组键为 `Resource` / `InstrumentationScopeInfo` 的完整结构相等；
//!   资源按首次出现顺序排列，资源内的插桩库同样按首次出现顺序排列，条目保持原始相对顺序。

use std::collections::HashMap;

use prism_core::telemetry::{InstrumentationScopeInfo, LogRecordData, Resource, SpanData};

/// 可参与分组的导出条目。
pub trait ExportItem {
    /// 所属资源。
    fn resource(&self) -> &Resource;
    /// 所属插桩库。
    fn scope(&self) -> &InstrumentationScopeInfo;
}

impl ExportItem for SpanData {
    fn resource(&self) -> &Resource {
        &self.resource
    }

    fn scope(&self) -> &InstrumentationScopeInfo {
        &self.scope
    }
}

impl ExportItem for LogRecordData {
    fn resource(&self) -> &Resource {
        &self.resource
    }

    fn scope(&self) -> &InstrumentationScopeInfo {
        &self.scope
    }
}

/// 共享同一插桩库的条目。
#[derive(Debug)]
pub struct ScopeGroup<'a, T> {
    /// 插桩库。
    pub scope: &'a InstrumentationScopeInfo,
    /// 条目，保持输入顺序。
    pub items: Vec<&'a T>,
}

/// 共享同一资源的插桩库分组。
#[derive(Debug)]
pub struct ResourceGroup<'a, T> {
    /// 资源。
    pub resource: &'a Resource,
    /// 插桩库分组，按首次出现顺序。
    pub scopes: Vec<ScopeGroup<'a, T>>,
}

/// 按资源、插桩库两级分组。
pub fn group_by_resource_and_scope<T: ExportItem>(items: &[T]) -> Vec<ResourceGroup<'_, T>> {
    let mut groups: Vec<ResourceGroup<'_, T>> = Vec::new();
    let mut resource_slots: HashMap<&Resource, usize> = HashMap::new();
    let mut scope_slots: HashMap<(usize, &InstrumentationScopeInfo), usize> = HashMap::new();

    for item in items {
        let resource = item.resource();
        let resource_slot = *resource_slots.entry(resource).or_insert_with(|| {
            groups.push(ResourceGroup {
                resource,
                scopes: Vec::new(),
            });
            groups.len() - 1
        });

        let scope = item.scope();
        let scopes = &mut groups[resource_slot].scopes;
        let scope_slot = *scope_slots
            .entry((resource_slot, scope))
            .or_insert_with(|| {
                scopes.push(ScopeGroup {
                    scope,
                    items: Vec::new(),
                });
                scopes.len() - 1
            });
        scopes[scope_slot].items.push(item);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::{Attributes, attributes::string_key};

    fn span(service: &str, scope: &str, name: &str) -> SpanData {
        SpanData {
            resource: Resource::new(Attributes::of(&string_key("service.name"), service)),
            scope: InstrumentationScopeInfo::new(scope),
            name: name.into(),
            ..SpanData::default()
        }
    }

    #[test]
    fn groups_follow_first_seen_order() {
        let spans = vec![
            span("b", "lib-1", "s1"),
            span("a", "lib-1", "s2"),
            span("b", "lib-2", "s3"),
            span("b", "lib-1", "s4"),
        ];
        let groups = group_by_resource_and_scope(&spans);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].resource, &spans[0].resource);
        let scopes: Vec<(&str, Vec<&str>)> = groups[0]
            .scopes
            .iter()
            .map(|group| {
                (
                    &*group.scope.name,
                    group.items.iter().map(|span| &*span.name).collect(),
                )
            })
            .collect();
        assert_eq!(
            scopes,
            vec![("lib-1", vec!["s1", "s4"]), ("lib-2", vec!["s3"])]
        );
        assert_eq!(groups[1].scopes[0].items.len(), 1);
    }
}
