//! # PrometheusConfig：曝光编码配置
//!
//! ## 意图（Why）
//! - 将单元后缀、scope/target 信息族、资源属性白名单与缓存上限集中为一份可序列化配置，
//!   使部署方可以用 TOML 文档描述编码行为，而无需改动代码；
//!
//! ## 契约（What）
//! - 所有字段可缺省，缺省值见 [`PrometheusConfig::default`]；
//! - 未知字段直接拒绝，避免拼写错误被静默忽略；
//! - 两个缓存上限必须大于零，由 [`PrometheusConfig::validate`] 校验。

use serde::Deserialize;

use crate::error::PrometheusError;

/// 名称缓存默认上限。
pub const DEFAULT_NAME_CACHE_CAPACITY: usize = 1024;
/// 资源属性白名单缓存默认上限。
pub const DEFAULT_RESOURCE_CACHE_CAPACITY: usize = 500;

/// Prometheus 曝光编码配置。
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrometheusConfig {
    /// 为 `true` 时不在指标名后追加单位后缀。
    pub without_units: bool,
    /// 为 `true` 时既不输出 `otel_scope_info` 族，也不附加 `otel_scope_*` 标签。
    pub without_scope_info: bool,
    /// 为 `true` 时不输出 `target_info` 族。
    pub without_target_info: bool,
    /// 需要复制到每个样本上的资源属性名（精确匹配）。
    pub resource_attribute_allow_list: Vec<String>,
    /// 标签名与指标名缓存的条目上限。
    pub name_cache_capacity: usize,
    /// 资源属性白名单过滤结果缓存的条目上限。
    pub resource_cache_capacity: usize,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            without_units: false,
            without_scope_info: false,
            without_target_info: false,
            resource_attribute_allow_list: Vec::new(),
            name_cache_capacity: DEFAULT_NAME_CACHE_CAPACITY,
            resource_cache_capacity: DEFAULT_RESOURCE_CACHE_CAPACITY,
        }
    }
}

impl PrometheusConfig {
    /// 从 TOML 文档解析并校验配置。
    ///
    /// # 教案式注释
    /// - **契约 (What)**：语法错误、未知字段与越界取值统一返回 [`PrometheusError::Config`]；
    /// - **前置条件**：文档顶层即为配置表，不嵌套在额外的 section 下。
    pub fn from_toml_str(document: &str) -> Result<Self, PrometheusError> {
        let config: Self =
            toml::from_str(document).map_err(|error| PrometheusError::config(error.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 校验取值范围。
    pub fn validate(&self) -> Result<(), PrometheusError> {
        if self.name_cache_capacity == 0 {
            return Err(PrometheusError::config(
                "name_cache_capacity must be greater than zero",
            ));
        }
        if self.resource_cache_capacity == 0 {
            return Err(PrometheusError::config(
                "resource_cache_capacity must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = PrometheusConfig::from_toml_str("").expect("empty document");
        assert_eq!(config, PrometheusConfig::default());
    }

    #[test]
    fn partial_document_overrides_named_fields() {
        let config = PrometheusConfig::from_toml_str(
            r#"
without_units = true
resource_attribute_allow_list = ["service.name", "host.name"]
name_cache_capacity = 16
"#,
        )
        .expect("valid document");
        assert!(config.without_units);
        assert!(!config.without_scope_info);
        assert_eq!(
            config.resource_attribute_allow_list,
            vec!["service.name".to_owned(), "host.name".to_owned()]
        );
        assert_eq!(config.name_cache_capacity, 16);
        assert_eq!(config.resource_cache_capacity, DEFAULT_RESOURCE_CACHE_CAPACITY);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error = PrometheusConfig::from_toml_str("without_unit = true").unwrap_err();
        assert!(matches!(error, PrometheusError::Config { .. }));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let error = PrometheusConfig::from_toml_str("resource_cache_capacity = 0").unwrap_err();
        match error {
            PrometheusError::Config { reason } => assert!(reason.contains("resource_cache_capacity")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
