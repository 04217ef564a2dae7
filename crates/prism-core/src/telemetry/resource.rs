use alloc::sync::Arc;

use crate::attributes::Attributes;

/// 产生遥测数据的实体。
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Resource {
    /// 资源属性。
    pub attributes: Attributes,
    /// 可选的 schema URL。
    pub schema_url: Option<Arc<str>>,
    /// 上游因限额丢弃的属性数。
    pub dropped_attributes_count: u32,
}

impl Resource {
    /// 以属性构造资源。
    pub fn new(attributes: Attributes) -> Self {
        Self {
            attributes,
            ..Self::default()
        }
    }

    /// 设置 schema URL。
    pub fn with_schema_url(mut self, schema_url: impl Into<Arc<str>>) -> Self {
        self.schema_url = Some(schema_url.into());
        self
    }
}

/// 产生遥测数据的插桩库标识。
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct InstrumentationScopeInfo {
    /// 插桩库名。
    pub name: Arc<str>,
    /// 可选版本号。
    pub version: Option<Arc<str>>,
    /// 可选 schema URL。
    pub schema_url: Option<Arc<str>>,
    /// 插桩库属性。
    pub attributes: Attributes,
}

impl InstrumentationScopeInfo {
    /// 以名称构造。
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// 设置版本号。
    pub fn with_version(mut self, version: impl Into<Arc<str>>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// 设置 schema URL。
    pub fn with_schema_url(mut self, schema_url: impl Into<Arc<str>>) -> Self {
        self.schema_url = Some(schema_url.into());
        self
    }

    /// 设置属性。
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }
}
