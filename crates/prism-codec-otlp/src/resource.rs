//! `Resource` 与 `InstrumentationScope` 消息编码器。
//!
//! 两者在批量导出时按组复用：每个分组只构造一次，再被该组下的全部 Span / LogRecord 共享。

use std::sync::Arc;

use bytes::BufMut;
use prism_core::telemetry::{InstrumentationScopeInfo, Resource};

use crate::{
    any_value::{KeyValueMarshaler, size_key_values},
    marshaler::Marshaler,
    wire::{self, ProtoField, WireType},
    writer::ProtoWriter,
};

const RESOURCE_ATTRIBUTES: ProtoField = ProtoField::new(1, WireType::Len);
const RESOURCE_DROPPED_ATTRIBUTES_COUNT: ProtoField = ProtoField::new(2, WireType::Varint);

const SCOPE_NAME: ProtoField = ProtoField::new(1, WireType::Len);
const SCOPE_VERSION: ProtoField = ProtoField::new(2, WireType::Len);
const SCOPE_ATTRIBUTES: ProtoField = ProtoField::new(3, WireType::Len);

/// `opentelemetry.proto.resource.v1.Resource` 编码器。
#[derive(Clone, Debug)]
pub struct ResourceMarshaler {
    attributes: Vec<KeyValueMarshaler>,
    dropped_attributes_count: u32,
    size: usize,
}

impl ResourceMarshaler {
    /// 由资源构造。
    pub fn new(resource: &Resource) -> Self {
        let attributes = KeyValueMarshaler::from_attributes(&resource.attributes);
        let size = size_key_values(RESOURCE_ATTRIBUTES, &attributes)
            + wire::size_uint32(
                RESOURCE_DROPPED_ATTRIBUTES_COUNT,
                resource.dropped_attributes_count,
            );
        Self {
            attributes,
            dropped_attributes_count: resource.dropped_attributes_count,
            size,
        }
    }
}

impl Marshaler for ResourceMarshaler {
    fn size(&self) -> usize {
        self.size
    }

    fn write_to<B: BufMut>(&self, writer: &mut ProtoWriter<'_, B>) {
        writer.serialize_repeated_message(RESOURCE_ATTRIBUTES, &self.attributes);
        writer.serialize_uint32(
            RESOURCE_DROPPED_ATTRIBUTES_COUNT,
            self.dropped_attributes_count,
        );
    }
}

/// `opentelemetry.proto.common.v1.InstrumentationScope` 编码器。
#[derive(Clone, Debug)]
pub struct InstrumentationScopeMarshaler {
    name: Arc<str>,
    version: Option<Arc<str>>,
    attributes: Vec<KeyValueMarshaler>,
    size: usize,
}

impl InstrumentationScopeMarshaler {
    /// 由插桩库信息构造。
    pub fn new(scope: &InstrumentationScopeInfo) -> Self {
        let attributes = KeyValueMarshaler::from_attributes(&scope.attributes);
        let size = wire::size_string(SCOPE_NAME, &scope.name)
            + scope
                .version
                .as_deref()
                .map_or(0, |version| wire::size_string(SCOPE_VERSION, version))
            + size_key_values(SCOPE_ATTRIBUTES, &attributes);
        Self {
            name: Arc::clone(&scope.name),
            version: scope.version.clone(),
            attributes,
            size,
        }
    }
}

impl Marshaler for InstrumentationScopeMarshaler {
    fn size(&self) -> usize {
        self.size
    }

    fn write_to<B: BufMut>(&self, writer: &mut ProtoWriter<'_, B>) {
        writer.serialize_string(SCOPE_NAME, &self.name);
        if let Some(version) = self.version.as_deref() {
            writer.serialize_string(SCOPE_VERSION, version);
        }
        writer.serialize_repeated_message(SCOPE_ATTRIBUTES, &self.attributes);
    }
}
