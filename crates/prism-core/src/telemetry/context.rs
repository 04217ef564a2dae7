//! W3C Trace Context 标识。
//!
//! 十六进制渲染固定为小写；全零标识视为无效，编码器据此决定是否写出对应字段。

use alloc::{string::String, sync::Arc};
use core::fmt;

fn write_hex(f: &mut fmt::Formatter<'_>, raw: &[u8]) -> fmt::Result {
    raw.iter().try_for_each(|byte| write!(f, "{byte:02x}"))
}

/// 16 字节 Trace 标识。
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TraceId([u8; 16]);

impl TraceId {
    /// 全零的无效标识。
    pub const INVALID: TraceId = TraceId([0; 16]);

    /// 由原始字节构造。
    pub const fn from_bytes(raw: [u8; 16]) -> Self {
        TraceId(raw)
    }

    /// 原始字节。
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// 是否非全零。
    pub fn is_valid(&self) -> bool {
        self.0 != [0; 16]
    }

    /// 小写十六进制。
    pub fn to_hex(&self) -> String {
        alloc::format!("{self}")
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, &self.0)
    }
}

impl fmt::Debug for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TraceId({self})")
    }
}

/// 8 字节 Span 标识。
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SpanId([u8; 8]);

impl SpanId {
    /// 全零的无效标识。
    pub const INVALID: SpanId = SpanId([0; 8]);

    /// 由原始字节构造。
    pub const fn from_bytes(raw: [u8; 8]) -> Self {
        SpanId(raw)
    }

    /// 原始字节。
    pub const fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// 是否非全零。
    pub fn is_valid(&self) -> bool {
        self.0 != [0; 8]
    }

    /// 小写十六进制。
    pub fn to_hex(&self) -> String {
        alloc::format!("{self}")
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, &self.0)
    }
}

impl fmt::Debug for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpanId({self})")
    }
}

/// W3C trace-flags 字节。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TraceFlags(u8);

impl TraceFlags {
    /// 采样位。
    pub const SAMPLED: TraceFlags = TraceFlags(0x01);

    /// 由原始字节构造。
    pub const fn new(bits: u8) -> Self {
        TraceFlags(bits)
    }

    /// 原始字节。
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// 是否已采样。
    pub const fn is_sampled(self) -> bool {
        self.0 & Self::SAMPLED.0 != 0
    }
}

/// 可跨进程传播的 Span 上下文。
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SpanContext {
    /// Trace 标识。
    pub trace_id: TraceId,
    /// Span 标识。
    pub span_id: SpanId,
    /// trace-flags。
    pub trace_flags: TraceFlags,
    /// W3C tracestate 头部文本，空串表示无。
    pub trace_state: Arc<str>,
    /// 是否来自远端传播。
    pub remote: bool,
}

impl SpanContext {
    /// 本地上下文。
    pub fn new(trace_id: TraceId, span_id: SpanId, trace_flags: TraceFlags) -> Self {
        Self {
            trace_id,
            span_id,
            trace_flags,
            trace_state: Arc::from(""),
            remote: false,
        }
    }

    /// 两个标识均非全零。
    pub fn is_valid(&self) -> bool {
        self.trace_id.is_valid() && self.span_id.is_valid()
    }
}
