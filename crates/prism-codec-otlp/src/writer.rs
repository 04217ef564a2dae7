use bytes::BufMut;

use crate::{
    marshaler::Marshaler,
    wire::{ProtoField, WireType},
};

/// 单趟写入汇点。
///
/// # 教案式说明
/// - **意图 (Why)**：写入阶段只负责“照尺寸落字节”，所有长度前缀都来自编码单元预先计算的 `size()`；
/// - **逻辑 (How)**：内部维护已写字节计数；[`serialize_message`](Self::serialize_message) 在写完嵌套消息后
///   以 `debug_assert_eq!` 核对实际字节数与前缀声明值，越早发现不一致越容易定位出错的编码单元；
/// - **契约 (What)**：`serialize_*` 与 [`crate::wire`] 中的 `size_*` 省略规则一致，`write_*` 总是写出字段。
///   调用方须保证底层缓冲容量足够，容量检查由 [`Marshaler::write_binary_to`] 在入口完成。
pub struct ProtoWriter<'a, B: BufMut> {
    buf: &'a mut B,
    written: usize,
}

impl<'a, B: BufMut> ProtoWriter<'a, B> {
    /// 包装底层缓冲。
    pub fn new(buf: &'a mut B) -> Self {
        Self { buf, written: 0 }
    }

    /// 自创建以来写出的字节数。
    pub fn written(&self) -> usize {
        self.written
    }

    fn put_varint(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.put_u8((value as u8) | 0x80);
            value >>= 7;
            self.written += 1;
        }
        self.buf.put_u8(value as u8);
        self.written += 1;
    }

    fn put_tag(&mut self, field: ProtoField) {
        self.put_varint(u64::from(field.tag()));
    }

    fn put_slice(&mut self, raw: &[u8]) {
        self.buf.put_slice(raw);
        self.written += raw.len();
    }

    fn debug_check(field: ProtoField, expected: WireType) {
        debug_assert_eq!(
            field.tag() & 0x07,
            expected as u32,
            "field {} written with the wrong wire type",
            field.number()
        );
    }

    /// 字符串字段，空串省略。
    pub fn serialize_string(&mut self, field: ProtoField, value: &str) {
        if !value.is_empty() {
            self.write_string(field, value);
        }
    }

    /// 字符串字段，总是写出。
    pub fn write_string(&mut self, field: ProtoField, value: &str) {
        self.write_bytes(field, value.as_bytes());
    }

    /// 字节串字段，空串省略。
    pub fn serialize_bytes(&mut self, field: ProtoField, value: &[u8]) {
        if !value.is_empty() {
            self.write_bytes(field, value);
        }
    }

    /// 字节串字段，总是写出。
    pub fn write_bytes(&mut self, field: ProtoField, value: &[u8]) {
        Self::debug_check(field, WireType::Len);
        self.put_tag(field);
        self.put_varint(value.len() as u64);
        self.put_slice(value);
    }

    /// `int64` 字段，0 省略。
    pub fn serialize_int64(&mut self, field: ProtoField, value: i64) {
        if value != 0 {
            self.write_int64(field, value);
        }
    }

    /// `int64` 字段，总是写出。
    pub fn write_int64(&mut self, field: ProtoField, value: i64) {
        Self::debug_check(field, WireType::Varint);
        self.put_tag(field);
        self.put_varint(value as u64);
    }

    /// `uint32` 字段，0 省略。
    pub fn serialize_uint32(&mut self, field: ProtoField, value: u32) {
        if value != 0 {
            Self::debug_check(field, WireType::Varint);
            self.put_tag(field);
            self.put_varint(u64::from(value));
        }
    }

    /// 枚举字段，0 省略。
    pub fn serialize_enum(&mut self, field: ProtoField, value: i32) {
        self.serialize_int64(field, i64::from(value));
    }

    /// `bool` 字段，`false` 省略。
    pub fn serialize_bool(&mut self, field: ProtoField, value: bool) {
        if value {
            self.write_bool(field, value);
        }
    }

    /// `bool` 字段，总是写出。
    pub fn write_bool(&mut self, field: ProtoField, value: bool) {
        Self::debug_check(field, WireType::Varint);
        self.put_tag(field);
        self.put_varint(u64::from(value));
    }

    /// `double` 字段，位模式为 0 时省略。
    pub fn serialize_double(&mut self, field: ProtoField, value: f64) {
        if value.to_bits() != 0 {
            self.write_double(field, value);
        }
    }

    /// `double` 字段，总是写出。
    pub fn write_double(&mut self, field: ProtoField, value: f64) {
        Self::debug_check(field, WireType::I64);
        self.put_tag(field);
        self.buf.put_f64_le(value);
        self.written += 8;
    }

    /// `fixed64` 字段，0 省略。
    pub fn serialize_fixed64(&mut self, field: ProtoField, value: u64) {
        if value != 0 {
            Self::debug_check(field, WireType::I64);
            self.put_tag(field);
            self.buf.put_u64_le(value);
            self.written += 8;
        }
    }

    /// `fixed32` 字段，0 省略。
    pub fn serialize_fixed32(&mut self, field: ProtoField, value: u32) {
        if value != 0 {
            Self::debug_check(field, WireType::I32);
            self.put_tag(field);
            self.buf.put_u32_le(value);
            self.written += 4;
        }
    }

    /// 嵌套消息字段，总是写出（空消息写出长度 0）。
    pub fn serialize_message<M: Marshaler>(&mut self, field: ProtoField, message: &M) {
        Self::debug_check(field, WireType::Len);
        let declared = message.size();
        self.put_tag(field);
        self.put_varint(declared as u64);
        let start = self.written;
        message.write_to(self);
        debug_assert_eq!(
            self.written - start,
            declared,
            "field {}: marshaler wrote a different number of bytes than its size()",
            field.number()
        );
    }

    /// 重复的嵌套消息字段，按切片顺序写出。
    pub fn serialize_repeated_message<M: Marshaler>(&mut self, field: ProtoField, messages: &[M]) {
        for message in messages {
            self.serialize_message(field, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_int64_uses_ten_byte_varint() {
        let mut out = Vec::new();
        let mut writer = ProtoWriter::new(&mut out);
        writer.write_int64(ProtoField::new(3, WireType::Varint), -1);
        assert_eq!(writer.written(), 11);
        assert_eq!(out[0], 0x18);
        assert_eq!(&out[1..10], &[0xff; 9]);
        assert_eq!(out[10], 0x01);
    }

    #[test]
    fn serialize_skips_defaults() {
        let mut out = Vec::new();
        let mut writer = ProtoWriter::new(&mut out);
        writer.serialize_string(ProtoField::new(1, WireType::Len), "");
        writer.serialize_int64(ProtoField::new(3, WireType::Varint), 0);
        writer.serialize_bool(ProtoField::new(2, WireType::Varint), false);
        writer.serialize_double(ProtoField::new(4, WireType::I64), 0.0);
        assert_eq!(writer.written(), 0);
        assert!(out.is_empty());
    }
}
