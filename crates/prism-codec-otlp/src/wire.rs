//! protobuf 线格式原语：线型、字段常量与尺寸计算。
//!
//! # 教案式说明
//! - **意图 (Why)**：尺寸计算与写入必须对同一字段给出一致结论，因此把“是否省略默认值”集中在这里定义，
//!   [`crate::ProtoWriter`] 的 `serialize_*` 方法与本模块的 `size_*` 函数一一对应；
//! - **契约 (What)**：
//!   - `size_*` 在 protobuf 会省略的默认值（空串、0、`false`、位模式为 0 的浮点）上返回 0；
//!   - `size_*_explicit` 总是计入字段，用于数组元素等必须保留位置的场合；
//!   - `size_message` 总是计入字段，即使消息体为空（长度前缀为 0）。

/// protobuf 线型。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    /// 变长整数。
    Varint = 0,
    /// 定长 8 字节。
    I64 = 1,
    /// 长度前缀。
    Len = 2,
    /// 定长 4 字节。
    I32 = 5,
}

/// 字段号与预先合成的 tag。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProtoField {
    number: u32,
    tag: u32,
}

impl ProtoField {
    /// 在编译期合成 `(number << 3) | wire_type`。
    pub const fn new(number: u32, wire_type: WireType) -> Self {
        Self {
            number,
            tag: (number << 3) | wire_type as u32,
        }
    }

    /// 字段号。
    pub const fn number(self) -> u32 {
        self.number
    }

    /// tag 值。
    pub const fn tag(self) -> u32 {
        self.tag
    }

    /// tag 的 varint 编码长度。
    pub const fn tag_len(self) -> usize {
        varint_len(self.tag as u64)
    }
}

/// `value` 的 varint 编码字节数（1..=10）。
pub const fn varint_len(value: u64) -> usize {
    // 等价于 ceil(bit_width / 7)，`| 1` 让 0 也占 1 字节。
    ((((value | 1).leading_zeros() ^ 63) * 9 + 73) / 64) as usize
}

/// 字段 tag 的编码字节数。
pub const fn tag_len(field: ProtoField) -> usize {
    field.tag_len()
}

/// 长度前缀字段（tag + 长度 + 负载）的总字节数。
pub const fn size_len_delimited(field: ProtoField, len: usize) -> usize {
    field.tag_len() + varint_len(len as u64) + len
}

/// 字符串字段，空串省略。
pub fn size_string(field: ProtoField, value: &str) -> usize {
    if value.is_empty() {
        0
    } else {
        size_len_delimited(field, value.len())
    }
}

/// 字符串字段，总是写出。
pub fn size_string_explicit(field: ProtoField, value: &str) -> usize {
    size_len_delimited(field, value.len())
}

/// 字节串字段，空串省略。
pub fn size_bytes(field: ProtoField, value: &[u8]) -> usize {
    if value.is_empty() {
        0
    } else {
        size_len_delimited(field, value.len())
    }
}

/// 字节串字段，总是写出。
pub fn size_bytes_explicit(field: ProtoField, value: &[u8]) -> usize {
    size_len_delimited(field, value.len())
}

/// `int64` 字段，0 省略；负数按 64 位补码编码为 10 字节。
pub fn size_int64(field: ProtoField, value: i64) -> usize {
    if value == 0 {
        0
    } else {
        size_int64_explicit(field, value)
    }
}

/// `int64` 字段，总是写出。
pub fn size_int64_explicit(field: ProtoField, value: i64) -> usize {
    field.tag_len() + varint_len(value as u64)
}

/// `uint32` 字段，0 省略。
pub fn size_uint32(field: ProtoField, value: u32) -> usize {
    if value == 0 {
        0
    } else {
        field.tag_len() + varint_len(u64::from(value))
    }
}

/// 枚举字段，0 省略。
pub fn size_enum(field: ProtoField, value: i32) -> usize {
    size_int64(field, i64::from(value))
}

/// `bool` 字段，`false` 省略。
pub fn size_bool(field: ProtoField, value: bool) -> usize {
    if value { size_bool_explicit(field) } else { 0 }
}

/// `bool` 字段，总是写出。
pub fn size_bool_explicit(field: ProtoField) -> usize {
    field.tag_len() + 1
}

/// `double` 字段，位模式为 0 时省略（`-0.0` 仍会写出）。
pub fn size_double(field: ProtoField, value: f64) -> usize {
    if value.to_bits() == 0 {
        0
    } else {
        size_double_explicit(field)
    }
}

/// `double` 字段，总是写出。
pub fn size_double_explicit(field: ProtoField) -> usize {
    field.tag_len() + 8
}

/// `fixed64` 字段，0 省略。
pub fn size_fixed64(field: ProtoField, value: u64) -> usize {
    if value == 0 { 0 } else { field.tag_len() + 8 }
}

/// `fixed32` 字段，0 省略。
pub fn size_fixed32(field: ProtoField, value: u32) -> usize {
    if value == 0 { 0 } else { field.tag_len() + 4 }
}

/// 嵌套消息字段，总是写出。
pub fn size_message(field: ProtoField, message_len: usize) -> usize {
    size_len_delimited(field, message_len)
}

/// 重复的嵌套消息字段。
pub fn size_repeated_message(field: ProtoField, message_lens: impl IntoIterator<Item = usize>) -> usize {
    message_lens
        .into_iter()
        .map(|len| size_message(field, len))
        .sum()
}
