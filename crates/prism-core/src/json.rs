//! ProtoJSON 文本编码器。
//!
//! # 教案式说明
//! - **意图（Why）**：`Value`/`Attributes` 需要一份可被任何标准 ProtoJSON 解码器解析的文本形式，
//!   同时作为 `Value::as_string` 与 Prometheus 标签值的渲染来源；
//! - **逻辑（How）**：对 [`Value`] 标签做穷尽 `match`，增量写入调用方提供的 `String`，不经过中间树结构；
//! - **契约（What）**：
//!   - 字符串按 JSON 控制字符规则转义，其余 `< 0x20` 的字符写为小写十六进制 `\uXXXX`；
//!   - 有限浮点使用最短可往返十进制表示，`NaN`/`Infinity`/`-Infinity` 写为带引号的字符串；
//!   - 字节串写为带引号的标准 base64（无换行、非 URL 安全字母表）；
//!   - 整数写为裸 JSON 数字，`Empty` 写为 `null`，数组/键值列表递归写出，无尾随分隔符。

use alloc::{format, string::String};

use base64::{Engine as _, prelude::BASE64_STANDARD};

use crate::{attributes::Attributes, value::Value};

/// 将单个值编码为 ProtoJSON 文本。
pub fn encode(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

/// 将属性容器编码为 JSON 对象，键按容器的升序排列。
pub fn encode_attributes(attributes: &Attributes) -> String {
    let mut out = String::new();
    write_attributes(&mut out, attributes);
    out
}

/// 将值追加写入 `out`。
pub fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::String(text) => write_escaped_string(out, text),
        Value::Bool(flag) => out.push_str(if *flag { "true" } else { "false" }),
        Value::Long(number) => out.push_str(itoa::Buffer::new().format(*number)),
        Value::Double(number) => write_double(out, *number),
        Value::Array(values) => {
            out.push('[');
            for (index, element) in values.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_value(out, element);
            }
            out.push(']');
        }
        Value::KeyValueList(entries) => {
            out.push('{');
            for (index, entry) in entries.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_escaped_string(out, entry.key());
                out.push(':');
                write_value(out, entry.value());
            }
            out.push('}');
        }
        Value::Bytes(raw) => {
            out.push('"');
            BASE64_STANDARD.encode_string(raw, out);
            out.push('"');
        }
        Value::Empty => out.push_str("null"),
    }
}

/// 将属性容器以 JSON 对象形式追加写入 `out`。
pub fn write_attributes(out: &mut String, attributes: &Attributes) {
    out.push('{');
    for (index, entry) in attributes.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        write_escaped_string(out, entry.key());
        out.push(':');
        write_value(out, &entry.value().to_value());
    }
    out.push('}');
}

/// 写出带引号并已转义的 JSON 字符串。
pub fn write_escaped_string(out: &mut String, text: &str) {
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch if (ch as u32) < 0x20 => write_control_escape(out, ch as u8),
            ch => out.push(ch),
        }
    }
    out.push('"');
}

/// `< 0x20` 的控制字符写为 `\u00XX`，十六进制小写。
fn write_control_escape(out: &mut String, byte: u8) {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    out.push_str("\\u00");
    out.push(char::from(HEX[usize::from(byte >> 4)]));
    out.push(char::from(HEX[usize::from(byte & 0x0f)]));
}

/// 写出双精度浮点数；非有限值使用 ProtoJSON 规定的带引号记号。
pub fn write_double(out: &mut String, number: f64) {
    if number.is_nan() {
        out.push_str("\"NaN\"");
    } else if number.is_infinite() {
        out.push_str(if number > 0.0 {
            "\"Infinity\""
        } else {
            "\"-Infinity\""
        });
    } else {
        // `{:?}` 给出最短可往返表示，且整数值保留 `.0`。
        out.push_str(&format!("{number:?}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{long_key, string_key};

    #[test]
    fn special_doubles_are_quoted_tokens() {
        assert_eq!(encode(&Value::double(f64::NAN)), "\"NaN\"");
        assert_eq!(encode(&Value::double(1.0 / 0.0)), "\"Infinity\"");
        assert_eq!(encode(&Value::double(f64::NEG_INFINITY)), "\"-Infinity\"");
        assert_eq!(encode(&Value::double(1.5)), "1.5");
        assert_eq!(encode(&Value::double(3.0)), "3.0");
    }

    #[test]
    fn control_characters_are_escaped() {
        let rendered = encode(&Value::string("a\"b\\c\u{08}\u{0c}\n\r\t\u{01}\u{1f}"));
        assert_eq!(rendered, r#""a\"b\\c\b\f\n\r\t\u0001\u001f""#);
    }

    #[test]
    fn nested_containers_render_without_trailing_separators() {
        let value = Value::key_value_list([
            ("list", Value::array([Value::long(1), Value::bool(false)])),
            ("nothing", Value::empty()),
            ("raw", Value::bytes(&[0xff, 0x00])),
        ]);
        assert_eq!(
            encode(&value),
            r#"{"list":[1,false],"nothing":null,"raw":"/wA="}"#
        );
    }

    #[test]
    fn output_parses_as_json() {
        // Why: 任何标准 JSON 解析器都必须接受编码结果。
        let value = Value::array([
            Value::string("\u{7f}ü\u{0}"),
            Value::double(-0.0),
            Value::double(f64::NAN),
            Value::key_value_list([("k", Value::array::<[Value; 0]>([]))]),
        ]);
        let parsed: serde_json::Value =
            serde_json::from_str(&encode(&value)).expect("valid json");
        assert_eq!(parsed[0], serde_json::json!("\u{7f}ü\u{0}"));
        assert_eq!(parsed[2], serde_json::json!("NaN"));
        assert_eq!(parsed[3]["k"], serde_json::json!([]));
    }

    #[test]
    fn attributes_render_as_sorted_object() {
        let attributes = Attributes::builder()
            .put(&string_key("z"), "last")
            .put(&long_key("a"), 7)
            .build();
        assert_eq!(encode_attributes(&attributes), r#"{"a":7,"z":"last"}"#);
    }
}
