use std::io;

use bytes::BufMut;

use crate::{error::MarshalError, writer::ProtoWriter};

/// 先算尺寸、后写入的编码单元。
///
/// # 教案式说明
/// - **意图 (Why)**：长度前缀位于负载之前，只有在写入前得知精确尺寸，才能单趟、零回填地产出字节；
/// - **契约 (What)**：
///   - `size()` 返回构造时已自底向上算好的字节数，调用为 O(1)；
///   - `write_to` 必须恰好写出 `size()` 个字节，字段按 schema 字段号顺序排列；
///   - 不一致属于编程缺陷，由写入路径上的断言捕获，不会以 `Err` 返回；
/// - **风险 (Trade-offs)**：`write_to` 对缓冲容量不做检查，面向调用方的入口是本 trait 的提供方法。
pub trait Marshaler {
    /// 编码后的精确字节数。
    fn size(&self) -> usize;

    /// 写出恰好 `size()` 个字节。
    fn write_to<B: BufMut>(&self, writer: &mut ProtoWriter<'_, B>);

    /// 按精确容量分配并编码。
    fn encode_to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size());
        write_checked(self, &mut out);
        out
    }

    /// 写入任意 `BufMut`；剩余容量不足时在写入前失败，缓冲保持不变。
    fn write_binary_to<B: BufMut>(&self, buf: &mut B) -> Result<(), MarshalError> {
        let required = self.size();
        let remaining = buf.remaining_mut();
        if remaining < required {
            return Err(MarshalError::InsufficientCapacity {
                required,
                remaining,
            });
        }
        write_checked(self, buf);
        Ok(())
    }

    /// 编码后整体写入 `io::Write`。
    fn write_binary_to_writer<W: io::Write>(&self, sink: &mut W) -> Result<(), MarshalError> {
        sink.write_all(&self.encode_to_vec())?;
        Ok(())
    }
}

fn write_checked<M: Marshaler + ?Sized, B: BufMut>(message: &M, buf: &mut B) {
    let expected = message.size();
    let mut writer = ProtoWriter::new(buf);
    message.write_to(&mut writer);
    assert_eq!(
        writer.written(),
        expected,
        "marshaler wrote a different number of bytes than its size()"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{ProtoField, WireType};

    struct Broken;

    impl Marshaler for Broken {
        fn size(&self) -> usize {
            1
        }

        fn write_to<B: BufMut>(&self, writer: &mut ProtoWriter<'_, B>) {
            writer.write_int64(ProtoField::new(1, WireType::Varint), 300);
        }
    }

    #[test]
    #[should_panic(expected = "different number of bytes")]
    fn size_write_mismatch_is_fatal() {
        let _ = Broken.encode_to_vec();
    }

    #[test]
    fn fixed_sink_without_room_is_rejected_up_front() {
        let mut storage = [0u8; 1];
        let mut sink: &mut [u8] = &mut storage;
        struct Three;
        impl Marshaler for Three {
            fn size(&self) -> usize {
                3
            }
            fn write_to<B: BufMut>(&self, writer: &mut ProtoWriter<'_, B>) {
                writer.write_int64(ProtoField::new(1, WireType::Varint), 300);
            }
        }
        let err = Three.write_binary_to(&mut sink).expect_err("no room");
        assert!(matches!(
            err,
            MarshalError::InsufficientCapacity {
                required: 3,
                remaining: 1
            }
        ));
    }
}
