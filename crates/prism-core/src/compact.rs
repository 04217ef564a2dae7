//! 构建阶段的一次性压缩：稳定排序 + 线性去重。
//!
//! `Attributes` 与 `ExtendedAttributes` 两类构建器共用此例程，保证两者的去重语义完全一致。

use alloc::vec::Vec;

/// 可参与压缩的槽位条目，按键名排序与去重。
pub(crate) trait Keyed {
    fn slot_key(&self) -> &str;
}

/// 丢弃墓碑槽位，按键名稳定排序，同名条目保留插入顺序中的最后一个。
///
/// 稳定排序保证同名条目仍按插入顺序相邻，因此线性扫描时用后者覆盖前者即可实现“后写覆盖”。
pub(crate) fn compact<T: Keyed>(slots: Vec<Option<T>>) -> Vec<T> {
    let mut live: Vec<T> = slots.into_iter().flatten().collect();
    live.sort_by(|left, right| left.slot_key().cmp(right.slot_key()));

    let mut out: Vec<T> = Vec::with_capacity(live.len());
    for entry in live {
        match out.last_mut() {
            Some(last) if last.slot_key() == entry.slot_key() => *last = entry,
            _ => out.push(entry),
        }
    }
    out
}
