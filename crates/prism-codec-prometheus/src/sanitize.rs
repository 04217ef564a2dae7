//! # 指标名与标签名清洗
//!
//! ## 意图（Why）
//! - Prometheus 对标识符的字符集有严格语法，而 OpenTelemetry 名称允许 `.`、`-`、非 ASCII 等任意字符；
//!   清洗把任意字符串映射为合法标识符，且对所有输入都有定义，不会失败。
//!
//! ## 契约（What）
//! - 指标名：首字符 `[a-zA-Z_:]`，其余 `[a-zA-Z0-9_:]`；
//! - 标签名：首字符 `[a-zA-Z_]`，其余 `[a-zA-Z0-9_]`，两个位置都不接受冒号；
//! - 每个不合法的字符（按 Unicode 标量计）替换为单个 `_`，大小写保持不变；
//! - 清洗幂等：`sanitize(sanitize(s)) == sanitize(s)`。
//!
//! ## 缓存（How）
//! - [`NameSanitizer`] 以 `DashMap` 记忆清洗结果，供并发序列化线程共享；
//! - 条目达到上限时整表清空再插入，以固定内存上界换取偶发的重算。

use std::sync::Arc;

use dashmap::DashMap;

/// 清洗的目标语法。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NameKind {
    /// 指标名语法，允许冒号。
    Metric,
    /// 标签名语法，不允许冒号。
    Label,
}

impl NameKind {
    fn accepts(self, position: usize, ch: char) -> bool {
        let colon_allowed = matches!(self, NameKind::Metric);
        match ch {
            'a'..='z' | 'A'..='Z' | '_' => true,
            ':' => colon_allowed,
            '0'..='9' => position > 0,
            _ => false,
        }
    }

    /// 按本语法清洗 `raw`。
    pub fn sanitize(self, raw: &str) -> String {
        raw.chars()
            .enumerate()
            .map(|(position, ch)| if self.accepts(position, ch) { ch } else { '_' })
            .collect()
    }
}

/// 清洗指标名。
///
/// ```
/// assert_eq!(
///     prism_codec_prometheus::sanitize_metric_name("9request.count%"),
///     "_request_count_"
/// );
/// ```
pub fn sanitize_metric_name(raw: &str) -> String {
    NameKind::Metric.sanitize(raw)
}

/// 清洗标签名。
pub fn sanitize_label_name(raw: &str) -> String {
    NameKind::Label.sanitize(raw)
}

/// 带上限的清洗结果缓存。
///
/// # 教案式注释
/// - **意图 (Why)**：同一批名称会在每次抓取时反复出现，记忆化避免重复分配；
/// - **契约 (What)**：返回值与 [`NameKind::sanitize`] 完全一致，缓存只影响开销；
/// - **生命周期**：由持有它的编码器创建并注入，随编码器一起释放，不存在进程级单例；
/// - **风险 (Trade-offs)**：溢出时整表清空，短时间内命中率归零。
#[derive(Debug)]
pub struct NameSanitizer {
    kind: NameKind,
    capacity: usize,
    cache: DashMap<Arc<str>, Arc<str>>,
}

impl NameSanitizer {
    /// 创建指定语法与上限的缓存，上限至少为 1。
    pub fn new(kind: NameKind, capacity: usize) -> Self {
        Self {
            kind,
            capacity: capacity.max(1),
            cache: DashMap::new(),
        }
    }

    /// 清洗语法。
    pub fn kind(&self) -> NameKind {
        self.kind
    }

    /// 当前缓存的条目数。
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// 返回 `raw` 的清洗结果，命中时不分配。
    pub fn sanitize(&self, raw: &str) -> Arc<str> {
        if let Some(hit) = self.cache.get(raw) {
            return Arc::clone(hit.value());
        }
        let sanitized: Arc<str> = Arc::from(self.kind.sanitize(raw));
        if self.cache.len() >= self.capacity {
            tracing::debug!(
                kind = ?self.kind,
                capacity = self.capacity,
                "name sanitizer cache reached its ceiling, clearing"
            );
            self.cache.clear();
        }
        self.cache.insert(Arc::from(raw), Arc::clone(&sanitized));
        sanitized
    }
}
