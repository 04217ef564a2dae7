//! # 指标族命名：清洗 + 单位后缀
//!
//! ## 意图（Why）
//! - Prometheus 约定把单位写进指标名（`http_server_duration_seconds`），而 OpenTelemetry 把单位
//!   作为独立的 UCUM 字符串携带；本模块负责两者之间的转换。
//!
//! ## 契约（What）
//! - [`PrometheusUnit::convert`]：去掉 `{注释}`，按映射表展开缩写，`a/b` 展开为 `a_per_b`；
//!   无量纲单位 `1` 仅对 gauge 映射为 `ratio`，其余类型不追加后缀；未知单位按原文清洗后使用；
//! - [`MetricNameMapper::family_name`]：返回**不含** `_total` 的族名，计数器的 `_total`
//!   由序列化器根据输出格式决定写在哪些行上；
//! - 若名称已包含单位后缀则不重复追加；追加后缀时整个名称中连续的 `_` 压缩为一个。

use std::sync::Arc;

use dashmap::DashMap;
use prism_core::telemetry::MetricData;

use crate::{sanitize::sanitize_metric_name, types::PrometheusType};

const TOTAL_SUFFIX: &str = "_total";

fn expand_unit(unit: &str) -> &str {
    match unit {
        // 时间
        "d" => "days",
        "h" => "hours",
        "min" => "minutes",
        "s" => "seconds",
        "ms" => "milliseconds",
        "us" => "microseconds",
        "ns" => "nanoseconds",
        // 字节
        "By" => "bytes",
        "KiBy" => "kibibytes",
        "MiBy" => "mebibytes",
        "GiBy" => "gibibytes",
        "TiBy" => "tibibytes",
        "KBy" => "kilobytes",
        "MBy" => "megabytes",
        "GBy" => "gigabytes",
        "TBy" => "terabytes",
        // SI
        "m" => "meters",
        "V" => "volts",
        "A" => "amperes",
        "J" => "joules",
        "W" => "watts",
        "g" => "grams",
        // 其他
        "Cel" => "celsius",
        "Hz" => "hertz",
        "%" => "percent",
        other => other,
    }
}

fn expand_per_unit(unit: &str) -> &str {
    match unit {
        "s" => "second",
        "m" => "minute",
        "h" => "hour",
        "d" => "day",
        "w" => "week",
        "mo" => "month",
        "y" => "year",
        other => expand_unit(other),
    }
}

fn strip_annotations(unit: &str) -> String {
    let mut stripped = String::with_capacity(unit.len());
    let mut depth = 0usize;
    for ch in unit.chars() {
        match ch {
            '{' => depth += 1,
            '}' if depth > 0 => depth -= 1,
            _ if depth == 0 => stripped.push(ch),
            _ => {}
        }
    }
    stripped
}

/// 单位后缀只允许指标名的主体字符，首尾不留下划线，内部不出现连续下划线。
fn sanitize_suffix(raw: &str) -> String {
    let body: String = raw
        .chars()
        .map(|ch| match ch {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | ':' => ch,
            _ => '_',
        })
        .collect();
    collapse_underscores(body.trim_matches('_'))
}

/// 将连续的 `_` 压缩为一个。
fn collapse_underscores(name: &str) -> String {
    let mut collapsed = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch == '_' && collapsed.ends_with('_') {
            continue;
        }
        collapsed.push(ch);
    }
    collapsed
}

/// 以单个 `_` 连接 `base` 与 `suffix`。
pub(crate) fn join_suffix(base: &str, suffix: &str) -> String {
    let suffix = suffix.trim_start_matches('_');
    let mut joined = String::with_capacity(base.len() + suffix.len() + 1);
    joined.push_str(base);
    if !base.is_empty() && !base.ends_with('_') {
        joined.push('_');
    }
    joined.push_str(suffix);
    joined
}

/// Prometheus 风格的单位后缀。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrometheusUnit(String);

impl PrometheusUnit {
    /// 将 UCUM 单位转换为 Prometheus 名称后缀；无需后缀时返回 `None`。
    ///
    /// ```
    /// use prism_codec_prometheus::{PrometheusType, PrometheusUnit};
    ///
    /// let unit = PrometheusUnit::convert("By/s", PrometheusType::Gauge).unwrap();
    /// assert_eq!(unit.as_str(), "bytes_per_second");
    /// assert!(PrometheusUnit::convert("{requests}", PrometheusType::Counter).is_none());
    /// ```
    pub fn convert(unit: &str, kind: PrometheusType) -> Option<Self> {
        let stripped = strip_annotations(unit);
        let trimmed = stripped.trim();
        let expanded = match trimmed {
            "" => return None,
            "1" if kind == PrometheusType::Gauge => "ratio".to_owned(),
            "1" => return None,
            _ => match trimmed.split_once('/') {
                Some((numerator, denominator)) => {
                    let numerator = expand_unit(numerator.trim());
                    let denominator = expand_per_unit(denominator.trim());
                    match (numerator.is_empty(), denominator.is_empty()) {
                        (_, true) => numerator.to_owned(),
                        (true, false) => format!("per_{denominator}"),
                        (false, false) => format!("{numerator}_per_{denominator}"),
                    }
                }
                None => expand_unit(trimmed).to_owned(),
            },
        };
        let suffix = sanitize_suffix(&expanded);
        (!suffix.is_empty()).then_some(Self(suffix))
    }

    /// 后缀文本。
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 计算（不含 `_total` 的）指标族名，不经过缓存。
pub fn family_name(raw_name: &str, unit: &str, kind: PrometheusType, with_units: bool) -> String {
    let mut name = sanitize_metric_name(raw_name);
    if kind == PrometheusType::Counter {
        if let Some(len) = name.strip_suffix(TOTAL_SUFFIX).map(str::len) {
            name.truncate(len);
        }
    }
    if with_units {
        if let Some(unit) = PrometheusUnit::convert(unit, kind) {
            if !name.contains(unit.as_str()) {
                name = collapse_underscores(&join_suffix(&name, unit.as_str()));
            }
        }
    }
    name
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct NameKey {
    name: Arc<str>,
    unit: Arc<str>,
    kind: PrometheusType,
}

/// 带上限缓存的指标族命名器。
///
/// 与 [`crate::NameSanitizer`] 相同：由编码器注入，满额时整表清空。
#[derive(Debug)]
pub struct MetricNameMapper {
    with_units: bool,
    capacity: usize,
    cache: DashMap<NameKey, Arc<str>>,
}

impl MetricNameMapper {
    /// 创建命名器；`with_units = false` 时不追加单位后缀。
    pub fn new(with_units: bool, capacity: usize) -> Self {
        Self {
            with_units,
            capacity: capacity.max(1),
            cache: DashMap::new(),
        }
    }

    /// 当前缓存的条目数。
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// 返回指标的族名。
    pub fn family_name(&self, metric: &MetricData, kind: PrometheusType) -> Arc<str> {
        let key = NameKey {
            name: Arc::clone(&metric.name),
            unit: Arc::clone(&metric.unit),
            kind,
        };
        if let Some(hit) = self.cache.get(&key) {
            return Arc::clone(hit.value());
        }
        let mapped: Arc<str> = Arc::from(family_name(&metric.name, &metric.unit, kind, self.with_units));
        if self.cache.len() >= self.capacity {
            tracing::debug!(
                capacity = self.capacity,
                "metric name cache reached its ceiling, clearing"
            );
            self.cache.clear();
        }
        self.cache.insert(key, Arc::clone(&mapped));
        mapped
    }
}
