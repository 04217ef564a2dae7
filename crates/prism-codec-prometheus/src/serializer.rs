//! # 文本曝光序列化器
//!
//! ## 意图（Why）
//! - 把一批 [`MetricData`] 渲染为 Prometheus text 0.0.4 或 OpenMetrics 1.0.0 文本，
//!   两种格式由抓取请求的 `Accept` 头协商选择。
//!
//! ## 架构定位（Where）
//! - [`PrometheusEncoder`] 持有配置与三类缓存（标签名、族名、资源属性白名单），每个读取端创建一次；
//! - [`Serializer`] 是一次抓取的轻量视图：借用编码器并固定输出格式。
//!
//! ## 行为契约（What）
//! - 输出顺序：`target_info`（取首个指标的资源）→ `otel_scope_info`（仅带属性的 scope）→
//!   按首次出现顺序排列的指标族；OpenMetrics 以 `# EOF` 收尾；
//! - 同名族跨 scope 合并，`# TYPE` 与 `# HELP` 每族只写一次；与已有族类型冲突的指标
//!   以 `warn!` 记录后丢弃，指数直方图以 `debug!` 记录后跳过；
//! - 计数器样本总带 `_total`；0.0.4 的头部行同样使用 `_total` 名称，OpenMetrics 头部使用裸族名；
//! - 时间戳仅在非零时写出：0.0.4 为毫秒整数，OpenMetrics 为带三位小数的秒；
//! - 示例（exemplar）只在 OpenMetrics 中写出，计数器与每个分桶各至多一个。
//!
//! ## 风险提示（Trade-offs）
//! - 整个响应先渲染到内存再写入输出端，换取对输出端的单次 `write_all`；超大抓取会占用等量内存。

use std::{
    collections::{HashMap, HashSet},
    io,
    sync::Arc,
};

use prism_core::{
    Attributes,
    telemetry::{
        Exemplar, HistogramPoint, InstrumentationScopeInfo, MetricData, MetricPoints, NumberPoint,
        NumberValue, SummaryPoint,
    },
};

use crate::{
    config::PrometheusConfig,
    error::PrometheusError,
    filter::ResourceAttributeFilter,
    name::{MetricNameMapper, join_suffix},
    sanitize::{NameKind, NameSanitizer},
    types::PrometheusType,
};

const OPENMETRICS_MEDIA_TYPE: &str = "application/openmetrics-text";
const SCOPE_NAME_LABEL: &str = "otel_scope_name";
const SCOPE_VERSION_LABEL: &str = "otel_scope_version";

/// 文本曝光格式。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExpositionFormat {
    /// Prometheus text format 0.0.4。
    #[default]
    Prometheus004,
    /// OpenMetrics 1.0.0。
    OpenMetrics100,
}

impl ExpositionFormat {
    /// Prometheus 0.0.4 响应的 `Content-Type`。
    pub const PROMETHEUS_CONTENT_TYPE: &'static str = "text/plain; version=0.0.4; charset=utf-8";
    /// OpenMetrics 1.0.0 响应的 `Content-Type`。
    pub const OPENMETRICS_CONTENT_TYPE: &'static str =
        "application/openmetrics-text; version=1.0.0; charset=utf-8";

    /// 按 `Accept` 头协商格式：任一媒体类型为 `application/openmetrics-text` 即选择 OpenMetrics。
    pub fn for_accept_header(accept: &str) -> Self {
        let wants_openmetrics = accept.split(',').any(|entry| {
            entry
                .split(';')
                .next()
                .is_some_and(|media| media.trim().eq_ignore_ascii_case(OPENMETRICS_MEDIA_TYPE))
        });
        if wants_openmetrics {
            Self::OpenMetrics100
        } else {
            Self::Prometheus004
        }
    }

    /// 与格式匹配的 `Content-Type`。
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Prometheus004 => Self::PROMETHEUS_CONTENT_TYPE,
            Self::OpenMetrics100 => Self::OPENMETRICS_CONTENT_TYPE,
        }
    }
}

/// 读取端级别的编码器：配置 + 共享缓存。
///
/// # 教案式注释
/// - **意图 (Why)**：缓存随编码器显式创建与销毁，测试可以构造相互隔离的实例；
/// - **并发 (How)**：缓存基于 `DashMap`，同一编码器可被多个抓取线程并发借用；
/// - **契约 (What)**：配置在构造后不可变，若需调整请重建编码器。
#[derive(Debug)]
pub struct PrometheusEncoder {
    config: PrometheusConfig,
    label_names: NameSanitizer,
    family_names: MetricNameMapper,
    resource_filter: ResourceAttributeFilter,
}

impl PrometheusEncoder {
    /// 以配置构造编码器。
    pub fn new(config: PrometheusConfig) -> Self {
        let label_names = NameSanitizer::new(NameKind::Label, config.name_cache_capacity);
        let family_names = MetricNameMapper::new(!config.without_units, config.name_cache_capacity);
        let resource_filter = ResourceAttributeFilter::new(
            config.resource_attribute_allow_list.iter().cloned(),
            config.resource_cache_capacity,
        );
        Self {
            config,
            label_names,
            family_names,
            resource_filter,
        }
    }

    /// 当前配置。
    pub fn config(&self) -> &PrometheusConfig {
        &self.config
    }

    /// 以固定格式创建序列化器。
    pub fn serializer(&self, format: ExpositionFormat) -> Serializer<'_> {
        Serializer::new(self, format)
    }

    /// 按 `Accept` 头协商格式并创建序列化器。
    pub fn for_accept_header(&self, accept: &str) -> Serializer<'_> {
        Serializer::for_accept_header(self, accept)
    }
}

impl Default for PrometheusEncoder {
    fn default() -> Self {
        Self::new(PrometheusConfig::default())
    }
}

/// 一次抓取的序列化视图。
#[derive(Clone, Copy, Debug)]
pub struct Serializer<'e> {
    encoder: &'e PrometheusEncoder,
    format: ExpositionFormat,
}

struct Family<'m> {
    name: Arc<str>,
    kind: PrometheusType,
    metrics: Vec<&'m MetricData>,
}

#[derive(Default)]
struct LabelSet {
    entries: Vec<(Arc<str>, String)>,
    reserved: Option<&'static str>,
}

impl LabelSet {
    /// `reserved` 是样本自身追加的标签名（`le` / `quantile`），同名的属性标签改写为 `_` 前缀。
    fn reserving(reserved: Option<&'static str>) -> Self {
        Self {
            entries: Vec::new(),
            reserved,
        }
    }

    /// 清洗后同名的标签以 `;` 合并取值。
    fn push(&mut self, name: Arc<str>, value: String) {
        let name = match self.reserved {
            Some(reserved) if *name == *reserved => Arc::from(format!("_{reserved}")),
            _ => name,
        };
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, merged)) => {
                merged.push(';');
                merged.push_str(&value);
            }
            None => self.entries.push((name, value)),
        }
    }
}

#[derive(Clone, Copy)]
enum SampleValue {
    Long(i64),
    Double(f64),
    Count(u64),
}

impl SampleValue {
    fn write(self, out: &mut String) {
        match self {
            Self::Long(value) => out.push_str(itoa::Buffer::new().format(value)),
            Self::Count(value) => out.push_str(itoa::Buffer::new().format(value)),
            Self::Double(value) => write_double(out, value),
        }
    }
}

struct Sample<'s> {
    name: &'s str,
    extra: Option<(&'static str, String)>,
    value: SampleValue,
    epoch_nanos: u64,
    exemplar: Option<&'s Exemplar>,
}

impl<'s> Sample<'s> {
    fn aggregate(name: &'s str, value: SampleValue, epoch_nanos: u64) -> Self {
        Self {
            name,
            extra: None,
            value,
            epoch_nanos,
            exemplar: None,
        }
    }
}

fn write_double(out: &mut String, value: f64) {
    if value.is_nan() {
        out.push_str("NaN");
    } else if value == f64::INFINITY {
        out.push_str("+Inf");
    } else if value == f64::NEG_INFINITY {
        out.push_str("-Inf");
    } else {
        out.push_str(&format!("{value:?}"));
    }
}

fn render_double(value: f64) -> String {
    let mut rendered = String::new();
    write_double(&mut rendered, value);
    rendered
}

fn write_label_value(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
}

fn select_exemplar(exemplars: &[Exemplar], lower: f64, upper: f64) -> Option<&Exemplar> {
    exemplars.iter().find(|exemplar| {
        let value = exemplar.value.as_f64();
        value > lower && value <= upper
    })
}

impl<'e> Serializer<'e> {
    /// 以固定格式借用编码器。
    pub fn new(encoder: &'e PrometheusEncoder, format: ExpositionFormat) -> Self {
        Self { encoder, format }
    }

    /// 按 `Accept` 头协商格式。
    pub fn for_accept_header(encoder: &'e PrometheusEncoder, accept: &str) -> Self {
        Self::new(encoder, ExpositionFormat::for_accept_header(accept))
    }

    /// 输出格式。
    pub fn format(&self) -> ExpositionFormat {
        self.format
    }

    /// 响应应携带的 `Content-Type`。
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }

    /// 渲染并写入输出端。
    pub fn write<W: io::Write + ?Sized>(
        &self,
        metrics: &[MetricData],
        out: &mut W,
    ) -> Result<(), PrometheusError> {
        let rendered = self.write_to_string(metrics);
        out.write_all(rendered.as_bytes())?;
        Ok(())
    }

    /// 渲染为字符串。
    pub fn write_to_string(&self, metrics: &[MetricData]) -> String {
        let mut out = String::new();
        let families = self.collect_families(metrics);
        let config = &self.encoder.config;

        if !config.without_target_info {
            if let Some(first) = metrics.first() {
                if !first.resource.attributes.is_empty() {
                    self.write_target_info(&mut out, &first.resource.attributes);
                }
            }
        }
        if !config.without_scope_info {
            self.write_scope_info(&mut out, &families);
        }
        for family in &families {
            self.write_family(&mut out, family);
        }
        if self.format == ExpositionFormat::OpenMetrics100 {
            out.push_str("# EOF\n");
        }
        tracing::trace!(
            format = ?self.format,
            families = families.len(),
            bytes = out.len(),
            "rendered metrics exposition"
        );
        out
    }

    fn collect_families<'m>(&self, metrics: &'m [MetricData]) -> Vec<Family<'m>> {
        let mut families: Vec<Family<'m>> = Vec::new();
        let mut index: HashMap<Arc<str>, usize> = HashMap::new();
        for metric in metrics {
            let Some(kind) = PrometheusType::for_points(&metric.data) else {
                tracing::debug!(
                    metric = %metric.name,
                    "exponential histograms have no text exposition, skipping"
                );
                continue;
            };
            let name = self.encoder.family_names.family_name(metric, kind);
            match index.get(&name) {
                Some(&position) => {
                    let family = &mut families[position];
                    if family.kind != kind {
                        tracing::warn!(
                            family = %family.name,
                            existing = %family.kind,
                            conflicting = %kind,
                            scope = %metric.scope.name,
                            "metric type conflicts with an existing family, dropping"
                        );
                        continue;
                    }
                    family.metrics.push(metric);
                }
                None => {
                    index.insert(Arc::clone(&name), families.len());
                    families.push(Family {
                        name,
                        kind,
                        metrics: vec![metric],
                    });
                }
            }
        }
        families
    }

    fn write_header(&self, out: &mut String, name: &str, kind: &str, help: &str) {
        out.push_str("# TYPE ");
        out.push_str(name);
        out.push(' ');
        out.push_str(kind);
        out.push('\n');
        out.push_str("# HELP ");
        out.push_str(name);
        out.push(' ');
        for ch in help.chars() {
            match ch {
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '"' if self.format == ExpositionFormat::OpenMetrics100 => out.push_str("\\\""),
                _ => out.push(ch),
            }
        }
        out.push('\n');
    }

    /// `info` 类型族：OpenMetrics 使用 `info` 元数据类型，0.0.4 退化为值恒为 1 的 gauge。
    fn write_info_header(&self, out: &mut String, family: &str, help: &str) {
        match self.format {
            ExpositionFormat::OpenMetrics100 => self.write_header(out, family, "info", help),
            ExpositionFormat::Prometheus004 => {
                self.write_header(out, &join_suffix(family, "info"), "gauge", help)
            }
        }
    }

    fn write_target_info(&self, out: &mut String, resource: &Attributes) {
        self.write_info_header(out, "target", "Target metadata");
        let mut labels = LabelSet::default();
        self.push_attributes(&mut labels, resource);
        self.write_sample(
            out,
            &labels,
            Sample {
                name: "target_info",
                extra: None,
                value: SampleValue::Long(1),
                epoch_nanos: 0,
                exemplar: None,
            },
        );
    }

    fn write_scope_info(&self, out: &mut String, families: &[Family<'_>]) {
        let mut seen: HashSet<&InstrumentationScopeInfo> = HashSet::new();
        let scopes: Vec<&InstrumentationScopeInfo> = families
            .iter()
            .flat_map(|family| family.metrics.iter().map(|metric| &metric.scope))
            .filter(|scope| !scope.attributes.is_empty() && seen.insert(*scope))
            .collect();
        if scopes.is_empty() {
            return;
        }
        self.write_info_header(out, "otel_scope", "Instrumentation Scope metadata");
        for scope in scopes {
            let mut labels = LabelSet::default();
            self.push_scope(&mut labels, scope);
            self.push_attributes(&mut labels, &scope.attributes);
            self.write_sample(
                out,
                &labels,
                Sample {
                    name: "otel_scope_info",
                    extra: None,
                    value: SampleValue::Long(1),
                    epoch_nanos: 0,
                    exemplar: None,
                },
            );
        }
    }

    fn write_family(&self, out: &mut String, family: &Family<'_>) {
        let help = family
            .metrics
            .first()
            .map_or("", |metric| &*metric.description);
        let counter_name = join_suffix(&family.name, "total");
        let header_name = match (family.kind, self.format) {
            (PrometheusType::Counter, ExpositionFormat::Prometheus004) => counter_name.as_str(),
            _ => &*family.name,
        };
        self.write_header(out, header_name, family.kind.as_str(), help);

        for metric in &family.metrics {
            match &metric.data {
                MetricPoints::LongGauge(points) => {
                    self.write_numbers(out, &family.name, metric, points, false, SampleValue::Long)
                }
                MetricPoints::DoubleGauge(points) => {
                    self.write_numbers(out, &family.name, metric, points, false, SampleValue::Double)
                }
                MetricPoints::LongSum { monotonic, points } => {
                    let name = if *monotonic { counter_name.as_str() } else { &*family.name };
                    self.write_numbers(out, name, metric, points, *monotonic, SampleValue::Long)
                }
                MetricPoints::DoubleSum { monotonic, points } => {
                    let name = if *monotonic { counter_name.as_str() } else { &*family.name };
                    self.write_numbers(out, name, metric, points, *monotonic, SampleValue::Double)
                }
                MetricPoints::Histogram(points) => {
                    for point in points {
                        self.write_histogram(out, &family.name, metric, point);
                    }
                }
                MetricPoints::Summary(points) => {
                    for point in points {
                        self.write_summary(out, &family.name, metric, point);
                    }
                }
                MetricPoints::ExponentialHistogram(_) => {}
            }
        }
    }

    fn write_numbers<T: Copy>(
        &self,
        out: &mut String,
        name: &str,
        metric: &MetricData,
        points: &[NumberPoint<T>],
        with_exemplar: bool,
        value: impl Fn(T) -> SampleValue,
    ) {
        for point in points {
            let labels = self.point_labels(metric, &point.attributes, None);
            let exemplar = if with_exemplar && self.exemplars_enabled() {
                select_exemplar(&point.exemplars, f64::NEG_INFINITY, f64::INFINITY)
            } else {
                None
            };
            self.write_sample(
                out,
                &labels,
                Sample {
                    name,
                    extra: None,
                    value: value(point.value),
                    epoch_nanos: point.epoch_nanos,
                    exemplar,
                },
            );
        }
    }

    fn write_histogram(
        &self,
        out: &mut String,
        base: &str,
        metric: &MetricData,
        point: &HistogramPoint,
    ) {
        let labels = self.point_labels(metric, &point.attributes, Some("le"));
        let count_name = join_suffix(base, "count");
        let sum_name = join_suffix(base, "sum");
        let bucket_name = join_suffix(base, "bucket");
        self.write_sample(
            out,
            &labels,
            Sample::aggregate(&count_name, SampleValue::Count(point.count), point.epoch_nanos),
        );
        self.write_sample(
            out,
            &labels,
            Sample::aggregate(&sum_name, SampleValue::Double(point.sum), point.epoch_nanos),
        );

        let mut cumulative = 0u64;
        let mut lower = f64::NEG_INFINITY;
        for index in 0..=point.boundaries.len() {
            cumulative = cumulative.saturating_add(point.counts.get(index).copied().unwrap_or(0));
            let upper = point.boundaries.get(index).copied().unwrap_or(f64::INFINITY);
            let exemplar = if self.exemplars_enabled() {
                select_exemplar(&point.exemplars, lower, upper)
            } else {
                None
            };
            self.write_sample(
                out,
                &labels,
                Sample {
                    name: &bucket_name,
                    extra: Some(("le", render_double(upper))),
                    value: SampleValue::Count(cumulative),
                    epoch_nanos: point.epoch_nanos,
                    exemplar,
                },
            );
            lower = upper;
        }
    }

    fn write_summary(
        &self,
        out: &mut String,
        base: &str,
        metric: &MetricData,
        point: &SummaryPoint,
    ) {
        let labels = self.point_labels(metric, &point.attributes, Some("quantile"));
        let count_name = join_suffix(base, "count");
        let sum_name = join_suffix(base, "sum");
        self.write_sample(
            out,
            &labels,
            Sample::aggregate(&count_name, SampleValue::Count(point.count), point.epoch_nanos),
        );
        self.write_sample(
            out,
            &labels,
            Sample::aggregate(&sum_name, SampleValue::Double(point.sum), point.epoch_nanos),
        );
        for quantile in &point.quantiles {
            self.write_sample(
                out,
                &labels,
                Sample {
                    name: base,
                    extra: Some(("quantile", render_double(quantile.quantile))),
                    value: SampleValue::Double(quantile.value),
                    epoch_nanos: point.epoch_nanos,
                    exemplar: None,
                },
            );
        }
    }

    fn exemplars_enabled(&self) -> bool {
        self.format == ExpositionFormat::OpenMetrics100
    }

    /// 点属性 → scope 标签 → 白名单资源属性。
    fn point_labels(
        &self,
        metric: &MetricData,
        attributes: &Attributes,
        reserved: Option<&'static str>,
    ) -> LabelSet {
        let mut labels = LabelSet::reserving(reserved);
        self.push_attributes(&mut labels, attributes);
        if !self.encoder.config.without_scope_info {
            self.push_scope(&mut labels, &metric.scope);
        }
        if !self.encoder.resource_filter.is_disabled() {
            let allowed = self.encoder.resource_filter.filter(&metric.resource.attributes);
            self.push_attributes(&mut labels, &allowed);
        }
        labels
    }

    fn push_attributes(&self, labels: &mut LabelSet, attributes: &Attributes) {
        for entry in attributes {
            labels.push(
                self.encoder.label_names.sanitize(entry.key()),
                entry.value().to_value().as_string(),
            );
        }
    }

    fn push_scope(&self, labels: &mut LabelSet, scope: &InstrumentationScopeInfo) {
        if !scope.name.is_empty() {
            labels.push(Arc::from(SCOPE_NAME_LABEL), scope.name.to_string());
        }
        if let Some(version) = scope.version.as_deref() {
            labels.push(Arc::from(SCOPE_VERSION_LABEL), version.to_owned());
        }
    }

    fn write_timestamp(&self, out: &mut String, epoch_nanos: u64) {
        let millis = epoch_nanos / 1_000_000;
        match self.format {
            ExpositionFormat::Prometheus004 => out.push_str(itoa::Buffer::new().format(millis)),
            ExpositionFormat::OpenMetrics100 => {
                let fraction = millis % 1_000;
                out.push_str(itoa::Buffer::new().format(millis / 1_000));
                out.push('.');
                if fraction < 100 {
                    out.push('0');
                }
                if fraction < 10 {
                    out.push('0');
                }
                out.push_str(itoa::Buffer::new().format(fraction));
            }
        }
    }

    fn write_sample(&self, out: &mut String, labels: &LabelSet, sample: Sample<'_>) {
        out.push_str(sample.name);
        if !labels.entries.is_empty() || sample.extra.is_some() {
            out.push('{');
            let extra = sample.extra.as_ref().map(|(name, value)| (*name, value.as_str()));
            let all = labels
                .entries
                .iter()
                .map(|(name, value)| (&**name, value.as_str()))
                .chain(extra);
            for (position, (name, value)) in all.enumerate() {
                if position > 0 {
                    out.push(',');
                }
                out.push_str(name);
                out.push_str("=\"");
                write_label_value(out, value);
                out.push('"');
            }
            out.push('}');
        }
        out.push(' ');
        sample.value.write(out);
        if sample.epoch_nanos != 0 {
            out.push(' ');
            self.write_timestamp(out, sample.epoch_nanos);
        }
        if let Some(exemplar) = sample.exemplar {
            self.write_exemplar(out, exemplar);
        }
        out.push('\n');
    }

    fn write_exemplar(&self, out: &mut String, exemplar: &Exemplar) {
        out.push_str(" # {");
        if let Some(context) = exemplar.span_context.as_ref().filter(|context| context.is_valid()) {
            out.push_str("trace_id=\"");
            out.push_str(&context.trace_id.to_hex());
            out.push_str("\",span_id=\"");
            out.push_str(&context.span_id.to_hex());
            out.push('"');
        }
        out.push_str("} ");
        match exemplar.value {
            NumberValue::Long(value) => SampleValue::Long(value).write(out),
            NumberValue::Double(value) => SampleValue::Double(value).write(out),
        }
        if exemplar.epoch_nanos != 0 {
            out.push(' ');
            self.write_timestamp(out, exemplar.epoch_nanos);
        }
    }
}

#[cfg(test)]
mod tests {
    use prism_core::telemetry::{ExponentialHistogramPoint, NumberPoint};
    use tracing_test::traced_test;

    use super::*;

    fn gauge(name: &str, value: i64) -> MetricData {
        MetricData::new(
            name,
            MetricPoints::LongGauge(vec![NumberPoint::new(Attributes::empty(), 0, value)]),
        )
    }

    fn render(metrics: &[MetricData]) -> String {
        PrometheusEncoder::default()
            .serializer(ExpositionFormat::Prometheus004)
            .write_to_string(metrics)
    }

    #[test]
    fn accept_header_negotiation() {
        assert_eq!(
            ExpositionFormat::for_accept_header(
                "application/openmetrics-text; version=1.0.0,text/plain;q=0.5"
            ),
            ExpositionFormat::OpenMetrics100
        );
        assert_eq!(
            ExpositionFormat::for_accept_header("text/plain;version=0.0.4"),
            ExpositionFormat::Prometheus004
        );
        assert_eq!(ExpositionFormat::for_accept_header(""), ExpositionFormat::Prometheus004);
        assert_eq!(
            ExpositionFormat::OpenMetrics100.content_type(),
            "application/openmetrics-text; version=1.0.0; charset=utf-8"
        );
    }

    #[test]
    fn doubles_use_prometheus_spelling() {
        assert_eq!(render_double(f64::INFINITY), "+Inf");
        assert_eq!(render_double(f64::NEG_INFINITY), "-Inf");
        assert_eq!(render_double(f64::NAN), "NaN");
        assert_eq!(render_double(10.0), "10.0");
        assert_eq!(render_double(0.25), "0.25");
    }

    #[test]
    fn duplicate_sanitized_labels_merge() {
        let mut labels = LabelSet::default();
        labels.push(Arc::from("a_b"), "1".to_owned());
        labels.push(Arc::from("a_b"), "2".to_owned());
        assert_eq!(labels.entries, vec![(Arc::<str>::from("a_b"), "1;2".to_owned())]);
    }

    #[test]
    #[traced_test]
    fn conflicting_types_are_dropped_with_warning() {
        let counter = MetricData::new(
            "jobs",
            MetricPoints::LongSum {
                monotonic: true,
                points: vec![NumberPoint::new(Attributes::empty(), 0, 5)],
            },
        );
        let output = render(&[gauge("jobs", 1), counter]);
        assert!(output.contains("# TYPE jobs gauge\n"));
        assert!(!output.contains("jobs_total"));
        assert!(logs_contain("metric type conflicts with an existing family"));
    }

    #[test]
    #[traced_test]
    fn exponential_histograms_are_skipped() {
        let metric = MetricData::new(
            "latency",
            MetricPoints::ExponentialHistogram(vec![ExponentialHistogramPoint::default()]),
        );
        assert_eq!(render(&[metric]), "");
        assert!(logs_contain("exponential histograms have no text exposition"));
    }

    #[test]
    fn write_forwards_to_io_sink() {
        let encoder = PrometheusEncoder::default();
        let serializer = encoder.serializer(ExpositionFormat::OpenMetrics100);
        let mut sink = Vec::new();
        serializer
            .write(&[gauge("up", 1)], &mut sink)
            .expect("vec sink never fails");
        assert_eq!(
            String::from_utf8(sink).expect("utf-8"),
            "# TYPE up gauge\n# HELP up \nup 1\n# EOF\n"
        );
    }
}
