//! 指标数据点。
//!
//! # 教案式说明
//! - **意图 (Why)**：描述一次采集周期内某个指标的全部数据点，供文本暴露格式编码器消费；
//! - **契约 (What)**：
//!   - 直方图 `counts` 长度为 `boundaries.len() + 1`，末尾为 `(last, +Inf)` 桶，计数为非累积；
//!   - 时间戳均为 Unix 纳秒，`0` 表示未知；
//!   - 样例（exemplar）的 `span_context` 为 `None` 时不携带链路关联。

use alloc::{sync::Arc, vec::Vec};

use super::{InstrumentationScopeInfo, Resource, SpanContext};
use crate::attributes::Attributes;

/// 整数或浮点测量值。
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NumberValue {
    /// 整数测量。
    Long(i64),
    /// 浮点测量。
    Double(f64),
}

impl NumberValue {
    /// 转换为浮点，用于区间比较。
    pub fn as_f64(self) -> f64 {
        match self {
            NumberValue::Long(value) => value as f64,
            NumberValue::Double(value) => value,
        }
    }
}

impl From<i64> for NumberValue {
    fn from(value: i64) -> Self {
        NumberValue::Long(value)
    }
}

impl From<f64> for NumberValue {
    fn from(value: f64) -> Self {
        NumberValue::Double(value)
    }
}

/// 附着在数据点上的原始采样。
#[derive(Clone, Debug, PartialEq)]
pub struct Exemplar {
    /// 被聚合过滤掉的属性。
    pub filtered_attributes: Attributes,
    /// 采样时间。
    pub epoch_nanos: u64,
    /// 采样值。
    pub value: NumberValue,
    /// 采样时所在的 Span。
    pub span_context: Option<SpanContext>,
}

/// Gauge / Sum 的数据点。
#[derive(Clone, Debug, PartialEq)]
pub struct NumberPoint<T> {
    /// 累计起点。
    pub start_epoch_nanos: u64,
    /// 采集时间。
    pub epoch_nanos: u64,
    /// 数据点属性。
    pub attributes: Attributes,
    /// 测量值。
    pub value: T,
    /// 样例。
    pub exemplars: Vec<Exemplar>,
}

impl<T> NumberPoint<T> {
    /// 无样例的数据点。
    pub fn new(attributes: Attributes, epoch_nanos: u64, value: T) -> Self {
        Self {
            start_epoch_nanos: 0,
            epoch_nanos,
            attributes,
            value,
            exemplars: Vec::new(),
        }
    }
}

/// 显式桶直方图数据点。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistogramPoint {
    /// 累计起点。
    pub start_epoch_nanos: u64,
    /// 采集时间。
    pub epoch_nanos: u64,
    /// 数据点属性。
    pub attributes: Attributes,
    /// 总和。
    pub sum: f64,
    /// 总数。
    pub count: u64,
    /// 最小值。
    pub min: Option<f64>,
    /// 最大值。
    pub max: Option<f64>,
    /// 升序的桶边界。
    pub boundaries: Vec<f64>,
    /// 每个桶的非累积计数。
    pub counts: Vec<u64>,
    /// 样例。
    pub exemplars: Vec<Exemplar>,
}

/// 分位数与值。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValueAtQuantile {
    /// 分位数，取值 `[0, 1]`。
    pub quantile: f64,
    /// 对应值。
    pub value: f64,
}

/// 摘要数据点。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SummaryPoint {
    /// 累计起点。
    pub start_epoch_nanos: u64,
    /// 采集时间。
    pub epoch_nanos: u64,
    /// 数据点属性。
    pub attributes: Attributes,
    /// 总数。
    pub count: u64,
    /// 总和。
    pub sum: f64,
    /// 分位数值。
    pub quantiles: Vec<ValueAtQuantile>,
}

/// 指数直方图的一侧桶。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExponentialBuckets {
    /// 首个桶的索引偏移。
    pub offset: i32,
    /// 桶计数。
    pub counts: Vec<u64>,
}

/// 指数直方图数据点。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExponentialHistogramPoint {
    /// 累计起点。
    pub start_epoch_nanos: u64,
    /// 采集时间。
    pub epoch_nanos: u64,
    /// 数据点属性。
    pub attributes: Attributes,
    /// 精度。
    pub scale: i32,
    /// 总和。
    pub sum: f64,
    /// 总数。
    pub count: u64,
    /// 零值桶计数。
    pub zero_count: u64,
    /// 正值桶。
    pub positive: ExponentialBuckets,
    /// 负值桶。
    pub negative: ExponentialBuckets,
    /// 样例。
    pub exemplars: Vec<Exemplar>,
}

/// 指标数据点集合，按指标种类区分。
#[derive(Clone, Debug, PartialEq)]
pub enum MetricPoints {
    /// 整数 Gauge。
    LongGauge(Vec<NumberPoint<i64>>),
    /// 浮点 Gauge。
    DoubleGauge(Vec<NumberPoint<f64>>),
    /// 整数 Sum。
    LongSum {
        /// 是否单调递增。
        monotonic: bool,
        /// 数据点。
        points: Vec<NumberPoint<i64>>,
    },
    /// 浮点 Sum。
    DoubleSum {
        /// 是否单调递增。
        monotonic: bool,
        /// 数据点。
        points: Vec<NumberPoint<f64>>,
    },
    /// 显式桶直方图。
    Histogram(Vec<HistogramPoint>),
    /// 摘要。
    Summary(Vec<SummaryPoint>),
    /// 指数直方图。
    ExponentialHistogram(Vec<ExponentialHistogramPoint>),
}

/// 单个指标在一次采集中的完整数据。
#[derive(Clone, Debug, PartialEq)]
pub struct MetricData {
    /// 所属资源。
    pub resource: Resource,
    /// 所属插桩库。
    pub scope: InstrumentationScopeInfo,
    /// 指标名。
    pub name: Arc<str>,
    /// 描述。
    pub description: Arc<str>,
    /// UCUM 风格单位，空串表示无单位。
    pub unit: Arc<str>,
    /// 数据点。
    pub data: MetricPoints,
}

impl MetricData {
    /// 构造指标，资源与插桩库为默认值。
    pub fn new(name: impl Into<Arc<str>>, data: MetricPoints) -> Self {
        Self {
            resource: Resource::default(),
            scope: InstrumentationScopeInfo::default(),
            name: name.into(),
            description: Arc::from(""),
            unit: Arc::from(""),
            data,
        }
    }

    /// 设置描述。
    pub fn with_description(mut self, description: impl Into<Arc<str>>) -> Self {
        self.description = description.into();
        self
    }

    /// 设置单位。
    pub fn with_unit(mut self, unit: impl Into<Arc<str>>) -> Self {
        self.unit = unit.into();
        self
    }

    /// 设置资源。
    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resource = resource;
        self
    }

    /// 设置插桩库。
    pub fn with_scope(mut self, scope: InstrumentationScopeInfo) -> Self {
        self.scope = scope;
        self
    }
}
