//! 指标数据到 Prometheus 指标类型的映射。

use core::fmt;

use prism_core::telemetry::MetricPoints;

/// Prometheus 指标族类型。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrometheusType {
    /// 单调递增计数器。
    Counter,
    /// 可任意变化的瞬时值。
    Gauge,
    /// 显式分桶直方图。
    Histogram,
    /// 分位数摘要。
    Summary,
}

impl PrometheusType {
    /// 为指标数据选择曝光类型。
    ///
    /// 非单调求和退化为 `gauge`；指数直方图没有文本曝光表示，返回 `None`。
    pub fn for_points(points: &MetricPoints) -> Option<Self> {
        match points {
            MetricPoints::LongGauge(_) | MetricPoints::DoubleGauge(_) => Some(Self::Gauge),
            MetricPoints::LongSum { monotonic, .. } | MetricPoints::DoubleSum { monotonic, .. } => {
                Some(if *monotonic { Self::Counter } else { Self::Gauge })
            }
            MetricPoints::Histogram(_) => Some(Self::Histogram),
            MetricPoints::Summary(_) => Some(Self::Summary),
            MetricPoints::ExponentialHistogram(_) => None,
        }
    }

    /// `# TYPE` 行使用的小写名称。
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Histogram => "histogram",
            Self::Summary => "summary",
        }
    }
}

impl fmt::Display for PrometheusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
