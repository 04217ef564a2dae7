#![deny(unsafe_code)]
#![warn(missing_docs)]

//! # prism-codec-prometheus
//!
//! ## 意图（Why）
//! - 将 OpenTelemetry 指标数据渲染为 Prometheus 抓取端可直接消费的文本曝光格式，
//!   并负责把任意 OpenTelemetry 名称清洗成 Prometheus 标识符。
//!
//! ## 模块索引（Where）
//! - [`sanitize`]：指标名/标签名清洗函数与带上限的记忆缓存；
//! - [`name`]：UCUM 单位到名称后缀的映射与指标族命名；
//! - [`types`]：指标数据到 `counter` / `gauge` / `histogram` / `summary` 的映射；
//! - [`filter`]：资源属性白名单与其缓存；
//! - [`serializer`]：0.0.4 / OpenMetrics 1.0.0 序列化与内容协商；
//! - `config` / `error`：TOML 配置与错误域。
//!
//! ## 使用方式（How）
//! ```
//! use prism_codec_prometheus::{PrometheusConfig, PrometheusEncoder};
//! use prism_core::{Attributes, telemetry::{MetricData, MetricPoints, NumberPoint}};
//!
//! let encoder = PrometheusEncoder::new(PrometheusConfig::default());
//! let serializer = encoder.for_accept_header("application/openmetrics-text; version=1.0.0");
//! let metric = MetricData::new(
//!     "queue.depth",
//!     MetricPoints::LongGauge(vec![NumberPoint::new(Attributes::empty(), 0, 7)]),
//! );
//! let text = serializer.write_to_string(&[metric]);
//! assert!(text.contains("queue_depth 7\n"));
//! assert!(text.ends_with("# EOF\n"));
//! ```

mod config;
mod error;
pub mod filter;
pub mod name;
pub mod sanitize;
pub mod serializer;
pub mod types;

pub use config::{DEFAULT_NAME_CACHE_CAPACITY, DEFAULT_RESOURCE_CACHE_CAPACITY, PrometheusConfig};
pub use error::PrometheusError;
pub use filter::ResourceAttributeFilter;
pub use name::{MetricNameMapper, PrometheusUnit};
pub use sanitize::{NameKind, NameSanitizer, sanitize_label_name, sanitize_metric_name};
pub use serializer::{ExpositionFormat, PrometheusEncoder, Serializer};
pub use types::PrometheusType;
