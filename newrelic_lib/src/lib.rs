//! New Relic REST API v2 client library.
//!
//! Provides a typed client for application listing, application details,
//! metric timeslice data, and the error rate and Apdex score derived from it.

pub mod client;
pub mod config;
pub mod error;
pub mod helpers;
pub mod models;
pub mod params;
pub mod query;

pub use client::Client;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Error, RemoteError, Result};
pub use helpers::{format_time, parse_time, DEFAULT_LOOKBACK};
pub use models::{ApdexScore, ErrorRate, Metric, MetricData, Timeslice};
pub use params::{ApplicationParams, ListApplicationsParams, MetricScope, MetricsParams};
pub use query::{QueryParams, QueryValue};
pub use tokio_util::sync::CancellationToken;

/// Library version for User-Agent and diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
