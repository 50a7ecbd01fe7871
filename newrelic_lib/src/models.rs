//! Response models for metric data and the values derived from it.

use crate::error::{Error, RemoteError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const ERRORS_ALL: &str = "Errors/all";
pub const HTTP_DISPATCHER: &str = "HttpDispatcher";
pub const OTHER_TRANSACTION_ALL: &str = "OtherTransaction/all";
pub const APDEX: &str = "Apdex";
pub const END_USER_APDEX: &str = "EndUser/Apdex";

/// Metric names requested for the error rate.
pub const ERROR_RATE_METRICS: [&str; 3] = [ERRORS_ALL, HTTP_DISPATCHER, OTHER_TRANSACTION_ALL];
/// Metric names requested for the Apdex score.
pub const APDEX_METRICS: [&str; 2] = [APDEX, END_USER_APDEX];

/// Body of `metric_data` in a metrics response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricData {
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metrics_not_found: Vec<String>,
    #[serde(default)]
    pub metrics_found: Vec<String>,
    pub metrics: Vec<Metric>,
}

impl MetricData {
    /// Find a metric by exact name.
    pub fn metric(&self, name: &str) -> Result<&Metric> {
        self.metrics
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| Error::MetricNotFound {
                name: name.to_string(),
            })
    }
}

/// A named metric and its timeslices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    #[serde(default)]
    pub timeslices: Vec<Timeslice>,
}

impl Metric {
    /// Read `key` from the first timeslice. With `summarize=true` the API
    /// returns exactly one timeslice covering the whole window.
    pub fn first_value(&self, key: &str) -> Result<f64> {
        let slice = self
            .timeslices
            .first()
            .ok_or_else(|| malformed(format!("metric {} has no timeslices", self.name)))?;
        slice
            .values
            .get(key)
            .copied()
            .ok_or_else(|| malformed(format!("metric {} has no value {}", self.name, key)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeslice {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    #[serde(default)]
    pub values: BTreeMap<String, f64>,
}

/// Error percentage over all transactions, with the metrics it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRate {
    pub percent: f64,
    pub errors: Metric,
    pub http_dispatcher: Metric,
    pub other_transaction: Metric,
}

impl ErrorRate {
    pub fn from_metric_data(data: &MetricData) -> Result<Self> {
        let errors = data.metric(ERRORS_ALL)?;
        let http_dispatcher = data.metric(HTTP_DISPATCHER)?;
        let other_transaction = data.metric(OTHER_TRANSACTION_ALL)?;

        let percent = error_rate_percent(
            errors.first_value("error_count")?,
            http_dispatcher.first_value("call_count")?,
            other_transaction.first_value("call_count")?,
        );
        Ok(Self {
            percent,
            errors: errors.clone(),
            http_dispatcher: http_dispatcher.clone(),
            other_transaction: other_transaction.clone(),
        })
    }
}

/// Server-side and end-user Apdex with their mean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApdexScore {
    pub apdex: f64,
    pub end_user: f64,
    pub average: f64,
    pub apdex_metric: Metric,
    pub end_user_metric: Metric,
}

impl ApdexScore {
    pub fn from_metric_data(data: &MetricData) -> Result<Self> {
        let apdex_metric = data.metric(APDEX)?;
        let end_user_metric = data.metric(END_USER_APDEX)?;
        let apdex = apdex_metric.first_value("score")?;
        let end_user = end_user_metric.first_value("score")?;
        Ok(Self {
            apdex,
            end_user,
            average: (apdex + end_user) / 2.0,
            apdex_metric: apdex_metric.clone(),
            end_user_metric: end_user_metric.clone(),
        })
    }
}

/// `100 * errors / (web + background calls)`; zero when there are no errors or no calls.
pub fn error_rate_percent(error_count: f64, http_dispatcher_calls: f64, other_calls: f64) -> f64 {
    let total = other_calls + http_dispatcher_calls;
    if error_count == 0.0 || total == 0.0 {
        return 0.0;
    }
    100.0 * error_count / total
}

/// The client replaces status and body with those of the response the data came from.
fn malformed(message: String) -> Error {
    Error::Remote(RemoteError::new(message, 200, String::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metric(name: &str, values: serde_json::Value) -> serde_json::Value {
        json!({
            "name": name,
            "timeslices": [{
                "from": "2024-05-01T10:00:00+00:00",
                "to": "2024-05-01T10:15:00+00:00",
                "values": values
            }]
        })
    }

    fn data(metrics: Vec<serde_json::Value>) -> MetricData {
        serde_json::from_value(json!({
            "from": "2024-05-01T10:00:00+00:00",
            "to": "2024-05-01T10:15:00+00:00",
            "metrics_not_found": [],
            "metrics_found": [],
            "metrics": metrics
        }))
        .unwrap()
    }

    #[test]
    fn error_rate_example() {
        let d = data(vec![
            metric(ERRORS_ALL, json!({"error_count": 5})),
            metric(OTHER_TRANSACTION_ALL, json!({"call_count": 95})),
            metric(HTTP_DISPATCHER, json!({"call_count": 5})),
        ]);
        let rate = ErrorRate::from_metric_data(&d).unwrap();
        assert_eq!(rate.percent, 5.0);
        assert_eq!(rate.errors.name, ERRORS_ALL);
        assert_eq!(rate.other_transaction.first_value("call_count").unwrap(), 95.0);
    }

    #[test]
    fn error_rate_divides_by_both_call_counts() {
        assert_eq!(error_rate_percent(5.0, 0.0, 95.0), 100.0 * 5.0 / 95.0);
        assert_eq!(error_rate_percent(5.0, 60.0, 40.0), 5.0);
    }

    #[test]
    fn error_rate_zero_errors() {
        assert_eq!(error_rate_percent(0.0, 10.0, 20.0), 0.0);
        assert_eq!(error_rate_percent(0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn error_rate_zero_denominator_is_zero() {
        let rate = error_rate_percent(7.0, 0.0, 0.0);
        assert_eq!(rate, 0.0);
        assert!(rate.is_finite());
    }

    #[test]
    fn error_rate_missing_metric() {
        let d = data(vec![
            metric(ERRORS_ALL, json!({"error_count": 5})),
            metric(HTTP_DISPATCHER, json!({"call_count": 1})),
        ]);
        match ErrorRate::from_metric_data(&d) {
            Err(Error::MetricNotFound { name }) => assert_eq!(name, OTHER_TRANSACTION_ALL),
            other => panic!("expected MetricNotFound, got {:?}", other),
        }
    }

    #[test]
    fn apdex_average() {
        let d = data(vec![
            metric(APDEX, json!({"score": 0.9, "s": 90, "t": 5, "f": 5})),
            metric(END_USER_APDEX, json!({"score": 0.7})),
        ]);
        let score = ApdexScore::from_metric_data(&d).unwrap();
        assert_eq!(score.apdex, 0.9);
        assert_eq!(score.end_user, 0.7);
        assert!((score.average - 0.8).abs() < 1e-12);
    }

    #[test]
    fn apdex_missing_end_user() {
        let d = data(vec![metric(APDEX, json!({"score": 0.9}))]);
        assert!(matches!(
            ApdexScore::from_metric_data(&d),
            Err(Error::MetricNotFound { .. })
        ));
    }

    #[test]
    fn missing_value_is_malformed() {
        let d = data(vec![
            metric(APDEX, json!({"count": 1})),
            metric(END_USER_APDEX, json!({"score": 1.0})),
        ]);
        match ApdexScore::from_metric_data(&d) {
            Err(Error::Remote(e)) => assert!(e.message.contains("score")),
            other => panic!("expected Remote, got {:?}", other),
        }
    }

    #[test]
    fn empty_timeslices_is_malformed() {
        let m = Metric {
            name: APDEX.to_string(),
            timeslices: vec![],
        };
        assert!(matches!(m.first_value("score"), Err(Error::Remote(_))));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let d: MetricData = serde_json::from_value(json!({
            "metrics": [{
                "name": "Apdex",
                "extra": true,
                "timeslices": [{
                    "from": "2024-05-01T10:00:00+00:00",
                    "to": "2024-05-01T10:15:00+00:00",
                    "values": {"score": 1.0},
                    "new_field": "x"
                }]
            }],
            "future": {"nested": 1}
        }))
        .unwrap();
        assert_eq!(d.metric(APDEX).unwrap().first_value("score").unwrap(), 1.0);
        assert!(d.from.is_none());
    }
}
