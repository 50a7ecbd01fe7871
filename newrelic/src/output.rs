//! Output formatting: plain text (human-readable) and JSON.

use newrelic_lib::{format_time, ApdexScore, ErrorRate, MetricData};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write;

/// Columns shown for application lists in plain mode.
const APP_COLUMNS: [&str; 5] = ["id", "name", "language", "health_status", "reporting"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Plain,
    /// Pretty-printed JSON
    Json,
}

/// Render any serializable result in the requested format.
pub fn render<T: Serialize>(
    value: &T,
    format: OutputFormat,
    plain: impl FnOnce(&T) -> String,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Plain => Ok(plain(value)),
        OutputFormat::Json => serde_json::to_string_pretty(value),
    }
}

/// Table of applications, one row each.
pub fn format_applications(apps: &[Value]) -> String {
    if apps.is_empty() {
        return "<no applications>\n".to_string();
    }
    let mut out = String::new();
    let header: Vec<String> = APP_COLUMNS.iter().map(|c| format!("{:<16}", c)).collect();
    let _ = writeln!(out, "{}", header.join(" ").trim_end());
    let _ = writeln!(out, "{}", "-".repeat(16 * APP_COLUMNS.len()));
    for app in apps {
        let row: Vec<String> = APP_COLUMNS
            .iter()
            .map(|c| format!("{:<16}", truncate(&scalar(app.get(*c)), 16)))
            .collect();
        let _ = writeln!(out, "{}", row.join(" ").trim_end());
    }
    out
}

/// Key/value listing of a single object, nested objects indented.
pub fn format_object(value: &Value) -> String {
    let mut out = String::new();
    write_object(value, &mut out, 0);
    out
}

fn write_object(value: &Value, out: &mut String, indent: usize) {
    let pad = "  ".repeat(indent);
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                if v.is_object() {
                    let _ = writeln!(out, "{}{}:", pad, k);
                    write_object(v, out, indent + 1);
                } else {
                    let _ = writeln!(out, "{}{}: {}", pad, k, scalar(Some(v)));
                }
            }
        }
        other => {
            let _ = writeln!(out, "{}{}", pad, scalar(Some(other)));
        }
    }
}

pub fn format_metric_data(data: &MetricData) -> String {
    let mut out = String::new();
    if let (Some(from), Some(to)) = (data.from, data.to) {
        let _ = writeln!(out, "window: {} .. {}", format_time(from), format_time(to));
    }
    for metric in &data.metrics {
        let _ = writeln!(out, "{}", metric.name);
        for slice in &metric.timeslices {
            let values: Vec<String> = slice
                .values
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            let _ = writeln!(out, "  {}  {}", format_time(slice.from), values.join(" "));
        }
    }
    if !data.metrics_not_found.is_empty() {
        let _ = writeln!(out, "not found: {}", data.metrics_not_found.join(", "));
    }
    out
}

pub fn format_error_rate(rate: &ErrorRate) -> String {
    format!("error rate: {:.2}%\n", rate.percent)
}

pub fn format_apdex(score: &ApdexScore) -> String {
    format!(
        "apdex:          {:.3}\nend-user apdex: {:.3}\naverage:        {:.3}\n",
        score.apdex, score.end_user, score.average
    )
}

fn scalar(v: Option<&Value>) -> String {
    match v {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    let s = s.replace('\n', " ");
    if s.chars().count() <= max {
        s
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn applications_table() {
        let apps = vec![
            json!({"id": 1, "name": "checkout", "language": "ruby", "health_status": "green", "reporting": true}),
            json!({"id": 2, "name": "a-very-long-application-name"}),
        ];
        let out = format_applications(&apps);
        assert!(out.starts_with("id"));
        assert!(out.contains("checkout"));
        assert!(out.contains("green"));
        assert!(out.contains("a-very-long-app…"));
        assert!(out.contains('-'));
    }

    #[test]
    fn empty_applications() {
        assert!(format_applications(&[]).contains("no applications"));
    }

    #[test]
    fn object_nested() {
        let out = format_object(&json!({"name": "checkout", "summary": {"apdex": 0.9}}));
        assert!(out.contains("name: checkout"));
        assert!(out.contains("summary:\n  apdex: 0.9"));
    }

    #[test]
    fn metric_data_lines() {
        let data: MetricData = serde_json::from_value(json!({
            "metrics_not_found": ["Bogus"],
            "metrics": [{
                "name": "HttpDispatcher",
                "timeslices": [{
                    "from": "2024-05-01T10:00:00+00:00",
                    "to": "2024-05-01T10:15:00+00:00",
                    "values": {"call_count": 10.0}
                }]
            }]
        }))
        .unwrap();
        let out = format_metric_data(&data);
        assert!(out.contains("HttpDispatcher\n  2024-05-01T10:00:00.000Z  call_count=10"));
        assert!(out.contains("not found: Bogus"));
    }

    #[test]
    fn render_json_is_pretty() {
        let v = json!({"x": 1});
        let s = render(&v, OutputFormat::Json, |_| unreachable!()).unwrap();
        assert_eq!(s, "{\n  \"x\": 1\n}");
    }

    #[test]
    fn render_plain_uses_formatter() {
        let v = json!({"x": 1});
        let s = render(&v, OutputFormat::Plain, format_object).unwrap();
        assert_eq!(s, "x: 1\n");
    }
}
