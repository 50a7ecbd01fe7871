//! HTTP client for the New Relic REST API v2.

use crate::config::ClientConfig;
use crate::error::{Error, RemoteError, Result};
use crate::helpers::{default_from, format_time};
use crate::models::{ApdexScore, ErrorRate, MetricData, APDEX_METRICS, ERROR_RATE_METRICS};
use crate::params::{ApplicationParams, ListApplicationsParams, MetricScope, MetricsParams};
use crate::query::QueryParams;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client as HttpClient;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// A successful response: status, raw body, and the parsed JSON.
struct RawResponse {
    status: u16,
    body: String,
    json: Value,
}

/// New Relic API client.
///
/// Cloning is cheap: clones share the connection pool, configuration and
/// cancellation token.
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    headers: HeaderMap,
    http: HttpClient,
    cancel: CancellationToken,
}

impl Client {
    /// Create a client from a validated configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut api_key = HeaderValue::from_str(config.api_key())
            .map_err(|_| Error::Configuration("API key is not a valid header value".into()))?;
        api_key.set_sensitive(true);
        let user_agent = HeaderValue::from_str(config.user_agent())
            .map_err(|_| Error::Configuration("user agent is not a valid header value".into()))?;

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, api_key);
        headers.insert(USER_AGENT, user_agent);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = HttpClient::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            config: Arc::new(config),
            headers,
            http,
            cancel: CancellationToken::new(),
        })
    }

    /// Create a client with only an API key and default settings.
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self> {
        Self::new(ClientConfig::builder(api_key).build()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Token observed by every call made through this client and its clones.
    /// Cancelling it fails in-flight and later calls with [`Error::Cancelled`].
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// A clone of this client that observes `token` instead.
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            cancel: token,
            ..self.clone()
        }
    }

    /// List applications. Returns the single response page unmodified.
    pub async fn list_applications(&self, params: &ListApplicationsParams) -> Result<Vec<Value>> {
        let res = self.get(&paths::applications(), &params.to_query()).await?;
        let (status, body) = (res.status, res.body.clone());
        match take_field(res, "applications")? {
            Value::Array(apps) => Ok(apps),
            _ => Err(Error::Remote(RemoteError::new(
                "unexpected type for applications",
                status,
                body,
            ))),
        }
    }

    /// Get a single application by ID.
    pub async fn get_application(&self, params: &ApplicationParams) -> Result<Value> {
        let app_id = self.resolve_app_id(params.app_id.as_deref())?;
        let res = self.get(&paths::application(&app_id), &params.extra).await?;
        take_field(res, "application")
    }

    /// Get metric timeslice data for an application, host or instance.
    pub async fn get_metrics(&self, params: &MetricsParams) -> Result<MetricData> {
        self.fetch_metrics(params).await.map(|(data, _, _)| data)
    }

    /// Metric data together with the status and raw body it was parsed from.
    async fn fetch_metrics(&self, params: &MetricsParams) -> Result<(MetricData, u16, String)> {
        let app_id = self.resolve_app_id(params.app_id.as_deref())?;
        let scope = self.resolve_scope(params)?;
        let query = metrics_query(params, Utc::now())?;
        let res = self
            .get(&paths::metric_data(&app_id, &scope), &query)
            .await?;
        let (status, body) = (res.status, res.body.clone());
        let data = take_field(res, "metric_data")?;
        match serde_json::from_value(data) {
            Ok(data) => Ok((data, status, body)),
            Err(e) => Err(Error::Remote(RemoteError::new(
                format!("unexpected metric_data: {}", e),
                status,
                body,
            ))),
        }
    }

    /// Error percentage over web and background transactions.
    pub async fn get_error_rate(&self, params: &MetricsParams) -> Result<ErrorRate> {
        let params = MetricsParams {
            names: ERROR_RATE_METRICS.iter().map(|s| s.to_string()).collect(),
            values: Vec::new(),
            summarize: true,
            ..params.clone()
        };
        let (data, status, body) = self.fetch_metrics(&params).await?;
        ErrorRate::from_metric_data(&data).map_err(|e| with_response(e, status, body))
    }

    /// Server-side and end-user Apdex, with their mean.
    pub async fn get_apdex_score(&self, params: &MetricsParams) -> Result<ApdexScore> {
        let params = MetricsParams {
            names: APDEX_METRICS.iter().map(|s| s.to_string()).collect(),
            values: Vec::new(),
            summarize: true,
            ..params.clone()
        };
        let (data, status, body) = self.fetch_metrics(&params).await?;
        ApdexScore::from_metric_data(&data).map_err(|e| with_response(e, status, body))
    }

    /// Issue one GET for `path` (relative to the API base) and return the parsed body.
    pub async fn call(&self, path: &str, params: &QueryParams) -> Result<Value> {
        Ok(self.get(path, params).await?.json)
    }

    async fn get(&self, path: &str, params: &QueryParams) -> Result<RawResponse> {
        let mut url = self
            .config
            .base_url()
            .join(path)
            .map_err(|e| Error::InvalidArgument(format!("invalid path {:?}: {}", path, e)))?;
        if !params.is_empty() {
            url.set_query(Some(&params.to_query_string()));
        }
        debug!(path, "GET");
        self.send(self.auth(self.http.get(url))).await
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.headers(self.headers.clone())
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<RawResponse> {
        let exchange = async {
            let res = req.send().await.map_err(|e| self.transport_error(e))?;
            let status = res.status();
            let body = res.text().await.map_err(|e| self.transport_error(e))?;
            debug!(status = status.as_u16(), "response");
            if !status.is_success() {
                let msg = remote_message(&body)
                    .or_else(|| status.canonical_reason().map(String::from))
                    .unwrap_or_else(|| "API request failed".to_string());
                return Err(Error::Remote(RemoteError::new(msg, status.as_u16(), body)));
            }
            match serde_json::from_str::<Value>(&body) {
                Ok(json) => Ok(RawResponse {
                    status: status.as_u16(),
                    body,
                    json,
                }),
                Err(e) => Err(Error::Remote(RemoteError::new(
                    format!("response body is not valid JSON: {}", e),
                    status.as_u16(),
                    body,
                ))),
            }
        };
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        self.cancel
            .run_until_cancelled(exchange)
            .await
            .unwrap_or(Err(Error::Cancelled))
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout(self.config.timeout())
        } else {
            Error::from(err)
        }
    }

    fn resolve_app_id(&self, app_id: Option<&str>) -> Result<String> {
        app_id
            .or(self.config.default_application_id())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .ok_or_else(|| Error::InvalidArgument("application id is required".to_string()))
    }

    fn resolve_scope(&self, params: &MetricsParams) -> Result<MetricScope> {
        // Config defaults apply only when the call names neither a host nor an instance.
        let (host, instance) = if params.host_id.is_some() || params.instance_id.is_some() {
            (params.host_id.as_deref(), params.instance_id.as_deref())
        } else {
            (
                self.config.default_host_id(),
                self.config.default_instance_id(),
            )
        };
        match (host, instance) {
            (Some(_), Some(_)) => Err(Error::InvalidArgument(
                "host_id and instance_id are mutually exclusive".to_string(),
            )),
            (Some(h), None) => non_blank(h, "host id").map(MetricScope::Host),
            (None, Some(i)) => non_blank(i, "instance id").map(MetricScope::Instance),
            (None, None) => Ok(MetricScope::Application),
        }
    }
}

/// Typed path builders, one per endpoint.
mod paths {
    use crate::params::MetricScope;

    pub(super) fn applications() -> String {
        "applications.json".to_string()
    }

    pub(super) fn application(app_id: &str) -> String {
        format!("applications/{}.json", urlencoding::encode(app_id))
    }

    pub(super) fn metric_data(app_id: &str, scope: &MetricScope) -> String {
        let suffix = match scope {
            MetricScope::Application => String::new(),
            MetricScope::Host(id) => format!("/hosts/{}", urlencoding::encode(id)),
            MetricScope::Instance(id) => format!("/instances/{}", urlencoding::encode(id)),
        };
        format!(
            "applications/{}{}/metrics/data.json",
            urlencoding::encode(app_id),
            suffix
        )
    }
}

fn metrics_query(params: &MetricsParams, now: DateTime<Utc>) -> Result<QueryParams> {
    let mut q = params.extra.clone();
    if !params.names.is_empty() {
        q.set("names", params.names.clone());
    }
    if !params.values.is_empty() {
        q.set("values", params.values.clone());
    }
    // A `from` passed through `extra` is sent as-is and cannot be compared.
    let from = match params.from {
        Some(from) => Some(from),
        None if q.contains("from") => None,
        None => Some(default_from(now)),
    };
    if let (Some(from), Some(to)) = (from, params.to) {
        if from >= to {
            let reason = if params.from.is_some() {
                "from must be before to".to_string()
            } else {
                format!("to must be after the default from ({})", format_time(from))
            };
            return Err(Error::InvalidArgument(reason));
        }
    }
    q.set_opt("from", from.map(format_time));
    q.set_opt("to", params.to.map(format_time));
    q.set_opt("period", params.period);
    if params.summarize {
        q.set("summarize", true);
    }
    Ok(q)
}

fn take_field(mut res: RawResponse, field: &str) -> Result<Value> {
    match res.json.get_mut(field).map(Value::take) {
        Some(Value::Null) | None => Err(Error::Remote(RemoteError::new(
            format!("response has no {} field", field),
            res.status,
            res.body,
        ))),
        Some(value) => Ok(value),
    }
}

/// Attach the response a derivation failed on to a malformed-body error.
fn with_response(err: Error, status: u16, body: String) -> Error {
    match err {
        Error::Remote(mut e) => {
            e.status_code = status;
            e.body = body;
            Error::Remote(e)
        }
        other => other,
    }
}

/// Extract `error.title` from the API's error envelope.
fn remote_message(body: &str) -> Option<String> {
    let data: Value = serde_json::from_str(body).ok()?;
    data.get("error")
        .and_then(|e| e.get("title"))
        .and_then(|t| t.as_str())
        .map(String::from)
}

fn non_blank(id: &str, what: &str) -> Result<String> {
    let id = id.trim();
    if id.is_empty() {
        return Err(Error::InvalidArgument(format!("{} must not be empty", what)));
    }
    Ok(id.to_string())
}
