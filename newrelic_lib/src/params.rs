//! Typed parameters for each API operation.

use crate::query::QueryParams;
use chrono::{DateTime, Utc};

/// Filters for the application list. All optional.
#[derive(Debug, Clone, Default)]
pub struct ListApplicationsParams {
    pub name: Option<String>,
    pub host: Option<String>,
    pub ids: Vec<u64>,
    pub language: Option<String>,
    /// Additional query parameters passed through unchanged.
    pub extra: QueryParams,
}

impl ListApplicationsParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn to_query(&self) -> QueryParams {
        let mut q = QueryParams::new();
        q.set_opt("filter[name]", self.name.clone());
        q.set_opt("filter[host]", self.host.clone());
        if !self.ids.is_empty() {
            let ids: Vec<String> = self.ids.iter().map(u64::to_string).collect();
            q.set("filter[ids]", ids.join(","));
        }
        q.set_opt("filter[language]", self.language.clone());
        q.extend(&self.extra);
        q
    }
}

/// Parameters for a single application lookup.
#[derive(Debug, Clone, Default)]
pub struct ApplicationParams {
    /// Falls back to the client's default application id when unset.
    pub app_id: Option<String>,
    pub extra: QueryParams,
}

impl ApplicationParams {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: Some(app_id.into()),
            extra: QueryParams::new(),
        }
    }
}

/// Parameters for a metric data query.
#[derive(Debug, Clone, Default)]
pub struct MetricsParams {
    /// Falls back to the client's default application id when unset.
    pub app_id: Option<String>,
    /// Scope to one host. Mutually exclusive with `instance_id`.
    pub host_id: Option<String>,
    /// Scope to one instance. Mutually exclusive with `host_id`.
    pub instance_id: Option<String>,
    pub names: Vec<String>,
    pub values: Vec<String>,
    /// Window start; defaults to [`crate::helpers::DEFAULT_LOOKBACK`] before now.
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// Timeslice length in seconds.
    pub period: Option<u32>,
    pub summarize: bool,
    pub extra: QueryParams,
}

impl MetricsParams {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn app(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    #[must_use]
    pub fn host(mut self, host_id: impl Into<String>) -> Self {
        self.host_id = Some(host_id.into());
        self
    }

    #[must_use]
    pub fn instance(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = Some(instance_id.into());
        self
    }

    #[must_use]
    pub fn names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn starting_at(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    #[must_use]
    pub fn ending_at(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    #[must_use]
    pub fn period(mut self, seconds: u32) -> Self {
        self.period = Some(seconds);
        self
    }

    #[must_use]
    pub fn summarize(mut self, summarize: bool) -> Self {
        self.summarize = summarize;
        self
    }
}

/// Which entity a metric query is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricScope {
    Application,
    Host(String),
    Instance(String),
}
