//! Cloud Monitoring time series queries

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::auth::TokenSource;
use crate::http;
use labeler_core::labels::{FAILURE_PREDICTION_METRIC, GCE_INSTANCE_RESOURCE, PREDICTION_VALUE_LABEL};
use labeler_core::{CloudError, TimeSeries, TimeSeriesSource, TimeWindow};

/// Cloud Monitoring API endpoint
pub const DEFAULT_MONITORING_URL: &str = "https://monitoring.googleapis.com";

const ENDPOINT: &str = "monitoring/timeSeries.list";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTimeSeriesResponse {
    #[serde(default)]
    time_series: Vec<ApiTimeSeries>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiTimeSeries {
    #[serde(default)]
    metric: ApiMetric,
}

#[derive(Debug, Default, Deserialize)]
struct ApiMetric {
    #[serde(rename = "type", default)]
    metric_type: String,
    #[serde(default)]
    labels: BTreeMap<String, String>,
}

impl From<ApiTimeSeries> for TimeSeries {
    fn from(series: ApiTimeSeries) -> Self {
        TimeSeries {
            metric_type: series.metric.metric_type,
            labels: series.metric.labels,
        }
    }
}

/// Monitoring filter selecting the failure prediction of one instance
pub fn prediction_filter(instance_id: &str) -> String {
    format!(
        "metric.type=\"{}\" AND resource.type=\"{}\" AND resource.labels.instance_id=\"{}\"",
        FAILURE_PREDICTION_METRIC, GCE_INSTANCE_RESOURCE, instance_id
    )
}

/// Cloud Monitoring API client
pub struct MonitoringClient {
    http: Client,
    base_url: String,
    tokens: Arc<TokenSource>,
}

impl MonitoringClient {
    /// Create a client for the Monitoring API at `base_url`
    pub fn new(http: Client, base_url: impl Into<String>, tokens: Arc<TokenSource>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            tokens,
        }
    }

    fn list_url(
        &self,
        project: &str,
        filter: &str,
        window: &TimeWindow,
        page_token: Option<&str>,
    ) -> Result<Url, CloudError> {
        let base = http::join(&self.base_url, &format!("v3/projects/{}/timeSeries", project));
        let mut url = Url::parse(&base).map_err(|e| CloudError::Request {
            endpoint: ENDPOINT.to_string(),
            message: e.to_string(),
        })?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("filter", filter)
                .append_pair(
                    "interval.startTime",
                    &window.start.to_rfc3339_opts(SecondsFormat::Secs, true),
                )
                .append_pair(
                    "interval.endTime",
                    &window.end.to_rfc3339_opts(SecondsFormat::Secs, true),
                )
                .append_pair("view", "HEADERS");
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }

        Ok(url)
    }
}

fn has_prediction_value(series: &TimeSeries) -> bool {
    series
        .label(PREDICTION_VALUE_LABEL)
        .is_some_and(|value| !value.is_empty())
}

#[async_trait]
impl TimeSeriesSource for MonitoringClient {
    async fn prediction_series(
        &self,
        project: &str,
        instance_id: &str,
        window: &TimeWindow,
    ) -> Result<Vec<TimeSeries>, CloudError> {
        let filter = prediction_filter(instance_id);
        let mut series = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();

        // Only the first series carrying a value is used, so later pages are not fetched
        loop {
            let url = self.list_url(project, &filter, window, page_token.as_deref())?;
            let token = self.tokens.token().await?;
            let response = http::send(self.http.get(url).bearer_auth(token), ENDPOINT).await?;
            let page: ListTimeSeriesResponse = http::json(response, ENDPOINT).await?;

            series.extend(page.time_series.into_iter().map(TimeSeries::from));
            if series.iter().any(has_prediction_value) {
                break;
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) if !seen_tokens.insert(next.clone()) => {
                    warn!(
                        instance_id = instance_id,
                        page_token = %next,
                        "Repeated page token, stopping pagination"
                    );
                    break;
                }
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        debug!(
            instance_id = instance_id,
            count = series.len(),
            "Fetched failure prediction series"
        );
        Ok(series)
    }
}
