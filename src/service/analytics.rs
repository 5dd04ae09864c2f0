use std::collections::BTreeMap;

use log::error;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::errors::ApiError;

/// Dashboard period selector mapped onto GA4 relative date ranges.
pub fn date_range(period: &str) -> (&'static str, &'static str) {
    match period {
        "daily" => ("1daysAgo", "today"),
        "weekly" => ("7daysAgo", "today"),
        "monthly" => ("30daysAgo", "today"),
        "6months" => ("180daysAgo", "today"),
        "yearly" => ("365daysAgo", "today"),
        _ => ("30daysAgo", "today"),
    }
}

// runReport response shape (only what the dashboard reads)

#[derive(Debug, Default, Deserialize)]
pub struct RunReportResponse {
    #[serde(default)]
    pub rows: Vec<ReportRow>,
    // only realtime reports carry totals
    #[serde(default)]
    pub totals: Vec<ReportRow>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    #[serde(default)]
    pub dimension_values: Vec<ReportValue>,
    #[serde(default)]
    pub metric_values: Vec<ReportValue>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportValue {
    #[serde(default)]
    pub value: String,
}

impl ReportRow {
    fn dimension(&self, idx: usize) -> &str {
        self.dimension_values.get(idx).map_or("", |v| v.value.as_str())
    }

    fn metric_u64(&self, idx: usize) -> u64 {
        self.metric_values
            .get(idx)
            .and_then(|v| v.value.parse().ok())
            .unwrap_or(0)
    }

    fn metric_f64(&self, idx: usize) -> f64 {
        self.metric_values
            .get(idx)
            .and_then(|v| v.value.parse().ok())
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_visitors: u64,
    pub page_views: u64,
    pub avg_session_duration: f64,
    pub bounce_rate: f64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SourceEntry {
    pub source: String,
    pub sessions: u64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PageEntry {
    pub path: String,
    pub views: u64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct DayDuration {
    pub day: String,
    pub seconds: f64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ConversionEntry {
    pub event: String,
    pub count: u64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ActivePage {
    pub path: String,
    pub users: u64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeSnapshot {
    pub active_users: u64,
    pub top_active_pages: Vec<ActivePage>,
}

fn two_decimals(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub fn reshape_overview(resp: &RunReportResponse) -> Overview {
    let row = resp.rows.first();
    Overview {
        total_visitors: row.map_or(0, |r| r.metric_u64(0)),
        page_views: row.map_or(0, |r| r.metric_u64(1)),
        avg_session_duration: two_decimals(row.map_or(0.0, |r| r.metric_f64(2))),
        bounce_rate: two_decimals(row.map_or(0.0, |r| r.metric_f64(3))),
    }
}

pub fn reshape_devices(resp: &RunReportResponse) -> BTreeMap<String, u64> {
    resp.rows
        .iter()
        .map(|r| (r.dimension(0).to_string(), r.metric_u64(0)))
        .collect()
}

pub fn reshape_sources(resp: &RunReportResponse) -> Vec<SourceEntry> {
    resp.rows
        .iter()
        .map(|r| SourceEntry {
            source: r.dimension(0).to_string(),
            sessions: r.metric_u64(0),
        })
        .collect()
}

/// Admin pages are hidden from the public top list; only five entries
/// survive the filter.
pub fn reshape_top_pages(resp: &RunReportResponse) -> Vec<PageEntry> {
    resp.rows
        .iter()
        .map(|r| PageEntry {
            path: r.dimension(0).to_string(),
            views: r.metric_u64(0),
        })
        .filter(|p| !p.path.starts_with("/admin"))
        .take(5)
        .collect()
}

// GA4 dayOfWeek dimension: 0 = Sunday.
const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub fn reshape_session_duration(resp: &RunReportResponse) -> Vec<DayDuration> {
    resp.rows
        .iter()
        .map(|r| DayDuration {
            day: r
                .dimension(0)
                .parse::<usize>()
                .ok()
                .and_then(|i| DAY_NAMES.get(i).copied())
                .unwrap_or("")
                .to_string(),
            seconds: r.metric_f64(0),
        })
        .collect()
}

/// The dashboard tracks these three events; anything else the property
/// records is ignored.
pub const CONVERSION_EVENTS: [&str; 3] = ["click", "page_view", "user_engagement"];

/// Events missing from the report come back with a zero count, so the
/// dashboard always sees all three entries.
pub fn reshape_conversions(resp: &RunReportResponse) -> Vec<ConversionEntry> {
    CONVERSION_EVENTS
        .iter()
        .map(|event| ConversionEntry {
            event: event.to_string(),
            count: resp
                .rows
                .iter()
                .find(|r| r.dimension(0) == *event)
                .map_or(0, |r| r.metric_u64(0)),
        })
        .collect()
}

pub fn reshape_realtime(resp: &RunReportResponse) -> RealtimeSnapshot {
    let active_users = resp
        .totals
        .first()
        .map(|r| r.metric_u64(0))
        .unwrap_or_else(|| resp.rows.iter().map(|r| r.metric_u64(0)).sum());
    RealtimeSnapshot {
        active_users,
        top_active_pages: resp
            .rows
            .iter()
            .map(|r| ActivePage {
                path: r.dimension(0).to_string(),
                users: r.metric_u64(0),
            })
            .collect(),
    }
}

/// GA4 Data API client (`runReport` only). The access token comes from
/// the environment; refreshing it is outside this backend.
pub struct GaClient {
    http: reqwest::Client,
    base_url: String,
    property_id: String,
    access_token: String,
}

impl GaClient {
    pub fn new(property_id: &str, access_token: &str) -> Self {
        Self::with_base_url(property_id, access_token, "https://analyticsdata.googleapis.com")
    }

    pub fn with_base_url(property_id: &str, access_token: &str, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            property_id: property_id.to_string(),
            access_token: access_token.to_string(),
        }
    }

    async fn run_report(&self, body: serde_json::Value) -> Result<RunReportResponse, ApiError> {
        self.report("runReport", body).await
    }

    async fn report(
        &self,
        kind: &str,
        body: serde_json::Value,
    ) -> Result<RunReportResponse, ApiError> {
        let url = format!(
            "{}/v1beta/properties/{}:{}",
            self.base_url, self.property_id, kind
        );
        let res = self
            .http
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("ga4 request failed: {:?}", e);
                ApiError::ServerError
            })?;
        if !res.status().is_success() {
            error!("ga4 rejected {}: {}", kind, res.status());
            return Err(ApiError::ServerError);
        }
        res.json().await.map_err(|e| {
            error!("ga4 response decode failed: {:?}", e);
            ApiError::ServerError
        })
    }

    pub async fn overview(&self, period: &str) -> Result<Overview, ApiError> {
        let (start, end) = date_range(period);
        let resp = self
            .run_report(json!({
                "dateRanges": [{ "startDate": start, "endDate": end }],
                "metrics": [
                    { "name": "totalUsers" },
                    { "name": "screenPageViews" },
                    { "name": "averageSessionDuration" },
                    { "name": "bounceRate" },
                ],
            }))
            .await?;
        Ok(reshape_overview(&resp))
    }

    pub async fn devices(&self, period: &str) -> Result<BTreeMap<String, u64>, ApiError> {
        let (start, end) = date_range(period);
        let resp = self
            .run_report(json!({
                "dateRanges": [{ "startDate": start, "endDate": end }],
                "dimensions": [{ "name": "deviceCategory" }],
                "metrics": [{ "name": "totalUsers" }],
            }))
            .await?;
        Ok(reshape_devices(&resp))
    }

    pub async fn sources(&self, period: &str) -> Result<Vec<SourceEntry>, ApiError> {
        let (start, end) = date_range(period);
        let resp = self
            .run_report(json!({
                "dateRanges": [{ "startDate": start, "endDate": end }],
                "dimensions": [{ "name": "sessionSourceMedium" }],
                "metrics": [{ "name": "sessions" }],
                "limit": 10,
            }))
            .await?;
        Ok(reshape_sources(&resp))
    }

    pub async fn top_pages(&self, period: &str) -> Result<Vec<PageEntry>, ApiError> {
        let (start, end) = date_range(period);
        let resp = self
            .run_report(json!({
                "dateRanges": [{ "startDate": start, "endDate": end }],
                "dimensions": [{ "name": "pagePath" }],
                "metrics": [{ "name": "screenPageViews" }],
                "orderBys": [{ "desc": true, "metric": { "metricName": "screenPageViews" } }],
                "limit": 10,
            }))
            .await?;
        Ok(reshape_top_pages(&resp))
    }

    /// Average session duration per day of week over the last week.
    pub async fn session_duration(&self) -> Result<Vec<DayDuration>, ApiError> {
        let resp = self
            .run_report(json!({
                "dateRanges": [{ "startDate": "7daysAgo", "endDate": "today" }],
                "dimensions": [{ "name": "dayOfWeek" }],
                "metrics": [{ "name": "averageSessionDuration" }],
            }))
            .await?;
        Ok(reshape_session_duration(&resp))
    }

    pub async fn conversions(&self) -> Result<Vec<ConversionEntry>, ApiError> {
        let resp = self
            .run_report(json!({
                "dateRanges": [{ "startDate": "30daysAgo", "endDate": "today" }],
                "dimensions": [{ "name": "eventName" }],
                "metrics": [{ "name": "eventCount" }],
                "dimensionFilter": {
                    "filter": {
                        "fieldName": "eventName",
                        "inListFilter": {
                            "values": CONVERSION_EVENTS,
                            "caseSensitive": false,
                        },
                    },
                },
            }))
            .await?;
        Ok(reshape_conversions(&resp))
    }

    /// Currently active users plus the screens they are on.
    pub async fn realtime(&self) -> Result<RealtimeSnapshot, ApiError> {
        let resp = self
            .report(
                "runRealtimeReport",
                json!({
                    "dimensions": [{ "name": "unifiedScreenName" }],
                    "metrics": [{ "name": "activeUsers" }],
                }),
            )
            .await?;
        Ok(reshape_realtime(&resp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn row(dims: &[&str], metrics: &[&str]) -> ReportRow {
        ReportRow {
            dimension_values: dims
                .iter()
                .map(|v| ReportValue { value: v.to_string() })
                .collect(),
            metric_values: metrics
                .iter()
                .map(|v| ReportValue { value: v.to_string() })
                .collect(),
        }
    }

    #[test]
    fn period_mapping_defaults_to_thirty_days() {
        assert_eq!(date_range("daily"), ("1daysAgo", "today"));
        assert_eq!(date_range("weekly"), ("7daysAgo", "today"));
        assert_eq!(date_range("yearly"), ("365daysAgo", "today"));
        assert_eq!(date_range("whatever"), ("30daysAgo", "today"));
    }

    #[test]
    fn overview_reshape_rounds_to_two_decimals() {
        let resp = RunReportResponse {
            rows: vec![row(&[], &["120", "456", "83.4567", "0.12345"])],
            ..Default::default()
        };
        assert_eq!(
            reshape_overview(&resp),
            Overview {
                total_visitors: 120,
                page_views: 456,
                avg_session_duration: 83.46,
                bounce_rate: 0.12,
            }
        );
    }

    #[test]
    fn top_pages_hide_admin_paths_and_cap_at_five() {
        let resp = RunReportResponse {
            rows: vec![
                row(&["/"], &["900"]),
                row(&["/admin"], &["800"]),
                row(&["/admin/reviews"], &["700"]),
                row(&["/tours"], &["600"]),
                row(&["/about"], &["500"]),
                row(&["/contacts"], &["400"]),
                row(&["/blog"], &["300"]),
                row(&["/faq"], &["200"]),
            ],
            ..Default::default()
        };
        let pages = reshape_top_pages(&resp);
        assert_eq!(pages.len(), 5);
        assert!(pages.iter().all(|p| !p.path.starts_with("/admin")));
        assert_eq!(pages[0].path, "/");
        assert_eq!(pages[4].path, "/blog");
    }

    #[test]
    fn session_duration_maps_day_indices_to_names() {
        let resp = RunReportResponse {
            rows: vec![row(&["0"], &["12.5"]), row(&["6"], &["40.0"])],
            ..Default::default()
        };
        assert_eq!(
            reshape_session_duration(&resp),
            vec![
                DayDuration { day: "Sun".to_string(), seconds: 12.5 },
                DayDuration { day: "Sat".to_string(), seconds: 40.0 },
            ]
        );
    }

    #[test]
    fn conversions_zero_fill_missing_events() {
        let resp = RunReportResponse {
            rows: vec![row(&["page_view"], &["72"])],
            ..Default::default()
        };
        let entries = reshape_conversions(&resp);
        assert_eq!(
            entries,
            vec![
                ConversionEntry { event: "click".to_string(), count: 0 },
                ConversionEntry { event: "page_view".to_string(), count: 72 },
                ConversionEntry { event: "user_engagement".to_string(), count: 0 },
            ]
        );
    }

    #[test]
    fn realtime_sums_rows_when_totals_are_absent() {
        let with_totals = RunReportResponse {
            rows: vec![row(&["Home"], &["3"])],
            totals: vec![row(&[], &["5"])],
        };
        assert_eq!(reshape_realtime(&with_totals).active_users, 5);

        let without = RunReportResponse {
            rows: vec![row(&["Home"], &["3"]), row(&["Tours"], &["2"])],
            ..Default::default()
        };
        let snapshot = reshape_realtime(&without);
        assert_eq!(snapshot.active_users, 5);
        assert_eq!(snapshot.top_active_pages[1].path, "Tours");
    }

    #[tokio::test]
    async fn realtime_hits_the_realtime_report_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/properties/511345803:runRealtimeReport"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "rows": [{
                    "dimensionValues": [{ "value": "Home" }],
                    "metricValues": [{ "value": "4" }],
                }],
                "totals": [{ "metricValues": [{ "value": "4" }] }],
            })))
            .mount(&server)
            .await;

        let client = GaClient::with_base_url("511345803", "tok", &server.uri());
        let snapshot = client.realtime().await.unwrap();
        assert_eq!(snapshot.active_users, 4);
        assert_eq!(
            snapshot.top_active_pages,
            vec![ActivePage { path: "Home".to_string(), users: 4 }]
        );
    }

    #[tokio::test]
    async fn overview_hits_the_property_report_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/properties/511345803:runReport"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "rows": [{ "metricValues": [
                    { "value": "10" }, { "value": "20" },
                    { "value": "1.5" }, { "value": "0.5" },
                ]}]
            })))
            .mount(&server)
            .await;

        let client = GaClient::with_base_url("511345803", "tok", &server.uri());
        let overview = client.overview("monthly").await.unwrap();
        assert_eq!(overview.total_visitors, 10);
        assert_eq!(overview.page_views, 20);
    }
}
