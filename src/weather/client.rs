//! Open-Meteo HTTP client.

use std::time::Duration;

use chrono::{Days, NaiveDate};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use super::{
    ArchivePayload, ArchiveResponse, CurrentConditions, CurrentResponse, WeatherRecord,
    archive_query, current_query,
};
use crate::cities::City;
use crate::config::FetchConfig;

/// Weather ingestion failure.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("weather service answered {0}")]
    Status(StatusCode),
    #[error("still rate limited after {0} attempts")]
    RateLimited(u32),
    #[error("expected {expected} locations in the answer, got {actual}")]
    LocationCount { expected: usize, actual: usize },
    #[error("no weather data was fetched for any city")]
    NoData,
    #[error(transparent)]
    Write(#[from] crate::error::CorpusError),
}

/// What to do after a non-success status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    /// Sleep and try again.
    Retry,
    /// Give up on the chunk.
    Abort,
}

/// Only rate limiting is worth waiting out.
pub fn classify(status: StatusCode) -> StatusAction {
    if status == StatusCode::TOO_MANY_REQUESTS {
        StatusAction::Retry
    } else {
        StatusAction::Abort
    }
}

/// Linear backoff: `(attempt + 1) × step`, attempts counted from 0.
pub fn backoff_delay(attempt: u32, step: Duration) -> Duration {
    step * (attempt + 1)
}

/// Inclusive `(start, end)` window of `history_days` ending
/// `end_offset_days` before `today`.
pub fn history_window(
    today: NaiveDate,
    history_days: u32,
    end_offset_days: u32,
) -> (NaiveDate, NaiveDate) {
    let end = today
        .checked_sub_days(Days::new(u64::from(end_offset_days)))
        .unwrap_or(today);
    let start = end
        .checked_sub_days(Days::new(u64::from(history_days)))
        .unwrap_or(end);
    (start, end)
}

/// Thin wrapper over a `reqwest::Client` carrying the fetch settings.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: Client,
    config: FetchConfig,
}

impl WeatherClient {
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the TLS backend cannot be initialised.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("sunsight/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }

    /// Fetches hourly history for every city between `start` and `end`.
    ///
    /// Cities are requested in chunks. A chunk that fails (non-429 status,
    /// exhausted retries, transport or decode error, wrong location count)
    /// is skipped with a warning and the job carries on.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::NoData` if no city yielded any rows.
    pub async fn fetch_history(
        &self,
        cities: &[City],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WeatherRecord>, FetchError> {
        let start = start.format("%Y-%m-%d").to_string();
        let end = end.format("%Y-%m-%d").to_string();
        let chunk_size = self.config.chunk_size.max(1);
        let n_chunks = cities.len().div_ceil(chunk_size);
        let mut records = Vec::new();

        for (i, chunk) in cities.chunks(chunk_size).enumerate() {
            let chunk: Vec<&City> = chunk.iter().collect();
            let names: Vec<_> = chunk.iter().map(|c| c.name).collect();
            info!(chunk = i + 1, of = n_chunks, cities = ?names, "fetching weather history");

            match self.fetch_chunk(&chunk, &start, &end).await {
                Ok(results) => {
                    for (city, result) in chunk.iter().zip(results) {
                        let rows = result
                            .hourly
                            .map(|h| h.into_records(city.name))
                            .unwrap_or_default();
                        if rows.is_empty() {
                            warn!(city = city.name, "no hourly data returned, skipping city");
                            continue;
                        }
                        debug!(city = city.name, rows = rows.len(), "received hourly rows");
                        records.extend(rows);
                    }
                }
                Err(e) => warn!(chunk = i + 1, error = %e, "skipping chunk"),
            }

            if i + 1 < n_chunks {
                tokio::time::sleep(Duration::from_secs(self.config.pause_secs)).await;
            }
        }

        if records.is_empty() {
            return Err(FetchError::NoData);
        }
        info!(rows = records.len(), "weather history complete");
        Ok(records)
    }

    /// One archive request with rate-limit retries.
    async fn fetch_chunk(
        &self,
        chunk: &[&City],
        start: &str,
        end: &str,
    ) -> Result<Vec<ArchiveResponse>, FetchError> {
        let query = archive_query(chunk, start, end);
        let step = Duration::from_secs(self.config.backoff_step_secs);

        for attempt in 0..self.config.retries {
            let response = self
                .http
                .get(&self.config.archive_url)
                .query(&query)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                match classify(status) {
                    StatusAction::Retry => {
                        let wait = backoff_delay(attempt, step);
                        warn!(attempt = attempt + 1, wait_secs = wait.as_secs(), "rate limited");
                        tokio::time::sleep(wait).await;
                        continue;
                    }
                    StatusAction::Abort => return Err(FetchError::Status(status)),
                }
            }

            let results = response.json::<ArchivePayload>().await?.into_vec();
            if results.len() != chunk.len() {
                return Err(FetchError::LocationCount {
                    expected: chunk.len(),
                    actual: results.len(),
                });
            }
            return Ok(results);
        }

        Err(FetchError::RateLimited(self.config.retries))
    }

    /// Current conditions at a coordinate.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport failure, a non-success status or an
    /// undecodable body.
    pub async fn fetch_current(&self, lat: f64, lon: f64) -> Result<CurrentConditions, FetchError> {
        let response = self
            .http
            .get(&self.config.forecast_url)
            .query(&current_query(lat, lon))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        Ok(response.json::<CurrentResponse>().await?.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cities::CATALOG;
    use mockito::{Matcher, Server};

    fn config_for(server: &Server) -> FetchConfig {
        FetchConfig {
            archive_url: format!("{}/v1/archive", server.url()),
            forecast_url: format!("{}/v1/forecast", server.url()),
            chunk_size: 2,
            retries: 2,
            backoff_step_secs: 0,
            pause_secs: 0,
            ..FetchConfig::default()
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
    }

    const TWO_CITIES: &str = r#"[
        {"hourly": {"time": ["2024-01-01T00:00"], "temperature_2m": [11.0],
            "shortwave_radiation": [0.0], "relativehumidity_2m": [70],
            "cloudcover": [5], "windspeed_10m": [4.0]}},
        {"hourly": {"time": ["2024-01-01T00:00"], "temperature_2m": [24.0],
            "shortwave_radiation": [0.0], "relativehumidity_2m": [65],
            "cloudcover": [20], "windspeed_10m": [9.0]}}
    ]"#;

    #[test]
    fn backoff_grows_linearly() {
        let step = Duration::from_secs(10);
        assert_eq!(backoff_delay(0, step), Duration::from_secs(10));
        assert_eq!(backoff_delay(2, step), Duration::from_secs(30));
    }

    #[test]
    fn only_rate_limit_is_retried() {
        assert_eq!(classify(StatusCode::TOO_MANY_REQUESTS), StatusAction::Retry);
        assert_eq!(classify(StatusCode::BAD_REQUEST), StatusAction::Abort);
        assert_eq!(classify(StatusCode::SERVICE_UNAVAILABLE), StatusAction::Abort);
    }

    #[test]
    fn history_window_ends_before_today() {
        let (start, end) = history_window(date("2025-03-10"), 1095, 2);
        assert_eq!(end, date("2025-03-08"));
        assert_eq!(start, date("2022-03-09"));
    }

    #[tokio::test]
    async fn history_collects_rows_per_city() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/archive")
            .match_query(Matcher::UrlEncoded("latitude".into(), "28.70,19.07".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(TWO_CITIES)
            .create_async()
            .await;

        let client = WeatherClient::new(config_for(&server)).expect("client");
        let rows = client
            .fetch_history(&CATALOG[..2], date("2024-01-01"), date("2024-01-01"))
            .await
            .expect("history");

        mock.assert_async().await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].city, "Delhi");
        assert_eq!(rows[1].city, "Mumbai");
        assert_eq!(rows[1].wind_speed, Some(9.0));
    }

    #[tokio::test]
    async fn rate_limit_is_retried_then_succeeds() {
        let mut server = Server::new_async().await;
        let limited = server
            .mock("GET", "/v1/archive")
            .match_query(Matcher::Any)
            .with_status(429)
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/v1/archive")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(TWO_CITIES)
            .create_async()
            .await;

        let client = WeatherClient::new(config_for(&server)).expect("client");
        let rows = client
            .fetch_history(&CATALOG[..2], date("2024-01-01"), date("2024-01-01"))
            .await
            .expect("history");

        limited.assert_async().await;
        ok.assert_async().await;
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn failing_chunks_are_skipped_and_no_data_is_fatal() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/archive")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error": true, "reason": "bad"}"#)
            .expect(2)
            .create_async()
            .await;

        let client = WeatherClient::new(config_for(&server)).expect("client");
        let err = client
            .fetch_history(&CATALOG[..4], date("2024-01-01"), date("2024-01-01"))
            .await;
        assert!(matches!(err, Err(FetchError::NoData)));
    }

    #[tokio::test]
    async fn rate_limited_chunk_is_skipped_and_others_kept() {
        let mut server = Server::new_async().await;
        let limited = server
            .mock("GET", "/v1/archive")
            .match_query(Matcher::UrlEncoded("latitude".into(), "28.70,19.07".into()))
            .with_status(429)
            .expect(2)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/v1/archive")
            .match_query(Matcher::UrlEncoded("latitude".into(), "22.57,13.08".into()))
            .with_status(200)
            .with_body(TWO_CITIES)
            .expect(1)
            .create_async()
            .await;

        let client = WeatherClient::new(config_for(&server)).expect("client");
        let rows = client
            .fetch_history(&CATALOG[..4], date("2024-01-01"), date("2024-01-01"))
            .await
            .expect("second chunk should survive");

        limited.assert_async().await;
        ok.assert_async().await;
        let cities: Vec<_> = rows.iter().map(|r| r.city.as_str()).collect();
        assert_eq!(cities, ["Kolkata", "Chennai"]);
    }

    #[tokio::test]
    async fn failed_chunk_does_not_sink_the_job() {
        let mut server = Server::new_async().await;
        let _bad = server
            .mock("GET", "/v1/archive")
            .match_query(Matcher::UrlEncoded("latitude".into(), "28.70,19.07".into()))
            .with_status(500)
            .expect(1)
            .create_async()
            .await;
        let _good = server
            .mock("GET", "/v1/archive")
            .match_query(Matcher::UrlEncoded("latitude".into(), "22.57,13.08".into()))
            .with_status(200)
            .with_body(TWO_CITIES)
            .create_async()
            .await;

        let client = WeatherClient::new(config_for(&server)).expect("client");
        let rows = client
            .fetch_history(&CATALOG[..4], date("2024-01-01"), date("2024-01-01"))
            .await
            .expect("second chunk should survive");
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.city != "Delhi" && r.city != "Mumbai"));
    }

    #[tokio::test]
    async fn short_answer_skips_the_chunk() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/archive")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"[{"hourly": {"time": ["2024-01-01T00:00"]}}]"#)
            .create_async()
            .await;

        let client = WeatherClient::new(config_for(&server)).expect("client");
        let err = client
            .fetch_history(&CATALOG[..2], date("2024-01-01"), date("2024-01-01"))
            .await;
        assert!(matches!(err, Err(FetchError::NoData)));
    }

    #[tokio::test]
    async fn current_conditions_are_decoded() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/forecast")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"current": {"temperature_2m": 30.0, "shortwave_radiation": 640.0,
                    "relative_humidity_2m": 55, "cloud_cover": 12, "wind_speed_10m": 7.4}}"#,
            )
            .create_async()
            .await;

        let client = WeatherClient::new(config_for(&server)).expect("client");
        let current = client.fetch_current(28.6, 77.2).await.expect("current");
        assert!((current.to_observation().irradiation - 0.64).abs() < 1e-12);
    }
}
