use std::{fmt, future::Future};

use chrono::Utc;
use models::{DeviceStatus, SensorReading};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{FetchError, FetchResult};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    DeviceStatus,
    SensorData,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::DeviceStatus => "device-status",
            Endpoint::SensorData => "sensor-data",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// `{base}/{endpoint}?_ts={epoch_millis}`. The timestamp only exists to
/// defeat intermediate caches.
pub fn cache_busted_url(base_url: &str, endpoint: Endpoint, epoch_millis: i64) -> String {
    let base = base_url.trim_end_matches('/');
    format!("{base}/{endpoint}?_ts={epoch_millis}")
}

/// The two read-only calls the dashboard polls.
pub trait SensorApi: Send + Sync + 'static {
    fn fetch_device_status(&self) -> impl Future<Output = FetchResult<DeviceStatus>> + Send;
    fn fetch_sensor_data(&self) -> impl Future<Output = FetchResult<Vec<SensorReading>>> + Send;
}

#[derive(Clone)]
pub struct HttpSensorApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSensorApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpSensorApi {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: Endpoint) -> FetchResult<T> {
        let url = cache_busted_url(&self.base_url, endpoint, Utc::now().timestamp_millis());
        debug!(%url, "fetching {endpoint}");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| FetchError::Decode {
            endpoint: endpoint.path(),
            source,
            body,
        })
    }
}

impl SensorApi for HttpSensorApi {
    async fn fetch_device_status(&self) -> FetchResult<DeviceStatus> {
        self.get_json(Endpoint::DeviceStatus).await
    }

    async fn fetch_sensor_data(&self) -> FetchResult<Vec<SensorReading>> {
        self.get_json(Endpoint::SensorData).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_has_cache_buster() {
        assert_eq!(
            cache_busted_url("http://sensor.local:8000", Endpoint::DeviceStatus, 1_700_000_000_000),
            "http://sensor.local:8000/device-status?_ts=1700000000000"
        );
    }

    #[test]
    fn url_tolerates_trailing_slash() {
        assert_eq!(
            cache_busted_url("https://api.example.com/iot/", Endpoint::SensorData, 42),
            "https://api.example.com/iot/sensor-data?_ts=42"
        );
    }
}
