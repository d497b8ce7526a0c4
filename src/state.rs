use std::sync::Arc;

use arc_cell::ArcCell;
use chrono::{DateTime, Utc};
use http::StatusCode;
use models::{DeviceStatus, SensorReading};
use tokio::sync::watch;
use tracing::info;

use crate::error::{FetchError, FetchResult};

/// Counts successful replacements of each slot. Renderers watch this to know
/// what changed since they last drew.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Revision {
    pub status: u64,
    pub sensor: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchFailure {
    pub at: DateTime<Utc>,
    pub status: Option<StatusCode>,
    pub message: String,
}

impl FetchFailure {
    fn new(error: &FetchError) -> Self {
        FetchFailure {
            at: Utc::now(),
            status: error.status(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct SensorSlot {
    readings: Arc<Vec<SensorReading>>,
    last_update: Option<DateTime<Utc>>,
}

/// The dashboard's in-memory state: one slot per polled stream. Each slot is
/// only ever written by its own stream and is replaced wholesale.
pub struct DashboardState {
    device_status: ArcCell<DeviceStatus>,
    sensor: ArcCell<SensorSlot>,
    status_failure: ArcCell<Option<FetchFailure>>,
    sensor_failure: ArcCell<Option<FetchFailure>>,
    revision: watch::Sender<Revision>,
}

#[derive(Clone, Debug)]
pub struct Snapshot {
    pub device_status: Arc<DeviceStatus>,
    pub readings: Arc<Vec<SensorReading>>,
    pub last_update: Option<DateTime<Utc>>,
    pub revision: Revision,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardState {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(Revision::default());
        DashboardState {
            device_status: Default::default(),
            sensor: Default::default(),
            status_failure: Default::default(),
            sensor_failure: Default::default(),
            revision,
        }
    }

    /// Returns whether the slot was replaced. A failure leaves the previous
    /// status in place and is kept for inspection.
    pub fn apply_device_status(&self, result: FetchResult<DeviceStatus>) -> bool {
        match result {
            Ok(status) => {
                self.device_status.set(Arc::new(status));
                self.status_failure.set(Arc::new(None));
                self.revision.send_modify(|r| r.status += 1);
                true
            }
            Err(e) => {
                self.status_failure.set(Arc::new(Some(FetchFailure::new(&e))));
                false
            }
        }
    }

    /// Replaces the series in full (an empty response empties it) and stamps
    /// `last_update` with `completed_at`.
    pub fn apply_sensor_data(
        &self,
        result: FetchResult<Vec<SensorReading>>,
        completed_at: DateTime<Utc>,
    ) -> bool {
        match result {
            Ok(readings) => {
                info!(points = readings.len(), "sensor series replaced");
                self.sensor.set(Arc::new(SensorSlot {
                    readings: Arc::new(readings),
                    last_update: Some(completed_at),
                }));
                self.sensor_failure.set(Arc::new(None));
                self.revision.send_modify(|r| r.sensor += 1);
                true
            }
            Err(e) => {
                self.sensor_failure.set(Arc::new(Some(FetchFailure::new(&e))));
                false
            }
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let sensor = self.sensor.get();
        Snapshot {
            device_status: self.device_status.get(),
            readings: sensor.readings.clone(),
            last_update: sensor.last_update,
            revision: self.revision(),
        }
    }

    pub fn revision(&self) -> Revision {
        *self.revision.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Revision> {
        self.revision.subscribe()
    }

    pub fn last_status_failure(&self) -> Option<FetchFailure> {
        (*self.status_failure.get()).clone()
    }

    pub fn last_sensor_failure(&self) -> Option<FetchFailure> {
        (*self.sensor_failure.get()).clone()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn reading(temperature: f64, humidity: f64) -> SensorReading {
        SensorReading::new(
            temperature,
            humidity,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn starts_offline_and_empty() {
        let state = DashboardState::new();
        let snapshot = state.snapshot();
        assert_eq!(*snapshot.device_status, DeviceStatus::new(false, false));
        assert!(snapshot.readings.is_empty());
        assert!(snapshot.last_update.is_none());
        assert_eq!(snapshot.revision, Revision::default());
    }

    #[test]
    fn status_success_replaces_slot() {
        let state = DashboardState::new();
        assert!(state.apply_device_status(Ok(DeviceStatus::new(true, true))));
        assert!(state.apply_device_status(Ok(DeviceStatus::new(false, true))));

        let snapshot = state.snapshot();
        assert_eq!(*snapshot.device_status, DeviceStatus::new(false, true));
        assert_eq!(snapshot.revision, Revision { status: 2, sensor: 0 });
        // The sensor marker belongs to the other stream
        assert!(snapshot.last_update.is_none());
    }

    #[test]
    fn status_failure_retains_previous() {
        let state = DashboardState::new();
        state.apply_device_status(Ok(DeviceStatus::new(true, true)));
        let applied = state.apply_device_status(Err(FetchError::Status(
            StatusCode::INTERNAL_SERVER_ERROR,
        )));

        assert!(!applied);
        assert_eq!(*state.snapshot().device_status, DeviceStatus::new(true, true));
        assert_eq!(state.revision().status, 1);
        let failure = state.last_status_failure().unwrap();
        assert_eq!(failure.status, Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(failure.message, "HTTP error, status: 500");

        state.apply_device_status(Ok(DeviceStatus::new(false, false)));
        assert!(state.last_status_failure().is_none());
    }

    #[test]
    fn sensor_success_sets_last_update() {
        let state = DashboardState::new();
        let completed_at = Utc::now();
        state.apply_sensor_data(Ok(vec![reading(21.5, 40.0)]), completed_at);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.readings.len(), 1);
        assert_eq!(snapshot.last_update, Some(completed_at));
        assert_eq!(snapshot.revision.sensor, 1);
    }

    #[test]
    fn sensor_failure_keeps_series_and_marker() {
        let state = DashboardState::new();
        let first = Utc::now();
        state.apply_sensor_data(Ok(vec![reading(21.5, 40.0), reading(22.0, 41.0)]), first);
        state.apply_sensor_data(
            Err(FetchError::Status(StatusCode::BAD_GATEWAY)),
            first + chrono::Duration::seconds(120),
        );

        let snapshot = state.snapshot();
        assert_eq!(snapshot.readings.len(), 2);
        assert_eq!(snapshot.last_update, Some(first));
        assert_eq!(
            state.last_sensor_failure().and_then(|f| f.status),
            Some(StatusCode::BAD_GATEWAY)
        );
    }

    #[test]
    fn empty_response_resets_series() {
        let state = DashboardState::new();
        let now = Utc::now();
        state.apply_sensor_data(Ok(vec![reading(21.5, 40.0)]), now);
        state.apply_sensor_data(Ok(vec![]), now);

        let snapshot = state.snapshot();
        assert!(snapshot.readings.is_empty());
        assert_eq!(snapshot.revision.sensor, 2);
    }

    #[tokio::test]
    async fn subscribers_see_revisions() {
        let state = DashboardState::new();
        let mut changes = state.subscribe();

        state.apply_sensor_data(Ok(vec![reading(20.0, 30.0)]), Utc::now());
        changes.changed().await.unwrap();
        assert_eq!(*changes.borrow_and_update(), Revision { status: 0, sensor: 1 });
    }
}
