use std::{
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use chrono::Utc;
use tokio::{
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, info, warn, Instrument};

use crate::{
    client::{Endpoint, SensorApi},
    config::DashboardConfig,
    state::DashboardState,
};

/// At most one outstanding fetch per endpoint.
#[derive(Clone, Default)]
pub struct SingleFlight {
    busy: Arc<AtomicBool>,
}

/// Held for the lifetime of one fetch; releases the guard on drop.
pub struct FlightPermit {
    busy: Arc<AtomicBool>,
}

impl SingleFlight {
    pub fn try_begin(&self) -> Option<FlightPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightPermit {
                busy: self.busy.clone(),
            })
    }

    pub fn in_flight(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for FlightPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

pub struct Poller<A> {
    api: Arc<A>,
    state: Arc<DashboardState>,
    status_interval: Duration,
    sensor_interval: Duration,
}

/// Running schedules. Dropping the handle deactivates them.
pub struct PollerHandle {
    schedules: Vec<JoinHandle<()>>,
    active: Arc<AtomicBool>,
    status_flight: SingleFlight,
    sensor_flight: SingleFlight,
}

impl<A: SensorApi> Poller<A> {
    pub fn new(api: Arc<A>, state: Arc<DashboardState>, config: &DashboardConfig) -> Self {
        Poller {
            api,
            state,
            status_interval: config.status_interval,
            sensor_interval: config.sensor_interval,
        }
    }

    /// Fetches both streams right away, then keeps fetching on the configured
    /// intervals until the returned handle is deactivated. Must be called from
    /// within a tokio runtime.
    pub fn activate(self) -> PollerHandle {
        info!(
            status_every = ?self.status_interval,
            sensor_every = ?self.sensor_interval,
            "poller activated"
        );

        let active = Arc::new(AtomicBool::new(true));
        let status_flight = SingleFlight::default();
        let sensor_flight = SingleFlight::default();

        let status_fetch = {
            let api = self.api.clone();
            let state = self.state.clone();
            let active = active.clone();
            move |permit: FlightPermit| {
                let api = api.clone();
                let state = state.clone();
                let active = active.clone();
                async move {
                    let result = api.fetch_device_status().await;
                    if !active.load(Ordering::Acquire) {
                        debug!("discarding {} response after deactivation", Endpoint::DeviceStatus);
                        return;
                    }
                    if let Err(e) = &result {
                        warn!("fetching {} failed: {e}", Endpoint::DeviceStatus);
                    }
                    state.apply_device_status(result);
                    drop(permit);
                }
            }
        };

        let sensor_fetch = {
            let api = self.api.clone();
            let state = self.state.clone();
            let active = active.clone();
            move |permit: FlightPermit| {
                let api = api.clone();
                let state = state.clone();
                let active = active.clone();
                async move {
                    let result = api.fetch_sensor_data().await;
                    let completed_at = Utc::now();
                    if !active.load(Ordering::Acquire) {
                        debug!("discarding {} response after deactivation", Endpoint::SensorData);
                        return;
                    }
                    if let Err(e) = &result {
                        warn!("fetching {} failed: {e}", Endpoint::SensorData);
                    }
                    state.apply_sensor_data(result, completed_at);
                    drop(permit);
                }
            }
        };

        let schedules = vec![
            crate::spawn(
                "status_schedule",
                schedule(
                    Endpoint::DeviceStatus,
                    self.status_interval,
                    status_flight.clone(),
                    status_fetch,
                ),
            ),
            crate::spawn(
                "sensor_schedule",
                schedule(
                    Endpoint::SensorData,
                    self.sensor_interval,
                    sensor_flight.clone(),
                    sensor_fetch,
                ),
            ),
        ];

        PollerHandle {
            schedules,
            active,
            status_flight,
            sensor_flight,
        }
    }
}

async fn schedule<F, Fut>(endpoint: Endpoint, period: Duration, flight: SingleFlight, fetch: F)
where
    F: Fn(FlightPermit) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    // The first tick completes immediately
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        match flight.try_begin() {
            Some(permit) => {
                debug!("polling {endpoint}");
                crate::spawn(
                    "fetch",
                    fetch(permit).instrument(tracing::debug_span!("fetch", %endpoint)),
                );
            }
            None => debug!("previous {endpoint} fetch still in flight, skipping tick"),
        }
    }
}

impl PollerHandle {
    /// Stops both schedules. Fetches already in flight run to completion but
    /// their results are dropped.
    pub fn deactivate(&mut self) {
        if self.active.swap(false, Ordering::AcqRel) {
            info!("poller deactivated");
        }
        for schedule in self.schedules.drain(..) {
            schedule.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn in_flight(&self, endpoint: Endpoint) -> bool {
        match endpoint {
            Endpoint::DeviceStatus => self.status_flight.in_flight(),
            Endpoint::SensorData => self.sensor_flight.in_flight(),
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.deactivate();
    }
}
