//! Pure projection of a state snapshot into what the dashboard shows.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use models::{DeviceStatus, SensorReading};

use crate::state::Snapshot;

pub const HEADER: &str = "IOT Sensor";
pub const LOADING: &str = "Loading...";
/// Horizontal space given to every point of the chart, in pixels
pub const POINT_WIDTH: u32 = 80;
pub const CHART_HEIGHT: u32 = 400;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Color {
    Green,
    Red,
}

impl Color {
    fn from_flag(flag: bool) -> Self {
        if flag {
            Color::Green
        } else {
            Color::Red
        }
    }

    pub fn css(self) -> &'static str {
        match self {
            Color::Green => "green",
            Color::Red => "red",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Indicator {
    pub label: &'static str,
    pub color: Color,
}

impl Indicator {
    pub fn power(is_on: bool) -> Self {
        Indicator {
            label: if is_on { "Online" } else { "Offline" },
            color: Color::from_flag(is_on),
        }
    }

    pub fn wifi(connected: bool) -> Self {
        Indicator {
            label: if connected {
                "WiFi Connected"
            } else {
                "WiFi Not Connected"
            },
            color: Color::from_flag(connected),
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label)
    }
}

/// Latest temperature and humidity, or the loading placeholder while the
/// series is empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Summary {
    pub temperature: String,
    pub humidity: String,
}

impl Summary {
    pub fn from_readings(readings: &[SensorReading]) -> Self {
        match readings.last() {
            Some(latest) => Summary {
                temperature: format!("{}°C", latest.temperature),
                humidity: format!("{}%", latest.humidity),
            },
            None => Summary {
                temperature: LOADING.into(),
                humidity: LOADING.into(),
            },
        }
    }

    pub fn is_loading(&self) -> bool {
        self.temperature == LOADING
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChartPoint {
    pub label: String,
    pub temperature: f64,
    pub humidity: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChartSpec {
    pub points: Vec<ChartPoint>,
    pub width: u32,
    pub height: u32,
}

pub fn chart_width(points: usize) -> u32 {
    u32::try_from(points)
        .unwrap_or(u32::MAX)
        .saturating_mul(POINT_WIDTH)
}

impl ChartSpec {
    pub fn from_readings<Tz: TimeZone>(readings: &[SensorReading], tz: &Tz) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        let points = readings
            .iter()
            .map(|r| ChartPoint {
                label: format_point_label(&r.updated_at, tz),
                temperature: r.temperature,
                humidity: r.humidity,
            })
            .collect::<Vec<_>>();
        ChartSpec {
            width: chart_width(points.len()),
            height: CHART_HEIGHT,
            points,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Date and time of a reading, e.g. `1/1/2024 12:00:00 AM`.
pub fn format_point_label<Tz: TimeZone>(at: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: fmt::Display,
{
    at.with_timezone(tz)
        .format("%-m/%-d/%Y %-I:%M:%S %p")
        .to_string()
}

/// e.g. `1/1/2024, 12:00:00 AM`
pub fn format_last_update<Tz: TimeZone>(at: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: fmt::Display,
{
    at.with_timezone(tz)
        .format("%-m/%-d/%Y, %-I:%M:%S %p")
        .to_string()
}

#[derive(Clone, Debug, PartialEq)]
pub struct DashboardView {
    pub header: &'static str,
    pub power: Indicator,
    pub wifi: Indicator,
    pub summary: Summary,
    pub chart: ChartSpec,
    /// Empty until the first successful sensor fetch
    pub last_updated: String,
    pub device_reported: Option<String>,
    pub sensor_revision: u64,
}

impl DashboardView {
    pub fn project<Tz: TimeZone>(snapshot: &Snapshot, tz: &Tz) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        let DeviceStatus {
            is_on,
            wifi_connected,
            updated_at,
            ..
        } = &*snapshot.device_status;

        DashboardView {
            header: HEADER,
            power: Indicator::power(*is_on),
            wifi: Indicator::wifi(*wifi_connected),
            summary: Summary::from_readings(&snapshot.readings),
            chart: ChartSpec::from_readings(&snapshot.readings, tz),
            last_updated: snapshot
                .last_update
                .map(|at| format_last_update(&at, tz))
                .unwrap_or_default(),
            device_reported: updated_at.map(|at| format_last_update(&at, tz)),
            sensor_revision: snapshot.revision.sensor,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{FixedOffset, TimeZone};

    use super::*;
    use crate::state::Revision;

    fn reading(temperature: f64, humidity: f64, at: &str) -> SensorReading {
        SensorReading::new(temperature, humidity, models::timestamp::parse(at).unwrap())
    }

    fn snapshot(status: DeviceStatus, readings: Vec<SensorReading>) -> Snapshot {
        Snapshot {
            device_status: Arc::new(status),
            readings: Arc::new(readings),
            last_update: None,
            revision: Revision::default(),
        }
    }

    #[test]
    fn indicators_follow_flags() {
        let cases = [
            (true, true, "Online", Color::Green, "WiFi Connected", Color::Green),
            (true, false, "Online", Color::Green, "WiFi Not Connected", Color::Red),
            (false, true, "Offline", Color::Red, "WiFi Connected", Color::Green),
            (false, false, "Offline", Color::Red, "WiFi Not Connected", Color::Red),
        ];
        for (is_on, wifi, power_label, power_color, wifi_label, wifi_color) in cases {
            let view = DashboardView::project(
                &snapshot(DeviceStatus::new(is_on, wifi), vec![]),
                &Utc,
            );
            assert_eq!(view.power, Indicator { label: power_label, color: power_color });
            assert_eq!(view.wifi, Indicator { label: wifi_label, color: wifi_color });
        }
    }

    #[test]
    fn offline_with_wifi() {
        let view = DashboardView::project(&snapshot(DeviceStatus::new(false, true), vec![]), &Utc);
        assert_eq!(view.power.to_string(), "Offline");
        assert_eq!(view.power.color.css(), "red");
        assert_eq!(view.wifi.to_string(), "WiFi Connected");
        assert_eq!(view.wifi.color.css(), "green");
    }

    #[test]
    fn empty_series_shows_placeholder() {
        let view = DashboardView::project(&snapshot(DeviceStatus::default(), vec![]), &Utc);
        assert!(view.summary.is_loading());
        assert_eq!(view.summary.temperature, "Loading...");
        assert_eq!(view.summary.humidity, "Loading...");
        assert!(view.chart.is_empty());
        assert_eq!(view.chart.width, 0);
        assert_eq!(view.last_updated, "");
    }

    #[test]
    fn summary_uses_last_reading() {
        let view = DashboardView::project(
            &snapshot(
                DeviceStatus::default(),
                vec![
                    reading(19.0, 35.5, "2023-12-31T23:58:00Z"),
                    reading(21.5, 40.0, "2024-01-01T00:00:00Z"),
                ],
            ),
            &Utc,
        );
        assert_eq!(view.summary.temperature, "21.5°C");
        assert_eq!(view.summary.humidity, "40%");
    }

    #[test]
    fn chart_width_is_proportional() {
        for count in [0usize, 1, 7, 250] {
            let readings = (0..count)
                .map(|_| reading(20.0, 50.0, "2024-01-01T00:00:00Z"))
                .collect();
            let view = DashboardView::project(&snapshot(DeviceStatus::default(), readings), &Utc);
            assert_eq!(view.chart.width, count as u32 * POINT_WIDTH);
            assert_eq!(view.chart.height, CHART_HEIGHT);
            assert_eq!(view.chart.points.len(), count);
        }
    }

    #[test]
    fn labels_are_formatted_at_projection_time() {
        let at = models::timestamp::parse("2024-01-01T00:00:00Z").unwrap();
        assert_eq!(format_point_label(&at, &Utc), "1/1/2024 12:00:00 AM");

        let est = FixedOffset::west_opt(5 * 3600).unwrap();
        assert_eq!(format_point_label(&at, &est), "12/31/2023 7:00:00 PM");
        assert_eq!(format_last_update(&at, &est), "12/31/2023, 7:00:00 PM");
    }

    #[test]
    fn footer_reflects_markers() {
        let mut snap = snapshot(
            DeviceStatus {
                updated_at: Some(Utc.with_ymd_and_hms(2024, 6, 1, 13, 5, 9).unwrap()),
                ..DeviceStatus::new(true, true)
            },
            vec![],
        );
        snap.last_update = Some(Utc.with_ymd_and_hms(2024, 6, 1, 13, 6, 0).unwrap());

        let view = DashboardView::project(&snap, &Utc);
        assert_eq!(view.last_updated, "6/1/2024, 1:06:00 PM");
        assert_eq!(view.device_reported.as_deref(), Some("6/1/2024, 1:05:09 PM"));
    }
}
