use std::{env, path::PathBuf, time::Duration};

use anyhow::{bail, Context};

pub const BASE_URL_VAR: &str = "SENSOR_BASE_URL";
const STATUS_INTERVAL_VAR: &str = "SENSOR_STATUS_INTERVAL_SECS";
const SENSOR_INTERVAL_VAR: &str = "SENSOR_DATA_INTERVAL_SECS";
const VIEWPORT_WIDTH_VAR: &str = "DASHBOARD_VIEWPORT_WIDTH";
const CHART_PATH_VAR: &str = "DASHBOARD_CHART_PATH";

/// Base URL captured when the crate was built, used when the runtime
/// environment does not provide one.
const BUILD_BASE_URL: Option<&str> = option_env!("SENSOR_BASE_URL");

pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_SENSOR_INTERVAL: Duration = Duration::from_secs(120);
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 800;
const DEFAULT_CHART_PATH: &str = "dashboard.svg";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub base_url: String,
    pub status_interval: Duration,
    pub sensor_interval: Duration,
    /// Visible width of the chart's scroll container, in pixels
    pub viewport_width: u32,
    pub chart_path: PathBuf,
}

impl DashboardConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        DashboardConfig {
            base_url: base_url.into(),
            status_interval: DEFAULT_STATUS_INTERVAL,
            sensor_interval: DEFAULT_SENSOR_INTERVAL,
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            chart_path: PathBuf::from(DEFAULT_CHART_PATH),
        }
    }

    /// Reads the process environment, after loading a `.env` file if one exists.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let base_url = lookup(BASE_URL_VAR)
            .or_else(|| BUILD_BASE_URL.map(str::to_owned))
            .filter(|url| !url.trim().is_empty())
            .with_context(|| format!("${BASE_URL_VAR} must be set"))?;

        let mut config = DashboardConfig::new(base_url.trim());

        if let Some(secs) = lookup(STATUS_INTERVAL_VAR) {
            config.status_interval = parse_interval(STATUS_INTERVAL_VAR, &secs)?;
        }
        if let Some(secs) = lookup(SENSOR_INTERVAL_VAR) {
            config.sensor_interval = parse_interval(SENSOR_INTERVAL_VAR, &secs)?;
        }
        if let Some(width) = lookup(VIEWPORT_WIDTH_VAR) {
            config.viewport_width = width
                .trim()
                .parse()
                .with_context(|| format!("${VIEWPORT_WIDTH_VAR} is not a pixel width: `{width}`"))?;
        }
        if let Some(path) = lookup(CHART_PATH_VAR) {
            config.chart_path = PathBuf::from(path);
        }

        Ok(config)
    }
}

fn parse_interval(var: &str, value: &str) -> anyhow::Result<Duration> {
    let secs: u64 = value
        .trim()
        .parse()
        .with_context(|| format!("${var} is not a number of seconds: `{value}`"))?;
    if secs == 0 {
        bail!("${var} must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}
