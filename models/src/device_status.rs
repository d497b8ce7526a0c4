use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Power and connectivity flags as reported by the `device-status` endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub is_on: bool,
    pub wifi_connected: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::timestamp::option"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl DeviceStatus {
    pub fn new(is_on: bool, wifi_connected: bool) -> Self {
        DeviceStatus {
            is_on,
            wifi_connected,
            ..Default::default()
        }
    }
}
