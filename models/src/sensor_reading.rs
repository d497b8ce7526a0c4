use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One stored measurement. The raw `updated_at` is kept as-is; display
/// formatting happens when a view is projected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Degrees Celcius
    pub temperature: f64,
    /// Relative humidity, percent
    pub humidity: f64,
    #[serde(with = "crate::timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl SensorReading {
    pub fn new(temperature: f64, humidity: f64, updated_at: DateTime<Utc>) -> Self {
        SensorReading {
            id: None,
            temperature,
            humidity,
            updated_at,
        }
    }
}
