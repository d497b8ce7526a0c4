pub mod device_status;
pub mod sensor_reading;
pub mod timestamp;

pub use device_status::DeviceStatus;
pub use sensor_reading::SensorReading;
