use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::handlers::AppState;
use crate::store::ReadingLog;
use crate::validate;

/// One telemetry stream's reading shape.
///
/// Ties the untrusted POST payload to the stored form and picks the log
/// that owns the stream, so a single pair of handlers serves every stream.
pub trait Reading: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Stream name used in log lines and error bodies.
    const STREAM: &'static str;

    /// Build a reading from a payload, stamping the server-assigned time.
    /// `Err` carries the message for the 400 response.
    fn from_payload(payload: &Value, time: String) -> Result<Self, String>;

    fn log(state: &AppState) -> &ReadingLog<Self>;
}

/// Environmental reading pushed by sensor nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorReading {
    pub time: String,
    pub temperature: f64,
    pub humidity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub light: Option<f64>,
}

impl Reading for SensorReading {
    const STREAM: &'static str = "sensor";

    fn from_payload(payload: &Value, time: String) -> Result<Self, String> {
        let temperature = validate::coerce(payload.get("temperature")).require();
        let humidity = validate::coerce(payload.get("humidity")).require();
        let (Some(temperature), Some(humidity)) = (temperature, humidity) else {
            return Err("temperature and humidity are required numbers".into());
        };
        // `light` is best-effort: a missing or unusable value is dropped,
        // it never fails the request.
        let light = validate::coerce(payload.get("light")).optional();
        Ok(Self {
            time,
            temperature,
            humidity,
            light,
        })
    }

    fn log(state: &AppState) -> &ReadingLog<Self> {
        &state.sensor
    }
}

/// Distance reading pushed by the ultrasonic node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceReading {
    pub time: String,
    pub distance_cm: f64,
}

impl Reading for DistanceReading {
    const STREAM: &'static str = "distance";

    fn from_payload(payload: &Value, time: String) -> Result<Self, String> {
        let Some(distance_cm) = validate::coerce(payload.get("distance_cm")).require() else {
            return Err("distance_cm is required number".into());
        };
        Ok(Self { time, distance_cm })
    }

    fn log(state: &AppState) -> &ReadingLog<Self> {
        &state.distance
    }
}
