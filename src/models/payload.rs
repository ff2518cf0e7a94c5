//! Typed import payloads and schema validation
//!
//! Incoming JSON is validated against an embedded JSON Schema before it is
//! deserialized, so a malformed record is rejected with a reportable reason
//! instead of reaching the store half-parsed.

use super::Stage;
use chrono::{DateTime, NaiveDateTime, Utc};
use jsonschema::Validator;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

const ORDER_SCHEMA: &str = include_str!("order.schema.json");

/// Result type for payload validation
pub type PayloadResult<T> = Result<T, PayloadError>;

/// Errors produced while validating or decoding an import record
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("schema validation failed: {0}")]
    Schema(String),

    #[error("failed to decode record: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A denormalized order as submitted by shops or import files
#[derive(Debug, Clone, Deserialize)]
pub struct OrderPayload {
    pub order_id: String,

    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,

    pub customer: CustomerPayload,
    pub total: f64,
    pub items: Vec<ItemPayload>,

    /// Pre-existing history entries; a synthetic "Order created" entry is
    /// appended during ingest when this is empty
    #[serde(default)]
    pub status_history: Vec<HistoryPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerPayload {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemPayload {
    pub name: String,
    pub quantity: u32,
    pub price: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryPayload {
    pub status: Stage,

    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,

    #[serde(default)]
    pub notes: String,
}

/// Parse a payload timestamp
///
/// Shop clients emit a mix of RFC 3339, naive ISO-8601, and
/// `YYYY-MM-DD HH:MM:SS` strings; naive timestamps are taken as UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("unrecognized timestamp format: '{}'", raw))
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// Compiled order schema used to screen records before deserialization
pub struct PayloadValidator {
    validator: Validator,
}

impl PayloadValidator {
    pub fn new() -> Self {
        let schema: Value =
            serde_json::from_str(ORDER_SCHEMA).expect("embedded order schema is valid JSON");
        let validator = Validator::new(&schema).expect("embedded order schema compiles");
        Self { validator }
    }

    /// Validate one record and decode it into a typed payload
    pub fn validate(&self, value: &Value) -> PayloadResult<OrderPayload> {
        if !value.is_object() {
            return Err(PayloadError::NotAnObject);
        }

        if let Some(error) = self.validator.iter_errors(value).next() {
            let path = error.instance_path.to_string();
            let message = if path.is_empty() {
                error.to_string()
            } else {
                format!("{}: {}", path, error)
            };
            return Err(PayloadError::Schema(message));
        }

        Ok(serde_json::from_value(value.clone())?)
    }
}

impl Default for PayloadValidator {
    fn default() -> Self {
        Self::new()
    }
}
