use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEVICE_FIELD: &str = "device";
pub const SENSOR_DATA_FIELD: &str = "sensorData";

/// A persisted device document, as returned by every store operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    #[serde(rename = "_id")]
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(rename = "sensorData", default)]
    pub sensor_data: Vec<Value>,
}

impl DeviceRecord {
    pub fn new(id: i64, document: DeviceDocument) -> Self {
        DeviceRecord {
            id,
            device: document.device,
            sensor_data: document.sensor_data,
        }
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.device.as_deref() == Some(name)
    }

    /// Shallow merge, fields missing in the patch stay untouched
    pub fn merge(&mut self, patch: DevicePatch) {
        if let Some(device) = patch.device {
            self.device = Some(device);
        }
        if let Some(sensor_data) = patch.sensor_data {
            self.sensor_data = sensor_data;
        }
    }
}

/// A validated, not yet persisted device
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceDocument {
    pub device: Option<String>,
    pub sensor_data: Vec<Value>,
}

impl DeviceDocument {
    pub fn from_json(body: Value) -> Result<Self, ValidationError> {
        let patch = DevicePatch::from_json(body)?;
        Ok(DeviceDocument {
            device: patch.device,
            sensor_data: patch.sensor_data.unwrap_or_default(),
        })
    }
}

/// A validated partial update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DevicePatch {
    pub device: Option<String>,
    pub sensor_data: Option<Vec<Value>>,
}

impl DevicePatch {
    /// Casts the known fields and drops everything else, including `_id`
    pub fn from_json(body: Value) -> Result<Self, ValidationError> {
        let mut fields: Map<String, Value> = match body {
            Value::Object(fields) => fields,
            other => return Err(ValidationError::NotAnObject(json_type(&other))),
        };

        let device = fields.remove(DEVICE_FIELD).map(cast_device).transpose()?;
        let sensor_data = fields
            .remove(SENSOR_DATA_FIELD)
            .map(cast_sensor_data)
            .transpose()?;

        Ok(DevicePatch {
            device,
            sensor_data,
        })
    }
}

fn cast_device(value: Value) -> Result<String, ValidationError> {
    match value {
        Value::String(name) => Ok(name),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        other => Err(ValidationError::InvalidType {
            field: DEVICE_FIELD,
            expected: "string",
            found: json_type(&other),
        }),
    }
}

fn cast_sensor_data(value: Value) -> Result<Vec<Value>, ValidationError> {
    match value {
        Value::Array(values) => Ok(values),
        other => Err(ValidationError::InvalidType {
            field: SENSOR_DATA_FIELD,
            expected: "array",
            found: json_type(&other),
        }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_defaults_sensor_data() {
        let doc = DeviceDocument::from_json(json!({ "device": "field-3" })).unwrap();
        assert_eq!(Some("field-3".to_owned()), doc.device);
        assert!(doc.sensor_data.is_empty());
    }

    #[test]
    fn test_document_drops_unknown_fields() {
        let doc = DeviceDocument::from_json(json!({
            "_id": 99,
            "device": "scd-1",
            "sensorData": [1, "two", { "three": 3 }],
            "owner": "nobody",
        }))
        .unwrap();

        let record = DeviceRecord::new(1, doc);
        let serialized = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json!({ "_id": 1, "device": "scd-1", "sensorData": [1, "two", { "three": 3 }] }),
            serialized
        );
    }

    #[test]
    fn test_device_is_cast_to_string() {
        let patch = DevicePatch::from_json(json!({ "device": 42 })).unwrap();
        assert_eq!(Some("42".to_owned()), patch.device);
        assert_eq!(None, patch.sensor_data);
    }

    #[test]
    fn test_invalid_types_are_rejected() {
        let err = DevicePatch::from_json(json!({ "sensorData": 20 })).unwrap_err();
        assert_eq!(
            ValidationError::InvalidType {
                field: SENSOR_DATA_FIELD,
                expected: "array",
                found: "number",
            },
            err
        );

        assert!(DevicePatch::from_json(json!({ "device": null })).is_err());
        assert!(DevicePatch::from_json(json!({ "device": ["a"] })).is_err());
        assert!(DevicePatch::from_json(json!([1, 2])).is_err());
    }

    #[test]
    fn test_merge_keeps_missing_fields() {
        let mut record = DeviceRecord::new(
            7,
            DeviceDocument {
                device: Some("field-3".to_owned()),
                sensor_data: vec![json!(12), json!(14)],
            },
        );
        let patch = DevicePatch::from_json(json!({ "sensorData": [20] })).unwrap();
        record.merge(patch);

        assert_eq!(7, record.id);
        assert!(record.is_named("field-3"));
        assert_eq!(vec![json!(20)], record.sensor_data);
    }

    #[test]
    fn test_record_without_device_omits_field() {
        let record = DeviceRecord::new(3, DeviceDocument::default());
        let serialized = serde_json::to_value(&record).unwrap();
        assert_eq!(json!({ "_id": 3, "sensorData": [] }), serialized);
        assert!(!record.is_named(""));
    }
}
