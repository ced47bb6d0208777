//! Parsed animation document.
//!
//! Only the header fields the controller needs are typed; the rest of the
//! document (layers, assets, markers, ...) is carried through untouched so the
//! engine receives exactly what the host supplied.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::LoadError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationData {
    /// Bodymovin format version (`v`)
    #[serde(rename = "v", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Frame rate (`fr`)
    #[serde(rename = "fr", default, skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<f64>,
    /// In point (`ip`)
    #[serde(rename = "ip", default, skip_serializing_if = "Option::is_none")]
    pub in_point: Option<f64>,
    /// Out point (`op`)
    #[serde(rename = "op", default, skip_serializing_if = "Option::is_none")]
    pub out_point: Option<f64>,
    #[serde(rename = "w", default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(rename = "h", default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default)]
    pub layers: Vec<Value>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl AnimationData {
    /// Interpret an already-structured value as an animation document.
    pub fn from_value(value: Value) -> Result<Self, LoadError> {
        if !value.is_object() {
            return Err(LoadError::Decode {
                reason: format!("expected a JSON object, got {}", json_kind(&value)),
            });
        }
        serde_json::from_value(value).map_err(|e| LoadError::Decode {
            reason: e.to_string(),
        })
    }

    /// Decode a fetched response body.
    pub fn from_body(body: &str) -> Result<Self, LoadError> {
        let value: Value = serde_json::from_str(body).map_err(|e| LoadError::Decode {
            reason: e.to_string(),
        })?;
        Self::from_value(value)
    }

    /// Number of frames between in and out point (0 when unknown).
    #[inline]
    pub fn total_frames(&self) -> u32 {
        match (self.in_point, self.out_point) {
            (Some(ip), Some(op)) if op > ip => (op - ip).floor() as u32,
            (None, Some(op)) if op > 0.0 => op.floor() as u32,
            _ => 0,
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minimal_document_decodes() {
        let data = AnimationData::from_value(json!({"v": "5.5.0", "layers": []})).unwrap();
        assert_eq!(data.version.as_deref(), Some("5.5.0"));
        assert_eq!(data.total_frames(), 0);
    }

    #[test]
    fn frame_range_and_passthrough() {
        let data = AnimationData::from_body(
            r#"{"v":"5.7.4","fr":30,"ip":10,"op":70,"w":200,"h":100,"layers":[{"ty":4}],"assets":[],"nm":"bounce"}"#,
        )
        .unwrap();
        assert_eq!(data.total_frames(), 60);
        assert_eq!(data.rest.get("nm"), Some(&json!("bounce")));

        let round = data.to_value();
        assert_eq!(round["nm"], json!("bounce"));
        assert_eq!(round["op"], json!(70.0));
    }

    #[test]
    fn non_objects_are_decode_errors() {
        assert!(matches!(
            AnimationData::from_value(json!("https://example.com")),
            Err(LoadError::Decode { .. })
        ));
        assert!(matches!(
            AnimationData::from_body("<html>404</html>"),
            Err(LoadError::Decode { .. })
        ));
    }
}
