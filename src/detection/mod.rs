//! Shapes consumed from the external detection and classification services.
//!
//! The engine never talks to a service itself. It sees detector output as the
//! plain annotation structs below (the JSON layout the vision detector emits)
//! and reaches collaborators only through the three traits in this module.

mod recorded;
mod terms;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RedactError, ServiceError};

pub use recorded::{RecordedClassification, RecordedDetections};
pub use terms::{parse_mask_texts, split_terms, ClassificationRequest};

/// One polygon vertex. Detectors omit zero coordinates, so both are optional.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vertex {
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingPoly {
    #[serde(default)]
    pub vertices: Vec<Vertex>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceAnnotation {
    #[serde(default)]
    pub bounding_poly: Option<BoundingPoly>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAnnotation {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub bounding_poly: Option<BoundingPoly>,
}

/// Error status a service reports in place of results.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ServiceStatus {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

impl ServiceStatus {
    pub fn into_error(self, service: &'static str) -> ServiceError {
        ServiceError::new(service, format!("{} (code {})", self.message, self.code))
    }
}

/// Detector response for one image.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionPayload {
    #[serde(default)]
    pub face_annotations: Vec<FaceAnnotation>,
    #[serde(default)]
    pub text_annotations: Vec<TextAnnotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ServiceStatus>,
}

/// Keys that mark a bare object as detector output
const PAYLOAD_KEYS: [&str; 3] = ["faceAnnotations", "textAnnotations", "error"];

impl DetectionPayload {
    /// Parse detector JSON, accepting either a bare payload or a batch
    /// response whose first entry is used.
    ///
    /// The root must be an object. A bare payload needs at least one of
    /// [`PAYLOAD_KEYS`]; a batch entry may be `{}`, which is how the detector
    /// reports an image with nothing found. A batch with no entries is
    /// rejected as input. A payload carrying an `error` status is a service
    /// failure, never an empty detection.
    pub fn from_json(json: &str) -> Result<Self, RedactError> {
        if json.trim().is_empty() {
            return Err(RedactError::input("Detection data is empty."));
        }
        let Value::Object(mut root) = serde_json::from_str::<Value>(json)? else {
            return Err(RedactError::input("Detection data must be a JSON object."));
        };

        let entry = match root.remove("responses") {
            Some(Value::Array(responses)) => responses
                .into_iter()
                .next()
                .ok_or_else(|| RedactError::input("Detection data has no responses."))?,
            Some(_) => return Err(RedactError::input("Detection responses must be a list.")),
            None if PAYLOAD_KEYS.iter().any(|key| root.contains_key(*key)) => Value::Object(root),
            None => return Err(RedactError::input("Detection data has no annotations.")),
        };
        if !entry.is_object() {
            return Err(RedactError::input("Detection response must be a JSON object."));
        }

        let payload: DetectionPayload = serde_json::from_value(entry)?;
        match payload.error {
            Some(status) => Err(status.into_error("detection").into()),
            None => Ok(payload),
        }
    }
}

/// Text spans found in an image, with the aggregate at index 0 removed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetectedText {
    pub annotations: Vec<TextAnnotation>,
    /// Non-empty span strings in detector order
    pub spans: Vec<String>,
}

impl DetectedText {
    pub fn from_annotations(annotations: Vec<TextAnnotation>) -> Self {
        let spans = annotations
            .iter()
            .skip(1)
            .filter_map(|a| a.description.as_deref())
            .filter(|text| !text.is_empty())
            .map(str::to_string)
            .collect();
        Self { annotations, spans }
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Comma-joined span list handed to the classifier
    pub fn context(&self) -> String {
        self.spans.join(", ")
    }
}

pub trait FaceDetector {
    fn detect_faces(&self, image: &[u8]) -> Result<Vec<FaceAnnotation>, ServiceError>;
}

pub trait TextDetector {
    /// Annotations in detector order; index 0 is the full-text aggregate.
    fn detect_text(&self, image: &[u8]) -> Result<Vec<TextAnnotation>, ServiceError>;
}

/// Decides which detected strings are sensitive.
pub trait SensitiveTextClassifier {
    fn classify(&self, request: &ClassificationRequest) -> Result<HashSet<String>, ServiceError>;
}
