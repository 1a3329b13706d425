//! Detectors and classifiers backed by previously captured JSON responses.
//!
//! These let the engine run offline against saved service output, which is
//! how the command line and the editor's import dialog feed it.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use super::{
    ClassificationRequest, DetectionPayload, FaceAnnotation, FaceDetector, SensitiveTextClassifier, ServiceStatus,
    TextAnnotation, TextDetector,
};
use crate::error::{RedactError, ServiceError};

/// Replays a captured detector response for every image.
#[derive(Debug, Clone, Default)]
pub struct RecordedDetections {
    payload: DetectionPayload,
}

impl RecordedDetections {
    pub fn new(payload: DetectionPayload) -> Self {
        Self { payload }
    }

    pub fn from_json(json: &str) -> Result<Self, RedactError> {
        DetectionPayload::from_json(json).map(Self::new)
    }

    pub fn load(path: &Path) -> Result<Self, RedactError> {
        let json = fs::read_to_string(path)?;
        let recorded = Self::from_json(&json)?;
        info!(
            "Loaded {} face and {} text annotations from {:?}",
            recorded.payload.face_annotations.len(),
            recorded.payload.text_annotations.len(),
            path
        );
        Ok(recorded)
    }

    pub fn payload(&self) -> &DetectionPayload {
        &self.payload
    }
}

impl FaceDetector for RecordedDetections {
    fn detect_faces(&self, _image: &[u8]) -> Result<Vec<FaceAnnotation>, ServiceError> {
        Ok(self.payload.face_annotations.clone())
    }
}

impl TextDetector for RecordedDetections {
    fn detect_text(&self, _image: &[u8]) -> Result<Vec<TextAnnotation>, ServiceError> {
        Ok(self.payload.text_annotations.clone())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassifierResponse {
    #[serde(default)]
    sensitive_texts: Option<Vec<String>>,
    #[serde(default)]
    error: Option<ServiceStatus>,
}

/// Replays a captured classifier verdict: `{ "sensitiveTexts": [...] }`.
#[derive(Debug, Clone, Default)]
pub struct RecordedClassification {
    sensitive: HashSet<String>,
}

impl RecordedClassification {
    pub fn new(sensitive: impl IntoIterator<Item = String>) -> Self {
        Self {
            sensitive: sensitive.into_iter().collect(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, RedactError> {
        let response: ClassifierResponse = serde_json::from_str(json)?;
        if let Some(status) = response.error {
            return Err(status.into_error("classification").into());
        }
        let sensitive = response
            .sensitive_texts
            .ok_or_else(|| RedactError::input("Classifier data has no sensitiveTexts list."))?;
        Ok(Self::new(sensitive))
    }

    pub fn load(path: &Path) -> Result<Self, RedactError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

impl SensitiveTextClassifier for RecordedClassification {
    fn classify(&self, _request: &ClassificationRequest) -> Result<HashSet<String>, ServiceError> {
        Ok(self.sensitive.clone())
    }
}
