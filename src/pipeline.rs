//! End-to-end redaction flows over one uploaded image.
//!
//! Input is validated and decoded before any collaborator is called, so a bad
//! upload never costs a detector round trip. Nothing partial is returned: each
//! flow either yields complete output or an error.

use std::collections::HashSet;

use image::RgbaImage;
use tracing::info;

use crate::compositor::{self, ExportFormat, RenderOptions, TextStyle};
use crate::detection::{ClassificationRequest, DetectedText, FaceDetector, SensitiveTextClassifier, TextDetector};
use crate::error::Result;
use crate::geometry::{self, TextRedaction};
use crate::mask::{FillMode, MaskRegion};
use crate::session::EditingSession;

/// Decoded image plus detector-placed regions, ready for interactive editing.
#[derive(Debug, Clone)]
pub struct PreparedFaces {
    pub image: RgbaImage,
    pub regions: Vec<MaskRegion>,
    pub width: u32,
    pub height: u32,
}

impl PreparedFaces {
    /// Hand the regions to a new editing session, keeping the image for rendering.
    pub fn into_session(self) -> (RgbaImage, EditingSession) {
        let session = EditingSession::new(self.regions, self.width, self.height);
        (self.image, session)
    }
}

/// Output of the direct face pipeline
#[derive(Debug, Clone)]
pub struct FaceRedaction {
    pub output: Vec<u8>,
    pub regions: Vec<MaskRegion>,
    pub width: u32,
    pub height: u32,
}

/// Caller choices for the text pipeline
#[derive(Debug, Clone, Default)]
pub struct TextRedactionRequest {
    /// Terms always treated as sensitive
    pub extra_terms: Vec<String>,
    /// A single term to leave visible, compared ignoring case
    pub excluded_text: Option<String>,
    pub style: TextStyle,
    pub format: ExportFormat,
}

/// Result of the text pipeline. No text at all is reported apart from a
/// rendered result with zero redactions.
#[derive(Debug, Clone)]
pub enum TextOutcome {
    NoTextDetected,
    Redacted {
        output: Vec<u8>,
        redactions: Vec<TextRedaction>,
    },
}

/// Detect faces and turn them into editable regions.
pub fn prepare_faces(image_bytes: &[u8], detector: &dyn FaceDetector, fill: &FillMode) -> Result<PreparedFaces> {
    let image = compositor::decode(image_bytes)?;
    let faces = detector.detect_faces(image_bytes)?;
    let regions = geometry::faces_to_regions_with_fill(&faces, fill);
    info!(
        "Detected {} faces, placed {} regions on {}x{} image",
        faces.len(),
        regions.len(),
        image.width(),
        image.height()
    );

    let (width, height) = image.dimensions();
    Ok(PreparedFaces {
        image,
        regions,
        width,
        height,
    })
}

/// Detect faces and composite discs over them in one pass.
pub fn redact_faces(
    image_bytes: &[u8],
    detector: &dyn FaceDetector,
    fill: &FillMode,
    options: &RenderOptions,
    format: ExportFormat,
) -> Result<FaceRedaction> {
    let prepared = prepare_faces(image_bytes, detector, fill)?;
    let rendered = compositor::render(&prepared.image, &prepared.regions, options);
    Ok(FaceRedaction {
        output: compositor::encode(&rendered, format)?,
        regions: prepared.regions,
        width: prepared.width,
        height: prepared.height,
    })
}

/// Detect text, classify it and cover every sensitive span.
pub fn redact_text(
    image_bytes: &[u8],
    detector: &dyn TextDetector,
    classifier: &dyn SensitiveTextClassifier,
    request: &TextRedactionRequest,
) -> Result<TextOutcome> {
    let image = compositor::decode(image_bytes)?;

    let detected = DetectedText::from_annotations(detector.detect_text(image_bytes)?);
    if detected.is_empty() {
        info!("No text detected in the image");
        return Ok(TextOutcome::NoTextDetected);
    }

    let classification = ClassificationRequest::new(detected.context(), request.extra_terms.clone());
    let mut sensitive: HashSet<String> = classifier.classify(&classification)?;
    sensitive.extend(request.extra_terms.iter().cloned());

    let redactions = geometry::text_to_redactions(&detected.annotations, &sensitive, request.excluded_text.as_deref());
    info!(
        "{} of {} text spans marked sensitive, {} redactions drawn",
        sensitive.len(),
        detected.spans.len(),
        redactions.len()
    );

    let rendered = compositor::render_text_redactions(&image, &redactions, &request.style);
    Ok(TextOutcome::Redacted {
        output: compositor::encode(&rendered, request.format)?,
        redactions,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use image::Rgba;

    use super::*;
    use crate::detection::{BoundingPoly, FaceAnnotation, TextAnnotation, Vertex};
    use crate::error::{RedactError, ServiceError};
    use crate::geometry::Point;

    struct FakeFaces {
        faces: Vec<FaceAnnotation>,
        calls: Cell<usize>,
    }

    impl FakeFaces {
        fn new(faces: Vec<FaceAnnotation>) -> Self {
            Self {
                faces,
                calls: Cell::new(0),
            }
        }
    }

    impl FaceDetector for FakeFaces {
        fn detect_faces(&self, _image: &[u8]) -> std::result::Result<Vec<FaceAnnotation>, ServiceError> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.faces.clone())
        }
    }

    struct FailingDetector;

    impl FaceDetector for FailingDetector {
        fn detect_faces(&self, _image: &[u8]) -> std::result::Result<Vec<FaceAnnotation>, ServiceError> {
            Err(ServiceError::new("face detection", "deadline exceeded"))
        }
    }

    impl TextDetector for FailingDetector {
        fn detect_text(&self, _image: &[u8]) -> std::result::Result<Vec<TextAnnotation>, ServiceError> {
            Err(ServiceError::new("text detection", "deadline exceeded"))
        }
    }

    struct FakeText(Vec<TextAnnotation>);

    impl TextDetector for FakeText {
        fn detect_text(&self, _image: &[u8]) -> std::result::Result<Vec<TextAnnotation>, ServiceError> {
            Ok(self.0.clone())
        }
    }

    /// Returns a fixed set and remembers the request it saw
    struct FakeClassifier {
        sensitive: Vec<&'static str>,
        seen: std::cell::RefCell<Option<ClassificationRequest>>,
    }

    impl FakeClassifier {
        fn new(sensitive: Vec<&'static str>) -> Self {
            Self {
                sensitive,
                seen: std::cell::RefCell::new(None),
            }
        }
    }

    impl SensitiveTextClassifier for FakeClassifier {
        fn classify(&self, request: &ClassificationRequest) -> std::result::Result<HashSet<String>, ServiceError> {
            *self.seen.borrow_mut() = Some(request.clone());
            Ok(self.sensitive.iter().map(|s| s.to_string()).collect())
        }
    }

    fn poly(points: &[(f32, f32)]) -> BoundingPoly {
        BoundingPoly {
            vertices: points.iter().map(|&(x, y)| Vertex { x: Some(x), y: Some(y) }).collect(),
        }
    }

    fn span(text: &str, points: &[(f32, f32)]) -> TextAnnotation {
        TextAnnotation {
            description: Some(text.to_string()),
            bounding_poly: Some(poly(points)),
        }
    }

    fn png(width: u32, height: u32) -> (RgbaImage, Vec<u8>) {
        let image = RgbaImage::from_fn(width, height, |x, y| Rgba([(x % 200) as u8, (y % 200) as u8, 40, 255]));
        let bytes = compositor::encode(&image, ExportFormat::Png).unwrap();
        (image, bytes)
    }

    #[test]
    fn test_end_to_end_face_scenario() {
        let (base, bytes) = png(1000, 800);
        let detector = FakeFaces::new(vec![FaceAnnotation {
            bounding_poly: Some(poly(&[(400.0, 300.0), (600.0, 300.0), (600.0, 500.0), (400.0, 500.0)])),
        }]);

        let prepared = prepare_faces(&bytes, &detector, &FillMode::default()).unwrap();
        assert_eq!((prepared.width, prepared.height), (1000, 800));
        assert_eq!(prepared.regions.len(), 1);
        let region = &prepared.regions[0];
        assert!(matches!(region.fill, FillMode::SolidColor(_)));
        assert_eq!(region.center, Point::new(500.0, 400.0));
        assert!((region.radius() - 80.0).abs() < 1e-4);

        let result = redact_faces(&bytes, &detector, &FillMode::default(), &RenderOptions::default(), ExportFormat::Png)
            .unwrap();
        assert_eq!((result.width, result.height), (1000, 800));
        let output = compositor::decode(&result.output).unwrap();
        for (x, y, px) in output.enumerate_pixels() {
            let clear = Point::new(x as f32 + 0.5, y as f32 + 0.5).distance(region.center) > region.radius() + 0.5;
            if clear {
                assert_eq!(px, base.get_pixel(x, y));
            }
        }
        assert_ne!(output.get_pixel(500, 400), base.get_pixel(500, 400));
    }

    #[test]
    fn test_empty_upload_is_rejected_before_detection() {
        let detector = FakeFaces::new(vec![]);
        let err = prepare_faces(&[], &detector, &FillMode::default()).unwrap_err();
        assert!(matches!(err, RedactError::Input(_)));
        assert_eq!(detector.calls.get(), 0);

        let err = prepare_faces(b"garbage", &detector, &FillMode::default()).unwrap_err();
        assert!(matches!(err, RedactError::Decode(_)));
        assert_eq!(detector.calls.get(), 0);

        let classifier = FakeClassifier::new(vec![]);
        let err = redact_text(&[], &FailingDetector, &classifier, &TextRedactionRequest::default()).unwrap_err();
        assert!(matches!(err, RedactError::Input(_)));
        assert!(classifier.seen.borrow().is_none());
    }

    #[test]
    fn test_detector_failure_is_a_service_error() {
        let (_, bytes) = png(10, 10);
        let err = prepare_faces(&bytes, &FailingDetector, &FillMode::default()).unwrap_err();
        assert!(err.is_service_failure());
        assert_eq!(err.user_message(), "Processing failed. Please try again.");
    }

    #[test]
    fn test_zero_faces_is_a_valid_result() {
        let (_, bytes) = png(20, 20);
        let prepared = prepare_faces(&bytes, &FakeFaces::new(vec![]), &FillMode::default()).unwrap();
        assert!(prepared.regions.is_empty());

        let (_, session) = prepared.into_session();
        assert!(session.current_regions().is_empty());
        assert_eq!(session.mapper().image_size(), (20.0, 20.0));
    }

    #[test]
    fn test_text_pipeline_redacts_only_sensitive_spans() {
        let (base, bytes) = png(120, 60);
        let detector = FakeText(vec![
            span("full text", &[(0.0, 0.0), (120.0, 0.0), (120.0, 60.0), (0.0, 60.0)]),
            span("foo@bar.com", &[(10.0, 10.0), (50.0, 10.0), (50.0, 20.0), (10.0, 20.0)]),
            span("John Smith", &[(10.0, 40.0), (50.0, 40.0), (50.0, 50.0), (10.0, 50.0)]),
        ]);
        let classifier = FakeClassifier::new(vec!["foo@bar.com"]);

        let outcome = redact_text(&bytes, &detector, &classifier, &TextRedactionRequest::default()).unwrap();
        let TextOutcome::Redacted { output, redactions } = outcome else {
            panic!("expected a rendered result");
        };
        assert_eq!(redactions.len(), 1);
        assert_eq!(redactions[0].source_text, "foo@bar.com");

        let output = compositor::decode(&output).unwrap();
        assert_eq!(*output.get_pixel(30, 15), Rgba([255, 0, 0, 255]));
        assert_eq!(output.get_pixel(30, 45), base.get_pixel(30, 45));

        let seen = classifier.seen.borrow().clone().unwrap();
        assert_eq!(seen.context, "foo@bar.com, John Smith");
    }

    #[test]
    fn test_extra_terms_are_always_redacted() {
        let (_, bytes) = png(60, 60);
        let detector = FakeText(vec![
            span("all", &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]),
            span("acme", &[(10.0, 10.0), (30.0, 10.0), (30.0, 20.0), (10.0, 20.0)]),
        ]);
        let classifier = FakeClassifier::new(vec![]);
        let request = TextRedactionRequest {
            extra_terms: vec!["acme".into()],
            ..Default::default()
        };

        let TextOutcome::Redacted { redactions, .. } = redact_text(&bytes, &detector, &classifier, &request).unwrap()
        else {
            panic!("expected a rendered result");
        };
        assert_eq!(redactions.len(), 1);
        assert_eq!(classifier.seen.borrow().as_ref().unwrap().extra_terms, vec!["acme"]);
    }

    #[test]
    fn test_excluded_text_stays_visible() {
        let (_, bytes) = png(60, 60);
        let detector = FakeText(vec![
            span("all", &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]),
            span("Yumemi", &[(10.0, 10.0), (30.0, 10.0), (30.0, 20.0), (10.0, 20.0)]),
        ]);
        let classifier = FakeClassifier::new(vec!["Yumemi"]);
        let request = TextRedactionRequest {
            excluded_text: Some("yumemi".into()),
            ..Default::default()
        };

        let TextOutcome::Redacted { redactions, .. } = redact_text(&bytes, &detector, &classifier, &request).unwrap()
        else {
            panic!("expected a rendered result");
        };
        assert!(redactions.is_empty());
    }

    #[test]
    fn test_no_text_is_reported_distinctly() {
        let (_, bytes) = png(10, 10);
        let classifier = FakeClassifier::new(vec![]);
        let outcome = redact_text(&bytes, &FakeText(vec![]), &classifier, &TextRedactionRequest::default()).unwrap();
        assert!(matches!(outcome, TextOutcome::NoTextDetected));
        assert!(classifier.seen.borrow().is_none());
    }

    #[test]
    fn test_text_detector_failure_propagates() {
        let (_, bytes) = png(10, 10);
        let classifier = FakeClassifier::new(vec![]);
        let err = redact_text(&bytes, &FailingDetector, &classifier, &TextRedactionRequest::default()).unwrap_err();
        assert!(err.is_service_failure());
    }
}
