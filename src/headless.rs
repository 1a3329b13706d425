//! Runs the redaction pipelines from files without opening a window.

use std::fs;
use std::path::Path;

use masquerade::compositor::{ExportFormat, RenderOptions};
use masquerade::detection::{
    parse_mask_texts, split_terms, RecordedClassification, RecordedDetections,
};
use masquerade::mask::{FillMode, SubstituteImage};
use masquerade::persistence::{load_image_file, SavedSession};
use masquerade::pipeline::{self, TextOutcome, TextRedactionRequest};
use masquerade::Result;
use tracing::info;

use crate::cli::{FacesArgs, TextArgs};
use crate::config::AppConfigData;

/// What a headless run produced, for the final status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunSummary {
    Faces { regions: usize },
    Text { redactions: usize },
    NoTextDetected,
}

impl RunSummary {
    pub fn message(&self) -> String {
        match self {
            RunSummary::Faces { regions } => format!("Covered {} faces", regions),
            RunSummary::Text { redactions } => format!("Covered {} text spans", redactions),
            RunSummary::NoTextDetected => "No text detected in the image".to_string(),
        }
    }
}

/// Format implied by the output file name, quality from the flag or config.
fn output_format(out: &Path, quality: Option<u8>, config: &AppConfigData) -> ExportFormat {
    let quality = quality.unwrap_or(config.jpeg_quality);
    match out.extension().and_then(|e| e.to_str()) {
        Some(ext) => ExportFormat::from_extension(ext, quality),
        None => config.export_format(),
    }
}

pub fn run_faces(args: &FacesArgs, config: &AppConfigData) -> Result<RunSummary> {
    let image_bytes = fs::read(&args.image)?;
    let detector = RecordedDetections::load(&args.detections)?;

    let fill = match &args.substitute {
        Some(path) => FillMode::SubstituteImage(SubstituteImage::new(
            load_image_file(path)?,
            Some(path.clone()),
        )),
        None => config.solid_fill(),
    };
    let options = RenderOptions {
        draw_outline: config.export_outline && !args.no_outline,
    };
    let format = output_format(&args.out, args.quality, config);

    let result = pipeline::redact_faces(&image_bytes, &detector, &fill, &options, format)?;
    fs::write(&args.out, &result.output)?;
    info!("Wrote {:?}", args.out);

    if let Some(regions_out) = &args.regions_out {
        SavedSession::new(&result.regions, result.width, result.height)
            .with_image_path(Some(args.image.clone()))
            .save(regions_out)?;
    }

    Ok(RunSummary::Faces {
        regions: result.regions.len(),
    })
}

pub fn run_text(args: &TextArgs, config: &AppConfigData) -> Result<RunSummary> {
    let image_bytes = fs::read(&args.image)?;
    let detector = RecordedDetections::load(&args.detections)?;
    let classifier = match &args.sensitive {
        Some(path) => RecordedClassification::load(path)?,
        None => RecordedClassification::default(),
    };

    let mut extra_terms = split_terms(&args.mask_text);
    if let Some(path) = &args.mask_texts_json {
        extra_terms.extend(parse_mask_texts(&fs::read_to_string(path)?)?);
    }

    let request = TextRedactionRequest {
        extra_terms,
        excluded_text: args.exclude.clone(),
        style: config.text_style(),
        format: output_format(&args.out, args.quality, config),
    };

    match pipeline::redact_text(&image_bytes, &detector, &classifier, &request)? {
        TextOutcome::NoTextDetected => Ok(RunSummary::NoTextDetected),
        TextOutcome::Redacted { output, redactions } => {
            fs::write(&args.out, output)?;
            info!("Wrote {:?}", args.out);
            Ok(RunSummary::Text {
                redactions: redactions.len(),
            })
        }
    }
}
