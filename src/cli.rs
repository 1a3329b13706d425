//! Command line surface. With no subcommand the editor opens.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "masquerade",
    version,
    about = "Cover faces and sensitive text in images"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the interactive editor (default)
    Edit(EditArgs),
    /// Cover every detected face with a disc and write the result
    Faces(FacesArgs),
    /// Cover detected text the classifier marks sensitive and write the result
    Text(TextArgs),
}

#[derive(Args, Debug, Default, Clone)]
pub struct EditArgs {
    /// Image to open on startup
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Recorded detector response placing the initial face regions
    #[arg(long, requires = "image")]
    pub detections: Option<PathBuf>,

    /// Saved region list to restore instead of detecting
    #[arg(long, requires = "image", conflicts_with = "detections")]
    pub session: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct FacesArgs {
    /// Input image
    #[arg(long)]
    pub image: PathBuf,

    /// Recorded detector response (`faceAnnotations`)
    #[arg(long)]
    pub detections: PathBuf,

    /// Output path; `.jpg`/`.jpeg` selects JPEG, anything else PNG
    #[arg(long)]
    pub out: PathBuf,

    /// Draw this image inside each disc instead of a solid fill
    #[arg(long)]
    pub substitute: Option<PathBuf>,

    /// Leave the light outline off solid discs
    #[arg(long)]
    pub no_outline: bool,

    /// Also write the placed regions as JSON
    #[arg(long)]
    pub regions_out: Option<PathBuf>,

    /// JPEG quality (1-100). Defaults to the configured quality.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,
}

#[derive(Args, Debug, Clone)]
pub struct TextArgs {
    /// Input image
    #[arg(long)]
    pub image: PathBuf,

    /// Recorded detector response (`textAnnotations`)
    #[arg(long)]
    pub detections: PathBuf,

    /// Recorded classifier verdict (`{"sensitiveTexts": [...]}`)
    #[arg(long)]
    pub sensitive: Option<PathBuf>,

    /// Extra comma-separated terms to always cover; repeatable
    #[arg(long = "mask-text")]
    pub mask_text: Vec<String>,

    /// JSON list of `{"text": "a, b"}` entries or plain strings to always cover
    #[arg(long)]
    pub mask_texts_json: Option<PathBuf>,

    /// One term to leave visible, compared ignoring case
    #[arg(long)]
    pub exclude: Option<String>,

    /// Output path; `.jpg`/`.jpeg` selects JPEG, anything else PNG
    #[arg(long)]
    pub out: PathBuf,

    /// JPEG quality (1-100). Defaults to the configured quality.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_opens_editor() {
        let cli = Cli::try_parse_from(["masquerade"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_text_collects_repeated_terms() {
        let cli = Cli::try_parse_from([
            "masquerade",
            "text",
            "--image",
            "in.png",
            "--detections",
            "vision.json",
            "--mask-text",
            "alice, bob",
            "--mask-text",
            "carol",
            "--out",
            "out.jpg",
        ])
        .unwrap();
        let Some(Command::Text(args)) = cli.command else {
            panic!("expected text command");
        };
        assert_eq!(args.mask_text, vec!["alice, bob", "carol"]);
        assert!(args.sensitive.is_none());
    }

    #[test]
    fn test_quality_out_of_range_is_rejected() {
        let result = Cli::try_parse_from([
            "masquerade",
            "faces",
            "--image",
            "in.png",
            "--detections",
            "vision.json",
            "--out",
            "out.jpg",
            "--quality",
            "101",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_edit_session_conflicts_with_detections() {
        let result = Cli::try_parse_from([
            "masquerade",
            "edit",
            "--image",
            "in.png",
            "--detections",
            "a.json",
            "--session",
            "b.json",
        ]);
        assert!(result.is_err());
    }
}
