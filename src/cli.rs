//! CLI parser
use clap::Parser;
use std::path::PathBuf;

use crate::extract::OutputFormat;
use crate::gemini::ImageSize;
use crate::modes::Mode;

#[derive(Parser, Debug)]
#[command(name = "nanobanana")]
#[command(after_help = "examples:
  nanobanana --mode generate --prompt \"A banana in space\"
  nanobanana --mode generate --prompt \"Cyberpunk city\" --size 2K --preview
  nanobanana --mode edit --input photo.jpg --prompt \"Make it a watercolor painting\"
  nanobanana --mode restore --input old_photo.jpg
  nanobanana --mode generate --prompt \"Logo design\" --reference style.png --json")]
/// Generate, edit, and restore images using Google Gemini.
pub struct CliOptions {
    #[clap(long, value_enum)]
    /// Operation mode: generate (text-to-image), edit (modify existing),
    /// restore (enhance/fix)
    pub mode: Mode,

    #[clap(long)]
    /// Text prompt describing the desired image
    pub prompt: Option<String>,

    #[clap(long)]
    /// Input image path (required for edit and restore modes)
    pub input: Option<String>,

    #[clap(long = "reference")]
    /// Reference image(s) for style guidance (generate mode). Can be repeated.
    pub references: Vec<String>,

    #[clap(long)]
    /// Output file path. Defaults to an auto-named file in nanobanana-output/
    pub output: Option<PathBuf>,

    #[clap(long, value_enum, default_value_t = ImageSize::OneK)]
    /// Output image size
    pub size: ImageSize,

    #[clap(long, value_enum, default_value_t = OutputFormat::Png)]
    /// Output image format
    pub format: OutputFormat,

    #[clap(long)]
    /// Open the image after generation
    pub preview: bool,

    #[clap(long)]
    /// Output structured JSON for agent parsing
    pub json: bool,

    #[clap(long, help = "Enable debug logging", env = "NANOBANANA_DEBUG")]
    /// Enable debug logging. Env: NANOBANANA_DEBUG
    pub debug: bool,
}
