//! Pulling images out of a response and writing them to disk.

use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use clap::ValueEnum;
use image::{DynamicImage, ImageFormat};
use tracing::{debug, warn};

use crate::error::NanobananaError;
use crate::gemini::Part;
use crate::naming::OutputTarget;
use crate::report::Reporter;

/// Encoding for saved images.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Lossless, keeps transparency
    #[default]
    Png,
    /// Smaller, no alpha channel
    Jpeg,
}

impl OutputFormat {
    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
        }
    }
}

/// What to do with the images found in a response.
#[derive(Clone, Debug)]
pub struct SaveOptions {
    /// Where they go
    pub target: OutputTarget,
    /// Used when the target path's extension doesn't name a format we write
    pub format: OutputFormat,
    /// Open each saved file in the system viewer
    pub preview: bool,
}

/// Walks `parts` in order, printing text and saving every inline image.
///
/// Every image is decoded and encoded before the first file is touched, so a
/// bad part fails the run without writing anything. Returns the saved paths;
/// an empty list means the model sent no image and the caller should treat
/// the run as failed.
pub fn save_parts(
    parts: Vec<Part>,
    options: &SaveOptions,
    reporter: &Reporter,
) -> Result<Vec<PathBuf>, NanobananaError> {
    let format = options.target_format();
    let mut encoded = Vec::new();
    for part in parts {
        match part {
            Part::Text { text } => reporter.commentary(&text),
            Part::InlineData { inline_data } => {
                debug!("Image part: {}", inline_data.mime_type);
                encoded.push(encode_image(&inline_data.decode()?, format)?);
            }
            Part::Other(value) => debug!("Skipping part: {}", value),
        }
    }

    let mut saved: Vec<PathBuf> = Vec::with_capacity(encoded.len());
    for (index, bytes) in encoded.iter().enumerate() {
        match write_claimed(&options.target, index, bytes) {
            Ok(path) => saved.push(path),
            Err(err) => {
                // nothing from a failed run stays on disk
                for path in &saved {
                    let _ = std::fs::remove_file(path);
                }
                return Err(err);
            }
        }
    }

    for path in &saved {
        reporter.status(format!("Image saved to: {}", path.display()));
        if options.preview {
            open_preview(path);
        }
    }
    Ok(saved)
}

impl SaveOptions {
    /// The target path's extension if it names a format we write, else
    /// `format`.
    fn target_format(&self) -> ImageFormat {
        match self.target.extension().and_then(ImageFormat::from_extension) {
            Some(format @ (ImageFormat::Png | ImageFormat::Jpeg)) => format,
            _ => self.format.image_format(),
        }
    }
}

/// Decodes returned image bytes and re-encodes them as `format`.
fn encode_image(bytes: &[u8], format: ImageFormat) -> Result<Vec<u8>, NanobananaError> {
    let image = image::load_from_memory(bytes)?;
    let image = if format == ImageFormat::Jpeg {
        DynamicImage::ImageRgb8(image.to_rgb8())
    } else {
        image
    };

    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, format)
        .map_err(|err| NanobananaError::ImageEncode(err.to_string()))?;
    Ok(out.into_inner())
}

/// Claims the `index`th output file and writes `bytes` to it.
fn write_claimed(
    target: &OutputTarget,
    index: usize,
    bytes: &[u8],
) -> Result<PathBuf, NanobananaError> {
    let (path, file) = target.claim(index)?;
    let mut writer = BufWriter::new(file);
    let written = writer.write_all(bytes).and_then(|()| writer.flush());
    drop(writer);
    if let Err(err) = written {
        let _ = std::fs::remove_file(&path);
        return Err(err.into());
    }
    Ok(path)
}

/// Opens `path` with the platform's default viewer without waiting for it.
pub fn open_preview(path: &Path) {
    let spawned = if cfg!(target_os = "macos") {
        Command::new("open").arg(path).spawn()
    } else if cfg!(target_os = "windows") {
        Command::new("cmd").arg("/C").arg("start").arg("").arg(path).spawn()
    } else {
        Command::new("xdg-open").arg(path).spawn()
    };
    if let Err(err) = spawned {
        warn!("Could not open preview: {}", err);
    }
}
