//! Error handling

use std::path::PathBuf;

use crate::constants::{API_KEY_URL, NO_IMAGE_MESSAGE};

/// Everything that can stop a run.
#[derive(Debug)]
pub enum NanobananaError {
    /// None of the API key variables were set
    MissingApiKey,
    /// A flag the selected mode needs was not given
    MissingArgument(&'static str),
    /// An absolute input path does not exist
    FileNotFound(PathBuf),
    /// A relative input name was not found in any search directory
    NotInSearchPaths {
        /// The name as the user typed it
        filename: String,
        /// Every directory that was tried, in order
        searched: Vec<PathBuf>,
    },
    /// Input or returned bytes are not an image we can handle
    ImageDecode(String),
    /// A decoded image could not be written in the output format
    ImageEncode(String),
    /// The request never got a usable answer (network, TLS, body parsing)
    Request(String),
    /// The API answered with a non-success status
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, as text
        body: String,
    },
    /// The prompt was rejected before generation
    Blocked(String),
    /// The response contained no inline image
    NoImage,
    /// Local filesystem trouble
    Io(std::io::Error),
}

impl std::fmt::Display for NanobananaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingApiKey => write!(
                f,
                "No API key found.\n\
                 Set one of: GEMINI_API_KEY, GOOGLE_API_KEY, \
                 NANOBANANA_GEMINI_API_KEY, or NANOBANANA_GOOGLE_API_KEY\n\
                 Get a key at: {API_KEY_URL}"
            ),
            Self::MissingArgument(msg) => write!(f, "{msg}"),
            Self::FileNotFound(path) => write!(f, "File not found: {}", path.display()),
            Self::NotInSearchPaths { filename, searched } => {
                write!(f, "Could not find '{filename}' in any of:")?;
                for dir in searched {
                    write!(f, "\n  {}/", dir.display())?;
                }
                Ok(())
            }
            Self::ImageDecode(msg) => write!(f, "Failed to load image: {msg}"),
            Self::ImageEncode(msg) => write!(f, "Failed to encode image: {msg}"),
            Self::Request(msg) => write!(f, "{msg}"),
            Self::Api { status, body } => write!(f, "Gemini API error {status}: {body}"),
            Self::Blocked(reason) => write!(f, "Prompt blocked: {reason}"),
            Self::NoImage => write!(f, "{NO_IMAGE_MESSAGE}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for NanobananaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for NanobananaError {
    fn from(err: std::io::Error) -> Self {
        NanobananaError::Io(err)
    }
}

impl From<reqwest::Error> for NanobananaError {
    fn from(err: reqwest::Error) -> Self {
        NanobananaError::Request(err.to_string())
    }
}

impl From<image::ImageError> for NanobananaError {
    fn from(err: image::ImageError) -> Self {
        NanobananaError::ImageDecode(err.to_string())
    }
}
