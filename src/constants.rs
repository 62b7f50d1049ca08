//! Shared constants/setters for things
//!

/// Model used when `NANOBANANA_MODEL` is not set
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";

/// Environment variable that overrides the model
pub const MODEL_ENV_VAR: &str = "NANOBANANA_MODEL";

/// Environment variables checked for the API key, in order of precedence.
pub const API_KEY_ENV_VARS: [&str; 4] = [
    "NANOBANANA_GEMINI_API_KEY",
    "NANOBANANA_GOOGLE_API_KEY",
    "GEMINI_API_KEY",
    "GOOGLE_API_KEY",
];

/// Base URL of the Gemini REST API.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Where we put generated images unless told otherwise
pub const OUTPUT_DIR: &str = "nanobanana-output";

/// Longest stem produced from a prompt.
pub const MAX_FILENAME_LEN: usize = 32;

/// Stem used when a prompt has nothing usable in it.
pub const FALLBACK_STEM: &str = "generated_image";

/// Prompt for `--mode edit` without `--prompt`.
pub const DEFAULT_EDIT_PROMPT: &str = "Edit this image";

/// Prompt for `--mode restore` without `--prompt`.
pub const DEFAULT_RESTORE_PROMPT: &str =
    "Restore and enhance this image. Fix any artifacts, improve clarity and quality.";

/// Reported when the service answered without any inline image.
pub const NO_IMAGE_MESSAGE: &str = "No image was generated in the response.";

/// Where users can get an API key.
pub const API_KEY_URL: &str = "https://aistudio.google.com/apikey";
