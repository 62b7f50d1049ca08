//! Config handling

use std::path::PathBuf;

use tracing::debug;
use tracing::log::LevelFilter;

use crate::constants::{
    API_KEY_ENV_VARS, DEFAULT_MODEL, GEMINI_API_BASE, MODEL_ENV_VAR, OUTPUT_DIR,
};
use crate::error::NanobananaError;
use crate::locate::SearchPaths;

/// Sets up logging based on the debug flag
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let mut logger = simple_logger::SimpleLogger::new().with_level(level);
    if !debug {
        logger = logger
            .with_module_level("tracing", LevelFilter::Warn)
            .with_module_level("reqwest", LevelFilter::Info)
            .with_module_level("rustls", LevelFilter::Info)
            .with_module_level("hyper_util", LevelFilter::Info);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// Everything read from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Gemini API key
    pub api_key: String,
    /// Model identifier, eg `gemini-2.5-flash-image`
    pub model: String,
    /// API base URL, without a trailing slash
    pub api_base: String,
    /// Where auto-named images go
    pub output_dir: PathBuf,
    /// Where relative input names are looked up
    pub search_paths: SearchPaths,
}

impl Config {
    /// Builds a config with default model, endpoint and directories.
    pub fn new(api_key: impl Into<String>) -> Self {
        let output_dir = PathBuf::from(OUTPUT_DIR);
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            api_base: GEMINI_API_BASE.to_string(),
            search_paths: SearchPaths::standard(&output_dir),
            output_dir,
        }
    }

    /// Reads the API key and model override from the process environment.
    pub fn from_env() -> Result<Self, NanobananaError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::from_env`], with a pluggable variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, NanobananaError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (var, api_key) = API_KEY_ENV_VARS
            .iter()
            .find_map(|name| {
                lookup(name)
                    .filter(|value| !value.is_empty())
                    .map(|value| (*name, value))
            })
            .ok_or(NanobananaError::MissingApiKey)?;
        debug!("Using API key from {}", var);

        let mut config = Self::new(api_key);
        if let Some(model) = lookup(MODEL_ENV_VAR).filter(|value| !value.is_empty()) {
            debug!("Model overridden to {}", model);
            config.model = model;
        }
        Ok(config)
    }
}
