//! The three modes and the pipeline they share.

use std::path::PathBuf;

use clap::ValueEnum;
use tracing::{debug, info};

use crate::cli::CliOptions;
use crate::config::Config;
use crate::constants::{DEFAULT_EDIT_PROMPT, DEFAULT_RESTORE_PROMPT};
use crate::error::NanobananaError;
use crate::extract::{OutputFormat, SaveOptions, save_parts};
use crate::gemini::{GenerationRequest, ImageService, ImageSize, InputImage};
use crate::locate::find_input_file;
use crate::naming::OutputTarget;
use crate::report::{Outcome, Reporter};

/// What the run should do.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Mode {
    /// Text to image, optionally guided by reference images
    Generate,
    /// Change an existing image according to the prompt
    Edit,
    /// Edit with a restoration prompt by default
    Restore,
}

/// Everything one invocation asked for.
#[derive(Clone, Debug)]
pub struct Job {
    /// Selected mode
    pub mode: Mode,
    /// `--prompt`
    pub prompt: Option<String>,
    /// `--input`, as typed
    pub input: Option<String>,
    /// `--reference`, as typed
    pub references: Vec<String>,
    /// `--output`
    pub output: Option<PathBuf>,
    /// `--size`
    pub size: ImageSize,
    /// `--format`
    pub format: OutputFormat,
    /// `--preview`
    pub preview: bool,
}

impl From<&CliOptions> for Job {
    fn from(cli: &CliOptions) -> Self {
        Self {
            mode: cli.mode,
            prompt: cli.prompt.clone(),
            input: cli.input.clone(),
            references: cli.references.clone(),
            output: cli.output.clone(),
            size: cli.size,
            format: cli.format,
            preview: cli.preview,
        }
    }
}

impl Job {
    /// A job with defaults for everything but the mode.
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            prompt: None,
            input: None,
            references: Vec::new(),
            output: None,
            size: ImageSize::default(),
            format: OutputFormat::default(),
            preview: false,
        }
    }

    /// Checks that the mode's required flags are present and fills in the
    /// default prompt for edit and restore.
    pub fn validate(&self) -> Result<Plan<'_>, NanobananaError> {
        let prompt = self.prompt.as_deref().filter(|prompt| !prompt.is_empty());
        let input = self.input.as_deref().filter(|input| !input.is_empty());
        match (self.mode, input) {
            (Mode::Generate, _) => prompt.map(|prompt| Plan::Generate { prompt }).ok_or(
                NanobananaError::MissingArgument("--prompt is required for generate mode"),
            ),
            (Mode::Edit, Some(input)) => Ok(Plan::Edit {
                input,
                prompt: prompt.unwrap_or(DEFAULT_EDIT_PROMPT),
            }),
            (Mode::Restore, Some(input)) => Ok(Plan::Edit {
                input,
                prompt: prompt.unwrap_or(DEFAULT_RESTORE_PROMPT),
            }),
            (Mode::Edit | Mode::Restore, None) => Err(NanobananaError::MissingArgument(
                "--input is required for edit and restore modes",
            )),
        }
    }

    fn target(&self, config: &Config, prompt: &str) -> Result<OutputTarget, NanobananaError> {
        match &self.output {
            Some(path) => OutputTarget::explicit(path.clone()),
            None => Ok(OutputTarget::auto(
                &config.output_dir,
                prompt,
                self.format.extension(),
            )),
        }
    }

    fn save_options(&self, target: OutputTarget) -> SaveOptions {
        SaveOptions {
            target,
            format: self.format,
            preview: self.preview,
        }
    }
}

/// What a validated [`Job`] will send. Restore is an edit with the
/// restoration prompt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Plan<'a> {
    /// Prompt, plus whatever references the job names
    Generate {
        /// Non-empty prompt
        prompt: &'a str,
    },
    /// One input image changed according to the prompt
    Edit {
        /// `--input`, as typed
        input: &'a str,
        /// The user's prompt or the mode's default
        prompt: &'a str,
    },
}

/// Validates `job`, then runs it against `service`.
pub async fn run<S: ImageService>(
    job: &Job,
    config: &Config,
    service: &S,
    reporter: &Reporter,
) -> Result<Outcome, NanobananaError> {
    let plan = job.validate()?;
    run_plan(job, plan, config, service, reporter).await
}

/// Runs an already validated `plan` and returns what was saved.
pub async fn run_plan<S: ImageService>(
    job: &Job,
    plan: Plan<'_>,
    config: &Config,
    service: &S,
    reporter: &Reporter,
) -> Result<Outcome, NanobananaError> {
    info!("Running {:?} with model {}", job.mode, config.model);
    match plan {
        Plan::Generate { prompt } => generate(job, prompt, config, service, reporter).await,
        Plan::Edit { input, prompt } => edit(job, input, prompt, config, service, reporter).await,
    }
}

async fn generate<S: ImageService>(
    job: &Job,
    prompt: &str,
    config: &Config,
    service: &S,
    reporter: &Reporter,
) -> Result<Outcome, NanobananaError> {
    let mut images = Vec::with_capacity(job.references.len());
    for reference in &job.references {
        let path = find_input_file(reference, &config.search_paths)?;
        images.push(InputImage::load(&path)?);
        reporter.status(format!("Using reference image: {}", path.display()));
    }

    let options = job.save_options(job.target(config, prompt)?);
    reporter.status(format!("Generating image ({})...", job.size));
    let request = GenerationRequest {
        prompt: prompt.to_string(),
        images,
        size: job.size,
    };
    send_and_save(service, &request, &options, reporter, "Image generated successfully.").await
}

async fn edit<S: ImageService>(
    job: &Job,
    input: &str,
    prompt: &str,
    config: &Config,
    service: &S,
    reporter: &Reporter,
) -> Result<Outcome, NanobananaError> {
    if !job.references.is_empty() {
        debug!("Ignoring {} reference image(s) outside generate mode", job.references.len());
    }

    let path = find_input_file(input, &config.search_paths)?;
    let image = InputImage::load(&path)?;

    let options = job.save_options(job.target(config, prompt)?);
    reporter.status(format!("Editing image ({})...", job.size));
    let request = GenerationRequest {
        prompt: prompt.to_string(),
        images: vec![image],
        size: job.size,
    };
    send_and_save(service, &request, &options, reporter, "Image edited successfully.").await
}

async fn send_and_save<S: ImageService>(
    service: &S,
    request: &GenerationRequest,
    options: &SaveOptions,
    reporter: &Reporter,
    success_message: &str,
) -> Result<Outcome, NanobananaError> {
    let response = service.generate(request).await?;
    let saved = save_parts(response.into_parts()?, options, reporter)?;
    if saved.is_empty() {
        return Err(NanobananaError::NoImage);
    }
    Ok(Outcome::success(&saved, success_message))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(mode: Mode, prompt: Option<&str>, input: Option<&str>) -> Job {
        Job {
            prompt: prompt.map(str::to_string),
            input: input.map(str::to_string),
            ..Job::new(mode)
        }
    }

    #[test]
    fn generate_needs_prompt() {
        let err = job(Mode::Generate, None, Some("photo.jpg"))
            .validate()
            .expect_err("prompt missing");
        assert_eq!(err.to_string(), "--prompt is required for generate mode");
        assert!(job(Mode::Generate, Some("A banana"), None).validate().is_ok());
    }

    #[test]
    fn edit_and_restore_need_input() {
        for mode in [Mode::Edit, Mode::Restore] {
            let err = job(mode, Some("x"), None)
                .validate()
                .expect_err("input missing");
            assert_eq!(
                err.to_string(),
                "--input is required for edit and restore modes"
            );
        }
        assert!(job(Mode::Restore, None, Some("old.jpg")).validate().is_ok());
        assert!(job(Mode::Edit, None, Some("old.jpg")).validate().is_ok());
    }

    #[test]
    fn validation_fills_default_prompts() {
        let restore = job(Mode::Restore, None, Some("old.jpg"));
        assert_eq!(
            restore.validate().expect("valid"),
            Plan::Edit {
                input: "old.jpg",
                prompt: DEFAULT_RESTORE_PROMPT
            }
        );

        let edit = job(Mode::Edit, Some(""), Some("photo.png"));
        assert_eq!(
            edit.validate().expect("valid"),
            Plan::Edit {
                input: "photo.png",
                prompt: DEFAULT_EDIT_PROMPT
            }
        );

        let restore = job(Mode::Restore, Some("Remove the scratches"), Some("old.jpg"));
        assert_eq!(
            restore.validate().expect("valid"),
            Plan::Edit {
                input: "old.jpg",
                prompt: "Remove the scratches"
            }
        );

        let generate = job(Mode::Generate, Some("A banana"), Some("ignored.png"));
        assert_eq!(
            generate.validate().expect("valid"),
            Plan::Generate { prompt: "A banana" }
        );
    }

    #[test]
    fn empty_prompt_does_not_satisfy_generate() {
        assert!(job(Mode::Generate, Some(""), None).validate().is_err());
        assert!(job(Mode::Edit, Some("x"), Some("")).validate().is_err());
    }

    #[test]
    fn cli_maps_onto_job() {
        use clap::Parser;
        let cli = CliOptions::try_parse_from([
            "nanobanana",
            "--mode",
            "restore",
            "--input",
            "old.jpg",
            "--output",
            "out/fixed.png",
            "--preview",
        ])
        .expect("parse");
        let job = Job::from(&cli);
        assert_eq!(job.mode, Mode::Restore);
        assert_eq!(job.input.as_deref(), Some("old.jpg"));
        assert_eq!(job.output, Some(PathBuf::from("out/fixed.png")));
        assert!(job.prompt.is_none());
        assert!(job.preview);
    }
}
