//! What the user (or calling agent) gets to see.

use std::path::PathBuf;
use std::process::ExitCode;

use serde::Serialize;

use crate::error::NanobananaError;

/// The one JSON object printed in `--json` mode.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Outcome {
    /// True when at least one image was saved
    pub success: bool,
    /// Saved paths, empty on failure
    pub files: Vec<String>,
    /// Human readable summary
    pub message: String,
}

impl Outcome {
    /// A successful run that saved `files`.
    pub fn success(files: &[PathBuf], message: impl Into<String>) -> Self {
        Self {
            success: true,
            files: files.iter().map(|path| path.display().to_string()).collect(),
            message: message.into(),
        }
    }

    /// A failed run.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            files: Vec::new(),
            message: message.into(),
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|err| {
            format!(
                "{{\"success\": false, \"files\": [], \"message\": {:?}}}",
                err.to_string()
            )
        })
    }
}

impl From<&NanobananaError> for Outcome {
    fn from(err: &NanobananaError) -> Self {
        Self::failure(err.to_string())
    }
}

/// Prints progress and the final result in human or JSON form.
#[derive(Clone, Copy, Debug, Default)]
pub struct Reporter {
    json: bool,
}

impl Reporter {
    /// `json` selects the single-object output contract.
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    /// A progress line on stdout; silent in JSON mode.
    pub fn status(&self, line: impl std::fmt::Display) {
        if !self.json {
            println!("{line}");
        }
    }

    /// Text the model sent along with its images; silent in JSON mode.
    pub fn commentary(&self, text: &str) {
        if !self.json {
            println!("Model: {text}");
        }
    }

    /// Prints the terminal report and picks the exit code.
    pub fn finish(&self, result: Result<Outcome, NanobananaError>) -> ExitCode {
        let code = exit_code(&result);
        match self.final_line(result) {
            FinalLine::Stdout(line) => println!("{line}"),
            FinalLine::Stderr(line) => eprintln!("{line}"),
            FinalLine::None => {}
        }
        code
    }

    /// The last thing a run prints, and where it goes.
    fn final_line(&self, result: Result<Outcome, NanobananaError>) -> FinalLine {
        match result {
            Ok(outcome) if self.json => FinalLine::Stdout(outcome.to_json()),
            Ok(_) => FinalLine::None,
            Err(err) if self.json => FinalLine::Stdout(Outcome::from(&err).to_json()),
            Err(NanobananaError::NoImage) => {
                FinalLine::Stderr(format!("Warning: {}", NanobananaError::NoImage))
            }
            Err(err) => FinalLine::Stderr(format!("Error: {err}")),
        }
    }
}

#[derive(Debug, Eq, PartialEq)]
enum FinalLine {
    Stdout(String),
    Stderr(String),
    None,
}

/// 0 when at least one image was saved, 1 otherwise.
fn exit_code(result: &Result<Outcome, NanobananaError>) -> ExitCode {
    match result {
        Ok(outcome) if outcome.success && !outcome.files.is_empty() => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn fields(json: &str) -> Vec<String> {
        let value: Value = serde_json::from_str(json).expect("valid json");
        let mut keys: Vec<String> = value
            .as_object()
            .expect("json object")
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    #[test]
    fn success_json() {
        let outcome = Outcome::success(
            &[PathBuf::from("nanobanana-output/a_banana_in_space.png")],
            "Image generated successfully.",
        );
        let json = outcome.to_json();
        assert_eq!(fields(&json), ["files", "message", "success"]);

        let value: Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["success"], true);
        assert_eq!(
            value["files"][0],
            "nanobanana-output/a_banana_in_space.png"
        );
    }

    #[test]
    fn failure_json_has_same_fields() {
        let errors = [
            NanobananaError::MissingApiKey,
            NanobananaError::NoImage,
            NanobananaError::Api {
                status: 429,
                body: "quota \"exceeded\"".to_string(),
            },
            NanobananaError::NotInSearchPaths {
                filename: "missing.jpg".to_string(),
                searched: vec![PathBuf::from(".")],
            },
        ];
        for err in &errors {
            let json = Outcome::from(err).to_json();
            assert_eq!(fields(&json), ["files", "message", "success"]);
            let value: Value = serde_json::from_str(&json).expect("valid json");
            assert_eq!(value["success"], false);
            assert_eq!(value["files"], serde_json::json!([]));
            assert_eq!(value["message"], err.to_string());
        }
    }

    #[test]
    fn empty_result_message() {
        let outcome = Outcome::from(&NanobananaError::NoImage);
        assert!(!outcome.success);
        assert_eq!(outcome.message, crate::constants::NO_IMAGE_MESSAGE);
    }

    fn saved() -> Outcome {
        Outcome::success(
            &[PathBuf::from("nanobanana-output/a_banana_in_space.png")],
            "Image generated successfully.",
        )
    }

    #[test]
    fn exit_codes() {
        for json in [true, false] {
            let reporter = Reporter::new(json);
            assert_eq!(reporter.finish(Ok(saved())), ExitCode::SUCCESS);
            assert_eq!(
                reporter.finish(Err(NanobananaError::NoImage)),
                ExitCode::FAILURE
            );
            assert_eq!(
                reporter.finish(Err(NanobananaError::MissingApiKey)),
                ExitCode::FAILURE
            );
        }
        assert_eq!(
            exit_code(&Ok(Outcome::success(&[], "nothing"))),
            ExitCode::FAILURE
        );
    }

    #[test]
    fn json_mode_only_uses_stdout() {
        let reporter = Reporter::new(true);
        let results = [
            Ok(saved()),
            Err(NanobananaError::NoImage),
            Err(NanobananaError::MissingApiKey),
        ];
        for result in results {
            let line = reporter.final_line(result);
            assert!(
                matches!(&line, FinalLine::Stdout(json) if fields(json) == ["files", "message", "success"]),
                "{line:?}"
            );
        }
    }

    #[test]
    fn human_mode_routes_failures_to_stderr() {
        let reporter = Reporter::new(false);
        assert_eq!(reporter.final_line(Ok(saved())), FinalLine::None);
        assert_eq!(
            reporter.final_line(Err(NanobananaError::NoImage)),
            FinalLine::Stderr("Warning: No image was generated in the response.".to_string())
        );
        let line = reporter.final_line(Err(NanobananaError::MissingApiKey));
        assert!(
            matches!(&line, FinalLine::Stderr(text) if text.starts_with("Error: No API key found.")),
            "{line:?}"
        );
    }
}
