use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use nanobanana::cli::CliOptions;
use nanobanana::config::{Config, setup_logging};
use nanobanana::error::NanobananaError;
use nanobanana::gemini::GeminiClient;
use nanobanana::modes::{Job, run_plan};
use nanobanana::report::{Outcome, Reporter};

async fn execute(job: &Job, reporter: &Reporter) -> Result<Outcome, NanobananaError> {
    let plan = job.validate()?;
    let config = Config::from_env()?;
    let client = GeminiClient::new(&config);
    run_plan(job, plan, &config, &client, reporter).await
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = CliOptions::parse();

    // setup_logging reports its own failure
    let _ = setup_logging(cli.debug);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    let reporter = Reporter::new(cli.json);
    let job = Job::from(&cli);
    let result = runtime.block_on(execute(&job, &reporter));
    Ok(reporter.finish(result))
}
