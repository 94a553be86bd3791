//! Snapedit - AI product-photo editing CLI.

mod adapters;
mod cassette;
mod cli;
mod config;
mod context;
mod error;
mod model;
mod output;
mod ports;
mod presets;
mod repl;
mod session;

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::Config;
use crate::context::{RecordingSession, ServiceContext, CASSETTE_ROOT};
use crate::error::EditError;
use crate::model::{detect_provider, resolve_model};
use crate::output::{export, is_stdout};
use crate::ports::ImagePayload;
use crate::session::{EditSession, SessionState};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        tracing::debug!(category = %e.category(), "exiting with error");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "snapedit=debug" } else { "snapedit=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), EditError> {
    // Load config
    let config_path = config::discover_config_path(cli.config.as_deref());
    let config = Config::load(&config_path).map_err(EditError::Config)?;
    tracing::debug!(path = %config_path.display(), "config loaded");

    if !cli.interactive && cli.image.is_none() {
        return Err(EditError::InvalidArgument(
            "Provide an image path or use -i/--interactive".into(),
        ));
    }
    let instruction = cli.resolve_instruction()?;

    // Resolve model and provider
    let requested = cli.model.as_deref().unwrap_or(&config.defaults.model);
    let model = resolve_model(requested);
    let provider = detect_provider(&model).map_err(EditError::InvalidArgument)?;
    tracing::debug!(%model, requested, %provider, "model resolved");

    let output_path = PathBuf::from(cli.output.as_deref().unwrap_or(&config.defaults.output));

    // Fatal configuration problems surface here, before anything is sent.
    let (ctx, recording) = build_context(provider, &model, &config)?;

    let mut session = EditSession::new();
    let outcome = match cli.image.as_deref() {
        Some(image) if !cli.interactive => {
            edit_once(&mut session, &ctx, image, instruction, &output_path).await
        }
        image => {
            if let Some(image) = image {
                session.upload(ImagePayload::load(image)?)?;
            }
            if !instruction.is_empty() {
                session.set_instruction(instruction)?;
            }
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            repl::run(&mut session, ctx.editor.as_ref(), &output_path, stdin, std::io::stdout())
                .await
        }
    };

    // The recording editor holds the other handle to the recorder.
    drop(ctx);
    if let Some(recording) = recording {
        match recording.finish() {
            Ok(path) => eprintln!("Cassette saved: {}", path.display()),
            Err(e) => eprintln!("Warning: failed to save cassette: {e}"),
        }
    }

    outcome
}

/// Pick the live, recording or replaying editor from the environment.
fn build_context(
    provider: model::Provider,
    model: &str,
    config: &Config,
) -> Result<(ServiceContext, Option<RecordingSession>), EditError> {
    let is_recording = std::env::var("SNAPEDIT_REC").is_ok_and(|v| v == "true" || v == "1");

    if let Ok(cassette_path) = std::env::var("SNAPEDIT_REPLAY") {
        tracing::debug!(cassette = %cassette_path, "replaying");
        Ok((ServiceContext::replaying(Path::new(&cassette_path))?, None))
    } else if is_recording {
        tracing::debug!("recording mode enabled");
        let (ctx, session) = ServiceContext::recording(provider, model, config, Path::new(CASSETTE_ROOT))?;
        Ok((ctx, Some(session)))
    } else {
        Ok((ServiceContext::live(provider, model, config)?, None))
    }
}

/// Upload, instruct, submit, export.
async fn edit_once(
    session: &mut EditSession,
    ctx: &ServiceContext,
    image: &str,
    instruction: String,
    output_path: &Path,
) -> Result<(), EditError> {
    session.upload(ImagePayload::load(image)?)?;
    session.set_instruction(instruction)?;

    match session.submit(ctx.editor.as_ref()).await? {
        SessionState::Succeeded => {
            export(session.retrieve_result()?, output_path, &mut std::io::stdout().lock())?;
            if !is_stdout(output_path) {
                eprintln!("Saved: {}", output_path.display());
            }
            Ok(())
        }
        state => Err(session.error().cloned().map_or_else(
            || EditError::Config(format!("Edit ended in unexpected state '{state}'")),
            EditError::Failed,
        )),
    }
}
