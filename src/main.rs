//! Storyboard - multi-provider image and text generation CLI.

use std::path::Path;
use std::process;
use std::time::Duration;

use clap::Parser;
use reqwest::Client;
use tracing::info;

use storyboard_ai::cli::{resolve_image_arg, Cli, Command, SaveArgs};
use storyboard_ai::config::{discover_config_path, Config};
use storyboard_ai::context::{RecordingSession, ServiceContext};
use storyboard_ai::error::{GenerationError, GenerationResult};
use storyboard_ai::output::{numbered_path, resolve_output_path, save_artifact};
use storyboard_ai::params::validate_format;
use storyboard_ai::{logging, service, AppSettings, ProviderAdapter, ProviderRouter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let operation = cli.command.operation();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {operation} failed: {e}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> GenerationResult<()> {
    let settings = build_settings(&cli)?;
    if let Some(save) = cli.command.save_args() {
        validate_format(&save.format).map_err(GenerationError::InvalidArgument)?;
    }
    info!(?settings, "resolved settings");

    let (ctx, recording) = build_context()?;
    let result = execute(cli.command, ctx.adapter.as_ref(), &settings).await;

    drop(ctx);
    if let Some(session) = recording {
        match session.finish() {
            Ok(path) => eprintln!("Cassette saved: {}", path.display()),
            Err(e) => eprintln!("Warning: failed to save cassette: {e}"),
        }
    }
    result
}

fn build_settings(cli: &Cli) -> GenerationResult<AppSettings> {
    let config = Config::load(&discover_config_path(cli.config.as_deref()))?;
    let mut settings = config.to_settings(cli.provider_override());
    if let Some(ref url) = cli.base_url {
        settings.base_url = Some(url.clone());
    }
    if let Some(ref model) = cli.image_model {
        settings.image_model = Some(model.clone());
    }
    if let Some(ref model) = cli.text_model {
        settings.text_model = Some(model.clone());
    }
    if let Some(secs) = cli.timeout {
        settings.timeout = Duration::from_secs(secs);
    }
    Ok(settings)
}

/// Live, recording or replaying stack, chosen by `STORYBOARD_REPLAY` / `STORYBOARD_REC`.
fn build_context() -> GenerationResult<(ServiceContext, Option<RecordingSession>)> {
    if let Ok(cassette) = std::env::var("STORYBOARD_REPLAY") {
        info!(cassette, "replaying");
        return Ok((ServiceContext::replaying(Path::new(&cassette))?, None));
    }
    let router = ProviderRouter::from_env();
    if std::env::var("STORYBOARD_REC").is_ok_and(|v| v == "true" || v == "1") {
        info!("recording enabled");
        let (ctx, session) = ServiceContext::recording(router);
        return Ok((ctx, Some(session)));
    }
    Ok((ServiceContext::live(router), None))
}

async fn execute(
    command: Command,
    adapter: &dyn ProviderAdapter,
    settings: &AppSettings,
) -> GenerationResult<()> {
    let client = Client::new();
    match command {
        Command::Image(args) => {
            let config = args.shot.to_config()?;
            let input = args.input.as_deref().map(resolve_image_arg).transpose()?;
            let artifact =
                service::generate_image_from_config(adapter, &config, settings, input.as_deref())
                    .await?;
            save(&client, &artifact, &args.save, config.prompt(), settings).await
        }
        Command::Vary(args) => {
            let input = resolve_image_arg(&args.input)?;
            if let Some(category) = args.category {
                let artifacts = service::generate_variation_batch(
                    adapter,
                    &input,
                    &category,
                    &args.prompt,
                    &args.model,
                    settings,
                )
                .await?;
                let base =
                    resolve_output_path(args.save.output.as_deref(), &category, &args.save.format);
                for (i, artifact) in artifacts.iter().enumerate() {
                    let path = numbered_path(&base, i + 1);
                    write(&client, artifact, &args.save.format, &path, settings).await?;
                }
                return Ok(());
            }
            let instruction = args.instruction.ok_or_else(|| {
                GenerationError::InvalidArgument(
                    "Provide --instruction, or --category with one or more --prompt".into(),
                )
            })?;
            let artifact =
                service::generate_image_variation(adapter, &input, &instruction, &args.model, settings)
                    .await?;
            save(&client, &artifact, &args.save, &instruction, settings).await
        }
        Command::Edit(args) => {
            let input = resolve_image_arg(&args.input)?;
            let artifact = service::edit_generated_image(
                adapter,
                &input,
                &args.instructions,
                &args.model,
                settings,
            )
            .await?;
            save(&client, &artifact, &args.save, &args.instructions, settings).await
        }
        Command::Text(args) => {
            let text = service::generate_text(adapter, &args.prompt, &args.system, settings).await?;
            println!("{text}");
            Ok(())
        }
        Command::Enhance(args) => {
            let config = args.to_config()?;
            println!("{}", service::enhance_prompt(adapter, &config, settings).await?);
            Ok(())
        }
        Command::Suggest(args) => {
            let ideas = service::variation_suggestions(
                adapter,
                &args.prompt,
                &args.category,
                args.count,
                settings,
            )
            .await?;
            for idea in ideas {
                println!("{idea}");
            }
            Ok(())
        }
    }
}

async fn save(
    client: &Client,
    artifact: &str,
    save: &SaveArgs,
    prompt: &str,
    settings: &AppSettings,
) -> GenerationResult<()> {
    let path = resolve_output_path(save.output.as_deref(), prompt, &save.format);
    write(client, artifact, &save.format, &path, settings).await
}

async fn write(
    client: &Client,
    artifact: &str,
    format: &str,
    path: &Path,
    settings: &AppSettings,
) -> GenerationResult<()> {
    save_artifact(client, artifact, format, path, settings.timeout).await?;
    eprintln!("Saved: {}", path.display());
    Ok(())
}
