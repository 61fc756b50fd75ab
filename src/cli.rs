//! CLI argument parsing with clap.

use std::path::Path;

use clap::{Args, Parser, Subcommand};

use crate::error::{GenerationError, GenerationResult};
use crate::image_ref::{is_artifact, InlineImage, DEFAULT_MIME};
use crate::model::Provider;
use crate::params::AspectRatio;
use crate::ports::GenerationConfig;

/// Storyboard image and text generation across Gemini, `OpenAI` and gateways.
#[derive(Parser, Debug)]
#[command(name = "storyboard", version, about)]
pub struct Cli {
    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Provider: google, openai or custom.
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Endpoint override for REST providers.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Image model override for REST providers.
    #[arg(long, global = true)]
    pub image_model: Option<String>,

    /// Text model override for REST providers.
    #[arg(long, global = true)]
    pub text_model: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// What to generate.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate an image from a prompt and shot descriptors.
    Image(ImageArgs),
    /// Generate variations of an existing image.
    Vary(VaryArgs),
    /// Edit an existing image with instructions.
    Edit(EditArgs),
    /// Plain text completion.
    Text(TextArgs),
    /// Rewrite a prompt into a richer, cinematic one.
    Enhance(ShotArgs),
    /// Suggest variation directives for a category.
    Suggest(SuggestArgs),
}

impl Command {
    /// Operation name used to prefix failures.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Image(_) => "Image generation",
            Self::Vary(_) => "Variation generation",
            Self::Edit(_) => "Image edit",
            Self::Text(_) => "Text generation",
            Self::Enhance(_) => "Prompt enhancement",
            Self::Suggest(_) => "Suggestion generation",
        }
    }

    /// Output options of commands that produce images.
    #[must_use]
    pub fn save_args(&self) -> Option<&SaveArgs> {
        match self {
            Self::Image(a) => Some(&a.save),
            Self::Vary(a) => Some(&a.save),
            Self::Edit(a) => Some(&a.save),
            Self::Text(_) | Self::Enhance(_) | Self::Suggest(_) => None,
        }
    }
}

/// Prompt plus shot descriptors.
#[derive(Args, Debug)]
pub struct ShotArgs {
    /// Text prompt describing the shot.
    #[arg(conflicts_with = "prompt_file")]
    pub prompt: Option<String>,

    /// Path to a file containing the prompt text.
    #[arg(short = 'p', long, conflicts_with = "prompt")]
    pub prompt_file: Option<String>,

    /// Model name or short alias.
    #[arg(short, long, default_value = "nano-banana")]
    pub model: String,

    /// Aspect ratio: 1:1, 16:9, 9:16, 4:3, 3:4.
    #[arg(short, long, default_value = "1:1")]
    pub aspect_ratio: String,

    /// Artistic style.
    #[arg(long, default_value = "")]
    pub style: String,

    /// Shot type, e.g. "Close-up".
    #[arg(long)]
    pub shot_type: Option<String>,

    /// Camera angle.
    #[arg(long)]
    pub camera_angle: Option<String>,

    /// Lighting.
    #[arg(long)]
    pub lighting: Option<String>,
}

impl ShotArgs {
    /// Resolve the prompt from either the positional argument or the file flag.
    ///
    /// # Errors
    ///
    /// Returns an error if neither is provided or the file cannot be read.
    pub fn resolve_prompt(&self) -> GenerationResult<String> {
        if let Some(ref text) = self.prompt {
            Ok(text.clone())
        } else if let Some(ref path) = self.prompt_file {
            Ok(std::fs::read_to_string(path)?.trim().to_string())
        } else {
            Err(GenerationError::InvalidArgument(
                "Provide a prompt string or use -p/--prompt-file".into(),
            ))
        }
    }

    /// Build a generation config.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown aspect ratio or a missing prompt.
    pub fn to_config(&self) -> GenerationResult<GenerationConfig> {
        let aspect_ratio: AspectRatio =
            self.aspect_ratio.parse().map_err(GenerationError::InvalidArgument)?;
        let mut config = GenerationConfig::new(self.model.clone(), self.resolve_prompt()?)
            .with_aspect_ratio(aspect_ratio)
            .with_style(self.style.clone());
        if let Some(ref v) = self.shot_type {
            config = config.with_shot_type(v.clone());
        }
        if let Some(ref v) = self.camera_angle {
            config = config.with_camera_angle(v.clone());
        }
        if let Some(ref v) = self.lighting {
            config = config.with_lighting(v.clone());
        }
        Ok(config)
    }
}

/// Where and how to save images.
#[derive(Args, Debug)]
pub struct SaveArgs {
    /// Output format: jpeg, png, webp.
    #[arg(short, long, default_value = "png")]
    pub format: String,

    /// Output file path (auto-generated if not specified).
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Arguments of `image`.
#[derive(Args, Debug)]
pub struct ImageArgs {
    /// Prompt and descriptors.
    #[command(flatten)]
    pub shot: ShotArgs,

    /// Condition on this image (file path, data URI or URL).
    #[arg(short, long)]
    pub input: Option<String>,

    /// Output options.
    #[command(flatten)]
    pub save: SaveArgs,
}

/// Arguments of `vary`.
#[derive(Args, Debug)]
pub struct VaryArgs {
    /// Source image (file path, data URI or URL).
    #[arg(short, long)]
    pub input: String,

    /// Single free-form variation instruction.
    #[arg(long, conflicts_with_all = ["category", "prompt"])]
    pub instruction: Option<String>,

    /// Variation category for a batch, e.g. "Camera Angles".
    #[arg(long, requires = "prompt")]
    pub category: Option<String>,

    /// One directive per batch image; repeat for more.
    #[arg(long = "prompt", requires = "category")]
    pub prompt: Vec<String>,

    /// Model name or short alias.
    #[arg(short, long, default_value = "nano-banana")]
    pub model: String,

    /// Output options.
    #[command(flatten)]
    pub save: SaveArgs,
}

/// Arguments of `edit`.
#[derive(Args, Debug)]
pub struct EditArgs {
    /// Edit instructions.
    pub instructions: String,

    /// Source image (file path, data URI or URL).
    #[arg(short, long)]
    pub input: String,

    /// Model name or short alias.
    #[arg(short, long, default_value = "nano-banana")]
    pub model: String,

    /// Output options.
    #[command(flatten)]
    pub save: SaveArgs,
}

/// Arguments of `text`.
#[derive(Args, Debug)]
pub struct TextArgs {
    /// User prompt.
    pub prompt: String,

    /// System instruction.
    #[arg(short, long, default_value = "You are a helpful assistant.")]
    pub system: String,
}

/// Arguments of `suggest`.
#[derive(Args, Debug)]
pub struct SuggestArgs {
    /// Prompt of the shot being varied.
    pub prompt: String,

    /// Variation category.
    #[arg(short, long)]
    pub category: String,

    /// Number of suggestions.
    #[arg(short = 'n', long, default_value = "4")]
    pub count: usize,
}

impl Cli {
    /// Provider override from `--provider`.
    #[must_use]
    pub fn provider_override(&self) -> Option<Provider> {
        self.provider.as_deref().map(Provider::from)
    }
}

/// Turn an image argument into a reference adapters accept.
///
/// Data URIs and URLs pass through; anything else is read as a local file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn resolve_image_arg(arg: &str) -> GenerationResult<String> {
    if is_artifact(arg) {
        return Ok(arg.to_string());
    }
    let bytes = std::fs::read(Path::new(arg)).map_err(|e| {
        GenerationError::InvalidArgument(format!("Cannot read input image '{arg}': {e}"))
    })?;
    let mime = match image::guess_format(&bytes) {
        Ok(image::ImageFormat::Jpeg) => "image/jpeg",
        Ok(image::ImageFormat::WebP) => "image/webp",
        Ok(image::ImageFormat::Gif) => "image/gif",
        _ => DEFAULT_MIME,
    };
    Ok(InlineImage::from_bytes(&bytes, mime).to_data_uri())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_defaults() {
        let cli = Cli::parse_from(["storyboard", "image", "a cat"]);
        let Command::Image(args) = cli.command else { panic!("expected image") };
        assert_eq!(args.shot.model, "nano-banana");
        assert_eq!(args.save.format, "png");
        assert!(args.input.is_none());
        let config = args.shot.to_config().unwrap();
        assert_eq!(config.prompt(), "a cat");
        assert_eq!(config.aspect_ratio(), AspectRatio::Square);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "storyboard",
            "text",
            "hello",
            "--provider",
            "openai",
            "--text-model",
            "gpt-4o",
            "-v",
        ]);
        assert_eq!(cli.provider_override(), Some(Provider::OpenAi));
        assert_eq!(cli.text_model.as_deref(), Some("gpt-4o"));
        assert!(cli.verbose);
        assert_eq!(cli.command.operation(), "Text generation");
        assert!(cli.command.save_args().is_none());
    }

    #[test]
    fn shot_descriptors() {
        let cli = Cli::parse_from([
            "storyboard",
            "image",
            "-a",
            "16:9",
            "--style",
            "noir",
            "--shot-type",
            "Close-up",
            "--lighting",
            "low key",
            "a detective",
        ]);
        let Command::Image(args) = cli.command else { panic!("expected image") };
        let config = args.shot.to_config().unwrap();
        assert_eq!(config.aspect_ratio(), AspectRatio::Landscape);
        assert_eq!(config.style(), "noir");
        assert_eq!(config.shot_type(), Some("Close-up"));
        assert_eq!(config.lighting(), Some("low key"));
        assert!(config.camera_angle().is_none());
    }

    #[test]
    fn bad_aspect_ratio_is_rejected() {
        let cli = Cli::parse_from(["storyboard", "image", "-a", "2:1", "x"]);
        let Command::Image(args) = cli.command else { panic!("expected image") };
        assert!(matches!(args.shot.to_config(), Err(GenerationError::InvalidArgument(_))));
    }

    #[test]
    fn vary_batch() {
        let cli = Cli::parse_from([
            "storyboard",
            "vary",
            "-i",
            "https://ex.com/a.png",
            "--category",
            "Camera Angles",
            "--prompt",
            "Low angle",
            "--prompt",
            "Top down",
        ]);
        let Command::Vary(args) = cli.command else { panic!("expected vary") };
        assert_eq!(args.category.as_deref(), Some("Camera Angles"));
        assert_eq!(args.prompt, vec!["Low angle".to_string(), "Top down".to_string()]);
    }

    #[test]
    fn vary_instruction_conflicts_with_batch() {
        let result = Cli::try_parse_from([
            "storyboard",
            "vary",
            "-i",
            "x.png",
            "--instruction",
            "rain",
            "--category",
            "c",
            "--prompt",
            "p",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn missing_prompt_errors() {
        let cli = Cli::parse_from(["storyboard", "enhance"]);
        let Command::Enhance(args) = cli.command else { panic!("expected enhance") };
        assert!(args.resolve_prompt().is_err());
    }

    #[test]
    fn image_args_pass_through_or_load() {
        assert_eq!(resolve_image_arg("https://ex.com/a.png").unwrap(), "https://ex.com/a.png");

        let dir = std::env::temp_dir().join("storyboard_cli_image_arg");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("in.bin");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();
        let uri = resolve_image_arg(path.to_str().unwrap()).unwrap();
        assert_eq!(uri, "data:image/png;base64,AQID");
        let _ = std::fs::remove_dir_all(&dir);

        assert!(resolve_image_arg("/nonexistent/in.png").is_err());
    }
}
