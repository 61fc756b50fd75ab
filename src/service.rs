//! Generation facade used by the storyboard graph.
//!
//! Every function takes the adapter stack (normally a [`crate::ProviderRouter`])
//! and an immutable [`AppSettings`]. Errors propagate unchanged.

use futures::future::try_join_all;
use tracing::{debug, warn};

use crate::error::{GenerationError, GenerationResult};
use crate::params::validate_count;
use crate::ports::provider::{GenerationConfig, ProviderAdapter};
use crate::prompt::{
    compose, edit_instruction, enhancement_request, fallback_suggestions, parse_suggestions,
    suggestion_request, variation_directive, SUGGESTION_SYSTEM_INSTRUCTION,
};
use crate::settings::AppSettings;

/// Generate an image from a config, optionally conditioned on `input_image`.
///
/// With an input image the composed prompt becomes the variation instruction
/// and `config.model()` the requested model.
///
/// # Errors
///
/// Propagates any adapter failure.
pub async fn generate_image_from_config(
    adapter: &dyn ProviderAdapter,
    config: &GenerationConfig,
    settings: &AppSettings,
    input_image: Option<&str>,
) -> GenerationResult<String> {
    match input_image {
        Some(image) => {
            let instruction = compose(config);
            generate_image_variation(adapter, image, &instruction, config.model(), settings).await
        }
        None => adapter.generate_image(config, settings).await,
    }
}

/// Model a variation should use: the requested one on the native provider,
/// the configured REST image model everywhere else.
#[must_use]
pub fn variation_model(requested: &str, settings: &AppSettings) -> String {
    if settings.provider.is_native() {
        requested.to_string()
    } else {
        settings.rest_image_model()
    }
}

/// Generate a variation of an existing image.
///
/// # Errors
///
/// Propagates any adapter failure.
pub async fn generate_image_variation(
    adapter: &dyn ProviderAdapter,
    input_image: &str,
    instruction: &str,
    model: &str,
    settings: &AppSettings,
) -> GenerationResult<String> {
    let model = variation_model(model, settings);
    debug!(%model, "generating variation");
    adapter.generate_variation(input_image, instruction, &model, settings).await
}

/// Edit an image according to free-form instructions.
///
/// # Errors
///
/// Propagates any adapter failure.
pub async fn edit_generated_image(
    adapter: &dyn ProviderAdapter,
    input_image: &str,
    instructions: &str,
    model: &str,
    settings: &AppSettings,
) -> GenerationResult<String> {
    let instruction = edit_instruction(instructions);
    generate_image_variation(adapter, input_image, &instruction, model, settings).await
}

/// Generate one variation per directive, concurrently.
///
/// All-or-nothing: the first failure fails the whole batch and no partial
/// results are returned. Results keep the order of `directives`.
///
/// # Errors
///
/// Returns an invalid-argument error for an empty or oversized batch, or the
/// first adapter failure.
pub async fn generate_variation_batch(
    adapter: &dyn ProviderAdapter,
    input_image: &str,
    category: &str,
    directives: &[String],
    model: &str,
    settings: &AppSettings,
) -> GenerationResult<Vec<String>> {
    validate_count(directives.len()).map_err(GenerationError::InvalidArgument)?;
    let instructions: Vec<String> =
        directives.iter().map(|d| variation_directive(category, d)).collect();
    debug!(count = instructions.len(), category, "launching variation batch");

    try_join_all(instructions.iter().map(|instruction| {
        generate_image_variation(adapter, input_image, instruction, model, settings)
    }))
    .await
}

/// Plain text completion.
///
/// # Errors
///
/// Propagates any adapter failure.
pub async fn generate_text(
    adapter: &dyn ProviderAdapter,
    prompt: &str,
    system_instruction: &str,
    settings: &AppSettings,
) -> GenerationResult<String> {
    adapter.generate_text(prompt, system_instruction, settings).await
}

/// Rewrite a config's prompt into a richer, cinematic prompt.
///
/// # Errors
///
/// Propagates any adapter failure.
pub async fn enhance_prompt(
    adapter: &dyn ProviderAdapter,
    config: &GenerationConfig,
    settings: &AppSettings,
) -> GenerationResult<String> {
    let (system, user) = enhancement_request(config);
    let enhanced = adapter.generate_text(&user, &system, settings).await?;
    let enhanced = enhanced.trim();
    if enhanced.is_empty() {
        warn!("prompt enhancement returned no text; keeping the original prompt");
        return Ok(config.prompt().to_string());
    }
    Ok(enhanced.to_string())
}

/// Ask the text model for `count` variation ideas in `category`.
///
/// Output that is not a JSON array of strings yields placeholder suggestions.
///
/// # Errors
///
/// Propagates any adapter failure.
pub async fn variation_suggestions(
    adapter: &dyn ProviderAdapter,
    parent_prompt: &str,
    category: &str,
    count: usize,
    settings: &AppSettings,
) -> GenerationResult<Vec<String>> {
    let prompt = suggestion_request(parent_prompt, category, count);
    let raw = adapter.generate_text(&prompt, SUGGESTION_SYSTEM_INSTRUCTION, settings).await?;
    Ok(parse_suggestions(&raw, count).unwrap_or_else(|| {
        warn!(category, "suggestion output was not a JSON array; using placeholders");
        fallback_suggestions(category, count)
    }))
}
