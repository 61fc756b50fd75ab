//! Prompt construction for image and text requests.

use crate::ports::GenerationConfig;

/// System instruction for variation suggestions.
pub const SUGGESTION_SYSTEM_INSTRUCTION: &str = "You are a creative storyboard assistant. \
Your task is to generate distinct, creative variations for a shot description based on a specific category. \
Return ONLY a JSON array of strings. Do not include markdown formatting like ```json. \
Example: [\"Low angle looking up\", \"Top down view\", \"Dutch angle\"]";

/// Build the single prompt string sent to image models.
///
/// The base prompt comes first, followed by each non-empty descriptor as
/// `Label: value`, joined with `", "`.
#[must_use]
pub fn compose(config: &GenerationConfig) -> String {
    let descriptors = [
        ("Artistic Style", Some(config.style())),
        ("Shot Type", config.shot_type()),
        ("Camera Angle", config.camera_angle()),
        ("Lighting", config.lighting()),
    ];

    let mut parts: Vec<String> = Vec::with_capacity(5);
    if !config.prompt().is_empty() {
        parts.push(config.prompt().to_string());
    }
    for (label, value) in descriptors {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            parts.push(format!("{label}: {value}"));
        }
    }
    parts.join(", ")
}

/// Instruction sent with an edit request.
#[must_use]
pub fn edit_instruction(instructions: &str) -> String {
    format!("Edit this image according to these instructions: {instructions}")
}

/// Instruction for one cell of a variation batch.
#[must_use]
pub fn variation_directive(category: &str, directive: &str) -> String {
    format!("Change category: {category}. Directive: {directive}.")
}

/// System instruction and user prompt for prompt enhancement.
#[must_use]
pub fn enhancement_request(config: &GenerationConfig) -> (String, String) {
    let system = format!(
        "You are an expert prompt engineer for advanced AI image generation models. \
Your task is to rewrite the user's input to be highly descriptive, vivid, and cinematic.\n\n\
Incorporate the following details naturally into the description if they are provided, but do not just list them:\n\
- Style: {}\n- Shot Type: {}\n- Camera Angle: {}\n- Lighting: {}\n\n\
The goal is to produce a prompt that generates a high-quality, professional image suitable for a storyboard.\n\
Output ONLY the enhanced prompt text. Do not add explanations or quotes.",
        config.style(),
        config.shot_type().unwrap_or_default(),
        config.camera_angle().unwrap_or_default(),
        config.lighting().unwrap_or_default(),
    );
    let user = format!("Original Prompt: {}", config.prompt());
    (system, user)
}

/// User prompt asking for `count` suggestions in `category`.
#[must_use]
pub fn suggestion_request(parent_prompt: &str, category: &str, count: usize) -> String {
    format!(
        "Context: \"{parent_prompt}\"\n\
Category: \"{category}\"\n\
Generate {count} specific, distinct, and creative variations for this shot.\n\
For \"Camera Angles\", suggest specific angles (e.g. Over the shoulder, wide shot).\n\
For \"Narrative\", suggest plot progressions.\n\
For \"Environment\", suggest different settings or weather.\n\
For \"Artistic Style\", suggest visual styles.\n\n\
Make the suggestions intelligent based on the context (e.g. if context has a horse, suggest 'Horse's POV')."
    )
}

/// Parse a model's suggestion output into at most `count` strings.
///
/// Returns `None` when the output is not a JSON array of strings.
#[must_use]
pub fn parse_suggestions(raw: &str, count: usize) -> Option<Vec<String>> {
    let cleaned = raw.replace("```json", "").replace("```", "");
    let parsed: Vec<String> = serde_json::from_str(cleaned.trim()).ok()?;
    Some(parsed.into_iter().take(count).collect())
}

/// Placeholder suggestions used when the model's output is unusable.
#[must_use]
pub fn fallback_suggestions(category: &str, count: usize) -> Vec<String> {
    vec![format!("Variation of {category}"); count]
}
