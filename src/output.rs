//! Writing generated artifacts to disk.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::Client;
use tracing::debug;

use crate::error::{GenerationError, GenerationResult};
use crate::image_ref::to_inline_bytes;
use crate::params::format_extension;

/// Characters of the prompt kept in generated file names.
const FILENAME_PROMPT_CHARS: usize = 50;

/// Build a file name from a prompt: kebab-case prompt, unix timestamp, extension.
#[must_use]
pub fn auto_filename(prompt: &str, format: &str) -> String {
    let stem = sanitize_for_filename(prompt, FILENAME_PROMPT_CHARS);
    let timestamp = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
    format!("{stem}-{timestamp}.{}", format_extension(format))
}

/// Lowercase kebab-case of `input`, at most `max_len` bytes, never empty.
#[must_use]
pub fn sanitize_for_filename(input: &str, max_len: usize) -> String {
    let mut result = String::with_capacity(max_len);
    let mut pending_hyphen = false;

    for ch in input.chars() {
        if result.len() >= max_len {
            break;
        }
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !result.is_empty() && result.len() + 1 < max_len {
                result.push('-');
            }
            pending_hyphen = false;
            result.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if result.is_empty() {
        "image".to_string()
    } else {
        result
    }
}

/// Explicit output path, or one derived from the prompt.
#[must_use]
pub fn resolve_output_path(explicit: Option<&str>, prompt: &str, format: &str) -> PathBuf {
    explicit.map_or_else(|| PathBuf::from(auto_filename(prompt, format)), PathBuf::from)
}

/// `base` with `-<n>` appended to the stem, for batch results.
#[must_use]
pub fn numbered_path(base: &Path, n: usize) -> PathBuf {
    let stem = base.file_stem().unwrap_or_default().to_string_lossy();
    match base.extension() {
        Some(ext) => base.with_file_name(format!("{stem}-{n}.{}", ext.to_string_lossy())),
        None => base.with_file_name(format!("{stem}-{n}")),
    }
}

/// Resolve an artifact (data URI or URL) to bytes and write it as `format`.
///
/// # Errors
///
/// Returns a fetch error for unreachable URLs, or an I/O or conversion error.
pub async fn save_artifact(
    client: &Client,
    artifact: &str,
    format: &str,
    output_path: &Path,
    timeout: Duration,
) -> GenerationResult<()> {
    let inline = to_inline_bytes(client, artifact, timeout).await?;
    let bytes = inline.decode()?;
    debug!(mime = %inline.mime_type, bytes = bytes.len(), path = %output_path.display(), "saving artifact");
    save_image(&bytes, &inline.mime_type, format, output_path)
}

/// Write raw image bytes, converting when the MIME type differs from `target_format`.
///
/// # Errors
///
/// Returns an error if the file cannot be written or conversion fails.
pub fn save_image(
    data: &[u8],
    source_mime: &str,
    target_format: &str,
    output_path: &Path,
) -> GenerationResult<()> {
    if mime_matches_format(source_mime, target_format) {
        std::fs::write(output_path, data)?;
        Ok(())
    } else {
        convert_and_save(data, target_format, output_path)
    }
}

fn mime_matches_format(mime: &str, format: &str) -> bool {
    matches!((mime, format), ("image/jpeg", "jpeg") | ("image/png", "png") | ("image/webp", "webp"))
}

fn convert_and_save(data: &[u8], target_format: &str, output_path: &Path) -> GenerationResult<()> {
    let image_format = match target_format {
        "jpeg" => image::ImageFormat::Jpeg,
        "png" => image::ImageFormat::Png,
        "webp" => image::ImageFormat::WebP,
        other => {
            return Err(GenerationError::ImageConversion(format!("Unsupported format: {other}")));
        }
    };
    let img = image::load_from_memory(data)
        .map_err(|e| GenerationError::ImageConversion(format!("Failed to decode image: {e}")))?;
    // JPEG has no alpha channel.
    let img = if image_format == image::ImageFormat::Jpeg {
        image::DynamicImage::ImageRgb8(img.to_rgb8())
    } else {
        img
    };
    img.save_with_format(output_path, image_format).map_err(|e| {
        GenerationError::ImageConversion(format!("Failed to save as {target_format}: {e}"))
    })
}
