//! Recording adapter: delegates to a live stack and captures each call.

pub mod provider;

use serde_json::{json, Value};

use crate::image_ref::{classify, ImageRefKind};
use crate::settings::AppSettings;

/// Non-secret summary of the settings a call ran with.
pub(crate) fn settings_summary(settings: &AppSettings) -> Value {
    json!({
        "provider": settings.provider.as_str(),
        "imageModel": settings.image_model,
        "textModel": settings.text_model,
        "baseUrl": settings.base_url,
    })
}

/// Input images are summarized rather than stored: URLs verbatim, inline data by size.
pub(crate) fn image_summary(image: &str) -> Value {
    match classify(image) {
        ImageRefKind::RemoteUrl => json!({ "url": image }),
        ImageRefKind::DataUri => json!({ "dataUri": { "bytes": image.len() } }),
        ImageRefKind::Base64 => json!({ "base64": { "bytes": image.len() } }),
    }
}
