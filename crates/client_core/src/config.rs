use std::{collections::HashMap, fs};

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// GraphQL endpoint of the quote API.
    pub api_url: String,
    /// API key for the pre-established machine identity.
    pub api_key: String,
    /// Opaque trigger token sent as the generation function's input.
    pub generation_token: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:4000/graphql".into(),
            api_key: "devkey".into(),
            generation_token: "generate".into(),
        }
    }
}

/// Loads settings from defaults, then `quotecard.toml` in the working
/// directory, then environment variables. Never fails; missing or malformed
/// sources fall back to the previous layer.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("quotecard.toml") {
        apply_file_overrides(&mut settings, &raw);
    }

    if let Ok(v) = std::env::var("QUOTECARD_API_URL") {
        settings.api_url = v;
    }
    if let Ok(v) = std::env::var("QUOTECARD_API_KEY") {
        settings.api_key = v;
    }
    if let Ok(v) = std::env::var("QUOTECARD_GENERATION_TOKEN") {
        settings.generation_token = v;
    }

    settings
}

fn apply_file_overrides(settings: &mut Settings, raw: &str) {
    if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) {
        if let Some(v) = file_cfg.get("api_url") {
            settings.api_url = v.clone();
        }
        if let Some(v) = file_cfg.get("api_key") {
            settings.api_key = v.clone();
        }
        if let Some(v) = file_cfg.get("generation_token") {
            settings.generation_token = v.clone();
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
