use std::{collections::HashMap, fs, str::FromStr};

use tracing::warn;
use url::Url;

pub const SETTINGS_FILE: &str = "feedback.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    /// Drop the local item once the delete request completes, whatever its outcome.
    #[default]
    AlwaysRemove,
    /// Keep the local item when the delete request fails.
    RequireServerSuccess,
}

impl FromStr for DeletePolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "always_remove" => Ok(Self::AlwaysRemove),
            "require_server_success" => Ok(Self::RequireServerSuccess),
            other => Err(format!("unknown delete policy `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_url: String,
    pub collection: String,
    pub delete_policy: DeletePolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000".into(),
            collection: "feedback".into(),
            delete_policy: DeletePolicy::AlwaysRemove,
        }
    }
}

impl Settings {
    /// Absolute URL of the collection endpoint, e.g. `http://localhost:5000/feedback`.
    pub fn collection_url(&self) -> Result<Url, url::ParseError> {
        let mut base = Url::parse(self.api_url.trim())?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(self.collection.trim_matches('/'))
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(SETTINGS_FILE) {
        apply_file_overrides(&mut settings, &raw);
    }
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());

    settings
}

fn apply_file_overrides(settings: &mut Settings, raw: &str) {
    let file_cfg = match toml::from_str::<HashMap<String, String>>(raw) {
        Ok(file_cfg) => file_cfg,
        Err(err) => {
            warn!("ignoring malformed {SETTINGS_FILE}: {err}");
            return;
        }
    };

    if let Some(v) = file_cfg.get("api_url") {
        settings.api_url = v.clone();
    }
    if let Some(v) = file_cfg.get("collection") {
        settings.collection = v.clone();
    }
    if let Some(v) = file_cfg.get("delete_policy") {
        set_delete_policy(settings, v);
    }
}

fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("FEEDBACK_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = lookup("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = lookup("APP__COLLECTION") {
        settings.collection = v;
    }

    if let Some(v) = lookup("APP__DELETE_POLICY") {
        set_delete_policy(settings, &v);
    }
}

fn set_delete_policy(settings: &mut Settings, raw: &str) {
    match raw.parse() {
        Ok(policy) => settings.delete_policy = policy,
        Err(err) => warn!("keeping delete policy {:?}: {err}", settings.delete_policy),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
