use std::{fs, time::Duration};

use oracle::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};

pub const SETTINGS_FILE: &str = "server.toml";

#[derive(Clone)]
pub struct Settings {
    pub server_bind: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub gemini_temperature: Option<f32>,
    pub ai_timeout_seconds: u64,
    pub session_idle_seconds: u64,
    pub catalog_path: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8501".into(),
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.into(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.into(),
            gemini_temperature: None,
            ai_timeout_seconds: 30,
            session_idle_seconds: 30 * 60,
            catalog_path: None,
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("server_bind", &self.server_bind)
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("gemini_temperature", &self.gemini_temperature)
            .field("ai_timeout_seconds", &self.ai_timeout_seconds)
            .field("session_idle_seconds", &self.session_idle_seconds)
            .field("catalog_path", &self.catalog_path)
            .finish()
    }
}

impl Settings {
    pub fn ai_timeout(&self) -> Duration {
        Duration::from_secs(self.ai_timeout_seconds)
    }

    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_seconds)
    }

    /// Applies the flat keys of a `server.toml` file. Unknown keys and
    /// values of the wrong type are ignored.
    pub fn apply_file(&mut self, raw: &str) {
        let Ok(table) = raw.parse::<toml::Table>() else {
            return;
        };

        if let Some(v) = table.get("bind_addr").and_then(|v| v.as_str()) {
            self.server_bind = v.to_string();
        }
        if let Some(v) = table.get("gemini_model").and_then(|v| v.as_str()) {
            self.gemini_model = v.to_string();
        }
        if let Some(v) = table.get("gemini_base_url").and_then(|v| v.as_str()) {
            self.gemini_base_url = v.to_string();
        }
        if let Some(v) = table.get("catalog_path").and_then(|v| v.as_str()) {
            self.catalog_path = Some(v.to_string());
        }
        if let Some(secs) = table.get("ai_timeout_seconds").and_then(seconds_value) {
            self.ai_timeout_seconds = secs;
        }
        if let Some(secs) = table.get("session_idle_seconds").and_then(seconds_value) {
            self.session_idle_seconds = secs;
        }
        if let Some(temperature) = table.get("gemini_temperature").and_then(temperature_value) {
            self.gemini_temperature = Some(temperature);
        }
    }

    /// Applies environment overrides; `APP__` names win over the short ones.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("SERVER_BIND") {
            self.server_bind = v;
        }
        if let Some(v) = var("APP__BIND_ADDR") {
            self.server_bind = v;
        }

        if let Some(v) = var("GOOGLE_API_KEY") {
            self.gemini_api_key = Some(v);
        }
        if let Some(v) = var("APP__GEMINI_API_KEY") {
            self.gemini_api_key = Some(v);
        }
        if self
            .gemini_api_key
            .as_deref()
            .is_some_and(|key| key.trim().is_empty())
        {
            self.gemini_api_key = None;
        }

        if let Some(v) = var("GEMINI_MODEL") {
            self.gemini_model = v;
        }
        if let Some(v) = var("APP__GEMINI_MODEL") {
            self.gemini_model = v;
        }

        if let Some(v) = var("APP__GEMINI_BASE_URL") {
            self.gemini_base_url = v;
        }

        if let Some(secs) = var("APP__AI_TIMEOUT_SECONDS").and_then(|v| parse_seconds(&v)) {
            self.ai_timeout_seconds = secs;
        }
        if let Some(secs) = var("APP__SESSION_IDLE_SECONDS").and_then(|v| parse_seconds(&v)) {
            self.session_idle_seconds = secs;
        }
        if let Some(temperature) =
            var("APP__GEMINI_TEMPERATURE").and_then(|v| parse_temperature(&v))
        {
            self.gemini_temperature = Some(temperature);
        }

        if let Some(v) = var("APP__CATALOG_PATH") {
            self.catalog_path = Some(v);
        }
    }
}

/// Durations must be positive; anything else keeps the previous value.
fn parse_seconds(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|secs| *secs > 0)
}

fn seconds_value(value: &toml::Value) -> Option<u64> {
    match value {
        toml::Value::Integer(secs) => u64::try_from(*secs).ok().filter(|secs| *secs > 0),
        toml::Value::String(raw) => parse_seconds(raw),
        _ => None,
    }
}

/// Gemini accepts temperatures in `0.0..=2.0`.
fn parse_temperature(raw: &str) -> Option<f32> {
    raw.trim().parse::<f32>().ok().filter(valid_temperature)
}

fn temperature_value(value: &toml::Value) -> Option<f32> {
    match value {
        toml::Value::Float(t) => Some(*t as f32).filter(valid_temperature),
        toml::Value::Integer(t) => Some(*t as f32).filter(valid_temperature),
        toml::Value::String(raw) => parse_temperature(raw),
        _ => None,
    }
}

fn valid_temperature(t: &f32) -> bool {
    (0.0..=2.0).contains(t)
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(SETTINGS_FILE) {
        settings.apply_file(&raw);
    }
    settings.apply_env(|key| std::env::var(key).ok());

    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
