//! Configuration loading for Bunder Bot.
//!
//! Settings come from an optional `~/.bunderbot/settings.json` file, overlaid by
//! environment variables (after `.env.development` / `.env` have been loaded).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;
use crate::logging::mask_secret;
pub type Result<T> = std::result::Result<T, Error>;

/// Stand-in values from sample env files that mean "not configured".
const PLACEHOLDER_SECRETS: &[&str] = &[
    "doldurun",
    "your-api-key",
    "your-telegram-bot-token",
    "changeme",
];

/// Get the Bunder Bot home directory (~/.bunderbot).
pub fn get_home_dir() -> Result<PathBuf> {
    let home = directories::UserDirs::new()
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

    Ok(home.home_dir().join(".bunderbot"))
}

/// Get the settings file path.
pub fn get_settings_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("settings.json"))
}

/// Load `.env.development` and then `.env` from the working directory.
///
/// Variables already present in the process environment win.
pub fn load_env_files() {
    for name in [".env.development", ".env"] {
        match dotenvy::from_filename(name) {
            Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!("Failed to read {}: {}", name, e),
        }
    }
}

/// Load settings from the settings file (if any) and the process environment.
pub fn load_settings() -> Result<Settings> {
    let path = get_settings_path()?;
    let mut settings = if path.exists() {
        let settings = load_settings_file(&path)?;
        tracing::debug!("Loaded settings from {}", path.display());
        settings
    } else {
        Settings::default()
    };

    settings.apply_env(|key| std::env::var(key).ok());
    settings.normalize();
    validate_settings(&settings)?;

    Ok(settings)
}

/// Parse a JSON settings file.
pub fn load_settings_file(path: &std::path::Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)?;
    let settings: Settings = serde_json::from_str(&content)?;
    Ok(settings)
}

fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.http_timeout_secs == 0 {
        return Err(Error::Config(
            "http_timeout_secs must be greater than zero".to_string(),
        ));
    }
    if settings.sessions.sweep_interval_secs == 0 {
        return Err(Error::Config(
            "sessions.sweep_interval_secs must be greater than zero".to_string(),
        ));
    }
    if settings.sessions.idle_ttl_secs == 0 {
        return Err(Error::Config(
            "sessions.idle_ttl_secs must be greater than zero".to_string(),
        ));
    }
    if settings.sessions.context_limit == 0 {
        return Err(Error::Config(
            "sessions.context_limit must be greater than zero".to_string(),
        ));
    }
    if let Some(url) = settings.agent.url.as_deref() {
        if url::Url::parse(url).is_err() {
            return Err(Error::Config(format!("agent.url '{}' is not a valid URL", url)));
        }
    }
    Ok(())
}

/// True when a secret is absent or one of the known placeholder values.
pub fn is_placeholder(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || PLACEHOLDER_SECRETS
            .iter()
            .any(|p| trimmed.eq_ignore_ascii_case(p))
        || trimmed.contains("placeholder")
}

fn clean_secret(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !is_placeholder(v))
}

/// Which flavour of the bot to run.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    /// Partner-matching assistant with the demo company directory.
    #[default]
    Partners,
    /// Weather information assistant.
    Weather,
}

impl FromStr for Persona {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "partners" | "bunder" => Ok(Persona::Partners),
            "weather" | "hava" => Ok(Persona::Weather),
            other => Err(format!("Unknown persona: {}", other)),
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Persona::Partners => write!(f, "partners"),
            Persona::Weather => write!(f, "weather"),
        }
    }
}

/// Reply language requested from the AI and the weather API.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    #[serde(alias = "turkish")]
    Tr,
    #[serde(alias = "english")]
    En,
}

impl Language {
    /// ISO code passed to the weather API.
    pub fn code(&self) -> &'static str {
        match self {
            Language::Tr => "tr",
            Language::En => "en",
        }
    }

    /// Language name as written inside the (Turkish) prompt template.
    pub fn prompt_name(&self) -> &'static str {
        match self {
            Language::Tr => "Türkçe",
            Language::En => "İngilizce",
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tr" | "turkish" | "türkçe" => Ok(Language::Tr),
            "en" | "english" => Ok(Language::En),
            other => Err(format!("Unknown language: {}", other)),
        }
    }
}

/// Telegram configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u32,
}

fn default_poll_timeout_secs() -> u32 {
    10
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            poll_timeout_secs: default_poll_timeout_secs(),
        }
    }
}

/// Gemini configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            base_url: default_gemini_base_url(),
        }
    }
}

/// Weather API configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_base_url(),
        }
    }
}

/// Locally hosted agent endpoint tried before the direct Gemini call.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AgentEndpointConfig {
    pub url: Option<String>,
    #[serde(default = "default_agent_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_agent_timeout_secs() -> u64 {
    5
}

impl Default for AgentEndpointConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: default_agent_timeout_secs(),
        }
    }
}

/// Conversation memory limits.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SessionConfig {
    #[serde(default = "default_idle_ttl_secs")]
    pub idle_ttl_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    #[serde(default = "default_context_limit")]
    pub context_limit: usize,
}

fn default_idle_ttl_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    1800
}

fn default_context_limit() -> usize {
    10
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_ttl_secs: default_idle_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            context_limit: default_context_limit(),
        }
    }
}

/// Bunder Bot settings.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Settings {
    #[serde(default)]
    pub persona: Persona,

    #[serde(default)]
    pub language: Language,

    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub gemini: GeminiConfig,

    #[serde(default)]
    pub weather: WeatherConfig,

    #[serde(default)]
    pub agent: AgentEndpointConfig,

    #[serde(default)]
    pub sessions: SessionConfig,
}

fn default_http_timeout_secs() -> u64 {
    10
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            persona: Persona::default(),
            language: Language::default(),
            http_timeout_secs: default_http_timeout_secs(),
            telegram: TelegramConfig::default(),
            gemini: GeminiConfig::default(),
            weather: WeatherConfig::default(),
            agent: AgentEndpointConfig::default(),
            sessions: SessionConfig::default(),
        }
    }
}

impl Settings {
    /// Overlay environment variables onto the settings.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = Some(token);
        }
        if let Some(key) =
            lookup("GOOGLE_GENERATIVE_AI_API_KEY").or_else(|| lookup("GOOGLE_API_KEY"))
        {
            self.gemini.api_key = Some(key);
        }
        if let Some(model) = lookup("GEMINI_MODEL") {
            self.gemini.model = model;
        }
        if let Some(url) = lookup("GEMINI_BASE_URL") {
            self.gemini.base_url = url;
        }
        if let Some(key) = lookup("OPENWEATHER_API_KEY").or_else(|| lookup("WEATHER_API_KEY")) {
            self.weather.api_key = Some(key);
        }
        if let Some(url) = lookup("WEATHER_BASE_URL") {
            self.weather.base_url = url;
        }
        if let Some(url) = lookup("BUNDER_AGENT_URL") {
            self.agent.url = Some(url);
        }
        if let Some(persona) = lookup("BUNDER_PERSONA") {
            match persona.parse() {
                Ok(p) => self.persona = p,
                Err(e) => tracing::warn!("Ignoring BUNDER_PERSONA: {}", e),
            }
        }
        if let Some(language) = lookup("BUNDER_LANGUAGE") {
            match language.parse() {
                Ok(l) => self.language = l,
                Err(e) => tracing::warn!("Ignoring BUNDER_LANGUAGE: {}", e),
            }
        }
        if let Some(timeout) = lookup("BUNDER_HTTP_TIMEOUT_SECS") {
            match timeout.trim().parse() {
                Ok(secs) => self.http_timeout_secs = secs,
                Err(_) => {
                    tracing::warn!("Ignoring non-numeric BUNDER_HTTP_TIMEOUT_SECS: {}", timeout)
                }
            }
        }
    }

    /// Drop empty and placeholder secrets so they read as unset.
    pub fn normalize(&mut self) {
        self.telegram.bot_token = clean_secret(self.telegram.bot_token.take());
        self.gemini.api_key = clean_secret(self.gemini.api_key.take());
        self.weather.api_key = clean_secret(self.weather.api_key.take());
        self.agent.url = self
            .agent
            .url
            .take()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
    }

    /// The bot token, required by the Telegram transport.
    pub fn require_bot_token(&self) -> Result<&str> {
        self.telegram.bot_token.as_deref().ok_or_else(|| {
            Error::Config(
                "TELEGRAM_BOT_TOKEN is not set. Add it to .env.development or the environment."
                    .to_string(),
            )
        })
    }

    /// Log warnings for optional services that will run degraded.
    pub fn warn_missing_optional(&self) {
        if self.gemini.api_key.is_none() {
            tracing::warn!("Gemini API key not configured; AI replies will use canned fallbacks");
        }
        if self.weather.api_key.is_none() {
            tracing::warn!("Weather API key not configured; /weather and /forecast are disabled");
        }
    }

    /// Human-readable summary with secrets masked.
    pub fn summary(&self) -> String {
        let secret = |s: &Option<String>| mask_secret(s.as_deref().unwrap_or(""));
        format!(
            "persona: {}\nlanguage: {}\nhttp timeout: {}s\ntelegram token: {}\ngemini key: {}\ngemini model: {}\nweather key: {}\nagent url: {}\ncontext ttl: {}s (sweep every {}s)",
            self.persona,
            self.language.code(),
            self.http_timeout_secs,
            secret(&self.telegram.bot_token),
            secret(&self.gemini.api_key),
            self.gemini.model,
            secret(&self.weather.api_key),
            self.agent.url.as_deref().unwrap_or("<none>"),
            self.sessions.idle_ttl_secs,
            self.sessions.sweep_interval_secs,
        )
    }
}
