use serde::Deserialize;

use crate::config::flow::{FlowConfig, PersistenceOwner, PersistencePolicy};

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_allow_origin")]
    pub cors_allow_origin: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OpenAiConfig {
    pub api_base: String,
    pub api_key: String,
    pub default_model: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnthropicConfig {
    pub api_base: String,
    pub api_key: String,
    pub default_model: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub provider: String,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub openai: Option<OpenAiConfig>,
    pub anthropic: Option<AnthropicConfig>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Duckdb,
    Rest,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    pub path: Option<String>,
    pub url: Option<String>,
    pub api_key: Option<String>,
    /// Table name for either backend.
    #[serde(default = "default_table")]
    pub table: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Duckdb,
            path: None,
            url: None,
            api_key: None,
            table: default_table(),
        }
    }
}

/// Selects the questionnaire and overrides a few of its knobs.
#[derive(Debug, Deserialize, Clone)]
pub struct FlowSettings {
    #[serde(default = "default_preset")]
    pub preset: String,
    /// A full flow definition file; wins over `preset`.
    pub path: Option<String>,
    pub button_url: Option<String>,
    pub owner: Option<PersistenceOwner>,
    pub policy: Option<PersistencePolicy>,
    pub reveal_delay_ms: Option<u64>,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            preset: default_preset(),
            path: None,
            button_url: None,
            owner: None,
            policy: None,
            reveal_delay_ms: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    #[serde(default = "default_relay_url")]
    pub relay_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_url: default_relay_url(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub flow: FlowSettings,
    #[serde(default)]
    pub client: ClientConfig,
}

impl AppConfig {
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("INTAKE").separator("__"))
            .build()?;

        let mut app_config: AppConfig = settings.try_deserialize()?;

        // Secrets may be written as ${VAR} and resolved from the environment
        app_config.server.host = expand_env(&app_config.server.host);

        if let Some(ref mut openai) = app_config.llm.openai {
            openai.api_key = expand_env(&openai.api_key);
        }
        if let Some(ref mut anthropic) = app_config.llm.anthropic {
            anthropic.api_key = expand_env(&anthropic.api_key);
        }
        app_config.store.path = app_config.store.path.as_deref().map(expand_env);
        app_config.store.url = app_config.store.url.as_deref().map(expand_env);
        app_config.store.api_key = app_config.store.api_key.as_deref().map(expand_env);

        Ok(app_config)
    }

    /// Builds the active flow: the definition file or named preset, then the
    /// per-deployment overrides from the `flow` section.
    pub fn resolve_flow(&self) -> Result<FlowConfig, config::ConfigError> {
        let settings = &self.flow;

        let mut flow = match &settings.path {
            Some(path) => FlowConfig::load(path)?,
            None => FlowConfig::preset(&settings.preset).ok_or_else(|| {
                config::ConfigError::Message(format!("unknown flow preset '{}'", settings.preset))
            })?,
        };

        if let Some(url) = &settings.button_url {
            flow.button_url = Some(url.clone()).filter(|u| !u.is_empty());
        }
        if let Some(owner) = settings.owner {
            flow.persistence.owner = owner;
        }
        if let Some(policy) = settings.policy {
            flow.persistence.policy = policy;
        }
        if let Some(delay) = settings.reveal_delay_ms {
            flow.reveal_delay_ms = delay;
        }
        if let Some(temperature) = self.llm.temperature {
            flow.temperature = temperature;
        }

        Ok(flow)
    }
}

fn default_allow_origin() -> String {
    "*".to_string()
}

fn default_table() -> String {
    "applications".to_string()
}

fn default_preset() -> String {
    "intake".to_string()
}

fn default_relay_url() -> String {
    "http://127.0.0.1:8080/chat".to_string()
}

pub fn expand_env(val: &str) -> String {
    if val.starts_with("${") && val.ends_with('}') {
        let var_name = &val[2..val.len() - 1];
        std::env::var(var_name).unwrap_or_default()
    } else {
        val.to_string()
    }
}
