use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use vitabot_ai::ReloadPolicy;
use vitabot_ai::chain::DEFAULT_TEMPERATURE;
use vitabot_ai::llm::{DEFAULT_API_KEY_ENV, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL, ModelSpec};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub context_path: PathBuf,
    pub context_reload: ReloadPolicy,
    pub model: ModelSpec,
    pub temperature: f32,
}

#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    server: ServerSection,
    #[serde(default)]
    context: ContextSection,
    #[serde(default)]
    model: ModelSection,
}

#[derive(Debug, Deserialize)]
struct ServerSection {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ContextSection {
    #[serde(default = "default_context_path")]
    path: PathBuf,
    #[serde(default)]
    reload: ReloadPolicy,
}

impl Default for ContextSection {
    fn default() -> Self {
        Self {
            path: default_context_path(),
            reload: ReloadPolicy::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ModelSection {
    #[serde(default = "default_model")]
    name: String,
    #[serde(default = "default_base_url")]
    base_url: String,
    #[serde(default = "default_api_key_env")]
    api_key_env: String,
    #[serde(default = "default_temperature")]
    temperature: f32,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            name: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_context_path() -> PathBuf {
    PathBuf::from("data/dataset.json")
}

fn default_model() -> String {
    DEFAULT_OPENAI_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_OPENAI_BASE_URL.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

impl From<FileConfig> for ServerConfig {
    fn from(file: FileConfig) -> Self {
        Self {
            host: file.server.host,
            port: file.server.port,
            context_path: file.context.path,
            context_reload: file.context.reload,
            model: ModelSpec {
                model: file.model.name,
                base_url: file.model.base_url,
                api_key_env: file.model.api_key_env,
            },
            temperature: file.model.temperature,
        }
    }
}

impl ServerConfig {
    pub fn load() -> anyhow::Result<Self> {
        if let Some(file_config) = load_from_file()? {
            return Ok(file_config.into());
        }

        Self::from_env()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Unset variables take their defaults; a set but unparseable value is a
    /// startup error.
    fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = match var("VITABOT_SERVER_PORT") {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("Invalid VITABOT_SERVER_PORT: {value}"))?,
            None => default_port(),
        };
        let context_reload = match var("VITABOT_CONTEXT_RELOAD") {
            Some(value) => value
                .parse::<ReloadPolicy>()
                .with_context(|| format!("Invalid VITABOT_CONTEXT_RELOAD: {value}"))?,
            None => ReloadPolicy::default(),
        };
        let temperature = match var("VITABOT_TEMPERATURE") {
            Some(value) => value
                .parse::<f32>()
                .with_context(|| format!("Invalid VITABOT_TEMPERATURE: {value}"))?,
            None => default_temperature(),
        };

        Ok(Self {
            host: var("VITABOT_SERVER_HOST").unwrap_or_else(default_host),
            port,
            context_path: var("VITABOT_CONTEXT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_context_path),
            context_reload,
            model: ModelSpec {
                model: var("VITABOT_MODEL").unwrap_or_else(default_model),
                base_url: var("VITABOT_OPENAI_BASE_URL").unwrap_or_else(default_base_url),
                api_key_env: var("VITABOT_API_KEY_ENV").unwrap_or_else(default_api_key_env),
            },
            temperature,
        })
    }
}

fn load_from_file() -> anyhow::Result<Option<FileConfig>> {
    let config_path = env::var("VITABOT_SERVER_CONFIG").ok();
    let path = if let Some(path) = config_path {
        Some(path)
    } else if Path::new("server.toml").exists() {
        Some("server.toml".to_string())
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(None);
    };

    let contents = fs::read_to_string(&path)
        .map_err(|err| anyhow::anyhow!("Failed to read config {}: {}", path, err))?;
    parse_file_config(&contents)
        .map(Some)
        .map_err(|err| anyhow::anyhow!("Failed to parse config {}: {}", path, err))
}

fn parse_file_config(contents: &str) -> Result<FileConfig, toml::de::Error> {
    toml::from_str(contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: ServerConfig = parse_file_config("").unwrap().into();
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.context_path, PathBuf::from("data/dataset.json"));
        assert_eq!(config.context_reload, ReloadPolicy::PerRequest);
        assert_eq!(config.model.model, "gpt-4o-mini");
        assert_eq!(config.model.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.temperature, 0.0);
    }

    #[test]
    fn test_file_sections_override_defaults() {
        let config: ServerConfig = parse_file_config(
            r#"
            [server]
            port = 8080

            [context]
            path = "/srv/vitabot/dataset.json"
            reload = "once"

            [model]
            name = "gpt-4o"
            base_url = "http://localhost:11434/v1"
            api_key_env = "LOCAL_LLM_KEY"
            temperature = 0.2
            "#,
        )
        .unwrap()
        .into();

        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.context_path, PathBuf::from("/srv/vitabot/dataset.json"));
        assert_eq!(config.context_reload, ReloadPolicy::Once);
        assert_eq!(config.model.model, "gpt-4o");
        assert_eq!(config.model.base_url, "http://localhost:11434/v1");
        assert_eq!(config.model.api_key_env, "LOCAL_LLM_KEY");
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn test_unknown_reload_policy_is_rejected() {
        assert!(parse_file_config("[context]\nreload = \"hourly\"").is_err());
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: std::collections::HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_env_defaults_and_overrides() {
        let config = ServerConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.context_reload, ReloadPolicy::PerRequest);

        let config = ServerConfig::from_vars(vars(&[
            ("VITABOT_SERVER_HOST", "127.0.0.1"),
            ("VITABOT_SERVER_PORT", "8080"),
            ("VITABOT_CONTEXT_RELOAD", "once"),
            ("VITABOT_TEMPERATURE", "0.5"),
            ("VITABOT_API_KEY_ENV", "LOCAL_LLM_KEY"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.context_reload, ReloadPolicy::Once);
        assert_eq!(config.temperature, 0.5);
        assert_eq!(config.model.api_key_env, "LOCAL_LLM_KEY");
    }

    #[test]
    fn test_invalid_env_values_are_rejected() {
        for (name, value) in [
            ("VITABOT_SERVER_PORT", "http"),
            ("VITABOT_TEMPERATURE", "warm"),
            ("VITABOT_CONTEXT_RELOAD", "hourly"),
        ] {
            let err = ServerConfig::from_vars(vars(&[(name, value)])).unwrap_err();
            assert!(err.to_string().contains(name), "{name}: {err}");
        }
    }
}
