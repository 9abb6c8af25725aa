//! Configuration file management for planbuddy.
//!
//! Provides a TOML-based config file at `~/.config/planbuddy/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use planbuddy_core::{ApiClient, ModelConfig};
use planbuddy_store::StoreConfig;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub server: ServerSection,
    pub model: ModelSection,
    pub client: ClientSection,
    pub storage: StorageSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSection {
    /// Generative Language API key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSection {
    /// Where the client finds the relay.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the planbuddy config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/planbuddy` or `~/.config/planbuddy`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("planbuddy");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("planbuddy")
}

/// Return the path to the planbuddy config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns `Ok(None)` if it does not exist.
pub fn load_config() -> Result<Option<ConfigFile>> {
    let path = config_path();
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(Some(config))
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix, since it may hold an API key.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Values given on the command line, each overriding everything else.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub api_url: Option<String>,
    pub data_dir: Option<PathBuf>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct PlanbuddyConfig {
    pub bind: String,
    pub port: u16,
    pub model: ModelConfig,
    pub api_base_url: String,
    pub store: StoreConfig,
}

impl PlanbuddyConfig {
    pub const DEFAULT_BIND: &str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 3000;

    /// Resolve configuration from the CLI, the environment, and the config
    /// file on disk.
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        let file = load_config()?;
        Self::resolve_with(cli, file.unwrap_or_default())
    }

    /// Resolve using the chain: CLI flag > env var > config file > default.
    ///
    /// - Bind: `--bind` > `PLANBUDDY_BIND` > `server.bind` > `0.0.0.0`
    /// - Port: `--port` > `PORT` > `server.port` > `3000`
    /// - API key: `GEMINI_API_KEY` > `model.api_key` > none
    /// - Model: `PLANBUDDY_MODEL` > `model.name` > `gemini-2.5-flash`
    /// - Model endpoint: `PLANBUDDY_MODEL_BASE_URL` > `model.base_url` > Google
    /// - Relay URL: `--api-url` > `PLANBUDDY_API_BASE_URL` > `client.api_base_url` > `http://localhost:3000`
    /// - Data dir: `--data-dir` > `PLANBUDDY_DATA_DIR` > `storage.data_dir` > platform data dir
    pub fn resolve_with(cli: &CliOverrides, file: ConfigFile) -> Result<Self> {
        let bind = pick(cli.bind.clone(), "PLANBUDDY_BIND", file.server.bind)
            .unwrap_or_else(|| Self::DEFAULT_BIND.to_string());

        let port = match (cli.port, env_var("PORT")) {
            (Some(p), _) => p,
            (None, Some(raw)) => raw
                .parse::<u16>()
                .with_context(|| format!("PORT env var is not a valid port: {raw:?}"))?,
            (None, None) => file.server.port.unwrap_or(Self::DEFAULT_PORT),
        };

        let model = ModelConfig {
            api_key: pick(None, "GEMINI_API_KEY", file.model.api_key),
            model: pick(None, "PLANBUDDY_MODEL", file.model.name)
                .unwrap_or_else(|| ModelConfig::DEFAULT_MODEL.to_string()),
            base_url: pick(None, "PLANBUDDY_MODEL_BASE_URL", file.model.base_url)
                .unwrap_or_else(|| ModelConfig::DEFAULT_BASE_URL.to_string()),
        };

        let api_base_url = pick(
            cli.api_url.clone(),
            "PLANBUDDY_API_BASE_URL",
            file.client.api_base_url,
        )
        .unwrap_or_else(|| ApiClient::DEFAULT_BASE_URL.to_string());

        let data_dir = cli
            .data_dir
            .clone()
            .or_else(|| env_var("PLANBUDDY_DATA_DIR").map(PathBuf::from))
            .or(file.storage.data_dir)
            .unwrap_or_else(StoreConfig::default_data_dir);

        Ok(Self {
            bind,
            port,
            model,
            api_base_url,
            store: StoreConfig::new(data_dir),
        })
    }

    /// The model config, or an error explaining how to supply the key.
    pub fn require_model(&self) -> Result<&ModelConfig> {
        if self.model.api_key.is_none() {
            bail!(
                "model API key not found; set GEMINI_API_KEY or run `planbuddy init --api-key <KEY>`"
            );
        }
        Ok(&self.model)
    }
}

/// Non-empty environment variable.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn pick(cli: Option<String>, env: &str, file: Option<String>) -> Option<String> {
    cli.or_else(|| env_var(env)).or(file)
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const ENV_VARS: [&str; 7] = [
        "PLANBUDDY_BIND",
        "PORT",
        "GEMINI_API_KEY",
        "PLANBUDDY_MODEL",
        "PLANBUDDY_MODEL_BASE_URL",
        "PLANBUDDY_API_BASE_URL",
        "PLANBUDDY_DATA_DIR",
    ];

    fn lock_clean_env() -> std::sync::MutexGuard<'static, ()> {
        let guard = crate::test_util::lock_env();
        for var in ENV_VARS {
            unsafe { std::env::remove_var(var) };
        }
        guard
    }

    fn file_with_everything() -> ConfigFile {
        ConfigFile {
            server: ServerSection {
                bind: Some("127.0.0.1".to_string()),
                port: Some(8080),
            },
            model: ModelSection {
                api_key: Some("file-key".to_string()),
                name: Some("gemini-file".to_string()),
                base_url: Some("http://model.file".to_string()),
            },
            client: ClientSection {
                api_base_url: Some("http://relay.file".to_string()),
            },
            storage: StorageSection {
                data_dir: Some(PathBuf::from("/tmp/pb-file")),
            },
        }
    }

    #[test]
    fn defaults_when_nothing_set() {
        let _lock = lock_clean_env();

        let cfg = PlanbuddyConfig::resolve_with(&CliOverrides::default(), ConfigFile::default())
            .unwrap();
        assert_eq!(cfg.bind, "0.0.0.0");
        assert_eq!(cfg.port, 3000);
        assert!(cfg.model.api_key.is_none());
        assert_eq!(cfg.model.model, "gemini-2.5-flash");
        assert_eq!(cfg.api_base_url, "http://localhost:3000");
        assert_eq!(cfg.store.data_dir, StoreConfig::default_data_dir());
    }

    #[test]
    fn config_file_beats_defaults() {
        let _lock = lock_clean_env();

        let cfg =
            PlanbuddyConfig::resolve_with(&CliOverrides::default(), file_with_everything())
                .unwrap();
        assert_eq!(cfg.bind, "127.0.0.1");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.model.api_key.as_deref(), Some("file-key"));
        assert_eq!(cfg.model.model, "gemini-file");
        assert_eq!(cfg.model.base_url, "http://model.file");
        assert_eq!(cfg.api_base_url, "http://relay.file");
        assert_eq!(cfg.store.data_dir, PathBuf::from("/tmp/pb-file"));
    }

    #[test]
    fn env_beats_config_file() {
        let _lock = lock_clean_env();
        unsafe { std::env::set_var("PORT", "4000") };
        unsafe { std::env::set_var("GEMINI_API_KEY", "env-key") };
        unsafe { std::env::set_var("PLANBUDDY_API_BASE_URL", "http://relay.env") };

        let cfg =
            PlanbuddyConfig::resolve_with(&CliOverrides::default(), file_with_everything())
                .unwrap();

        for var in ENV_VARS {
            unsafe { std::env::remove_var(var) };
        }

        assert_eq!(cfg.port, 4000);
        assert_eq!(cfg.model.api_key.as_deref(), Some("env-key"));
        assert_eq!(cfg.api_base_url, "http://relay.env");
        assert_eq!(cfg.bind, "127.0.0.1");
    }

    #[test]
    fn cli_beats_everything() {
        let _lock = lock_clean_env();
        unsafe { std::env::set_var("PORT", "4000") };

        let cli = CliOverrides {
            bind: Some("::1".to_string()),
            port: Some(5000),
            api_url: Some("http://relay.cli".to_string()),
            data_dir: Some(PathBuf::from("/tmp/pb-cli")),
        };
        let cfg = PlanbuddyConfig::resolve_with(&cli, file_with_everything()).unwrap();

        unsafe { std::env::remove_var("PORT") };

        assert_eq!(cfg.bind, "::1");
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.api_base_url, "http://relay.cli");
        assert_eq!(cfg.store.data_dir, PathBuf::from("/tmp/pb-cli"));
    }

    #[test]
    fn invalid_port_env_is_error() {
        let _lock = lock_clean_env();
        unsafe { std::env::set_var("PORT", "not-a-port") };

        let result =
            PlanbuddyConfig::resolve_with(&CliOverrides::default(), ConfigFile::default());

        unsafe { std::env::remove_var("PORT") };

        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("PORT env var"), "unexpected error: {msg}");
    }

    #[test]
    fn require_model_errors_without_key() {
        let _lock = lock_clean_env();

        let cfg = PlanbuddyConfig::resolve_with(&CliOverrides::default(), ConfigFile::default())
            .unwrap();
        let msg = cfg.require_model().unwrap_err().to_string();
        assert!(msg.contains("model API key not found"), "unexpected error: {msg}");
    }

    #[test]
    fn partial_config_file_parses() {
        let parsed: ConfigFile = toml::from_str("[server]\nport = 9000\n").unwrap();
        assert_eq!(parsed.server.port, Some(9000));
        assert!(parsed.model.api_key.is_none());
        assert!(parsed.client.api_base_url.is_none());
    }

    #[test]
    fn config_roundtrip_omits_unset_fields() {
        let cfg = ConfigFile {
            model: ModelSection {
                api_key: Some("k".to_string()),
                ..ModelSection::default()
            },
            ..ConfigFile::default()
        };
        let text = toml::to_string_pretty(&cfg).unwrap();
        assert!(text.contains("api_key = \"k\""));
        assert!(!text.contains("port"));

        let back: ConfigFile = toml::from_str(&text).unwrap();
        assert_eq!(back.model.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("planbuddy/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
