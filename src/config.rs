use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StartupError;

/// Name of the credential, both as a secrets.toml key and as an environment variable.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable that relocates the helpline home directory.
pub const HOME_ENV: &str = "HELPLINE_HOME";

const CONFIG_FILE: &str = "config.toml";
const SECRETS_FILE: &str = "secrets.toml";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Completion service settings
    pub completion: CompletionSettings,

    /// Few-shot dataset settings
    pub dataset: DatasetSettings,

    /// UI preferences
    pub ui: UiConfig,

    /// Credential read from the secret store; never written back to config.toml
    #[serde(skip)]
    pub api_key: Option<String>,

    /// Helpline home directory
    #[serde(skip)]
    pub home: PathBuf,
}

/// Parameters sent with every completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionSettings {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Where the example dialogues come from and how many are sampled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetSettings {
    pub path: PathBuf,
    pub dialogue_column: String,
    pub label_column: String,
    pub num_examples: usize,
    pub seed: u64,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub title: String,
    pub show_sidebar: bool,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 200,
            temperature: 0.7,
        }
    }
}

impl Default for DatasetSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("empathetic_dialogues.csv"),
            dialogue_column: "empathetic_dialogues".to_string(),
            label_column: "labels".to_string(),
            num_examples: crate::sampler::NUM_EXAMPLES,
            seed: crate::sampler::SAMPLE_SEED,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: "Helpline Conversation Assistant".to_string(),
            show_sidebar: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            completion: CompletionSettings::default(),
            dataset: DatasetSettings::default(),
            ui: UiConfig::default(),
            api_key: None,
            home: default_home(),
        }
    }
}

/// `$HELPLINE_HOME`, else `~/.helpline`.
pub fn default_home() -> PathBuf {
    if let Some(dir) = std::env::var_os(HOME_ENV) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".helpline")
}

/// The secrets-file key wins; a blank one defers to the environment.
fn resolve_api_key(from_file: Option<String>, from_env: Option<String>) -> Option<String> {
    let present = |key: &String| !key.trim().is_empty();
    from_file.filter(present).or_else(|| from_env.filter(present))
}

impl Config {
    /// Load configuration from the default home directory
    pub fn load() -> Result<Self> {
        Self::load_from(&default_home())
    }

    /// Load `config.toml` and the secret store from `home`.
    ///
    /// A missing config file yields defaults. A missing credential is not an
    /// error here; it surfaces through [`Config::require_api_key`].
    pub fn load_from(home: &Path) -> Result<Self> {
        let config_path = home.join(CONFIG_FILE);

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?
        } else {
            Config::default()
        };

        config.home = home.to_path_buf();
        config.api_key =
            resolve_api_key(Self::load_secret(home)?, std::env::var(API_KEY_ENV).ok());

        Ok(config)
    }

    /// Write the configuration, refusing to clobber an existing file
    pub fn save_new(&self) -> Result<PathBuf> {
        fs::create_dir_all(&self.home)
            .with_context(|| format!("Failed to create {}", self.home.display()))?;

        let config_path = self.home.join(CONFIG_FILE);
        if config_path.exists() {
            anyhow::bail!("{} already exists", config_path.display());
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        Ok(config_path)
    }

    /// Read `OPENAI_API_KEY` from `secrets.toml`, if the file exists.
    ///
    /// Other keys and tables in the file are left alone.
    fn load_secret(home: &Path) -> Result<Option<String>> {
        let secrets_path = home.join(SECRETS_FILE);
        if !secrets_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&secrets_path)
            .with_context(|| format!("Failed to read {}", secrets_path.display()))?;
        let secrets: toml::Table = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", secrets_path.display()))?;

        Ok(secrets
            .get(API_KEY_ENV)
            .and_then(toml::Value::as_str)
            .map(str::to_string))
    }

    /// The credential, or the fatal configuration error when there is none
    pub fn require_api_key(&self) -> Result<&str, StartupError> {
        self.api_key.as_deref().ok_or_else(|| {
            StartupError::config(format!(
                "missing {API_KEY_ENV}: add it to {} or export it",
                self.home.join(SECRETS_FILE).display()
            ))
        })
    }

    /// Directory for log files written while the TUI owns the terminal
    pub fn log_dir(&self) -> PathBuf {
        self.home.join("logs")
    }
}
