//! Runtime configuration
//!
//! Loaded once at process start from `orderd.toml` and passed explicitly to
//! the transition engine and the notification gateway. There are no baked-in
//! addresses or keys; everything routable lives here.

use crate::models::Stage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "orderd.toml";

/// Top-level daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderdConfig {
    /// Directory holding the persistent store and processed-file set
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory scanned for incoming order JSON files
    #[serde(default = "default_import_dir")]
    pub import_dir: PathBuf,

    /// Directory holding externally persisted order sidecar files
    #[serde(default = "default_sidecar_dir")]
    pub sidecar_dir: PathBuf,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub notify: NotifyConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("orderd/data")
}

fn default_import_dir() -> PathBuf {
    PathBuf::from("orderd/imports")
}

fn default_sidecar_dir() -> PathBuf {
    PathBuf::from("orders")
}

fn default_port() -> u16 {
    8000
}

impl Default for OrderdConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            import_dir: default_import_dir(),
            sidecar_dir: default_sidecar_dir(),
            port: default_port(),
            notify: NotifyConfig::default(),
        }
    }
}

impl OrderdConfig {
    /// Load config from `<root>/orderd.toml`, falling back to defaults
    pub fn load(root: &Path) -> anyhow::Result<Self> {
        let config_path = root.join(CONFIG_FILENAME);
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: OrderdConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from the current directory, then the user config dir
    pub fn load_default() -> anyhow::Result<Self> {
        let cwd = std::env::current_dir()?;
        if cwd.join(CONFIG_FILENAME).exists() {
            return Self::load(&cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            let user_root = config_dir.join("orderd");
            if user_root.join(CONFIG_FILENAME).exists() {
                return Self::load(&user_root);
            }
        }
        Ok(Self::default())
    }

    /// Save config to `<root>/orderd.toml`
    pub fn save(&self, root: &Path) -> anyhow::Result<()> {
        std::fs::create_dir_all(root)?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(root.join(CONFIG_FILENAME), content)?;
        Ok(())
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("orders.json")
    }
}

/// Notification gateway settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Sender address on outgoing messages
    #[serde(default = "default_sender")]
    pub sender: String,

    /// Mail API endpoint (used by the `email` feature)
    #[serde(default)]
    pub mail_endpoint: Option<String>,

    /// Mail API key (used by the `email` feature)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Responsible address per stage; one entry per catalog member
    #[serde(default = "default_stage_recipients")]
    pub stage_recipients: HashMap<String, String>,
}

fn default_sender() -> String {
    "orders@example.com".to_string()
}

fn default_stage_recipients() -> HashMap<String, String> {
    Stage::ALL
        .iter()
        .map(|stage| {
            (
                stage.name().to_string(),
                format!("{}@example.com", stage.name().to_lowercase()),
            )
        })
        .collect()
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            sender: default_sender(),
            mail_endpoint: None,
            api_key: None,
            stage_recipients: default_stage_recipients(),
        }
    }
}

impl NotifyConfig {
    /// Responsible address for a stage, if configured
    pub fn stage_recipient(&self, stage: Stage) -> Option<&str> {
        self.stage_recipients.get(stage.name()).map(String::as_str)
    }
}
