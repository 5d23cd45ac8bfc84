use std::env;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use feed_domain::RuntimeConfig;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub data_dir: String,
    pub feed_url: String,
    /// Queue identifier for the long-poll feed. Empty means a random one is
    /// generated at startup.
    pub feed_queue_id: String,
    pub reference_base_url: String,
    pub delivery_webhook_url: Option<String>,
    pub delivery_webhook_template: Option<String>,
    pub request_timeout_seconds: u64,
    pub dedupe_window_seconds: u64,
    pub max_body_bytes: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3210".to_string(),
            api_token: None,
            data_dir: "./data".to_string(),
            feed_url: "https://zkillredisq.stream/listen.php".to_string(),
            feed_queue_id: String::new(),
            reference_base_url: "https://esi.evetech.net/latest/".to_string(),
            delivery_webhook_url: None,
            delivery_webhook_template: None,
            request_timeout_seconds: 15,
            dedupe_window_seconds: 60,
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl AppConfig {
    pub async fn load() -> Result<Self> {
        let path = env::var("KILLFEED_CONFIG").unwrap_or_else(|_| "./config.toml".to_string());
        let file_path = Path::new(&path);
        let base_dir = file_path.parent();
        if !file_path.exists() {
            warn!("config.toml not found, using defaults");
            let mut config = AppConfig::default();
            config.apply_env_overrides();
            config.resolve_paths(base_dir);
            config.normalize();
            config.validate()?;
            return Ok(config);
        }
        let content = fs::read_to_string(file_path).await?;
        let mut config: AppConfig = toml::from_str(&content)?;
        config.apply_env_overrides();
        config.resolve_paths(base_dir);
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn normalize(&mut self) {
        if let Some(api_token) = &self.api_token {
            if api_token.trim().is_empty() {
                self.api_token = None;
            }
        }
        if let Some(url) = &self.delivery_webhook_url {
            if url.trim().is_empty() {
                self.delivery_webhook_url = None;
            }
        }
        if let Some(template) = &self.delivery_webhook_template {
            if template.trim().is_empty() {
                self.delivery_webhook_template = None;
            }
        }
        if !self.reference_base_url.ends_with('/') {
            self.reference_base_url.push('/');
        }
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        self.data_dir = resolve_path(base, &self.data_dir);
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        if self.feed_url.trim().is_empty() {
            return Err(anyhow!("feed_url must not be empty"));
        }
        if self.request_timeout_seconds == 0 {
            return Err(anyhow!("request_timeout_seconds must be greater than 0"));
        }
        if self.dedupe_window_seconds == 0 {
            return Err(anyhow!("dedupe_window_seconds must be greater than 0"));
        }
        if self.max_body_bytes == 0 {
            return Err(anyhow!("max_body_bytes must be greater than 0"));
        }
        Ok(())
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        let data = Path::new(&self.data_dir);
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            api_token: self.api_token.clone(),
            data_dir: self.data_dir.clone(),
            subscriptions_dir: data.join("subscriptions").to_string_lossy().to_string(),
            systems_path: data.join("systems.json").to_string_lossy().to_string(),
            ship_groups_path: data.join("ship_groups.json").to_string_lossy().to_string(),
            names_path: data.join("names.json").to_string_lossy().to_string(),
            feed_url: self.feed_url.clone(),
            feed_queue_id: self.feed_queue_id.clone(),
            reference_base_url: self.reference_base_url.clone(),
            delivery_webhook_url: self.delivery_webhook_url.clone(),
            delivery_webhook_template: self.delivery_webhook_template.clone(),
            request_timeout_seconds: self.request_timeout_seconds,
            dedupe_window_seconds: self.dedupe_window_seconds,
            max_body_bytes: self.max_body_bytes,
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("KILLFEED_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Ok(value) = env::var("KILLFEED_API_TOKEN") {
            self.api_token = Some(value);
        }
        if let Ok(value) = env::var("KILLFEED_DATA_DIR") {
            self.data_dir = value;
        }
        if let Ok(value) = env::var("KILLFEED_FEED_URL") {
            self.feed_url = value;
        }
        if let Ok(value) = env::var("KILLFEED_FEED_QUEUE_ID") {
            self.feed_queue_id = value;
        }
        if let Ok(value) = env::var("KILLFEED_REFERENCE_BASE_URL") {
            self.reference_base_url = value;
        }
        if let Ok(value) = env::var("KILLFEED_DELIVERY_WEBHOOK_URL") {
            self.delivery_webhook_url = Some(value);
        }
        if let Ok(value) = env::var("KILLFEED_DELIVERY_WEBHOOK_TEMPLATE") {
            self.delivery_webhook_template = Some(value);
        }
        if let Ok(value) = env::var("KILLFEED_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
        if let Ok(value) = env::var("KILLFEED_DEDUPE_WINDOW_SECONDS") {
            self.dedupe_window_seconds = value.parse().unwrap_or(self.dedupe_window_seconds);
        }
        if let Ok(value) = env::var("KILLFEED_MAX_BODY_BYTES") {
            self.max_body_bytes = value.parse().unwrap_or(self.max_body_bytes);
        }
    }
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}
