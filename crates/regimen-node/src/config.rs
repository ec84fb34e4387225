//! Node configuration, read from `REGIMEN_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use regimen_core::prompt::DEFAULT_SYSTEM_PROMPT;
use regimen_state::{is_valid_slot_name, DEFAULT_SELECTION_SLOT};
use serde::{Deserialize, Serialize};

pub const ENV_BIND: &str = "REGIMEN_BIND";
pub const ENV_CATALOG: &str = "REGIMEN_CATALOG";
pub const ENV_COMPLETION_URL: &str = "REGIMEN_COMPLETION_URL";
pub const ENV_DATA_DIR: &str = "REGIMEN_DATA_DIR";
pub const ENV_SELECTION_SLOT: &str = "REGIMEN_SELECTION_SLOT";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "REGIMEN_REQUEST_TIMEOUT_SECS";
pub const ENV_SYSTEM_PROMPT: &str = "REGIMEN_SYSTEM_PROMPT";
pub const ENV_EVENT_BUFFER: &str = "REGIMEN_EVENT_BUFFER";

/// Configuration for a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Address the API listens on.
    pub bind_addr: SocketAddr,

    /// Catalog location: an http(s) URL or a file path.
    pub catalog: String,

    /// Chat completion endpoint URL.
    pub completion_url: String,

    /// Directory for durable slots.
    pub data_dir: PathBuf,

    /// Slot holding the selection.
    pub selection_slot: String,

    /// Timeout for catalog and completion requests, in seconds.
    pub request_timeout_secs: u64,

    /// System turn that opens every conversation.
    pub system_prompt: String,

    /// Events buffered per slow WebSocket subscriber.
    pub event_buffer: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            catalog: "products.json".to_string(),
            completion_url: String::new(),
            data_dir: PathBuf::from(".regimen"),
            selection_slot: DEFAULT_SELECTION_SLOT.to_string(),
            request_timeout_secs: 60,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            event_buffer: 256,
        }
    }
}

impl NodeConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable lookup; unset variables keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(bind) = get(ENV_BIND) {
            config.bind_addr = bind
                .parse()
                .with_context(|| format!("{ENV_BIND} is not a socket address: {bind}"))?;
        }
        if let Some(catalog) = get(ENV_CATALOG) {
            config.catalog = catalog;
        }
        if let Some(url) = get(ENV_COMPLETION_URL) {
            config.completion_url = url;
        }
        if let Some(dir) = get(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(slot) = get(ENV_SELECTION_SLOT) {
            config.selection_slot = slot;
        }
        if let Some(secs) = get(ENV_REQUEST_TIMEOUT_SECS) {
            config.request_timeout_secs = secs
                .parse()
                .with_context(|| format!("{ENV_REQUEST_TIMEOUT_SECS} is not a number: {secs}"))?;
        }
        if let Some(prompt) = get(ENV_SYSTEM_PROMPT) {
            config.system_prompt = prompt;
        }
        if let Some(buffer) = get(ENV_EVENT_BUFFER) {
            config.event_buffer = buffer
                .parse()
                .with_context(|| format!("{ENV_EVENT_BUFFER} is not a number: {buffer}"))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check values that cannot be defaulted.
    pub fn validate(&self) -> Result<()> {
        if self.completion_url.is_empty() {
            bail!("{ENV_COMPLETION_URL} must be set");
        }
        let url = &self.completion_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!("{ENV_COMPLETION_URL} must be an http(s) URL: {url}");
        }
        if !is_valid_slot_name(&self.selection_slot) {
            bail!(
                "{ENV_SELECTION_SLOT} is not a valid slot name: {}",
                self.selection_slot
            );
        }
        if self.request_timeout_secs == 0 {
            bail!("{ENV_REQUEST_TIMEOUT_SECS} must be greater than zero");
        }
        if self.event_buffer == 0 {
            bail!("{ENV_EVENT_BUFFER} must be greater than zero");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
