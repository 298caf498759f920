//! Renderer configuration.

use patchwire_protocol::DEFAULT_MAX_DEPTH;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default upper bound for a single inbound message.
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Id of the element the tree is mounted into. Only the web host reads it.
    pub mount_point: String,
    /// Larger messages are rejected before decoding.
    pub max_message_len: usize,
    /// Deepest element nesting a message may carry.
    pub max_depth: usize,
    /// Re-attach a list root to the mount point after every list patch.
    pub refresh_mount_on_list_patch: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mount_point: "mount-point".to_owned(),
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
            max_depth: DEFAULT_MAX_DEPTH,
            refresh_mount_on_list_patch: true,
        }
    }
}

#[derive(Debug, Error)]
#[error("invalid config: {0}")]
pub struct ConfigError(#[from] serde_json::Error);

impl Config {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
