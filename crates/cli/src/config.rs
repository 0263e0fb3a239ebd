//! Configuration for the bundled demo bot (`weir.toml`).

use std::path::Path;

use {secrecy::Secret, serde::Deserialize, tracing::debug};

/// Root configuration. Every section has defaults, so a missing file or a
/// partial file is fine.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WeirConfig {
    pub server: ServerConfig,
    pub webhook: WebhookConfig,
    pub responses: ResponsesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the webhook listener binds to.
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8090,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Shared-secret token webhook posts must present. Unset disables the
    /// check.
    pub token: Option<Secret<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResponsesConfig {
    /// Sent when no route matches.
    pub default: String,
    /// Sent when a response action fails.
    pub error: String,
}

impl Default for ResponsesConfig {
    fn default() -> Self {
        Self {
            default: "Hey! It seems I don't yet know how to respond to that. But I will, someday! ;)"
                .to_string(),
            error: "Unfortunately, an error occurred :( Please be patient while we fix it!"
                .to_string(),
        }
    }
}

/// Load configuration from `path` when given, from `./weir.toml` when one
/// exists, and from defaults otherwise.
pub fn load(path: Option<&Path>) -> anyhow::Result<WeirConfig> {
    let candidate = match path {
        Some(p) => Some(p.to_path_buf()),
        None => {
            let p = Path::new("weir.toml");
            p.exists().then(|| p.to_path_buf())
        },
    };

    let Some(path) = candidate else {
        debug!("no config file found, using defaults");
        return Ok(WeirConfig::default());
    };

    let raw = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let config: WeirConfig = toml::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}
