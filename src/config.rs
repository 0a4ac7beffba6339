use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UppernftConfig {
    pub node: NodeConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub relayer: RelayerConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NodeConfig {
    pub rpc_port: u16,
    pub db_path: String,
    pub log_level: String,
}

/// Argon2id cost parameters for credential-key derivation. The same values
/// must be used for every signup and login of a deployment; changing them
/// orphans every stored wallet secret.
#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
pub struct AuthConfig {
    #[serde(default = "default_memory_kib")]
    pub kdf_memory_kib: u32,
    #[serde(default = "default_iterations")]
    pub kdf_iterations: u32,
    #[serde(default = "default_parallelism")]
    pub kdf_parallelism: u32,
}

fn default_memory_kib() -> u32 {
    19_456
}

fn default_iterations() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct RelayerConfig {
    /// Relayer endpoint; empty disables minting (a no-op relayer is used).
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    /// Prepended to a transaction hash to form an explorer link.
    #[serde(default)]
    pub tx_base_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            kdf_memory_kib: default_memory_kib(),
            kdf_iterations: default_iterations(),
            kdf_parallelism: default_parallelism(),
        }
    }
}

impl Default for UppernftConfig {
    fn default() -> Self {
        Self {
            node: NodeConfig {
                rpc_port: 9000,
                db_path: "./data/uppernft".to_string(),
                log_level: "info".to_string(),
            },
            auth: AuthConfig::default(),
            relayer: RelayerConfig::default(),
        }
    }
}

impl UppernftConfig {
    pub fn load_or_default(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            match std::fs::read_to_string(path) {
                Ok(s) => match toml::from_str(&s) {
                    Ok(c) => {
                        tracing::info!("Config loaded from {}", path);
                        c
                    }
                    Err(e) => {
                        tracing::warn!("Error parsing config: {}. Using defaults.", e);
                        Self::default()
                    }
                },
                Err(e) => {
                    tracing::warn!("Error reading config: {}. Using defaults.", e);
                    Self::default()
                }
            }
        } else {
            tracing::info!("Config file not found at '{}'. Creating default.", path);
            let config = Self::default();
            if let Ok(s) = toml::to_string_pretty(&config) {
                let _ = std::fs::write(path, s);
            }
            config
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trips_through_toml() {
        let config = UppernftConfig::default();
        let s = toml::to_string_pretty(&config).unwrap();
        let parsed: UppernftConfig = toml::from_str(&s).unwrap();
        assert_eq!(parsed.node.rpc_port, config.node.rpc_port);
        assert_eq!(parsed.auth.kdf_memory_kib, config.auth.kdf_memory_kib);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let s = r#"
            [node]
            rpc_port = 9100
            db_path = "./data/test"
            log_level = "debug"

            [auth]
        "#;
        let parsed: UppernftConfig = toml::from_str(s).unwrap();
        assert_eq!(parsed.node.rpc_port, 9100);
        assert_eq!(parsed.auth.kdf_iterations, 2);
        assert!(parsed.relayer.url.is_empty());
    }
}
