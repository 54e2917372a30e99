use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub node: NodeConfig,
    pub replication: ReplicationConfig,
    pub storage: StorageConfig,
    /// Enables administrative routes like importance overrides. Must never be true in production.
    pub test_mode: bool,
    /// Maximum stored file size in bytes
    pub max_file_size: u64,
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub bind_address: String,
    pub data_dir: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageLayout {
    /// Everything directly under the storage root
    Flat,
    /// One subdirectory per file type
    ByType,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub layout: StorageLayout,
    /// Root directory for local content
    pub root: String,
    /// Where uploads are written before ingestion
    pub staging_dir: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicaBackend {
    Http(String),
    Local(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaTargetConfig {
    pub storage_id: u64,
    pub location_id: u64,
    pub backend: ReplicaBackend,
}

#[derive(Debug, Clone)]
pub struct ReplicationConfig {
    /// Desired replica count for newly stored files
    pub default_importance: u32,
    /// Seconds between scheduled replication passes; 0 disables the scheduler
    pub interval_seconds: u64,
    pub targets: Vec<ReplicaTargetConfig>,
    /// Bearer token sent to HTTP replica targets
    pub token: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            layout: StorageLayout::Flat,
            root: "./files".to_string(),
            staging_dir: "./staging".to_string(),
        }
    }
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            default_importance: 1,
            interval_seconds: 30,
            targets: Vec::new(),
            token: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let test_mode = std::env::var("TEST_MODE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let max_file_size = std::env::var("MAX_FILE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(50 * 1024 * 1024); // 50MB

        let layout = match std::env::var("STORAGE_LAYOUT")
            .unwrap_or_else(|_| "flat".to_string())
            .to_lowercase()
            .as_str()
        {
            "by-type" | "by_type" | "typed" => StorageLayout::ByType,
            _ => StorageLayout::Flat,
        };

        let root = std::env::var("STORAGE_ROOT").unwrap_or_else(|_| "./files".to_string());
        let staging_dir = std::env::var("STAGING_DIR").unwrap_or_else(|_| "./staging".to_string());

        let default_importance = std::env::var("DEFAULT_IMPORTANCE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);

        let interval_seconds = std::env::var("REPLICATION_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        let targets = match std::env::var("REPLICA_TARGETS") {
            Ok(raw) => parse_replica_targets(&raw)?,
            Err(_) => Vec::new(),
        };

        let token = std::env::var("REPLICA_TOKEN").ok().filter(|t| !t.is_empty());

        let config = Config {
            node: NodeConfig {
                bind_address,
                data_dir,
            },
            replication: ReplicationConfig {
                default_importance,
                interval_seconds,
                targets,
                token,
            },
            storage: StorageConfig {
                layout,
                root,
                staging_dir,
            },
            test_mode,
            max_file_size,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_file_size == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_FILE_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.storage.root.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "STORAGE_ROOT cannot be empty".to_string(),
            ));
        }

        for (i, target) in self.replication.targets.iter().enumerate() {
            let duplicate = self.replication.targets[..i].iter().any(|other| {
                other.storage_id == target.storage_id && other.location_id == target.location_id
            });
            if duplicate {
                return Err(ConfigError::ValidationError(format!(
                    "REPLICA_TARGETS lists storage {} location {} twice",
                    target.storage_id, target.location_id
                )));
            }
        }

        let target_count = self.replication.targets.len();
        if target_count > 0 && self.replication.default_importance as usize > target_count {
            return Err(ConfigError::ValidationError(format!(
                "DEFAULT_IMPORTANCE {} exceeds the {} configured REPLICA_TARGETS",
                self.replication.default_importance, target_count
            )));
        }

        if self.replication.targets.is_empty() && self.replication.default_importance > 0 {
            tracing::warn!(
                "No REPLICA_TARGETS configured; files with importance {} will never be replicated",
                self.replication.default_importance
            );
        }

        Ok(())
    }
}

/// Parse `storage_id:location_id=uri` entries separated by commas.
///
/// A uri starting with `http://` or `https://` is an HTTP target; anything
/// else is a local directory.
pub fn parse_replica_targets(raw: &str) -> Result<Vec<ReplicaTargetConfig>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_replica_target)
        .collect()
}

fn parse_replica_target(entry: &str) -> Result<ReplicaTargetConfig, ConfigError> {
    let invalid = || {
        ConfigError::ValidationError(format!(
            "invalid replica target '{entry}', expected storage_id:location_id=uri"
        ))
    };

    let (ids, uri) = entry.split_once('=').ok_or_else(invalid)?;
    let (storage_id, location_id) = ids.split_once(':').ok_or_else(invalid)?;
    let storage_id = storage_id.trim().parse().map_err(|_| invalid())?;
    let location_id = location_id.trim().parse().map_err(|_| invalid())?;

    let uri = uri.trim();
    if uri.is_empty() {
        return Err(invalid());
    }

    let backend = if uri.starts_with("http://") || uri.starts_with("https://") {
        ReplicaBackend::Http(uri.to_string())
    } else {
        ReplicaBackend::Local(uri.to_string())
    };

    Ok(ReplicaTargetConfig {
        storage_id,
        location_id,
        backend,
    })
}
