//! Pool configuration
//!
//! Loaded from TOML, optionally layered with environment variables:
//!
//! ```toml
//! initial_capacity = 1024
//!
//! [growth]
//! policy = "doubling"
//! first_block_size = 256
//! ```
//!
//! `COMPACT_POOL__GROWTH__BLOCK_SIZE=512` overrides `growth.block_size`.

use super::growth::GrowthConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Environment variable prefix for [`PoolConfig::load`]
pub const ENV_PREFIX: &str = "COMPACT_POOL";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// How the pool grows once the free list is exhausted
    pub growth: GrowthConfig,
    /// Slots reserved up front
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_capacity: Option<usize>,
}

impl PoolConfig {
    /// Parse a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| Error::Config(format!("Invalid pool config: {}", e)))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::Config(format!("Failed to encode config: {}", e)))
    }

    /// Load defaults, then `path` (TOML) if given, then `COMPACT_POOL__*`
    /// environment variables
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            let path = path.as_ref();
            debug!(path = ?path, "Loading pool config file");
            builder = builder.add_source(
                ::config::File::from(path).format(::config::FileFormat::Toml),
            );
        }

        builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|settings| settings.try_deserialize::<PoolConfig>())
            .map_err(|e| Error::Config(format!("Failed to load pool config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[test]
    fn test_default_config() {
        let config = PoolConfig::from_toml_str("").unwrap();
        assert_eq!(config, PoolConfig::default());
        assert_eq!(
            config.growth,
            GrowthConfig::Doubling {
                first_block_size: NonZeroUsize::new(64).unwrap()
            }
        );
    }

    #[test]
    fn test_parse_constant_policy() {
        let config = PoolConfig::from_toml_str(
            r#"
            initial_capacity = 10

            [growth]
            policy = "constant"
            block_size = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.initial_capacity, Some(10));
        assert_eq!(
            config.growth,
            GrowthConfig::Constant {
                block_size: NonZeroUsize::new(4).unwrap()
            }
        );
    }

    #[test]
    fn test_zero_block_size_rejected() {
        let err = PoolConfig::from_toml_str(
            r#"
            [growth]
            policy = "constant"
            block_size = 0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let result = PoolConfig::from_toml_str("[growth]\npolicy = \"tripling\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = PoolConfig {
            growth: GrowthConfig::Constant {
                block_size: NonZeroUsize::new(32).unwrap(),
            },
            initial_capacity: Some(100),
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(PoolConfig::from_toml_str(&text).unwrap(), config);
    }

    /// Serializes tests that read or write `COMPACT_POOL__*` variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn write_config(name: &str, contents: &str) -> PathBuf {
        let temp_dir =
            std::env::temp_dir().join(format!("pool_config_{}_{}", name, std::process::id()));
        std::fs::create_dir_all(&temp_dir).unwrap();
        let path = temp_dir.join("pool.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_env_overrides_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let path = write_config("env", "[growth]\npolicy = \"constant\"\nblock_size = 16\n");

        std::env::set_var("COMPACT_POOL__GROWTH__BLOCK_SIZE", "512");
        std::env::set_var("COMPACT_POOL__INITIAL_CAPACITY", "100");
        let loaded = PoolConfig::load(Some(&path));
        std::env::remove_var("COMPACT_POOL__GROWTH__BLOCK_SIZE");
        std::env::remove_var("COMPACT_POOL__INITIAL_CAPACITY");

        let config = loaded.unwrap();
        assert_eq!(
            config.growth,
            GrowthConfig::Constant {
                block_size: NonZeroUsize::new(512).unwrap()
            }
        );
        assert_eq!(config.initial_capacity, Some(100));

        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn test_load_from_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let temp_dir = std::env::temp_dir().join(format!("pool_config_{}", std::process::id()));
        std::fs::create_dir_all(&temp_dir).unwrap();
        let path = temp_dir.join("pool.toml");
        std::fs::write(&path, "[growth]\npolicy = \"constant\"\nblock_size = 16\n").unwrap();

        let config = PoolConfig::load(Some(&path)).unwrap();
        assert_eq!(
            config.growth,
            GrowthConfig::Constant {
                block_size: NonZeroUsize::new(16).unwrap()
            }
        );

        // Cleanup
        std::fs::remove_dir_all(temp_dir).ok();
    }

    #[test]
    fn test_load_missing_file() {
        let missing = std::env::temp_dir().join("pool_config_missing/none.toml");
        assert!(matches!(PoolConfig::load(Some(missing)), Err(Error::Config(_))));
    }
}
