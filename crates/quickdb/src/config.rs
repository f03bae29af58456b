//! Database and application configuration

use quickdb_codec::{EncodeOptions, DEFAULT_ALIAS};
use quickdb_common::{QuickDbError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Pool Configuration
// ============================================================================

/// Connection pool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Minimum number of connections kept open (default: 1)
    pub min_connections: u32,
    /// Maximum number of connections in the pool (default: 10)
    pub max_connections: u32,
    /// Connection timeout in seconds (default: 30)
    pub connection_timeout: u64,
    /// Idle connection timeout in seconds (default: 600)
    pub idle_timeout: u64,
    /// Maximum connection lifetime in seconds (default: 3600)
    pub max_lifetime: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: 1,
            max_connections: 10,
            connection_timeout: 30,
            idle_timeout: 600,
            max_lifetime: 3600,
        }
    }
}

impl PoolConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout)
    }

    /// Reject pool settings the engine cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.min_connections > self.max_connections {
            return Err(QuickDbError::Config(format!(
                "min_connections ({}) exceeds max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }
        if self.connection_timeout == 0 {
            return Err(QuickDbError::Config("connection_timeout must be non-zero".to_string()));
        }
        if self.idle_timeout == 0 {
            return Err(QuickDbError::Config("idle_timeout must be non-zero".to_string()));
        }
        if self.max_lifetime == 0 {
            return Err(QuickDbError::Config("max_lifetime must be non-zero".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// ID Strategy
// ============================================================================

/// How the engine generates primary keys for new records
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IdStrategy {
    /// Database auto-increment (numeric)
    #[default]
    AutoIncrement,
    /// UUID v4 (text)
    Uuid,
    /// Snowflake ids (text)
    Snowflake { machine_id: u16, datacenter_id: u8 },
    /// MongoDB ObjectId (text)
    ObjectId,
    /// Named custom generator
    Custom(String),
}

impl IdStrategy {
    pub fn snowflake(machine_id: u16, datacenter_id: u8) -> Self {
        Self::Snowflake {
            machine_id,
            datacenter_id,
        }
    }
}

// ============================================================================
// Database Configuration
// ============================================================================

/// Storage backend and its connection parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite {
        path: String,
        #[serde(default = "default_true")]
        create_if_missing: bool,
    },
    #[serde(rename = "postgresql")]
    PostgreSql {
        host: String,
        #[serde(default = "default_postgres_port")]
        port: u16,
        database: String,
        username: String,
        password: String,
    },
    #[serde(rename = "mysql")]
    MySql {
        host: String,
        #[serde(default = "default_mysql_port")]
        port: u16,
        database: String,
        username: String,
        password: String,
    },
    #[serde(rename = "mongodb")]
    MongoDb {
        host: String,
        #[serde(default = "default_mongodb_port")]
        port: u16,
        database: String,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        password: Option<String>,
    },
}

fn default_true() -> bool {
    true
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_mysql_port() -> u16 {
    3306
}

fn default_mongodb_port() -> u16 {
    27017
}

impl DatabaseBackend {
    /// Backend name as used by the engine's `add_<backend>_database` entry points
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite { .. } => "sqlite",
            Self::PostgreSql { .. } => "postgresql",
            Self::MySql { .. } => "mysql",
            Self::MongoDb { .. } => "mongodb",
        }
    }
}

/// One database connection registered under an alias
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub alias: String,
    pub backend: DatabaseBackend,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub id_strategy: IdStrategy,
}

impl DatabaseConfig {
    pub fn new(alias: impl Into<String>, backend: DatabaseBackend) -> Self {
        Self {
            alias: alias.into(),
            backend,
            pool: PoolConfig::default(),
            id_strategy: IdStrategy::default(),
        }
    }

    /// SQLite database at `path`, created when missing
    pub fn sqlite(alias: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(
            alias,
            DatabaseBackend::Sqlite {
                path: path.into(),
                create_if_missing: true,
            },
        )
    }

    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    pub fn with_id_strategy(mut self, id_strategy: IdStrategy) -> Self {
        self.id_strategy = id_strategy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.alias.trim().is_empty() {
            return Err(QuickDbError::Config("database alias must not be empty".to_string()));
        }
        self.pool.validate()
    }
}

// ============================================================================
// Application Configuration
// ============================================================================

/// Application-level settings, loadable from YAML or JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Alias bound to models left on the `"default"` alias
    pub default_alias: String,
    /// Check declared bounds before records are submitted
    pub validate_before_submit: bool,
    pub encode: EncodeOptions,
    pub databases: Vec<DatabaseConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_alias: DEFAULT_ALIAS.to_string(),
            validate_before_submit: false,
            encode: EncodeOptions::default(),
            databases: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(text).map_err(|e| QuickDbError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| QuickDbError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, choosing the format by extension (`.json`, otherwise YAML)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| QuickDbError::Config(format!("{}: {}", path.display(), e)))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_yaml_str(&text),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (i, db) in self.databases.iter().enumerate() {
            db.validate()?;
            if self.databases[..i].iter().any(|other| other.alias == db.alias) {
                return Err(QuickDbError::Config(format!(
                    "database alias '{}' is configured twice",
                    db.alias
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pool_config() {
        let config = PoolConfig::default();
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.connect_timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_pool_config() {
        let config = PoolConfig {
            min_connections: 20,
            max_connections: 5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(QuickDbError::Config(_))));

        let config = PoolConfig {
            idle_timeout: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_id_strategy_wire_form() {
        assert_eq!(
            serde_json::to_value(IdStrategy::Uuid).unwrap(),
            serde_json::json!("Uuid")
        );
        assert_eq!(
            serde_json::to_value(IdStrategy::snowflake(1, 2)).unwrap(),
            serde_json::json!({"Snowflake": {"machine_id": 1, "datacenter_id": 2}})
        );
    }

    #[test]
    fn test_app_config_from_yaml() {
        let yaml = r#"
default_alias: main
validate_before_submit: true
encode:
  array_items: declared
databases:
  - alias: main
    backend:
      type: sqlite
      path: ./data/app.db
    id_strategy: Uuid
  - alias: analytics
    backend:
      type: postgresql
      host: localhost
      database: analytics
      username: app
      password: secret
    pool:
      max_connections: 20
"#;
        let config = AppConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.default_alias, "main");
        assert!(config.validate_before_submit);
        assert_eq!(config.databases.len(), 2);
        assert_eq!(config.databases[0].id_strategy, IdStrategy::Uuid);
        assert_eq!(config.databases[1].backend.as_str(), "postgresql");
        assert_eq!(config.databases[1].pool.max_connections, 20);
        assert_eq!(config.databases[1].pool.min_connections, 1);
        match &config.databases[1].backend {
            DatabaseBackend::PostgreSql { port, .. } => assert_eq!(*port, 5432),
            other => panic!("unexpected backend {:?}", other),
        }
    }

    #[test]
    fn test_app_config_rejects_duplicate_alias() {
        let json = r#"{"databases": [
            {"alias": "a", "backend": {"type": "sqlite", "path": "x.db"}},
            {"alias": "a", "backend": {"type": "sqlite", "path": "y.db"}}
        ]}"#;
        assert!(matches!(
            AppConfig::from_json_str(json),
            Err(QuickDbError::Config(_))
        ));
    }

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::from_json_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
