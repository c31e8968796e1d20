//! Configuration management for docsweep
//!
//! Handles loading, saving, and validating configuration from TOML files.
//! Connection defaults come from the standard libpq environment variables.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use crate::plan::{validate_identifier, Dialect, PlanVariant, Planner, StepTemplate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Store connection
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Where document ids are listed from
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Deletion cascade
    #[serde(default)]
    pub cascade: CascadeConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection URL (`postgres://...` or `sqlite://...`).
    /// Overrides the individual fields below when set.
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_pg_host", skip_serializing_if = "is_default_pg_host")]
    pub host: String,

    #[serde(default = "default_pg_port", skip_serializing_if = "is_default_pg_port")]
    pub port: u16,

    #[serde(default = "default_pg_user", skip_serializing_if = "is_default_pg_user")]
    pub user: String,

    #[serde(default = "default_pg_password", skip_serializing)]
    pub password: Option<String>,

    #[serde(default = "default_pg_database", skip_serializing_if = "is_default_pg_database")]
    pub name: String,
}

/// Catalog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Table holding one row per ingested document
    #[serde(default = "default_catalog_table")]
    pub table: String,

    /// Identifier column in the catalog table
    #[serde(default = "default_catalog_id_column")]
    pub id_column: String,
}

/// Cascade configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeConfig {
    /// Which steps run: `core` or `extended`
    #[serde(default)]
    pub variant: PlanVariant,

    /// Deadline for the whole transaction in seconds
    #[serde(default = "default_cascade_timeout")]
    pub timeout_secs: u64,

    /// Ordered step templates
    #[serde(default = "default_cascade_steps")]
    pub steps: Vec<StepTemplate>,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for docsweep data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: default_pg_host(),
            port: default_pg_port(),
            user: default_pg_user(),
            password: default_pg_password(),
            name: default_pg_database(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            table: default_catalog_table(),
            id_column: default_catalog_id_column(),
        }
    }
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            variant: PlanVariant::default(),
            timeout_secs: default_cascade_timeout(),
            steps: default_cascade_steps(),
        }
    }
}

impl DatabaseConfig {
    /// SQL dialect implied by the configured URL
    pub fn dialect(&self) -> Dialect {
        match self.url.as_deref() {
            Some(url) if url.starts_with("sqlite:") => Dialect::Sqlite,
            _ => Dialect::Postgres,
        }
    }
}

impl CascadeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Load `PG*` and other variables from a `.env` file into the process
/// environment. Variables already set are left alone.
///
/// With no path, `.env` is looked up in the current directory and its parents.
/// Returns the file that was read, or `None` when there is none.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path).map(|_| path.to_path_buf()),
        None => dotenvy::dotenv(),
    };

    match loaded {
        Ok(path) => {
            debug!("Loaded environment from {:?}", path);
            Ok(Some(path))
        }
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(Error::Config(format!("Could not read .env file: {}", e))),
    }
}

impl Config {
    /// Get the default base directory for docsweep (~/.docsweep)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".docsweep")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        let base = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        config.paths = PathsConfig {
            config_file: config_path.to_path_buf(),
            base_dir: base,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or the default location, falling back to defaults
    /// when no file exists there
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let config_path = path
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_config_path);

        if config_path.exists() {
            return Self::load(&config_path);
        }

        if path.is_some() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        debug!("No config file found, using defaults");
        let mut config = Config::default();
        config.paths = PathsConfig {
            base_dir: config_path
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(Self::default_base_dir),
            config_file: config_path,
        };
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Build the planner for the configured cascade
    pub fn planner(&self) -> Result<Planner> {
        Planner::new(self.cascade.steps.clone(), self.cascade.variant)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        validate_identifier(&self.catalog.table)?;
        validate_identifier(&self.catalog.id_column)?;

        if self.cascade.steps.is_empty() {
            return Err(Error::Config(
                "cascade.steps must contain at least one step".to_string(),
            ));
        }

        if self.cascade.timeout_secs == 0 {
            return Err(Error::Config(
                "cascade.timeout_secs must be positive".to_string(),
            ));
        }

        if let Some(url) = &self.database.url {
            if !(url.starts_with("postgres://")
                || url.starts_with("postgresql://")
                || url.starts_with("sqlite:"))
            {
                return Err(Error::Config(format!(
                    "database.url must be a postgres:// or sqlite: URL, got '{}'",
                    url
                )));
            }
        }

        self.planner().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{Predicate, StepScope};
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.catalog.table, "lightrag_doc_full");
        assert_eq!(config.cascade.variant, PlanVariant::Extended);
        assert_eq!(config.cascade.steps.len(), 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.paths.config_file = tmp.path().join("config.toml");
        config.catalog.table = "docs_full".to_string();
        config.cascade.variant = PlanVariant::Core;

        config.save().unwrap();
        assert!(config.paths.config_file.exists());

        let loaded = Config::load(&config.paths.config_file).unwrap();
        assert_eq!(loaded.catalog.table, "docs_full");
        assert_eq!(loaded.cascade.variant, PlanVariant::Core);
        assert_eq!(loaded.cascade.steps, config.cascade.steps);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [database]
            url = "sqlite://store.db"

            [cascade]
            variant = "core"
            "#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.database.url.as_deref(), Some("sqlite://store.db"));
        assert_eq!(config.cascade.timeout_secs, 30);
        assert_eq!(config.cascade.steps, default_cascade_steps());
        assert_eq!(config.planner().unwrap().plan("d").steps().len(), 3);
    }

    #[test]
    fn test_custom_steps_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [[cascade.steps]]
            table = "chunks"
            scope = "core"
            predicate = { kind = "key_equality", column = "doc_id" }

            [[cascade.steps]]
            table = "docs"
            scope = "core"
            predicate = { kind = "key_equality", column = "id" }

            [[cascade.steps]]
            table = "summaries"
            predicate = { kind = "key_equality", column = "doc_id" }
            "#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.cascade.steps.len(), 3);
        assert_eq!(config.cascade.steps[2].scope, StepScope::Extended);
        assert_eq!(config.cascade.steps[2].predicate, Predicate::key("doc_id"));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.cascade.timeout_secs = 0;
        assert!(config.validate().is_err());
        config.cascade.timeout_secs = 5;
        assert!(config.validate().is_ok());

        config.catalog.table = "lightrag_doc_full; --".to_string();
        assert!(config.validate().is_err());
        config.catalog.table = default_catalog_table();

        config.database.url = Some("mysql://localhost/db".to_string());
        assert!(config.validate().is_err());
        config.database.url = Some("postgresql://u@localhost/db".to_string());
        assert!(config.validate().is_ok());

        config.cascade.steps.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_file_supplies_pg_settings() {
        let tmp = TempDir::new().unwrap();
        let env_file = tmp.path().join(".env");
        std::fs::write(
            &env_file,
            "PGHOST=db.from-env-file\nDOCSWEEP_TEST_ENV_FILE=loaded\n",
        )
        .unwrap();
        let preset_host = std::env::var("PGHOST").ok();

        let loaded = load_env_file(Some(&env_file)).unwrap();
        assert_eq!(loaded.as_deref(), Some(env_file.as_path()));
        assert_eq!(std::env::var("DOCSWEEP_TEST_ENV_FILE").unwrap(), "loaded");

        // An exported PGHOST wins over the file
        let expected = preset_host.unwrap_or_else(|| "db.from-env-file".to_string());
        assert_eq!(Config::default().database.host, expected);
    }

    #[test]
    fn test_missing_env_file_is_not_an_error() {
        let tmp = TempDir::new().unwrap();
        let loaded = load_env_file(Some(&tmp.path().join(".env"))).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_leaves_env_defaults_out() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.paths.config_file = tmp.path().join("config.toml");
        config.database.user = "rag_admin".to_string();
        config.database.password = Some("hunter2".to_string());
        config.save().unwrap();

        let written = std::fs::read_to_string(&config.paths.config_file).unwrap();
        assert!(written.contains("user = \"rag_admin\""));
        assert!(!written.contains("port ="));
        assert!(!written.contains("name ="));
        assert!(!written.contains("hunter2"));

        let loaded = Config::load(&config.paths.config_file).unwrap();
        assert_eq!(loaded.database.user, "rag_admin");
        assert_eq!(loaded.database.port, default_pg_port());
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope.toml");
        assert!(Config::load_or_default(Some(&missing)).is_err());
    }
}
