//! Database configuration and durability levels
//!
//! Every field has a default, so a JSON config file only needs the keys it
//! wants to change.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How hard a table write pushes bytes toward the disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DurabilityLevel {
    /// Flush the file handle after every write; the OS decides when to persist.
    #[default]
    Flush,

    /// Flush and `sync_data` after every write.
    Synchronous,
}

impl DurabilityLevel {
    pub fn requires_immediate_sync(&self) -> bool {
        matches!(self, Self::Synchronous)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Flush => "flush on write",
            Self::Synchronous => "fsync on write (safest)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the statement server binds to.
    pub listen_addr: String,

    /// Line that ends a session.
    pub terminator: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:7878".to_string(),
            terminator: "END".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Directory holding one file per table.
    pub data_dir: PathBuf,

    /// Extension of table files; table `t` lives in `t.<ext>`.
    pub table_extension: String,

    pub durability: DurabilityLevel,

    /// Print the whole table after CREATE / INSERT / UPDATE / DELETE.
    pub echo_table_after_write: bool,

    pub server: ServerConfig,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            table_extension: "txt".to_string(),
            durability: DurabilityLevel::default(),
            echo_table_after_write: true,
            server: ServerConfig::default(),
        }
    }
}

impl DbConfig {
    /// Default configuration rooted at `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: dir.into(),
            ..Default::default()
        }
    }

    /// Configuration for tests: rooted at `dir`, no table echo.
    pub fn for_testing(dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: dir.into(),
            echo_table_after_write: false,
            ..Default::default()
        }
    }

    /// Load a JSON config file. Missing keys fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.data_dir.join(format!("{}.{}", table, self.table_extension))
    }

    /// Scratch file used while rewriting `table`. Table names never start
    /// with a dot, so this cannot collide with a table file.
    pub fn temp_path(&self, table: &str) -> PathBuf {
        self.data_dir.join(format!(".{}.tmp", table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DbConfig::default();
        assert_eq!(config.table_extension, "txt");
        assert_eq!(config.durability, DurabilityLevel::Flush);
        assert!(config.echo_table_after_write);
        assert_eq!(config.server.terminator, "END");
        assert_eq!(config.table_path("t"), PathBuf::from("./t.txt"));
    }

    #[test]
    fn test_temp_path_differs_from_any_table() {
        let config = DbConfig::in_dir("/data");
        assert_ne!(config.temp_path("tmp"), config.table_path("tmp"));
        assert_eq!(config.temp_path("t"), PathBuf::from("/data/.t.tmp"));
    }

    #[test]
    fn test_load_partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stridedb.json");
        std::fs::write(
            &path,
            r#"{ "table_extension": "tbl", "durability": "Synchronous", "server": { "listen_addr": "0.0.0.0:9000" } }"#,
        )
        .unwrap();

        let config = DbConfig::load(&path).unwrap();
        assert_eq!(config.table_extension, "tbl");
        assert!(config.durability.requires_immediate_sync());
        assert_eq!(config.server.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.server.terminator, "END");
        assert_eq!(config.data_dir, PathBuf::from("."));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(DbConfig::load(&path), Err(Error::Config(_))));
        assert!(matches!(
            DbConfig::load(dir.path().join("missing.json")),
            Err(Error::Config(_))
        ));
    }
}
