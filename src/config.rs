use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the default database location
pub const DATABASE_ENV: &str = "JOBQUERY_DATABASE";

/// File name used when no explicit path is given
pub const DEFAULT_DATABASE_NAME: &str = "joblist.db";

/// Where the store lives. Every public operation takes one of these
/// instead of reaching for a global file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    db_path: PathBuf,
}

impl Config {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    /// Resolve the database path: explicit flag, then `JOBQUERY_DATABASE`,
    /// then the platform data directory.
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = explicit {
            return Ok(Self::new(path));
        }

        if let Some(path) = std::env::var_os(DATABASE_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::new(PathBuf::from(path)));
        }

        let db_path = match ProjectDirs::from("", "", "jobquery") {
            Some(proj_dirs) => {
                let data_dir = proj_dirs.data_dir();
                fs::create_dir_all(data_dir)
                    .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;
                data_dir.join(DEFAULT_DATABASE_NAME)
            }
            None => PathBuf::from(DEFAULT_DATABASE_NAME),
        };

        Ok(Self { db_path })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}
