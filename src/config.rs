use std::env;
use std::path::PathBuf;

/// Runtime configuration, resolved once in main and passed down. Generation
/// parameters (counts, chunk sizes, skew ratios, weights) are call-time
/// constants on the CLI, not runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
}

impl Config {
    /// Precedence: --db flag, then JOBSEED_DB, then the platform data dir.
    pub fn resolve(cli_db: Option<PathBuf>) -> Self {
        if let Some(path) = cli_db {
            return Self { db_path: path };
        }
        if let Some(path) = env::var_os("JOBSEED_DB") {
            return Self {
                db_path: PathBuf::from(path),
            };
        }
        Self {
            db_path: Self::default_path(),
        }
    }

    fn default_path() -> PathBuf {
        // Use XDG data directory or fallback
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "jobseed") {
            proj_dirs.data_dir().join("jobseed.db")
        } else {
            // Fallback to current directory
            PathBuf::from("jobseed.db")
        }
    }
}
