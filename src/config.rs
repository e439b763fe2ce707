use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub credentials_path: PathBuf,
    pub timeout: Duration,
    pub verbosity: u8,
}

impl Config {
    pub fn new(
        api_url: String,
        credentials_path: Option<PathBuf>,
        timeout_secs: u64,
        verbosity: u8,
    ) -> Self {
        Self {
            api_url,
            credentials_path: credentials_path.unwrap_or_else(|| data_dir().join("credentials.json")),
            timeout: Duration::from_secs(timeout_secs),
            verbosity,
        }
    }

    pub fn log_path(&self) -> PathBuf {
        data_dir().join("jobby.log")
    }

    fn filter(&self) -> EnvFilter {
        let level = match self.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("jobby={level}")))
    }

    /// Log to stderr.
    pub fn init_logging(&self) {
        tracing_subscriber::fmt()
            .with_env_filter(self.filter())
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    /// Log to a file so the terminal UI stays clean.
    pub fn init_file_logging(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(self.filter())
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .init();
        Ok(())
    }
}

fn data_dir() -> PathBuf {
    // Use XDG data directory or fallback
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "jobby") {
        proj_dirs.data_dir().to_path_buf()
    } else {
        PathBuf::from(".")
    }
}
