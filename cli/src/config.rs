use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

pub const DEFAULT_FDC_BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";
pub const DEFAULT_FDC_API_KEY: &str = "DEMO_KEY";

pub struct Config {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
    pub fdc_base_url: String,
    pub fdc_api_key: String,
}

impl Config {
    /// Resolve configuration from `LIFTFUEL_DATA_DIR`, `FDC_BASE_URL`, and
    /// `FDC_API_KEY`, falling back to the platform data directory and the
    /// public demo key.
    pub fn load() -> Result<Self> {
        let data_dir = match non_empty_env("LIFTFUEL_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => ProjectDirs::from("", "", "liftfuel")
                .context("Could not determine home directory")?
                .data_dir()
                .to_path_buf(),
        };
        Self::resolve(
            data_dir,
            non_empty_env("FDC_BASE_URL"),
            non_empty_env("FDC_API_KEY"),
        )
    }

    fn resolve(
        data_dir: PathBuf,
        fdc_base_url: Option<String>,
        fdc_api_key: Option<String>,
    ) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let db_path = data_dir.join("liftfuel.db");

        Ok(Config {
            db_path,
            data_dir,
            fdc_base_url: fdc_base_url.unwrap_or_else(|| DEFAULT_FDC_BASE_URL.to_string()),
            fdc_api_key: fdc_api_key.unwrap_or_else(|| DEFAULT_FDC_API_KEY.to_string()),
        })
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
