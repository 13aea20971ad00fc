use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{
    Result, DB_PATH, DEFAULT_BASE_URL, LOGIN_FAILURE_MARKERS, OUTPUT_ROOT, REQUEST_TIMEOUT_SECS,
    USER_AGENT,
};

/// Run settings. Every key is optional in the TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    /// Files land in `output_root/<handle>/`.
    pub output_root: PathBuf,
    pub database: PathBuf,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub include_scraps: bool,
    /// Phrases whose presence in the login response means the login failed.
    pub login_failure_markers: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            output_root: PathBuf::from(OUTPUT_ROOT),
            database: PathBuf::from(DB_PATH),
            user_agent: USER_AGENT.to_string(),
            timeout_secs: REQUEST_TIMEOUT_SECS,
            include_scraps: true,
            login_failure_markers: LOGIN_FAILURE_MARKERS.map(String::from).to_vec(),
        }
    }
}

impl Config {
    /// Reads a TOML file, or returns the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_toml(&std::fs::read_to_string(path)?),
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
