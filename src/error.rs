use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Login rejected for user: {handle}")]
    Authentication { handle: String },

    #[error("Couldn't fetch {url}: {cause}")]
    Fetch {
        url: String,
        #[source]
        cause: reqwest::Error,
    },

    #[error("Missing input: {0}")]
    Input(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),
    #[error("The selector you are trying to scrape for is missing. Selector: {0}")]
    ParseMissingSelector(String),

    #[error("Persistence Error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("Couldn't write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tokio Join Error, couldn't await a task! {0}")]
    RuntimeJoin(#[from] tokio::task::JoinError),

    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Config Error: {0}")]
    Config(#[from] toml::de::Error),
}

impl Error {
    pub(crate) fn fetch(url: impl Into<String>, cause: reqwest::Error) -> Self {
        Error::Fetch {
            url: url.into(),
            cause,
        }
    }
}
