//! Authenticated gallery scraper.
//!
//! Logs into the site, walks the gallery and scraps sections of one user,
//! resolves every submission's detail page to its full-size asset and
//! downloads it to `output_root/<handle>/`, keeping metadata in sqlite.

mod macros;

pub mod cli;
pub mod config;
pub mod detail;
pub mod download;
mod error;
pub mod logging;
pub mod merge;
pub mod model;
pub mod paginate;
pub mod parse;
pub mod process;
pub mod request;
pub mod sanitize;
pub mod store;

pub use error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://www.furaffinity.net";
pub const OUTPUT_ROOT: &str = "downloads";
pub const DB_PATH: &str = "fa_gallery_downloader.sqlite";
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; gallery_scrap/0.1)";
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
/// Used when a filename sanitizes down to nothing.
pub const PLACEHOLDER_NAME: &str = "unnamed";
/// FA answers failed logins with 200, so the body is the only signal.
pub const LOGIN_FAILURE_MARKERS: [&str; 2] = ["The password you entered was incorrect", "Secure login"];
