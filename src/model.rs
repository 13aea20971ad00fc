use chrono::{DateTime, Utc};
use url::Url;

use crate::Result;

/// The owner of the crawled galleries. Built once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Canonical lowercase handle.
    pub handle: String,
    pub account_name: Option<String>,
}

impl Identity {
    /// Returns `None` if the handle is blank.
    pub fn new(handle: &str, account_name: Option<String>) -> Option<Self> {
        let handle = handle.trim().to_lowercase();
        if handle.is_empty() {
            return None;
        }
        Some(Self {
            handle,
            account_name,
        })
    }
}

/// A submission as seen on a listing page.
/// `listing_url` points at the detail page, `display_name` is the caption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionStub {
    pub id: String,
    pub title: String,
    pub owner_handle: String,
    pub owner_account_name: Option<String>,
    pub listing_url: String,
    pub display_name: String,
    pub is_secondary: bool,
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// What the detail page says about the real file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub asset_url: String,
    pub real_filename: String,
    pub title: Option<String>,
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// A stub joined with its resolved asset. This is what gets downloaded and stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub id: String,
    pub title: String,
    pub owner_handle: String,
    pub owner_account_name: Option<String>,
    pub content_url: String,
    pub content_name: String,
    pub is_secondary: bool,
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl Submission {
    pub fn resolve(stub: SubmissionStub, asset: ResolvedAsset) -> Self {
        Self {
            id: stub.id,
            title: asset.title.unwrap_or(stub.title),
            owner_handle: stub.owner_handle.to_lowercase(),
            owner_account_name: stub.owner_account_name,
            content_url: asset.asset_url,
            content_name: asset.real_filename,
            is_secondary: stub.is_secondary,
            uploaded_at: asset.uploaded_at.or(stub.uploaded_at),
        }
    }
}

/// A paginated listing category of one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Gallery,
    Scraps,
}

impl Section {
    pub fn path_segment(self) -> &'static str {
        match self {
            Section::Gallery => "gallery",
            Section::Scraps => "scraps",
        }
    }

    pub fn is_secondary(self) -> bool {
        matches!(self, Section::Scraps)
    }

    /// `{base}/gallery/{handle}/` or `{base}/scraps/{handle}/`.
    pub fn root_url(self, base: &Url, handle: &str) -> Result<String> {
        let url = base.join(&format!("/{}/{}/", self.path_segment(), handle))?;
        Ok(url.into())
    }
}
