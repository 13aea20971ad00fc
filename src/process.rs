use chrono::Local;
use tokio::task::spawn_blocking;
use tracing::warn;
use url::Url;

use crate::config::Config;
use crate::download::{download_all, RunReport};
use crate::merge::merge;
use crate::model::{Identity, Section, Submission, SubmissionStub};
use crate::paginate::walk_all_pages;
use crate::parse::{extract_identity, extract_stubs, target_handle};
use crate::request::Session;
use crate::store::{Database, MetadataSink};
use crate::{info_time, Error, Result};

/// Login handle and password for the site.
#[derive(Clone)]
pub struct Credentials {
    pub handle: String,
    pub secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("handle", &self.handle)
            .field("secret", &"********")
            .finish()
    }
}

/// Logs in, walks the target's gallery (and scraps), then resolves and downloads every
/// submission found. `target` is a handle or a gallery/user URL.
pub async fn process_site(
    config: &Config,
    credentials: &Credentials,
    target: &str,
) -> Result<RunReport> {
    let start_time = Local::now();
    let session = Session::new(config)?;

    info_time!("Logging in as {}", credentials.handle);
    if !session
        .authenticate(&credentials.handle, &credentials.secret)
        .await?
    {
        return Err(Error::Authentication {
            handle: credentials.handle.clone(),
        });
    }

    let handle = target_handle(target)
        .ok_or_else(|| Error::Extraction(format!("no user handle in '{target}'")))?;

    let gallery_root = Section::Gallery.root_url(session.base(), &handle)?;
    let gallery_pages = walk_all_pages(&session, &gallery_root).await?;
    info_time!(start_time, "Walked {} gallery page(s) of {handle}", gallery_pages.len());

    let first_page = gallery_pages.first().map_or("", String::as_str);
    let identity = extract_identity(first_page, Some(&handle), Some(target))?
        .ok_or_else(|| Error::Extraction(format!("couldn't determine the user of '{target}'")))?;

    let db = Database::open(&config.database).await?;
    if let Err(err) = db.upsert_identity(&identity).await {
        warn!(handle = %identity.handle, "couldn't store user: {err}");
    }

    let mut sections = vec![
        parse_section(gallery_pages, &identity, session.base(), Section::Gallery).await?,
    ];
    if config.include_scraps {
        let scraps_root = Section::Scraps.root_url(session.base(), &handle)?;
        let scraps_pages = walk_all_pages(&session, &scraps_root).await?;
        info_time!(start_time, "Walked {} scraps page(s) of {handle}", scraps_pages.len());
        let scraps = parse_section(scraps_pages, &identity, session.base(), Section::Scraps).await?;
        sections.push(scraps);
    }

    let found: usize = sections.iter().map(Vec::len).sum();
    let stubs = merge(sections);
    info_time!("Found {} unique submission(s) ({found} listed)", stubs.len());

    let report = download_all(&session, &db, stubs, &config.output_root).await;
    db.close().await;

    info_time!(
        start_time,
        "Done: {} downloaded, {} already present, {} skipped, {} failed, {} not stored",
        report.written,
        report.existing,
        report.skipped,
        report.failed,
        report.persistence_failures
    );
    Ok(report)
}

/// Submissions already recorded for `handle`.
pub async fn stored_submissions(config: &Config, handle: &str) -> Result<Vec<Submission>> {
    let db = Database::open(&config.database).await?;
    let submissions = db.submissions_for_handle(handle).await;
    db.close().await;
    submissions
}

/// Parses the stubs of every page of a section off the async runtime.
async fn parse_section(
    pages: Vec<String>,
    identity: &Identity,
    base: &Url,
    section: Section,
) -> Result<Vec<SubmissionStub>> {
    let identity = identity.clone();
    let base = base.clone();
    spawn_blocking(move || -> Result<Vec<SubmissionStub>> {
        let mut stubs = Vec::new();
        for page in &pages {
            stubs.extend(extract_stubs(page, &identity, &base, section)?);
        }
        Ok(stubs)
    })
    .await?
}
