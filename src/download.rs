//! Per-item resolution and download.
//!
//! Each stub goes `stub -> detail fetched -> resolved -> filename sanitized -> written`.
//! Any step can end the item as skipped or failed; the next item is attempted regardless.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::{fs, fs::OpenOptions, io::AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::detail::resolve;
use crate::model::{Submission, SubmissionStub};
use crate::request::Session;
use crate::sanitize::{sanitize_filename, split_extension, target_filename};
use crate::store::MetadataSink;
use crate::{Error, Result};

/// How a single item ended.
#[derive(Debug)]
pub enum DownloadOutcome {
    Written(PathBuf),
    /// The target file was already on disk, nothing was fetched.
    Exists(PathBuf),
    /// The detail page had no media.
    Skipped { id: String },
    Failed { id: String, error: Error },
}

/// Tally of a whole download pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub written: usize,
    pub existing: usize,
    pub skipped: usize,
    pub failed: usize,
    pub persistence_failures: usize,
}

impl RunReport {
    fn record(&mut self, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Written(_) => self.written += 1,
            DownloadOutcome::Exists(_) => self.existing += 1,
            DownloadOutcome::Skipped { .. } => self.skipped += 1,
            DownloadOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn attempted(&self) -> usize {
        self.written + self.existing + self.skipped + self.failed
    }
}

/// Resolves, records and downloads every stub in order. Never fails as a whole:
/// per-item problems are logged and counted in the returned report.
pub async fn download_all<S>(
    session: &Session,
    sink: &S,
    stubs: Vec<SubmissionStub>,
    output_root: &Path,
) -> RunReport
where
    S: MetadataSink + ?Sized,
{
    let mut report = RunReport::default();
    let total = stubs.len();

    for (n, stub) in stubs.into_iter().enumerate() {
        let outcome = download_item(session, sink, stub, output_root, &mut report).await;
        match &outcome {
            DownloadOutcome::Written(path) => {
                info!("[{}/{total}] downloaded {}", n + 1, path.display())
            }
            DownloadOutcome::Exists(path) => {
                info!("[{}/{total}] already on disk {}", n + 1, path.display())
            }
            DownloadOutcome::Skipped { id } => {
                warn!("[{}/{total}] skipped {id}: no media on detail page", n + 1)
            }
            DownloadOutcome::Failed { id, error } => {
                warn!("[{}/{total}] failed {id}: {error}", n + 1)
            }
        }
        report.record(&outcome);
    }

    report
}

async fn download_item<S>(
    session: &Session,
    sink: &S,
    stub: SubmissionStub,
    output_root: &Path,
    report: &mut RunReport,
) -> DownloadOutcome
where
    S: MetadataSink + ?Sized,
{
    let id = stub.id.clone();
    let submission = match resolve_stub(session, stub).await {
        Ok(Some(submission)) => submission,
        Ok(None) => return DownloadOutcome::Skipped { id },
        Err(error) => return DownloadOutcome::Failed { id, error },
    };

    if let Err(err) = sink.upsert_submission(&submission).await {
        warn!(id = %submission.id, "couldn't store submission: {err}");
        report.persistence_failures += 1;
    }

    match download_one(session, &submission, output_root).await {
        Ok(outcome) => outcome,
        Err(error) => DownloadOutcome::Failed { id, error },
    }
}

/// Fetches the stub's detail page and joins the stub with the asset found there.
pub async fn resolve_stub(session: &Session, stub: SubmissionStub) -> Result<Option<Submission>> {
    let body = session.fetch(&stub.listing_url).await?;
    Ok(resolve(&body, session.base())?.map(|asset| Submission::resolve(stub, asset)))
}

/// Streams one resolved submission to `output_root/<handle>/<sanitized name>`.
///
/// Returns [`DownloadOutcome::Written`] or [`DownloadOutcome::Exists`]. A file that
/// fails mid-stream is removed so the next run retries it.
pub async fn download_one(
    session: &Session,
    submission: &Submission,
    output_root: &Path,
) -> Result<DownloadOutcome> {
    let dir = output_root.join(submission.owner_handle.to_lowercase());
    fs::create_dir_all(&dir)
        .await
        .map_err(|source| Error::Write {
            path: dir.clone(),
            source,
        })?;

    let (base, extension) = split_extension(&submission.content_name);
    let safe_base = sanitize_filename(base);
    if safe_base != base {
        debug!("filename sanitized: '{base}' -> '{safe_base}' (extension '{extension}')");
    }
    let path = dir.join(target_filename(&submission.content_name));

    if fs::try_exists(&path).await.unwrap_or(false) {
        return Ok(DownloadOutcome::Exists(path));
    }

    let mut res = session.fetch_stream(&submission.content_url).await?;

    let mut file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await
    {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Ok(DownloadOutcome::Exists(path));
        }
        Err(source) => return Err(Error::Write { path, source }),
    };

    let streamed: Result<()> = async {
        while let Some(chunk) = res
            .chunk()
            .await
            .map_err(|e| Error::fetch(submission.content_url.as_str(), e))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|source| Error::Write {
                    path: path.clone(),
                    source,
                })?;
        }
        file.flush().await.map_err(|source| Error::Write {
            path: path.clone(),
            source,
        })
    }
    .await;

    if let Err(err) = streamed {
        drop(file);
        if let Err(rm_err) = fs::remove_file(&path).await {
            warn!("couldn't remove partial file {}: {rm_err}", path.display());
        }
        return Err(err);
    }

    Ok(DownloadOutcome::Written(path))
}
