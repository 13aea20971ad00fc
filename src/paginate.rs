use std::collections::HashSet;

use tracing::{debug, warn};
use url::Url;

use crate::parse::next_page_link;
use crate::request::Session;
use crate::Result;

/// Fetches a section page by page, following "next" links, and returns every body in order.
///
/// Stops when a page has no next link or the next link was already visited, so a
/// looping pagination can't run forever. Any fetch error aborts the whole walk.
pub async fn walk_all_pages(session: &Session, section_root: &str) -> Result<Vec<String>> {
    let mut pages = Vec::new();
    let mut visited = HashSet::new();
    let mut next = Some(String::from(Url::parse(section_root)?));

    while let Some(url) = next.take() {
        if !visited.insert(url.clone()) {
            warn!(%url, "pagination loops back to a visited page, stopping");
            break;
        }

        let body = session.fetch(&url).await?;
        let current = Url::parse(&url)?;
        next = next_page_link(&body, &current)?;
        debug!(page = pages.len() + 1, %url, next = ?next, "walked page");
        pages.push(body);
    }

    Ok(pages)
}
